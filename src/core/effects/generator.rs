//=========================================================================
// Effect Generator
//=========================================================================
//
// Builds effects from scene configuration entries, and the connection
// effects the scene manager spawns on combination completion.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::debug;

//=== Internal Dependencies ===============================================

use super::{
    BurstOptions, ConnectionEffect, ConnectionOptions, Effect, EffectKind, GlowEffect, GlowOptions, ParticleBurst,
};
use crate::core::math::Vec3;
use crate::core::scene::{decode_options, ConfigError, EffectConfig};

//=== EffectGenerator =====================================================

pub struct EffectGenerator {
    connection: ConnectionOptions,
    spawned: u64,
}

impl EffectGenerator {
    pub fn new() -> Self {
        Self {
            connection: ConnectionOptions::default(),
            spawned: 0,
        }
    }

    /// Builds the effect described by `config`.
    ///
    /// # Errors
    ///
    /// Unknown `type` values and undecodable options.
    pub fn create(&mut self, config: &EffectConfig) -> Result<Box<dyn Effect>, ConfigError> {
        let kind = EffectKind::from_config(&config.kind).ok_or_else(|| ConfigError::UnknownEffectType {
            id: config.id.clone(),
            kind: config.kind.clone(),
        })?;

        let effect: Box<dyn Effect> = match kind {
            EffectKind::Burst => {
                let options: BurstOptions = decode_options(&config.id, &config.options)?;
                Box::new(ParticleBurst::new(config.id.clone(), options))
            }
            EffectKind::Glow => {
                let options: GlowOptions = decode_options(&config.id, &config.options)?;
                Box::new(GlowEffect::new(config.id.clone(), options))
            }
            EffectKind::Connection => {
                let options: ConnectionOptions = decode_options(&config.id, &config.options)?;
                Box::new(ConnectionEffect::new(config.id.clone(), Vec::new(), options))
            }
        };

        debug!("Built {:?} effect '{}'", kind, config.id);
        Ok(effect)
    }

    /// A connection effect through `points`, ready to play.
    pub fn connection(&mut self, points: Vec<Vec3>) -> Box<dyn Effect> {
        self.spawned += 1;
        let id = format!("connection-{}", self.spawned);
        Box::new(ConnectionEffect::new(id, points, self.connection.clone()))
    }
}

impl Default for EffectGenerator {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
