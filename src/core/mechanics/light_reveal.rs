//=========================================================================
// Light Reveal Mechanic
//=========================================================================
//
// A movable light over a hidden surface. The surface is divided into a
// grid of cells; every cell the light passes near is revealed for good.
// Revealing enough of the surface triggers the mechanic.
//
// revealed: HashSet<(col, row)> only grows until reset, so progress is
// non-decreasing under any sequence of light moves.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::collections::HashSet;
use std::f32::consts::TAU;
use std::rc::Rc;

use log::debug;
use serde::Deserialize;

//=== Internal Dependencies ===============================================

use super::{HitTarget, Mechanic, MechanicCore, MechanicId, MechanicKind, PartId};
use crate::core::event_bus::{EventBus, TriggerDetail};
use crate::core::math::{BoundingSphere, Vec3};
use crate::core::scene::{NodeFlags, NodeId, Transform, VisualNode};

//=== Options =============================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LightRevealOptions {
    /// Centre of the hidden surface.
    pub position: Vec3,
    pub width: f32,
    pub height: f32,
    pub cell_size: f32,
    /// Radius of the revealed disc, in cells.
    pub reveal_radius: u32,
    /// Allowed light height above the surface.
    pub min_height: f32,
    pub max_height: f32,
    pub threshold: f32,
    pub light_radius: f32,
    /// Pulses per second of the light intensity.
    pub pulse_rate: f32,
}

impl Default for LightRevealOptions {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            width: 400.0,
            height: 300.0,
            cell_size: 20.0,
            reveal_radius: 2,
            min_height: 10.0,
            max_height: 120.0,
            threshold: 0.7,
            light_radius: 15.0,
            pulse_rate: 0.5,
        }
    }
}

/// Upper bound on surface cells; finer grids are rejected.
const MAX_CELLS: usize = 1 << 20;

impl LightRevealOptions {
    /// Columns and rows of the reveal grid.
    ///
    /// Fails on a non-positive or non-finite size, an inverted height range,
    /// or a grid with more than `MAX_CELLS` cells.
    pub fn grid(&self) -> Result<(usize, usize), String> {
        if !(self.width.is_finite() && self.width > 0.0 && self.height.is_finite() && self.height > 0.0) {
            return Err(format!("surface {}x{} must be positive", self.width, self.height));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(format!("cell size {} must be positive", self.cell_size));
        }
        if !(self.min_height.is_finite() && self.max_height.is_finite()) || self.min_height > self.max_height {
            return Err(format!("height range {}..{} is empty", self.min_height, self.max_height));
        }

        let cols = ((self.width / self.cell_size).ceil() as usize).max(1);
        let rows = ((self.height / self.cell_size).ceil() as usize).max(1);
        match cols.checked_mul(rows) {
            Some(cells) if cells <= MAX_CELLS => Ok((cols, rows)),
            _ => Err(format!("{}x{} cells exceeds {}", cols, rows, MAX_CELLS)),
        }
    }
}

//=== LightRevealMechanic =================================================

const LIGHT: PartId = PartId(0);
const SURFACE: PartId = PartId(1);

/// Rate at which the displayed progress catches up with the real one.
const PROGRESS_EASE_RATE: f32 = 4.0;

pub struct LightRevealMechanic {
    core: MechanicCore,
    options: LightRevealOptions,
    cols: usize,
    rows: usize,
    revealed: HashSet<(usize, usize)>,
    progress: f32,
    displayed_progress: f32,
    light: Vec3,
    pulse_phase: f32,
    intensity: f32,
}

impl LightRevealMechanic {
    /// # Errors
    ///
    /// Rejects options whose surface grid is unusable; see
    /// [`LightRevealOptions::grid`].
    pub fn new(
        id: MechanicId,
        name: impl Into<String>,
        options: LightRevealOptions,
        bus: Rc<EventBus>,
    ) -> Result<Self, String> {
        let (cols, rows) = options.grid()?;

        let mut mechanic = Self {
            core: MechanicCore::new(id, name, MechanicKind::LightReveal, options.position, bus),
            options,
            cols,
            rows,
            revealed: HashSet::new(),
            progress: 0.0,
            displayed_progress: 0.0,
            light: Vec3::ZERO,
            pulse_phase: 0.0,
            intensity: 1.0,
        };
        mechanic.light = mechanic.rest_position();
        Ok(mechanic)
    }

    /// Moves the light (clamped to the surface and height range) and
    /// reveals the cells around its footprint.
    pub fn move_light(&mut self, x: f32, y: f32, z: f32) -> bool {
        if self.core.is_triggered() {
            return false;
        }

        let (left, bottom) = self.surface_origin();
        let base = self.options.position.z;
        self.light = Vec3::new(
            x.clamp(left, left + self.options.width),
            y.clamp(bottom, bottom + self.options.height),
            z.clamp(base + self.options.min_height, base + self.options.max_height),
        );

        let cell = self.options.cell_size;
        let col = (((self.light.x - left) / cell) as usize).min(self.cols - 1);
        let row = (((self.light.y - bottom) / cell) as usize).min(self.rows - 1);
        self.reveal_disc(col, row);

        self.progress = self.revealed.len() as f32 / self.total_cells() as f32;

        if self.progress >= self.options.threshold {
            debug!("Light '{}' reached {:.0}% revealed", self.core.name(), self.progress * 100.0);
            self.core.trigger(TriggerDetail::Revealed {
                progress: self.progress,
                forced: false,
            });
        }
        true
    }

    /// Reveals the whole surface and triggers.
    pub fn reveal_all(&mut self) {
        for col in 0..self.cols {
            for row in 0..self.rows {
                self.revealed.insert((col, row));
            }
        }
        self.progress = 1.0;
        self.core.trigger(TriggerDetail::Revealed {
            progress: 1.0,
            forced: true,
        });
    }

    pub fn reveal_progress(&self) -> f32 {
        self.progress
    }

    pub fn displayed_progress(&self) -> f32 {
        self.displayed_progress
    }

    pub fn is_revealed(&self, col: usize, row: usize) -> bool {
        self.revealed.contains(&(col, row))
    }

    pub fn revealed_cells(&self) -> impl Iterator<Item = &(usize, usize)> {
        self.revealed.iter()
    }

    pub fn total_cells(&self) -> usize {
        self.cols * self.rows
    }

    pub fn light_position(&self) -> Vec3 {
        self.light
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    fn surface_origin(&self) -> (f32, f32) {
        (
            self.options.position.x - self.options.width / 2.0,
            self.options.position.y - self.options.height / 2.0,
        )
    }

    fn rest_position(&self) -> Vec3 {
        let lift = (self.options.min_height + self.options.max_height) / 2.0;
        self.options.position + Vec3::Z * lift
    }

    fn reveal_disc(&mut self, col: usize, row: usize) {
        let r = (self.options.reveal_radius as i64).min(self.cols.max(self.rows) as i64);
        let (col, row) = (col as i64, row as i64);

        for dc in -r..=r {
            for dr in -r..=r {
                if dc * dc + dr * dr > r * r {
                    continue;
                }
                let (c, rw) = (col + dc, row + dr);
                if c >= 0 && rw >= 0 && c < self.cols as i64 && rw < self.rows as i64 {
                    self.revealed.insert((c as usize, rw as usize));
                }
            }
        }
    }
}

impl Mechanic for LightRevealMechanic {
    fn core(&self) -> &MechanicCore {
        &self.core
    }

    fn reset(&mut self) {
        self.revealed.clear();
        self.progress = 0.0;
        self.displayed_progress = 0.0;
        self.light = self.rest_position();
        self.pulse_phase = 0.0;
        self.intensity = 1.0;
        self.core.clear_trigger();
    }

    fn update(&mut self, dt: f32) {
        let gap = self.progress - self.displayed_progress;
        self.displayed_progress += gap * (PROGRESS_EASE_RATE * dt).min(1.0);

        self.pulse_phase = (self.pulse_phase + dt * self.options.pulse_rate) % 1.0;
        self.intensity = 0.8 + 0.2 * (self.pulse_phase * TAU).sin();
    }

    fn primary_action(&mut self, _part: PartId) -> bool {
        false
    }

    fn drag_to(&mut self, part: PartId, position: Vec3) -> bool {
        part == LIGHT && self.move_light(position.x, position.y, position.z)
    }

    fn hit_targets(&self) -> Vec<HitTarget> {
        vec![HitTarget {
            part: LIGHT,
            bounds: BoundingSphere::new(self.light, self.options.light_radius),
            flags: NodeFlags::DRAGGABLE,
        }]
    }

    fn nodes(&self) -> Vec<VisualNode> {
        let id = self.core.id();
        vec![
            VisualNode {
                id: NodeId { mechanic: id, part: LIGHT.0 as u32 },
                transform: Transform {
                    scale: Vec3::ONE * self.intensity,
                    ..Transform::at(self.light)
                },
                flags: NodeFlags::DRAGGABLE,
                visible: true,
            },
            VisualNode {
                id: NodeId { mechanic: id, part: SURFACE.0 as u32 },
                transform: Transform::at(self.options.position),
                flags: NodeFlags::NONE,
                visible: true,
            },
        ]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::MECHANIC_TRIGGER;
    use std::cell::Cell;

    fn light() -> (LightRevealMechanic, Rc<Cell<u32>>) {
        let bus = EventBus::shared();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        bus.subscribe(MECHANIC_TRIGGER, move |_| c.set(c.get() + 1));
        (
            LightRevealMechanic::new(MechanicId(6), "lantern", LightRevealOptions::default(), bus)
                .expect("default options are valid"),
            count,
        )
    }

    #[test]
    fn grid_dimensions_follow_cell_size() {
        let (l, _) = light();
        assert_eq!(l.total_cells(), 20 * 15);
    }

    #[test]
    fn inverted_height_range_is_rejected() {
        let options: LightRevealOptions = serde_json::from_str(r#"{ "minHeight": 200.0 }"#).expect("decodes");
        let err = LightRevealMechanic::new(MechanicId(1), "dim", options, EventBus::shared()).err();
        assert!(err.is_some_and(|e| e.contains("height range")));
    }

    #[test]
    fn degenerate_surfaces_are_rejected() {
        for json in [
            r#"{ "cellSize": 0.0 }"#,
            r#"{ "cellSize": -5.0 }"#,
            r#"{ "width": -1.0 }"#,
            r#"{ "height": 0.0 }"#,
            r#"{ "cellSize": 0.001 }"#,
        ] {
            let options: LightRevealOptions = serde_json::from_str(json).expect("decodes");
            assert!(
                LightRevealMechanic::new(MechanicId(1), "bad", options, EventBus::shared()).is_err(),
                "{} should be rejected",
                json
            );
        }
    }

    #[test]
    fn oversized_reveal_radius_covers_grid() {
        let options = LightRevealOptions {
            reveal_radius: u32::MAX,
            ..LightRevealOptions::default()
        };
        let mut l = LightRevealMechanic::new(MechanicId(1), "flood", options, EventBus::shared()).expect("valid");
        l.move_light(0.0, 0.0, 50.0);
        assert_eq!(l.reveal_progress(), 1.0);
    }

    #[test]
    fn move_light_reveals_disc() {
        let (mut l, _) = light();
        l.move_light(0.0, 0.0, 50.0);

        // Radius 2 disc: 13 cells.
        assert_eq!(l.revealed_cells().count(), 13);
        assert!(l.reveal_progress() > 0.0);
    }

    #[test]
    fn light_is_clamped_to_bounds() {
        let (mut l, _) = light();
        l.move_light(-10_000.0, 10_000.0, 10_000.0);

        let p = l.light_position();
        assert_eq!(p.x, -200.0);
        assert_eq!(p.y, 150.0);
        assert_eq!(p.z, 120.0);
        assert!(l.is_revealed(0, 14));
    }

    #[test]
    fn repeated_moves_on_same_spot_are_idempotent() {
        let (mut l, _) = light();
        l.move_light(0.0, 0.0, 50.0);
        let progress = l.reveal_progress();
        l.move_light(0.0, 0.0, 50.0);
        assert_eq!(l.reveal_progress(), progress);
    }

    #[test]
    fn sweeping_the_surface_triggers_once() {
        let (mut l, count) = light();

        'sweep: for row in 0..15 {
            for col in 0..20 {
                let x = -200.0 + col as f32 * 20.0 + 10.0;
                let y = -150.0 + row as f32 * 20.0 + 10.0;
                if !l.move_light(x, y, 50.0) {
                    break 'sweep;
                }
            }
        }

        assert!(l.reveal_progress() >= 0.7);
        assert_eq!(count.get(), 1);
        assert!(!l.move_light(0.0, 0.0, 50.0), "Triggered light ignores moves");
    }

    #[test]
    fn reveal_all_as_first_operation() {
        let (mut l, count) = light();
        l.reveal_all();
        assert_eq!(l.reveal_progress(), 1.0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn displayed_progress_eases_toward_actual() {
        let (mut l, _) = light();
        l.reveal_all();
        l.update(0.1);
        let first = l.displayed_progress();
        assert!(first > 0.0 && first < 1.0);

        for _ in 0..100 {
            l.update(0.1);
        }
        assert!((l.displayed_progress() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn reset_clears_reveal() {
        let (mut l, _) = light();
        l.reveal_all();
        l.reset();
        assert_eq!(l.reveal_progress(), 0.0);
        assert_eq!(l.revealed_cells().count(), 0);
        assert!(!l.is_triggered());
    }

    #[test]
    fn drag_moves_the_light() {
        let (mut l, _) = light();
        assert!(l.drag_to(LIGHT, Vec3::new(100.0, 0.0, 60.0)));
        assert!(!l.drag_to(SURFACE, Vec3::ZERO));
        assert_eq!(l.light_position(), Vec3::new(100.0, 0.0, 60.0));
    }
}
