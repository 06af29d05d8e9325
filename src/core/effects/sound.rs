//=========================================================================
// Sound Controller
//=========================================================================
//
// Maps semantic cues (page enter, success, click) to audio clips and
// hands them to an `AudioBackend`. Playback failures are logged and
// otherwise ignored; sound is never allowed to break a page.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

use log::{debug, warn};

//=== SoundCue ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    PageEnter,
    Success,
    Click,
}

//=== SoundError ==========================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SoundError {
    /// The backend has no clip at this path.
    ClipNotFound(String),

    /// The backend failed for another reason.
    Backend(String),
}

impl std::fmt::Display for SoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClipNotFound(clip) => write!(f, "Audio clip not found: {}", clip),
            Self::Backend(reason) => write!(f, "Audio backend error: {}", reason),
        }
    }
}

impl std::error::Error for SoundError {}

//=== AudioBackend ========================================================

/// Device-side audio playback.
pub trait AudioBackend {
    fn play(&mut self, clip: &str, volume: f32) -> Result<(), SoundError>;
}

/// Backend that only logs. Used when no audio device is attached.
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioBackend for NullAudio {
    fn play(&mut self, clip: &str, volume: f32) -> Result<(), SoundError> {
        debug!("(silent) play '{}' at volume {:.2}", clip, volume);
        Ok(())
    }
}

//=== SoundController =====================================================

pub struct SoundController {
    backend: Box<dyn AudioBackend>,
    clips: HashMap<SoundCue, String>,
    volume: f32,
    muted: bool,
}

impl SoundController {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        let clips = HashMap::from([
            (SoundCue::PageEnter, "sounds/page-flip.mp3".to_string()),
            (SoundCue::Success, "sounds/success.mp3".to_string()),
            (SoundCue::Click, "sounds/click.mp3".to_string()),
        ]);
        Self {
            backend,
            clips,
            volume: 1.0,
            muted: false,
        }
    }

    pub fn silent() -> Self {
        Self::new(Box::new(NullAudio))
    }

    pub fn set_clip(&mut self, cue: SoundCue, clip: impl Into<String>) {
        self.clips.insert(cue, clip.into());
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Plays the clip mapped to `cue`, if any.
    pub fn play(&mut self, cue: SoundCue) {
        if self.muted {
            return;
        }
        let Some(clip) = self.clips.get(&cue) else {
            debug!("No clip mapped for {:?}", cue);
            return;
        };
        if let Err(e) = self.backend.play(clip, self.volume) {
            warn!("Sound cue {:?} failed: {}", cue, e);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recording {
        played: Rc<RefCell<Vec<String>>>,
        fail: bool,
    }

    impl AudioBackend for Recording {
        fn play(&mut self, clip: &str, _volume: f32) -> Result<(), SoundError> {
            if self.fail {
                return Err(SoundError::ClipNotFound(clip.to_string()));
            }
            self.played.borrow_mut().push(clip.to_string());
            Ok(())
        }
    }

    fn controller(fail: bool) -> (SoundController, Rc<RefCell<Vec<String>>>) {
        let played = Rc::new(RefCell::new(Vec::new()));
        let backend = Recording {
            played: Rc::clone(&played),
            fail,
        };
        (SoundController::new(Box::new(backend)), played)
    }

    #[test]
    fn cues_map_to_clips() {
        let (mut sound, played) = controller(false);
        sound.play(SoundCue::PageEnter);
        sound.set_clip(SoundCue::Success, "chime.ogg");
        sound.play(SoundCue::Success);
        assert_eq!(*played.borrow(), vec!["sounds/page-flip.mp3", "chime.ogg"]);
    }

    #[test]
    fn muted_controller_plays_nothing() {
        let (mut sound, played) = controller(false);
        sound.set_muted(true);
        sound.play(SoundCue::Click);
        assert!(played.borrow().is_empty());
    }

    #[test]
    fn backend_failure_is_contained() {
        let (mut sound, played) = controller(true);
        sound.play(SoundCue::Success);
        assert!(played.borrow().is_empty());
    }
}
