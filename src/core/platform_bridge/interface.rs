//=========================================================================
// Platform Bridge Interface
//=========================================================================
//
// Messages and errors shared by the window thread and the logic thread.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

//=== Internal Dependencies ===============================================

use crate::core::input::InputEvent;

//=== PlatformEvent =======================================================

/// Window thread → logic thread.
#[derive(Debug, Clone)]
pub(crate) enum PlatformEvent {
    /// One flush of the platform input buffer. Continuous events are
    /// already coalesced to their latest value.
    Inputs {
        discrete: Vec<InputEvent>,
        continuous: Vec<InputEvent>,
    },

    WindowClosed,
}

//=== PlatformError =======================================================

#[derive(Debug)]
pub enum PlatformError {
    /// Event loop creation failed (OS-level issue).
    EventLoopCreation(String),
    EventLoopExecution(String),
    WindowCreation(String),
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventLoopCreation(e) => write!(f, "event loop creation failed: {}", e),
            Self::EventLoopExecution(e) => write!(f, "event loop error: {}", e),
            Self::WindowCreation(e) => write!(f, "window creation failed: {}", e),
        }
    }
}

impl std::error::Error for PlatformError {}
