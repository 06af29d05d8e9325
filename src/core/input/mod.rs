//=========================================================================
// Input
//=========================================================================
//
// Backend-independent input events consumed by the card runtime.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod event;

//=== Public API ==========================================================

pub use event::{InputEvent, KeyCode, MouseButton};
