//=========================================================================
// Interaction
//=========================================================================
//
// Pointer/touch hit testing and drag projection onto the page.
//
//=========================================================================

//=== Module Declarations =================================================

mod camera;
mod controller;

//=== Public API ==========================================================

pub use camera::{Camera, OrthographicCamera, PerspectiveCamera, Viewport};
pub use controller::InteractionController;
