//=========================================================================
// Input Processor
//=========================================================================
//
// Converts Winit events into engine InputEvents.
//
// Architecture:
//   Winit Events → InputProcessor → InputEvent (engine type) → InputBuffer
//
// Winit reports mouse buttons without a position, so the processor keeps
// the last cursor position and stamps it onto button events. Keys the
// storybook does not react to are filtered (returns None).
//
//=========================================================================

//=== External Dependencies ===============================================

use winit::{
    event::{ElementState, KeyEvent, MouseButton as WinitMouseButton, TouchPhase},
    keyboard::{KeyCode as WinitKeyCode, PhysicalKey},
};

//=== Internal Dependencies ===============================================

use crate::core::input::{InputEvent, KeyCode, MouseButton};

//=== InputProcessor ======================================================

pub(crate) struct InputProcessor {
    cursor: (f32, f32),
}

impl InputProcessor {
    pub(crate) fn new() -> Self {
        Self { cursor: (0.0, 0.0) }
    }

    #[cfg(test)]
    pub(crate) fn cursor(&self) -> (f32, f32) {
        self.cursor
    }

    //--- Keyboard ---------------------------------------------------------

    pub(crate) fn process_key_event(&self, key_event: &KeyEvent) -> Option<InputEvent> {
        let PhysicalKey::Code(code) = key_event.physical_key else {
            return None;
        };
        self.process_key(code, key_event.state)
    }

    /// Converts a physical key transition; unmapped keys are dropped.
    pub(crate) fn process_key(&self, code: WinitKeyCode, state: ElementState) -> Option<InputEvent> {
        let key = KeyCode::from(code);
        if key == KeyCode::Unidentified {
            return None;
        }
        Some(match state {
            ElementState::Pressed => InputEvent::KeyDown { key },
            ElementState::Released => InputEvent::KeyUp { key },
        })
    }

    //--- Mouse ------------------------------------------------------------

    pub(crate) fn process_mouse_move(&mut self, x: f32, y: f32) -> InputEvent {
        self.cursor = (x, y);
        InputEvent::PointerMoved { x, y }
    }

    /// Button transition at the last known cursor position.
    pub(crate) fn process_mouse_button(&self, button: WinitMouseButton, state: ElementState) -> InputEvent {
        let button = MouseButton::from(button);
        let (x, y) = self.cursor;
        match state {
            ElementState::Pressed => InputEvent::PointerDown { button, x, y },
            ElementState::Released => InputEvent::PointerUp { button, x, y },
        }
    }

    //--- Touch ------------------------------------------------------------

    pub(crate) fn process_touch(&self, id: u64, phase: TouchPhase, x: f32, y: f32) -> InputEvent {
        match phase {
            TouchPhase::Started => InputEvent::TouchStart { id, x, y },
            TouchPhase::Moved => InputEvent::TouchMoved { id, x, y },
            TouchPhase::Ended => InputEvent::TouchEnd { id, x, y },
            TouchPhase::Cancelled => InputEvent::TouchCancel { id },
        }
    }

    //--- Window -----------------------------------------------------------

    pub(crate) fn process_resize(&self, width: u32, height: u32) -> InputEvent {
        InputEvent::Resized { width, height }
    }
}

//=========================================================================
// Winit Conversions
//=========================================================================

/// Page navigation and control keys. Everything else is `Unidentified`.
impl From<WinitKeyCode> for KeyCode {
    fn from(code: WinitKeyCode) -> Self {
        use WinitKeyCode::*;
        match code {
            //--- Arrows -------------------------------------------------------
            ArrowUp => KeyCode::ArrowUp,
            ArrowDown => KeyCode::ArrowDown,
            ArrowLeft => KeyCode::ArrowLeft,
            ArrowRight => KeyCode::ArrowRight,

            //--- Navigation ---------------------------------------------------
            Home => KeyCode::Home,
            End => KeyCode::End,
            PageUp => KeyCode::PageUp,
            PageDown => KeyCode::PageDown,

            //--- Special ------------------------------------------------------
            Space => KeyCode::Space,
            Enter | NumpadEnter => KeyCode::Enter,
            Escape => KeyCode::Escape,

            _ => KeyCode::Unidentified,
        }
    }
}

impl From<WinitMouseButton> for MouseButton {
    fn from(button: WinitMouseButton) -> Self {
        match button {
            WinitMouseButton::Left => MouseButton::Left,
            WinitMouseButton::Right => MouseButton::Right,
            WinitMouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Other,
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
