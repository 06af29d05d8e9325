//=========================================================================
// Input Events
//=========================================================================
//
// Engine-level input vocabulary, independent of the windowing backend.
//
// Pointer events carry the cursor position in window pixels, stamped by
// the platform layer. Touch events carry the platform touch id.
//
// Equality and hashing are tuned for the platform input buffer:
// - `PointerMoved` events are all equal (only the latest one is kept)
// - `TouchMoved` events are equal per touch id
// - every other event compares by all of its fields
//
//=========================================================================

//=== External Dependencies ===============================================

use std::hash::{Hash, Hasher};

//=== MouseButton =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other,
}

//=== KeyCode =============================================================

/// Keys the storybook reacts to. Everything else maps to `Unidentified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Space,
    Enter,
    Escape,
    Home,
    End,
    PageUp,
    PageDown,
    Unidentified,
}

//=== InputEvent ==========================================================

#[derive(Debug, Clone, Copy)]
pub enum InputEvent {
    KeyDown { key: KeyCode },
    KeyUp { key: KeyCode },

    PointerDown { button: MouseButton, x: f32, y: f32 },
    PointerUp { button: MouseButton, x: f32, y: f32 },
    PointerMoved { x: f32, y: f32 },

    TouchStart { id: u64, x: f32, y: f32 },
    TouchMoved { id: u64, x: f32, y: f32 },
    TouchEnd { id: u64, x: f32, y: f32 },
    TouchCancel { id: u64 },

    /// Window surface resized, in physical pixels.
    Resized { width: u32, height: u32 },

    Unidentified,
}

impl InputEvent {
    /// Continuous events are coalesced per frame; discrete ones are kept
    /// in arrival order.
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            Self::PointerMoved { .. } | Self::TouchMoved { .. } | Self::Resized { .. }
        )
    }
}

//=== Equality & Hashing ==================================================

fn same_point(a: (f32, f32), b: (f32, f32)) -> bool {
    a.0.to_bits() == b.0.to_bits() && a.1.to_bits() == b.1.to_bits()
}

impl PartialEq for InputEvent {
    fn eq(&self, other: &Self) -> bool {
        use InputEvent::*;
        match (self, other) {
            (KeyDown { key: a }, KeyDown { key: b }) => a == b,
            (KeyUp { key: a }, KeyUp { key: b }) => a == b,

            (
                PointerDown { button: a, x: ax, y: ay },
                PointerDown { button: b, x: bx, y: by },
            )
            | (
                PointerUp { button: a, x: ax, y: ay },
                PointerUp { button: b, x: bx, y: by },
            ) => a == b && same_point((*ax, *ay), (*bx, *by)),

            (PointerMoved { .. }, PointerMoved { .. }) => true,
            (Resized { .. }, Resized { .. }) => true,

            (TouchMoved { id: a, .. }, TouchMoved { id: b, .. }) => a == b,

            (TouchStart { id: a, x: ax, y: ay }, TouchStart { id: b, x: bx, y: by })
            | (TouchEnd { id: a, x: ax, y: ay }, TouchEnd { id: b, x: bx, y: by }) => {
                a == b && same_point((*ax, *ay), (*bx, *by))
            }
            (TouchCancel { id: a }, TouchCancel { id: b }) => a == b,

            (Unidentified, Unidentified) => true,
            _ => false,
        }
    }
}

impl Eq for InputEvent {}

impl Hash for InputEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        use InputEvent::*;
        std::mem::discriminant(self).hash(state);
        match self {
            KeyDown { key } | KeyUp { key } => key.hash(state),
            PointerDown { button, x, y } | PointerUp { button, x, y } => {
                button.hash(state);
                x.to_bits().hash(state);
                y.to_bits().hash(state);
            }
            TouchMoved { id, .. } => id.hash(state),
            TouchStart { id, x, y } | TouchEnd { id, x, y } => {
                id.hash(state);
                x.to_bits().hash(state);
                y.to_bits().hash(state);
            }
            TouchCancel { id } => id.hash(state),
            PointerMoved { .. } | Resized { .. } | Unidentified => {}
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
