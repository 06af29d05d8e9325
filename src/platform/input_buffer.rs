//=========================================================================
// Input Buffer
//=========================================================================
//
// Per-frame store of input on the window thread, flushed to the logic
// thread at every redraw.
//
//   discrete   : ordered one-shot events (keys, buttons, touch phases)
//   continuous : latest value per motion stream (pointer, each touch, size)
//
// Ordering between the two streams matters for dragging: a button or
// touch phase change first folds the pending motion into the discrete
// stream, so the logic thread always sees move-before-release.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashSet;

//=== Internal Dependencies ===============================================

use crate::core::input::InputEvent;

//=== InputBuffer =========================================================

pub(crate) struct InputBuffer {
    discrete: Vec<InputEvent>,
    continuous: HashSet<InputEvent>,
}

impl InputBuffer {
    pub(crate) fn new() -> Self {
        const DISCRETE_BASE: usize = 64;
        const CONTINUOUS_BASE: usize = 8;

        Self {
            discrete: Vec::with_capacity(DISCRETE_BASE),
            continuous: HashSet::with_capacity(CONTINUOUS_BASE),
        }
    }

    /// Replaces the pending value of the same motion stream.
    pub(crate) fn push_continuous(&mut self, event: InputEvent) {
        self.continuous.replace(event);
    }

    /// Appends a one-shot event. Key auto-repeat collapses to one entry.
    pub(crate) fn push_discrete(&mut self, event: InputEvent) {
        if Self::is_phase_change(&event) {
            self.fold_motion();
        }
        if matches!(event, InputEvent::KeyDown { .. }) && self.discrete.last() == Some(&event) {
            return;
        }
        self.discrete.push(event);
    }

    /// Takes this frame's events, or `None` when nothing was buffered.
    pub(crate) fn drain(&mut self) -> Option<(Vec<InputEvent>, Vec<InputEvent>)> {
        if self.is_empty() {
            return None;
        }
        let capacity = self.discrete.capacity();
        let discrete = std::mem::replace(&mut self.discrete, Vec::with_capacity(capacity));
        let continuous = self.continuous.drain().collect();
        Some((discrete, continuous))
    }

    #[cfg(test)]
    pub(crate) fn clear(&mut self) {
        self.discrete.clear();
        self.continuous.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.discrete.len() + self.continuous.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.discrete.is_empty() && self.continuous.is_empty()
    }

    fn is_phase_change(event: &InputEvent) -> bool {
        matches!(
            event,
            InputEvent::PointerDown { .. }
                | InputEvent::PointerUp { .. }
                | InputEvent::TouchStart { .. }
                | InputEvent::TouchEnd { .. }
                | InputEvent::TouchCancel { .. }
        )
    }

    /// Moves pending pointer and touch motion into the discrete stream.
    fn fold_motion(&mut self) {
        let mut motion: Vec<InputEvent> = self
            .continuous
            .iter()
            .filter(|e| matches!(e, InputEvent::PointerMoved { .. } | InputEvent::TouchMoved { .. }))
            .copied()
            .collect();
        if motion.is_empty() {
            return;
        }
        for event in &motion {
            self.continuous.remove(event);
        }
        motion.sort_by_key(|e| match e {
            InputEvent::TouchMoved { id, .. } => *id,
            _ => 0,
        });
        self.discrete.extend(motion);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::{KeyCode, MouseButton};

    fn key_down(key: KeyCode) -> InputEvent {
        InputEvent::KeyDown { key }
    }

    fn pointer_move(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerMoved { x, y }
    }

    #[test]
    fn key_repeat_collapses() {
        let mut buffer = InputBuffer::new();
        buffer.push_discrete(key_down(KeyCode::ArrowRight));
        buffer.push_discrete(key_down(KeyCode::ArrowRight));
        buffer.push_discrete(key_down(KeyCode::ArrowLeft));
        assert_eq!(buffer.discrete.len(), 2);
    }

    #[test]
    fn repeated_clicks_are_kept() {
        let mut buffer = InputBuffer::new();
        for _ in 0..2 {
            buffer.push_discrete(InputEvent::PointerDown { button: MouseButton::Left, x: 5.0, y: 5.0 });
            buffer.push_discrete(InputEvent::PointerUp { button: MouseButton::Left, x: 5.0, y: 5.0 });
        }
        assert_eq!(buffer.discrete.len(), 4);
    }

    #[test]
    fn pointer_motion_keeps_latest() {
        let mut buffer = InputBuffer::new();
        buffer.push_continuous(pointer_move(10.0, 10.0));
        buffer.push_continuous(pointer_move(20.0, 30.0));

        let (_, continuous) = buffer.drain().unwrap();
        assert_eq!(continuous.len(), 1);
        match continuous[0] {
            InputEvent::PointerMoved { x, y } => assert_eq!((x, y), (20.0, 30.0)),
            other => panic!("expected PointerMoved, got {:?}", other),
        }
    }

    #[test]
    fn touches_coalesce_per_finger() {
        let mut buffer = InputBuffer::new();
        buffer.push_continuous(InputEvent::TouchMoved { id: 1, x: 0.0, y: 0.0 });
        buffer.push_continuous(InputEvent::TouchMoved { id: 2, x: 0.0, y: 0.0 });
        buffer.push_continuous(InputEvent::TouchMoved { id: 1, x: 5.0, y: 5.0 });
        assert_eq!(buffer.continuous.len(), 2);
    }

    #[test]
    fn release_orders_after_motion() {
        let mut buffer = InputBuffer::new();
        buffer.push_discrete(InputEvent::PointerDown { button: MouseButton::Left, x: 0.0, y: 0.0 });
        buffer.push_continuous(pointer_move(40.0, 0.0));
        buffer.push_discrete(InputEvent::PointerUp { button: MouseButton::Left, x: 40.0, y: 0.0 });

        let (discrete, continuous) = buffer.drain().unwrap();
        assert!(continuous.is_empty());
        assert_eq!(discrete.len(), 3);
        assert_eq!(discrete[1], pointer_move(40.0, 0.0));
        assert!(matches!(discrete[2], InputEvent::PointerUp { .. }));
    }

    #[test]
    fn drain_empties_and_returns_none_after() {
        let mut buffer = InputBuffer::new();
        assert!(buffer.drain().is_none());

        buffer.push_discrete(key_down(KeyCode::Space));
        buffer.push_continuous(InputEvent::Resized { width: 10, height: 10 });

        let (discrete, continuous) = buffer.drain().unwrap();
        assert_eq!(discrete.len() + continuous.len(), 2);
        assert!(buffer.is_empty());
        assert!(buffer.drain().is_none());
    }

    #[test]
    fn drain_keeps_capacity_for_next_frame() {
        let mut buffer = InputBuffer::new();
        for i in 0..64 {
            buffer.push_discrete(key_down(if i % 2 == 0 { KeyCode::Space } else { KeyCode::Enter }));
        }
        let capacity = buffer.discrete.capacity();

        let (discrete, _) = buffer.drain().expect("buffered");
        assert_eq!(discrete.len(), 64);
        assert!(buffer.discrete.capacity() >= capacity);
        assert!(buffer.is_empty());
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut buffer = InputBuffer::new();
        for i in 0..128 {
            buffer.push_discrete(key_down(if i % 2 == 0 { KeyCode::Space } else { KeyCode::Enter }));
        }
        let capacity = buffer.discrete.capacity();

        buffer.clear();
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.discrete.capacity(), capacity);
    }
}
