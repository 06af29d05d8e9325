//=========================================================================
// Platform Subsystem
//=========================================================================
//
// Bridges Winit (OS-level events) with the storybook logic thread.
//
// Architecture:
// ```text
//  Main Thread:                     Logic Thread:
//  ┌──────────────────────────┐    ┌──────────────────────┐
//  │  Winit Event Loop        │    │  EventCollector      │
//  │   ↓                      │    │   ↓                  │
//  │  InputProcessor          │    │  CardRuntime         │
//  │   ├─ Converts Winit      │    │   ├─ Interaction     │
//  │   └─ Tracks cursor       │    │   └─ SceneManager    │
//  │   ↓                      │    │                      │
//  │  InputBuffer             │    └──────────────────────┘
//  │   ├─ discrete: Vec<>     │             ↑
//  │   └─ continuous: Set<>   │             │
//  │   ↓ (flush on redraw)    │             │
//  │  Bounded Channel ────────┼─────────────┘
//  └──────────────────────────┘    PlatformEvent
// ```
//
// RedrawRequested is the frame boundary: all buffered input is sent as
// one message. Empty buffers are not sent. If the logic thread is gone
// the platform logs and keeps running so the window can still close.
//
// Winit requires the event loop on the main thread (macOS/iOS).
//
//=========================================================================

//=== Submodules ==========================================================

mod input_buffer;
mod input_processor;

//=== External Dependencies ===============================================

use crossbeam_channel::{Sender, TrySendError};
use log::*;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

//=== Internal Dependencies ===============================================

use crate::core::platform_bridge::{PlatformError, PlatformEvent};
use input_buffer::InputBuffer;
use input_processor::InputProcessor;

//=== Platform ============================================================

/// Window owner and input aggregator. Not `Send`; lives on the main thread.
pub(crate) struct Platform {
    /// Created lazily in `resumed()`.
    window: Option<Window>,
    title: String,
    size: (u32, u32),
    buffer: InputBuffer,
    event_sender: Sender<PlatformEvent>,
    input_processor: InputProcessor,
}

impl Platform {
    pub(crate) fn new(event_sender: Sender<PlatformEvent>, title: impl Into<String>, size: (u32, u32)) -> Self {
        info!(target: "platform", "Platform subsystem initialized");
        Self {
            window: None,
            title: title.into(),
            size,
            buffer: InputBuffer::new(),
            event_sender,
            input_processor: InputProcessor::new(),
        }
    }

    /// Runs the Winit event loop until the window closes.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if the event loop cannot be created or
    /// fails while running.
    pub(crate) fn run(mut self) -> Result<(), PlatformError> {
        debug!(target: "platform", "Starting Winit event loop");

        let event_loop = EventLoop::new().map_err(|e| PlatformError::EventLoopCreation(e.to_string()))?;
        event_loop
            .run_app(&mut self)
            .map_err(|e| PlatformError::EventLoopExecution(e.to_string()))
    }

    //--- Internal Helpers -------------------------------------------------

    /// Sends this frame's input to the logic thread.
    ///
    /// A full channel drops the frame with a warning rather than blocking
    /// the window thread.
    fn flush_input_buffer(&mut self) {
        let Some((discrete, continuous)) = self.buffer.drain() else {
            return;
        };
        let (discrete_count, continuous_count) = (discrete.len(), continuous.len());

        trace!(
            target: "platform::input",
            "Flushing {} discrete + {} continuous events",
            discrete_count,
            continuous_count
        );

        match self.event_sender.try_send(PlatformEvent::Inputs { discrete, continuous }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!(
                target: "platform::input",
                "Logic thread behind, dropping {} events",
                discrete_count + continuous_count
            ),
            Err(TrySendError::Disconnected(_)) => warn!(
                target: "platform::input",
                "Channel disconnected, dropping {} events",
                discrete_count + continuous_count
            ),
        }
    }

    fn notify_closed(&self) {
        if self.event_sender.send(PlatformEvent::WindowClosed).is_err() {
            debug!(target: "platform", "Logic thread already gone");
        }
    }

    #[cfg(test)]
    pub(crate) fn window(&self) -> Option<&Window> {
        self.window.as_ref()
    }
}

//=== Winit Integration ===================================================

impl ApplicationHandler for Platform {
    /// Creates the window on first resume; later resumes (mobile) reuse it.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            debug!(target: "platform", "Window already exists (mobile resume?)");
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(self.size.0, self.size.1));

        match event_loop.create_window(attrs) {
            Ok(window) => {
                let size = window.inner_size();
                info!(
                    target: "platform",
                    "Window created: {}x{} @ {}x DPI",
                    size.width,
                    size.height,
                    window.scale_factor()
                );
                // Physical size; pointer positions arrive in the same space.
                self.buffer
                    .push_continuous(self.input_processor.process_resize(size.width, size.height));
                window.request_redraw();
                self.window = Some(window);
            }
            Err(e) => {
                error!(target: "platform", "{}", PlatformError::WindowCreation(e.to_string()));
                self.notify_closed();
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!(target: "platform", "Window close requested");
                self.notify_closed();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                let event = self.input_processor.process_resize(size.width, size.height);
                self.buffer.push_continuous(event);
            }

            WindowEvent::CursorMoved { position, .. } => {
                let event = self
                    .input_processor
                    .process_mouse_move(position.x as f32, position.y as f32);
                self.buffer.push_continuous(event);
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let event = self.input_processor.process_mouse_button(button, state);
                self.buffer.push_discrete(event);
            }

            WindowEvent::Touch(touch) => {
                let event = self.input_processor.process_touch(
                    touch.id,
                    touch.phase,
                    touch.location.x as f32,
                    touch.location.y as f32,
                );
                if event.is_continuous() {
                    self.buffer.push_continuous(event);
                } else {
                    self.buffer.push_discrete(event);
                }
            }

            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if key_event.repeat {
                    return;
                }
                match self.input_processor.process_key_event(&key_event) {
                    Some(event) => self.buffer.push_discrete(event),
                    None => trace!(target: "platform::input", "Unmapped key ignored"),
                }
            }

            WindowEvent::RedrawRequested => {
                self.flush_input_buffer();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
