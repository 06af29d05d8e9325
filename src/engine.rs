//=========================================================================
// Storybook Engine
//=========================================================================
//
// Entry point that wires the window thread to the storybook logic thread.
//
// Architecture:
// ```text
//     EngineBuilder  ──build()──>  Engine  ──run()──>  [Runtime]
//         │                          │
//         ├─ with_tps()              └─ spawns logic thread
//         ├─ with_channel_capacity()    runs platform
//         ├─ with_start_page()          blocks until exit
//         ├─ with_page_count()
//         └─ with_title() / with_window_size()
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{error, info};

//=== Internal Dependencies ===============================================

use crate::core::interaction::Viewport;
use crate::core::platform_bridge::{PlatformError, PlatformEvent};
use crate::core::scene::SceneConfig;
use crate::core::CoreSystemsOrchestrator;
use crate::platform::Platform;

//=== EngineBuilder =======================================================

/// Builder for an [`Engine`].
///
/// # Default Values
///
/// - **TPS**: 60.0 (logic updates per second)
/// - **Channel capacity**: 128 input batches
/// - **Start page**: 0
/// - **Page count**: highest configured page + 1
/// - **Window**: "Storybook", 800x600
///
/// # Examples
///
/// ```no_run
/// use storybook_engine::EngineBuilder;
/// use storybook_engine::core::scene::SceneConfig;
///
/// let config = SceneConfig::from_path("assets/scenes.json").unwrap();
/// EngineBuilder::new(config)
///     .with_tps(120.0)
///     .with_start_page(1)
///     .build()
///     .run()
///     .unwrap();
/// ```
pub struct EngineBuilder {
    config: SceneConfig,
    tps: f64,
    channel_capacity: usize,
    start_page: usize,
    page_count: Option<usize>,
    title: String,
    window_size: (u32, u32),
}

impl EngineBuilder {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            tps: 60.0,
            channel_capacity: 128,
            start_page: 0,
            page_count: None,
            title: String::from("Storybook"),
            window_size: (800, 600),
        }
    }

    /// Sets the fixed update rate of the logic thread.
    ///
    /// # Panics
    ///
    /// Panics if `tps <= 0.0`.
    pub fn with_tps(mut self, tps: f64) -> Self {
        assert!(tps > 0.0, "TPS must be positive, got {}", tps);
        self.tps = tps;
        self
    }

    /// Sets how many input batches may queue between the two threads.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be positive");
        self.channel_capacity = capacity;
        self
    }

    pub fn with_start_page(mut self, page: usize) -> Self {
        self.start_page = page;
        self
    }

    /// Overrides the number of pages in the book. Pages without a
    /// configuration entry are blank.
    ///
    /// # Panics
    ///
    /// Panics if `count == 0`.
    pub fn with_page_count(mut self, count: usize) -> Self {
        assert!(count > 0, "Page count must be positive");
        self.page_count = Some(count);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "Window size must be positive");
        self.window_size = (width, height);
        self
    }

    pub fn build(self) -> Engine {
        let page_count = self
            .page_count
            .unwrap_or_else(|| self.config.last_page().map_or(1, |last| last + 1));
        let start_page = self.start_page.min(page_count - 1);

        info!(
            "Building engine (TPS: {}, channel: {}, pages: {}, start: {})",
            self.tps, self.channel_capacity, page_count, start_page
        );

        let (width, height) = self.window_size;
        Engine {
            orchestrator: CoreSystemsOrchestrator::new(
                self.config,
                start_page,
                page_count,
                Viewport::new(width as f32, height as f32),
            ),
            tps: self.tps,
            channel_capacity: self.channel_capacity,
            page_count,
            start_page,
            title: self.title,
            window_size: self.window_size,
        }
    }
}

//=== Engine ==============================================================

/// Storybook runtime: a window thread and a logic thread joined by a
/// bounded channel of [`PlatformEvent`]s.
///
/// ```text
/// Engine (Main Thread)
///   ├─► CoreSystemsOrchestrator (Logic Thread @ TPS)
///   │     └─► CardRuntime: SceneManager, InteractionController
///   │
///   └─► Platform (Event Loop)
///         └─► Window, Input Polling
/// ```
pub struct Engine {
    orchestrator: CoreSystemsOrchestrator,
    tps: f64,
    channel_capacity: usize,
    page_count: usize,
    start_page: usize,
    title: String,
    window_size: (u32, u32),
}

impl Engine {
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn start_page(&self) -> usize {
        self.start_page
    }

    /// Runs until the window closes.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the window system cannot start. The
    /// logic thread is shut down and joined before returning either way.
    pub fn run(self) -> Result<(), PlatformError> {
        info!("Starting engine runtime (TPS: {})", self.tps);

        //--- 1. Create communication channel -----------------------------
        let (tx, rx): (Sender<PlatformEvent>, Receiver<PlatformEvent>) = bounded(self.channel_capacity);

        //--- 2. Spawn the core logic thread -------------------------------
        let core_handle = self.orchestrator.spawn_core_thread(rx, self.tps);
        info!("Core logic thread spawned");

        //--- 3. Launch the platform subsystem -----------------------------
        let platform = Platform::new(tx, self.title, self.window_size);
        let result = platform.run();
        if let Err(e) = &result {
            error!("Platform error: {}", e);
        }
        info!("Platform event loop exited");

        //--- 4. Wait for logic thread -------------------------------------
        // The platform (and its sender) is gone by now, so the collector
        // sees a disconnect even if WindowClosed never went out.
        match core_handle.join() {
            Ok(()) => info!("Core thread terminated cleanly"),
            Err(e) => error!("Core thread panicked: {:?}", e),
        }

        info!("Engine shutdown complete");
        result
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
