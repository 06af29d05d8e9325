//=========================================================================
// Core Systems Orchestrator
//=========================================================================
//
// Everything that runs on the logic (non-platform) thread.
//
// The storybook core is single-threaded: mechanics, the event bus and
// the scene manager share state through `Rc`/`RefCell`. Only the scene
// configuration crosses into the logic thread; the `CardRuntime` is
// built there and never leaves it.
//
// Per tick:
//   1. Collect platform input (bounded, waits at most one frame)
//   2. Feed batches to the runtime (interaction, page keys)
//   3. Advance the runtime by the measured frame time
//   4. Sleep off the rest of the frame budget
//
//=========================================================================

//=== Module Declarations =================================================

pub mod effects;
pub mod event_bus;
pub mod input;
pub mod interaction;
pub mod math;
pub mod mechanics;
pub(crate) mod platform_bridge;
pub mod runtime;
pub mod scene;
pub mod schedule;

pub use runtime::CardRuntime;

//=== External Dependencies ===============================================

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use log::{debug, info};

//=== Internal Dependencies ===============================================

use interaction::Viewport;
use platform_bridge::{EventCollector, PlatformEvent, TickControl};
use scene::SceneConfig;

//=== CoreSystemsOrchestrator =============================================

pub(crate) struct CoreSystemsOrchestrator {
    config: SceneConfig,
    start_page: usize,
    page_count: usize,
    viewport: Viewport,
}

impl CoreSystemsOrchestrator {
    /// Longest step fed to the runtime; a stalled frame does not fast-forward animations.
    const MAX_STEP: f32 = 0.25;

    pub(crate) fn new(config: SceneConfig, start_page: usize, page_count: usize, viewport: Viewport) -> Self {
        Self {
            config,
            start_page,
            page_count,
            viewport,
        }
    }

    /// Spawns the logic thread ticking the runtime at `tps`.
    pub(crate) fn spawn_core_thread(self, receiver: Receiver<PlatformEvent>, tps: f64) -> thread::JoinHandle<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / tps);

        thread::spawn(move || {
            let mut runtime = CardRuntime::new(self.config, self.page_count, self.viewport);
            runtime.start(self.start_page);

            let mut collector = EventCollector::new(receiver);
            let mut last_tick = Instant::now();
            let mut ticks: u64 = 0;

            loop {
                let frame_start = Instant::now();

                //--- Step 1: Gather platform events ------------------------
                if collector.collect_frame(frame_duration) == TickControl::Exit {
                    break;
                }

                //--- Step 2: Input -----------------------------------------
                for batch in collector.batches() {
                    runtime.handle_batch(batch);
                }

                //--- Step 3: Advance ---------------------------------------
                let now = Instant::now();
                let dt = now.duration_since(last_tick).as_secs_f32().min(Self::MAX_STEP);
                last_tick = now;
                runtime.tick(dt);
                ticks += 1;

                //--- Step 4: Pacing ----------------------------------------
                let elapsed = frame_start.elapsed();
                if elapsed < frame_duration {
                    thread::sleep(frame_duration - elapsed);
                }
            }

            debug!("Logic thread ran {} ticks", ticks);
            runtime.shutdown();
            info!("Core thread exiting.");
        })
    }
}
