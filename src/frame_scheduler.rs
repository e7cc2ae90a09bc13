//! Frame scheduling and timing utilities.
//!
//! Provides portable frame pacing without async/await or platform-specific timers.
//! The caller is responsible for sleeping/waiting between frames.

use embassy_time::{Duration, Instant};

use crate::config::{ControllerConfig, DEFAULT_FRAME_RATE};
use crate::{OutputDriver, Renderer};

/// Default frame duration based on the default frame rate.
pub const DEFAULT_FRAME_DURATION: Duration =
    Duration::from_millis(1000 / DEFAULT_FRAME_RATE as u64);

/// Result of a frame tick operation.
#[derive(Debug, Clone, Copy)]
pub struct FrameResult {
    /// The deadline for the next frame.
    pub next_deadline: Instant,
    /// How long to wait until the next frame (may be zero if behind schedule).
    pub sleep_duration: Duration,
}

/// Portable frame scheduler that manages timing without async.
///
/// This scheduler:
/// - Tracks frame timing with drift correction
/// - Renders every strip and hands each frame to the output driver
/// - Returns timing info so the caller can sleep appropriately
///
/// # Usage
///
/// ```ignore
/// let mut scheduler = FrameScheduler::new(Renderer::new(&state), driver);
///
/// loop {
///     let now = get_current_time_ms();
///     let result = scheduler.tick(Instant::from_millis(now));
///
///     // Platform-specific sleep
///     sleep_ms(result.sleep_duration.as_millis() as u64);
/// }
/// ```
pub struct FrameScheduler<'a, O: OutputDriver> {
    output: O,
    renderer: Renderer<'a>,
    next_frame: Instant,
    frame_duration: Duration,
}

impl<'a, O: OutputDriver> FrameScheduler<'a, O> {
    /// Create a new frame scheduler.
    ///
    /// Uses `DEFAULT_FRAME_DURATION` for frame timing.
    pub fn new(renderer: Renderer<'a>, driver: O) -> Self {
        Self::with_frame_duration(renderer, driver, DEFAULT_FRAME_DURATION)
    }

    /// Create a frame scheduler paced at the configured frame rate.
    pub fn from_config(renderer: Renderer<'a>, driver: O, config: &ControllerConfig) -> Self {
        Self::with_frame_duration(renderer, driver, config.frame_duration())
    }

    /// Create a new frame scheduler with custom frame duration.
    ///
    /// Initializes the driver for every strip.
    pub fn with_frame_duration(
        renderer: Renderer<'a>,
        mut driver: O,
        frame_duration: Duration,
    ) -> Self {
        for (strip, frame) in renderer.frames().enumerate() {
            driver.init(strip, frame.len());
        }
        Self {
            output: driver,
            renderer,
            next_frame: Instant::from_millis(0),
            frame_duration,
        }
    }

    /// Process one frame and return timing information.
    ///
    /// The caller is responsible for waiting until `next_deadline` before
    /// calling `tick` again.
    pub fn tick(&mut self, now: Instant) -> FrameResult {
        // Skip the backlog instead of catching up after long stalls
        let max_drift = Duration::from_millis(self.frame_duration.as_millis() * 2);
        if now.as_millis() > self.next_frame.as_millis() + max_drift.as_millis() {
            self.next_frame = now;
        }

        self.renderer.render(now);
        for (strip, frame) in self.renderer.frames().enumerate() {
            self.output.write(strip, frame);
        }

        self.next_frame += self.frame_duration;

        let sleep_duration = if self.next_frame.as_millis() > now.as_millis() {
            Duration::from_millis(self.next_frame.as_millis() - now.as_millis())
        } else {
            Duration::from_millis(0)
        };

        FrameResult {
            next_deadline: self.next_frame,
            sleep_duration,
        }
    }

    /// Get a reference to the renderer.
    pub fn renderer(&self) -> &Renderer<'a> {
        &self.renderer
    }

    pub fn output(&self) -> &O {
        &self.output
    }
}
