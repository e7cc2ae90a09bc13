use embassy_time::Instant;

use crate::color::{BLACK, Rgb, fill_solid};
use crate::math8::scale8;
use crate::state::SharedState;

/// Render side of the controller
///
/// Owns one pixel buffer per strip. Each frame the active slot of every
/// strip renders into its buffer, then the global status is applied.
pub struct Renderer<'a> {
    state: &'a SharedState,
    buffers: Vec<Vec<Rgb>>,
}

impl<'a> Renderer<'a> {
    pub fn new(state: &'a SharedState) -> Self {
        let buffers = state
            .strips()
            .iter()
            .map(|strip| vec![BLACK; strip.len])
            .collect();
        Self { state, buffers }
    }

    /// Process one frame
    ///
    /// The slot table is locked once per strip, never for the whole frame.
    pub fn render(&mut self, now: Instant) {
        let global = self.state.global();
        for (index, frame) in self.buffers.iter_mut().enumerate() {
            if !global.on {
                fill_solid(frame, BLACK);
                continue;
            }
            self.state.render_strip(index, now, frame);
            apply_brightness(frame, global.brightness);
        }
    }

    /// Last rendered frame of a strip
    pub fn frame(&self, strip: usize) -> Option<&[Rgb]> {
        self.buffers.get(strip).map(Vec::as_slice)
    }

    /// Last rendered frames in strip order
    pub fn frames(&self) -> impl Iterator<Item = &[Rgb]> {
        self.buffers.iter().map(Vec::as_slice)
    }

    pub fn strip_count(&self) -> usize {
        self.buffers.len()
    }
}

fn apply_brightness(frame: &mut [Rgb], brightness: u8) {
    if brightness == u8::MAX {
        return;
    }
    for led in frame {
        led.r = scale8(led.r, brightness);
        led.g = scale8(led.g, brightness);
        led.b = scale8(led.b, brightness);
    }
}
