//! Scrolling red and green bands

use embassy_time::Instant;

use super::{EFFECT_NAME_RED_GREEN, Effect, SPEED_FIELD, speed_divisor};
use crate::{
    color::{BLACK, GREEN, RED, Rgb},
    schema::EffectSchema,
    value::EffectConfig,
};

const SPEED: usize = 0;

/// Length of one green-gap-red-gap period in pixels
const PATTERN_LEN: usize = 16;
/// Milliseconds per scroll step for each unit of speed
const STEP_MS: u64 = 100;

pub(super) static SCHEMA: EffectSchema = EffectSchema::new(EFFECT_NAME_RED_GREEN, &[SPEED_FIELD]);

#[derive(Debug, Clone)]
pub struct RedGreenEffect {
    divisor: u64,
}

impl RedGreenEffect {
    pub fn new(config: &EffectConfig) -> Self {
        Self {
            divisor: speed_divisor(config.number(&SCHEMA, SPEED)),
        }
    }
}

/// Color of a position inside the pattern
const fn band_color(position: usize) -> Rgb {
    match position {
        0..5 => GREEN,
        8..13 => RED,
        _ => BLACK,
    }
}

impl Effect for RedGreenEffect {
    #[allow(clippy::cast_possible_truncation)]
    fn render(&mut self, now: Instant, leds: &mut [Rgb]) {
        let step = (now.as_millis() / (self.divisor * STEP_MS)) % 256;
        let offset = 255 - step as usize;
        for (i, led) in leds.iter_mut().enumerate() {
            *led = band_color((i + offset) % PATTERN_LEN);
        }
    }

    fn update_config(&mut self, config: &EffectConfig) {
        self.divisor = speed_divisor(config.number(&SCHEMA, SPEED));
    }
}
