//! Rainbow cycling effects
//!
//! - `RainbowEffect`: the whole strip shows one hue cycling over time
//! - `RainbowWaveEffect`: the hue advances along the strip as well

use embassy_time::Instant;

use super::{EFFECT_NAME_RAINBOW, EFFECT_NAME_RAINBOW_WAVE, Effect, SPEED_FIELD, speed_divisor};
use crate::{
    color::{Hsv, Rgb, fill_solid, hsv2rgb},
    schema::{EffectSchema, EnumSpec, FieldSchema},
    value::EffectConfig,
};

const SPEED: usize = 0;
const DIRECTION: usize = 1;

/// Hue offset between neighbouring pixels of the wave
const HUE_STEP: u8 = 10;

const DIRECTIONS: &[&str] = &["Forward", "Backward"];
const DIRECTION_BACKWARD: usize = 1;

pub(super) static RAINBOW_SCHEMA: EffectSchema =
    EffectSchema::new(EFFECT_NAME_RAINBOW, &[SPEED_FIELD]);

pub(super) static RAINBOW_WAVE_SCHEMA: EffectSchema = EffectSchema::new(
    EFFECT_NAME_RAINBOW_WAVE,
    &[
        SPEED_FIELD,
        FieldSchema::choice("Direction", "Wave Direction", EnumSpec::new(DIRECTIONS, 0)),
    ],
);

/// Hue at `now`, one step every `divisor` milliseconds
#[allow(clippy::cast_possible_truncation)]
fn base_hue(now: Instant, divisor: u64) -> u8 {
    ((now.as_millis() / divisor) % 256) as u8
}

const fn full_color(hue: u8) -> Hsv {
    Hsv {
        hue,
        sat: 255,
        val: 255,
    }
}

#[derive(Debug, Clone)]
pub struct RainbowEffect {
    divisor: u64,
}

impl RainbowEffect {
    pub fn new(config: &EffectConfig) -> Self {
        Self {
            divisor: speed_divisor(config.number(&RAINBOW_SCHEMA, SPEED)),
        }
    }
}

impl Effect for RainbowEffect {
    fn render(&mut self, now: Instant, leds: &mut [Rgb]) {
        let hue = base_hue(now, self.divisor);
        fill_solid(leds, hsv2rgb(full_color(hue)));
    }

    fn update_config(&mut self, config: &EffectConfig) {
        self.divisor = speed_divisor(config.number(&RAINBOW_SCHEMA, SPEED));
    }
}

#[derive(Debug, Clone)]
pub struct RainbowWaveEffect {
    divisor: u64,
    backward: bool,
}

impl RainbowWaveEffect {
    pub fn new(config: &EffectConfig) -> Self {
        let mut effect = Self {
            divisor: 1,
            backward: false,
        };
        effect.update_config(config);
        effect
    }
}

impl Effect for RainbowWaveEffect {
    fn render(&mut self, now: Instant, leds: &mut [Rgb]) {
        let mut hue = base_hue(now, self.divisor);
        for led in leds {
            *led = hsv2rgb(full_color(hue));
            hue = if self.backward {
                hue.wrapping_sub(HUE_STEP)
            } else {
                hue.wrapping_add(HUE_STEP)
            };
        }
    }

    fn update_config(&mut self, config: &EffectConfig) {
        self.divisor = speed_divisor(config.number(&RAINBOW_WAVE_SCHEMA, SPEED));
        self.backward =
            config.option(&RAINBOW_WAVE_SCHEMA, DIRECTION) == Some(DIRECTION_BACKWARD);
    }
}
