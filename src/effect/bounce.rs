//! Single pixel travelling along the strip

use embassy_time::Instant;

use super::{EFFECT_NAME_BOUNCE, Effect, speed_divisor};
use crate::{
    color::{BLACK, Rgb, WHITE, fill_solid},
    schema::{ColorSpec, EffectSchema, FieldSchema, FlagSpec, NumberSpec},
    value::EffectConfig,
};

const SPEED: usize = 0;
const COLOR: usize = 1;
const WRAP: usize = 2;

pub(super) static SCHEMA: EffectSchema = EffectSchema::new(
    EFFECT_NAME_BOUNCE,
    &[
        FieldSchema::number(
            "Speed",
            "Frames per step",
            NumberSpec::new(1.0, 50.0).with_step(1.0).with_default(1.0),
        ),
        FieldSchema::color("Color", "Pixel Color", ColorSpec::new(WHITE)),
        FieldSchema::flag("Wrap", "Restart at the first pixel", FlagSpec::new(false)),
    ],
);

/// Moving dot; bounces off the strip ends unless `Wrap` is set
///
/// Position, direction and the frame counter are animation state and
/// survive config updates.
#[derive(Debug, Clone)]
pub struct BounceEffect {
    frames_per_step: u64,
    color: Rgb,
    wrap: bool,
    position: usize,
    forward: bool,
    frames: u64,
}

impl BounceEffect {
    pub fn new(config: &EffectConfig) -> Self {
        let mut effect = Self {
            frames_per_step: 1,
            color: WHITE,
            wrap: false,
            position: 0,
            forward: true,
            frames: 0,
        };
        effect.update_config(config);
        effect
    }

    /// Current pixel index
    pub const fn position(&self) -> usize {
        self.position
    }

    fn advance(&mut self, len: usize) {
        if self.wrap {
            self.forward = true;
            self.position = (self.position + 1) % len;
            return;
        }
        if len < 2 {
            return;
        }
        if self.forward && self.position + 1 >= len {
            self.forward = false;
        } else if !self.forward && self.position == 0 {
            self.forward = true;
        }
        if self.forward {
            self.position += 1;
        } else {
            self.position -= 1;
        }
    }
}

impl Effect for BounceEffect {
    fn render(&mut self, _now: Instant, leds: &mut [Rgb]) {
        let len = leds.len();
        if len == 0 {
            return;
        }
        self.position = self.position.min(len - 1);

        fill_solid(leds, BLACK);
        leds[self.position] = self.color;

        self.frames += 1;
        if self.frames >= self.frames_per_step {
            self.frames = 0;
            self.advance(len);
        }
    }

    fn update_config(&mut self, config: &EffectConfig) {
        self.frames_per_step = speed_divisor(config.number(&SCHEMA, SPEED));
        self.color = config.color(&SCHEMA, COLOR).unwrap_or(WHITE);
        self.wrap = config.flag(&SCHEMA, WRAP);
    }
}
