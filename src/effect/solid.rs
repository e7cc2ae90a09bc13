//! Static color fill effect

use embassy_time::Instant;

use super::{EFFECT_NAME_SOLID, Effect};
use crate::{
    color::{RED, Rgb, fill_solid, rgb_from_u32},
    schema::{ColorSpec, EffectSchema, FieldSchema},
    value::EffectConfig,
};

const COLOR: usize = 0;

pub(super) static SCHEMA: EffectSchema = EffectSchema::new(
    EFFECT_NAME_SOLID,
    &[FieldSchema::color(
        "Color",
        "Fill Color",
        ColorSpec::new(rgb_from_u32(0xFF_00_00)).required(),
    )],
);

/// Fills all LEDs with one color
#[derive(Debug, Clone)]
pub struct SolidEffect {
    color: Rgb,
}

impl SolidEffect {
    pub fn new(config: &EffectConfig) -> Self {
        Self {
            color: config.color(&SCHEMA, COLOR).unwrap_or(RED),
        }
    }
}

impl Effect for SolidEffect {
    fn render(&mut self, _now: Instant, leds: &mut [Rgb]) {
        fill_solid(leds, self.color);
    }

    fn update_config(&mut self, config: &EffectConfig) {
        self.color = config.color(&SCHEMA, COLOR).unwrap_or(RED);
    }
}
