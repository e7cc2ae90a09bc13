//! Effect catalog with compile-time known effect kinds
//!
//! The catalog is fixed: every kind has a schema, a factory and a variant in
//! [`EffectInstance`]. Catalog order is also render priority, the lowest
//! index wins when a strip has several slots.

mod bounce;
mod rainbow;
mod red_green;
mod solid;

use embassy_time::Instant;
pub use bounce::BounceEffect;
pub use rainbow::{RainbowEffect, RainbowWaveEffect};
pub use red_green::RedGreenEffect;
pub use solid::SolidEffect;

use crate::color::Rgb;
use crate::schema::{EffectSchema, FieldSchema, NumberSpec};
use crate::value::EffectConfig;

const EFFECT_NAME_RAINBOW: &str = "Rainbow";
const EFFECT_NAME_RAINBOW_WAVE: &str = "Rainbow2";
const EFFECT_NAME_SOLID: &str = "Solid";
const EFFECT_NAME_RED_GREEN: &str = "Red and Green";
const EFFECT_NAME_BOUNCE: &str = "Bounce";

/// Number of catalog entries
pub const EFFECT_COUNT: usize = 5;

/// Animation speed shared by the time-driven effects; higher is slower
const SPEED_FIELD: FieldSchema = FieldSchema::number(
    "Speed",
    "Animation Speed",
    NumberSpec::new(1.0, 50.0).with_step(1.0).required(),
);

pub trait Effect {
    /// Render a single frame
    fn render(&mut self, now: Instant, leds: &mut [Rgb]);

    /// Apply a new configuration, keeping animation state
    fn update_config(&mut self, config: &EffectConfig);
}

/// Catalog entry, identified by its index
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum EffectKind {
    Rainbow = 0,
    RainbowWave = 1,
    Solid = 2,
    RedGreen = 3,
    Bounce = 4,
}

impl EffectKind {
    /// All kinds in catalog order
    pub const ALL: [Self; EFFECT_COUNT] = [
        Self::Rainbow,
        Self::RainbowWave,
        Self::Solid,
        Self::RedGreen,
        Self::Bounce,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Rainbow => EFFECT_NAME_RAINBOW,
            Self::RainbowWave => EFFECT_NAME_RAINBOW_WAVE,
            Self::Solid => EFFECT_NAME_SOLID,
            Self::RedGreen => EFFECT_NAME_RED_GREEN,
            Self::Bounce => EFFECT_NAME_BOUNCE,
        }
    }

    pub fn schema(self) -> &'static EffectSchema {
        match self {
            Self::Rainbow => &rainbow::RAINBOW_SCHEMA,
            Self::RainbowWave => &rainbow::RAINBOW_WAVE_SCHEMA,
            Self::Solid => &solid::SCHEMA,
            Self::RedGreen => &red_green::SCHEMA,
            Self::Bounce => &bounce::SCHEMA,
        }
    }

    /// Create the live instance for a validated config
    pub fn create(self, config: &EffectConfig) -> EffectInstance {
        match self {
            Self::Rainbow => EffectInstance::Rainbow(RainbowEffect::new(config)),
            Self::RainbowWave => EffectInstance::RainbowWave(RainbowWaveEffect::new(config)),
            Self::Solid => EffectInstance::Solid(SolidEffect::new(config)),
            Self::RedGreen => EffectInstance::RedGreen(RedGreenEffect::new(config)),
            Self::Bounce => EffectInstance::Bounce(BounceEffect::new(config)),
        }
    }
}

/// Schemas of the whole catalog, in catalog order
pub fn schemas() -> impl Iterator<Item = &'static EffectSchema> {
    EffectKind::ALL.into_iter().map(EffectKind::schema)
}

/// Live effect state - enum containing all possible effects
#[derive(Debug, Clone)]
pub enum EffectInstance {
    Rainbow(RainbowEffect),
    RainbowWave(RainbowWaveEffect),
    Solid(SolidEffect),
    RedGreen(RedGreenEffect),
    Bounce(BounceEffect),
}

impl EffectInstance {
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Rainbow(_) => EffectKind::Rainbow,
            Self::RainbowWave(_) => EffectKind::RainbowWave,
            Self::Solid(_) => EffectKind::Solid,
            Self::RedGreen(_) => EffectKind::RedGreen,
            Self::Bounce(_) => EffectKind::Bounce,
        }
    }

    /// Render the current effect
    pub fn render(&mut self, now: Instant, leds: &mut [Rgb]) {
        match self {
            Self::Rainbow(effect) => effect.render(now, leds),
            Self::RainbowWave(effect) => effect.render(now, leds),
            Self::Solid(effect) => effect.render(now, leds),
            Self::RedGreen(effect) => effect.render(now, leds),
            Self::Bounce(effect) => effect.render(now, leds),
        }
    }

    pub fn update_config(&mut self, config: &EffectConfig) {
        match self {
            Self::Rainbow(effect) => effect.update_config(config),
            Self::RainbowWave(effect) => effect.update_config(config),
            Self::Solid(effect) => effect.update_config(config),
            Self::RedGreen(effect) => effect.update_config(config),
            Self::Bounce(effect) => effect.update_config(config),
        }
    }
}

/// Convert a validated speed into a non-zero divisor
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn speed_divisor(speed: Option<f64>) -> u64 {
    speed.map_or(1, |speed| speed as u64).max(1)
}
