//! Effect slots of a strip
//!
//! A strip holds at most one slot per effect kind, ordered ascending by kind
//! index, so the first slot is always the one that renders.

use embassy_time::Instant;
use heapless::Vec;

use crate::color::Rgb;
use crate::effect::{EFFECT_COUNT, EffectInstance, EffectKind};
use crate::value::EffectConfig;

/// Validated config of one (strip, effect kind) plus its live instance
#[derive(Debug, Clone)]
pub struct EffectSlot {
    config: EffectConfig,
    instance: EffectInstance,
}

impl EffectSlot {
    /// Create a slot, invoking the catalog factory
    pub fn new(kind: EffectKind, config: EffectConfig) -> Self {
        let instance = kind.create(&config);
        Self { config, instance }
    }

    pub fn kind(&self) -> EffectKind {
        self.instance.kind()
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    pub fn instance(&self) -> &EffectInstance {
        &self.instance
    }

    /// Replace the config; the instance keeps its animation state
    pub fn update(&mut self, config: EffectConfig) {
        self.instance.update_config(&config);
        self.config = config;
    }

    pub fn render(&mut self, now: Instant, leds: &mut [Rgb]) {
        self.instance.render(now, leds);
    }
}

/// Outcome of [`StripSlots::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotChange {
    Created,
    Updated,
}

#[derive(Debug, Clone, Default)]
pub struct StripSlots {
    slots: Vec<EffectSlot, EFFECT_COUNT>,
}

impl StripSlots {
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    fn search(&self, kind: EffectKind) -> Result<usize, usize> {
        self.slots.binary_search_by_key(&kind, EffectSlot::kind)
    }

    pub fn get(&self, kind: EffectKind) -> Option<&EffectSlot> {
        let index = self.search(kind).ok()?;
        self.slots.get(index)
    }

    /// Create the slot for `kind` or update it in place
    pub fn upsert(&mut self, kind: EffectKind, config: EffectConfig) -> SlotChange {
        match self.search(kind) {
            Ok(index) => {
                self.slots[index].update(config);
                SlotChange::Updated
            }
            Err(index) => {
                // Capacity equals the catalog size and kinds are unique
                let _ = self.slots.insert(index, EffectSlot::new(kind, config));
                SlotChange::Created
            }
        }
    }

    /// Remove the slot for `kind`, returns whether one existed
    pub fn remove(&mut self, kind: EffectKind) -> bool {
        match self.search(kind) {
            Ok(index) => {
                self.slots.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    /// Slot with the lowest kind index
    pub fn active_mut(&mut self) -> Option<&mut EffectSlot> {
        self.slots.first_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectSlot> {
        self.slots.iter()
    }

    pub fn kinds(&self) -> impl Iterator<Item = EffectKind> + '_ {
        self.slots.iter().map(EffectSlot::kind)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Render the active slot, or clear the strip when there is none
    pub fn render(&mut self, now: Instant, leds: &mut [Rgb]) {
        match self.active_mut() {
            Some(slot) => slot.render(now, leds),
            None => crate::color::fill_solid(leds, crate::color::BLACK),
        }
    }
}
