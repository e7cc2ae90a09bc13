//! State shared between the render loop and the configuration service
//!
//! The slot table and the global status live behind critical-section
//! mutexes. Each lock covers one mutation plus a snapshot, or the render of
//! one strip; encoding and storage I/O only ever see a [`StateSnapshot`].

use core::cell::{Cell, RefCell};

use critical_section::Mutex;
use embassy_time::Instant;
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::config::{DEFAULT_BRIGHTNESS, StripConfig};
use crate::effect::EffectKind;
use crate::slot::StripSlots;
use crate::value::EffectConfig;

/// Device-wide output status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalStatus {
    pub brightness: u8,
    pub on: bool,
    pub follow_sun: bool,
}

impl GlobalStatus {
    /// Status at boot: output on, persisted values for the rest
    pub const fn from_preferences(preferences: Preferences) -> Self {
        Self {
            brightness: preferences.brightness,
            on: true,
            follow_sun: preferences.follow_sun,
        }
    }

    pub const fn preferences(&self) -> Preferences {
        Preferences {
            brightness: self.brightness,
            follow_sun: self.follow_sun,
        }
    }
}

impl Default for GlobalStatus {
    fn default() -> Self {
        Self::from_preferences(Preferences::default())
    }
}

/// Persisted part of [`GlobalStatus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub brightness: u8,
    pub follow_sun: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            brightness: DEFAULT_BRIGHTNESS,
            follow_sun: true,
        }
    }
}

/// Slots of every configured strip, indexed like the strip layout
#[derive(Debug, Clone, Default)]
pub struct SlotTable {
    strips: Vec<StripSlots>,
}

impl SlotTable {
    pub fn new(strip_count: usize) -> Self {
        Self {
            strips: vec![StripSlots::new(); strip_count],
        }
    }

    pub fn strip(&self, index: usize) -> Option<&StripSlots> {
        self.strips.get(index)
    }

    pub fn strip_mut(&mut self, index: usize) -> Option<&mut StripSlots> {
        self.strips.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.strips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strips.is_empty()
    }
}

/// Configs of one strip at snapshot time, in kind order
#[derive(Debug, Clone, PartialEq)]
pub struct StripSnapshot {
    pub name: String,
    pub effects: Vec<(EffectKind, EffectConfig)>,
}

/// Copy of the slot table taken under the lock
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateSnapshot {
    pub strips: Vec<StripSnapshot>,
}

impl StateSnapshot {
    pub fn strip(&self, name: &str) -> Option<&StripSnapshot> {
        self.strips.iter().find(|strip| strip.name == name)
    }

    /// Config of `kind` on the named strip
    pub fn config(&self, strip: &str, kind: EffectKind) -> Option<&EffectConfig> {
        self.strip(strip)?
            .effects
            .iter()
            .find(|(effect, _)| *effect == kind)
            .map(|(_, config)| config)
    }
}

pub struct SharedState {
    layout: Vec<StripConfig>,
    table: Mutex<RefCell<SlotTable>>,
    global: Mutex<Cell<GlobalStatus>>,
}

impl SharedState {
    pub fn new(strips: &[StripConfig]) -> Self {
        Self {
            layout: strips.to_vec(),
            table: Mutex::new(RefCell::new(SlotTable::new(strips.len()))),
            global: Mutex::new(Cell::new(GlobalStatus::default())),
        }
    }

    /// Strip layout; fixed for the lifetime of the state
    pub fn strips(&self) -> &[StripConfig] {
        &self.layout
    }

    /// Index of a strip by name
    pub fn strip_index(&self, name: &str) -> Option<usize> {
        self.layout.iter().position(|strip| strip.name == name)
    }

    /// Run `f` with exclusive access to the slot table
    pub fn with_table<R>(&self, f: impl FnOnce(&mut SlotTable) -> R) -> R {
        critical_section::with(|cs| f(&mut self.table.borrow_ref_mut(cs)))
    }

    /// Run `f` on the table and snapshot the result in the same lock
    pub fn mutate<R>(&self, f: impl FnOnce(&mut SlotTable) -> R) -> (R, StateSnapshot) {
        self.with_table(|table| {
            let result = f(table);
            (result, self.capture(table))
        })
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.with_table(|table| self.capture(table))
    }

    fn capture(&self, table: &SlotTable) -> StateSnapshot {
        let strips = self
            .layout
            .iter()
            .zip(table.strips.iter())
            .map(|(strip, slots)| StripSnapshot {
                name: strip.name.clone(),
                effects: slots
                    .iter()
                    .map(|slot| (slot.kind(), slot.config().clone()))
                    .collect(),
            })
            .collect();
        StateSnapshot { strips }
    }

    /// Render one strip into `leds`; returns false for an unknown strip
    pub fn render_strip(&self, index: usize, now: Instant, leds: &mut [Rgb]) -> bool {
        self.with_table(|table| match table.strip_mut(index) {
            Some(slots) => {
                slots.render(now, leds);
                true
            }
            None => false,
        })
    }

    pub fn global(&self) -> GlobalStatus {
        critical_section::with(|cs| self.global.borrow(cs).get())
    }

    pub fn set_global(&self, status: GlobalStatus) {
        critical_section::with(|cs| self.global.borrow(cs).set(status));
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(&crate::config::ControllerConfig::default().strips)
    }
}
