pub mod codec;
pub mod color;
pub mod config;
pub mod effect;
pub mod error;
pub mod frame_scheduler;
pub mod math8;
pub mod protocol;
pub mod raw;
pub mod renderer;
pub mod schema;
pub mod service;
pub mod slot;
pub mod state;
pub mod store;
pub mod validate;
pub mod value;

pub use codec::{DecodeLimits, PersistentDocument};
pub use config::{ControllerConfig, StripConfig};
pub use effect::{EffectInstance, EffectKind};
pub use error::{
    CodecError, DecodeError, PersistenceError, ProtocolError, UpdateError, ValidationError,
    ValidationReason,
};
pub use frame_scheduler::{FrameResult, FrameScheduler};
pub use protocol::{ClientMessage, Greeting};
pub use raw::{RawParams, RawValue};
pub use renderer::Renderer;
pub use schema::{EffectSchema, FieldKind, FieldSchema, FieldSpec};
pub use service::{ConfigService, StateObserver};
pub use slot::{EffectSlot, SlotChange, StripSlots};
pub use state::{GlobalStatus, Preferences, SharedState, StateSnapshot};
pub use store::{FileStorage, MemoryStorage, PersistenceStore, Storage};
pub use validate::validate;
pub use value::{EffectConfig, FieldValue};

pub use color::{Hsv, Rgb};
pub use embassy_time::{Duration, Instant};

/// Abstract LED driver trait
///
/// Implement this trait to support different hardware platforms.
/// The frame scheduler is generic over this trait.
pub trait OutputDriver {
    /// Prepare the output of one strip
    fn init(&mut self, _strip: usize, _len: usize) {}

    /// Write colors to one LED strip
    fn write(&mut self, strip: usize, colors: &[Rgb]);
}
