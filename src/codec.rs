//! MessagePack state document
//!
//! The same bytes are written to storage and pushed to observers:
//!
//! ```text
//! { "type": "config",
//!   <strip>: { <effect>: { <field>: <value>, ... }, ... }, ... }
//! ```
//!
//! Values are written per field kind; decoding yields raw, unvalidated maps.

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, warn};
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::color::Rgb;
use crate::effect::EffectKind;
use crate::error::{CodecError, DecodeError, PersistenceError};
use crate::raw::{NODE_SIZE, RawParams, RawValue};
use crate::schema::FieldSpec;
use crate::state::{StateSnapshot, StripSnapshot};
use crate::value::{EffectConfig, FieldValue};

/// Message type of the state document
pub const STATE_MESSAGE_TYPE: &str = "config";

/// Initial decode scratch size
pub const MIN_DECODE_CAPACITY: usize = 2048;

/// Largest decode scratch size before giving up
pub const MAX_DECODE_CAPACITY: usize = 1024 * 1024;

/// Strip name → effect name → raw parameters
pub type PersistentDocument = BTreeMap<String, BTreeMap<String, RawParams>>;

/// Scratch bounds of the adaptive decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub min_capacity: usize,
    pub max_capacity: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            min_capacity: MIN_DECODE_CAPACITY,
            max_capacity: MAX_DECODE_CAPACITY,
        }
    }
}

/// Encode a snapshot into the state document
pub fn encode(snapshot: &StateSnapshot) -> Result<Vec<u8>, CodecError> {
    Ok(rmp_serde::to_vec_named(&StateDocument(snapshot))?)
}

/// Decode a state document with adaptive scratch
pub fn decode(bytes: &[u8], limits: DecodeLimits) -> Result<PersistentDocument, PersistenceError> {
    let value = decode_adaptive(bytes, limits)?;
    let Some(root) = value.as_map() else {
        return Err(PersistenceError::DecodeFailed);
    };

    let mut document = PersistentDocument::new();
    for (strip, effects) in root {
        let Some(effects) = effects.as_map() else {
            continue;
        };
        let entries = effects
            .iter()
            .filter_map(|(effect, params)| Some((effect.clone(), params.as_map()?.clone())))
            .collect();
        document.insert(strip.clone(), entries);
    }
    Ok(document)
}

/// Decode into at most `capacity` bytes of scratch
///
/// Every node is charged against the scratch before it is built, strings
/// are borrowed from `bytes` until charged. Decoding stops at the first node
/// that does not fit.
pub fn decode_raw(bytes: &[u8], capacity: usize) -> Result<RawValue, DecodeError> {
    let mut scratch = Scratch::new(capacity);
    let mut deserializer = rmp_serde::Deserializer::from_read_ref(bytes);
    let decoded = ScratchValue(&mut scratch).deserialize(&mut deserializer);
    match decoded {
        Ok(value) => Ok(value),
        Err(_) if scratch.exhausted => Err(DecodeError::NoMemory { capacity }),
        Err(_) => Err(DecodeError::Malformed),
    }
}

/// Decode, doubling the scratch on every out-of-memory outcome
///
/// Starts at `limits.min_capacity` and stops once `limits.max_capacity`
/// was tried.
pub fn decode_adaptive(bytes: &[u8], limits: DecodeLimits) -> Result<RawValue, PersistenceError> {
    let mut capacity = limits.min_capacity.max(1);
    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        match decode_raw(bytes, capacity) {
            Ok(value) => {
                debug!(
                    "decoded {} bytes with {capacity} bytes of scratch ({attempts} attempts)",
                    bytes.len()
                );
                return Ok(value);
            }
            Err(DecodeError::Malformed) => return Err(PersistenceError::DecodeFailed),
            Err(DecodeError::NoMemory { .. }) if capacity >= limits.max_capacity => {
                warn!("document exceeds decode cap of {} bytes", limits.max_capacity);
                return Err(PersistenceError::BufferCapExceeded {
                    cap: limits.max_capacity,
                });
            }
            Err(DecodeError::NoMemory { .. }) => {
                capacity = capacity.saturating_mul(2).min(limits.max_capacity);
            }
        }
    }
}

/// Remaining decode scratch
struct Scratch {
    remaining: usize,
    exhausted: bool,
}

impl Scratch {
    fn new(capacity: usize) -> Self {
        Self {
            remaining: capacity,
            exhausted: false,
        }
    }

    fn charge<E: de::Error>(&mut self, bytes: usize) -> Result<(), E> {
        match self.remaining.checked_sub(bytes) {
            Some(remaining) => {
                self.remaining = remaining;
                Ok(())
            }
            None => {
                self.exhausted = true;
                Err(E::custom("decode scratch exhausted"))
            }
        }
    }

    /// Charge a string node or key and copy it out
    fn text<E: de::Error>(&mut self, node: usize, text: &str) -> Result<String, E> {
        self.charge(node + text.len() + 1).map(|()| text.to_owned())
    }
}

/// Builds a [`RawValue`] node by node out of a [`Scratch`]
struct ScratchValue<'s>(&'s mut Scratch);

impl<'de> DeserializeSeed<'de> for ScratchValue<'_> {
    type Value = RawValue;

    fn deserialize<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<RawValue, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for ScratchValue<'_> {
    type Value = RawValue;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a MessagePack value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawValue, E> {
        self.0.charge(NODE_SIZE).map(|()| RawValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<RawValue, E> {
        self.visit_unit()
    }

    fn visit_some<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<RawValue, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<RawValue, E> {
        self.0.charge(NODE_SIZE).map(|()| RawValue::Bool(value))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_i64<E: de::Error>(self, value: i64) -> Result<RawValue, E> {
        self.visit_f64(value as f64)
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_u64<E: de::Error>(self, value: u64) -> Result<RawValue, E> {
        self.visit_f64(value as f64)
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<RawValue, E> {
        self.0.charge(NODE_SIZE).map(|()| RawValue::Number(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<RawValue, E> {
        self.0.text(NODE_SIZE, value).map(RawValue::Text)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawValue, A::Error> {
        self.0.charge::<A::Error>(NODE_SIZE)?;
        let mut items = Vec::new();
        while let Some(item) = seq.next_element_seed(ScratchValue(&mut *self.0))? {
            items.push(item);
        }
        Ok(RawValue::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawValue, A::Error> {
        self.0.charge::<A::Error>(NODE_SIZE)?;
        let mut entries = BTreeMap::new();
        while let Some(key) = map.next_key_seed(ScratchKey(&mut *self.0))? {
            let value = map.next_value_seed(ScratchValue(&mut *self.0))?;
            entries.insert(key, value);
        }
        Ok(RawValue::Map(entries))
    }
}

/// Map key charged against a [`Scratch`]
struct ScratchKey<'s>(&'s mut Scratch);

impl<'de> DeserializeSeed<'de> for ScratchKey<'_> {
    type Value = String;

    fn deserialize<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<String, D::Error> {
        deserializer.deserialize_str(self)
    }
}

impl Visitor<'_> for ScratchKey<'_> {
    type Value = String;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a string key")
    }

    fn visit_str<E: de::Error>(self, key: &str) -> Result<String, E> {
        self.0.text(0, key)
    }
}

struct StateDocument<'a>(&'a StateSnapshot);

impl Serialize for StateDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + self.0.strips.len()))?;
        map.serialize_entry("type", STATE_MESSAGE_TYPE)?;
        for strip in &self.0.strips {
            map.serialize_entry(&strip.name, &StripDocument(strip))?;
        }
        map.end()
    }
}

struct StripDocument<'a>(&'a StripSnapshot);

impl Serialize for StripDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.effects.len()))?;
        for (kind, config) in &self.0.effects {
            map.serialize_entry(kind.name(), &ConfigDocument(*kind, config))?;
        }
        map.end()
    }
}

struct ConfigDocument<'a>(EffectKind, &'a EffectConfig);

impl Serialize for ConfigDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let schema = self.0.schema();
        let fields: Vec<(&str, EncodedValue<'_>)> = self
            .1
            .iter()
            .filter_map(|(index, value)| {
                let field = schema.field(index)?;
                Some((field.name, EncodedValue::new(field.spec, value)?))
            })
            .collect();

        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (name, value) in &fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Wire form of one field value
enum EncodedValue<'a> {
    Text(&'a str),
    Number(f64),
    Color(Rgb),
    Flag(bool),
}

impl<'a> EncodedValue<'a> {
    /// `None` for an enum ordinal without a matching option
    fn new(spec: FieldSpec, value: &'a FieldValue) -> Option<Self> {
        Some(match value {
            FieldValue::Text(text) | FieldValue::Opaque(text) => Self::Text(text),
            FieldValue::Number(number) => Self::Number(*number),
            FieldValue::Color(color) => Self::Color(*color),
            FieldValue::Flag(flag) => Self::Flag(*flag),
            FieldValue::Enum(ordinal) => match spec {
                FieldSpec::Enum(spec) => Self::Text(spec.option(*ordinal)?),
                _ => return None,
            },
        })
    }
}

impl Serialize for EncodedValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Number(number) => serializer.serialize_f64(*number),
            Self::Flag(flag) => serializer.serialize_bool(*flag),
            Self::Color(color) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("r", &color.r)?;
                map.serialize_entry("g", &color.g)?;
                map.serialize_entry("b", &color.b)?;
                map.end()
            }
        }
    }
}
