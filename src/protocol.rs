//! Logical messages exchanged with the transport
//!
//! Inbound frames are MessagePack maps carrying a `type` key. Outbound
//! documents are the state document (see [`crate::codec`]), the global
//! status and the effect catalog.

use serde::Serialize;

use crate::codec::{DecodeLimits, decode_adaptive};
use crate::effect;
use crate::error::ProtocolError;
use crate::raw::{RawParams, RawValue};
use crate::schema::EffectSchema;
use crate::state::GlobalStatus;

pub const MESSAGE_REMOVE_EFFECT: &str = "removeEffect";
pub const MESSAGE_UPDATE_EFFECT: &str = "updateEffect";
pub const MESSAGE_UPDATE_GLOBAL: &str = "updateGlobal";
pub const MESSAGE_GLOBAL_STATS: &str = "globalStats";
pub const MESSAGE_EFFECT_CONFIG: &str = "effectConfig";

/// Inbound request, strip and effect still by name
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    RemoveEffect {
        strip: String,
        effect: String,
    },
    UpdateEffect {
        strip: String,
        effect: String,
        config: RawParams,
    },
    /// Absent fields keep their current value
    UpdateGlobal {
        brightness: Option<u8>,
        on: Option<bool>,
        follow_sun: Option<bool>,
    },
}

impl ClientMessage {
    /// Decode and parse one inbound frame
    pub fn decode(bytes: &[u8], limits: DecodeLimits) -> Result<Self, ProtocolError> {
        let value = decode_adaptive(bytes, limits).map_err(|_| ProtocolError::Malformed)?;
        Self::parse(&value)
    }

    pub fn parse(value: &RawValue) -> Result<Self, ProtocolError> {
        if value.as_map().is_none() {
            return Err(ProtocolError::Malformed);
        }
        let kind = text_field(value, "type")?;
        match kind {
            MESSAGE_REMOVE_EFFECT => Ok(Self::RemoveEffect {
                strip: text_field(value, "strip")?.into(),
                effect: text_field(value, "effect")?.into(),
            }),
            MESSAGE_UPDATE_EFFECT => {
                let strip = text_field(value, "strip")?.into();
                let effect = text_field(value, "effect")?.into();
                let config = value
                    .get("config")
                    .and_then(RawValue::as_map)
                    .ok_or(ProtocolError::MissingField("config"))?
                    .clone();
                Ok(Self::UpdateEffect {
                    strip,
                    effect,
                    config,
                })
            }
            MESSAGE_UPDATE_GLOBAL => Ok(Self::UpdateGlobal {
                brightness: value.get("brightness").and_then(brightness),
                on: value.get("on").and_then(RawValue::as_bool),
                follow_sun: value.get("followSun").and_then(RawValue::as_bool),
            }),
            other => Err(ProtocolError::UnknownMessageType(other.into())),
        }
    }
}

fn text_field<'a>(value: &'a RawValue, key: &'static str) -> Result<&'a str, ProtocolError> {
    value
        .get(key)
        .and_then(RawValue::as_str)
        .ok_or(ProtocolError::MissingField(key))
}

/// Integral brightness in 0..=255, anything else is ignored
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn brightness(value: &RawValue) -> Option<u8> {
    let value = value.as_f64()?;
    (value.fract() == 0.0 && (0.0..=255.0).contains(&value)).then(|| value as u8)
}

/// `{type: "globalStats", brightness, on, followSun}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GlobalStatsDocument {
    #[serde(rename = "type")]
    kind: &'static str,
    brightness: u8,
    on: bool,
    follow_sun: bool,
}

pub fn encode_global(status: GlobalStatus) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    rmp_serde::to_vec_named(&GlobalStatsDocument {
        kind: MESSAGE_GLOBAL_STATS,
        brightness: status.brightness,
        on: status.on,
        follow_sun: status.follow_sun,
    })
}

/// `{type: "effectConfig", effects: [...]}`
#[derive(Serialize)]
struct CatalogDocument {
    #[serde(rename = "type")]
    kind: &'static str,
    effects: Vec<&'static EffectSchema>,
}

/// Catalog schema document for configuration UIs
pub fn encode_catalog() -> Result<Vec<u8>, rmp_serde::encode::Error> {
    rmp_serde::to_vec_named(&CatalogDocument {
        kind: MESSAGE_EFFECT_CONFIG,
        effects: effect::schemas().collect(),
    })
}

/// Documents sent to a freshly connected client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    /// Current state document
    pub state: Vec<u8>,
    /// Global status document
    pub global: Vec<u8>,
    /// Catalog schema document
    pub catalog: Vec<u8>,
}
