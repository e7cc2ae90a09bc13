//! Parameter validation
//!
//! Turns a raw parameter set into an [`EffectConfig`] following the schema
//! field by field. Validation is all-or-nothing: the first field without a
//! usable value aborts the whole set.

use crate::color::Rgb;
use crate::error::{ValidationError, ValidationReason};
use crate::raw::{RawParams, RawValue};
use crate::schema::{EffectSchema, FieldSchema, FieldSpec};
use crate::value::{EffectConfig, FieldValue};

/// Validate `raw` against `schema`
///
/// `Null` values count as absent.
pub fn validate(schema: &EffectSchema, raw: &RawParams) -> Result<EffectConfig, ValidationError> {
    let mut config = EffectConfig::new();
    for (index, field) in schema.fields.iter().enumerate() {
        let incoming = raw
            .get(field.name)
            .filter(|value| !matches!(value, RawValue::Null));
        match resolve(field, incoming) {
            Ok(Some(value)) => config.insert(index, value),
            Ok(None) => {}
            Err(reason) => {
                return Err(ValidationError {
                    field: field.name,
                    reason,
                });
            }
        }
    }
    Ok(config)
}

/// Resolve one field; `Ok(None)` omits it from the config
fn resolve(
    field: &FieldSchema,
    incoming: Option<&RawValue>,
) -> Result<Option<FieldValue>, ValidationReason> {
    match field.spec {
        FieldSpec::Text(spec) => {
            let parsed = read_text(incoming)
                .and_then(|text| spec.check(text).map(|()| FieldValue::Text(text.into())));
            with_fallback(parsed, spec.required, || {
                spec.default
                    .filter(|text| spec.check(text).is_ok())
                    .map(|text| FieldValue::Text(text.into()))
            })
        }
        FieldSpec::Number(spec) => {
            let parsed = read_number(incoming)
                .and_then(|value| spec.check(value).map(|()| FieldValue::Number(value)));
            with_fallback(parsed, spec.required, || {
                spec.default
                    .filter(|value| spec.check(*value).is_ok())
                    .map(FieldValue::Number)
            })
        }
        FieldSpec::Color(spec) => {
            let parsed = read_color(incoming).map(FieldValue::Color);
            with_fallback(parsed, spec.required, || Some(FieldValue::Color(spec.default)))
        }
        FieldSpec::Enum(spec) => {
            let parsed = read_text(incoming).and_then(|name| {
                spec.position(name)
                    .map(FieldValue::Enum)
                    .ok_or(ValidationReason::UnknownOption)
            });
            with_fallback(parsed, spec.required, || {
                spec.default_option().map(FieldValue::Enum)
            })
        }
        FieldSpec::Flag(spec) => {
            let value = incoming.map_or(spec.default, truthy);
            Ok(Some(FieldValue::Flag(value)))
        }
        FieldSpec::Opaque(spec) => {
            let parsed = read_text(incoming).map(|text| FieldValue::Opaque(text.into()));
            with_fallback(parsed, spec.required, || {
                spec.usable_default().map(|text| FieldValue::Opaque(text.into()))
            })
        }
    }
}

/// Shared policy for an unusable raw value: optional fields are omitted,
/// required ones take the default, if there is a valid one.
fn with_fallback(
    parsed: Result<FieldValue, ValidationReason>,
    required: bool,
    default: impl FnOnce() -> Option<FieldValue>,
) -> Result<Option<FieldValue>, ValidationReason> {
    match parsed {
        Ok(value) => Ok(Some(value)),
        Err(_) if !required => Ok(None),
        Err(reason) => default().map(Some).ok_or(reason),
    }
}

fn read_text(incoming: Option<&RawValue>) -> Result<&str, ValidationReason> {
    match incoming {
        None => Err(ValidationReason::MissingRequired),
        Some(RawValue::Text(text)) => Ok(text),
        Some(_) => Err(ValidationReason::TypeMismatch),
    }
}

fn read_number(incoming: Option<&RawValue>) -> Result<f64, ValidationReason> {
    match incoming {
        None => Err(ValidationReason::MissingRequired),
        Some(RawValue::Number(value)) => Ok(*value),
        Some(_) => Err(ValidationReason::TypeMismatch),
    }
}

/// Accepts `{r, g, b}` maps and `[r, g, b]` lists of 0-255 integers
fn read_color(incoming: Option<&RawValue>) -> Result<Rgb, ValidationReason> {
    match incoming {
        None => Err(ValidationReason::MissingRequired),
        Some(RawValue::Map(map)) => Ok(Rgb {
            r: read_channel(map.get("r"))?,
            g: read_channel(map.get("g"))?,
            b: read_channel(map.get("b"))?,
        }),
        Some(RawValue::List(items)) if items.len() == 3 => Ok(Rgb {
            r: read_channel(items.first())?,
            g: read_channel(items.get(1))?,
            b: read_channel(items.get(2))?,
        }),
        Some(_) => Err(ValidationReason::TypeMismatch),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn read_channel(value: Option<&RawValue>) -> Result<u8, ValidationReason> {
    let value = value
        .and_then(RawValue::as_f64)
        .ok_or(ValidationReason::TypeMismatch)?;
    if value.fract() != 0.0 || !(0.0..=255.0).contains(&value) {
        return Err(ValidationReason::OutOfRange);
    }
    Ok(value as u8)
}

fn truthy(value: &RawValue) -> bool {
    match value {
        RawValue::Null => false,
        RawValue::Bool(value) => *value,
        RawValue::Number(value) => *value != 0.0,
        RawValue::Text(text) => !text.is_empty(),
        RawValue::List(_) | RawValue::Map(_) => true,
    }
}
