//! Validated configuration values

use std::collections::BTreeMap;

use crate::color::Rgb;
use crate::schema::{EffectSchema, FieldKind, FieldSpec};

/// A value of one field, tagged with the field kind
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Color(Rgb),
    /// Ordinal of the selected option
    Enum(usize),
    Flag(bool),
    Opaque(String),
}

impl FieldValue {
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Number(_) => FieldKind::Number,
            Self::Color(_) => FieldKind::Color,
            Self::Enum(_) => FieldKind::Enum,
            Self::Flag(_) => FieldKind::Flag,
            Self::Opaque(_) => FieldKind::Opaque,
        }
    }
}

/// Validated parameter set of one effect slot
///
/// Keyed by field position in the effect schema. Only the validator builds
/// these, so every present value matches its field's kind and constraints.
/// Absent optional fields read as the schema default through the typed
/// accessors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectConfig {
    values: BTreeMap<usize, FieldValue>,
}

impl EffectConfig {
    pub(crate) const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, index: usize, value: FieldValue) {
        self.values.insert(index, value);
    }

    pub fn get(&self, index: usize) -> Option<&FieldValue> {
        self.values.get(&index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.values.contains_key(&index)
    }

    /// Present values in field order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &FieldValue)> {
        self.values.iter().map(|(index, value)| (*index, value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn text<'a>(&'a self, schema: &EffectSchema, index: usize) -> Option<&'a str> {
        match self.get(index) {
            Some(FieldValue::Text(text)) => Some(text.as_str()),
            _ => match schema.field(index)?.spec {
                FieldSpec::Text(spec) => spec.default,
                _ => None,
            },
        }
    }

    pub fn number(&self, schema: &EffectSchema, index: usize) -> Option<f64> {
        match self.get(index) {
            Some(FieldValue::Number(value)) => Some(*value),
            _ => match schema.field(index)?.spec {
                FieldSpec::Number(spec) => spec.default,
                _ => None,
            },
        }
    }

    pub fn color(&self, schema: &EffectSchema, index: usize) -> Option<Rgb> {
        match self.get(index) {
            Some(FieldValue::Color(color)) => Some(*color),
            _ => match schema.field(index)?.spec {
                FieldSpec::Color(spec) => Some(spec.default),
                _ => None,
            },
        }
    }

    pub fn option(&self, schema: &EffectSchema, index: usize) -> Option<usize> {
        match self.get(index) {
            Some(FieldValue::Enum(ordinal)) => Some(*ordinal),
            _ => match schema.field(index)?.spec {
                FieldSpec::Enum(spec) => spec.default_option(),
                _ => None,
            },
        }
    }

    pub fn flag(&self, schema: &EffectSchema, index: usize) -> bool {
        match self.get(index) {
            Some(FieldValue::Flag(value)) => *value,
            _ => match schema.field(index).map(|field| field.spec) {
                Some(FieldSpec::Flag(spec)) => spec.default,
                _ => false,
            },
        }
    }

    pub fn opaque<'a>(&'a self, schema: &EffectSchema, index: usize) -> Option<&'a str> {
        match self.get(index) {
            Some(FieldValue::Opaque(text)) => Some(text.as_str()),
            _ => match schema.field(index)?.spec {
                FieldSpec::Opaque(spec) => spec.default,
                _ => None,
            },
        }
    }
}
