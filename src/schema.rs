//! Field schemas
//!
//! Immutable descriptions of the configurable parameters of an effect kind.
//! Every schema is `const` data compiled into the effect catalog.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::color::Rgb;
use crate::error::ValidationReason;
use crate::value::FieldValue;

/// Kind of a configurable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Color,
    Enum,
    Flag,
    Opaque,
}

/// Free-form text with length bounds (counted in UTF-8 bytes)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextSpec {
    pub min_len: usize,
    pub max_len: usize,
    pub default: Option<&'static str>,
    pub required: bool,
}

impl TextSpec {
    pub const fn new(min_len: usize, max_len: usize) -> Self {
        Self {
            min_len,
            max_len,
            default: None,
            required: false,
        }
    }

    #[must_use]
    pub const fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn check(&self, text: &str) -> Result<(), ValidationReason> {
        let len = text.len();
        if len < self.min_len || len > self.max_len {
            return Err(ValidationReason::LengthBounds);
        }
        Ok(())
    }
}

/// Number on the grid `min + k * step` within `[min, max]`
///
/// A non-positive `step` disables the grid check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberSpec {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: Option<f64>,
    pub required: bool,
}

impl NumberSpec {
    pub const fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            step: 1.0,
            default: None,
            required: false,
        }
    }

    #[must_use]
    pub const fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    #[must_use]
    pub const fn with_default(mut self, default: f64) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn check(&self, value: f64) -> Result<(), ValidationReason> {
        if !value.is_finite() || value < self.min || value > self.max {
            return Err(ValidationReason::OutOfRange);
        }
        if self.step > 0.0 && libm::fmod(value - self.min, self.step) != 0.0 {
            return Err(ValidationReason::NotOnStep);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSpec {
    pub default: Rgb,
    pub required: bool,
}

impl ColorSpec {
    pub const fn new(default: Rgb) -> Self {
        Self {
            default,
            required: false,
        }
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// One of a fixed, ordered list of option names
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnumSpec {
    pub options: &'static [&'static str],
    pub default_index: usize,
    pub required: bool,
}

impl EnumSpec {
    pub const fn new(options: &'static [&'static str], default_index: usize) -> Self {
        Self {
            options,
            default_index,
            required: false,
        }
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Ordinal of an option name (case-sensitive)
    pub fn position(&self, name: &str) -> Option<usize> {
        self.options.iter().position(|option| *option == name)
    }

    pub fn option(&self, index: usize) -> Option<&'static str> {
        self.options.get(index).copied()
    }

    /// Default ordinal, if it names an existing option
    pub fn default_option(&self) -> Option<usize> {
        (self.default_index < self.options.len()).then_some(self.default_index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlagSpec {
    pub default: bool,
}

impl FlagSpec {
    pub const fn new(default: bool) -> Self {
        Self { default }
    }
}

/// Uninterpreted text handed to the effect as is
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpaqueSpec {
    pub default: Option<&'static str>,
    pub required: bool,
}

impl OpaqueSpec {
    pub const fn new() -> Self {
        Self {
            default: None,
            required: false,
        }
    }

    #[must_use]
    pub const fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Default usable as a fallback; empty text does not count
    pub fn usable_default(&self) -> Option<&'static str> {
        self.default.filter(|text| !text.is_empty())
    }
}

impl Default for OpaqueSpec {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldSpec {
    Text(TextSpec),
    Number(NumberSpec),
    Color(ColorSpec),
    Enum(EnumSpec),
    Flag(FlagSpec),
    Opaque(OpaqueSpec),
}

/// A named, described field of an effect schema
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub spec: FieldSpec,
}

impl FieldSchema {
    pub const fn new(name: &'static str, description: &'static str, spec: FieldSpec) -> Self {
        Self {
            name,
            description,
            spec,
        }
    }

    pub const fn text(name: &'static str, description: &'static str, spec: TextSpec) -> Self {
        Self::new(name, description, FieldSpec::Text(spec))
    }

    pub const fn number(name: &'static str, description: &'static str, spec: NumberSpec) -> Self {
        Self::new(name, description, FieldSpec::Number(spec))
    }

    pub const fn color(name: &'static str, description: &'static str, spec: ColorSpec) -> Self {
        Self::new(name, description, FieldSpec::Color(spec))
    }

    pub const fn choice(name: &'static str, description: &'static str, spec: EnumSpec) -> Self {
        Self::new(name, description, FieldSpec::Enum(spec))
    }

    pub const fn flag(name: &'static str, description: &'static str, spec: FlagSpec) -> Self {
        Self::new(name, description, FieldSpec::Flag(spec))
    }

    pub const fn opaque(name: &'static str, description: &'static str, spec: OpaqueSpec) -> Self {
        Self::new(name, description, FieldSpec::Opaque(spec))
    }

    pub const fn kind(&self) -> FieldKind {
        match self.spec {
            FieldSpec::Text(_) => FieldKind::Text,
            FieldSpec::Number(_) => FieldKind::Number,
            FieldSpec::Color(_) => FieldKind::Color,
            FieldSpec::Enum(_) => FieldKind::Enum,
            FieldSpec::Flag(_) => FieldKind::Flag,
            FieldSpec::Opaque(_) => FieldKind::Opaque,
        }
    }

    pub const fn is_required(&self) -> bool {
        match self.spec {
            FieldSpec::Text(spec) => spec.required,
            FieldSpec::Number(spec) => spec.required,
            FieldSpec::Color(spec) => spec.required,
            FieldSpec::Enum(spec) => spec.required,
            FieldSpec::Opaque(spec) => spec.required,
            FieldSpec::Flag(_) => false,
        }
    }

    /// Value an absent field stands for when an effect consumes its config
    pub fn default_value(&self) -> Option<FieldValue> {
        match self.spec {
            FieldSpec::Text(spec) => spec.default.map(|text| FieldValue::Text(text.into())),
            FieldSpec::Number(spec) => spec.default.map(FieldValue::Number),
            FieldSpec::Color(spec) => Some(FieldValue::Color(spec.default)),
            FieldSpec::Enum(spec) => spec.default_option().map(FieldValue::Enum),
            FieldSpec::Flag(spec) => Some(FieldValue::Flag(spec.default)),
            FieldSpec::Opaque(spec) => spec.default.map(|text| FieldValue::Opaque(text.into())),
        }
    }

    fn descriptor_len(&self) -> usize {
        // title, description, type
        3 + match self.spec {
            FieldSpec::Number(_) => 5,
            FieldSpec::Text(_) | FieldSpec::Color(_) => 4,
            FieldSpec::Enum(_) => 3,
            FieldSpec::Flag(_) => 1,
            FieldSpec::Opaque(_) => 2,
        }
    }
}

/// Field descriptor used by configuration UIs
impl Serialize for FieldSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.descriptor_len()))?;
        map.serialize_entry("title", self.name)?;
        map.serialize_entry("description", self.description)?;
        match self.spec {
            FieldSpec::Text(spec) => {
                map.serialize_entry("type", "string")?;
                map.serialize_entry("minLength", &spec.min_len)?;
                map.serialize_entry("maxLength", &spec.max_len)?;
                map.serialize_entry("defaultValue", &spec.default)?;
                map.serialize_entry("required", &spec.required)?;
            }
            FieldSpec::Number(spec) => {
                map.serialize_entry("type", "number")?;
                map.serialize_entry("min", &spec.min)?;
                map.serialize_entry("max", &spec.max)?;
                map.serialize_entry("stepBy", &spec.step)?;
                map.serialize_entry("defaultValue", &spec.default)?;
                map.serialize_entry("required", &spec.required)?;
            }
            FieldSpec::Color(spec) => {
                map.serialize_entry("type", "color")?;
                map.serialize_entry("defaultR", &spec.default.r)?;
                map.serialize_entry("defaultG", &spec.default.g)?;
                map.serialize_entry("defaultB", &spec.default.b)?;
                map.serialize_entry("required", &spec.required)?;
            }
            FieldSpec::Enum(spec) => {
                map.serialize_entry("type", "select")?;
                map.serialize_entry("options", spec.options)?;
                map.serialize_entry("defaultValue", &spec.default_index)?;
                map.serialize_entry("required", &spec.required)?;
            }
            FieldSpec::Flag(spec) => {
                map.serialize_entry("type", "boolean")?;
                map.serialize_entry("defaultValue", &spec.default)?;
            }
            FieldSpec::Opaque(spec) => {
                map.serialize_entry("type", "json")?;
                map.serialize_entry("defaultValue", &spec.default)?;
                map.serialize_entry("required", &spec.required)?;
            }
        }
        map.end()
    }
}

/// Ordered field list of one effect kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectSchema {
    pub name: &'static str,
    pub fields: &'static [FieldSchema],
}

impl EffectSchema {
    pub const fn new(name: &'static str, fields: &'static [FieldSchema]) -> Self {
        Self { name, fields }
    }

    pub fn field(&self, index: usize) -> Option<&FieldSchema> {
        self.fields.get(index)
    }

    /// Position of a field by name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub const fn len(&self) -> usize {
        self.fields.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for EffectSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("name", self.name)?;
        map.serialize_entry("config", self.fields)?;
        map.end()
    }
}
