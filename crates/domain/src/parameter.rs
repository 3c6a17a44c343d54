//! Parameter: a single named value descriptor inside a paramset.
//!
//! A parameter is built from the raw field mapping found in templates and
//! snapshots (`name`, `type`, `operations`, `default`, `min`, `max`, …) and
//! serializes back to the same mapping, current value included.

use serde::{Deserialize, Serialize};

use crate::error::ParameterError;

/// The parameter may be read.
pub const OPERATION_READ: u8 = 1;
/// The parameter may be written.
pub const OPERATION_WRITE: u8 = 2;

const DEFAULT_OPERATIONS: u8 = OPERATION_READ | OPERATION_WRITE;

/// Logical type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParameterType {
    Bool,
    Action,
    Integer,
    Float,
    Enum,
    String,
}

impl ParameterType {
    /// Value used when neither a current value nor a default is defined.
    #[must_use]
    pub fn zero(self) -> ParameterValue {
        match self {
            Self::Bool | Self::Action => ParameterValue::Bool(false),
            Self::Integer | Self::Enum => ParameterValue::Int(0),
            Self::Float => ParameterValue::Float(0.0),
            Self::String => ParameterValue::String(String::new()),
        }
    }

    /// Bring a raw mapping value to this type's representation: integers
    /// become floats for `FLOAT`, and `0`/`1` become booleans for `BOOL` and
    /// `ACTION`. Anything else is kept as is.
    #[allow(clippy::cast_precision_loss)]
    fn conform(self, value: ParameterValue) -> ParameterValue {
        match (self, value) {
            (Self::Float, ParameterValue::Int(i)) => ParameterValue::Float(i as f64),
            (Self::Bool | Self::Action, ParameterValue::Int(i @ (0 | 1))) => {
                ParameterValue::Bool(i == 1)
            }
            (_, value) => value,
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Self::Bool | Self::Action => "boolean",
            Self::Integer | Self::Enum => "integer",
            Self::Float => "float",
            Self::String => "string",
        }
    }
}

/// A single typed parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl ParameterValue {
    #[allow(clippy::cast_precision_loss)]
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Bool(_) | Self::String(_) => None,
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// A named special value (e.g. `NOT_USED`) outside the regular range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialValue {
    pub id: String,
    pub value: ParameterValue,
}

fn default_operations() -> u8 {
    DEFAULT_OPERATIONS
}

fn is_default_operations(operations: &u8) -> bool {
    *operations == DEFAULT_OPERATIONS
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// A parameter definition together with its current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    #[serde(
        default = "default_operations",
        skip_serializing_if = "is_default_operations"
    )]
    pub operations: u8,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub flags: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ParameterValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<ParameterValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<ParameterValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub tab_order: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub special: Vec<SpecialValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub valuelist: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<ParameterValue>,
}

impl Parameter {
    /// Build a parameter from its raw field mapping.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::MissingField`] when `name` or `type` is
    /// absent and [`ParameterError::InvalidDefinition`] when any field has
    /// the wrong shape.
    pub fn from_fields(fields: &serde_json::Value) -> Result<Self, ParameterError> {
        for required in ["name", "type"] {
            if fields.get(required).is_none() {
                return Err(ParameterError::MissingField(required));
            }
        }
        let mut parameter: Self = serde_json::from_value(fields.clone())
            .map_err(|err| ParameterError::InvalidDefinition(err.to_string()))?;
        let kind = parameter.kind;
        for slot in [
            &mut parameter.default,
            &mut parameter.value,
            &mut parameter.min,
            &mut parameter.max,
        ] {
            *slot = slot.take().map(|value| kind.conform(value));
        }
        for special in &mut parameter.special {
            special.value = kind.conform(special.value.clone());
        }
        Ok(parameter)
    }

    /// Whether the operations mask allows writes.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.operations & OPERATION_WRITE != 0
    }

    /// The current value, falling back to the default and then the type's zero.
    #[must_use]
    pub fn value(&self) -> ParameterValue {
        self.value
            .clone()
            .or_else(|| self.default.clone())
            .unwrap_or_else(|| self.kind.zero())
    }

    /// Write a new current value.
    ///
    /// Integers are accepted for `FLOAT` parameters and `0`/`1` for `BOOL`
    /// and `ACTION` parameters; numeric values must lie within `min`/`max`.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::NotWritable`], [`ParameterError::TypeMismatch`]
    /// or [`ParameterError::OutOfRange`]; the stored value is left unchanged.
    pub fn set_value(&mut self, value: ParameterValue) -> Result<(), ParameterError> {
        if !self.is_writable() {
            return Err(ParameterError::NotWritable(self.name.clone()));
        }
        let value = self.coerce(value)?;
        self.check_range(&value)?;
        self.value = Some(value);
        Ok(())
    }

    /// Static description in paramset-description form.
    #[must_use]
    pub fn description(&self) -> ParameterDescription {
        ParameterDescription {
            id: self.name.clone(),
            kind: self.kind,
            operations: self.operations,
            flags: self.flags,
            default: self.default.clone().unwrap_or_else(|| self.kind.zero()),
            min: self.min.clone(),
            max: self.max.clone(),
            unit: self.unit.clone().unwrap_or_default(),
            tab_order: self.tab_order,
            control: self.control.clone().unwrap_or_default(),
            value_list: self.valuelist.clone(),
            special: self
                .special
                .iter()
                .map(|s| SpecialDescription {
                    id: s.id.clone(),
                    value: s.value.clone(),
                })
                .collect(),
        }
    }

    fn coerce(&self, value: ParameterValue) -> Result<ParameterValue, ParameterError> {
        let coerced = match (self.kind, value) {
            (ParameterType::Bool | ParameterType::Action, ParameterValue::Bool(b)) => {
                Some(ParameterValue::Bool(b))
            }
            (ParameterType::Bool | ParameterType::Action, ParameterValue::Int(i @ (0 | 1))) => {
                Some(ParameterValue::Bool(i == 1))
            }
            (ParameterType::Integer | ParameterType::Enum, ParameterValue::Int(i)) => {
                Some(ParameterValue::Int(i))
            }
            (ParameterType::Float, v @ (ParameterValue::Int(_) | ParameterValue::Float(_))) => {
                v.as_f64().map(ParameterValue::Float)
            }
            (ParameterType::String, ParameterValue::String(s)) => Some(ParameterValue::String(s)),
            _ => None,
        };
        coerced.ok_or_else(|| ParameterError::TypeMismatch {
            name: self.name.clone(),
            expected: self.kind.expected(),
        })
    }

    fn check_range(&self, value: &ParameterValue) -> Result<(), ParameterError> {
        if self.special.iter().any(|s| &s.value == value) {
            return Ok(());
        }
        if self.kind == ParameterType::Enum && !self.valuelist.is_empty() {
            let in_list = matches!(value, ParameterValue::Int(i)
                if usize::try_from(*i).is_ok_and(|i| i < self.valuelist.len()));
            if !in_list {
                return Err(ParameterError::OutOfRange(self.name.clone()));
            }
        }
        let Some(v) = value.as_f64() else {
            return Ok(());
        };
        let below = self.min.as_ref().and_then(ParameterValue::as_f64).is_some_and(|min| v < min);
        let above = self.max.as_ref().and_then(ParameterValue::as_f64).is_some_and(|max| v > max);
        if below || above {
            return Err(ParameterError::OutOfRange(self.name.clone()));
        }
        Ok(())
    }
}

/// Paramset-description entry for a single parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ParameterDescription {
    pub id: String,
    #[serde(rename = "TYPE")]
    pub kind: ParameterType,
    pub operations: u8,
    pub flags: u32,
    pub default: ParameterValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<ParameterValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<ParameterValue>,
    pub unit: String,
    pub tab_order: u32,
    pub control: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub value_list: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub special: Vec<SpecialDescription>,
}

/// Description form of a [`SpecialValue`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SpecialDescription {
    pub id: String,
    pub value: ParameterValue,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn level() -> Parameter {
        Parameter::from_fields(&json!({
            "name": "LEVEL",
            "type": "FLOAT",
            "operations": 7,
            "default": 0.0,
            "min": 0.0,
            "max": 1.0,
            "unit": "100%"
        }))
        .unwrap()
    }

    #[test]
    fn should_build_from_minimal_fields() {
        let p = Parameter::from_fields(&json!({"name": "STATE", "type": "BOOL"})).unwrap();
        assert_eq!(p.name, "STATE");
        assert_eq!(p.kind, ParameterType::Bool);
        assert_eq!(p.operations, 3);
        assert_eq!(p.value(), ParameterValue::Bool(false));
    }

    #[test]
    fn should_report_missing_name() {
        let result = Parameter::from_fields(&json!({"type": "BOOL"}));
        assert_eq!(result, Err(ParameterError::MissingField("name")));
    }

    #[test]
    fn should_report_missing_type() {
        let result = Parameter::from_fields(&json!({"name": "STATE"}));
        assert_eq!(result, Err(ParameterError::MissingField("type")));
    }

    #[test]
    fn should_reject_unknown_type() {
        let result = Parameter::from_fields(&json!({"name": "X", "type": "BLOB"}));
        assert!(matches!(result, Err(ParameterError::InvalidDefinition(_))));
    }

    #[test]
    fn should_prefer_stored_value_over_default() {
        let p = Parameter::from_fields(&json!({
            "name": "TEMP", "type": "INTEGER", "default": 5, "value": 9
        }))
        .unwrap();
        assert_eq!(p.value(), ParameterValue::Int(9));
    }

    #[test]
    fn should_fall_back_to_default_value() {
        let p = Parameter::from_fields(&json!({"name": "TEMP", "type": "INTEGER", "default": 5}))
            .unwrap();
        assert_eq!(p.value(), ParameterValue::Int(5));
    }

    #[test]
    fn should_widen_integer_for_float_parameter() {
        let mut p = level();
        p.set_value(ParameterValue::Int(1)).unwrap();
        assert_eq!(p.value(), ParameterValue::Float(1.0));
    }

    #[test]
    fn should_read_integer_mapping_values_as_float() {
        let p = Parameter::from_fields(&json!({
            "name": "LEVEL", "type": "FLOAT", "default": 0, "min": 0, "max": 1
        }))
        .unwrap();
        assert_eq!(p.value(), ParameterValue::Float(0.0));
        assert_eq!(p.min, Some(ParameterValue::Float(0.0)));
        assert_eq!(p.max, Some(ParameterValue::Float(1.0)));

        let stored = Parameter::from_fields(&json!({"name": "LEVEL", "type": "FLOAT", "value": 1}))
            .unwrap();
        assert_eq!(stored.value(), ParameterValue::Float(1.0));
    }

    #[test]
    fn should_read_numeric_bool_default_as_bool() {
        let p = Parameter::from_fields(&json!({"name": "STATE", "type": "BOOL", "default": 1}))
            .unwrap();
        assert_eq!(p.value(), ParameterValue::Bool(true));
    }

    #[test]
    fn should_accept_numeric_bool() {
        let mut p = Parameter::from_fields(&json!({"name": "STATE", "type": "BOOL"})).unwrap();
        p.set_value(ParameterValue::Int(1)).unwrap();
        assert_eq!(p.value(), ParameterValue::Bool(true));
    }

    #[test]
    fn should_reject_value_out_of_range() {
        let mut p = level();
        let result = p.set_value(ParameterValue::Float(1.5));
        assert_eq!(result, Err(ParameterError::OutOfRange("LEVEL".to_string())));
        assert_eq!(p.value(), ParameterValue::Float(0.0));
    }

    #[test]
    fn should_accept_special_value_outside_range() {
        let mut p = Parameter::from_fields(&json!({
            "name": "ON_TIME", "type": "FLOAT", "min": 0.0, "max": 100.0,
            "special": [{"id": "NOT_USED", "value": 111_600.0}]
        }))
        .unwrap();
        p.set_value(ParameterValue::Float(111_600.0)).unwrap();
        assert_eq!(p.value(), ParameterValue::Float(111_600.0));
    }

    #[test]
    fn should_reject_type_mismatch() {
        let mut p = level();
        let result = p.set_value(ParameterValue::String("on".to_string()));
        assert!(matches!(
            result,
            Err(ParameterError::TypeMismatch { expected: "float", .. })
        ));
    }

    #[test]
    fn should_reject_write_to_read_only_parameter() {
        let mut p = Parameter::from_fields(&json!({
            "name": "LOWBAT", "type": "BOOL", "operations": 5
        }))
        .unwrap();
        let result = p.set_value(ParameterValue::Bool(true));
        assert_eq!(result, Err(ParameterError::NotWritable("LOWBAT".to_string())));
    }

    #[test]
    fn should_reject_enum_index_outside_value_list() {
        let mut p = Parameter::from_fields(&json!({
            "name": "MODE", "type": "ENUM", "valuelist": ["AUTO", "MANUAL"]
        }))
        .unwrap();
        assert!(p.set_value(ParameterValue::Int(1)).is_ok());
        assert!(p.set_value(ParameterValue::Int(2)).is_err());
    }

    #[test]
    fn should_serialize_back_to_raw_mapping_with_current_value() {
        let mut p = Parameter::from_fields(&json!({"name": "STATE", "type": "BOOL"})).unwrap();
        p.set_value(ParameterValue::Bool(true)).unwrap();
        let raw = serde_json::to_value(&p).unwrap();
        assert_eq!(raw, json!({"name": "STATE", "type": "BOOL", "value": true}));
    }

    #[test]
    fn should_describe_with_protocol_field_names() {
        let description = serde_json::to_value(level().description()).unwrap();
        assert_eq!(description["ID"], "LEVEL");
        assert_eq!(description["TYPE"], "FLOAT");
        assert_eq!(description["OPERATIONS"], 7);
        assert_eq!(description["MAX"], 1.0);
        assert_eq!(description["UNIT"], "100%");
        assert!(description.get("VALUE").is_none());
    }
}
