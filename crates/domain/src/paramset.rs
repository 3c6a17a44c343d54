//! Paramset: an ordered, named collection of [`Parameter`]s.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ParameterError;
use crate::parameter::{Parameter, ParameterDescription, ParameterValue};

/// Configuration paramset; the default when no name is requested.
pub const MASTER: &str = "MASTER";
/// Live values paramset.
pub const VALUES: &str = "VALUES";
/// Link paramset; requested by passing the device's own address.
pub const LINK: &str = "LINK";

/// Identifier of a paramset, numeric in most templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamsetId {
    Number(i64),
    Name(String),
}

impl Default for ParamsetId {
    fn default() -> Self {
        Self::Number(0)
    }
}

impl fmt::Display for ParamsetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => n.fmt(f),
            Self::Name(s) => f.write_str(s),
        }
    }
}

/// Raw paramset entry as found in templates and snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamsetEntry {
    pub name: String,
    #[serde(default)]
    pub id: ParamsetId,
    /// Raw parameter field mappings, see [`Parameter::from_fields`].
    #[serde(default)]
    pub parameter: Vec<serde_json::Value>,
}

/// A named set of parameters with their current values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSet {
    name: String,
    id: ParamsetId,
    #[serde(rename = "parameter")]
    parameters: Vec<Parameter>,
}

impl ParameterSet {
    /// Create an empty set.
    #[must_use]
    pub fn new(name: impl Into<String>, id: ParamsetId) -> Self {
        Self {
            name: name.into(),
            id,
            parameters: Vec::new(),
        }
    }

    /// Build a set and all of its parameters from a raw entry.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParameterError`] raised by a parameter definition.
    pub fn from_entry(entry: &ParamsetEntry) -> Result<Self, ParameterError> {
        let mut set = Self::new(entry.name.clone(), entry.id.clone());
        for fields in &entry.parameter {
            set.add_parameter(Parameter::from_fields(fields)?);
        }
        Ok(set)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The identifier representation returned by `getParamsetId`.
    #[must_use]
    pub fn paramset_id(&self) -> &ParamsetId {
        &self.id
    }

    /// Append a parameter, keeping definition order.
    pub fn add_parameter(&mut self, parameter: Parameter) {
        self.parameters.push(parameter);
    }

    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Current values keyed by parameter name.
    #[must_use]
    pub fn values(&self) -> BTreeMap<String, ParameterValue> {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.value()))
            .collect()
    }

    /// Static descriptions keyed by parameter name.
    #[must_use]
    pub fn description(&self) -> BTreeMap<String, ParameterDescription> {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.description()))
            .collect()
    }

    /// Write a single value by parameter name.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::Unknown`] when no parameter has that name,
    /// or whatever [`Parameter::set_value`] refuses.
    pub fn put_value(&mut self, key: &str, value: ParameterValue) -> Result<(), ParameterError> {
        self.parameters
            .iter_mut()
            .find(|p| p.name == key)
            .ok_or_else(|| ParameterError::Unknown(key.to_string()))?
            .set_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn master() -> ParameterSet {
        let entry: ParamsetEntry = serde_json::from_value(json!({
            "name": "MASTER",
            "id": "sw_master",
            "parameter": [
                {"name": "AES_ACTIVE", "type": "BOOL", "default": false},
                {"name": "TRANSMIT_TRY_MAX", "type": "INTEGER", "min": 1, "max": 10, "default": 6}
            ]
        }))
        .unwrap();
        ParameterSet::from_entry(&entry).unwrap()
    }

    #[test]
    fn should_build_every_parameter_from_entry() {
        let set = master();
        assert_eq!(set.name(), MASTER);
        assert_eq!(set.parameters().len(), 2);
        assert_eq!(set.paramset_id(), &ParamsetId::Name("sw_master".to_string()));
    }

    #[test]
    fn should_default_id_and_parameters_when_absent() {
        let entry: ParamsetEntry = serde_json::from_value(json!({"name": "LINK"})).unwrap();
        let set = ParameterSet::from_entry(&entry).unwrap();
        assert_eq!(set.paramset_id(), &ParamsetId::Number(0));
        assert!(set.values().is_empty());
    }

    #[test]
    fn should_fail_when_a_parameter_is_invalid() {
        let entry: ParamsetEntry =
            serde_json::from_value(json!({"name": "VALUES", "parameter": [{"name": "X"}]}))
                .unwrap();
        assert_eq!(
            ParameterSet::from_entry(&entry),
            Err(ParameterError::MissingField("type"))
        );
    }

    #[test]
    fn should_read_current_values_by_name() {
        let values = master().values();
        assert_eq!(values.get("AES_ACTIVE"), Some(&ParameterValue::Bool(false)));
        assert_eq!(values.get("TRANSMIT_TRY_MAX"), Some(&ParameterValue::Int(6)));
    }

    #[test]
    fn should_write_value_by_key() {
        let mut set = master();
        set.put_value("TRANSMIT_TRY_MAX", ParameterValue::Int(3))
            .unwrap();
        assert_eq!(
            set.values().get("TRANSMIT_TRY_MAX"),
            Some(&ParameterValue::Int(3))
        );
    }

    #[test]
    fn should_refuse_write_to_unknown_key() {
        let mut set = master();
        let result = set.put_value("NOPE", ParameterValue::Int(1));
        assert_eq!(result, Err(ParameterError::Unknown("NOPE".to_string())));
    }

    #[test]
    fn should_describe_independently_of_current_values() {
        let mut set = master();
        let before = set.description();
        set.put_value("TRANSMIT_TRY_MAX", ParameterValue::Int(2))
            .unwrap();
        assert_eq!(set.description(), before);
        assert_eq!(before["TRANSMIT_TRY_MAX"].max, Some(ParameterValue::Int(10)));
    }

    #[test]
    fn should_serialize_in_entry_shape() {
        let set = master();
        let raw = serde_json::to_value(&set).unwrap();
        let entry: ParamsetEntry = serde_json::from_value(raw).unwrap();
        assert_eq!(ParameterSet::from_entry(&entry).unwrap(), set);
    }
}
