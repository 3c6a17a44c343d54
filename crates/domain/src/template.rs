//! Device-type template: the structure a new device is materialized from.
//!
//! Templates are keyed by device type and look like:
//!
//! ```json
//! {"type": "SW1", "version": 1,
//!  "channels": [{"adress": 1, "type": "SWITCH", "flags": 0, "direction": 1,
//!                "paramsets": ["VALUES"], "version": 1}],
//!  "paramsets": [{"name": "VALUES", "id": 0,
//!                 "parameter": [{"name": "STATE", "type": "BOOL"}]}]}
//! ```

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelDefinition, ChannelParamsetEntry};
use crate::error::TemplateError;
use crate::paramset::ParamsetEntry;

pub(crate) fn default_version() -> u32 {
    1
}

/// A parsed device-type template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceTemplate {
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub channels: Vec<ChannelTemplate>,
    #[serde(default)]
    pub paramsets: Vec<ParamsetEntry>,
}

impl DeviceTemplate {
    /// Parse a template document for `device_type`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Parse`] when the text is not a valid template.
    pub fn from_json(device_type: &str, text: &str) -> Result<Self, TemplateError> {
        serde_json::from_str(text).map_err(|source| TemplateError::Parse {
            device_type: device_type.to_string(),
            source,
        })
    }

    /// Number of channels the template materializes once address lists are flattened.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.iter().map(|c| c.address.indexes().len()).sum()
    }
}

/// Channel index, or a list of indexes sharing one channel definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelIndexes {
    One(u32),
    Many(Vec<u32>),
}

impl ChannelIndexes {
    #[must_use]
    pub fn indexes(&self) -> Vec<u32> {
        match self {
            Self::One(index) => vec![*index],
            Self::Many(indexes) => indexes.clone(),
        }
    }
}

/// A channel definition inside a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelTemplate {
    #[serde(rename = "adress")]
    pub address: ChannelIndexes,
    #[serde(rename = "type")]
    pub channel_type: String,
    #[serde(default)]
    pub flags: u32,
    #[serde(default)]
    pub direction: u32,
    #[serde(default)]
    pub paramsets: Vec<ChannelParamsetEntry>,
    #[serde(default = "default_version")]
    pub version: u32,
}

impl ChannelTemplate {
    /// One definition per index, all sharing this entry's type, flags,
    /// direction, paramsets and version.
    #[must_use]
    pub fn definitions(&self) -> Vec<ChannelDefinition> {
        self.address
            .indexes()
            .into_iter()
            .map(|index| ChannelDefinition {
                index,
                channel_type: self.channel_type.clone(),
                flags: self.flags,
                direction: self.direction,
                paramsets: self.paramsets.clone(),
                version: self.version,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIMMER: &str = r#"{
        "type": "HM-LC-Dim1T",
        "version": 2,
        "channels": [
            {"adress": 0, "type": "MAINTENANCE", "flags": 3, "direction": 0, "paramsets": ["MASTER", "VALUES"], "version": 1},
            {"adress": [1, 2, 3], "type": "DIMMER", "flags": 1, "direction": 2, "paramsets": ["VALUES"], "version": 1}
        ],
        "paramsets": [
            {"name": "MASTER", "id": "dim_dev_master", "parameter": [{"name": "LOCAL_RESET_DISABLE", "type": "BOOL"}]}
        ]
    }"#;

    #[test]
    fn should_parse_single_and_list_addresses() {
        let template = DeviceTemplate::from_json("HM-LC-Dim1T", DIMMER).unwrap();
        assert_eq!(template.device_type, "HM-LC-Dim1T");
        assert_eq!(template.version, 2);
        assert_eq!(template.channels[0].address, ChannelIndexes::One(0));
        assert_eq!(template.channels[1].address, ChannelIndexes::Many(vec![1, 2, 3]));
        assert_eq!(template.channel_count(), 4);
    }

    #[test]
    fn should_expand_address_list_into_shared_definitions() {
        let template = DeviceTemplate::from_json("HM-LC-Dim1T", DIMMER).unwrap();
        let definitions = template.channels[1].definitions();
        let indexes: Vec<u32> = definitions.iter().map(|d| d.index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
        assert!(definitions.iter().all(|d| d.channel_type == "DIMMER" && d.direction == 2));
    }

    #[test]
    fn should_default_optional_sections() {
        let template = DeviceTemplate::from_json("EMPTY", r#"{"type": "EMPTY"}"#).unwrap();
        assert_eq!(template.version, 1);
        assert!(template.channels.is_empty());
        assert!(template.paramsets.is_empty());
    }

    #[test]
    fn should_report_parse_error_with_device_type() {
        let err = DeviceTemplate::from_json("BROKEN", "{not json").unwrap_err();
        assert!(matches!(err, TemplateError::Parse { ref device_type, .. } if device_type == "BROKEN"));
    }
}
