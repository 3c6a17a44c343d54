//! Channel: an addressable sub-unit of a device.
//!
//! A channel owns its own paramsets and reports every value change to its
//! device through a [`DeviceRelay`] handed over when the channel is attached.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::{ChannelAddress, DeviceAddress};
use crate::error::ParameterError;
use crate::event::{ChangeKind, DeviceRelay, ParameterChange};
use crate::parameter::{ParameterDescription, ParameterValue};
use crate::paramset::{ParameterSet, ParamsetEntry, ParamsetId, VALUES};
use crate::template::default_version;

/// A channel paramset reference: a bare name, or a full entry with parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelParamsetEntry {
    Name(String),
    Full(ParamsetEntry),
}

impl ChannelParamsetEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Full(entry) => &entry.name,
        }
    }

    fn build(&self) -> Result<ParameterSet, ParameterError> {
        match self {
            Self::Name(name) => Ok(ParameterSet::new(
                name.clone(),
                ParamsetId::Name(name.clone()),
            )),
            Self::Full(entry) => ParameterSet::from_entry(entry),
        }
    }
}

/// Everything needed to instantiate one channel of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelDefinition {
    pub index: u32,
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

/// Channel description as returned to a bus controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ChannelDescription {
    pub address: String,
    pub parent: String,
    pub parent_type: String,
    pub index: u32,
    #[serde(rename = "TYPE")]
    pub channel_type: String,
    pub flags: u32,
    pub direction: u32,
    pub paramsets: Vec<String>,
    pub version: u32,
    pub aes_active: u8,
}

/// A channel and the paramsets it owns.
#[derive(Debug)]
pub struct Channel {
    address: ChannelAddress,
    parent_type: String,
    index: u32,
    channel_type: String,
    flags: u32,
    direction: u32,
    version: u32,
    paramsets: Vec<ParameterSet>,
    relay: Option<DeviceRelay>,
}

impl Channel {
    /// Instantiate a channel of `device`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] when one of the embedded paramset
    /// entries holds an invalid parameter definition.
    pub fn new(
        device: &DeviceAddress,
        parent_type: &str,
        definition: &ChannelDefinition,
    ) -> Result<Self, ParameterError> {
        let paramsets = definition
            .paramsets
            .iter()
            .map(ChannelParamsetEntry::build)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            address: device.channel(definition.index),
            parent_type: parent_type.to_string(),
            index: definition.index,
            channel_type: definition.channel_type.clone(),
            flags: definition.flags,
            direction: definition.direction,
            version: definition.version,
            paramsets,
            relay: None,
        })
    }

    pub(crate) fn attach(&mut self, relay: DeviceRelay) {
        self.relay = Some(relay);
    }

    #[must_use]
    pub fn address(&self) -> &ChannelAddress {
        &self.address
    }

    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[must_use]
    pub fn channel_type(&self) -> &str {
        &self.channel_type
    }

    #[must_use]
    pub fn parent_type(&self) -> &str {
        &self.parent_type
    }

    #[must_use]
    pub fn flags(&self) -> u32 {
        self.flags
    }

    #[must_use]
    pub fn direction(&self) -> u32 {
        self.direction
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    #[must_use]
    pub fn paramsets(&self) -> &[ParameterSet] {
        &self.paramsets
    }

    #[must_use]
    pub fn paramset(&self, name: &str) -> Option<&ParameterSet> {
        self.paramsets.iter().find(|set| set.name() == name)
    }

    /// Current values of the named paramset; empty when the channel has no such set.
    #[must_use]
    pub fn get_paramset(&self, name: &str) -> BTreeMap<String, ParameterValue> {
        self.paramset(name)
            .map(ParameterSet::values)
            .unwrap_or_default()
    }

    /// Static description of the named paramset; empty when absent.
    #[must_use]
    pub fn get_paramset_description(&self, name: &str) -> BTreeMap<String, ParameterDescription> {
        self.paramset(name)
            .map(ParameterSet::description)
            .unwrap_or_default()
    }

    /// Write every value into the named paramset, raising one value change
    /// per accepted write, and return the read-back.
    ///
    /// Refused writes are logged and skipped.
    pub fn put_paramset(
        &mut self,
        name: &str,
        values: BTreeMap<String, ParameterValue>,
    ) -> BTreeMap<String, ParameterValue> {
        for (key, value) in values {
            if let Err(err) = self.set_value(name, &key, value) {
                tracing::warn!(
                    channel = %self.address,
                    paramset = name,
                    key = %key,
                    error = %err,
                    "refused paramset write"
                );
            }
        }
        self.get_paramset(name)
    }

    /// Write a single value and raise a general value change.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::UnknownParamset`] when the channel has no such
    /// set, or whatever the paramset refuses.
    pub fn set_value(
        &mut self,
        paramset: &str,
        name: &str,
        value: ParameterValue,
    ) -> Result<(), ParameterError> {
        let set = self
            .paramsets
            .iter_mut()
            .find(|set| set.name() == paramset)
            .ok_or_else(|| ParameterError::UnknownParamset(paramset.to_string()))?;
        set.put_value(name, value)?;
        let stored = set
            .parameter(name)
            .map(crate::parameter::Parameter::value)
            .ok_or_else(|| ParameterError::Unknown(name.to_string()))?;
        self.emit(ChangeKind::Value, paramset, name, stored);
        Ok(())
    }

    /// Raise an event-sourced value change (key press, motion, …) on the
    /// `VALUES` paramset without storing it.
    pub fn fire_event(&self, name: &str, value: ParameterValue) {
        self.emit(ChangeKind::Event, VALUES, name, value);
    }

    /// Description in device-description protocol form.
    #[must_use]
    pub fn description(&self) -> ChannelDescription {
        ChannelDescription {
            address: self.address.to_string(),
            parent: self.address.device().to_string(),
            parent_type: self.parent_type.clone(),
            index: self.index,
            channel_type: self.channel_type.clone(),
            flags: self.flags,
            direction: self.direction,
            paramsets: self
                .paramsets
                .iter()
                .map(|set| set.name().to_string())
                .collect(),
            version: self.version,
            aes_active: 0,
        }
    }

    fn emit(&self, kind: ChangeKind, paramset: &str, name: &str, value: ParameterValue) {
        let change = ParameterChange {
            device: None,
            channel: self.address.clone(),
            paramset: paramset.to_string(),
            name: name.to_string(),
            value,
        };
        match &self.relay {
            Some(relay) => relay.relay(kind, change),
            None => tracing::trace!(
                channel = %self.address,
                event = kind.channel_event_name(),
                "channel not attached, dropping change"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DeviceEventBus;
    use serde_json::json;

    fn switch_definition() -> ChannelDefinition {
        serde_json::from_value(json!({
            "index": 1,
            "type": "SWITCH",
            "flags": 1,
            "direction": 2,
            "paramsets": [
                "MASTER",
                {"name": "VALUES", "id": "sw_values", "parameter": [
                    {"name": "STATE", "type": "BOOL", "operations": 7},
                    {"name": "PRESS_SHORT", "type": "ACTION", "operations": 6}
                ]}
            ],
            "version": 1
        }))
        .unwrap()
    }

    fn switch() -> Channel {
        let device = DeviceAddress::new("ABC1234567").unwrap();
        Channel::new(&device, "SW1", &switch_definition()).unwrap()
    }

    #[test]
    fn should_address_channel_by_device_and_index() {
        let channel = switch();
        assert_eq!(channel.address().as_str(), "ABC1234567:1");
        assert_eq!(channel.index(), 1);
        assert_eq!(channel.channel_type(), "SWITCH");
        assert_eq!(channel.parent_type(), "SW1");
    }

    #[test]
    fn should_create_empty_set_for_bare_name() {
        let channel = switch();
        let master = channel.paramset("MASTER").unwrap();
        assert!(master.parameters().is_empty());
        assert_eq!(channel.paramset("VALUES").unwrap().parameters().len(), 2);
    }

    #[test]
    fn should_return_empty_paramset_for_unknown_name() {
        assert!(switch().get_paramset("LINK").is_empty());
        assert!(switch().get_paramset_description("LINK").is_empty());
    }

    #[test]
    fn should_store_value_and_emit_general_change() {
        let mut channel = switch();
        let bus = DeviceEventBus::new();
        let mut rx = bus.subscribe(ChangeKind::Value);
        let device = DeviceAddress::new("ABC1234567").unwrap();
        channel.attach(DeviceRelay::new(device.clone(), bus));

        channel
            .set_value("VALUES", "STATE", ParameterValue::Bool(true))
            .unwrap();

        assert_eq!(
            channel.get_paramset("VALUES")["STATE"],
            ParameterValue::Bool(true)
        );
        let event = rx.try_recv().unwrap();
        assert_eq!(event.change.name, "STATE");
        assert_eq!(event.change.device, Some(device));
    }

    #[test]
    fn should_not_emit_when_write_is_refused() {
        let mut channel = switch();
        let bus = DeviceEventBus::new();
        let mut rx = bus.subscribe(ChangeKind::Value);
        channel.attach(DeviceRelay::new(
            DeviceAddress::new("ABC1234567").unwrap(),
            bus,
        ));

        let result = channel.set_value("VALUES", "NOPE", ParameterValue::Bool(true));
        assert_eq!(result, Err(ParameterError::Unknown("NOPE".to_string())));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn should_reject_unknown_channel_paramset() {
        let mut channel = switch();
        let result = channel.set_value("LINK", "STATE", ParameterValue::Bool(true));
        assert_eq!(
            result,
            Err(ParameterError::UnknownParamset("LINK".to_string()))
        );
    }

    #[test]
    fn should_apply_valid_keys_of_put_paramset() {
        let mut channel = switch();
        let mut values = BTreeMap::new();
        values.insert("STATE".to_string(), ParameterValue::Bool(true));
        values.insert("NOPE".to_string(), ParameterValue::Int(1));

        let read_back = channel.put_paramset("VALUES", values);
        assert_eq!(read_back["STATE"], ParameterValue::Bool(true));
        assert!(!read_back.contains_key("NOPE"));
    }

    #[test]
    fn should_fire_event_without_storing() {
        let mut channel = switch();
        let bus = DeviceEventBus::new();
        let mut events = bus.subscribe(ChangeKind::Event);
        channel.attach(DeviceRelay::new(
            DeviceAddress::new("ABC1234567").unwrap(),
            bus,
        ));

        channel.fire_event("PRESS_SHORT", ParameterValue::Bool(true));

        let event = events.try_recv().unwrap();
        assert_eq!(event.name(), "event_device_channel_value_change");
        assert_eq!(event.change.paramset, "VALUES");
        assert_eq!(
            channel.get_paramset("VALUES")["PRESS_SHORT"],
            ParameterValue::Bool(false)
        );
    }

    #[test]
    fn should_describe_with_parent() {
        let description = serde_json::to_value(switch().description()).unwrap();
        assert_eq!(description["ADDRESS"], "ABC1234567:1");
        assert_eq!(description["PARENT"], "ABC1234567");
        assert_eq!(description["PARENT_TYPE"], "SW1");
        assert_eq!(description["TYPE"], "SWITCH");
        assert_eq!(description["PARAMSETS"], json!(["MASTER", "VALUES"]));
    }
}
