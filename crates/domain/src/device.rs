//! Device: the virtual bus participant and its paramset protocol surface.
//!
//! A device is built exactly once, either from a device-type template or from
//! a persisted snapshot. Both paths build every channel and paramset first and
//! commit them in one step, so a failed construction leaves the device
//! untouched and uninitialized.
//!
//! Paramset requests resolve their name before delegating:
//! no name means `MASTER`, the device's own address means `LINK`, and the
//! first paramset with a matching name wins. A name that matches nothing
//! yields an empty result, never an error.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::address::DeviceAddress;
use crate::channel::{Channel, ChannelDefinition};
use crate::error::{HmviError, ParameterError, SnapshotError, ValidationError};
use crate::event::{ChangeKind, DeviceEventBus, DeviceEventReceiver, DeviceRelay};
use crate::parameter::{ParameterDescription, ParameterValue};
use crate::paramset::{LINK, MASTER, ParameterSet, ParamsetEntry, ParamsetId};
use crate::snapshot::{
    ChannelSnapshot, DeviceSnapshot, PartialDeviceSnapshot, SNAPSHOT_FORMAT_VERSION,
};
use crate::template::DeviceTemplate;

/// Interface name reported in device descriptions.
pub const INTERFACE_NAME: &str = "HM_Virtual";

const DEFAULT_FIRMWARE: &str = "1.0";
const DEFAULT_VERSION: u32 = 1;

/// Device description as returned to a bus controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DeviceDescription {
    pub address: String,
    pub children: Vec<String>,
    pub firmware: String,
    pub flags: u32,
    pub interface: String,
    pub paramsets: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub rf_address: u32,
    pub roaming: u8,
    pub rx_mode: u8,
    #[serde(rename = "TYPE")]
    pub device_type: String,
    pub updatable: u8,
    pub version: u32,
}

/// A virtual device with its channels and paramsets.
#[derive(Debug)]
pub struct Device {
    serial_number: String,
    address: Option<DeviceAddress>,
    device_type: String,
    version: u32,
    firmware: String,
    initialized: bool,
    channels: Vec<Channel>,
    paramsets: Vec<ParameterSet>,
    events: DeviceEventBus,
}

impl Default for Device {
    fn default() -> Self {
        Self {
            serial_number: String::new(),
            address: None,
            device_type: String::new(),
            version: DEFAULT_VERSION,
            firmware: DEFAULT_FIRMWARE.to_string(),
            initialized: false,
            channels: Vec::new(),
            paramsets: Vec::new(),
            events: DeviceEventBus::new(),
        }
    }
}

impl Device {
    /// Build a device of the template's type at `address`.
    ///
    /// # Errors
    ///
    /// See [`Device::init_with_template`].
    pub fn from_template(template: &DeviceTemplate, address: &str) -> Result<Self, HmviError> {
        let mut device = Self::default();
        device.init_with_template(template, address)?;
        Ok(device)
    }

    /// Rebuild a device from the text produced by [`Device::save_persistent`].
    ///
    /// # Errors
    ///
    /// See [`Device::init_with_snapshot`].
    pub fn from_snapshot(text: &str) -> Result<Self, HmviError> {
        let mut device = Self::default();
        device.init_with_snapshot(PartialDeviceSnapshot::from_json(text)?)?;
        Ok(device)
    }

    /// Materialize channels and paramsets from a device-type template.
    ///
    /// Channel entries whose address is a list yield one channel per index.
    ///
    /// # Errors
    ///
    /// Returns [`HmviError::AlreadyInitialized`] on a second construction,
    /// [`HmviError::Validation`] for a bad address or duplicate channel or
    /// paramset, and [`HmviError::Parameter`] for an invalid parameter
    /// definition. The device is left unchanged on error.
    pub fn init_with_template(
        &mut self,
        template: &DeviceTemplate,
        address: &str,
    ) -> Result<(), HmviError> {
        self.ensure_uninitialized()?;
        let address = DeviceAddress::new(address)?;
        tracing::debug!(%address, device_type = %template.device_type, "init with template");

        let definitions: Vec<ChannelDefinition> = template
            .channels
            .iter()
            .flat_map(crate::template::ChannelTemplate::definitions)
            .collect();
        let channels = build_channels(&address, &template.device_type, &definitions)?;
        let paramsets = build_paramsets(&template.paramsets)?;
        check_unique(&channels, &paramsets)?;

        self.serial_number = address.to_string();
        self.device_type.clone_from(&template.device_type);
        self.version = template.version;
        self.commit(address, channels, paramsets);
        Ok(())
    }

    /// Rebuild channels and paramsets from a persisted snapshot.
    ///
    /// `serialNumber`, `adress` and `channels` are required. `firmware`,
    /// `version` and `type` replace the current values only when present.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::MissingField`] (wrapped) when a required field
    /// is absent, plus the errors of [`Device::init_with_template`]. The
    /// device is left unchanged on error.
    pub fn init_with_snapshot(
        &mut self,
        snapshot: PartialDeviceSnapshot,
    ) -> Result<(), HmviError> {
        self.ensure_uninitialized()?;
        let PartialDeviceSnapshot {
            serial_number,
            address,
            firmware,
            version,
            device_type,
            channels,
            paramsets,
            ..
        } = snapshot;

        let (serial_number, address, channels) = match (serial_number, address, channels) {
            (Some(serial), Some(address), Some(channels)) => (serial, address, channels),
            (serial, address, channels) => {
                let missing = if serial.is_none() {
                    "serialNumber"
                } else if address.is_none() {
                    "adress"
                } else {
                    "channels"
                };
                tracing::error!(
                    serial = ?serial,
                    address = ?address,
                    has_channels = channels.is_some(),
                    "cannot init from stored data"
                );
                return Err(SnapshotError::MissingField(missing).into());
            }
        };

        let address = DeviceAddress::new(address)?;
        let device_type = device_type.unwrap_or_else(|| self.device_type.clone());
        tracing::debug!(%address, %device_type, "init with stored data");

        let channels = build_channels(&address, &device_type, &channels)?;
        let paramsets = build_paramsets(&paramsets.unwrap_or_default())?;
        check_unique(&channels, &paramsets)?;

        self.serial_number = serial_number;
        self.device_type = device_type;
        if let Some(firmware) = firmware {
            self.firmware = firmware;
        }
        if let Some(version) = version {
            self.version = version;
        }
        self.commit(address, channels, paramsets);
        Ok(())
    }

    fn ensure_uninitialized(&self) -> Result<(), HmviError> {
        if self.initialized {
            return Err(HmviError::AlreadyInitialized {
                address: self.address_str().to_string(),
            });
        }
        Ok(())
    }

    fn commit(
        &mut self,
        address: DeviceAddress,
        channels: Vec<Channel>,
        paramsets: Vec<ParameterSet>,
    ) {
        for channel in channels {
            self.add_channel(&address, channel);
        }
        self.paramsets = paramsets;
        tracing::debug!(
            %address,
            channels = self.channels.len(),
            paramsets = self.paramsets.len(),
            "device initialized"
        );
        self.address = Some(address);
        self.initialized = true;
    }

    fn add_channel(&mut self, address: &DeviceAddress, mut channel: Channel) {
        channel.attach(DeviceRelay::new(address.clone(), self.events.clone()));
        self.channels.push(channel);
    }

    /// Whether a construction path completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[must_use]
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// The bus address, once initialized.
    #[must_use]
    pub fn address(&self) -> Option<&DeviceAddress> {
        self.address.as_ref()
    }

    fn address_str(&self) -> &str {
        self.address.as_ref().map_or("", DeviceAddress::as_str)
    }

    #[must_use]
    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    #[must_use]
    pub fn firmware(&self) -> &str {
        &self.firmware
    }

    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    #[must_use]
    pub fn channel(&self, address: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.address() == address)
    }

    /// Mutable access for writing channel values; the channel set itself is fixed.
    #[must_use]
    pub fn channel_mut(&mut self, address: &str) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.address() == address)
    }

    #[must_use]
    pub fn channel_with_type_and_index(&self, channel_type: &str, index: u32) -> Option<&Channel> {
        self.channels
            .iter()
            .find(|c| c.channel_type() == channel_type && c.index() == index)
    }

    #[must_use]
    pub fn paramsets(&self) -> &[ParameterSet] {
        &self.paramsets
    }

    /// Subscribe to device-scope value changes of one kind.
    #[must_use]
    pub fn subscribe(&self, kind: ChangeKind) -> DeviceEventReceiver {
        self.events.subscribe(kind)
    }

    /// Apply the paramset aliasing rule to a requested name.
    #[must_use]
    pub fn resolve_paramset_name<'a>(&self, name: Option<&'a str>) -> &'a str {
        match name {
            None => MASTER,
            Some(name) if self.address.as_ref().is_some_and(|a| a.as_str() == name) => LINK,
            Some(name) => name,
        }
    }

    fn resolve(&self, name: Option<&str>) -> Option<&ParameterSet> {
        let resolved = self.resolve_paramset_name(name);
        self.paramsets.iter().find(|set| set.name() == resolved)
    }

    /// `getParamsetId`: the identifier of the resolved set, if any.
    #[must_use]
    pub fn get_paramset_id(&self, name: Option<&str>) -> Option<ParamsetId> {
        self.resolve(name).map(|set| set.paramset_id().clone())
    }

    /// `getParamset`: current values of the resolved set; empty on a miss.
    #[must_use]
    pub fn get_paramset(&self, name: Option<&str>) -> BTreeMap<String, ParameterValue> {
        self.resolve(name)
            .map(ParameterSet::values)
            .unwrap_or_default()
    }

    /// `getParamsetDescription`: static description of the resolved set; empty on a miss.
    #[must_use]
    pub fn get_paramset_description(
        &self,
        name: Option<&str>,
    ) -> BTreeMap<String, ParameterDescription> {
        self.resolve(name)
            .map(ParameterSet::description)
            .unwrap_or_default()
    }

    /// `putParamset`: write each value into the resolved set and return the
    /// read-back.
    ///
    /// Writes the set refuses (unknown key, read-only, wrong type, out of
    /// range) are logged and skipped; accepted writes are kept. On a miss
    /// nothing is written and the read-back is empty.
    pub fn put_paramset(
        &mut self,
        name: Option<&str>,
        values: BTreeMap<String, ParameterValue>,
    ) -> BTreeMap<String, ParameterValue> {
        let resolved = self.resolve_paramset_name(name).to_string();
        match self.paramsets.iter_mut().find(|set| set.name() == resolved) {
            Some(set) => {
                for (key, value) in values {
                    if let Err(err) = set.put_value(&key, value) {
                        log_refused_write(&resolved, &key, &err);
                    }
                }
            }
            None => tracing::debug!(paramset = %resolved, "put to unknown paramset ignored"),
        }
        self.get_paramset(Some(&resolved))
    }

    /// `getDeviceDescription`.
    #[must_use]
    pub fn get_device_description(&self) -> DeviceDescription {
        DeviceDescription {
            address: self.address_str().to_string(),
            children: self.channels.iter().map(|c| c.address().to_string()).collect(),
            firmware: self.firmware.clone(),
            flags: 1,
            interface: INTERFACE_NAME.to_string(),
            paramsets: self.paramsets.iter().map(|p| p.name().to_string()).collect(),
            parent: None,
            rf_address: 0,
            roaming: 0,
            rx_mode: 1,
            device_type: self.device_type.clone(),
            updatable: 1,
            version: self.version,
        }
    }

    /// Serialize the complete device, current values included.
    ///
    /// # Errors
    ///
    /// Returns [`HmviError::NotInitialized`] before construction, and
    /// [`SnapshotError::Json`] (wrapped) if serialization fails.
    pub fn save_persistent(&self) -> Result<String, HmviError> {
        if !self.initialized {
            return Err(HmviError::NotInitialized);
        }
        let snapshot = DeviceSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            serial_number: &self.serial_number,
            address: self.address_str(),
            firmware: &self.firmware,
            version: self.version,
            device_type: &self.device_type,
            channels: self.channels.iter().map(ChannelSnapshot::from).collect(),
            paramsets: &self.paramsets,
        };
        Ok(serde_json::to_string(&snapshot).map_err(SnapshotError::Json)?)
    }
}

fn log_refused_write(paramset: &str, key: &str, err: &ParameterError) {
    tracing::warn!(paramset, key, error = %err, "refused paramset write");
}

fn check_unique(
    channels: &[Channel],
    paramsets: &[ParameterSet],
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    if let Some(dup) = channels.iter().find(|c| !seen.insert(c.address())) {
        return Err(ValidationError::DuplicateChannel(dup.address().to_string()));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = paramsets.iter().find(|p| !seen.insert(p.name())) {
        return Err(ValidationError::DuplicateParamset(dup.name().to_string()));
    }
    Ok(())
}

fn build_channels(
    address: &DeviceAddress,
    device_type: &str,
    definitions: &[ChannelDefinition],
) -> Result<Vec<Channel>, ParameterError> {
    definitions
        .iter()
        .map(|definition| Channel::new(address, device_type, definition))
        .collect()
}

fn build_paramsets(entries: &[ParamsetEntry]) -> Result<Vec<ParameterSet>, ParameterError> {
    entries.iter().map(ParameterSet::from_entry).collect()
}
