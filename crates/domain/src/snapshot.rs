//! Persisted snapshot of a device.
//!
//! The snapshot is written from borrowed views of a live device and read
//! back into a [`PartialDeviceSnapshot`] where every field is optional, so
//! that restore can tell absent fields from present ones.

use serde::{Deserialize, Serialize};

use crate::address::ChannelAddress;
use crate::channel::{Channel, ChannelDefinition};
use crate::error::SnapshotError;
use crate::paramset::{ParameterSet, ParamsetEntry};

/// Snapshot format written by this version.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Serialized view of a device, see [`Device::save_persistent`](crate::device::Device::save_persistent).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeviceSnapshot<'a> {
    pub format_version: u32,
    pub serial_number: &'a str,
    #[serde(rename = "adress")]
    pub address: &'a str,
    pub firmware: &'a str,
    pub version: u32,
    #[serde(rename = "type")]
    pub device_type: &'a str,
    pub channels: Vec<ChannelSnapshot<'a>>,
    pub paramsets: &'a [ParameterSet],
}

/// Serialized view of one channel.
#[derive(Debug, Serialize)]
pub(crate) struct ChannelSnapshot<'a> {
    pub index: u32,
    #[serde(rename = "adress")]
    pub address: &'a ChannelAddress,
    #[serde(rename = "type")]
    pub channel_type: &'a str,
    pub flags: u32,
    pub direction: u32,
    pub paramsets: &'a [ParameterSet],
    pub version: u32,
}

impl<'a> From<&'a Channel> for ChannelSnapshot<'a> {
    fn from(channel: &'a Channel) -> Self {
        Self {
            index: channel.index(),
            address: channel.address(),
            channel_type: channel.channel_type(),
            flags: channel.flags(),
            direction: channel.direction(),
            paramsets: channel.paramsets(),
            version: channel.version(),
        }
    }
}

/// A snapshot as read back, with every field optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialDeviceSnapshot {
    pub format_version: Option<u32>,
    pub serial_number: Option<String>,
    #[serde(rename = "adress")]
    pub address: Option<String>,
    pub firmware: Option<String>,
    pub version: Option<u32>,
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub channels: Option<Vec<ChannelDefinition>>,
    pub paramsets: Option<Vec<ParamsetEntry>>,
}

impl PartialDeviceSnapshot {
    /// Parse snapshot text and check its format version.
    ///
    /// A missing `formatVersion` is read as version 1.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] for malformed text and
    /// [`SnapshotError::UnsupportedVersion`] for a newer format.
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(text)?;
        let found = snapshot.format_version.unwrap_or(SNAPSHOT_FORMAT_VERSION);
        if found > SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found,
                supported: SNAPSHOT_FORMAT_VERSION,
            });
        }
        Ok(snapshot)
    }
}
