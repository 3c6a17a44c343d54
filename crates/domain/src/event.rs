//! Value-change events raised by channels and re-emitted by their device.
//!
//! Channels never publish directly. Each attached channel holds a
//! [`DeviceRelay`] that stamps the payload with the device address and
//! forwards it to every subscriber of the matching kind.
//!
//! Each subscriber gets its own unbounded queue, so a slow reader never
//! loses events: every relayed change reaches every live subscriber once.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::address::{ChannelAddress, DeviceAddress};
use crate::parameter::ParameterValue;

/// Device-scope name of a general value change.
pub const DEVICE_CHANNEL_VALUE_CHANGE: &str = "device_channel_value_change";
/// Device-scope name of an event-sourced value change.
pub const EVENT_DEVICE_CHANNEL_VALUE_CHANGE: &str = "event_device_channel_value_change";

/// The two kinds of value change a channel can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A stored value was written.
    Value,
    /// A value was raised by an event source (key press, motion, …).
    Event,
}

impl ChangeKind {
    /// Event name at channel scope.
    #[must_use]
    pub fn channel_event_name(self) -> &'static str {
        match self {
            Self::Value => "channel_value_change",
            Self::Event => "event_channel_value_change",
        }
    }

    /// Event name at device scope.
    #[must_use]
    pub fn device_event_name(self) -> &'static str {
        match self {
            Self::Value => DEVICE_CHANNEL_VALUE_CHANGE,
            Self::Event => EVENT_DEVICE_CHANNEL_VALUE_CHANGE,
        }
    }
}

/// Payload of a value change.
///
/// `device` is empty when raised by the channel and filled in by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceAddress>,
    pub channel: ChannelAddress,
    pub paramset: String,
    pub name: String,
    pub value: ParameterValue,
}

/// A device-scope event as delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceEvent {
    pub kind: ChangeKind,
    pub change: ParameterChange,
    pub emitted_at: DateTime<Utc>,
}

impl DeviceEvent {
    /// `device_channel_value_change` or `event_device_channel_value_change`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.device_event_name()
    }
}

type Subscribers = Arc<Mutex<Vec<mpsc::UnboundedSender<DeviceEvent>>>>;

/// Receiving end of a device subscription.
pub type DeviceEventReceiver = mpsc::UnboundedReceiver<DeviceEvent>;

/// The device's subscriber lists, one per [`ChangeKind`].
#[derive(Debug, Clone, Default)]
pub(crate) struct DeviceEventBus {
    value_changes: Subscribers,
    event_changes: Subscribers,
}

impl DeviceEventBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscribe(&self, kind: ChangeKind) -> DeviceEventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers(kind)
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber, dropping closed ones.
    fn publish(&self, event: &DeviceEvent) {
        let mut subscribers = self
            .subscribers(event.kind)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn subscribers(&self, kind: ChangeKind) -> &Subscribers {
        match kind {
            ChangeKind::Value => &self.value_changes,
            ChangeKind::Event => &self.event_changes,
        }
    }
}

/// Handle through which a channel reports changes to its device.
#[derive(Debug, Clone)]
pub struct DeviceRelay {
    device: DeviceAddress,
    bus: DeviceEventBus,
}

impl DeviceRelay {
    pub(crate) fn new(device: DeviceAddress, bus: DeviceEventBus) -> Self {
        Self { device, bus }
    }

    /// Stamp `change` with the device address and publish it at device scope.
    ///
    /// Publishing succeeds even when nobody is subscribed.
    pub fn relay(&self, kind: ChangeKind, mut change: ParameterChange) {
        change.device = Some(self.device.clone());
        tracing::trace!(
            event = kind.device_event_name(),
            channel = %change.channel,
            parameter = %change.name,
            "relaying channel value change"
        );
        let event = DeviceEvent {
            kind,
            change,
            emitted_at: Utc::now(),
        };
        self.bus.publish(&event);
    }
}
