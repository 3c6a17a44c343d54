//! Device factory: use-cases for materializing devices.

use hmvi_domain::device::Device;
use hmvi_domain::error::HmviError;

use crate::ports::TemplateSource;

/// Application service building [`Device`]s from templates or snapshots.
pub struct DeviceFactory<S> {
    templates: S,
}

impl<S: TemplateSource> DeviceFactory<S> {
    /// Create a new factory backed by the given template source.
    pub fn new(templates: S) -> Self {
        Self { templates }
    }

    /// Build a new device of `device_type` at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`HmviError::NotFound`] or [`HmviError::Template`] when the
    /// template cannot be loaded, or the construction error of
    /// [`Device::from_template`].
    #[tracing::instrument(skip(self))]
    pub fn create_device(&self, device_type: &str, address: &str) -> Result<Device, HmviError> {
        let template = self.templates.load(device_type)?;
        let device = Device::from_template(&template, address)?;
        tracing::info!(
            channels = device.channels().len(),
            paramsets = device.paramsets().len(),
            "device created from template"
        );
        Ok(device)
    }

    /// Rebuild a device from a snapshot. No template is consulted.
    ///
    /// # Errors
    ///
    /// Returns the construction error of [`Device::from_snapshot`].
    #[tracing::instrument(skip(self, snapshot))]
    pub fn restore_device(&self, snapshot: &str) -> Result<Device, HmviError> {
        let device = Device::from_snapshot(snapshot).inspect_err(|err| {
            tracing::error!(error = %err, "cannot restore device from snapshot");
        })?;
        tracing::info!(
            address = ?device.address(),
            "device restored from snapshot"
        );
        Ok(device)
    }

    /// Restore from `snapshot` when one is given, valid, and describes the
    /// requested `device_type` at `address`; otherwise build a fresh device
    /// from the template.
    ///
    /// # Errors
    ///
    /// Returns the error of [`create_device`](Self::create_device) when the
    /// template fallback fails.
    #[tracing::instrument(skip(self, snapshot))]
    pub fn restore_or_create(
        &self,
        device_type: &str,
        address: &str,
        snapshot: Option<&str>,
    ) -> Result<Device, HmviError> {
        if let Some(snapshot) = snapshot {
            match self.restore_device(snapshot) {
                Ok(device) if is_same_device(&device, device_type, address) => return Ok(device),
                Ok(device) => {
                    tracing::warn!(
                        stored_address = ?device.address(),
                        stored_type = device.device_type(),
                        "snapshot belongs to another device, falling back to template"
                    );
                }
                Err(err) => {
                    tracing::warn!(error = %err, "falling back to template");
                }
            }
        }
        self.create_device(device_type, address)
    }
}

fn is_same_device(device: &Device, device_type: &str, address: &str) -> bool {
    device.device_type() == device_type && device.address().is_some_and(|a| a == address)
}
