//! Template source port: device-type templates keyed by type id.

use std::sync::Arc;

use hmvi_domain::error::HmviError;
use hmvi_domain::template::DeviceTemplate;

/// Looks up the template a new device of a given type is built from.
///
/// Lookups are synchronous one-shot reads; a failure only affects the
/// device being built.
pub trait TemplateSource {
    /// Load the template for `device_type`.
    ///
    /// # Errors
    ///
    /// Returns [`HmviError::NotFound`] when no template exists for the type,
    /// or [`HmviError::Template`] when it exists but cannot be read or parsed.
    fn load(&self, device_type: &str) -> Result<DeviceTemplate, HmviError>;
}

impl<T: TemplateSource + ?Sized> TemplateSource for &T {
    fn load(&self, device_type: &str) -> Result<DeviceTemplate, HmviError> {
        (**self).load(device_type)
    }
}

impl<T: TemplateSource + ?Sized> TemplateSource for Arc<T> {
    fn load(&self, device_type: &str) -> Result<DeviceTemplate, HmviError> {
        (**self).load(device_type)
    }
}
