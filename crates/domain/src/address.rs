//! Bus address newtypes.
//!
//! A device is addressed by its serial (e.g. `ABC1234567`); a channel is
//! addressed as `SERIAL:INDEX`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! define_address {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Borrow the textual address.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

define_address!(
    /// Bus address of a [`Device`](crate::device::Device).
    DeviceAddress
);

define_address!(
    /// Bus address of a [`Channel`](crate::channel::Channel): `DEVICE:INDEX`.
    ChannelAddress
);

impl DeviceAddress {
    /// Validate and wrap a device address.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyAddress`] for an empty string and
    /// [`ValidationError::InvalidDeviceAddress`] when it contains `:`.
    pub fn new(address: impl Into<String>) -> Result<Self, ValidationError> {
        let address = address.into();
        if address.is_empty() {
            return Err(ValidationError::EmptyAddress);
        }
        if address.contains(':') {
            return Err(ValidationError::InvalidDeviceAddress(address));
        }
        Ok(Self(address))
    }

    /// Address of this device's channel with the given index.
    #[must_use]
    pub fn channel(&self, index: u32) -> ChannelAddress {
        ChannelAddress(format!("{}:{index}", self.0))
    }
}

impl FromStr for DeviceAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl ChannelAddress {
    /// The device part of the address (everything before the last `:`).
    #[must_use]
    pub fn device(&self) -> &str {
        self.0.rsplit_once(':').map_or(&self.0, |(device, _)| device)
    }

    /// The channel index, when the suffix is numeric.
    #[must_use]
    pub fn index(&self) -> Option<u32> {
        self.0
            .rsplit_once(':')
            .and_then(|(_, index)| index.parse().ok())
    }
}
