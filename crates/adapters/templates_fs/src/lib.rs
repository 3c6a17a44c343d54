//! # hmvi-adapter-templates-fs: device templates on disk
//!
//! Implements [`TemplateSource`] over a directory holding one
//! `<TYPE>.json` file per device type.

pub mod error;

use std::path::PathBuf;

use hmvi_app::ports::TemplateSource;
use hmvi_domain::error::HmviError;
use hmvi_domain::template::DeviceTemplate;

pub use error::FsTemplateError;

/// Template source reading `<dir>/<TYPE>.json`.
#[derive(Debug, Clone)]
pub struct FsTemplateSource {
    dir: PathBuf,
}

impl FsTemplateSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the template file for `device_type`.
    ///
    /// # Errors
    ///
    /// Returns [`FsTemplateError::InvalidName`] when the type would escape
    /// the template directory.
    pub fn path_for(&self, device_type: &str) -> Result<PathBuf, FsTemplateError> {
        if device_type.is_empty()
            || device_type.contains(['/', '\\'])
            || device_type.starts_with('.')
        {
            return Err(FsTemplateError::InvalidName(device_type.to_string()));
        }
        Ok(self.dir.join(format!("{device_type}.json")))
    }

    /// Read and parse the template for `device_type`.
    ///
    /// # Errors
    ///
    /// Returns [`FsTemplateError`] when the file is missing, unreadable or
    /// malformed.
    pub fn read(&self, device_type: &str) -> Result<DeviceTemplate, FsTemplateError> {
        let path = self.path_for(device_type)?;
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "template file not found");
                return Err(FsTemplateError::Missing(device_type.to_string()));
            }
            Err(source) => {
                return Err(FsTemplateError::Read {
                    device_type: device_type.to_string(),
                    source,
                });
            }
        };
        let template =
            DeviceTemplate::from_json(device_type, &text).map_err(FsTemplateError::Parse)?;
        tracing::debug!(
            path = %path.display(),
            channels = template.channel_count(),
            "template loaded"
        );
        Ok(template)
    }
}

impl TemplateSource for FsTemplateSource {
    fn load(&self, device_type: &str) -> Result<DeviceTemplate, HmviError> {
        self.read(device_type).map_err(HmviError::from)
    }
}
