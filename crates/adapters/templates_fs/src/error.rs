//! Filesystem template adapter error types.

use hmvi_domain::error::{HmviError, NotFoundError, TemplateError};

/// Errors specific to reading templates from disk.
#[derive(Debug, thiserror::Error)]
pub enum FsTemplateError {
    /// No `<TYPE>.json` file exists for the requested device type.
    #[error("no template file for device type {0}")]
    Missing(String),

    /// The device type cannot be used as a file name.
    #[error("device type {0:?} is not a valid template name")]
    InvalidName(String),

    /// The template file exists but could not be read.
    #[error("failed to read template file")]
    Read {
        device_type: String,
        #[source]
        source: std::io::Error,
    },

    /// The template file is not a valid template document.
    #[error("failed to parse template file")]
    Parse(#[source] TemplateError),
}

impl From<FsTemplateError> for HmviError {
    fn from(err: FsTemplateError) -> Self {
        match err {
            FsTemplateError::Missing(device_type) | FsTemplateError::InvalidName(device_type) => {
                NotFoundError {
                    entity: "Template",
                    id: device_type,
                }
                .into()
            }
            FsTemplateError::Read {
                device_type,
                source,
            } => TemplateError::Io {
                device_type,
                source,
            }
            .into(),
            FsTemplateError::Parse(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_missing_file_to_not_found() {
        let err: HmviError = FsTemplateError::Missing("SW1".to_string()).into();
        assert!(matches!(
            err,
            HmviError::NotFound(NotFoundError { entity: "Template", ref id }) if id == "SW1"
        ));
    }

    #[test]
    fn should_convert_read_failure_to_template_io() {
        let err: HmviError = FsTemplateError::Read {
            device_type: "SW1".to_string(),
            source: std::io::Error::other("denied"),
        }
        .into();
        assert!(matches!(err, HmviError::Template(TemplateError::Io { .. })));
    }

    #[test]
    fn should_display_invalid_name() {
        let err = FsTemplateError::InvalidName("../etc".to_string());
        assert_eq!(err.to_string(), "device type \"../etc\" is not a valid template name");
    }
}
