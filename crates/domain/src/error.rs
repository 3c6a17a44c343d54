//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HmviError`]
//! via `#[from]`.

/// Top-level error for the hmvi workspace.
#[derive(Debug, thiserror::Error)]
pub enum HmviError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("template error")]
    Template(#[from] TemplateError),

    #[error("snapshot error")]
    Snapshot(#[from] SnapshotError),

    #[error("parameter error")]
    Parameter(#[from] ParameterError),

    /// The device has not completed a construction path yet.
    #[error("device is not initialized")]
    NotInitialized,

    /// A construction path was run on a device that is already initialized.
    #[error("device {address} is already initialized")]
    AlreadyInitialized { address: String },
}

/// Invariant violations detected while building domain objects.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("address must not be empty")]
    EmptyAddress,

    #[error("device address {0:?} must not contain ':'")]
    InvalidDeviceAddress(String),

    #[error("channel address {0:?} is used more than once")]
    DuplicateChannel(String),

    #[error("paramset {0:?} is defined more than once")]
    DuplicateParamset(String),
}

/// A keyed lookup that found nothing.
#[derive(Debug, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A device-type template could not be read.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("failed to read template for {device_type}")]
    Io {
        device_type: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse template for {device_type}")]
    Parse {
        device_type: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A persisted snapshot was rejected.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot is missing required field {0:?}")]
    MissingField(&'static str),

    #[error("invalid snapshot JSON")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot format version {found} (max {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Parameter construction or single-value write failures.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParameterError {
    #[error("parameter definition is missing field {0:?}")]
    MissingField(&'static str),

    #[error("invalid parameter definition")]
    InvalidDefinition(String),

    #[error("unknown parameter {0:?}")]
    Unknown(String),

    #[error("unknown paramset {0:?}")]
    UnknownParamset(String),

    #[error("parameter {0:?} is not writable")]
    NotWritable(String),

    #[error("parameter {name:?} expects a {expected} value")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("value for parameter {0:?} is out of range")]
    OutOfRange(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_into_top_level() {
        let err: HmviError = ValidationError::EmptyAddress.into();
        assert!(matches!(
            err,
            HmviError::Validation(ValidationError::EmptyAddress)
        ));
    }

    #[test]
    fn should_display_not_found_with_entity_and_id() {
        let err = NotFoundError {
            entity: "Template",
            id: "SW1".to_string(),
        };
        assert_eq!(err.to_string(), "Template not found: SW1");
    }

    #[test]
    fn should_name_missing_snapshot_field() {
        let err = SnapshotError::MissingField("adress");
        assert_eq!(err.to_string(), "snapshot is missing required field \"adress\"");
    }

    #[test]
    fn should_keep_json_error_as_source() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{bad").unwrap_err();
        let err: HmviError = SnapshotError::Json(json_err).into();
        let source = std::error::Error::source(&err);
        assert!(source.is_some());
    }
}
