//! In-process template catalog.

use std::collections::HashMap;

use hmvi_domain::error::{HmviError, NotFoundError};
use hmvi_domain::template::DeviceTemplate;

use crate::ports::TemplateSource;

/// Templates held in memory, keyed by device type.
///
/// Useful for built-in device types and for tests; directory-backed
/// lookups live in an adapter crate.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: HashMap<String, DeviceTemplate>,
}

impl TemplateCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template under its own device type, returning any template it replaced.
    pub fn insert(&mut self, template: DeviceTemplate) -> Option<DeviceTemplate> {
        self.templates
            .insert(template.device_type.clone(), template)
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_template(mut self, template: DeviceTemplate) -> Self {
        self.insert(template);
        self
    }

    /// Registered device types, sorted.
    #[must_use]
    pub fn device_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateSource for TemplateCatalog {
    fn load(&self, device_type: &str) -> Result<DeviceTemplate, HmviError> {
        self.templates.get(device_type).cloned().ok_or_else(|| {
            NotFoundError {
                entity: "Template",
                id: device_type.to_string(),
            }
            .into()
        })
    }
}
