//! # hmvi-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `TemplateSource`: look up a device-type template by type id
//! - Define **driving/inbound ports** as use-case structs:
//!   - `DeviceFactory`: build a device from a template, or restore it from a snapshot
//! - Provide **in-process infrastructure** (a template catalog) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `hmvi-domain` only (plus `tracing`).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
pub mod template_catalog;
