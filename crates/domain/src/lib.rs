//! # hmvi-domain
//!
//! Pure domain model for a virtual device on a home-automation bus.
//!
//! ## Responsibilities
//! - Foundational types: bus addresses and error conventions
//! - Define **Parameters** (typed value descriptors with flags and ranges)
//! - Define **Paramsets** (named parameter collections: `MASTER`, `VALUES`, `LINK`, …)
//! - Define **Channels** (addressable sub-units that emit value changes)
//! - Define the **Device** aggregate: construction from a template or a
//!   snapshot, paramset resolution, description, and event relay
//! - Define the **Template** and **Snapshot** wire shapes
//!
//! ## Dependency rule
//! This crate has **no internal dependencies** and performs no IO.
//! Template lookup is expressed as a port in the `app` crate; the aggregate
//! only consumes an already-parsed [`template::DeviceTemplate`].

pub mod address;
pub mod error;

pub mod channel;
pub mod device;
pub mod event;
pub mod parameter;
pub mod paramset;
pub mod snapshot;
pub mod template;
