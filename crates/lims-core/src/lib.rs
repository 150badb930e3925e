//! # lims-core
//!
//! Core types shared by every crate of the sample tracker:
//! - Documents, log records and attachment stubs
//! - Roles, entity kinds and ID prefixes
//! - The acting account (`Actor`)
//! - The error taxonomy surfaced at the outer boundary
//! - The three-dimensional sample arrangement used by grid fields
//! - The `DocumentStore` adapter trait implemented by the storage crate

pub mod entities;
pub mod enums;
pub mod errors;
pub mod grid;
pub mod identity;
pub mod ids;
pub mod store;
pub mod timestamps;
