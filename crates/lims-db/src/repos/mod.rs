//! Repository modules.
//!
//! Each module adds methods to `LimsService` via `impl LimsService` blocks.

pub mod account;
pub mod attachment;
pub mod document;
pub mod entity;
pub mod form;
pub mod log;
pub mod sample;
pub mod search;
