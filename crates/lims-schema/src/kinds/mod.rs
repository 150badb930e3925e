//! Parsing and validation per field variant.

pub mod name;
pub mod password;
pub mod reference;
pub mod sample_grid;
pub mod sample_set;
pub mod scalar;
pub mod status;

pub use password::hash_password;
pub use status::StatusEntry;
