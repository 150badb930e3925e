pub mod limit;
pub mod values;
pub mod upload;
