//! File I/O for shade analysis inputs and results.
//!
//! Everything is plain JSON through serde; other formats are left to callers.

pub mod model;

pub use model::{ShadeModel, read_model, read_series, write_model, write_result};
