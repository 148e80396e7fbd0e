//! Security validation for entry names.

pub mod path;

pub use path::PathViolation;
pub use path::validate_entry_name;
