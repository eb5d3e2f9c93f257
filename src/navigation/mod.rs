//! Application-side navigation types and the action dispatch capability.
mod types;

pub use types::*;
