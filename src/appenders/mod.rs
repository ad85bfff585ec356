//! Inner core implementations

pub mod json;

pub use json::JsonCore;
