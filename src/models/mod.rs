//! Data models

pub mod nutrient;
pub mod scaling;
pub mod prediction;

pub use nutrient::*;
pub use scaling::*;
pub use prediction::*;
