//! Operational and management screens, one module per command group.

pub mod aquarium;
pub mod feeding;
pub mod manage;
pub mod species;
pub mod tank;
pub mod water;
