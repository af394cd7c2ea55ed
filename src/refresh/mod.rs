//! Refresh token records, generation, and rotation.

pub mod generator;
pub mod record;
pub mod rotation;

pub use generator::RefreshTokenGenerator;
pub use record::{RefreshTokenRecord, RefreshTokenState};
pub use rotation::RotationEngine;
