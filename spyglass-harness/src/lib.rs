//! Synthetic scene generation and model fixtures for exercising the
//! spyglass pipeline end to end.
//!
//! Scenes are deterministic by construction (noise is seeded), so tests
//! built on this crate can assert exact pipeline idempotence.

pub mod model_fixture;
pub mod noise;
pub mod scenes;

pub use model_fixture::{feature_schema, test_model, write_model_artifacts};
pub use noise::add_gaussian_noise;
pub use scenes::{blank_scene, draw_disk, draw_gaussian_blob, draw_square};
