// src/services/mod.rs
pub mod analysis_client;
pub mod identity;
pub mod image_processor;

pub use analysis_client::AnalysisClient;
pub use identity::{IdentityProvider, InMemoryIdentityProvider, ProfileUpdate, Session};
pub use image_processor::ImageProcessor;
