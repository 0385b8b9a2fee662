// src/lib.rs
//! Client for a remote vehicle damage detection service.
//!
//! [`AnalysisClient`] uploads a photograph and maps the service's JSON answer
//! into a [`DamageAnalysis`]; [`history`] and [`format`] hold the in-memory
//! helpers a front end needs on top of that.

pub mod cli;
pub mod config;
pub mod errors;
pub mod format;
pub mod history;
pub mod models;
pub mod services;
pub mod validation;

pub use config::ClientConfig;
pub use errors::CarscanError;
pub use models::{
    AnalysisStatus, BoundingBox, CostBreakdownItem, CostCategory, CostEstimation,
    DamageAnalysis, DamageFinding, DamageKind, Severity, User,
};
pub use services::{AnalysisClient, IdentityProvider, InMemoryIdentityProvider, Session};
