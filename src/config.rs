// src/config.rs
use crate::errors::CarscanError;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 2048;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub max_image_dimension: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_image_dimension: DEFAULT_MAX_IMAGE_DIMENSION,
        }
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::default().with_api_url(api_url)
    }

    /// Reads `CARSCAN_API_URL`, `CARSCAN_TIMEOUT_SECS` and
    /// `CARSCAN_MAX_IMAGE_DIMENSION`, falling back to the defaults.
    pub fn from_env() -> Result<Self, CarscanError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, CarscanError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("CARSCAN_API_URL") {
            config = config.with_api_url(url);
        }
        if let Some(raw) = lookup("CARSCAN_TIMEOUT_SECS") {
            let secs = parse_positive(&raw, "CARSCAN_TIMEOUT_SECS")?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup("CARSCAN_MAX_IMAGE_DIMENSION") {
            let px = parse_positive(&raw, "CARSCAN_MAX_IMAGE_DIMENSION")?;
            config.max_image_dimension = u32::try_from(px).map_err(|_| {
                CarscanError::Validation(format!("CARSCAN_MAX_IMAGE_DIMENSION too large: {}", px))
            })?;
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_image_dimension(mut self, max_image_dimension: u32) -> Self {
        self.max_image_dimension = max_image_dimension;
        self
    }
}

fn parse_positive(raw: &str, key: &str) -> Result<u64, CarscanError> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(CarscanError::Validation(format!(
            "{} must be a positive integer, got '{}'",
            key, raw
        ))),
        Ok(value) => Ok(value),
    }
}
