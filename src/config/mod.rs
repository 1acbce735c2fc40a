//! Configuration module for Reputer
//!
//! This module handles:
//! - Provider credentials and API endpoints
//! - Collection and enrichment tuning
//! - HTTP client settings

mod user_config;

pub use user_config::{
    CollectionConfig, EnrichmentConfig, HttpConfig, ProviderConfig, UserConfig,
    CONCURRENCY_ENV, DEFAULT_CONCURRENCY, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_SECS,
};
