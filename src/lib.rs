//! Reputer - contributor reputation for hosted git repositories
//!
//! Walks a repository's commit history on its hosting provider, enriches
//! every distinct author with profile signals, and scores each one into a
//! bounded, reproducible trust signal in `[0, 1]`.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs        - Crate root with re-exports
//! ├── main.rs       - Binary entrypoint (logging + CLI)
//! ├── cli/          - clap command definitions and handlers
//! ├── config/       - User configuration (TOML + environment)
//! ├── models.rs     - Signals, authors, reports
//! ├── query.rs      - Repository query parsing and validation
//! ├── scoring/      - Categorical reputation model
//! ├── provider/     - Hosting provider trait, registry, GitHub/GitLab clients
//! ├── collector.rs  - Paginated commit walk
//! ├── enricher.rs   - Bounded parallel profile enrichment
//! ├── reputer.rs    - Orchestration
//! ├── reporters/    - JSON / YAML rendering
//! └── error.rs      - Typed pipeline errors
//! ```

pub mod cli;
pub mod collector;
pub mod config;
pub mod enricher;
pub mod error;
pub mod models;
pub mod provider;
pub mod query;
pub mod reporters;
pub mod reputer;
pub mod scoring;

pub use error::{ReputerError, ReputerResult};
pub use models::{Author, AuthorContext, CategoryWeight, Cohort, Meta, Report, Signals};
pub use provider::{
    ApiResponse, Backoff, CommitSummary, Provider, ProviderError, ProviderRegistry, RateLimit,
    UserProfile,
};
pub use query::Query;
pub use reputer::{Reputer, ReputerOptions};
