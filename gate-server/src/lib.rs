//! Gate Server — venue-side ticket store and redemption service
//!
//! # Module structure
//!
//! ```text
//! gate-server/src/
//! ├── core/          # Config, state, server
//! ├── db/            # SQLite pool + repositories
//! ├── redemption/    # Single-use verification state machine
//! ├── api/           # HTTP routes and handlers
//! ├── auth/          # Operator identity middleware
//! └── utils/         # Errors, logging
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod redemption;
pub mod utils;

pub use auth::CurrentOperator;
pub use crate::core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

#[cfg(test)]
pub(crate) mod test_support;
