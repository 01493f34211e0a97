//! Shop Server - storefront backend
//!
//! # Modules
//!
//! ```text
//! shop-server/src/
//! ├── api/            # HTTP routes and handlers, one directory per resource
//! ├── auth/           # JWT, password hashing, extractors, rate limiting
//! ├── db/             # sqlx queries per table
//! ├── orders/         # checkout, status workflow, coupon rules
//! ├── notifications/  # persisted notifications + scheduled delivery
//! ├── realtime/       # socket.io rooms and server events
//! ├── cache.rs        # TTL read cache
//! ├── scheduler.rs    # periodic jobs
//! └── tasks.rs        # background task registry
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod notifications;
pub mod orders;
pub mod realtime;
pub mod scheduler;
pub mod state;
pub mod tasks;

pub use auth::{CurrentUser, JwtService};
pub use config::Config;
pub use error::ServiceError;
pub use state::AppState;

pub use logger::{cleanup_old_logs, init_logger_with_file};
