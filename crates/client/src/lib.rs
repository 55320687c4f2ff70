//! Client for the student portal API
//!
//! [`SessionManager`] owns the JWT session: login, proactive renewal before
//! the access token expires, a single refresh-and-retry on 401, logout, and
//! restoring a persisted session. [`CatalogClient`] reads courses, topics and
//! tasks through that session and keeps the last good response of each.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod outcome;
pub mod session;
pub mod store;
pub mod token;
pub mod types;

pub use api::{ApiClient, RequestOptions};
pub use catalog::{CatalogCache, CatalogClient};
pub use config::ClientConfig;
pub use error::ClientError;
pub use outcome::FetchOutcome;
pub use session::{SessionManager, SessionManagerBuilder, SessionSnapshot};
pub use store::{FileTokenStore, MemoryTokenStore, TokenKey, TokenStore};
pub use types::{Course, CourseFilter, Role, Task, TeacherRef, Topic, UserData};

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
