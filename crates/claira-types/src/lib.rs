//! # Claira Types
//!
//! Core types and models for the Claira Platform client.
//!
//! This crate sits at the bottom of the dependency graph and provides:
//!
//! - **`credential`** - The credential record owned by the hosting context
//! - **`environment`** - Named environments and base URL resolution
//! - **`token`** - Token envelopes and expiry bookkeeping
//! - **`models`** - Document model types and entity aliases
//! - **`operation`** - The tagged operation model consumed by the dispatcher
//!
//! All types are serde-serializable so they can cross an API/IPC boundary,
//! and `Clone` for cheap sharing across async call chains.

pub mod credential;
pub mod environment;
pub mod models;
pub mod operation;
pub mod token;

pub use credential::Credentials;
pub use environment::{Environment, EnvironmentUrls, ResolvedUrls};
pub use models::{Entity, ModelType};
pub use operation::Operation;
pub use token::{TokenGrant, TokenResponse};
