#![doc = include_str!("../README.md")]

mod binary;
mod error;
pub mod format;
mod normalize;
mod paginate;
mod resources;
mod store;
mod transport;
mod upload;

pub use binary::{BinaryStore, FileUpload};
pub use error::{ClientError, Result};
pub use store::{CredentialStore, MemoryStore};
pub use transport::ClairaClient;
