//! Custodian Storage Library
//!
//! Access to stored upload files: existence checks and signed, time-limited
//! download links that external scanners use to fetch the file.
//!
//! Keys are relative to the storage root and must not contain `..` or a
//! leading `/`.

pub mod factory;
pub mod local;
pub mod signing;
pub mod traits;

pub use factory::create_storage;
pub use local::LocalStorage;
pub use signing::UrlSigner;
pub use traits::{Storage, StorageError, StorageResult};
