//! Abstract document [`Storage`] definitions.

pub mod local;

use std::{future::Future, io, time::Duration};

use derive_more::{Display, Error as StdError, From};
use tracerr::Traced;

use crate::domain::receipt;

pub use self::local::Local;

/// Storage of generated documents.
pub trait Storage {
    /// Stores the provided `data` under the provided `key`, overwriting any
    /// previously stored document.
    fn put(
        &self,
        key: &receipt::DocumentKey,
        content_type: &str,
        data: Vec<u8>,
    ) -> impl Future<Output = Result<(), Traced<Error>>>;

    /// Returns a URL granting read access to the document stored under the
    /// provided `key` for the provided `ttl`.
    fn signed_url(
        &self,
        key: &receipt::DocumentKey,
        ttl: Duration,
    ) -> impl Future<Output = Result<String, Traced<Error>>>;
}

/// Error of a [`Storage`] operation.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Failed to perform an I/O operation.
    #[display("I/O operation failed: {_0}")]
    Io(io::Error),

    /// No document is stored under the requested key.
    #[display("no document stored under `{_0}` key")]
    #[from(ignore)]
    NotFound(#[error(not(source))] receipt::DocumentKey),

    /// Key doesn't form a valid storage path.
    #[display("invalid storage key: `{_0}`")]
    #[from(ignore)]
    InvalidKey(#[error(not(source))] receipt::DocumentKey),
}
