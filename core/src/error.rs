//! Error types for the releases client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers distinguish "the
//! repository or asset does not exist" from "the server returned an
//! unexpected status." All other unexpected statuses land in `HttpError`
//! with the raw status code and body for debugging. Transport failures are
//! carried as-is.

use thiserror::Error;

use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A redirect response without a `Location` header.
    #[error("redirect response carried no location")]
    MissingLocation,

    #[error("stopped after {0} redirects")]
    TooManyRedirects(usize),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
