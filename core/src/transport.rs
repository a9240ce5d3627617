//! The request-execution seam.
//!
//! # Design
//! A `Transport` turns one `HttpRequest` into one `HttpResponse` or a
//! `TransportError`. Everything that talks to the network, and everything
//! that decorates that (see `logging`), implements this single method.
//! Implementations must be shareable across threads; the releases service
//! and the decorator only ever take `&self`.

use std::sync::Arc;

use thiserror::Error;

use crate::http::{HttpRequest, HttpResponse};

/// Whatever the underlying transport raised while executing a request.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request timed out")]
    Timeout,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http client error: {0}")]
    Client(#[from] ureq::Error),
}

/// Executes HTTP requests.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Adapts a closure into a `Transport`.
#[derive(Clone)]
pub struct TransportFn<F>(F);

impl<F> Transport for TransportFn<F>
where
    F: Fn(HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync,
{
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (self.0)(request)
    }
}

pub fn transport_fn<F>(f: F) -> TransportFn<F>
where
    F: Fn(HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync,
{
    TransportFn(f)
}
