//! Release-asset fetching over a pluggable, loggable HTTP transport.
//!
//! # Overview
//! `ReleasesClient` builds `HttpRequest` values for the GitHub releases
//! endpoints and parses the `HttpResponse` values that come back.
//! `ReleasesService` runs those round-trips through any `Transport`.
//!
//! # Design
//! - `Transport` is the single seam between request data and the network.
//!   `UreqTransport` is the real one; tests use closures via `transport_fn`.
//! - `LoggingTransport` decorates any `Transport`, writing a head-only dump
//!   of each request and response to a `DiagnosticSink` and returning the
//!   wrapped result untouched.
//! - Redirects are followed by `ReleasesService`, not by the transport, so
//!   every hop is visible to decorators.
//! - Release and asset types keep only the fields the fetcher reads; the
//!   mock server serves its own copies, and the end-to-end tests parse them.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod transport;
pub mod types;
pub mod ureq_transport;

pub use client::{find_asset, ReleasesClient, ReleasesService};
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use http::{dump_request, dump_response, DumpError, HttpMethod, HttpRequest, HttpResponse};
pub use logging::{with_logging, DiagnosticSink, LoggingTransport, RecordingSink, SinkFn, TracingSink};
pub use transport::{transport_fn, Transport, TransportError, TransportFn};
pub use types::{Asset, AssetDownload, ListOptions, Release};
pub use ureq_transport::UreqTransport;
