//! Logging transport decorator.
//!
//! # Design
//! `LoggingTransport` wraps another `Transport` and writes a head-only dump
//! of every request and response to a `DiagnosticSink`. It never changes
//! what the wrapped transport sees or returns: the request is handed over
//! untouched, and the result (response or error) is returned as produced.
//!
//! The response dump is taken after the wrapped call has completed and
//! before the result is returned. A failed call has no response, so only
//! the request line is logged for it.
//!
//! Dumping is best effort. A request or response that cannot be rendered is
//! noted at debug level and otherwise ignored.

use std::sync::{Mutex, PoisonError};

use crate::http::{dump_request, dump_response, HttpRequest, HttpResponse};
use crate::transport::{Transport, TransportError};

/// Line-oriented destination for diagnostic records.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, record: &str);
}

/// Writes records through `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, record: &str) {
        tracing::info!(target: "ghrelease::transport", "{record}");
    }
}

/// Keeps every record in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records emitted so far.
    pub fn records(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, record: &str) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.to_string());
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &S {
    fn emit(&self, record: &str) {
        (**self).emit(record)
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for std::sync::Arc<S> {
    fn emit(&self, record: &str) {
        (**self).emit(record)
    }
}

/// Adapts a closure into a `DiagnosticSink`.
pub struct SinkFn<F>(pub F);

impl<F> DiagnosticSink for SinkFn<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn emit(&self, record: &str) {
        (self.0)(record)
    }
}

/// A `Transport` that logs each exchange of the transport it wraps.
#[derive(Debug, Clone)]
pub struct LoggingTransport<T, S = TracingSink> {
    inner: T,
    sink: S,
}

impl<T, S> LoggingTransport<T, S> {
    pub fn new(inner: T, sink: S) -> Self {
        Self { inner, sink }
    }
}

/// Wrap `inner` so that every exchange is written to `sink`.
pub fn with_logging<T, S>(inner: T, sink: S) -> LoggingTransport<T, S>
where
    T: Transport,
    S: DiagnosticSink,
{
    LoggingTransport::new(inner, sink)
}

impl<T, S> LoggingTransport<T, S>
where
    S: DiagnosticSink,
{
    fn log_request(&self, request: &HttpRequest) {
        match dump_request(request) {
            Ok(raw) => self.sink.emit(&format!("Request: {raw}")),
            Err(e) => tracing::debug!(error = %e, "skipping request dump"),
        }
    }

    fn log_response(&self, response: &HttpResponse) {
        match dump_response(response) {
            Ok(raw) => self.sink.emit(&format!("Response: {raw}")),
            Err(e) => tracing::debug!(error = %e, "skipping response dump"),
        }
    }
}

impl<T, S> Transport for LoggingTransport<T, S>
where
    T: Transport,
    S: DiagnosticSink,
{
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.log_request(&request);
        let result = self.inner.execute(request);
        if let Ok(response) = &result {
            self.log_response(response);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::http::HttpMethod;
    use crate::transport::transport_fn;

    fn ok_response(status: u16, body: &[u8]) -> HttpResponse {
        HttpResponse {
            status,
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: body.to_vec(),
        }
    }

    #[test]
    fn returns_wrapped_response_unchanged() {
        let expected = ok_response(200, b"Hello, world!\n");
        let returned = expected.clone();
        let inner = transport_fn(move |_req: HttpRequest| Ok(returned.clone()));
        let sink = RecordingSink::new();
        let logged = with_logging(inner, &sink);

        let resp = logged.execute(HttpRequest::get("http://h/a")).unwrap();
        assert_eq!(resp, expected);
    }

    #[test]
    fn returns_wrapped_error_unchanged() {
        let inner = transport_fn(|_req: HttpRequest| {
            Err(TransportError::Connection("connection refused".to_string()))
        });
        let sink = RecordingSink::new();
        let logged = with_logging(inner, &sink);

        let err = logged.execute(HttpRequest::get("http://h/a")).unwrap_err();
        match err {
            TransportError::Connection(msg) => assert_eq!(msg, "connection refused"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn request_body_reaches_wrapped_transport() {
        let inner = transport_fn(|req: HttpRequest| {
            Ok(ok_response(200, req.body.as_deref().unwrap_or_default()))
        });
        let sink = RecordingSink::new();
        let logged = with_logging(inner, &sink);

        let req = HttpRequest {
            method: HttpMethod::Post,
            url: "http://h/upload".to_string(),
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: Some(b"payload bytes".to_vec()),
        };
        let resp = logged.execute(req).unwrap();
        assert_eq!(resp.body, b"payload bytes");
        assert!(sink.records().iter().all(|r| !r.contains("payload bytes")));
    }

    #[test]
    fn failed_call_logs_request_only() {
        let inner = transport_fn(|_req: HttpRequest| Err(TransportError::Timeout));
        let sink = RecordingSink::new();
        let logged = with_logging(inner, &sink);

        assert!(logged.execute(HttpRequest::get("http://h/slow")).is_err());
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].starts_with("Request: GET /slow HTTP/1.1\r\n"));
    }

    #[test]
    fn request_is_logged_before_response() {
        let sink = Arc::new(RecordingSink::new());
        let seen_during_call = Arc::new(AtomicUsize::new(0));
        let inner = {
            let sink = Arc::clone(&sink);
            let seen = Arc::clone(&seen_during_call);
            transport_fn(move |_req: HttpRequest| {
                seen.store(sink.records().len(), Ordering::SeqCst);
                Ok(ok_response(204, b""))
            })
        };
        let logged = with_logging(inner, Arc::clone(&sink));

        logged.execute(HttpRequest::get("http://h/order")).unwrap();
        assert_eq!(seen_during_call.load(Ordering::SeqCst), 1);

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert!(records[0].starts_with("Request: GET /order HTTP/1.1"));
        assert!(records[1].starts_with("Response: HTTP/1.1 204 No Content"));
    }

    #[test]
    fn undumpable_messages_still_pass_through() {
        let inner = transport_fn(|_req: HttpRequest| Ok(ok_response(7, b"odd")));
        let sink = RecordingSink::new();
        let logged = with_logging(inner, &sink);

        let resp = logged.execute(HttpRequest::get("not a url")).unwrap();
        assert_eq!(resp.status, 7);
        assert_eq!(resp.body, b"odd");
        assert!(sink.records().is_empty());
    }

    #[test]
    fn concurrent_calls_keep_their_own_responses() {
        let inner = transport_fn(|req: HttpRequest| {
            let tag = req.header("x-request-tag").unwrap_or_default().to_string();
            Ok(HttpResponse {
                status: 200,
                headers: vec![("x-request-tag".to_string(), tag.clone())],
                body: tag.into_bytes(),
            })
        });
        let sink = RecordingSink::new();
        let logged = with_logging(inner, &sink);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let logged = &logged;
                    scope.spawn(move || {
                        let tag = format!("req-{i}");
                        let req = HttpRequest::get(format!("http://h/items/{i}"))
                            .with_header("x-request-tag", tag.clone());
                        (tag, logged.execute(req).unwrap())
                    })
                })
                .collect();
            for handle in handles {
                let (tag, resp) = handle.join().unwrap();
                assert_eq!(resp.body, tag.as_bytes());
                assert_eq!(resp.header("x-request-tag"), Some(tag.as_str()));
            }
        });

        assert_eq!(sink.records().len(), 32);
    }

    #[test]
    fn closure_sink_receives_records() {
        let count = AtomicUsize::new(0);
        let inner = transport_fn(|_req: HttpRequest| Ok(ok_response(200, b"")));
        let logged = with_logging(
            inner,
            SinkFn(|_record: &str| {
                count.fetch_add(1, Ordering::SeqCst);
            }),
        );

        logged.execute(HttpRequest::get("http://h/")).unwrap();
        drop(logged);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
