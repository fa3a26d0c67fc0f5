//! Request dispatcher
//!
//! Turns each inbound HTTP request into a [`PendingRequest`], hands it to the
//! UI runtime and waits for the matching [`ResponseRecord`] to come back
//! through the [`Responder`](super::Responder).

use crate::framework::core::{
    BridgeConfig, DispatchError, PendingRequest, ResponseRecord, SequenceClock,
};
use crate::framework::correlation::CorrelationTable;
use crate::framework::runtime::{ScriptRuntime, render_script};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_LENGTH, HOST, HeaderMap, HeaderName, HeaderValue, TRANSFER_ENCODING};
use hyper::{Request, Response, StatusCode, Uri};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::timeout;

/// Scheme used when rebuilding the absolute request URL
const URL_SCHEME: &str = "http";

pub struct Dispatcher {
    table: Arc<CorrelationTable>,
    runtime: Arc<dyn ScriptRuntime>,
    sequence: SequenceClock,
    config: Arc<BridgeConfig>,
}

/// Removes the entry for one request id when the dispatcher stops waiting,
/// whether it got a reply, timed out, or the connection went away.
struct PendingGuard<'a> {
    table: &'a CorrelationTable,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.table.take(self.id).is_some() {
            log::debug!("🧹 Removed unanswered request #{}", self.id);
        }
    }
}

impl Dispatcher {
    pub fn new(
        table: Arc<CorrelationTable>,
        runtime: Arc<dyn ScriptRuntime>,
        config: Arc<BridgeConfig>,
    ) -> Self {
        Self {
            table,
            runtime,
            sequence: SequenceClock::new(),
            config,
        }
    }

    /// Handle one HTTP request end to end. Always produces a response.
    pub async fn dispatch<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();

        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                log::warn!("❌ {}", DispatchError::BodyRead(e.to_string()));
                return status_response(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        let request = PendingRequest {
            id: self.table.next_id(),
            method: parts.method.to_string(),
            url: absolute_url(&parts.headers, &parts.uri),
            headers: flatten_headers(&parts.headers),
            body: String::from_utf8_lossy(&body).into_owned(),
        };

        if self.config.verbose {
            log::info!("📨 Received HTTP request #{} {} {}", request.id, request.method, request.url);
        }

        match self.forward(&request).await {
            Ok(Some(record)) => {
                if self.config.verbose {
                    log::info!(
                        "✅ HTTP request #{} {} {} returned {}",
                        request.id,
                        request.method,
                        request.url,
                        record.status
                    );
                }
                build_response(request.id, record)
            }
            Ok(None) => status_response(StatusCode::BAD_GATEWAY),
            Err(e) => {
                log::error!("❌ Request #{} was not dispatched: {}", request.id, e);
                status_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Register the request, hand it to the runtime and wait for the reply.
    /// `Ok(None)` means no reply arrived in time.
    async fn forward(&self, request: &PendingRequest) -> Result<Option<ResponseRecord>, DispatchError> {
        let id = request.id;
        let script = render_script(&self.config.callback, request, self.sequence.next())?;

        let reply = self.table.register(id)?;
        let _cleanup = PendingGuard {
            table: self.table.as_ref(),
            id,
        };

        self.runtime.eval(script);

        match timeout(self.config.timeout, reply).await {
            Ok(Ok(record)) => Ok(Some(record)),
            Ok(Err(_)) => {
                log::warn!("⚠️  Reply channel for request #{} closed without a response", id);
                Ok(None)
            }
            Err(_) => {
                if self.config.verbose {
                    log::info!(
                        "⏰ HTTP request #{} timed out after {:?}",
                        id,
                        self.config.timeout
                    );
                }
                Ok(None)
            }
        }
    }
}

fn absolute_url(headers: &HeaderMap, uri: &Uri) -> String {
    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|authority| authority.to_string()))
        .unwrap_or_else(|| "localhost".to_string());
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("{}://{}{}", URL_SCHEME, host, path)
}

/// One value per header name; the first occurrence wins.
fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .keys()
        .filter_map(|name| {
            headers.get(name).map(|value| {
                (
                    canonical_header_name(name.as_str()),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
        })
        .collect()
}

/// `content-type` -> `Content-Type`: upper-case the first letter and every
/// letter following a hyphen, lower-case the rest.
fn canonical_header_name(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let mapped = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            mapped
        })
        .collect()
}

fn build_response(id: u64, record: ResponseRecord) -> Response<Full<Bytes>> {
    // A 1xx cannot be the final status of a response.
    let status = match StatusCode::from_u16(record.status) {
        Ok(status) if !status.is_informational() => status,
        _ => {
            log::warn!("⚠️  Request #{} answered with invalid status {}", id, record.status);
            return status_response(StatusCode::BAD_GATEWAY);
        }
    };

    let mut response = Response::new(Full::new(Bytes::from(record.body)));
    *response.status_mut() = status;

    for (name, value) in record.headers {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
            // Framing belongs to hyper, which sizes the body itself.
            (Ok(name), Ok(_)) if name == CONTENT_LENGTH || name == TRANSFER_ENCODING => {}
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => log::warn!("⚠️  Dropping invalid header {:?} on request #{}", name, id),
        }
    }

    response
}

fn status_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
