//! Network seam.

use async_trait::async_trait;

use crate::request::Request;
use crate::response::Response;
use crate::Error;

/// An opaque request -> response operation that may fail.
///
/// Implementations return `Error::NetworkFailure` when the request cannot be
/// sent or the response cannot be read. A non-2xx status is a valid
/// response, not a failure.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request) -> Result<Response, Error>;
}
