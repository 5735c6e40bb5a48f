//! REST API client module for the catalog back office.
//!
//! This module provides the `ApiClient` for communicating with the catalog
//! API: the authenticated request executor used by every admin screen, the
//! unauthenticated login call, and public catalog reads.
//!
//! The API uses bearer token authentication obtained from the login endpoint.

pub mod client;
pub mod error;
pub mod request;
pub mod transport;

pub use client::{ApiClient, AuthSignal, DEFAULT_API_BASE_URL};
pub use error::RequestError;
pub use request::{AuthenticatedRequest, FilePart, FormData, FormValue, RequestBody, METHOD_OVERRIDE_FIELD};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError, DEFAULT_TIMEOUT_SECS};
