//! Catalog Core - session gate and authenticated API access for the
//! research and internship catalog back office.
//!
//! This crate contains:
//! - `api`: the authenticated request executor and transport seam
//! - `auth`: credential store, storage tiers and the session controller
//! - `routing`: the route gate applied to every navigation
//! - `catalog`: CRUD over internships, research and partners
//! - `models`: API record shapes and their domain counterparts
//! - `config`: persisted settings

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod models;
pub mod routing;
pub mod utils;

pub use api::{ApiClient, AuthSignal, AuthenticatedRequest, RequestError, ReqwestTransport};
pub use auth::{CredentialStore, LoginError, SessionController, SessionState};
pub use catalog::CatalogService;
pub use config::Config;
pub use routing::{GateDecision, RouteGate, Router};
