//! Data models for catalog entities.
//!
//! This module contains the data structures used to represent the catalog:
//!
//! - `Project`: internship and research projects (one shape, two catalogs)
//! - `Partner`: partner organizations
//! - `AdminProfile`: the signed-in administrator
//! - `PublicProduct`, `PublicPartner`: what the public pages list
//!
//! `Raw*` types mirror the API's JSON; domain types are produced from them
//! with absolute asset URLs and guaranteed slugs.

pub mod envelope;
pub mod partner;
pub mod profile;
pub mod project;
pub mod public;

pub use envelope::{DataEnvelope, LoginEnvelope};
pub use partner::{Partner, RawPartner};
pub use profile::AdminProfile;
pub use project::{AuthorRef, Project, RawProject, INTERNSHIP_CATEGORY, RESEARCH_CATEGORY};
pub use public::{
    paginate, Page, PublicPartner, PublicProduct, RawPublicPartner, RawPublicProduct,
    PUBLIC_ITEMS_PER_PAGE,
};
