//! Admin catalog management: internships, research, partners, the
//! dashboard totals, the admin profile and the public catalog listing.

pub mod collection;
pub mod drafts;
pub mod list;
pub mod service;

pub use collection::{Collection, Internships, Partners, Research};
pub use drafts::{DraftError, PartnerDraft, ProjectDraft, FILES_FIELD};
pub use list::RemoteList;
pub use service::{CatalogError, CatalogService, DashboardStats};
