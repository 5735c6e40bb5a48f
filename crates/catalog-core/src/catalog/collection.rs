//! The three admin-managed collections and the endpoints each one uses.
//!
//! Internships and research share the product record but live under
//! different routes: research has dedicated `/update` and `/delete`
//! sub-paths while internships reuse the bare product path.

use serde::de::DeserializeOwned;

use super::drafts::{DraftError, PartnerDraft, ProjectDraft};
use crate::api::FormData;
use crate::models::{
    Partner, Project, RawPartner, RawProject, INTERNSHIP_CATEGORY, RESEARCH_CATEGORY,
};
use crate::utils::{contains_ignore_case, encode_path_segment};

/// A remote-backed collection of catalog entities.
pub trait Collection: Send + Sync + 'static {
    /// Shape returned by the list endpoint
    type Raw: DeserializeOwned + Send;
    type Item: Clone + Send + Sync;
    type Draft: Send + Sync;

    /// Human label used in log lines and messages
    const LABEL: &'static str;

    fn list_path() -> String;

    fn create_path() -> String {
        Self::list_path()
    }

    fn update_path(slug: &str) -> String;

    fn delete_path(slug: &str) -> String;

    /// Adapt a raw record, or drop it when it does not belong here.
    fn adapt(raw: &Self::Raw, asset_base: &str) -> Option<Self::Item>;

    fn slug(item: &Self::Item) -> &str;

    /// Case-insensitive search used by list filtering.
    fn matches(item: &Self::Item, term: &str) -> bool;

    fn to_form(draft: &Self::Draft) -> Result<FormData, DraftError>;
}

pub struct Internships;

pub struct Research;

pub struct Partners;

const PRODUCTS_PATH: &str = "/admin/products";
const RESEARCH_PATH: &str = "/admin/products/research";
const PARTNERS_PATH: &str = "/admin/partners";

fn project_matches(project: &Project, term: &str) -> bool {
    contains_ignore_case(&project.title, term)
        || project
            .description
            .as_deref()
            .map(|d| contains_ignore_case(d, term))
            .unwrap_or(false)
}

impl Collection for Internships {
    type Raw = RawProject;
    type Item = Project;
    type Draft = ProjectDraft;

    const LABEL: &'static str = "internship";

    fn list_path() -> String {
        PRODUCTS_PATH.to_string()
    }

    fn update_path(slug: &str) -> String {
        format!("{}/{}", PRODUCTS_PATH, encode_path_segment(slug))
    }

    fn delete_path(slug: &str) -> String {
        Self::update_path(slug)
    }

    /// The product list mixes both catalogs; keep only internships.
    fn adapt(raw: &RawProject, asset_base: &str) -> Option<Project> {
        let project = raw.to_project(asset_base);
        project.is_internship().then_some(project)
    }

    fn slug(item: &Project) -> &str {
        &item.slug
    }

    fn matches(item: &Project, term: &str) -> bool {
        project_matches(item, term)
    }

    fn to_form(draft: &ProjectDraft) -> Result<FormData, DraftError> {
        draft.to_form(INTERNSHIP_CATEGORY, "link")
    }
}

impl Collection for Research {
    type Raw = RawProject;
    type Item = Project;
    type Draft = ProjectDraft;

    const LABEL: &'static str = "research";

    fn list_path() -> String {
        RESEARCH_PATH.to_string()
    }

    fn update_path(slug: &str) -> String {
        format!("{}/{}/update", RESEARCH_PATH, encode_path_segment(slug))
    }

    fn delete_path(slug: &str) -> String {
        format!("{}/{}/delete", RESEARCH_PATH, encode_path_segment(slug))
    }

    fn adapt(raw: &RawProject, asset_base: &str) -> Option<Project> {
        Some(raw.to_project(asset_base))
    }

    fn slug(item: &Project) -> &str {
        &item.slug
    }

    fn matches(item: &Project, term: &str) -> bool {
        project_matches(item, term)
    }

    fn to_form(draft: &ProjectDraft) -> Result<FormData, DraftError> {
        draft.to_form(RESEARCH_CATEGORY, "project_link")
    }
}

impl Collection for Partners {
    type Raw = RawPartner;
    type Item = Partner;
    type Draft = PartnerDraft;

    const LABEL: &'static str = "partner";

    fn list_path() -> String {
        PARTNERS_PATH.to_string()
    }

    fn update_path(slug: &str) -> String {
        format!("{}/{}", PARTNERS_PATH, encode_path_segment(slug))
    }

    fn delete_path(slug: &str) -> String {
        Self::update_path(slug)
    }

    fn adapt(raw: &RawPartner, asset_base: &str) -> Option<Partner> {
        Some(raw.to_partner(asset_base))
    }

    fn slug(item: &Partner) -> &str {
        &item.slug
    }

    fn matches(item: &Partner, term: &str) -> bool {
        contains_ignore_case(&item.name, term)
    }

    fn to_form(draft: &PartnerDraft) -> Result<FormData, DraftError> {
        draft.to_form()
    }
}
