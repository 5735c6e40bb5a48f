use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::collection::{Collection, Internships, Partners, Research};
use super::drafts::DraftError;
use crate::api::{ApiClient, AuthenticatedRequest, FilePart, FormData, RequestError};
use crate::models::{
    AdminProfile, DataEnvelope, PublicPartner, PublicProduct, RawPublicPartner, RawPublicProduct,
};

const PROFILE_PATH: &str = "/admin/profile";
const PROFILE_IMAGE_PATH: &str = "/admin/profile/image";
const PUBLIC_PRODUCTS_PATH: &str = "/public/products";
const PUBLIC_PARTNERS_PATH: &str = "/public/partners";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("Missing slug for {0}")]
    MissingSlug(&'static str),

    #[error(transparent)]
    Request(#[from] RequestError),
}

impl CatalogError {
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::Draft(e) => e.to_string(),
            CatalogError::MissingSlug(label) => format!("No {} selected", label),
            CatalogError::Request(e) => e.user_message(),
        }
    }
}

/// Totals shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub internships: usize,
    pub research: usize,
    pub partners: usize,
}

/// CRUD over the admin catalog, plus the profile and public listing.
///
/// Every protected call goes through `ApiClient::execute`, so nothing here
/// touches the token directly.
#[derive(Clone)]
pub struct CatalogService {
    api: ApiClient,
    asset_base: String,
}

impl CatalogService {
    pub fn new(api: ApiClient, asset_base: impl Into<String>) -> Self {
        Self {
            api,
            asset_base: asset_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn list<C: Collection>(&self) -> Result<Vec<C::Item>, RequestError> {
        let envelope: DataEnvelope<Vec<C::Raw>> = self
            .api
            .execute_as(AuthenticatedRequest::get(C::list_path()))
            .await?;

        let items: Vec<C::Item> = envelope
            .data
            .unwrap_or_default()
            .iter()
            .filter_map(|raw| C::adapt(raw, &self.asset_base))
            .collect();

        debug!(collection = C::LABEL, count = items.len(), "Fetched collection");
        Ok(items)
    }

    pub async fn create<C: Collection>(&self, draft: &C::Draft) -> Result<Value, CatalogError> {
        let form = C::to_form(draft)?;
        let reply = self
            .api
            .execute(AuthenticatedRequest::post(C::create_path()).form(form))
            .await?;
        info!(collection = C::LABEL, "Created");
        Ok(reply)
    }

    /// Multipart update, sent as POST with `_method=PUT`.
    pub async fn update<C: Collection>(
        &self,
        slug: &str,
        draft: &C::Draft,
    ) -> Result<Value, CatalogError> {
        let slug = Self::require_slug::<C>(slug)?;
        let form = C::to_form(draft)?;
        let request = AuthenticatedRequest::post(C::update_path(slug))
            .form(form)
            .method_override(Method::PUT);

        let reply = self.api.execute(request).await?;
        info!(collection = C::LABEL, slug = slug, "Updated");
        Ok(reply)
    }

    pub async fn delete<C: Collection>(&self, slug: &str) -> Result<(), CatalogError> {
        let slug = Self::require_slug::<C>(slug)?;
        self.api
            .execute(AuthenticatedRequest::delete(C::delete_path(slug)))
            .await?;
        info!(collection = C::LABEL, slug = slug, "Deleted");
        Ok(())
    }

    /// Fetch all three collections concurrently and count them.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, RequestError> {
        let (internships, research, partners) = futures::try_join!(
            self.list::<Internships>(),
            self.list::<Research>(),
            self.list::<Partners>(),
        )?;

        Ok(DashboardStats {
            internships: internships.len(),
            research: research.len(),
            partners: partners.len(),
        })
    }

    pub async fn fetch_profile(&self) -> Result<AdminProfile, RequestError> {
        let envelope: DataEnvelope<AdminProfile> = self
            .api
            .execute_as(AuthenticatedRequest::get(PROFILE_PATH))
            .await?;
        envelope
            .data
            .ok_or_else(|| RequestError::Decode("profile response has no data".to_string()))
    }

    pub async fn update_profile_image(&self, image: FilePart) -> Result<Value, RequestError> {
        let request = AuthenticatedRequest::post(PROFILE_IMAGE_PATH)
            .form(FormData::new().file("image", image))
            .method_override(Method::PUT);
        let reply = self.api.execute(request).await?;
        info!("Profile image updated");
        Ok(reply)
    }

    /// Public catalog listing; needs no session.
    pub async fn fetch_public_products(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<PublicProduct>, RequestError> {
        let url = match category.filter(|c| !c.is_empty()) {
            Some(category) => format!(
                "{}?{}",
                PUBLIC_PRODUCTS_PATH,
                url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("category", category)
                    .finish()
            ),
            None => PUBLIC_PRODUCTS_PATH.to_string(),
        };

        let envelope: DataEnvelope<Vec<RawPublicProduct>> = self.api.get_public(&url).await?;
        Ok(envelope
            .data
            .unwrap_or_default()
            .iter()
            .map(|raw| raw.to_product(&self.asset_base))
            .collect())
    }

    /// Partner logos for the public home page; needs no session.
    pub async fn fetch_public_partners(&self) -> Result<Vec<PublicPartner>, RequestError> {
        let envelope: DataEnvelope<Vec<RawPublicPartner>> =
            self.api.get_public(PUBLIC_PARTNERS_PATH).await?;
        Ok(envelope
            .data
            .unwrap_or_default()
            .iter()
            .map(|raw| raw.to_partner(&self.asset_base))
            .collect())
    }

    fn require_slug<C: Collection>(slug: &str) -> Result<&str, CatalogError> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(CatalogError::MissingSlug(C::LABEL));
        }
        Ok(slug)
    }
}
