use serde::{Deserialize, Serialize};

use super::INTERNSHIP_CATEGORY;
use crate::utils::asset_url;

/// Cards shown per page on the public catalog
pub const PUBLIC_ITEMS_PER_PAGE: usize = 8;

/// Placeholder image for projects without a thumbnail
const PLACEHOLDER_THUMBNAIL: &str = "/images/thumbnail.png";

/// Placeholder logo for partners without one
const PLACEHOLDER_LOGO: &str = "/partners/default.png";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPublicProduct {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail_path: Option<String>,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl RawPublicProduct {
    pub fn to_product(&self, asset_base: &str) -> PublicProduct {
        let image = match self.thumbnail_path.as_deref().filter(|p| !p.is_empty()) {
            Some(path) if path.starts_with("http") => path.to_string(),
            Some(path) => format!(
                "{}/{}",
                asset_base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            None => PLACEHOLDER_THUMBNAIL.to_string(),
        };

        PublicProduct {
            title: self
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Untitled".to_string()),
            subtitle: self.description.clone().unwrap_or_default(),
            image,
            category: self
                .category
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| INTERNSHIP_CATEGORY.to_string()),
            slug: self.slug.clone(),
        }
    }
}

/// A project card on the public catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicProduct {
    pub title: String,
    pub subtitle: String,
    pub image: String,
    pub category: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPublicPartner {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logo_path: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
}

impl RawPublicPartner {
    pub fn to_partner(&self, asset_base: &str) -> PublicPartner {
        PublicPartner {
            id: self.id,
            name: self
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "partner".to_string()),
            logo: self
                .logo_path
                .as_deref()
                .and_then(|p| asset_url(asset_base, p))
                .unwrap_or_else(|| PLACEHOLDER_LOGO.to_string()),
            website: self.website_url.clone().filter(|w| !w.trim().is_empty()),
        }
    }
}

/// A partner logo on the public home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicPartner {
    pub id: i64,
    pub name: String,
    /// Absolute logo URL, or the bundled placeholder
    pub logo: String,
    /// Logos link out only when the partner has a website
    pub website: Option<String>,
}

/// One page of a client-side paginated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based, clamped into range
    pub page: usize,
    pub total_pages: usize,
}

impl<T> Page<'_, T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Slice `items` into the requested 1-based page.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let per_page = per_page.max(1);
    let total_pages = items.len().div_ceil(per_page);
    let page = page.clamp(1, total_pages.max(1));
    let start = ((page - 1) * per_page).min(items.len());
    let end = (start + per_page).min(items.len());

    Page {
        items: &items[start..end],
        page,
        total_pages,
    }
}
