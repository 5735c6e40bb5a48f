use serde::{Deserialize, Serialize};

use super::AuthorRef;
use crate::utils::{asset_url, slugify};

/// Partner record as returned by the admin partner endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPartner {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub admin: Option<AuthorRef>,
}

impl RawPartner {
    pub fn to_partner(&self, asset_base: &str) -> Partner {
        let slug = self
            .slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| slugify(&self.name));

        Partner {
            id: self.id,
            name: self.name.clone(),
            slug,
            category: self.category.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            image: self
                .image_path
                .as_deref()
                .or(self.image.as_deref())
                .and_then(|p| asset_url(asset_base, p)),
        }
    }
}

/// A partner organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub category: String,
    pub description: String,
    /// Absolute logo URL
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapt_partner() {
        let raw: RawPartner = serde_json::from_str(
            r#"{"id":3,"name":"Telkom University","image_path":"partners/telu.png"}"#,
        )
        .unwrap();
        let partner = raw.to_partner("https://catalog-api.example.net");

        assert_eq!(partner.slug, "telkom-university");
        assert_eq!(
            partner.image.as_deref(),
            Some("https://catalog-api.example.net/storage/partners/telu.png")
        );
        assert_eq!(partner.description, "");
    }

    #[test]
    fn test_partner_image_field_and_explicit_slug() {
        let raw: RawPartner = serde_json::from_str(
            r#"{"id":4,"name":"RS Hasan Sadikin","slug":"rshs","image":"https://cdn.example.net/rshs.png"}"#,
        )
        .unwrap();
        let partner = raw.to_partner("https://catalog-api.example.net");

        assert_eq!(partner.slug, "rshs");
        assert_eq!(partner.image.as_deref(), Some("https://cdn.example.net/rshs.png"));
    }
}
