use serde::{Deserialize, Serialize};

use crate::utils::{asset_url, slugify};

/// Category value the API uses for internship projects
pub const INTERNSHIP_CATEGORY: &str = "Internship Project";

/// Category value the API uses for research projects
pub const RESEARCH_CATEGORY: &str = "Research Project";

/// Author reference embedded in catalog records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    #[serde(default)]
    pub name: String,
}

/// Project record as returned by the admin product endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProject {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub thumbnail_path: Option<String>,
    #[serde(default)]
    pub user_manual: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    /// Older API revisions return the link under this name
    #[serde(default)]
    pub project_link: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub admin: Option<AuthorRef>,
}

impl RawProject {
    pub fn to_project(&self, asset_base: &str) -> Project {
        let slug = self
            .slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| slugify(&self.title));

        Project {
            id: self.id,
            title: self.title.clone(),
            slug,
            category: self.category.clone().unwrap_or_default(),
            description: self.description.clone(),
            thumbnail: self
                .thumbnail_path
                .as_deref()
                .and_then(|p| asset_url(asset_base, p)),
            file_path: self.file_path.clone(),
            file_url: self
                .file_url
                .clone()
                .filter(|s| !s.is_empty())
                .or_else(|| self.project_link.clone().filter(|s| !s.is_empty())),
            user_manual: self.user_manual.clone().filter(|s| !s.is_empty()),
            created_at: self.created_at.clone(),
            author: self.admin.as_ref().map(|a| a.name.clone()),
        }
    }
}

/// An internship or research project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub category: String,
    pub description: Option<String>,
    /// Absolute thumbnail URL
    pub thumbnail: Option<String>,
    pub file_path: Option<String>,
    pub file_url: Option<String>,
    pub user_manual: Option<String>,
    pub created_at: Option<String>,
    pub author: Option<String>,
}

impl Project {
    pub fn is_internship(&self) -> bool {
        self.category.eq_ignore_ascii_case(INTERNSHIP_CATEGORY)
    }

    /// File name of the attached document, for display
    pub fn attachment_name(&self) -> Option<&str> {
        self.file_path
            .as_deref()
            .and_then(|p| p.rsplit('/').next())
            .filter(|s| !s.is_empty())
    }
}
