use thiserror::Error;

use crate::api::{FilePart, FormData};

/// Field name for repeated project attachments
pub const FILES_FIELD: &str = "files[]";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Form contents for creating or editing an internship or research project.
#[derive(Debug, Clone, Default)]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    pub project_link: Option<String>,
    pub user_manual: Option<String>,
    pub thumbnail: Option<FilePart>,
    pub files: Vec<FilePart>,
}

impl ProjectDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn project_link(mut self, link: impl Into<String>) -> Self {
        self.project_link = Some(link.into());
        self
    }

    pub fn user_manual(mut self, manual: impl Into<String>) -> Self {
        self.user_manual = Some(manual.into());
        self
    }

    pub fn thumbnail(mut self, thumbnail: FilePart) -> Self {
        self.thumbnail = Some(thumbnail);
        self
    }

    pub fn file(mut self, file: FilePart) -> Self {
        self.files.push(file);
        self
    }

    /// Build the multipart form. The two project catalogs name the link
    /// field differently.
    pub(crate) fn to_form(&self, category: &str, link_field: &str) -> Result<FormData, DraftError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DraftError::MissingField("title"));
        }

        let mut form = FormData::new()
            .text("title", title)
            .text("description", self.description.as_str())
            .text("category", category);

        if let Some(link) = self.project_link.as_deref().filter(|l| !l.is_empty()) {
            form = form.text(link_field, link);
        }
        if let Some(manual) = self.user_manual.as_deref().filter(|m| !m.is_empty()) {
            form = form.text("user_manual", manual);
        }
        if let Some(thumbnail) = &self.thumbnail {
            form = form.file("thumbnail", thumbnail.clone());
        }
        for file in &self.files {
            form = form.file(FILES_FIELD, file.clone());
        }
        Ok(form)
    }
}

/// Form contents for creating or editing a partner.
#[derive(Debug, Clone, Default)]
pub struct PartnerDraft {
    pub name: String,
    /// Omitted on edit to keep the current logo
    pub image: Option<FilePart>,
}

impl PartnerDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: None,
        }
    }

    pub fn image(mut self, image: FilePart) -> Self {
        self.image = Some(image);
        self
    }

    pub(crate) fn to_form(&self) -> Result<FormData, DraftError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DraftError::MissingField("name"));
        }

        let mut form = FormData::new().text("name", name);
        if let Some(image) = &self.image {
            form = form.file("image", image.clone());
        }
        Ok(form)
    }
}
