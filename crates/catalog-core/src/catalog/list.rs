use std::marker::PhantomData;

use tracing::warn;

use super::collection::Collection;
use super::service::{CatalogError, CatalogService};
use crate::api::RequestError;

/// Client-side view of one remote collection.
///
/// Items are fetched on demand and re-fetched after every successful
/// mutation. Edits are not queued: two overlapping mutations simply race
/// at the API.
pub struct RemoteList<C: Collection> {
    service: CatalogService,
    items: Vec<C::Item>,
    loading: bool,
    last_error: Option<String>,
    _collection: PhantomData<C>,
}

impl<C: Collection> RemoteList<C> {
    pub fn new(service: CatalogService) -> Self {
        Self {
            service,
            items: Vec::new(),
            loading: false,
            last_error: None,
            _collection: PhantomData,
        }
    }

    pub fn items(&self) -> &[C::Item] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message from the most recent failed operation.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn find(&self, slug: &str) -> Option<&C::Item> {
        self.items.iter().find(|item| C::slug(item) == slug)
    }

    /// Items matching `term`; a blank term matches everything.
    pub fn filtered(&self, term: &str) -> Vec<&C::Item> {
        let term = term.trim();
        self.items
            .iter()
            .filter(|item| term.is_empty() || C::matches(item, term))
            .collect()
    }

    /// Re-fetch the collection. Items from the last good fetch are kept on
    /// failure.
    pub async fn refresh(&mut self) -> Result<(), RequestError> {
        self.loading = true;
        let result = self.service.list::<C>().await;
        self.loading = false;

        match result {
            Ok(items) => {
                self.items = items;
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                warn!(collection = C::LABEL, error = %e, "Failed to load collection");
                self.last_error = Some(format!("Failed to load {}: {}", C::LABEL, e.user_message()));
                Err(e)
            }
        }
    }

    pub async fn create(&mut self, draft: &C::Draft) -> Result<(), CatalogError> {
        let result = self.service.create::<C>(draft).await.map(|_| ());
        self.after_mutation("save", result).await
    }

    pub async fn update(&mut self, slug: &str, draft: &C::Draft) -> Result<(), CatalogError> {
        let result = self.service.update::<C>(slug, draft).await.map(|_| ());
        self.after_mutation("save", result).await
    }

    pub async fn delete(&mut self, slug: &str) -> Result<(), CatalogError> {
        let result = self.service.delete::<C>(slug).await;
        self.after_mutation("delete", result).await
    }

    async fn after_mutation(
        &mut self,
        action: &str,
        result: Result<(), CatalogError>,
    ) -> Result<(), CatalogError> {
        match result {
            Ok(()) => {
                // A failed reload is recorded in last_error; the mutation itself succeeded
                let _ = self.refresh().await;
                Ok(())
            }
            Err(e) => {
                warn!(collection = C::LABEL, action = action, error = %e, "Mutation failed");
                self.last_error = Some(format!(
                    "Failed to {} {}: {}",
                    action,
                    C::LABEL,
                    e.user_message()
                ));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use reqwest::Method;

    use super::*;
    use crate::api::transport::MockTransport;
    use crate::api::{ApiClient, HttpResponse};
    use crate::auth::{CredentialStore, MemoryStorage, PersistenceMode};
    use crate::catalog::{PartnerDraft, Partners};
    use crate::models::AdminProfile;

    fn list(transport: MockTransport) -> RemoteList<Partners> {
        let store = CredentialStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
        );
        store
            .save(
                "abc123",
                AdminProfile {
                    name: "A".to_string(),
                    email: "admin@example.com".to_string(),
                    role: "Administrator".to_string(),
                    image: None,
                },
                PersistenceMode::Ephemeral,
            )
            .unwrap();
        let api = ApiClient::new(
            Arc::new(transport),
            Arc::new(store),
            "https://catalog-api.example.net/api",
        );
        RemoteList::new(CatalogService::new(api, "https://catalog-api.example.net"))
    }

    const PARTNERS: &str =
        r#"{"data":[{"name":"Telkom University"},{"name":"RS Hasan Sadikin"}]}"#;

    #[tokio::test]
    async fn test_refresh_and_filter() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, PARTNERS)));

        let mut partners = list(transport);
        partners.refresh().await.unwrap();

        assert!(!partners.is_loading());
        assert_eq!(partners.items().len(), 2);
        assert_eq!(partners.filtered("").len(), 2);

        let hits = partners.filtered("telkom");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].slug, "telkom-university");
        assert!(partners.find("rs-hasan-sadikin").is_some());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_items() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut transport = MockTransport::new();
        transport.expect_send().times(2).returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(HttpResponse::new(200, PARTNERS))
            } else {
                Ok(HttpResponse::new(500, "Server error"))
            }
        });

        let mut partners = list(transport);
        partners.refresh().await.unwrap();
        assert!(partners.refresh().await.is_err());

        assert_eq!(partners.items().len(), 2);
        assert!(partners
            .last_error()
            .unwrap()
            .starts_with("Failed to load partner"));
    }

    #[tokio::test]
    async fn test_delete_refreshes_after_success() {
        let mut seq = mockall::Sequence::new();
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.method == Method::DELETE)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(HttpResponse::new(200, "")));
        transport
            .expect_send()
            .withf(|req| req.method == Method::GET)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(HttpResponse::new(200, r#"{"data":[{"name":"Telkom University"}]}"#)));

        let mut partners = list(transport);
        partners.delete("rs-hasan-sadikin").await.unwrap();

        assert_eq!(partners.items().len(), 1);
        assert_eq!(partners.last_error(), None);
    }

    #[tokio::test]
    async fn test_failed_create_records_message() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);

        let mut partners = list(transport);
        assert!(partners.create(&PartnerDraft::new("")).await.is_err());
        assert_eq!(
            partners.last_error(),
            Some("Failed to save partner: name is required")
        );
    }

    #[tokio::test]
    async fn test_update_with_failed_reload_still_succeeds() {
        let mut seq = mockall::Sequence::new();
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.method == Method::POST && req.url.ends_with("/admin/partners/telkom-university"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(HttpResponse::new(200, r#"{"success":true}"#)));
        transport
            .expect_send()
            .withf(|req| req.method == Method::GET)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(HttpResponse::new(502, "Bad gateway")));

        let mut partners = list(transport);
        partners
            .update("telkom-university", &PartnerDraft::new("Telkom"))
            .await
            .unwrap();

        assert!(partners.items().is_empty());
        assert!(partners
            .last_error()
            .unwrap()
            .starts_with("Failed to load partner"));
    }
}
