//! Emailing list service
//!
//! Lists are identified by one of the configured names and hold an ordered
//! set of subscriber addresses. The service keeps the set free of duplicates.

use crate::config::EmailingConfig;
use crate::db::is_unique_violation;
use crate::db::repositories::EmailingListRepository;
use crate::models::{EmailingList, Outcome, Rejection};
use std::sync::Arc;

pub const SUBSCRIBED: &str = "You have subscribed to my newsletter updates. Thank you for joining in :)";
pub const UNSUBSCRIBED: &str =
    "You have been unsubscribed from my newsletter updates. You are welcome to join back in any time.";
pub const NOT_SUBSCRIBED: &str = "This email address does not exist in my email list.";

/// Error types for emailing list operations
#[derive(Debug, thiserror::Error)]
pub enum EmailingListServiceError {
    /// Name is not one of the configured lists
    #[error("Unknown emailing list: {0}")]
    UnknownList(String),

    /// The stored subscriber column is not a JSON array of strings
    #[error("Corrupt subscriber data for list {0}: {1}")]
    InvalidData(String, #[source] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Emailing list service
pub struct EmailingListService {
    repo: Arc<dyn EmailingListRepository>,
    config: EmailingConfig,
}

impl EmailingListService {
    pub fn new(repo: Arc<dyn EmailingListRepository>, config: EmailingConfig) -> Self {
        Self { repo, config }
    }

    /// Get the list with this name, creating it empty on first use
    pub async fn emailing_list_factory(&self, name: &str) -> Result<EmailingList, EmailingListServiceError> {
        if !self.config.is_allowed(name) {
            return Err(EmailingListServiceError::UnknownList(name.to_string()));
        }

        if let Some(list) = self.repo.get_by_name(name).await? {
            return Ok(list);
        }

        match self.repo.create(&EmailingList::new(name.to_string())).await {
            Ok(created) => {
                tracing::info!("Emailing list '{}' created", created.name);
                Ok(created)
            }
            Err(e) if is_unique_violation(&e) => {
                // Another caller created it between our lookup and insert.
                tracing::debug!("Emailing list '{}' created concurrently", name);
                self.repo
                    .get_by_name(name)
                    .await?
                    .ok_or(EmailingListServiceError::InternalError(e))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Subscriber addresses in subscription order
    pub fn get_emails_list(&self, list: &EmailingList) -> Result<Vec<String>, EmailingListServiceError> {
        list.emails_list()
            .map_err(|e| EmailingListServiceError::InvalidData(list.name.clone(), e))
    }

    /// Add an address. Subscribing twice is not an error and changes nothing.
    pub async fn subscribe(
        &self,
        list: &mut EmailingList,
        email: &str,
    ) -> Result<Outcome<()>, EmailingListServiceError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(EmailingListServiceError::ValidationError(
                "Email cannot be empty".to_string(),
            ));
        }

        let mut emails = self.get_emails_list(list)?;
        if emails.iter().any(|e| e == email) {
            tracing::debug!("{} already subscribed to '{}'", email, list.name);
            return Ok(Outcome::success((), SUBSCRIBED));
        }

        emails.push(email.to_string());
        self.store(list, &emails).await?;

        tracing::info!("{} subscribed to '{}'", email, list.name);
        Ok(Outcome::success((), SUBSCRIBED))
    }

    /// Remove an address. Fails without changes if it is not subscribed.
    pub async fn unsubscribe(
        &self,
        list: &mut EmailingList,
        email: &str,
    ) -> Result<Outcome<()>, EmailingListServiceError> {
        let email = email.trim();
        let mut emails = self.get_emails_list(list)?;
        let before = emails.len();
        emails.retain(|e| e != email);

        if emails.len() == before {
            return Ok(Rejection::not_found(NOT_SUBSCRIBED).into());
        }

        self.store(list, &emails).await?;

        tracing::info!("{} unsubscribed from '{}'", email, list.name);
        Ok(Outcome::success((), UNSUBSCRIBED))
    }

    /// Display form of a list: its configured label
    pub fn label<'a>(&'a self, list: &'a EmailingList) -> &'a str {
        self.config
            .choice(&list.name)
            .map(|c| c.label.as_str())
            .unwrap_or(list.name.as_str())
    }

    /// Persist the new subscriber set, then mirror it into `list`.
    /// `list` is left untouched when the write fails.
    async fn store(&self, list: &mut EmailingList, emails: &[String]) -> Result<(), EmailingListServiceError> {
        let mut updated = list.clone();
        updated
            .set_emails_list(emails)
            .map_err(|e| EmailingListServiceError::InvalidData(list.name.clone(), e))?;
        self.repo.update_emails(updated.id, &updated.emails).await?;
        *list = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmailingListChoice;
    use crate::db::repositories::SqlxEmailingListRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::RejectionKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn config() -> EmailingConfig {
        EmailingConfig {
            lists: vec![
                EmailingListChoice::new("newsletter", "Newsletter"),
                EmailingListChoice::new("releases", "Release notes"),
            ],
        }
    }

    async fn setup() -> EmailingListService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        EmailingListService::new(SqlxEmailingListRepository::boxed(pool), config())
    }

    /// Misses on the first lookup, as if the row was inserted right after it
    struct StaleLookupRepository {
        inner: SqlxEmailingListRepository,
        missed: AtomicBool,
    }

    #[async_trait]
    impl EmailingListRepository for StaleLookupRepository {
        async fn create(&self, list: &EmailingList) -> anyhow::Result<EmailingList> {
            self.inner.create(list).await
        }

        async fn get_by_name(&self, name: &str) -> anyhow::Result<Option<EmailingList>> {
            if !self.missed.swap(true, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.get_by_name(name).await
        }

        async fn update_emails(&self, id: i64, emails: &str) -> anyhow::Result<()> {
            self.inner.update_emails(id, emails).await
        }
    }

    /// Delegates to SQLite but refuses every subscriber write
    struct ReadOnlyRepository(SqlxEmailingListRepository);

    #[async_trait]
    impl EmailingListRepository for ReadOnlyRepository {
        async fn create(&self, list: &EmailingList) -> anyhow::Result<EmailingList> {
            self.0.create(list).await
        }

        async fn get_by_name(&self, name: &str) -> anyhow::Result<Option<EmailingList>> {
            self.0.get_by_name(name).await
        }

        async fn update_emails(&self, _id: i64, _emails: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("database is read-only"))
        }
    }

    #[tokio::test]
    async fn test_factory_get_or_create() {
        let service = setup().await;

        let first = service.emailing_list_factory("newsletter").await.unwrap();
        assert!(first.id > 0);
        assert!(service.get_emails_list(&first).unwrap().is_empty());

        let again = service.emailing_list_factory("newsletter").await.unwrap();
        assert_eq!(again.id, first.id);

        let other = service.emailing_list_factory("releases").await.unwrap();
        assert_ne!(other.id, first.id);
    }

    #[tokio::test]
    async fn test_concurrent_factory_calls_share_one_list() {
        let service = setup().await;

        let (a, b) = tokio::join!(
            service.emailing_list_factory("newsletter"),
            service.emailing_list_factory("newsletter")
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.id, b.id);

        let again = service.emailing_list_factory("newsletter").await.unwrap();
        assert_eq!(again.id, a.id);
    }

    #[tokio::test]
    async fn test_factory_returns_row_created_by_other_caller() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let existing = SqlxEmailingListRepository::new(pool.clone())
            .create(&EmailingList::new("newsletter".to_string()))
            .await
            .unwrap();

        let repo = StaleLookupRepository {
            inner: SqlxEmailingListRepository::new(pool),
            missed: AtomicBool::new(false),
        };
        let service = EmailingListService::new(Arc::new(repo), config());

        let list = service.emailing_list_factory("newsletter").await.unwrap();
        assert_eq!(list.id, existing.id);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_list_unchanged() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let service = EmailingListService::new(
            Arc::new(ReadOnlyRepository(SqlxEmailingListRepository::new(pool))),
            config(),
        );

        let mut list = service.emailing_list_factory("newsletter").await.unwrap();
        let before = list.clone();

        assert!(matches!(
            service.subscribe(&mut list, "a@example.com").await,
            Err(EmailingListServiceError::InternalError(_))
        ));
        assert_eq!(list, before);
        assert!(service.get_emails_list(&list).unwrap().is_empty());

        // The retry still sees the address as new.
        assert!(service.subscribe(&mut list, "a@example.com").await.is_err());
        assert_eq!(list, before);
    }

    #[tokio::test]
    async fn test_factory_refuses_unknown_name() {
        let service = setup().await;
        assert!(matches!(
            service.emailing_list_factory("spam").await,
            Err(EmailingListServiceError::UnknownList(name)) if name == "spam"
        ));
    }

    #[tokio::test]
    async fn test_subscribe_is_idempotent() {
        let service = setup().await;
        let mut list = service.emailing_list_factory("newsletter").await.unwrap();

        let first = service.subscribe(&mut list, "a@example.com").await.unwrap();
        let second = service.subscribe(&mut list, "a@example.com").await.unwrap();
        assert_eq!(first.into_pair(), (true, SUBSCRIBED.to_string()));
        assert_eq!(second.into_pair(), (true, SUBSCRIBED.to_string()));

        let stored = service.emailing_list_factory("newsletter").await.unwrap();
        assert_eq!(service.get_emails_list(&stored).unwrap(), vec!["a@example.com"]);
    }

    #[tokio::test]
    async fn test_subscribe_keeps_order() {
        let service = setup().await;
        let mut list = service.emailing_list_factory("newsletter").await.unwrap();

        for email in ["c@example.com", "a@example.com", "b@example.com"] {
            service.subscribe(&mut list, email).await.unwrap();
        }

        let stored = service.emailing_list_factory("newsletter").await.unwrap();
        assert_eq!(
            service.get_emails_list(&stored).unwrap(),
            vec!["c@example.com", "a@example.com", "b@example.com"]
        );
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let service = setup().await;
        let mut list = service.emailing_list_factory("newsletter").await.unwrap();
        service.subscribe(&mut list, "a@example.com").await.unwrap();
        service.subscribe(&mut list, "b@example.com").await.unwrap();

        let outcome = service.unsubscribe(&mut list, "a@example.com").await.unwrap();
        assert_eq!(outcome.into_pair(), (true, UNSUBSCRIBED.to_string()));

        let stored = service.emailing_list_factory("newsletter").await.unwrap();
        assert_eq!(service.get_emails_list(&stored).unwrap(), vec!["b@example.com"]);
    }

    #[tokio::test]
    async fn test_unsubscribe_absent_address_changes_nothing() {
        let service = setup().await;
        let mut list = service.emailing_list_factory("newsletter").await.unwrap();
        service.subscribe(&mut list, "a@example.com").await.unwrap();
        let before = service.emailing_list_factory("newsletter").await.unwrap();

        let outcome = service.unsubscribe(&mut list, "ghost@example.com").await.unwrap();
        let rejection = outcome.rejection().cloned().unwrap();
        assert_eq!(rejection.kind, RejectionKind::NotFound);
        assert_eq!(rejection.message, NOT_SUBSCRIBED);

        let after = service.emailing_list_factory("newsletter").await.unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_corrupt_column_is_reported() {
        let service = setup().await;
        let mut list = service.emailing_list_factory("newsletter").await.unwrap();
        list.emails = "not json".to_string();

        assert!(matches!(
            service.subscribe(&mut list, "a@example.com").await,
            Err(EmailingListServiceError::InvalidData(..))
        ));
    }

    #[tokio::test]
    async fn test_label() {
        let service = setup().await;
        let list = service.emailing_list_factory("releases").await.unwrap();
        assert_eq!(service.label(&list), "Release notes");

        let stray = EmailingList::new("legacy".to_string());
        assert_eq!(service.label(&stray), "legacy");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        #[derive(Debug, Clone)]
        enum Op {
            Subscribe(usize),
            Unsubscribe(usize),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0usize..4).prop_map(Op::Subscribe),
                (0usize..4).prop_map(Op::Unsubscribe),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(20))]

            /// After any sequence of (un)subscriptions the stored list has no
            /// duplicates and holds exactly the addresses still subscribed.
            #[test]
            fn subscriber_list_is_a_set(ops in prop::collection::vec(op(), 1..15)) {
                tokio_test::block_on(async {
                    let service = setup().await;
                    let mut list = service.emailing_list_factory("newsletter").await.unwrap();
                    let mut expected = HashSet::new();

                    for op in &ops {
                        match op {
                            Op::Subscribe(i) => {
                                let email = format!("user{}@example.com", i);
                                service.subscribe(&mut list, &email).await.unwrap();
                                expected.insert(email);
                            }
                            Op::Unsubscribe(i) => {
                                let email = format!("user{}@example.com", i);
                                let outcome = service.unsubscribe(&mut list, &email).await.unwrap();
                                prop_assert_eq!(outcome.is_success(), expected.remove(&email));
                            }
                        }
                    }

                    let stored = service.emailing_list_factory("newsletter").await.unwrap();
                    let emails = service.get_emails_list(&stored).unwrap();
                    let unique: HashSet<String> = emails.iter().cloned().collect();
                    prop_assert_eq!(unique.len(), emails.len());
                    prop_assert_eq!(unique, expected);
                    Ok(())
                })?;
            }
        }
    }
}
