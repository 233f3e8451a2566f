//! Link lifecycle service: create, resolve, edit and delete short links.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};
use validator::Validate;

use super::click_recorder::{ClickDispatch, ClickRecorder};
use crate::application::dto::{CreateLink, EditLink, KeyAvailability, LinkDetail};
use crate::domain::click_event::ClickEvent;
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::collaborators::{AccessPolicy, OwnerMatch, PathQrCodeGenerator, QrCodeGenerator};
use crate::domain::entities::{ClickMetadata, Link, LinkPatch, NewLink, OwnerId, OwnerStats};
use crate::domain::expiration;
use crate::domain::repositories::{ClickStore, LinkPager, LinkSortKey, LinkStore, SortDirection};
use crate::error::AppError;
use crate::utils::key_generator::{self, KeyGenerator, MAX_KEY_LEN};
use crate::utils::retry::with_read_retry;
use crate::utils::url_validator::validate_target_url;

/// Number of clicks shown on a link's detail view.
pub const RECENT_CLICKS_LIMIT: i64 = 20;

/// Page size used by [`LinkService::list_links`].
pub const LIST_PAGE_SIZE: i64 = 50;

/// Tunables of the link service.
#[derive(Debug, Clone)]
pub struct LinkServiceConfig {
    /// Starting length of generated keys.
    pub key_length: usize,
    /// Existence checks per length before the key grows by one symbol.
    pub max_attempts: usize,
    /// Inserts retried after a lost uniqueness race on a generated key.
    pub insert_retries: usize,
    /// Prefix of every short URL, without trailing slash.
    pub base_url: String,
    /// Extra attempts for reads failing with a transient storage error.
    pub read_retry_attempts: usize,
}

impl Default for LinkServiceConfig {
    fn default() -> Self {
        Self {
            key_length: 6,
            max_attempts: 10,
            insert_retries: 3,
            base_url: "http://localhost:8000".to_string(),
            read_retry_attempts: 3,
        }
    }
}

/// Service orchestrating the short link lifecycle.
///
/// Holds no mutable state of its own besides the key generator's RNG. All
/// shared state lives in the store, which provides atomic uniqueness-checked
/// insert, atomic counter increment and cascading delete. Share it across
/// tasks behind an [`Arc`].
pub struct LinkService<L: LinkStore, C: ClickStore> {
    store: Arc<L>,
    recorder: Arc<ClickRecorder<C>>,
    dispatch: ClickDispatch<C>,
    keys: KeyGenerator,
    clock: Arc<dyn Clock>,
    access: Arc<dyn AccessPolicy>,
    qr: Arc<dyn QrCodeGenerator>,
    config: LinkServiceConfig,
}

impl<L: LinkStore, C: ClickStore> LinkService<L, C> {
    /// Creates a service with the system clock, owner-match access policy,
    /// path-based QR references and an OS-seeded key generator.
    pub fn new(
        store: Arc<L>,
        recorder: Arc<ClickRecorder<C>>,
        dispatch: ClickDispatch<C>,
        config: LinkServiceConfig,
    ) -> Self {
        Self {
            store,
            recorder,
            dispatch,
            keys: KeyGenerator::from_entropy(),
            clock: Arc::new(SystemClock),
            access: Arc::new(OwnerMatch),
            qr: Arc::new(PathQrCodeGenerator),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_key_generator(mut self, keys: KeyGenerator) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_access_policy(mut self, access: Arc<dyn AccessPolicy>) -> Self {
        self.access = access;
        self
    }

    pub fn with_qr_generator(mut self, qr: Arc<dyn QrCodeGenerator>) -> Self {
        self.qr = qr;
        self
    }

    pub fn config(&self) -> &LinkServiceConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<L> {
        &self.store
    }

    /// Creates a short link.
    ///
    /// # Key allocation
    ///
    /// - A custom key is trimmed, validated, checked, and inserted. It is never
    ///   regenerated: losing the insert race yields [`AppError::KeyTaken`].
    ///   A key that is blank after trimming counts as no custom key.
    /// - Otherwise a random key of `key_length` symbols is checked up to
    ///   `max_attempts` times per length, growing by one symbol each round.
    ///   The store's unique constraint is the final gate; a lost race
    ///   regenerates up to `insert_retries` times.
    ///
    /// A past `expires_at` is accepted; such a link resolves as expired.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidFormat`] for a malformed URL or custom key.
    /// Returns [`AppError::KeyTaken`] if the custom key is in use.
    /// Returns [`AppError::Exhausted`] if no free key could be allocated.
    pub async fn create(&self, input: CreateLink) -> Result<Link, AppError> {
        input.validate()?;
        let target_url = validate_target_url(&input.target_url)?;
        let now = self.clock.now();

        let custom_key = input
            .custom_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string);

        let link = match custom_key {
            Some(custom_key) => {
                self.validate_custom_key(&custom_key).await?;
                let new_link = NewLink {
                    owner: input.owner,
                    target_url,
                    short_key: custom_key.clone(),
                    is_custom: true,
                    created_at: now,
                    expires_at: input.expires_at,
                };

                self.store.insert(new_link).await.map_err(|e| match e {
                    AppError::DuplicateKey { .. } => AppError::key_taken(
                        "This custom key is already taken",
                        json!({ "key": custom_key }),
                    ),
                    other => other,
                })?
            }
            None => {
                self.insert_generated(input.owner, target_url, now, input.expires_at)
                    .await?
            }
        };

        metrics::counter!("links_created_total").increment(1);
        info!(
            "Created link {} -> {} (custom: {})",
            link.short_key, link.target_url, link.is_custom
        );

        if input.generate_qr {
            let id = link.id;
            return match self.render_qr(link.clone()).await {
                Ok(with_qr) => Ok(with_qr),
                Err(e) => {
                    warn!("QR generation failed for link {}: {}", id, e);
                    Ok(link)
                }
            };
        }

        Ok(link)
    }

    /// Resolves a short key to its target URL and records the click.
    ///
    /// The click is handed to the recorder after the redirect decision is
    /// made. Recording failures are logged and dropped and never change the
    /// outcome.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown key (no click recorded).
    /// Returns [`AppError::Expired`] past the link's expiry (no click recorded).
    pub async fn resolve(&self, short_key: &str, metadata: ClickMetadata) -> Result<String, AppError> {
        let found = with_read_retry("get_by_key", self.config.read_retry_attempts, || {
            self.store.get_by_key(short_key)
        })
        .await?;

        let Some(link) = found else {
            metrics::counter!("link_resolutions_total", "outcome" => "not_found").increment(1);
            return Err(AppError::not_found(
                "Short link not found",
                json!({ "key": short_key }),
            ));
        };

        let now = self.clock.now();
        if expiration::is_expired(&link, now) {
            metrics::counter!("link_resolutions_total", "outcome" => "expired").increment(1);
            return Err(AppError::expired(
                "This link has expired",
                json!({ "key": short_key, "expires_at": link.expires_at }),
            ));
        }

        self.dispatch
            .dispatch(ClickEvent::new(link.id, &link.short_key, now, metadata))
            .await;

        metrics::counter!("link_resolutions_total", "outcome" => "redirected").increment(1);
        debug!("Resolved {} -> {}", short_key, link.target_url);

        Ok(link.target_url)
    }

    /// Changes a link's target URL and/or expiry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] or [`AppError::Forbidden`] if the link
    /// is missing or owned by someone else.
    pub async fn edit(&self, link_id: i64, owner: &OwnerId, input: EditLink) -> Result<Link, AppError> {
        input.validate()?;
        let link = self.load_owned(link_id, owner).await?;

        if input.is_empty() {
            return Ok(link);
        }

        let target_url = input
            .target_url
            .as_deref()
            .map(validate_target_url)
            .transpose()?;

        let patch = LinkPatch {
            target_url,
            expires_at: input.expires_at,
            qr_code_ref: None,
        };

        let updated = self.store.update(link.id, patch, self.clock.now()).await?;
        info!("Edited link {} ({})", updated.id, updated.short_key);

        Ok(updated)
    }

    /// Deletes a link and all of its clicks.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] or [`AppError::Forbidden`].
    pub async fn delete(&self, link_id: i64, owner: &OwnerId) -> Result<(), AppError> {
        let link = self.load_owned(link_id, owner).await?;

        if !self.store.delete(link.id).await? {
            return Err(AppError::not_found(
                "Link not found",
                json!({ "link_id": link_id }),
            ));
        }

        info!("Deleted link {} ({})", link.id, link.short_key);
        Ok(())
    }

    /// Live availability check for a custom key.
    ///
    /// Read-only: a positive answer reserves nothing, and a later create can
    /// still fail with [`AppError::KeyTaken`].
    pub async fn check_key_available(&self, key: &str) -> Result<KeyAvailability, AppError> {
        let key = key.trim();
        if key.is_empty() {
            return Ok(KeyAvailability::unavailable("Key cannot be empty"));
        }

        if let Err(e) = key_generator::validate_custom_key(key) {
            return Ok(KeyAvailability::unavailable(e.to_string()));
        }

        if self.key_exists(key).await? {
            return Ok(KeyAvailability::unavailable("Already taken"));
        }

        Ok(KeyAvailability::available())
    }

    /// Checks a custom key's format and that it is not already in use.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidFormat`] or [`AppError::KeyTaken`].
    pub async fn validate_custom_key(&self, key: &str) -> Result<(), AppError> {
        key_generator::validate_custom_key(key)?;

        if self.key_exists(key).await? {
            return Err(AppError::key_taken(
                "This custom key is already taken",
                json!({ "key": key }),
            ));
        }

        Ok(())
    }

    /// A link with its short URL, expiry state and latest clicks.
    pub async fn link_detail(&self, link_id: i64, owner: &OwnerId) -> Result<LinkDetail, AppError> {
        let link = self.load_owned(link_id, owner).await?;

        let recent_clicks = with_read_retry("recent_clicks", self.config.read_retry_attempts, || {
            self.recorder.recent_clicks(link.id, RECENT_CLICKS_LIMIT)
        })
        .await?;

        Ok(LinkDetail {
            short_url: self.short_url(&link.short_key),
            is_expired: expiration::is_expired(&link, self.clock.now()),
            recent_clicks,
            link,
        })
    }

    /// Lazy, restartable listing of an owner's links.
    pub fn list_links(
        &self,
        owner: OwnerId,
        sort: LinkSortKey,
        direction: SortDirection,
    ) -> LinkPager<L> {
        LinkPager::new(self.store.clone(), owner, sort, direction, LIST_PAGE_SIZE)
    }

    /// Totals over an owner's links, with expiry judged at the current time.
    pub async fn owner_stats(&self, owner: &OwnerId) -> Result<OwnerStats, AppError> {
        let now = self.clock.now();
        with_read_retry("owner_stats", self.config.read_retry_attempts, || {
            self.store.owner_stats(owner, now)
        })
        .await
    }

    /// Attaches a QR reference to a link that has none yet.
    ///
    /// A link that already has a reference is returned unchanged.
    pub async fn attach_qr_code(&self, link_id: i64, owner: &OwnerId) -> Result<Link, AppError> {
        let link = self.load_owned(link_id, owner).await?;
        self.render_qr(link).await
    }

    /// Full short URL for a key, e.g. `http://localhost:8000/aB3xY9/`.
    pub fn short_url(&self, short_key: &str) -> String {
        format!("{}/{}/", self.config.base_url.trim_end_matches('/'), short_key)
    }

    /// Absolute expiry `days` from now (1 to 365).
    pub fn expiry_from_days(&self, days: i64) -> Result<DateTime<Utc>, AppError> {
        expiration::expiry_from_days(days, self.clock.now())
    }

    async fn render_qr(&self, link: Link) -> Result<Link, AppError> {
        if link.qr_code_ref.is_some() {
            return Ok(link);
        }

        let reference = self.qr.render(&self.short_url(&link.short_key)).await?;
        let patch = LinkPatch {
            qr_code_ref: Some(reference),
            ..LinkPatch::default()
        };

        self.store.update(link.id, patch, self.clock.now()).await
    }

    async fn insert_generated(
        &self,
        owner: OwnerId,
        target_url: String,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Link, AppError> {
        for attempt in 0..=self.config.insert_retries {
            let short_key = self.generate_unique_key().await?;
            let new_link = NewLink {
                owner: owner.clone(),
                target_url: target_url.clone(),
                short_key,
                is_custom: false,
                created_at,
                expires_at,
            };

            match self.store.insert(new_link).await {
                Ok(link) => return Ok(link),
                Err(AppError::DuplicateKey { message, .. }) => {
                    debug!("Lost key race on attempt {}: {}", attempt + 1, message);
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::exhausted(
            "Failed to allocate a unique short key",
            json!({ "reason": "Too many insert collisions", "retries": self.config.insert_retries }),
        ))
    }

    /// Picks a key that the store does not hold yet.
    ///
    /// Tries `max_attempts` keys per length, then grows the length by one,
    /// up to [`MAX_KEY_LEN`].
    async fn generate_unique_key(&self) -> Result<String, AppError> {
        let start = self.config.key_length.clamp(1, MAX_KEY_LEN);
        let attempts = self.config.max_attempts.max(1);

        for length in start..=MAX_KEY_LEN {
            for _ in 0..attempts {
                let candidate = self.keys.generate(length);
                if !self.key_exists(&candidate).await? {
                    return Ok(candidate);
                }
            }
            warn!("Key space at length {} is crowded, growing keys", length);
        }

        Err(AppError::exhausted(
            "Failed to generate unique short key",
            json!({ "reason": "Too many collisions" }),
        ))
    }

    async fn key_exists(&self, key: &str) -> Result<bool, AppError> {
        with_read_retry("key_exists", self.config.read_retry_attempts, || {
            self.store.key_exists(key)
        })
        .await
    }

    /// Loads a link and checks that `owner` may act on it.
    async fn load_owned(&self, link_id: i64, owner: &OwnerId) -> Result<Link, AppError> {
        let link = with_read_retry("get_by_id", self.config.read_retry_attempts, || {
            self.store.get_by_id(link_id)
        })
        .await?
        .ok_or_else(|| AppError::not_found("Link not found", json!({ "link_id": link_id })))?;

        if !self.access.is_owner(&link, owner) {
            return Err(AppError::forbidden(
                "You do not have permission to modify this link",
                json!({ "link_id": link_id }),
            ));
        }

        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::ManualClock;
    use crate::domain::collaborators::MockQrCodeGenerator;
    use crate::domain::entities::Click;
    use crate::domain::repositories::{MockClickStore, MockLinkStore};
    use chrono::{Duration, TimeZone};
    use std::time::Duration as StdDuration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn link(id: i64, key: &str, owner: &str) -> Link {
        NewLink {
            owner: OwnerId::new(owner),
            target_url: "https://example.com/a/very/long/path".to_string(),
            short_key: key.to_string(),
            is_custom: false,
            created_at: now(),
            expires_at: None,
        }
        .into_link(id)
    }

    fn service_with(
        store: MockLinkStore,
        clicks: MockClickStore,
        config: LinkServiceConfig,
    ) -> LinkService<MockLinkStore, MockClickStore> {
        let recorder = Arc::new(ClickRecorder::new(
            Arc::new(clicks),
            StdDuration::from_secs(1),
        ));
        LinkService::new(
            Arc::new(store),
            recorder.clone(),
            ClickDispatch::Inline(recorder),
            config,
        )
        .with_clock(Arc::new(ManualClock::new(now())))
        .with_key_generator(KeyGenerator::from_seed(7))
    }

    fn service(store: MockLinkStore, clicks: MockClickStore) -> LinkService<MockLinkStore, MockClickStore> {
        service_with(store, clicks, LinkServiceConfig::default())
    }

    #[tokio::test]
    async fn test_create_generated_key_success() {
        let mut store = MockLinkStore::new();
        store.expect_key_exists().times(1).returning(|_| Ok(false));
        store
            .expect_insert()
            .withf(|new| new.short_key.len() == 6 && !new.is_custom)
            .times(1)
            .returning(|new| Ok(new.into_link(1)));

        let service = service(store, MockClickStore::new());
        let link = service
            .create(CreateLink::new("alice", "https://example.com/a/very/long/path"))
            .await
            .unwrap();

        assert_eq!(link.short_key.len(), 6);
        assert_eq!(link.target_url, "https://example.com/a/very/long/path");
        assert_eq!(link.click_count, 0);
        assert_eq!(link.created_at, now());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_url() {
        let service = service(MockLinkStore::new(), MockClickStore::new());

        let result = service
            .create(CreateLink::new("alice", "javascript:alert(1)"))
            .await;

        assert!(matches!(result, Err(AppError::InvalidFormat { .. })));
    }

    #[tokio::test]
    async fn test_create_rejects_short_custom_key() {
        let service = service(MockLinkStore::new(), MockClickStore::new());

        let result = service
            .create(CreateLink::new("alice", "https://example.com").with_custom_key("ab"))
            .await;

        assert!(matches!(result, Err(AppError::InvalidFormat { .. })));
    }

    #[tokio::test]
    async fn test_create_trims_custom_key_before_checks() {
        let mut store = MockLinkStore::new();
        store
            .expect_key_exists()
            .withf(|key| key == "my-link")
            .times(1)
            .returning(|_| Ok(false));
        store
            .expect_insert()
            .withf(|new| new.short_key == "my-link" && new.is_custom)
            .times(1)
            .returning(|new| Ok(new.into_link(1)));

        let service = service(store, MockClickStore::new());
        let link = service
            .create(CreateLink::new("alice", "https://example.com").with_custom_key("  my-link\t"))
            .await
            .unwrap();

        assert_eq!(link.short_key, "my-link");
    }

    #[tokio::test]
    async fn test_owner_stats_use_injected_clock() {
        let mut store = MockLinkStore::new();
        store
            .expect_owner_stats()
            .withf(|owner, at| owner.as_str() == "alice" && *at == now())
            .times(1)
            .returning(|_, _| {
                Ok(OwnerStats {
                    total_links: 3,
                    total_clicks: 12,
                    active_links: 2,
                    expired_links: 1,
                })
            });

        let service = service(store, MockClickStore::new());
        let stats = service.owner_stats(&OwnerId::new("alice")).await.unwrap();

        assert_eq!(stats.total_clicks, 12);
        assert_eq!(stats.expired_links, 1);
    }

    #[tokio::test]
    async fn test_create_custom_key_taken_on_lookup() {
        let mut store = MockLinkStore::new();
        store
            .expect_key_exists()
            .withf(|key| key == "my-link")
            .times(1)
            .returning(|_| Ok(true));
        store.expect_insert().never();

        let service = service(store, MockClickStore::new());
        let result = service
            .create(CreateLink::new("alice", "https://example.com").with_custom_key("my-link"))
            .await;

        assert!(matches!(result, Err(AppError::KeyTaken { .. })));
    }

    #[tokio::test]
    async fn test_create_custom_key_lost_race_is_key_taken() {
        let mut store = MockLinkStore::new();
        store.expect_key_exists().times(1).returning(|_| Ok(false));
        store
            .expect_insert()
            .times(1)
            .returning(|_| Err(AppError::duplicate_key("taken", json!({}))));

        let service = service(store, MockClickStore::new());
        let result = service
            .create(CreateLink::new("alice", "https://example.com").with_custom_key("my-link"))
            .await;

        assert!(matches!(result, Err(AppError::KeyTaken { .. })));
    }

    #[tokio::test]
    async fn test_create_custom_key_is_marked_custom() {
        let mut store = MockLinkStore::new();
        store.expect_key_exists().returning(|_| Ok(false));
        store
            .expect_insert()
            .withf(|new| new.short_key == "my-link" && new.is_custom)
            .times(1)
            .returning(|new| Ok(new.into_link(3)));

        let service = service(store, MockClickStore::new());
        let link = service
            .create(CreateLink::new("alice", "https://example.com").with_custom_key("my-link"))
            .await
            .unwrap();

        assert!(link.is_custom);
        assert_eq!(link.short_key, "my-link");
    }

    #[tokio::test]
    async fn test_create_regenerates_after_duplicate_insert() {
        let mut store = MockLinkStore::new();
        store.expect_key_exists().times(2).returning(|_| Ok(false));

        let mut seq = mockall::Sequence::new();
        store
            .expect_insert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::duplicate_key("race", json!({}))));
        store
            .expect_insert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|new| Ok(new.into_link(2)));

        let service = service(store, MockClickStore::new());
        let link = service
            .create(CreateLink::new("alice", "https://example.com"))
            .await
            .unwrap();

        assert_eq!(link.id, 2);
    }

    #[tokio::test]
    async fn test_create_exhausts_insert_retries() {
        let mut store = MockLinkStore::new();
        store.expect_key_exists().returning(|_| Ok(false));
        store
            .expect_insert()
            .times(4)
            .returning(|_| Err(AppError::duplicate_key("race", json!({}))));

        let service = service(store, MockClickStore::new());
        let result = service
            .create(CreateLink::new("alice", "https://example.com"))
            .await;

        assert!(matches!(result, Err(AppError::Exhausted { .. })));
    }

    #[tokio::test]
    async fn test_generation_grows_key_when_length_is_crowded() {
        let mut store = MockLinkStore::new();
        store
            .expect_key_exists()
            .returning(|key| Ok(key.len() < 7));
        store
            .expect_insert()
            .withf(|new| new.short_key.len() == 7)
            .times(1)
            .returning(|new| Ok(new.into_link(1)));

        let config = LinkServiceConfig {
            max_attempts: 3,
            ..LinkServiceConfig::default()
        };
        let service = service_with(store, MockClickStore::new(), config);
        let link = service
            .create(CreateLink::new("alice", "https://example.com"))
            .await
            .unwrap();

        assert_eq!(link.short_key.len(), 7);
    }

    #[tokio::test]
    async fn test_generation_exhausted_at_max_length() {
        let mut store = MockLinkStore::new();
        store.expect_key_exists().returning(|_| Ok(true));
        store.expect_insert().never();

        let config = LinkServiceConfig {
            key_length: MAX_KEY_LEN,
            max_attempts: 2,
            ..LinkServiceConfig::default()
        };
        let service = service_with(store, MockClickStore::new(), config);
        let result = service
            .create(CreateLink::new("alice", "https://example.com"))
            .await;

        assert!(matches!(result, Err(AppError::Exhausted { .. })));
    }

    #[tokio::test]
    async fn test_create_keeps_link_when_qr_fails() {
        let mut store = MockLinkStore::new();
        store.expect_key_exists().returning(|_| Ok(false));
        store
            .expect_insert()
            .returning(|new| Ok(new.into_link(5)));
        store.expect_update().never();

        let mut qr = MockQrCodeGenerator::new();
        qr.expect_render()
            .times(1)
            .returning(|_| Err(AppError::internal("renderer down", json!({}))));

        let service = service(store, MockClickStore::new()).with_qr_generator(Arc::new(qr));
        let link = service
            .create(CreateLink::new("alice", "https://example.com").with_qr_code())
            .await
            .unwrap();

        assert_eq!(link.id, 5);
        assert!(link.qr_code_ref.is_none());
    }

    #[tokio::test]
    async fn test_resolve_records_click_and_returns_target() {
        let mut store = MockLinkStore::new();
        store
            .expect_get_by_key()
            .withf(|key| key == "aB3xY9")
            .times(1)
            .returning(|_| Ok(Some(link(1, "aB3xY9", "alice"))));

        let mut clicks = MockClickStore::new();
        clicks
            .expect_append_click()
            .withf(|c| c.link_id == 1 && c.occurred_at == now())
            .times(1)
            .returning(|c| Ok(c.into_click(10)));

        let service = service(store, clicks);
        let target = service
            .resolve("aB3xY9", ClickMetadata::default())
            .await
            .unwrap();

        assert_eq!(target, "https://example.com/a/very/long/path");
    }

    #[tokio::test]
    async fn test_resolve_unknown_key_records_nothing() {
        let mut store = MockLinkStore::new();
        store.expect_get_by_key().times(1).returning(|_| Ok(None));

        let mut clicks = MockClickStore::new();
        clicks.expect_append_click().never();

        let service = service(store, clicks);
        let result = service.resolve("nope42", ClickMetadata::default()).await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_resolve_expired_link_records_nothing() {
        let mut store = MockLinkStore::new();
        store.expect_get_by_key().returning(|_| {
            let mut expired = link(1, "old123", "alice");
            expired.expires_at = Some(now() - Duration::hours(1));
            Ok(Some(expired))
        });

        let mut clicks = MockClickStore::new();
        clicks.expect_append_click().never();

        let service = service(store, clicks);
        let result = service.resolve("old123", ClickMetadata::default()).await;

        assert!(matches!(result, Err(AppError::Expired { .. })));
    }

    #[tokio::test]
    async fn test_resolve_succeeds_when_recording_fails() {
        let mut store = MockLinkStore::new();
        store
            .expect_get_by_key()
            .returning(|_| Ok(Some(link(1, "aB3xY9", "alice"))));

        let mut clicks = MockClickStore::new();
        clicks
            .expect_append_click()
            .times(1)
            .returning(|_| Err(AppError::unavailable("pool timed out", json!({}))));

        let service = service(store, clicks);
        let result = service.resolve("aB3xY9", ClickMetadata::default()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_resolve_retries_transient_read() {
        let mut store = MockLinkStore::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_get_by_key()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::unavailable("connection reset", json!({}))));
        store
            .expect_get_by_key()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(link(1, "aB3xY9", "alice"))));

        let mut clicks = MockClickStore::new();
        clicks
            .expect_append_click()
            .returning(|c| Ok(c.into_click(1)));

        let service = service(store, clicks);
        let result = service.resolve("aB3xY9", ClickMetadata::default()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_edit_by_non_owner_is_forbidden() {
        let mut store = MockLinkStore::new();
        store
            .expect_get_by_id()
            .returning(|id| Ok(Some(link(id, "aB3xY9", "alice"))));
        store.expect_update().never();

        let service = service(store, MockClickStore::new());
        let edit = EditLink {
            target_url: Some("https://other.example".to_string()),
            ..EditLink::default()
        };
        let result = service.edit(1, &OwnerId::new("mallory"), edit).await;

        assert!(matches!(result, Err(AppError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_edit_updates_target_and_clears_expiry() {
        let mut store = MockLinkStore::new();
        store
            .expect_get_by_id()
            .returning(|id| Ok(Some(link(id, "aB3xY9", "alice"))));
        store
            .expect_update()
            .withf(|id, patch, _| {
                *id == 1
                    && patch.target_url.as_deref() == Some("https://other.example/")
                    && patch.expires_at == Some(None)
            })
            .times(1)
            .returning(|id, patch, at| {
                let mut updated = link(id, "aB3xY9", "alice");
                patch.apply(&mut updated, at);
                Ok(updated)
            });

        let service = service(store, MockClickStore::new());
        let edit = EditLink {
            target_url: Some("https://other.example/".to_string()),
            expires_at: Some(None),
        };
        let updated = service.edit(1, &OwnerId::new("alice"), edit).await.unwrap();

        assert_eq!(updated.target_url, "https://other.example/");
        assert_eq!(updated.short_key, "aB3xY9");
    }

    #[tokio::test]
    async fn test_delete_missing_link_is_not_found() {
        let mut store = MockLinkStore::new();
        store.expect_get_by_id().returning(|_| Ok(None));
        store.expect_delete().never();

        let service = service(store, MockClickStore::new());
        let result = service.delete(9, &OwnerId::new("alice")).await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_check_key_available_messages() {
        let mut store = MockLinkStore::new();
        store
            .expect_key_exists()
            .returning(|key| Ok(key == "taken"));

        let service = service(store, MockClickStore::new());

        let empty = service.check_key_available("  ").await.unwrap();
        assert_eq!(empty, KeyAvailability::unavailable("Key cannot be empty"));

        let short = service.check_key_available("ab").await.unwrap();
        assert!(!short.available);
        assert!(short.message.contains("at least 3"));

        let taken = service.check_key_available("taken").await.unwrap();
        assert_eq!(taken, KeyAvailability::unavailable("Already taken"));

        let free = service.check_key_available("free-key").await.unwrap();
        assert_eq!(free, KeyAvailability::available());
    }

    #[tokio::test]
    async fn test_link_detail_includes_recent_clicks() {
        let mut store = MockLinkStore::new();
        store
            .expect_get_by_id()
            .returning(|id| Ok(Some(link(id, "aB3xY9", "alice"))));

        let mut clicks = MockClickStore::new();
        clicks
            .expect_recent_clicks()
            .withf(|link_id, limit| *link_id == 4 && *limit == RECENT_CLICKS_LIMIT)
            .times(1)
            .returning(|link_id, _| {
                Ok(vec![Click {
                    id: 1,
                    link_id,
                    occurred_at: now(),
                    client_ip: None,
                    user_agent: None,
                    referrer: None,
                }])
            });

        let service = service(store, clicks);
        let detail = service.link_detail(4, &OwnerId::new("alice")).await.unwrap();

        assert_eq!(detail.short_url, "http://localhost:8000/aB3xY9/");
        assert_eq!(detail.recent_clicks.len(), 1);
        assert!(!detail.is_expired);
    }

    #[tokio::test]
    async fn test_attach_qr_code_stores_reference_once() {
        let mut store = MockLinkStore::new();
        store
            .expect_get_by_id()
            .returning(|id| Ok(Some(link(id, "aB3xY9", "alice"))));
        store
            .expect_update()
            .withf(|_, patch, _| patch.qr_code_ref.as_deref() == Some("qr_codes/qr_aB3xY9.png"))
            .times(1)
            .returning(|id, patch, at| {
                let mut updated = link(id, "aB3xY9", "alice");
                patch.apply(&mut updated, at);
                Ok(updated)
            });

        let service = service(store, MockClickStore::new());
        let updated = service
            .attach_qr_code(1, &OwnerId::new("alice"))
            .await
            .unwrap();

        assert_eq!(updated.qr_code_ref.as_deref(), Some("qr_codes/qr_aB3xY9.png"));
    }

    #[test]
    fn test_short_url_format() {
        let config = LinkServiceConfig {
            base_url: "https://sho.rt/".to_string(),
            ..LinkServiceConfig::default()
        };
        let service = service_with(MockLinkStore::new(), MockClickStore::new(), config);

        assert_eq!(service.short_url("my-link"), "https://sho.rt/my-link/");
    }

    #[test]
    fn test_expiry_from_days_uses_service_clock() {
        let service = service(MockLinkStore::new(), MockClickStore::new());

        assert_eq!(service.expiry_from_days(7).unwrap(), now() + Duration::days(7));
        assert!(service.expiry_from_days(0).is_err());
    }
}
