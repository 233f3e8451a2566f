#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url_shortener_core::application::services::{
    ClickDispatch, ClickRecorder, LinkService, LinkServiceConfig,
};
use url_shortener_core::domain::clock::{Clock, ManualClock};
use url_shortener_core::domain::entities::{Click, NewClick};
use url_shortener_core::domain::repositories::ClickStore;
use url_shortener_core::error::AppError;
use url_shortener_core::infrastructure::memory::MemoryStore;
use url_shortener_core::utils::key_generator::KeyGenerator;

pub const TARGET_URL: &str = "https://example.com/a/very/long/path";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

/// Service over an in-memory store with inline click recording.
pub struct Harness<C: ClickStore> {
    pub service: Arc<LinkService<MemoryStore, C>>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

impl<C: ClickStore> Harness<C> {
    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

pub fn harness() -> Harness<MemoryStore> {
    harness_with(LinkServiceConfig::default())
}

pub fn harness_with(config: LinkServiceConfig) -> Harness<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    harness_over(store.clone(), store, config, Duration::from_secs(2))
}

pub fn harness_over<C: ClickStore + 'static>(
    store: Arc<MemoryStore>,
    clicks: Arc<C>,
    config: LinkServiceConfig,
    record_timeout: Duration,
) -> Harness<C> {
    let clock = Arc::new(ManualClock::new(start_time()));
    let recorder = Arc::new(ClickRecorder::new(clicks, record_timeout));

    let service = LinkService::new(
        store.clone(),
        recorder.clone(),
        ClickDispatch::Inline(recorder),
        config,
    )
    .with_clock(clock.clone())
    .with_key_generator(KeyGenerator::from_seed(42));

    Harness {
        service: Arc::new(service),
        store,
        clock,
    }
}

/// Click store that fails every `fail_every`-th append before touching data.
pub struct FlakyClicks {
    pub inner: Arc<MemoryStore>,
    pub fail_every: u64,
    calls: AtomicU64,
    failures: AtomicU64,
}

impl FlakyClicks {
    pub fn new(inner: Arc<MemoryStore>, fail_every: u64) -> Self {
        Self {
            inner,
            fail_every,
            calls: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClickStore for FlakyClicks {
    async fn append_click(&self, new_click: NewClick) -> Result<Click, AppError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call % self.fail_every == 0 {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(AppError::unavailable("injected failure", json!({ "call": call })));
        }
        self.inner.append_click(new_click).await
    }

    async fn recent_clicks(&self, link_id: i64, limit: i64) -> Result<Vec<Click>, AppError> {
        self.inner.recent_clicks(link_id, limit).await
    }

    async fn count_clicks(&self, link_id: i64) -> Result<i64, AppError> {
        self.inner.count_clicks(link_id).await
    }
}

/// Click store that stalls before every append.
pub struct SlowClicks {
    pub inner: Arc<MemoryStore>,
    pub delay: Duration,
}

#[async_trait]
impl ClickStore for SlowClicks {
    async fn append_click(&self, new_click: NewClick) -> Result<Click, AppError> {
        tokio::time::sleep(self.delay).await;
        self.inner.append_click(new_click).await
    }

    async fn recent_clicks(&self, link_id: i64, limit: i64) -> Result<Vec<Click>, AppError> {
        self.inner.recent_clicks(link_id, limit).await
    }

    async fn count_clicks(&self, link_id: i64) -> Result<i64, AppError> {
        self.inner.count_clicks(link_id).await
    }
}
