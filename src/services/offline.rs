//! Offline response cache for the dashboard's static front end
//!
//! Mirrors the lifecycle of a browser service worker:
//! - `install`: precache the app shell into the static cache
//! - `activate`: drop caches left over from older versions
//! - `fetch`: answer a request with a per-kind strategy
//!   - navigation: network-first, falling back to the cached root document
//!   - scripts/styles: stale-while-revalidate
//!   - other GETs: cache-first
//!   - non-GET: network only
//! - `handle_message`: runtime cache trim and skip-waiting

use crate::services::cache::ResponseCacheStore;
use crate::services::network::{Destination, Network, Request, Response};
use crate::types::{BizdashError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Document served for navigations while offline
pub const ROOT_DOCUMENT: &str = "/";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OfflineOptions {
    pub cache_prefix: String,
    /// Bump to invalidate every cache on the next activation
    pub cache_version: String,
    /// App shell stored on install
    pub precache: Vec<String>,
    /// Runtime entries older than this (by `Date` header) are trimmed
    pub runtime_max_age_days: i64,
}

impl Default for OfflineOptions {
    fn default() -> Self {
        Self {
            cache_prefix: "bizdash".to_string(),
            cache_version: "v1".to_string(),
            precache: vec![
                ROOT_DOCUMENT.to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
                "/icons/icon-192.png".to_string(),
                "/icons/icon-512.png".to_string(),
            ],
            runtime_max_age_days: 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NetworkOnly,
    NetworkFirst,
    StaleWhileRevalidate,
    CacheFirst,
}

impl Strategy {
    pub fn for_request(request: &Request) -> Self {
        if !request.is_get() {
            return Strategy::NetworkOnly;
        }
        if request.navigate {
            return Strategy::NetworkFirst;
        }
        match request.destination {
            Destination::Script | Destination::Style => Strategy::StaleWhileRevalidate,
            _ => Strategy::CacheFirst,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerMessage {
    TrimCache,
    SkipWaiting,
}

impl FromStr for WorkerMessage {
    type Err = BizdashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "trim-cache" => Ok(WorkerMessage::TrimCache),
            "skip-waiting" => Ok(WorkerMessage::SkipWaiting),
            other => Err(BizdashError::Parse(format!("unknown message {:?}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Trimmed(usize),
    Activated(Vec<String>),
}

pub struct OfflineCache<N: Network> {
    store: ResponseCacheStore,
    network: N,
    options: OfflineOptions,
    /// Requests served stale, waiting for `settle`
    pending: Mutex<Vec<Request>>,
}

impl<N: Network> OfflineCache<N> {
    pub fn new(store: ResponseCacheStore, network: N, options: OfflineOptions) -> Self {
        Self {
            store,
            network,
            options,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &ResponseCacheStore {
        &self.store
    }

    pub fn static_cache_name(&self) -> String {
        format!(
            "{}-static-{}",
            self.options.cache_prefix, self.options.cache_version
        )
    }

    pub fn runtime_cache_name(&self) -> String {
        format!(
            "{}-runtime-{}",
            self.options.cache_prefix, self.options.cache_version
        )
    }

    /// Fetch and store the app shell. Fails if any entry cannot be fetched.
    pub fn install(&self) -> Result<usize> {
        let mut shell = Vec::with_capacity(self.options.precache.len());
        for path in &self.options.precache {
            let request = Request::get(path.as_str());
            let response = self.network.fetch(&request)?;
            if !response.is_cacheable() {
                return Err(BizdashError::Network(format!(
                    "precache {} returned status {}",
                    path, response.status
                )));
            }
            shell.push((request.cache_key().to_string(), response));
        }

        let count = shell.len();
        self.store.put_all(&self.static_cache_name(), shell)?;
        info!(cache = %self.static_cache_name(), entries = count, "installed app shell");
        Ok(count)
    }

    /// Delete every cache that is not one of the current two
    pub fn activate(&self) -> Result<Vec<String>> {
        let keep = [self.static_cache_name(), self.runtime_cache_name()];
        let mut deleted = Vec::new();
        for name in self.store.cache_names()? {
            if keep.contains(&name) {
                continue;
            }
            if self.store.delete_cache(&name)? {
                info!(cache = %name, "deleted stale cache");
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    pub fn fetch(&self, request: &Request) -> Response {
        match Strategy::for_request(request) {
            Strategy::NetworkOnly => self
                .network
                .fetch(request)
                .unwrap_or_else(|e| self.offline(request, e)),
            Strategy::NetworkFirst => self.network_first(request),
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request),
            Strategy::CacheFirst => self.cache_first(request),
        }
    }

    fn network_first(&self, request: &Request) -> Response {
        match self.network.fetch(request) {
            Ok(response) => {
                self.store_quietly(&self.runtime_cache_name(), request, &response);
                response
            }
            Err(e) => {
                debug!(path = %request.path, "navigation offline: {}", e);
                self.match_cached(ROOT_DOCUMENT)
                    .unwrap_or_else(Response::offline)
            }
        }
    }

    fn stale_while_revalidate(&self, request: &Request) -> Response {
        if let Some(cached) = self
            .store
            .lookup(&self.runtime_cache_name(), request.cache_key())
        {
            self.pending_queue().push(request.clone());
            return cached;
        }

        match self.network.fetch(request) {
            Ok(response) => {
                self.store_quietly(&self.runtime_cache_name(), request, &response);
                response
            }
            Err(e) => self.offline(request, e),
        }
    }

    fn cache_first(&self, request: &Request) -> Response {
        if let Some(cached) = self.match_cached(request.cache_key()) {
            return cached;
        }

        match self.network.fetch(request) {
            Ok(response) => {
                self.store_quietly(&self.runtime_cache_name(), request, &response);
                response
            }
            Err(e) => self.offline(request, e),
        }
    }

    /// Run revalidations queued by stale-while-revalidate. Returns the number
    /// of entries refreshed.
    pub fn settle(&self) -> usize {
        let queued: Vec<Request> = std::mem::take(&mut *self.pending_queue());
        let runtime = self.runtime_cache_name();
        queued
            .iter()
            .filter(|request| match self.network.fetch(request) {
                Ok(response) => self.store_quietly(&runtime, request, &response),
                Err(e) => {
                    debug!(path = %request.path, "revalidation failed: {}", e);
                    false
                }
            })
            .count()
    }

    pub fn pending_revalidations(&self) -> usize {
        self.pending_queue().len()
    }

    pub fn handle_message(&self, message: WorkerMessage) -> Result<MessageOutcome> {
        match message {
            WorkerMessage::TrimCache => self.trim_runtime(Utc::now()).map(MessageOutcome::Trimmed),
            WorkerMessage::SkipWaiting => self.activate().map(MessageOutcome::Activated),
        }
    }

    /// Evict runtime entries whose `Date` header is older than the max age.
    /// Entries without a parseable `Date` header are kept.
    pub fn trim_runtime(&self, now: DateTime<Utc>) -> Result<usize> {
        let runtime = self.runtime_cache_name();
        let max_age = Duration::try_days(self.options.runtime_max_age_days).ok_or_else(|| {
            BizdashError::Config(config::ConfigError::Message(format!(
                "offline.runtime_max_age_days out of range: {}",
                self.options.runtime_max_age_days
            )))
        })?;
        let (entries, warning) = self.store.entries(&runtime);
        if let Some(w) = warning {
            warn!(cache = %runtime, "trim skipped unreadable cache: {}", w);
        }

        let expired: Vec<String> = entries
            .into_iter()
            .filter(|(_, response)| response.date().is_some_and(|date| now - date > max_age))
            .map(|(key, _)| key)
            .collect();

        let removed = self.store.remove(&runtime, &expired)?;
        info!(cache = %runtime, removed, "trimmed runtime cache");
        Ok(removed)
    }

    /// Current caches first, then anything not yet removed by `activate`
    fn match_cached(&self, key: &str) -> Option<Response> {
        self.store
            .lookup(&self.static_cache_name(), key)
            .or_else(|| self.store.lookup(&self.runtime_cache_name(), key))
            .or_else(|| self.store.lookup_any(key))
    }

    /// Best-effort put: failures are logged and otherwise ignored
    fn store_quietly(&self, cache: &str, request: &Request, response: &Response) -> bool {
        if !response.is_cacheable() {
            return false;
        }
        match self
            .store
            .put(cache, request.cache_key(), response.clone())
        {
            Ok(()) => true,
            Err(e) => {
                debug!(cache, path = %request.path, "cache put ignored: {}", e);
                false
            }
        }
    }

    fn offline(&self, request: &Request, error: BizdashError) -> Response {
        debug!(path = %request.path, "network failed: {}", error);
        Response::offline()
    }

    fn pending_queue(&self) -> MutexGuard<'_, Vec<Request>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
