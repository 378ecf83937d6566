use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

use crate::model::NoteId;

pub const DEFAULT_COUNTER_URL: &str = "https://counter.amethyst.social/";
const BADGE_QUERY: &str = "label=+&color=00000000";
pub const DEFAULT_CACHE_CAPACITY: usize = 200;

#[derive(Error, Debug)]
pub enum CounterError {
    #[error("Invalid counter url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Counter service answered {0}")]
    Status(reqwest::StatusCode),

    #[error("Badge had no readable count")]
    UnreadableBadge,
}

/// The view count as the counter service drew it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Badge {
    pub text: String,
}

impl Badge {
    /// Pulls the count out of the badge SVG: the last `<text>` element with
    /// anything in it. The label half is blank, so that is the value half.
    pub fn from_svg(svg: &str) -> Result<Self, CounterError> {
        let mut found = None;
        let mut rest = svg;
        while let Some(start) = rest.find("<text") {
            rest = &rest[start..];
            let Some(open_end) = rest.find('>') else { break };
            let body = &rest[open_end + 1..];
            let Some(close) = body.find("</text>") else { break };
            let text = unescape(body[..close].trim());
            if !text.is_empty() {
                found = Some(text);
            }
            rest = &body[close..];
        }
        found.map(|text| Badge { text }).ok_or(CounterError::UnreadableBadge)
    }
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

// Memory only; badges are never persisted.
pub struct BadgeCache {
    cache: LruCache<NoteId, Badge>,
}

impl BadgeCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
        }
    }

    pub fn get(&mut self, id: &NoteId) -> Option<&Badge> {
        self.cache.get(id)
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.cache.peek(id).is_some()
    }

    pub fn insert(&mut self, id: NoteId, badge: Badge) {
        self.cache.put(id, badge);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

pub type SharedBadgeCache = Arc<RwLock<BadgeCache>>;

/// Public view counter keyed by note id.
pub struct CounterService {
    client: reqwest::Client,
    base: Url,
    pub cache: SharedBadgeCache,
}

impl CounterService {
    pub fn new(base: &str, cache_capacity: usize) -> Result<Self, CounterError> {
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base,
            cache: Arc::new(RwLock::new(BadgeCache::new(cache_capacity))),
        })
    }

    /// Page with the stats for a note: `<base>/<hex>/`.
    pub fn stats_url(&self, id: &NoteId) -> Result<Url, CounterError> {
        Ok(self.base.join(&format!("{}/", id.to_hex()))?)
    }

    /// Rendered badge: `<base>/<hex>.svg?label=+&color=00000000`.
    pub fn badge_url(&self, id: &NoteId) -> Result<Url, CounterError> {
        let mut url = self.base.join(&format!("{}.svg", id.to_hex()))?;
        url.set_query(Some(BADGE_QUERY));
        Ok(url)
    }

    pub async fn fetch_badge(&self, id: &NoteId) -> Result<Badge, CounterError> {
        {
            let mut cache = self.cache.write().await;
            if let Some(badge) = cache.get(id) {
                return Ok(badge.clone());
            }
        }

        let url = self.badge_url(id)?;
        log::debug!("Fetching view badge {}", url);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CounterError::Status(response.status()));
        }
        let badge = Badge::from_svg(&response.text().await?)?;

        self.cache.write().await.insert(*id, badge.clone());
        Ok(badge)
    }
}
