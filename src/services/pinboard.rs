use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    error::{AppError, Result},
    models::{
        bookmark::{BookmarkFilter, BookmarkRecord},
        tag::{TagRecord, TagSet, TagSuggestions},
    },
    services::{
        rate_limiter::RateLimiter,
        transport::{Endpoint, QueryParams, Transport},
    },
};

const PINBOARD_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Post as Pinboard serializes it. Only lives inside this module.
#[derive(Debug, Deserialize)]
struct RawPost {
    #[serde(default)]
    href: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    extended: String,
    #[serde(default)]
    tags: String,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    shared: String,
    #[serde(default)]
    toread: String,
}

impl TryFrom<RawPost> for BookmarkRecord {
    type Error = AppError;

    fn try_from(raw: RawPost) -> Result<Self> {
        if raw.href.trim().is_empty() {
            return Err(AppError::upstream("bookmark without url in response"));
        }

        let created_at = match raw.time.as_deref().filter(|t| !t.is_empty()) {
            Some(time) => Some(
                DateTime::parse_from_rfc3339(time)
                    .map_err(|_| AppError::upstream(format!("invalid bookmark time '{}'", time)))?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        Ok(BookmarkRecord {
            url: raw.href,
            title: raw.description,
            description: raw.extended,
            tags: TagSet::from_upstream(&raw.tags),
            created_at,
            private: raw.shared == "no",
            to_read: raw.toread == "yes",
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCount {
    Number(u64),
    Text(String),
}

impl RawCount {
    fn value(&self) -> Option<u64> {
        match self {
            RawCount::Number(n) => Some(*n),
            RawCount::Text(s) => s.trim().parse().ok(),
        }
    }
}

fn decode<T: DeserializeOwned>(endpoint: Endpoint, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        AppError::upstream(format!(
            "unexpected payload from {}: {}",
            endpoint.path(),
            e
        ))
    })
}

fn decode_posts(endpoint: Endpoint, value: Value) -> Result<Vec<BookmarkRecord>> {
    let posts: Vec<RawPost> = decode(endpoint, value)?;
    posts.into_iter().map(BookmarkRecord::try_from).collect()
}

fn yes_no(flag: bool) -> String {
    let value = if flag { "yes" } else { "no" };
    value.to_string()
}

/// Write endpoints answer `{"result_code": "done"}` (posts) or `{"result": "done"}` (tags).
fn result_code(value: &Value) -> Option<&str> {
    value
        .get("result_code")
        .or_else(|| value.get("result"))
        .and_then(Value::as_str)
}

/// Typed, rate-limited access to the Pinboard API.
pub struct PinboardClient {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
}

impl PinboardClient {
    pub fn new(transport: Arc<dyn Transport>, limiter: Arc<RateLimiter>) -> Self {
        Self { transport, limiter }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    async fn call(&self, endpoint: Endpoint, params: QueryParams) -> Result<Value> {
        self.limiter.acquire().await;
        if endpoint.is_write() {
            info!("Calling Pinboard {} (write)", endpoint.path());
        } else {
            debug!("Calling Pinboard {} with {} params", endpoint.path(), params.len());
        }

        self.transport.get(endpoint, params).await.map_err(|e| {
            warn!("Pinboard {} failed: {}", endpoint.path(), e);
            AppError::from(e)
        })
    }

    async fn write(&self, endpoint: Endpoint, params: QueryParams) -> Result<()> {
        let value = self.call(endpoint, params).await?;
        match result_code(&value) {
            Some("done") => Ok(()),
            Some(code) => Err(AppError::upstream(format!(
                "{} answered '{}'",
                endpoint.path(),
                code
            ))),
            None => Err(AppError::upstream(format!(
                "{} answered without a result code",
                endpoint.path()
            ))),
        }
    }

    /// Time of the most recent change to any bookmark; doubles as a credential check.
    pub async fn last_update(&self) -> Result<DateTime<Utc>> {
        #[derive(Deserialize)]
        struct UpdateTime {
            update_time: String,
        }

        let value = self.call(Endpoint::PostsUpdate, Vec::new()).await?;
        let raw: UpdateTime = decode(Endpoint::PostsUpdate, value)?;
        DateTime::parse_from_rfc3339(&raw.update_time)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| AppError::upstream(format!("invalid update_time '{}'", raw.update_time)))
    }

    /// Newest-first listing restricted by the filter.
    pub async fn list_bookmarks(&self, filter: &BookmarkFilter) -> Result<Vec<BookmarkRecord>> {
        let mut params: QueryParams = vec![("results", filter.limit.to_string())];
        if !filter.tags.is_empty() {
            params.push(("tag", filter.tags.to_upstream()));
        }
        if let Some(range) = &filter.date_range {
            // the range covers both calendar days completely
            params.push(("fromdt", range.start.format("%Y-%m-%dT00:00:00Z").to_string()));
            params.push(("todt", range.end.format("%Y-%m-%dT23:59:59Z").to_string()));
        }

        let value = self.call(Endpoint::PostsAll, params).await?;
        decode_posts(Endpoint::PostsAll, value)
    }

    pub async fn get_bookmark(&self, url: &str) -> Result<Option<BookmarkRecord>> {
        #[derive(Deserialize)]
        struct PostsEnvelope {
            #[serde(default)]
            posts: Vec<Value>,
        }

        let value = self
            .call(Endpoint::PostsGet, vec![("url", url.to_string())])
            .await?;
        let envelope: PostsEnvelope = decode(Endpoint::PostsGet, value)?;
        let posts = decode_posts(Endpoint::PostsGet, Value::Array(envelope.posts))?;

        // upstream normalizes URLs loosely; only an exact match is the same bookmark
        Ok(posts.into_iter().find(|post| post.url == url))
    }

    /// Creates the bookmark, overwriting any existing one at the same URL.
    pub async fn create_bookmark(&self, record: &BookmarkRecord) -> Result<()> {
        let mut params: QueryParams = vec![
            ("url", record.url.clone()),
            ("description", record.title.clone()),
            ("extended", record.description.clone()),
            ("tags", record.tags.to_upstream()),
            ("shared", yes_no(!record.private)),
            ("toread", yes_no(record.to_read)),
            ("replace", "yes".to_string()),
        ];
        if let Some(created_at) = record.created_at {
            params.push(("dt", created_at.format(PINBOARD_TIME_FORMAT).to_string()));
        }

        self.write(Endpoint::PostsAdd, params).await
    }

    pub async fn delete_bookmark(&self, url: &str) -> Result<()> {
        let value = self
            .call(Endpoint::PostsDelete, vec![("url", url.to_string())])
            .await?;
        match result_code(&value) {
            Some("done") => Ok(()),
            Some("item not found") => Err(AppError::BookmarkNotFound(url.to_string())),
            other => Err(AppError::upstream(format!(
                "posts/delete answered '{}'",
                other.unwrap_or("")
            ))),
        }
    }

    /// All tags with counts; names differing only by case are folded together.
    pub async fn get_tags(&self) -> Result<Vec<TagRecord>> {
        let value = self.call(Endpoint::TagsGet, Vec::new()).await?;

        // an account without tags gets an empty array instead of an object
        if value.as_array().map_or(false, Vec::is_empty) {
            return Ok(Vec::new());
        }

        let raw: BTreeMap<String, RawCount> = decode(Endpoint::TagsGet, value)?;
        let mut folded: BTreeMap<String, u64> = BTreeMap::new();
        for (name, count) in raw {
            let count = count
                .value()
                .ok_or_else(|| AppError::upstream(format!("invalid count for tag '{}'", name)))?;
            let name = name.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            *folded.entry(name).or_insert(0) += count;
        }

        Ok(folded
            .into_iter()
            .map(|(name, count)| TagRecord { name, count })
            .collect())
    }

    pub async fn rename_tag(&self, old_tag: &str, new_tag: &str) -> Result<()> {
        self.write(
            Endpoint::TagsRename,
            vec![("old", old_tag.to_string()), ("new", new_tag.to_string())],
        )
        .await
    }

    pub async fn suggest_tags(&self, url: &str) -> Result<TagSuggestions> {
        let value = self
            .call(Endpoint::PostsSuggest, vec![("url", url.to_string())])
            .await?;

        // documented as [{"popular": [...]}, {"recommended": [...]}], sometimes a single object
        let parts: Vec<BTreeMap<String, Vec<String>>> = match value {
            Value::Array(_) => decode(Endpoint::PostsSuggest, value)?,
            other => vec![decode(Endpoint::PostsSuggest, other)?],
        };

        let mut suggestions = TagSuggestions::default();
        for part in parts {
            for (kind, tags) in part {
                let tags = TagSet::from_tags(tags).as_slice().to_vec();
                match kind.as_str() {
                    "popular" => suggestions.popular.extend(tags),
                    "recommended" => suggestions.recommended.extend(tags),
                    _ => debug!("Ignoring suggestion group '{}'", kind),
                }
            }
        }
        Ok(suggestions)
    }
}
