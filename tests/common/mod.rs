#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use pinboard_bridge::{
    config::Config,
    services::{
        transport::{Endpoint, QueryParams, Transport, TransportError},
        RateLimiter,
    },
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct FakePost {
    pub href: String,
    pub description: String,
    pub extended: String,
    pub tags: String,
    pub time: DateTime<Utc>,
    pub shared: bool,
    pub toread: bool,
}

impl FakePost {
    pub fn new(href: &str, title: &str, time: &str) -> Self {
        Self {
            href: href.to_string(),
            description: title.to_string(),
            extended: String::new(),
            tags: String::new(),
            time: time.parse().unwrap(),
            shared: true,
            toread: false,
        }
    }

    pub fn tags(mut self, tags: &str) -> Self {
        self.tags = tags.to_string();
        self
    }

    pub fn extended(mut self, extended: &str) -> Self {
        self.extended = extended.to_string();
        self
    }

    pub fn to_read(mut self) -> Self {
        self.toread = true;
        self
    }

    fn to_json(&self) -> Value {
        json!({
            "href": self.href,
            "description": self.description,
            "extended": self.extended,
            "tags": self.tags,
            "time": self.time.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            "shared": if self.shared { "yes" } else { "no" },
            "toread": if self.toread { "yes" } else { "no" },
            "hash": "0123456789abcdef",
            "meta": "fedcba9876543210",
        })
    }

    fn tag_list(&self) -> Vec<&str> {
        self.tags.split_whitespace().collect()
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub endpoint: Endpoint,
    pub params: QueryParams,
    pub at: Instant,
}

#[derive(Default)]
struct FakeState {
    posts: Vec<FakePost>,
    calls: Vec<RecordedCall>,
    failures: HashMap<Endpoint, TransportError>,
    delays: HashMap<Endpoint, Duration>,
}

/// In-memory stand-in for the Pinboard v1 API.
#[derive(Default)]
pub struct FakePinboard {
    state: Mutex<FakeState>,
}

fn param<'a>(params: &'a QueryParams, key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.as_str())
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, TransportError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| TransportError::Status {
            status: 400,
            body: format!("bad date {}", raw),
        })
}

impl FakePinboard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_posts(posts: Vec<FakePost>) -> Arc<Self> {
        let fake = Self::default();
        fake.state.lock().unwrap().posts = posts;
        Arc::new(fake)
    }

    /// Makes every later call to `endpoint` fail with `error`.
    pub fn fail(&self, endpoint: Endpoint, error: TransportError) {
        self.state.lock().unwrap().failures.insert(endpoint, error);
    }

    /// Makes every later call to `endpoint` answer only after `delay`.
    /// The answer reflects the stored posts when the call arrived.
    pub fn delay(&self, endpoint: Endpoint, delay: Duration) {
        self.state.lock().unwrap().delays.insert(endpoint, delay);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> usize {
        self.calls().iter().filter(|c| c.endpoint == endpoint).count()
    }

    pub fn post(&self, href: &str) -> Option<FakePost> {
        let state = self.state.lock().unwrap();
        state.posts.iter().find(|p| p.href == href).cloned()
    }

    pub fn posts(&self) -> Vec<FakePost> {
        self.state.lock().unwrap().posts.clone()
    }

    fn handle(
        state: &mut FakeState,
        endpoint: Endpoint,
        params: &QueryParams,
    ) -> Result<Value, TransportError> {
        match endpoint {
            Endpoint::PostsUpdate => {
                let latest = state.posts.iter().map(|p| p.time).max();
                let time = latest.unwrap_or_else(|| "2024-01-01T00:00:00Z".parse().unwrap());
                Ok(json!({ "update_time": time.format("%Y-%m-%dT%H:%M:%SZ").to_string() }))
            }
            Endpoint::PostsAll => {
                let from = param(params, "fromdt").map(parse_time).transpose()?;
                let to = param(params, "todt").map(parse_time).transpose()?;
                let wanted: Vec<&str> = param(params, "tag")
                    .map(|t| t.split_whitespace().collect())
                    .unwrap_or_default();
                let limit = param(params, "results")
                    .and_then(|r| r.parse::<usize>().ok())
                    .unwrap_or(usize::MAX);

                let mut posts: Vec<&FakePost> = state
                    .posts
                    .iter()
                    .filter(|p| from.map_or(true, |f| p.time >= f))
                    .filter(|p| to.map_or(true, |t| p.time <= t))
                    .filter(|p| wanted.iter().all(|w| p.tag_list().contains(w)))
                    .collect();
                posts.sort_by(|a, b| b.time.cmp(&a.time));

                Ok(Value::Array(
                    posts.into_iter().take(limit).map(FakePost::to_json).collect(),
                ))
            }
            Endpoint::PostsGet => {
                let url = param(params, "url").unwrap_or_default();
                let posts: Vec<Value> = state
                    .posts
                    .iter()
                    .filter(|p| p.href == url)
                    .map(FakePost::to_json)
                    .collect();
                Ok(json!({ "date": "2024-01-01T00:00:00Z", "user": "tester", "posts": posts }))
            }
            Endpoint::PostsAdd => {
                let url = param(params, "url").unwrap_or_default().to_string();
                let replace = param(params, "replace") == Some("yes");
                let existing = state.posts.iter().position(|p| p.href == url);
                if existing.is_some() && !replace {
                    return Ok(json!({ "result_code": "item already exists" }));
                }

                let time = match param(params, "dt") {
                    Some(dt) => parse_time(dt)?,
                    None => existing
                        .map(|i| state.posts[i].time)
                        .unwrap_or_else(Utc::now),
                };
                let post = FakePost {
                    href: url,
                    description: param(params, "description").unwrap_or_default().to_string(),
                    extended: param(params, "extended").unwrap_or_default().to_string(),
                    tags: param(params, "tags").unwrap_or_default().to_string(),
                    time,
                    shared: param(params, "shared") != Some("no"),
                    toread: param(params, "toread") == Some("yes"),
                };
                match existing {
                    Some(i) => state.posts[i] = post,
                    None => state.posts.push(post),
                }
                Ok(json!({ "result_code": "done" }))
            }
            Endpoint::PostsDelete => {
                let url = param(params, "url").unwrap_or_default();
                let before = state.posts.len();
                state.posts.retain(|p| p.href != url);
                let code = if state.posts.len() < before { "done" } else { "item not found" };
                Ok(json!({ "result_code": code }))
            }
            Endpoint::PostsSuggest => Ok(json!([
                { "popular": ["Rust", "programming"] },
                { "recommended": ["rust", "systems", "language"] },
            ])),
            Endpoint::TagsGet => {
                let mut counts: BTreeMap<String, u64> = BTreeMap::new();
                for post in &state.posts {
                    for tag in post.tag_list() {
                        *counts.entry(tag.to_string()).or_insert(0) += 1;
                    }
                }
                if counts.is_empty() {
                    return Ok(json!([]));
                }
                // counts come back as strings, like the real service
                let map: Map<String, Value> = counts
                    .into_iter()
                    .map(|(name, count)| (name, Value::String(count.to_string())))
                    .collect();
                Ok(Value::Object(map))
            }
            Endpoint::TagsRename => {
                let old = param(params, "old").unwrap_or_default().to_string();
                let new = param(params, "new").unwrap_or_default().to_string();
                for post in state.posts.iter_mut() {
                    let renamed: Vec<String> = post
                        .tag_list()
                        .into_iter()
                        .map(|t| if t == old { new.clone() } else { t.to_string() })
                        .collect();
                    post.tags = renamed.join(" ");
                }
                Ok(json!({ "result": "done" }))
            }
        }
    }
}

#[async_trait]
impl Transport for FakePinboard {
    async fn get(&self, endpoint: Endpoint, params: QueryParams) -> Result<Value, TransportError> {
        let (answer, delay) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(RecordedCall {
                endpoint,
                params: params.clone(),
                at: Instant::now(),
            });

            if let Some(error) = state.failures.get(&endpoint) {
                return Err(error.clone());
            }
            let delay = state.delays.get(&endpoint).copied();
            (Self::handle(&mut state, endpoint, &params), delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        answer
    }
}

pub fn test_config(cache_ttl_secs: u64) -> Config {
    let ttl = cache_ttl_secs.to_string();
    Config::from_lookup(|key| match key {
        "PINBOARD_TOKEN" => Some("tester:0123456789ABCDEF".to_string()),
        "CACHE_TTL" => Some(ttl.clone()),
        "PINBOARD_MIN_INTERVAL_MS" => Some("0".to_string()),
        _ => None,
    })
    .unwrap()
}

/// State wired to the fake with an unthrottled limiter.
pub fn test_state(fake: Arc<FakePinboard>, cache_ttl_secs: u64) -> AppState {
    AppState::new(
        test_config(cache_ttl_secs),
        fake,
        Arc::new(RateLimiter::unthrottled()),
    )
    .unwrap()
}

pub fn throttled_state(fake: Arc<FakePinboard>, min_interval: Duration) -> AppState {
    throttled_cached_state(fake, min_interval, 0)
}

pub fn throttled_cached_state(
    fake: Arc<FakePinboard>,
    min_interval: Duration,
    cache_ttl_secs: u64,
) -> AppState {
    AppState::new(
        test_config(cache_ttl_secs),
        fake,
        Arc::new(RateLimiter::new(min_interval)),
    )
    .unwrap()
}
