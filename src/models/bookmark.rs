use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::tag::TagSet;
use crate::utils::serde_helpers::{loose_bool, optional_loose_bool};

/// A bookmark as stored upstream. `url` is the only identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkRecord {
    pub url: String,
    pub title: String,
    pub description: String,
    pub tags: TagSet,
    pub created_at: Option<DateTime<Utc>>,
    pub private: bool,
    pub to_read: bool,
}

/// Inclusive calendar range, at most 90 days wide once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        let day = at.date_naive();
        day >= self.start && day <= self.end
    }
}

/// Normalized list filter; doubles as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookmarkFilter {
    pub date_range: Option<DateRange>,
    pub tags: TagSet,
    pub limit: u32,
}

/// Fields an update may change. `None` means "keep the current value".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<TagSet>,
    pub private: Option<bool>,
    pub to_read: Option<bool>,
}

impl BookmarkPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.private.is_none()
            && self.to_read.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetBookmarksArgs {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub tags: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddBookmarkArgs {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub tags: Option<String>,
    #[serde(default, deserialize_with = "loose_bool::deserialize")]
    pub private: bool,
    #[serde(default, deserialize_with = "loose_bool::deserialize")]
    pub to_read: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateBookmarkArgs {
    #[serde(default)]
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    #[serde(default, deserialize_with = "optional_loose_bool::deserialize")]
    pub private: Option<bool>,
    #[serde(default, deserialize_with = "optional_loose_bool::deserialize")]
    pub to_read: Option<bool>,
}
