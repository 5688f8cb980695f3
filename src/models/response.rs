use serde::{Deserialize, Serialize};

use crate::models::{
    bookmark::{BookmarkFilter, BookmarkRecord, DateRange},
    tag::{TagRecord, TagSuggestions},
};

/// Bookmark shape returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkView {
    pub url: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// 由上游在保存时分配; 新建书签在下次读取前没有时间, 此时省略该字段
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub private: bool,
    pub to_read: bool,
}

impl From<&BookmarkRecord> for BookmarkView {
    fn from(record: &BookmarkRecord) -> Self {
        Self {
            url: record.url.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            tags: record.tags.as_slice().to_vec(),
            time: record.created_at.map(|t| t.to_rfc3339()),
            private: record.private,
            to_read: record.to_read,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRangeView {
    pub start: String,
    pub end: String,
}

impl From<&DateRange> for DateRangeView {
    fn from(range: &DateRange) -> Self {
        Self {
            start: range.start.format("%Y-%m-%d").to_string(),
            end: range.end.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiltersApplied {
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRangeView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetBookmarksResponse {
    pub count: usize,
    pub bookmarks: Vec<BookmarkView>,
    pub date_range: Option<DateRangeView>,
    pub filters_applied: FiltersApplied,
}

impl GetBookmarksResponse {
    pub fn new(filter: &BookmarkFilter, records: &[BookmarkRecord]) -> Self {
        let date_range = filter.date_range.as_ref().map(DateRangeView::from);
        let bookmarks: Vec<BookmarkView> = records.iter().map(BookmarkView::from).collect();
        Self {
            count: bookmarks.len(),
            bookmarks,
            date_range: date_range.clone(),
            filters_applied: FiltersApplied {
                limit: filter.limit,
                tags: (!filter.tags.is_empty()).then(|| filter.tags.to_comma_string()),
                date_range,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddBookmarkResponse {
    pub bookmark: BookmarkView,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBookmarkResponse {
    pub bookmark: BookmarkView,
    pub changes: Vec<String>,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetTagsResponse {
    pub tags: Vec<TagRecord>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameTagResponse {
    pub old_tag: String,
    pub new_tag: String,
    pub affected_bookmarks: u64,
}

pub type SuggestTagsResponse = TagSuggestions;

/// 错误响应格式
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: String, message: String) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code,
                message,
                details: None,
            },
        }
    }

    pub fn with_details(code: String, message: String, details: serde_json::Value) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code,
                message,
                details: Some(details),
            },
        }
    }
}
