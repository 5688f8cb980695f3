use crate::error::{AppError, Result, ValidationError};
use crate::models::bookmark::{
    BookmarkFilter, BookmarkPatch, DateRange, GetBookmarksArgs, UpdateBookmarkArgs,
};
use crate::models::tag::TagSet;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_RANGE_DAYS: i64 = 90;
pub const DEFAULT_LIMIT: u32 = 200;
pub const MAX_LIMIT: u32 = 500;
pub const MAX_TITLE_LENGTH: u64 = 255;
/// Upstream refuses list filters with more tags than this.
pub const MAX_FILTER_TAGS: usize = 3;

static TAG_SEPARATOR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,]").unwrap());

type Validated<T> = std::result::Result<T, ValidationError>;

/// Blank strings count as "not provided".
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// 严格解析 `YYYY-MM-DD` 日期，拒绝不存在的日期和非规范格式
pub fn parse_date(field: &'static str, value: &str) -> Validated<NaiveDate> {
    let invalid = || ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    };

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())?;
    if date.format("%Y-%m-%d").to_string() != value {
        return Err(invalid());
    }
    Ok(date)
}

/// 验证日期范围: 两者都提供或都不提供, 结束日期不早于开始日期, 跨度不超过90天
pub fn validate_date_range(
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Validated<Option<DateRange>> {
    let (start, end) = match (present(start_date), present(end_date)) {
        (None, None) => return Ok(None),
        (Some(start), Some(end)) => (start, end),
        _ => return Err(ValidationError::IncompleteRange),
    };

    let start = parse_date("start_date", start)?;
    let end = parse_date("end_date", end)?;

    if end < start {
        return Err(ValidationError::InvertedRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    let days = (end - start).num_days();
    if days > MAX_RANGE_DAYS {
        return Err(ValidationError::RangeTooLarge {
            days,
            max: MAX_RANGE_DAYS,
        });
    }

    Ok(Some(DateRange { start, end }))
}

/// 解析逗号分隔的标签字符串
pub fn parse_tags(raw: Option<&str>) -> Validated<TagSet> {
    let Some(raw) = raw else {
        return Ok(TagSet::new());
    };

    let segments: Vec<&str> = raw.split(',').map(str::trim).collect();
    if let Some(bad) = segments.iter().find(|s| TAG_SEPARATOR_REGEX.is_match(s)) {
        return Err(ValidationError::InvalidTag(bad.to_string()));
    }

    Ok(TagSet::from_tags(segments))
}

pub fn clamp_limit(limit: Option<i64>) -> u32 {
    match limit {
        None => DEFAULT_LIMIT,
        Some(n) => n.clamp(1, MAX_LIMIT as i64) as u32,
    }
}

pub fn require_url(url: &str) -> Validated<&str> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ValidationError::MissingUrl);
    }
    Ok(url)
}

/// Required URL that must also be an absolute http(s) URL.
pub fn validate_bookmark_url(url: &str) -> Validated<String> {
    let url = require_url(url)?;
    match url::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {
            Ok(url.to_string())
        }
        _ => Err(ValidationError::InvalidUrl(url.to_string())),
    }
}

pub fn validate_title(title: &str) -> Validated<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    if !validator::validate_length(title, None, Some(MAX_TITLE_LENGTH), None) {
        return Err(ValidationError::TitleTooLong {
            max: MAX_TITLE_LENGTH as usize,
        });
    }
    Ok(title.to_string())
}

pub fn normalize_tag_name(field: &'static str, value: &str) -> Validated<String> {
    let name = value.trim().to_lowercase();
    if name.is_empty() {
        return Err(ValidationError::MissingTag(field));
    }
    if TAG_SEPARATOR_REGEX.is_match(&name) {
        return Err(ValidationError::InvalidTag(name));
    }
    Ok(name)
}

/// 验证标签重命名参数, 相同名称视为调用方错误
pub fn validate_rename(old_tag: &str, new_tag: &str) -> Result<(String, String)> {
    let old = normalize_tag_name("old_tag", old_tag)?;
    let new = normalize_tag_name("new_tag", new_tag)?;
    if old == new {
        return Err(AppError::IdenticalTag(old));
    }
    Ok((old, new))
}

pub fn build_filter(args: &GetBookmarksArgs) -> Validated<BookmarkFilter> {
    let date_range = validate_date_range(args.start_date.as_deref(), args.end_date.as_deref())?;
    let tags = parse_tags(args.tags.as_deref())?;
    if tags.len() > MAX_FILTER_TAGS {
        return Err(ValidationError::TooManyTags {
            count: tags.len(),
            max: MAX_FILTER_TAGS,
        });
    }

    Ok(BookmarkFilter {
        date_range,
        tags,
        limit: clamp_limit(args.limit),
    })
}

pub fn build_patch(args: &UpdateBookmarkArgs) -> Validated<BookmarkPatch> {
    Ok(BookmarkPatch {
        title: args.title.as_deref().map(validate_title).transpose()?,
        description: args.description.clone(),
        tags: args.tags.as_deref().map(|t| parse_tags(Some(t))).transpose()?,
        private: args.private,
        to_read: args.to_read,
    })
}
