//! Partial bookmark updates on an API that only knows "create or overwrite".
//!
//! An update is a fetch followed by exactly one overwrite of the merged record.
//! There is no delete step, so a failed write leaves the original bookmark intact.

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::{
    error::{AppError, Result},
    models::bookmark::{BookmarkPatch, BookmarkRecord},
    services::pinboard::PinboardClient,
};

/// Result of a committed (or no-op) update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub bookmark: BookmarkRecord,
    pub changes: Vec<String>,
}

/// Applies the patch over `current`; absent fields keep their current value.
pub fn merge(current: &BookmarkRecord, patch: &BookmarkPatch) -> BookmarkRecord {
    BookmarkRecord {
        url: current.url.clone(),
        title: patch.title.clone().unwrap_or_else(|| current.title.clone()),
        description: patch
            .description
            .clone()
            .unwrap_or_else(|| current.description.clone()),
        tags: patch.tags.clone().unwrap_or_else(|| current.tags.clone()),
        created_at: current.created_at,
        private: patch.private.unwrap_or(current.private),
        to_read: patch.to_read.unwrap_or(current.to_read),
    }
}

/// Names of the fields whose value differs between the two records.
pub fn diff(before: &BookmarkRecord, after: &BookmarkRecord) -> Vec<String> {
    let mut changes = Vec::new();
    if before.title != after.title {
        changes.push("title");
    }
    if before.description != after.description {
        changes.push("description");
    }
    if before.tags != after.tags {
        changes.push("tags");
    }
    if before.private != after.private {
        changes.push("private");
    }
    if before.to_read != after.to_read {
        changes.push("to_read");
    }
    changes.into_iter().map(String::from).collect()
}

pub struct UpdateEmulator {
    client: Arc<PinboardClient>,
}

impl UpdateEmulator {
    pub fn new(client: Arc<PinboardClient>) -> Self {
        Self { client }
    }

    /// `url` and `patch` must already be validated and the patch non-empty.
    pub async fn update(&self, url: &str, patch: &BookmarkPatch) -> Result<UpdateOutcome> {
        if patch.is_empty() {
            return Err(AppError::NoChangesRequested);
        }

        let current = self
            .client
            .get_bookmark(url)
            .await?
            .ok_or_else(|| AppError::BookmarkNotFound(url.to_string()))?;

        let merged = merge(&current, patch);
        let changes = diff(&current, &merged);

        if changes.is_empty() {
            debug!("Update of {} changes nothing, skipping write", url);
            return Ok(UpdateOutcome {
                bookmark: current,
                changes,
            });
        }

        if let Err(e) = self.client.create_bookmark(&merged).await {
            error!("Overwrite of {} failed: {}", url, e);
            return Err(AppError::UpdateFailed {
                original: Box::new(current),
                reason: e.to_string(),
            });
        }

        info!("Updated bookmark {} ({})", url, changes.join(", "));
        Ok(UpdateOutcome {
            bookmark: merged,
            changes,
        })
    }
}
