use crate::{
    error::{AppError, Result},
    models::{
        response::{GetTagsResponse, RenameTagResponse, SuggestTagsResponse},
        tag::*,
    },
    services::{bookmark::BookmarkCache, pinboard::PinboardClient},
    utils::validation,
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct TagService {
    client: Arc<PinboardClient>,
    cache: BookmarkCache,
}

impl TagService {
    pub fn new(client: Arc<PinboardClient>, cache: BookmarkCache) -> Self {
        Self { client, cache }
    }

    pub async fn get_tags(&self) -> Result<GetTagsResponse> {
        debug!("Fetching tags from Pinboard");

        let mut tags = self.client.get_tags().await?;
        sort_tags(&mut tags);

        info!("Retrieved {} tags", tags.len());
        Ok(GetTagsResponse {
            total: tags.len(),
            tags,
        })
    }

    /// Renames a tag on every bookmark. The reported count is captured before the rename.
    pub async fn rename_tag(&self, args: RenameTagArgs) -> Result<RenameTagResponse> {
        let (old_tag, new_tag) = validation::validate_rename(&args.old_tag, &args.new_tag)?;
        debug!("Renaming tag {} to {}", old_tag, new_tag);

        let affected = self
            .client
            .get_tags()
            .await?
            .into_iter()
            .find(|t| t.name == old_tag)
            .map(|t| t.count)
            .ok_or_else(|| AppError::TagNotFound(old_tag.clone()))?;

        self.client.rename_tag(&old_tag, &new_tag).await?;
        self.cache.clear();

        info!("Renamed tag {} to {} on {} bookmarks", old_tag, new_tag, affected);
        Ok(RenameTagResponse {
            old_tag,
            new_tag,
            affected_bookmarks: affected,
        })
    }

    pub async fn suggest_tags(&self, args: SuggestTagsArgs) -> Result<SuggestTagsResponse> {
        let url = validation::require_url(&args.url)?;
        debug!("Getting tag suggestions for {}", url);

        self.client.suggest_tags(url).await
    }
}
