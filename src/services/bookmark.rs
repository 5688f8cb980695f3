use crate::{
    error::{AppError, Result},
    models::{
        bookmark::*,
        response::{AddBookmarkResponse, BookmarkView, GetBookmarksResponse, UpdateBookmarkResponse},
    },
    services::{pinboard::PinboardClient, update::UpdateEmulator},
    utils::{cache::Cache, validation},
};
use std::sync::Arc;
use tracing::{debug, info};

/// List results keyed by the normalized filter.
pub type BookmarkCache = Cache<BookmarkFilter, Arc<Vec<BookmarkRecord>>>;

#[derive(Clone)]
pub struct BookmarkService {
    client: Arc<PinboardClient>,
    updater: Arc<UpdateEmulator>,
    cache: BookmarkCache,
}

impl BookmarkService {
    pub fn new(client: Arc<PinboardClient>, cache: BookmarkCache) -> Self {
        Self {
            updater: Arc::new(UpdateEmulator::new(client.clone())),
            client,
            cache,
        }
    }

    pub async fn get_bookmarks(&self, args: GetBookmarksArgs) -> Result<GetBookmarksResponse> {
        let filter = validation::build_filter(&args)?;
        debug!("Getting bookmarks with filter: {:?}", filter);

        let records = crate::cache_get_or_set_async!(self.cache, filter, self.fetch(&filter))?;

        info!("Retrieved {} bookmarks", records.len());
        Ok(GetBookmarksResponse::new(&filter, &records))
    }

    async fn fetch(&self, filter: &BookmarkFilter) -> Result<Arc<Vec<BookmarkRecord>>> {
        let mut records = self.client.list_bookmarks(filter).await?;

        // upstream applies the range too; enforce the inclusive calendar semantics locally
        if let Some(range) = &filter.date_range {
            records.retain(|r| r.created_at.map_or(false, |t| range.contains(&t)));
        }
        records.truncate(filter.limit as usize);

        Ok(Arc::new(records))
    }

    pub async fn add_bookmark(&self, args: AddBookmarkArgs) -> Result<AddBookmarkResponse> {
        let url = validation::validate_bookmark_url(&args.url)?;
        let title = validation::validate_title(&args.title)?;
        let tags = validation::parse_tags(args.tags.as_deref())?;
        debug!("Adding bookmark: {}", url);

        let record = BookmarkRecord {
            url,
            title,
            description: args.description.unwrap_or_default(),
            tags,
            created_at: None,
            private: args.private,
            to_read: args.to_read,
        };

        self.client.create_bookmark(&record).await?;
        self.cache.clear();

        info!("Added bookmark: {}", record.url);
        Ok(AddBookmarkResponse {
            bookmark: BookmarkView::from(&record),
            success: true,
        })
    }

    pub async fn update_bookmark(&self, args: UpdateBookmarkArgs) -> Result<UpdateBookmarkResponse> {
        let url = validation::require_url(&args.url)?.to_string();
        let patch = validation::build_patch(&args)?;
        if patch.is_empty() {
            return Err(AppError::NoChangesRequested);
        }
        debug!("Updating bookmark: {}", url);

        let outcome = self.updater.update(&url, &patch).await?;
        if !outcome.changes.is_empty() {
            self.cache.clear();
        }

        Ok(UpdateBookmarkResponse {
            bookmark: BookmarkView::from(&outcome.bookmark),
            changes: outcome.changes,
            success: true,
        })
    }
}
