use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota,
};
use std::{num::NonZeroU32, sync::Arc};

use crate::{
    config::Config,
    error::{AppError, Result},
    services::{
        bookmark::{BookmarkCache, BookmarkService},
        pinboard::PinboardClient,
        rate_limiter::RateLimiter,
        tag::TagService,
        transport::Transport,
    },
};

/// 入站请求限流器 (保护本服务, 与上游限速无关)
pub type InboundLimiter = governor::RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// 应用程序的共享状态
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// Pinboard 客户端, 所有上游调用共用同一个限速器
    pub client: Arc<PinboardClient>,

    /// 书签列表缓存
    pub cache: BookmarkCache,

    /// 书签服务
    pub bookmark_service: BookmarkService,

    /// 标签服务
    pub tag_service: TagService,

    pub inbound_limiter: Arc<InboundLimiter>,
}

impl AppState {
    pub fn new(
        config: Config,
        transport: Arc<dyn Transport>,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self> {
        let per_minute = NonZeroU32::new(config.rate_limit_requests)
            .ok_or_else(|| AppError::internal("rate_limit_requests must be greater than zero"))?;

        let client = Arc::new(PinboardClient::new(transport, limiter));
        let cache = BookmarkCache::new(config.cache_ttl());

        Ok(Self {
            bookmark_service: BookmarkService::new(client.clone(), cache.clone()),
            tag_service: TagService::new(client.clone(), cache.clone()),
            inbound_limiter: Arc::new(governor::RateLimiter::direct(Quota::per_minute(per_minute))),
            client,
            cache,
            config,
        })
    }
}
