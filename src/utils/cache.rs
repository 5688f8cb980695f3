use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use tracing::debug;

/// 缓存项
#[derive(Debug, Clone)]
struct CacheItem<V> {
    value: V,
    expires_at: Instant,
}

/// 读路径的内存缓存, TTL 为零时不缓存任何内容
///
/// 每次 `clear` 都会递增代数; 在旧代数下算出的结果不会再写入缓存。
#[derive(Debug)]
pub struct Cache<K: Eq + Hash, V> {
    data: Arc<DashMap<K, CacheItem<V>>>,
    generation: Arc<AtomicU64>,
    default_ttl: Duration,
}

impl<K: Eq + Hash, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            generation: self.generation.clone(),
            default_ttl: self.default_ttl,
        }
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// 创建新的缓存实例
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            data: Arc::new(DashMap::new()),
            generation: Arc::new(AtomicU64::new(0)),
            default_ttl,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.default_ttl.is_zero()
    }

    /// 设置缓存项, 并发写入同一个键时以最后一次为准
    pub fn set(&self, key: K, value: V) {
        if !self.is_enabled() {
            return;
        }
        let item = CacheItem {
            value,
            expires_at: Instant::now() + self.default_ttl,
        };
        self.data.insert(key, item);
    }

    /// 当前代数, 在开始计算一个缓存值之前读取
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// 仅当期间没有发生 `clear` 时才写入
    pub fn set_if_generation(&self, key: K, value: V, generation: u64)
    where
        K: Clone,
    {
        if !self.is_enabled() || self.generation() != generation {
            return;
        }
        let item = CacheItem {
            value,
            expires_at: Instant::now() + self.default_ttl,
        };
        self.data.insert(key.clone(), item);

        // a clear that raced with the insert above must still win
        if self.generation() != generation {
            self.data.remove(&key);
        }
    }

    /// 获取未过期的缓存项
    pub fn get(&self, key: &K) -> Option<V> {
        let item = self.data.get(key)?;
        if item.expires_at > Instant::now() {
            Some(item.value.clone())
        } else {
            None
        }
    }

    /// 清空所有缓存
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.data.clear();
    }

    /// 获取缓存大小 (包含尚未清理的过期项)
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 清理过期项
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.data.retain(|_, item| item.expires_at > now);
    }

    /// 启动后台清理任务
    pub fn spawn_cleanup(&self, every: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(every);
            loop {
                ticker.tick().await;
                cache.cleanup_expired();
                debug!("Cache sweep done, {} entries left", cache.size());
            }
        })
    }
}

/// 缓存辅助宏: 命中时直接返回, 否则计算并写入 (计算期间被清空则不写入)
#[macro_export]
macro_rules! cache_get_or_set_async {
    ($cache:expr, $key:expr, $compute:expr) => {{
        match $cache.get(&$key) {
            Some(value) => Ok(value),
            None => {
                let generation = $cache.generation();
                match $compute.await {
                    Ok(computed_value) => {
                        $cache.set_if_generation($key.clone(), computed_value.clone(), generation);
                        Ok(computed_value)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }};
}
