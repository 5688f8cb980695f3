pub mod rate_limiter;
pub mod transport;
pub mod pinboard;
pub mod update;
pub mod bookmark;
pub mod tag;

// 重新导出常用类型
pub use rate_limiter::RateLimiter;
pub use transport::{Endpoint, HttpTransport, Transport, TransportError};
pub use pinboard::PinboardClient;
pub use update::UpdateEmulator;
pub use bookmark::{BookmarkCache, BookmarkService};
pub use tag::TagService;
