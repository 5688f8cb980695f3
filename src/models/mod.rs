pub mod bookmark;
pub mod response;
pub mod tag;
