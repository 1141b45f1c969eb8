pub mod cache_control;
pub mod response;

pub use cache_control::{apply_cache_control, cache_control_middleware, is_asset_path, CacheControlState};
pub use response::{ApiResponse, Page, PageContext};
