pub mod cache;
pub mod error_collection;
pub mod retry;

pub use cache::*;
pub use error_collection::*;
pub use retry::*;
