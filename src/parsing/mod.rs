pub mod cascade;
pub mod fallback;

pub use cascade::*;
pub use fallback::*;
