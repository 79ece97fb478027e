pub mod collaborators;
pub mod email_finder;
pub mod openai_client;
pub mod page_fetcher;
pub mod serper_client;

pub use collaborators::*;
pub use email_finder::*;
pub use openai_client::*;
pub use page_fetcher::*;
pub use serper_client::*;
