pub mod api;
pub mod fetcher;
pub mod lexicon;

pub use api::{ApiServer, ApiServerConfig, AppState};
pub use fetcher::HttpFetcher;
pub use lexicon::{LexiconEngine, LexiconError};
