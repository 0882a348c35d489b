pub mod bing;

pub use bing::{BingConfig, BingSearchProvider, ACCOUNT_KEY_PLACEHOLDER};
