//! Incremental feed loading, with Hacker News as the bundled source.

pub mod api;
pub mod cli;
pub mod error;
pub mod feed;
pub mod logging;
pub mod output;
pub mod settings;
pub mod stream;

#[cfg(test)]
mod test_utils;

pub use error::FetchError;
