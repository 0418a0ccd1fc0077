//! buildfeed: announces builds from an artifact server as RSS and HTML.
//!
//! The pipeline is linear: fetch the remote directory listing, parse build
//! ids out of it, enrich each build with its changelog excerpt and local
//! artifact timestamp, render, cache, serve.
//!
//! - [`feed`] - fetching, listing parsing, enrichment and rendering
//! - [`publish`] - the on-disk cache and the publish orchestration
//! - [`server`] - HTTP surface for the three feed variants
//! - [`config`] - TOML configuration

pub mod config;
pub mod feed;
pub mod publish;
pub mod server;
pub mod util;
