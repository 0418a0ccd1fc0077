//! Build feed pipeline: fetching, listing parsing, enrichment and rendering.
//!
//! - [`fetcher`] - single-attempt HTTP fetch behind a TCP reachability probe
//! - [`listing`] - directory index scraping into raw build ids
//! - [`build`] - validated build ids, artifact naming, build items
//! - [`changelog`] - newest-version excerpt extraction
//! - [`enrich`] - changelog + local archive → announceable build
//! - [`render`] - RSS 1.0, RSS 2.0 and HTML fragment output
//! - [`emergency`] - newest local build when the server is down
//!
//! # Example
//!
//! ```ignore
//! use buildfeed::feed::{AnchorListingParser, ListingParser, BuildId};
//!
//! let html = fetcher.fetch_text(&config.listing_url).await?;
//! for raw in AnchorListingParser.parse(&html) {
//!     if let Ok(id) = BuildId::parse(&raw) {
//!         if let Some(item) = enricher.enrich(&id).await {
//!             // render item
//!         }
//!     }
//! }
//! ```

mod build;
mod changelog;
mod emergency;
mod enrich;
mod fetcher;
mod listing;
mod render;

pub use build::{ArtifactNames, BuildId, BuildIdError, BuildItem, STANDALONE_SUFFIX};
pub use changelog::extract_excerpt;
pub use emergency::{compare_build_ids, scan_latest};
pub use enrich::Enricher;
pub use fetcher::{FetchError, Fetcher};
pub use listing::{AnchorListingParser, ListingParser};
pub use render::{
    emergency_fragment, html_fragment, rss10_document, rss20_document, rss_description,
    ChannelInfo, RenderError, RenderLinks,
};
