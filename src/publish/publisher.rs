use std::path::PathBuf;
use thiserror::Error;

use super::cache::{CacheError, FeedCache};
use super::variant::FeedVariant;
use crate::config::Config;
use crate::feed::{
    emergency_fragment, html_fragment, rss10_document, rss20_document, scan_latest,
    AnchorListingParser, BuildId, BuildItem, ChannelInfo, Enricher, FetchError, Fetcher,
    ListingParser, RenderError, RenderLinks,
};

#[derive(Debug, Error)]
pub enum PublishError {
    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// XML serialization failed
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Rendered output could not be stored; nothing is returned in that case
    #[error(transparent)]
    CacheWrite(#[from] CacheError),
}

/// Outcome of assembling items for a variant.
enum Assembled {
    Items(Vec<BuildItem>),
    /// The listing could not be fetched
    Unavailable(FetchError),
}

/// Runs the fetch → parse → enrich → render → cache pipeline.
pub struct Publisher {
    fetcher: Fetcher,
    enricher: Enricher,
    parser: Box<dyn ListingParser>,
    cache: FeedCache,
    listing_url: String,
    artifact_dir: PathBuf,
    artifact_prefix: String,
    browse_url: String,
    contact: String,
    channel: ChannelInfo,
    limits: [usize; 3],
}

impl Publisher {
    /// Builds a publisher from a validated [`Config`].
    pub fn from_config(config: &Config) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("buildfeed/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let fetcher = Fetcher::new(client, config.probe_timeout(), config.fetch_timeout());
        let enricher = Enricher::new(
            fetcher.clone(),
            config.listing_url.clone(),
            config.artifact_dir.clone(),
            config.artifact_prefix.clone(),
        );

        Ok(Self {
            fetcher,
            enricher,
            parser: Box::new(AnchorListingParser),
            cache: FeedCache::new(config.cache_dir.clone(), config.cache_ttl()),
            listing_url: config.listing_url.clone(),
            artifact_dir: config.artifact_dir.clone(),
            artifact_prefix: config.artifact_prefix.clone(),
            browse_url: config.browse_url.clone(),
            contact: config.contact.clone(),
            channel: ChannelInfo {
                title: config.channel_title.clone(),
                link: config.channel_link.clone(),
                description: config.channel_description.clone(),
            },
            limits: [config.rss10_items, config.rss20_items, config.html_items],
        })
    }

    /// Swaps the listing parser, e.g. for a structured index API.
    pub fn with_parser(mut self, parser: impl ListingParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    pub fn item_limit(&self, variant: FeedVariant) -> usize {
        self.limits[variant.index()]
    }

    /// Returns the bytes to serve for `variant`.
    ///
    /// A cached entry is returned verbatim without touching the network.
    /// Otherwise the feed is rebuilt with artifact links under `base_url`,
    /// stored, and returned. When the listing cannot be fetched a degraded
    /// rendering is returned instead and the cache is left alone.
    pub async fn publish(&self, variant: FeedVariant, base_url: &str) -> Result<Vec<u8>, PublishError> {
        let _guard = self.cache.lock(variant).await;

        if let Some(bytes) = self.cache.get(variant).await {
            tracing::debug!(variant = %variant, bytes = bytes.len(), "Serving cached feed");
            return Ok(bytes);
        }

        let links = RenderLinks {
            base_url: base_url.to_string(),
            browse_url: self.browse_url.clone(),
            contact: self.contact.clone(),
        };

        let items = match self.assemble(variant).await {
            Assembled::Items(items) => items,
            Assembled::Unavailable(e) => {
                tracing::warn!(
                    variant = %variant,
                    listing = %self.listing_url,
                    error = %e,
                    "Build listing unavailable, serving degraded feed"
                );
                return self.render_degraded(variant, &links).await;
            }
        };

        let rendered = self.render(variant, &items, &links)?.into_bytes();
        self.cache.put(variant, &rendered).await?;

        tracing::info!(variant = %variant, items = items.len(), "Feed rebuilt");
        Ok(rendered)
    }

    /// The newest `K` announceable builds, ordered for `variant`.
    ///
    /// The listing is assumed to be in ascending build order, so it is walked
    /// from the end and enrichment stops once `K` items are found.
    async fn assemble(&self, variant: FeedVariant) -> Assembled {
        let html = match self.fetcher.fetch_text(&self.listing_url).await {
            Ok(html) => html,
            Err(e) => return Assembled::Unavailable(e),
        };

        let ids: Vec<BuildId> = self
            .parser
            .parse(&html)
            .into_iter()
            .filter_map(|raw| match BuildId::parse(&raw) {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!(entry = %raw, error = %e, "Ignoring listing entry");
                    None
                }
            })
            .collect();
        tracing::debug!(builds = ids.len(), "Parsed build listing");

        let limit = self.item_limit(variant);
        let mut items = Vec::with_capacity(limit);
        for id in ids.iter().rev() {
            if items.len() == limit {
                break;
            }
            if let Some(item) = self.enricher.enrich(id).await {
                items.push(item);
            }
        }

        if !variant.newest_first() {
            items.reverse();
        }
        Assembled::Items(items)
    }

    fn render(&self, variant: FeedVariant, items: &[BuildItem], links: &RenderLinks) -> Result<String, PublishError> {
        Ok(match variant {
            FeedVariant::Rss10 => rss10_document(&self.channel, items, links)?,
            FeedVariant::Rss20 => rss20_document(&self.channel, items, links)?,
            FeedVariant::Html => html_fragment(items, links),
        })
    }

    async fn render_degraded(&self, variant: FeedVariant, links: &RenderLinks) -> Result<Vec<u8>, PublishError> {
        let rendered = match variant {
            FeedVariant::Html => {
                let latest = scan_latest(&self.artifact_dir, &self.artifact_prefix).await;
                emergency_fragment(latest.as_ref(), links, &self.artifact_prefix)
            }
            FeedVariant::Rss10 | FeedVariant::Rss20 => self.render(variant, &[], links)?,
        };
        Ok(rendered.into_bytes())
    }
}
