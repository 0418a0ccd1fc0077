use std::fmt;
use std::str::FromStr;

/// One output encoding of the build feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedVariant {
    Rss10,
    Rss20,
    Html,
}

impl FeedVariant {
    pub const ALL: [FeedVariant; 3] = [FeedVariant::Rss10, FeedVariant::Rss20, FeedVariant::Html];

    /// Name of the cache file under the cache directory.
    pub fn cache_file(self) -> &'static str {
        match self {
            FeedVariant::Rss10 => "rss10.xml",
            FeedVariant::Rss20 => "rss20.xml",
            FeedVariant::Html => "changelog.html",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            FeedVariant::Rss10 => "application/rdf+xml; charset=utf-8",
            FeedVariant::Rss20 => "application/rss+xml; charset=utf-8",
            FeedVariant::Html => "text/html; charset=utf-8",
        }
    }

    /// Whether items are listed newest first. RSS 1.0 keeps listing order.
    pub fn newest_first(self) -> bool {
        !matches!(self, FeedVariant::Rss10)
    }

    pub(crate) fn index(self) -> usize {
        match self {
            FeedVariant::Rss10 => 0,
            FeedVariant::Rss20 => 1,
            FeedVariant::Html => 2,
        }
    }
}

impl fmt::Display for FeedVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FeedVariant::Rss10 => "rss10",
            FeedVariant::Rss20 => "rss20",
            FeedVariant::Html => "html",
        })
    }
}

impl FromStr for FeedVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rss10" | "rss1" => Ok(FeedVariant::Rss10),
            "rss20" | "rss2" | "rss" => Ok(FeedVariant::Rss20),
            "html" | "changelog" => Ok(FeedVariant::Html),
            other => Err(format!("unknown feed variant '{other}' (expected rss10, rss20 or html)")),
        }
    }
}
