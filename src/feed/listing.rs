use regex::Regex;
use std::sync::OnceLock;

/// Turns a remote directory index into build ids.
///
/// Implementations return ids in the order they appear in the input and
/// perform no validation; callers run each entry through
/// [`BuildId::parse`](super::BuildId::parse).
pub trait ListingParser: Send + Sync {
    fn parse(&self, html: &str) -> Vec<String>;
}

/// Scrapes the anchors of an HTML directory index.
///
/// An entry is an `<a href="...">TEXT</a>` element whose link text contains
/// at least two literal dots, which is how version-named directories are told
/// apart from `Parent Directory`, sort links and plain files. A trailing `/`
/// on the text is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnchorListingParser;

fn anchor_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)<a\s+href\s*=\s*"[^"]*"\s*>([^<./]*\.[^<.]*\.[^<]*?)/?</a>"#)
            .expect("anchor pattern is valid")
    })
}

impl ListingParser for AnchorListingParser {
    fn parse(&self, html: &str) -> Vec<String> {
        anchor_pattern()
            .captures_iter(html)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const APACHE_INDEX: &str = r#"<html><head><title>Index of /svnkit/trunk</title></head>
<body><h1>Index of /svnkit/trunk</h1>
<ul><li><a href="/svnkit/"> Parent Directory</a></li>
<li><a href="1.1.0.2101/">1.1.0.2101/</a></li>
<li><a href="1.1.0.2188/">1.1.0.2188/</a></li>
<li><a href="readme.txt">readme.txt</a></li>
<li><a href="1.1.1.2203/">1.1.1.2203/</a></li>
</ul></body></html>"#;

    #[test]
    fn test_parses_versions_in_source_order() {
        let ids = AnchorListingParser.parse(APACHE_INDEX);
        assert_eq!(ids, vec!["1.1.0.2101", "1.1.0.2188", "1.1.1.2203"]);
    }

    #[test]
    fn test_source_order_not_sorted() {
        let html = r#"<a href="2.0.0/">2.0.0/</a><a href="1.0.0/">1.0.0/</a>"#;
        assert_eq!(AnchorListingParser.parse(html), vec!["2.0.0", "1.0.0"]);
    }

    #[test]
    fn test_single_dot_ignored() {
        let html = r#"<a href="notes.txt">notes.txt</a><a href="1.0/">1.0/</a>"#;
        assert!(AnchorListingParser.parse(html).is_empty());
    }

    #[test]
    fn test_non_matching_markup_yields_nothing() {
        let html = "<table><tr><td>1.2.3</td></tr></table><a name=\"x\">1.2.3</a>";
        assert!(AnchorListingParser.parse(html).is_empty());
    }

    #[test]
    fn test_adversarial_names_passed_through() {
        // Validation is the caller's job
        let html = r#"<a href="x">..evil..name</a>"#;
        assert_eq!(AnchorListingParser.parse(html), vec!["..evil..name"]);
    }

    proptest! {
        #[test]
        fn prop_n_anchors_yield_n_ids(
            versions in proptest::collection::vec((0u32..100, 0u32..100, 0u32..10_000), 0..20),
            filler in "[a-zA-Z ]{0,12}",
        ) {
            let mut html = String::from("<html><body>");
            let mut expected = Vec::new();
            for (major, minor, build) in &versions {
                let id = format!("{major}.{minor}.{build}");
                html.push_str(&format!("<p>{filler}</p><a href=\"{id}/\">{id}/</a>\n"));
                expected.push(id);
            }
            html.push_str("</body></html>");

            prop_assert_eq!(AnchorListingParser.parse(&html), expected);
        }
    }
}
