//! Rendering of build items into RSS and embeddable HTML.
//!
//! Every function here is pure: the output depends only on the items and
//! links passed in, so identical inputs produce identical bytes. Dates are
//! formatted in UTC with fixed, locale-independent formats.

use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use thiserror::Error;

use super::build::{ArtifactNames, BuildId, BuildItem};
use crate::util::join_url;

const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const RSS10_NS: &str = "http://purl.org/rss/1.0/";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";

/// Failures while serializing an XML document.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to write {part}: {source}")]
    Write {
        part: String,
        source: std::io::Error,
    },

    #[error("Generated feed contains invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

fn write_err(part: &str) -> impl FnOnce(std::io::Error) -> RenderError + '_ {
    move |source| RenderError::Write {
        part: part.to_string(),
        source,
    }
}

/// Where rendered links point.
#[derive(Debug, Clone)]
pub struct RenderLinks {
    /// Download base; artifact filenames are appended to it.
    pub base_url: String,
    /// Repository browse base; the build id is appended to it.
    pub browse_url: String,
    pub contact: String,
}

impl RenderLinks {
    pub fn artifact(&self, filename: &str) -> String {
        join_url(&self.base_url, filename)
    }

    pub fn browse(&self, id: &BuildId) -> String {
        join_url(&self.browse_url, id.as_str())
    }
}

/// Channel-level metadata for the RSS documents.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub title: String,
    pub link: String,
    pub description: String,
}

fn item_title(item: &BuildItem) -> String {
    format!("Build {}", item.build_id)
}

/// Changelog text as HTML: escaped, one `<br/>` per line break.
fn excerpt_html(excerpt: &str) -> String {
    excerpt
        .lines()
        .map(|line| escape(line).into_owned())
        .collect::<Vec<_>>()
        .join("<br/>\n")
}

fn link(href: &str, text: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape(href), escape(text))
}

/// Body of one RSS item: the four links, the changelog excerpt and the
/// contact line.
pub fn rss_description(item: &BuildItem, links: &RenderLinks) -> String {
    let rows = [
        ("Standalone", item.artifacts.standalone.as_str(), links.artifact(&item.artifacts.standalone)),
        ("Sources", item.artifacts.source.as_str(), links.artifact(&item.artifacts.source)),
        ("Eclipse update site", item.artifacts.eclipse.as_str(), links.artifact(&item.artifacts.eclipse)),
        ("Repository", item.build_id.as_str(), links.browse(&item.build_id)),
    ];

    let mut out = String::from("<table>\n");
    for (label, text, href) in rows {
        out.push_str(&format!(
            "<tr><td>{label}:</td><td>{}</td></tr>\n",
            link(&href, text)
        ));
    }
    out.push_str("</table>\n");
    out.push_str(&format!(
        "<p>Published {}</p>\n",
        item.published_at.format("%Y-%m-%d %H:%M UTC")
    ));
    if !item.changelog_excerpt.is_empty() {
        out.push_str(&format!("<p>{}</p>\n", excerpt_html(&item.changelog_excerpt)));
    }
    out.push_str(&format!("<p>{}</p>", escape(links.contact.as_str())));
    out
}

/// Compact alternating-row table for embedding in a hosting page.
pub fn html_fragment(items: &[BuildItem], links: &RenderLinks) -> String {
    let mut out = String::from("<table class=\"builds\">\n");
    for (index, item) in items.iter().enumerate() {
        let class = if index % 2 == 0 { "row-even" } else { "row-odd" };
        out.push_str(&format!(
            "<tr class=\"{class}\"><td class=\"date\">{}</td><td class=\"build\">{}</td><td class=\"links\">{} | {} | {}</td></tr>\n",
            item.published_at.format("%Y-%m-%d"),
            escape(item.build_id.as_str()),
            link(&links.artifact(&item.artifacts.standalone), "standalone"),
            link(&links.artifact(&item.artifacts.source), "sources"),
            link(&links.artifact(&item.artifacts.eclipse), "eclipse"),
        ));
        if !item.changelog_excerpt.is_empty() {
            out.push_str(&format!(
                "<tr class=\"{class}\"><td colspan=\"3\" class=\"changes\">{}</td></tr>\n",
                excerpt_html(&item.changelog_excerpt)
            ));
        }
    }
    out.push_str("</table>\n");
    out
}

/// Degraded fragment used when the build server cannot be reached: names
/// the newest locally available build and links its archives.
pub fn emergency_fragment(latest: Option<&BuildId>, links: &RenderLinks, prefix: &str) -> String {
    let Some(id) = latest else {
        return "<table class=\"builds\">\n<tr class=\"row-even\"><td>No builds available.</td></tr>\n</table>\n".to_string();
    };

    let names = ArtifactNames::new(prefix, id);
    format!(
        "<table class=\"builds\">\n<tr class=\"row-even\"><td class=\"build\">Latest build: {}</td><td class=\"links\">{} | {} | {}</td></tr>\n</table>\n",
        escape(id.as_str()),
        link(&links.artifact(&names.standalone), "standalone"),
        link(&links.artifact(&names.source), "sources"),
        link(&links.artifact(&names.eclipse), "eclipse"),
    )
}

fn text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), RenderError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(write_err(name))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(write_err(name))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(write_err(name))?;
    Ok(())
}

fn finish(writer: Writer<Cursor<Vec<u8>>>) -> Result<String, RenderError> {
    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

/// Complete RSS 2.0 document; items are written in the order given.
///
/// `lastBuildDate` is the newest item's publication time rather than the
/// wall clock, which keeps the document reproducible.
pub fn rss20_document(
    channel: &ChannelInfo,
    items: &[BuildItem],
    links: &RenderLinks,
) -> Result<String, RenderError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_err("XML declaration"))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer
        .write_event(Event::Start(rss))
        .map_err(write_err("rss element"))?;
    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .map_err(write_err("channel element"))?;

    text_element(&mut writer, "title", &channel.title)?;
    text_element(&mut writer, "link", &channel.link)?;
    text_element(&mut writer, "description", &channel.description)?;
    if let Some(newest) = items.iter().map(|i| i.published_at).max() {
        text_element(&mut writer, "lastBuildDate", &newest.to_rfc2822())?;
    }

    for item in items {
        writer
            .write_event(Event::Start(BytesStart::new("item")))
            .map_err(write_err("item element"))?;
        text_element(&mut writer, "title", &item_title(item))?;
        text_element(&mut writer, "link", &links.artifact(&item.artifacts.standalone))?;
        text_element(&mut writer, "description", &rss_description(item, links))?;
        text_element(&mut writer, "pubDate", &item.published_at.to_rfc2822())?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "false"));
        writer
            .write_event(Event::Start(guid))
            .map_err(write_err("guid element"))?;
        writer
            .write_event(Event::Text(BytesText::new(item.build_id.as_str())))
            .map_err(write_err("guid text"))?;
        writer
            .write_event(Event::End(BytesEnd::new("guid")))
            .map_err(write_err("guid end"))?;

        writer
            .write_event(Event::End(BytesEnd::new("item")))
            .map_err(write_err("item end"))?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .map_err(write_err("channel end"))?;
    writer
        .write_event(Event::End(BytesEnd::new("rss")))
        .map_err(write_err("rss end"))?;

    finish(writer)
}

/// Complete RSS 1.0 (RDF) document; items are written in the order given.
pub fn rss10_document(
    channel: &ChannelInfo,
    items: &[BuildItem],
    links: &RenderLinks,
) -> Result<String, RenderError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_err("XML declaration"))?;

    let mut rdf = BytesStart::new("rdf:RDF");
    rdf.push_attribute(("xmlns:rdf", RDF_NS));
    rdf.push_attribute(("xmlns", RSS10_NS));
    rdf.push_attribute(("xmlns:dc", DC_NS));
    writer
        .write_event(Event::Start(rdf))
        .map_err(write_err("rdf:RDF element"))?;

    let mut channel_start = BytesStart::new("channel");
    channel_start.push_attribute(("rdf:about", channel.link.as_str()));
    writer
        .write_event(Event::Start(channel_start))
        .map_err(write_err("channel element"))?;
    text_element(&mut writer, "title", &channel.title)?;
    text_element(&mut writer, "link", &channel.link)?;
    text_element(&mut writer, "description", &channel.description)?;

    // <items><rdf:Seq> table of contents
    writer
        .write_event(Event::Start(BytesStart::new("items")))
        .map_err(write_err("items element"))?;
    writer
        .write_event(Event::Start(BytesStart::new("rdf:Seq")))
        .map_err(write_err("rdf:Seq element"))?;
    for item in items {
        let mut li = BytesStart::new("rdf:li");
        li.push_attribute(("rdf:resource", links.artifact(&item.artifacts.standalone).as_str()));
        writer
            .write_event(Event::Empty(li))
            .map_err(write_err("rdf:li element"))?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("rdf:Seq")))
        .map_err(write_err("rdf:Seq end"))?;
    writer
        .write_event(Event::End(BytesEnd::new("items")))
        .map_err(write_err("items end"))?;
    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .map_err(write_err("channel end"))?;

    for item in items {
        let href = links.artifact(&item.artifacts.standalone);
        let mut start = BytesStart::new("item");
        start.push_attribute(("rdf:about", href.as_str()));
        writer
            .write_event(Event::Start(start))
            .map_err(write_err("item element"))?;
        text_element(&mut writer, "title", &item_title(item))?;
        text_element(&mut writer, "link", &href)?;
        text_element(&mut writer, "description", &rss_description(item, links))?;
        text_element(&mut writer, "dc:date", &item.published_at.to_rfc3339())?;
        writer
            .write_event(Event::End(BytesEnd::new("item")))
            .map_err(write_err("item end"))?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("rdf:RDF")))
        .map_err(write_err("rdf:RDF end"))?;

    finish(writer)
}
