// src/ingest/providers/rss.rs
//! Syndication parsing shared by the feed adapters: RSS 2.0, RSS 1.0 (RDF)
//! and Atom all land in the same `RawItem`.
//!
//! quick-xml matches elements by local name, so `dc:date` is `date`,
//! `media:content` and `content:encoded` are both `content`. Fields that can
//! collide with a namespaced sibling (`media:title`, `atom:link`, ...) are
//! lists and the first non-empty value wins.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use crate::ingest::types::RawItem;

/// RSS 2.0 nests items in `<channel>`, RSS 1.0 puts them beside it,
/// Atom uses `<entry>`.
#[derive(Debug, Deserialize)]
struct Document {
    channel: Option<Channel>,
    #[serde(rename = "item", default)]
    items: Vec<Item>,
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    title: Vec<TextNode>,
    #[serde(default)]
    link: Vec<TextNode>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    /// `dc:date`
    date: Option<String>,
    #[serde(default)]
    description: Vec<TextNode>,
    source: Option<TextNode>,
    #[serde(rename = "category", default)]
    categories: Vec<TextNode>,
    #[serde(rename = "enclosure", default)]
    enclosures: Vec<ContentNode>,
    #[serde(default)]
    content: Vec<ContentNode>,
    #[serde(default)]
    thumbnail: Vec<ContentNode>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    title: Vec<TextNode>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    #[serde(default)]
    summary: Vec<TextNode>,
    #[serde(default)]
    content: Vec<ContentNode>,
    published: Option<String>,
    updated: Option<String>,
    #[serde(rename = "category", default)]
    categories: Vec<AtomCategory>,
    source: Option<AtomSource>,
    #[serde(default)]
    thumbnail: Vec<ContentNode>,
}

#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: String,
}

/// `<enclosure>`, `<media:content>`, `<media:thumbnail>`, `<content:encoded>`
/// and Atom `<content>`: an attribute-addressed resource or inline text.
#[derive(Debug, Deserialize)]
struct ContentNode {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "@medium")]
    medium: Option<String>,
    #[serde(rename = "@type")]
    kind: Option<String>,
    #[serde(rename = "$text", default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
    #[serde(rename = "@type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term")]
    term: Option<String>,
    #[serde(rename = "@label")]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomSource {
    #[serde(default)]
    title: Vec<TextNode>,
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn first_text(nodes: Vec<TextNode>) -> Option<String> {
    nodes
        .into_iter()
        .map(|n| n.value)
        .find(|v| !v.trim().is_empty())
}

fn parse_rfc3339(s: Option<&str>) -> Option<DateTime<Utc>> {
    s.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl ContentNode {
    fn is_image(&self) -> bool {
        match (self.medium.as_deref(), self.kind.as_deref()) {
            (Some(m), _) => m == "image",
            (None, Some(k)) => k.starts_with("image/"),
            (None, None) => true,
        }
    }

    fn image(&self) -> Option<String> {
        non_empty(self.url.as_deref()).filter(|_| self.is_image())
    }

    /// Inline body (`content:encoded`, Atom `<content>`), not a linked resource.
    fn body(&self) -> Option<String> {
        if self.url.is_some() {
            return None;
        }
        non_empty(Some(&self.text))
    }
}

impl Item {
    fn image_url(&self) -> Option<String> {
        let enclosure = self
            .enclosures
            .iter()
            .filter(|e| e.kind.as_deref().is_some_and(|k| k.starts_with("image/")));
        self.content
            .iter()
            .chain(&self.thumbnail)
            .chain(enclosure)
            .find_map(ContentNode::image)
    }

    fn into_raw(self) -> RawItem {
        let image_url = self.image_url();
        let published_at = parse_rfc3339(self.date.as_deref());
        let body = self.content.iter().find_map(ContentNode::body);
        RawItem {
            title: first_text(self.title),
            summary: first_text(self.description).or(body),
            link: first_text(self.link),
            source: self.source.map(|s| s.value),
            published_at,
            published: self.pub_date.or(self.date),
            category: first_text(self.categories),
            image_url,
        }
    }
}

impl Entry {
    fn link(&self) -> Option<String> {
        self.links
            .iter()
            .filter(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
            .find_map(|l| non_empty(l.href.as_deref()))
    }

    fn image_url(&self) -> Option<String> {
        let enclosure = self
            .links
            .iter()
            .filter(|l| l.rel.as_deref() == Some("enclosure"))
            .filter(|l| l.kind.as_deref().is_some_and(|k| k.starts_with("image/")))
            .find_map(|l| non_empty(l.href.as_deref()));
        self.content
            .iter()
            .chain(&self.thumbnail)
            .find_map(ContentNode::image)
            .or(enclosure)
    }

    fn into_raw(self) -> RawItem {
        let link = self.link();
        let image_url = self.image_url();
        let body = self.content.iter().find_map(ContentNode::body);
        let published = self.published.or(self.updated);
        RawItem {
            title: first_text(self.title),
            summary: first_text(self.summary).or(body),
            link,
            source: self.source.and_then(|s| first_text(s.title)),
            published_at: parse_rfc3339(published.as_deref()),
            published,
            category: self
                .categories
                .into_iter()
                .find_map(|c| non_empty(c.label.as_deref()).or_else(|| non_empty(c.term.as_deref()))),
            image_url,
        }
    }
}

/// Local name of the document element.
fn root_element(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().context("reading xml")? {
            Event::Start(e) | Event::Empty(e) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::Eof => bail!("empty xml document"),
            _ => {}
        }
    }
}

/// Parse an RSS or Atom document into raw items. Adapters fill in category
/// and source fallbacks afterwards.
pub fn parse_feed(xml: &str) -> Result<Vec<RawItem>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);

    let root = root_element(&xml_clean)?;
    if !matches!(root.as_str(), "rss" | "RDF" | "feed") {
        bail!("not a feed document: <{root}>");
    }
    let doc: Document = from_str(&xml_clean).context("parsing feed xml")?;

    let mut out: Vec<RawItem> = doc
        .channel
        .map(|c| c.items)
        .unwrap_or_default()
        .into_iter()
        .chain(doc.items)
        .map(Item::into_raw)
        .collect();
    out.extend(doc.entries.into_iter().map(Entry::into_raw));

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    counter!("ingest_events_total").increment(out.len() as u64);
    Ok(out)
}

/// Feeds routinely ship HTML entities that are not valid XML.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn empty_channel_yields_nothing() {
        let xml = r#"<rss version="2.0"><channel><title>x</title></channel></rss>"#;
        assert!(parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn reads_source_category_and_image() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <item>
      <title>Gold hits record&nbsp;high</title>
      <link>https://example.test/gold</link>
      <pubDate>Mon, 01 Jan 2024 10:00:00 GMT</pubDate>
      <description>&lt;b&gt;Bullion&lt;/b&gt; rallies</description>
      <source url="https://mint.example">Mint</source>
      <category>Commodities</category>
      <media:content url="https://img.example/g.jpg" medium="image"/>
    </item>
  </channel>
</rss>"#;
        let items = parse_feed(xml).unwrap();
        assert_eq!(items.len(), 1);
        let it = &items[0];
        assert_eq!(it.title.as_deref(), Some("Gold hits record high"));
        assert_eq!(it.source.as_deref(), Some("Mint"));
        assert_eq!(it.category.as_deref(), Some("Commodities"));
        assert_eq!(it.image_url.as_deref(), Some("https://img.example/g.jpg"));
        assert_eq!(it.summary.as_deref(), Some("<b>Bullion</b> rallies"));
        assert!(it.published_at.is_none());
    }

    #[test]
    fn dc_date_becomes_structured_timestamp() {
        let xml = r#"<rss xmlns:dc="http://purl.org/dc/elements/1.1/"><channel><item>
  <title>Rupee firms</title>
  <dc:date>2024-03-04T05:06:07+05:30</dc:date>
</item></channel></rss>"#;
        let items = parse_feed(xml).unwrap();
        assert_eq!(
            items[0].published_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 3, 23, 36, 7).unwrap())
        );
    }

    #[test]
    fn split_category_lists_are_accepted() {
        let xml = r#"<rss><channel><item>
  <title>Split</title>
  <category></category>
  <link>https://example.test/split</link>
  <category>Banking</category>
</item></channel></rss>"#;
        let items = parse_feed(xml).unwrap();
        assert_eq!(items[0].category.as_deref(), Some("Banking"));
        assert_eq!(items[0].link.as_deref(), Some("https://example.test/split"));
    }

    #[test]
    fn thumbnail_used_when_media_content_is_video() {
        let xml = r#"<rss xmlns:media="http://search.yahoo.com/mrss/"><channel><item>
  <title>Clip</title>
  <media:content url="https://v.example/clip.mp4" medium="video"/>
  <media:thumbnail url="https://img.example/clip.jpg"/>
</item></channel></rss>"#;
        let items = parse_feed(xml).unwrap();
        assert_eq!(
            items[0].image_url.as_deref(),
            Some("https://img.example/clip.jpg")
        );
    }

    #[test]
    fn rdf_items_sit_beside_the_channel() {
        let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel><title>Desk</title><items><rdf:Seq><rdf:li resource="https://example.test/1"/></rdf:Seq></items></channel>
  <item><title>First</title><link>https://example.test/1</link><dc:date>2024-01-01T00:00:00Z</dc:date></item>
</rdf:RDF>"#;
        let items = parse_feed(xml).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title.as_deref(), Some("First"));
        assert!(items[0].published_at.is_some());
    }

    #[test]
    fn atom_entries_are_read() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Desk</title>
  <link rel="self" href="https://example.test/feed"/>
  <entry>
    <title type="html">Bond yields &amp;amp; the RBI</title>
    <link rel="alternate" href="https://example.test/bonds"/>
    <updated>2024-02-01T08:00:00Z</updated>
    <content type="html">&lt;p&gt;Yields eased.&lt;/p&gt;</content>
    <category term="bonds" label="Bonds"/>
    <source><title>Desk Wire</title></source>
  </entry>
</feed>"#;
        let items = parse_feed(xml).unwrap();
        assert_eq!(items.len(), 1);
        let it = &items[0];
        assert_eq!(it.link.as_deref(), Some("https://example.test/bonds"));
        assert_eq!(it.summary.as_deref(), Some("<p>Yields eased.</p>"));
        assert_eq!(it.category.as_deref(), Some("Bonds"));
        assert_eq!(it.source.as_deref(), Some("Desk Wire"));
        assert_eq!(
            it.published_at,
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_feed("<rss><channel><item>").is_err());
    }

    #[test]
    fn non_feed_document_is_an_error() {
        assert!(parse_feed("<html>503</html>").is_err());
        assert!(parse_feed("").is_err());
    }
}
