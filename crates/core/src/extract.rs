//! Item page extraction.
//!
//! Given one item URL, [`extract_item`] fetches and parses the page and
//! produces item-level metadata plus the ordered list of qualifying image
//! candidates. Metadata resolution runs in priority order: the first usable
//! JSON-LD block, then heading text for the title, then an author byline
//! link. Images are enumerated inside the main content region (located by
//! the site profile's selector chain, falling back to the whole-page body)
//! and pass through URL-marker, declared-dimension, and optional byte-size
//! filters before deduplication.
//!
//! A page that cannot be fetched is a no-data result (`Ok(None)`), and a
//! page with zero qualifying images is a valid result; neither is an error.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::Result;
use crate::caption::parse_caption;
use crate::fetch::PageFetcher;
use crate::item::{ContentItem, ExtractedItem, ImageCandidate, UNKNOWN};
use crate::parse::{Document, Element};
use crate::sites::{ImageMode, SiteProfile};

/// First 4-digit run in a `datePublished` value.
static DATE_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").unwrap());

/// URL substrings marking navigation chrome and thumbnails, never artwork.
const URL_REJECT_MARKERS: &[&str] = &["icon", "logo", "thumbnail", "-150x150", "-300x"];

/// Image filtering thresholds.
///
/// The historical tooling shifted these between runs; this is the one
/// configurable set the pipeline commits to.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Reject images whose declared width or height is below this.
    pub min_dimension: u32,
    /// Reject images whose probed byte size is below this.
    pub min_image_bytes: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { min_dimension: 50, min_image_bytes: 5000 }
    }
}

/// Extracts metadata and image candidates from one item page.
///
/// Returns `Ok(None)` when the page cannot be fetched; the caller treats
/// that as a skip, not a failure of the batch.
pub async fn extract_item(
    fetcher: &PageFetcher, profile: &dyn SiteProfile, url: &Url, config: &ExtractConfig,
) -> Result<Option<ExtractedItem>> {
    let html = match fetcher.get_text(url).await {
        Ok(html) => html,
        Err(e) => {
            warn!(url = %url, error = %e, "item page fetch failed");
            return Ok(None);
        }
    };

    // The parsed document is scoped so it is dropped before the size
    // probe awaits; the parse tree is not Send and must not be held
    // across a suspension point.
    let (item, mut images, excerpt) = {
        let doc = Document::parse(&html);
        let item = extract_metadata(&doc, url)?;

        let (images, excerpt) = match find_region(&doc, profile)? {
            Some(region) => {
                let images = collect_images(&region, url, profile.image_mode(), config)?;
                (images, region.text().trim().to_string())
            }
            None => (Vec::new(), doc.text_content().trim().to_string()),
        };

        (item, images, excerpt)
    };

    if profile.probe_image_size() {
        images = probe_images(fetcher, images, config).await;
    }

    debug!(url = %url, images = images.len(), title = %item.title, "item extracted");

    Ok(Some(ExtractedItem { item, images, excerpt }))
}

/// Resolves item-level metadata in priority order.
fn extract_metadata(doc: &Document, url: &Url) -> Result<ContentItem> {
    let mut item = ContentItem::new(url.clone());

    apply_json_ld(doc, &mut item)?;

    // Heading fallback for the title.
    if item.title == UNKNOWN {
        for selector in ["h1", "h2"] {
            if let Some(heading) = doc.select_first(selector)? {
                let text = heading.text();
                let text = text.trim();
                if !text.is_empty() {
                    item.title = text.to_string();
                    break;
                }
            }
        }
    }

    // Byline fallback for the author: the first link whose target mentions
    // an author page.
    if item.author == UNKNOWN
        && let Some(link) = doc.select_first(r#"a[href*="author"]"#)?
    {
        let text = link.text();
        let text = text.trim();
        if !text.is_empty() {
            item.author = text.to_string();
        }
    }

    Ok(item)
}

/// Applies the first JSON-LD block that supplies usable fields.
///
/// Conflicting blocks are never merged; whatever the winning block leaves
/// unset stays at the sentinel for later fallbacks.
fn apply_json_ld(doc: &Document, item: &mut ContentItem) -> Result<()> {
    for script in doc.select(r#"script[type="application/ld+json"]"#)? {
        let text = script.text();
        let Ok(value) = serde_json::from_str::<serde_json::Value>(text.trim()) else {
            continue;
        };
        let Some(obj) = value.as_object() else {
            continue;
        };

        let usable = ["headline", "name", "author", "datePublished", "keywords"]
            .iter()
            .any(|k| obj.contains_key(*k));
        if !usable {
            continue;
        }

        if let Some(name) = obj.get("author").and_then(author_name) {
            item.author = name;
        }

        if let Some(headline) = obj.get("headline").and_then(|v| v.as_str()) {
            item.title = headline.to_string();
        } else if let Some(name) = obj.get("name").and_then(|v| v.as_str()) {
            item.title = name.to_string();
        }

        if let Some(date) = obj.get("datePublished").and_then(|v| v.as_str())
            && let Some(year) = DATE_YEAR_RE.find(date)
        {
            item.year = year.as_str().to_string();
        }

        if let Some(joined) = obj.get("keywords").and_then(keywords_text) {
            item.keywords = joined.clone();
            // Art blogs rarely declare a medium; tags are the closest
            // item-level stand-in, and per-image captions refine it.
            if item.medium == UNKNOWN {
                item.medium = joined;
            }
        }

        return Ok(());
    }

    Ok(())
}

/// Author name from a JSON-LD author field: string, object, or array.
fn author_name(author: &serde_json::Value) -> Option<String> {
    if let Some(name) = author.as_str() {
        return Some(name.to_string());
    }

    if let Some(obj) = author.as_object()
        && let Some(name) = obj.get("name")
        && let Some(name_str) = name.as_str()
    {
        return Some(name_str.to_string());
    }

    if let Some(arr) = author.as_array()
        && let Some(first) = arr.first()
    {
        return author_name(first);
    }

    None
}

/// Keywords as comma-joined text from a string or an array of strings.
fn keywords_text(keywords: &serde_json::Value) -> Option<String> {
    if let Some(s) = keywords.as_str() {
        let s = s.trim();
        return if s.is_empty() { None } else { Some(s.to_string()) };
    }

    if let Some(arr) = keywords.as_array() {
        let joined: Vec<&str> = arr.iter().filter_map(|v| v.as_str()).collect();
        if !joined.is_empty() {
            return Some(joined.join(", "));
        }
    }

    None
}

/// Locates the main content region via the profile's selector chain.
///
/// Returns `None` only when neither the profile selectors nor `body` match
/// anything, which leaves the page without an image source.
fn find_region<'a>(doc: &'a Document, profile: &dyn SiteProfile) -> Result<Option<Element<'a>>> {
    for selector in profile.content_selectors() {
        if let Some(region) = doc.select_first(selector)? {
            return Ok(Some(region));
        }
    }

    doc.select_first("body")
}

/// Enumerates and filters image candidates inside the content region.
fn collect_images(
    region: &Element<'_>, base: &Url, mode: ImageMode, config: &ExtractConfig,
) -> Result<Vec<ImageCandidate>> {
    let mut candidates = Vec::new();

    match mode {
        ImageMode::AllImages => {
            for img in region.select("img")? {
                if let Some(url) = qualify_image(&img, base, config) {
                    candidates.push(ImageCandidate::bare(url));
                }
            }
        }
        ImageMode::CaptionedFigures => {
            for figure in region.select("figure")? {
                let Some(caption_el) = figure.select_first("figcaption")? else {
                    continue;
                };
                let caption = caption_el.text();
                let caption = caption.trim();
                if caption.is_empty() {
                    continue;
                }

                let Some(img) = figure.select_first("img")? else {
                    continue;
                };
                if let Some(url) = qualify_image(&img, base, config) {
                    candidates.push(ImageCandidate {
                        url,
                        caption: caption.to_string(),
                        artwork: parse_caption(caption),
                    });
                }
            }
        }
    }

    Ok(dedupe(candidates))
}

/// Resolves an `<img>` to an absolute URL and applies the synchronous
/// filters. Returns `None` when the image does not qualify.
fn qualify_image(img: &Element<'_>, base: &Url, config: &ExtractConfig) -> Option<Url> {
    let src = img.attr("src").or_else(|| img.attr("data-src"))?;
    let url = base.join(src).ok()?;

    let lowered = url.as_str().to_lowercase();
    if URL_REJECT_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return None;
    }

    if rejects_by_dimensions(img, config.min_dimension) {
        return None;
    }

    Some(url)
}

/// True when both dimension attributes are declared and either falls below
/// the minimum. Unparsable or missing attributes never reject.
fn rejects_by_dimensions(img: &Element<'_>, min_dimension: u32) -> bool {
    let (Some(width), Some(height)) = (img.attr("width"), img.attr("height")) else {
        return false;
    };

    match (width.parse::<u32>(), height.parse::<u32>()) {
        (Ok(w), Ok(h)) => w < min_dimension || h < min_dimension,
        _ => false,
    }
}

/// Collapses duplicates by resolved URL, keeping the first occurrence.
fn dedupe(candidates: Vec<ImageCandidate>) -> Vec<ImageCandidate> {
    let mut seen: HashSet<Url> = HashSet::new();
    candidates.into_iter().filter(|c| seen.insert(c.url.clone())).collect()
}

/// Confirms a minimum byte size with an advisory HEAD probe per image.
///
/// A reported length below the threshold rejects; a failed probe accepts.
async fn probe_images(
    fetcher: &PageFetcher, candidates: Vec<ImageCandidate>, config: &ExtractConfig,
) -> Vec<ImageCandidate> {
    let mut kept = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match fetcher.head_content_length(&candidate.url).await {
            Some(length) if length < config.min_image_bytes => {
                debug!(url = %candidate.url, length, "image rejected by size probe");
            }
            _ => kept.push(candidate),
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::Site;

    fn base() -> Url {
        Url::parse("https://example.com/article/one/").unwrap()
    }

    const JSON_LD_HTML: &str = r#"
        <!DOCTYPE html>
        <html>
        <head>
            <script type="application/ld+json">{"@type": "WebSite"}</script>
            <script type="application/ld+json">
            {
                "@type": "Article",
                "headline": "A Painted World",
                "author": {"@type": "Person", "name": "Jane Smith"},
                "datePublished": "1998-04-02T10:30:00Z",
                "keywords": ["painting", "landscape"]
            }
            </script>
            <script type="application/ld+json">
            {"@type": "Article", "headline": "A Conflicting Block"}
            </script>
        </head>
        <body><h1>Heading Title</h1></body>
        </html>
    "#;

    #[test]
    fn test_json_ld_first_usable_block_wins() {
        let doc = Document::parse(JSON_LD_HTML);
        let item = extract_metadata(&doc, &base()).unwrap();

        assert_eq!(item.title, "A Painted World");
        assert_eq!(item.author, "Jane Smith");
        assert_eq!(item.year, "1998");
        assert_eq!(item.keywords, "painting, landscape");
        assert_eq!(item.medium, "painting, landscape");
    }

    #[test]
    fn test_title_falls_back_to_heading() {
        let html = "<html><body><h1>  Fallback Title  </h1></body></html>";
        let item = extract_metadata(&Document::parse(html), &base()).unwrap();

        assert_eq!(item.title, "Fallback Title");
        assert_eq!(item.author, UNKNOWN);
    }

    #[test]
    fn test_author_falls_back_to_byline_link() {
        let html = r#"<html><body>
            <h2>Title</h2>
            <a href="/about">About</a>
            <a href="/author/jane-doe/">Jane Doe</a>
        </body></html>"#;
        let item = extract_metadata(&Document::parse(html), &base()).unwrap();

        assert_eq!(item.author, "Jane Doe");
    }

    #[test]
    fn test_collect_all_images_with_filters() {
        let html = r#"<html><body><article>
            <img src="/img/one.jpg">
            <img src="/img/site-logo.png">
            <img src="/img/two-150x150.jpg">
            <img src="/img/three.jpg" width="120" height="40">
            <img src="/img/four.jpg" width="800" height="600">
            <img data-src="/img/lazy.jpg">
            <img src="/img/one.jpg">
        </article></body></html>"#;
        let doc = Document::parse(html);
        let region = doc.select_first("article").unwrap().unwrap();
        let images = collect_images(&region, &base(), ImageMode::AllImages, &ExtractConfig::default()).unwrap();

        let urls: Vec<&str> = images.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/img/one.jpg",
                "https://example.com/img/four.jpg",
                "https://example.com/img/lazy.jpg",
            ]
        );
    }

    #[test]
    fn test_dimension_rejection_requires_both_attributes() {
        let html = r#"<html><body><article>
            <img src="/img/tall.jpg" height="40">
            <img src="/img/odd.jpg" width="abc" height="40">
        </article></body></html>"#;
        let doc = Document::parse(html);
        let region = doc.select_first("article").unwrap().unwrap();
        let images = collect_images(&region, &base(), ImageMode::AllImages, &ExtractConfig::default()).unwrap();

        assert_eq!(images.len(), 2);
    }

    #[test]
    fn test_captioned_figures_mode() {
        let html = r#"<html><body><article>
            <figure>
                <img src="/img/plate1.jpg">
                <figcaption>Jane Doe, Untitled Study, 1987, oil on canvas</figcaption>
            </figure>
            <figure>
                <img src="/img/uncaptioned.jpg">
            </figure>
            <img src="/img/loose.jpg">
        </article></body></html>"#;
        let doc = Document::parse(html);
        let region = doc.select_first("article").unwrap().unwrap();
        let images = collect_images(&region, &base(), ImageMode::CaptionedFigures, &ExtractConfig::default()).unwrap();

        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url.as_str(), "https://example.com/img/plate1.jpg");
        assert_eq!(images[0].artwork.artist.as_deref(), Some("Jane Doe"));
        assert_eq!(images[0].artwork.year.as_deref(), Some("1987"));
    }

    #[test]
    fn test_find_region_chain() {
        let profile = Site::SocksStudio.profile();

        let html = "<html><body><div class=\"entry-content\"><p>x</p></div></body></html>";
        let doc = Document::parse(html);
        assert!(find_region(&doc, profile).unwrap().is_some());

        // Whole-page body is the final fallback.
        let html = "<html><body><p>just text</p></body></html>";
        let doc = Document::parse(html);
        let region = find_region(&doc, profile).unwrap().unwrap();
        assert!(region.text().contains("just text"));
    }

    #[test]
    fn test_keywords_text_shapes() {
        assert_eq!(keywords_text(&serde_json::json!("a, b")).as_deref(), Some("a, b"));
        assert_eq!(keywords_text(&serde_json::json!(["a", "b"])).as_deref(), Some("a, b"));
        assert!(keywords_text(&serde_json::json!("")).is_none());
        assert!(keywords_text(&serde_json::json!(42)).is_none());
    }
}
