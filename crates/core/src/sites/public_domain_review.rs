//! Profile for publicdomainreview.org.
//!
//! Essay listings are paginated under `/essays/`; item links are recognized
//! by their path shape rather than their markup context. Essay bodies wrap
//! artwork in `<figure>` elements with attribution captions, so only
//! captioned figures qualify as slides.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::{ImageMode, SiteProfile};
use crate::parse::Document;

/// Essay permalink path, e.g. `/essay/the-art-of-memory/`.
static ESSAY_PATH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^/essay/[a-z0-9-]+/?$").unwrap());

pub struct PublicDomainReview;

impl SiteProfile for PublicDomainReview {
    fn display_name(&self) -> &'static str {
        "Public Domain Review"
    }

    fn base_url(&self) -> Url {
        Url::parse("https://publicdomainreview.org").expect("static base URL")
    }

    fn listing_url(&self, page: u32) -> Url {
        let base = self.base_url();
        let path = if page <= 1 { "/essays/".to_string() } else { format!("/essays/page/{}/", page) };
        base.join(&path).expect("static page path")
    }

    fn item_links(&self, doc: &Document) -> Vec<Url> {
        let base = self.base_url();
        let mut links = Vec::new();

        if let Ok(anchors) = doc.select("a[href]") {
            for anchor in anchors {
                if let Some(href) = anchor.attr("href")
                    && let Ok(url) = base.join(href)
                    && url.domain() == base.domain()
                    && ESSAY_PATH_RE.is_match(url.path())
                {
                    links.push(url);
                }
            }
        }

        links
    }

    fn content_selectors(&self) -> &'static [&'static str] {
        &["article.essay", "article"]
    }

    fn image_mode(&self) -> ImageMode {
        ImageMode::CaptionedFigures
    }

    fn probe_image_size(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_HTML: &str = r#"
        <html><body>
            <a href="/essay/the-art-of-memory/">The Art of Memory</a>
            <a href="/essay/painted-skies">Painted Skies</a>
            <a href="/collections/maps/">A collection, not an essay</a>
            <a href="/essays/page/2/">Next page</a>
            <a href="https://elsewhere.example.com/essay/not-ours/">Off-site</a>
        </body></html>
    "#;

    #[test]
    fn test_listing_url_pages() {
        let profile = PublicDomainReview;
        assert_eq!(profile.listing_url(1).as_str(), "https://publicdomainreview.org/essays/");
        assert_eq!(
            profile.listing_url(4).as_str(),
            "https://publicdomainreview.org/essays/page/4/"
        );
    }

    #[test]
    fn test_item_links_match_essay_paths_only() {
        let doc = Document::parse(LISTING_HTML);
        let links = PublicDomainReview.item_links(&doc);

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].as_str(), "https://publicdomainreview.org/essay/the-art-of-memory/");
        assert_eq!(links[1].as_str(), "https://publicdomainreview.org/essay/painted-skies");
    }

    #[test]
    fn test_modes() {
        assert_eq!(PublicDomainReview.image_mode(), ImageMode::CaptionedFigures);
        assert!(!PublicDomainReview.probe_image_size());
    }
}
