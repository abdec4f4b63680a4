//! Profile for socks-studio.com.
//!
//! A WordPress blog: listing pages at `/page/N/` with article links wrapped
//! in `<h2>` headings, content in `<article>` or `div.entry-content`, images
//! as plain `<img>` tags without captions.

use url::Url;

use super::{ImageMode, SiteProfile};
use crate::parse::Document;

pub struct SocksStudio;

impl SiteProfile for SocksStudio {
    fn display_name(&self) -> &'static str {
        "Socks Studio"
    }

    fn base_url(&self) -> Url {
        Url::parse("https://socks-studio.com").expect("static base URL")
    }

    fn listing_url(&self, page: u32) -> Url {
        let base = self.base_url();
        if page <= 1 {
            base
        } else {
            base.join(&format!("/page/{}/", page)).expect("static page path")
        }
    }

    fn item_links(&self, doc: &Document) -> Vec<Url> {
        let base = self.base_url();
        let mut links = Vec::new();

        if let Ok(anchors) = doc.select("article h2 a") {
            for anchor in anchors {
                if let Some(href) = anchor.attr("href")
                    && let Ok(url) = base.join(href)
                {
                    links.push(url);
                }
            }
        }

        links
    }

    fn content_selectors(&self) -> &'static [&'static str] {
        &["article", "div.entry-content"]
    }

    fn image_mode(&self) -> ImageMode {
        ImageMode::AllImages
    }

    fn probe_image_size(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_HTML: &str = r#"
        <html><body>
            <article>
                <h2><a href="/2024/03/first-post/">First</a></h2>
            </article>
            <article>
                <h2><a href="https://socks-studio.com/2024/02/second-post/">Second</a></h2>
            </article>
            <article>
                <h2>No link here</h2>
            </article>
        </body></html>
    "#;

    #[test]
    fn test_listing_url_pages() {
        let profile = SocksStudio;
        assert_eq!(profile.listing_url(1).as_str(), "https://socks-studio.com/");
        assert_eq!(profile.listing_url(3).as_str(), "https://socks-studio.com/page/3/");
    }

    #[test]
    fn test_item_links_resolve_relative_hrefs() {
        let doc = Document::parse(LISTING_HTML);
        let links = SocksStudio.item_links(&doc);

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].as_str(), "https://socks-studio.com/2024/03/first-post/");
        assert_eq!(links[1].as_str(), "https://socks-studio.com/2024/02/second-post/");
    }

    #[test]
    fn test_modes() {
        assert_eq!(SocksStudio.image_mode(), ImageMode::AllImages);
        assert!(SocksStudio.probe_image_size());
    }
}
