//! Content item and image candidate types.
//!
//! A [`ContentItem`] is one source article or collection page; its metadata
//! fields default to the `"Unknown"` sentinel until extraction (or the
//! enhancer) resolves them. An [`ImageCandidate`] is one qualifying image
//! discovered inside the item's page, optionally carrying caption-derived
//! artwork metadata that overrides the item's metadata field by field.

use url::Url;

use crate::caption::CaptionMeta;

/// Sentinel value for metadata fields that could not be resolved.
pub const UNKNOWN: &str = "Unknown";

/// One source article or collection page to be turned into a presentation.
///
/// Constructed fresh by the extractor per fetch. After extraction completes,
/// only the enhancer may mutate it, and only by filling fields still set to
/// [`UNKNOWN`]. Immutable once handed to the presentation builder.
#[derive(Debug, Clone)]
pub struct ContentItem {
    /// Source page URL; unique key for the ledger.
    pub url: Url,
    pub title: String,
    /// Creator/artist, distinct from the page byline.
    pub author: String,
    /// Free text, often a 4-digit string.
    pub year: String,
    /// Free-text category.
    pub medium: String,
    /// Free-text comma-joined tags.
    pub keywords: String,
}

impl ContentItem {
    /// Creates an item with all metadata fields set to [`UNKNOWN`].
    pub fn new(url: Url) -> Self {
        Self {
            url,
            title: UNKNOWN.to_string(),
            author: UNKNOWN.to_string(),
            year: UNKNOWN.to_string(),
            medium: UNKNOWN.to_string(),
            keywords: UNKNOWN.to_string(),
        }
    }

    /// True when at least one of author/year/medium/keywords is unresolved.
    ///
    /// This is the gate for the optional enhancement pass; title alone does
    /// not trigger it.
    pub fn needs_enhancement(&self) -> bool {
        self.author == UNKNOWN || self.year == UNKNOWN || self.medium == UNKNOWN || self.keywords == UNKNOWN
    }
}

/// One image discovered inside a content item's page.
///
/// Ordering is page order. Duplicates by resolved URL are collapsed during
/// extraction, keeping the first occurrence.
#[derive(Debug, Clone)]
pub struct ImageCandidate {
    /// Absolute image URL.
    pub url: Url,
    /// Raw caption text, possibly empty.
    pub caption: String,
    /// Caption-derived metadata override; `None` fields fall back to the
    /// item's metadata individually.
    pub artwork: CaptionMeta,
}

impl ImageCandidate {
    /// An image with no caption of its own; it inherits the item's metadata
    /// wholesale.
    pub fn bare(url: Url) -> Self {
        Self { url, caption: String::new(), artwork: CaptionMeta::default() }
    }

    /// Resolves the slide caption lines for this image against its item.
    ///
    /// The fallback is strictly per field: a caption that supplies an artist
    /// but no year keeps its own artist and borrows the item's year.
    pub fn caption_lines(&self, item: &ContentItem) -> Vec<String> {
        vec![
            self.artwork.artist.clone().unwrap_or_else(|| item.author.clone()),
            self.artwork.title.clone().unwrap_or_else(|| item.title.clone()),
            self.artwork.medium.clone().unwrap_or_else(|| item.medium.clone()),
            self.artwork.year.clone().unwrap_or_else(|| item.year.clone()),
        ]
    }
}

/// The complete result of extracting one item page.
#[derive(Debug, Clone)]
pub struct ExtractedItem {
    pub item: ContentItem,
    /// Qualifying images in page order, deduplicated by URL.
    pub images: Vec<ImageCandidate>,
    /// Visible text of the main content region, for the enhancer excerpt.
    pub excerpt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> ContentItem {
        let mut item = ContentItem::new(Url::parse("https://example.com/a").unwrap());
        item.title = "Item Title".to_string();
        item.author = "Item Author".to_string();
        item.year = "1920".to_string();
        item.medium = "etching".to_string();
        item.keywords = "prints".to_string();
        item
    }

    #[test]
    fn test_new_item_defaults_to_unknown() {
        let item = ContentItem::new(Url::parse("https://example.com/a").unwrap());
        assert_eq!(item.title, UNKNOWN);
        assert_eq!(item.author, UNKNOWN);
        assert_eq!(item.year, UNKNOWN);
        assert_eq!(item.medium, UNKNOWN);
        assert_eq!(item.keywords, UNKNOWN);
        assert!(item.needs_enhancement());
    }

    #[test]
    fn test_needs_enhancement_ignores_title() {
        let mut item = item();
        item.title = UNKNOWN.to_string();
        assert!(!item.needs_enhancement());

        item.year = UNKNOWN.to_string();
        assert!(item.needs_enhancement());
    }

    #[test]
    fn test_bare_image_inherits_item_metadata_wholesale() {
        let item = item();
        let image = ImageCandidate::bare(Url::parse("https://example.com/i.jpg").unwrap());

        assert_eq!(
            image.caption_lines(&item),
            vec!["Item Author", "Item Title", "etching", "1920"]
        );
    }

    #[test]
    fn test_caption_lines_fall_back_per_field() {
        let item = item();
        let image = ImageCandidate {
            url: Url::parse("https://example.com/i.jpg").unwrap(),
            caption: "Jane Doe, Study".to_string(),
            artwork: CaptionMeta {
                artist: Some("Jane Doe".to_string()),
                title: Some("Study".to_string()),
                year: None,
                medium: None,
            },
        };

        // Own artist and title; the item's medium and year, individually.
        assert_eq!(image.caption_lines(&item), vec!["Jane Doe", "Study", "etching", "1920"]);
    }
}
