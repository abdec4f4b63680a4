//! Heuristic caption parsing.
//!
//! Figure captions on art blogs carry artwork attribution as loose
//! comma-separated text with no fixed grammar, most commonly in the shape
//! `Artist, Title, Year, Medium`. [`parse_caption`] splits on commas and
//! assigns segments positionally: the first segment is the artist, a 4-digit
//! year token is pulled out of the remainder, then the first remaining
//! segment is the title and the last (if distinct) is the medium.
//!
//! The parser is best-effort and lossy. Known failure modes, accepted by
//! design: titles containing commas bleed into the medium, captions without
//! a year shift nothing, and non-Western name ordering can swap artist and
//! title. Ambiguous captions are guessed at, not rejected; low-confidence
//! parses are logged at debug level.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// A 4-digit token beginning with `1` or `20`.
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(1\d{3}|20\d{2})\b").unwrap());

/// Partial artwork metadata recovered from one caption.
///
/// `None` fields were not present in the caption; callers fall back to
/// item-level metadata field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionMeta {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub year: Option<String>,
    pub medium: Option<String>,
}

impl CaptionMeta {
    /// True when no field was recovered.
    pub fn is_empty(&self) -> bool {
        self.artist.is_none() && self.title.is_none() && self.year.is_none() && self.medium.is_none()
    }
}

/// Parses a free-text caption into partial artwork metadata.
///
/// ```
/// use vernissage_core::caption::parse_caption;
///
/// let meta = parse_caption("Jane Doe, Untitled Study, 1987, oil on canvas");
/// assert_eq!(meta.artist.as_deref(), Some("Jane Doe"));
/// assert_eq!(meta.title.as_deref(), Some("Untitled Study"));
/// assert_eq!(meta.year.as_deref(), Some("1987"));
/// assert_eq!(meta.medium.as_deref(), Some("oil on canvas"));
/// ```
pub fn parse_caption(text: &str) -> CaptionMeta {
    let mut segments: Vec<String> = text
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        return CaptionMeta::default();
    }

    let artist = segments.remove(0);

    // Pull the year out of whichever remaining segment carries it, stripping
    // the token so it cannot leak into the title or medium.
    let mut year = None;
    for segment in segments.iter_mut() {
        if let Some(m) = YEAR_RE.find(segment) {
            year = Some(m.as_str().to_string());
            let stripped = format!("{}{}", &segment[..m.start()], &segment[m.end()..]);
            *segment = stripped.trim().trim_matches(|c| c == '(' || c == ')').trim().to_string();
            break;
        }
    }
    segments.retain(|s| !s.is_empty());

    let title = segments.first().cloned();
    let medium = if segments.len() > 1 { segments.last().cloned() } else { None };

    if title.is_none() || (year.is_none() && medium.is_none()) {
        debug!(caption = text, "low-confidence caption parse");
    }

    CaptionMeta { artist: Some(artist), title, year, medium }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_full_caption() {
        let meta = parse_caption("Jane Doe, Untitled Study, 1987, oil on canvas");
        assert_eq!(meta.artist.as_deref(), Some("Jane Doe"));
        assert_eq!(meta.title.as_deref(), Some("Untitled Study"));
        assert_eq!(meta.year.as_deref(), Some("1987"));
        assert_eq!(meta.medium.as_deref(), Some("oil on canvas"));
    }

    #[rstest]
    #[case("A. Painter, View of a City, 1650, oil on panel", "1650")]
    #[case("B. Etcher, Plate IV (1893), etching", "1893")]
    #[case("C. Sculptor, Figure, bronze, 2004", "2004")]
    #[case("D. Draughtsman, Study, 1201, chalk", "1201")]
    fn test_year_extracted_and_stripped(#[case] caption: &str, #[case] year: &str) {
        let meta = parse_caption(caption);
        assert_eq!(meta.year.as_deref(), Some(year));

        // The year token must not survive into title or medium.
        assert!(!meta.title.unwrap_or_default().contains(year));
        assert!(!meta.medium.unwrap_or_default().contains(year));
    }

    #[test]
    fn test_single_segment_is_artist_only() {
        let meta = parse_caption("Anonymous");
        assert_eq!(meta.artist.as_deref(), Some("Anonymous"));
        assert!(meta.title.is_none());
        assert!(meta.year.is_none());
        assert!(meta.medium.is_none());
    }

    #[test]
    fn test_two_segments_have_no_medium() {
        let meta = parse_caption("Jane Doe, Landscape");
        assert_eq!(meta.artist.as_deref(), Some("Jane Doe"));
        assert_eq!(meta.title.as_deref(), Some("Landscape"));
        assert!(meta.medium.is_none());
    }

    #[test]
    fn test_artist_and_year_only() {
        let meta = parse_caption("Jane Doe, 1987");
        assert_eq!(meta.artist.as_deref(), Some("Jane Doe"));
        assert_eq!(meta.year.as_deref(), Some("1987"));
        assert!(meta.title.is_none());
        assert!(meta.medium.is_none());
    }

    #[test]
    fn test_no_year_in_caption() {
        let meta = parse_caption("Jane Doe, Landscape, watercolor");
        assert_eq!(meta.artist.as_deref(), Some("Jane Doe"));
        assert_eq!(meta.title.as_deref(), Some("Landscape"));
        assert!(meta.year.is_none());
        assert_eq!(meta.medium.as_deref(), Some("watercolor"));
    }

    #[test]
    fn test_comma_in_title_misattributes_by_design() {
        // Documented failure mode: the second half of a comma-bearing title
        // reads as the medium. The parser guesses rather than rejecting.
        let meta = parse_caption("Jane Doe, Paris, Winter, 1901");
        assert_eq!(meta.artist.as_deref(), Some("Jane Doe"));
        assert_eq!(meta.title.as_deref(), Some("Paris"));
        assert_eq!(meta.medium.as_deref(), Some("Winter"));
        assert_eq!(meta.year.as_deref(), Some("1901"));
    }

    #[test]
    fn test_non_year_digits_are_not_years() {
        let meta = parse_caption("Jane Doe, Composition 3000, gouache");
        assert!(meta.year.is_none());
        assert_eq!(meta.title.as_deref(), Some("Composition 3000"));
    }

    #[test]
    fn test_empty_caption() {
        assert!(parse_caption("").is_empty());
        assert!(parse_caption("  ,  , ").is_empty());
    }
}
