//! Supported source sites.
//!
//! Each site is a variant of the closed [`Site`] enum backed by a
//! [`SiteProfile`] implementation describing how that site lays out its
//! listing pages, item links, content region, and images. The listing walker
//! and the extractor are generic over the profile; adding a site means
//! adding a profile, never editing the shared algorithms.

mod public_domain_review;
mod socks_studio;

use std::str::FromStr;

pub use public_domain_review::PublicDomainReview;
pub use socks_studio::SocksStudio;
use url::Url;

use crate::parse::Document;

/// How a site's article images are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMode {
    /// Every `<img>` inside the content region qualifies.
    AllImages,
    /// Only `<img>` nested in a `<figure>` that also carries a
    /// `<figcaption>`; the caption feeds the heuristic parser.
    CaptionedFigures,
}

/// One supported source site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    SocksStudio,
    PublicDomainReview,
}

impl Site {
    /// All supported sites, for help text and validation messages.
    pub const ALL: &'static [Site] = &[Site::SocksStudio, Site::PublicDomainReview];

    /// Stable machine-readable name, used for ledger file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Site::SocksStudio => "socks-studio",
            Site::PublicDomainReview => "public-domain-review",
        }
    }

    /// The extraction profile for this site.
    pub fn profile(&self) -> &'static dyn SiteProfile {
        match self {
            Site::SocksStudio => &SocksStudio,
            Site::PublicDomainReview => &PublicDomainReview,
        }
    }
}

impl FromStr for Site {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "socks-studio" => Ok(Site::SocksStudio),
            "public-domain-review" => Ok(Site::PublicDomainReview),
            _ => Err(format!(
                "Unknown site: {}. Valid options: socks-studio, public-domain-review",
                s
            )),
        }
    }
}

/// Site-specific structure: where listings live, how item links look, where
/// the content region is, and how images are enumerated and filtered.
pub trait SiteProfile: Send + Sync {
    /// Human-readable site name, used for Drive folder and catalog names.
    fn display_name(&self) -> &'static str;

    /// Root URL of the site.
    fn base_url(&self) -> Url;

    /// URL of the numbered listing page, starting at 1.
    fn listing_url(&self, page: u32) -> Url;

    /// Item links found on one listing page, in page order, absolute.
    fn item_links(&self, doc: &Document) -> Vec<Url>;

    /// Prioritized selectors for the main content region; the whole-page
    /// body is the implicit final fallback.
    fn content_selectors(&self) -> &'static [&'static str];

    /// How images inside the content region are enumerated.
    fn image_mode(&self) -> ImageMode;

    /// Whether to confirm image byte size with an advisory HEAD probe.
    fn probe_image_size(&self) -> bool;

    /// Drive folder collecting this site's presentations.
    fn folder_name(&self) -> String {
        format!("{} Slides", self.display_name())
    }

    /// Tabular catalog logging this site's presentations.
    fn catalog_name(&self) -> String {
        format!("{} Catalog", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_from_str() {
        assert_eq!("socks-studio".parse::<Site>().unwrap(), Site::SocksStudio);
        assert_eq!(
            "public-domain-review".parse::<Site>().unwrap(),
            Site::PublicDomainReview
        );
        assert!("example".parse::<Site>().is_err());
    }

    #[test]
    fn test_slug_round_trips() {
        for site in Site::ALL {
            assert_eq!(site.slug().parse::<Site>().unwrap(), *site);
        }
    }

    #[test]
    fn test_profile_names() {
        assert_eq!(Site::SocksStudio.profile().folder_name(), "Socks Studio Slides");
        assert_eq!(
            Site::PublicDomainReview.profile().catalog_name(),
            "Public Domain Review Catalog"
        );
    }
}
