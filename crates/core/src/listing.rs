//! Listing pagination.
//!
//! Walks a site's numbered listing pages from page 1 and collects item URLs
//! most-recent-first. The walk is lazy and restartable: every call starts
//! over at page 1, there is no resumable cursor. Pagination stops when a
//! page contributes zero new links, when the hard page ceiling is reached,
//! or when the requested limit is full. A fetch error on any page ends the
//! walk early with partial results; it is never an error to the caller.

use std::collections::HashSet;

use tracing::{debug, warn};
use url::Url;

use crate::fetch::PageFetcher;
use crate::parse::Document;
use crate::sites::SiteProfile;

/// Safety valve against infinite pagination, not a content limit.
pub const PAGE_CEILING: u32 = 50;

/// Collects item URLs from the site's listing pages, in discovery order.
pub async fn list_items(fetcher: &PageFetcher, profile: &dyn SiteProfile, limit: Option<usize>) -> Vec<Url> {
    let mut collected: Vec<Url> = Vec::new();
    let mut seen: HashSet<Url> = HashSet::new();

    for page in 1..=PAGE_CEILING {
        if page > 1 {
            fetcher.page_pause().await;
        }

        let url = profile.listing_url(page);
        let html = match fetcher.get_text(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(page, error = %e, "listing page fetch failed, returning partial results");
                break;
            }
        };

        let doc = Document::parse(&html);
        let added = push_new(&mut collected, &mut seen, profile.item_links(&doc));
        debug!(page, added, total = collected.len(), "listing page walked");

        if added == 0 {
            break;
        }

        if let Some(limit) = limit
            && collected.len() >= limit
        {
            collected.truncate(limit);
            break;
        }
    }

    collected
}

/// Appends links not seen before, preserving order. Returns how many were new.
fn push_new(collected: &mut Vec<Url>, seen: &mut HashSet<Url>, links: Vec<Url>) -> usize {
    let mut added = 0;
    for link in links {
        if seen.insert(link.clone()) {
            collected.push(link);
            added += 1;
        }
    }
    added
}
