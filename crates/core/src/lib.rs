pub mod batch;
pub mod caption;
pub mod catalog;
pub mod config;
pub mod enhance;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod item;
pub mod ledger;
pub mod listing;
pub mod parse;
pub mod sites;
pub mod slides;

pub use batch::{BatchConfig, BatchController, CancelFlag, ItemSource, RunSummary, SiteClient};
pub use caption::{CaptionMeta, parse_caption};
pub use catalog::{CatalogRow, CatalogService, GoogleDriveCatalog};
pub use config::{TOKEN_FILE, resolve_google_token};
pub use enhance::{Enhancer, KEY_FILE, build_enhancer};
pub use error::{Result, VernissageError};
pub use extract::{ExtractConfig, extract_item};
pub use fetch::{FetchConfig, PageFetcher};
pub use item::{ContentItem, ExtractedItem, ImageCandidate, UNKNOWN};
pub use ledger::{JsonFileStore, Ledger, LedgerStore, ProcessingRecord};
pub use listing::list_items;
pub use parse::Document;
pub use sites::{Site, SiteProfile};
pub use slides::{BuiltPresentation, GoogleSlidesBuilder, PresentationBuilder, SlideImage};
