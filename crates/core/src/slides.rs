//! Presentation building.
//!
//! The [`PresentationBuilder`] trait is the contract the batch controller
//! depends on: given an item title and its ordered images, produce a
//! rendered presentation and return its identifier and URL, or a
//! distinguishable failure when no images are supplied or the remote call
//! errors. [`GoogleSlidesBuilder`] is the concrete Google Slides
//! implementation; its slide geometry values are opaque layout parameters,
//! not part of the contract.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::{Result, VernissageError};

/// One slide's worth of input: the image and its resolved caption lines.
#[derive(Debug, Clone)]
pub struct SlideImage {
    pub url: Url,
    pub caption_lines: Vec<String>,
}

/// A successfully rendered presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPresentation {
    pub id: String,
    pub url: String,
}

/// Renders one presentation per item, one slide per image.
///
/// Each slide carries the image, its caption text, and a clickable
/// back-link to the source item URL.
#[async_trait]
pub trait PresentationBuilder: Send + Sync {
    async fn build(&self, title: &str, source_url: &Url, images: &[SlideImage]) -> Result<BuiltPresentation>;
}

// Slide geometry in EMU. Layout parameters only.
const IMAGE_WIDTH: i64 = 9_000_000;
const IMAGE_HEIGHT: i64 = 6_750_000;
const MARGIN: i64 = 360_000;
const CAPTION_WIDTH: i64 = 9_000_000;
const CAPTION_HEIGHT: i64 = 720_000;
const CAPTION_TOP: i64 = 6_480_000;
const LINK_WIDTH: i64 = 1_440_000;
const LINK_HEIGHT: i64 = 360_000;
const LINK_TOP: i64 = 7_200_000;

const MAX_TITLE_CHARS: usize = 100;
const SLIDES_API: &str = "https://slides.googleapis.com/v1/presentations";

/// Google Slides REST implementation.
pub struct GoogleSlidesBuilder {
    http: reqwest::Client,
    token: String,
}

impl GoogleSlidesBuilder {
    pub fn new(token: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(VernissageError::HttpError)?;

        Ok(Self { http, token })
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self.http.post(url).bearer_auth(&self.token).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(VernissageError::ApiError {
                service: "slides",
                message: format!("{}: {}", status, message),
            });
        }

        Ok(response.json().await?)
    }
}

#[derive(Deserialize)]
struct CreateResponse {
    #[serde(rename = "presentationId")]
    presentation_id: String,
    #[serde(default)]
    slides: Vec<SlideRef>,
}

#[derive(Deserialize)]
struct SlideRef {
    #[serde(rename = "objectId")]
    object_id: String,
}

#[async_trait]
impl PresentationBuilder for GoogleSlidesBuilder {
    async fn build(&self, title: &str, source_url: &Url, images: &[SlideImage]) -> Result<BuiltPresentation> {
        if images.is_empty() {
            return Err(VernissageError::NoImages);
        }

        let short_title: String = title.chars().take(MAX_TITLE_CHARS).collect();
        let created = self.post_json(SLIDES_API, &json!({ "title": short_title })).await?;
        let created: CreateResponse = serde_json::from_value(created)?;

        let mut requests: Vec<Value> = Vec::new();

        // A fresh presentation opens with one blank slide; drop it so page
        // order matches image order.
        if let Some(first) = created.slides.first() {
            requests.push(json!({ "deleteObject": { "objectId": first.object_id } }));
        }

        let link_label = source_url.domain().unwrap_or("Source").to_string();
        for (idx, image) in images.iter().enumerate() {
            push_slide_requests(&mut requests, idx, image, &link_label, source_url);
        }

        self.post_json(
            &format!("{}/{}:batchUpdate", SLIDES_API, created.presentation_id),
            &json!({ "requests": requests }),
        )
        .await?;

        debug!(presentation = %created.presentation_id, slides = images.len(), "presentation built");

        let url = format!("https://docs.google.com/presentation/d/{}", created.presentation_id);
        Ok(BuiltPresentation { id: created.presentation_id, url })
    }
}

/// Appends the batch requests for one slide: the slide itself, its image,
/// the caption box, and the hyperlinked source label.
fn push_slide_requests(requests: &mut Vec<Value>, idx: usize, image: &SlideImage, link_label: &str, source_url: &Url) {
    let slide_id = format!("slide_{}", idx);
    let image_id = format!("image_{}", idx);
    let textbox_id = format!("textbox_{}", idx);
    let link_id = format!("link_{}", idx);

    requests.push(json!({
        "createSlide": {
            "objectId": slide_id,
            "slideLayoutReference": { "predefinedLayout": "BLANK" }
        }
    }));

    requests.push(json!({
        "createImage": {
            "objectId": image_id,
            "url": image.url.as_str(),
            "elementProperties": {
                "pageObjectId": slide_id,
                "size": {
                    "width": { "magnitude": IMAGE_WIDTH, "unit": "EMU" },
                    "height": { "magnitude": IMAGE_HEIGHT, "unit": "EMU" }
                },
                "transform": {
                    "scaleX": 1, "scaleY": 1,
                    "translateX": MARGIN, "translateY": MARGIN,
                    "unit": "EMU"
                }
            }
        }
    }));

    requests.push(json!({
        "createShape": {
            "objectId": textbox_id,
            "shapeType": "TEXT_BOX",
            "elementProperties": {
                "pageObjectId": slide_id,
                "size": {
                    "width": { "magnitude": CAPTION_WIDTH, "unit": "EMU" },
                    "height": { "magnitude": CAPTION_HEIGHT, "unit": "EMU" }
                },
                "transform": {
                    "scaleX": 1, "scaleY": 1,
                    "translateX": MARGIN, "translateY": CAPTION_TOP,
                    "unit": "EMU"
                }
            }
        }
    }));
    requests.push(json!({
        "insertText": { "objectId": textbox_id, "text": image.caption_lines.join("\n") }
    }));

    requests.push(json!({
        "createShape": {
            "objectId": link_id,
            "shapeType": "TEXT_BOX",
            "elementProperties": {
                "pageObjectId": slide_id,
                "size": {
                    "width": { "magnitude": LINK_WIDTH, "unit": "EMU" },
                    "height": { "magnitude": LINK_HEIGHT, "unit": "EMU" }
                },
                "transform": {
                    "scaleX": 1, "scaleY": 1,
                    "translateX": MARGIN, "translateY": LINK_TOP,
                    "unit": "EMU"
                }
            }
        }
    }));
    requests.push(json!({
        "insertText": { "objectId": link_id, "text": link_label }
    }));
    requests.push(json!({
        "updateTextStyle": {
            "objectId": link_id,
            "fields": "link",
            "style": { "link": { "url": source_url.as_str() } },
            "textRange": { "type": "ALL" }
        }
    }));
}
