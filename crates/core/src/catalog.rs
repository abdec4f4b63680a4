//! Drive folder filing and the spreadsheet catalog.
//!
//! The [`CatalogService`] trait covers the Drive-like collaborator: finding
//! or creating the site's folder, filing presentations into it, and
//! appending one row per produced presentation to a tabular catalog. Rows
//! are append-only; nothing here updates or deletes.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::ledger::ProcessingRecord;
use crate::{Result, VernissageError};

/// Denormalized catalog row: one per produced presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    pub article_url: String,
    pub presentation_id: String,
    pub presentation_url: String,
    pub title: String,
    pub author: String,
    pub year: String,
    pub medium: String,
    pub keywords: String,
    pub slide_count: usize,
    pub processed_at: DateTime<Utc>,
}

impl CatalogRow {
    /// Projects a ledger record into a catalog row.
    pub fn from_record(article_url: &Url, record: &ProcessingRecord) -> Self {
        Self {
            article_url: article_url.to_string(),
            presentation_id: record.presentation_id.clone(),
            presentation_url: record.presentation_url.clone(),
            title: record.title.clone(),
            author: record.author.clone(),
            year: record.year.clone(),
            medium: record.medium.clone(),
            keywords: record.keywords.clone(),
            slide_count: record.slide_count,
            processed_at: record.processed_at,
        }
    }

    /// Column headers, written once when a catalog is first created.
    pub fn header() -> &'static [&'static str] {
        &[
            "Article URL",
            "Presentation ID",
            "Presentation URL",
            "Title",
            "Author",
            "Year",
            "Medium",
            "Keywords",
            "Slides",
            "Processed At",
        ]
    }

    /// Cell values in header order.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.article_url.clone(),
            self.presentation_id.clone(),
            self.presentation_url.clone(),
            self.title.clone(),
            self.author.clone(),
            self.year.clone(),
            self.medium.clone(),
            self.keywords.clone(),
            self.slide_count.to_string(),
            self.processed_at.to_rfc3339(),
        ]
    }
}

/// Folder filing and append-only tabular catalog.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn get_or_create_folder(&self, name: &str) -> Result<String>;
    async fn move_into_folder(&self, artifact_id: &str, folder_id: &str) -> Result<()>;
    async fn get_or_create_tabular_catalog(&self, name: &str) -> Result<String>;
    async fn append_row(&self, catalog_id: &str, row: &CatalogRow) -> Result<()>;
}

const DRIVE_API: &str = "https://www.googleapis.com/drive/v3/files";
const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// Google Drive + Sheets REST implementation.
pub struct GoogleDriveCatalog {
    http: reqwest::Client,
    token: String,
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileRef>,
}

#[derive(Deserialize)]
struct FileRef {
    id: String,
}

impl GoogleDriveCatalog {
    pub fn new(token: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(VernissageError::HttpError)?;

        Ok(Self { http, token })
    }

    fn api_error(status: reqwest::StatusCode, message: String) -> VernissageError {
        VernissageError::ApiError { service: "drive", message: format!("{}: {}", status, message) }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Self::api_error(status, message));
        }
        Ok(response)
    }

    /// Looks up a non-trashed file by exact name and MIME type.
    async fn find_by_name(&self, name: &str, mime: &str) -> Result<Option<String>> {
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            name.replace('\'', "\\'"),
            mime
        );

        let response = self
            .http
            .get(DRIVE_API)
            .bearer_auth(&self.token)
            .query(&[("q", query.as_str()), ("fields", "files(id)")])
            .send()
            .await?;

        let list: FileList = Self::check(response).await?.json().await?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self.http.post(url).bearer_auth(&self.token).json(body).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

#[async_trait]
impl CatalogService for GoogleDriveCatalog {
    async fn get_or_create_folder(&self, name: &str) -> Result<String> {
        if let Some(id) = self.find_by_name(name, FOLDER_MIME).await? {
            return Ok(id);
        }

        let created = self
            .post_json(DRIVE_API, &json!({ "name": name, "mimeType": FOLDER_MIME }))
            .await?;
        let file: FileRef = serde_json::from_value(created)?;
        debug!(folder = name, id = %file.id, "folder created");

        Ok(file.id)
    }

    async fn move_into_folder(&self, artifact_id: &str, folder_id: &str) -> Result<()> {
        let url = format!("{}/{}", DRIVE_API, artifact_id);
        let response = self
            .http
            .patch(url.as_str())
            .bearer_auth(&self.token)
            .query(&[("addParents", folder_id), ("fields", "id")])
            .json(&json!({}))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn get_or_create_tabular_catalog(&self, name: &str) -> Result<String> {
        if let Some(id) = self.find_by_name(name, SPREADSHEET_MIME).await? {
            return Ok(id);
        }

        let created = self
            .post_json(SHEETS_API, &json!({ "properties": { "title": name } }))
            .await?;
        let id = created
            .get("spreadsheetId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Self::api_error(reqwest::StatusCode::OK, "missing spreadsheetId".to_string()))?
            .to_string();

        // Fresh catalogs start with a header row.
        let header: Vec<Value> = CatalogRow::header().iter().map(|h| json!(h)).collect();
        self.post_json(
            &format!("{}/{}/values/A1:append?valueInputOption=RAW", SHEETS_API, id),
            &json!({ "values": [header] }),
        )
        .await?;
        debug!(catalog = name, id = %id, "catalog spreadsheet created");

        Ok(id)
    }

    async fn append_row(&self, catalog_id: &str, row: &CatalogRow) -> Result<()> {
        self.post_json(
            &format!("{}/{}/values/A1:append?valueInputOption=RAW", SHEETS_API, catalog_id),
            &json!({ "values": [row.cells()] }),
        )
        .await?;

        Ok(())
    }
}
