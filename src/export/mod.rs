pub mod download;

pub use download::{DownloadArea, StagedDownload};

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TmsError};
use crate::http::{ApiClient, RequestDescriptor};

/// Kinds of entity the export service can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    TestPlan,
    TestCase,
    Checklist,
    TestStrategy,
    TestRun,
}

impl EntityType {
    pub const ALL: [EntityType; 5] = [
        Self::TestPlan,
        Self::TestCase,
        Self::Checklist,
        Self::TestStrategy,
        Self::TestRun,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TestPlan => "test_plan",
            Self::TestCase => "test_case",
            Self::Checklist => "checklist",
            Self::TestStrategy => "test_strategy",
            Self::TestRun => "test_run",
        }
    }

    /// REST collection the entity lives under.
    pub fn collection(self) -> &'static str {
        match self {
            Self::TestPlan => "test-plans",
            Self::TestCase => "test-cases",
            Self::Checklist => "checklists",
            Self::TestStrategy => "test-strategies",
            Self::TestRun => "test-runs",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown entity type '{s}', expected one of: test_plan, test_case, checklist, test_strategy, test_run"
                )
            })
    }
}

/// Only markdown is requested from the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Markdown,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
        }
    }
}

/// What to include in an exported document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub include_history: bool,
    pub include_comments: bool,
}

impl ExportOptions {
    pub const BASIC: Self = Self::new(false, false);
    pub const WITH_HISTORY: Self = Self::new(true, false);
    pub const WITH_COMMENTS: Self = Self::new(false, true);
    pub const COMPLETE: Self = Self::new(true, true);

    pub const fn new(include_history: bool, include_comments: bool) -> Self {
        Self {
            include_history,
            include_comments,
        }
    }
}

/// Body of `POST /export`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub format: ExportFormat,
    pub include_history: bool,
    pub include_comments: bool,
}

impl ExportRequest {
    pub fn new(entity_type: EntityType, entity_id: &str, options: ExportOptions) -> Self {
        Self {
            entity_type,
            entity_id: entity_id.to_string(),
            format: ExportFormat::Markdown,
            include_history: options.include_history,
            include_comments: options.include_comments,
        }
    }

    /// Name used when the response does not suggest one. The id is opaque,
    /// so separators and control characters in it become `_`.
    pub fn fallback_filename(&self) -> String {
        format!(
            "{}_{}.{}",
            self.entity_type,
            filename_safe(&self.entity_id),
            self.format.extension()
        )
    }
}

fn filename_safe(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Which server route serves the export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportEndpoint {
    /// `POST /export` with an [`ExportRequest`] body.
    #[default]
    Unified,
    /// `GET /{collection}/{id}/export?include_history=..&include_comments=..`.
    PerEntity,
}

impl ExportEndpoint {
    fn descriptor(self, request: &ExportRequest) -> Result<RequestDescriptor> {
        let descriptor = match self {
            Self::Unified => RequestDescriptor::post("/export", request)?,
            Self::PerEntity => RequestDescriptor::get(format!(
                "/{}/{}/export",
                request.entity_type.collection(),
                request.entity_id
            ))
            .with_query("format", request.format.as_str())
            .with_query("include_history", request.include_history)
            .with_query("include_comments", request.include_comments),
        };
        Ok(descriptor.binary())
    }
}

/// Affordance state: a second trigger is refused while one is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    Exporting,
}

static FILENAME_PARAM: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*filename\s*=\s*(?:"([^"]*)"|([^;]*))"#).ok()
});

/// Filename suggested by a `Content-Disposition` value, reduced to its last
/// path component. Accepts both `filename="x"` and bare `filename=x`.
pub fn filename_from_disposition(disposition: &str) -> Option<String> {
    let captures = FILENAME_PARAM.as_ref()?.captures(disposition)?;
    let raw = captures.get(1).or_else(|| captures.get(2))?.as_str();
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

/// Name to save an export under.
pub fn suggested_filename(disposition: Option<&str>, request: &ExportRequest) -> String {
    disposition
        .and_then(filename_from_disposition)
        .unwrap_or_else(|| request.fallback_filename())
}

/// Triggers exports and saves the returned documents.
#[derive(Debug)]
pub struct Exporter {
    client: ApiClient,
    downloads: DownloadArea,
    endpoint: ExportEndpoint,
    in_flight: AtomicBool,
}

/// Holds the exporter in [`ExportState::Exporting`] until dropped.
struct ExportTicket<'a> {
    in_flight: &'a AtomicBool,
}

impl Drop for ExportTicket<'_> {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

impl Exporter {
    pub fn new(client: ApiClient, downloads: DownloadArea) -> Self {
        Self {
            client,
            downloads,
            endpoint: ExportEndpoint::default(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_endpoint(mut self, endpoint: ExportEndpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn downloads(&self) -> &DownloadArea {
        &self.downloads
    }

    pub fn state(&self) -> ExportState {
        if self.in_flight.load(Ordering::SeqCst) {
            ExportState::Exporting
        } else {
            ExportState::Idle
        }
    }

    fn begin(&self) -> Result<ExportTicket<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| TmsError::ExportInProgress)?;
        Ok(ExportTicket {
            in_flight: &self.in_flight,
        })
    }

    /// Request an export and save it into the download area.
    ///
    /// Returns the path written. HTTP failures come back as the pipeline
    /// classified them; nothing is written in that case.
    pub async fn export_entity(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        options: ExportOptions,
    ) -> Result<PathBuf> {
        if entity_id.trim().is_empty() {
            return Err(TmsError::InvalidRequest {
                reason: "entity id must not be empty".into(),
            });
        }

        let _ticket = self.begin()?;
        let request = ExportRequest::new(entity_type, entity_id, options);
        tracing::debug!(
            entity = %entity_type,
            id = entity_id,
            history = options.include_history,
            comments = options.include_comments,
            "requesting export"
        );

        let response = self
            .client
            .request(self.endpoint.descriptor(&request)?)
            .await?;
        let disposition = response.header_lossy("content-disposition");
        let filename = suggested_filename(disposition.as_deref(), &request);
        let bytes = response.into_bytes();

        let path = self
            .downloads
            .save(&bytes, &filename)
            .map_err(|e| match e {
                TmsError::Export { .. } => e,
                other => TmsError::Export {
                    reason: other.to_string(),
                },
            })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "export saved");
        Ok(path)
    }

    pub async fn export_test_plan(&self, id: &str, options: ExportOptions) -> Result<PathBuf> {
        self.export_entity(EntityType::TestPlan, id, options).await
    }

    pub async fn export_test_case(&self, id: &str, options: ExportOptions) -> Result<PathBuf> {
        self.export_entity(EntityType::TestCase, id, options).await
    }

    pub async fn export_checklist(&self, id: &str, options: ExportOptions) -> Result<PathBuf> {
        self.export_entity(EntityType::Checklist, id, options).await
    }

    pub async fn export_test_strategy(&self, id: &str, options: ExportOptions) -> Result<PathBuf> {
        self.export_entity(EntityType::TestStrategy, id, options).await
    }

    pub async fn export_test_run(&self, id: &str, options: ExportOptions) -> Result<PathBuf> {
        self.export_entity(EntityType::TestRun, id, options).await
    }
}
