//! Domain entities for the Request/Document Store (§3).

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Upload size ceiling (§3 `MockupUpload.fileSize`).
pub const MAX_MOCKUP_BYTES: u64 = 10 * 1024 * 1024;
/// Per-request mockup ceiling (§3 `PRDRequest.mockupSources`, `MockupUpload`).
pub const MAX_MOCKUPS_PER_REQUEST: usize = 20;
/// `critical` priority requires at least this many characters of description.
pub const CRITICAL_MIN_DESCRIPTION_LEN: usize = 50;
/// Confidence below which a document must carry the `needs-review` tag (§3, §8).
pub const NEEDS_REVIEW_THRESHOLD: f64 = 0.7;

/// §3 `PRDRequest.priority`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// §3 `PRDRequest.requester`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requester {
    pub id: Uuid,
    pub email: Option<String>,
}

/// §4.1 request state machine. `Failed`, `Cancelled`, and `Completed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RequestStatus {
    Pending,
    Processing,
    ClarificationNeeded,
    Completed,
    Failed { reason: String },
    Cancelled,
}

impl RequestStatus {
    /// Derived progress view (§4.1).
    #[must_use]
    pub const fn progress(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::ClarificationNeeded => 25,
            Self::Processing => 50,
            Self::Completed => 100,
            Self::Failed { .. } | Self::Cancelled => 0,
        }
    }

    /// Terminal states never transition (§4.1, §8).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. } | Self::Cancelled)
    }

    /// Whether `self -> next` follows the §4.1 graph.
    #[must_use]
    pub const fn can_transition_to(&self, next: &Self) -> bool {
        match self {
            Self::Pending => matches!(
                next,
                Self::Processing | Self::Cancelled | Self::ClarificationNeeded
            ),
            Self::ClarificationNeeded => {
                matches!(next, Self::Processing | Self::Cancelled)
            }
            Self::Processing => matches!(
                next,
                Self::Completed | Self::ClarificationNeeded | Self::Failed { .. } | Self::Cancelled
            ),
            Self::Completed | Self::Failed { .. } | Self::Cancelled => false,
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::ClarificationNeeded => "clarificationNeeded",
            Self::Completed => "completed",
            Self::Failed { .. } => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// §3 `PRDRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PRDRequest {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub requester: Requester,
    pub mockup_sources: Vec<Uuid>,
    pub preferred_provider: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub generated_document_id: Option<Uuid>,
}

impl PRDRequest {
    /// Build a new request in `pending`, validating §3's invariants.
    ///
    /// # Errors
    /// Returns [`StoreError::Validation`] if the title is empty, `critical` priority
    /// lacks a 50-character description, or more than 20 mockups are attached.
    pub fn new(
        title: String,
        description: String,
        priority: Priority,
        requester: Requester,
        mockup_sources: Vec<Uuid>,
        preferred_provider: Option<String>,
    ) -> StoreResult<Self> {
        if title.trim().is_empty() {
            return Err(StoreError::Validation("title must not be empty".into()));
        }
        if matches!(priority, Priority::Critical) && description.len() < CRITICAL_MIN_DESCRIPTION_LEN
        {
            return Err(StoreError::Validation(format!(
                "critical priority requires a description of at least {CRITICAL_MIN_DESCRIPTION_LEN} characters"
            )));
        }
        if mockup_sources.len() > MAX_MOCKUPS_PER_REQUEST {
            return Err(StoreError::Validation(format!(
                "at most {MAX_MOCKUPS_PER_REQUEST} mockup sources are allowed"
            )));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            description,
            priority,
            requester,
            mockup_sources,
            preferred_provider,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
            completed_at: None,
            generated_document_id: None,
        })
    }

    #[must_use]
    pub const fn progress(&self) -> u8 {
        self.status.progress()
    }
}

/// §3 `PRDSection.sectionType`, a closed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    ExecutiveSummary,
    ProblemStatement,
    UserStories,
    FunctionalRequirements,
    NonFunctionalRequirements,
    TechnicalRequirements,
    AcceptanceCriteria,
    Timeline,
    Risks,
    Appendix,
}

impl SectionType {
    /// Map a Markdown heading to the closed enum by case-insensitive substring
    /// match (§4.7 Phase 5). Unmatched headings round-trip as `Appendix`.
    #[must_use]
    pub fn from_heading(heading: &str) -> Self {
        let h = heading.to_lowercase();
        if h.contains("executive") || h.contains("summary") {
            Self::ExecutiveSummary
        } else if h.contains("problem") {
            Self::ProblemStatement
        } else if h.contains("user stor") {
            Self::UserStories
        } else if h.contains("non-functional") || h.contains("non functional") || h.contains("nfr")
        {
            Self::NonFunctionalRequirements
        } else if h.contains("functional requirement") {
            Self::FunctionalRequirements
        } else if h.contains("technical") {
            Self::TechnicalRequirements
        } else if h.contains("acceptance") {
            Self::AcceptanceCriteria
        } else if h.contains("timeline") || h.contains("schedule") || h.contains("roadmap") {
            Self::Timeline
        } else if h.contains("risk") {
            Self::Risks
        } else {
            Self::Appendix
        }
    }
}

/// §3 `PRDDocument.sections[]` entry, ordered within a document by `order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PRDSection {
    pub order: i32,
    pub section_type: SectionType,
    pub title: String,
    pub content: String,
}

/// §3 `PRDDocument.metadata`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub format: String,
    pub language: String,
    pub word_count: u32,
    pub estimated_read_time: u32,
    pub tags: Vec<String>,
    pub attachments: Vec<String>,
}

impl DocumentMetadata {
    /// `estimatedReadTime = max(1, wordCount / 200)` (§3, §8).
    #[must_use]
    pub const fn estimated_read_time_for(word_count: u32) -> u32 {
        let minutes = word_count / 200;
        if minutes < 1 { 1 } else { minutes }
    }
}

/// §3 `PRDDocument`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PRDDocument {
    pub id: Uuid,
    pub request_id: Uuid,
    pub title: String,
    pub content: String,
    pub sections: Vec<PRDSection>,
    pub metadata: DocumentMetadata,
    pub confidence: f64,
    pub generated_by: String,
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub professional_analysis: Option<String>,
}

impl PRDDocument {
    /// Construct a document, enforcing §3/§8's confidence and tag invariants.
    ///
    /// # Errors
    /// Returns [`StoreError::Validation`] if title/content are empty or confidence
    /// is outside `[0, 1]`.
    pub fn new(
        request_id: Uuid,
        title: String,
        content: String,
        mut sections: Vec<PRDSection>,
        mut metadata: DocumentMetadata,
        confidence: f64,
        generated_by: String,
        professional_analysis: Option<String>,
    ) -> StoreResult<Self> {
        if title.trim().is_empty() {
            return Err(StoreError::Validation("document title must not be empty".into()));
        }
        if content.trim().is_empty() {
            return Err(StoreError::Validation("document content must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(StoreError::Validation("confidence must be in [0, 1]".into()));
        }
        sections.sort_by_key(|s| s.order);
        metadata.estimated_read_time = DocumentMetadata::estimated_read_time_for(metadata.word_count);
        if confidence < NEEDS_REVIEW_THRESHOLD && !metadata.tags.iter().any(|t| t == "needs-review") {
            metadata.tags.push("needs-review".to_string());
        }
        Ok(Self {
            id: Uuid::new_v4(),
            request_id,
            title,
            content,
            sections,
            metadata,
            confidence,
            generated_by,
            version: 1,
            generated_at: Utc::now(),
            professional_analysis,
        })
    }
}

/// §3 `MockupUpload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockupUpload {
    pub id: Uuid,
    pub request_id: Uuid,
    pub storage_path: String,
    pub bucket: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub analysis_result: Option<serde_json::Value>,
    pub analysis_confidence: Option<f64>,
    pub is_processed: bool,
}

impl MockupUpload {
    /// Create an upload record, enforcing §3's size/MIME invariants. `expiresAt`
    /// is set to upload+30 days on create (extended from the 7-day default) per §3.
    ///
    /// # Errors
    /// Returns [`StoreError::Validation`] if the file exceeds 10 MiB or the MIME
    /// type doesn't begin with `image/`.
    pub fn new(
        request_id: Uuid,
        storage_path: String,
        bucket: String,
        file_name: String,
        file_size: u64,
        mime_type: String,
    ) -> StoreResult<Self> {
        if file_size > MAX_MOCKUP_BYTES {
            return Err(StoreError::Validation(format!(
                "mockup upload exceeds the {MAX_MOCKUP_BYTES}-byte limit"
            )));
        }
        if !mime_type.starts_with("image/") {
            return Err(StoreError::Validation(
                "mockup upload mimeType must start with image/".into(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            request_id,
            storage_path,
            bucket,
            file_name,
            file_size,
            mime_type,
            uploaded_at: now,
            expires_at: now + Duration::days(30),
            analysis_result: None,
            analysis_confidence: None,
            is_processed: false,
        })
    }

    /// Mark the upload processed: store its analysis and reset `expiresAt` to
    /// now+7 days (§3).
    pub fn mark_processed(&mut self, result: serde_json::Value, confidence: f64) {
        self.analysis_result = Some(result);
        self.analysis_confidence = Some(confidence);
        self.is_processed = true;
        self.expires_at = Utc::now() + Duration::days(7);
    }
}

/// §3 `CodebaseProject.indexingStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexingStatus {
    Pending,
    Indexing,
    Completed,
    Failed,
}

/// §3 `CodebaseProject`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodebaseProject {
    pub id: Uuid,
    pub repository_url: String,
    pub repository_branch: String,
    pub repository_type: String,
    pub merkle_root_hash: Option<String>,
    pub total_files: u32,
    pub indexed_files: u32,
    pub total_chunks: u32,
    pub indexing_status: IndexingStatus,
    pub indexing_progress: u8,
    pub languages: HashMap<String, u64>,
    pub frameworks: Vec<String>,
    pub architecture_patterns: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CodebaseProject {
    #[must_use]
    pub fn new(repository_url: String, repository_branch: String, repository_type: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            repository_url,
            repository_branch,
            repository_type,
            merkle_root_hash: None,
            total_files: 0,
            indexed_files: 0,
            total_chunks: 0,
            indexing_status: IndexingStatus::Pending,
            indexing_progress: 0,
            languages: HashMap::new(),
            frameworks: Vec::new(),
            architecture_patterns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether §4.7 Phase 3's "linked and ready" gate is satisfied.
    #[must_use]
    pub fn is_ready_for_retrieval(&self) -> bool {
        matches!(self.indexing_status, IndexingStatus::Completed) && self.total_chunks > 0
    }
}

/// §3 `CodeFile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFile {
    pub id: Uuid,
    pub project_id: Uuid,
    pub file_path: String,
    pub file_hash: String,
    pub file_size: u64,
    pub language: Option<String>,
    pub is_parsed: bool,
    pub parse_error: Option<String>,
}

/// §3 `CodeChunk` as persisted by the store (content + location; the vector
/// itself lives in `prd-vector-data`, keyed by this record's `id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeChunkRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
    pub content_hash: String,
    pub chunk_type: String,
    pub language: String,
    pub symbols: Vec<String>,
    pub imports: Vec<String>,
    pub token_count: u32,
}

/// §3 `CodeEmbedding` metadata (the vector itself is owned by `prd-vector-data`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeEmbeddingRecord {
    pub chunk_id: Uuid,
    pub model: String,
    pub embedding_version: i32,
}

/// §3 `MerkleNode`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleNode {
    pub project_id: Uuid,
    pub node_hash: String,
    pub node_path: String,
    pub is_leaf: bool,
    pub parent_hash: Option<String>,
    pub left_child_hash: Option<String>,
    pub right_child_hash: Option<String>,
    pub file_id: Option<Uuid>,
}

/// §3 `IndexingJob.jobType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    InitialIndex,
    IncrementalUpdate,
    ReIndex,
}

/// §3 `IndexingJob.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

/// §3 `IndexingJob`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingJob {
    pub id: Uuid,
    pub project_id: Uuid,
    pub job_type: JobType,
    pub status: JobStatus,
    pub files_to_process: u32,
    pub files_processed: u32,
    pub chunks_created: u32,
    pub embeddings_generated: u32,
    pub retry_count: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl IndexingJob {
    #[must_use]
    pub fn new(project_id: Uuid, job_type: JobType, max_retries: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            job_type,
            status: JobStatus::Queued,
            files_to_process: 0,
            files_processed: 0,
            chunks_created: 0,
            embeddings_generated: 0,
            retry_count: 0,
            max_retries,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    /// `progress = 100 * filesProcessed / max(filesToProcess, 1)` (§4.2).
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn progress(&self) -> u8 {
        let total = self.files_to_process.max(1);
        ((100 * self.files_processed) / total).min(100) as u8
    }
}

/// §3 PRD↔Codebase Link (many-to-many).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodebaseLink {
    pub prd_request_id: Uuid,
    pub codebase_project_id: Uuid,
    pub linked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prd_common::{Classified, ErrorKind};

    #[test]
    fn critical_priority_requires_long_description() {
        let requester = Requester { id: Uuid::new_v4(), email: None };
        let err = PRDRequest::new(
            "Title".into(),
            "too short".into(),
            Priority::Critical,
            requester,
            Vec::new(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Validation));
    }

    #[test]
    fn progress_matches_status() {
        assert_eq!(RequestStatus::Pending.progress(), 0);
        assert_eq!(RequestStatus::ClarificationNeeded.progress(), 25);
        assert_eq!(RequestStatus::Processing.progress(), 50);
        assert_eq!(RequestStatus::Completed.progress(), 100);
        assert_eq!(RequestStatus::Cancelled.progress(), 0);
    }

    #[test]
    fn terminal_states_never_transition() {
        assert!(!RequestStatus::Completed.can_transition_to(&RequestStatus::Processing));
        assert!(!RequestStatus::Cancelled.can_transition_to(&RequestStatus::Pending));
        assert!(RequestStatus::Pending.can_transition_to(&RequestStatus::Processing));
    }

    #[test]
    fn estimated_read_time_floors_to_one() {
        assert_eq!(DocumentMetadata::estimated_read_time_for(0), 1);
        assert_eq!(DocumentMetadata::estimated_read_time_for(150), 1);
        assert_eq!(DocumentMetadata::estimated_read_time_for(400), 2);
    }

    #[test]
    fn low_confidence_forces_needs_review_tag() {
        let doc = PRDDocument::new(
            Uuid::new_v4(),
            "T".into(),
            "content".into(),
            Vec::new(),
            DocumentMetadata {
                format: "markdown".into(),
                language: "en".into(),
                word_count: 100,
                estimated_read_time: 0,
                tags: Vec::new(),
                attachments: Vec::new(),
            },
            0.5,
            "anthropic".into(),
            None,
        )
        .unwrap();
        assert!(doc.metadata.tags.iter().any(|t| t == "needs-review"));
    }

    #[test]
    fn section_type_matches_nfr_before_functional() {
        assert_eq!(
            SectionType::from_heading("Non-Functional Requirements"),
            SectionType::NonFunctionalRequirements
        );
        assert_eq!(
            SectionType::from_heading("Functional Requirements"),
            SectionType::FunctionalRequirements
        );
        assert_eq!(SectionType::from_heading("Misc Notes"), SectionType::Appendix);
    }

    #[test]
    fn mockup_upload_rejects_oversize_and_non_image() {
        let req = Uuid::new_v4();
        assert!(MockupUpload::new(
            req,
            "p".into(),
            "b".into(),
            "f.png".into(),
            MAX_MOCKUP_BYTES + 1,
            "image/png".into()
        )
        .is_err());
        assert!(
            MockupUpload::new(req, "p".into(), "b".into(), "f.pdf".into(), 100, "application/pdf".into())
                .is_err()
        );
    }
}
