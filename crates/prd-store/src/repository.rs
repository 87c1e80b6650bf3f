//! Postgres-backed implementations of the repository ports in [`crate::traits`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Row};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    CodeChunkRecord, CodeFile, CodebaseLink, CodebaseProject, DocumentMetadata, IndexingJob,
    IndexingStatus, JobStatus, JobType, MerkleNode, MockupUpload, PRDDocument, PRDRequest,
    PRDSection, Priority, Requester, RequestStatus,
};
use crate::pool_manager::PoolManager;
use crate::traits::{
    CodeIndexRepository, CodebaseLinkRepository, CodebaseProjectRepository, IndexingJobRepository,
    MockupRepository, PRDDocumentRepository, PRDRequestRepository, RequestFilter,
};

fn priority_to_str(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "low",
        Priority::Medium => "medium",
        Priority::High => "high",
        Priority::Critical => "critical",
    }
}

fn priority_from_str(value: &str) -> StoreResult<Priority> {
    match value {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        "critical" => Ok(Priority::Critical),
        other => Err(StoreError::Validation(format!("unknown priority {other}"))),
    }
}

fn indexing_status_to_str(status: IndexingStatus) -> &'static str {
    match status {
        IndexingStatus::Pending => "pending",
        IndexingStatus::Indexing => "indexing",
        IndexingStatus::Completed => "completed",
        IndexingStatus::Failed => "failed",
    }
}

fn indexing_status_from_str(value: &str) -> StoreResult<IndexingStatus> {
    match value {
        "pending" => Ok(IndexingStatus::Pending),
        "indexing" => Ok(IndexingStatus::Indexing),
        "completed" => Ok(IndexingStatus::Completed),
        "failed" => Ok(IndexingStatus::Failed),
        other => Err(StoreError::Validation(format!("unknown indexing status {other}"))),
    }
}

fn job_type_to_str(job_type: JobType) -> &'static str {
    match job_type {
        JobType::InitialIndex => "initial_index",
        JobType::IncrementalUpdate => "incremental_update",
        JobType::ReIndex => "re_index",
    }
}

fn job_type_from_str(value: &str) -> StoreResult<JobType> {
    match value {
        "initial_index" => Ok(JobType::InitialIndex),
        "incremental_update" => Ok(JobType::IncrementalUpdate),
        "re_index" => Ok(JobType::ReIndex),
        other => Err(StoreError::Validation(format!("unknown job type {other}"))),
    }
}

fn job_status_to_str(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Queued => "queued",
        JobStatus::Running => "running",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "failed",
    }
}

fn job_status_from_str(value: &str) -> StoreResult<JobStatus> {
    match value {
        "queued" => Ok(JobStatus::Queued),
        "running" => Ok(JobStatus::Running),
        "completed" => Ok(JobStatus::Completed),
        "failed" => Ok(JobStatus::Failed),
        other => Err(StoreError::Validation(format!("unknown job status {other}"))),
    }
}

fn row_to_request(row: &sqlx::postgres::PgRow) -> StoreResult<PRDRequest> {
    let status: Json<RequestStatus> = row.try_get("status")?;
    Ok(PRDRequest {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        priority: priority_from_str(row.try_get::<String, _>("priority")?.as_str())?,
        requester: Requester {
            id: row.try_get("requester_id")?,
            email: row.try_get("requester_email")?,
        },
        mockup_sources: row.try_get("mockup_sources")?,
        preferred_provider: row.try_get("preferred_provider")?,
        status: status.0,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        completed_at: row.try_get("completed_at")?,
        generated_document_id: row.try_get("generated_document_id")?,
    })
}

fn row_to_document(row: &sqlx::postgres::PgRow) -> StoreResult<PRDDocument> {
    let sections: Json<Vec<PRDSection>> = row.try_get("sections")?;
    let metadata: Json<DocumentMetadata> = row.try_get("metadata")?;
    Ok(PRDDocument {
        id: row.try_get("id")?,
        request_id: row.try_get("request_id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        sections: sections.0,
        metadata: metadata.0,
        confidence: row.try_get("confidence")?,
        generated_by: row.try_get("generated_by")?,
        version: u32::try_from(row.try_get::<i32, _>("version")?).unwrap_or(1),
        generated_at: row.try_get("generated_at")?,
        professional_analysis: row.try_get("professional_analysis")?,
    })
}

fn row_to_mockup(row: &sqlx::postgres::PgRow) -> StoreResult<MockupUpload> {
    Ok(MockupUpload {
        id: row.try_get("id")?,
        request_id: row.try_get("request_id")?,
        storage_path: row.try_get("storage_path")?,
        bucket: row.try_get("bucket")?,
        file_name: row.try_get("file_name")?,
        file_size: u64::try_from(row.try_get::<i64, _>("file_size")?).unwrap_or(0),
        mime_type: row.try_get("mime_type")?,
        uploaded_at: row.try_get("uploaded_at")?,
        expires_at: row.try_get("expires_at")?,
        analysis_result: row
            .try_get::<Option<Json<serde_json::Value>>, _>("analysis_result")?
            .map(|j| j.0),
        analysis_confidence: row.try_get("analysis_confidence")?,
        is_processed: row.try_get("is_processed")?,
    })
}

fn row_to_project(row: &sqlx::postgres::PgRow) -> StoreResult<CodebaseProject> {
    let languages: Json<HashMap<String, u64>> = row.try_get("languages")?;
    let frameworks: Json<Vec<String>> = row.try_get("frameworks")?;
    let patterns: Json<Vec<String>> = row.try_get("architecture_patterns")?;
    Ok(CodebaseProject {
        id: row.try_get("id")?,
        repository_url: row.try_get("repository_url")?,
        repository_branch: row.try_get("repository_branch")?,
        repository_type: row.try_get("repository_type")?,
        merkle_root_hash: row.try_get("merkle_root_hash")?,
        total_files: u32::try_from(row.try_get::<i32, _>("total_files")?).unwrap_or(0),
        indexed_files: u32::try_from(row.try_get::<i32, _>("indexed_files")?).unwrap_or(0),
        total_chunks: u32::try_from(row.try_get::<i32, _>("total_chunks")?).unwrap_or(0),
        indexing_status: indexing_status_from_str(
            row.try_get::<String, _>("indexing_status")?.as_str(),
        )?,
        indexing_progress: u8::try_from(row.try_get::<i16, _>("indexing_progress")?).unwrap_or(0),
        languages: languages.0,
        frameworks: frameworks.0,
        architecture_patterns: patterns.0,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_job(row: &sqlx::postgres::PgRow) -> StoreResult<IndexingJob> {
    Ok(IndexingJob {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        job_type: job_type_from_str(row.try_get::<String, _>("job_type")?.as_str())?,
        status: job_status_from_str(row.try_get::<String, _>("status")?.as_str())?,
        files_to_process: u32::try_from(row.try_get::<i32, _>("files_to_process")?).unwrap_or(0),
        files_processed: u32::try_from(row.try_get::<i32, _>("files_processed")?).unwrap_or(0),
        chunks_created: u32::try_from(row.try_get::<i32, _>("chunks_created")?).unwrap_or(0),
        embeddings_generated: u32::try_from(row.try_get::<i32, _>("embeddings_generated")?)
            .unwrap_or(0),
        retry_count: u32::try_from(row.try_get::<i32, _>("retry_count")?).unwrap_or(0),
        max_retries: u32::try_from(row.try_get::<i32, _>("max_retries")?).unwrap_or(3),
        created_at: row.try_get("created_at")?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        error: row.try_get("error")?,
    })
}

/// Postgres-backed implementation of every repository port, split across
/// [`PoolManager`]'s write/read/analytics pools.
pub struct PgStore {
    pools: PoolManager,
}

impl PgStore {
    #[must_use]
    pub const fn new(pools: PoolManager) -> Self {
        Self { pools }
    }
}

#[async_trait]
impl PRDRequestRepository for PgStore {
    async fn create(&self, request: PRDRequest) -> StoreResult<PRDRequest> {
        sqlx::query(
            "insert into prd_requests
                (id, title, description, priority, requester_id, requester_email,
                 mockup_sources, preferred_provider, status_code, status,
                 created_at, updated_at, completed_at, generated_document_id)
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(request.id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(priority_to_str(request.priority))
        .bind(request.requester.id)
        .bind(&request.requester.email)
        .bind(&request.mockup_sources)
        .bind(&request.preferred_provider)
        .bind(request.status.code())
        .bind(Json(&request.status))
        .bind(request.created_at)
        .bind(request.updated_at)
        .bind(request.completed_at)
        .bind(request.generated_document_id)
        .execute(self.pools.write_pool())
        .await?;
        Ok(request)
    }

    async fn get(&self, id: Uuid) -> StoreResult<PRDRequest> {
        let row = sqlx::query("select * from prd_requests where id = $1")
            .bind(id)
            .fetch_optional(self.pools.read_pool())
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("PRDRequest {id}")))?;
        row_to_request(&row)
    }

    async fn list(&self, filter: &RequestFilter) -> StoreResult<Vec<PRDRequest>> {
        let mut builder = QueryBuilder::new("select * from prd_requests where 1 = 1");
        if let Some(requester_id) = filter.requester_id {
            builder.push(" and requester_id = ").push_bind(requester_id);
        }
        if let Some(status_code) = filter.status_code {
            builder.push(" and status_code = ").push_bind(status_code);
        }
        builder.push(" order by created_at desc");
        let rows = builder.build().fetch_all(self.pools.read_pool()).await?;
        rows.iter().map(row_to_request).collect()
    }

    async fn update_status(&self, id: Uuid, status: RequestStatus) -> StoreResult<PRDRequest> {
        let mut tx = self.pools.write_pool().begin().await?;
        let row = sqlx::query("select * from prd_requests where id = $1 for update")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("PRDRequest {id}")))?;
        let current = row_to_request(&row)?;
        if !current.status.can_transition_to(&status) {
            return Err(StoreError::BusinessRule(format!(
                "cannot transition request {id} from {:?} to {status:?}",
                current.status
            )));
        }
        sqlx::query(
            "update prd_requests set status_code = $2, status = $3, updated_at = $4 where id = $1",
        )
        .bind(id)
        .bind(status.code())
        .bind(Json(&status))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        self.get(id).await
    }

    async fn complete(&self, id: Uuid, document_id: Uuid) -> StoreResult<PRDRequest> {
        let current = self.get(id).await?;
        if !current.status.can_transition_to(&RequestStatus::Completed) {
            return Err(StoreError::BusinessRule(format!(
                "cannot complete request {id} from {:?}",
                current.status
            )));
        }
        let now = Utc::now();
        sqlx::query(
            "update prd_requests
             set status_code = $2, status = $3, generated_document_id = $4,
                 updated_at = $5, completed_at = $5
             where id = $1",
        )
        .bind(id)
        .bind(RequestStatus::Completed.code())
        .bind(Json(&RequestStatus::Completed))
        .bind(document_id)
        .bind(now)
        .execute(self.pools.write_pool())
        .await?;
        self.get(id).await
    }
}

#[async_trait]
impl PRDDocumentRepository for PgStore {
    async fn create(&self, document: PRDDocument) -> StoreResult<PRDDocument> {
        sqlx::query(
            "insert into prd_documents
                (id, request_id, title, content, sections, metadata, confidence,
                 generated_by, version, generated_at, professional_analysis)
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(document.id)
        .bind(document.request_id)
        .bind(&document.title)
        .bind(&document.content)
        .bind(Json(&document.sections))
        .bind(Json(&document.metadata))
        .bind(document.confidence)
        .bind(&document.generated_by)
        .bind(i32::try_from(document.version).unwrap_or(i32::MAX))
        .bind(document.generated_at)
        .bind(&document.professional_analysis)
        .execute(self.pools.write_pool())
        .await?;
        Ok(document)
    }

    async fn get(&self, id: Uuid) -> StoreResult<PRDDocument> {
        let row = sqlx::query("select * from prd_documents where id = $1")
            .bind(id)
            .fetch_optional(self.pools.read_pool())
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("PRDDocument {id}")))?;
        row_to_document(&row)
    }

    async fn get_by_request(&self, request_id: Uuid) -> StoreResult<PRDDocument> {
        let row = sqlx::query(
            "select * from prd_documents where request_id = $1 order by version desc limit 1",
        )
        .bind(request_id)
        .fetch_optional(self.pools.read_pool())
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("PRDDocument for request {request_id}")))?;
        row_to_document(&row)
    }

    async fn create_revision(&self, mut document: PRDDocument) -> StoreResult<PRDDocument> {
        let previous = self.get(document.id).await?;
        document.version = previous.version.saturating_add(1);
        document.id = Uuid::new_v4();
        self.create(document).await
    }
}

#[async_trait]
impl MockupRepository for PgStore {
    async fn create(&self, upload: MockupUpload) -> StoreResult<MockupUpload> {
        sqlx::query(
            "insert into mockup_uploads
                (id, request_id, storage_path, bucket, file_name, file_size, mime_type,
                 uploaded_at, expires_at, analysis_result, analysis_confidence, is_processed)
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(upload.id)
        .bind(upload.request_id)
        .bind(&upload.storage_path)
        .bind(&upload.bucket)
        .bind(&upload.file_name)
        .bind(i64::try_from(upload.file_size).unwrap_or(i64::MAX))
        .bind(&upload.mime_type)
        .bind(upload.uploaded_at)
        .bind(upload.expires_at)
        .bind(upload.analysis_result.clone().map(Json))
        .bind(upload.analysis_confidence)
        .bind(upload.is_processed)
        .execute(self.pools.write_pool())
        .await?;
        Ok(upload)
    }

    async fn get(&self, id: Uuid) -> StoreResult<MockupUpload> {
        let row = sqlx::query("select * from mockup_uploads where id = $1")
            .bind(id)
            .fetch_optional(self.pools.read_pool())
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("MockupUpload {id}")))?;
        row_to_mockup(&row)
    }

    async fn get_for_request(&self, request_id: Uuid) -> StoreResult<Vec<MockupUpload>> {
        let rows = sqlx::query("select * from mockup_uploads where request_id = $1")
            .bind(request_id)
            .fetch_all(self.pools.read_pool())
            .await?;
        rows.iter().map(row_to_mockup).collect()
    }

    async fn mark_processed(
        &self,
        id: Uuid,
        analysis_result: serde_json::Value,
        confidence: f64,
    ) -> StoreResult<MockupUpload> {
        sqlx::query(
            "update mockup_uploads
             set analysis_result = $2, analysis_confidence = $3, is_processed = true,
                 expires_at = $4
             where id = $1",
        )
        .bind(id)
        .bind(Json(&analysis_result))
        .bind(confidence)
        .bind(Utc::now() + chrono::Duration::days(7))
        .execute(self.pools.write_pool())
        .await?;
        self.get(id).await
    }

    async fn delete_expired(&self) -> StoreResult<u64> {
        let result = sqlx::query("delete from mockup_uploads where expires_at < now()")
            .execute(self.pools.write_pool())
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CodebaseProjectRepository for PgStore {
    async fn create(&self, project: CodebaseProject) -> StoreResult<CodebaseProject> {
        sqlx::query(
            "insert into codebase_projects
                (id, repository_url, repository_branch, repository_type, merkle_root_hash,
                 total_files, indexed_files, total_chunks, indexing_status, indexing_progress,
                 languages, frameworks, architecture_patterns, created_at, updated_at)
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(project.id)
        .bind(&project.repository_url)
        .bind(&project.repository_branch)
        .bind(&project.repository_type)
        .bind(&project.merkle_root_hash)
        .bind(i32::try_from(project.total_files).unwrap_or(i32::MAX))
        .bind(i32::try_from(project.indexed_files).unwrap_or(i32::MAX))
        .bind(i32::try_from(project.total_chunks).unwrap_or(i32::MAX))
        .bind(indexing_status_to_str(project.indexing_status))
        .bind(i16::from(project.indexing_progress))
        .bind(Json(&project.languages))
        .bind(Json(&project.frameworks))
        .bind(Json(&project.architecture_patterns))
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(self.pools.write_pool())
        .await?;
        Ok(project)
    }

    async fn get(&self, id: Uuid) -> StoreResult<CodebaseProject> {
        let row = sqlx::query("select * from codebase_projects where id = $1")
            .bind(id)
            .fetch_optional(self.pools.read_pool())
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("CodebaseProject {id}")))?;
        row_to_project(&row)
    }

    async fn get_by_repository(
        &self,
        repository_url: &str,
        branch: &str,
    ) -> StoreResult<Option<CodebaseProject>> {
        let row = sqlx::query(
            "select * from codebase_projects where repository_url = $1 and repository_branch = $2",
        )
        .bind(repository_url)
        .bind(branch)
        .fetch_optional(self.pools.read_pool())
        .await?;
        row.as_ref().map(row_to_project).transpose()
    }

    async fn update(&self, mut project: CodebaseProject) -> StoreResult<CodebaseProject> {
        project.updated_at = Utc::now();
        let result = sqlx::query(
            "update codebase_projects set
                merkle_root_hash = $2, total_files = $3, indexed_files = $4, total_chunks = $5,
                indexing_status = $6, indexing_progress = $7, languages = $8, frameworks = $9,
                architecture_patterns = $10, updated_at = $11
             where id = $1",
        )
        .bind(project.id)
        .bind(&project.merkle_root_hash)
        .bind(i32::try_from(project.total_files).unwrap_or(i32::MAX))
        .bind(i32::try_from(project.indexed_files).unwrap_or(i32::MAX))
        .bind(i32::try_from(project.total_chunks).unwrap_or(i32::MAX))
        .bind(indexing_status_to_str(project.indexing_status))
        .bind(i16::from(project.indexing_progress))
        .bind(Json(&project.languages))
        .bind(Json(&project.frameworks))
        .bind(Json(&project.architecture_patterns))
        .bind(project.updated_at)
        .execute(self.pools.write_pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("CodebaseProject {}", project.id)));
        }
        Ok(project)
    }
}

#[async_trait]
impl CodeIndexRepository for PgStore {
    async fn upsert_file(&self, file: CodeFile) -> StoreResult<CodeFile> {
        sqlx::query(
            "insert into code_files (project_id, file_path, id, file_hash, file_size, language, is_parsed, parse_error)
             values ($1, $2, $3, $4, $5, $6, $7, $8)
             on conflict (project_id, file_path) do update set
                id = excluded.id, file_hash = excluded.file_hash, file_size = excluded.file_size,
                language = excluded.language, is_parsed = excluded.is_parsed,
                parse_error = excluded.parse_error",
        )
        .bind(file.project_id)
        .bind(&file.file_path)
        .bind(file.id)
        .bind(&file.file_hash)
        .bind(i64::try_from(file.file_size).unwrap_or(i64::MAX))
        .bind(&file.language)
        .bind(file.is_parsed)
        .bind(&file.parse_error)
        .execute(self.pools.write_pool())
        .await?;
        Ok(file)
    }

    async fn get_file(&self, project_id: Uuid, file_path: &str) -> StoreResult<Option<CodeFile>> {
        let row = sqlx::query("select * from code_files where project_id = $1 and file_path = $2")
            .bind(project_id)
            .bind(file_path)
            .fetch_optional(self.pools.read_pool())
            .await?;
        row.map(|r| {
            Ok(CodeFile {
                id: r.try_get("id")?,
                project_id: r.try_get("project_id")?,
                file_path: r.try_get("file_path")?,
                file_hash: r.try_get("file_hash")?,
                file_size: u64::try_from(r.try_get::<i64, _>("file_size")?).unwrap_or(0),
                language: r.try_get("language")?,
                is_parsed: r.try_get("is_parsed")?,
                parse_error: r.try_get("parse_error")?,
            })
        })
        .transpose()
    }

    async fn list_files(&self, project_id: Uuid) -> StoreResult<Vec<CodeFile>> {
        let rows = sqlx::query("select * from code_files where project_id = $1")
            .bind(project_id)
            .fetch_all(self.pools.read_pool())
            .await?;
        rows.iter()
            .map(|r| {
                Ok(CodeFile {
                    id: r.try_get("id")?,
                    project_id: r.try_get("project_id")?,
                    file_path: r.try_get("file_path")?,
                    file_hash: r.try_get("file_hash")?,
                    file_size: u64::try_from(r.try_get::<i64, _>("file_size")?).unwrap_or(0),
                    language: r.try_get("language")?,
                    is_parsed: r.try_get("is_parsed")?,
                    parse_error: r.try_get("parse_error")?,
                })
            })
            .collect()
    }

    async fn delete_file(&self, project_id: Uuid, file_path: &str) -> StoreResult<()> {
        let mut tx = self.pools.write_pool().begin().await?;
        sqlx::query("delete from code_chunks where project_id = $1 and file_path = $2")
            .bind(project_id)
            .bind(file_path)
            .execute(&mut *tx)
            .await?;
        sqlx::query("delete from code_files where project_id = $1 and file_path = $2")
            .bind(project_id)
            .bind(file_path)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace_chunks(
        &self,
        project_id: Uuid,
        file_path: &str,
        chunks: Vec<CodeChunkRecord>,
    ) -> StoreResult<Vec<Uuid>> {
        let mut tx = self.pools.write_pool().begin().await?;
        let removed: Vec<Uuid> = sqlx::query_scalar(
            "delete from code_chunks where project_id = $1 and file_path = $2 returning id",
        )
        .bind(project_id)
        .bind(file_path)
        .fetch_all(&mut *tx)
        .await?;
        for chunk in &chunks {
            sqlx::query(
                "insert into code_chunks
                    (id, project_id, file_path, start_line, end_line, content, content_hash,
                     chunk_type, language, symbols, imports, token_count)
                 values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            )
            .bind(chunk.id)
            .bind(chunk.project_id)
            .bind(&chunk.file_path)
            .bind(i32::try_from(chunk.start_line).unwrap_or(0))
            .bind(i32::try_from(chunk.end_line).unwrap_or(0))
            .bind(&chunk.content)
            .bind(&chunk.content_hash)
            .bind(&chunk.chunk_type)
            .bind(&chunk.language)
            .bind(Json(&chunk.symbols))
            .bind(Json(&chunk.imports))
            .bind(i32::try_from(chunk.token_count).unwrap_or(0))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(removed)
    }

    async fn get_chunks(&self, project_id: Uuid, file_path: &str) -> StoreResult<Vec<CodeChunkRecord>> {
        let rows = sqlx::query(
            "select * from code_chunks where project_id = $1 and file_path = $2 order by start_line",
        )
        .bind(project_id)
        .bind(file_path)
        .fetch_all(self.pools.read_pool())
        .await?;
        rows.iter()
            .map(|r| {
                let symbols: Json<Vec<String>> = r.try_get("symbols")?;
                let imports: Json<Vec<String>> = r.try_get("imports")?;
                Ok(CodeChunkRecord {
                    id: r.try_get("id")?,
                    project_id: r.try_get("project_id")?,
                    file_path: r.try_get("file_path")?,
                    start_line: u32::try_from(r.try_get::<i32, _>("start_line")?).unwrap_or(0),
                    end_line: u32::try_from(r.try_get::<i32, _>("end_line")?).unwrap_or(0),
                    content: r.try_get("content")?,
                    content_hash: r.try_get("content_hash")?,
                    chunk_type: r.try_get("chunk_type")?,
                    language: r.try_get("language")?,
                    symbols: symbols.0,
                    imports: imports.0,
                    token_count: u32::try_from(r.try_get::<i32, _>("token_count")?).unwrap_or(0),
                })
            })
            .collect()
    }

    async fn chunk_count(&self, project_id: Uuid) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("select count(*) from code_chunks where project_id = $1")
            .bind(project_id)
            .fetch_one(self.pools.analytics_pool())
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn upsert_merkle_node(&self, node: MerkleNode) -> StoreResult<()> {
        sqlx::query(
            "insert into merkle_nodes
                (project_id, node_hash, node_path, is_leaf, parent_hash, left_child_hash,
                 right_child_hash, file_id)
             values ($1, $2, $3, $4, $5, $6, $7, $8)
             on conflict (project_id, node_path) do update set
                node_hash = excluded.node_hash, is_leaf = excluded.is_leaf,
                parent_hash = excluded.parent_hash, left_child_hash = excluded.left_child_hash,
                right_child_hash = excluded.right_child_hash, file_id = excluded.file_id",
        )
        .bind(node.project_id)
        .bind(&node.node_hash)
        .bind(&node.node_path)
        .bind(node.is_leaf)
        .bind(&node.parent_hash)
        .bind(&node.left_child_hash)
        .bind(&node.right_child_hash)
        .bind(node.file_id)
        .execute(self.pools.write_pool())
        .await?;
        Ok(())
    }

    async fn get_merkle_root(&self, project_id: Uuid) -> StoreResult<Option<MerkleNode>> {
        let row = sqlx::query(
            "select * from merkle_nodes where project_id = $1 and parent_hash is null limit 1",
        )
        .bind(project_id)
        .fetch_optional(self.pools.read_pool())
        .await?;
        row.map(|r| {
            Ok(MerkleNode {
                project_id: r.try_get("project_id")?,
                node_hash: r.try_get("node_hash")?,
                node_path: r.try_get("node_path")?,
                is_leaf: r.try_get("is_leaf")?,
                parent_hash: r.try_get("parent_hash")?,
                left_child_hash: r.try_get("left_child_hash")?,
                right_child_hash: r.try_get("right_child_hash")?,
                file_id: r.try_get("file_id")?,
            })
        })
        .transpose()
    }

    async fn get_merkle_leaves(&self, project_id: Uuid) -> StoreResult<Vec<MerkleNode>> {
        let rows = sqlx::query("select * from merkle_nodes where project_id = $1 and is_leaf")
            .bind(project_id)
            .fetch_all(self.pools.read_pool())
            .await?;
        rows.iter()
            .map(|r| {
                Ok(MerkleNode {
                    project_id: r.try_get("project_id")?,
                    node_hash: r.try_get("node_hash")?,
                    node_path: r.try_get("node_path")?,
                    is_leaf: r.try_get("is_leaf")?,
                    parent_hash: r.try_get("parent_hash")?,
                    left_child_hash: r.try_get("left_child_hash")?,
                    right_child_hash: r.try_get("right_child_hash")?,
                    file_id: r.try_get("file_id")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl IndexingJobRepository for PgStore {
    async fn create(&self, job: IndexingJob) -> StoreResult<IndexingJob> {
        sqlx::query(
            "insert into indexing_jobs
                (id, project_id, job_type, status, files_to_process, files_processed,
                 chunks_created, embeddings_generated, retry_count, max_retries,
                 created_at, started_at, completed_at, error)
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(job.id)
        .bind(job.project_id)
        .bind(job_type_to_str(job.job_type))
        .bind(job_status_to_str(job.status))
        .bind(i32::try_from(job.files_to_process).unwrap_or(0))
        .bind(i32::try_from(job.files_processed).unwrap_or(0))
        .bind(i32::try_from(job.chunks_created).unwrap_or(0))
        .bind(i32::try_from(job.embeddings_generated).unwrap_or(0))
        .bind(i32::try_from(job.retry_count).unwrap_or(0))
        .bind(i32::try_from(job.max_retries).unwrap_or(3))
        .bind(job.created_at)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(&job.error)
        .execute(self.pools.write_pool())
        .await?;
        Ok(job)
    }

    async fn get(&self, id: Uuid) -> StoreResult<IndexingJob> {
        let row = sqlx::query("select * from indexing_jobs where id = $1")
            .bind(id)
            .fetch_optional(self.pools.read_pool())
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("IndexingJob {id}")))?;
        row_to_job(&row)
    }

    async fn update(&self, job: IndexingJob) -> StoreResult<IndexingJob> {
        let result = sqlx::query(
            "update indexing_jobs set
                status = $2, files_to_process = $3, files_processed = $4, chunks_created = $5,
                embeddings_generated = $6, retry_count = $7, started_at = $8, completed_at = $9,
                error = $10
             where id = $1",
        )
        .bind(job.id)
        .bind(job_status_to_str(job.status))
        .bind(i32::try_from(job.files_to_process).unwrap_or(0))
        .bind(i32::try_from(job.files_processed).unwrap_or(0))
        .bind(i32::try_from(job.chunks_created).unwrap_or(0))
        .bind(i32::try_from(job.embeddings_generated).unwrap_or(0))
        .bind(i32::try_from(job.retry_count).unwrap_or(0))
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(&job.error)
        .execute(self.pools.write_pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("IndexingJob {}", job.id)));
        }
        Ok(job)
    }

    async fn latest_for_project(&self, project_id: Uuid) -> StoreResult<Option<IndexingJob>> {
        let row = sqlx::query(
            "select * from indexing_jobs where project_id = $1 order by created_at desc limit 1",
        )
        .bind(project_id)
        .fetch_optional(self.pools.read_pool())
        .await?;
        row.as_ref().map(row_to_job).transpose()
    }

    async fn has_active_job(&self, project_id: Uuid) -> StoreResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "select count(*) from indexing_jobs
             where project_id = $1 and status in ('queued', 'running')",
        )
        .bind(project_id)
        .fetch_one(self.pools.read_pool())
        .await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl CodebaseLinkRepository for PgStore {
    async fn link(&self, prd_request_id: Uuid, codebase_project_id: Uuid) -> StoreResult<CodebaseLink> {
        let linked_at: DateTime<Utc> = sqlx::query_scalar(
            "insert into codebase_links (prd_request_id, codebase_project_id)
             values ($1, $2)
             returning linked_at",
        )
        .bind(prd_request_id)
        .bind(codebase_project_id)
        .fetch_one(self.pools.write_pool())
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(format!(
                "request {prd_request_id} is already linked to project {codebase_project_id}"
            )),
            other => StoreError::Sqlx(other),
        })?;
        Ok(CodebaseLink { prd_request_id, codebase_project_id, linked_at })
    }

    async fn unlink(&self, prd_request_id: Uuid, codebase_project_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            "delete from codebase_links where prd_request_id = $1 and codebase_project_id = $2",
        )
        .bind(prd_request_id)
        .bind(codebase_project_id)
        .execute(self.pools.write_pool())
        .await?;
        Ok(())
    }

    async fn projects_for_request(&self, prd_request_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar(
            "select codebase_project_id from codebase_links where prd_request_id = $1",
        )
        .bind(prd_request_id)
        .fetch_all(self.pools.read_pool())
        .await?;
        Ok(ids)
    }
}
