//! Subcommand bodies. Each function borrows the collaborators built by
//! [`crate::wiring::build`] and performs one CLI-sized unit of work; none of
//! them stream progress (§4.8's `ProgressSink` is for `prd-session`), so they
//! all pass `None` to the engine.

use prd_common::CorrelationId;
use prd_engine::{EngineOutcome, export_document, ExportFormat};
use prd_indexing::IndexOutcome;
use prd_providers::ClarificationAnswer;
use prd_store::models::{PRDRequest, Priority, RequestFilter, Requester};
use uuid::Uuid;

use crate::wiring::Collaborators;

fn parse_priority(raw: &str) -> anyhow::Result<Priority> {
    match raw.to_lowercase().as_str() {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        "critical" => Ok(Priority::Critical),
        other => anyhow::bail!("unknown priority '{other}', expected low|medium|high|critical"),
    }
}

fn parse_export_format(raw: &str) -> anyhow::Result<ExportFormat> {
    match raw.to_lowercase().as_str() {
        "markdown" | "md" => Ok(ExportFormat::Markdown),
        "html" => Ok(ExportFormat::Html),
        "json" => Ok(ExportFormat::Json),
        "pdf" => Ok(ExportFormat::Pdf),
        "docx" => Ok(ExportFormat::Docx),
        other => anyhow::bail!("unknown export format '{other}', expected markdown|html|json|pdf|docx"),
    }
}

/// `prd-builder submit` (§3 `PRDRequest`, §4.7 Phase 1 kickoff).
#[allow(clippy::too_many_arguments)]
pub async fn submit(
    collaborators: &Collaborators,
    title: String,
    description: String,
    priority: &str,
    requester_email: Option<String>,
    mockup_sources: Vec<Uuid>,
    preferred_provider: Option<String>,
) -> anyhow::Result<()> {
    let priority = parse_priority(priority)?;
    let requester = Requester { id: Uuid::new_v4(), email: requester_email };
    let request =
        PRDRequest::new(title, description, priority, requester, mockup_sources, preferred_provider)?;
    let created = collaborators.requests.create(request).await?;
    println!("created request {} (status: {})", created.id, created.status.code());

    match collaborators.engine.run(created.id, None).await? {
        EngineOutcome::NeedsClarification { request_id, questions } => {
            println!("request {request_id} needs clarification:");
            for q in questions {
                println!("  [{:?}] {}", q.priority, q.question);
            }
        }
        EngineOutcome::Generated { request_id, document, provider_used } => {
            println!(
                "request {request_id} generated document {} via {provider_used} (confidence {:.2})",
                document.id, document.confidence
            );
        }
    }
    Ok(())
}

/// `prd-builder resume` (§4.7 Phase 2 resume path).
pub async fn resume(
    collaborators: &Collaborators,
    request_id: Uuid,
    answers: Vec<(String, String)>,
) -> anyhow::Result<()> {
    let answers = answers
        .into_iter()
        .map(|(question, answer)| ClarificationAnswer { question, answer })
        .collect();
    match collaborators.engine.resume(request_id, answers, None).await? {
        EngineOutcome::NeedsClarification { request_id, questions } => {
            println!("request {request_id} still needs clarification:");
            for q in questions {
                println!("  [{:?}] {}", q.priority, q.question);
            }
        }
        EngineOutcome::Generated { request_id, document, provider_used } => {
            println!(
                "request {request_id} generated document {} via {provider_used} (confidence {:.2})",
                document.id, document.confidence
            );
        }
    }
    Ok(())
}

/// `prd-builder status` (§4.1 state machine view).
pub async fn status(collaborators: &Collaborators, request_id: Uuid) -> anyhow::Result<()> {
    let request = collaborators.requests.get(request_id).await?;
    println!(
        "{}: {} ({}%)",
        request.id,
        request.status.code(),
        request.progress()
    );
    if let Some(document_id) = request.generated_document_id {
        println!("document: {document_id}");
    }
    Ok(())
}

/// `prd-builder list` (§3 `PRDRequest` listing, optionally filtered by requester).
pub async fn list(collaborators: &Collaborators, requester_id: Option<Uuid>) -> anyhow::Result<()> {
    let filter = RequestFilter { requester_id, status_code: None };
    let requests = collaborators.requests.list(&filter).await?;
    for request in requests {
        println!("{} [{}] {}", request.id, request.status.code(), request.title);
    }
    Ok(())
}

/// `prd-builder export` (§6 "File formats").
pub async fn export(
    collaborators: &Collaborators,
    request_id: Uuid,
    format: &str,
    out_dir: &std::path::Path,
) -> anyhow::Result<()> {
    let request = collaborators.requests.get(request_id).await?;
    let document_id = request
        .generated_document_id
        .ok_or_else(|| anyhow::anyhow!("request {request_id} has no generated document yet"))?;
    let document = collaborators.documents.get(document_id).await?;
    let format = parse_export_format(format)?;
    let exported = export_document(&document, format)?;
    let path = out_dir.join(&exported.filename);
    std::fs::write(&path, &exported.bytes)?;
    println!("wrote {} ({})", path.display(), exported.content_type);
    Ok(())
}

/// `prd-builder index` (§4.2 "Indexing"): register a repository and run its
/// job synchronously to completion, since there is no standalone worker
/// process in this CLI.
pub async fn index(
    collaborators: &Collaborators,
    repository_url: String,
    branch: String,
    access_token: Option<String>,
) -> anyhow::Result<()> {
    let outcome = collaborators
        .indexer
        .index_repository(repository_url, branch, access_token.clone())
        .await?;
    let job_id = match outcome {
        IndexOutcome::AlreadyIndexed(project) => {
            println!("repository already indexed as project {}", project.id);
            return Ok(());
        }
        IndexOutcome::Scheduled { project, job_id } => {
            println!("scheduled indexing job {job_id} for project {}", project.id);
            job_id
        }
    };
    let job = collaborators.jobs.get(job_id).await?;
    let correlation_id = CorrelationId::new();
    let finished = collaborators.worker.run_job(job, access_token, &correlation_id).await?;
    println!(
        "job {} finished: {:?} ({} files, {} chunks, {} embeddings)",
        finished.id, finished.status, finished.files_processed, finished.chunks_created, finished.embeddings_generated
    );
    Ok(())
}

/// `prd-builder link-codebase` (§3 PRD↔Codebase link).
pub async fn link_codebase(
    collaborators: &Collaborators,
    request_id: Uuid,
    codebase_project_id: Uuid,
) -> anyhow::Result<()> {
    collaborators.codebase_links.link(request_id, codebase_project_id).await?;
    println!("linked request {request_id} to codebase project {codebase_project_id}");
    Ok(())
}
