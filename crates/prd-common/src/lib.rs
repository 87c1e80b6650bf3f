//! Common utilities and patterns shared across the PRD builder's crates
//!
//! This crate provides shared functionality to reduce duplication across
//! the store, indexer, retriever, mockup analyzer, context pipeline,
//! provider orchestrator, engine, and session components.

pub mod error;
pub mod error_sanitizer;
pub mod init;
pub mod tracing;

pub use error::{Classified, CommonError, ErrorContext, ErrorKind};
pub use tracing::CorrelationId;
