//! AutoPress - Asynchronous AI Article Generation Pipeline
//!
//! Defers slow, failure-prone text and image generation to background tasks,
//! persists job status for polling, recovers structured JSON from unreliable
//! model output, and accounts token usage/cost per call.
//!
//! ## Core Features
//!
//! - **Job Queue**: fire-and-forget dispatch with a polling status accessor
//! - **TTL Status Store**: short-retention records; expired jobs report as such
//! - **JSON Recovery**: shortest-valid-candidate extraction from noisy output
//! - **Non-fatal Illustration**: image failures never sink a textual result
//! - **Usage Accounting**: append-only cost log with paginated reporting
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use autopress::{
//!     Config, ContentGenerator, FsMediaStore, GenerationRequest, ImageGenerator,
//!     InMemoryStatusStore, JobQueue, UsageTracker,
//! };
//!
//! let config = Arc::new(Config::default());
//! let usage = Arc::new(UsageTracker::open(&config.usage.db_path)?);
//! let generator = Arc::new(ContentGenerator::new(config.clone(), usage.clone())?);
//! let queue = JobQueue::new(
//!     Arc::new(InMemoryStatusStore::new()),
//!     generator,
//!     None,
//!     Duration::from_secs(config.queue.job_ttl_secs),
//! );
//!
//! let job_id = queue.dispatch(GenerationRequest::default())?;
//! // ... poll queue.status(&job_id) until terminal
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: HTTP clients, JSON recovery, prompts, timeout scaling
//! - [`generator`]: request resolution, normalization, safe-HTML policy
//! - [`queue`]: job queue and TTL status store
//! - [`usage`]: cost estimation and the append-only usage log
//! - [`publish`]: content-repository collaborator interface
//! - [`config`]: immutable configuration and loader

pub mod ai;
pub mod config;
pub mod constants;
pub mod generator;
pub mod publish;
pub mod queue;
pub mod types;
pub mod usage;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::{AutopressError, Result};

// Domain Types
pub use types::{GeneratedContent, GenerationRequest, JobId, JobRecord};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use ai::{ChatClient, GenerateImage, ImageGenerator, extract_json, request_timeout};
pub use generator::{ContentGenerator, GenerateArticle, normalize, resolve_request};
pub use publish::{ContentRepository, DocumentDraft, DocumentStatus, FsMediaStore};
pub use queue::{InMemoryStatusStore, JobQueue, StatusStore};
pub use usage::{DateRange, UsageReport, UsageTracker, estimate_cost};
