//! Job Queue
//!
//! Decouples slow generation work from the caller's request/response cycle.
//! `dispatch` mints a job id, writes a `processing` record to the TTL store,
//! and hands the work to a background worker over a channel; the caller polls
//! `status` until a terminal record appears.
//!
//! ## Failure semantics
//!
//! Text-generation failure ends the job with an `error` record. Image
//! trouble of any kind is captured on the payload (`image_preview_error`)
//! without failing the job: a textual result without an illustration is a
//! valid completion. The job future runs under `catch_unwind`, so even a
//! panic becomes an `error` record rather than a permanently `processing`
//! job; the record TTL bounds how long a lost job stays observable at all.

pub mod store;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::ai::GenerateImage;
use crate::constants::queue as queue_constants;
use crate::generator::GenerateArticle;
use crate::types::{AutopressError, GenerationRequest, JobId, JobRecord, Result};

pub use store::{InMemoryStatusStore, StatusStore};

struct JobTask {
    job_id: JobId,
    request: GenerationRequest,
}

/// Shared context each job task runs with.
#[derive(Clone)]
struct Worker {
    store: Arc<dyn StatusStore>,
    generator: Arc<dyn GenerateArticle>,
    /// `None` when illustration is disabled by configuration
    image: Option<Arc<dyn GenerateImage>>,
    ttl: Duration,
}

/// Asynchronous generation queue with a polling status accessor.
pub struct JobQueue {
    store: Arc<dyn StatusStore>,
    tx: mpsc::UnboundedSender<JobTask>,
    ttl: Duration,
}

impl JobQueue {
    /// Start the queue's worker loop on the current runtime.
    ///
    /// Pass `image: None` to disable illustration; the image endpoint is
    /// then never contacted regardless of what prompts articles carry.
    pub fn new(
        store: Arc<dyn StatusStore>,
        generator: Arc<dyn GenerateArticle>,
        image: Option<Arc<dyn GenerateImage>>,
        job_ttl: Duration,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<JobTask>();

        let worker = Worker {
            store: Arc::clone(&store),
            generator,
            image,
            ttl: job_ttl,
        };

        tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                let worker = worker.clone();
                tokio::spawn(async move {
                    let job_id = task.job_id.clone();
                    let outcome =
                        AssertUnwindSafe(worker.process(task)).catch_unwind().await;
                    if outcome.is_err() {
                        error!(job_id = %job_id, "Generation task panicked");
                        worker.store.put(
                            &job_id,
                            JobRecord::Error {
                                code: "internal_error".to_string(),
                                message: "generation task aborted unexpectedly".to_string(),
                            },
                            worker.ttl,
                        );
                    }
                });
            }
        });

        Self { store, tx, ttl: job_ttl }
    }

    /// Accept a generation request and return the id to poll.
    ///
    /// Returns immediately; only a stopped worker loop is a hard error.
    pub fn dispatch(&self, request: GenerationRequest) -> Result<JobId> {
        let job_id = format!(
            "{}{}",
            queue_constants::JOB_ID_PREFIX,
            Uuid::new_v4().simple()
        );

        self.store.put(&job_id, JobRecord::Processing, self.ttl);

        self.tx
            .send(JobTask {
                job_id: job_id.clone(),
                request,
            })
            .map_err(|_| {
                AutopressError::QueueClosed("background worker is not running".to_string())
            })?;

        info!(job_id = %job_id, "Dispatched generation job");
        Ok(job_id)
    }

    /// Current status of a job. Safe to call repeatedly; never blocks.
    ///
    /// An id the store no longer holds (expired, or never dispatched) yields
    /// an error record with code `expired`, distinct from generation errors.
    pub fn status(&self, job_id: &str) -> JobRecord {
        self.store.get(job_id).unwrap_or_else(JobRecord::expired)
    }
}

impl Worker {
    /// Run one job to its terminal record. Background context only.
    async fn process(&self, task: JobTask) {
        let JobTask { job_id, request } = task;

        let mut content = match self.generator.generate(&request).await {
            Ok(content) => content,
            Err(err) => {
                warn!(job_id = %job_id, "Generation failed: {err}");
                self.store.put(
                    &job_id,
                    JobRecord::Error {
                        code: err.kind(),
                        message: err.to_string(),
                    },
                    self.ttl,
                );
                return;
            }
        };

        if let Some(image) = &self.image
            && !content.image_prompt.is_empty()
        {
            match image.generate(&content.image_prompt).await {
                Ok(Some(url)) => content.image_preview_url = Some(url),
                Ok(None) => {}
                Err(err) => {
                    warn!(job_id = %job_id, "Illustration failed, completing without image: {err}");
                    content.image_preview_error = Some(err.to_string());
                }
            }
        }

        self.store
            .put(&job_id, JobRecord::Completed { data: content }, self.ttl);
        info!(job_id = %job_id, "Job completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeneratedContent;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn article(image_prompt: &str) -> GeneratedContent {
        GeneratedContent {
            title: "Title".to_string(),
            content_html: "<p>Body</p>".to_string(),
            seo_desc: "Desc".to_string(),
            tags: vec!["tag".to_string()],
            image_prompt: image_prompt.to_string(),
            image_preview_url: None,
            image_preview_error: None,
        }
    }

    struct StubGenerator {
        result: std::result::Result<GeneratedContent, String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GenerateArticle for StubGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<GeneratedContent> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(content) => Ok(content.clone()),
                Err(message) => Err(AutopressError::JsonParse(message.clone())),
            }
        }
    }

    struct PanickingGenerator;

    #[async_trait]
    impl GenerateArticle for PanickingGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<GeneratedContent> {
            panic!("stub blew up");
        }
    }

    struct StubImage {
        result: std::result::Result<Option<String>, String>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl GenerateImage for StubImage {
        async fn generate(&self, _prompt: &str) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(url) => Ok(url.clone()),
                Err(message) => Err(AutopressError::InvalidImageResponse(message.clone())),
            }
        }
    }

    async fn wait_terminal(queue: &JobQueue, job_id: &str) -> JobRecord {
        for _ in 0..200 {
            let record = queue.status(job_id);
            if record.is_terminal() {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {job_id} never reached a terminal status");
    }

    #[tokio::test]
    async fn test_successful_job_with_image() {
        let image_calls = Arc::new(AtomicUsize::new(0));
        let queue = JobQueue::new(
            Arc::new(InMemoryStatusStore::new()),
            Arc::new(StubGenerator {
                result: Ok(article("a lighthouse")),
                calls: AtomicUsize::new(0),
            }),
            Some(Arc::new(StubImage {
                result: Ok(Some("https://img.example/a.png".to_string())),
                calls: Arc::clone(&image_calls),
            })),
            Duration::from_secs(60),
        );

        let job_id = queue.dispatch(GenerationRequest::default()).unwrap();
        assert_eq!(queue.status(&job_id), JobRecord::Processing);

        let record = wait_terminal(&queue, &job_id).await;
        match record {
            JobRecord::Completed { data } => {
                assert_eq!(
                    data.image_preview_url.as_deref(),
                    Some("https://img.example/a.png")
                );
                assert!(data.image_preview_error.is_none());
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(image_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_generation_never_calls_image() {
        let image_calls = Arc::new(AtomicUsize::new(0));
        let queue = JobQueue::new(
            Arc::new(InMemoryStatusStore::new()),
            Arc::new(StubGenerator {
                result: Err("no parseable JSON".to_string()),
                calls: AtomicUsize::new(0),
            }),
            Some(Arc::new(StubImage {
                result: Ok(Some("https://img.example/a.png".to_string())),
                calls: Arc::clone(&image_calls),
            })),
            Duration::from_secs(60),
        );

        let job_id = queue.dispatch(GenerationRequest::default()).unwrap();
        let record = wait_terminal(&queue, &job_id).await;

        match record {
            JobRecord::Error { code, .. } => assert_eq!(code, "json_parse_error"),
            other => panic!("expected error, got {other:?}"),
        }
        assert_eq!(image_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_image_error_still_completes() {
        let queue = JobQueue::new(
            Arc::new(InMemoryStatusStore::new()),
            Arc::new(StubGenerator {
                result: Ok(article("a lighthouse")),
                calls: AtomicUsize::new(0),
            }),
            Some(Arc::new(StubImage {
                result: Err("empty result set".to_string()),
                calls: Arc::new(AtomicUsize::new(0)),
            })),
            Duration::from_secs(60),
        );

        let job_id = queue.dispatch(GenerationRequest::default()).unwrap();
        let record = wait_terminal(&queue, &job_id).await;

        match record {
            JobRecord::Completed { data } => {
                assert!(data.image_preview_url.is_none());
                assert!(
                    data.image_preview_error
                        .as_deref()
                        .unwrap()
                        .contains("empty result set")
                );
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_image_prompt_skips_image() {
        let image_calls = Arc::new(AtomicUsize::new(0));
        let queue = JobQueue::new(
            Arc::new(InMemoryStatusStore::new()),
            Arc::new(StubGenerator {
                result: Ok(article("")),
                calls: AtomicUsize::new(0),
            }),
            Some(Arc::new(StubImage {
                result: Ok(None),
                calls: Arc::clone(&image_calls),
            })),
            Duration::from_secs(60),
        );

        let job_id = queue.dispatch(GenerationRequest::default()).unwrap();
        let record = wait_terminal(&queue, &job_id).await;
        assert!(matches!(record, JobRecord::Completed { .. }));
        assert_eq!(image_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_poll_unknown_id_reports_expired() {
        let queue = JobQueue::new(
            Arc::new(InMemoryStatusStore::new()),
            Arc::new(StubGenerator {
                result: Ok(article("")),
                calls: AtomicUsize::new(0),
            }),
            None,
            Duration::from_secs(60),
        );

        match queue.status("job_never_dispatched") {
            JobRecord::Error { code, .. } => assert_eq!(code, "expired"),
            other => panic!("expected expired record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_poll_after_ttl_reports_expired() {
        let queue = JobQueue::new(
            Arc::new(InMemoryStatusStore::new()),
            Arc::new(StubGenerator {
                result: Ok(article("")),
                calls: AtomicUsize::new(0),
            }),
            None,
            Duration::from_millis(50),
        );

        let job_id = queue.dispatch(GenerationRequest::default()).unwrap();
        wait_terminal(&queue, &job_id).await;

        tokio::time::sleep(Duration::from_millis(80)).await;
        match queue.status(&job_id) {
            JobRecord::Error { code, .. } => assert_eq!(code, "expired"),
            other => panic!("expected expired record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_panicking_job_converts_to_error_status() {
        let queue = JobQueue::new(
            Arc::new(InMemoryStatusStore::new()),
            Arc::new(PanickingGenerator),
            None,
            Duration::from_secs(60),
        );

        let job_id = queue.dispatch(GenerationRequest::default()).unwrap();
        let record = wait_terminal(&queue, &job_id).await;

        match record {
            JobRecord::Error { code, .. } => assert_eq!(code, "internal_error"),
            other => panic!("expected error, got {other:?}"),
        }
    }
}
