//! # Storyloom: Generation Orchestration for Long-Form Writing
//!
//! Storyloom is the engine room of a creative-writing service: it runs
//! long, multi-phase AI generation jobs in the background, streams their
//! progress, and guards the mutable documents those jobs and human editors
//! both touch.
//!
//! ## Core Concepts
//!
//! - **Jobs**: process-lifetime tracked runs with progress, message, and a
//!   sticky terminal state
//! - **Pipelines**: strictly sequential phases over an injected synthesizer,
//!   committing durable partial results (bible) or one atomic document
//!   (outline)
//! - **Context compression**: a bounded digest of prior phases keeps prompts
//!   flat no matter how large the generated document grows
//! - **Version guard**: optimistic concurrency on the shared outline —
//!   stale writes are rejected, never merged
//! - **Snapshots**: append-only history of chapter content with rollback
//!
//! ## Quick Start
//!
//! ### Tracking a job
//!
//! ```
//! use storyloom::jobs::JobRegistry;
//!
//! let registry = JobRegistry::new();
//! let job_id = registry.create_job();
//!
//! let job = registry.get(job_id).unwrap();
//! assert_eq!(job.progress, 0);
//! assert!(!job.is_terminal());
//!
//! registry.update(job_id, 40, "Deriving realm tiers...").unwrap();
//! registry.complete(job_id, "World bible complete").unwrap();
//!
//! // Terminal state is sticky: late updates are ignored.
//! registry.update(job_id, 10, "too late").unwrap();
//! assert_eq!(registry.get(job_id).unwrap().progress, 100);
//! ```
//!
//! ### Running a pipeline fire-and-forget
//!
//! ```no_run
//! use std::sync::Arc;
//! use storyloom::config::PipelineConfig;
//! use storyloom::jobs::{JobRegistry, ProgressStream};
//! use storyloom::pipeline::{OutlinePipeline, ProjectBrief};
//! use storyloom::store::MemoryStore;
//! # use storyloom::synthesis::{SynthesisError, SynthesisRequest, Synthesizer};
//! # struct Fake;
//! # #[async_trait::async_trait]
//! # impl Synthesizer for Fake {
//! #     async fn generate(&self, _: SynthesisRequest) -> Result<String, SynthesisError> {
//! #         Ok(r#"{"volume": {"title": "Vol", "chapters": []}}"#.into())
//! #     }
//! # }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let registry = Arc::new(JobRegistry::new());
//! let pipeline = OutlinePipeline::new(
//!     Arc::new(Fake),
//!     Arc::new(MemoryStore::new()),
//!     registry.clone(),
//!     &PipelineConfig::default(),
//! );
//!
//! let brief = ProjectBrief {
//!     project_id: 1,
//!     title: "Ashes of the Clan".into(),
//!     genre: "xianxia".into(),
//!     target_words: 1_000_000,
//!     description: String::new(),
//! };
//!
//! // Returns immediately; progress is observed through the registry.
//! let job_id = pipeline.spawn(brief, None);
//!
//! let stream = ProgressStream::subscribe(registry, job_id, std::time::Duration::from_secs(1));
//! while let Some(event) = stream.recv().await {
//!     print!("{}", event.to_sse_frame());
//! }
//! # }
//! ```
//!
//! ## Module Guide
//!
//! - [`jobs`] - Job registry and polled progress event streams
//! - [`pipeline`] - Bible and outline phase pipelines, context compression
//! - [`synthesis`] - Synthesizer seam and defensive response decoding
//! - [`store`] - Persistence interface with in-memory and SQLite backends
//! - [`documents`] - Guarded outline updates and chapter snapshot service
//! - [`config`] - Environment-backed runtime configuration
//! - [`telemetry`] - Tracing bootstrap for embedders

pub mod config;
pub mod documents;
pub mod jobs;
pub mod pipeline;
pub mod store;
pub mod synthesis;
pub mod telemetry;
