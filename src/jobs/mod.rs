//! Background generation jobs: the process-wide registry and its progress
//! event stream.
//!
//! A pipeline run is *fire-and-forget*: the triggering call returns a
//! [`JobId`] immediately and the run continues on its own task. The only way
//! to observe it is through [`JobRegistry::get`] or a [`ProgressStream`].
//!
//! Job state is process-lifetime only. The table starts empty at process
//! start and a restart loses every in-flight job; a durable, crash-recoverable
//! job store is explicitly out of scope for this core.

pub mod progress;
pub mod registry;

pub use progress::{ProgressEvent, ProgressStream};
pub use registry::{JobError, JobId, JobRegistry, JobSnapshot};
