//! Voice restyling pipeline.
//!
//! Three sequential stages composed by [`Pipeline`]: speech recognition on
//! normalized audio, persona rewriting, and speech synthesis drained from a
//! live stream. The first failing stage aborts the run and is named in the
//! returned [`StageError`](crate::error::StageError).

pub mod orchestrator;

pub use orchestrator::{Pipeline, PipelineConfig, RunOutput, StageResult};
