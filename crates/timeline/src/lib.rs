//! Production Timeline (Layer 2)
//!
//! Timeline assembly, action dispatch, kanban view-model and completion
//! estimates for a referencia.

#![warn(missing_docs)]

pub mod assembler;
pub mod config;
pub mod error;
pub mod estimator;
pub mod kanban;

pub use assembler::{TimelineAssembler, assemble_timeline};
pub use config::TimelineConfig;
pub use error::{TimelineError, ConfigError};
pub use estimator::CompletionEstimator;
pub use kanban::{KanbanPhase, KanbanViewModel};
