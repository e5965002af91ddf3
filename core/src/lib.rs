pub mod check;
pub mod completion;
pub mod config;
pub mod diag;
pub mod engine;
pub mod event;
pub mod lang;
pub mod orchestrator;
pub mod params;
pub mod scope;
pub mod text;
pub mod util;

// Debounced background validation and the per-buffer session on top of it
pub mod scheduler;
pub mod session;

pub use completion::{CompletionCandidate, CompletionKind, CompletionProvider, apply_completion};
pub use config::AnalysisConfig;
pub use diag::{Diagnostic, DiagnosticSource, Severity};
pub use event::{EventBus, SessionEvent};
pub use orchestrator::{Orchestrator, ValidationReport};
pub use params::{ParameterDefinition, ParameterType};
pub use scheduler::{RevalidationScheduler, SchedulerState};
pub use session::EditorSession;
