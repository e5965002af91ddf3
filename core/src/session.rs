//! One editor buffer: synchronous scope analysis and completion, debounced background
//! validation, and the outbound event stream.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;

use crate::completion::{CompletionCandidate, CompletionProvider};
use crate::config::AnalysisConfig;
use crate::engine::{EngineProvider, default_provider};
use crate::event::{EventBus, SessionEvent};
use crate::orchestrator::Orchestrator;
use crate::params::ParameterDefinition;
use crate::scheduler::{RevalidationScheduler, SchedulerState, ValidationRequest};
use crate::scope::{ScopeAnalyzer, ScopeTree, build_scope_tree};
use crate::text::floor_char_boundary;

pub struct EditorSession {
    analyzer: ScopeAnalyzer,
    text: Option<Arc<str>>,
    caret: usize,
    parameters: Arc<[ParameterDefinition]>,
    completion: CompletionProvider,
    scheduler: RevalidationScheduler,
    events: Option<EventBus>,
    disposed: bool,
}

impl EditorSession {
    /// Create a session on the current tokio runtime with the built-in engine.
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        Self::with_provider(config, default_provider())
    }

    pub fn with_provider(config: &AnalysisConfig, provider: Arc<dyn EngineProvider>) -> Result<Self> {
        let orchestrator = Arc::new(Orchestrator::new(config, provider));
        let completion = CompletionProvider::new(orchestrator.language().clone(), config.completion.max_items);
        let events = EventBus::default();
        let scheduler = RevalidationScheduler::spawn(orchestrator, events.clone(), config.debounce())?;
        Ok(Self {
            analyzer: ScopeAnalyzer::new(),
            text: None,
            caret: 0,
            parameters: Arc::from(Vec::new()),
            completion,
            scheduler,
            events: Some(events),
            disposed: false,
        })
    }

    /// Record the buffer contents. Unchanged text only moves the caret; changed text rebuilds
    /// the scope tree, announces the visible identifiers and re-arms validation.
    /// Returns whether the text was re-analyzed.
    pub fn analyze(&mut self, text: &str, caret: usize) -> bool {
        if self.disposed {
            return false;
        }
        self.caret = floor_char_boundary(text, caret);
        if self.text.as_deref() == Some(text) {
            return false;
        }

        let (tree, _) = self.analyzer.analyze(text);
        let text: Arc<str> = text.into();
        self.text = Some(text.clone());
        self.publish_context(&tree);
        self.scheduler.schedule(ValidationRequest {
            text,
            scope: tree,
            parameters: self.parameters.clone(),
        });
        true
    }

    /// Replace the host-supplied parameters and revalidate the current text, if any.
    pub fn update_parameters(&mut self, parameters: Vec<ParameterDefinition>) {
        if self.disposed {
            return;
        }
        self.parameters = parameters.into();
        let (Some(text), Some(tree)) = (self.text.clone(), self.analyzer.current()) else {
            return;
        };
        self.publish_context(&tree);
        self.scheduler.schedule(ValidationRequest {
            text,
            scope: tree,
            parameters: self.parameters.clone(),
        });
    }

    /// Completion candidates at `caret` in the last analyzed text.
    pub fn request_completion(&self, prefix: Option<&str>, caret: usize) -> Vec<CompletionCandidate> {
        let text = self.text.as_deref().unwrap_or("");
        let tree = self.current_tree();
        self.completion.complete(text, caret, prefix, &tree, &self.parameters)
    }

    /// Identifiers visible at the caret, host parameters included.
    pub fn visible_identifiers(&self) -> BTreeSet<String> {
        let tree = self.current_tree();
        let mut names = tree.variables_in_scope(self.caret);
        names.extend(self.parameters.iter().map(|p| p.name.clone()));
        names
    }

    pub fn subscribe(&self) -> Option<broadcast::Receiver<SessionEvent>> {
        self.events.as_ref().map(EventBus::subscribe)
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn parameters(&self) -> &[ParameterDefinition] {
        &self.parameters
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Stop the debounce timer, drop the event channel and release the scheduler.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.scheduler.shutdown();
        self.events = None;
        tracing::debug!("editor session disposed");
    }

    fn current_tree(&self) -> Arc<ScopeTree> {
        self.analyzer
            .current()
            .unwrap_or_else(|| Arc::new(build_scope_tree("")))
    }

    fn publish_context(&self, tree: &ScopeTree) {
        let Some(events) = &self.events else {
            return;
        };
        let mut names = tree.variables_in_scope(self.caret);
        names.extend(self.parameters.iter().map(|p| p.name.clone()));
        events.publish(SessionEvent::ContextChanged(Arc::new(names)));
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::{sleep, timeout};

    use super::*;
    use crate::diag::Severity;
    use crate::params::ParameterType;

    async fn next_diagnostics(
        rx: &mut broadcast::Receiver<SessionEvent>,
    ) -> Option<Arc<[crate::diag::Diagnostic]>> {
        loop {
            if let SessionEvent::Diagnostics(list) = rx.recv().await.ok()? {
                return Some(list);
            }
        }
    }

    fn session() -> EditorSession {
        EditorSession::new(&AnalysisConfig::default()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_is_idempotent() {
        let mut session = session();
        let text = "var x=1; function f(y){ let z=2; }";
        assert!(session.analyze(text, text.len()));
        let first = session.visible_identifiers();
        assert!(!session.analyze(text, text.len()));
        assert_eq!(session.visible_identifiers(), first);
        assert!(first.contains("x") && first.contains("f"));
        assert!(!first.contains("y") && !first.contains("z"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_changed_and_diagnostics() {
        let mut session = session();
        let mut rx = session.subscribe().unwrap();
        session.update_parameters(vec![ParameterDefinition::new("weight", ParameterType::Number)]);

        let text = "addNormalResult('d', wieght*2, 'mg','','','')";
        session.analyze(text, 0);
        match rx.recv().await.unwrap() {
            SessionEvent::ContextChanged(names) => assert!(names.contains("weight")),
            other => panic!("unexpected event {other:?}"),
        }

        let diagnostics = next_diagnostics(&mut rx).await.unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        match rx.recv().await.unwrap() {
            SessionEvent::Status(status) => assert_eq!(status, "0 errors, 1 warning, 0 hints"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_parameters_revalidates() {
        let mut session = session();
        let mut rx = session.subscribe().unwrap();
        session.analyze("log(dose);", 0);
        let first = next_diagnostics(&mut rx).await.unwrap();
        assert_eq!(first.len(), 1);

        session.update_parameters(vec![ParameterDefinition::new("dose", ParameterType::Number)]);
        let second = next_diagnostics(&mut rx).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_completion_uses_parameters() {
        let mut session = session();
        session.update_parameters(vec![ParameterDefinition::new("weight", ParameterType::Number)]);
        session.analyze("w", 1);
        let items = session.request_completion(Some("w"), 1);
        let names: Vec<&str> = items.iter().map(|c| c.text.as_str()).collect();
        let weight = names.iter().position(|n| *n == "weight").unwrap();
        let while_kw = names.iter().position(|n| *n == "while").unwrap();
        assert!(weight < while_kw);
    }

    #[tokio::test(start_paused = true)]
    async fn test_caret_inside_multibyte_char() {
        let mut session = session();
        let text = "let dosé = 1;\ndosé";
        let caret = text.len() - 1;
        assert!(!text.is_char_boundary(caret));
        assert!(session.analyze(text, caret));
        assert!(session.visible_identifiers().contains("dosé"));

        let items = session.request_completion(None, caret);
        assert!(items.iter().any(|c| c.text == "dosé"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_stops_everything() {
        let mut session = session();
        let mut rx = session.subscribe().unwrap();
        session.analyze("let a = ;", 0);
        session.dispose();

        assert!(session.is_disposed());
        assert!(session.subscribe().is_none());
        assert!(!session.analyze("let b = 1;", 0));

        sleep(Duration::from_secs(2)).await;
        let outcome = timeout(Duration::from_millis(10), next_diagnostics(&mut rx)).await;
        assert!(!matches!(outcome, Ok(Some(_))));
    }
}
