//! Compile-only script engines and the adapter that turns their errors into diagnostics.
//!
//! An engine is acquired from an [`EngineProvider`] once per validation pass and wrapped in an
//! [`EngineLease`], which releases it when dropped.

mod adapter;
mod lexer;
mod parser;

#[cfg(test)]
mod engine_test;

use std::fmt;
use std::sync::Arc;

use anyhow::Result;

pub use adapter::{CompileChecker, ValidationScript, map_engine_error};
pub use lexer::{Spanned, TemplatePart, Token, Tokenizer};

/// A compile failure with a 1-based position in the compiled source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SyntaxError: {} (Line {}, Column {})", self.message, self.line, self.column)
    }
}

impl std::error::Error for SyntaxError {}

/// Failure reported by an engine. Only the text is meaningful to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EngineError {}

impl From<SyntaxError> for EngineError {
    fn from(err: SyntaxError) -> Self {
        EngineError::new(err.to_string())
    }
}

/// Something that can check a script for compile errors without running it.
pub trait ScriptEngine: Send {
    fn compile(&mut self, source: &str) -> Result<(), EngineError>;

    /// Free engine resources. Called exactly once by [`EngineLease`].
    fn release(&mut self) {}
}

/// Hands out a fresh engine per validation pass.
pub trait EngineProvider: Send + Sync {
    fn acquire(&self) -> Result<Box<dyn ScriptEngine>>;
}

/// Scoped ownership of an engine; the engine is released when the lease goes out of scope,
/// including during unwinding.
pub struct EngineLease {
    engine: Option<Box<dyn ScriptEngine>>,
}

impl EngineLease {
    pub fn acquire(provider: &dyn EngineProvider) -> Result<Self> {
        let engine = provider.acquire()?;
        Ok(Self { engine: Some(engine) })
    }

    pub fn compile(&mut self, source: &str) -> Result<(), EngineError> {
        match self.engine.as_mut() {
            Some(engine) => engine.compile(source),
            None => Err(EngineError::new("engine already released")),
        }
    }
}

impl Drop for EngineLease {
    fn drop(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.release();
            tracing::trace!("released script engine");
        }
    }
}

/// The built-in engine: tokenizes and parses, never executes.
#[derive(Debug, Default)]
pub struct SyntaxEngine {
    released: bool,
}

impl SyntaxEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `source` and return the first syntax error.
    pub fn check(source: &str) -> Result<(), SyntaxError> {
        let tokens = Tokenizer::tokenize(source)?;
        parser::Parser::new(&tokens).parse_program()
    }
}

impl ScriptEngine for SyntaxEngine {
    fn compile(&mut self, source: &str) -> Result<(), EngineError> {
        if self.released {
            return Err(EngineError::new("engine already released"));
        }
        Self::check(source).map_err(EngineError::from)
    }

    fn release(&mut self) {
        self.released = true;
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SyntaxEngineProvider;

impl EngineProvider for SyntaxEngineProvider {
    fn acquire(&self) -> Result<Box<dyn ScriptEngine>> {
        Ok(Box::new(SyntaxEngine::new()))
    }
}

/// Provider used when nothing else is configured.
pub fn default_provider() -> Arc<dyn EngineProvider> {
    Arc::new(SyntaxEngineProvider)
}
