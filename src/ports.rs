//! Capability ports: the seams where external services plug in.
//!
//! The engine never talks to a model, a search backend, or a grammar service
//! directly. Everything goes through these async traits, carried into nodes by
//! the execution context as a [`Capabilities`] bundle. Tests script them; a
//! deployment wires real clients behind them.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::message::{MemoryKind, Message};
use crate::memory::MemoryRecord;

/// Failure surfaced by any port implementation.
///
/// Ports are the untrusted edge; node code converts these into recoverable
/// error events rather than aborting the turn.
#[derive(Debug, Error, Diagnostic)]
pub enum PortError {
    #[error("{port} unavailable: {message}")]
    #[diagnostic(
        code(lingograph::ports::unavailable),
        help("Check connectivity and credentials for the backing service.")
    )]
    Unavailable { port: &'static str, message: String },

    #[error("{port} returned a malformed response: {message}")]
    #[diagnostic(code(lingograph::ports::malformed))]
    Malformed { port: &'static str, message: String },

    #[error(transparent)]
    #[diagnostic(code(lingograph::ports::serde_json))]
    Serde(#[from] serde_json::Error),
}

/// Chat completion over the running transcript.
///
/// The returned assistant message may carry tool-call requests; the router
/// interprets those, not the port.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<Message, PortError>;
}

/// One structured extraction result.
///
/// `record_id: Some` patches the existing record wholesale; `None` asks the
/// store to mint a fresh id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedRecord {
    pub record_id: Option<String>,
    pub value: Value,
}

impl ExtractedRecord {
    #[must_use]
    pub fn insert(value: Value) -> Self {
        Self {
            record_id: None,
            value,
        }
    }

    #[must_use]
    pub fn patch(record_id: &str, value: Value) -> Self {
        Self {
            record_id: Some(record_id.to_string()),
            value,
        }
    }
}

/// Structured extraction of memory documents from a transcript.
#[async_trait]
pub trait MemoryExtractor: Send + Sync {
    async fn extract(
        &self,
        kind: MemoryKind,
        messages: &[Message],
        existing: &[MemoryRecord],
    ) -> Result<Vec<ExtractedRecord>, PortError>;
}

/// A retrieved document fragment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnippet {
    pub source: String,
    pub content: String,
}

#[async_trait]
pub trait WebSearchPort: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<DocumentSnippet>, PortError>;
}

/// Outcome of a grammar check. `corrected: None` means the text was clean.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarReport {
    pub issues: Vec<String>,
    pub corrected: Option<String>,
}

impl GrammarReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.corrected.is_none() && self.issues.is_empty()
    }
}

#[async_trait]
pub trait GrammarChecker: Send + Sync {
    async fn check(&self, text: &str) -> Result<GrammarReport, PortError>;
}

/// Verdict on one assistant response, scored against the opening user input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub approved: bool,
    pub comment: String,
}

#[async_trait]
pub trait ResponseEvaluator: Send + Sync {
    async fn evaluate(&self, input: &str, output: &str) -> Result<Evaluation, PortError>;
}

/// The full port bundle a graph runs against.
#[derive(Clone)]
pub struct Capabilities {
    pub model: Arc<dyn ChatModel>,
    pub extractor: Arc<dyn MemoryExtractor>,
    pub search: Arc<dyn WebSearchPort>,
    pub grammar: Arc<dyn GrammarChecker>,
    pub evaluator: Arc<dyn ResponseEvaluator>,
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}

impl Capabilities {
    pub fn builder() -> CapabilitiesBuilder {
        CapabilitiesBuilder::default()
    }
}

/// Builder so call sites can name only the ports they care about in tests.
#[derive(Default)]
pub struct CapabilitiesBuilder {
    model: Option<Arc<dyn ChatModel>>,
    extractor: Option<Arc<dyn MemoryExtractor>>,
    search: Option<Arc<dyn WebSearchPort>>,
    grammar: Option<Arc<dyn GrammarChecker>>,
    evaluator: Option<Arc<dyn ResponseEvaluator>>,
}

/// Building an incomplete bundle is a programming error; the error names the
/// missing port so it reads well in test output.
#[derive(Debug, Error, Diagnostic)]
#[error("capability bundle is missing the {0} port")]
#[diagnostic(code(lingograph::ports::incomplete))]
pub struct MissingPort(pub &'static str);

impl CapabilitiesBuilder {
    pub fn model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn MemoryExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn search(mut self, search: Arc<dyn WebSearchPort>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn grammar(mut self, grammar: Arc<dyn GrammarChecker>) -> Self {
        self.grammar = Some(grammar);
        self
    }

    pub fn evaluator(mut self, evaluator: Arc<dyn ResponseEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn build(self) -> Result<Capabilities, MissingPort> {
        Ok(Capabilities {
            model: self.model.ok_or(MissingPort("model"))?,
            extractor: self.extractor.ok_or(MissingPort("extractor"))?,
            search: self.search.ok_or(MissingPort("search"))?,
            grammar: self.grammar.ok_or(MissingPort("grammar"))?,
            evaluator: self.evaluator.ok_or(MissingPort("evaluator"))?,
        })
    }
}
