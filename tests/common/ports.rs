//! Scriptable port implementations shared across integration tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

use lingograph::memory::MemoryRecord;
use lingograph::message::{MemoryKind, Message};
use lingograph::ports::{
    Capabilities, ChatModel, DocumentSnippet, Evaluation, ExtractedRecord, GrammarChecker,
    GrammarReport, MemoryExtractor, PortError, ResponseEvaluator, WebSearchPort,
};

/// Replays a fixed queue of replies; repeats the last one when drained.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Message>>,
    fallback: Message,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Message>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: Message::assistant("scripted fallback"),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, _messages: &[Message]) -> Result<Message, PortError> {
        Ok(self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

/// Fails every completion, for degradation paths.
pub struct DownModel;

#[async_trait]
impl ChatModel for DownModel {
    async fn complete(&self, _messages: &[Message]) -> Result<Message, PortError> {
        Err(PortError::Unavailable {
            port: "model",
            message: "connection refused".to_string(),
        })
    }
}

/// Emits a fixed set of records for one kind, nothing for the others, and
/// remembers every call it saw.
#[derive(Default)]
pub struct ScriptedExtractor {
    pub kind: Option<MemoryKind>,
    pub records: Vec<ExtractedRecord>,
    pub calls: Mutex<Vec<MemoryKind>>,
}

impl ScriptedExtractor {
    pub fn for_kind(kind: MemoryKind, records: Vec<ExtractedRecord>) -> Self {
        Self {
            kind: Some(kind),
            records,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MemoryExtractor for ScriptedExtractor {
    async fn extract(
        &self,
        kind: MemoryKind,
        _messages: &[Message],
        _existing: &[MemoryRecord],
    ) -> Result<Vec<ExtractedRecord>, PortError> {
        self.calls.lock().push(kind);
        if self.kind == Some(kind) {
            Ok(self.records.clone())
        } else {
            Ok(Vec::new())
        }
    }
}

/// Returns the same snippets for every query.
pub struct ScriptedSearch {
    pub snippets: Vec<DocumentSnippet>,
}

#[async_trait]
impl WebSearchPort for ScriptedSearch {
    async fn search(&self, _query: &str) -> Result<Vec<DocumentSnippet>, PortError> {
        Ok(self.snippets.clone())
    }
}

/// Corrects any text containing `trigger`; everything else is clean.
pub struct ScriptedGrammar {
    pub trigger: &'static str,
    pub corrected: &'static str,
}

#[async_trait]
impl GrammarChecker for ScriptedGrammar {
    async fn check(&self, text: &str) -> Result<GrammarReport, PortError> {
        if text.contains(self.trigger) {
            Ok(GrammarReport {
                issues: vec!["subject-verb agreement".to_string()],
                corrected: Some(self.corrected.to_string()),
            })
        } else {
            Ok(GrammarReport::default())
        }
    }
}

/// Fixed-verdict evaluator, counting how often it was consulted.
pub struct ScriptedEvaluator {
    pub approved: bool,
    pub calls: Mutex<u32>,
}

impl ScriptedEvaluator {
    pub fn approving() -> Self {
        Self {
            approved: true,
            calls: Mutex::new(0),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            approved: false,
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl ResponseEvaluator for ScriptedEvaluator {
    async fn evaluate(&self, _input: &str, _output: &str) -> Result<Evaluation, PortError> {
        *self.calls.lock() += 1;
        Ok(Evaluation {
            approved: self.approved,
            comment: if self.approved {
                "good answer".to_string()
            } else {
                "needs more examples".to_string()
            },
        })
    }
}

/// Bundle with benign defaults, overridable per test.
pub fn capabilities(
    model: Arc<dyn ChatModel>,
    extractor: Arc<dyn MemoryExtractor>,
    evaluator: Arc<dyn ResponseEvaluator>,
) -> Arc<Capabilities> {
    Arc::new(
        Capabilities::builder()
            .model(model)
            .extractor(extractor)
            .search(Arc::new(ScriptedSearch {
                snippets: Vec::new(),
            }))
            .grammar(Arc::new(ScriptedGrammar {
                trigger: "I has",
                corrected: "I have a question",
            }))
            .evaluator(evaluator)
            .build()
            .unwrap(),
    )
}

/// Everything answers, nothing extracts, everything is approved.
pub fn plain_capabilities(replies: Vec<Message>) -> Arc<Capabilities> {
    capabilities(
        Arc::new(ScriptedModel::new(replies)),
        Arc::new(ScriptedExtractor::default()),
        Arc::new(ScriptedEvaluator::approving()),
    )
}

#[allow(dead_code)]
pub fn record_value(records: &[MemoryRecord], index: usize) -> &Value {
    &records[index].value
}
