//! Mock enrichment backend for deterministic testing.
//!
//! Produces fixed summaries, titles, and tags, records every call, and can
//! be switched into a failing mode to exercise error paths.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use quillnote_core::{EnrichmentBackend, Error, Result};

/// A recorded enrichment call.
#[derive(Debug, Clone)]
pub struct MockCall {
    /// "summarize", "title", or "tags".
    pub operation: String,
    pub input: String,
}

#[derive(Debug, Clone)]
struct MockConfig {
    summary: String,
    title: String,
    tags: Vec<String>,
    /// Content-keyed overrides for summaries.
    summary_overrides: HashMap<String, String>,
    fail: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            summary: "Mock summary.".to_string(),
            title: "Mock title".to_string(),
            tags: vec!["mock".to_string(), "test".to_string()],
            summary_overrides: HashMap::new(),
            fail: false,
        }
    }
}

/// Mock enrichment backend.
#[derive(Clone)]
pub struct MockEnrichmentBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl Default for MockEnrichmentBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEnrichmentBackend {
    /// Create a new mock backend with default responses.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the fixed summary response.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).summary = summary.into();
        self
    }

    /// Set the fixed title response.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).title = title.into();
        self
    }

    /// Set the fixed tags response.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        Arc::make_mut(&mut self.config).tags = tags;
        self
    }

    /// Add a content-specific summary override.
    pub fn with_summary_for(
        mut self,
        content: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .summary_overrides
            .insert(content.into(), summary.into());
        self
    }

    /// Make every operation fail with an enrichment error.
    pub fn failing(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail = true;
        self
    }

    /// All calls recorded so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of calls recorded for one operation.
    pub fn call_count(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn record(&self, operation: &str, input: &str) -> Result<()> {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });
        if self.config.fail {
            Err(Error::Enrichment("mock backend failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EnrichmentBackend for MockEnrichmentBackend {
    async fn summarize(&self, content: &str) -> Result<String> {
        self.record("summarize", content)?;
        Ok(self
            .config
            .summary_overrides
            .get(content)
            .cloned()
            .unwrap_or_else(|| self.config.summary.clone()))
    }

    async fn title(&self, content: &str) -> Result<String> {
        self.record("title", content)?;
        Ok(self.config.title.clone())
    }

    async fn tags(&self, content: &str) -> Result<Vec<String>> {
        self.record("tags", content)?;
        Ok(self.config.tags.clone())
    }
}
