//! Shared test doubles

use crate::backend::{Backend, BackendFactory, BackendSpec, CompletionOptions, EmbeddingBackend};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Backend that answers every prompt with a fixed reply (or fails).
pub struct ScriptedBackend {
    provider: String,
    model: String,
    reply: Option<String>,
    embedding: Option<Vec<f32>>,
    tokens: Option<usize>,
    calls: AtomicUsize,
    last_options: Mutex<Option<CompletionOptions>>,
    last_prompt: Mutex<Option<String>>,
}

impl ScriptedBackend {
    pub fn replying(provider: &str, model: &str, reply: &str) -> Self {
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            reply: Some(reply.to_string()),
            embedding: None,
            tokens: None,
            calls: AtomicUsize::new(0),
            last_options: Mutex::new(None),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn failing(provider: &str, model: &str) -> Self {
        Self {
            reply: None,
            ..Self::replying(provider, model, "")
        }
    }

    pub fn with_embedding(mut self, vector: Vec<f32>) -> Self {
        self.embedding = Some(vector);
        self
    }

    pub fn with_token_count(mut self, tokens: usize) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<CompletionOptions> {
        self.last_options.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(options.clone());
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        tokio::task::yield_now().await;
        self.reply
            .clone()
            .ok_or_else(|| Error::provider(&self.provider, "connection reset"))
    }

    fn embeddings(&self) -> Option<&dyn EmbeddingBackend> {
        self.embedding.as_ref().map(|_| self as &dyn EmbeddingBackend)
    }

    fn count_tokens(&self, _text: &str) -> Option<usize> {
        self.tokens
    }
}

#[async_trait]
impl EmbeddingBackend for ScriptedBackend {
    async fn embed(&self, _text: &str, dimensions: Option<usize>) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let vector = self.embedding.clone().unwrap_or_default();
        Ok(match dimensions {
            Some(n) => vector.into_iter().take(n).collect(),
            None => vector,
        })
    }
}

/// Factory that counts constructions and yields before finishing, so
/// concurrent resolutions overlap.
pub struct CountingFactory {
    reply: String,
    failing_providers: HashSet<String>,
    created: AtomicUsize,
    specs: Mutex<Vec<BackendSpec>>,
}

impl CountingFactory {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            failing_providers: HashSet::new(),
            created: AtomicUsize::new(0),
            specs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_for(mut self, provider: &str) -> Self {
        self.failing_providers.insert(provider.to_string());
        self
    }

    /// Successful constructions.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Every spec the factory was asked to build, including failures.
    pub fn specs(&self) -> Vec<BackendSpec> {
        self.specs.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackendFactory for CountingFactory {
    async fn create(&self, spec: &BackendSpec) -> Result<Arc<dyn Backend>> {
        self.specs.lock().unwrap().push(spec.clone());
        tokio::task::yield_now().await;
        if self.failing_providers.contains(&spec.provider) {
            return Err(Error::UnsupportedProvider(spec.provider.clone()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ScriptedBackend::replying(
            &spec.provider,
            &spec.model,
            &self.reply,
        )))
    }
}

/// Observations from string literals.
pub fn obs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
