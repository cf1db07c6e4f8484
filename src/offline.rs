//! Offline assistant: answers without any paid API.
//!
//! Combines local retrieval over the document index (vector similarity when
//! a local embedding endpoint is reachable, keyword scoring otherwise) with
//! the built-in topic knowledge base. Never issues a chat-completion call.

use std::sync::Arc;

use crate::core::config::Settings;
use crate::core::errors::ApiError;
use crate::kb::KnowledgeBase;
use crate::llm::LlmProvider;
use crate::rag::{ContextBuilder, ContextBuilderConfig, RagStore};

/// Only chunks with substantial content are worth quoting.
const MIN_CONTENT_LEN: usize = 50;

pub struct OfflineAssistant {
    store: Arc<dyn RagStore>,
    /// Local embedding endpoint, if any. No credential is ever attached.
    embedder: Option<Arc<dyn LlmProvider>>,
    embedding_model: String,
    kb: KnowledgeBase,
    context_builder: ContextBuilder,
    top_k: usize,
}

impl OfflineAssistant {
    pub fn new(
        store: Arc<dyn RagStore>,
        embedder: Option<Arc<dyn LlmProvider>>,
        kb: KnowledgeBase,
        settings: &Settings,
    ) -> Self {
        let embedding_model = settings
            .local_embedding_model
            .clone()
            .unwrap_or_else(|| settings.embedding_model.clone());

        Self {
            store,
            embedder,
            embedding_model,
            kb,
            context_builder: ContextBuilder::new(ContextBuilderConfig::from_settings(settings)),
            top_k: settings.top_k,
        }
    }

    /// Answer a question from documents and the knowledge base. Always
    /// returns something: document hits, topic info, or the fallback.
    pub async fn answer(&self, question: &str) -> String {
        let mut response = String::new();

        match self.search_documents(question).await {
            Ok(Some(found)) => {
                response.push_str(&format!("📚 **En tus documentos encontré:**\n{}\n\n", found));
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!("Document search failed: {}", err);
            }
        }

        if let Some(knowledge) = self.kb.lookup(question) {
            if response.is_empty() {
                response.push_str(&format!("🧠 **Información general:**\n{}", knowledge));
            } else {
                response.push_str(&format!("🧠 **Información adicional:**\n{}", knowledge));
            }
        }

        if response.is_empty() {
            response = self.kb.fallback(question);
        }

        response
    }

    async fn search_documents(&self, question: &str) -> Result<Option<String>, ApiError> {
        if self.store.count().await? == 0 {
            return Ok(None);
        }

        let context = match self.semantic_context(question).await {
            Ok(context) => context,
            Err(err) => {
                tracing::warn!("Semantic search unavailable, using keyword search: {}", err);
                self.keyword_context(question).await?
            }
        };

        if context.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(context))
        }
    }

    /// Only chunks with substantial content are worth quoting; the gate
    /// applies to each chunk's text, not the rendered context.
    fn is_substantial(content: &str) -> bool {
        content.trim().len() > MIN_CONTENT_LEN
    }

    async fn semantic_context(&self, question: &str) -> Result<String, ApiError> {
        let embedder = self
            .embedder
            .as_ref()
            .ok_or_else(|| ApiError::Internal("no local embedding endpoint".to_string()))?;

        let embeddings = embedder
            .embed(&[question.to_string()], &self.embedding_model)
            .await?;
        let query_embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Internal("empty embedding response".to_string()))?;

        let mut results = self.store.search(&query_embedding, self.top_k).await?;
        results.retain(|r| Self::is_substantial(&r.chunk.content));
        Ok(self.context_builder.build_context(&results))
    }

    async fn keyword_context(&self, question: &str) -> Result<String, ApiError> {
        // Pull candidates per term, then let the keyword scorer rank them.
        let mut candidates = Vec::new();
        for term in question.split_whitespace().filter(|t| t.len() > 2) {
            let mut found = self.store.text_search(term, self.top_k * 2).await?;
            candidates.append(&mut found);
        }
        candidates.sort_by(|a, b| a.chunk_id.cmp(&b.chunk_id));
        candidates.dedup_by(|a, b| a.chunk_id == b.chunk_id);
        candidates.retain(|c| Self::is_substantial(&c.content));

        Ok(self
            .context_builder
            .build_context_keyword(&candidates, question))
    }
}
