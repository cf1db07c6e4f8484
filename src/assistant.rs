//! Online chat assistant: retrieval-augmented conversation against the
//! configured OpenAI-compatible endpoint.

use std::sync::Arc;

use crate::core::config::Settings;
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::rag::{ContextBuilder, ContextBuilderConfig, RagStore};

const SYSTEM_PROMPT: &str = "Eres un asistente de desarrollo de software experto y amigable.\n\n\
Instrucciones:\n\
- Siempre intenta responder primero con la información de los documentos locales si está disponible\n\
- Si no encuentras información en los documentos, usa tu conocimiento general\n\
- Combina información de múltiples fuentes cuando sea útil\n\
- Sé claro, conciso y útil en tus respuestas\n\
- Si no sabes algo, admítelo y sugiere alternativas\n\n\
Responde en español de manera amigable y profesional.";

pub struct Assistant {
    provider: Arc<dyn LlmProvider>,
    store: Arc<dyn RagStore>,
    context_builder: ContextBuilder,
    settings: Settings,
    history: Vec<ChatMessage>,
}

impl Assistant {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        store: Arc<dyn RagStore>,
        settings: Settings,
    ) -> Self {
        let context_builder = ContextBuilder::new(ContextBuilderConfig::from_settings(&settings));
        Self {
            provider,
            store,
            context_builder,
            settings,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// One conversation turn: retrieve context, stream the completion while
    /// forwarding deltas to `on_delta`, record the turn in history.
    pub async fn ask(
        &mut self,
        question: &str,
        mut on_delta: impl FnMut(&str),
    ) -> Result<String, ApiError> {
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];

        // Retrieval failure must not kill the turn; the model falls back to
        // general knowledge like the original agent did.
        match self.retrieve_context(question).await {
            Ok(context) if !context.is_empty() => {
                messages.push(ChatMessage::system(format!(
                    "Información encontrada en los documentos locales:\n{}",
                    context
                )));
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!("Document retrieval failed: {}", err);
            }
        }

        messages.extend(self.history.iter().cloned());
        messages.push(ChatMessage::user(question));

        let request = ChatRequest::new(messages).with_settings(&self.settings);
        let mut stream = self
            .provider
            .stream_chat(request, &self.settings.chat_model)
            .await?;

        let mut full_response = String::new();
        while let Some(chunk_result) = stream.recv().await {
            let chunk = chunk_result?;
            if chunk.is_empty() {
                continue;
            }
            on_delta(&chunk);
            full_response.push_str(&chunk);
        }

        self.history.push(ChatMessage::user(question));
        self.history.push(ChatMessage::assistant(full_response.clone()));

        Ok(full_response)
    }

    async fn retrieve_context(&self, question: &str) -> Result<String, ApiError> {
        if self.store.count().await? == 0 {
            return Ok(String::new());
        }

        let embeddings = self
            .provider
            .embed(&[question.to_string()], &self.settings.embedding_model)
            .await?;
        let query_embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Internal("empty embedding response".to_string()))?;

        let results = self
            .store
            .search(&query_embedding, self.settings.top_k)
            .await?;

        Ok(self.context_builder.build_context(&results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ProviderModel;
    use crate::rag::{SqliteRagStore, StoredChunk};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Scripted provider: records the chat request, streams a canned reply,
    /// embeds everything to a fixed vector.
    struct ScriptedProvider {
        reply_parts: Vec<String>,
        last_messages: Mutex<Vec<ChatMessage>>,
    }

    impl ScriptedProvider {
        fn new(parts: &[&str]) -> Self {
            Self {
                reply_parts: parts.iter().map(|s| s.to_string()).collect(),
                last_messages: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> Result<bool, ApiError> {
            Ok(true)
        }

        async fn list_models(&self) -> Result<Vec<ProviderModel>, ApiError> {
            Ok(vec![])
        }

        async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, ApiError> {
            *self.last_messages.lock().unwrap() = request.messages;
            Ok(self.reply_parts.join(""))
        }

        async fn stream_chat(
            &self,
            request: ChatRequest,
            _model_id: &str,
        ) -> Result<mpsc::Receiver<Result<String, ApiError>>, ApiError> {
            *self.last_messages.lock().unwrap() = request.messages;
            let (tx, rx) = mpsc::channel(8);
            let parts = self.reply_parts.clone();
            tokio::spawn(async move {
                for part in parts {
                    if tx.send(Ok(part)).await.is_err() {
                        return;
                    }
                }
            });
            Ok(rx)
        }

        async fn embed(
            &self,
            inputs: &[String],
            _model_id: &str,
        ) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(inputs.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    async fn empty_store() -> Arc<SqliteRagStore> {
        let tmp =
            std::env::temp_dir().join(format!("sabio-assistant-test-{}.db", uuid::Uuid::new_v4()));
        Arc::new(SqliteRagStore::with_path(tmp).await.unwrap())
    }

    #[tokio::test]
    async fn streams_deltas_and_records_history() {
        let provider = Arc::new(ScriptedProvider::new(&["Hola", " mundo"]));
        let store = empty_store().await;
        let mut assistant = Assistant::new(provider, store, Settings::default());

        let mut seen = String::new();
        let response = assistant
            .ask("¿qué es react?", |delta| seen.push_str(delta))
            .await
            .unwrap();

        assert_eq!(response, "Hola mundo");
        assert_eq!(seen, "Hola mundo");
        assert_eq!(assistant.history().len(), 2);
        assert_eq!(assistant.history()[0].role, "user");
        assert_eq!(assistant.history()[1].content, "Hola mundo");
    }

    #[tokio::test]
    async fn injects_document_context_when_store_has_matches() {
        let provider = Arc::new(ScriptedProvider::new(&["ok"]));
        let store = empty_store().await;
        store
            .insert(
                StoredChunk {
                    chunk_id: "c1".to_string(),
                    content: "React usa un Virtual DOM.".to_string(),
                    source: "react.md".to_string(),
                    metadata: None,
                },
                vec![1.0, 0.0],
            )
            .await
            .unwrap();

        let mut assistant = Assistant::new(provider.clone(), store, Settings::default());
        assistant.ask("react", |_| {}).await.unwrap();

        let messages = provider.last_messages.lock().unwrap().clone();
        // System prompt, context message, then the user question.
        assert!(messages.len() >= 3);
        assert!(messages[1].content.contains("Virtual DOM"));
        assert!(messages[1].content.contains("react.md"));
        assert_eq!(messages.last().unwrap().role, "user");
    }

    #[tokio::test]
    async fn second_turn_carries_prior_history() {
        let provider = Arc::new(ScriptedProvider::new(&["respuesta"]));
        let store = empty_store().await;
        let mut assistant = Assistant::new(provider.clone(), store, Settings::default());

        assistant.ask("primera", |_| {}).await.unwrap();
        assistant.ask("segunda", |_| {}).await.unwrap();

        let messages = provider.last_messages.lock().unwrap().clone();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert!(contents.contains(&"primera"));
        assert!(contents.contains(&"segunda"));
    }
}
