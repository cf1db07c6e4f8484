//! Environment and quota diagnostics.
//!
//! Reports the credential's presence and shape without revealing it, then
//! probes the provider: a model listing validates the key and a one-shot
//! completion with a tiny token budget probes the remaining quota.

use crate::core::config::{self, AppPaths, Settings};
use crate::core::errors::ApiError;
use crate::llm::types::ChatMessage;
use crate::llm::{ChatRequest, LlmProvider, OpenAiProvider};

const BILLING_URL: &str = "https://platform.openai.com/account/billing";
const PLACEHOLDER_VALUES: &[&str] = &["tu-api-key-aqui", "your-api-key-here"];
const PLACEHOLDER_PREFIXES: &[&str] = &["sk-TU_API_KEY", "sk-XXXX"];

#[derive(Debug, Clone, PartialEq)]
pub struct CredentialReport {
    pub masked: String,
    pub length: usize,
    pub has_expected_prefix: bool,
    pub is_placeholder: bool,
}

impl CredentialReport {
    pub fn inspect(key: &str) -> Self {
        let is_placeholder = PLACEHOLDER_VALUES.contains(&key)
            || PLACEHOLDER_PREFIXES.iter().any(|p| key.starts_with(p));

        Self {
            masked: config::mask_key(key),
            length: key.chars().count(),
            has_expected_prefix: key.starts_with("sk-"),
            is_placeholder,
        }
    }

    pub fn looks_valid(&self) -> bool {
        self.has_expected_prefix && !self.is_placeholder
    }
}

/// Validate the key via the model listing, then probe quota with a one-shot
/// completion. Returns the test reply on success.
pub async fn probe_quota(
    provider: &dyn LlmProvider,
    chat_model: &str,
) -> Result<String, ApiError> {
    let models = provider.list_models().await?;
    tracing::info!("Provider reachable, {} models visible", models.len());

    let request = ChatRequest::new(vec![ChatMessage::user("Hello")]).with_max_tokens(10);
    provider.chat(request, chat_model).await
}

/// Run the full diagnostic, printing a human-readable report.
/// Returns false when any check fails.
pub async fn run(paths: &AppPaths, settings: &Settings) -> bool {
    println!("=== Verificación de credenciales ===");

    let api_key = match config::resolve_api_key(&paths.config_path) {
        Ok(key) => key,
        Err(err) => {
            println!("❌ {}", err);
            return false;
        }
    };

    let report = CredentialReport::inspect(&api_key);
    println!("API key encontrada: {}", report.masked);
    println!("Longitud: {} caracteres", report.length);
    println!(
        "Comienza con 'sk-': {}",
        if report.has_expected_prefix { "Sí" } else { "No" }
    );

    if report.is_placeholder {
        println!("❌ ERROR: La API key aún tiene un valor de ejemplo");
        return false;
    }
    if !report.has_expected_prefix {
        println!("⚠️ La API key no tiene el prefijo esperado");
    }

    println!("\n=== Verificación de conexión y quota ===");
    let provider = OpenAiProvider::new(settings.base_url.clone(), Some(api_key));

    match probe_quota(&provider, &settings.chat_model).await {
        Ok(reply) => {
            println!("✅ API key válida - Conexión exitosa");
            println!("✅ Quota disponible - Tu cuenta tiene créditos");
            println!("Respuesta de prueba: {}", reply);
            true
        }
        Err(err) if err.is_quota() => {
            println!("❌ Sin créditos - Necesitas agregar fondos a tu cuenta");
            println!("Ve a: {}", BILLING_URL);
            false
        }
        Err(err) => {
            println!("❌ Error: {}", err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ProviderModel;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    #[test]
    fn inspect_flags_placeholders() {
        let report = CredentialReport::inspect("tu-api-key-aqui");
        assert!(report.is_placeholder);
        assert!(!report.looks_valid());

        let report = CredentialReport::inspect("sk-TU_API_KEY_REAL");
        assert!(report.is_placeholder);
    }

    #[test]
    fn inspect_accepts_real_looking_key() {
        let report = CredentialReport::inspect("sk-proj-abcdefghijklmnopqrstuvwx");
        assert!(report.looks_valid());
        assert!(report.has_expected_prefix);
        assert_eq!(report.length, 32);
        assert!(!report.masked.contains("abcdefghijklmnop"));
    }

    struct QuotaProvider {
        exhausted: bool,
    }

    #[async_trait]
    impl LlmProvider for QuotaProvider {
        fn name(&self) -> &str {
            "quota-test"
        }

        async fn health_check(&self) -> Result<bool, ApiError> {
            Ok(true)
        }

        async fn list_models(&self) -> Result<Vec<ProviderModel>, ApiError> {
            Ok(vec![ProviderModel {
                id: "gpt-3.5-turbo".to_string(),
                name: "gpt-3.5-turbo".to_string(),
            }])
        }

        async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, ApiError> {
            assert_eq!(request.max_tokens, Some(10));
            if self.exhausted {
                Err(ApiError::from_provider_body(
                    r#"{"error":{"code":"insufficient_quota"}}"#,
                ))
            } else {
                Ok("Hi!".to_string())
            }
        }

        async fn stream_chat(
            &self,
            _request: ChatRequest,
            _model_id: &str,
        ) -> Result<mpsc::Receiver<Result<String, ApiError>>, ApiError> {
            unimplemented!()
        }

        async fn embed(
            &self,
            _inputs: &[String],
            _model_id: &str,
        ) -> Result<Vec<Vec<f32>>, ApiError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn probe_reports_reply_when_quota_available() {
        let provider = QuotaProvider { exhausted: false };
        let reply = probe_quota(&provider, "gpt-3.5-turbo").await.unwrap();
        assert_eq!(reply, "Hi!");
    }

    #[tokio::test]
    async fn probe_surfaces_quota_exhaustion() {
        let provider = QuotaProvider { exhausted: true };
        let err = probe_quota(&provider, "gpt-3.5-turbo").await.unwrap_err();
        assert!(err.is_quota());
    }
}
