use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;

use sabio::assistant::Assistant;
use sabio::cli::{Cli, Command};
use sabio::core::config::{self, AppPaths, Settings};
use sabio::doctor;
use sabio::kb::KnowledgeBase;
use sabio::llm::{LlmProvider, OpenAiProvider};
use sabio::logging;
use sabio::offline::OfflineAssistant;
use sabio::rag::{Chunker, Indexer, RagConfig, RagStore, SqliteRagStore};
use sabio::repl::{self, ReplHandler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env may carry OPENAI_API_KEY; absence is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let paths = AppPaths::new();
    logging::init(&paths);

    let settings = Settings::load(&paths.config_path);

    match cli.command {
        Command::Doctor => {
            let ok = doctor::run(&paths, &settings).await;
            if !ok {
                std::process::exit(1);
            }
        }
        Command::Index { dir, reset } => {
            run_index(&paths, &settings, dir, reset).await?;
        }
        Command::Chat { top_k } => {
            let settings = with_top_k(settings, top_k);
            run_chat(&paths, settings).await?;
        }
        Command::Offline { top_k } => {
            let settings = with_top_k(settings, top_k);
            run_offline(&paths, settings).await?;
        }
    }

    Ok(())
}

fn with_top_k(mut settings: Settings, top_k: Option<usize>) -> Settings {
    if let Some(top_k) = top_k {
        settings.top_k = top_k.max(1);
    }
    settings
}

async fn open_store(paths: &AppPaths) -> anyhow::Result<Arc<SqliteRagStore>> {
    let store = SqliteRagStore::with_path(paths.index_db_path.clone())
        .await
        .with_context(|| format!("Failed to open index at {}", paths.index_db_path.display()))?;
    Ok(Arc::new(store))
}

async fn run_index(
    paths: &AppPaths,
    settings: &Settings,
    dir: PathBuf,
    reset: bool,
) -> anyhow::Result<()> {
    let api_key = config::resolve_api_key(&paths.config_path)?;
    let provider = OpenAiProvider::new(settings.base_url.clone(), Some(api_key));
    let store = open_store(paths).await?;

    if reset {
        store.reindex_with_model(&settings.embedding_model).await?;
        println!("Índice borrado.");
    }

    println!("📁 Indexando documentos de {}...", dir.display());

    let indexer = Indexer::new(
        Chunker::new(RagConfig::from_settings(settings)),
        &provider,
        store.as_ref(),
        settings.embedding_model.clone(),
    );

    let report = indexer.index_dir(&dir).await?;
    println!(
        "✅ {} archivos indexados ({} fragmentos, {} omitidos)",
        report.files, report.chunks, report.skipped
    );
    println!("Total en el índice: {} fragmentos", store.count().await?);

    Ok(())
}

struct ChatHandler {
    assistant: Assistant,
}

#[async_trait]
impl ReplHandler for ChatHandler {
    async fn handle(&mut self, question: &str) {
        println!("🤖 Procesando...");
        print!("\n✨ Respuesta: ");
        let _ = std::io::stdout().flush();

        let result = self
            .assistant
            .ask(question, |delta| {
                print!("{}", delta);
                let _ = std::io::stdout().flush();
            })
            .await;

        match result {
            Ok(_) => println!("\n"),
            Err(err) => {
                println!("\n❌ Error: {}", err);
                println!("Intenta con otra pregunta.");
            }
        }
    }
}

async fn run_chat(paths: &AppPaths, settings: Settings) -> anyhow::Result<()> {
    let api_key = config::resolve_api_key(&paths.config_path)?;
    let provider: Arc<dyn LlmProvider> =
        Arc::new(OpenAiProvider::new(settings.base_url.clone(), Some(api_key)));
    let store = open_store(paths).await?;

    let indexed = store.count().await?;
    println!("💬 ¡Asistente listo! Escribe 'salir' para terminar.");
    if indexed > 0 {
        println!("✅ {} fragmentos disponibles para búsqueda en documentos", indexed);
    } else {
        println!("⚠️ Índice vacío - ejecuta 'sabio index' para usar tus documentos");
    }
    println!("{}", "-".repeat(50));

    let store: Arc<dyn RagStore> = store;
    let mut handler = ChatHandler {
        assistant: Assistant::new(provider, store, settings),
    };

    repl::run("\n🤔 Tu pregunta: ", &mut handler).await
}

struct OfflineHandler {
    assistant: OfflineAssistant,
}

#[async_trait]
impl ReplHandler for OfflineHandler {
    async fn handle(&mut self, question: &str) {
        println!("🤖 Procesando...");
        let response = self.assistant.answer(question).await;
        println!("\n✨ **Respuesta:**\n{}\n", response);
    }
}

async fn run_offline(paths: &AppPaths, settings: Settings) -> anyhow::Result<()> {
    let store = open_store(paths).await?;
    let kb = KnowledgeBase::load(&paths.topics_path);

    // A local OpenAI-compatible endpoint enables semantic search; without
    // one the offline mode degrades to keyword search. Never the paid API.
    let embedder: Option<Arc<dyn LlmProvider>> = match &settings.local_base_url {
        Some(url) => {
            let candidate = OpenAiProvider::new(url.clone(), None);
            if candidate.health_check().await.unwrap_or(false) {
                println!("✅ Endpoint local de embeddings disponible ({})", url);
                Some(Arc::new(candidate))
            } else {
                tracing::warn!("Local endpoint {} unreachable, using keyword search", url);
                None
            }
        }
        None => None,
    };

    let indexed = store.count().await?;
    println!("💬 ¡Chatbot listo! (Sin APIs de pago)");
    println!("Combina: búsqueda en documentos + base de conocimiento");
    if indexed > 0 {
        println!("✅ {} fragmentos disponibles para búsqueda local", indexed);
    } else {
        println!("⚠️ Sin documentos locales - usando solo conocimiento base");
    }
    println!("Puedes preguntar sobre: {}", kb.topic_keys().join(", "));
    println!("{}", "-".repeat(60));

    let store: Arc<dyn RagStore> = store;
    let mut handler = OfflineHandler {
        assistant: OfflineAssistant::new(store, embedder, kb, &settings),
    };

    repl::run("\n🤔 Tu pregunta: ", &mut handler).await
}
