use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Asistente local de documentos: indexación, chat con recuperación y un
/// modo sin APIs de pago.
#[derive(Parser, Debug)]
#[command(name = "sabio")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Verifica credenciales, conexión y quota del proveedor
    Doctor,
    /// Indexa los documentos de un directorio
    Index {
        /// Directorio con los documentos a indexar
        #[arg(default_value = "data")]
        dir: PathBuf,
        /// Borra el índice antes de indexar
        #[arg(long)]
        reset: bool,
    },
    /// Chat interactivo con recuperación de documentos
    Chat {
        /// Número de fragmentos a recuperar por pregunta
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Chat sin APIs de pago: documentos locales + base de conocimiento
    Offline {
        /// Número de fragmentos a recuperar por pregunta
        #[arg(long)]
        top_k: Option<usize>,
    },
}
