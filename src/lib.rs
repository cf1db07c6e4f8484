pub mod assistant;
pub mod cli;
pub mod core;
pub mod doctor;
pub mod kb;
pub mod llm;
pub mod logging;
pub mod offline;
pub mod rag;
pub mod repl;
