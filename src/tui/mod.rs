//! Interface de terminal (TUI) para navegar pelos resultados da busca
//!
//! Mostra a página atual da tabela com cores por situação, o filtro
//! por nome/CPF e os logs da busca em andamento.

mod app;
mod runner;
mod ui;

pub use app::{App, AppEvent, InputMode, LogEntry, LogLevel};
pub use runner::{create_event_channel, run_tui, TuiLogger};
