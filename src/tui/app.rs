//! Estado da aplicação TUI

use std::collections::VecDeque;

use crossterm::event::KeyCode;

use crate::table::ResultTable;
use crate::types::{MatchRecord, NoticeLevel};

/// Máximo de linhas de log mantidas no painel
const MAX_LOGS: usize = 100;

/// Linhas de log visíveis no painel inferior
pub const VISIBLE_LOGS: usize = 6;

/// Nível de severidade do log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Informação geral
    Info,
    /// Operação bem sucedida
    Success,
    /// Aviso
    Warning,
    /// Erro
    Error,
}

impl LogLevel {
    /// Retorna o símbolo emoji do nível
    pub fn symbol(&self) -> &'static str {
        match self {
            LogLevel::Info => "ℹ️ ",
            LogLevel::Success => "✅",
            LogLevel::Warning => "⚠️ ",
            LogLevel::Error => "❌",
        }
    }
}

impl From<NoticeLevel> for LogLevel {
    fn from(level: NoticeLevel) -> Self {
        match level {
            NoticeLevel::Info => LogLevel::Info,
            NoticeLevel::Success => LogLevel::Success,
            NoticeLevel::Warning => LogLevel::Warning,
            NoticeLevel::Danger => LogLevel::Error,
        }
    }
}

/// Entrada de log
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Timestamp formatado
    pub timestamp: String,
    /// Nível do log
    pub level: LogLevel,
    /// Mensagem
    pub message: String,
}

impl LogEntry {
    /// Cria nova entrada de log
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        let now = chrono::Local::now();
        Self {
            timestamp: now.format("%H:%M:%S").to_string(),
            level,
            message: message.into(),
        }
    }

    /// Log de informação
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    /// Log de sucesso
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, message)
    }

    /// Log de aviso
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    /// Log de erro
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }
}

/// Eventos enviados pela busca para a TUI
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Nova linha no painel de logs
    Log(LogEntry),
    /// Busca iniciada ou terminada (esqueleto da tabela)
    Loading(bool),
    /// Registros da busca concluída
    Records(Vec<MatchRecord>),
    /// Texto da barra de status (None limpa)
    Status(Option<String>),
}

/// Modo de entrada do teclado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Navegação pelas páginas
    #[default]
    Browse,
    /// Digitando o termo de filtro
    Filter,
}

/// Estado da aplicação
#[derive(Debug)]
pub struct App {
    /// Título (nome da base)
    pub title: String,
    /// Tabela de resultados
    pub table: ResultTable,
    /// Modo de entrada atual
    pub input_mode: InputMode,
    /// Texto do filtro sendo digitado
    pub filter_input: String,
    /// Logs recebidos
    pub logs: VecDeque<LogEntry>,
    /// Status atual
    pub status: Option<String>,
    /// Usuário pediu para sair
    pub should_quit: bool,
}

impl App {
    /// Cria o app sobre uma tabela já existente
    pub fn new(title: impl Into<String>, table: ResultTable) -> Self {
        let filter_input = table.search_term().to_string();
        Self {
            title: title.into(),
            table,
            input_mode: InputMode::Browse,
            filter_input,
            logs: VecDeque::new(),
            status: None,
            should_quit: false,
        }
    }

    /// Processa um evento vindo da busca
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Log(entry) => {
                self.logs.push_back(entry);
                if self.logs.len() > MAX_LOGS {
                    self.logs.pop_front();
                }
            }
            AppEvent::Loading(true) => self.table.begin_loading(),
            AppEvent::Loading(false) => self.table.end_loading(),
            AppEvent::Records(records) => self.table.replace_records(records),
            AppEvent::Status(status) => self.status = status,
        }
    }

    /// Processa uma tecla. Filtragem acontece a cada caractere digitado.
    pub fn handle_key(&mut self, code: KeyCode) {
        match self.input_mode {
            InputMode::Browse => self.handle_browse_key(code),
            InputMode::Filter => self.handle_filter_key(code),
        }
    }

    fn handle_browse_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('/') => self.input_mode = InputMode::Filter,
            KeyCode::Char('n') | KeyCode::Right => {
                self.table.next_page();
            }
            KeyCode::Char('p') | KeyCode::Left => {
                self.table.prev_page();
            }
            KeyCode::Home => self.table.go_to_page(1),
            KeyCode::End => {
                let last = self.table.max_page();
                self.table.go_to_page(last);
            }
            KeyCode::Esc => self.clear_filter(),
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => {
                self.filter_input.push(c);
                self.table.set_search_term(&self.filter_input);
            }
            KeyCode::Backspace => {
                self.filter_input.pop();
                self.table.set_search_term(&self.filter_input);
            }
            KeyCode::Enter => self.input_mode = InputMode::Browse,
            KeyCode::Esc => {
                self.clear_filter();
                self.input_mode = InputMode::Browse;
            }
            _ => {}
        }
    }

    fn clear_filter(&mut self) {
        self.filter_input.clear();
        self.table.set_search_term("");
    }

    /// Últimos logs para o painel
    pub fn recent_logs(&self) -> impl Iterator<Item = &LogEntry> {
        let skip = self.logs.len().saturating_sub(VISIBLE_LOGS);
        self.logs.iter().skip(skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<MatchRecord> {
        (0..n)
            .map(|i| MatchRecord {
                nome: if i % 2 == 0 {
                    format!("Maria {}", i)
                } else {
                    format!("João {}", i)
                },
                status_atual: "ATIVO".into(),
                found: true,
                ..Default::default()
            })
            .collect()
    }

    fn app(n: usize) -> App {
        App::new("base.xlsx", ResultTable::with_records(records(n)))
    }

    #[test]
    fn test_paging_keys() {
        let mut app = app(25);
        app.handle_key(KeyCode::Char('n'));
        assert_eq!(app.table.page(), 2);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.table.page(), 3);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.table.page(), 3);
        app.handle_key(KeyCode::Left);
        app.handle_key(KeyCode::Char('p'));
        assert_eq!(app.table.page(), 1);
        app.handle_key(KeyCode::End);
        assert_eq!(app.table.page(), 3);
        app.handle_key(KeyCode::Home);
        assert_eq!(app.table.page(), 1);
    }

    #[test]
    fn test_filter_mode_filters_while_typing() {
        let mut app = app(20);
        app.handle_key(KeyCode::Char('/'));
        assert_eq!(app.input_mode, InputMode::Filter);

        for c in "maria".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        assert_eq!(app.table.filtered_count(), 10);

        // 'q' dentro do filtro é texto, não sair
        app.handle_key(KeyCode::Char('q'));
        assert!(!app.should_quit);
        assert_eq!(app.table.filtered_count(), 0);

        app.handle_key(KeyCode::Backspace);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Browse);
        assert_eq!(app.table.search_term(), "maria");
    }

    #[test]
    fn test_esc_clears_filter() {
        let mut app = app(20);
        app.handle_key(KeyCode::Char('/'));
        app.handle_key(KeyCode::Char('j'));
        assert_eq!(app.table.filtered_count(), 10);

        app.handle_key(KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Browse);
        assert_eq!(app.table.filtered_count(), 20);
        assert!(app.filter_input.is_empty());
    }

    #[test]
    fn test_quit() {
        let mut app = app(1);
        app.handle_key(KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_events_drive_table() {
        let mut app = App::new("base.xlsx", ResultTable::new());
        app.handle_event(AppEvent::Loading(true));
        assert!(app.table.is_loading());

        app.handle_event(AppEvent::Records(records(3)));
        assert!(!app.table.is_loading());
        assert_eq!(app.table.total_count(), 3);

        app.handle_event(AppEvent::Status(Some("Buscando...".into())));
        assert_eq!(app.status.as_deref(), Some("Buscando..."));
    }

    #[test]
    fn test_log_buffer_is_bounded() {
        let mut app = app(0);
        for i in 0..150 {
            app.handle_event(AppEvent::Log(LogEntry::info(format!("linha {}", i))));
        }
        assert_eq!(app.logs.len(), MAX_LOGS);
        let recent: Vec<_> = app.recent_logs().collect();
        assert_eq!(recent.len(), VISIBLE_LOGS);
        assert_eq!(recent.last().map(|l| l.message.as_str()), Some("linha 149"));
    }
}
