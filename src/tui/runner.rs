//! Runner que conecta a busca com a TUI

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use async_trait::async_trait;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use super::app::{App, AppEvent, LogEntry};
use super::ui;
use crate::gate::PreviewSummary;
use crate::table::ResultTable;
use crate::types::{ActionKind, MatchRecord, NoticeLevel};
use crate::ui::{Progress, UiPort};

/// Executa a TUI sobre a tabela, recebendo eventos da busca
pub fn run_tui(
    title: String,
    table: ResultTable,
    event_rx: Receiver<AppEvent>,
) -> io::Result<App> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(title, table);

    let result = run_app(&mut terminal, &mut app, event_rx);

    // Restaurar terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result?;
    Ok(app)
}

/// Loop principal da TUI
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    event_rx: Receiver<AppEvent>,
) -> io::Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        // Eventos da busca (não bloqueante)
        while let Ok(event) = event_rx.try_recv() {
            app.handle_event(event);
        }

        // Input do usuário (com timeout)
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Cria um canal para enviar eventos para a TUI
pub fn create_event_channel() -> (Sender<AppEvent>, Receiver<AppEvent>) {
    mpsc::channel()
}

/// Envia logs e estado da busca para a TUI.
///
/// Também serve de `UiPort` para o `SearchOrchestrator` enquanto a TUI
/// está aberta. Confirmações não passam pela TUI e são sempre negadas.
#[derive(Clone)]
pub struct TuiLogger {
    tx: Sender<AppEvent>,
}

impl TuiLogger {
    pub fn new(tx: Sender<AppEvent>) -> Self {
        Self { tx }
    }

    pub fn info(&self, msg: impl Into<String>) {
        let _ = self.tx.send(AppEvent::Log(LogEntry::info(msg)));
    }

    pub fn success(&self, msg: impl Into<String>) {
        let _ = self.tx.send(AppEvent::Log(LogEntry::success(msg)));
    }

    pub fn warning(&self, msg: impl Into<String>) {
        let _ = self.tx.send(AppEvent::Log(LogEntry::warning(msg)));
    }

    pub fn error(&self, msg: impl Into<String>) {
        let _ = self.tx.send(AppEvent::Log(LogEntry::error(msg)));
    }

    /// Entrega os registros de uma busca concluída
    pub fn records(&self, records: Vec<MatchRecord>) {
        let _ = self.tx.send(AppEvent::Records(records));
    }
}

#[async_trait]
impl UiPort for TuiLogger {
    fn notify(&self, level: NoticeLevel, message: &str) {
        let entry = LogEntry::new(level.into(), message);
        let _ = self.tx.send(AppEvent::Log(entry));
    }

    fn set_status(&self, status: &str) {
        let _ = self.tx.send(AppEvent::Status(Some(status.to_string())));
    }

    fn clear_status(&self) {
        let _ = self.tx.send(AppEvent::Status(None));
    }

    fn set_progress(&self, _progress: Progress) {}

    fn set_search_busy(&self, busy: bool) {
        let _ = self.tx.send(AppEvent::Loading(busy));
    }

    fn set_action_busy(&self, _action: ActionKind, _busy: bool) {}

    async fn confirm(&self, _summary: &PreviewSummary) -> bool {
        self.warning("Confirmação indisponível na TUI");
        false
    }
}
