// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PORTA DE INTERFACE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Tudo que os fluxos precisam da interface passa por `UiPort`:
// notificações, status, progresso, estado ocupado e a confirmação da prévia.
// O terminal (`ConsoleUi`) e os testes (`ScriptedUi`) implementam a mesma trait.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::gate::PreviewSummary;
use crate::types::{ActionKind, NoticeLevel};

/// Indicador de progresso
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Escondido
    Hidden,
    /// Em andamento sem porcentagem conhecida
    Indeterminate,
    /// Porcentagem (0 - 100)
    Percent(u8),
}

/// Operações de interface usadas pelos fluxos
#[async_trait]
pub trait UiPort: Send + Sync {
    /// Mostra uma notificação ao usuário
    fn notify(&self, level: NoticeLevel, message: &str);

    /// Atualiza o texto de status
    fn set_status(&self, status: &str);

    /// Limpa o texto de status
    fn clear_status(&self);

    /// Atualiza o indicador de progresso
    fn set_progress(&self, progress: Progress);

    /// Habilita/desabilita o botão de busca
    fn set_search_busy(&self, busy: bool);

    /// Habilita/desabilita o botão de uma ação em lote
    fn set_action_busy(&self, action: ActionKind, busy: bool);

    /// Pede a confirmação explícita da prévia. Sem timeout.
    async fn confirm(&self, summary: &PreviewSummary) -> bool;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// INTERFACE DE TERMINAL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Interface de linha de comando: mensagens em stdout/stderr e
/// confirmação por prompt `[s/N]`
pub struct ConsoleUi {
    auto_confirm: bool,
    inactive_export: Option<PathBuf>,
}

impl ConsoleUi {
    pub fn new(auto_confirm: bool) -> Self {
        Self {
            auto_confirm,
            inactive_export: None,
        }
    }

    /// Grava o CSV das correspondências já inativas ao mostrar a prévia
    pub fn with_inactive_export(mut self, path: impl Into<PathBuf>) -> Self {
        self.inactive_export = Some(path.into());
        self
    }

    async fn export_inactive(&self, summary: &PreviewSummary) {
        let Some(path) = &self.inactive_export else {
            return;
        };
        match summary.inactive_csv() {
            Some(csv) => match tokio::fs::write(path, csv).await {
                Ok(()) => println!(
                    "📄 {} correspondência(s) inativa(s) exportada(s) para {}",
                    summary.inactive_rows.len(),
                    path.display()
                ),
                Err(e) => eprintln!("⚠️  Falha ao gravar {}: {}", path.display(), e),
            },
            None => println!("📄 Nenhuma correspondência inativa para exportar"),
        }
    }
}

#[async_trait]
impl UiPort for ConsoleUi {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => println!("ℹ️  {}", message),
            NoticeLevel::Success => println!("✅ {}", message),
            NoticeLevel::Warning => eprintln!("⚠️  {}", message),
            NoticeLevel::Danger => eprintln!("❌ Erro: {}", message),
        }
    }

    fn set_status(&self, status: &str) {
        eprintln!("⏳ {}", status);
    }

    fn clear_status(&self) {}

    fn set_progress(&self, progress: Progress) {
        if let Progress::Percent(pct) = progress {
            eprintln!("   {}%", pct);
        }
    }

    fn set_search_busy(&self, busy: bool) {
        log::debug!("busca ocupada: {}", busy);
    }

    fn set_action_busy(&self, action: ActionKind, busy: bool) {
        log::debug!("{} ocupada: {}", action, busy);
    }

    async fn confirm(&self, summary: &PreviewSummary) -> bool {
        println!("\n━━━ Confirmar inativação ━━━");
        println!("{}", summary.render_text());
        self.export_inactive(summary).await;

        if self.auto_confirm {
            println!("→ Confirmado automaticamente (--sim)");
            return true;
        }

        let answer = tokio::task::spawn_blocking(|| {
            print!("Gerar inativação? [s/N] ");
            let _ = std::io::stdout().flush();
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_yes(&line),
            _ => false,
        }
    }
}

/// "s", "sim", "y" ou "yes" (sem diferenciar maiúsculas)
pub fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "sim" | "y" | "yes"
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// INTERFACE ROTEIRIZADA PARA TESTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Evento observado pela interface roteirizada
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Notice(NoticeLevel, String),
    Status(Option<String>),
    Progress(Progress),
    SearchBusy(bool),
    ActionBusy(ActionKind, bool),
    /// Confirmação pedida, com o total exibido
    Confirm(f64),
}

/// Interface com respostas pré-definidas para `confirm` e registro de eventos
#[derive(Debug, Default)]
pub struct ScriptedUi {
    answers: Mutex<VecDeque<bool>>,
    events: Mutex<Vec<UiEvent>>,
}

impl ScriptedUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Próximas respostas de `confirm`; sem resposta, recusa
    pub fn with_answers(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Notificações recebidas, em ordem
    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Notice(level, msg) => Some((level, msg)),
                _ => None,
            })
            .collect()
    }

    /// Última notificação de erro
    pub fn last_error(&self) -> Option<String> {
        self.notices()
            .into_iter()
            .rev()
            .find(|(level, _)| *level == NoticeLevel::Danger)
            .map(|(_, msg)| msg)
    }

    fn push(&self, event: UiEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[async_trait]
impl UiPort for ScriptedUi {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.push(UiEvent::Notice(level, message.to_string()));
    }

    fn set_status(&self, status: &str) {
        self.push(UiEvent::Status(Some(status.to_string())));
    }

    fn clear_status(&self) {
        self.push(UiEvent::Status(None));
    }

    fn set_progress(&self, progress: Progress) {
        self.push(UiEvent::Progress(progress));
    }

    fn set_search_busy(&self, busy: bool) {
        self.push(UiEvent::SearchBusy(busy));
    }

    fn set_action_busy(&self, action: ActionKind, busy: bool) {
        self.push(UiEvent::ActionBusy(action, busy));
    }

    async fn confirm(&self, summary: &PreviewSummary) -> bool {
        self.push(UiEvent::Confirm(summary.display_count));
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .unwrap_or(false)
    }
}
