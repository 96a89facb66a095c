// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PORTÃO DE CONFIRMAÇÃO DA INATIVAÇÃO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Prévia → confirmação explícita → geração da planilha.
//
// A geração é irreversível do lado do negócio, então só acontece depois que
// o usuário aprova o resumo. Cancelar não envia nada ao backend.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

mod guard;
mod state;
mod summary;

pub use guard::{ActionGuard, InFlight};
pub use state::GateState;
pub use summary::{stats_label, InactiveGroup, PreviewSummary, RECORD_ROWS, SAMPLE_ROWS};

use std::sync::{Arc, Mutex};

use crate::api::{BackendClient, InactivationRequest, ListSource};
use crate::error::WorkflowError;
use crate::extractor::extract_identifiers;
use crate::history::HistoryLog;
use crate::types::{ActionKind, FuzzyParams, GeneratedFile, MatchRecord, NoticeLevel, UploadFile};
use crate::ui::{Progress, UiPort};
use crate::utils::{format_timestamp, now_millis, ActionTimer};

/// Nome do arquivo gerado pela inativação
pub const INATIVACAO_OUTPUT: &str = "saida_inativacao.xlsx";

/// Resultado de um disparo da inativação
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Planilha gerada e pronta para salvar
    Generated(GeneratedFile),
    /// Usuário recusou a prévia; nada foi enviado depois dela
    Cancelled,
    /// Já havia uma inativação em andamento; disparo descartado
    Ignored,
}

/// Entrada da inativação, como o usuário deixou a tela
#[derive(Debug, Clone, Default)]
pub struct InactivationInput {
    /// Planilha base (obrigatória)
    pub base: Option<UploadFile>,
    /// Planilha com a lista, quando enviada
    pub lista_file: Option<UploadFile>,
    /// Texto colado
    pub lista_text: String,
    /// Registros da última busca
    pub prefetched: Vec<MatchRecord>,
    /// Parâmetros de fuzzy matching
    pub fuzzy: FuzzyParams,
}

impl InactivationInput {
    /// Resolve a requisição: lista em arquivo, senão texto colado com pelo
    /// menos um identificador válido, senão CPF (ou nome) de cada registro
    /// da última busca.
    pub fn resolve(&self) -> Result<InactivationRequest, WorkflowError> {
        let base = self.base.clone().ok_or(WorkflowError::MissingBase)?;

        let lista = if let Some(file) = &self.lista_file {
            ListSource::File(file.clone())
        } else if !extract_identifiers(&self.lista_text).is_empty() {
            ListSource::Text(self.lista_text.clone())
        } else {
            let from_results: Vec<&str> = self
                .prefetched
                .iter()
                .map(|r| if r.cpf.is_empty() { r.nome.as_str() } else { r.cpf.as_str() })
                .filter(|v| !v.is_empty())
                .collect();
            if from_results.is_empty() {
                return Err(if self.lista_text.trim().is_empty() {
                    WorkflowError::MissingList
                } else {
                    WorkflowError::NoIdentifiers
                });
            }
            ListSource::Text(from_results.join("\n"))
        };

        Ok(InactivationRequest {
            base,
            lista,
            fuzzy: self.fuzzy,
        })
    }
}

/// Portão de confirmação: prévia, confirmação e geração
pub struct CommitGate {
    client: Arc<dyn BackendClient>,
    guard: Arc<ActionGuard>,
    history: Option<Arc<HistoryLog>>,
    state: Mutex<GateState>,
}

impl CommitGate {
    pub fn new(client: Arc<dyn BackendClient>, guard: Arc<ActionGuard>) -> Self {
        Self {
            client,
            guard,
            history: None,
            state: Mutex::new(GateState::Idle),
        }
    }

    /// Registra as gerações bem-sucedidas no histórico
    pub fn with_history(mut self, history: Arc<HistoryLog>) -> Self {
        self.history = Some(history);
        self
    }

    /// Estado atual (cópia)
    pub fn state(&self) -> GateState {
        self.state
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    fn transition(&self, next: GateState) {
        if let Ok(mut state) = self.state.lock() {
            if !state.can_transition_to(&next) {
                log::warn!(
                    "⚠️  Transição inesperada {} → {}",
                    state.name(),
                    next.name()
                );
            }
            log::debug!("🔀 {} → {}", state.name(), next.name());
            *state = next;
        }
    }

    /// Volta ao ocioso limpando status, progresso e botão
    fn back_to_idle(&self, ui: &dyn UiPort) {
        self.transition(GateState::Idle);
        ui.clear_status();
        ui.set_progress(Progress::Hidden);
        ui.set_action_busy(ActionKind::Inativacao, false);
    }

    fn fail(&self, ui: &dyn UiPort, error: WorkflowError) -> WorkflowError {
        log::warn!("❌ Inativação falhou: {}", error);
        self.back_to_idle(ui);
        ui.notify(NoticeLevel::Danger, &error.to_string());
        error
    }

    /// Dispara a inativação: prévia, confirmação e geração.
    ///
    /// Um disparo enquanto outro está em andamento devolve `Ignored`.
    pub async fn run(
        &self,
        input: &InactivationInput,
        ui: &dyn UiPort,
    ) -> Result<GateOutcome, WorkflowError> {
        let Some(_in_flight) = self.guard.try_begin(ActionKind::Inativacao) else {
            log::warn!("⏸️  Inativação já em andamento; disparo ignorado");
            return Ok(GateOutcome::Ignored);
        };

        let request = match input.resolve() {
            Ok(request) => request,
            Err(e) => {
                ui.notify(NoticeLevel::Danger, &e.to_string());
                return Err(e);
            }
        };

        // ── Prévia ──
        self.transition(GateState::Previewing);
        ui.set_action_busy(ActionKind::Inativacao, true);
        ui.set_status("Gerando prévia...");
        ui.set_progress(Progress::Indeterminate);
        log::info!(
            "🔍 Prévia da inativação: base {}, lista {}",
            request.base.name,
            request.lista.describe()
        );

        let timer = ActionTimer::start("Prévia da inativação");
        let preview = match self.client.preview_inativacao(&request).await {
            Ok(preview) => preview,
            Err(e) => return Err(self.fail(ui, e.into())),
        };
        timer.stop_and_log();

        // ── Confirmação ──
        let summary = PreviewSummary::from_response(&preview);
        log::info!(
            "📋 Prévia: {} correspondência(s), inativos: {}",
            summary.display_count,
            summary.has_inactive()
        );
        self.transition(GateState::AwaitingConfirmation {
            summary: summary.clone(),
        });
        ui.set_status("Aguardando confirmação");
        ui.set_progress(Progress::Hidden);

        if !ui.confirm(&summary).await {
            log::info!("🚫 Inativação cancelada pelo usuário");
            self.back_to_idle(ui);
            return Ok(GateOutcome::Cancelled);
        }

        // ── Geração ──
        self.transition(GateState::Generating);
        ui.set_status("Gerando planilha...");
        ui.set_progress(Progress::Percent(0));

        let timer = ActionTimer::start("Geração da inativação");
        let bytes = match self.client.process_inativacao(&request).await {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.fail(ui, e.into())),
        };
        if bytes.is_empty() {
            return Err(self.fail(ui, WorkflowError::EmptyFile));
        }
        timer.stop_and_log();

        ui.set_progress(Progress::Percent(100));
        self.record_history(&request);
        self.back_to_idle(ui);
        ui.notify(NoticeLevel::Success, "Inativação processada.");

        Ok(GateOutcome::Generated(GeneratedFile {
            filename: INATIVACAO_OUTPUT.to_string(),
            bytes,
        }))
    }

    fn record_history(&self, request: &InactivationRequest) {
        let Some(history) = &self.history else {
            return;
        };
        let text = format!(
            "Inativação gerada: Base {}, Lista {} - {}",
            request.base.name,
            request.lista.describe(),
            format_timestamp(now_millis())
        );
        if let Err(e) = history.add(&text) {
            log::warn!("⚠️  Falha ao gravar histórico: {}", e);
        }
    }
}
