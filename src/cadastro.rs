// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CADASTRO EM LOTE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Envia uma ou mais planilhas para `/api/process_cadastro` e recebe a
// planilha de saída. Sem prévia: o envio já é a geração.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::api::BackendClient;
use crate::error::WorkflowError;
use crate::gate::ActionGuard;
use crate::history::HistoryLog;
use crate::types::{ActionKind, GeneratedFile, NoticeLevel, UploadFile};
use crate::ui::{Progress, UiPort};
use crate::utils::{format_timestamp, now_millis, ActionTimer};

/// Nome do arquivo gerado pelo cadastro
pub const CADASTRO_OUTPUT: &str = "saida_cadastro.xlsx";

/// Campo usado como login dos novos usuários
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginChoice {
    #[default]
    #[serde(rename = "CPF")]
    Cpf,
    #[serde(rename = "EMAIL")]
    Email,
}

impl LoginChoice {
    pub fn as_field(&self) -> &'static str {
        match self {
            Self::Cpf => "CPF",
            Self::Email => "EMAIL",
        }
    }
}

impl fmt::Display for LoginChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_field())
    }
}

impl FromStr for LoginChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CPF" => Ok(Self::Cpf),
            "EMAIL" | "E-MAIL" => Ok(Self::Email),
            other => Err(format!("login inválido: {} (use cpf ou email)", other)),
        }
    }
}

/// Fluxo de aprovação dos novos usuários
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fluxo {
    /// Autoatendimento
    #[default]
    #[serde(rename = "SELF")]
    SelfService,
    /// Atendimento pelo front (viajante master)
    #[serde(rename = "FRONT")]
    Front,
}

impl Fluxo {
    pub fn as_field(&self) -> &'static str {
        match self {
            Self::SelfService => "SELF",
            Self::Front => "FRONT",
        }
    }

    /// Flags S/N derivadas do fluxo, na ordem do formulário
    pub fn flags(&self) -> [(&'static str, &'static str); 6] {
        let master = match self {
            Self::SelfService => "N",
            Self::Front => "S",
        };
        [
            ("vip", "N"),
            ("viajanteMasterNacional", master),
            ("viajanteMasterInternacional", master),
            ("solicitanteMaster", "N"),
            ("masterAdiantamento", "N"),
            ("masterReembolso", "N"),
        ]
    }
}

impl fmt::Display for Fluxo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_field())
    }
}

impl FromStr for Fluxo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SELF" => Ok(Self::SelfService),
            "FRONT" => Ok(Self::Front),
            other => Err(format!("fluxo inválido: {} (use self ou front)", other)),
        }
    }
}

/// Requisição de cadastro
#[derive(Debug, Clone, PartialEq)]
pub struct CadastroRequest {
    /// Planilhas enviadas como `files[]`
    pub files: Vec<UploadFile>,
    pub login_choice: LoginChoice,
    pub fluxo: Fluxo,
}

impl CadastroRequest {
    /// Campos de texto do multipart (além dos arquivos)
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("login_choice", self.login_choice.as_field().to_string()),
            ("fluxo", self.fluxo.as_field().to_string()),
        ];
        fields.extend(
            self.fluxo
                .flags()
                .iter()
                .map(|(k, v)| (*k, v.to_string())),
        );
        fields
    }
}

/// Fluxo de cadastro em lote
pub struct CadastroFlow {
    client: Arc<dyn BackendClient>,
    guard: Arc<ActionGuard>,
    history: Option<Arc<HistoryLog>>,
}

impl CadastroFlow {
    pub fn new(client: Arc<dyn BackendClient>, guard: Arc<ActionGuard>) -> Self {
        Self {
            client,
            guard,
            history: None,
        }
    }

    pub fn with_history(mut self, history: Arc<HistoryLog>) -> Self {
        self.history = Some(history);
        self
    }

    /// Processa o cadastro. `Ok(None)` quando já havia um em andamento.
    pub async fn run(
        &self,
        request: &CadastroRequest,
        ui: &dyn UiPort,
    ) -> Result<Option<GeneratedFile>, WorkflowError> {
        let Some(_in_flight) = self.guard.try_begin(ActionKind::Cadastro) else {
            log::warn!("⏸️  Cadastro já em andamento; disparo ignorado");
            return Ok(None);
        };

        if request.files.is_empty() {
            let e = WorkflowError::NoFiles;
            ui.notify(NoticeLevel::Danger, &e.to_string());
            return Err(e);
        }

        ui.set_action_busy(ActionKind::Cadastro, true);
        ui.set_status("Processando cadastro...");
        ui.set_progress(Progress::Percent(0));
        log::info!(
            "📤 Cadastro: {} arquivo(s), login {}, fluxo {}",
            request.files.len(),
            request.login_choice,
            request.fluxo
        );

        let timer = ActionTimer::start("Cadastro");
        let result = match self.client.process_cadastro(request).await {
            Ok(bytes) if bytes.is_empty() => Err(WorkflowError::EmptyFile),
            Ok(bytes) => Ok(bytes),
            Err(e) => Err(WorkflowError::from(e)),
        };

        ui.clear_status();
        ui.set_progress(Progress::Hidden);
        ui.set_action_busy(ActionKind::Cadastro, false);

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("❌ Cadastro falhou: {}", e);
                ui.notify(
                    NoticeLevel::Danger,
                    &format!("Erro ao processar cadastro: {}", e),
                );
                return Err(e);
            }
        };
        timer.stop_and_log();

        ui.notify(
            NoticeLevel::Success,
            &format!(
                "Cadastro processado! Opções: {}, {}.",
                request.login_choice, request.fluxo
            ),
        );
        self.record_history(request);

        Ok(Some(GeneratedFile {
            filename: CADASTRO_OUTPUT.to_string(),
            bytes,
        }))
    }

    fn record_history(&self, request: &CadastroRequest) {
        let (Some(history), Some(first)) = (&self.history, request.files.first()) else {
            return;
        };
        let text = format!(
            "Cadastro gerado: {} - {}",
            first.name,
            format_timestamp(now_millis())
        );
        if let Err(e) = history.add(&text) {
            log::warn!("⚠️  Falha ao gravar histórico: {}", e);
        }
    }
}
