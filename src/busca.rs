// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BUSCA DE CANDIDATOS À INATIVAÇÃO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Envia a planilha base e os identificadores extraídos para
// `/api/inativacao/buscar` e guarda os registros na tabela de resultados.
//
// Em falha, os registros anteriores ficam como estavam; só o estado de
// carregamento é desfeito.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::sync::Arc;

use crate::api::BackendClient;
use crate::error::WorkflowError;
use crate::extractor::IdentifierSet;
use crate::table::ResultTable;
use crate::types::{NoticeLevel, UploadFile};
use crate::ui::{Progress, UiPort};
use crate::utils::ActionTimer;

/// Orquestrador da busca; dono da tabela de resultados
pub struct SearchOrchestrator {
    client: Arc<dyn BackendClient>,
    table: ResultTable,
}

impl SearchOrchestrator {
    pub fn new(client: Arc<dyn BackendClient>) -> Self {
        Self {
            client,
            table: ResultTable::new(),
        }
    }

    /// Tabela da última busca (somente leitura dos registros)
    pub fn table(&self) -> &ResultTable {
        &self.table
    }

    /// Tabela para filtro e paginação
    pub fn table_mut(&mut self) -> &mut ResultTable {
        &mut self.table
    }

    /// Entrega a tabela (ex: para o TUI)
    pub fn into_table(self) -> ResultTable {
        self.table
    }

    /// Executa a busca. Devolve a quantidade de registros recebidos.
    ///
    /// Sem base ou sem identificadores válidos nenhuma requisição é enviada.
    pub async fn search(
        &mut self,
        base: Option<&UploadFile>,
        identifiers: &IdentifierSet,
        ui: &dyn UiPort,
    ) -> Result<usize, WorkflowError> {
        let base = match base {
            Some(base) => base,
            None => return Err(precondition(ui, WorkflowError::MissingBase)),
        };
        if identifiers.is_empty() {
            return Err(precondition(ui, WorkflowError::NoIdentifiers));
        }

        let itens = identifiers.items();
        log::info!(
            "🔎 Buscando {} identificador(es) em {}",
            itens.len(),
            base.name
        );

        self.table.begin_loading();
        ui.set_search_busy(true);
        ui.set_progress(Progress::Indeterminate);

        let timer = ActionTimer::start("Busca");
        let result = self.client.buscar(base, &itens).await;

        ui.set_progress(Progress::Hidden);
        ui.set_search_busy(false);

        match result {
            Ok(response) => {
                timer.stop_and_log();
                let count = response.items.len();
                let not_found = response.items.iter().filter(|r| !r.found).count();
                self.table.replace_records(response.items);
                log::info!("✅ Busca: {} registro(s), {} não encontrado(s)", count, not_found);
                ui.notify(
                    NoticeLevel::Info,
                    &format!("{} registro(s) retornado(s)", count),
                );
                Ok(count)
            }
            Err(e) => {
                self.table.end_loading();
                let error = WorkflowError::from(e);
                log::warn!("❌ Busca falhou: {}", error);
                ui.notify(NoticeLevel::Danger, &error.to_string());
                Err(error)
            }
        }
    }
}

fn precondition(ui: &dyn UiPort, error: WorkflowError) -> WorkflowError {
    ui.notify(NoticeLevel::Danger, &error.to_string());
    error
}
