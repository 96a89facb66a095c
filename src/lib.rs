//! # Robô de Usuários - Cliente Rust
//!
//! Este crate é o cliente do **Robô de Usuários**, a ferramenta que prepara
//! planilhas de inativação e de cadastro em lote. O casamento de pessoas e a
//! leitura das planilhas ficam no backend HTTP; aqui ficam a validação da
//! entrada, a orquestração das chamadas e o portão de confirmação.
//!
//! ## Fluxo de inativação
//!
//! 1. O operador cola nomes, CPFs ou e-mails (um por linha)
//! 2. O extrator classifica e valida cada linha
//! 3. A busca envia a planilha base e os identificadores ao backend
//! 4. A tabela de resultados mostra o que foi encontrado, com filtro e páginas
//! 5. O portão de confirmação gera uma prévia e só gera a planilha depois
//!    de um "sim" explícito
//!
//! ## Arquitetura Principal
//!
//! ### 1. Extração (`extractor`)
//! Classifica cada linha como CPF, e-mail ou nome completo:
//! - CPFs deduplicados, com a lista de repetidos
//! - Nomes com pelo menos duas palavras
//! - E-mails validados por padrão simples
//!
//! ### 2. Backend (`api`)
//! Trait `BackendClient` com o cliente HTTP (reqwest) e um mock que registra
//! cada chamada para os testes.
//!
//! ### 3. Portão de confirmação (`gate`)
//! Máquina de estados `Idle → Previewing → AwaitingConfirmation → Generating`.
//! Nenhuma planilha é gerada sem confirmação e cada ação tem uma trava
//! contra disparos repetidos.
//!
//! ### 4. Interface (`ui`, `tui`)
//! Os fluxos falam apenas com a trait `UiPort`; o terminal, a TUI e os
//! testes implementam a mesma porta.
//!
//! ## Exemplo de Uso
//!
//! ```rust,ignore
//! use robo_usuarios::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Arc::new(HttpBackendClient::new("http://127.0.0.1:5000")?);
//!     let mut busca = SearchOrchestrator::new(client);
//!     let ids = extract_identifiers("123.456.789-09\nMaria Souza");
//!     let base = UploadFile::read("base.xlsx").await?;
//!     busca.search(Some(&base), &ids, &ConsoleUi::new(false)).await?;
//!     println!("{}", busca.table().page_info());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Tipos fundamentais compartilhados por todo o sistema.
///
/// Este módulo define as estruturas de dados básicas como:
/// - [`MatchRecord`]: Linha retornada pela busca
/// - [`RowStatus`]: Classificação visual da linha
/// - [`UploadFile`]: Planilha enviada ao backend
/// - [`FuzzyParams`]: Parâmetros de fuzzy matching
pub mod types;

/// Extração e validação de identificadores (CPF, nome, e-mail).
pub mod extractor;

/// Cliente do backend.
///
/// Define a trait `BackendClient` e implementações para:
/// - HTTP (reqwest, multipart)
/// - Mock para testes
///
/// Também deriva as mensagens de erro do servidor.
pub mod api;

/// Tabela de resultados: filtro, paginação e exportação CSV.
pub mod table;

/// Orquestrador da busca de candidatos.
pub mod busca;

/// Portão de confirmação da inativação.
///
/// Contém:
/// - `CommitGate`: prévia, confirmação e geração
/// - `GateState`: estados do portão
/// - `PreviewSummary`: resumo da prévia mostrado ao operador
/// - `ActionGuard`: trava de ação em andamento
pub mod gate;

/// Geração da planilha de cadastro em lote.
pub mod cadastro;

/// Armazenamento chave-valor, histórico de ações e preferências.
pub mod history;

/// Porta de interface (`UiPort`) e suas implementações de terminal e teste.
pub mod ui;

/// Configuração via variáveis de ambiente.
///
/// - `ROBO_API_BASE`: URL do backend (padrão: http://127.0.0.1:5000)
/// - `ROBO_DATA_DIR`: diretório do histórico e preferências
/// - `ROBO_OUTPUT_DIR`: diretório das planilhas geradas
/// - `ROBO_USE_FUZZY` / `ROBO_FUZZY_CUTOFF`: padrões de fuzzy matching
/// - `ROBO_HEALTH_TIMEOUT_SECS`: espera de cada sonda do health-check
pub mod config;

/// Erros dos fluxos de trabalho.
pub mod error;

/// Utilitários diversos.
///
/// Funções auxiliares usadas em todo o sistema:
/// - Normalização de texto e CSV
/// - Timestamps e medição de tempo
pub mod utils;

/// Interface de terminal rica (TUI).
///
/// Navegação pela tabela de resultados:
/// - Filtro por nome ou CPF
/// - Páginas de 10 linhas com cores por situação
/// - Logs da busca em tempo real
pub mod tui;

// Re-exports principais
pub use api::{ApiError, BackendClient, HttpBackendClient, MockBackendClient};
pub use busca::SearchOrchestrator;
pub use cadastro::{CadastroFlow, CadastroRequest, Fluxo, LoginChoice};
pub use config::{load_app_config, AppConfig};
pub use error::{ErrorKind, WorkflowError};
pub use extractor::{extract_identifiers, IdentifierSet};
pub use gate::{ActionGuard, CommitGate, GateOutcome, GateState, InactivationInput, PreviewSummary};
pub use table::ResultTable;
pub use types::*;
pub use ui::UiPort;

/// Versão da biblioteca.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude com imports comuns para uso rápido.
///
/// Importar tudo de uma vez:
/// ```rust,ignore
/// use robo_usuarios::prelude::*;
/// ```
pub mod prelude {
    pub use crate::api::{BackendClient, HttpBackendClient, MockBackendClient};
    pub use crate::busca::SearchOrchestrator;
    pub use crate::cadastro::{CadastroFlow, CadastroRequest, Fluxo, LoginChoice};
    pub use crate::error::WorkflowError;
    pub use crate::extractor::extract_identifiers;
    pub use crate::gate::{ActionGuard, CommitGate, GateOutcome, InactivationInput};
    pub use crate::history::{HistoryLog, JsonFileStore, KeyValueStore, MemoryStore};
    pub use crate::types::*;
    pub use crate::ui::{ConsoleUi, UiPort};
    pub use std::sync::Arc;
}
