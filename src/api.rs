// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CLIENTE DO BACKEND
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Trait e implementações para os endpoints consumidos:
//   POST /api/inativacao/buscar     → JSON { items }
//   POST /api/preview_inativacao    → JSON { count, sample, records, stats }
//   POST /api/process_inativacao    → planilha binária
//   POST /api/process_cadastro      → planilha binária
//   GET  /health                    → online/offline
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Mutex;
use std::time::Duration;

use crate::cadastro::CadastroRequest;
use crate::types::{FuzzyParams, MatchRecord, UploadFile};
use crate::utils::ActionTimer;

/// Erros do cliente do backend
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("Erro de rede: {0}")]
    Network(String),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Resposta inválida do servidor: {0}")]
    InvalidResponse(String),

    #[error("URL inválida: {0}")]
    InvalidUrl(String),
}

/// Origem da lista de inativação
#[derive(Debug, Clone, PartialEq)]
pub enum ListSource {
    /// Planilha enviada como `lista`
    File(UploadFile),
    /// Texto colado enviado como `lista_text`
    Text(String),
}

impl ListSource {
    /// Descrição curta para o histórico ("texto" ou nome do arquivo)
    pub fn describe(&self) -> &str {
        match self {
            Self::File(file) => &file.name,
            Self::Text(_) => "texto",
        }
    }
}

/// Corpo das requisições de prévia e de geração da inativação
#[derive(Debug, Clone, PartialEq)]
pub struct InactivationRequest {
    /// Planilha base
    pub base: UploadFile,
    /// Lista de usuários a inativar
    pub lista: ListSource,
    /// Parâmetros de fuzzy matching
    pub fuzzy: FuzzyParams,
}

/// Resposta de `/api/inativacao/buscar`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    /// Registros encontrados e não encontrados
    pub items: Vec<MatchRecord>,
    /// Total informado pelo servidor
    #[serde(default)]
    pub total: Option<u64>,
    /// CPFs duplicados detectados no servidor
    #[serde(default)]
    pub duplicates: Vec<Value>,
    /// Identificadores sem correspondência
    #[serde(default)]
    pub not_found: Vec<Value>,
}

/// Resposta de `/api/preview_inativacao`.
///
/// Todos os campos são opcionais e de tipo livre; os acessores toleram
/// ausência e tipos inesperados.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PreviewResponse {
    #[serde(default)]
    count: Option<Value>,
    #[serde(default)]
    sample: Option<Value>,
    #[serde(default)]
    records: Option<Value>,
    #[serde(default)]
    columns: Option<Value>,
    #[serde(default)]
    stats: Option<Value>,
}

impl PreviewResponse {
    /// Constrói a partir de um JSON arbitrário (objeto esperado)
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// `count` numérico, 0 quando ausente
    pub fn count(&self) -> u64 {
        self.count.as_ref().and_then(number_as_u64).unwrap_or(0)
    }

    /// Linhas de amostra (apenas objetos)
    pub fn sample(&self) -> Vec<Map<String, Value>> {
        object_rows(self.sample.as_ref())
    }

    /// Registros detalhados (apenas objetos)
    pub fn records(&self) -> Vec<Map<String, Value>> {
        object_rows(self.records.as_ref())
    }

    /// Colunas sugeridas pelo servidor
    pub fn columns(&self) -> Option<Vec<String>> {
        self.columns.as_ref().and_then(Value::as_array).map(|cols| {
            cols.iter()
                .filter_map(|c| c.as_str().map(String::from))
                .collect()
        })
    }

    /// Objeto `stats`, quando presente
    pub fn stats(&self) -> Option<&Map<String, Value>> {
        self.stats.as_ref().and_then(Value::as_object)
    }

    /// `stats.total_matches`, apenas quando é um número (fração e sinal preservados)
    pub fn total_matches(&self) -> Option<f64> {
        self.stats()
            .and_then(|s| s.get("total_matches"))
            .and_then(Value::as_f64)
    }

    /// `stats.inactive_matches`, na ordem enviada pelo servidor
    pub fn inactive_matches(&self) -> Option<&Map<String, Value>> {
        self.stats()
            .and_then(|s| s.get("inactive_matches"))
            .and_then(Value::as_object)
    }
}

fn number_as_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
}

fn object_rows(value: Option<&Value>) -> Vec<Map<String, Value>> {
    value
        .and_then(Value::as_array)
        .map(|rows| rows.iter().filter_map(|r| r.as_object().cloned()).collect())
        .unwrap_or_default()
}

/// Trait principal para o backend.
///
/// Permite trocar o cliente HTTP real por um mock nos testes.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Busca os identificadores na base
    async fn buscar(&self, base: &UploadFile, itens: &[String])
        -> Result<SearchResponse, ApiError>;

    /// Prévia (dry-run) da inativação
    async fn preview_inativacao(
        &self,
        request: &InactivationRequest,
    ) -> Result<PreviewResponse, ApiError>;

    /// Gera a planilha de inativação; o corpo pode vir vazio
    async fn process_inativacao(&self, request: &InactivationRequest)
        -> Result<Vec<u8>, ApiError>;

    /// Gera a planilha de cadastro; o corpo pode vir vazio
    async fn process_cadastro(&self, request: &CadastroRequest) -> Result<Vec<u8>, ApiError>;

    /// Verifica se a API está online. Nunca falha.
    async fn health(&self) -> bool;
}

/// Mensagem de uma busca recusada: campo `error` do corpo, senão genérica
pub fn search_error_message(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(String::from))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| SEARCH_FAILED.to_string())
}

/// Mensagem genérica de falha na busca
pub const SEARCH_FAILED: &str = "Falha na busca";

/// Deriva a mensagem de erro de uma resposta não-2xx.
///
/// JSON: `error`, senão `message`, senão o texto cru, senão `Server <status>`,
/// com ` | details: <errors>` quando houver. Fora de JSON: `Server <status>: <texto>`.
pub fn server_error_message(status: u16, body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body).trim().to_string();

    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(&text) {
        let message = ["error", "message"]
            .iter()
            .find_map(|key| {
                obj.get(*key)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
            })
            .unwrap_or_else(|| format!("Server {}", status));
        let details = obj
            .get("errors")
            .filter(|e| !e.is_null())
            .map(|e| format!(" | details: {}", e))
            .unwrap_or_default();
        return format!("{}{}", message, details);
    }

    if !text.is_empty() {
        return format!("Server {}: {}", status, text);
    }

    match StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
    {
        Some(reason) => format!("Server {}: {}", status, reason),
        None => format!("Server {}", status),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO MOCK PARA TESTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Chamada registrada pelo mock
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Buscar { base: String, itens: Vec<String> },
    Preview(InactivationRequest),
    Process(InactivationRequest),
    Cadastro(CadastroRequest),
    Health,
}

/// Cliente mock para testes: respostas fixas e registro de chamadas
#[derive(Debug)]
pub struct MockBackendClient {
    pub search_result: Result<SearchResponse, ApiError>,
    pub preview_result: Result<PreviewResponse, ApiError>,
    pub process_result: Result<Vec<u8>, ApiError>,
    pub cadastro_result: Result<Vec<u8>, ApiError>,
    pub online: bool,
    /// Atraso artificial em cada chamada (simula requisição em andamento)
    pub delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Default for MockBackendClient {
    fn default() -> Self {
        Self {
            search_result: Ok(SearchResponse::default()),
            preview_result: Ok(PreviewResponse::default()),
            process_result: Ok(b"PK\x03\x04mock-xlsx".to_vec()),
            cadastro_result: Ok(b"PK\x03\x04mock-xlsx".to_vec()),
            online: true,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockBackendClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_items(mut self, items: Vec<MatchRecord>) -> Self {
        self.search_result = Ok(SearchResponse {
            total: Some(items.len() as u64),
            items,
            ..Default::default()
        });
        self
    }

    pub fn with_search_error(mut self, error: ApiError) -> Self {
        self.search_result = Err(error);
        self
    }

    pub fn with_preview(mut self, preview: Value) -> Self {
        self.preview_result = Ok(PreviewResponse::from_value(preview));
        self
    }

    pub fn with_preview_error(mut self, error: ApiError) -> Self {
        self.preview_result = Err(error);
        self
    }

    pub fn with_process_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.process_result = Ok(bytes);
        self
    }

    pub fn with_process_error(mut self, error: ApiError) -> Self {
        self.process_result = Err(error);
        self
    }

    pub fn with_cadastro_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.cadastro_result = Ok(bytes);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn offline(mut self) -> Self {
        self.online = false;
        self
    }

    /// Cópia das chamadas recebidas, em ordem
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: RecordedCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    async fn wait(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl BackendClient for MockBackendClient {
    async fn buscar(
        &self,
        base: &UploadFile,
        itens: &[String],
    ) -> Result<SearchResponse, ApiError> {
        self.record(RecordedCall::Buscar {
            base: base.name.clone(),
            itens: itens.to_vec(),
        });
        self.wait().await;
        self.search_result.clone()
    }

    async fn preview_inativacao(
        &self,
        request: &InactivationRequest,
    ) -> Result<PreviewResponse, ApiError> {
        self.record(RecordedCall::Preview(request.clone()));
        self.wait().await;
        self.preview_result.clone()
    }

    async fn process_inativacao(
        &self,
        request: &InactivationRequest,
    ) -> Result<Vec<u8>, ApiError> {
        self.record(RecordedCall::Process(request.clone()));
        self.wait().await;
        self.process_result.clone()
    }

    async fn process_cadastro(&self, request: &CadastroRequest) -> Result<Vec<u8>, ApiError> {
        self.record(RecordedCall::Cadastro(request.clone()));
        self.wait().await;
        self.cadastro_result.clone()
    }

    async fn health(&self) -> bool {
        self.record(RecordedCall::Health);
        self.online
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO HTTP (reqwest)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cliente HTTP para o backend Flask
pub struct HttpBackendClient {
    base_url: String,
    health_timeout: Duration,
    client: reqwest::Client,
}

impl HttpBackendClient {
    /// Cria o cliente; `base_url` precisa ser uma URL absoluta
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        url::Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            health_timeout: Duration::from_secs(6),
            client: reqwest::Client::new(),
        })
    }

    /// Espera máxima de cada sonda de health-check
    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    /// URL base sem barra final
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn file_part(file: &UploadFile) -> Result<Part, ApiError> {
        Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)
            .map_err(|e| ApiError::InvalidResponse(format!("MIME inválido {}: {}", file.mime, e)))
    }

    fn inactivation_form(request: &InactivationRequest) -> Result<Form, ApiError> {
        let mut form = Form::new().part("base", Self::file_part(&request.base)?);
        form = match &request.lista {
            ListSource::File(file) => form.part("lista", Self::file_part(file)?),
            ListSource::Text(text) => form.text("lista_text", text.clone()),
        };
        Ok(form
            .text("use_fuzzy", request.fuzzy.use_fuzzy_field())
            .text("fuzzy_cutoff", request.fuzzy.cutoff_field()))
    }

    /// Envia o multipart e devolve (status, corpo); erros de transporte viram `Network`
    async fn post_form(&self, path: &str, form: Form) -> Result<(u16, Vec<u8>), ApiError> {
        let timer = ActionTimer::start(path);
        let response = self
            .client
            .post(self.endpoint(path))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                log::warn!("🌐 Falha de rede em {}: {}", path, e);
                ApiError::Network(e.to_string())
            })?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        timer.stop_and_log();
        log::info!("📨 {} → HTTP {} ({} bytes)", path, status, body.len());
        Ok((status, body.to_vec()))
    }

    fn check_status(status: u16, body: &[u8]) -> Result<(), ApiError> {
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(ApiError::Server {
                status,
                message: server_error_message(status, body),
            })
        }
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn buscar(
        &self,
        base: &UploadFile,
        itens: &[String],
    ) -> Result<SearchResponse, ApiError> {
        let itens_json = serde_json::to_string(itens)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        let form = Form::new()
            .part("base", Self::file_part(base)?)
            .text("itens", itens_json);

        let (status, body) = self.post_form("/api/inativacao/buscar", form).await?;
        if !(200..300).contains(&status) {
            return Err(ApiError::Server {
                status,
                message: search_error_message(&body),
            });
        }
        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn preview_inativacao(
        &self,
        request: &InactivationRequest,
    ) -> Result<PreviewResponse, ApiError> {
        let form = Self::inactivation_form(request)?;
        let (status, body) = self.post_form("/api/preview_inativacao", form).await?;
        Self::check_status(status, &body)?;
        // Corpo vazio ou fora de JSON num 2xx vale como prévia vazia
        Ok(serde_json::from_slice::<Value>(&body)
            .map(PreviewResponse::from_value)
            .unwrap_or_default())
    }

    async fn process_inativacao(
        &self,
        request: &InactivationRequest,
    ) -> Result<Vec<u8>, ApiError> {
        let form = Self::inactivation_form(request)?;
        let (status, body) = self.post_form("/api/process_inativacao", form).await?;
        Self::check_status(status, &body)?;
        Ok(body)
    }

    async fn process_cadastro(&self, request: &CadastroRequest) -> Result<Vec<u8>, ApiError> {
        let mut form = Form::new();
        for file in &request.files {
            form = form.part("files[]", Self::file_part(file)?);
        }
        for (key, value) in request.form_fields() {
            form = form.text(key, value);
        }
        let (status, body) = self.post_form("/api/process_cadastro", form).await?;
        Self::check_status(status, &body)?;
        Ok(body)
    }

    async fn health(&self) -> bool {
        let candidates = [
            self.endpoint("/health"),
            self.endpoint("/api/health"),
            self.endpoint("/"),
        ];

        for url in &candidates {
            let probe = self
                .client
                .get(url)
                .timeout(self.health_timeout)
                .send()
                .await;
            match probe {
                Ok(resp) if resp.status().is_success() => {
                    log::debug!("💚 API online via {}", url);
                    return true;
                }
                Ok(resp) => log::debug!("health {} → HTTP {}", url, resp.status()),
                Err(e) => log::debug!("health {} falhou: {}", url, e),
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_error_message_json() {
        let body = br#"{"error": "Envie a base"}"#;
        assert_eq!(server_error_message(400, body), "Envie a base");

        let body = br#"{"message": "Algo deu errado"}"#;
        assert_eq!(server_error_message(500, body), "Algo deu errado");

        let body = br#"{"error": "Nenhum registro processado", "errors": ["linha 2"]}"#;
        assert_eq!(
            server_error_message(400, body),
            "Nenhum registro processado | details: [\"linha 2\"]"
        );

        let body = br#"{"other": 1}"#;
        assert_eq!(server_error_message(502, body), "Server 502");
    }

    #[test]
    fn test_search_error_message() {
        assert_eq!(
            search_error_message(br#"{"error": "Planilha base sem coluna CPF"}"#),
            "Planilha base sem coluna CPF"
        );
        assert_eq!(search_error_message(br#"{"message": "Algo deu errado"}"#), SEARCH_FAILED);
        assert_eq!(search_error_message(b"Internal explosion"), SEARCH_FAILED);
        assert_eq!(search_error_message(b""), "Falha na busca");
    }

    #[test]
    fn test_server_error_message_raw_text() {
        assert_eq!(
            server_error_message(500, b"Internal explosion"),
            "Server 500: Internal explosion"
        );
        assert_eq!(
            server_error_message(404, b""),
            "Server 404: Not Found"
        );
    }

    #[test]
    fn test_preview_response_tolerates_missing_fields() {
        let preview = PreviewResponse::from_value(json!({}));
        assert_eq!(preview.count(), 0);
        assert!(preview.sample().is_empty());
        assert!(preview.records().is_empty());
        assert!(preview.stats().is_none());
        assert!(preview.total_matches().is_none());
        assert!(preview.columns().is_none());
    }

    #[test]
    fn test_preview_response_odd_types() {
        let preview = PreviewResponse::from_value(json!({
            "count": "7",
            "sample": [1, {"CPF": "1"}, "x"],
            "stats": {"total_matches": "5"}
        }));
        assert_eq!(preview.count(), 0);
        assert_eq!(preview.sample().len(), 1);
        assert!(preview.total_matches().is_none());
    }

    #[test]
    fn test_total_matches_keeps_any_number() {
        let fractional = PreviewResponse::from_value(json!({"stats": {"total_matches": 5.7}}));
        assert_eq!(fractional.total_matches(), Some(5.7));

        let negative = PreviewResponse::from_value(json!({"stats": {"total_matches": -2}}));
        assert_eq!(negative.total_matches(), Some(-2.0));
    }

    #[test]
    fn test_preview_response_full() {
        let preview = PreviewResponse::from_value(json!({
            "count": 3,
            "columns": ["Login", "Email"],
            "stats": {
                "total_matches": 5,
                "inactive_matches": {"cpf": [{}, {}], "exact": []}
            }
        }));
        assert_eq!(preview.count(), 3);
        assert_eq!(preview.total_matches(), Some(5.0));
        assert_eq!(preview.columns(), Some(vec!["Login".into(), "Email".into()]));
        let inactive = preview.inactive_matches().unwrap();
        let keys: Vec<_> = inactive.keys().cloned().collect();
        assert_eq!(keys, vec!["cpf", "exact"]);
    }

    #[test]
    fn test_search_response_requires_items() {
        let ok: Result<SearchResponse, _> =
            serde_json::from_value(json!({"items": [], "total": 0}));
        assert!(ok.is_ok());
        let missing: Result<SearchResponse, _> = serde_json::from_value(json!({"total": 0}));
        assert!(missing.is_err());
    }

    #[test]
    fn test_http_client_rejects_relative_url() {
        assert!(matches!(
            HttpBackendClient::new("nao-e-url"),
            Err(ApiError::InvalidUrl(_))
        ));
        let client = HttpBackendClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.endpoint("/health"), "http://localhost:5000/health");
    }

    #[test]
    fn test_list_source_describe() {
        assert_eq!(ListSource::Text("a".into()).describe(), "texto");
        let file = UploadFile::new("lista.xlsx", vec![1]);
        assert_eq!(ListSource::File(file).describe(), "lista.xlsx");
    }

    #[tokio::test]
    async fn test_mock_records_calls() {
        let mock = MockBackendClient::new();
        let base = UploadFile::new("base.xlsx", vec![1]);
        let _ = mock.buscar(&base, &["12345678909".to_string()]).await;
        assert!(mock.health().await);
        assert_eq!(
            mock.calls(),
            vec![
                RecordedCall::Buscar {
                    base: "base.xlsx".into(),
                    itens: vec!["12345678909".into()],
                },
                RecordedCall::Health,
            ]
        );
    }
}
