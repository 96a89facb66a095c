// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TIPOS COMPARTILHADOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Tamanho fixo da página da tabela de resultados
pub const PAGE_SIZE: usize = 10;

/// Tipo de ação em lote (cada tipo tem seu próprio flag de execução)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Cadastro de usuários em lote
    Cadastro,
    /// Inativação de usuários em lote
    Inativacao,
}

impl ActionKind {
    /// Nome legível para logs e mensagens
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Cadastro => "cadastro",
            Self::Inativacao => "inativação",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Severidade de uma notificação ao usuário
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informação
    Info,
    /// Sucesso
    Success,
    /// Aviso
    Warning,
    /// Erro
    Danger,
}

/// Classificação visual de uma linha de resultado.
///
/// É o sinal principal do operador para decidir se prossegue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// Identificador não encontrado na base
    NotFound,
    /// Encontrado e com status "ATIVO"
    Active,
    /// Encontrado com qualquer outro status não vazio (inativo/bloqueado)
    Inactive,
    /// Encontrado mas sem status informado
    Unclassified,
}

impl RowStatus {
    /// Rótulo curto para a coluna de situação
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotFound => "não encontrado na base",
            Self::Active => "ativo",
            Self::Inactive => "inativo/bloqueado",
            Self::Unclassified => "",
        }
    }
}

/// Uma linha retornada pela busca de inativação
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// UserId na base, quando existir
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub id: Option<String>,
    /// Nome completo
    #[serde(default, deserialize_with = "lenient_string")]
    pub nome: String,
    /// CPF (apenas dígitos, sem formatação)
    #[serde(default, deserialize_with = "lenient_string")]
    pub cpf: String,
    /// E-mail
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    /// Status atual na base (ex: "ATIVO", "INATIVO", "Não localizado")
    #[serde(default, deserialize_with = "lenient_string")]
    pub status_atual: String,
    /// Se o identificador bateu com algum registro da base
    #[serde(default)]
    pub found: bool,
}

impl MatchRecord {
    /// Classificação de três vias (mais o caso sem status)
    pub fn row_status(&self) -> RowStatus {
        if !self.found {
            return RowStatus::NotFound;
        }
        let status = self.status_atual.trim().to_uppercase();
        if status == "ATIVO" {
            RowStatus::Active
        } else if !status.is_empty() {
            RowStatus::Inactive
        } else {
            RowStatus::Unclassified
        }
    }

    /// CPF formatado para exibição
    pub fn cpf_display(&self) -> String {
        format_cpf(&self.cpf)
    }

    /// Filtro da tabela: `term_lower` já deve estar em minúsculas e aparado.
    ///
    /// Compara contra `nome` (sem diferenciar maiúsculas) e contra o CPF cru.
    pub fn matches_term(&self, term_lower: &str) -> bool {
        if term_lower.is_empty() {
            return true;
        }
        self.nome.to_lowercase().contains(term_lower) || self.cpf.contains(term_lower)
    }
}

/// Formata um CPF como `###.###.###-##` quando tem exatamente 11 dígitos;
/// caso contrário devolve o valor como veio.
pub fn format_cpf(cpf: &str) -> String {
    if cpf.len() == 11 && cpf.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}.{}.{}-{}", &cpf[0..3], &cpf[3..6], &cpf[6..9], &cpf[9..11])
    } else {
        cpf.to_string()
    }
}

/// Arquivo enviado no multipart (planilha base, lista, cadastro)
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    /// Nome do arquivo (sem diretório)
    pub name: String,
    /// Conteúdo bruto
    pub bytes: Vec<u8>,
    /// MIME type inferido pela extensão
    pub mime: String,
}

impl UploadFile {
    /// Cria a partir de bytes em memória
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self { name, bytes, mime }
    }

    /// Lê um arquivo do disco
    pub async fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "arquivo".to_string());
        Ok(Self::new(name, bytes))
    }
}

/// Planilha gerada pelo backend, pronta para ser salva
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    /// Nome sugerido para download
    pub filename: String,
    /// Conteúdo binário (nunca vazio)
    pub bytes: Vec<u8>,
}

/// Parâmetros de fuzzy matching repassados ao backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyParams {
    /// Habilita fuzzy matching de nomes
    pub use_fuzzy: bool,
    /// Corte de similaridade (0.0 - 1.0)
    pub cutoff: f64,
}

impl Default for FuzzyParams {
    fn default() -> Self {
        Self {
            use_fuzzy: true,
            cutoff: 0.90,
        }
    }
}

impl FuzzyParams {
    /// Valor do campo `use_fuzzy` ("true"/"false")
    pub fn use_fuzzy_field(&self) -> &'static str {
        if self.use_fuzzy {
            "true"
        } else {
            "false"
        }
    }

    /// Valor do campo `fuzzy_cutoff` (decimal com duas casas)
    pub fn cutoff_field(&self) -> String {
        format!("{:.2}", self.cutoff)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DESSERIALIZAÇÃO TOLERANTE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Aceita string, número, bool ou null (null vira "")
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(value).unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(found: bool, status: &str) -> MatchRecord {
        MatchRecord {
            nome: "Maria Souza".into(),
            cpf: "12345678909".into(),
            status_atual: status.into(),
            found,
            ..Default::default()
        }
    }

    #[test]
    fn test_row_status_classification() {
        assert_eq!(record(false, "ATIVO").row_status(), RowStatus::NotFound);
        assert_eq!(record(true, "ATIVO").row_status(), RowStatus::Active);
        assert_eq!(record(true, " ativo ").row_status(), RowStatus::Active);
        assert_eq!(record(true, "INATIVO").row_status(), RowStatus::Inactive);
        assert_eq!(record(true, "Bloqueado").row_status(), RowStatus::Inactive);
        assert_eq!(record(true, "").row_status(), RowStatus::Unclassified);
    }

    #[test]
    fn test_format_cpf() {
        assert_eq!(format_cpf("12345678909"), "123.456.789-09");
        assert_eq!(format_cpf("1234567890"), "1234567890");
        assert_eq!(format_cpf(""), "");
        assert_eq!(format_cpf("1234567890a"), "1234567890a");
    }

    #[test]
    fn test_matches_term() {
        let r = record(true, "ATIVO");
        assert!(r.matches_term(""));
        assert!(r.matches_term("souza"));
        assert!(r.matches_term("456789"));
        // CPF formatado não casa com o CPF cru
        assert!(!r.matches_term("123.456"));
        assert!(!r.matches_term("pereira"));
    }

    #[test]
    fn test_match_record_lenient_fields() {
        let r: MatchRecord = serde_json::from_value(json!({
            "id": 42,
            "nome": null,
            "cpf": "12345678909",
            "status_atual": "INATIVO",
            "found": true
        }))
        .unwrap();
        assert_eq!(r.id.as_deref(), Some("42"));
        assert_eq!(r.nome, "");
        assert_eq!(r.email, "");
        assert_eq!(r.row_status(), RowStatus::Inactive);
    }

    #[test]
    fn test_upload_file_mime() {
        let f = UploadFile::new("base.xlsx", vec![1, 2, 3]);
        assert_eq!(
            f.mime,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        let t = UploadFile::new("sem_extensao", vec![]);
        assert_eq!(t.mime, "application/octet-stream");
    }

    #[test]
    fn test_fuzzy_fields() {
        let p = FuzzyParams::default();
        assert_eq!(p.use_fuzzy_field(), "true");
        assert_eq!(p.cutoff_field(), "0.90");
        let q = FuzzyParams { use_fuzzy: false, cutoff: 0.8 };
        assert_eq!(q.use_fuzzy_field(), "false");
        assert_eq!(q.cutoff_field(), "0.80");
    }
}
