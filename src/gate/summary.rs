// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RESUMO DA PRÉVIA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Transforma a resposta de `/api/preview_inativacao` no resumo que o
// usuário confirma antes da geração. Descartado depois da decisão.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde_json::{Map, Value};

use crate::api::PreviewResponse;
use crate::table::objects_to_csv;
use crate::utils::value_to_cell;

/// Linhas de amostra exibidas na confirmação
pub const SAMPLE_ROWS: usize = 10;
/// Colunas da amostra (chaves da primeira linha)
pub const SAMPLE_COLUMNS: usize = 6;
/// Linhas da tabela detalhada de registros
pub const RECORD_ROWS: usize = 200;
/// Colunas da tabela detalhada
pub const RECORD_COLUMNS: usize = 8;

/// Colunas priorizadas na tabela detalhada
const PREFERRED_RECORD_COLUMNS: [&str; 8] = [
    "Login",
    "UserId",
    "NomeCompleto",
    "Email",
    "Departamento",
    "NomeEmpresa",
    "CodigoCCustoEmpresa",
    "Solicitante",
];

/// Grupo de correspondências já inativas (ex: `cpf`, `exact`)
#[derive(Debug, Clone, PartialEq)]
pub struct InactiveGroup {
    pub name: String,
    pub count: usize,
}

/// Resumo exibido na confirmação da inativação
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewSummary {
    /// Total exibido: `stats.total_matches` quando numérico, senão `count` local
    pub display_count: f64,
    /// Contagem calculada localmente (count ou linhas inativas achatadas)
    pub local_count: u64,
    /// Amostra (no máximo `SAMPLE_ROWS` quando veio do fallback)
    pub sample: Vec<Map<String, Value>>,
    /// Registros detalhados para conferência
    pub records: Vec<Map<String, Value>>,
    /// Colunas sugeridas pelo servidor
    pub columns: Option<Vec<String>>,
    /// Contagem por grupo de inativos, na ordem do servidor
    pub inactive_groups: Vec<InactiveGroup>,
    /// Todas as linhas inativas, com a coluna `match_type`
    pub inactive_rows: Vec<Map<String, Value>>,
    /// Resumo das estatísticas, um item por chave
    pub stats_lines: Vec<String>,
}

impl PreviewSummary {
    /// Monta o resumo, tolerando qualquer campo ausente
    pub fn from_response(preview: &PreviewResponse) -> Self {
        let mut local_count = preview.count();
        let mut sample = preview.sample();

        let inactive = preview.inactive_matches();
        let inactive_rows = inactive.map(flatten_inactive).unwrap_or_default();
        let inactive_groups = inactive
            .map(|groups| {
                groups
                    .iter()
                    .map(|(name, rows)| InactiveGroup {
                        name: name.clone(),
                        count: rows.as_array().map_or(0, Vec::len),
                    })
                    .collect()
            })
            .unwrap_or_default();

        // Sem amostra: usa as inativas como amostra e contagem
        if sample.is_empty() && !inactive_rows.is_empty() {
            local_count = inactive_rows.len() as u64;
            sample = inactive_rows.iter().take(SAMPLE_ROWS).cloned().collect();
        }

        let display_count = preview.total_matches().unwrap_or(local_count as f64);

        Self {
            display_count,
            local_count,
            sample,
            records: preview.records(),
            columns: preview.columns(),
            inactive_groups,
            inactive_rows,
            stats_lines: preview.stats().map(stats_lines).unwrap_or_default(),
        }
    }

    /// Algum grupo de inativos não está vazio
    pub fn has_inactive(&self) -> bool {
        self.inactive_groups.iter().any(|g| g.count > 0)
    }

    /// Quantidade de inativos de um grupo
    pub fn inactive_count(&self, group: &str) -> usize {
        self.inactive_groups
            .iter()
            .find(|g| g.name == group)
            .map_or(0, |g| g.count)
    }

    /// "Foram encontradas N correspondência(s)."
    pub fn headline(&self) -> String {
        format!("Foram encontradas {} correspondência(s).", self.display_count)
    }

    /// Aviso de inativos com contagem por grupo (`cpf: 2 | exact: 1`)
    pub fn inactive_warning(&self) -> Option<String> {
        if !self.has_inactive() {
            return None;
        }
        let counts = self
            .inactive_groups
            .iter()
            .map(|g| format!("{}: {}", g.name, g.count))
            .collect::<Vec<_>>()
            .join(" | ");
        Some(format!(
            "Atenção: Foram encontradas correspondências que já estão INATIVAS na base. Resumo: {}",
            counts
        ))
    }

    /// Colunas da amostra: primeiras chaves da primeira linha
    pub fn sample_columns(&self) -> Vec<String> {
        self.sample
            .first()
            .map(|row| row.keys().take(SAMPLE_COLUMNS).cloned().collect())
            .unwrap_or_default()
    }

    /// Colunas da tabela detalhada: preferidas primeiro, completando até 8
    pub fn record_columns(&self) -> Vec<String> {
        let mut remaining: Vec<String> = match &self.columns {
            Some(cols) => cols.clone(),
            None => self
                .records
                .first()
                .map(|row| row.keys().cloned().collect())
                .unwrap_or_default(),
        };

        let mut chosen = Vec::new();
        for preferred in PREFERRED_RECORD_COLUMNS {
            if let Some(pos) = remaining.iter().position(|c| c == preferred) {
                chosen.push(remaining.remove(pos));
            }
        }
        let missing = RECORD_COLUMNS.saturating_sub(chosen.len());
        chosen.extend(remaining.into_iter().take(missing));
        chosen
    }

    /// Linhas da tabela detalhada (no máximo `RECORD_ROWS`), já em texto
    pub fn record_rows(&self) -> Vec<Vec<String>> {
        let columns = self.record_columns();
        self.records
            .iter()
            .take(RECORD_ROWS)
            .map(|row| {
                columns
                    .iter()
                    .map(|c| row.get(c).map(value_to_cell).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    /// CSV das correspondências inativas (`inactive_matches.csv`)
    pub fn inactive_csv(&self) -> Option<String> {
        objects_to_csv(&self.inactive_rows)
    }

    /// CSV dos registros da prévia (`preview_inativacao.csv`)
    pub fn records_csv(&self) -> Option<String> {
        objects_to_csv(&self.records)
    }

    /// Texto completo para confirmação em terminal
    pub fn render_text(&self) -> String {
        let mut out = vec![self.headline()];
        if let Some(warning) = self.inactive_warning() {
            out.push(warning);
        }
        if !self.sample.is_empty() {
            let columns = self.sample_columns();
            out.push(columns.join(" | "));
            for row in self.sample.iter().take(SAMPLE_ROWS) {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|c| row.get(c).map(value_to_cell).unwrap_or_default())
                    .collect();
                out.push(cells.join(" | "));
            }
        }
        if !self.records.is_empty() {
            let shown = self.records.len().min(RECORD_ROWS);
            out.push(format!(
                "Mostrando {} de {} linhas.",
                shown,
                self.records.len()
            ));
        }
        if !self.stats_lines.is_empty() {
            out.push("Estatísticas".to_string());
            out.extend(self.stats_lines.iter().cloned());
        }
        out.join("\n")
    }
}

/// Achata os grupos em uma lista só, com `match_type` como primeira coluna
fn flatten_inactive(groups: &Map<String, Value>) -> Vec<Map<String, Value>> {
    let mut all = Vec::new();
    for (group, rows) in groups {
        let Some(rows) = rows.as_array() else {
            continue;
        };
        for row in rows {
            let mut flat = Map::new();
            flat.insert("match_type".to_string(), Value::String(group.clone()));
            if let Some(obj) = row.as_object() {
                for (k, v) in obj {
                    flat.insert(k.clone(), v.clone());
                }
            }
            all.push(flat);
        }
    }
    all
}

/// Rótulo amigável de uma chave de estatística
pub fn stats_label(key: &str) -> String {
    let normalized = key.to_lowercase();
    let label = if normalized.contains("cpf") {
        "CPF"
    } else if normalized.contains("exact") {
        "Exato"
    } else if normalized.contains("token") {
        "Token"
    } else if normalized.contains("fuzzy") {
        "Fuzzy"
    } else {
        return key.to_string();
    };
    label.to_string()
}

fn stats_lines(stats: &Map<String, Value>) -> Vec<String> {
    stats
        .iter()
        .map(|(key, value)| {
            let label = stats_label(key);
            match value {
                Value::Array(items) => format!("{}: array[{}]", label, items.len()),
                Value::Object(obj) => {
                    let keys: Vec<&str> = obj.keys().take(5).map(String::as_str).collect();
                    let more = if obj.len() > 5 { ", ..." } else { "" };
                    format!("{}: object{{{}{}}}", label, keys.join(", "), more)
                }
                scalar => format!("{}: {}", label, value_to_cell(scalar)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(value: Value) -> PreviewSummary {
        PreviewSummary::from_response(&PreviewResponse::from_value(value))
    }

    #[test]
    fn test_authoritative_total_wins() {
        let s = summary(json!({
            "stats": {
                "total_matches": 5,
                "inactive_matches": {"cpf": [{"CPF": "1"}, {"CPF": "2"}]}
            }
        }));
        assert_eq!(s.display_count, 5.0);
        assert_eq!(s.local_count, 2);
        assert_eq!(s.inactive_count("cpf"), 2);
        assert!(s.has_inactive());
        assert!(s.headline().contains('5'));
        assert!(s.inactive_warning().unwrap().ends_with("Resumo: cpf: 2"));
    }

    #[test]
    fn test_empty_preview() {
        let s = summary(json!({}));
        assert_eq!(s.display_count, 0.0);
        assert!(s.sample.is_empty());
        assert!(!s.has_inactive());
        assert!(s.inactive_warning().is_none());
        assert!(s.inactive_csv().is_none());
        assert!(s.records_csv().is_none());
        assert_eq!(s.headline(), "Foram encontradas 0 correspondência(s).");
    }

    #[test]
    fn test_count_without_stats() {
        let s = summary(json!({"count": 3, "sample": [{"a": 1}, {"a": 2}]}));
        assert_eq!(s.display_count, 3.0);
        assert_eq!(s.sample.len(), 2);
    }

    #[test]
    fn test_non_numeric_total_is_ignored() {
        let s = summary(json!({"count": 4, "stats": {"total_matches": "9"}}));
        assert_eq!(s.display_count, 4.0);
    }

    #[test]
    fn test_fractional_total_is_shown_as_sent() {
        let s = summary(json!({"count": 2, "stats": {"total_matches": 5.7}}));
        assert_eq!(s.headline(), "Foram encontradas 5.7 correspondência(s).");

        let s = summary(json!({"count": 2, "stats": {"total_matches": -1}}));
        assert_eq!(s.headline(), "Foram encontradas -1 correspondência(s).");
    }

    #[test]
    fn test_fallback_sample_from_inactive() {
        let rows: Vec<Value> = (0..12).map(|i| json!({"CPF": i})).collect();
        let s = summary(json!({
            "count": 0,
            "stats": {"inactive_matches": {"exact": rows, "token": "x"}}
        }));
        assert_eq!(s.local_count, 12);
        assert_eq!(s.display_count, 12.0);
        assert_eq!(s.sample.len(), SAMPLE_ROWS);
        let first_key = s.sample[0].keys().next().unwrap();
        assert_eq!(first_key, "match_type");
        assert_eq!(s.sample[0]["match_type"], json!("exact"));
        assert_eq!(s.inactive_count("token"), 0);
        assert_eq!(s.sample_columns(), vec!["match_type", "CPF"]);
    }

    #[test]
    fn test_warning_lists_groups_in_order() {
        let s = summary(json!({
            "stats": {"inactive_matches": {"cpf": [{}, {}], "exact": [], "fuzzy": [{}]}}
        }));
        assert_eq!(
            s.inactive_warning().unwrap(),
            "Atenção: Foram encontradas correspondências que já estão INATIVAS na base. Resumo: cpf: 2 | exact: 0 | fuzzy: 1"
        );
    }

    #[test]
    fn test_all_groups_empty_no_warning() {
        let s = summary(json!({"stats": {"inactive_matches": {"cpf": []}}}));
        assert!(!s.has_inactive());
        assert!(s.inactive_warning().is_none());
    }

    #[test]
    fn test_stats_lines() {
        let s = summary(json!({
            "stats": {
                "cpf_matches": 3,
                "exact_matches": null,
                "token_list": [1, 2],
                "fuzzy_detail": {"a": 1, "b": 2, "c": 3, "d": 4, "e": 5, "f": 6},
                "outro": "ok"
            }
        }));
        assert_eq!(
            s.stats_lines,
            vec![
                "CPF: 3",
                "Exato: ",
                "Token: array[2]",
                "Fuzzy: object{a, b, c, d, e, ...}",
                "outro: ok",
            ]
        );
    }

    #[test]
    fn test_stats_label_order() {
        assert_eq!(stats_label("CPF_exact"), "CPF");
        assert_eq!(stats_label("exact_token"), "Exato");
        assert_eq!(stats_label("Fuzzy"), "Fuzzy");
        assert_eq!(stats_label("total_matches"), "total_matches");
    }

    #[test]
    fn test_record_columns_preferred_first() {
        let s = summary(json!({
            "records": [{"Z": 1, "Email": "a@x.com", "Login": "ana", "Y": 2}]
        }));
        assert_eq!(s.record_columns(), vec!["Login", "Email", "Z", "Y"]);
        assert_eq!(s.record_rows(), vec![vec!["ana", "a@x.com", "1", "2"]]);
    }

    #[test]
    fn test_record_columns_capped() {
        let s = summary(json!({
            "columns": ["a", "b", "c", "d", "e", "f", "g", "h", "i", "Login"],
            "records": [{"Login": "x"}]
        }));
        let cols = s.record_columns();
        assert_eq!(cols.len(), RECORD_COLUMNS);
        assert_eq!(cols[0], "Login");
        assert_eq!(s.record_rows()[0][1], "");
    }

    #[test]
    fn test_inactive_csv() {
        let s = summary(json!({
            "stats": {"inactive_matches": {"cpf": [{"CPF": "111", "Status": "INATIVO"}]}}
        }));
        assert_eq!(
            s.inactive_csv().unwrap(),
            "\"match_type\",\"CPF\",\"Status\"\r\n\"cpf\",\"111\",\"INATIVO\""
        );
    }

    #[test]
    fn test_render_text_mentions_warning() {
        let s = summary(json!({
            "stats": {"total_matches": 5, "inactive_matches": {"cpf": [{"CPF": "1"}]}}
        }));
        let text = s.render_text();
        assert!(text.starts_with("Foram encontradas 5"));
        assert!(text.contains("INATIVAS"));
        assert!(text.contains("Estatísticas"));
    }
}
