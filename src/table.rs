// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TABELA DE RESULTADOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Visão paginada e filtrável sobre os registros da última busca.
// Os registros só mudam por `replace_records`; filtro e página são
// recalculados por inteiro a cada mudança.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde_json::{Map, Value};

use crate::types::{MatchRecord, RowStatus, PAGE_SIZE};
use crate::utils::{csv_quote, value_to_cell};

/// Teto de linhas em qualquer exportação CSV
pub const MAX_EXPORT_ROWS: usize = 10_000;

/// Colunas do CSV exportado da tabela
const EXPORT_HEADER: [&str; 5] = ["nome", "cpf", "email", "status_atual", "encontrado"];

/// Linha pronta para exibição
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub nome: String,
    pub cpf: String,
    pub email: String,
    pub status_atual: String,
    pub status: RowStatus,
}

impl From<&MatchRecord> for DisplayRow {
    fn from(record: &MatchRecord) -> Self {
        Self {
            nome: record.nome.clone(),
            cpf: record.cpf_display(),
            email: record.email.clone(),
            status_atual: record.status_atual.clone(),
            status: record.row_status(),
        }
    }
}

/// Controlador da tabela de resultados
#[derive(Debug, Clone)]
pub struct ResultTable {
    records: Vec<MatchRecord>,
    /// Termo já aparado e em minúsculas
    term: String,
    /// Índices dos registros que passam no filtro
    filtered: Vec<usize>,
    /// Página atual (1-based)
    page: usize,
    loading: bool,
}

impl Default for ResultTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultTable {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            term: String::new(),
            filtered: Vec::new(),
            page: 1,
            loading: false,
        }
    }

    /// Cria já com registros
    pub fn with_records(records: Vec<MatchRecord>) -> Self {
        let mut table = Self::new();
        table.replace_records(records);
        table
    }

    /// Substitui o conjunto inteiro (nova busca) e volta para a página 1.
    /// O termo de filtro digitado é mantido.
    pub fn replace_records(&mut self, records: Vec<MatchRecord>) {
        self.records = records;
        self.loading = false;
        self.page = 1;
        self.recompute();
    }

    /// Entra no estado de carregamento (linhas placeholder)
    pub fn begin_loading(&mut self) {
        self.loading = true;
    }

    /// Sai do estado de carregamento sem tocar nos registros
    pub fn end_loading(&mut self) {
        self.loading = false;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Quantidade de linhas placeholder a desenhar
    pub fn placeholder_rows(&self) -> usize {
        if self.loading {
            PAGE_SIZE
        } else {
            0
        }
    }

    /// Aplica o filtro e volta para a página 1
    pub fn set_search_term(&mut self, term: &str) {
        self.term = term.trim().to_lowercase();
        self.page = 1;
        self.recompute();
    }

    /// Termo de filtro ativo (normalizado)
    pub fn search_term(&self) -> &str {
        &self.term
    }

    /// Avança uma página; devolve `false` quando já está na última
    pub fn next_page(&mut self) -> bool {
        if self.page < self.max_page() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Volta uma página; devolve `false` quando já está na primeira
    pub fn prev_page(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Vai direto para uma página, limitada a `[1, max_page]`
    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.max_page());
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Última página; 1 quando o filtro não deixa nada
    pub fn max_page(&self) -> usize {
        self.filtered.len().div_ceil(PAGE_SIZE).max(1)
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }

    pub fn total_count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    /// Registros filtrados, na ordem original
    pub fn filtered(&self) -> impl Iterator<Item = &MatchRecord> {
        self.filtered.iter().map(move |&i| &self.records[i])
    }

    /// Registros da página atual
    pub fn page_records(&self) -> Vec<&MatchRecord> {
        self.filtered()
            .skip((self.page - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect()
    }

    /// Linhas formatadas da página atual
    pub fn page_rows(&self) -> Vec<DisplayRow> {
        self.page_records().into_iter().map(DisplayRow::from).collect()
    }

    /// "Página X de Y"
    pub fn page_info(&self) -> String {
        format!("Página {} de {}", self.page, self.max_page())
    }

    /// CSV da visão filtrada (limitado a `MAX_EXPORT_ROWS`). `None` quando vazia.
    pub fn export_csv(&self) -> Option<String> {
        if self.filtered.is_empty() {
            return None;
        }
        let header = EXPORT_HEADER
            .iter()
            .map(|h| csv_quote(h))
            .collect::<Vec<_>>()
            .join(",");
        let mut lines = vec![header];
        for record in self.filtered().take(MAX_EXPORT_ROWS) {
            let found = if record.found { "sim" } else { "não" };
            let cells = [
                record.nome.as_str(),
                record.cpf.as_str(),
                record.email.as_str(),
                record.status_atual.as_str(),
                found,
            ];
            lines.push(cells.iter().map(|c| csv_quote(c)).collect::<Vec<_>>().join(","));
        }
        Some(lines.join("\r\n"))
    }

    fn recompute(&mut self) {
        let term = self.term.as_str();
        self.filtered = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.matches_term(term))
            .map(|(i, _)| i)
            .collect();
        self.page = self.page.clamp(1, self.max_page());
    }
}

/// CSV genérico de objetos JSON: união das chaves na ordem em que aparecem,
/// todos os campos entre aspas, linhas separadas por CRLF.
///
/// `None` quando não há linhas.
pub fn objects_to_csv(rows: &[Map<String, Value>]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }

    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len().min(MAX_EXPORT_ROWS) + 1);
    lines.push(columns.iter().map(|c| csv_quote(c)).collect::<Vec<_>>().join(","));
    for row in rows.iter().take(MAX_EXPORT_ROWS) {
        let cells = columns
            .iter()
            .map(|col| csv_quote(&row.get(*col).map(value_to_cell).unwrap_or_default()))
            .collect::<Vec<_>>();
        lines.push(cells.join(","));
    }
    Some(lines.join("\r\n"))
}
