// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HISTÓRICO E PREFERÊNCIAS - Armazenamento chave-valor injetado
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Os fluxos nunca falam com o disco diretamente: histórico e preferências
// passam por `KeyValueStore`, com duas implementações:
// - `MemoryStore`: em memória (testes)
// - `JsonFileStore`: um arquivo `store.json` no diretório de dados
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::cadastro::{Fluxo, LoginChoice};
use crate::types::FuzzyParams;
use crate::utils::{csv_quote, format_timestamp, now_millis};

/// Chave do histórico no formato atual
pub const HISTORY_KEY: &str = "history_v2";
/// Chave do histórico antigo (lista de strings)
pub const LEGACY_HISTORY_KEY: &str = "history";
/// Entradas mantidas no histórico
pub const MAX_HISTORY_ENTRIES: usize = 500;
/// Entradas aproveitadas na migração do formato antigo
pub const LEGACY_KEEP: usize = 200;

const FUZZY_PREFS_KEY: &str = "fuzzy_prefs";
const CADASTRO_PREFS_KEY: &str = "cadastro_prefs";
const STORE_FILE: &str = "store.json";

/// Erros do armazenamento
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Erro de I/O no armazenamento: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON inválido no armazenamento: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Armazenamento indisponível (lock envenenado)")]
    Poisoned,
}

/// Armazenamento chave-valor de strings
pub trait KeyValueStore: Send + Sync {
    /// Nome do backend
    fn name(&self) -> &'static str;

    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BACKEND: Memória
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Armazenamento em memória, sem persistência
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.remove(key);
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BACKEND: Arquivo JSON local
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Armazenamento em um único objeto JSON, regravado a cada escrita
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Abre (ou cria vazio) `store.json` dentro de `data_dir`.
    ///
    /// Um arquivo corrompido é ignorado com aviso e recomeça vazio.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(STORE_FILE);

        let values = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("⚠️  {} corrompido, recomeçando vazio: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        log::debug!("📂 Armazenamento em {}", path.display());
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn name(&self) -> &'static str {
        "json-file"
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        self.flush(&values)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        if values.remove(key).is_some() {
            self.flush(&values)?;
        }
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HISTÓRICO DE AÇÕES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Uma entrada do histórico
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Epoch millis
    pub ts: i64,
    /// Descrição da ação
    pub text: String,
}

impl HistoryEntry {
    /// Data/hora formatada
    pub fn formatted_ts(&self) -> String {
        format_timestamp(self.ts)
    }
}

/// Histórico de ações, limitado às últimas `MAX_HISTORY_ENTRIES`
pub struct HistoryLog {
    store: Arc<dyn KeyValueStore>,
}

impl HistoryLog {
    /// Cria o histórico e migra o formato antigo, se houver
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let log = Self { store };
        if let Err(e) = log.migrate_legacy(now_millis()) {
            log::warn!("⚠️  Falha ao migrar histórico antigo: {}", e);
        }
        log
    }

    /// Converte `history` (lista de strings) em `history_v2`, com timestamps
    /// sintéticos espaçados de 1s terminando em `now`.
    fn migrate_legacy(&self, now: i64) -> Result<(), StoreError> {
        if self.store.get(HISTORY_KEY)?.is_some() {
            return Ok(());
        }
        let Some(raw) = self.store.get(LEGACY_HISTORY_KEY)? else {
            return Ok(());
        };
        let legacy: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(Value::Array(items)) => items,
            _ => return Ok(()),
        };
        if legacy.is_empty() {
            return Ok(());
        }

        let total = legacy.len() as i64;
        let migrated: Vec<HistoryEntry> = legacy
            .into_iter()
            .enumerate()
            .map(|(i, text)| HistoryEntry {
                ts: now - (total - i as i64) * 1000,
                text: match text {
                    Value::String(s) => s,
                    other => other.to_string(),
                },
            })
            .collect();
        let keep_from = migrated.len().saturating_sub(LEGACY_KEEP);

        self.store
            .set(HISTORY_KEY, &serde_json::to_string(&migrated[keep_from..])?)?;
        self.store.remove(LEGACY_HISTORY_KEY)?;
        log::info!("📦 Histórico antigo migrado: {} entradas", migrated.len() - keep_from);
        Ok(())
    }

    /// Todas as entradas, da mais antiga para a mais recente.
    /// Conteúdo ilegível conta como histórico vazio.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("⚠️  Histórico ilegível, ignorando: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("⚠️  Falha ao ler histórico: {}", e);
                Vec::new()
            }
        }
    }

    fn save(&self, entries: &[HistoryEntry]) -> Result<(), StoreError> {
        let keep_from = entries.len().saturating_sub(MAX_HISTORY_ENTRIES);
        self.store
            .set(HISTORY_KEY, &serde_json::to_string(&entries[keep_from..])?)
    }

    /// Registra uma ação agora
    pub fn add(&self, text: &str) -> Result<(), StoreError> {
        self.add_at(now_millis(), text)
    }

    /// Registra uma ação com timestamp explícito
    pub fn add_at(&self, ts: i64, text: &str) -> Result<(), StoreError> {
        let mut entries = self.entries();
        entries.push(HistoryEntry {
            ts,
            text: text.to_string(),
        });
        self.save(&entries)
    }

    /// Entradas cujo texto contém `term` (sem diferenciar maiúsculas)
    pub fn filter(&self, term: &str) -> Vec<HistoryEntry> {
        let term = term.trim().to_lowercase();
        let all = self.entries();
        if term.is_empty() {
            return all;
        }
        all.into_iter()
            .filter(|e| e.text.to_lowercase().contains(&term))
            .collect()
    }

    /// Esvazia o histórico
    pub fn clear(&self) -> Result<(), StoreError> {
        self.save(&[])
    }

    /// "Itens: N (total armazenado: M)"
    pub fn summary(&self, filtered: &[HistoryEntry]) -> String {
        format!(
            "Itens: {} (total armazenado: {})",
            filtered.len(),
            self.entries().len()
        )
    }
}

/// CSV `data_hora,acao`, mais recentes primeiro. `None` quando vazio.
pub fn export_history_csv(entries: &[HistoryEntry]) -> Option<String> {
    if entries.is_empty() {
        return None;
    }
    let mut lines = vec!["data_hora,acao".to_string()];
    lines.extend(
        entries
            .iter()
            .rev()
            .map(|e| format!("{},{}", e.formatted_ts().replace(',', " "), csv_quote(&e.text))),
    );
    Some(lines.join("\n"))
}

/// JSON identado das entradas. `None` quando vazio.
pub fn export_history_json(entries: &[HistoryEntry]) -> Result<Option<String>, StoreError> {
    if entries.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string_pretty(entries)?))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PREFERÊNCIAS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Escolhas persistidas do cadastro
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadastroPrefs {
    #[serde(default)]
    pub login_choice: LoginChoice,
    #[serde(default)]
    pub fluxo: Fluxo,
}

/// Formato gravado: `fuzzy_cutoff` como texto ("0.90"), igual ao campo do formulário
#[derive(Debug, Serialize, Deserialize)]
struct StoredFuzzyPrefs {
    #[serde(default)]
    use_fuzzy: Option<bool>,
    #[serde(default)]
    fuzzy_cutoff: Option<Value>,
}

/// Preferências persistidas (fuzzy e cadastro)
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("⚠️  Falha ao ler {}: {}", key, e);
                return None;
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| log::warn!("⚠️  {} ilegível, usando padrão: {}", key, e))
            .ok()
    }

    /// Parâmetros de fuzzy, sobrepondo os campos gravados a `defaults`
    pub fn fuzzy(&self, defaults: FuzzyParams) -> FuzzyParams {
        let Some(stored) = self.read_json::<StoredFuzzyPrefs>(FUZZY_PREFS_KEY) else {
            return defaults;
        };
        let cutoff = stored
            .fuzzy_cutoff
            .and_then(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .filter(|c: &f64| (0.0..=1.0).contains(c))
            .unwrap_or(defaults.cutoff);
        FuzzyParams {
            use_fuzzy: stored.use_fuzzy.unwrap_or(defaults.use_fuzzy),
            cutoff,
        }
    }

    pub fn save_fuzzy(&self, params: FuzzyParams) -> Result<(), StoreError> {
        let stored = StoredFuzzyPrefs {
            use_fuzzy: Some(params.use_fuzzy),
            fuzzy_cutoff: Some(Value::String(params.cutoff_field())),
        };
        self.store.set(FUZZY_PREFS_KEY, &serde_json::to_string(&stored)?)
    }

    pub fn cadastro(&self) -> CadastroPrefs {
        self.read_json(CADASTRO_PREFS_KEY).unwrap_or_default()
    }

    pub fn save_cadastro(&self, prefs: CadastroPrefs) -> Result<(), StoreError> {
        self.store.set(CADASTRO_PREFS_KEY, &serde_json::to_string(&prefs)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn memory() -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn test_add_and_filter() {
        let history = HistoryLog::new(memory());
        history.add_at(1_000, "Cadastro gerado: a.xlsx").unwrap();
        history.add_at(2_000, "Inativação gerada: Base b.xlsx").unwrap();

        assert_eq!(history.entries().len(), 2);
        let found = history.filter("INATIVAÇÃO");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].ts, 2_000);
        assert_eq!(history.filter("  ").len(), 2);
        assert_eq!(history.summary(&found), "Itens: 1 (total armazenado: 2)");
    }

    #[test]
    fn test_history_is_capped() {
        let history = HistoryLog::new(memory());
        for i in 0..(MAX_HISTORY_ENTRIES + 3) {
            history.add_at(i as i64, &format!("ação {}", i)).unwrap();
        }
        let entries = history.entries();
        assert_eq!(entries.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(entries[0].text, "ação 3");
    }

    #[test]
    fn test_clear() {
        let history = HistoryLog::new(memory());
        history.add("x").unwrap();
        history.clear().unwrap();
        assert!(history.entries().is_empty());
    }

    #[test]
    fn test_legacy_migration() {
        let store = memory();
        let legacy: Vec<String> = (0..250).map(|i| format!("antigo {}", i)).collect();
        store
            .set(LEGACY_HISTORY_KEY, &serde_json::to_string(&legacy).unwrap())
            .unwrap();

        let history = HistoryLog { store: store.clone() };
        history.migrate_legacy(1_000_000).unwrap();

        let entries = history.entries();
        assert_eq!(entries.len(), LEGACY_KEEP);
        assert_eq!(entries[0].text, "antigo 50");
        assert_eq!(entries.last().unwrap().ts, 1_000_000 - 1000);
        assert_eq!(entries[1].ts - entries[0].ts, 1000);
        assert!(store.get(LEGACY_HISTORY_KEY).unwrap().is_none());
    }

    #[test]
    fn test_migration_skipped_when_current_exists() {
        let store = memory();
        store.set(HISTORY_KEY, "[]").unwrap();
        store.set(LEGACY_HISTORY_KEY, "[\"velho\"]").unwrap();
        let history = HistoryLog::new(store.clone());
        assert!(history.entries().is_empty());
        assert!(store.get(LEGACY_HISTORY_KEY).unwrap().is_some());
    }

    #[test]
    fn test_corrupt_history_reads_empty() {
        let store = memory();
        store.set(HISTORY_KEY, "{nao json").unwrap();
        let history = HistoryLog::new(store);
        assert!(history.entries().is_empty());
        history.add("nova").unwrap();
        assert_eq!(history.entries().len(), 1);
    }

    #[test]
    fn test_export_csv_newest_first() {
        let entries = vec![
            HistoryEntry { ts: 1_000, text: "primeira".into() },
            HistoryEntry { ts: 2_000, text: "diz \"oi\"".into() },
        ];
        let csv = export_history_csv(&entries).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "data_hora,acao");
        assert!(lines[1].ends_with(",\"diz \"\"oi\"\"\""));
        assert!(lines[2].ends_with(",\"primeira\""));
        assert!(export_history_csv(&[]).is_none());
    }

    #[test]
    fn test_export_json() {
        let entries = vec![HistoryEntry { ts: 5, text: "a".into() }];
        let json = export_history_json(&entries).unwrap().unwrap();
        assert!(json.contains("\n"));
        let back: Vec<HistoryEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entries);
        assert!(export_history_json(&[]).unwrap().is_none());
    }

    #[test]
    fn test_json_file_store_persists() {
        let dir = TempDir::new().unwrap();
        {
            let store = JsonFileStore::open(dir.path()).unwrap();
            store.set("k", "v").unwrap();
            assert!(store.path().exists());
        }
        let reopened = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
        reopened.remove("k").unwrap();
        let again = JsonFileStore::open(dir.path()).unwrap();
        assert!(again.get("k").unwrap().is_none());
    }

    #[test]
    fn test_json_file_store_recovers_from_corruption() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("store.json"), "lixo").unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert!(store.get("qualquer").unwrap().is_none());
    }

    #[test]
    fn test_fuzzy_prefs() {
        let prefs = Preferences::new(memory());
        let defaults = FuzzyParams::default();
        assert_eq!(prefs.fuzzy(defaults), defaults);

        prefs
            .save_fuzzy(FuzzyParams { use_fuzzy: false, cutoff: 0.75 })
            .unwrap();
        let loaded = prefs.fuzzy(defaults);
        assert!(!loaded.use_fuzzy);
        assert!((loaded.cutoff - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_fuzzy_prefs_tolerates_numbers_and_garbage() {
        let store = memory();
        store.set(FUZZY_PREFS_KEY, r#"{"fuzzy_cutoff": 0.8}"#).unwrap();
        let prefs = Preferences::new(store.clone());
        let loaded = prefs.fuzzy(FuzzyParams::default());
        assert!(loaded.use_fuzzy);
        assert!((loaded.cutoff - 0.8).abs() < 1e-9);

        store.set(FUZZY_PREFS_KEY, r#"{"fuzzy_cutoff": "abc"}"#).unwrap();
        assert_eq!(prefs.fuzzy(FuzzyParams::default()).cutoff, 0.90);

        store.set(FUZZY_PREFS_KEY, "???").unwrap();
        assert_eq!(prefs.fuzzy(FuzzyParams::default()), FuzzyParams::default());
    }

    #[test]
    fn test_cadastro_prefs() {
        let prefs = Preferences::new(memory());
        assert_eq!(prefs.cadastro(), CadastroPrefs::default());
        let chosen = CadastroPrefs {
            login_choice: LoginChoice::Email,
            fluxo: Fluxo::Front,
        };
        prefs.save_cadastro(chosen).unwrap();
        assert_eq!(prefs.cadastro(), chosen);
    }
}
