// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CONFIGURAÇÃO DO CLIENTE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Endereço da API, diretórios e padrões de fuzzy matching.
// Todas as configurações podem ser definidas via .env
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::path::PathBuf;
use std::time::Duration;

use crate::types::FuzzyParams;

/// Endereço padrão do backend Flask
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";

const APP_DIR_NAME: &str = "robo-usuarios";

/// Configuração do cliente.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// URL base da API (sem barra final).
    pub api_base: String,

    /// Diretório do armazenamento persistente (histórico e preferências).
    pub data_dir: PathBuf,

    /// Diretório padrão das planilhas geradas.
    pub output_dir: PathBuf,

    /// Padrão de fuzzy matching quando não há preferência gravada.
    pub fuzzy: FuzzyParams,

    /// Espera máxima de cada sonda do health-check.
    pub health_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            data_dir: default_data_dir(None, None),
            output_dir: PathBuf::from("."),
            fuzzy: FuzzyParams::default(),
            health_timeout: Duration::from_secs(6),
        }
    }
}

/// `$XDG_DATA_HOME/robo-usuarios`, senão `~/.local/share/robo-usuarios`,
/// senão `./.robo-usuarios`
fn default_data_dir(xdg_data_home: Option<String>, home: Option<String>) -> PathBuf {
    if let Some(xdg) = xdg_data_home.filter(|v| !v.trim().is_empty()) {
        return PathBuf::from(xdg).join(APP_DIR_NAME);
    }
    if let Some(home) = home.filter(|v| !v.trim().is_empty()) {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR_NAME);
    }
    PathBuf::from(format!(".{}", APP_DIR_NAME))
}

/// Carrega a configuração a partir das variáveis de ambiente.
///
/// Variáveis suportadas:
/// - `ROBO_API_BASE`: URL do backend (padrão: http://127.0.0.1:5000)
/// - `ROBO_DATA_DIR`: diretório do histórico/preferências
/// - `ROBO_OUTPUT_DIR`: diretório das planilhas geradas (padrão: .)
/// - `ROBO_USE_FUZZY`: "true"/"false" (padrão: true)
/// - `ROBO_FUZZY_CUTOFF`: 0.0 - 1.0 (padrão: 0.90)
/// - `ROBO_HEALTH_TIMEOUT_SECS`: segundos por sonda (padrão: 6)
///
/// # Exemplo
///
/// ```rust,ignore
/// // .env
/// ROBO_API_BASE=http://servidor:5000
/// ROBO_FUZZY_CUTOFF=0.85
///
/// // código
/// let config = load_app_config();
/// assert_eq!(config.api_base, "http://servidor:5000");
/// ```
pub fn load_app_config() -> AppConfig {
    load_from(|key| std::env::var(key).ok())
}

/// Mesma lógica de `load_app_config`, lendo de uma função de consulta
pub fn load_from<F>(lookup: F) -> AppConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = AppConfig {
        data_dir: default_data_dir(lookup("XDG_DATA_HOME"), lookup("HOME")),
        ..AppConfig::default()
    };

    // ROBO_API_BASE: precisa ser http(s)
    if let Some(base) = lookup("ROBO_API_BASE") {
        let base = base.trim().trim_end_matches('/');
        match url::Url::parse(base) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                config.api_base = base.to_string();
                log::info!("📦 ROBO_API_BASE={}", config.api_base);
            }
            _ => log::warn!("⚠️  ROBO_API_BASE inválida ({}), usando {}", base, DEFAULT_API_BASE),
        }
    }

    if let Some(dir) = lookup("ROBO_DATA_DIR").filter(|v| !v.trim().is_empty()) {
        config.data_dir = PathBuf::from(dir.trim());
        log::info!("📦 ROBO_DATA_DIR={}", config.data_dir.display());
    }

    if let Some(dir) = lookup("ROBO_OUTPUT_DIR").filter(|v| !v.trim().is_empty()) {
        config.output_dir = PathBuf::from(dir.trim());
        log::info!("📦 ROBO_OUTPUT_DIR={}", config.output_dir.display());
    }

    if let Some(value) = lookup("ROBO_USE_FUZZY") {
        match parse_bool(&value) {
            Some(flag) => {
                config.fuzzy.use_fuzzy = flag;
                log::info!("📦 ROBO_USE_FUZZY={}", flag);
            }
            None => log::warn!("⚠️  ROBO_USE_FUZZY inválido: {}", value),
        }
    }

    if let Some(value) = lookup("ROBO_FUZZY_CUTOFF") {
        match value.trim().parse::<f64>() {
            Ok(cutoff) if (0.0..=1.0).contains(&cutoff) => {
                config.fuzzy.cutoff = cutoff;
                log::info!("📦 ROBO_FUZZY_CUTOFF={:.2}", cutoff);
            }
            _ => log::warn!("⚠️  ROBO_FUZZY_CUTOFF inválido: {}", value),
        }
    }

    if let Some(value) = lookup("ROBO_HEALTH_TIMEOUT_SECS") {
        match value.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => {
                config.health_timeout = Duration::from_secs(secs);
                log::info!("📦 ROBO_HEALTH_TIMEOUT_SECS={}", secs);
            }
            _ => log::warn!("⚠️  ROBO_HEALTH_TIMEOUT_SECS inválido: {}", value),
        }
    }

    config
}

/// "true"/"1"/"sim"/"s" ou "false"/"0"/"nao"/"não"/"n"
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "sim" | "s" | "yes" | "y" => Some(true),
        "false" | "0" | "nao" | "não" | "n" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load_from(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert!(config.fuzzy.use_fuzzy);
        assert_eq!(config.fuzzy.cutoff, 0.90);
        assert_eq!(config.health_timeout, Duration::from_secs(6));
        assert_eq!(config.data_dir, PathBuf::from(".robo-usuarios"));
    }

    #[test]
    fn test_data_dir_resolution() {
        let xdg = load(&[("XDG_DATA_HOME", "/xdg"), ("HOME", "/home/ana")]);
        assert_eq!(xdg.data_dir, PathBuf::from("/xdg/robo-usuarios"));

        let home = load(&[("HOME", "/home/ana")]);
        assert_eq!(
            home.data_dir,
            PathBuf::from("/home/ana/.local/share/robo-usuarios")
        );

        let explicit = load(&[("HOME", "/home/ana"), ("ROBO_DATA_DIR", "/tmp/robo")]);
        assert_eq!(explicit.data_dir, PathBuf::from("/tmp/robo"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("ROBO_API_BASE", "https://robo.empresa.com/"),
            ("ROBO_USE_FUZZY", "false"),
            ("ROBO_FUZZY_CUTOFF", "0.85"),
            ("ROBO_HEALTH_TIMEOUT_SECS", "2"),
            ("ROBO_OUTPUT_DIR", "saidas"),
        ]);
        assert_eq!(config.api_base, "https://robo.empresa.com");
        assert!(!config.fuzzy.use_fuzzy);
        assert!((config.fuzzy.cutoff - 0.85).abs() < 1e-9);
        assert_eq!(config.health_timeout, Duration::from_secs(2));
        assert_eq!(config.output_dir, PathBuf::from("saidas"));
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = load(&[
            ("ROBO_API_BASE", "ftp://x"),
            ("ROBO_USE_FUZZY", "talvez"),
            ("ROBO_FUZZY_CUTOFF", "1.5"),
            ("ROBO_HEALTH_TIMEOUT_SECS", "0"),
        ]);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert!(config.fuzzy.use_fuzzy);
        assert_eq!(config.fuzzy.cutoff, 0.90);
        assert_eq!(config.health_timeout, Duration::from_secs(6));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("SIM"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("não"), Some(false));
        assert_eq!(parse_bool("x"), None);
    }
}
