// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TIMING UTILITIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Utilitários para medir tempo de requisições e formatar timestamps.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use chrono::{Local, TimeZone};
use std::time::{Duration, Instant};

/// Timer para medir duração de operações
pub struct ActionTimer {
    start: Instant,
    action_name: String,
}

impl ActionTimer {
    /// Inicia um novo timer para uma ação
    pub fn start(action_name: &str) -> Self {
        Self {
            start: Instant::now(),
            action_name: action_name.to_string(),
        }
    }

    /// Retorna o tempo decorrido em milissegundos
    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    /// Retorna o tempo decorrido como Duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Para o timer e loga o tempo decorrido
    pub fn stop_and_log(self) -> u128 {
        let elapsed = self.elapsed_ms();
        log::info!("⏱️  {} completado em {}ms", self.action_name, elapsed);
        elapsed
    }
}

/// Milissegundos desde epoch (hora local do sistema)
pub fn now_millis() -> i64 {
    Local::now().timestamp_millis()
}

/// Formata epoch millis como `dd/mm/yyyy HH:MM:SS` (hora local).
///
/// Timestamps fora do intervalo representável viram "—".
pub fn format_timestamp(ts_millis: i64) -> String {
    match Local.timestamp_millis_opt(ts_millis).single() {
        Some(dt) => dt.format("%d/%m/%Y %H:%M:%S").to_string(),
        None => "—".to_string(),
    }
}
