// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// EXTRATOR DE IDENTIFICADORES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Converte texto colado livremente em três baldes tipados:
// CPFs (11 dígitos, deduplicados), nomes completos e e-mails.
//
// Ordem de classificação de cada linha (primeira regra que casar):
//   1. formato simples de e-mail      → emails (mantido como veio)
//   2. exatamente 11 dígitos          → candidato a CPF
//   3. qualquer outra coisa           → candidato a nome
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::utils::{only_digits, strip_diacritics};

/// `local@dominio.tld` sem espaços nem `@` extras
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("padrão de e-mail válido")
});

/// Resultado da extração. Recalculado por inteiro a cada mudança do texto.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierSet {
    /// CPFs válidos (primeira ocorrência, ordem preservada)
    pub cpfs: Vec<String>,
    /// Nomes completos aceitos
    pub names: Vec<String>,
    /// E-mails (não deduplicados)
    pub emails: Vec<String>,
    /// CPFs vistos mais de uma vez (cada valor listado uma vez)
    pub duplicate_cpfs: Vec<String>,
    /// Candidatos a nome rejeitados (um token só ou curtos demais)
    pub discarded: Vec<String>,
    /// Linhas não vazias consideradas
    pub total_lines: usize,
}

impl IdentifierSet {
    /// Total de itens válidos (`cpfs + names + emails`)
    pub fn total_valid(&self) -> usize {
        self.cpfs.len() + self.names.len() + self.emails.len()
    }

    /// Quantidade de CPFs duplicados
    pub fn duplicate_count(&self) -> usize {
        self.duplicate_cpfs.len()
    }

    /// Não há nenhum identificador válido
    pub fn is_empty(&self) -> bool {
        self.total_valid() == 0
    }

    /// Lista enviada ao backend: CPFs, depois nomes, depois e-mails
    pub fn items(&self) -> Vec<String> {
        self.cpfs
            .iter()
            .chain(self.names.iter())
            .chain(self.emails.iter())
            .cloned()
            .collect()
    }

    /// Habilita o botão de busca: precisa de base e de ao menos um item
    pub fn can_search(&self, has_base: bool) -> bool {
        has_base && !self.is_empty()
    }

    /// Texto de resumo exibido abaixo da área de colagem
    pub fn summary(&self) -> String {
        format!(
            "{} itens válidos (CPF, Nome Completo ou E-mail)",
            self.total_valid()
        )
    }

    /// Aviso de duplicados, quando houver
    pub fn duplicates_warning(&self) -> Option<String> {
        if self.duplicate_cpfs.is_empty() {
            None
        } else {
            Some(format!("CPFs duplicados: {}", self.duplicate_cpfs.join(", ")))
        }
    }
}

/// Nome completo: pelo menos dois tokens e 3 caracteres depois de remover acentos
pub fn is_valid_full_name(candidate: &str) -> bool {
    let normalized = strip_diacritics(candidate);
    let trimmed = normalized.trim();
    trimmed.split_whitespace().count() >= 2 && trimmed.chars().count() >= 3
}

/// Formato simples de e-mail
pub fn is_email(line: &str) -> bool {
    EMAIL_PATTERN.is_match(line)
}

/// Extrai identificadores de um texto livre. Nunca falha.
pub fn extract_identifiers(text: &str) -> IdentifierSet {
    let mut set = IdentifierSet::default();
    let mut seen_cpfs: HashSet<String> = HashSet::new();

    // `lines()` já trata `\r\n`
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        set.total_lines += 1;

        if is_email(line) {
            set.emails.push(line.to_string());
            continue;
        }

        let digits = only_digits(line);
        if digits.len() == 11 {
            if seen_cpfs.contains(&digits) {
                if !set.duplicate_cpfs.contains(&digits) {
                    set.duplicate_cpfs.push(digits);
                }
            } else {
                seen_cpfs.insert(digits.clone());
                set.cpfs.push(digits);
            }
            continue;
        }

        if is_valid_full_name(line) {
            set.names.push(line.to_string());
        } else {
            set.discarded.push(line.to_string());
        }
    }

    set
}
