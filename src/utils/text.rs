// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TEXT UTILITIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Utilitários para processamento de texto:
// - Remoção de acentos
// - Extração de dígitos
// - Escape de campos CSV
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

/// Remove diacríticos: decomposição NFKD seguida da remoção das marcas
/// combinantes U+0300..U+036F.
pub fn strip_diacritics(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&c)
}

/// Mantém apenas os dígitos ASCII de um texto
pub fn only_digits(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Envolve um campo em aspas duplas, duplicando as aspas internas
pub fn csv_quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Converte um valor JSON em texto de célula.
///
/// `null` vira string vazia; strings são usadas sem aspas; o resto usa
/// a representação JSON compacta.
pub fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Trunca para `max_len` caracteres, adicionando "…" quando corta
pub fn truncate_chars(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_len.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_diacritics() {
        assert_eq!(strip_diacritics("João Conceição"), "Joao Conceicao");
        assert_eq!(strip_diacritics("Ágata Ümit"), "Agata Umit");
        assert_eq!(strip_diacritics("plain"), "plain");
    }

    #[test]
    fn test_only_digits() {
        assert_eq!(only_digits("123.456.789-09"), "12345678909");
        assert_eq!(only_digits("sem digitos"), "");
    }

    #[test]
    fn test_csv_quote() {
        assert_eq!(csv_quote("abc"), "\"abc\"");
        assert_eq!(csv_quote("diz \"oi\""), "\"diz \"\"oi\"\"\"");
    }

    #[test]
    fn test_value_to_cell() {
        assert_eq!(value_to_cell(&json!(null)), "");
        assert_eq!(value_to_cell(&json!("x")), "x");
        assert_eq!(value_to_cell(&json!(12)), "12");
        assert_eq!(value_to_cell(&json!(true)), "true");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("curto", 10), "curto");
        assert_eq!(truncate_chars("Conceição", 5), "Conc…");
    }
}
