//! Chat-reply heuristics: yes/no detection, delete-month commands and the
//! bulk-log gate. Each rule is a named function so it can be tested on its
//! own instead of living inline in the conversation loop.

use regex::Regex;

use crate::normalize::strip_accents;

/// Curated pt-BR affirmative markers. Single words match whole tokens only;
/// phrases match as substrings.
const AFFIRMATIVE_KEYWORDS: &[&str] = &[
    "sim",
    "pode",
    "confirmo",
    "confirmar",
    "confirma",
    "ok",
    "claro",
    "certo",
    "beleza",
    "isso",
    "exato",
    "positivo",
    "bora",
    "manda",
    "com certeza",
    "pode sim",
    "pode continuar",
    "pode registrar",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "nao",
    "cancela",
    "cancelar",
    "errado",
    "negativo",
    "espera",
    "deixa",
    "melhor nao",
    "nao pode",
    "nao quero",
    "ainda nao",
];

/// Lowercase, fold accents and turn punctuation into whitespace so tokens
/// like "pode!" and "não," match their bare forms.
fn normalize_for_match(text: &str) -> String {
    strip_accents(&text.to_lowercase())
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect()
}

/// Keyword match with whole-token semantics for single words (so "nao"
/// inside another word never triggers) and substring semantics for phrases.
pub fn matches_keyword(text: &str, keywords: &[&str]) -> bool {
    let normalized = normalize_for_match(text);
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    keywords.iter().any(|k| {
        if k.contains(' ') {
            normalized.contains(k)
        } else {
            tokens.iter().any(|t| t == k)
        }
    })
}

/// True when the reply reads as a confirmation. A negative marker anywhere
/// wins over affirmative words ("não pode" is a refusal despite "pode").
pub fn is_affirmative_response(text: &str) -> bool {
    !is_negative_response(text) && matches_keyword(text, AFFIRMATIVE_KEYWORDS)
}

pub fn is_negative_response(text: &str) -> bool {
    matches_keyword(text, NEGATIVE_KEYWORDS)
}

/// A resolved "apague os registros de <mês>" command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteMonthCommand {
    /// 1–12.
    pub month: u32,
    pub year: i32,
}

const MONTH_NAMES: &[(&str, u32)] = &[
    ("janeiro", 1),
    ("fevereiro", 2),
    ("marco", 3),
    ("abril", 4),
    ("maio", 5),
    ("junho", 6),
    ("julho", 7),
    ("agosto", 8),
    ("setembro", 9),
    ("outubro", 10),
    ("novembro", 11),
    ("dezembro", 12),
];

/// Detect an explicit month-deletion command. Conjunctive gate: the text
/// must contain a delete verb AND a records noun, plus a resolvable month;
/// otherwise this is not treated as a deletion at all.
pub fn parse_delete_month_command(text: &str, current_year: i32) -> Option<DeleteMonthCommand> {
    let normalized = normalize_for_match(text);

    let has_verb = normalized.contains("apague") || normalized.contains("apagar");
    let has_object = normalized.contains("registros") || normalized.contains("transacoes");
    if !has_verb || !has_object {
        return None;
    }

    let month = month_by_name(&normalized).or_else(|| month_by_number(&normalized))?;

    let year = Regex::new(r"\b(20\d{2})\b")
        .ok()?
        .captures(&normalized)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(current_year);

    Some(DeleteMonthCommand { month, year })
}

fn month_by_name(normalized: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .find(|(name, _)| normalized.contains(name))
        .map(|(_, n)| *n)
}

fn month_by_number(normalized: &str) -> Option<u32> {
    let re = Regex::new(r"mes\s+(\d{1,2})").ok()?;
    let month: u32 = re.captures(normalized)?.get(1)?.as_str().parse().ok()?;
    (1..=12).contains(&month).then_some(month)
}

/// Multi-signal gate for "this message is a pasted financial log". Requires
/// the opening-balance phrase plus at least one corroborating signal, so a
/// casual mention of a balance never triggers a bulk import.
pub fn is_bulk_financial_log(text: &str) -> bool {
    let normalized = strip_accents(&text.to_lowercase());
    if !normalized.contains("saldo inicial") {
        return false;
    }

    let has_closing =
        normalized.contains("saldo atual") || normalized.contains("saldo final");
    let has_day_summary =
        normalized.contains("saidas do dia") || normalized.contains("entradas do dia");
    let has_marker = text.contains('✔')
        || text.contains('✓')
        || normalized.contains("cartao")
        || normalized.contains("pix");
    let numeric_lines = normalized
        .lines()
        .filter(|l| l.chars().any(|c| c.is_ascii_digit()))
        .count();

    has_closing || has_day_summary || has_marker || numeric_lines >= 6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmative_detection() {
        assert!(is_affirmative_response("Pode sim, pode continuar!"));
        assert!(is_affirmative_response("sim"));
        assert!(is_affirmative_response("Ok!"));
        assert!(!is_affirmative_response("talvez depois"));
    }

    #[test]
    fn test_negation_wins_over_substring() {
        assert!(!is_affirmative_response("nao pode"));
        assert!(is_negative_response("Não, cancela isso"));
        // "nao" must not match inside another word
        assert!(!is_negative_response("naotem nada a ver"));
    }

    #[test]
    fn test_delete_command_full() {
        let cmd = parse_delete_month_command("apague os registros de março de 2024", 2026);
        assert_eq!(cmd, Some(DeleteMonthCommand { month: 3, year: 2024 }));
    }

    #[test]
    fn test_delete_command_month_number_and_default_year() {
        let cmd = parse_delete_month_command("apagar transações do mês 2", 2026);
        assert_eq!(cmd, Some(DeleteMonthCommand { month: 2, year: 2026 }));
    }

    #[test]
    fn test_delete_command_requires_object() {
        assert_eq!(parse_delete_month_command("apague isso", 2026), None);
    }

    #[test]
    fn test_delete_command_requires_month() {
        assert_eq!(
            parse_delete_month_command("apague os registros antigos", 2026),
            None
        );
    }

    #[test]
    fn test_delete_command_rejects_month_13() {
        assert_eq!(
            parse_delete_month_command("apague os registros do mês 13", 2026),
            None
        );
    }

    #[test]
    fn test_bulk_gate_needs_corroboration() {
        assert!(!is_bulk_financial_log("meu saldo inicial era bom"));
        assert!(is_bulk_financial_log(
            "Saldo inicial: 1000,00\nMercado: 50,00\nSaldo atual: 950,00"
        ));
        assert!(is_bulk_financial_log(
            "saldo inicial 200\nsaidas do dia:\n  padaria 10"
        ));
        assert!(is_bulk_financial_log("saldo inicial 200, paguei no pix"));
    }

    #[test]
    fn test_bulk_gate_numeric_line_threshold() {
        let text = "saldo inicial 100\na 1\nb 2\nc 3\nd 4\ne 5";
        assert!(is_bulk_financial_log(text));
        let short = "saldo inicial era bom\nsem numeros aqui";
        assert!(!is_bulk_financial_log(short));
    }
}
