//! Free-text financial log parsing.
//!
//! Users paste day summaries like:
//!
//! ```text
//! Saldo inicial: 1000,00
//! Saídas do dia:
//!   Mercado: 50,00
//!   Uber: 23,50
//! Saldo atual: 926,50
//! ```
//!
//! Indentation builds the hierarchy: a line whose next line is deeper is a
//! category header and contributes no amount itself; only leaf lines become
//! transactions.

use crate::model::{infer_kind, ParsedFinancialLog, Transaction};
use crate::normalize::{extract_amounts, strip_accents};

struct LogLine<'a> {
    indent: usize,
    content: &'a str,
}

/// Parse a multi-line financial log into declared balances plus leaf
/// transactions. An empty `transactions` vec means no usable log was
/// detected; that judgement is left to the caller.
pub fn parse_financial_log(text: &str) -> ParsedFinancialLog {
    let normalized = text.replace("\r\n", "\n").replace('\u{a0}', " ");
    let mut log = ParsedFinancialLog::default();

    let mut lines: Vec<LogLine> = Vec::new();
    for raw in normalized.lines() {
        let content = raw.trim();
        if content.is_empty() {
            continue;
        }
        let lowered = strip_accents(&content.to_lowercase());
        if lowered.starts_with("saldo inicial") {
            log.opening_balance = first_amount(content);
            continue;
        }
        if lowered.starts_with("saldo atual") || lowered.starts_with("saldo final") {
            log.closing_balance = first_amount(content);
            continue;
        }
        lines.push(LogLine {
            indent: raw.len() - raw.trim_start().len(),
            content,
        });
    }

    let mut parent: Option<String> = None;
    for (i, line) in lines.iter().enumerate() {
        let next_indent = lines.get(i + 1).map(|l| l.indent);
        let is_header = next_indent.is_some_and(|n| n > line.indent);

        let (description, segment) = match line.content.split_once(':') {
            Some((left, right)) => (left.trim(), right),
            None => (line.content, line.content),
        };

        if is_header {
            if line.indent == 0 {
                parent = Some(description.to_string());
            }
            continue;
        }
        if line.indent == 0 {
            parent = None;
        }

        let amounts = extract_amounts(segment);
        if amounts.is_empty() {
            continue;
        }

        let base = match (&parent, line.indent > 0) {
            (Some(p), true) => format!("{p} · {description}"),
            _ => description.to_string(),
        };

        for (n, value) in amounts.iter().enumerate() {
            let label = if amounts.len() > 1 {
                format!("{base} #{}", n + 1)
            } else {
                base.clone()
            };
            let kind = infer_kind(&label);
            log.transactions.push(Transaction::new(label, kind, value.abs()));
        }
    }

    log
}

fn first_amount(line: &str) -> Option<f64> {
    extract_amounts(line).first().copied()
}
