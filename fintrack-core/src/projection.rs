//! Balance projection for a candidate transaction plus the three advisory
//! narratives (conservative / balanced / aggressive) rendered from it.

use serde::{Deserialize, Serialize};

use crate::model::TxKind;
use crate::normalize::format_amount;

/// Which advisory framing the user picked in their settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AdvisoryStyle {
    #[serde(rename = "conservador")]
    Conservative,
    #[default]
    #[serde(rename = "equilibrado")]
    Balanced,
    #[serde(rename = "agressivo")]
    Aggressive,
}

impl AdvisoryStyle {
    pub fn label(&self) -> &'static str {
        match self {
            AdvisoryStyle::Conservative => "Conservador",
            AdvisoryStyle::Balanced => "Equilibrado",
            AdvisoryStyle::Aggressive => "Agressivo",
        }
    }
}

/// Message tone the assistant signs off with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tone {
    #[default]
    #[serde(rename = "amigavel")]
    Friendly,
    #[serde(rename = "profissional")]
    Professional,
    #[serde(rename = "direto")]
    Direct,
    #[serde(rename = "motivacional")]
    Motivational,
}

impl Tone {
    fn suffix(&self) -> &'static str {
        match self {
            Tone::Friendly => "Conte comigo! 😊",
            Tone::Professional => "Sigo acompanhando os números.",
            Tone::Direct => "Decida e siga.",
            Tone::Motivational => "Você está no controle! 💪",
        }
    }
}

/// Point-in-time read of account and budget state, captured the moment a
/// transaction is proposed. Immutable afterwards so the preview the user
/// confirmed is the preview that gets applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub balance: f64,
    pub monthly_income: f64,
    pub fixed_expenses: f64,
    pub daily_expenses: f64,
    pub reserve_target: f64,
    pub reserve_actual: f64,
    pub style: AdvisoryStyle,
    pub tone: Tone,
}

impl FinancialSnapshot {
    pub fn total_expenses(&self) -> f64 {
        self.fixed_expenses + self.daily_expenses
    }
}

/// Before/after figures for one candidate transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Signed balance impact (+ for income, − for expenses).
    pub delta: f64,
    pub projected_balance: f64,
    /// Only set for expenses.
    pub projected_expenses: Option<f64>,
    /// Percentage of monthly income; `None` when income is zero (never a
    /// division by zero).
    pub projected_expense_pct: Option<f64>,
}

pub fn project(snapshot: &FinancialSnapshot, amount: f64, kind: TxKind) -> Projection {
    let delta = if kind.is_income() { amount } else { -amount };
    let projected_balance = snapshot.balance + delta;

    let (projected_expenses, projected_expense_pct) = if kind.is_income() {
        (None, None)
    } else {
        let expenses = snapshot.total_expenses() + amount;
        let pct = (snapshot.monthly_income > 0.0)
            .then(|| expenses / snapshot.monthly_income * 100.0);
        (Some(expenses), pct)
    };

    Projection {
        delta,
        projected_balance,
        projected_expenses,
        projected_expense_pct,
    }
}

/// One advisory framing of the same projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileNarrative {
    pub style: AdvisoryStyle,
    /// Marks the narrative matching the user's configured style.
    pub active: bool,
    pub text: String,
}

/// Render the three fixed narratives. The one matching the snapshot's style
/// is flagged active and receives the configured tone suffix.
pub fn profile_narratives(
    snapshot: &FinancialSnapshot,
    projection: &Projection,
) -> Vec<ProfileNarrative> {
    let styles = [
        AdvisoryStyle::Conservative,
        AdvisoryStyle::Balanced,
        AdvisoryStyle::Aggressive,
    ];

    styles
        .iter()
        .map(|style| {
            let mut text = match style {
                AdvisoryStyle::Conservative => conservative_text(snapshot, projection),
                AdvisoryStyle::Balanced => balanced_text(projection),
                AdvisoryStyle::Aggressive => aggressive_text(projection),
            };
            let active = *style == snapshot.style;
            if active {
                text.push(' ');
                text.push_str(snapshot.tone.suffix());
            }
            ProfileNarrative {
                style: *style,
                active,
                text,
            }
        })
        .collect()
}

fn conservative_text(snapshot: &FinancialSnapshot, projection: &Projection) -> String {
    let reserve_gap = (snapshot.reserve_target - snapshot.reserve_actual).max(0.0);

    if projection.delta >= 0.0 {
        if reserve_gap > 0.0 {
            format!(
                "Boa entrada. Ainda faltam R$ {} para a meta de reserva; priorize fechá-la.",
                format_amount(reserve_gap)
            )
        } else {
            "Reserva em dia; essa entrada fortalece o colchão.".to_string()
        }
    } else if projection.projected_balance < snapshot.reserve_target {
        format!(
            "Cuidado: o saldo projetado (R$ {}) ficaria abaixo da meta de reserva (R$ {}).",
            format_amount(projection.projected_balance),
            format_amount(snapshot.reserve_target)
        )
    } else if reserve_gap > 0.0 {
        format!(
            "Dá para fazer, mas a reserva ainda tem um buraco de R$ {}.",
            format_amount(reserve_gap)
        )
    } else {
        "Gasto cabe no plano sem comprometer a reserva.".to_string()
    }
}

fn balanced_text(projection: &Projection) -> String {
    match projection.projected_expense_pct {
        Some(pct) if pct > 100.0 => format!(
            "Com esse gasto os compromissos do mês passam de {:.0}% da renda. Vale repensar o momento.",
            pct
        ),
        Some(pct) if pct > 80.0 => format!(
            "O orçamento fica apertado: {:.0}% da renda comprometida.",
            pct
        ),
        Some(pct) => format!(
            "Tranquilo: os gastos do mês ficam em {:.0}% da renda.",
            pct
        ),
        None if projection.delta >= 0.0 => {
            "Entrada registrada no planejamento do mês.".to_string()
        }
        None => "Sem renda cadastrada para comparar; registre sua renda mensal.".to_string(),
    }
}

fn aggressive_text(projection: &Projection) -> String {
    if projection.projected_balance < 0.0 {
        format!(
            "Saldo projetado negativo (R$ {}). Nem o perfil agressivo topa esse.",
            format_amount(projection.projected_balance)
        )
    } else {
        "Margem ok. Se o retorno compensa, siga.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> FinancialSnapshot {
        FinancialSnapshot {
            balance: 2000.0,
            monthly_income: 5000.0,
            fixed_expenses: 2000.0,
            daily_expenses: 1000.0,
            reserve_target: 3000.0,
            reserve_actual: 1000.0,
            style: AdvisoryStyle::Conservative,
            tone: Tone::Friendly,
        }
    }

    #[test]
    fn test_expense_projection_pct() {
        let p = project(&snapshot(), 2500.0, TxKind::DailyExpense);
        assert_eq!(p.delta, -2500.0);
        assert_eq!(p.projected_balance, -500.0);
        assert_eq!(p.projected_expenses, Some(5500.0));
        let pct = p.projected_expense_pct.unwrap();
        assert!((pct - 110.0).abs() < 0.01, "pct = {pct}");
    }

    #[test]
    fn test_income_projection_has_no_pct() {
        let p = project(&snapshot(), 1000.0, TxKind::Income);
        assert_eq!(p.delta, 1000.0);
        assert_eq!(p.projected_balance, 3000.0);
        assert!(p.projected_expenses.is_none());
        assert!(p.projected_expense_pct.is_none());
    }

    #[test]
    fn test_zero_income_never_divides() {
        let mut s = snapshot();
        s.monthly_income = 0.0;
        let p = project(&s, 100.0, TxKind::FixedExpense);
        assert!(p.projected_expense_pct.is_none());
        assert_eq!(p.projected_expenses, Some(3100.0));
    }

    #[test]
    fn test_conservative_warns_below_reserve_target() {
        let s = snapshot();
        let p = project(&s, 2500.0, TxKind::DailyExpense);
        let narratives = profile_narratives(&s, &p);
        let conservative = &narratives[0];
        assert_eq!(conservative.style, AdvisoryStyle::Conservative);
        assert!(conservative.active);
        assert!(
            conservative.text.contains("abaixo da meta de reserva"),
            "{}",
            conservative.text
        );
    }

    #[test]
    fn test_active_narrative_matches_style_and_gets_tone() {
        let mut s = snapshot();
        s.style = AdvisoryStyle::Aggressive;
        s.tone = Tone::Direct;
        let p = project(&s, 100.0, TxKind::DailyExpense);
        let narratives = profile_narratives(&s, &p);
        assert_eq!(narratives.iter().filter(|n| n.active).count(), 1);
        let active = narratives.iter().find(|n| n.active).unwrap();
        assert_eq!(active.style, AdvisoryStyle::Aggressive);
        assert!(active.text.ends_with("Decida e siga."));
    }

    #[test]
    fn test_aggressive_only_flags_negative_balance() {
        let s = snapshot();
        let ok = project(&s, 100.0, TxKind::DailyExpense);
        let narratives = profile_narratives(&s, &ok);
        assert!(!narratives[2].text.contains("negativo"));

        let bad = project(&s, 2500.0, TxKind::DailyExpense);
        let narratives = profile_narratives(&s, &bad);
        assert!(narratives[2].text.contains("negativo"));
    }
}
