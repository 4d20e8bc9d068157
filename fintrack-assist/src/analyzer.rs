//! Statement analysis: classify every parsed transaction, aggregate totals
//! and derive a behavior profile plus human-readable insights.

use std::collections::{BTreeSet, HashMap};

use fintrack_core::{format_amount, ClassifiedTransaction, Transaction};

use crate::classifier::Classifier;

/// Category assigned when the external classifier fails for one entry.
/// Classification failure is never fatal to a batch.
pub const FALLBACK_CATEGORY: &str = "Não classificado";

const DEFAULT_CATEGORY: &str = "Outro";

/// Spending pattern summary over one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BehaviorProfile {
    /// Number of expense transactions.
    pub expense_count: usize,
    /// Average expense total over the distinct calendar dates present.
    pub average_daily_spend: f64,
    /// Top 5 expenses by magnitude.
    pub largest_expenses: Vec<ExpenseHighlight>,
    /// How often each category shows up among expenses.
    pub category_frequency: HashMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseHighlight {
    pub amount: f64,
    pub description: String,
    pub category: String,
}

#[derive(Debug, Clone, Default)]
pub struct StatementAnalysis {
    pub total_transactions: usize,
    pub total_income: f64,
    pub total_expenses: f64,
    /// Category name to summed magnitude.
    pub top_categories: HashMap<String, f64>,
    pub behavior_profile: BehaviorProfile,
    /// Expenses above 1.5x income.
    pub risk_alert: bool,
    pub insights: Vec<String>,
    pub transactions: Vec<ClassifiedTransaction>,
}

/// Classify and aggregate a parsed statement.
///
/// One classifier call per transaction, strictly sequential: the external
/// service has a tight rate budget and batch latency is accepted.
pub async fn analyze_statement(
    classifier: &impl Classifier,
    transactions: &[Transaction],
) -> StatementAnalysis {
    let mut analysis = StatementAnalysis {
        total_transactions: transactions.len(),
        ..Default::default()
    };

    for tx in transactions {
        if tx.kind.is_income() {
            analysis.total_income += tx.amount;
        } else {
            analysis.total_expenses += tx.amount;
        }
    }

    for tx in transactions {
        let (category, confidence) = match classifier.classify(&tx.description).await {
            Ok(resp) => (
                resp.categoria.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
                resp.confianca.unwrap_or(50.0),
            ),
            Err(_) => (FALLBACK_CATEGORY.to_string(), 0.0),
        };

        *analysis.top_categories.entry(category.clone()).or_insert(0.0) += tx.amount;
        analysis.transactions.push(ClassifiedTransaction {
            transaction: tx.clone(),
            category,
            confidence,
        });
    }

    analysis.behavior_profile = behavior_profile(&analysis.transactions);

    if analysis.total_expenses > analysis.total_income * 1.5 {
        analysis.risk_alert = true;
        analysis
            .insights
            .push("⚠️ Gastos muito superiores à renda - possível endividamento".to_string());
    }

    let generated = generate_insights(&analysis);
    analysis.insights.extend(generated);

    analysis
}

fn behavior_profile(transactions: &[ClassifiedTransaction]) -> BehaviorProfile {
    let mut profile = BehaviorProfile::default();

    let mut expenses: Vec<&ClassifiedTransaction> = transactions
        .iter()
        .filter(|t| !t.transaction.kind.is_income())
        .collect();

    profile.expense_count = expenses.len();

    expenses.sort_by(|a, b| {
        b.transaction
            .amount
            .partial_cmp(&a.transaction.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    profile.largest_expenses = expenses
        .iter()
        .take(5)
        .map(|t| ExpenseHighlight {
            amount: t.transaction.amount,
            description: t.transaction.description.chars().take(50).collect(),
            category: t.category.clone(),
        })
        .collect();

    let days: BTreeSet<_> = transactions
        .iter()
        .filter_map(|t| t.transaction.date)
        .collect();
    let total_spent: f64 = expenses.iter().map(|t| t.transaction.amount).sum();
    profile.average_daily_spend = if days.is_empty() {
        0.0
    } else {
        total_spent / days.len() as f64
    };

    for t in &expenses {
        *profile
            .category_frequency
            .entry(t.category.clone())
            .or_insert(0) += 1;
    }

    profile
}

fn generate_insights(analysis: &StatementAnalysis) -> Vec<String> {
    let mut insights = Vec::new();

    let ratio = if analysis.total_income > 0.0 {
        analysis.total_expenses / analysis.total_income * 100.0
    } else {
        0.0
    };
    if ratio > 80.0 {
        insights.push(format!(
            "⚠️ Seus gastos representam {ratio:.1}% da renda - aperte os cintos!"
        ));
    } else if ratio > 60.0 {
        insights.push(format!("✓ Gastos controlados em {ratio:.1}% da renda"));
    } else {
        insights.push(format!(
            "✅ Excelente - apenas {ratio:.1}% da renda foi gasto"
        ));
    }

    if analysis.total_expenses > 0.0 {
        if let Some((top_category, top_value)) = analysis
            .top_categories
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        {
            let share = top_value / analysis.total_expenses * 100.0;
            insights.push(format!(
                "📊 Maior gasto em {top_category}: {share:.1}% do total"
            ));
        }
    }

    let pix_count = analysis
        .transactions
        .iter()
        .filter(|t| t.transaction.description.to_lowercase().contains("pix"))
        .count();
    if pix_count > 0 {
        insights.push(format!("📱 {pix_count} transações via PIX detectadas"));
    }

    let small_expenses = analysis
        .transactions
        .iter()
        .filter(|t| !t.transaction.kind.is_income() && t.transaction.amount < 50.0)
        .count();
    if (small_expenses as f64) > analysis.transactions.len() as f64 * 0.3 {
        insights.push(
            "💡 Muitos gastos pequenos detectados - considere consolidar compras".to_string(),
        );
    }

    if analysis.total_expenses > analysis.total_income {
        insights.push(
            "💰 Recomendação: busque fontes adicionais de renda ou reduza gastos".to_string(),
        );
    } else {
        let saved = analysis.total_income - analysis.total_expenses;
        insights.push(format!(
            "💵 Você economizou R$ {} neste período!",
            format_amount(saved)
        ));
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassifyResponse;
    use anyhow::{anyhow, Result};
    use chrono::NaiveDate;
    use fintrack_core::{Transaction, TxKind};

    /// Maps keywords to categories; descriptions containing "falha" fail.
    struct StubClassifier;

    impl Classifier for StubClassifier {
        async fn classify(&self, text: &str) -> Result<ClassifyResponse> {
            if text.contains("falha") {
                return Err(anyhow!("offline"));
            }
            let categoria = if text.to_lowercase().contains("mercado") {
                "Alimentação"
            } else if text.to_lowercase().contains("uber") {
                "Transporte"
            } else {
                "Outro"
            };
            Ok(ClassifyResponse {
                categoria: Some(categoria.to_string()),
                confianca: Some(88.0),
                ..Default::default()
            })
        }
    }

    fn tx(desc: &str, kind: TxKind, amount: f64, day: u32) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2025, 1, day),
            description: desc.to_string(),
            kind,
            amount,
            balance: None,
        }
    }

    #[tokio::test]
    async fn test_totals_and_categories() {
        let txns = vec![
            tx("Salário", TxKind::Income, 5000.0, 5),
            tx("Mercado central", TxKind::DailyExpense, 300.0, 6),
            tx("Uber centro", TxKind::DailyExpense, 40.0, 6),
        ];
        let analysis = analyze_statement(&StubClassifier, &txns).await;

        assert_eq!(analysis.total_transactions, 3);
        assert_eq!(analysis.total_income, 5000.0);
        assert_eq!(analysis.total_expenses, 340.0);
        assert_eq!(analysis.top_categories["Alimentação"], 300.0);
        assert_eq!(analysis.top_categories["Transporte"], 40.0);
        assert!(!analysis.risk_alert);
    }

    #[tokio::test]
    async fn test_classifier_failure_falls_back_per_entry() {
        let txns = vec![
            tx("Mercado", TxKind::DailyExpense, 50.0, 1),
            tx("linha com falha", TxKind::DailyExpense, 30.0, 2),
        ];
        let analysis = analyze_statement(&StubClassifier, &txns).await;

        assert_eq!(analysis.transactions.len(), 2);
        assert_eq!(analysis.transactions[1].category, FALLBACK_CATEGORY);
        assert_eq!(analysis.transactions[1].confidence, 0.0);
        assert_eq!(analysis.transactions[0].category, "Alimentação");
    }

    #[tokio::test]
    async fn test_risk_alert_above_150_pct() {
        let txns = vec![
            tx("Salário", TxKind::Income, 1000.0, 1),
            tx("Mercado", TxKind::FixedExpense, 1600.0, 2),
        ];
        let analysis = analyze_statement(&StubClassifier, &txns).await;
        assert!(analysis.risk_alert);
        assert!(analysis.insights[0].contains("endividamento"));
    }

    #[tokio::test]
    async fn test_behavior_profile_daily_average() {
        let txns = vec![
            tx("Mercado", TxKind::DailyExpense, 100.0, 1),
            tx("Uber", TxKind::DailyExpense, 50.0, 1),
            tx("Mercado de novo", TxKind::DailyExpense, 150.0, 2),
        ];
        let analysis = analyze_statement(&StubClassifier, &txns).await;
        let profile = &analysis.behavior_profile;

        // 300 spent across 2 distinct dates
        assert_eq!(profile.average_daily_spend, 150.0);
        assert_eq!(profile.expense_count, 3);
        assert_eq!(profile.largest_expenses[0].amount, 150.0);
        assert_eq!(profile.category_frequency["Alimentação"], 2);
    }

    #[tokio::test]
    async fn test_savings_insight_when_net_positive() {
        let txns = vec![
            tx("Salário", TxKind::Income, 2000.0, 1),
            tx("Mercado", TxKind::DailyExpense, 500.0, 2),
        ];
        let analysis = analyze_statement(&StubClassifier, &txns).await;
        assert!(
            analysis
                .insights
                .iter()
                .any(|i| i.contains("economizou R$ 1.500,00")),
            "{:?}",
            analysis.insights
        );
    }
}
