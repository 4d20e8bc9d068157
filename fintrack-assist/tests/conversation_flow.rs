//! End-to-end chat flows against an in-memory ledger and a stub classifier:
//! propose, confirm, cancel, bulk import with a partial failure, and the
//! delete-month flow.

use anyhow::{bail, Result};
use fintrack_assist::classifier::{Classifier, ClassifyResponse};
use fintrack_assist::conversation::{ConversationEngine, MessageKind, PendingAction};
use fintrack_assist::store::{
    AccountId, CategoryId, LedgerStore, MemoryLedger, NewEntry,
};
use fintrack_core::FinancialSnapshot;

struct StubClassifier;

impl Classifier for StubClassifier {
    async fn classify(&self, text: &str) -> Result<ClassifyResponse> {
        let lower = text.to_lowercase();
        if lower.contains("gastei") {
            return Ok(ClassifyResponse::from_raw(
                r#"{"tipo":"diario","categoria":"Alimentação","valor":45.0,"descricao":"compras no mercado","confianca":92,"confirmacao":"Você quer registrar R$45 em Alimentação?"}"#,
            ));
        }
        let categoria = if lower.contains("mercado") {
            Some("Alimentação".to_string())
        } else if lower.contains("uber") {
            Some("Transporte".to_string())
        } else {
            None
        };
        match categoria {
            Some(categoria) => Ok(ClassifyResponse {
                categoria: Some(categoria),
                confianca: Some(90.0),
                ..Default::default()
            }),
            None => Ok(ClassifyResponse::plain_message(
                "Posso ajudar com seus gastos!",
            )),
        }
    }
}

const BULK_LOG: &str = "\
Saldo inicial: 1000,00
Saídas do dia:
  Mercado: 50,00
  Uber: 23,50
Saldo atual: 926,50";

#[tokio::test]
async fn single_transaction_confirm_persists() {
    let mut engine = ConversationEngine::new(StubClassifier, MemoryLedger::new());

    let reply = engine.handle_message("gastei 45 no mercado").await;
    assert_eq!(reply.kind, MessageKind::Confirmation);
    assert!(reply.content.contains("registrar R$45"));
    assert!(matches!(engine.pending(), Some(PendingAction::Single(_))));

    let reply = engine.handle_message("pode sim").await;
    assert_eq!(reply.kind, MessageKind::Success);
    assert!(engine.pending().is_none());

    let store = engine.store();
    assert_eq!(store.entries().len(), 1);
    let entry = &store.entries()[0];
    assert_eq!(entry.amount, 45.0);
    assert_eq!(entry.description, "compras no mercado");
    assert_eq!(store.account_balance(entry.account_id), Some(-45.0));
}

#[tokio::test]
async fn cancel_clears_pending_without_side_effect() {
    let mut engine = ConversationEngine::new(StubClassifier, MemoryLedger::new());

    engine.handle_message("gastei 45 no mercado").await;
    let reply = engine.handle_message("não, melhor não").await;

    assert_eq!(reply.kind, MessageKind::Plain);
    assert!(engine.pending().is_none());
    assert!(engine.store().entries().is_empty());
}

#[tokio::test]
async fn off_topic_reply_keeps_pending_alive() {
    let mut engine = ConversationEngine::new(StubClassifier, MemoryLedger::new());

    engine.handle_message("gastei 45 no mercado").await;
    let reply = engine.handle_message("qual é o meu saldo mesmo?").await;

    assert_eq!(reply.kind, MessageKind::Plain);
    assert!(matches!(engine.pending(), Some(PendingAction::Single(_))));
    assert!(engine.store().entries().is_empty());
}

/// Ledger wrapper that refuses to insert any entry mentioning "uber".
struct FlakyStore {
    inner: MemoryLedger,
}

impl LedgerStore for FlakyStore {
    fn find_category(&self, name: &str) -> Option<CategoryId> {
        self.inner.find_category(name)
    }

    fn create_category(&mut self, name: &str) -> Result<CategoryId> {
        self.inner.create_category(name)
    }

    fn principal_account(&mut self) -> Result<AccountId> {
        self.inner.principal_account()
    }

    fn insert_entry(&mut self, account: AccountId, entry: NewEntry) -> Result<()> {
        if entry.description.to_lowercase().contains("uber") {
            bail!("disco cheio");
        }
        self.inner.insert_entry(account, entry)
    }

    fn update_account_balance(&mut self, account: AccountId, delta: f64) -> Result<()> {
        self.inner.update_account_balance(account, delta)
    }

    fn count_active_in_month(&self, month: u32, year: i32) -> Result<usize> {
        self.inner.count_active_in_month(month, year)
    }

    fn soft_delete_month(&mut self, month: u32, year: i32) -> Result<usize> {
        self.inner.soft_delete_month(month, year)
    }

    fn snapshot(&self) -> Result<FinancialSnapshot> {
        self.inner.snapshot()
    }
}

#[tokio::test]
async fn bulk_import_commits_partially_and_reports_one_error() {
    let store = FlakyStore {
        inner: MemoryLedger::new(),
    };
    let mut engine = ConversationEngine::new(StubClassifier, store);

    let reply = engine.handle_message(BULK_LOG).await;
    assert_eq!(reply.kind, MessageKind::BulkConfirmation);
    assert!(reply.content.contains("2 transações"));
    assert!(matches!(engine.pending(), Some(PendingAction::Bulk(_))));

    let reply = engine.handle_message("pode registrar").await;
    assert_eq!(reply.kind, MessageKind::Error);
    assert_eq!(reply.content.matches("• ").count(), 1);
    assert!(reply.content.contains("1 transações registradas"));
    assert!(reply.content.contains("disco cheio"));

    let inner = &engine.store().inner;
    assert_eq!(inner.entries().len(), 1);
    assert!(inner.entries()[0].description.contains("Mercado"));
}

/// Ledger wrapper whose balance updates always fail.
struct StuckBalanceStore {
    inner: MemoryLedger,
}

impl LedgerStore for StuckBalanceStore {
    fn find_category(&self, name: &str) -> Option<CategoryId> {
        self.inner.find_category(name)
    }

    fn create_category(&mut self, name: &str) -> Result<CategoryId> {
        self.inner.create_category(name)
    }

    fn principal_account(&mut self) -> Result<AccountId> {
        self.inner.principal_account()
    }

    fn insert_entry(&mut self, account: AccountId, entry: NewEntry) -> Result<()> {
        self.inner.insert_entry(account, entry)
    }

    fn update_account_balance(&mut self, _account: AccountId, _delta: f64) -> Result<()> {
        bail!("saldo travado")
    }

    fn count_active_in_month(&self, month: u32, year: i32) -> Result<usize> {
        self.inner.count_active_in_month(month, year)
    }

    fn soft_delete_month(&mut self, month: u32, year: i32) -> Result<usize> {
        self.inner.soft_delete_month(month, year)
    }

    fn snapshot(&self) -> Result<FinancialSnapshot> {
        self.inner.snapshot()
    }
}

#[tokio::test]
async fn balance_failure_after_insert_reports_saved_entry() {
    let store = StuckBalanceStore {
        inner: MemoryLedger::new(),
    };
    let mut engine = ConversationEngine::new(StubClassifier, store);

    engine.handle_message("gastei 45 no mercado").await;
    let reply = engine.handle_message("sim").await;

    // the entry was persisted, so the reply must not claim otherwise
    assert_eq!(reply.kind, MessageKind::Error);
    assert!(reply.content.contains("foi salva"), "{}", reply.content);
    assert!(reply.content.contains("saldo"), "{}", reply.content);
    assert!(!reply.content.contains("Nada foi registrado"), "{}", reply.content);
    assert_eq!(engine.store().inner.entries().len(), 1);
    assert!(engine.pending().is_none());
}

#[tokio::test]
async fn delete_month_flow_soft_deletes() {
    let mut ledger = MemoryLedger::new();
    let account = ledger.principal_account().unwrap();
    for day in [5, 12] {
        ledger
            .insert_entry(
                account,
                NewEntry {
                    date: chrono::NaiveDate::from_ymd_opt(2024, 3, day),
                    kind: fintrack_core::TxKind::DailyExpense,
                    amount: 20.0,
                    description: format!("gasto dia {day}"),
                    category_id: None,
                    note: None,
                },
            )
            .unwrap();
    }

    let mut engine = ConversationEngine::new(StubClassifier, ledger);

    let reply = engine
        .handle_message("apague os registros de março de 2024")
        .await;
    assert_eq!(reply.kind, MessageKind::DeleteConfirmation);
    assert!(reply.content.contains("2 registros"));

    let reply = engine.handle_message("sim").await;
    assert_eq!(reply.kind, MessageKind::Success);
    assert_eq!(
        engine.store().count_active_in_month(3, 2024).unwrap(),
        0
    );
}

#[tokio::test]
async fn delete_month_with_no_matches_stays_idle() {
    let mut engine = ConversationEngine::new(StubClassifier, MemoryLedger::new());

    let reply = engine
        .handle_message("apague os registros de janeiro de 2030")
        .await;
    assert_eq!(reply.kind, MessageKind::Plain);
    assert!(reply.content.contains("Não encontrei"));
    assert!(engine.pending().is_none());
}
