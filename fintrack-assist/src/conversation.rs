//! Conversation engine: one pending action at a time, explicit confirmation
//! before any mutation.
//!
//! Every user turn appends exactly two messages to the log, the user's text
//! and one assistant reply. Failures become error replies; they never escape
//! as Rust errors to the caller.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Datelike, Local, Utc};
use fintrack_core::{
    format_amount, intent, parse_financial_log, ClassifiedTransaction, FinancialSnapshot,
    ParsedFinancialLog, TxKind,
};
use fintrack_core::projection::{profile_narratives, project};

use crate::analyzer::FALLBACK_CATEGORY;
use crate::classifier::Classifier;
use crate::store::{AccountId, CategoryId, LedgerStore, NewEntry};

const PREVIEW_LIMIT: usize = 10;
const DEFAULT_NOTE: &str = "Registrado via assistente";

const MONTH_LABELS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// Tells the UI how to render the message (plain text vs confirm/cancel
/// buttons vs status styling).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Plain,
    Confirmation,
    BulkConfirmation,
    DeleteConfirmation,
    Success,
    Error,
}

/// Append-only record of one side of a chat turn.
#[derive(Debug, Clone)]
pub struct ConversationMessage {
    pub role: Role,
    pub kind: MessageKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A proposed single transaction, frozen with the snapshot it was previewed
/// against.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub description: String,
    pub kind: TxKind,
    pub amount: f64,
    pub category: String,
    pub snapshot: FinancialSnapshot,
}

#[derive(Debug, Clone)]
pub struct PendingBulkImport {
    pub log: ParsedFinancialLog,
    pub prepared: Vec<ClassifiedTransaction>,
    pub snapshot_before: FinancialSnapshot,
    /// Category names the store does not know yet; created on commit.
    pub new_categories: Vec<String>,
    pub declared_closing_balance: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct PendingDeletion {
    pub month: u32,
    pub year: i32,
    pub count: usize,
}

/// The single outstanding mutation awaiting a yes/no. A new proposal while
/// one is pending replaces it.
#[derive(Debug, Clone)]
pub enum PendingAction {
    Single(PendingTransaction),
    Bulk(PendingBulkImport),
    Deletion(PendingDeletion),
}

struct Reply {
    kind: MessageKind,
    content: String,
}

impl Reply {
    fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }

    fn plain(content: impl Into<String>) -> Self {
        Self::new(MessageKind::Plain, content)
    }
}

/// Drives the chat: heuristics first, classifier last, nothing persisted
/// without an explicit confirmation.
pub struct ConversationEngine<C, S> {
    classifier: C,
    store: S,
    pending: Option<PendingAction>,
    log: Vec<ConversationMessage>,
    category_cache: HashMap<String, CategoryId>,
}

impl<C: Classifier, S: LedgerStore> ConversationEngine<C, S> {
    pub fn new(classifier: C, store: S) -> Self {
        let mut engine = Self {
            classifier,
            store,
            pending: None,
            log: Vec::new(),
            category_cache: HashMap::new(),
        };
        engine.push(
            Role::Assistant,
            MessageKind::Plain,
            "Olá! 👋 Sou o assistente financeiro. Me conte um gasto, cole um extrato do dia ou pergunte sobre seu saldo.".to_string(),
        );
        engine
    }

    pub fn log(&self) -> &[ConversationMessage] {
        &self.log
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Process one user message. Always appends the user message and exactly
    /// one assistant reply, and returns the reply.
    pub async fn handle_message(&mut self, text: &str) -> ConversationMessage {
        self.push(Role::User, MessageKind::Plain, text.to_string());

        let reply = match self.dispatch(text).await {
            Ok(reply) => reply,
            Err(err) => Reply::new(
                MessageKind::Error,
                format!("Algo deu errado: {err}. Nada foi registrado."),
            ),
        };

        self.push(Role::Assistant, reply.kind, reply.content)
    }

    fn push(&mut self, role: Role, kind: MessageKind, content: String) -> ConversationMessage {
        let message = ConversationMessage {
            role,
            kind,
            content,
            timestamp: Utc::now(),
        };
        self.log.push(message.clone());
        message
    }

    async fn dispatch(&mut self, text: &str) -> Result<Reply> {
        if let Some(pending) = self.pending.take() {
            if intent::is_affirmative_response(text) {
                return self.commit(pending);
            }
            if intent::is_negative_response(text) {
                return Ok(cancel_reply(&pending));
            }
            // A non-yes/no reply keeps the pending action alive and is
            // processed as a new instruction attempt. It never reaches the
            // delete grammar, only a fresh proposal can replace the pending
            // one.
            self.pending = Some(pending);
            return self.interpret(text, false).await;
        }

        self.interpret(text, true).await
    }

    async fn interpret(&mut self, text: &str, allow_delete: bool) -> Result<Reply> {
        if allow_delete {
            if let Some(cmd) = intent::parse_delete_month_command(text, Local::now().year()) {
                return self.propose_deletion(cmd);
            }
        }

        if intent::is_bulk_financial_log(text) {
            let log = parse_financial_log(text);
            if !log.transactions.is_empty() {
                return self.propose_bulk_import(log).await;
            }
        }

        self.classify_single(text).await
    }

    fn propose_deletion(&mut self, cmd: intent::DeleteMonthCommand) -> Result<Reply> {
        let count = self.store.count_active_in_month(cmd.month, cmd.year)?;
        let label = month_label(cmd.month);

        if count == 0 {
            return Ok(Reply::plain(format!(
                "Não encontrei registros ativos em {label} de {}.",
                cmd.year
            )));
        }

        self.pending = Some(PendingAction::Deletion(PendingDeletion {
            month: cmd.month,
            year: cmd.year,
            count,
        }));

        Ok(Reply::new(
            MessageKind::DeleteConfirmation,
            format!(
                "Encontrei {count} registros em {label} de {}. Quer que eu apague todos? Eles deixam de contar nos totais, mas não são removidos definitivamente.",
                cmd.year
            ),
        ))
    }

    async fn propose_bulk_import(&mut self, log: ParsedFinancialLog) -> Result<Reply> {
        let snapshot_before = self.store.snapshot()?;

        // One classifier call per entry, sequential. A failure downgrades
        // that entry to the fallback category instead of aborting the
        // preview.
        let mut prepared = Vec::with_capacity(log.transactions.len());
        for tx in &log.transactions {
            let (category, confidence) = match self.classifier.classify(&tx.description).await {
                Ok(resp) => (
                    resp.categoria.unwrap_or_else(|| FALLBACK_CATEGORY.to_string()),
                    resp.confianca.unwrap_or(50.0),
                ),
                Err(_) => (FALLBACK_CATEGORY.to_string(), 0.0),
            };
            prepared.push(ClassifiedTransaction {
                transaction: tx.clone(),
                category,
                confidence,
            });
        }

        let mut new_categories: Vec<String> = Vec::new();
        for item in &prepared {
            if self.category_cache.contains_key(&item.category)
                || self.store.find_category(&item.category).is_some()
                || new_categories.contains(&item.category)
            {
                continue;
            }
            new_categories.push(item.category.clone());
        }

        let content = bulk_preview(&prepared, &new_categories, &log, &snapshot_before);

        self.pending = Some(PendingAction::Bulk(PendingBulkImport {
            declared_closing_balance: log.closing_balance,
            log,
            prepared,
            snapshot_before,
            new_categories,
        }));

        Ok(Reply::new(MessageKind::BulkConfirmation, content))
    }

    async fn classify_single(&mut self, text: &str) -> Result<Reply> {
        let response = match self.classifier.classify(text).await {
            Ok(response) => response,
            Err(_) => {
                return Ok(Reply::new(
                    MessageKind::Error,
                    "Não consegui falar com o serviço de classificação agora. Tente de novo em instantes.",
                ));
            }
        };

        let Some((kind, amount)) = response.as_intent() else {
            let content = response
                .message
                .unwrap_or_else(|| "Não entendi. Pode reformular?".to_string());
            return Ok(Reply::plain(content));
        };

        let description = response
            .descricao
            .unwrap_or_else(|| text.trim().to_string());
        let category = response
            .categoria
            .unwrap_or_else(|| "Outro".to_string());

        let snapshot = self.store.snapshot()?;
        let projection = project(&snapshot, amount, kind);
        let narratives = profile_narratives(&snapshot, &projection);

        let mut content = response.confirmacao.unwrap_or_else(|| {
            format!(
                "Quer registrar \"{description}\" ({}) de R$ {} em {category}?",
                kind.label(),
                format_amount(amount)
            )
        });
        content.push_str(&format!(
            "\n\nSaldo projetado: R$ {}",
            format_amount(projection.projected_balance)
        ));
        for narrative in &narratives {
            let marker = if narrative.active { " (seu perfil)" } else { "" };
            content.push_str(&format!(
                "\n{}{marker}: {}",
                narrative.style.label(),
                narrative.text
            ));
        }

        self.pending = Some(PendingAction::Single(PendingTransaction {
            description,
            kind,
            amount,
            category,
            snapshot,
        }));

        Ok(Reply::new(MessageKind::Confirmation, content))
    }

    fn commit(&mut self, pending: PendingAction) -> Result<Reply> {
        match pending {
            PendingAction::Single(tx) => self.commit_single(tx),
            PendingAction::Bulk(bulk) => self.commit_bulk(bulk),
            PendingAction::Deletion(del) => self.commit_deletion(del),
        }
    }

    fn commit_single(&mut self, tx: PendingTransaction) -> Result<Reply> {
        let account = self.store.principal_account()?;
        let category_id = self.resolve_category(&tx.category)?;

        self.store.insert_entry(
            account,
            NewEntry {
                date: None,
                kind: tx.kind,
                amount: tx.amount,
                description: tx.description.clone(),
                category_id: Some(category_id),
                note: Some(DEFAULT_NOTE.to_string()),
            },
        )?;

        // The entry is persisted at this point. A balance-update failure must
        // not be reported as "nothing was registered"; say what actually
        // happened instead.
        if let Err(err) = self
            .store
            .update_account_balance(account, signed_delta(tx.kind, tx.amount))
        {
            return Ok(Reply::new(
                MessageKind::Error,
                format!(
                    "⚠️ A transação {} (R$ {}) foi salva, mas o saldo da conta não foi atualizado: {err}. Confira o saldo antes de continuar.",
                    tx.description,
                    format_amount(tx.amount)
                ),
            ));
        }

        Ok(Reply::new(
            MessageKind::Success,
            format!(
                "✅ Registrado: {} de R$ {} em {}.",
                tx.description,
                format_amount(tx.amount),
                tx.category
            ),
        ))
    }

    /// Best-effort batch: a failing entry is reported, not rolled back, and
    /// the remaining entries still commit.
    fn commit_bulk(&mut self, bulk: PendingBulkImport) -> Result<Reply> {
        let account = self.store.principal_account()?;

        let mut committed = 0usize;
        let mut errors: Vec<String> = Vec::new();

        for item in &bulk.prepared {
            match self.commit_bulk_entry(account, item) {
                Ok(()) => committed += 1,
                Err(err) => errors.push(format!("{}: {err}", item.transaction.description)),
            }
        }

        let mut content = format!("✅ Importação concluída: {committed} transações registradas.");
        if !bulk.new_categories.is_empty() {
            content.push_str(&format!(
                "\nCategorias criadas: {}.",
                bulk.new_categories.join(", ")
            ));
        }
        if !errors.is_empty() {
            content.push_str(&format!("\n⚠️ {} não entraram:", errors.len()));
            for error in &errors {
                content.push_str(&format!("\n  • {error}"));
            }
        }

        Ok(Reply::new(
            if errors.is_empty() {
                MessageKind::Success
            } else {
                MessageKind::Error
            },
            content,
        ))
    }

    fn commit_bulk_entry(
        &mut self,
        account: AccountId,
        item: &ClassifiedTransaction,
    ) -> Result<()> {
        let category_id = self.resolve_category(&item.category)?;
        self.store.insert_entry(
            account,
            NewEntry {
                date: item.transaction.date,
                kind: item.transaction.kind,
                amount: item.transaction.amount,
                description: item.transaction.description.clone(),
                category_id: Some(category_id),
                note: Some(DEFAULT_NOTE.to_string()),
            },
        )?;
        self.store.update_account_balance(
            account,
            signed_delta(item.transaction.kind, item.transaction.amount),
        )
    }

    fn commit_deletion(&mut self, del: PendingDeletion) -> Result<Reply> {
        let affected = self.store.soft_delete_month(del.month, del.year)?;
        Ok(Reply::new(
            MessageKind::Success,
            format!(
                "✅ {affected} registros de {} de {} foram apagados.",
                month_label(del.month),
                del.year
            ),
        ))
    }

    /// Cache, then store lookup, then create. The cache is engine-owned so a
    /// bulk commit resolves each name at most once.
    fn resolve_category(&mut self, name: &str) -> Result<CategoryId> {
        if let Some(&id) = self.category_cache.get(name) {
            return Ok(id);
        }
        let id = match self.store.find_category(name) {
            Some(id) => id,
            None => self.store.create_category(name)?,
        };
        self.category_cache.insert(name.to_string(), id);
        Ok(id)
    }
}

fn cancel_reply(pending: &PendingAction) -> Reply {
    let content = match pending {
        PendingAction::Single(_) => "Ok, transação descartada. 👍",
        PendingAction::Bulk(_) => "Ok, importação cancelada. Nada foi registrado.",
        PendingAction::Deletion(_) => "Ok, nada foi apagado.",
    };
    Reply::plain(content)
}

fn signed_delta(kind: TxKind, amount: f64) -> f64 {
    if kind.is_income() {
        amount
    } else {
        -amount
    }
}

fn month_label(month: u32) -> &'static str {
    MONTH_LABELS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("mês inválido")
}

fn bulk_preview(
    prepared: &[ClassifiedTransaction],
    new_categories: &[String],
    log: &ParsedFinancialLog,
    snapshot: &FinancialSnapshot,
) -> String {
    let mut income = 0.0;
    let mut expenses = 0.0;
    for item in prepared {
        if item.transaction.kind.is_income() {
            income += item.transaction.amount;
        } else {
            expenses += item.transaction.amount;
        }
    }

    let mut content = format!(
        "Encontrei {} transações no seu extrato:\n",
        prepared.len()
    );
    for item in prepared.iter().take(PREVIEW_LIMIT) {
        content.push_str(&format!(
            "• {} — R$ {} ({})\n",
            item.transaction.description,
            format_amount(item.transaction.amount),
            item.category
        ));
    }
    if prepared.len() > PREVIEW_LIMIT {
        content.push_str(&format!("… e mais {}\n", prepared.len() - PREVIEW_LIMIT));
    }

    content.push_str(&format!(
        "\nEntradas: R$ {} | Saídas: R$ {}",
        format_amount(income),
        format_amount(expenses)
    ));

    if !new_categories.is_empty() {
        content.push_str(&format!(
            "\nCategorias novas: {}",
            new_categories.join(", ")
        ));
    }

    if let Some(declared) = log.closing_balance {
        let discrepancy = declared - snapshot.balance;
        if discrepancy.abs() >= 0.01 {
            content.push_str(&format!(
                "\nO saldo final informado (R$ {}) difere do saldo atual (R$ {}) em R$ {}.",
                format_amount(declared),
                format_amount(snapshot.balance),
                format_amount(discrepancy)
            ));
        }
    }

    content.push_str("\n\nConfirma a importação?");
    content
}
