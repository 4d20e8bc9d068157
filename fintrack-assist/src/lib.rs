//! fintrack-assist: the conversational layer of FinTrack. Classifies free
//! text through an external service, analyzes parsed statements and drives
//! the confirm-before-commit chat loop against a ledger store.

pub mod analyzer;
pub mod classifier;
pub mod conversation;
pub mod store;

pub use analyzer::{analyze_statement, BehaviorProfile, StatementAnalysis, FALLBACK_CATEGORY};
pub use classifier::{Classifier, ClassifierConfig, ClassifyResponse, HttpClassifier};
pub use conversation::{
    ConversationEngine, ConversationMessage, MessageKind, PendingAction, Role,
};
pub use store::{AccountId, CategoryId, LedgerSettings, LedgerStore, MemoryLedger, NewEntry};
