//! fintrack-core: domain model, pt-BR locale parsing and chat heuristics
//! for the FinTrack financial assistant.

pub mod bulk_log;
pub mod intent;
pub mod model;
pub mod normalize;
pub mod projection;

pub use bulk_log::parse_financial_log;
pub use intent::{
    is_affirmative_response, is_bulk_financial_log, is_negative_response, matches_keyword,
    parse_delete_month_command, DeleteMonthCommand,
};
pub use model::{
    detect_csv_kind, infer_kind, ClassifiedTransaction, ParsedFinancialLog, Transaction, TxKind,
};
pub use normalize::{extract_amounts, format_amount, parse_amount, parse_date, strip_accents};
pub use projection::{
    profile_narratives, project, AdvisoryStyle, FinancialSnapshot, Projection, ProfileNarrative,
    Tone,
};
