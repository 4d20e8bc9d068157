use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fintrack_assist::analyzer::analyze_statement;
use fintrack_assist::classifier::HttpClassifier;
use fintrack_assist::store::{LedgerStore, NewEntry};
use fintrack_core::format_amount;
use fintrack_ingest::{parse_statement, StatementFormat};

mod chat;
mod config;
mod state;

#[derive(Parser, Debug)]
#[command(name = "fintrack", version, about = "Assistente financeiro pessoal (pt-BR)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Conversa interativa com o assistente
    Chat,

    /// Importa um extrato bancário (CSV, OFX ou texto extraído de PDF)
    Import {
        file: PathBuf,

        /// csv | ofx | pdf (padrão: deduzido da extensão)
        #[arg(long)]
        format: Option<String>,

        /// Grava as transações no ledger depois da análise
        #[arg(long)]
        apply: bool,

        /// Linhas exibidas no preview
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Cria ~/.fintrack/config.toml com os valores padrão
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Chat => chat::run_chat()?,
        Command::Init => config::init_config()?,
        Command::Import {
            file,
            format,
            apply,
            limit,
        } => import(file, format, apply, limit).await?,
    }

    Ok(())
}

async fn import(file: PathBuf, format: Option<String>, apply: bool, limit: usize) -> Result<()> {
    let text =
        std::fs::read_to_string(&file).with_context(|| format!("lendo {}", file.display()))?;

    let format = match format.as_deref() {
        Some("csv") => StatementFormat::Csv,
        Some("ofx") => StatementFormat::Ofx,
        Some("pdf") | Some("texto") => StatementFormat::PdfText,
        Some(other) => bail!("formato desconhecido: {other} (use csv, ofx ou pdf)"),
        None => StatementFormat::from_extension(&file.to_string_lossy()),
    };

    let txns = parse_statement(format, &text)?;
    println!(
        "{} transações encontradas em {}\n",
        txns.len(),
        file.display()
    );

    let cfg = config::load_config()?;
    let classifier = HttpClassifier::new(cfg.classifier_config());
    let analysis = analyze_statement(&classifier, &txns).await;

    for item in analysis.transactions.iter().take(limit) {
        let date = item
            .transaction
            .date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| "sem data".to_string());
        println!(
            "  {date}  {}  R$ {}  [{}]",
            item.transaction.description,
            format_amount(item.transaction.amount),
            item.category
        );
    }
    if analysis.transactions.len() > limit {
        println!("  … e mais {}", analysis.transactions.len() - limit);
    }

    println!(
        "\nEntradas: R$ {} | Saídas: R$ {}",
        format_amount(analysis.total_income),
        format_amount(analysis.total_expenses)
    );
    for insight in &analysis.insights {
        println!("{insight}");
    }

    if !apply {
        println!("\nRode novamente com --apply para gravar no ledger.");
        return Ok(());
    }

    let mut ledger = state::load_ledger(cfg.ledger_settings())?;
    let account = ledger.principal_account()?;
    let mut saved = 0usize;

    for item in &analysis.transactions {
        let category_id = match ledger.find_category(&item.category) {
            Some(id) => id,
            None => ledger.create_category(&item.category)?,
        };
        ledger.insert_entry(
            account,
            NewEntry {
                date: item.transaction.date,
                kind: item.transaction.kind,
                amount: item.transaction.amount,
                description: item.transaction.description.clone(),
                category_id: Some(category_id),
                note: Some(format!("Importado de {}", file.display())),
            },
        )?;
        let delta = if item.transaction.kind.is_income() {
            item.transaction.amount
        } else {
            -item.transaction.amount
        };
        ledger.update_account_balance(account, delta)?;
        saved += 1;
    }

    state::save_ledger(&ledger)?;
    println!("\n✅ {saved} transações gravadas no ledger.");

    Ok(())
}
