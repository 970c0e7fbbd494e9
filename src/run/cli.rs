use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Subcommand;
use std::io::{Cursor, Read, Write};
use std::path::PathBuf;

use crate::db::Database;
use crate::models::*;
use crate::report;
use crate::spreadsheet;
use crate::ui::util::{format_amount, truncate};

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Expense management
    #[command(subcommand, alias = "e")]
    Expense(ExpenseCommand),

    /// Category management
    #[command(subcommand, alias = "c")]
    Category(LookupCommand),

    /// Payment method management
    #[command(subcommand, alias = "m")]
    Method(LookupCommand),

    /// Motivational phrases
    #[command(subcommand)]
    Phrase(PhraseCommand),

    /// Spending reports
    #[command(subcommand, alias = "r")]
    Report(ReportCommand),

    /// Monthly spending limit
    #[command(subcommand)]
    Limit(LimitCommand),

    /// Export every expense to a spreadsheet (.xlsx or .csv)
    Export {
        /// Output file (default: gastos.xlsx); "-" writes the workbook to stdout
        path: Option<PathBuf>,
    },

    /// Import expenses from a spreadsheet (.xlsx or .csv)
    Import {
        /// File to read; "-" reads a workbook from stdin
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub(crate) enum ExpenseCommand {
    /// Record a new expense
    Add {
        /// Amount, e.g. "50.75" or "$1,200"
        amount: String,
        /// Category name or ID
        #[arg(short, long)]
        category: String,
        /// Payment method name or ID
        #[arg(short, long)]
        method: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS" (default: now)
        #[arg(long)]
        date: Option<String>,
    },

    /// List expenses, newest first
    List {
        /// First day included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Last day included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        method: Option<String>,
    },

    /// Print one expense
    Show { id: i64 },

    /// Change fields of an existing expense
    Update {
        id: i64,
        #[arg(short, long)]
        amount: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        method: Option<String>,
        #[arg(long, conflicts_with = "clear_date")]
        date: Option<String>,
        /// Remove the date; the expense drops out of reports
        #[arg(long)]
        clear_date: bool,
    },

    /// Delete an expense
    Delete { id: i64 },
}

/// Shared by categories and payment methods.
#[derive(Subcommand)]
pub(crate) enum LookupCommand {
    /// Create a new entry
    Add { name: String },
    /// List entries by name
    List,
    /// Delete an entry that no expense uses
    Delete {
        /// Name or ID
        key: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum PhraseCommand {
    /// Add a phrase
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    List,
    Delete { id: i64 },
    /// Print one phrase at random
    Random,
}

#[derive(Subcommand)]
pub(crate) enum ReportCommand {
    /// Totals per month
    Monthly,
    /// The day with the lowest total
    MinDay,
    /// Totals, current month against the limit, min-spend day
    Summary {
        /// Month to compare against the limit (default: current)
        #[arg(long)]
        month: Option<String>,
    },
}

#[derive(Subcommand)]
pub(crate) enum LimitCommand {
    Show,
    Set {
        /// Amount, e.g. "500" or "1,200.00"
        amount: String,
    },
}

pub(crate) fn as_cli(command: Command, db: &mut Database) -> Result<()> {
    match command {
        Command::Expense(cmd) => cli_expense(cmd, db),
        Command::Category(cmd) => cli_category(cmd, db),
        Command::Method(cmd) => cli_method(cmd, db),
        Command::Phrase(cmd) => cli_phrase(cmd, db),
        Command::Report(cmd) => cli_report(cmd, db),
        Command::Limit(cmd) => cli_limit(cmd, db),
        Command::Export { path } => cli_export(path, db),
        Command::Import { path } => cli_import(&path, db),
    }
}

fn current_month() -> String {
    chrono::Local::now().format("%Y-%m").to_string()
}

fn print_phrase(db: &Database) {
    if let Ok(Some(phrase)) = db.random_phrase() {
        println!();
        println!("  \u{201c}{}\u{201d}", phrase.text);
    }
}

// ── Expenses ──────────────────────────────────────────────────

fn cli_expense(cmd: ExpenseCommand, db: &mut Database) -> Result<()> {
    match cmd {
        ExpenseCommand::Add {
            amount,
            category,
            method,
            description,
            date,
        } => {
            let amount = parse_amount(&amount)?;
            let category = db.resolve_category(&category)?;
            let method = db.resolve_payment_method(&method)?;
            let date = match date {
                Some(d) => parse_date_arg(&d)?,
                None => chrono::Local::now().naive_local(),
            };
            let (Some(category_id), Some(method_id)) = (category.id, method.id) else {
                anyhow::bail!("Stored category or payment method has no ID");
            };

            let expense = Expense::new(description, amount, category_id, method_id, Some(date));
            let id = db.insert_expense(&expense)?;
            println!(
                "Added expense {id}: {} in {} ({})",
                format_amount(amount),
                category.name,
                method.name
            );
            print_phrase(db);
        }

        ExpenseCommand::List {
            from,
            to,
            month,
            category,
            method,
        } => {
            let filter = ExpenseFilter {
                from: from.map(|d| parse_date_arg(&d)).transpose()?.map(|d| d.date()),
                to: to.map(|d| parse_date_arg(&d)).transpose()?.map(|d| d.date()),
                month: month
                    .map(|m| parse_month(&m, chrono::Local::now().year()))
                    .transpose()?,
                category_id: category
                    .map(|c| db.resolve_category(&c))
                    .transpose()?
                    .and_then(|c| c.id),
                payment_method_id: method
                    .map(|m| db.resolve_payment_method(&m))
                    .transpose()?
                    .and_then(|m| m.id),
            };
            let details = db.get_expense_details(&filter)?;
            print_expenses(&details);
        }

        ExpenseCommand::Show { id } => {
            let detail = db
                .get_expense_by_id(id)?
                .ok_or_else(|| crate::error::AppError::not_found("Expense", id))?;
            let date = match detail.expense.date {
                Some(_) => detail.expense.date_display(),
                None => "(no date)".to_string(),
            };
            println!("ID:          {id}");
            println!("Date:        {date}");
            println!("Amount:      {}", format_amount(detail.expense.amount));
            println!("Description: {}", detail.expense.description);
            println!("Category:    {}", detail.category);
            println!("Method:      {}", detail.payment_method);
        }

        ExpenseCommand::Update {
            id,
            amount,
            description,
            category,
            method,
            date,
            clear_date,
        } => {
            let mut expense = db
                .get_expense_by_id(id)?
                .ok_or_else(|| crate::error::AppError::not_found("Expense", id))?
                .expense;

            if let Some(a) = amount {
                expense.amount = parse_amount(&a)?;
            }
            if let Some(d) = description {
                expense.description = d;
            }
            if let Some(c) = category {
                expense.category_id = db
                    .resolve_category(&c)?
                    .id
                    .context("Stored category has no ID")?;
            }
            if let Some(m) = method {
                expense.payment_method_id = db
                    .resolve_payment_method(&m)?
                    .id
                    .context("Stored payment method has no ID")?;
            }
            if let Some(d) = date {
                expense.date = Some(parse_date_arg(&d)?);
            } else if clear_date {
                expense.date = None;
            }

            db.update_expense(&expense)?;
            println!("Updated expense {id}");
            print_phrase(db);
        }

        ExpenseCommand::Delete { id } => {
            db.delete_expense(id)?;
            println!("Deleted expense {id}");
            print_phrase(db);
        }
    }
    Ok(())
}

fn print_expenses(details: &[ExpenseDetail]) {
    if details.is_empty() {
        println!("No expenses");
        return;
    }

    println!(
        "{:<5} {:<19} {:>12}  {:<18} {:<22} Description",
        "ID", "Date", "Amount", "Category", "Method"
    );
    println!("{}", "─".repeat(100));
    let mut total = rust_decimal::Decimal::ZERO;
    for d in details {
        total += d.expense.amount;
        println!(
            "{:<5} {:<19} {:>12}  {:<18} {:<22} {}",
            d.expense.id.unwrap_or(0),
            d.expense.date_display(),
            format_amount(d.expense.amount),
            truncate(&d.category, 18),
            truncate(&d.payment_method, 22),
            d.expense.description,
        );
    }
    println!("{}", "─".repeat(100));
    println!("{} expense(s), total {}", details.len(), format_amount(total));
}

// ── Categories & payment methods ──────────────────────────────

fn cli_category(cmd: LookupCommand, db: &mut Database) -> Result<()> {
    match cmd {
        LookupCommand::Add { name } => {
            let id = db.insert_category(&name)?;
            println!("Created category {id}: {}", name.trim());
            print_phrase(db);
        }
        LookupCommand::List => {
            let categories = db.get_categories()?;
            print_lookups("Category", &categories);
        }
        LookupCommand::Delete { key } => {
            let category = db.resolve_category(&key)?;
            let id = category.id.context("Stored category has no ID")?;
            db.delete_category(id)?;
            println!("Deleted category: {}", category.name);
            print_phrase(db);
        }
    }
    Ok(())
}

fn cli_method(cmd: LookupCommand, db: &mut Database) -> Result<()> {
    match cmd {
        LookupCommand::Add { name } => {
            let id = db.insert_payment_method(&name)?;
            println!("Created payment method {id}: {}", name.trim());
            print_phrase(db);
        }
        LookupCommand::List => {
            let methods = db.get_payment_methods()?;
            print_lookups("Payment method", &methods);
        }
        LookupCommand::Delete { key } => {
            let method = db.resolve_payment_method(&key)?;
            let id = method.id.context("Stored payment method has no ID")?;
            db.delete_payment_method(id)?;
            println!("Deleted payment method: {}", method.name);
            print_phrase(db);
        }
    }
    Ok(())
}

fn print_lookups<T: Lookup>(label: &str, items: &[T]) {
    if items.is_empty() {
        println!("No entries");
        return;
    }
    println!("{:<4} {label}", "ID");
    println!("{}", "─".repeat(30));
    for item in items {
        println!("{:<4} {}", item.id().unwrap_or(0), item.name());
    }
}

// ── Phrases ───────────────────────────────────────────────────

fn cli_phrase(cmd: PhraseCommand, db: &mut Database) -> Result<()> {
    match cmd {
        PhraseCommand::Add { text } => {
            let id = db.insert_phrase(&text.join(" "))?;
            println!("Added phrase {id}");
        }
        PhraseCommand::List => {
            let phrases = db.get_phrases()?;
            if phrases.is_empty() {
                println!("No phrases");
            }
            for p in &phrases {
                println!("{:<4} {}", p.id.unwrap_or(0), p.text);
            }
        }
        PhraseCommand::Delete { id } => {
            db.delete_phrase(id)?;
            println!("Deleted phrase {id}");
        }
        PhraseCommand::Random => match db.random_phrase()? {
            Some(p) => println!("{}", p.text),
            None => println!("No phrases"),
        },
    }
    Ok(())
}

// ── Reports ───────────────────────────────────────────────────

fn cli_report(cmd: ReportCommand, db: &mut Database) -> Result<()> {
    let expenses = db.get_expenses(&ExpenseFilter::default())?;
    match cmd {
        ReportCommand::Monthly => {
            let totals = report::monthly_totals(&expenses);
            if totals.is_empty() {
                println!("No dated expenses");
                return Ok(());
            }
            for (month, total) in &totals {
                println!("  {month}   {:>14}", format_amount(*total));
            }
        }
        ReportCommand::MinDay => match report::min_spend_day(&expenses) {
            Some(min) => println!("{}  {}", min.day, format_amount(min.total)),
            None => println!("No dated expenses"),
        },
        ReportCommand::Summary { month } => {
            let month = match month {
                Some(m) => parse_month(&m, chrono::Local::now().year())?,
                None => current_month(),
            };
            let summary = report::summarize(&expenses, &month, db.get_spending_limit()?);
            print_summary(&summary);
        }
    }
    Ok(())
}

fn print_summary(summary: &report::Summary) {
    println!("GastoMágico - {}", summary.current_month);
    println!("{}", "─".repeat(40));
    println!("  This month:   {}", format_amount(summary.current_month_total));
    match (&summary.limit, summary.limit_remaining()) {
        (Some(limit), Some(remaining)) => {
            println!("  Limit:        {}", format_amount(limit.amount));
            let note = if limit.is_exceeded_by(summary.current_month_total) {
                " (exceeded)"
            } else {
                ""
            };
            println!("  Remaining:    {}{note}", format_amount(remaining));
        }
        _ => println!("  Limit:        not set"),
    }
    println!("  All time:     {}", format_amount(summary.total));
    if summary.undated > 0 {
        println!("  Undated:      {} expense(s) left out", summary.undated);
    }
    if let Some(min) = &summary.min_day {
        println!("  Lowest day:   {} ({})", min.day, format_amount(min.total));
    }

    if !summary.monthly.is_empty() {
        println!();
        println!("Monthly totals:");
        for (month, total) in &summary.monthly {
            println!("  {month}   {:>14}", format_amount(*total));
        }
    }
}

// ── Spending limit ────────────────────────────────────────────

fn cli_limit(cmd: LimitCommand, db: &mut Database) -> Result<()> {
    match cmd {
        LimitCommand::Show => match db.get_spending_limit()? {
            Some(limit) => println!(
                "Spending limit: {} (updated {})",
                format_amount(limit.amount),
                limit.updated_at
            ),
            None => println!("No spending limit set"),
        },
        LimitCommand::Set { amount } => {
            let amount = parse_amount(&amount)?;
            db.set_spending_limit(amount)?;
            println!("Spending limit set to {}", format_amount(amount));
            print_phrase(db);
        }
    }
    Ok(())
}

// ── Spreadsheets ──────────────────────────────────────────────

fn cli_export(path: Option<PathBuf>, db: &mut Database) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from("gastos.xlsx"));
    if path.as_os_str() == "-" {
        let bytes = spreadsheet::export_to_buffer(db).context("Failed to build workbook")?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&bytes)?;
        stdout.flush()?;
        return Ok(());
    }

    let path = PathBuf::from(shellexpand(&path.to_string_lossy()));
    let count = spreadsheet::export_file(db, &path)
        .with_context(|| format!("Failed to export to {}", path.display()))?;
    if count == 0 {
        println!("No expenses; wrote an empty sheet to {}", path.display());
    } else {
        println!("Exported {count} expenses to {}", path.display());
    }
    Ok(())
}

fn cli_import(path: &std::path::Path, db: &mut Database) -> Result<()> {
    let outcome = if path.as_os_str() == "-" {
        let mut bytes = Vec::new();
        std::io::stdin().lock().read_to_end(&mut bytes)?;
        spreadsheet::import_from_reader(db, Cursor::new(bytes))
            .context("Failed to import workbook from stdin")?
    } else {
        let path = PathBuf::from(shellexpand(&path.to_string_lossy()));
        if !path.exists() {
            anyhow::bail!("File not found: {}", path.display());
        }
        spreadsheet::import_file(db, &path)
            .with_context(|| format!("Failed to import {}", path.display()))?
    };
    println!("Imported {} expenses", outcome.imported);
    if !outcome.skipped.is_empty() {
        println!("Skipped {} row(s):", outcome.skipped.len());
        for s in &outcome.skipped {
            println!("  row {:<5} {}", s.row, s.reason);
        }
    }
    if outcome.imported > 0 {
        print_phrase(db);
    }
    Ok(())
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}
