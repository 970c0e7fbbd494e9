use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Context;
use chrono::{Datelike, Local};

use super::app::{App, InputMode, PendingAction, Screen};
use super::util::{escape_field, format_amount, shift_month, split_fields};
use crate::db::Database;
use crate::models::*;
use crate::spreadsheet;

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &mut Database) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

const ADD_USAGE: &str = "Usage: :add <amount> | <category> | <method> | [description] | [date]";
const EDIT_USAGE: &str = "Usage: :edit <amount> | <category> | <method> | <description> | <date> (blank keeps)";

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit GastoMágico", cmd_quit, r);
    register_command!("quit", "Quit GastoMágico", cmd_quit, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!("e", "Go to Expenses", cmd_expenses, r);
    register_command!("expenses", "Go to Expenses", cmd_expenses, r);
    register_command!("c", "Go to Categories", cmd_categories, r);
    register_command!("categories", "Go to Categories", cmd_categories, r);
    register_command!("pm", "Go to Payment Methods", cmd_methods, r);
    register_command!("methods", "Go to Payment Methods", cmd_methods, r);
    register_command!("r", "Go to Reports", cmd_reports, r);
    register_command!("reports", "Go to Reports", cmd_reports, r);
    register_command!(
        "month",
        "Show one month (e.g. :month 2024-01); no argument shows all",
        cmd_month,
        r
    );
    register_command!("next-month", "Go to next month", cmd_next_month, r);
    register_command!("prev-month", "Go to previous month", cmd_prev_month, r);
    register_command!(
        "add",
        "Add expense (e.g. :add 12.50 | Salud | Efectivo | Farmacia)",
        cmd_add,
        r
    );
    register_command!(
        "a",
        "Add expense (e.g. :a 12.50 | Salud | Efectivo | Farmacia)",
        cmd_add,
        r
    );
    register_command!(
        "edit",
        "Edit selected expense; no argument pre-fills current values",
        cmd_edit,
        r
    );
    register_command!("delete", "Delete selected row", cmd_delete, r);
    register_command!(
        "category",
        "Create category (e.g. :category Mascotas)",
        cmd_category,
        r
    );
    register_command!(
        "method",
        "Create payment method (e.g. :method PayPal)",
        cmd_method,
        r
    );
    register_command!("phrase", "Add a motivational phrase", cmd_phrase, r);
    register_command!(
        "limit",
        "Show or set the monthly spending limit (e.g. :limit 500)",
        cmd_limit,
        r
    );
    register_command!(
        "export",
        "Export expenses (e.g. :export ~/gastos.xlsx)",
        cmd_export,
        r
    );
    register_command!(
        "import",
        "Import expenses (e.g. :import ~/gastos.xlsx)",
        cmd_import,
        r
    );
    register_command!(
        "search",
        "Filter expenses by text (e.g. :search cena)",
        cmd_search,
        r
    );
    register_command!("s", "Filter expenses by text", cmd_search, r);

    r
});

/// Run a `:` command. Failures end up on the status line.
pub(crate) fn handle_command(input: &str, app: &mut App, db: &mut Database) {
    let trimmed = input.trim();
    let (cmd_name, args) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
    let args = args.trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        if let Err(e) = (cmd.run)(args, app, db) {
            app.set_status(format!("Error: {e:#}"));
        }
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 2) // skip short aliases for suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Reload everything after a write and show a random phrase with the message.
pub(crate) fn after_mutation(
    app: &mut App,
    db: &Database,
    msg: impl Into<String>,
) -> anyhow::Result<()> {
    app.refresh_all(db)?;
    let msg = msg.into();
    let status = match &app.phrase {
        Some(phrase) => format!("{msg}  \u{201c}{phrase}\u{201d}"),
        None => msg,
    };
    app.set_status(status);
    Ok(())
}

/// Ask for confirmation before deleting the row under the cursor.
pub(crate) fn request_delete(app: &mut App) {
    let action = match app.screen {
        Screen::Expenses => app.selected_expense().and_then(|d| {
            d.expense.id.map(|id| PendingAction::DeleteExpense {
                id,
                description: d.expense.description.clone(),
            })
        }),
        Screen::Categories => app.categories.get(app.category_index).and_then(|c| {
            c.id.map(|id| PendingAction::DeleteCategory {
                id,
                name: c.name.clone(),
            })
        }),
        Screen::PaymentMethods => app.methods.get(app.method_index).and_then(|m| {
            m.id.map(|id| PendingAction::DeletePaymentMethod {
                id,
                name: m.name.clone(),
            })
        }),
        Screen::Reports => None,
    };

    let Some(action) = action else {
        app.set_status("Nothing selected to delete");
        return;
    };
    app.confirm_message = match &action {
        PendingAction::DeleteExpense { description, .. } if description.is_empty() => {
            "Delete this expense?".to_string()
        }
        PendingAction::DeleteExpense { description, .. } => format!("Delete '{description}'?"),
        PendingAction::DeleteCategory { name, .. } => format!("Delete category '{name}'?"),
        PendingAction::DeletePaymentMethod { name, .. } => {
            format!("Delete payment method '{name}'?")
        }
    };
    app.pending_action = Some(action);
    app.input_mode = InputMode::Confirm;
}

/// Carry out a confirmed delete.
pub(crate) fn execute_pending(
    action: PendingAction,
    app: &mut App,
    db: &mut Database,
) -> anyhow::Result<()> {
    let msg = match action {
        PendingAction::DeleteExpense { id, .. } => {
            db.delete_expense(id)?;
            format!("Deleted expense {id}")
        }
        PendingAction::DeleteCategory { id, name } => {
            db.delete_category(id)?;
            format!("Deleted category: {name}")
        }
        PendingAction::DeletePaymentMethod { id, name } => {
            db.delete_payment_method(id)?;
            format!("Deleted payment method: {name}")
        }
    };
    after_mutation(app, db, msg)
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_expenses(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Expenses;
    app.refresh_expenses(db)?;
    Ok(())
}

fn cmd_categories(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Categories;
    app.refresh_categories(db)?;
    Ok(())
}

fn cmd_methods(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::PaymentMethods;
    app.refresh_methods(db)?;
    Ok(())
}

fn cmd_reports(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Reports;
    app.refresh_reports(db)?;
    Ok(())
}

fn cmd_month(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.month_filter = None;
        app.refresh_expenses(db)?;
        app.refresh_reports(db)?;
        app.set_status("Showing all months");
        return Ok(());
    }

    let year = app
        .month_filter
        .as_deref()
        .and_then(|m| m.get(..4))
        .and_then(|y| y.parse().ok())
        .unwrap_or_else(|| Local::now().year());
    let month = parse_month(args, year)?;
    app.set_status(format!("Month: {month}"));
    app.month_filter = Some(month);
    app.expense_index = 0;
    app.expense_scroll = 0;
    app.refresh_expenses(db)?;
    app.refresh_reports(db)?;
    Ok(())
}

fn cmd_next_month(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    advance_month(app, db, 1)
}

fn cmd_prev_month(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    advance_month(app, db, -1)
}

pub(crate) fn advance_month(app: &mut App, db: &mut Database, delta: i32) -> anyhow::Result<()> {
    if let Some(m) = shift_month(&app.report_month(), delta) {
        app.set_status(format!("Month: {m}"));
        app.month_filter = Some(m);
        app.expense_index = 0;
        app.expense_scroll = 0;
        app.refresh_expenses(db)?;
        app.refresh_reports(db)?;
    }
    Ok(())
}

fn resolve_ids(db: &Database, category: &str, method: &str) -> anyhow::Result<(i64, i64)> {
    let category = db.resolve_category(category)?;
    let method = db.resolve_payment_method(method)?;
    match (category.id, method.id) {
        (Some(c), Some(m)) => Ok((c, m)),
        _ => anyhow::bail!("Stored category or payment method has no ID"),
    }
}

fn cmd_add(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let fields = split_fields(args);
    if fields.len() < 3 {
        app.set_status(ADD_USAGE);
        return Ok(());
    }

    let amount = parse_amount(&fields[0])?;
    let (category_id, method_id) = resolve_ids(db, &fields[1], &fields[2])?;
    let description = fields.get(3).cloned().unwrap_or_default();
    let date = match fields.get(4).filter(|d| !d.is_empty()) {
        Some(d) => parse_date_arg(d)?,
        None => Local::now().naive_local(),
    };

    let expense = Expense::new(description, amount, category_id, method_id, Some(date));
    let id = db.insert_expense(&expense)?;
    app.screen = Screen::Expenses;
    after_mutation(app, db, format!("Added expense {id}: {}", format_amount(amount)))
}

fn cmd_edit(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if app.screen != Screen::Expenses {
        app.set_status("Navigate to Expenses and select one first");
        return Ok(());
    }
    let Some(selected) = app.selected_expense().cloned() else {
        app.set_status("No expense selected");
        return Ok(());
    };

    let fields = split_fields(args);
    if fields.is_empty() {
        // Pre-fill the command line with the current values
        app.command_input = format!(
            "edit {} | {} | {} | {} | {}",
            selected.expense.amount,
            escape_field(&selected.category),
            escape_field(&selected.payment_method),
            escape_field(&selected.expense.description),
            selected.expense.date_display()
        );
        app.input_mode = InputMode::Command;
        app.set_status(EDIT_USAGE);
        return Ok(());
    }

    let field = |i: usize| fields.get(i).map(String::as_str).filter(|f| !f.is_empty());
    let mut expense = selected.expense;
    if let Some(a) = field(0) {
        expense.amount = parse_amount(a)?;
    }
    // Blank keeps the stored reference; only typed names are resolved
    if let Some(c) = field(1) {
        expense.category_id = db
            .resolve_category(c)?
            .id
            .context("Stored category has no ID")?;
    }
    if let Some(m) = field(2) {
        expense.payment_method_id = db
            .resolve_payment_method(m)?
            .id
            .context("Stored payment method has no ID")?;
    }
    if let Some(d) = field(3) {
        expense.description = d.to_string();
    }
    if let Some(d) = field(4) {
        expense.date = Some(parse_date_arg(d)?);
    }

    db.update_expense(&expense)?;
    let id = expense.id.unwrap_or(0);
    after_mutation(app, db, format!("Updated expense {id}"))
}

fn cmd_delete(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    request_delete(app);
    Ok(())
}

fn cmd_category(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :category <name>");
        return Ok(());
    }
    db.insert_category(args)?;
    app.screen = Screen::Categories;
    after_mutation(app, db, format!("Created category: {args}"))
}

fn cmd_method(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :method <name>");
        return Ok(());
    }
    db.insert_payment_method(args)?;
    app.screen = Screen::PaymentMethods;
    after_mutation(app, db, format!("Created payment method: {args}"))
}

fn cmd_phrase(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :phrase <text>");
        return Ok(());
    }
    db.insert_phrase(args)?;
    app.set_status("Phrase added");
    Ok(())
}

fn cmd_limit(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        let msg = match db.get_spending_limit()? {
            Some(limit) => format!("Spending limit: {}", format_amount(limit.amount)),
            None => "No spending limit set. Use :limit <amount>".to_string(),
        };
        app.set_status(msg);
        return Ok(());
    }

    let amount = parse_amount(args)?;
    db.set_spending_limit(amount)?;
    after_mutation(
        app,
        db,
        format!("Spending limit set to {}", format_amount(amount)),
    )
}

fn cmd_export(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let path = if args.is_empty() {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/gastos.xlsx")
    } else {
        crate::run::shellexpand(args)
    };

    let count = spreadsheet::export_file(db, &PathBuf::from(&path))?;
    app.set_status(format!("Exported {count} expenses to {path}"));
    Ok(())
}

fn cmd_import(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :import <file.xlsx|file.csv>");
        return Ok(());
    }
    let path = PathBuf::from(crate::run::shellexpand(args));
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let outcome = spreadsheet::import_file(db, &path)?;
    let mut msg = format!("Imported {} expenses", outcome.imported);
    if let Some(first) = outcome.skipped.first() {
        msg.push_str(&format!(
            ", skipped {} (row {}: {})",
            outcome.skipped.len(),
            first.row,
            first.reason
        ));
    }
    app.screen = Screen::Expenses;
    after_mutation(app, db, msg)
}

fn cmd_search(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.search_input = args.to_string();
    app.screen = Screen::Expenses;
    app.expense_index = 0;
    app.expense_scroll = 0;
    app.refresh_expenses(db)?;

    if args.is_empty() {
        app.set_status("Search cleared");
    } else {
        app.set_status(format!("Searching: {args}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use rust_decimal_macros::dec;

    fn setup() -> (App, Database) {
        let db = Database::open_in_memory().unwrap();
        let mut app = App::new();
        app.refresh_all(&db).unwrap();
        (app, db)
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("limit", "limit"), 0);
        assert_eq!(levenshtein("limt", "limit"), 1);
        assert_eq!(levenshtein("", "add"), 3);
    }

    #[test]
    fn test_unknown_command_suggests() {
        let (mut app, mut db) = setup();
        handle_command("exprot", &mut app, &mut db);
        assert!(app.status_message.contains(":export"));
    }

    #[test]
    fn test_add_and_edit_expense() {
        let (mut app, mut db) = setup();
        handle_command(
            "add 12.50 | salud | Efectivo | Farmacia | 2024-03-01",
            &mut app,
            &mut db,
        );
        assert_eq!(app.expenses.len(), 1);
        assert_eq!(app.expenses[0].category, "Salud");
        assert!(app.status_message.starts_with("Added expense"));

        handle_command("edit 15 |  | Tarjeta de Débito | ", &mut app, &mut db);
        let edited = &app.expenses[0];
        assert_eq!(edited.expense.amount, dec!(15));
        assert_eq!(edited.category, "Salud");
        assert_eq!(edited.payment_method, "Tarjeta de Débito");
        assert_eq!(edited.expense.description, "Farmacia");
    }

    #[test]
    fn test_edit_without_args_prefills() {
        let (mut app, mut db) = setup();
        handle_command("add 3 | Transporte | Efectivo | Bus | 2024-01-02", &mut app, &mut db);
        handle_command("edit", &mut app, &mut db);
        assert_eq!(app.input_mode, InputMode::Command);
        assert_eq!(
            app.command_input,
            "edit 3 | Transporte | Efectivo | Bus | 2024-01-02 00:00:00"
        );
    }

    #[test]
    fn test_edit_prefill_round_trips_pipe_in_description() {
        let (mut app, mut db) = setup();
        handle_command(
            r"add 8 | Salud | Efectivo | Farmacia \| turno noche | 2024-05-01",
            &mut app,
            &mut db,
        );
        assert_eq!(app.expenses[0].expense.description, "Farmacia | turno noche");

        handle_command("edit", &mut app, &mut db);
        let prefilled = app.command_input.clone();
        handle_command(&prefilled, &mut app, &mut db);
        let edited = &app.expenses[0];
        assert_eq!(edited.expense.description, "Farmacia | turno noche");
        assert_eq!(edited.payment_method, "Efectivo");
        assert_eq!(edited.expense.date_display(), "2024-05-01 00:00:00");
    }

    #[test]
    fn test_edit_keeps_category_named_like_an_id() {
        let (mut app, mut db) = setup();
        // "1" is also the id of the first seeded category
        let numeric = db.insert_category("1").unwrap();
        handle_command("add 4 | 1 | Efectivo | Rifa | 2024-06-01", &mut app, &mut db);
        db.update_expense(&{
            let mut e = app.expenses[0].expense.clone();
            e.category_id = numeric;
            e
        })
        .unwrap();
        app.refresh_expenses(&db).unwrap();
        assert_eq!(app.expenses[0].category, "1");

        handle_command("edit 5 |  |  |  | ", &mut app, &mut db);
        let edited = &app.expenses[0];
        assert_eq!(edited.expense.amount, dec!(5));
        assert_eq!(edited.expense.category_id, numeric);
        assert_eq!(edited.category, "1");
    }

    #[test]
    fn test_add_errors_go_to_status() {
        let (mut app, mut db) = setup();
        handle_command("add abc | Salud | Efectivo", &mut app, &mut db);
        assert!(app.status_message.starts_with("Error:"));
        handle_command("add 5 | Nada | Efectivo", &mut app, &mut db);
        assert!(app.status_message.contains("not found"));
        assert_eq!(db.get_expense_count().unwrap(), 0);
    }

    #[test]
    fn test_delete_in_use_category_is_reported() {
        let (mut app, mut db) = setup();
        handle_command("add 5 | Educación | Efectivo | Libro", &mut app, &mut db);
        app.screen = Screen::Categories;
        app.category_index = app
            .categories
            .iter()
            .position(|c| c.name == "Educación")
            .unwrap();

        request_delete(&mut app);
        assert_eq!(app.input_mode, InputMode::Confirm);
        let action = app.pending_action.take().unwrap();
        let err = execute_pending(action, &mut app, &mut db).unwrap_err();
        assert!(err.to_string().contains("cannot be deleted"));
    }

    #[test]
    fn test_month_and_limit() {
        let (mut app, mut db) = setup();
        handle_command("month 2024-02", &mut app, &mut db);
        assert_eq!(app.month_filter.as_deref(), Some("2024-02"));
        handle_command("next-month", &mut app, &mut db);
        assert_eq!(app.month_filter.as_deref(), Some("2024-03"));
        handle_command("month", &mut app, &mut db);
        assert!(app.month_filter.is_none());

        handle_command("limit 400", &mut app, &mut db);
        let summary = app.summary.as_ref().unwrap();
        assert_eq!(summary.limit.as_ref().unwrap().amount, dec!(400));
    }

    #[test]
    fn test_category_and_method_commands() {
        let (mut app, mut db) = setup();
        handle_command("category Mascotas", &mut app, &mut db);
        assert!(app.categories.iter().any(|c| c.name == "Mascotas"));
        assert_eq!(app.screen, Screen::Categories);

        handle_command("method PayPal", &mut app, &mut db);
        assert!(app.methods.iter().any(|m| m.name == "PayPal"));

        handle_command("method paypal", &mut app, &mut db);
        assert!(app.status_message.contains("already exists"));
    }
}
