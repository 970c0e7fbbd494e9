use anyhow::Result;
use chrono::Local;

use crate::db::Database;
use crate::models::*;
use crate::report::{self, Summary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Expenses,
    Categories,
    PaymentMethods,
    Reports,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[
            Self::Expenses,
            Self::Categories,
            Self::PaymentMethods,
            Self::Reports,
        ]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expenses => write!(f, "Expenses"),
            Self::Categories => write!(f, "Categories"),
            Self::PaymentMethods => write!(f, "Payment Methods"),
            Self::Reports => write!(f, "Reports"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Search,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Search => write!(f, "SEARCH"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingAction {
    DeleteExpense { id: i64, description: String },
    DeleteCategory { id: i64, name: String },
    DeletePaymentMethod { id: i64, name: String },
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) search_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,
    /// `None` shows every month.
    pub(crate) month_filter: Option<String>,
    pub(crate) phrase: Option<String>,

    // Expenses
    pub(crate) expenses: Vec<ExpenseDetail>,
    pub(crate) expense_index: usize,
    pub(crate) expense_scroll: usize,
    pub(crate) expense_count: i64,

    // Categories & payment methods
    pub(crate) categories: Vec<Category>,
    pub(crate) category_index: usize,
    pub(crate) methods: Vec<PaymentMethod>,
    pub(crate) method_index: usize,

    // Reports
    pub(crate) summary: Option<Summary>,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new() -> Self {
        Self {
            running: true,
            screen: Screen::Expenses,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            search_input: String::new(),
            status_message: String::new(),
            show_help: false,
            month_filter: None,
            phrase: None,

            expenses: Vec::new(),
            expense_index: 0,
            expense_scroll: 0,
            expense_count: 0,

            categories: Vec::new(),
            category_index: 0,
            methods: Vec::new(),
            method_index: 0,

            summary: None,

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
        }
    }

    /// The month the reports compare against the limit.
    pub(crate) fn report_month(&self) -> String {
        self.month_filter
            .clone()
            .unwrap_or_else(|| Local::now().format("%Y-%m").to_string())
    }

    pub(crate) fn refresh_expenses(&mut self, db: &Database) -> Result<()> {
        let filter = ExpenseFilter {
            month: self.month_filter.clone(),
            ..Default::default()
        };
        let mut expenses = db.get_expense_details(&filter)?;

        if !self.search_input.is_empty() {
            let needle = self.search_input.to_lowercase();
            expenses.retain(|d| {
                d.expense.description.to_lowercase().contains(&needle)
                    || d.category.to_lowercase().contains(&needle)
                    || d.payment_method.to_lowercase().contains(&needle)
            });
        }

        self.expenses = expenses;
        self.expense_count = db.get_expense_count()?;
        clamp(&mut self.expense_index, self.expenses.len());
        Ok(())
    }

    pub(crate) fn refresh_categories(&mut self, db: &Database) -> Result<()> {
        self.categories = db.get_categories()?;
        clamp(&mut self.category_index, self.categories.len());
        Ok(())
    }

    pub(crate) fn refresh_methods(&mut self, db: &Database) -> Result<()> {
        self.methods = db.get_payment_methods()?;
        clamp(&mut self.method_index, self.methods.len());
        Ok(())
    }

    pub(crate) fn refresh_reports(&mut self, db: &Database) -> Result<()> {
        let expenses = db.get_expenses(&ExpenseFilter::default())?;
        let limit = db.get_spending_limit()?;
        self.summary = Some(report::summarize(&expenses, &self.report_month(), limit));
        Ok(())
    }

    pub(crate) fn refresh_phrase(&mut self, db: &Database) -> Result<()> {
        self.phrase = db.random_phrase()?.map(|p| p.text);
        Ok(())
    }

    pub(crate) fn refresh_all(&mut self, db: &Database) -> Result<()> {
        self.refresh_expenses(db)?;
        self.refresh_categories(db)?;
        self.refresh_methods(db)?;
        self.refresh_reports(db)?;
        self.refresh_phrase(db)?;
        Ok(())
    }

    pub(crate) fn selected_expense(&self) -> Option<&ExpenseDetail> {
        self.expenses.get(self.expense_index)
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }
}

fn clamp(index: &mut usize, len: usize) {
    if *index >= len {
        *index = len.saturating_sub(1);
    }
}
