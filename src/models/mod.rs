mod category;
mod expense;
mod payment_method;
mod phrase;
mod spending_limit;

pub use category::Category;
pub use expense::{
    format_timestamp, parse_amount, parse_date_arg, parse_month, parse_timestamp, Expense,
    ExpenseDetail, ExpenseFilter, TIMESTAMP_FORMAT,
};
pub use payment_method::PaymentMethod;
pub use phrase::Phrase;
pub use spending_limit::SpendingLimit;

/// A named lookup entity (category, payment method): one table, unique name.
pub trait Lookup: Sized {
    const TABLE: &'static str;
    /// Column of `expenses` that references this table.
    const EXPENSE_COLUMN: &'static str;
    const LABEL: &'static str;

    fn from_parts(id: i64, name: String, created_at: String, updated_at: String) -> Self;
    fn id(&self) -> Option<i64>;
    fn name(&self) -> &str;
}

/// Key that lookup names are unique under: trimmed, Unicode lowercase.
/// The store keeps it in a `name_key` column so SQL and in-memory matching agree.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Find a lookup entry by name (case-insensitive) in a slice.
pub fn find_by_name<'a, T: Lookup>(items: &'a [T], name: &str) -> Option<&'a T> {
    let key = name_key(name);
    items.iter().find(|item| name_key(item.name()) == key)
}

pub(crate) fn now_stamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests;
