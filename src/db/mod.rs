mod schema;

use anyhow::Context;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::*;

/// The store session. One connection, owned for the life of the process and
/// lent to every use case. Multi-statement writes run in a transaction that
/// rolls back when dropped without `commit`.
pub(crate) struct Database {
    conn: Connection,
}

const EXPENSE_COLUMNS: &str = "e.id, e.description, e.amount, e.category_id, e.payment_method_id,
     e.date, e.created_at, e.updated_at, c.name, m.name";

impl Database {
    pub(crate) fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        debug!(path = %path.display(), "database ready");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> AppResult<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            // Fresh database - apply full schema
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            info!(version = schema::CURRENT_VERSION, "created schema");
            return self.seed_defaults();
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
            info!(from = current, to = schema::CURRENT_VERSION, "migrated schema");
        }

        Ok(())
    }

    /// Default rows, written once when the schema is created. Later opens
    /// never touch them again, so deleting a default is permanent.
    fn seed_defaults(&mut self) -> AppResult<()> {
        let now = now_stamp();
        let tx = self.conn.transaction()?;

        for (table, values) in [
            ("categories", schema::DEFAULT_CATEGORIES),
            ("payment_methods", schema::DEFAULT_PAYMENT_METHODS),
        ] {
            for name in values {
                tx.execute(
                    &format!(
                        "INSERT INTO {table} (name, name_key, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?3)"
                    ),
                    params![name, name_key(name), now],
                )?;
            }
            info!(table, rows = values.len(), "seeded defaults");
        }
        for text in schema::DEFAULT_PHRASES {
            tx.execute(
                "INSERT INTO phrases (text, created_at, updated_at) VALUES (?1, ?2, ?2)",
                params![text, now],
            )?;
        }
        info!(table = "phrases", rows = schema::DEFAULT_PHRASES.len(), "seeded defaults");

        tx.commit()?;
        Ok(())
    }

    // ── Categories & payment methods ──────────────────────────

    fn insert_lookup<T: Lookup>(&mut self, name: &str) -> AppResult<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation(format!(
                "{} name cannot be empty",
                T::LABEL
            )));
        }

        let key = name_key(name);
        let tx = self.conn.transaction()?;
        let exists: bool = tx.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE name_key = ?1)",
                T::TABLE
            ),
            params![key],
            |row| row.get(0),
        )?;
        if exists {
            return Err(AppError::duplicate(T::LABEL, name));
        }

        let now = now_stamp();
        tx.execute(
            &format!(
                "INSERT INTO {} (name, name_key, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
                T::TABLE
            ),
            params![name, key, now],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        debug!(table = T::TABLE, id, name, "inserted");
        Ok(id)
    }

    fn get_lookups<T: Lookup>(&self) -> AppResult<Vec<T>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, name, created_at, updated_at FROM {} ORDER BY name_key, id",
            T::TABLE
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(T::from_parts(row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn get_lookup_by_id<T: Lookup>(&self, id: i64) -> AppResult<Option<T>> {
        let result = self.conn.query_row(
            &format!(
                "SELECT id, name, created_at, updated_at FROM {} WHERE id = ?1",
                T::TABLE
            ),
            params![id],
            |row| Ok(T::from_parts(row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        );
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a user-supplied key: a numeric id first, then a name.
    fn resolve_lookup<T: Lookup>(&self, key: &str) -> AppResult<T> {
        let key = key.trim();
        if let Ok(id) = key.parse::<i64>() {
            if let Some(item) = self.get_lookup_by_id::<T>(id)? {
                return Ok(item);
            }
        }
        let result = self.conn.query_row(
            &format!(
                "SELECT id, name, created_at, updated_at FROM {} WHERE name_key = ?1",
                T::TABLE
            ),
            params![name_key(key)],
            |row| Ok(T::from_parts(row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        );
        match result {
            Ok(item) => Ok(item),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(AppError::not_found(T::LABEL, key)),
            Err(e) => Err(e.into()),
        }
    }

    /// Referenced rows are never removed: deleting a category or payment
    /// method that still has expenses fails with `InUse`.
    fn delete_lookup<T: Lookup>(&mut self, id: i64) -> AppResult<()> {
        let tx = self.conn.transaction()?;
        ensure_exists::<T>(&tx, id)?;

        let count: i64 = tx.query_row(
            &format!(
                "SELECT COUNT(*) FROM expenses WHERE {} = ?1",
                T::EXPENSE_COLUMN
            ),
            params![id],
            |row| row.get(0),
        )?;
        if count > 0 {
            return Err(AppError::InUse {
                entity: T::LABEL,
                id,
                count,
            });
        }

        tx.execute(
            &format!("DELETE FROM {} WHERE id = ?1", T::TABLE),
            params![id],
        )?;
        tx.commit()?;
        debug!(table = T::TABLE, id, "deleted");
        Ok(())
    }

    pub(crate) fn insert_category(&mut self, name: &str) -> AppResult<i64> {
        self.insert_lookup::<Category>(name)
    }

    pub(crate) fn get_categories(&self) -> AppResult<Vec<Category>> {
        self.get_lookups()
    }

    pub(crate) fn resolve_category(&self, key: &str) -> AppResult<Category> {
        self.resolve_lookup(key)
    }

    pub(crate) fn delete_category(&mut self, id: i64) -> AppResult<()> {
        self.delete_lookup::<Category>(id)
    }

    pub(crate) fn insert_payment_method(&mut self, name: &str) -> AppResult<i64> {
        self.insert_lookup::<PaymentMethod>(name)
    }

    pub(crate) fn get_payment_methods(&self) -> AppResult<Vec<PaymentMethod>> {
        self.get_lookups()
    }

    pub(crate) fn resolve_payment_method(&self, key: &str) -> AppResult<PaymentMethod> {
        self.resolve_lookup(key)
    }

    pub(crate) fn delete_payment_method(&mut self, id: i64) -> AppResult<()> {
        self.delete_lookup::<PaymentMethod>(id)
    }

    // ── Expenses ──────────────────────────────────────────────

    pub(crate) fn insert_expense(&mut self, expense: &Expense) -> AppResult<i64> {
        let tx = self.conn.transaction()?;
        let id = insert_expense_row(&tx, expense)?;
        tx.commit()?;
        debug!(id, amount = %expense.amount, "inserted expense");
        Ok(id)
    }

    /// Insert many expenses atomically: either all land or none do.
    pub(crate) fn insert_expenses_batch(&mut self, expenses: &[Expense]) -> AppResult<usize> {
        let tx = self.conn.transaction()?;
        for expense in expenses {
            insert_expense_row(&tx, expense)?;
        }
        tx.commit()?;
        info!(count = expenses.len(), "inserted expense batch");
        Ok(expenses.len())
    }

    pub(crate) fn get_expense_details(&self, filter: &ExpenseFilter) -> AppResult<Vec<ExpenseDetail>> {
        let mut sql = format!(
            "SELECT {EXPENSE_COLUMNS}
             FROM expenses e
             JOIN categories c ON e.category_id = c.id
             JOIN payment_methods m ON e.payment_method_id = m.id
             WHERE 1=1"
        );
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(from) = filter.from {
            sql.push_str(&format!(" AND e.date >= ?{}", param_values.len() + 1));
            param_values.push(Box::new(format!("{} 00:00:00", from.format("%Y-%m-%d"))));
        }
        if let Some(to) = filter.to {
            sql.push_str(&format!(" AND e.date <= ?{}", param_values.len() + 1));
            param_values.push(Box::new(format!("{} 23:59:59", to.format("%Y-%m-%d"))));
        }
        if let Some(ref m) = filter.month {
            sql.push_str(&format!(" AND e.date LIKE ?{}", param_values.len() + 1));
            param_values.push(Box::new(format!("{m}%")));
        }
        if let Some(cid) = filter.category_id {
            sql.push_str(&format!(" AND e.category_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(cid));
        }
        if let Some(mid) = filter.payment_method_id {
            sql.push_str(&format!(
                " AND e.payment_method_id = ?{}",
                param_values.len() + 1
            ));
            param_values.push(Box::new(mid));
        }

        // Newest first; undated rows sink to the bottom.
        sql.push_str(" ORDER BY e.date IS NULL, e.date DESC, e.id DESC");

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), |row| {
            Ok(ExpenseDetail {
                expense: expense_from_row(row)?,
                category: row.get(8)?,
                payment_method: row.get(9)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_expenses(&self, filter: &ExpenseFilter) -> AppResult<Vec<Expense>> {
        Ok(self
            .get_expense_details(filter)?
            .into_iter()
            .map(|d| d.expense)
            .collect())
    }

    pub(crate) fn get_expense_by_id(&self, id: i64) -> AppResult<Option<ExpenseDetail>> {
        let result = self.conn.query_row(
            &format!(
                "SELECT {EXPENSE_COLUMNS}
                 FROM expenses e
                 JOIN categories c ON e.category_id = c.id
                 JOIN payment_methods m ON e.payment_method_id = m.id
                 WHERE e.id = ?1"
            ),
            params![id],
            |row| {
                Ok(ExpenseDetail {
                    expense: expense_from_row(row)?,
                    category: row.get(8)?,
                    payment_method: row.get(9)?,
                })
            },
        );
        match result {
            Ok(d) => Ok(Some(d)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn get_expense_count(&self) -> AppResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?)
    }

    /// Replace every editable field of an existing expense.
    pub(crate) fn update_expense(&mut self, expense: &Expense) -> AppResult<()> {
        let id = expense
            .id
            .ok_or_else(|| AppError::Validation("expense has no id".into()))?;

        let tx = self.conn.transaction()?;
        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM expenses WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(AppError::not_found("Expense", id));
        }
        ensure_exists::<Category>(&tx, expense.category_id)?;
        ensure_exists::<PaymentMethod>(&tx, expense.payment_method_id)?;

        tx.execute(
            "UPDATE expenses
             SET description = ?1, amount = ?2, category_id = ?3, payment_method_id = ?4,
                 date = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                expense.description,
                expense.amount.to_string(),
                expense.category_id,
                expense.payment_method_id,
                expense.date.map(format_timestamp),
                now_stamp(),
                id,
            ],
        )?;
        tx.commit()?;
        debug!(id, "updated expense");
        Ok(())
    }

    pub(crate) fn delete_expense(&self, id: i64) -> AppResult<()> {
        let affected = self
            .conn
            .execute("DELETE FROM expenses WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(AppError::not_found("Expense", id));
        }
        debug!(id, "deleted expense");
        Ok(())
    }

    // ── Phrases ───────────────────────────────────────────────

    pub(crate) fn insert_phrase(&self, text: &str) -> AppResult<i64> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("phrase cannot be empty".into()));
        }
        let now = now_stamp();
        self.conn.execute(
            "INSERT INTO phrases (text, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![text, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_phrases(&self) -> AppResult<Vec<Phrase>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, text, created_at, updated_at FROM phrases ORDER BY id")?;
        let rows = stmt.query_map([], phrase_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn delete_phrase(&self, id: i64) -> AppResult<()> {
        let affected = self
            .conn
            .execute("DELETE FROM phrases WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(AppError::not_found("Phrase", id));
        }
        Ok(())
    }

    pub(crate) fn random_phrase(&self) -> AppResult<Option<Phrase>> {
        let result = self.conn.query_row(
            "SELECT id, text, created_at, updated_at FROM phrases ORDER BY RANDOM() LIMIT 1",
            [],
            phrase_from_row,
        );
        match result {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ── Spending limit ────────────────────────────────────────

    pub(crate) fn get_spending_limit(&self) -> AppResult<Option<SpendingLimit>> {
        let result = self.conn.query_row(
            "SELECT id, spending_limit, created_at, updated_at FROM settings ORDER BY id LIMIT 1",
            [],
            |row| {
                let amt_str: String = row.get(1)?;
                Ok(SpendingLimit {
                    id: Some(row.get(0)?),
                    amount: Decimal::from_str(&amt_str).unwrap_or_default(),
                    created_at: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            },
        );
        match result {
            Ok(l) => Ok(Some(l)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Store the limit, creating the settings row on first use.
    pub(crate) fn set_spending_limit(&mut self, amount: Decimal) -> AppResult<()> {
        if amount.is_sign_negative() {
            return Err(AppError::Validation(
                "spending limit cannot be negative".into(),
            ));
        }
        let now = now_stamp();
        let tx = self.conn.transaction()?;
        let existing = tx.query_row("SELECT id FROM settings ORDER BY id LIMIT 1", [], |row| {
            row.get::<_, i64>(0)
        });
        match existing {
            Ok(id) => {
                tx.execute(
                    "UPDATE settings SET spending_limit = ?1, updated_at = ?2 WHERE id = ?3",
                    params![amount.to_string(), now, id],
                )?;
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                tx.execute(
                    "INSERT INTO settings (spending_limit, created_at, updated_at) VALUES (?1, ?2, ?2)",
                    params![amount.to_string(), now],
                )?;
            }
            Err(e) => return Err(e.into()),
        }
        tx.commit()?;
        info!(%amount, "spending limit set");
        Ok(())
    }
}

fn ensure_exists<T: Lookup>(conn: &Connection, id: i64) -> AppResult<()> {
    let exists: bool = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", T::TABLE),
        params![id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(AppError::not_found(T::LABEL, id))
    }
}

fn insert_expense_row(conn: &Connection, expense: &Expense) -> AppResult<i64> {
    ensure_exists::<Category>(conn, expense.category_id)?;
    ensure_exists::<PaymentMethod>(conn, expense.payment_method_id)?;
    conn.execute(
        "INSERT INTO expenses (description, amount, category_id, payment_method_id, date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            expense.description,
            expense.amount.to_string(),
            expense.category_id,
            expense.payment_method_id,
            expense.date.map(format_timestamp),
            expense.created_at,
            expense.updated_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn expense_from_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    let amount_str: String = row.get(2)?;
    let date: Option<String> = row.get(5)?;
    Ok(Expense {
        id: Some(row.get(0)?),
        description: row.get(1)?,
        amount: Decimal::from_str(&amount_str).unwrap_or_default(),
        category_id: row.get(3)?,
        payment_method_id: row.get(4)?,
        date: date.as_deref().and_then(parse_timestamp),
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn phrase_from_row(row: &Row<'_>) -> rusqlite::Result<Phrase> {
    Ok(Phrase {
        id: Some(row.get(0)?),
        text: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

#[cfg(test)]
mod tests;
