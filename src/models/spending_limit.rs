use rust_decimal::Decimal;

/// The singleton configuration row. Stored, shown, never enforced.
#[derive(Debug, Clone)]
pub struct SpendingLimit {
    pub id: Option<i64>,
    pub amount: Decimal,
    pub created_at: String,
    pub updated_at: String,
}

impl SpendingLimit {
    /// Amount left under the limit for a given total; negative when exceeded.
    pub fn remaining(&self, spent: Decimal) -> Decimal {
        self.amount - spent
    }

    pub fn is_exceeded_by(&self, spent: Decimal) -> bool {
        spent > self.amount
    }
}
