use super::Lookup;

#[derive(Debug, Clone)]
pub struct Category {
    pub id: Option<i64>,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Lookup for Category {
    const TABLE: &'static str = "categories";
    const EXPENSE_COLUMN: &'static str = "category_id";
    const LABEL: &'static str = "Category";

    fn from_parts(id: i64, name: String, created_at: String, updated_at: String) -> Self {
        Self {
            id: Some(id),
            name,
            created_at,
            updated_at,
        }
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
