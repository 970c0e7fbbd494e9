#[derive(Debug, Clone)]
pub struct Phrase {
    pub id: Option<i64>,
    pub text: String,
    pub created_at: String,
    pub updated_at: String,
}

impl std::fmt::Display for Phrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}
