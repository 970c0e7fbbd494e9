pub(crate) mod expenses;
pub(crate) mod lookups;
pub(crate) mod reports;
