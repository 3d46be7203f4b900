/// Errors returned by directory implementations.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// A uniqueness rule was violated (duplicate tenant name, email or uuid).
    /// Carries the violated constraint name.
    #[error("Duplicate value violates unique constraint: {0}")]
    Duplicate(String),

    /// A stored row could not be decoded into a model.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for DirectoryError {
    /// PostgreSQL unique violations (SQLSTATE `23505`) on constraints named
    /// `uq_*` become [`DirectoryError::Duplicate`]; everything else is passed
    /// through.
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return DirectoryError::Duplicate(constraint.to_string());
                }
            }
        }
        if let sqlx::Error::ColumnDecode { index, source } = &err {
            return DirectoryError::CorruptRow(format!("column {index}: {source}"));
        }
        DirectoryError::Database(err)
    }
}
