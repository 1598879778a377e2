//! Database access for users and meals.
//!
//! Queries are plain `sqlx` calls wrapped in `db.query` spans so every round-trip
//! shows up in traces with its statement.

pub mod meals;
pub mod users;

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
