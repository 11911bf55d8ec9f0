//! Classification of `sqlx` errors into [`PraxisError`].

use crate::PraxisError;

/// Logs `e` and maps it to the error taxonomy.
///
/// Pool exhaustion, a closed pool and I/O failures are transient and may be
/// retried; everything else is reported as is.
pub(crate) fn db_error(operation: &'static str, e: sqlx::Error) -> PraxisError {
    match &e {
        sqlx::Error::RowNotFound => PraxisError::NotFound,
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::WorkerCrashed => {
            log::error!(
                target: "praxis",
                "msg=\"store unavailable\", operation=\"{operation}\", error=\"{e}\""
            );
            PraxisError::StoreUnavailable(e.to_string())
        }
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            log::warn!(
                target: "praxis",
                "msg=\"unique constraint violated\", operation=\"{operation}\", error=\"{e}\""
            );
            PraxisError::Validation(format!("duplicate record: {}", db.message()))
        }
        _ => {
            log::error!(
                target: "praxis",
                "msg=\"database error\", operation=\"{operation}\", error=\"{e}\""
            );
            PraxisError::DatabaseError(e.to_string())
        }
    }
}

/// Maps a stored enum/JSON value that no longer parses.
pub(crate) fn corrupt_row(operation: &'static str, e: PraxisError) -> PraxisError {
    log::error!(
        target: "praxis",
        "msg=\"stored value did not parse\", operation=\"{operation}\", error=\"{e}\""
    );
    PraxisError::DatabaseError(e.to_string())
}
