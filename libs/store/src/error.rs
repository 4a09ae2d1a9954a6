use sqlx::Error;

// SQLITE_BUSY, SQLITE_LOCKED and their extended codes.
const TRANSIENT_SQLITE_CODES: [&str; 5] = ["5", "6", "261", "262", "517"];

/// A concurrent writer already inserted a row with the same key.
pub fn is_unique_violation(err: &Error) -> bool {
    match err {
        Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

pub fn is_foreign_key_violation(err: &Error) -> bool {
    match err {
        Error::Database(db) => db.is_foreign_key_violation(),
        _ => false,
    }
}

/// Failures that may succeed on retry: pool exhaustion, I/O, busy or locked database.
pub fn is_transient(err: &Error) -> bool {
    match err {
        Error::PoolTimedOut | Error::PoolClosed | Error::Io(_) | Error::WorkerCrashed => true,
        Error::Database(db) => db
            .code()
            .is_some_and(|code| TRANSIENT_SQLITE_CODES.contains(&code.as_ref())),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeouts_are_transient() {
        assert!(is_transient(&Error::PoolTimedOut));
        assert!(!is_transient(&Error::RowNotFound));
        assert!(!is_unique_violation(&Error::RowNotFound));
    }
}
