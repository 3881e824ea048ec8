//! Server error codes the driver only exposes as raw integers.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure};

/// MongoDB's error code for a unique index violation.
pub const DUPLICATE_KEY: i32 = 11000;

/// Did this write fail because it violated a unique index?
pub fn is_duplicate_key_error<T>(result: Result<T, &DbError>) -> bool {
    if let Err(err) = result {
        if let ErrorKind::Write(WriteFailure::WriteError(ref e)) = *err.kind {
            return e.code == DUPLICATE_KEY;
        }
    }
    false
}
