//! Conversions from external infrastructure errors into domain errors.

use careslot_domain::CareslotError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CareslotError);

impl From<InfraError> for CareslotError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CareslotError> for InfraError {
    fn from(value: CareslotError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCareslotError {
    fn into_careslot(self) -> CareslotError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → CareslotError */
/* -------------------------------------------------------------------------- */

impl IntoCareslotError for SqlError {
    fn into_careslot(self) -> CareslotError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        CareslotError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        CareslotError::Database("database is locked".into())
                    }
                    // UNIQUE violation: the ledger's one-BOOKED-row-per-slot
                    // invariant rejected a duplicate insert
                    (ErrorCode::ConstraintViolation, 2067) => {
                        CareslotError::Conflict("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        CareslotError::Database("foreign key constraint violation".into())
                    }
                    _ => CareslotError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => CareslotError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                CareslotError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                CareslotError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => CareslotError::Database("invalid UTF-8 returned from sqlite".into()),
            RE::InvalidParameterName(parameter_name) => {
                CareslotError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => {
                CareslotError::Database(format!("invalid database path: {}", path.to_string_lossy()))
            }
            RE::InvalidQuery => CareslotError::Database("invalid SQL query".into()),
            other => CareslotError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_careslot())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → CareslotError */
/* -------------------------------------------------------------------------- */

impl IntoCareslotError for r2d2::Error {
    fn into_careslot(self) -> CareslotError {
        CareslotError::Database(format!("connection pool error: {self}"))
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(value.into_careslot())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CareslotError */
/* -------------------------------------------------------------------------- */

impl IntoCareslotError for HttpError {
    fn into_careslot(self) -> CareslotError {
        if self.is_timeout() {
            CareslotError::Upstream("request timed out".into())
        } else if self.is_connect() {
            CareslotError::Upstream(format!("connection failed: {self}"))
        } else if self.is_decode() {
            CareslotError::Upstream(format!("failed to decode upstream response: {self}"))
        } else {
            CareslotError::Upstream(self.to_string())
        }
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_careslot())
    }
}
