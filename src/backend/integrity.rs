//! Which database errors count as integrity violations, resolved once per backend from the driver.

use crate::error::CrudError;

/// Database driver behind a SQL backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbDriver {
    Postgres,
    Sqlite,
    MySql,
    /// Driver could not be determined: every database error is treated as a conflict.
    Unknown,
}

/// SQLite primary result code for constraint failures; extended codes keep it in the low byte.
const SQLITE_CONSTRAINT: i64 = 19;

/// MySQL native codes for duplicate key and foreign key failures.
const MYSQL_INTEGRITY_CODES: &[&str] = &["1062", "1451", "1452"];

impl DbDriver {
    /// Resolve from a connection URL scheme.
    pub fn from_url(url: &str) -> Self {
        let scheme = url.split(':').next().unwrap_or("").to_ascii_lowercase();
        match scheme.as_str() {
            "postgres" | "postgresql" => DbDriver::Postgres,
            "sqlite" => DbDriver::Sqlite,
            "mysql" | "mariadb" => DbDriver::MySql,
            _ => DbDriver::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DbDriver::Postgres => "postgres",
            DbDriver::Sqlite => "sqlite",
            DbDriver::MySql => "mysql",
            DbDriver::Unknown => "unknown",
        }
    }

    /// Whether a database error code (SQLSTATE or native) is an integrity violation for this driver.
    pub fn is_integrity_violation(&self, code: Option<&str>) -> bool {
        match self {
            DbDriver::Unknown => true,
            DbDriver::Postgres => code.map(|c| c.starts_with("23")).unwrap_or(false),
            DbDriver::MySql => code
                .map(|c| c == "23000" || MYSQL_INTEGRITY_CODES.contains(&c))
                .unwrap_or(false),
            DbDriver::Sqlite => code
                .and_then(|c| c.parse::<i64>().ok())
                .map(|n| n & 0xff == SQLITE_CONSTRAINT)
                .unwrap_or(false),
        }
    }

    /// Map a sqlx failure: integrity violations become `Conflict`, everything else stays a database error.
    pub fn classify_sqlx(&self, err: sqlx::Error, detail: &str) -> CrudError {
        let violation = match &err {
            sqlx::Error::Database(db) => self.is_integrity_violation(db.code().as_deref()),
            _ => *self == DbDriver::Unknown,
        };
        if violation {
            tracing::warn!(driver = self.as_str(), error = %err, "integrity violation");
            CrudError::Conflict(detail.to_string())
        } else {
            CrudError::Db(err)
        }
    }

    /// Map a rusqlite failure the same way, using the extended result code.
    pub fn classify_rusqlite(&self, err: rusqlite::Error, detail: &str) -> CrudError {
        let violation = match &err {
            rusqlite::Error::SqliteFailure(e, _) => {
                self.is_integrity_violation(Some(e.extended_code.to_string().as_str()))
            }
            _ => *self == DbDriver::Unknown,
        };
        if violation {
            tracing::warn!(driver = self.as_str(), error = %err, "integrity violation");
            CrudError::Conflict(detail.to_string())
        } else {
            CrudError::Sqlite(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_from_url() {
        assert_eq!(DbDriver::from_url("postgres://localhost/app"), DbDriver::Postgres);
        assert_eq!(DbDriver::from_url("postgresql://u@h/db"), DbDriver::Postgres);
        assert_eq!(DbDriver::from_url("sqlite::memory:"), DbDriver::Sqlite);
        assert_eq!(DbDriver::from_url("mysql://root@db/app"), DbDriver::MySql);
        assert_eq!(DbDriver::from_url("redis://cache"), DbDriver::Unknown);
    }

    #[test]
    fn postgres_class_23_only() {
        let d = DbDriver::Postgres;
        assert!(d.is_integrity_violation(Some("23505")));
        assert!(d.is_integrity_violation(Some("23503")));
        assert!(!d.is_integrity_violation(Some("42P01")));
        assert!(!d.is_integrity_violation(None));
    }

    #[test]
    fn sqlite_extended_constraint_codes() {
        let d = DbDriver::Sqlite;
        assert!(d.is_integrity_violation(Some("2067")));
        assert!(d.is_integrity_violation(Some("1555")));
        assert!(d.is_integrity_violation(Some("19")));
        assert!(!d.is_integrity_violation(Some("1")));
    }

    #[test]
    fn mysql_codes() {
        let d = DbDriver::MySql;
        assert!(d.is_integrity_violation(Some("23000")));
        assert!(d.is_integrity_violation(Some("1062")));
        assert!(!d.is_integrity_violation(Some("42000")));
    }

    #[test]
    fn unknown_driver_catches_everything() {
        assert!(DbDriver::Unknown.is_integrity_violation(None));
        let err = DbDriver::Unknown.classify_sqlx(sqlx::Error::RowNotFound, "Key already exists");
        assert!(matches!(err, CrudError::Conflict(_)));
    }

    #[test]
    fn known_driver_keeps_non_database_errors() {
        let err = DbDriver::Postgres.classify_sqlx(sqlx::Error::PoolTimedOut, "Key already exists");
        assert!(matches!(err, CrudError::Db(_)));
    }
}
