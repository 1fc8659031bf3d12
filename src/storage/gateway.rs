//! Storage gateway - the three statement shapes the rest of the crate uses
//!
//! A plain [`Connection`] and an open [`Transaction`] implement the gateway
//! identically, so the mapper and fetch code never know which one is
//! active. Nothing here retries; driver errors propagate as they are,
//! classified by `From<rusqlite::Error> for Error`.

use crate::Result;
use rusqlite::{Connection, Params, Row, Transaction};

/// Parameterized statement execution over SQLite
pub trait Gateway {
    /// Execute a statement and return the number of affected rows
    fn exec<P: Params>(&self, sql: &str, params: P) -> Result<usize>;

    /// Run a query that must yield a row.
    ///
    /// An empty result fails with `Error::NotFound`.
    fn query_one<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<T>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>;

    /// Run a query and read every row before returning.
    ///
    /// Rows keep the order storage yields them in. A row that fails to
    /// decode fails the whole call.
    fn query_all<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>;
}

impl Gateway for Connection {
    fn exec<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        let mut stmt = self.prepare_cached(sql)?;
        Ok(stmt.execute(params)?)
    }

    fn query_one<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<T>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.prepare_cached(sql)?;
        Ok(stmt.query_row(params, f)?)
    }

    fn query_all<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.prepare_cached(sql)?;
        let rows = stmt
            .query_map(params, f)?
            .collect::<rusqlite::Result<Vec<T>>>()?;
        Ok(rows)
    }
}

impl Gateway for Transaction<'_> {
    fn exec<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        Gateway::exec(&**self, sql, params)
    }

    fn query_one<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<T>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        Gateway::query_one(&**self, sql, params, f)
    }

    fn query_all<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        Gateway::query_all(&**self, sql, params, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT NOT NULL UNIQUE)")
            .unwrap();
        conn
    }

    #[test]
    fn test_exec_reports_affected_rows() {
        let conn = scratch();
        assert_eq!(conn.exec("INSERT INTO t (v) VALUES (?1)", ["a"]).unwrap(), 1);
        assert_eq!(conn.exec("UPDATE t SET v = 'b' WHERE v = ?1", ["zzz"]).unwrap(), 0);
    }

    #[test]
    fn test_query_one_without_rows_is_not_found() {
        let conn = scratch();
        let err = conn
            .query_one("SELECT id FROM t WHERE v = ?1", ["missing"], |row| row.get::<_, i64>(0))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unique_violation_is_constraint() {
        let conn = scratch();
        conn.exec("INSERT INTO t (v) VALUES (?1)", ["dup"]).unwrap();
        let err = conn.exec("INSERT INTO t (v) VALUES (?1)", ["dup"]).unwrap_err();
        assert!(err.is_constraint());
    }

    #[test]
    fn test_transaction_behaves_like_connection() {
        let mut conn = scratch();
        let tx = conn.transaction().unwrap();
        tx.exec("INSERT INTO t (v) VALUES (?1)", ["x"]).unwrap();
        tx.exec("INSERT INTO t (v) VALUES (?1)", ["y"]).unwrap();

        let values: Vec<String> = tx
            .query_all("SELECT v FROM t ORDER BY v", [], |row| row.get(0))
            .unwrap();
        assert_eq!(values, vec!["x".to_string(), "y".to_string()]);
        tx.rollback().unwrap();

        let count: i64 = conn
            .query_one("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_query_all_fails_on_bad_row() {
        let conn = scratch();
        conn.exec("INSERT INTO t (v) VALUES (?1)", ["not a number"]).unwrap();
        let err = conn
            .query_all("SELECT v FROM t", [], |row| row.get::<_, i64>(0))
            .unwrap_err();
        assert!(matches!(err, crate::Error::Storage(_)));
    }
}
