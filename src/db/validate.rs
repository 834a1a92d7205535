//! Pre-write validation pass.
//!
//! Runs inside the write's transaction, before the statement itself. The
//! engine's own constraints still back every check.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::StoreError;
use crate::schema::{self, ForeignKey, OnDelete, UniqueIndex};

/// One column value of a unique key.
#[derive(Debug, Clone, Copy)]
pub enum KeyPart<'a> {
    Int(i64),
    Text(&'a str),
}

/// Fails with `ConstraintViolation` if another row already holds `key` in
/// `index`. `exclude_id` skips the row being updated.
pub async fn ensure_unique(
    conn: &mut SqliteConnection,
    index: &UniqueIndex,
    key: &[KeyPart<'_>],
    exclude_id: Option<i64>,
) -> Result<(), StoreError> {
    debug_assert_eq!(index.columns.len(), key.len());

    let mut sql = format!("SELECT COUNT(*) FROM {} WHERE ", index.table);
    let predicate: Vec<String> = index.columns.iter().map(|c| format!("{c} = ?")).collect();
    sql.push_str(&predicate.join(" AND "));
    if exclude_id.is_some() {
        sql.push_str(" AND id <> ?");
    }

    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for part in key {
        query = match *part {
            KeyPart::Int(v) => query.bind(v),
            KeyPart::Text(v) => query.bind(v),
        };
    }
    if let Some(id) = exclude_id {
        query = query.bind(id);
    }

    let existing = query.fetch_one(&mut *conn).await?;
    if existing > 0 {
        debug!("duplicate key rejected by {}", index.name);
        return Err(StoreError::ConstraintViolation {
            index: index.name.to_string(),
        });
    }

    Ok(())
}

/// Same as [`ensure_unique`] for a nullable single-column key. Absent values
/// never collide.
pub async fn ensure_unique_optional(
    conn: &mut SqliteConnection,
    index: &UniqueIndex,
    value: Option<&str>,
    exclude_id: Option<i64>,
) -> Result<(), StoreError> {
    match value {
        Some(v) => ensure_unique(conn, index, &[KeyPart::Text(v)], exclude_id).await,
        None => Ok(()),
    }
}

/// Fails with `ReferentialIntegrity` if the parent row named by `fk` does
/// not exist.
pub async fn ensure_parent_exists(
    conn: &mut SqliteConnection,
    fk: &ForeignKey,
    parent_id: i64,
) -> Result<(), StoreError> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {} = ?",
        fk.parent_table, fk.parent_column
    );
    let found = sqlx::query_scalar::<_, i64>(&sql)
        .bind(parent_id)
        .fetch_one(&mut *conn)
        .await?;

    if found == 0 {
        return Err(StoreError::ReferentialIntegrity(format!(
            "{}.{} = {} references a missing {} row",
            fk.table, fk.column, parent_id, fk.parent_table
        )));
    }

    Ok(())
}

/// Fails with `ReferentialIntegrity` if any restrict-mode dependent still
/// points at the parent row.
pub async fn ensure_no_restricting_dependents(
    conn: &mut SqliteConnection,
    parent_table: &str,
    parent_id: i64,
) -> Result<(), StoreError> {
    for fk in schema::dependents_of(parent_table).filter(|fk| fk.on_delete == OnDelete::Restrict) {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?", fk.table, fk.column);
        let dependents = sqlx::query_scalar::<_, i64>(&sql)
            .bind(parent_id)
            .fetch_one(&mut *conn)
            .await?;

        if dependents > 0 {
            return Err(StoreError::ReferentialIntegrity(format!(
                "{} row {} is still referenced by {} {} row(s)",
                parent_table, parent_id, dependents, fk.table
            )));
        }
    }

    Ok(())
}

/// Deletes cascade-mode dependents of the parent row. Returns the number of
/// rows removed.
pub async fn apply_cascades(
    conn: &mut SqliteConnection,
    parent_table: &str,
    parent_id: i64,
) -> Result<u64, StoreError> {
    let mut removed = 0;
    for fk in schema::dependents_of(parent_table).filter(|fk| fk.on_delete == OnDelete::Cascade) {
        let sql = format!("DELETE FROM {} WHERE {} = ?", fk.table, fk.column);
        removed += sqlx::query(&sql)
            .bind(parent_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
    }

    Ok(removed)
}
