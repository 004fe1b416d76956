use chrono::{DateTime, Utc};
use sqlx::MySqlConnection;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    U64(Option<u64>),
    F64(Option<f64>),
    DateTime(Option<DateTime<Utc>>),
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
///
/// Column names come from code, never from request bodies. Returns `None`
/// when there is nothing to set.
pub fn build_update_sql(
    table: &str,
    assignments: Vec<(&'static str, SqlValue)>,
    id_column: &str,
    id_value: u64,
) -> Option<SqlUpdate> {
    if assignments.is_empty() {
        return None;
    }

    let set_clause = assignments
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values: Vec<SqlValue> = assignments.into_iter().map(|(_, v)| v).collect();
    // WHERE id = ?
    values.push(SqlValue::U64(Some(id_value)));

    Some(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(
    conn: &mut MySqlConnection,
    update: SqlUpdate,
) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::Text(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
        };
    }

    let result = query.execute(conn).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_set_clause_in_assignment_order() {
        let update = build_update_sql(
            "employees",
            vec![
                ("ename", SqlValue::Text(Some("changed".into()))),
                ("comm", SqlValue::F64(None)),
            ],
            "empno",
            7,
        )
        .unwrap();

        assert_eq!(
            update.sql,
            "UPDATE employees SET ename = ?, comm = ? WHERE empno = ?"
        );
        assert_eq!(update.values.len(), 3);
        assert_eq!(update.values[2], SqlValue::U64(Some(7)));
    }

    #[test]
    fn nothing_to_set_yields_no_statement() {
        assert!(build_update_sql("employees", Vec::new(), "empno", 1).is_none());
    }
}
