//! INSERT statement construction

use loghose_plan::CompiledLogRoute;
use loghose_protocol::{LogRecord, LogValue};
use loghose_store::{SqlValue, Statement};

#[cfg(test)]
#[path = "insert_test.rs"]
mod tests;

/// Build one parameterized INSERT per record
///
/// Columns follow the route's schema-declared order; record fields the
/// schema does not name are ignored, and schema columns the record does
/// not carry bind as NULL.
pub fn build_insert_statements(
    route: &CompiledLogRoute,
    batch: &[LogRecord],
) -> Vec<Statement> {
    let columns = route.schema.columns();

    let column_list: Vec<&str> = columns.iter().map(|c| c.name).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        route.table_name,
        column_list.join(", "),
        placeholders.join(", ")
    );

    batch
        .iter()
        .map(|record| {
            let params = columns
                .iter()
                .map(|col| bind_value(record.get(col.name)))
                .collect();
            Statement::new(sql.clone(), params)
        })
        .collect()
}

fn bind_value(value: &LogValue) -> SqlValue {
    match value {
        LogValue::Text(s) => SqlValue::Text(s.clone()),
        LogValue::Integer(n) => SqlValue::Integer(*n),
        LogValue::Boolean(b) => SqlValue::Integer(i64::from(*b)),
        LogValue::Null => SqlValue::Null,
    }
}
