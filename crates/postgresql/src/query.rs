//! SQL rendering of query plans.

use pg_escape::quote_identifier;
use sync_core::{CursorPlan, PlannedColumn, PrimitiveKind, QueryPlan, TableRef};

/// A SELECT statement and its optional cursor parameter (bound as text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedQuery {
    pub sql: String,
    pub bind: Option<String>,
}

fn select_item(column: &PlannedColumn) -> String {
    let ident = quote_identifier(&column.name);
    match column.kind {
        PrimitiveKind::Array => format!("to_json({ident}) AS {ident}"),
        PrimitiveKind::TextCast => format!("{ident}::text AS {ident}"),
        _ => ident.to_string(),
    }
}

fn table_name(table: &TableRef) -> String {
    match &table.namespace {
        Some(ns) => format!("{}.{}", quote_identifier(ns), quote_identifier(&table.name)),
        None => quote_identifier(&table.name).to_string(),
    }
}

/// Expression the cursor is compared and ordered on.
fn cursor_expr(cursor: &CursorPlan) -> String {
    let ident = quote_identifier(&cursor.field);
    match cursor.kind {
        // Byte order, matching the engine's string comparison
        PrimitiveKind::Text => format!("{ident}::text COLLATE \"C\""),
        _ => ident.to_string(),
    }
}

/// Cast applied to the text-bound lower bound.
fn bound_cast(kind: &PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Integer | PrimitiveKind::Decimal => "::text::numeric",
        PrimitiveKind::Float => "::text::float8",
        PrimitiveKind::Date => "::text::date",
        PrimitiveKind::Time => "::text::time",
        PrimitiveKind::Timestamp => "::text::timestamp",
        PrimitiveKind::TimestampTz => "::text::timestamptz",
        _ => "::text",
    }
}

/// Render a plan as a single SELECT.
///
/// Full refresh selects every planned column with no filter and no
/// ordering. Incremental excludes null and special numeric cursors,
/// applies the strict lower bound when one is known, and orders by the
/// cursor ascending.
pub fn render_query(plan: &QueryPlan) -> RenderedQuery {
    let col_list = plan
        .columns
        .iter()
        .map(select_item)
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!("SELECT {col_list} FROM {}", table_name(&plan.table));

    let Some(cursor) = plan.cursor.as_ref() else {
        return RenderedQuery { sql, bind: None };
    };

    let ident = quote_identifier(&cursor.field);
    let expr = cursor_expr(cursor);
    let mut predicates = vec![format!("{ident} IS NOT NULL")];
    if cursor.kind.has_special_values() {
        predicates.push(format!(
            "{ident}::text NOT IN ('NaN', 'Infinity', '-Infinity')"
        ));
    }

    let bind = cursor.lower_bound.as_ref().map(|bound| {
        predicates.push(format!("{expr} > $1{}", bound_cast(&cursor.kind)));
        bound.as_bind_text()
    });

    sql.push_str(" WHERE ");
    sql.push_str(&predicates.join(" AND "));
    sql.push_str(&format!(" ORDER BY {expr}"));

    RenderedQuery { sql, bind }
}
