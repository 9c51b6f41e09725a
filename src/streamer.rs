//! Lazy execution of query plans into coerced rows.

use futures::future;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use sync_core::{
    coerce, CursorPlan, CursorValue, PlannedColumn, QueryPlan, RawRow, Row, SourceConnection,
    SourceEncoding,
};
use tracing::trace;

use crate::error::SyncError;

/// Lazy stream of coerced rows for one plan.
///
/// The stream borrows the connection for its whole lifetime, so it has to be
/// consumed or dropped before the connection is used again.
pub type RecordStream<'a> = BoxStream<'a, Result<Row, SyncError>>;

/// Executes plans and coerces every value with the declared source encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordStreamer {
    encoding: SourceEncoding,
}

impl RecordStreamer {
    pub fn new(encoding: SourceEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> SourceEncoding {
        self.encoding
    }

    /// Stream the rows of `plan`.
    ///
    /// Nothing is sent to the store until the stream is first polled. For
    /// incremental plans the cursor predicate is checked again on each
    /// coerced row, so rows with a null or special cursor, or one not after
    /// the lower bound, never come out regardless of what the store returns.
    pub fn stream<'a, C>(&self, connection: &'a mut C, plan: &'a QueryPlan) -> RecordStream<'a>
    where
        C: SourceConnection + ?Sized,
    {
        let converter = RowConverter::new(plan, self.encoding);
        let stream_name = plan.stream.clone();

        stream::once(connection.execute(plan))
            .try_flatten()
            .map_err(move |e| SyncError::from_store(&stream_name, e))
            .try_filter_map(move |raw| future::ready(converter.convert(raw)))
            .boxed()
    }
}

/// Turns raw rows of one plan into output rows.
#[derive(Debug, Clone)]
pub struct RowConverter {
    stream: String,
    columns: Vec<PlannedColumn>,
    cursor: Option<CursorPlan>,
    encoding: SourceEncoding,
}

impl RowConverter {
    pub fn new(plan: &QueryPlan, encoding: SourceEncoding) -> Self {
        Self {
            stream: plan.stream.clone(),
            columns: plan.columns.clone(),
            cursor: plan.cursor.clone(),
            encoding,
        }
    }

    /// Coerce a raw row; `Ok(None)` when the row falls outside the cursor range.
    pub fn convert(&self, raw: RawRow) -> Result<Option<Row>, SyncError> {
        if raw.len() != self.columns.len() {
            return Err(SyncError::Read {
                stream: self.stream.clone(),
                message: format!(
                    "store returned {} values for {} columns",
                    raw.len(),
                    self.columns.len()
                ),
            });
        }

        let mut row = Row::with_capacity(self.columns.len());
        for (column, value) in self.columns.iter().zip(raw) {
            let value = coerce(&column.kind, value, self.encoding)
                .map_err(|e| SyncError::from_conversion(&self.stream, &column.name, e))?;
            row.push(column.name.clone(), value);
        }

        if let Some(cursor) = &self.cursor {
            let value = row.get(&cursor.field).and_then(CursorValue::from_value);
            if !cursor.admits(value.as_ref()) {
                trace!(
                    "Skipping row of '{}' with cursor {:?}",
                    self.stream,
                    value.map(|v| v.to_string())
                );
                return Ok(None);
            }
        }

        Ok(Some(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sync_core::{NumericText, PrimitiveKind, RawValue, TableRef};

    fn plan(lower_bound: Option<CursorValue>) -> QueryPlan {
        QueryPlan {
            stream: "public.id_and_name".to_string(),
            table: TableRef::new(Some("public".to_string()), "id_and_name"),
            columns: vec![
                PlannedColumn {
                    name: "id".to_string(),
                    kind: PrimitiveKind::Decimal,
                },
                PlannedColumn {
                    name: "name".to_string(),
                    kind: PrimitiveKind::Text,
                },
            ],
            cursor: Some(CursorPlan {
                field: "id".to_string(),
                kind: PrimitiveKind::Decimal,
                lower_bound,
            }),
        }
    }

    fn numeric(s: &str) -> RawValue {
        RawValue::Numeric(NumericText::parse(s))
    }

    #[test]
    fn test_convert_keeps_column_order() {
        let converter = RowConverter::new(&plan(None), SourceEncoding::Utf8);
        let row = converter
            .convert(vec![numeric("1.0000000000"), RawValue::text("goku")])
            .unwrap()
            .unwrap();
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"id":1.0,"name":"goku"}"#
        );
    }

    #[test]
    fn test_convert_rechecks_cursor() {
        let converter =
            RowConverter::new(&plan(Some(CursorValue::from(1))), SourceEncoding::Utf8);
        assert!(converter
            .convert(vec![numeric("1"), RawValue::text("goku")])
            .unwrap()
            .is_none());
        assert!(converter
            .convert(vec![numeric("NaN"), RawValue::text("piccolo")])
            .unwrap()
            .is_none());
        let row = converter
            .convert(vec![numeric("2.0"), RawValue::text("vegeta")])
            .unwrap()
            .unwrap();
        assert_eq!(row.get("name"), Some(&json!("vegeta")));
    }

    #[test]
    fn test_convert_admits_cursor_beyond_28_digits() {
        let bound: serde_json::Number = "1.00000000000000000000000000001".parse().unwrap();
        let converter = RowConverter::new(
            &plan(Some(CursorValue::Number(bound))),
            SourceEncoding::Utf8,
        );
        assert!(converter
            .convert(vec![
                numeric("1.00000000000000000000000000001"),
                RawValue::text("goku")
            ])
            .unwrap()
            .is_none());
        let row = converter
            .convert(vec![
                numeric("1.00000000000000000000000000002"),
                RawValue::text("vegeta"),
            ])
            .unwrap()
            .unwrap();
        assert_eq!(row.get("name"), Some(&json!("vegeta")));
    }

    #[test]
    fn test_convert_invalid_text_is_read_error() {
        let converter = RowConverter::new(&plan(None), SourceEncoding::Utf8);
        let err = converter
            .convert(vec![numeric("3"), RawValue::Text(vec![0xff, 0xfe])])
            .unwrap_err();
        assert!(matches!(err, SyncError::Read { .. }));
        assert!(err.to_string().contains("column 'name'"));
    }

    #[test]
    fn test_convert_arity_mismatch() {
        let converter = RowConverter::new(&plan(None), SourceEncoding::Utf8);
        assert!(converter.convert(vec![numeric("3")]).is_err());
    }
}
