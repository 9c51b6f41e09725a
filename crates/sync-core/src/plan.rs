//! Store-independent description of a read.

use crate::cursor::CursorValue;
use crate::schema::TableRef;
use crate::types::{PrimitiveKind, SyncMode};

/// A column to select, with the kind it was mapped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedColumn {
    pub name: String,
    pub kind: PrimitiveKind,
}

/// Incremental part of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPlan {
    pub field: String,
    pub kind: PrimitiveKind,
    /// Rows must have a cursor strictly greater than this; `None` reads from the beginning
    pub lower_bound: Option<CursorValue>,
}

impl CursorPlan {
    /// Whether a row with this (coerced) cursor belongs to the read.
    ///
    /// Null cursors, which include NaN and infinities, never qualify.
    pub fn admits(&self, cursor: Option<&CursorValue>) -> bool {
        match (cursor, &self.lower_bound) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(value), Some(bound)) => value.is_after(bound),
        }
    }
}

/// What to read for one stream.
///
/// Full refresh: all columns, no filter, no ordering. Incremental: all
/// columns where the cursor is after the lower bound, ascending by cursor,
/// skipping rows whose cursor is null or a special numeric value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub stream: String,
    pub table: TableRef,
    pub columns: Vec<PlannedColumn>,
    pub cursor: Option<CursorPlan>,
}

impl QueryPlan {
    pub fn sync_mode(&self) -> SyncMode {
        if self.cursor.is_some() {
            SyncMode::Incremental
        } else {
            SyncMode::FullRefresh
        }
    }

    /// Position of the cursor column in `columns`.
    pub fn cursor_index(&self) -> Option<usize> {
        let cursor = self.cursor.as_ref()?;
        self.columns.iter().position(|c| c.name == cursor.field)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(lower_bound: Option<CursorValue>) -> QueryPlan {
        QueryPlan {
            stream: "public.t".to_string(),
            table: TableRef::new(Some("public".to_string()), "t"),
            columns: vec![
                PlannedColumn {
                    name: "name".to_string(),
                    kind: PrimitiveKind::Text,
                },
                PlannedColumn {
                    name: "id".to_string(),
                    kind: PrimitiveKind::Integer,
                },
            ],
            cursor: Some(CursorPlan {
                field: "id".to_string(),
                kind: PrimitiveKind::Integer,
                lower_bound,
            }),
        }
    }

    #[test]
    fn test_cursor_index() {
        assert_eq!(plan(None).cursor_index(), Some(1));
        assert_eq!(plan(None).sync_mode(), SyncMode::Incremental);
    }

    #[test]
    fn test_admits_strictly_greater() {
        let p = plan(Some(CursorValue::from(2)));
        let cursor = p.cursor.as_ref().unwrap();
        assert!(!cursor.admits(Some(&CursorValue::from(2))));
        assert!(cursor.admits(Some(&CursorValue::from(3))));
        assert!(!cursor.admits(None));
    }

    #[test]
    fn test_admits_everything_without_bound() {
        let p = plan(None);
        let cursor = p.cursor.as_ref().unwrap();
        assert!(cursor.admits(Some(&CursorValue::from(-100))));
        assert!(!cursor.admits(None));
    }
}
