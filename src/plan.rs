//! Query planning for configured streams.

use sync_core::{
    Catalog, ConfiguredStream, CursorPlan, CursorValue, Field, PlannedColumn, PrimitiveKind,
    QueryPlan, State, Stream, SyncMode,
};
use tracing::debug;

use crate::error::SyncError;

/// Build the read plan for one configured stream.
///
/// Full refresh selects every field with no filter and no ordering.
/// Incremental requires an orderable cursor field and resumes strictly
/// after the cursor recorded in `state` for that same field.
pub fn plan(
    catalog: &Catalog,
    configured: &ConfiguredStream,
    state: &State,
) -> Result<QueryPlan, SyncError> {
    let mode = configured.sync_mode;
    let stream = catalog.stream(&configured.stream).ok_or_else(|| {
        SyncError::invalid_sync_mode(&configured.stream, mode, "stream is not in the catalog")
    })?;

    if !stream.supports(mode) {
        return Err(SyncError::invalid_sync_mode(
            &stream.name,
            mode,
            "mode is not supported by the stream",
        ));
    }

    let columns = stream
        .fields
        .iter()
        .map(|field| -> Result<PlannedColumn, SyncError> {
            Ok(PlannedColumn {
                name: field.name.clone(),
                kind: field_kind(stream, field, mode)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let cursor = match mode {
        SyncMode::FullRefresh => None,
        SyncMode::Incremental => {
            let field = cursor_field(stream, configured)?;
            let kind = field_kind(stream, field, mode)?;
            let lower_bound = match usable_cursor(state, &stream.name, &field.name, &kind) {
                Ok(bound) => bound.cloned(),
                Err(reason) => {
                    debug!("{reason}");
                    None
                }
            };
            Some(CursorPlan {
                field: field.name.clone(),
                kind,
                lower_bound,
            })
        }
    };

    Ok(QueryPlan {
        stream: stream.name.clone(),
        table: stream.table_ref(),
        columns,
        cursor,
    })
}

/// Why the stored state for `configured` will be ignored, if it will.
///
/// An entry recorded for another cursor field, or holding a cursor of the
/// wrong family for the field, is not used and the stream restarts from
/// the beginning.
pub fn ignored_state_reason(
    catalog: &Catalog,
    configured: &ConfiguredStream,
    state: &State,
) -> Option<String> {
    if configured.sync_mode != SyncMode::Incremental {
        return None;
    }
    let stream = catalog.stream(&configured.stream)?;
    let field = cursor_field(stream, configured).ok()?;
    let kind = field.kind.as_ref()?;
    usable_cursor(state, &stream.name, &field.name, kind).err()
}

fn cursor_field<'a>(
    stream: &'a Stream,
    configured: &ConfiguredStream,
) -> Result<&'a Field, SyncError> {
    let mode = configured.sync_mode;
    let name = configured.cursor_field.as_deref().ok_or_else(|| {
        SyncError::invalid_sync_mode(&stream.name, mode, "incremental mode requires a cursor_field")
    })?;
    let field = stream.field(name).ok_or_else(|| {
        SyncError::invalid_sync_mode(
            &stream.name,
            mode,
            format!("cursor field '{name}' is not a field of the stream"),
        )
    })?;
    if !field.is_orderable() {
        return Err(SyncError::invalid_sync_mode(
            &stream.name,
            mode,
            format!(
                "cursor field '{name}' of type {} is not orderable",
                field.field_type.as_str()
            ),
        ));
    }
    Ok(field)
}

fn field_kind(stream: &Stream, field: &Field, mode: SyncMode) -> Result<PrimitiveKind, SyncError> {
    field.kind.clone().ok_or_else(|| {
        SyncError::invalid_sync_mode(
            &stream.name,
            mode,
            format!("field '{}' has no resolved type; rediscover the catalog", field.name),
        )
    })
}

fn usable_cursor<'a>(
    state: &'a State,
    stream: &str,
    cursor_field: &str,
    kind: &PrimitiveKind,
) -> Result<Option<&'a CursorValue>, String> {
    let Some(entry) = state.get(stream) else {
        return Ok(None);
    };
    if entry.cursor_field != cursor_field {
        return Err(format!(
            "Ignoring state of stream '{stream}': recorded for cursor field '{}', configured '{cursor_field}'",
            entry.cursor_field
        ));
    }
    let family_matches = match entry.cursor {
        CursorValue::Number(_) => kind.is_numeric(),
        CursorValue::String(_) => kind.is_ordered_text(),
    };
    if !family_matches {
        return Err(format!(
            "Ignoring state of stream '{stream}': cursor {} does not fit field '{cursor_field}'",
            entry.cursor
        ));
    }
    Ok(Some(&entry.cursor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_core::TableRef;

    fn catalog() -> Catalog {
        let table = TableRef::new(Some("public".to_string()), "id_and_name");
        let fields = vec![
            Field::from_kind("id", PrimitiveKind::Decimal, true).unwrap(),
            Field::from_kind("name", PrimitiveKind::Text, true).unwrap(),
            Field::from_kind("tags", PrimitiveKind::Array, true).unwrap(),
        ];
        let blobs = TableRef::new(Some("public".to_string()), "blobs");
        let blob_fields = vec![Field::from_kind("data", PrimitiveKind::Binary, true).unwrap()];
        Catalog::new(vec![
            Stream::new(&table, fields),
            Stream::new(&blobs, blob_fields),
        ])
    }

    #[test]
    fn test_full_refresh_plan() {
        let plan = plan(
            &catalog(),
            &ConfiguredStream::full_refresh("public.id_and_name"),
            &State::new(),
        )
        .unwrap();
        assert_eq!(plan.sync_mode(), SyncMode::FullRefresh);
        assert_eq!(
            plan.column_names().collect::<Vec<_>>(),
            vec!["id", "name", "tags"]
        );
        assert_eq!(plan.table.name, "id_and_name");
        assert!(plan.cursor.is_none());
    }

    #[test]
    fn test_incremental_plan_uses_state() {
        let mut state = State::new();
        state.advance("public.id_and_name", "id", CursorValue::from(1));

        let plan = plan(
            &catalog(),
            &ConfiguredStream::incremental("public.id_and_name", "id"),
            &state,
        )
        .unwrap();
        let cursor = plan.cursor.unwrap();
        assert_eq!(cursor.field, "id");
        assert_eq!(cursor.kind, PrimitiveKind::Decimal);
        assert_eq!(cursor.lower_bound, Some(CursorValue::from(1)));
    }

    #[test]
    fn test_state_for_other_field_is_ignored() {
        let mut state = State::new();
        state.advance("public.id_and_name", "name", CursorValue::from("goku"));
        let configured = ConfiguredStream::incremental("public.id_and_name", "id");

        let plan = plan(&catalog(), &configured, &state).unwrap();
        assert_eq!(plan.cursor.unwrap().lower_bound, None);
        assert!(ignored_state_reason(&catalog(), &configured, &state)
            .unwrap()
            .contains("cursor field 'name'"));
    }

    #[test]
    fn test_state_of_wrong_family_is_ignored() {
        let mut state = State::new();
        state.advance("public.id_and_name", "id", CursorValue::from("abc"));
        let configured = ConfiguredStream::incremental("public.id_and_name", "id");

        let plan = plan(&catalog(), &configured, &state).unwrap();
        assert_eq!(plan.cursor.unwrap().lower_bound, None);
        assert!(ignored_state_reason(&catalog(), &configured, &state).is_some());
    }

    #[test]
    fn test_invalid_configurations() {
        let catalog = catalog();
        let state = State::new();

        let cases = [
            ConfiguredStream::full_refresh("public.missing"),
            ConfiguredStream::incremental("public.blobs", "data"),
            ConfiguredStream::incremental("public.id_and_name", "tags"),
            ConfiguredStream::incremental("public.id_and_name", "nope"),
            ConfiguredStream {
                stream: "public.id_and_name".to_string(),
                sync_mode: SyncMode::Incremental,
                cursor_field: None,
            },
        ];
        for configured in cases {
            let err = plan(&catalog, &configured, &state).unwrap_err();
            assert!(
                matches!(err, SyncError::InvalidSyncMode { .. }),
                "{configured:?} gave {err}"
            );
        }
    }
}
