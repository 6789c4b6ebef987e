//! Integration tests for the DiagramStore API
//!
//! These tests walk a whole editing session through the public API:
//! building a schema, routing its relationships, applying layouts,
//! undoing, and exchanging the document as JSON.

use tabulon::model::{Cardinality, FieldType};
use tabulon::routing::relationship_path;
use tabulon::store::{FieldSpec, RelationshipMeta};
use tabulon::{DiagramStore, LayoutKind, TabulonError};

fn order_schema() -> DiagramStore {
    let mut store = DiagramStore::new();

    let users = store.add_table_with_content(
        40.0,
        40.0,
        "users",
        vec![
            FieldSpec::new("id", FieldType::Integer).primary_key(),
            FieldSpec::new("email", FieldType::Text),
        ],
    );
    let orders = store.add_table_with_content(
        400.0,
        40.0,
        "orders",
        vec![
            FieldSpec::new("id", FieldType::Integer).primary_key(),
            FieldSpec::new("user_id", FieldType::Integer),
            FieldSpec::new("placed_at", FieldType::Timestamp).nullable(),
        ],
    );

    store
        .add_relationship_with_meta(
            &orders.id,
            vec![orders.fields[1].id.clone()],
            &users.id,
            vec![users.fields[0].id.clone()],
            RelationshipMeta {
                name: Some("placed by".to_string()),
                note: None,
                cardinality: Some(Cardinality::ManyToOne),
            },
        )
        .expect("both endpoints exist");

    store
}

#[test]
fn full_session_builds_a_consistent_document() {
    let mut store = order_schema();
    store.add_note(40.0, 300.0, "orders keep a soft reference to users");

    let document = store.document();
    assert_eq!(document.tables.len(), 2);
    assert_eq!(document.relationships.len(), 1);
    assert_eq!(document.notes.len(), 1);

    let relationship = &document.relationships[0];
    assert!(document.table(&relationship.source_table_id).is_some());
    assert!(document.table(&relationship.target_table_id).is_some());
}

#[test]
fn relationship_paths_resolve_for_every_relationship() {
    let store = order_schema();
    let document = store.document();

    for relationship in &document.relationships {
        let source = document.table(&relationship.source_table_id).unwrap();
        let target = document.table(&relationship.target_table_id).unwrap();
        let source_indices: Vec<usize> = relationship
            .source_field_ids
            .iter()
            .filter_map(|id| source.field_index(id))
            .collect();
        let target_indices: Vec<usize> = relationship
            .target_field_ids
            .iter()
            .filter_map(|id| target.field_index(id))
            .collect();

        let path = relationship_path(source, &source_indices, target, &target_indices);
        assert!(path.start().is_finite());
        assert!(path.end().is_finite());
        assert_eq!(path.arrowhead().len(), 3);
    }
}

#[test]
fn layouts_are_interchangeable_and_undoable() {
    let mut store = order_schema();
    let manual = store.document().clone();

    store.apply_layout(LayoutKind::Hierarchical);
    let hierarchical = store.document().clone();
    assert_ne!(hierarchical, manual);

    store.apply_layout(LayoutKind::Force);
    for table in &store.document().tables {
        assert!(table.x.is_finite() && table.y.is_finite());
    }

    // Each layout pass is one undo step.
    assert!(store.undo());
    assert_eq!(store.document(), &hierarchical);
    assert!(store.undo());
    assert_eq!(store.document(), &manual);
}

#[test]
fn invalid_endpoints_are_rejected_without_touching_the_document() {
    let mut store = order_schema();
    let before = store.document().clone();
    let users_id = store.document().tables[0].id.clone();
    let user_pk = store.document().tables[0].fields[0].id.clone();

    let missing_table =
        store.add_relationship(&users_id, &user_pk, "nonexistent", "f1");
    assert!(matches!(missing_table, Err(TabulonError::TableNotFound(_))));

    let orders_id = store.document().tables[1].id.clone();
    let missing_field = store.add_relationship(&users_id, "ghost", &orders_id, "f1");
    assert!(matches!(
        missing_field,
        Err(TabulonError::FieldNotFound { .. })
    ));

    assert_eq!(store.document(), &before);
}

#[test]
fn document_survives_save_and_reload() {
    let mut store = order_schema();
    store.add_note(10.0, 10.0, "reviewed 2024-03");
    let saved = tabulon::document::to_json_string_pretty(store.document())
        .expect("document serializes");

    let reloaded = tabulon::document::from_json_str(&saved).expect("document parses");
    assert_eq!(&reloaded, store.document());

    // A fresh store seeded with the reloaded document keeps allocating
    // unique ids.
    let mut second = DiagramStore::new();
    second.set_document(reloaded);
    let table = second.add_table(0.0, 0.0);
    assert!(second.document().table(&table.id).is_some());
    assert_eq!(second.document().tables.len(), 3);
}

#[test]
fn cascade_deletion_keeps_referential_integrity() {
    let mut store = order_schema();
    let users_id = store.document().tables[0].id.clone();

    store.delete_table(&users_id);

    let document = store.document();
    assert_eq!(document.tables.len(), 1);
    assert!(document.relationships.is_empty());

    // Undo restores both the table and its relationship.
    assert!(store.undo());
    assert_eq!(store.document().tables.len(), 2);
    assert_eq!(store.document().relationships.len(), 1);
}
