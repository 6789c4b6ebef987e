//! The diagram store: single source of truth for the document.
//!
//! [`DiagramStore`] owns the one mutable [`Diagram`] and is the only
//! component permitted to mutate it. Every structural mutation snapshots
//! the prior document onto a bounded undo stack, clears the redo stack,
//! and notifies listeners synchronously once the document is consistent.
//! Continuous positional updates (table/note drags, viewport changes)
//! bypass the history so one undo step corresponds to one discrete user
//! intent; they set the dirty flag instead.
//!
//! Failure semantics: mutations that target a missing id silently no-op.
//! Creation-dependent operations ([`DiagramStore::add_field`] and the
//! relationship constructors) return a typed error so bulk import paths
//! can abort. No operation ever leaves the document violating the
//! relationship-referential invariant.

use log::{debug, info};

use tabulon_core::model::{
    Diagram, EntityId, Field, FieldType, Note, Relationship, Table, Viewport,
};

use crate::config::AppConfig;
use crate::error::TabulonError;
use crate::layout::{EngineBuilder, LayoutKind};

pub use meta::{FieldSpec, RelationshipMeta};

mod meta {
    use tabulon_core::model::{Cardinality, EntityId, FieldType};

    /// Caller-supplied description of a field, used when creating tables
    /// and reconciling edited field lists.
    ///
    /// An absent `id` marks the field as new; a present one either matches
    /// an existing field (updated in place, preserving relationship
    /// references) or is adopted verbatim for a new field.
    #[derive(Debug, Clone, Default)]
    pub struct FieldSpec {
        pub id: Option<EntityId>,
        pub name: String,
        pub ty: FieldType,
        pub nullable: bool,
        pub primary_key: bool,
    }

    impl FieldSpec {
        /// Creates a spec for a new field with the given name and type.
        pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
            Self {
                name: name.into(),
                ty,
                ..Self::default()
            }
        }

        /// Pins the spec to an existing field id.
        pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
            self.id = Some(id.into());
            self
        }

        /// Marks the field nullable.
        pub fn nullable(mut self) -> Self {
            self.nullable = true;
            self
        }

        /// Marks the field as part of the primary key.
        pub fn primary_key(mut self) -> Self {
            self.primary_key = true;
            self
        }
    }

    /// Optional metadata attached to a relationship.
    #[derive(Debug, Clone, Default)]
    pub struct RelationshipMeta {
        pub name: Option<String>,
        pub note: Option<String>,
        pub cardinality: Option<Cardinality>,
    }
}

/// Change listener invoked after every document-altering mutation.
///
/// Listeners must not assume any particular part of the document changed;
/// they receive the whole current document and re-read what they need.
pub type Listener = Box<dyn FnMut(&Diagram)>;

// Allocates fresh entity ids: a short prefix per entity kind plus a
// counter shared across kinds, re-seeded past existing ids on document load.
struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    fn new() -> Self {
        Self { next: 0 }
    }

    fn allocate(&mut self, prefix: &str) -> EntityId {
        self.next += 1;
        format!("{prefix}{}", self.next)
    }

    fn seed_from(&mut self, diagram: &Diagram) {
        let mut bump = |id: &str| {
            let digits: &str = id.trim_start_matches(|c: char| !c.is_ascii_digit());
            if let Ok(number) = digits.parse::<u64>() {
                self.next = self.next.max(number);
            }
        };
        for table in &diagram.tables {
            bump(&table.id);
            for field in &table.fields {
                bump(&field.id);
            }
        }
        for relationship in &diagram.relationships {
            bump(&relationship.id);
        }
        for note in &diagram.notes {
            bump(&note.id);
        }
    }
}

/// Owns the diagram document and exposes every mutation operation.
///
/// The store is an explicit owned instance; inject it into whatever owns
/// the UI lifecycle. There is no ambient global state.
///
/// # Examples
///
/// ```
/// use tabulon::store::DiagramStore;
///
/// let mut store = DiagramStore::new();
/// let orders = store.add_table(10.0, 20.0);
/// assert_eq!(orders.fields.len(), 1);
/// assert!(store.undo());
/// assert!(store.document().tables.is_empty());
/// ```
pub struct DiagramStore {
    document: Diagram,
    undo_stack: Vec<Diagram>,
    redo_stack: Vec<Diagram>,
    history_limit: usize,
    dirty: bool,
    listeners: Vec<Listener>,
    ids: IdAllocator,
    engines: EngineBuilder,
}

impl DiagramStore {
    /// Creates a store holding an empty document, with default configuration.
    pub fn new() -> Self {
        Self::with_config(&AppConfig::default())
    }

    /// Creates a store configured from an [`AppConfig`].
    pub fn with_config(config: &AppConfig) -> Self {
        Self {
            document: Diagram::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            history_limit: config.history().limit(),
            dirty: false,
            listeners: Vec::new(),
            ids: IdAllocator::new(),
            engines: EngineBuilder::from_config(config.layout()),
        }
    }

    /// The current document. Callers must treat it as read-only and must
    /// not retain references across mutations; undo/redo replace the
    /// document wholesale.
    pub fn document(&self) -> &Diagram {
        &self.document
    }

    /// Registers a change listener. Listeners fire synchronously, in
    /// registration order, after every document-altering mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&Diagram) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Whether unsaved structural or positional changes exist since the
    /// last [`DiagramStore::clear_dirty`], independent of history depth.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the document as saved.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    fn snapshot(&mut self) {
        if self.undo_stack.len() >= self.history_limit {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(self.document.clone());
        self.redo_stack.clear();
        self.dirty = true;
    }

    fn notify(&mut self) {
        let document = &self.document;
        for listener in self.listeners.iter_mut() {
            listener(document);
        }
    }

    // ------------------------------------------------------------------
    // Document
    // ------------------------------------------------------------------

    /// Replaces the whole document (import/open path). The incoming
    /// document is normalized: field types lower-cased, legacy singular
    /// relationships promoted, dangling relationships dropped.
    pub fn set_document(&mut self, mut document: Diagram) {
        self.snapshot();
        document.normalize();
        self.ids.seed_from(&document);
        info!(
            tables = document.tables.len(),
            relationships = document.relationships.len();
            "Document replaced"
        );
        self.document = document;
        self.notify();
    }

    // ------------------------------------------------------------------
    // Tables
    // ------------------------------------------------------------------

    /// Creates a table at the given point with one default integer `id`
    /// field, and returns it.
    pub fn add_table(&mut self, x: f32, y: f32) -> Table {
        self.snapshot();
        let table = Table {
            id: self.ids.allocate("t"),
            name: format!("table_{}", self.document.tables.len() + 1),
            x,
            y,
            fields: vec![Field {
                id: self.ids.allocate("f"),
                name: "id".to_string(),
                ty: FieldType::Integer,
                nullable: false,
                primary_key: true,
            }],
        };
        debug!(table_id = table.id.as_str(); "Table added");
        self.document.tables.push(table.clone());
        self.notify();
        table
    }

    /// Creates a fully specified table (bulk import path) and returns it.
    pub fn add_table_with_content(
        &mut self,
        x: f32,
        y: f32,
        name: &str,
        fields: Vec<FieldSpec>,
    ) -> Table {
        self.snapshot();
        let fields = fields
            .into_iter()
            .map(|spec| self.field_from_spec(spec))
            .collect();
        let table = Table {
            id: self.ids.allocate("t"),
            name: name.to_string(),
            x,
            y,
            fields,
        };
        self.document.tables.push(table.clone());
        self.notify();
        table
    }

    fn field_from_spec(&mut self, spec: FieldSpec) -> Field {
        Field {
            id: spec.id.unwrap_or_else(|| self.ids.allocate("f")),
            name: spec.name,
            ty: FieldType::parse(spec.ty.as_str()),
            nullable: spec.nullable,
            primary_key: spec.primary_key,
        }
    }

    /// Reconciles an edited name and field list against the existing table
    /// by field id: matching ids are updated in place (preserving
    /// relationship references), unmatched specs become new fields, and
    /// fields absent from the new list are removed together with every
    /// relationship that referenced them.
    pub fn replace_table_content(&mut self, table_id: &str, name: &str, fields: Vec<FieldSpec>) {
        if self.document.table(table_id).is_none() {
            return;
        }
        self.snapshot();

        let reconciled: Vec<Field> = fields
            .into_iter()
            .map(|spec| self.field_from_spec(spec))
            .collect();

        let table = self
            .document
            .table_mut(table_id)
            .expect("table existence checked above");
        let removed: Vec<EntityId> = table
            .fields
            .iter()
            .filter(|field| !reconciled.iter().any(|new| new.id == field.id))
            .map(|field| field.id.clone())
            .collect();

        table.name = name.to_string();
        table.fields = reconciled;

        if !removed.is_empty() {
            debug!(table_id = table_id, removed = removed.len(); "Fields removed during reconcile");
            self.document.relationships.retain(|relationship| {
                !removed.iter().any(|id| relationship.references_field(id))
            });
        }
        self.notify();
    }

    /// Removes a table and every relationship touching it.
    pub fn delete_table(&mut self, table_id: &str) {
        if self.document.table(table_id).is_none() {
            return;
        }
        self.snapshot();
        self.document.tables.retain(|table| table.id != table_id);
        self.document
            .relationships
            .retain(|relationship| !relationship.touches_table(table_id));
        self.notify();
    }

    /// Moves a table during a drag. Does not push undo history; sets the
    /// dirty flag.
    pub fn update_table_position(&mut self, table_id: &str, x: f32, y: f32) {
        let Some(table) = self.document.table_mut(table_id) else {
            return;
        };
        table.x = x;
        table.y = y;
        self.dirty = true;
        self.notify();
    }

    // ------------------------------------------------------------------
    // Fields
    // ------------------------------------------------------------------

    /// Appends a field to a table and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`TabulonError::TableNotFound`] when the table does not
    /// exist, so callers such as bulk import can react rather than
    /// silently lose the field.
    pub fn add_field(&mut self, table_id: &str, spec: FieldSpec) -> Result<Field, TabulonError> {
        if self.document.table(table_id).is_none() {
            return Err(TabulonError::TableNotFound(table_id.to_string()));
        }
        self.snapshot();
        let field = self.field_from_spec(spec);
        let table = self
            .document
            .table_mut(table_id)
            .expect("table existence checked above");
        table.fields.push(field.clone());
        self.notify();
        Ok(field)
    }

    /// Updates a field's name, type and flags in place. No-op when the
    /// table or field is missing.
    pub fn update_field(&mut self, table_id: &str, field_id: &str, spec: FieldSpec) {
        let exists = self
            .document
            .resolve_field(table_id, field_id)
            .is_some();
        if !exists {
            return;
        }
        self.snapshot();
        let field = self
            .document
            .table_mut(table_id)
            .and_then(|table| table.fields.iter_mut().find(|field| field.id == field_id))
            .expect("field existence checked above");
        field.name = spec.name;
        field.ty = FieldType::parse(spec.ty.as_str());
        field.nullable = spec.nullable;
        field.primary_key = spec.primary_key;
        self.notify();
    }

    /// Removes a field and every relationship referencing it. No-op when
    /// the table or field is missing.
    pub fn delete_field(&mut self, table_id: &str, field_id: &str) {
        if self.document.resolve_field(table_id, field_id).is_none() {
            return;
        }
        self.snapshot();
        let table = self
            .document
            .table_mut(table_id)
            .expect("table existence checked above");
        table.fields.retain(|field| field.id != field_id);
        self.document
            .relationships
            .retain(|relationship| !relationship.references_field(field_id));
        self.notify();
    }

    /// Moves a field within its table's ordered list. No-op when the table
    /// is missing or `from` is out of range; `to` is clamped.
    pub fn reorder_fields(&mut self, table_id: &str, from: usize, to: usize) {
        let Some(table) = self.document.table(table_id) else {
            return;
        };
        if from >= table.fields.len() || from == to {
            return;
        }
        self.snapshot();
        let table = self
            .document
            .table_mut(table_id)
            .expect("table existence checked above");
        let field = table.fields.remove(from);
        let to = to.min(table.fields.len());
        table.fields.insert(to, field);
        self.notify();
    }

    // ------------------------------------------------------------------
    // Relationships
    // ------------------------------------------------------------------

    /// Connects one source field to one target field (the single-field
    /// convenience form) and returns the relationship.
    ///
    /// # Errors
    ///
    /// See [`DiagramStore::add_relationship_with_meta`].
    pub fn add_relationship(
        &mut self,
        source_table_id: &str,
        source_field_id: &str,
        target_table_id: &str,
        target_field_id: &str,
    ) -> Result<Relationship, TabulonError> {
        self.add_relationship_with_meta(
            source_table_id,
            vec![source_field_id.to_string()],
            target_table_id,
            vec![target_field_id.to_string()],
            RelationshipMeta::default(),
        )
    }

    /// Connects field groups of two tables, with optional metadata, and
    /// returns the relationship.
    ///
    /// # Errors
    ///
    /// - [`TabulonError::EmptyFieldMapping`] when either list is empty or
    ///   their lengths differ.
    /// - [`TabulonError::TableNotFound`] / [`TabulonError::FieldNotFound`]
    ///   when a referenced id does not resolve; a relationship may never
    ///   enter the document dangling.
    pub fn add_relationship_with_meta(
        &mut self,
        source_table_id: &str,
        source_field_ids: Vec<EntityId>,
        target_table_id: &str,
        target_field_ids: Vec<EntityId>,
        meta: RelationshipMeta,
    ) -> Result<Relationship, TabulonError> {
        if source_field_ids.is_empty() || source_field_ids.len() != target_field_ids.len() {
            return Err(TabulonError::EmptyFieldMapping);
        }
        self.check_fields_resolve(source_table_id, &source_field_ids)?;
        self.check_fields_resolve(target_table_id, &target_field_ids)?;

        self.snapshot();
        let relationship = Relationship {
            id: self.ids.allocate("r"),
            source_table_id: source_table_id.to_string(),
            target_table_id: target_table_id.to_string(),
            source_field_ids,
            target_field_ids,
            name: meta.name,
            note: meta.note,
            cardinality: meta.cardinality,
        };
        debug!(relationship_id = relationship.id.as_str(); "Relationship added");
        self.document.relationships.push(relationship.clone());
        self.notify();
        Ok(relationship)
    }

    fn check_fields_resolve(
        &self,
        table_id: &str,
        field_ids: &[EntityId],
    ) -> Result<(), TabulonError> {
        let table = self
            .document
            .table(table_id)
            .ok_or_else(|| TabulonError::TableNotFound(table_id.to_string()))?;
        for field_id in field_ids {
            if table.field(field_id).is_none() {
                return Err(TabulonError::FieldNotFound {
                    table_id: table_id.to_string(),
                    field_id: field_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Replaces a relationship's field-id lists and metadata. No-op when
    /// the relationship is missing.
    ///
    /// # Errors
    ///
    /// Same validation as [`DiagramStore::add_relationship_with_meta`],
    /// against the relationship's existing endpoint tables.
    pub fn update_relationship_meta(
        &mut self,
        relationship_id: &str,
        source_field_ids: Vec<EntityId>,
        target_field_ids: Vec<EntityId>,
        meta: RelationshipMeta,
    ) -> Result<(), TabulonError> {
        let Some(existing) = self.document.relationship(relationship_id) else {
            return Ok(());
        };
        if source_field_ids.is_empty() || source_field_ids.len() != target_field_ids.len() {
            return Err(TabulonError::EmptyFieldMapping);
        }
        let source_table_id = existing.source_table_id.clone();
        let target_table_id = existing.target_table_id.clone();
        self.check_fields_resolve(&source_table_id, &source_field_ids)?;
        self.check_fields_resolve(&target_table_id, &target_field_ids)?;

        self.snapshot();
        let relationship = self
            .document
            .relationship_mut(relationship_id)
            .expect("relationship existence checked above");
        relationship.source_field_ids = source_field_ids;
        relationship.target_field_ids = target_field_ids;
        relationship.name = meta.name;
        relationship.note = meta.note;
        relationship.cardinality = meta.cardinality;
        self.notify();
        Ok(())
    }

    /// Removes a relationship. No-op when missing.
    pub fn delete_relationship(&mut self, relationship_id: &str) {
        if self.document.relationship(relationship_id).is_none() {
            return;
        }
        self.snapshot();
        self.document
            .relationships
            .retain(|relationship| relationship.id != relationship_id);
        self.notify();
    }

    // ------------------------------------------------------------------
    // Notes
    // ------------------------------------------------------------------

    /// Creates a free-text note at the given point and returns it.
    pub fn add_note(&mut self, x: f32, y: f32, text: &str) -> Note {
        self.snapshot();
        let note = Note {
            id: self.ids.allocate("n"),
            x,
            y,
            width: None,
            height: None,
            text: text.to_string(),
        };
        self.document.notes.push(note.clone());
        self.notify();
        note
    }

    /// Replaces a note's text. No-op when missing.
    pub fn update_note(&mut self, note_id: &str, text: &str) {
        if self.document.note(note_id).is_none() {
            return;
        }
        self.snapshot();
        let note = self
            .document
            .note_mut(note_id)
            .expect("note existence checked above");
        note.text = text.to_string();
        self.notify();
    }

    /// Moves a note during a drag. Does not push undo history; sets the
    /// dirty flag.
    pub fn update_note_position(&mut self, note_id: &str, x: f32, y: f32) {
        let Some(note) = self.document.note_mut(note_id) else {
            return;
        };
        note.x = x;
        note.y = y;
        self.dirty = true;
        self.notify();
    }

    /// Resizes a note during a drag. Does not push undo history; sets the
    /// dirty flag.
    pub fn update_note_size(&mut self, note_id: &str, width: f32, height: f32) {
        let Some(note) = self.document.note_mut(note_id) else {
            return;
        };
        note.width = Some(width);
        note.height = Some(height);
        self.dirty = true;
        self.notify();
    }

    /// Removes a note. No-op when missing.
    pub fn delete_note(&mut self, note_id: &str) {
        if self.document.note(note_id).is_none() {
            return;
        }
        self.snapshot();
        self.document.notes.retain(|note| note.id != note_id);
        self.notify();
    }

    // ------------------------------------------------------------------
    // Viewport and layout
    // ------------------------------------------------------------------

    /// Sets the zoom/pan viewport. Presentation-only: no undo history,
    /// sets the dirty flag.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.document.viewport = Some(viewport);
        self.dirty = true;
        self.notify();
    }

    /// Recomputes every table position with the selected layout engine,
    /// as one undo entry covering the whole batch.
    pub fn apply_layout(&mut self, kind: LayoutKind) {
        if self.document.tables.is_empty() {
            return;
        }
        self.snapshot();
        let positions = self.engines.engine(kind).calculate(&self.document);
        for (table_id, position) in positions {
            if let Some(table) = self.document.table_mut(&table_id) {
                table.x = position.x();
                table.y = position.y();
            }
        }
        info!(kind:? = kind, tables = self.document.tables.len(); "Layout applied");
        self.notify();
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Restores the document preceding the last structural mutation.
    /// Returns `false` when the undo stack is empty.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.document, previous);
        self.redo_stack.push(current);
        self.dirty = true;
        self.notify();
        true
    }

    /// Re-applies the last undone mutation. Returns `false` when the redo
    /// stack is empty (any new structural mutation clears it).
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.document, next);
        self.undo_stack.push(current);
        self.dirty = true;
        self.notify();
        true
    }
}

impl Default for DiagramStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // A step of an editing session. Indices are taken modulo the current
    // entity counts so every step applies to whatever the session built
    // so far.
    #[derive(Debug, Clone)]
    enum Step {
        AddTable,
        AddField(usize),
        AddRelationship(usize, usize),
        DeleteField(usize),
        DeleteTable(usize),
        Undo,
        Redo,
    }

    fn arb_step() -> impl Strategy<Value = Step> {
        prop_oneof![
            3 => Just(Step::AddTable),
            3 => (0usize..16).prop_map(Step::AddField),
            3 => (0usize..16, 0usize..16).prop_map(|(a, b)| Step::AddRelationship(a, b)),
            2 => (0usize..16).prop_map(Step::DeleteField),
            1 => (0usize..16).prop_map(Step::DeleteTable),
            1 => Just(Step::Undo),
            1 => Just(Step::Redo),
        ]
    }

    fn apply(store: &mut DiagramStore, step: Step) {
        let table_count = store.document().tables.len();
        match step {
            Step::AddTable => {
                store.add_table(table_count as f32 * 50.0, 0.0);
            }
            Step::AddField(index) if table_count > 0 => {
                let table_id = store.document().tables[index % table_count].id.clone();
                let name = format!("extra_{index}");
                store
                    .add_field(&table_id, FieldSpec::new(name, FieldType::Text))
                    .expect("table looked up from the live document");
            }
            Step::AddRelationship(source, target) if table_count > 0 => {
                let pick = |index: usize| {
                    let table = &store.document().tables[index % table_count];
                    (table.id.clone(), table.fields.first().map(|f| f.id.clone()))
                };
                let (source_table, source_field) = pick(source);
                let (target_table, target_field) = pick(target);
                if let (Some(source_field), Some(target_field)) = (source_field, target_field) {
                    store
                        .add_relationship(&source_table, &source_field, &target_table, &target_field)
                        .expect("endpoints looked up from the live document");
                }
            }
            Step::DeleteField(index) if table_count > 0 => {
                let table = &store.document().tables[index % table_count];
                let table_id = table.id.clone();
                let field_id = table.fields.first().map(|f| f.id.clone());
                if let Some(field_id) = field_id {
                    store.delete_field(&table_id, &field_id);
                }
            }
            Step::DeleteTable(index) if table_count > 0 => {
                let table_id = store.document().tables[index % table_count].id.clone();
                store.delete_table(&table_id);
            }
            Step::Undo => {
                store.undo();
            }
            Step::Redo => {
                store.redo();
            }
            _ => {}
        }
    }

    proptest! {
        #[test]
        fn any_editing_session_preserves_referential_integrity(
            steps in proptest::collection::vec(arb_step(), 1..40),
        ) {
            let mut store = DiagramStore::new();
            for step in steps {
                apply(&mut store, step);

                let document = store.document();
                for relationship in &document.relationships {
                    prop_assert!(relationship.has_valid_mapping());
                    for (table_id, field_ids) in [
                        (&relationship.source_table_id, &relationship.source_field_ids),
                        (&relationship.target_table_id, &relationship.target_field_ids),
                    ] {
                        let table = document.table(table_id);
                        prop_assert!(table.is_some());
                        let table = table.expect("presence asserted above");
                        for field_id in field_ids {
                            prop_assert!(table.field(field_id).is_some());
                        }
                    }
                }
            }
        }
    }
}
