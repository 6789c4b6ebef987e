//! The diagram document model.
//!
//! A [`Diagram`] is the root aggregate: ordered tables, relationships and
//! notes plus an optional viewport. All identifiers are opaque strings that
//! stay stable for the lifetime of a document.
//!
//! Relationships are kept *always-compound* internally: both sides carry a
//! non-empty list of field ids. The serialized form additionally emits the
//! legacy singular `sourceFieldId`/`targetFieldId` (the first element of
//! each list) and accepts documents that carry only the singular form.

use std::fmt;

use log::debug;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::geometry::Point;

/// Opaque entity identifier, unique within a document.
pub type EntityId = String;

/// Schema version written into newly created documents.
pub const SCHEMA_VERSION: u32 = 2;

/// The field type vocabulary recognized by editors.
///
/// Unknown type strings are preserved in [`FieldType::Custom`] without
/// special-casing; parsing normalizes to lower case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldType {
    Text,
    #[default]
    Integer,
    BigInt,
    Numeric,
    Uuid,
    Timestamp,
    Date,
    Boolean,
    Custom(String),
}

impl FieldType {
    /// Parses a type string, lower-casing it first. Recognized names map to
    /// the closed vocabulary; anything else is preserved as [`FieldType::Custom`].
    pub fn parse(value: &str) -> Self {
        let lower = value.to_lowercase();
        match lower.as_str() {
            "text" => Self::Text,
            "int" | "integer" => Self::Integer,
            "bigint" | "big-integer" => Self::BigInt,
            "numeric" => Self::Numeric,
            "uuid" | "unique-identifier" => Self::Uuid,
            "timestamp" => Self::Timestamp,
            "date" => Self::Date,
            "bool" | "boolean" => Self::Boolean,
            _ => Self::Custom(lower),
        }
    }

    /// Canonical wire token of this type. Short aliases accepted by
    /// [`FieldType::parse`] are never emitted.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::BigInt => "big-integer",
            Self::Numeric => "numeric",
            Self::Uuid => "unique-identifier",
            Self::Timestamp => "timestamp",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

/// Cardinality label of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    #[serde(rename = "1-to-1")]
    OneToOne,
    #[serde(rename = "1-to-many")]
    OneToMany,
    #[serde(rename = "many-to-1")]
    ManyToOne,
    #[serde(rename = "many-to-many")]
    ManyToMany,
    #[serde(rename = "0-or-1-to-1")]
    ZeroOrOneToOne,
    #[serde(rename = "0-or-1-to-many")]
    ZeroOrOneToMany,
}

/// A typed column of a table. Field order within a table is significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub primary_key: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// An entity placed on the canvas. Width and height are derived from the
/// name and fields by [`crate::routing::table_size`], never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: EntityId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Table {
    /// Top-left position in diagram space.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Looks up a field by id.
    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.id == field_id)
    }

    /// Index of a field within the ordered field list.
    pub fn field_index(&self, field_id: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.id == field_id)
    }
}

/// A connection between field groups of two tables.
///
/// `source_field_ids` and `target_field_ids` are equal-length, non-empty
/// lists; a single-field relationship is a list of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RelationshipRepr", into = "RelationshipRepr")]
pub struct Relationship {
    pub id: EntityId,
    pub source_table_id: EntityId,
    pub target_table_id: EntityId,
    pub source_field_ids: Vec<EntityId>,
    pub target_field_ids: Vec<EntityId>,
    pub name: Option<String>,
    pub note: Option<String>,
    pub cardinality: Option<Cardinality>,
}

impl Relationship {
    /// Whether this relationship has a well-formed field mapping: equal
    /// length, non-empty lists on both sides.
    pub fn has_valid_mapping(&self) -> bool {
        !self.source_field_ids.is_empty()
            && self.source_field_ids.len() == self.target_field_ids.len()
    }

    /// Whether this relationship connects to the given table on either end.
    pub fn touches_table(&self, table_id: &str) -> bool {
        self.source_table_id == table_id || self.target_table_id == table_id
    }

    /// Whether this relationship references the given field on either side.
    pub fn references_field(&self, field_id: &str) -> bool {
        self.source_field_ids.iter().any(|id| id == field_id)
            || self.target_field_ids.iter().any(|id| id == field_id)
    }

    /// Whether source and target are the same table.
    pub fn is_self_referencing(&self) -> bool {
        self.source_table_id == self.target_table_id
    }
}

/// Wire representation of a relationship.
///
/// Documents written before compound keys existed carry only the singular
/// `sourceFieldId`/`targetFieldId`; we keep emitting those (as the first
/// element of each list) so older readers stay compatible. `label` is a
/// legacy alias for `name` that is accepted but never emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelationshipRepr {
    id: EntityId,
    source_table_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_field_id: Option<EntityId>,
    target_table_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_field_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    source_field_ids: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    target_field_ids: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cardinality: Option<Cardinality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl From<RelationshipRepr> for Relationship {
    fn from(repr: RelationshipRepr) -> Self {
        let promote = |ids: Vec<EntityId>, single: Option<EntityId>| {
            if ids.is_empty() {
                single.into_iter().collect()
            } else {
                ids
            }
        };
        Self {
            id: repr.id,
            source_table_id: repr.source_table_id,
            target_table_id: repr.target_table_id,
            source_field_ids: promote(repr.source_field_ids, repr.source_field_id),
            target_field_ids: promote(repr.target_field_ids, repr.target_field_id),
            name: repr.name.or(repr.label),
            note: repr.note,
            cardinality: repr.cardinality,
        }
    }
}

impl From<Relationship> for RelationshipRepr {
    fn from(relationship: Relationship) -> Self {
        Self {
            id: relationship.id,
            source_table_id: relationship.source_table_id,
            source_field_id: relationship.source_field_ids.first().cloned(),
            target_table_id: relationship.target_table_id,
            target_field_id: relationship.target_field_ids.first().cloned(),
            source_field_ids: relationship.source_field_ids,
            target_field_ids: relationship.target_field_ids,
            name: relationship.name,
            note: relationship.note,
            cardinality: relationship.cardinality,
            label: None,
        }
    }
}

/// A free-text annotation on the canvas. Width and height are optional;
/// the renderer applies defaults when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    pub text: String,
}

/// Zoom factor and pan offsets. Presentation-only, not subject to undo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

/// Root aggregate of the diagram document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
}

fn default_version() -> u32 {
    SCHEMA_VERSION
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagram {
    /// Creates an empty diagram at the current schema version.
    pub fn new() -> Self {
        Self {
            version: SCHEMA_VERSION,
            tables: Vec::new(),
            relationships: Vec::new(),
            notes: Vec::new(),
            viewport: None,
        }
    }

    /// Looks up a table by id.
    pub fn table(&self, table_id: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.id == table_id)
    }

    /// Looks up a table by id, mutably.
    pub fn table_mut(&mut self, table_id: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|table| table.id == table_id)
    }

    /// Looks up a relationship by id.
    pub fn relationship(&self, relationship_id: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id == relationship_id)
    }

    /// Looks up a relationship by id, mutably.
    pub fn relationship_mut(&mut self, relationship_id: &str) -> Option<&mut Relationship> {
        self.relationships.iter_mut().find(|r| r.id == relationship_id)
    }

    /// Looks up a note by id.
    pub fn note(&self, note_id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == note_id)
    }

    /// Looks up a note by id, mutably.
    pub fn note_mut(&mut self, note_id: &str) -> Option<&mut Note> {
        self.notes.iter_mut().find(|note| note.id == note_id)
    }

    /// Resolves a field within a specific table.
    pub fn resolve_field(&self, table_id: &str, field_id: &str) -> Option<&Field> {
        self.table(table_id).and_then(|table| table.field(field_id))
    }

    /// Normalizes a document loaded from outside: bumps the schema version,
    /// re-parses every field type (lower-casing custom names) and drops
    /// relationships that no longer resolve.
    pub fn normalize(&mut self) {
        self.version = SCHEMA_VERSION;
        for table in &mut self.tables {
            for field in &mut table.fields {
                field.ty = FieldType::parse(field.ty.as_str());
            }
        }
        self.retain_valid_relationships();
    }

    /// Drops every relationship whose mapping is malformed or that
    /// references a table or field id absent from the document.
    pub fn retain_valid_relationships(&mut self) {
        let tables = std::mem::take(&mut self.tables);
        let before = self.relationships.len();
        self.relationships.retain(|relationship| {
            if !relationship.has_valid_mapping() {
                return false;
            }
            let resolves = |table_id: &str, field_ids: &[EntityId]| {
                tables
                    .iter()
                    .find(|table| table.id == table_id)
                    .is_some_and(|table| {
                        field_ids.iter().all(|id| table.field(id).is_some())
                    })
            };
            resolves(&relationship.source_table_id, &relationship.source_field_ids)
                && resolves(&relationship.target_table_id, &relationship.target_field_ids)
        });
        let pruned = before - self.relationships.len();
        if pruned > 0 {
            debug!(pruned = pruned; "Pruned dangling relationships");
        }
        self.tables = tables;
    }
}
