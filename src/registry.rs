//! Object registry.
//!
//! Objects are constructed one precedence tier at a time (groups, roles,
//! extensions, databases, tables, views, schemas, scripts), each tier in
//! catalog order. An object may only reference objects already registered,
//! so there is no dependency sorting: a forward reference is an error.

use serde_yaml::{Mapping, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::catalog::{marks, CatalogNode, WITH_KEY};
use crate::error::{ApogeeError, Result};
use crate::log_object;
use crate::sql::database::{Database, Extension};
use crate::sql::objects::{bind_spec, DbObject, ObjectId, ObjectKind};
use crate::sql::relation::{Table, View};
use crate::sql::role::Role;
use crate::sql::schema::Schema;
use crate::sql::script::Script;

const ID_KEY: &str = "id";

#[derive(Debug, Default)]
pub struct Registry {
    objects: Vec<DbObject>,
    index: HashMap<ObjectId, usize>,
    /// Table or view id to the schema listing it
    owners: HashMap<ObjectId, ObjectId>,
}

/// A validated catalog entry waiting for its tier
struct PendingObject {
    id: ObjectId,
    kind: ObjectKind,
    fields: Mapping,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from an expanded, substituted catalog
    pub fn build(catalog: &CatalogNode) -> Result<Self> {
        let pending = validate(catalog)?;
        let mut registry = Registry::new();

        for kind in ObjectKind::PRECEDENCE {
            let tier: Vec<&PendingObject> = pending.iter().filter(|p| p.kind == kind).collect();
            if tier.is_empty() {
                continue;
            }
            debug!(kind = %kind, count = tier.len(), "Constructing tier");

            for entry in tier {
                let object = registry.construct(entry)?;
                log_object!(object.kind(), object.id(), "registered");
                registry.insert(object)?;
            }
        }

        info!(objects = registry.len(), "Catalog resolved");
        Ok(registry)
    }

    fn construct(&self, entry: &PendingObject) -> Result<DbObject> {
        let mut fields = Value::Mapping(entry.fields.clone());
        marks::resolve_references(&mut fields, &|id: &str| {
            self.get(id).map(|o| o.name().to_string())
        })?;
        let Value::Mapping(fields) = fields else {
            return Err(ApogeeError::Internal(format!(
                "{} lost its mapping while resolving references",
                entry.id
            )));
        };

        let id = entry.id.clone();
        Ok(match entry.kind {
            ObjectKind::Group => DbObject::Role(Role::from_group_spec(
                id.clone(),
                bind_spec(&id, fields)?,
                self,
            )?),
            ObjectKind::Role => DbObject::Role(Role::from_role_spec(
                id.clone(),
                bind_spec(&id, fields)?,
                self,
            )?),
            ObjectKind::Extension => {
                DbObject::Extension(Extension::from_spec(id.clone(), bind_spec(&id, fields)?))
            }
            ObjectKind::Database => DbObject::Database(Database::from_spec(
                id.clone(),
                bind_spec(&id, fields)?,
                self,
            )?),
            ObjectKind::Table => {
                DbObject::Table(Table::from_spec(id.clone(), bind_spec(&id, fields)?, self)?)
            }
            ObjectKind::View => {
                DbObject::View(View::from_spec(id.clone(), bind_spec(&id, fields)?, self)?)
            }
            ObjectKind::Schema => DbObject::Schema(Schema::from_spec(
                id.clone(),
                bind_spec(&id, fields)?,
                self,
            )?),
            ObjectKind::Script => DbObject::Script(Script::from_spec(
                id.clone(),
                bind_spec(&id, fields)?,
                self,
            )?),
        })
    }

    fn insert(&mut self, object: DbObject) -> Result<()> {
        let id = object.id().clone();
        if self.index.contains_key(&id) {
            return Err(ApogeeError::DuplicateId(id.to_string()));
        }

        if let DbObject::Schema(schema) = &object {
            for relation in schema.tables.iter().chain(schema.views.iter()) {
                match self.owners.get(relation) {
                    Some(first) => warn!(
                        relation = %relation,
                        schema = %first,
                        also = %schema.id,
                        "Relation listed by more than one schema, keeping the first"
                    ),
                    None => {
                        self.owners.insert(relation.clone(), schema.id.clone());
                    }
                }
            }
        }

        self.index.insert(id, self.objects.len());
        self.objects.push(object);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: impl AsRef<str>) -> bool {
        self.index.contains_key(id.as_ref())
    }

    /// Objects in registration order
    pub fn iter(&self) -> impl Iterator<Item = &DbObject> {
        self.objects.iter()
    }

    pub fn get(&self, id: impl AsRef<str>) -> Result<&DbObject> {
        let id = id.as_ref();
        self.index
            .get(id)
            .map(|&i| &self.objects[i])
            .ok_or_else(|| ApogeeError::ObjectNotFound(id.to_string()))
    }

    /// Every object of one kind in registration order, minus `excluding`
    pub fn by_kind(&self, kind: ObjectKind, excluding: &[ObjectId]) -> Vec<&DbObject> {
        self.objects
            .iter()
            .filter(|o| o.kind() == kind && !excluding.contains(o.id()))
            .collect()
    }

    /// Schema listing a table or view
    pub fn owning_schema(&self, relation: impl AsRef<str>) -> Option<&Schema> {
        self.owners
            .get(relation.as_ref())
            .and_then(|id| self.get(id).ok())
            .and_then(DbObject::as_schema)
    }

    fn typed<'a, T>(
        &'a self,
        id: &str,
        expected: &str,
        pick: impl Fn(&'a DbObject) -> Option<&'a T>,
    ) -> Result<&'a T> {
        let object = self.get(id)?;
        pick(object).ok_or_else(|| ApogeeError::WrongKind {
            id: id.to_string(),
            expected: expected.to_string(),
            found: object.kind(),
        })
    }

    /// A login role or a group
    pub fn role(&self, id: impl AsRef<str>) -> Result<&Role> {
        self.typed(id.as_ref(), "Role or Group", DbObject::as_role)
    }

    pub fn extension(&self, id: impl AsRef<str>) -> Result<&Extension> {
        self.typed(id.as_ref(), "Extension", DbObject::as_extension)
    }

    pub fn database(&self, id: impl AsRef<str>) -> Result<&Database> {
        self.typed(id.as_ref(), "Database", DbObject::as_database)
    }

    pub fn table(&self, id: impl AsRef<str>) -> Result<&Table> {
        self.typed(id.as_ref(), "Table", DbObject::as_table)
    }

    pub fn view(&self, id: impl AsRef<str>) -> Result<&View> {
        self.typed(id.as_ref(), "View", DbObject::as_view)
    }

    pub fn schema(&self, id: impl AsRef<str>) -> Result<&Schema> {
        self.typed(id.as_ref(), "Schema", DbObject::as_schema)
    }

    pub fn scripts(&self) -> impl Iterator<Item = &Script> {
        self.objects.iter().filter_map(DbObject::as_script)
    }
}

/// First pass over the catalog: every element is a mapping with a unique,
/// well-formed id and no leftover `with`
fn validate(catalog: &CatalogNode) -> Result<Vec<PendingObject>> {
    let items = match catalog {
        Value::Sequence(items) => items,
        Value::Null => return Ok(Vec::new()),
        _ => {
            return Err(ApogeeError::InvalidCatalog(
                "the catalog root must be a list of objects".to_string(),
            ))
        }
    };

    let mut seen = HashSet::new();
    let mut pending = Vec::with_capacity(items.len());

    for item in items {
        let Value::Mapping(map) = item else {
            return Err(ApogeeError::InvalidCatalog(format!(
                "catalog entries must be mappings, found:\n{}",
                printable(item)
            )));
        };

        let id = match map.get(ID_KEY) {
            Some(Value::String(id)) => ObjectId::parse(id)?,
            Some(other) => return Err(ApogeeError::InvalidObjectId(printable(other))),
            None => {
                return Err(ApogeeError::MissingId {
                    object: printable(item),
                })
            }
        };
        let kind = id.kind()?;

        if map.contains_key(WITH_KEY) {
            return Err(ApogeeError::UnexpandedWith(id.to_string()));
        }
        if !seen.insert(id.clone()) {
            return Err(ApogeeError::DuplicateId(id.to_string()));
        }

        let mut fields = map.clone();
        fields.remove(ID_KEY);
        pending.push(PendingObject { id, kind, fields });
    }

    Ok(pending)
}

fn printable(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_else(|_| format!("{:?}", value))
}
