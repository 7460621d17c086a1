use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use std::borrow::Borrow;
use std::fmt;
use std::path::Path;

use crate::error::{ApogeeError, Result};
use crate::registry::Registry;
use crate::sql::database::{Database, Extension};
use crate::sql::relation::{Table, View};
use crate::sql::role::{GrantTarget, Role};
use crate::sql::schema::Schema;
use crate::sql::script::Script;

/// Catalog object types, in construction precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Group,
    Role,
    Extension,
    Database,
    Table,
    View,
    Schema,
    Script,
}

impl ObjectKind {
    /// Construction order of the registry. An object may only reference
    /// objects of its own kind defined earlier or of a kind listed before it.
    pub const PRECEDENCE: [ObjectKind; 8] = [
        ObjectKind::Group,
        ObjectKind::Role,
        ObjectKind::Extension,
        ObjectKind::Database,
        ObjectKind::Table,
        ObjectKind::View,
        ObjectKind::Schema,
        ObjectKind::Script,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Group => "Group",
            ObjectKind::Role => "Role",
            ObjectKind::Extension => "Extension",
            ObjectKind::Database => "Database",
            ObjectKind::Table => "Table",
            ObjectKind::View => "View",
            ObjectKind::Schema => "Schema",
            ObjectKind::Script => "Script",
        }
    }

    /// SQL keyword naming this kind of object. Scripts are not SQL objects.
    pub fn sql_keyword(&self) -> Option<&'static str> {
        match self {
            ObjectKind::Group | ObjectKind::Role => Some("role"),
            ObjectKind::Extension => Some("extension"),
            ObjectKind::Database => Some("database"),
            ObjectKind::Table => Some("table"),
            ObjectKind::View => Some("view"),
            ObjectKind::Schema => Some("schema"),
            ObjectKind::Script => None,
        }
    }

    pub fn precedence(&self) -> usize {
        *self as usize
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::PRECEDENCE.iter().copied().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog identifier of the form `<Type>::<name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an id. Both sides of `::` must be non-empty and the
    /// type must be a known kind.
    pub fn parse(id: &str) -> Result<Self> {
        let (kind, name) = id
            .split_once("::")
            .ok_or_else(|| ApogeeError::InvalidObjectId(id.to_string()))?;

        if kind.is_empty() || name.is_empty() {
            return Err(ApogeeError::InvalidObjectId(id.to_string()));
        }
        if ObjectKind::parse(kind).is_none() {
            return Err(ApogeeError::UnknownObjectType {
                kind: kind.to_string(),
                id: id.to_string(),
            });
        }

        Ok(ObjectId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The kind named by the type prefix
    pub fn kind(&self) -> Result<ObjectKind> {
        let prefix = self.0.split_once("::").map(|(k, _)| k).unwrap_or(&self.0);
        ObjectKind::parse(prefix).ok_or_else(|| ApogeeError::UnknownObjectType {
            kind: prefix.to_string(),
            id: self.0.clone(),
        })
    }

    /// The part after `::`
    pub fn local_name(&self) -> &str {
        self.0.split_once("::").map(|(_, n)| n).unwrap_or(&self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObjectId {
    type Error = ApogeeError;

    fn try_from(id: String) -> Result<Self> {
        ObjectId::parse(&id)
    }
}

impl Borrow<str> for ObjectId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A field that accepts either a single value or a list of values
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(v) => vec![v],
        }
    }
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        value.into_vec()
    }
}

/// `deserialize_with` helper normalizing a missing, null, single or list
/// field into a `Vec`
pub fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<OneOrMany<T>>::deserialize(deserializer).map(|v| v.map(Into::into).unwrap_or_default())
}

/// Like [`one_or_many`] but keeps "not given" apart from "given"
pub fn optional_one_or_many<'de, D, T>(
    deserializer: D,
) -> std::result::Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<OneOrMany<T>>::deserialize(deserializer).map(|v| v.map(Into::into))
}

/// `deserialize_with` helper accepting any YAML scalar as text
pub fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => s,
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Bool(b) => b.to_string(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    fn into_bool<E: serde::de::Error>(self) -> std::result::Result<bool, E> {
        match self {
            Flag::Bool(b) => Ok(b),
            Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" => Ok(true),
                "false" | "no" | "off" => Ok(false),
                _ => Err(E::invalid_value(
                    serde::de::Unexpected::Str(&s),
                    &"a boolean",
                )),
            },
        }
    }
}

/// `deserialize_with` helper accepting a YAML bool or its text form, which
/// is what a mark substituted with a bool leaves behind
pub fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Flag::deserialize(deserializer)?.into_bool()
}

/// Like [`flag`] for optional fields
pub fn optional_flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Flag>::deserialize(deserializer)?
        .map(Flag::into_bool)
        .transpose()
}

/// Bind the fields of a catalog mapping to a typed spec
pub fn bind_spec<T: DeserializeOwned>(id: &ObjectId, fields: serde_yaml::Mapping) -> Result<T> {
    serde_yaml::from_value(serde_yaml::Value::Mapping(fields)).map_err(|e| {
        ApogeeError::InvalidSpec {
            id: id.to_string(),
            message: e.to_string(),
        }
    })
}

/// Script actions addressed by name in catalog scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Drop,
    #[serde(alias = "fullCreate")]
    FullCreate,
    #[serde(alias = "fullDrop")]
    FullDrop,
    #[serde(alias = "codeComment")]
    CodeComment,
    #[serde(alias = "sqlComment")]
    SqlComment,
    #[serde(alias = "fullComment")]
    FullComment,
    #[serde(alias = "alterOwner")]
    AlterOwner,
    #[serde(alias = "alterPassword")]
    AlterPassword,
    Grant,
    Revoke,
    #[serde(alias = "grantOnAllTablesInSchema")]
    GrantOnAllTablesInSchema,
    Connect,
    #[serde(alias = "createExtensions")]
    CreateExtensions,
    #[serde(
        alias = "createPermissions",
        alias = "setPermissions",
        alias = "set_permissions"
    )]
    CreatePermissions,
    #[serde(alias = "primaryKey")]
    PrimaryKey,
    #[serde(alias = "createIndexes")]
    CreateIndexes,
    #[serde(alias = "columnComments")]
    ColumnComments,
    Refresh,
    Vacuum,
    #[serde(alias = "fullRefresh")]
    FullRefresh,
    #[serde(alias = "alterTableOwner")]
    AlterTableOwner,
    #[serde(alias = "alterViewOwner")]
    AlterViewOwner,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Drop => "drop",
            Action::FullCreate => "full_create",
            Action::FullDrop => "full_drop",
            Action::CodeComment => "code_comment",
            Action::SqlComment => "sql_comment",
            Action::FullComment => "full_comment",
            Action::AlterOwner => "alter_owner",
            Action::AlterPassword => "alter_password",
            Action::Grant => "grant",
            Action::Revoke => "revoke",
            Action::GrantOnAllTablesInSchema => "grant_on_all_tables_in_schema",
            Action::Connect => "connect",
            Action::CreateExtensions => "create_extensions",
            Action::CreatePermissions => "create_permissions",
            Action::PrimaryKey => "primary_key",
            Action::CreateIndexes => "create_indexes",
            Action::ColumnComments => "column_comments",
            Action::Refresh => "refresh",
            Action::Vacuum => "vacuum",
            Action::FullRefresh => "full_refresh",
            Action::AlterTableOwner => "alter_table_owner",
            Action::AlterViewOwner => "alter_view_owner",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional arguments of a script action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionArgs {
    pub target: Option<ObjectId>,
    pub privileges: Vec<String>,
    pub schema: Option<ObjectId>,
    pub owner: Option<ObjectId>,
    pub password: Option<String>,
    pub cascade: Option<bool>,
    pub role: Option<ObjectId>,
    pub block_comment: Option<String>,
    pub echo_comment: Option<String>,
    pub tables: Option<Vec<ObjectId>>,
    pub views: Option<Vec<ObjectId>>,
    pub name: Option<String>,
}

impl ActionArgs {
    /// Every object id the arguments point at
    pub fn references(&self) -> Vec<&ObjectId> {
        let mut refs: Vec<&ObjectId> = [&self.target, &self.schema, &self.owner, &self.role]
            .into_iter()
            .flatten()
            .collect();
        refs.extend(self.tables.iter().flatten());
        refs.extend(self.views.iter().flatten());
        refs
    }

    fn require<'a, T>(value: Option<&'a T>, action: Action, argument: &str) -> Result<&'a T> {
        value.ok_or_else(|| ApogeeError::MissingArgument {
            action: action.to_string(),
            argument: argument.to_string(),
        })
    }

    fn privileges(&self, action: Action) -> Result<&[String]> {
        if self.privileges.is_empty() {
            return Err(ApogeeError::MissingArgument {
                action: action.to_string(),
                argument: "privileges".to_string(),
            });
        }
        Ok(&self.privileges)
    }
}

/// Everything a renderer needs besides the object itself
pub struct RenderContext<'a> {
    pub registry: &'a Registry,
    /// Resolved substitution values of the target being rendered
    pub values: &'a serde_yaml::Mapping,
    pub snippets_dir: Option<&'a Path>,
}

impl<'a> RenderContext<'a> {
    pub fn new(registry: &'a Registry, values: &'a serde_yaml::Mapping) -> Self {
        Self {
            registry,
            values,
            snippets_dir: None,
        }
    }

    pub fn with_snippets_dir(mut self, dir: Option<&'a Path>) -> Self {
        self.snippets_dir = dir;
        self
    }

    /// Schema a table or view is rendered in: the explicit one, else the
    /// schema listing it
    pub fn relation_schema(&self, relation: &ObjectId, explicit: Option<&ObjectId>) -> Result<&'a Schema> {
        match explicit {
            Some(id) => self.registry.schema(id),
            None => self
                .registry
                .owning_schema(relation)
                .ok_or_else(|| ApogeeError::MissingSchema(relation.to_string())),
        }
    }
}

/// A resolved catalog object
#[derive(Debug, Clone, PartialEq)]
pub enum DbObject {
    Role(Role),
    Extension(Extension),
    Database(Database),
    Table(Table),
    View(View),
    Schema(Schema),
    Script(Script),
}

impl DbObject {
    pub fn id(&self) -> &ObjectId {
        match self {
            DbObject::Role(o) => &o.id,
            DbObject::Extension(o) => &o.id,
            DbObject::Database(o) => &o.id,
            DbObject::Table(o) => &o.id,
            DbObject::View(o) => &o.id,
            DbObject::Schema(o) => &o.id,
            DbObject::Script(o) => &o.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DbObject::Role(o) => &o.name,
            DbObject::Extension(o) => &o.name,
            DbObject::Database(o) => &o.name,
            DbObject::Table(o) => &o.name,
            DbObject::View(o) => &o.name,
            DbObject::Schema(o) => &o.name,
            DbObject::Script(o) => &o.name,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            DbObject::Role(r) if r.is_group => ObjectKind::Group,
            DbObject::Role(_) => ObjectKind::Role,
            DbObject::Extension(_) => ObjectKind::Extension,
            DbObject::Database(_) => ObjectKind::Database,
            DbObject::Table(_) => ObjectKind::Table,
            DbObject::View(_) => ObjectKind::View,
            DbObject::Schema(_) => ObjectKind::Schema,
            DbObject::Script(_) => ObjectKind::Script,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            DbObject::Role(o) => o.comment.as_deref(),
            DbObject::Extension(o) => o.comment.as_deref(),
            DbObject::Database(o) => o.comment.as_deref(),
            DbObject::Table(o) => o.comment.as_deref(),
            DbObject::View(o) => o.comment.as_deref(),
            DbObject::Schema(o) => o.comment.as_deref(),
            DbObject::Script(o) => o.comment.as_deref(),
        }
    }

    /// Ids of the objects this one points at
    pub fn references(&self) -> Vec<&ObjectId> {
        match self {
            DbObject::Role(o) => o.references(),
            DbObject::Extension(_) => Vec::new(),
            DbObject::Database(o) => o.references(),
            DbObject::Table(o) => o.references(),
            DbObject::View(o) => o.references(),
            DbObject::Schema(o) => o.references(),
            DbObject::Script(o) => o.references(),
        }
    }

    /// The object as the subject of a grant or revoke
    pub fn grant_target(&self) -> Result<GrantTarget<'_>> {
        match self {
            DbObject::Database(d) => Ok(GrantTarget::Database(&d.name)),
            DbObject::Schema(s) => Ok(GrantTarget::Schema(&s.name)),
            other => Err(ApogeeError::WrongKind {
                id: other.id().to_string(),
                expected: "Database or Schema".to_string(),
                found: other.kind(),
            }),
        }
    }

    /// Render one script action on this object
    pub fn render(&self, action: Action, args: &ActionArgs, ctx: &RenderContext) -> Result<String> {
        let unsupported = || ApogeeError::UnsupportedAction {
            kind: self.kind(),
            action: action.to_string(),
        };

        match self {
            DbObject::Role(role) => match action {
                Action::Create => role.create(ctx),
                Action::Drop => Ok(role.drop()),
                Action::FullCreate => role.full_create(ctx),
                Action::FullDrop => Ok(role.full_drop()),
                Action::CodeComment => Ok(role.code_comment()),
                Action::SqlComment => Ok(role.sql_comment()),
                Action::AlterPassword => role.alter_password(args.password.as_deref()),
                Action::Grant | Action::Revoke => {
                    let target = ActionArgs::require(args.target.as_ref(), action, "target")?;
                    let target = ctx.registry.get(target)?.grant_target()?;
                    let privileges = args.privileges(action)?;
                    Ok(if action == Action::Grant {
                        role.grant(&target, privileges)
                    } else {
                        role.revoke(&target, privileges)
                    })
                }
                Action::GrantOnAllTablesInSchema => {
                    let target = ActionArgs::require(args.target.as_ref(), action, "target")?;
                    let schema = ctx.registry.schema(target)?;
                    Ok(role.grant_on_all_tables_in_schema(schema, args.privileges(action)?))
                }
                _ => Err(unsupported()),
            },
            DbObject::Extension(ext) => match action {
                Action::Create => Ok(ext.create()),
                Action::Drop => Ok(ext.drop()),
                Action::FullCreate => Ok(ext.full_create()),
                Action::FullDrop => Ok(ext.full_drop()),
                Action::CodeComment => Ok(ext.code_comment()),
                Action::SqlComment => Ok(ext.sql_comment()),
                _ => Err(unsupported()),
            },
            DbObject::Database(db) => match action {
                Action::Create => db.create(args.owner.as_ref(), ctx),
                Action::Drop => Ok(db.drop()),
                Action::FullCreate => db.full_create(args.owner.as_ref(), ctx),
                Action::FullDrop => Ok(db.full_drop()),
                Action::CodeComment => Ok(db.code_comment()),
                Action::SqlComment => Ok(db.sql_comment()),
                Action::Connect => {
                    let role = args
                        .role
                        .as_ref()
                        .map(|id| ctx.registry.role(id))
                        .transpose()?;
                    Ok(db.connect(role))
                }
                Action::CreatePermissions => db.create_permissions(ctx),
                Action::CreateExtensions => db.create_extensions(ctx),
                _ => Err(unsupported()),
            },
            DbObject::Schema(schema) => match action {
                Action::Create => schema.create(args.owner.as_ref(), ctx),
                Action::Drop => Ok(schema.drop(args.cascade.unwrap_or(false))),
                Action::FullCreate => schema.full_create(
                    args.block_comment.as_deref(),
                    args.echo_comment.as_deref(),
                    ctx,
                ),
                Action::FullDrop => Ok(schema.full_drop(
                    args.block_comment.as_deref(),
                    args.echo_comment.as_deref(),
                )),
                Action::CodeComment => Ok(schema.code_comment()),
                Action::SqlComment => Ok(schema.sql_comment()),
                Action::FullComment => schema.full_comment(ctx),
                Action::AlterOwner => {
                    let owner = ActionArgs::require(args.owner.as_ref(), action, "owner")?;
                    schema.alter_owner(owner, ctx)
                }
                Action::CreatePermissions => schema.set_permissions(ctx),
                Action::FullRefresh => schema.full_refresh(ctx),
                Action::AlterTableOwner => {
                    let owner = ActionArgs::require(args.owner.as_ref(), action, "owner")?;
                    schema.alter_table_owner(owner, args.tables.as_deref(), ctx)
                }
                Action::AlterViewOwner => {
                    let owner = ActionArgs::require(args.owner.as_ref(), action, "owner")?;
                    schema.alter_view_owner(owner, args.views.as_deref(), ctx)
                }
                _ => Err(unsupported()),
            },
            DbObject::Table(table) => {
                let schema = ctx.relation_schema(&table.id, args.schema.as_ref())?;
                match action {
                    Action::Create => Ok(table.create(schema)),
                    Action::Drop => Ok(table.drop(schema)),
                    Action::FullCreate => table.full_create(schema, ctx),
                    Action::FullDrop => Ok(table.full_drop(schema)),
                    Action::CodeComment => Ok(table.code_comment()),
                    Action::SqlComment => Ok(table.sql_comment(schema)),
                    Action::AlterOwner => table.alter_owner(schema, args.owner.as_ref(), ctx),
                    Action::PrimaryKey => Ok(table.primary_key(schema, args.name.as_deref())),
                    Action::CreateIndexes => Ok(table.create_indexes(schema)),
                    Action::ColumnComments => Ok(table.column_comments(schema)),
                    _ => Err(unsupported()),
                }
            }
            DbObject::View(view) => {
                let schema = ctx.relation_schema(&view.id, args.schema.as_ref())?;
                match action {
                    Action::Create => Ok(view.create(schema)),
                    Action::Drop => Ok(view.drop(schema)),
                    Action::FullCreate => view.full_create(schema, ctx),
                    Action::FullDrop => Ok(view.full_drop(schema)),
                    Action::CodeComment => Ok(view.code_comment()),
                    Action::SqlComment => Ok(view.sql_comment(schema)),
                    Action::AlterOwner => view.alter_owner(schema, args.owner.as_ref(), ctx),
                    Action::CreateIndexes => Ok(view.create_indexes(schema)),
                    Action::ColumnComments => Ok(view.column_comments(schema)),
                    Action::Refresh => Ok(view.refresh(schema)),
                    Action::Vacuum => Ok(view.vacuum(schema)),
                    _ => Err(unsupported()),
                }
            }
            DbObject::Script(_) => Err(unsupported()),
        }
    }

    pub fn as_role(&self) -> Option<&Role> {
        match self {
            DbObject::Role(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_extension(&self) -> Option<&Extension> {
        match self {
            DbObject::Extension(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_database(&self) -> Option<&Database> {
        match self {
            DbObject::Database(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            DbObject::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_view(&self) -> Option<&View> {
        match self {
            DbObject::View(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            DbObject::Schema(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_script(&self) -> Option<&Script> {
        match self {
            DbObject::Script(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_parsing() {
        let id = ObjectId::parse("Role::admin").unwrap();
        assert_eq!(id.kind().unwrap(), ObjectKind::Role);
        assert_eq!(id.local_name(), "admin");

        let nested = ObjectId::parse("Table::a::b").unwrap();
        assert_eq!(nested.kind().unwrap(), ObjectKind::Table);
        assert_eq!(nested.local_name(), "a::b");

        assert!(matches!(
            ObjectId::parse("admin"),
            Err(ApogeeError::InvalidObjectId(_))
        ));
        assert!(matches!(
            ObjectId::parse("Role::"),
            Err(ApogeeError::InvalidObjectId(_))
        ));
        assert!(matches!(
            ObjectId::parse("Sequence::s"),
            Err(ApogeeError::UnknownObjectType { ref kind, .. }) if kind == "Sequence"
        ));
    }

    #[test]
    fn test_precedence_order() {
        let order: Vec<_> = ObjectKind::PRECEDENCE.iter().map(|k| k.precedence()).collect();
        assert_eq!(order, (0..8).collect::<Vec<_>>());
        assert!(ObjectKind::Group < ObjectKind::Role);
        assert!(ObjectKind::View < ObjectKind::Schema);
        assert_eq!(ObjectKind::Group.sql_keyword(), Some("role"));
        assert_eq!(ObjectKind::Script.sql_keyword(), None);
    }

    #[test]
    fn test_one_or_many_normalizes() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "one_or_many")]
            items: Vec<String>,
        }

        let one: Holder = serde_yaml::from_str("items: a").unwrap();
        assert_eq!(one.items, vec!["a"]);
        let many: Holder = serde_yaml::from_str("items: [a, b]").unwrap();
        assert_eq!(many.items, vec!["a", "b"]);
        let none: Holder = serde_yaml::from_str("{}").unwrap();
        assert!(none.items.is_empty());
        let null: Holder = serde_yaml::from_str("items: null").unwrap();
        assert!(null.items.is_empty());
    }

    #[test]
    fn test_action_aliases() {
        let camel: Action = serde_yaml::from_str("fullCreate").unwrap();
        let snake: Action = serde_yaml::from_str("full_create").unwrap();
        assert_eq!(camel, Action::FullCreate);
        assert_eq!(snake, Action::FullCreate);

        let perms: Action = serde_yaml::from_str("setPermissions").unwrap();
        assert_eq!(perms, Action::CreatePermissions);
        assert!(serde_yaml::from_str::<Action>("explode").is_err());
    }

    #[test]
    fn test_scalar_string_accepts_numbers() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(deserialize_with = "scalar_string")]
            port: String,
        }

        let h: Holder = serde_yaml::from_str("port: 5432").unwrap();
        assert_eq!(h.port, "5432");
        let h: Holder = serde_yaml::from_str("port: '5433'").unwrap();
        assert_eq!(h.port, "5433");
    }

    #[test]
    fn test_flags_accept_text() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "flag")]
            on: bool,
            #[serde(default, deserialize_with = "optional_flag")]
            maybe: Option<bool>,
        }

        let h: Holder = serde_yaml::from_str("on: true\nmaybe: 'false'").unwrap();
        assert!(h.on);
        assert_eq!(h.maybe, Some(false));
        let h: Holder = serde_yaml::from_str("on: 'yes'").unwrap();
        assert!(h.on);
        assert_eq!(h.maybe, None);
        assert!(serde_yaml::from_str::<Holder>("on: maybe").is_err());
    }

    #[test]
    fn test_object_id_references_are_validated() {
        #[derive(Debug, Deserialize)]
        struct Holder {
            owner: ObjectId,
        }

        let h: Holder = serde_yaml::from_str("owner: Role::admin").unwrap();
        assert_eq!(h.owner.as_str(), "Role::admin");

        let err = serde_yaml::from_str::<Holder>("owner: admin").unwrap_err();
        assert!(err.to_string().contains("Invalid object id 'admin'"));
        let err = serde_yaml::from_str::<Holder>("owner: Sequence::s").unwrap_err();
        assert!(err.to_string().contains("Unknown type Sequence"));
    }
}
