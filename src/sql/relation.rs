//! Tables and views. Both own their columns and indexes and are rendered
//! inside the schema that lists them.

use serde::Deserialize;

use crate::error::{ApogeeError, Result};
use crate::registry::Registry;
use crate::sql::objects::{flag, one_or_many, DbObject, ObjectId, OneOrMany, RenderContext};
use crate::sql::schema::Schema;
use crate::sql::text;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub comment: Option<String>,
}

impl Column {
    pub fn create(&self) -> String {
        format!("{} {}", self.name, self.data_type)
    }

    /// `comment on column schema.relation.column`
    pub fn sql_comment(&self, schema: &Schema, relation: &str) -> String {
        text::comment_on(
            "column",
            &format!("{}.{}.{}", schema.name, relation, self.name),
            self.comment.as_deref(),
        )
    }
}

/// A column list entry: an inline definition, or columns copied from a
/// relation defined earlier
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ColumnSpec {
    Defined(ColumnDef),
    Copied(CopiedColumns),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnDef {
    name: String,
    #[serde(rename = "type")]
    data_type: String,
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopiedColumns {
    from: ObjectId,
    columns: Option<OneOrMany<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub method: String,
    pub columns: Vec<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexSpec {
    #[serde(rename = "type")]
    method: String,
    #[serde(deserialize_with = "one_or_many")]
    columns: Vec<String>,
    name: Option<String>,
}

impl Index {
    /// `create index`, named `<relation>_<columns>_<method>` unless named
    pub fn create(&self, schema: &Schema, relation: &str) -> String {
        let name = self.name.clone().unwrap_or_else(|| {
            format!("{}_{}_{}", relation, self.columns.join("_"), self.method)
        });

        format!(
            "create index {}\non {}.{}\nusing {}({});\n\n",
            name,
            schema.name,
            relation,
            self.method,
            self.columns.join(", ")
        )
    }
}

fn resolve_columns(id: &ObjectId, specs: Vec<ColumnSpec>, registry: &Registry) -> Result<Vec<Column>> {
    let mut columns = Vec::new();

    for spec in specs {
        match spec {
            ColumnSpec::Defined(def) => columns.push(Column {
                name: def.name,
                data_type: def.data_type,
                comment: def.comment,
            }),
            ColumnSpec::Copied(copied) => {
                let source = match registry.get(&copied.from)? {
                    DbObject::Table(t) => &t.columns,
                    DbObject::View(v) => &v.columns,
                    other => {
                        return Err(ApogeeError::WrongKind {
                            id: copied.from.to_string(),
                            expected: "Table or View".to_string(),
                            found: other.kind(),
                        })
                    }
                };
                match copied.columns {
                    None => columns.extend(source.iter().cloned()),
                    Some(names) => {
                        for name in names.into_vec() {
                            let column = source.iter().find(|c| c.name == name).ok_or_else(|| {
                                ApogeeError::InvalidSpec {
                                    id: id.to_string(),
                                    message: format!("{} has no column '{}'", copied.from, name),
                                }
                            })?;
                            columns.push(column.clone());
                        }
                    }
                }
            }
        }
    }

    Ok(columns)
}

fn check_column_names(id: &ObjectId, columns: &[Column], names: &[String], usage: &str) -> Result<()> {
    match names.iter().find(|n| !columns.iter().any(|c| &c.name == *n)) {
        Some(missing) => Err(ApogeeError::InvalidSpec {
            id: id.to_string(),
            message: format!("{} column '{}' is not a column of the relation", usage, missing),
        }),
        None => Ok(()),
    }
}

fn resolve_indexes(id: &ObjectId, specs: Vec<IndexSpec>, columns: &[Column]) -> Result<Vec<Index>> {
    specs
        .into_iter()
        .map(|spec| {
            check_column_names(id, columns, &spec.columns, "Index")?;
            Ok(Index {
                method: spec.method,
                columns: spec.columns,
                name: spec.name,
            })
        })
        .collect()
}

fn owner_name<'a>(
    owner: Option<&ObjectId>,
    fallback: Option<&ObjectId>,
    ctx: &RenderContext<'a>,
) -> Result<Option<&'a str>> {
    owner
        .or(fallback)
        .map(|id| ctx.registry.role(id).map(|r| r.name.as_str()))
        .transpose()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub id: ObjectId,
    pub name: String,
    pub comment: Option<String>,
    pub columns: Vec<Column>,
    pub keys: Vec<String>,
    pub indexes: Vec<Index>,
    pub owner: Option<ObjectId>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSpec {
    name: String,
    comment: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    columns: Vec<ColumnSpec>,
    #[serde(default, deserialize_with = "one_or_many")]
    keys: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    indexes: Vec<IndexSpec>,
    owner: Option<ObjectId>,
}

impl Table {
    pub fn from_spec(id: ObjectId, spec: TableSpec, registry: &Registry) -> Result<Self> {
        if let Some(owner) = &spec.owner {
            registry.role(owner)?;
        }
        let columns = resolve_columns(&id, spec.columns, registry)?;
        check_column_names(&id, &columns, &spec.keys, "Key")?;
        let indexes = resolve_indexes(&id, spec.indexes, &columns)?;

        Ok(Self {
            id,
            name: spec.name,
            comment: spec.comment,
            columns,
            keys: spec.keys,
            indexes,
            owner: spec.owner,
        })
    }

    pub fn references(&self) -> Vec<&ObjectId> {
        self.owner.iter().collect()
    }

    pub fn qualified(&self, schema: &Schema) -> String {
        format!("{}.{}", schema.name, self.name)
    }

    pub fn get_columns(&self, names: &[String]) -> Vec<&Column> {
        self.columns.iter().filter(|c| names.contains(&c.name)).collect()
    }

    pub fn create(&self, schema: &Schema) -> String {
        let columns: Vec<String> = self.columns.iter().map(|c| format!("  {}", c.create())).collect();
        format!(
            "create table {}(\n{}\n);\n\n",
            self.qualified(schema),
            columns.join(",\n")
        )
    }

    pub fn drop(&self, schema: &Schema) -> String {
        format!("drop table {};\n\n", self.qualified(schema))
    }

    /// `alter table ... owner to`, empty when neither `owner` nor the catalog
    /// owner is set
    pub fn alter_owner(
        &self,
        schema: &Schema,
        owner: Option<&ObjectId>,
        ctx: &RenderContext,
    ) -> Result<String> {
        Ok(owner_name(owner, self.owner.as_ref(), ctx)?
            .map(|owner| format!("alter table {} owner to {};\n\n", self.qualified(schema), owner))
            .unwrap_or_default())
    }

    pub fn primary_key(&self, schema: &Schema, name: Option<&str>) -> String {
        if self.keys.is_empty() {
            return String::new();
        }

        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_{}_pkey", schema.name, self.name));
        format!(
            "alter table {}\nadd constraint {}\nprimary key({});\n\n",
            self.qualified(schema),
            name,
            self.keys.join(", ")
        )
    }

    pub fn create_indexes(&self, schema: &Schema) -> String {
        self.indexes.iter().map(|i| i.create(schema, &self.name)).collect()
    }

    pub fn code_comment(&self) -> String {
        self.comment.as_deref().map(text::comment).unwrap_or_default()
    }

    pub fn sql_comment(&self, schema: &Schema) -> String {
        text::comment_on("table", &self.qualified(schema), self.comment.as_deref())
    }

    pub fn column_comments(&self, schema: &Schema) -> String {
        self.columns.iter().map(|c| c.sql_comment(schema, &self.name)).collect()
    }

    pub fn full_create(&self, schema: &Schema, ctx: &RenderContext) -> Result<String> {
        Ok(format!(
            "{}{}{}{}{}{}{}",
            self.code_comment(),
            self.create(schema),
            self.alter_owner(schema, None, ctx)?,
            self.primary_key(schema, None),
            self.create_indexes(schema),
            self.sql_comment(schema),
            self.column_comments(schema)
        ))
    }

    pub fn full_drop(&self, schema: &Schema) -> String {
        let message = format!("Dropping table {}", self.qualified(schema));
        format!("{}{}{}", text::comment(&message), text::echo(&message), self.drop(schema))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub id: ObjectId,
    pub name: String,
    pub comment: Option<String>,
    pub sql: String,
    pub materialized: bool,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    pub owner: Option<ObjectId>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewSpec {
    name: String,
    comment: Option<String>,
    sql: String,
    #[serde(default, deserialize_with = "flag")]
    materialized: bool,
    #[serde(default, deserialize_with = "one_or_many")]
    columns: Vec<ColumnSpec>,
    #[serde(default, deserialize_with = "one_or_many")]
    indexes: Vec<IndexSpec>,
    owner: Option<ObjectId>,
}

impl View {
    pub fn from_spec(id: ObjectId, spec: ViewSpec, registry: &Registry) -> Result<Self> {
        if let Some(owner) = &spec.owner {
            registry.role(owner)?;
        }
        let columns = resolve_columns(&id, spec.columns, registry)?;
        let indexes = resolve_indexes(&id, spec.indexes, &columns)?;

        Ok(Self {
            id,
            name: spec.name,
            comment: spec.comment,
            sql: spec.sql,
            materialized: spec.materialized,
            columns,
            indexes,
            owner: spec.owner,
        })
    }

    pub fn references(&self) -> Vec<&ObjectId> {
        self.owner.iter().collect()
    }

    /// `view` or `materialized view`
    pub fn keyword(&self) -> &'static str {
        if self.materialized {
            "materialized view"
        } else {
            "view"
        }
    }

    pub fn qualified(&self, schema: &Schema) -> String {
        format!("{}.{}", schema.name, self.name)
    }

    pub fn create(&self, schema: &Schema) -> String {
        let sql = self.sql.trim_end();
        let sql = sql.strip_suffix(';').unwrap_or(sql);
        format!("create {} {} as\n{};\n\n", self.keyword(), self.qualified(schema), sql)
    }

    pub fn drop(&self, schema: &Schema) -> String {
        format!("drop {} {};\n\n", self.keyword(), self.qualified(schema))
    }

    pub fn refresh(&self, schema: &Schema) -> String {
        if self.materialized {
            format!("refresh materialized view {};\n\n", self.qualified(schema))
        } else {
            String::new()
        }
    }

    pub fn vacuum(&self, schema: &Schema) -> String {
        format!("vacuum {};\n\n", self.qualified(schema))
    }

    pub fn alter_owner(
        &self,
        schema: &Schema,
        owner: Option<&ObjectId>,
        ctx: &RenderContext,
    ) -> Result<String> {
        Ok(owner_name(owner, self.owner.as_ref(), ctx)?
            .map(|owner| {
                format!(
                    "alter {} {} owner to {};\n\n",
                    self.keyword(),
                    self.qualified(schema),
                    owner
                )
            })
            .unwrap_or_default())
    }

    pub fn create_indexes(&self, schema: &Schema) -> String {
        self.indexes.iter().map(|i| i.create(schema, &self.name)).collect()
    }

    pub fn code_comment(&self) -> String {
        self.comment.as_deref().map(text::comment).unwrap_or_default()
    }

    pub fn sql_comment(&self, schema: &Schema) -> String {
        text::comment_on(self.keyword(), &self.qualified(schema), self.comment.as_deref())
    }

    pub fn column_comments(&self, schema: &Schema) -> String {
        self.columns.iter().map(|c| c.sql_comment(schema, &self.name)).collect()
    }

    pub fn full_create(&self, schema: &Schema, ctx: &RenderContext) -> Result<String> {
        Ok(format!(
            "{}{}{}{}{}{}",
            self.code_comment(),
            self.create(schema),
            self.alter_owner(schema, None, ctx)?,
            self.create_indexes(schema),
            self.sql_comment(schema),
            self.column_comments(schema)
        ))
    }

    pub fn full_drop(&self, schema: &Schema) -> String {
        let message = format!("Dropping {} {}", self.keyword(), self.qualified(schema));
        format!("{}{}{}", text::comment(&message), text::echo(&message), self.drop(schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn schema() -> Schema {
        Schema {
            id: ObjectId::parse("Schema::context").unwrap(),
            name: "context".to_string(),
            comment: None,
            owner: None,
            permissions: Vec::new(),
            tables: Vec::new(),
            views: Vec::new(),
        }
    }

    fn municipio() -> Table {
        Table {
            id: ObjectId::parse("Table::municipio").unwrap(),
            name: "municipio".to_string(),
            comment: Some("Municipalities".to_string()),
            columns: vec![
                Column {
                    name: "gid".to_string(),
                    data_type: "integer".to_string(),
                    comment: Some("Unique ID".to_string()),
                },
                Column {
                    name: "geom".to_string(),
                    data_type: "geometry(MULTIPOLYGON, 3035)".to_string(),
                    comment: None,
                },
            ],
            keys: vec!["gid".to_string()],
            indexes: vec![Index {
                method: "gist".to_string(),
                columns: vec!["geom".to_string()],
                name: None,
            }],
            owner: None,
        }
    }

    #[test]
    fn test_table_create() {
        assert_eq!(
            municipio().create(&schema()),
            indoc! {"
                create table context.municipio(
                  gid integer,
                  geom geometry(MULTIPOLYGON, 3035)
                );

            "}
        );
    }

    #[test]
    fn test_primary_key_and_indexes() {
        let t = municipio();
        let s = schema();

        assert_eq!(
            t.primary_key(&s, None),
            "alter table context.municipio\nadd constraint context_municipio_pkey\nprimary key(gid);\n\n"
        );
        assert_eq!(
            t.primary_key(&s, Some("pk")),
            "alter table context.municipio\nadd constraint pk\nprimary key(gid);\n\n"
        );
        assert_eq!(
            t.create_indexes(&s),
            "create index municipio_geom_gist\non context.municipio\nusing gist(geom);\n\n"
        );
    }

    #[test]
    fn test_column_comments_skip_missing() {
        assert_eq!(
            municipio().column_comments(&schema()),
            "comment on column context.municipio.gid is\n'Unique ID';\n\n"
        );
    }

    #[test]
    fn test_materialized_view_keywords() {
        let s = schema();
        let mut v = View {
            id: ObjectId::parse("View::summary").unwrap(),
            name: "summary".to_string(),
            comment: Some("Summary".to_string()),
            sql: "select 1;\n\n".to_string(),
            materialized: true,
            columns: Vec::new(),
            indexes: Vec::new(),
            owner: None,
        };

        assert_eq!(
            v.create(&s),
            "create materialized view context.summary as\nselect 1;\n\n"
        );
        assert_eq!(v.refresh(&s), "refresh materialized view context.summary;\n\n");
        assert_eq!(
            v.sql_comment(&s),
            "comment on materialized view context.summary is\n'Summary';\n\n"
        );

        v.materialized = false;
        assert_eq!(v.refresh(&s), "");
        assert_eq!(v.drop(&s), "drop view context.summary;\n\n");
    }

    #[test]
    fn test_column_spec_forms() {
        let specs: Vec<ColumnSpec> = serde_yaml::from_str(indoc! {"
            - name: gid
              type: integer
            - from: Table::municipio
              columns: geom
        "})
        .unwrap();

        assert!(matches!(specs[0], ColumnSpec::Defined(_)));
        assert!(matches!(specs[1], ColumnSpec::Copied(_)));
    }
}
