//! Script objects: an output file assembled from object actions and text items.

use serde::Deserialize;
use serde_yaml::Value;
use std::path::{Component, Path};

use crate::catalog::marks;
use crate::error::{ApogeeError, Result};
use crate::registry::Registry;
use crate::sql::objects::{
    flag, one_or_many, optional_flag, optional_one_or_many, Action, ActionArgs, DbObject, ObjectId,
    ObjectKind, RenderContext,
};
use crate::sql::text::{self, CopyDirection, CopyOptions};

#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub id: ObjectId,
    pub name: String,
    /// Output path relative to the target directory
    pub file: String,
    pub comment: Option<String>,
    pub content: Vec<ScriptItem>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptSpec {
    name: String,
    file: Option<String>,
    comment: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    content: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptItem {
    Object {
        object: ObjectId,
        action: Action,
        args: ActionArgs,
    },
    Family {
        kind: ObjectKind,
        action: Action,
        args: ActionArgs,
        but: Vec<ObjectId>,
    },
    Sql(String),
    Block(String),
    Echo(String),
    EchoDash(String),
    Comment(String),
    Header(String),
    Footer(String),
    Blank(usize),
    Begin,
    Commit,
    Vacuum {
        analyze: bool,
    },
    Include {
        files: Vec<String>,
        path: Option<String>,
    },
    Copy {
        relation: ObjectId,
        schema: Option<ObjectId>,
        path: String,
        options: CopyOptions,
    },
    Snippet {
        file: String,
        tag: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ItemSpec {
    object: Option<ObjectId>,
    family: Option<String>,
    action: Option<Action>,
    #[serde(default, deserialize_with = "one_or_many")]
    but: Vec<ObjectId>,

    target: Option<ObjectId>,
    #[serde(default, deserialize_with = "one_or_many")]
    privileges: Vec<String>,
    schema: Option<ObjectId>,
    owner: Option<ObjectId>,
    password: Option<String>,
    #[serde(default, deserialize_with = "optional_flag")]
    cascade: Option<bool>,
    role: Option<ObjectId>,
    #[serde(alias = "blockComment")]
    block_comment: Option<String>,
    #[serde(alias = "echoComment")]
    echo_comment: Option<String>,
    #[serde(default, deserialize_with = "optional_one_or_many")]
    tables: Option<Vec<ObjectId>>,
    #[serde(default, deserialize_with = "optional_one_or_many")]
    views: Option<Vec<ObjectId>>,
    name: Option<String>,

    sql: Option<String>,
    block: Option<String>,
    echo: Option<String>,
    #[serde(alias = "echoDash")]
    echo_dash: Option<String>,
    comment: Option<String>,
    header: Option<String>,
    footer: Option<String>,
    blank: Option<usize>,
    vacuum: Option<VacuumSpec>,
    #[serde(default, deserialize_with = "optional_one_or_many")]
    include: Option<Vec<String>>,
    path: Option<String>,
    copy: Option<CopySpec>,
    snippet: Option<String>,
    tag: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VacuumSpec {
    #[serde(default, deserialize_with = "flag")]
    analyze: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CopySpec {
    #[serde(alias = "table", alias = "view")]
    relation: ObjectId,
    schema: Option<ObjectId>,
    path: String,
    #[serde(default, deserialize_with = "optional_one_or_many")]
    columns: Option<Vec<String>>,
    #[serde(default)]
    direction: CopyDirection,
    delimiter: Option<String>,
    #[serde(default, deserialize_with = "optional_flag")]
    csv: Option<bool>,
    #[serde(default, deserialize_with = "optional_flag")]
    header: Option<bool>,
    quote: Option<String>,
    encoding: Option<String>,
    null: Option<String>,
}

impl CopySpec {
    fn into_options(self) -> CopyOptions {
        // Absent keeps the default, an empty string disables the option
        fn pick(value: Option<String>, default: Option<String>) -> Option<String> {
            match value {
                None => default,
                Some(v) if v.is_empty() => None,
                Some(v) => Some(v),
            }
        }

        let defaults = CopyOptions::default();
        CopyOptions {
            columns: self.columns,
            direction: self.direction,
            delimiter: pick(self.delimiter, defaults.delimiter),
            csv: self.csv.unwrap_or(defaults.csv),
            header: self.header.unwrap_or(defaults.header),
            quote: pick(self.quote, defaults.quote),
            encoding: pick(self.encoding, defaults.encoding),
            null: pick(self.null, defaults.null),
        }
    }
}

fn item_error(script: &ObjectId, index: usize, message: impl std::fmt::Display) -> ApogeeError {
    ApogeeError::InvalidSpec {
        id: script.to_string(),
        message: format!("content item {}: {}", index + 1, message),
    }
}

impl ScriptItem {
    fn from_value(script: &ObjectId, index: usize, value: Value, registry: &Registry) -> Result<Self> {
        if let Value::String(keyword) = &value {
            return match keyword.trim() {
                "begin" => Ok(ScriptItem::Begin),
                "commit" => Ok(ScriptItem::Commit),
                "vacuum" => Ok(ScriptItem::Vacuum { analyze: false }),
                "vacuum analyze" => Ok(ScriptItem::Vacuum { analyze: true }),
                "blank" => Ok(ScriptItem::Blank(1)),
                other => Err(item_error(script, index, format!("unknown keyword '{}'", other))),
            };
        }

        let spec: ItemSpec =
            serde_yaml::from_value(value).map_err(|e| item_error(script, index, e))?;

        let kinds = [
            spec.object.is_some(),
            spec.family.is_some(),
            spec.sql.is_some(),
            spec.block.is_some(),
            spec.echo.is_some(),
            spec.echo_dash.is_some(),
            spec.comment.is_some(),
            spec.header.is_some(),
            spec.footer.is_some(),
            spec.blank.is_some(),
            spec.vacuum.is_some(),
            spec.include.is_some(),
            spec.copy.is_some(),
            spec.snippet.is_some(),
        ];
        if kinds.iter().filter(|k| **k).count() != 1 {
            return Err(item_error(
                script,
                index,
                "expected exactly one of object, family, sql, block, echo, echo_dash, comment, \
                 header, footer, blank, vacuum, include, copy, snippet",
            ));
        }
        if spec.action.is_some() && spec.object.is_none() && spec.family.is_none() {
            return Err(item_error(script, index, "'action' needs 'object' or 'family'"));
        }

        let args = ActionArgs {
            target: spec.target,
            privileges: spec.privileges,
            schema: spec.schema,
            owner: spec.owner,
            password: spec.password,
            cascade: spec.cascade,
            role: spec.role,
            block_comment: spec.block_comment,
            echo_comment: spec.echo_comment,
            tables: spec.tables,
            views: spec.views,
            name: spec.name,
        };
        for id in args.references() {
            registry.get(id)?;
        }

        let require_action = |action: Option<Action>| {
            action.ok_or_else(|| item_error(script, index, "missing 'action'"))
        };

        if let Some(object) = spec.object {
            registry.get(&object)?;
            return Ok(ScriptItem::Object {
                object,
                action: require_action(spec.action)?,
                args,
            });
        }
        if let Some(family) = spec.family {
            let kind = ObjectKind::parse(&family).ok_or_else(|| ApogeeError::UnknownObjectType {
                kind: family.clone(),
                id: script.to_string(),
            })?;
            for id in &spec.but {
                registry.get(id)?;
            }
            return Ok(ScriptItem::Family {
                kind,
                action: require_action(spec.action)?,
                args,
                but: spec.but,
            });
        }
        if let Some(copy) = spec.copy {
            let relation = registry.get(&copy.relation)?;
            if !matches!(relation, DbObject::Table(_) | DbObject::View(_)) {
                return Err(ApogeeError::WrongKind {
                    id: copy.relation.to_string(),
                    expected: "Table or View".to_string(),
                    found: relation.kind(),
                });
            }
            if let Some(schema) = &copy.schema {
                registry.schema(schema)?;
            }
            return Ok(ScriptItem::Copy {
                relation: copy.relation.clone(),
                schema: copy.schema.clone(),
                path: copy.path.clone(),
                options: copy.into_options(),
            });
        }

        Ok(if let Some(sql) = spec.sql {
            ScriptItem::Sql(sql)
        } else if let Some(c) = spec.block {
            ScriptItem::Block(c)
        } else if let Some(c) = spec.echo {
            ScriptItem::Echo(c)
        } else if let Some(c) = spec.echo_dash {
            ScriptItem::EchoDash(c)
        } else if let Some(c) = spec.comment {
            ScriptItem::Comment(c)
        } else if let Some(c) = spec.header {
            ScriptItem::Header(c)
        } else if let Some(c) = spec.footer {
            ScriptItem::Footer(c)
        } else if let Some(n) = spec.blank {
            ScriptItem::Blank(n)
        } else if let Some(v) = spec.vacuum {
            ScriptItem::Vacuum { analyze: v.analyze }
        } else if let Some(files) = spec.include {
            ScriptItem::Include {
                files,
                path: spec.path,
            }
        } else if let Some(file) = spec.snippet {
            ScriptItem::Snippet {
                file,
                tag: spec.tag,
            }
        } else {
            return Err(item_error(script, index, "empty item"));
        })
    }

    pub fn references(&self) -> Vec<&ObjectId> {
        match self {
            ScriptItem::Object { object, args, .. } => {
                let mut refs = vec![object];
                refs.extend(args.references());
                refs
            }
            ScriptItem::Family { args, .. } => args.references(),
            ScriptItem::Copy {
                relation, schema, ..
            } => {
                let mut refs = vec![relation];
                refs.extend(schema.iter());
                refs
            }
            _ => Vec::new(),
        }
    }

    pub fn render(&self, ctx: &RenderContext) -> Result<String> {
        match self {
            ScriptItem::Object {
                object,
                action,
                args,
            } => ctx.registry.get(object)?.render(*action, args, ctx),
            ScriptItem::Family {
                kind,
                action,
                args,
                but,
            } => ctx
                .registry
                .by_kind(*kind, but)
                .into_iter()
                .map(|o| o.render(*action, args, ctx))
                .collect(),
            ScriptItem::Sql(sql) => Ok(format!("{}\n\n", sql.trim_end())),
            ScriptItem::Block(c) => Ok(text::block(c)),
            ScriptItem::Echo(c) => Ok(text::echo(c)),
            ScriptItem::EchoDash(c) => Ok(text::echo_dash(c)),
            ScriptItem::Comment(c) => Ok(text::comment(c)),
            ScriptItem::Header(c) => Ok(text::header(Some(c), None)),
            ScriptItem::Footer(c) => Ok(text::footer(Some(c))),
            ScriptItem::Blank(n) => Ok(text::blank(*n)),
            ScriptItem::Begin => Ok(text::begin()),
            ScriptItem::Commit => Ok(text::commit()),
            ScriptItem::Vacuum { analyze } => Ok(text::vacuum(*analyze)),
            ScriptItem::Include { files, path } => Ok(text::psql_include(files, path.as_deref())),
            ScriptItem::Copy {
                relation,
                schema,
                path,
                options,
            } => {
                let schema = ctx.relation_schema(relation, schema.as_ref())?;
                let name = ctx.registry.get(relation)?.name();
                Ok(text::copy(&format!("{}.{}", schema.name, name), path, options))
            }
            ScriptItem::Snippet { file, tag } => {
                let path = ctx.snippets_dir.unwrap_or_else(|| Path::new(".")).join(file);
                let source = std::fs::read_to_string(&path)
                    .map_err(|e| ApogeeError::read_failed(&path, e))?;
                let selected = text::snippet(&source, tag.as_deref()).ok_or_else(|| {
                    ApogeeError::SnippetTagNotFound {
                        file: path.clone(),
                        tag: tag.clone().unwrap_or_default(),
                    }
                })?;
                Ok(format!("{}\n\n", marks::template(&selected, ctx.values)))
            }
        }
    }
}

/// Output paths stay inside the target directory
fn is_safe_relative(file: &str) -> bool {
    let path = Path::new(file);
    !file.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

impl Script {
    pub fn from_spec(id: ObjectId, spec: ScriptSpec, registry: &Registry) -> Result<Self> {
        let file = spec.file.unwrap_or_else(|| format!("{}.sql", spec.name));
        if !is_safe_relative(&file) {
            return Err(ApogeeError::InvalidScriptPath {
                id: id.to_string(),
                path: file,
            });
        }

        let content = spec
            .content
            .into_iter()
            .enumerate()
            .map(|(i, value)| ScriptItem::from_value(&id, i, value, registry))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id,
            name: spec.name,
            file,
            comment: spec.comment,
            content,
        })
    }

    pub fn references(&self) -> Vec<&ObjectId> {
        self.content.iter().flat_map(|i| i.references()).collect()
    }

    /// The complete file text, wrapped in the file header and footer
    pub fn render(&self, ctx: &RenderContext) -> Result<String> {
        let mut out = text::script_header(&self.file);
        for item in &self.content {
            out.push_str(&item.render(ctx)?);
        }
        out.push_str(&text::script_footer(&self.file));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_paths() {
        assert!(is_safe_relative("001-roles.sql"));
        assert!(is_safe_relative("builders/./schemas.sql"));
        assert!(!is_safe_relative("../escape.sql"));
        assert!(!is_safe_relative("/etc/passwd"));
        assert!(!is_safe_relative(""));
    }

    #[test]
    fn test_copy_spec_options() {
        let spec: CopySpec = serde_yaml::from_str(
            "table: Table::municipio\npath: /data/m.csv\nnull: ''\ncsv: false\ndirection: to",
        )
        .unwrap();
        let options = spec.into_options();

        assert_eq!(options.direction, CopyDirection::To);
        assert_eq!(options.null, None);
        assert!(!options.csv);
        assert_eq!(options.delimiter.as_deref(), Some("|"));
    }
}
