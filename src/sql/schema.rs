use serde::Deserialize;

use crate::error::Result;
use crate::registry::Registry;
use crate::sql::objects::{one_or_many, ObjectId, RenderContext};
use crate::sql::role::{render_permissions, GrantTarget, Permission, PermissionSpec};
use crate::sql::text;

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub id: ObjectId,
    pub name: String,
    pub comment: Option<String>,
    pub owner: Option<ObjectId>,
    pub permissions: Vec<Permission>,
    pub tables: Vec<ObjectId>,
    pub views: Vec<ObjectId>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaSpec {
    name: String,
    comment: Option<String>,
    owner: Option<ObjectId>,
    #[serde(default, deserialize_with = "one_or_many")]
    permissions: Vec<PermissionSpec>,
    #[serde(default, deserialize_with = "one_or_many")]
    tables: Vec<ObjectId>,
    #[serde(default, deserialize_with = "one_or_many")]
    views: Vec<ObjectId>,
}

impl Schema {
    pub fn from_spec(id: ObjectId, spec: SchemaSpec, registry: &Registry) -> Result<Self> {
        if let Some(owner) = &spec.owner {
            registry.role(owner)?;
        }
        for table in &spec.tables {
            registry.table(table)?;
        }
        for view in &spec.views {
            registry.view(view)?;
        }
        let permissions = spec
            .permissions
            .into_iter()
            .map(|p| Permission::from_spec(p, registry))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id,
            name: spec.name,
            comment: spec.comment,
            owner: spec.owner,
            permissions,
            tables: spec.tables,
            views: spec.views,
        })
    }

    pub fn references(&self) -> Vec<&ObjectId> {
        let mut refs: Vec<&ObjectId> = self.owner.iter().collect();
        refs.extend(self.permissions.iter().map(|p| &p.role));
        refs.extend(self.tables.iter());
        refs.extend(self.views.iter());
        refs
    }

    pub fn create(&self, owner: Option<&ObjectId>, ctx: &RenderContext) -> Result<String> {
        Ok(match owner.or(self.owner.as_ref()) {
            Some(owner) => format!(
                "create schema {} authorization {};\n\n",
                self.name,
                ctx.registry.role(owner)?.name
            ),
            None => format!("create schema {};\n\n", self.name),
        })
    }

    pub fn drop(&self, cascade: bool) -> String {
        format!(
            "drop schema {}{};\n\n",
            self.name,
            if cascade { " cascade" } else { "" }
        )
    }

    pub fn alter_owner(&self, owner: &ObjectId, ctx: &RenderContext) -> Result<String> {
        Ok(format!(
            "alter schema {} owner to {};\n\n",
            self.name,
            ctx.registry.role(owner)?.name
        ))
    }

    pub fn code_comment(&self) -> String {
        self.comment.as_deref().map(text::comment).unwrap_or_default()
    }

    pub fn sql_comment(&self) -> String {
        text::comment_on("schema", &self.name, self.comment.as_deref())
    }

    pub fn set_permissions(&self, ctx: &RenderContext) -> Result<String> {
        render_permissions(&self.permissions, &GrantTarget::Schema(&self.name), ctx)
    }

    /// Whole schema in one transaction: the schema, its permissions, then the
    /// full create of every listed table and view
    pub fn full_create(
        &self,
        block_comment: Option<&str>,
        echo_comment: Option<&str>,
        ctx: &RenderContext,
    ) -> Result<String> {
        let echo_comment = echo_comment.or(block_comment);
        let mut out = String::new();

        if let Some(c) = block_comment {
            out.push_str(&text::block(c));
        }
        if let Some(c) = echo_comment {
            out.push_str(&text::echo_dash(&format!("Beginning: {}", c)));
        }
        out.push_str(&text::begin());
        out.push_str(&self.code_comment());
        out.push_str(&self.create(None, ctx)?);
        out.push_str(&self.sql_comment());
        out.push_str(&self.set_permissions(ctx)?);
        for id in &self.tables {
            out.push_str(&ctx.registry.table(id)?.full_create(self, ctx)?);
        }
        for id in &self.views {
            out.push_str(&ctx.registry.view(id)?.full_create(self, ctx)?);
        }
        out.push_str(&text::commit());
        out.push_str(&text::footer(echo_comment));

        Ok(out)
    }

    pub fn full_drop(&self, block_comment: Option<&str>, echo_comment: Option<&str>) -> String {
        let echo_comment = echo_comment.or(block_comment);
        let mut out = String::new();

        if let Some(c) = block_comment {
            out.push_str(&text::block(c));
        }
        if let Some(c) = echo_comment {
            out.push_str(&text::echo_dash(&format!("Beginning: {}", c)));
        }
        out.push_str(&text::begin());
        out.push_str(&self.code_comment());
        out.push_str(&self.drop(true));
        out.push_str(&text::commit());
        out.push_str(&text::footer(echo_comment));

        out
    }

    /// Comments of the schema and of all its tables and views
    pub fn full_comment(&self, ctx: &RenderContext) -> Result<String> {
        let mut out = self.code_comment() + &self.sql_comment();

        for id in &self.tables {
            out.push_str(&ctx.registry.table(id)?.sql_comment(self));
        }
        for id in &self.views {
            out.push_str(&ctx.registry.view(id)?.sql_comment(self));
        }

        Ok(out)
    }

    /// Refresh and vacuum every materialized view of the schema
    pub fn full_refresh(&self, ctx: &RenderContext) -> Result<String> {
        let mut out = text::block(&format!("Refresh materialized view for schema {}", self.name));
        out.push_str(&text::echo_dash(&format!(
            "Starting: Refreshing materialized views for schema {}",
            self.name
        )));

        for id in &self.views {
            let view = ctx.registry.view(id)?;
            if view.materialized {
                out.push_str(&text::echo(&format!("Materializing view {}", view.name)));
                out.push_str(&view.refresh(self));
                out.push_str(&view.vacuum(self));
            }
        }

        out.push_str(&text::echo_dash(&format!(
            "End: Refreshing materialized views for schema {}",
            self.name
        )));
        Ok(out)
    }

    pub fn alter_table_owner(
        &self,
        owner: &ObjectId,
        tables: Option<&[ObjectId]>,
        ctx: &RenderContext,
    ) -> Result<String> {
        tables
            .unwrap_or(&self.tables)
            .iter()
            .map(|id| ctx.registry.table(id)?.alter_owner(self, Some(owner), ctx))
            .collect()
    }

    pub fn alter_view_owner(
        &self,
        owner: &ObjectId,
        views: Option<&[ObjectId]>,
        ctx: &RenderContext,
    ) -> Result<String> {
        views
            .unwrap_or(&self.views)
            .iter()
            .map(|id| ctx.registry.view(id)?.alter_owner(self, Some(owner), ctx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema {
            id: ObjectId::parse("Schema::context").unwrap(),
            name: "context".to_string(),
            comment: Some("Context data".to_string()),
            owner: None,
            permissions: Vec::new(),
            tables: Vec::new(),
            views: Vec::new(),
        }
    }

    #[test]
    fn test_drop_cascade() {
        let s = schema();
        assert_eq!(s.drop(false), "drop schema context;\n\n");
        assert_eq!(s.drop(true), "drop schema context cascade;\n\n");
    }

    #[test]
    fn test_full_drop_wraps_transaction() {
        let out = schema().full_drop(Some("Drop context"), None);

        assert!(out.starts_with("/*\n\n  Drop context\n\n*/\n\n"));
        assert!(out.contains("\\echo Beginning: Drop context\n"));
        let begin = out.find("begin;").unwrap();
        let drop = out.find("drop schema context cascade;").unwrap();
        let commit = out.find("commit;").unwrap();
        assert!(begin < drop && drop < commit);
        assert!(out.ends_with("\\echo Ending: Drop context\n\\echo --------------------\n\n"));
    }

    #[test]
    fn test_full_drop_without_comments() {
        assert_eq!(
            schema().full_drop(None, None),
            "begin;\n\n-- Context data\n\ndrop schema context cascade;\n\ncommit;\n\n"
        );
    }
}
