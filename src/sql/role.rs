use serde::Deserialize;

use crate::error::{ApogeeError, Result};
use crate::registry::Registry;
use crate::sql::objects::{flag, one_or_many, ObjectId, RenderContext};
use crate::sql::schema::Schema;
use crate::sql::text;

/// Login role or group role. Groups are roles created without login before
/// any login role so that `in role` clauses can point at them.
#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub id: ObjectId,
    pub name: String,
    pub is_group: bool,
    pub password: Option<String>,
    pub nologin: bool,
    pub inherit: bool,
    pub ingroup: Option<ObjectId>,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleSpec {
    name: String,
    password: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    nologin: bool,
    #[serde(default = "default_inherit", deserialize_with = "flag")]
    inherit: bool,
    #[serde(alias = "inrole")]
    ingroup: Option<ObjectId>,
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSpec {
    name: String,
    #[serde(default = "default_inherit", deserialize_with = "flag")]
    inherit: bool,
    #[serde(alias = "inrole")]
    ingroup: Option<ObjectId>,
    comment: Option<String>,
}

fn default_inherit() -> bool {
    true
}

/// Database level object a privilege applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantTarget<'a> {
    Database(&'a str),
    Schema(&'a str),
}

impl GrantTarget<'_> {
    pub fn keyword(&self) -> &'static str {
        match self {
            GrantTarget::Database(_) => "database",
            GrantTarget::Schema(_) => "schema",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            GrantTarget::Database(n) | GrantTarget::Schema(n) => n,
        }
    }
}

/// Privilege that grants `select` on every table instead of the object itself
const SELECT_ALL_TABLES: &str = "select all tables";

impl Role {
    pub fn from_role_spec(id: ObjectId, spec: RoleSpec, registry: &Registry) -> Result<Self> {
        if let Some(group) = &spec.ingroup {
            registry.role(group)?;
        }

        Ok(Self {
            id,
            name: spec.name,
            is_group: false,
            password: spec.password,
            nologin: spec.nologin,
            inherit: spec.inherit,
            ingroup: spec.ingroup,
            comment: spec.comment,
        })
    }

    pub fn from_group_spec(id: ObjectId, spec: GroupSpec, registry: &Registry) -> Result<Self> {
        if let Some(group) = &spec.ingroup {
            registry.role(group)?;
        }

        Ok(Self {
            id,
            name: spec.name,
            is_group: true,
            password: None,
            nologin: true,
            inherit: spec.inherit,
            ingroup: spec.ingroup,
            comment: spec.comment,
        })
    }

    fn noun(&self) -> &'static str {
        if self.is_group {
            "group"
        } else {
            "role"
        }
    }

    /// Recipient of a grant: groups are addressed as `group <name>`
    fn grantee(&self) -> String {
        if self.is_group {
            format!("group {}", self.name)
        } else {
            self.name.clone()
        }
    }

    pub fn references(&self) -> Vec<&ObjectId> {
        self.ingroup.iter().collect()
    }

    pub fn create(&self, ctx: &RenderContext) -> Result<String> {
        let mut options = vec![if self.nologin || self.is_group {
            "nologin".to_string()
        } else {
            "login".to_string()
        }];

        if self.inherit {
            options.push("inherit".to_string());
        }
        if let Some(group) = &self.ingroup {
            options.push(format!("in role {}", ctx.registry.role(group)?.name));
        }
        if let Some(password) = &self.password {
            options.push(format!("password '{}'", text::quote_literal(password)));
        }

        Ok(format!("create role {} with {};\n\n", self.name, options.join(" ")))
    }

    pub fn drop(&self) -> String {
        format!("drop role {};\n\n", self.name)
    }

    pub fn code_comment(&self) -> String {
        self.comment.as_deref().map(text::comment).unwrap_or_default()
    }

    pub fn sql_comment(&self) -> String {
        text::comment_on("role", &self.name, self.comment.as_deref())
    }

    pub fn full_create(&self, ctx: &RenderContext) -> Result<String> {
        Ok(format!(
            "{}{}{}{}\n",
            self.code_comment(),
            text::echo(&format!("Creating {} {}", self.noun(), self.name)),
            self.create(ctx)?,
            self.sql_comment()
        ))
    }

    pub fn full_drop(&self) -> String {
        let message = format!("Dropping {} {}", self.noun(), self.name);
        format!("{}{}{}", text::comment(&message), text::echo(&message), self.drop())
    }

    /// `alter role ... password`, defaulting to the catalog password
    pub fn alter_password(&self, password: Option<&str>) -> Result<String> {
        let password = password.or(self.password.as_deref()).ok_or_else(|| {
            ApogeeError::MissingArgument {
                action: "alter_password".to_string(),
                argument: "password".to_string(),
            }
        })?;

        Ok(format!(
            "alter role {} password '{}';\n\n",
            self.name,
            text::quote_literal(password)
        ))
    }

    pub fn grant(&self, target: &GrantTarget, privileges: &[String]) -> String {
        let mut out = String::new();
        let mut rest = Vec::new();

        for privilege in privileges {
            if privilege == SELECT_ALL_TABLES {
                out.push_str(&format!(
                    "grant select on all tables in {} {} to {};\n\n",
                    target.keyword(),
                    target.name(),
                    self.grantee()
                ));
            } else {
                rest.push(privilege.as_str());
            }
        }

        if !rest.is_empty() {
            out.push_str(&format!(
                "grant {} on {} {} to {};\n\n",
                rest.join(", "),
                target.keyword(),
                target.name(),
                self.grantee()
            ));
        }

        out
    }

    pub fn revoke(&self, target: &GrantTarget, privileges: &[String]) -> String {
        format!(
            "revoke {} on {} {} from {};\n\n",
            privileges.join(", "),
            target.keyword(),
            target.name(),
            self.name
        )
    }

    pub fn grant_on_all_tables_in_schema(&self, schema: &Schema, privileges: &[String]) -> String {
        format!(
            "grant {} on all tables in schema {} to {};\n\n",
            privileges.join(", "),
            schema.name,
            self.grantee()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    Grant,
    Revoke,
}

/// A grant or revoke attached to a database or schema
#[derive(Debug, Clone, PartialEq)]
pub struct Permission {
    pub role: ObjectId,
    pub action: PermissionAction,
    pub privileges: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionSpec {
    role: ObjectId,
    action: PermissionAction,
    #[serde(deserialize_with = "one_or_many")]
    privileges: Vec<String>,
}

impl Permission {
    pub fn from_spec(spec: PermissionSpec, registry: &Registry) -> Result<Self> {
        registry.role(&spec.role)?;
        Ok(Self {
            role: spec.role,
            action: spec.action,
            privileges: spec.privileges,
        })
    }

    pub fn render(&self, target: &GrantTarget, ctx: &RenderContext) -> Result<String> {
        let role = ctx.registry.role(&self.role)?;
        Ok(match self.action {
            PermissionAction::Grant => role.grant(target, &self.privileges),
            PermissionAction::Revoke => role.revoke(target, &self.privileges),
        })
    }

    pub fn describe(&self) -> String {
        let verb = match self.action {
            PermissionAction::Grant => "grant",
            PermissionAction::Revoke => "revoke",
        };
        format!("{} {} ({})", verb, self.role.local_name(), self.privileges.join(", "))
    }
}

pub fn render_permissions(
    permissions: &[Permission],
    target: &GrantTarget,
    ctx: &RenderContext,
) -> Result<String> {
    permissions.iter().map(|p| p.render(target, ctx)).collect()
}
