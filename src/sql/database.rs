use serde::Deserialize;

use crate::error::Result;
use crate::registry::Registry;
use crate::sql::objects::{one_or_many, scalar_string, ObjectId, RenderContext};
use crate::sql::role::{render_permissions, GrantTarget, Permission, PermissionSpec, Role};
use crate::sql::text;

#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    pub id: ObjectId,
    pub name: String,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionSpec {
    name: String,
    comment: Option<String>,
}

impl Extension {
    pub fn from_spec(id: ObjectId, spec: ExtensionSpec) -> Self {
        Self {
            id,
            name: spec.name,
            comment: spec.comment,
        }
    }

    pub fn create(&self) -> String {
        format!("create extension {};\n\n", self.name)
    }

    pub fn drop(&self) -> String {
        format!("drop extension {};\n\n", self.name)
    }

    pub fn code_comment(&self) -> String {
        self.comment.as_deref().map(text::comment).unwrap_or_default()
    }

    pub fn sql_comment(&self) -> String {
        text::comment_on("extension", &self.name, self.comment.as_deref())
    }

    pub fn full_create(&self) -> String {
        format!("{}{}{}", self.code_comment(), self.create(), self.sql_comment())
    }

    pub fn full_drop(&self) -> String {
        let message = format!("Dropping extension {}", self.name);
        format!("{}{}{}", text::comment(&message), text::echo(&message), self.drop())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    pub id: ObjectId,
    pub name: String,
    pub host: String,
    pub port: String,
    pub comment: Option<String>,
    pub owner: Option<ObjectId>,
    pub permissions: Vec<Permission>,
    pub extensions: Vec<ObjectId>,
    pub tablespace: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSpec {
    name: String,
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port", deserialize_with = "scalar_string")]
    port: String,
    comment: Option<String>,
    owner: Option<ObjectId>,
    #[serde(default, deserialize_with = "one_or_many")]
    permissions: Vec<PermissionSpec>,
    #[serde(default, deserialize_with = "one_or_many")]
    extensions: Vec<ObjectId>,
    tablespace: Option<String>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> String {
    "5432".to_string()
}

impl Database {
    pub fn from_spec(id: ObjectId, spec: DatabaseSpec, registry: &Registry) -> Result<Self> {
        if let Some(owner) = &spec.owner {
            registry.role(owner)?;
        }
        for extension in &spec.extensions {
            registry.extension(extension)?;
        }
        let permissions = spec
            .permissions
            .into_iter()
            .map(|p| Permission::from_spec(p, registry))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id,
            name: spec.name,
            host: spec.host,
            port: spec.port,
            comment: spec.comment,
            owner: spec.owner,
            permissions,
            extensions: spec.extensions,
            tablespace: spec.tablespace,
        })
    }

    pub fn references(&self) -> Vec<&ObjectId> {
        let mut refs: Vec<&ObjectId> = self.owner.iter().collect();
        refs.extend(self.permissions.iter().map(|p| &p.role));
        refs.extend(self.extensions.iter());
        refs
    }

    /// psql `\c`. With a role, the full `\c db role host port` form.
    pub fn connect(&self, role: Option<&Role>) -> String {
        match role {
            Some(role) => format!(
                "\\c {} {} {} {}\n\n",
                self.name, role.name, self.host, self.port
            ),
            None => format!("\\c {}\n\n", self.name),
        }
    }

    /// `create database`, owned by `owner` when given, else by the catalog owner
    pub fn create(&self, owner: Option<&ObjectId>, ctx: &RenderContext) -> Result<String> {
        let mut out = format!("create database {}", self.name);

        if let Some(owner) = owner.or(self.owner.as_ref()) {
            out.push_str(&format!(" owner {}", ctx.registry.role(owner)?.name));
        }
        if let Some(tablespace) = &self.tablespace {
            out.push_str(&format!(" tablespace {}", tablespace));
        }

        out.push_str(";\n\n");
        Ok(out)
    }

    pub fn drop(&self) -> String {
        format!("drop database {};\n\n", self.name)
    }

    pub fn code_comment(&self) -> String {
        self.comment.as_deref().map(text::comment).unwrap_or_default()
    }

    pub fn sql_comment(&self) -> String {
        text::comment_on("database", &self.name, self.comment.as_deref())
    }

    pub fn create_permissions(&self, ctx: &RenderContext) -> Result<String> {
        render_permissions(&self.permissions, &GrantTarget::Database(&self.name), ctx)
    }

    pub fn create_extensions(&self, ctx: &RenderContext) -> Result<String> {
        self.extensions
            .iter()
            .map(|id| Ok(ctx.registry.extension(id)?.create()))
            .collect()
    }

    pub fn full_create(&self, owner: Option<&ObjectId>, ctx: &RenderContext) -> Result<String> {
        Ok(format!(
            "{}{}{}{}{}{}{}",
            self.code_comment(),
            text::echo(&format!("Creating database {}", self.name)),
            self.create(owner, ctx)?,
            self.sql_comment(),
            self.create_permissions(ctx)?,
            self.connect(None),
            self.create_extensions(ctx)?
        ))
    }

    pub fn full_drop(&self) -> String {
        let message = format!("Dropping database {}", self.name);
        format!("{}{}{}", text::comment(&message), text::echo(&message), self.drop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database() -> Database {
        Database {
            id: ObjectId::parse("Database::db0").unwrap(),
            name: "db0".to_string(),
            host: "localhost".to_string(),
            port: "5432".to_string(),
            comment: None,
            owner: None,
            permissions: Vec::new(),
            extensions: Vec::new(),
            tablespace: None,
        }
    }

    #[test]
    fn test_connect_forms() {
        let db = database();
        assert_eq!(db.connect(None), "\\c db0\n\n");

        let admin = Role {
            id: ObjectId::parse("Role::admin").unwrap(),
            name: "admin".to_string(),
            is_group: false,
            password: None,
            nologin: false,
            inherit: true,
            ingroup: None,
            comment: None,
        };
        assert_eq!(db.connect(Some(&admin)), "\\c db0 admin localhost 5432\n\n");
    }

    #[test]
    fn test_spec_defaults() {
        let spec: DatabaseSpec = serde_yaml::from_str("name: db0\nport: 6543").unwrap();
        assert_eq!(spec.host, "localhost");
        assert_eq!(spec.port, "6543");
        assert!(spec.permissions.is_empty());

        let unknown = serde_yaml::from_str::<DatabaseSpec>("name: db0\ncolour: blue");
        assert!(unknown.is_err());
    }

    #[test]
    fn test_extension_text() {
        let ext = Extension {
            id: ObjectId::parse("Extension::postgis").unwrap(),
            name: "postgis".to_string(),
            comment: Some("Spatial types".to_string()),
        };
        assert_eq!(ext.create(), "create extension postgis;\n\n");
        assert_eq!(
            ext.full_create(),
            "-- Spatial types\n\ncreate extension postgis;\n\n\
             comment on extension postgis is\n'Spatial types';\n\n"
        );
    }
}
