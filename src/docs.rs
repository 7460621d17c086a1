//! MkDocs documentation tree for a resolved catalog.

use std::path::Path;

use crate::error::Result;
use crate::registry::Registry;
use crate::sql::{Column, Database, Extension, ObjectId, Permission, Role, Schema, Table, View};
use crate::writer::OutputTree;

const THEME: &str = "readthedocs";

/// Pages of a documentation site, in navigation order
#[derive(Debug)]
pub struct DocSite {
    site_name: String,
    welcome: String,
    nav: Vec<NavEntry>,
    pages: Vec<(String, String)>,
}

#[derive(Debug)]
enum NavEntry {
    Page { title: String, file: String },
    Group { title: String, pages: Vec<(String, String)> },
}

impl DocSite {
    pub fn new(site_name: impl Into<String>, welcome: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            welcome: welcome.into(),
            nav: Vec::new(),
            pages: Vec::new(),
        }
    }

    /// Add a top-level page, or a page of the last group when `grouped`
    pub fn add_page(&mut self, title: &str, content: String, grouped: bool) {
        let file = format!("{}.md", page_file_name(title));

        match self.nav.last_mut() {
            Some(NavEntry::Group { pages, .. }) if grouped => {
                pages.push((title.to_string(), file.clone()))
            }
            _ => self.nav.push(NavEntry::Page {
                title: title.to_string(),
                file: file.clone(),
            }),
        }
        self.pages.push((file, content));
    }

    pub fn add_group(&mut self, title: &str) {
        self.nav.push(NavEntry::Group {
            title: title.to_string(),
            pages: Vec::new(),
        });
    }

    pub fn mkdocs_yml(&self) -> String {
        let mut out = format!(
            "site_name: {}\ntheme: {}\nnav:\n- Home: index.md\n",
            self.site_name, THEME
        );
        for entry in &self.nav {
            match entry {
                NavEntry::Page { title, file } => out.push_str(&format!("- {}: {}\n", title, file)),
                NavEntry::Group { title, pages } => {
                    out.push_str(&format!("- {}:\n", title));
                    for (title, file) in pages {
                        out.push_str(&format!("    - {}: {}\n", title, file));
                    }
                }
            }
        }
        out
    }

    /// Buffer `mkdocs.yml` and the pages below `dir`
    pub fn write_to(&self, tree: &mut OutputTree, dir: &Path) -> Result<()> {
        tree.add(dir.join("mkdocs.yml"), self.mkdocs_yml())?;
        tree.add(dir.join("docs").join("index.md"), self.welcome.clone())?;
        for (file, content) in &self.pages {
            tree.add(dir.join("docs").join(file), content.clone())?;
        }
        Ok(())
    }
}

fn page_file_name(title: &str) -> String {
    title.replace(' ', "-").replace(',', "")
}

/// Document every role, extension, database and schema of the registry
pub fn build_site(registry: &Registry, site_name: &str, target: &str) -> Result<DocSite> {
    let welcome = format!(
        "# {}\n\nDatabase objects generated for target `{}`.\n",
        site_name, target
    );
    let mut site = DocSite::new(site_name, welcome);

    let roles: Vec<&Role> = registry
        .iter()
        .filter_map(|o| o.as_role())
        .collect();
    if !roles.is_empty() {
        let mut page = String::from("# Roles\n\n");
        for role in roles {
            page.push_str(&role_doc(role, registry)?);
        }
        site.add_page("Roles", page, false);
    }

    let extensions: Vec<&Extension> = registry.iter().filter_map(|o| o.as_extension()).collect();
    if !extensions.is_empty() {
        let mut page = String::from("# Extensions\n\n");
        for extension in extensions {
            page.push_str(&format!(
                "__Extension {}:__ {}\n\n",
                extension.name,
                extension.comment.as_deref().unwrap_or("")
            ));
        }
        site.add_page("Extensions", page, false);
    }

    let databases: Vec<&Database> = registry.iter().filter_map(|o| o.as_database()).collect();
    if !databases.is_empty() {
        let mut page = String::from("# Databases\n\n");
        for database in databases {
            page.push_str(&database_doc(database, registry)?);
        }
        site.add_page("Databases", page, false);
    }

    let schemas: Vec<&Schema> = registry.iter().filter_map(|o| o.as_schema()).collect();
    if !schemas.is_empty() {
        site.add_group("Schemas");
        for schema in schemas {
            site.add_page(&format!("Schema {}", schema.name), schema_doc(schema, registry)?, true);
        }
    }

    Ok(site)
}

fn role_name<'a>(registry: &'a Registry, id: Option<&ObjectId>) -> Result<&'a str> {
    match id {
        Some(id) => Ok(registry.role(id)?.name.as_str()),
        None => Ok("-"),
    }
}

fn permissions_doc(permissions: &[Permission]) -> String {
    if permissions.is_empty() {
        "-".to_string()
    } else {
        permissions
            .iter()
            .map(Permission::describe)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn role_doc(role: &Role, registry: &Registry) -> Result<String> {
    Ok(format!(
        "__{} {} ({}{}, in group {}):__ {}\n\n",
        if role.is_group { "Group" } else { "Role" },
        role.name,
        if role.nologin { "nologin" } else { "login" },
        if role.inherit { ", inherit" } else { "" },
        role_name(registry, role.ingroup.as_ref())?,
        role.comment.as_deref().unwrap_or("")
    ))
}

fn database_doc(database: &Database, registry: &Registry) -> Result<String> {
    let extensions = database
        .extensions
        .iter()
        .map(|id| registry.extension(id).map(|e| e.name.as_str()))
        .collect::<Result<Vec<_>>>()?;

    Ok(format!(
        "__Database {} at ({}, {}):__ {}\n\n\
         - owner: {}\n\
         - permissions: {}\n\
         - extensions: {}\n\
         - tablespace: {}\n\n",
        database.name,
        database.host,
        database.port,
        database.comment.as_deref().unwrap_or(""),
        role_name(registry, database.owner.as_ref())?,
        permissions_doc(&database.permissions),
        if extensions.is_empty() { "-".to_string() } else { extensions.join(", ") },
        database.tablespace.as_deref().unwrap_or("-"),
    ))
}

fn schema_doc(schema: &Schema, registry: &Registry) -> Result<String> {
    let mut s = format!(
        "# Schema {}\n\n{}\n\n- owner: {}\n- permissions: {}\n\n",
        schema.name,
        schema.comment.as_deref().unwrap_or(""),
        role_name(registry, schema.owner.as_ref())?,
        permissions_doc(&schema.permissions)
    );

    for id in &schema.tables {
        s.push_str(&table_doc(registry.table(id)?, schema, registry)?);
    }
    for id in &schema.views {
        s.push_str(&view_doc(registry.view(id)?, schema, registry)?);
    }

    Ok(s)
}

fn relation_doc(
    heading: &str,
    comment: Option<&str>,
    owner: &str,
    columns: &[Column],
) -> String {
    let mut s = format!(
        "## {}\n\n{}\n\n- owner: {}\n\n",
        heading,
        comment.unwrap_or(""),
        owner
    );

    if !columns.is_empty() {
        s.push_str("__Columns:__\n\n| Name | Type | Comment |\n| ---- | ---- | ------- |\n");
        for column in columns {
            s.push_str(&format!(
                "| {} | {} | {} |\n",
                column.name,
                column.data_type,
                column.comment.as_deref().unwrap_or("")
            ));
        }
        s.push('\n');
    }
    s
}

fn table_doc(table: &Table, schema: &Schema, registry: &Registry) -> Result<String> {
    let owner = role_name(registry, table.owner.as_ref().or(schema.owner.as_ref()))?;
    Ok(relation_doc(
        &format!("Table {}.{}", schema.name, table.name),
        table.comment.as_deref(),
        owner,
        &table.columns,
    ))
}

fn view_doc(view: &View, schema: &Schema, registry: &Registry) -> Result<String> {
    let owner = role_name(registry, view.owner.as_ref().or(schema.owner.as_ref()))?;
    let kind = if view.materialized { "Materialized view" } else { "View" };
    Ok(relation_doc(
        &format!("{} {}.{}", kind, schema.name, view.name),
        view.comment.as_deref(),
        owner,
        &view.columns,
    ))
}
