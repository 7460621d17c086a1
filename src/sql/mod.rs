pub mod database;
pub mod objects;
pub mod relation;
pub mod role;
pub mod schema;
pub mod script;
pub mod text;

pub use database::{Database, Extension};
pub use objects::{Action, ActionArgs, DbObject, ObjectId, ObjectKind, OneOrMany, RenderContext};
pub use relation::{Column, Index, Table, View};
pub use role::{GrantTarget, Permission, PermissionAction, Role};
pub use schema::Schema;
pub use script::{Script, ScriptItem};
