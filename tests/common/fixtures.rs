use indoc::indoc;

/// Catalog documents
pub mod catalogs {
    use super::*;

    /// Role, group, extension, database, a `with`-expanded pair of grid
    /// tables in one schema and two scripts
    pub const CADASTRE: &str = indoc! {r#"
        - id: Role::admin
          name: admin
          password: _@admin_password_@
          comment: Database administrator

        - id: Group::readers
          name: readers

        - id: Extension::postgis
          name: postgis

        - id: Database::cadastre
          name: _@db_name_@
          owner: Role::admin
          extensions: Extension::postgis
          permissions:
            - role: Group::readers
              action: grant
              privileges: connect

        - id: Table::grid_#size
          name: grid_#size_#_m
          comment: Grid of _#size_# metres
          columns:
            - {name: gid, type: integer}
            - {name: geom, type: "geometry(Polygon, _@srid_@)"}
          keys: gid
          with:
            - size: 250
            - size: 500

        - id: Schema::context
          name: context
          owner: Role::admin
          tables: [Table::grid250, Table::grid500]
          permissions:
            - role: Group::readers
              action: grant
              privileges: usage

        - id: Script::setup
          name: setup
          content:
            - object: Role::admin
              action: full_create
            - object: Database::cadastre
              action: full_create
            - object: Schema::context
              action: full_create
              block_comment: Context schema

        - id: Script::teardown
          name: teardown
          file: maintenance/teardown.sql
          content:
            - object: Schema::context
              action: drop
              cascade: true
            - object: Database::cadastre
              action: drop
            - family: Role
              action: drop
    "#};

    /// Minimal role and database pair
    pub const OWNER: &str = indoc! {r#"
        - id: Role::admin
          name: admin
        - id: Database::db1
          name: db1
          owner: Role::admin
        - id: Script::create
          name: create
          content:
            - object: Database::db1
              action: full_create
    "#};
}

/// Substitution documents
pub mod substitutions {
    use super::*;

    pub const TWO_TARGETS: &str = indoc! {r#"
        globals:
          srid: 25830
          admin_password: secret
        targets:
          dev:
            db_name: cadastre_dev
          prod:
            db_name: cadastre
            admin_password: "s3cr'et"
    "#};
}
