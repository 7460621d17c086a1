mod common;

use apogee::catalog::{expand, marks, WITH_KEY};
use apogee::commands::execute_expand;
use apogee::{expand_catalog, ApogeeError, CatalogNode};
use common::{fixtures, TestEnvironment};
use indoc::indoc;
use serde_yaml::{Mapping, Value};

fn yaml(text: &str) -> CatalogNode {
    serde_yaml::from_str(text).unwrap()
}

#[test]
fn test_two_tag_table_expands_to_two_siblings() {
    let catalog = yaml(indoc! {"
        - id: Table::t_#tag
          name: t_#tag
          with:
            - tag: a
            - tag: b
    "});

    let expanded = expand(catalog).unwrap();
    let items = expanded.as_sequence().unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], Value::String("Table::ta".into()));
    assert_eq!(items[1]["id"], Value::String("Table::tb".into()));
    for item in items {
        assert!(item.get(WITH_KEY).is_none());
    }
}

#[test]
fn test_n_entries_give_n_siblings() {
    for n in [0usize, 1, 3, 7] {
        let entries: Vec<Value> = (0..n)
            .map(|i| {
                let mut entry = Mapping::new();
                entry.insert("n".into(), Value::Number(i.into()));
                Value::Mapping(entry)
            })
            .collect();

        let mut template = Mapping::new();
        template.insert("id".into(), "Role::r_#n".into());
        template.insert(WITH_KEY.into(), Value::Sequence(entries));

        let expanded = expand(Value::Sequence(vec![Value::Mapping(template)])).unwrap();
        let items = expanded.as_sequence().unwrap();

        assert_eq!(items.len(), n);
        assert!(items.iter().all(|i| i.get(WITH_KEY).is_none()));
    }
}

#[test]
fn test_expansion_is_idempotent() {
    let once = expand(yaml(fixtures::catalogs::CADASTRE)).unwrap();
    let twice = expand(once.clone()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_style_a_leaves_unknown_keys() {
    let mut config = Mapping::new();
    config.insert("test_municipios".into(), "'41078'".into());

    let mut node = Value::String("_@test_municipios_@".into());
    marks::substitute_permissive(&mut node, &config).unwrap();
    assert_eq!(node, Value::String("'41078'".into()));

    let mut node = Value::String("_@missing_@".into());
    marks::substitute_permissive(&mut node, &config).unwrap();
    assert_eq!(node, Value::String("_@missing_@".into()));
}

#[test]
fn test_style_b_missing_key_is_fatal() {
    let catalog = yaml(indoc! {"
        - id: Table::t_#tag
          name: t_{tag}_x
          with:
            - tag: a
            - size: 1
    "});

    assert!(matches!(
        expand(catalog),
        Err(ApogeeError::MissingSubstitutionKey { ref key, .. }) if key == "tag"
    ));
}

#[test]
fn test_expand_command_prints_expanded_catalog() {
    let env = TestEnvironment::with_catalog(fixtures::catalogs::CADASTRE);

    let result = execute_expand(&env.catalog_path).unwrap();

    assert!(result.yaml.contains("id: Table::grid250"));
    assert!(result.yaml.contains("name: grid500_m"));
    assert!(!result.yaml.contains("with:"));
    // Style A marks are target specific and survive expansion
    assert!(result.yaml.contains("_@srid_@"));
    assert_eq!(result.catalog, expand_catalog(&env.catalog_path).unwrap());
}

#[test]
fn test_missing_catalog_file() {
    let env = TestEnvironment::new();
    assert!(matches!(
        expand_catalog(&env.catalog_path),
        Err(ApogeeError::FileNotFound(_))
    ));
}

#[test]
fn test_malformed_catalog_file() {
    let env = TestEnvironment::with_catalog("- id: Role::a\n  name: [unclosed\n");
    assert!(matches!(
        expand_catalog(&env.catalog_path),
        Err(ApogeeError::CatalogParse { .. })
    ));
}
