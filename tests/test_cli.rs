use indoc::indoc;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn apogee(dir: &TempDir, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_apogee"))
        .args(args)
        .current_dir(dir.path())
        .env("NO_COLOR", "1")
        .output()
        .expect("run apogee")
}

#[test]
fn test_init_ignores_malformed_project_config() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("apogee.toml"), "catalog = [unclosed\n").unwrap();

    let init = apogee(&dir, &["init"]);
    assert!(init.status.success(), "{}", String::from_utf8_lossy(&init.stderr));
    assert!(dir.path().join("apogee.toml.example").exists());

    let check = apogee(&dir, &["check"]);
    assert!(!check.status.success());
    assert!(String::from_utf8_lossy(&check.stderr).contains("apogee.toml"));
}

#[test]
fn test_build_from_project_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("catalog.yml"),
        indoc! {"
            - id: Role::admin
              name: admin
            - id: Script::roles
              name: roles
              content:
                - object: Role::admin
                  action: create
        "},
    )
    .unwrap();

    let build = apogee(&dir, &["build"]);
    assert!(build.status.success(), "{}", String::from_utf8_lossy(&build.stderr));

    let roles = fs::read_to_string(dir.path().join("output/default/roles.sql")).unwrap();
    assert!(roles.contains("create role admin with login inherit;"));
}
