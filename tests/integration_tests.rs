//! Integration tests for the refmark CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const FIXTURE: &str = r#"
projects:
  - id: 1
    handle: acme/web
    name: Web
    milestones:
      - { id: 10, iid: 5, title: Beta }
      - { id: 11, iid: 6, title: GA, state: closed, due_date: 2024-06-30 }
  - id: 2
    handle: other-team/proj
    milestones:
      - { id: 20, iid: 7, title: Alpha }
"#;

/// Helper to get a refmark command isolated from the caller's environment
fn refmark(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("refmark").unwrap();
    cmd.current_dir(tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join("xdg"))
        .env_remove("REFMARK_STORE")
        .env_remove("REFMARK_PROJECT")
        .env_remove("REFMARK_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to write the YAML fixture store into a temp directory
fn setup_fixture() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("store.yaml");
    fs::write(&path, FIXTURE).unwrap();
    (tmp, path)
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    refmark(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Milestone reference filter"))
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("store"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    refmark(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("refmark"));
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    refmark(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("refmark"));
}

#[test]
fn test_completions_zsh() {
    let tmp = TempDir::new().unwrap();
    refmark(&tmp)
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef refmark"));
}

// ============================================================================
// Render Tests
// ============================================================================

#[test]
fn test_render_links_resolved_references() {
    let (tmp, store) = setup_fixture();
    refmark(&tmp)
        .args(["render", "--project", "acme/web", "--base-url", "https://git.example.com"])
        .arg("--store")
        .arg(&store)
        .write_stdin("Ship %5 then other-team/proj%7.")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"href="https://git.example.com/acme/web/-/milestones/5""#,
        ))
        .stdout(predicate::str::contains(
            r#"href="https://git.example.com/other-team/proj/-/milestones/7""#,
        ))
        .stdout(predicate::str::contains(r#"title="Milestone: Alpha""#))
        .stdout(predicate::str::starts_with("Ship <a "));
}

#[test]
fn test_render_leaves_unresolved_references() {
    let (tmp, store) = setup_fixture();
    refmark(&tmp)
        .args(["render", "--project", "acme/web", "--only-path"])
        .arg("--store")
        .arg(&store)
        .write_stdin("nobody/here%5 and %99 and %abc")
        .assert()
        .success()
        .stdout("nobody/here%5 and %99 and %abc");
}

#[test]
fn test_render_custom_template_from_file_argument() {
    let (tmp, store) = setup_fixture();
    let doc = tmp.path().join("notes.md");
    fs::write(&doc, "Done: %6\n").unwrap();

    refmark(&tmp)
        .args(["render", "--project", "acme/web", "--template", "[{{ milestone.title }} ({{ milestone.state }})]"])
        .arg("--store")
        .arg(&store)
        .arg(&doc)
        .assert()
        .success()
        .stdout("Done: [GA (closed)]\n");
}

#[test]
fn test_render_output_file() {
    let (tmp, store) = setup_fixture();
    let out = tmp.path().join("out.html");

    refmark(&tmp)
        .args(["render", "--project", "acme/web", "--only-path", "-o"])
        .arg(&out)
        .arg("--store")
        .arg(&store)
        .write_stdin("%5 %5 %404")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 of 3 references linked"));

    let html = fs::read_to_string(&out).unwrap();
    assert_eq!(html.matches(r#"href="/acme/web/-/milestones/5""#).count(), 2);
    assert!(html.ends_with(" %404"));
}

#[test]
fn test_render_is_stable_when_rerun() {
    let (tmp, store) = setup_fixture();
    let first = refmark(&tmp)
        .args(["render", "--project", "acme/web"])
        .arg("--store")
        .arg(&store)
        .write_stdin("See %5.")
        .output()
        .unwrap();
    assert!(first.status.success());

    refmark(&tmp)
        .args(["render", "--project", "acme/web"])
        .arg("--store")
        .arg(&store)
        .write_stdin(first.stdout.clone())
        .assert()
        .success()
        .stdout(String::from_utf8(first.stdout).unwrap());
}

#[test]
fn test_render_uses_workspace_config() {
    let (tmp, _) = setup_fixture();
    fs::create_dir_all(tmp.path().join(".refmark")).unwrap();
    fs::write(
        tmp.path().join(".refmark/config.yaml"),
        "store: store.yaml\nproject: other-team/proj\nbase_url: https://code.example.org/\n",
    )
    .unwrap();

    refmark(&tmp)
        .arg("render")
        .write_stdin("%7")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "https://code.example.org/other-team/proj/-/milestones/7",
        ));
}

#[test]
fn test_render_unknown_current_project_fails() {
    let (tmp, store) = setup_fixture();
    refmark(&tmp)
        .args(["render", "--project", "acme/nope"])
        .arg("--store")
        .arg(&store)
        .write_stdin("%5")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown project 'acme/nope'"));
}

#[test]
fn test_render_without_store_fails() {
    let tmp = TempDir::new().unwrap();
    refmark(&tmp)
        .args(["render", "--project", "acme/web"])
        .write_stdin("%5")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no store configured"));
}

#[test]
fn test_render_bad_template_fails() {
    let (tmp, store) = setup_fixture();
    refmark(&tmp)
        .args(["render", "--project", "acme/web", "--template", "{{ missing_var }}"])
        .arg("--store")
        .arg(&store)
        .write_stdin("%5")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid reference template"));
}

#[test]
fn test_render_broken_fixture_reports_location() {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("store.yaml");
    fs::write(&store, "projects:\n  - id: [oops\n").unwrap();

    refmark(&tmp)
        .args(["render", "--project", "acme/web"])
        .arg("--store")
        .arg(&store)
        .write_stdin("%5")
        .assert()
        .failure()
        .stderr(predicate::str::contains("YAML error"));
}

// ============================================================================
// Refs Tests
// ============================================================================

#[test]
fn test_refs_tsv_in_first_seen_order() {
    let (tmp, store) = setup_fixture();
    refmark(&tmp)
        .args(["refs", "--project", "acme/web"])
        .arg("--store")
        .arg(&store)
        .write_stdin("other-team/proj%7, %5, acme/web%5, %6, %12")
        .assert()
        .success()
        .stdout(
            "REF\tTITLE\tSTATE\tDUE\n\
             other-team/proj%7\tAlpha\tactive\t\n\
             acme/web%5\tBeta\tactive\t\n\
             acme/web%6\tGA\tclosed\t2024-06-30\n",
        );
}

#[test]
fn test_refs_json() {
    let (tmp, store) = setup_fixture();
    let output = refmark(&tmp)
        .args(["refs", "--project", "acme/web", "-f", "json"])
        .arg("--store")
        .arg(&store)
        .write_stdin("%6")
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 1);
    assert_eq!(parsed[0]["reference"], "acme/web%6");
    assert_eq!(parsed[0]["due_date"], "2024-06-30");
}

#[test]
fn test_refs_id_format() {
    let (tmp, store) = setup_fixture();
    refmark(&tmp)
        .args(["refs", "--project", "acme/web", "-f", "id"])
        .arg("--store")
        .arg(&store)
        .write_stdin("%6 %5 %6")
        .assert()
        .success()
        .stdout("acme/web%6\nacme/web%5\n");
}

// ============================================================================
// Store Tests
// ============================================================================

#[test]
fn test_store_workflow() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("refs.db");

    refmark(&tmp)
        .args(["store", "init", "--store"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Store ready"));

    refmark(&tmp)
        .args(["store", "add-project", "acme/web", "--name", "Web", "--store"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Added project acme/web"));

    refmark(&tmp)
        .args(["store", "add-milestone", "acme/web", "3", "Preview", "--due", "2024-05-01", "--store"])
        .arg(&db)
        .assert()
        .success();

    refmark(&tmp)
        .args(["store", "list", "--project", "acme/web", "-f", "tsv", "--store"])
        .arg(&db)
        .assert()
        .success()
        .stdout("IID\tTITLE\tSTATE\tDUE\n3\tPreview\tactive\t2024-05-01\n");

    // Default format matches `refs`: tab-separated
    refmark(&tmp)
        .args(["store", "list", "--project", "acme/web", "--store"])
        .arg(&db)
        .assert()
        .success()
        .stdout("IID\tTITLE\tSTATE\tDUE\n3\tPreview\tactive\t2024-05-01\n");

    refmark(&tmp)
        .args(["render", "--project", "acme/web", "--template", "<{{ url | safe }}>", "--only-path", "--store"])
        .arg(&db)
        .write_stdin("%3")
        .assert()
        .success()
        .stdout("</acme/web/-/milestones/3>");
}

#[test]
fn test_store_add_project_rejects_single_segment() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("refs.db");

    refmark(&tmp)
        .args(["store", "add-project", "lonely", "--store"])
        .arg(&db)
        .assert()
        .failure();
}

#[test]
fn test_store_add_project_duplicate_fails() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("refs.db");

    for expect_ok in [true, false] {
        let assert = refmark(&tmp)
            .args(["store", "add-project", "acme/web", "--store"])
            .arg(&db)
            .assert();
        if expect_ok {
            assert.success();
        } else {
            assert
                .failure()
                .stderr(predicate::str::contains("already exists"));
        }
    }
}

#[test]
fn test_store_import_yaml_then_render() {
    let (tmp, fixture) = setup_fixture();
    let db = tmp.path().join("refs.db");

    refmark(&tmp)
        .args(["store", "import"])
        .arg(&fixture)
        .arg("--store")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 projects and 3 milestones"));

    refmark(&tmp)
        .args(["store", "list", "-f", "id", "--store"])
        .arg(&db)
        .assert()
        .success()
        .stdout("acme/web\nother-team/proj\n");

    refmark(&tmp)
        .args(["refs", "--project", "other-team/proj", "-f", "id", "--store"])
        .arg(&db)
        .write_stdin("%7 acme/web%6")
        .assert()
        .success()
        .stdout("other-team/proj%7\nacme/web%6\n");
}

#[test]
fn test_store_import_csv() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("refs.db");
    let csv = tmp.path().join("milestones.csv");
    fs::write(&csv, "project,iid,title,state\nacme/web,1,Kickoff,closed\nacme/web,2,Beta,\n").unwrap();

    refmark(&tmp)
        .args(["store", "import", "--create-projects"])
        .arg(&csv)
        .arg("--store")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 milestones"))
        .stdout(predicate::str::contains("Projects created: 1"));

    refmark(&tmp)
        .args(["store", "list", "--project", "acme/web", "-f", "id", "--store"])
        .arg(&db)
        .assert()
        .success()
        .stdout("acme/web%1\nacme/web%2\n");
}

#[test]
fn test_store_rejects_yaml_fixture() {
    let (tmp, fixture) = setup_fixture();
    refmark(&tmp)
        .args(["store", "list", "--store"])
        .arg(&fixture)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a SQLite store"));
}
