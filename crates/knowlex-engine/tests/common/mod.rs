use std::path::PathBuf;

use rusqlite::Connection;
use tempfile::TempDir;

/// Specification owning a rule set that depends on a code list
pub const SEED_YAML: &str = r#"
artifacts:
  - id: spec
    url: http://example.org/spec
    version: 1.0.0
    status: active
    kind: specification
    references:
      - kind: component
        target: http://example.org/rules|1.0.0
        owned: true
  - id: rules
    url: http://example.org/rules
    version: 1.0.0
    status: active
    kind: rule-set
    references:
      - kind: dependency
        target: http://example.org/codes
  - id: codes
    url: http://example.org/codes
    version: 1.0.0
    status: active
    kind: code-list
"#;

/// Migrated store plus a seed file in a fresh temp dir
#[allow(dead_code)]
pub fn setup() -> (TempDir, Connection, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let conn = knowlex_store::db::open_store(dir.path().join("store.db")).unwrap();
    let seed = dir.path().join("seed.yaml");
    std::fs::write(&seed, SEED_YAML).unwrap();
    (dir, conn, seed)
}
