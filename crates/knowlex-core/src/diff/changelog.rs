//! Changelog flattening of a diff tree.

#![allow(clippy::result_large_err)]

use std::collections::HashSet;

use crate::diff::model::{ArtifactDiff, Changelog, ChangelogOperation, ChangelogPage, OpType};
use crate::errors::ExError;
use crate::repository::ArtifactRepository;
use crate::resolver::CanonicalResolver;

/// Flatten `diff` into one page per artifact url, root first
///
/// Remove and replace operations missing a previous value get it from the
/// source artifact's JSON form.
///
/// # Errors
///
/// Store or serialization failures while looking up previous values.
pub fn changelog<R: ArtifactRepository + ?Sized>(
    repo: &R,
    diff: &ArtifactDiff,
) -> Result<Changelog, ExError> {
    let resolver = CanonicalResolver::new(repo);
    let mut pages = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut stack = vec![diff];

    while let Some(node) = stack.pop() {
        if !seen.insert(node.source.url.clone()) {
            continue;
        }

        let needs_source = node
            .operations
            .iter()
            .any(|op| op.op != OpType::Add && op.previous_value.is_none());
        let source_json = if needs_source {
            match resolver.resolve(&node.source)? {
                Some(artifact) => Some(serde_json::to_value(&artifact)?),
                None => None,
            }
        } else {
            None
        };

        let operations = node
            .operations
            .iter()
            .map(|op| {
                let previous_value = match (&op.previous_value, op.op) {
                    (Some(v), _) => Some(v.clone()),
                    (None, OpType::Add) => None,
                    (None, _) => source_json
                        .as_ref()
                        .and_then(|json| json.pointer(&op.path))
                        .cloned(),
                };
                ChangelogOperation {
                    op: op.op,
                    path: dotted_path(&op.path),
                    previous_value,
                    new_value: op.new_value.clone(),
                }
            })
            .collect();

        pages.push(ChangelogPage {
            url: node.source.url.clone(),
            old_version: node.source.version.clone(),
            new_version: node.target.version.clone(),
            kind: node.kind,
            operations,
        });

        stack.extend(node.children.iter().rev());
    }

    Ok(Changelog { pages })
}

/// `/a/b/0/c` -> `a.b[0].c`
pub fn dotted_path(pointer: &str) -> String {
    let mut out = String::new();
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            out.push('[');
            out.push_str(&segment);
            out.push(']');
        } else {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(&segment);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::engine::artifact_diff;
    use crate::diff::model::DiffOperation;
    use crate::diff::primitive::JsonStructuralDiff;
    use crate::model::{Artifact, ArtifactKind, CanonicalRef, Reference, Status};
    use crate::repository::MemoryRepository;
    use serde_json::json;

    #[test]
    fn test_dotted_path() {
        assert_eq!(dotted_path("/references/0/target"), "references[0].target");
        assert_eq!(dotted_path("/content/a~1b/2"), "content.a/b[2]");
        assert_eq!(dotted_path("/title"), "title");
        assert_eq!(dotted_path(""), "");
    }

    fn pair(name: &str, title_v1: &str, title_v2: &str, refs: &[&str]) -> [Artifact; 2] {
        let make = |version: &str, title: &str| {
            let mut a = Artifact::new(
                format!("{}-{}", name, version),
                format!("http://example.org/{}", name),
                ArtifactKind::Library,
            )
            .with_version(version)
            .with_status(Status::Active);
            a.title = Some(title.to_string());
            a.references = refs
                .iter()
                .map(|r| {
                    Reference::component(CanonicalRef::versioned(
                        format!("http://example.org/{}", r),
                        version,
                    ))
                })
                .collect();
            a
        };
        [make("1.0.0", title_v1), make("2.0.0", title_v2)]
    }

    #[test]
    fn test_pages_per_url_root_first() {
        let mut all = Vec::new();
        all.extend(pair("root", "Root", "Root v2", &["child"]));
        all.extend(pair("child", "Child", "Child v2", &[]));
        let repo = MemoryRepository::with_artifacts(all).unwrap();

        let tree = artifact_diff(&repo, &JsonStructuralDiff::default(), "root-1.0.0", "root-2.0.0")
            .unwrap();
        let log = changelog(&repo, &tree).unwrap();

        let urls: Vec<_> = log.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["http://example.org/root", "http://example.org/child"]
        );

        let root = &log.pages[0];
        assert_eq!(root.old_version.as_deref(), Some("1.0.0"));
        assert_eq!(root.new_version.as_deref(), Some("2.0.0"));
        let title = root.operations.iter().find(|o| o.path == "title").unwrap();
        assert_eq!(title.previous_value, Some(json!("Root")));
        assert!(root
            .operations
            .iter()
            .any(|o| o.path == "references[0].target"));
    }

    #[test]
    fn test_child_pages_follow_pairing_order() {
        let mut all = Vec::new();
        all.extend(pair("root", "Root", "Root v2", &["b", "a"]));
        all.extend(pair("a", "A", "A v2", &["z"]));
        all.extend(pair("b", "B", "B v2", &[]));
        all.extend(pair("z", "Z", "Z v2", &[]));
        let repo = MemoryRepository::with_artifacts(all).unwrap();

        let tree = artifact_diff(&repo, &JsonStructuralDiff::default(), "root-1.0.0", "root-2.0.0")
            .unwrap();
        let log = changelog(&repo, &tree).unwrap();

        let names: Vec<_> = log
            .pages
            .iter()
            .map(|p| p.url.trim_start_matches("http://example.org/"))
            .collect();
        assert_eq!(names, vec!["root", "a", "z", "b"]);
    }

    #[test]
    fn test_previous_value_filled_from_source() {
        let [v1, v2] = pair("lib", "Old", "New", &[]);
        let repo = MemoryRepository::with_artifacts([v1.clone(), v2.clone()]).unwrap();

        let tree = ArtifactDiff {
            source: v1.canonical(),
            target: v2.canonical(),
            kind: ArtifactKind::Library,
            operations: vec![DiffOperation {
                op: OpType::Replace,
                path: "/title".to_string(),
                previous_value: None,
                new_value: Some(json!("New")),
            }],
            children: Vec::new(),
        };
        let log = changelog(&repo, &tree).unwrap();
        assert_eq!(
            log.pages[0].operations[0].previous_value,
            Some(json!("Old"))
        );
    }
}
