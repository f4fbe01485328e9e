//! Package: bundle an artifact with its full reference closure

#![allow(clippy::result_large_err)]

use std::collections::HashSet;
use std::str::FromStr;

use crate::batch::{BatchBuilder, BatchType, TransactionBatch};
use crate::errors::{ExError, KnowlexError};
use crate::model::{Artifact, CanonicalRef, Reference};
use crate::repository::ArtifactRepository;
use crate::resolver::CanonicalResolver;
use crate::traversal::ClosureWalker;

/// Priority stamped on packaged terminology without an author-assigned one
pub const DEFAULT_PRIORITY: &str = "routine";

/// Include vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncludeKind {
    All,
    /// The root artifact alone
    Artifact,
    Canonical,
    Knowledge,
    Terminology,
    Conformance,
    Extensions,
    Profiles,
    Tests,
    Examples,
}

impl IncludeKind {
    fn admits(&self, artifact: &Artifact, is_root: bool) -> bool {
        match self {
            IncludeKind::All => true,
            IncludeKind::Artifact => is_root,
            IncludeKind::Canonical => artifact.kind.is_canonical(),
            IncludeKind::Knowledge => artifact.kind.is_knowledge(),
            IncludeKind::Terminology => artifact.kind.is_terminology(),
            IncludeKind::Conformance => artifact.kind.is_conformance(),
            IncludeKind::Extensions => artifact.kind == crate::model::ArtifactKind::Extension,
            IncludeKind::Profiles => artifact.kind == crate::model::ArtifactKind::Profile,
            IncludeKind::Tests => artifact.is_test_case(),
            IncludeKind::Examples => artifact.is_example(),
        }
    }
}

impl FromStr for IncludeKind {
    type Err = KnowlexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(IncludeKind::All),
            "artifact" => Ok(IncludeKind::Artifact),
            "canonical" => Ok(IncludeKind::Canonical),
            "knowledge" => Ok(IncludeKind::Knowledge),
            "terminology" => Ok(IncludeKind::Terminology),
            "conformance" => Ok(IncludeKind::Conformance),
            "extensions" => Ok(IncludeKind::Extensions),
            "profiles" => Ok(IncludeKind::Profiles),
            "tests" => Ok(IncludeKind::Tests),
            "examples" => Ok(IncludeKind::Examples),
            other => Err(KnowlexError::UnknownParameterValue {
                parameter: "include".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Parameters of a package request
///
/// Empty lists mean "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageRequest {
    pub id: String,
    pub capability: Vec<String>,
    pub include: Vec<IncludeKind>,
    /// Fills in a missing version
    pub canonical_version: Vec<CanonicalRef>,
    /// Fails when the packaged version differs
    pub check_canonical_version: Vec<CanonicalRef>,
    /// Overrides the packaged version
    pub force_canonical_version: Vec<CanonicalRef>,
    pub count: Option<i64>,
    pub offset: Option<usize>,
    pub content_endpoint: Option<String>,
    pub terminology_endpoint: Option<String>,
    pub package_only: Option<bool>,
    /// Falls back to `DEFAULT_PRIORITY`
    pub default_priority: Option<String>,
}

/// Build the package bundle for `request.id`
///
/// The bundle type is decided before paging: `count == 0` gives an empty
/// searchset carrying the total, an offset or a short count gives a
/// collection without write intent, anything else a transaction of
/// conditional creates.
///
/// # Errors
///
/// `NotImplemented` for endpoints or `package_only`, `InvalidArgument` for a
/// negative count, `NotFound` for the root, `PreconditionFailed` for
/// capability or version-check failures.
pub fn package<R: ArtifactRepository + ?Sized>(
    repo: &R,
    request: &PackageRequest,
) -> Result<TransactionBatch, ExError> {
    if request.content_endpoint.is_some() || request.terminology_endpoint.is_some() {
        return Err(KnowlexError::NotImplemented {
            feature: "custom content and terminology endpoints".to_string(),
        }
        .into());
    }
    if request.package_only.is_some() {
        return Err(KnowlexError::NotImplemented {
            feature: "packageOnly".to_string(),
        }
        .into());
    }
    if let Some(count) = request.count {
        if count < 0 {
            return Err(KnowlexError::NegativeCount { count }.into());
        }
    }

    let resolver = CanonicalResolver::new(repo);
    let root = resolver.read_required(&request.id)?;
    let root_id = root.id.clone();
    let root_dependencies: Vec<Reference> = root.dependencies().cloned().collect();

    let prepare = |artifact: &mut Artifact| -> Result<(), ExError> {
        check_capability(artifact, &request.capability)?;
        apply_canonical_versions(artifact, request)?;
        Ok(())
    };

    let root_only = request.include == [IncludeKind::Artifact];
    let packaged = if root_only {
        let mut root = root;
        prepare(&mut root)?;
        vec![root]
    } else {
        let walked = ClosureWalker::full(repo).walk(root, prepare)?;
        let mut seen = HashSet::new();
        walked
            .into_iter()
            .filter(|a| seen.insert(a.canonical().key()))
            .filter(|a| is_included(a, a.id == root_id, &request.include))
            .collect()
    };

    let total = packaged.len();
    let offset = request.offset.unwrap_or(0);
    let count = request.count.map(|c| c as usize);

    let batch_type = match count {
        Some(0) => BatchType::Searchset,
        _ if offset > 0 || count.is_some_and(|c| c < total) => BatchType::Collection,
        _ => BatchType::Transaction,
    };

    let default_priority = request
        .default_priority
        .clone()
        .unwrap_or_else(|| DEFAULT_PRIORITY.to_string());

    let mut builder = BatchBuilder::new();
    for mut artifact in packaged
        .into_iter()
        .skip(offset)
        .take(count.unwrap_or(usize::MAX))
    {
        if artifact.kind.is_terminology() {
            let priority = root_dependencies
                .iter()
                .filter(|r| r.target.designates(&artifact.url, artifact.version.as_deref()))
                .find_map(|r| r.priority.clone())
                .unwrap_or_else(|| default_priority.clone());
            artifact.set_priority(priority);
        }
        builder = builder.create_if_none_exist(artifact);
    }

    let mut batch = builder.build(batch_type);
    match batch_type {
        BatchType::Searchset => batch.total = Some(total),
        BatchType::Collection => batch.strip_requests(),
        BatchType::Transaction => {}
    }
    Ok(batch)
}

fn is_included(artifact: &Artifact, is_root: bool, include: &[IncludeKind]) -> bool {
    include.is_empty() || include.iter().any(|kind| kind.admits(artifact, is_root))
}

fn check_capability(artifact: &Artifact, allowed: &[String]) -> Result<(), ExError> {
    if allowed.is_empty() {
        return Ok(());
    }
    let declared = &artifact.extensions.capabilities;
    if declared.is_empty() {
        return Err(KnowlexError::MissingCapability {
            url: artifact.url.clone(),
        }
        .into());
    }
    if declared.iter().any(|c| !allowed.contains(c)) {
        return Err(KnowlexError::UnsupportedCapability {
            url: artifact.url.clone(),
            allowed: allowed.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Apply the first canonical list naming this url, in precedence
/// check > force > default
fn apply_canonical_versions(artifact: &mut Artifact, request: &PackageRequest) -> Result<(), ExError> {
    let version_for = |list: &[CanonicalRef]| {
        list.iter()
            .find(|c| c.url == artifact.url)
            .and_then(|c| c.version.clone())
    };

    if let Some(expected) = version_for(&request.check_canonical_version) {
        if artifact.version.as_deref() != Some(expected.as_str()) {
            return Err(KnowlexError::CanonicalVersionMismatch {
                url: artifact.url.clone(),
                actual: artifact.version.clone().unwrap_or_default(),
                expected,
            }
            .into());
        }
        return Ok(());
    }
    if let Some(forced) = version_for(&request.force_canonical_version) {
        artifact.version = Some(forced);
        return Ok(());
    }
    if artifact.version.is_none() {
        if let Some(default) = version_for(&request.canonical_version) {
            artifact.version = Some(default);
        }
    }
    Ok(())
}
