pub mod artifact;
pub mod assessment;
pub mod canonical;
pub mod reference;

pub use artifact::{
    Artifact, ArtifactKind, ArtifactMeta, ContextValue, EffectivePeriod, Endorser, Extensions,
    Status, UsageContext, PRIORITY_CONTEXT_CODE,
};
pub use assessment::{Assessment, AssessmentEntry, AssessmentKind};
pub use canonical::CanonicalRef;
pub use reference::{Reference, ReferenceKind};
