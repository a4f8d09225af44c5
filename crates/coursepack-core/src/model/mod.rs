/// Typed manifest trees for the four packaging specifications.
///
/// One submodule per wire format family. All model types are plain data:
/// `Debug + Clone + PartialEq` with serde derives, immutable once the
/// binding layer returns them. Identifiers are owned by their defining
/// node; every cross-node reference is a string key resolved through the
/// index maps the resolver builds, never a long-lived borrow.
pub mod aicc;
pub mod cmi5;
pub mod scorm;
pub mod sequencing;

pub use aicc::{
    AiccManifest, AssignableUnit, CourseInfo, CourseStructureRow, Descriptor, ObjectiveRelation,
    PrerequisiteRow,
};
pub use cmi5::{Cmi5Au, Cmi5Block, Cmi5Course, Cmi5Manifest, Cmi5Node};
pub use scorm::{
    CompletionThreshold, Dependency, Item, ManifestMetadata, Organization, Organizations,
    Resource, ResourceFile, ScormManifest,
};
pub use sequencing::{
    ConstrainedChoiceConsiderations, ControlMode, DeliveryControls, LimitConditions, Objective,
    ObjectiveMapInfo, Objectives, RandomizationControls, RollupConditionEntry, RollupConditions,
    RollupConsiderations, RollupRule, RollupRules, RuleCondition, RuleConditions, Sequencing,
    SequencingRule, SequencingRules,
};
