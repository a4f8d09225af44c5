/// IMSSS sequencing validation rules (SCORM 2004 manifests only).
///
/// Range violations on measures, weights, and attempt limits are caught
/// during binding (the newtypes reject them and the binder captures the
/// issue); the rules here cover the structural consistency the schema
/// cannot express field-by-field.
use crate::enums::{RollupChildActivitySet, SequencingRuleConditionType};
use crate::model::sequencing::Sequencing;

use super::rules_scorm::ScormContext;
use super::{IssueCode, ValidationIssue, ValidationMode, ValidationResult, ValidationRule};

/// The sequencing rule registry; appended to the SCORM registry for 2004
/// manifests.
pub fn sequencing_rules<'a>() -> Vec<Box<dyn ValidationRule<ScormContext<'a>> + 'a>> {
    vec![
        Box::new(RollupRuleShapeRule),
        Box::new(MeasureConditionThresholdRule),
        Box::new(SecondaryObjectiveIdRule),
    ]
}

/// Walks every materialized sequencing block in the activity tree (plus
/// organization-level blocks), applying `visit`.
fn for_each_sequencing(
    ctx: &ScormContext<'_>,
    mut visit: impl FnMut(&Sequencing, &str),
) {
    for organization in &ctx.manifest.organizations.list {
        if let Some(sequencing) = &organization.sequencing {
            visit(
                sequencing,
                &format!("organization[@identifier='{}']", organization.identifier),
            );
        }
    }
    for node in &ctx.resolution.tree.nodes {
        if let Some(sequencing) = &node.sequencing {
            visit(
                sequencing,
                &format!("item[@identifier='{}']", node.item_identifier),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Rollup rule shape
// ---------------------------------------------------------------------------

/// `atLeastCount` rollup rules need a `minimumCount`; `atLeastPercent`
/// rules need a `minimumPercent`.
pub struct RollupRuleShapeRule;

impl ValidationRule<ScormContext<'_>> for RollupRuleShapeRule {
    fn name(&self) -> &'static str {
        "rollup-rule-shape"
    }

    fn validate(&self, ctx: &ScormContext<'_>, mode: ValidationMode) -> ValidationResult {
        let mut result = ValidationResult::valid();
        for_each_sequencing(ctx, |sequencing, location| {
            let Some(rollup) = sequencing.rollup_rules.as_ref() else {
                return;
            };
            for (index, rule) in rollup.rules.iter().enumerate() {
                let missing = match rule.child_activity_set {
                    RollupChildActivitySet::AtLeastCount => {
                        rule.minimum_count.is_none().then_some("minimumCount")
                    }
                    RollupChildActivitySet::AtLeastPercent => {
                        rule.minimum_percent.is_none().then_some("minimumPercent")
                    }
                    RollupChildActivitySet::All
                    | RollupChildActivitySet::Any
                    | RollupChildActivitySet::None => None,
                };
                if let Some(attribute) = missing {
                    result.push(ValidationIssue::error(
                        mode,
                        IssueCode::Scorm2004InvalidSequencing,
                        format!(
                            "rollup rule #{index} uses {} without @{attribute}",
                            rule.child_activity_set.as_str()
                        ),
                        format!("{location}/imsss:rollupRules/imsss:rollupRule[{index}]"),
                    ));
                }
            }
        });
        result
    }
}

// ---------------------------------------------------------------------------
// Measure-based conditions need thresholds
// ---------------------------------------------------------------------------

/// `objectiveMeasureGreaterThan` / `objectiveMeasureLessThan` conditions
/// are meaningless without a `measureThreshold`.
pub struct MeasureConditionThresholdRule;

impl ValidationRule<ScormContext<'_>> for MeasureConditionThresholdRule {
    fn name(&self) -> &'static str {
        "measure-condition-threshold"
    }

    fn validate(&self, ctx: &ScormContext<'_>, mode: ValidationMode) -> ValidationResult {
        let mut result = ValidationResult::valid();
        for_each_sequencing(ctx, |sequencing, location| {
            let Some(rules) = sequencing.sequencing_rules.as_ref() else {
                return;
            };
            let all_rules = rules
                .pre_condition
                .iter()
                .chain(rules.post_condition.iter())
                .chain(rules.exit_condition.iter());
            for rule in all_rules {
                for condition in &rule.conditions.conditions {
                    let needs_threshold = matches!(
                        condition.condition,
                        SequencingRuleConditionType::ObjectiveMeasureGreaterThan
                            | SequencingRuleConditionType::ObjectiveMeasureLessThan
                    );
                    if needs_threshold && condition.measure_threshold.is_none() {
                        result.push(ValidationIssue::error(
                            mode,
                            IssueCode::Scorm2004InvalidSequencing,
                            format!(
                                "condition \"{}\" has no measureThreshold",
                                condition.condition.as_str()
                            ),
                            format!("{location}/imsss:ruleCondition"),
                        ));
                    }
                }
            }
        });
        result
    }
}

// ---------------------------------------------------------------------------
// Secondary objectives need ids
// ---------------------------------------------------------------------------

/// Secondary `<imsss:objective>` entries must carry an `objectiveID`
/// (only the primary objective may omit it).
pub struct SecondaryObjectiveIdRule;

impl ValidationRule<ScormContext<'_>> for SecondaryObjectiveIdRule {
    fn name(&self) -> &'static str {
        "secondary-objective-id"
    }

    fn validate(&self, ctx: &ScormContext<'_>, mode: ValidationMode) -> ValidationResult {
        let mut result = ValidationResult::valid();
        for_each_sequencing(ctx, |sequencing, location| {
            let Some(objectives) = sequencing.objectives.as_ref() else {
                return;
            };
            for (index, objective) in objectives.list.iter().enumerate() {
                if objective.objective_id.is_none() {
                    result.push(ValidationIssue::error(
                        mode,
                        IssueCode::Scorm2004InvalidSequencing,
                        format!("secondary objective #{index} has no objectiveID"),
                        format!("{location}/imsss:objectives/imsss:objective[{index}]"),
                    ));
                }
            }
        });
        result
    }
}
