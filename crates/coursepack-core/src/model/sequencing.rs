/// The IMS Simple Sequencing (IMSSS) model carried by SCORM 2004 items.
///
/// Field defaults follow the IMSSS information model: boolean attributes
/// default to the values the schema mandates, and the defaults are applied
/// by the binding layer so a default-constructed block equals an empty
/// `<imsss:sequencing>` element. Reusable blocks from the manifest-level
/// sequencing collection are composed *by reference*: a block carries an
/// optional `id_ref` naming a collection entry, and the resolver
/// materializes the referenced content on access through the collection
/// arena — blocks never own other blocks.
use serde::{Deserialize, Serialize};

use crate::enums::{
    ConditionCombination, ConditionOperator, RandomizationTiming, RollupActionType,
    RollupChildActivitySet, RollupRequired, RuleActionType, SequencingRuleConditionType,
};
use crate::newtypes::{Iso8601Duration, Measure, ObjectiveWeight};

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_true(b: &bool) -> bool {
    *b
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Sequencing
// ---------------------------------------------------------------------------

/// One `<imsss:sequencing>` block, inline on an item/organization or
/// hosted in the manifest's sequencing collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequencing {
    /// Collection entry id (`ID` attribute); present on reusable blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Reference into the sequencing collection (`IDRef` attribute).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_ref: Option<String>,

    /// `<imsss:controlMode>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_mode: Option<ControlMode>,

    /// `<imsss:sequencingRules>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequencing_rules: Option<SequencingRules>,

    /// `<imsss:limitConditions>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_conditions: Option<LimitConditions>,

    /// `<imsss:rollupRules>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollup_rules: Option<RollupRules>,

    /// `<imsss:objectives>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objectives: Option<Objectives>,

    /// `<imsss:randomizationControls>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub randomization_controls: Option<RandomizationControls>,

    /// `<imsss:deliveryControls>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_controls: Option<DeliveryControls>,

    /// `<adlseq:constrainedChoiceConsiderations>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constrained_choice_considerations: Option<ConstrainedChoiceConsiderations>,

    /// `<adlseq:rollupConsiderations>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollup_considerations: Option<RollupConsiderations>,
}

impl Sequencing {
    /// Returns `true` when the block carries no content besides its ids.
    pub fn is_empty(&self) -> bool {
        self.control_mode.is_none()
            && self.sequencing_rules.is_none()
            && self.limit_conditions.is_none()
            && self.rollup_rules.is_none()
            && self.objectives.is_none()
            && self.randomization_controls.is_none()
            && self.delivery_controls.is_none()
            && self.constrained_choice_considerations.is_none()
            && self.rollup_considerations.is_none()
    }

    /// Returns `true` when any rules, rollup, or randomization machinery is
    /// present (the "full" sequencing tier of the metadata projection).
    pub fn has_rules(&self) -> bool {
        self.sequencing_rules
            .as_ref()
            .is_some_and(|r| !r.is_empty())
            || self
                .rollup_rules
                .as_ref()
                .is_some_and(|r| !r.rules.is_empty())
            || self.randomization_controls.is_some()
    }
}

/// `<imsss:controlMode>` boolean switches.
///
/// Defaults per IMSSS: `choice`, `choiceExit`, `useCurrentAttemptObjectiveInfo`,
/// and `useCurrentAttemptProgressInfo` are `true`; `flow` and `forwardOnly`
/// are `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlMode {
    /// Learner may pick any available child.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub choice: bool,
    /// Learner may leave via choice while the activity is active.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub choice_exit: bool,
    /// System-driven flow navigation is enabled.
    #[serde(default, skip_serializing_if = "is_false")]
    pub flow: bool,
    /// Backward targets are forbidden.
    #[serde(default, skip_serializing_if = "is_false")]
    pub forward_only: bool,
    /// Objective state is read from the current attempt only.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub use_current_attempt_objective_info: bool,
    /// Progress state is read from the current attempt only.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub use_current_attempt_progress_info: bool,
}

impl Default for ControlMode {
    fn default() -> Self {
        Self {
            choice: true,
            choice_exit: true,
            flow: false,
            forward_only: false,
            use_current_attempt_objective_info: true,
            use_current_attempt_progress_info: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Sequencing rules
// ---------------------------------------------------------------------------

/// `<imsss:sequencingRules>` — the three rule lists.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencingRules {
    /// `<imsss:preConditionRule>` entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_condition: Vec<SequencingRule>,
    /// `<imsss:postConditionRule>` entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_condition: Vec<SequencingRule>,
    /// `<imsss:exitConditionRule>` entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exit_condition: Vec<SequencingRule>,
}

impl SequencingRules {
    /// Returns `true` when all three lists are empty.
    pub fn is_empty(&self) -> bool {
        self.pre_condition.is_empty()
            && self.post_condition.is_empty()
            && self.exit_condition.is_empty()
    }
}

/// One sequencing rule: a condition set and the action it fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencingRule {
    /// `<imsss:ruleConditions>`.
    pub conditions: RuleConditions,
    /// `<imsss:ruleAction>/@action`.
    pub action: RuleActionType,
}

/// `<imsss:ruleConditions>` with its combination attribute.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConditions {
    /// How the member conditions combine. IMSSS default: `all`.
    #[serde(default)]
    pub condition_combination: ConditionCombination,
    /// `<imsss:ruleCondition>` entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<RuleCondition>,
}

/// One `<imsss:ruleCondition>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    /// Objective the condition reads (`@referencedObjective`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_objective: Option<String>,
    /// Threshold for measure-based conditions (`@measureThreshold`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure_threshold: Option<Measure>,
    /// Unary operator (`@operator`), default `noOp`.
    #[serde(default)]
    pub operator: ConditionOperator,
    /// The condition referenced (`@condition`).
    pub condition: SequencingRuleConditionType,
}

impl RuleCondition {
    /// A bare condition with no objective, threshold, or negation.
    pub fn simple(condition: SequencingRuleConditionType) -> Self {
        Self {
            referenced_objective: None,
            measure_threshold: None,
            operator: ConditionOperator::NoOp,
            condition,
        }
    }
}

// ---------------------------------------------------------------------------
// Limit conditions
// ---------------------------------------------------------------------------

/// `<imsss:limitConditions>` attempt and duration caps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitConditions {
    /// Maximum number of attempts (`@attemptLimit`); non-negative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_limit: Option<u32>,
    /// `@attemptAbsoluteDurationLimit`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_absolute_duration_limit: Option<Iso8601Duration>,
    /// `@attemptExperiencedDurationLimit`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_experienced_duration_limit: Option<Iso8601Duration>,
    /// `@activityAbsoluteDurationLimit`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_absolute_duration_limit: Option<Iso8601Duration>,
    /// `@activityExperiencedDurationLimit`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_experienced_duration_limit: Option<Iso8601Duration>,
    /// `@beginTimeLimit` (kept lexical; wall-clock semantics are the
    /// runtime's concern).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub begin_time_limit: Option<String>,
    /// `@endTimeLimit` (kept lexical).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time_limit: Option<String>,
}

// ---------------------------------------------------------------------------
// Rollup
// ---------------------------------------------------------------------------

/// `<imsss:rollupRules>` and its attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupRules {
    /// `@rollupObjectiveSatisfied`, default `true`.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub rollup_objective_satisfied: bool,
    /// `@rollupProgressCompletion`, default `true`.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub rollup_progress_completion: bool,
    /// `@objectiveMeasureWeight` in `[0, 1]`, default `1.0`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_measure_weight: Option<ObjectiveWeight>,
    /// `<imsss:rollupRule>` entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RollupRule>,
}

impl Default for RollupRules {
    fn default() -> Self {
        Self {
            rollup_objective_satisfied: true,
            rollup_progress_completion: true,
            objective_measure_weight: None,
            rules: Vec::new(),
        }
    }
}

impl RollupRules {
    /// The effective weight: the declared value or the IMSSS default `1.0`.
    pub fn effective_measure_weight(&self) -> ObjectiveWeight {
        self.objective_measure_weight
            .unwrap_or_else(ObjectiveWeight::full)
    }
}

/// One `<imsss:rollupRule>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupRule {
    /// `@childActivitySet`, default `all`.
    #[serde(default)]
    pub child_activity_set: RollupChildActivitySet,
    /// `@minimumCount` for `atLeastCount`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_count: Option<u32>,
    /// `@minimumPercent` for `atLeastPercent`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_percent: Option<ObjectiveWeight>,
    /// `<imsss:rollupConditions>`.
    pub conditions: RollupConditions,
    /// `<imsss:rollupAction>/@action`.
    pub action: RollupActionType,
}

/// `<imsss:rollupConditions>`.
///
/// Unlike rule conditions, the IMSSS default combination here is `any`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupConditions {
    /// How the member conditions combine.
    #[serde(default = "RollupConditions::default_combination")]
    pub condition_combination: ConditionCombination,
    /// `<imsss:rollupCondition>` entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<RollupConditionEntry>,
}

impl RollupConditions {
    fn default_combination() -> ConditionCombination {
        ConditionCombination::Any
    }
}

impl Default for RollupConditions {
    fn default() -> Self {
        Self {
            condition_combination: ConditionCombination::Any,
            conditions: Vec::new(),
        }
    }
}

/// One `<imsss:rollupCondition>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupConditionEntry {
    /// Unary operator (`@operator`), default `noOp`.
    #[serde(default)]
    pub operator: ConditionOperator,
    /// The condition referenced (`@condition`).
    pub condition: SequencingRuleConditionType,
}

// ---------------------------------------------------------------------------
// Objectives
// ---------------------------------------------------------------------------

/// `<imsss:objectives>` — the primary objective plus the secondary list.
///
/// At most one primary objective exists per sequencing block; the schema
/// enforces the cardinality and the binding preserves it structurally.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objectives {
    /// `<imsss:primaryObjective>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<Objective>,
    /// `<imsss:objective>` entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub list: Vec<Objective>,
}

impl Objectives {
    /// Iterates the primary objective (if any) followed by the list.
    pub fn iter(&self) -> impl Iterator<Item = &Objective> {
        self.primary.iter().chain(self.list.iter())
    }
}

/// One objective, primary or secondary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    /// `@objectiveID`. Required on secondary objectives; optional on the
    /// primary one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_id: Option<String>,
    /// `@satisfiedByMeasure`, default `false`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub satisfied_by_measure: bool,
    /// `<imsss:minNormalizedMeasure>` in `[-1, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_normalized_measure: Option<Measure>,
    /// `<imsss:mapInfo>` entries linking to global objectives.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub map_info: Vec<ObjectiveMapInfo>,
}

/// One `<imsss:mapInfo>` link from a local objective to a global one.
///
/// Defaults per IMSSS: reads `true`, writes `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveMapInfo {
    /// `@targetObjectiveID` — the global objective's identifier.
    pub target_objective_id: String,
    /// `@readSatisfiedStatus`, default `true`.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub read_satisfied_status: bool,
    /// `@readNormalizedMeasure`, default `true`.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub read_normalized_measure: bool,
    /// `@writeSatisfiedStatus`, default `false`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub write_satisfied_status: bool,
    /// `@writeNormalizedMeasure`, default `false`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub write_normalized_measure: bool,
}

impl ObjectiveMapInfo {
    /// A map-info entry with the schema defaults for the four flags.
    pub fn to_target(target: impl Into<String>) -> Self {
        Self {
            target_objective_id: target.into(),
            read_satisfied_status: true,
            read_normalized_measure: true,
            write_satisfied_status: false,
            write_normalized_measure: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Randomization & delivery
// ---------------------------------------------------------------------------

/// `<imsss:randomizationControls>`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomizationControls {
    /// `@randomizationTiming`, default `never`.
    #[serde(default)]
    pub randomization_timing: RandomizationTiming,
    /// `@selectCount` — how many children to select.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select_count: Option<u32>,
    /// `@reorderChildren`, default `false`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub reorder_children: bool,
    /// `@selectionTiming`, default `never`.
    #[serde(default)]
    pub selection_timing: RandomizationTiming,
}

/// `<imsss:deliveryControls>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryControls {
    /// `@tracked`, default `true`.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub tracked: bool,
    /// `@completionSetByContent`, default `false`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub completion_set_by_content: bool,
    /// `@objectiveSetByContent`, default `false`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub objective_set_by_content: bool,
}

impl Default for DeliveryControls {
    fn default() -> Self {
        Self {
            tracked: true,
            completion_set_by_content: false,
            objective_set_by_content: false,
        }
    }
}

/// `<adlseq:constrainedChoiceConsiderations>`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstrainedChoiceConsiderations {
    /// `@preventActivation`, default `false`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub prevent_activation: bool,
    /// `@constrainChoice`, default `false`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub constrain_choice: bool,
}

/// `<adlseq:rollupConsiderations>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupConsiderations {
    /// `@requiredForSatisfied`, default `always`.
    #[serde(default)]
    pub required_for_satisfied: RollupRequired,
    /// `@requiredForNotSatisfied`, default `always`.
    #[serde(default)]
    pub required_for_not_satisfied: RollupRequired,
    /// `@requiredForCompleted`, default `always`.
    #[serde(default)]
    pub required_for_completed: RollupRequired,
    /// `@requiredForIncomplete`, default `always`.
    #[serde(default)]
    pub required_for_incomplete: RollupRequired,
    /// `@measureSatisfactionIfActive`, default `true`.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub measure_satisfaction_if_active: bool,
}

impl Default for RollupConsiderations {
    fn default() -> Self {
        Self {
            required_for_satisfied: RollupRequired::Always,
            required_for_not_satisfied: RollupRequired::Always,
            required_for_completed: RollupRequired::Always,
            required_for_incomplete: RollupRequired::Always,
            measure_satisfaction_if_active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn empty_block_reports_empty() {
        let seq = Sequencing::default();
        assert!(seq.is_empty());
        assert!(!seq.has_rules());
    }

    #[test]
    fn control_mode_alone_is_not_rules() {
        let seq = Sequencing {
            control_mode: Some(ControlMode {
                flow: true,
                ..ControlMode::default()
            }),
            ..Sequencing::default()
        };
        assert!(!seq.is_empty());
        assert!(!seq.has_rules());
    }

    #[test]
    fn randomization_counts_as_rules() {
        let seq = Sequencing {
            randomization_controls: Some(RandomizationControls {
                reorder_children: true,
                ..RandomizationControls::default()
            }),
            ..Sequencing::default()
        };
        assert!(seq.has_rules());
    }

    #[test]
    fn rollup_weight_defaults_to_full() {
        let rules = RollupRules::default();
        assert_eq!(rules.effective_measure_weight().value(), 1.0);
    }

    #[test]
    fn map_info_defaults_read_true_write_false() {
        let map = ObjectiveMapInfo::to_target("glob.obj.1");
        assert!(map.read_satisfied_status);
        assert!(map.read_normalized_measure);
        assert!(!map.write_satisfied_status);
        assert!(!map.write_normalized_measure);
    }

    #[test]
    fn objectives_iter_starts_with_primary() {
        let objectives = Objectives {
            primary: Some(Objective {
                objective_id: Some("primary".to_owned()),
                ..Objective::default()
            }),
            list: vec![Objective {
                objective_id: Some("secondary".to_owned()),
                ..Objective::default()
            }],
        };
        let ids: Vec<_> = objectives
            .iter()
            .filter_map(|o| o.objective_id.as_deref())
            .collect();
        assert_eq!(ids, vec!["primary", "secondary"]);
    }

    #[test]
    fn serde_round_trip_preserves_tokens() {
        let rule = SequencingRule {
            conditions: RuleConditions {
                condition_combination: ConditionCombination::Any,
                conditions: vec![RuleCondition::simple(
                    SequencingRuleConditionType::AttemptLimitExceeded,
                )],
            },
            action: RuleActionType::HiddenFromChoice,
        };
        let json = serde_json::to_string(&rule).expect("serializes");
        assert!(json.contains("\"attemptLimitExceeded\""));
        assert!(json.contains("\"hiddenFromChoice\""));
        let back: SequencingRule = serde_json::from_str(&json).expect("round-trips");
        assert_eq!(back, rule);
    }
}
