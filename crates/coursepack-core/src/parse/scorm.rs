/// Binding of `imsmanifest.xml` into the typed SCORM model.
///
/// Handles both SCORM 1.2 and 2004 manifests; the edition is inferred
/// here (from `<schemaversion>` text and IMSSS namespace presence) and
/// returned alongside the model. Schema-mandated defaults are applied
/// during binding; range-constrained numerics that fall outside their
/// interval are captured as validation issues and left absent rather
/// than failing the parse.
use tracing::{debug, warn};

use crate::enums::{
    ConditionCombination, ConditionOperator, ModuleType, RandomizationTiming, RollupActionType,
    RollupChildActivitySet, RollupRequired, RuleActionType, Scorm2004Edition, ScormType,
    SequencingRuleConditionType, TimeLimitAction,
};
use crate::error::ManifestParseError;
use crate::file_access::{self, FileAccess};
use crate::model::scorm::{
    CompletionThreshold, Dependency, Item, ManifestMetadata, Organization, Organizations,
    Resource, ResourceFile, ScormManifest,
};
use crate::model::sequencing::{
    ConstrainedChoiceConsiderations, ControlMode, DeliveryControls, LimitConditions, Objective,
    ObjectiveMapInfo, Objectives, RandomizationControls, RollupConditionEntry, RollupConditions,
    RollupConsiderations, RollupRule, RollupRules, RuleCondition, RuleConditions, Sequencing,
    SequencingRule, SequencingRules,
};
use crate::newtypes::{Iso8601Duration, Measure, ObjectiveWeight};
use crate::parse::xml::{
    self, NS_IMSSS, attr, attr_string, bool_attr, child, child_text, children, f64_attr,
    parse_document, required_attr, u32_attr,
};
use crate::validation::{IssueCode, Severity, ValidationIssue, ValidationMode, ValidationResult};

/// The canonical manifest filename; located case-insensitively.
pub const MANIFEST_FILE: &str = "imsmanifest.xml";

/// Everything the SCORM binding produces in one pass.
#[derive(Debug, Clone)]
pub struct ScormParseOutput {
    /// The typed manifest.
    pub manifest: ScormManifest,
    /// SCORM 1.2 or 2004 with edition.
    pub module_type: ModuleType,
    /// The manifest path as found on the backend (original casing).
    pub manifest_path: String,
    /// Launch URL computed from the default organization (first item in
    /// document order with an `identifierref`), with item parameters
    /// appended.
    pub launch_url: Option<String>,
    /// Sum of the per-item duration fields, when any are present.
    pub duration: Option<Iso8601Duration>,
    /// Issues captured during binding (range violations, token
    /// violations) for the validator to merge.
    pub captured: ValidationResult,
}

/// Locates the manifest on the backend.
///
/// Exact path first; the case-insensitive probe only runs when enabled.
pub fn locate_manifest(
    fa: &dyn FileAccess,
    case_insensitive: bool,
) -> Result<Option<String>, crate::file_access::FileAccessError> {
    if fa.exists(MANIFEST_FILE) {
        return Ok(Some(MANIFEST_FILE.to_owned()));
    }
    if case_insensitive {
        return file_access::find_case_insensitive(fa, "", MANIFEST_FILE);
    }
    Ok(None)
}

/// Parses the package's `imsmanifest.xml`.
pub fn parse_scorm(
    fa: &dyn FileAccess,
    mode: ValidationMode,
    case_insensitive: bool,
) -> Result<ScormParseOutput, crate::error::ParseError> {
    let manifest_path = locate_manifest(fa, case_insensitive)?
        .ok_or_else(|| ManifestParseError::new(MANIFEST_FILE, "manifest file not found"))?;
    let text = file_access::read_to_string(fa, &manifest_path)
        .map_err(|e| ManifestParseError::new(&manifest_path, e.to_string()))?;
    parse_scorm_text(&manifest_path, &text, mode).map_err(Into::into)
}

/// Parses manifest text that has already been read from the backend.
pub fn parse_scorm_text(
    file: &str,
    text: &str,
    mode: ValidationMode,
) -> Result<ScormParseOutput, ManifestParseError> {
    let doc = parse_document(file, text)?;
    let root = doc.root_element();
    if root.tag_name().name() != "manifest" {
        return Err(ManifestParseError::new(
            file,
            format!("root element is <{}>, expected <manifest>", root.tag_name().name()),
        ));
    }

    let mut binder = Binder {
        file,
        mode,
        captured: ValidationResult::valid(),
    };

    let identifier = required_attr(file, root, "identifier")?;
    let version = attr_string(root, "version");
    let metadata = child(root, "metadata").map(|n| binder.metadata(n));

    let organizations = match child(root, "organizations") {
        Some(node) => binder.organizations(node)?,
        None => Organizations::default(),
    };

    let resources = match child(root, "resources") {
        Some(node) => children(node, "resource")
            .into_iter()
            .map(|n| binder.resource(n))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    let sequencing_collection = match child(root, "sequencingCollection") {
        Some(node) => children(node, "sequencing")
            .into_iter()
            .map(|n| binder.sequencing(n))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    let manifest = ScormManifest {
        identifier,
        version,
        metadata,
        organizations,
        resources,
        sequencing_collection,
    };

    let module_type = sniff_module_type(&doc, &manifest);
    let launch_url = compute_launch_url(&manifest);
    let duration = compute_duration(&manifest);
    debug!(
        module_type = %module_type,
        launch_url = launch_url.as_deref().unwrap_or("<none>"),
        "bound SCORM manifest"
    );

    Ok(ScormParseOutput {
        manifest,
        module_type,
        manifest_path: file.to_owned(),
        launch_url,
        duration,
        captured: binder.captured,
    })
}

// ---------------------------------------------------------------------------
// Edition sniffing
// ---------------------------------------------------------------------------

/// Distinguishes SCORM 1.2 from 2004 (and picks the edition).
///
/// `<schemaversion>` text decides when recognised; the IMSSS namespace is
/// the tie-breaker for manifests that omit or garble the metadata header.
/// 2004 manifests without a recognisable edition default to 3rd, the
/// overwhelmingly most published one.
pub fn sniff_module_type(doc: &roxmltree::Document<'_>, manifest: &ScormManifest) -> ModuleType {
    let schema_version = manifest
        .metadata
        .as_ref()
        .and_then(|m| m.schema_version.as_deref());

    if let Some(text) = schema_version {
        if text.trim() == "1.2" {
            return ModuleType::Scorm12;
        }
        if let Some(edition) = Scorm2004Edition::from_schema_version(text) {
            return ModuleType::Scorm2004(edition);
        }
    }

    if xml::uses_namespace(doc, NS_IMSSS) {
        warn!(
            schema_version = schema_version.unwrap_or("<absent>"),
            "schemaversion did not identify an edition; IMSSS namespace implies 2004"
        );
        return ModuleType::Scorm2004(Scorm2004Edition::Third);
    }
    ModuleType::Scorm12
}

// ---------------------------------------------------------------------------
// Launch URL / duration
// ---------------------------------------------------------------------------

/// First flattened item of the default organization that references a
/// resource with an `href`, combined with the item's parameters.
fn compute_launch_url(manifest: &ScormManifest) -> Option<String> {
    let org = manifest.default_organization()?;
    for top in &org.items {
        for item in top.descendants() {
            let Some(reference) = item.identifier_ref.as_deref() else {
                continue;
            };
            let Some(resource) = manifest.resource_by_id(reference) else {
                continue;
            };
            let Some(href) = resource.href.as_deref() else {
                continue;
            };
            let base = resource.xml_base.as_deref().unwrap_or("");
            let url = format!("{base}{href}");
            return Some(append_parameters(&url, item.parameters.as_deref()));
        }
    }
    None
}

/// Appends item `@parameters` to a launch URL, deduplicating the `?`.
fn append_parameters(url: &str, parameters: Option<&str>) -> String {
    let Some(params) = parameters.map(str::trim).filter(|p| !p.is_empty()) else {
        return url.to_owned();
    };
    let params = params.trim_start_matches('?');
    if url.contains('?') {
        format!("{url}&{params}")
    } else {
        format!("{url}?{params}")
    }
}

/// Sums every item-level duration field in the default organization.
fn compute_duration(manifest: &ScormManifest) -> Option<Iso8601Duration> {
    let org = manifest.default_organization()?;
    let mut total: Option<Iso8601Duration> = None;
    for top in &org.items {
        for item in top.descendants() {
            let mut add = |d: Iso8601Duration| {
                total = Some(total.unwrap_or_default().saturating_add(d));
            };
            if let Some(d) = item.max_time_allowed {
                add(d);
            }
            if let Some(limits) = item
                .sequencing
                .as_ref()
                .and_then(|s| s.limit_conditions.as_ref())
            {
                if let Some(d) = limits.attempt_absolute_duration_limit {
                    add(d);
                }
            }
        }
    }
    total
}

// ---------------------------------------------------------------------------
// Binder
// ---------------------------------------------------------------------------

/// Carries the file name, mode, and captured issues through the binding.
struct Binder<'a> {
    file: &'a str,
    mode: ValidationMode,
    captured: ValidationResult,
}

impl Binder<'_> {
    fn capture_range(&mut self, code: IssueCode, location: String, detail: String) {
        self.captured.push(ValidationIssue::new(
            Severity::Error,
            self.mode,
            code,
            detail,
            location,
        ));
    }

    fn metadata(&mut self, node: roxmltree::Node<'_, '_>) -> ManifestMetadata {
        ManifestMetadata {
            schema: child_text(node, "schema"),
            schema_version: child_text(node, "schemaversion"),
            location: child_text(node, "location"),
        }
    }

    fn organizations(
        &mut self,
        node: roxmltree::Node<'_, '_>,
    ) -> Result<Organizations, ManifestParseError> {
        let default = attr_string(node, "default");
        let list = children(node, "organization")
            .into_iter()
            .map(|n| self.organization(n))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Organizations { default, list })
    }

    fn organization(
        &mut self,
        node: roxmltree::Node<'_, '_>,
    ) -> Result<Organization, ManifestParseError> {
        let identifier = required_attr(self.file, node, "identifier")?;
        let title = child_text(node, "title").unwrap_or_default();
        let items = children(node, "item")
            .into_iter()
            .map(|n| self.item(n))
            .collect::<Result<Vec<_>, _>>()?;
        let sequencing = child(node, "sequencing")
            .map(|n| self.sequencing(n))
            .transpose()?;
        Ok(Organization {
            identifier,
            title,
            items,
            sequencing,
        })
    }

    fn item(&mut self, node: roxmltree::Node<'_, '_>) -> Result<Item, ManifestParseError> {
        let identifier = required_attr(self.file, node, "identifier")?;
        let location = format!("item[@identifier='{identifier}']");

        let mastery_score = match child_text(node, "masteryscore") {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(v) if (0.0..=100.0).contains(&v) => Some(v),
                Ok(v) => {
                    self.capture_range(
                        IssueCode::Scorm12InvalidMasteryScore,
                        format!("{location}/adlcp:masteryscore"),
                        format!("mastery score {v} outside [0, 100]"),
                    );
                    None
                }
                Err(_) => {
                    return Err(ManifestParseError::new(
                        self.file,
                        format!("masteryscore on {location} is not a number: {raw:?}"),
                    ));
                }
            },
            None => None,
        };

        let max_time_allowed = match child_text(node, "maxtimeallowed") {
            Some(raw) => match Iso8601Duration::parse(&raw) {
                Ok(d) => Some(d),
                Err(e) => {
                    return Err(ManifestParseError::new(
                        self.file,
                        format!("maxtimeallowed on {location}: {e}"),
                    ));
                }
            },
            None => None,
        };

        let time_limit_action = child_text(node, "timelimitaction")
            .or_else(|| child_text(node, "timeLimitAction"))
            .and_then(|raw| TimeLimitAction::from_token(&raw));

        let completion_threshold = child(node, "completionThreshold")
            .map(|n| self.completion_threshold(n, &location))
            .transpose()?;

        let items = children(node, "item")
            .into_iter()
            .map(|n| self.item(n))
            .collect::<Result<Vec<_>, _>>()?;
        let sequencing = child(node, "sequencing")
            .map(|n| self.sequencing(n))
            .transpose()?;

        Ok(Item {
            identifier,
            title: child_text(node, "title").unwrap_or_default(),
            identifier_ref: attr_string(node, "identifierref"),
            parameters: attr_string(node, "parameters"),
            is_visible: bool_attr(node, "isvisible", true),
            mastery_score,
            prerequisites: child_text(node, "prerequisites"),
            data_from_lms: child_text(node, "datafromlms")
                .or_else(|| child_text(node, "dataFromLMS")),
            max_time_allowed,
            time_limit_action,
            completion_threshold,
            items,
            sequencing,
        })
    }

    fn completion_threshold(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        location: &str,
    ) -> Result<CompletionThreshold, ManifestParseError> {
        let min_progress_measure = self.weight_attr(
            node,
            "minProgressMeasure",
            &format!("{location}/adlcp:completionThreshold"),
        )?;
        let progress_weight = self.weight_attr(
            node,
            "progressWeight",
            &format!("{location}/adlcp:completionThreshold"),
        )?;
        Ok(CompletionThreshold {
            completed_by_measure: bool_attr(node, "completedByMeasure", false),
            min_progress_measure,
            progress_weight,
        })
    }

    fn resource(&mut self, node: roxmltree::Node<'_, '_>) -> Result<Resource, ManifestParseError> {
        let identifier = required_attr(self.file, node, "identifier")?;
        let scorm_type = attr(node, "scormType")
            .or_else(|| attr(node, "scormtype"))
            .and_then(ScormType::from_token)
            .unwrap_or_default();
        let files = children(node, "file")
            .into_iter()
            .map(|n| {
                required_attr(self.file, n, "href").map(|href| ResourceFile { href })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let dependencies = children(node, "dependency")
            .into_iter()
            .map(|n| {
                required_attr(self.file, n, "identifierref")
                    .map(|identifier_ref| Dependency { identifier_ref })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Resource {
            identifier,
            resource_type: attr_string(node, "type").unwrap_or_default(),
            scorm_type,
            href: attr_string(node, "href"),
            xml_base: attr_string(node, "base"),
            files,
            dependencies,
        })
    }

    // -- IMSSS ------------------------------------------------------------

    fn sequencing(
        &mut self,
        node: roxmltree::Node<'_, '_>,
    ) -> Result<Sequencing, ManifestParseError> {
        let id = attr_string(node, "ID").or_else(|| attr_string(node, "id"));
        let id_ref = attr_string(node, "IDRef").or_else(|| attr_string(node, "IDref"));
        let location = match (&id, &id_ref) {
            (Some(id), _) => format!("imsss:sequencing[@ID='{id}']"),
            (None, Some(idref)) => format!("imsss:sequencing[@IDRef='{idref}']"),
            (None, None) => "imsss:sequencing".to_owned(),
        };

        let control_mode = child(node, "controlMode").map(|n| ControlMode {
            choice: bool_attr(n, "choice", true),
            choice_exit: bool_attr(n, "choiceExit", true),
            flow: bool_attr(n, "flow", false),
            forward_only: bool_attr(n, "forwardOnly", false),
            use_current_attempt_objective_info: bool_attr(
                n,
                "useCurrentAttemptObjectiveInfo",
                true,
            ),
            use_current_attempt_progress_info: bool_attr(
                n,
                "useCurrentAttemptProgressInfo",
                true,
            ),
        });

        let sequencing_rules = child(node, "sequencingRules")
            .map(|n| self.sequencing_rules(n, &location))
            .transpose()?
            .filter(|r| !r.is_empty());

        let limit_conditions = child(node, "limitConditions")
            .map(|n| self.limit_conditions(n, &location))
            .transpose()?;

        let rollup_rules = child(node, "rollupRules")
            .map(|n| self.rollup_rules(n, &location))
            .transpose()?;

        let objectives = child(node, "objectives")
            .map(|n| self.objectives(n, &location))
            .transpose()?;

        let randomization_controls =
            child(node, "randomizationControls").map(|n| -> Result<_, ManifestParseError> {
                Ok(RandomizationControls {
                    randomization_timing: attr(n, "randomizationTiming")
                        .and_then(RandomizationTiming::from_token)
                        .unwrap_or_default(),
                    select_count: u32_attr(self.file, n, "selectCount")?,
                    reorder_children: bool_attr(n, "reorderChildren", false),
                    selection_timing: attr(n, "selectionTiming")
                        .and_then(RandomizationTiming::from_token)
                        .unwrap_or_default(),
                })
            });
        let randomization_controls = randomization_controls.transpose()?;

        let delivery_controls = child(node, "deliveryControls").map(|n| DeliveryControls {
            tracked: bool_attr(n, "tracked", true),
            completion_set_by_content: bool_attr(n, "completionSetByContent", false),
            objective_set_by_content: bool_attr(n, "objectiveSetByContent", false),
        });

        let constrained_choice_considerations = child(node, "constrainedChoiceConsiderations")
            .map(|n| ConstrainedChoiceConsiderations {
                prevent_activation: bool_attr(n, "preventActivation", false),
                constrain_choice: bool_attr(n, "constrainChoice", false),
            });

        let rollup_considerations =
            child(node, "rollupConsiderations").map(|n| RollupConsiderations {
                required_for_satisfied: attr(n, "requiredForSatisfied")
                    .and_then(RollupRequired::from_token)
                    .unwrap_or_default(),
                required_for_not_satisfied: attr(n, "requiredForNotSatisfied")
                    .and_then(RollupRequired::from_token)
                    .unwrap_or_default(),
                required_for_completed: attr(n, "requiredForCompleted")
                    .and_then(RollupRequired::from_token)
                    .unwrap_or_default(),
                required_for_incomplete: attr(n, "requiredForIncomplete")
                    .and_then(RollupRequired::from_token)
                    .unwrap_or_default(),
                measure_satisfaction_if_active: bool_attr(n, "measureSatisfactionIfActive", true),
            });

        Ok(Sequencing {
            id,
            id_ref,
            control_mode,
            sequencing_rules,
            limit_conditions,
            rollup_rules,
            objectives,
            randomization_controls,
            delivery_controls,
            constrained_choice_considerations,
            rollup_considerations,
        })
    }

    fn sequencing_rules(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        location: &str,
    ) -> Result<SequencingRules, ManifestParseError> {
        Ok(SequencingRules {
            pre_condition: self.rule_list(node, "preConditionRule", location)?,
            post_condition: self.rule_list(node, "postConditionRule", location)?,
            exit_condition: self.rule_list(node, "exitConditionRule", location)?,
        })
    }

    fn rule_list(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        element: &str,
        location: &str,
    ) -> Result<Vec<SequencingRule>, ManifestParseError> {
        children(node, element)
            .into_iter()
            .map(|n| self.sequencing_rule(n, element, location))
            .collect()
    }

    fn sequencing_rule(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        element: &str,
        location: &str,
    ) -> Result<SequencingRule, ManifestParseError> {
        let conditions = match child(node, "ruleConditions") {
            Some(n) => self.rule_conditions(n, location)?,
            None => RuleConditions::default(),
        };
        let action_node = child(node, "ruleAction").ok_or_else(|| {
            ManifestParseError::new(
                self.file,
                format!("{location}/{element} has no <ruleAction>"),
            )
        })?;
        let action_raw = required_attr(self.file, action_node, "action")?;
        let action = RuleActionType::from_token(&action_raw).ok_or_else(|| {
            ManifestParseError::new(
                self.file,
                format!("{location}/{element}: unknown rule action {action_raw:?}"),
            )
        })?;
        Ok(SequencingRule { conditions, action })
    }

    fn rule_conditions(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        location: &str,
    ) -> Result<RuleConditions, ManifestParseError> {
        let condition_combination = attr(node, "conditionCombination")
            .and_then(ConditionCombination::from_token)
            .unwrap_or_default();
        let conditions = children(node, "ruleCondition")
            .into_iter()
            .map(|n| self.rule_condition(n, location))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RuleConditions {
            condition_combination,
            conditions,
        })
    }

    fn rule_condition(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        location: &str,
    ) -> Result<RuleCondition, ManifestParseError> {
        let condition_raw = required_attr(self.file, node, "condition")?;
        let condition = SequencingRuleConditionType::from_token(&condition_raw).ok_or_else(
            || {
                ManifestParseError::new(
                    self.file,
                    format!("{location}: unknown rule condition {condition_raw:?}"),
                )
            },
        )?;
        let measure_threshold =
            self.measure_attr(node, "measureThreshold", &format!("{location}/imsss:ruleCondition"))?;
        Ok(RuleCondition {
            referenced_objective: attr_string(node, "referencedObjective"),
            measure_threshold,
            operator: attr(node, "operator")
                .and_then(ConditionOperator::from_token)
                .unwrap_or_default(),
            condition,
        })
    }

    fn limit_conditions(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        location: &str,
    ) -> Result<LimitConditions, ManifestParseError> {
        let attempt_limit = match attr(node, "attemptLimit").map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<u32>() {
                Ok(v) => Some(v),
                Err(_) if raw.starts_with('-') => {
                    self.capture_range(
                        IssueCode::Scorm2004InvalidAttemptLimit,
                        format!("{location}/imsss:limitConditions/@attemptLimit"),
                        format!("attempt limit {raw:?} is negative"),
                    );
                    None
                }
                Err(_) => {
                    return Err(ManifestParseError::new(
                        self.file,
                        format!("{location}: attemptLimit is not an integer: {raw:?}"),
                    ));
                }
            },
        };

        let duration = |name: &str| -> Result<Option<Iso8601Duration>, ManifestParseError> {
            match attr(node, name).map(str::trim) {
                None | Some("") => Ok(None),
                Some(raw) => Iso8601Duration::parse(raw).map(Some).map_err(|e| {
                    ManifestParseError::new(self.file, format!("{location}: {name}: {e}"))
                }),
            }
        };

        Ok(LimitConditions {
            attempt_limit,
            attempt_absolute_duration_limit: duration("attemptAbsoluteDurationLimit")?,
            attempt_experienced_duration_limit: duration("attemptExperiencedDurationLimit")?,
            activity_absolute_duration_limit: duration("activityAbsoluteDurationLimit")?,
            activity_experienced_duration_limit: duration("activityExperiencedDurationLimit")?,
            begin_time_limit: attr_string(node, "beginTimeLimit"),
            end_time_limit: attr_string(node, "endTimeLimit"),
        })
    }

    fn rollup_rules(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        location: &str,
    ) -> Result<RollupRules, ManifestParseError> {
        let objective_measure_weight = self.weight_attr(
            node,
            "objectiveMeasureWeight",
            &format!("{location}/imsss:rollupRules"),
        )?;
        let rules = children(node, "rollupRule")
            .into_iter()
            .map(|n| self.rollup_rule(n, location))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RollupRules {
            rollup_objective_satisfied: bool_attr(node, "rollupObjectiveSatisfied", true),
            rollup_progress_completion: bool_attr(node, "rollupProgressCompletion", true),
            objective_measure_weight,
            rules,
        })
    }

    fn rollup_rule(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        location: &str,
    ) -> Result<RollupRule, ManifestParseError> {
        let conditions = match child(node, "rollupConditions") {
            Some(n) => {
                let condition_combination = attr(n, "conditionCombination")
                    .and_then(ConditionCombination::from_token)
                    .unwrap_or(ConditionCombination::Any);
                let conditions = children(n, "rollupCondition")
                    .into_iter()
                    .map(|c| -> Result<RollupConditionEntry, ManifestParseError> {
                        let raw = required_attr(self.file, c, "condition")?;
                        let condition =
                            SequencingRuleConditionType::from_token(&raw).ok_or_else(|| {
                                ManifestParseError::new(
                                    self.file,
                                    format!("{location}: unknown rollup condition {raw:?}"),
                                )
                            })?;
                        Ok(RollupConditionEntry {
                            operator: attr(c, "operator")
                                .and_then(ConditionOperator::from_token)
                                .unwrap_or_default(),
                            condition,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                RollupConditions {
                    condition_combination,
                    conditions,
                }
            }
            None => RollupConditions::default(),
        };

        let action_node = child(node, "rollupAction").ok_or_else(|| {
            ManifestParseError::new(self.file, format!("{location}: rollupRule has no <rollupAction>"))
        })?;
        let action_raw = required_attr(self.file, action_node, "action")?;
        let action = RollupActionType::from_token(&action_raw).ok_or_else(|| {
            ManifestParseError::new(
                self.file,
                format!("{location}: unknown rollup action {action_raw:?}"),
            )
        })?;

        Ok(RollupRule {
            child_activity_set: attr(node, "childActivitySet")
                .and_then(RollupChildActivitySet::from_token)
                .unwrap_or_default(),
            minimum_count: u32_attr(self.file, node, "minimumCount")?,
            minimum_percent: self.weight_attr(
                node,
                "minimumPercent",
                &format!("{location}/imsss:rollupRule"),
            )?,
            conditions,
            action,
        })
    }

    fn objectives(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        location: &str,
    ) -> Result<Objectives, ManifestParseError> {
        let primary = child(node, "primaryObjective")
            .map(|n| self.objective(n, location))
            .transpose()?;
        let list = children(node, "objective")
            .into_iter()
            .map(|n| self.objective(n, location))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Objectives { primary, list })
    }

    fn objective(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        location: &str,
    ) -> Result<Objective, ManifestParseError> {
        let objective_id = attr_string(node, "objectiveID");
        let obj_location = match &objective_id {
            Some(id) => format!("{location}/imsss:objective[@objectiveID='{id}']"),
            None => format!("{location}/imsss:primaryObjective"),
        };

        let min_normalized_measure = match child_text(node, "minNormalizedMeasure") {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(v) => match Measure::new(v) {
                    Ok(m) => Some(m),
                    Err(e) => {
                        self.capture_range(
                            IssueCode::Scorm2004InvalidMeasure,
                            format!("{obj_location}/imsss:minNormalizedMeasure"),
                            e.to_string(),
                        );
                        None
                    }
                },
                Err(_) => {
                    return Err(ManifestParseError::new(
                        self.file,
                        format!("{obj_location}: minNormalizedMeasure is not a number: {raw:?}"),
                    ));
                }
            },
            None => None,
        };

        let map_info = children(node, "mapInfo")
            .into_iter()
            .map(|n| -> Result<ObjectiveMapInfo, ManifestParseError> {
                Ok(ObjectiveMapInfo {
                    target_objective_id: required_attr(self.file, n, "targetObjectiveID")?,
                    read_satisfied_status: bool_attr(n, "readSatisfiedStatus", true),
                    read_normalized_measure: bool_attr(n, "readNormalizedMeasure", true),
                    write_satisfied_status: bool_attr(n, "writeSatisfiedStatus", false),
                    write_normalized_measure: bool_attr(n, "writeNormalizedMeasure", false),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Objective {
            objective_id,
            satisfied_by_measure: bool_attr(node, "satisfiedByMeasure", false),
            min_normalized_measure,
            map_info,
        })
    }

    // -- shared numeric capture -------------------------------------------

    fn measure_attr(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        name: &str,
        location: &str,
    ) -> Result<Option<Measure>, ManifestParseError> {
        match f64_attr(self.file, node, name)? {
            None => Ok(None),
            Some(v) => match Measure::new(v) {
                Ok(m) => Ok(Some(m)),
                Err(e) => {
                    self.capture_range(
                        IssueCode::Scorm2004InvalidMeasure,
                        format!("{location}/@{name}"),
                        e.to_string(),
                    );
                    Ok(None)
                }
            },
        }
    }

    fn weight_attr(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        name: &str,
        location: &str,
    ) -> Result<Option<ObjectiveWeight>, ManifestParseError> {
        match f64_attr(self.file, node, name)? {
            None => Ok(None),
            Some(v) => match ObjectiveWeight::new(v) {
                Ok(w) => Ok(Some(w)),
                Err(e) => {
                    self.capture_range(
                        IssueCode::Scorm2004InvalidObjectiveWeight,
                        format!("{location}/@{name}"),
                        e.to_string(),
                    );
                    Ok(None)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    const MINIMAL_12: &str = r#"<?xml version="1.0"?>
<manifest identifier="com.example.course" version="1.1"
    xmlns="http://www.imsproject.org/xsd/imscp_rootv1p1p2"
    xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_rootv1p2">
  <metadata>
    <schema>ADL SCORM</schema>
    <schemaversion>1.2</schemaversion>
  </metadata>
  <organizations default="org1">
    <organization identifier="org1">
      <title>Test Course</title>
      <item identifier="item1" identifierref="resource_1" parameters="?lesson=1">
        <title>Lesson 1</title>
        <adlcp:masteryscore>80</adlcp:masteryscore>
      </item>
    </organization>
  </organizations>
  <resources>
    <resource identifier="resource_1" type="webcontent" adlcp:scormtype="sco"
        href="content/index.html">
      <file href="content/index.html"/>
    </resource>
  </resources>
</manifest>"#;

    #[test]
    fn binds_minimal_scorm12() {
        let out =
            parse_scorm_text("imsmanifest.xml", MINIMAL_12, ValidationMode::Strict).expect("parses");
        assert_eq!(out.module_type, ModuleType::Scorm12);
        assert_eq!(out.manifest.identifier, "com.example.course");
        assert_eq!(out.manifest.organizations.list.len(), 1);
        let org = out.manifest.default_organization().expect("default org");
        assert_eq!(org.title, "Test Course");
        assert_eq!(org.items[0].mastery_score, Some(80.0));
        assert_eq!(
            out.launch_url.as_deref(),
            Some("content/index.html?lesson=1")
        );
        assert!(out.captured.is_empty());
    }

    #[test]
    fn parameters_question_mark_deduplicated() {
        assert_eq!(
            append_parameters("a.html", Some("?x=1")),
            "a.html?x=1".to_owned()
        );
        assert_eq!(
            append_parameters("a.html?x=1", Some("y=2")),
            "a.html?x=1&y=2".to_owned()
        );
        assert_eq!(append_parameters("a.html", None), "a.html".to_owned());
    }

    #[test]
    fn missing_identifier_is_structural() {
        let err = parse_scorm_text(
            "imsmanifest.xml",
            r#"<manifest><organizations/></manifest>"#,
            ValidationMode::Strict,
        )
        .expect_err("must fail");
        assert!(err.to_string().contains("identifier"));
    }

    #[test]
    fn wrong_root_element_is_structural() {
        let err = parse_scorm_text(
            "imsmanifest.xml",
            r#"<courseStructure identifier="x"/>"#,
            ValidationMode::Strict,
        )
        .expect_err("must fail");
        assert!(err.to_string().contains("expected <manifest>"));
    }

    #[test]
    fn out_of_range_measure_is_captured_not_fatal() {
        let manifest = r#"<manifest identifier="m" xmlns:imsss="http://www.imsglobal.org/xsd/imsss">
  <metadata><schemaversion>2004 3rd Edition</schemaversion></metadata>
  <organizations default="org1">
    <organization identifier="org1">
      <title>T</title>
      <item identifier="item1" identifierref="r1">
        <title>I</title>
        <imsss:sequencing>
          <imsss:objectives>
            <imsss:primaryObjective objectiveID="obj1">
              <imsss:minNormalizedMeasure>2.5</imsss:minNormalizedMeasure>
            </imsss:primaryObjective>
          </imsss:objectives>
        </imsss:sequencing>
      </item>
    </organization>
  </organizations>
  <resources>
    <resource identifier="r1" href="a.html"><file href="a.html"/></resource>
  </resources>
</manifest>"#;
        let out = parse_scorm_text("imsmanifest.xml", manifest, ValidationMode::Strict)
            .expect("parse survives");
        assert_eq!(
            out.module_type,
            ModuleType::Scorm2004(Scorm2004Edition::Third)
        );
        assert_eq!(out.captured.len(), 1);
        let issue = &out.captured.issues[0];
        assert_eq!(issue.code, IssueCode::Scorm2004InvalidMeasure);
        let seq = out.manifest.organizations.list[0].items[0]
            .sequencing
            .as_ref()
            .expect("sequencing bound");
        let primary = seq
            .objectives
            .as_ref()
            .and_then(|o| o.primary.as_ref())
            .expect("primary");
        assert_eq!(primary.min_normalized_measure, None);
    }

    #[test]
    fn imsss_namespace_alone_implies_2004() {
        let manifest = r#"<manifest identifier="m" xmlns:imsss="http://www.imsglobal.org/xsd/imsss">
  <organizations/><resources/>
</manifest>"#;
        let out = parse_scorm_text("imsmanifest.xml", manifest, ValidationMode::Strict)
            .expect("parses");
        assert_eq!(
            out.module_type,
            ModuleType::Scorm2004(Scorm2004Edition::Third)
        );
    }
}
