/// Serialization of [`ScormManifest`] back to `imsmanifest.xml`.
///
/// Namespace sets switch on the module generation, matching what
/// authoring tools emit: the 1.2 set (imscp root + adlcp 1.2) or the
/// 2004 set (imscp v1p1 + adlcp v1p3 + adlseq + adlnav + imsss). IMSSS
/// vocabulary tokens and the `adlcp:`/`imsss:` element prefixes are
/// written exactly as the binder reads them, so write-then-parse is a
/// fixpoint on the model.
use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::enums::ModuleType;
use crate::model::scorm::{Item, Organization, Resource, ScormManifest};
use crate::model::sequencing::{
    Objective, RollupRule, RuleConditions, Sequencing, SequencingRule,
};

use super::WriteError;

/// Serializes `manifest` as an `imsmanifest.xml` document.
pub fn write_scorm(
    manifest: &ScormManifest,
    module_type: ModuleType,
) -> Result<String, WriteError> {
    let mut writer = Emitter {
        writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
    };
    writer.document(manifest, module_type)?;
    let bytes = writer.writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(WriteError::new)
}

struct Emitter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl Emitter {
    fn document(
        &mut self,
        manifest: &ScormManifest,
        module_type: ModuleType,
    ) -> Result<(), WriteError> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("manifest");
        root.push_attribute(("identifier", manifest.identifier.as_str()));
        if let Some(version) = &manifest.version {
            root.push_attribute(("version", version.as_str()));
        }
        match module_type {
            ModuleType::Scorm12 | ModuleType::Aicc | ModuleType::Cmi5 => {
                root.push_attribute((
                    "xmlns",
                    "http://www.imsproject.org/xsd/imscp_rootv1p1p2",
                ));
                root.push_attribute(("xmlns:adlcp", "http://www.adlnet.org/xsd/adlcp_rootv1p2"));
            }
            ModuleType::Scorm2004(_) => {
                root.push_attribute(("xmlns", "http://www.imsglobal.org/xsd/imscp_v1p1"));
                root.push_attribute(("xmlns:adlcp", "http://www.adlnet.org/xsd/adlcp_v1p3"));
                root.push_attribute(("xmlns:adlseq", "http://www.adlnet.org/xsd/adlseq_v1p3"));
                root.push_attribute(("xmlns:adlnav", "http://www.adlnet.org/xsd/adlnav_v1p3"));
                root.push_attribute(("xmlns:imsss", "http://www.imsglobal.org/xsd/imsss"));
            }
        }
        self.event(Event::Start(root))?;

        if let Some(metadata) = &manifest.metadata {
            self.start("metadata")?;
            if let Some(schema) = &metadata.schema {
                self.text_element("schema", schema)?;
            }
            if let Some(schema_version) = &metadata.schema_version {
                self.text_element("schemaversion", schema_version)?;
            }
            if let Some(location) = &metadata.location {
                self.text_element("adlcp:location", location)?;
            }
            self.end("metadata")?;
        }

        let mut organizations = BytesStart::new("organizations");
        if let Some(default) = &manifest.organizations.default {
            organizations.push_attribute(("default", default.as_str()));
        }
        self.event(Event::Start(organizations))?;
        for organization in &manifest.organizations.list {
            self.organization(organization)?;
        }
        self.end("organizations")?;

        self.start("resources")?;
        for resource in &manifest.resources {
            self.resource(resource, module_type)?;
        }
        self.end("resources")?;

        if !manifest.sequencing_collection.is_empty() {
            self.start("imsss:sequencingCollection")?;
            for entry in &manifest.sequencing_collection {
                self.sequencing(entry)?;
            }
            self.end("imsss:sequencingCollection")?;
        }

        self.end("manifest")
    }

    fn organization(&mut self, organization: &Organization) -> Result<(), WriteError> {
        let mut start = BytesStart::new("organization");
        start.push_attribute(("identifier", organization.identifier.as_str()));
        self.event(Event::Start(start))?;
        self.text_element("title", &organization.title)?;
        for item in &organization.items {
            self.item(item)?;
        }
        if let Some(sequencing) = &organization.sequencing {
            self.sequencing(sequencing)?;
        }
        self.end("organization")
    }

    fn item(&mut self, item: &Item) -> Result<(), WriteError> {
        let mut start = BytesStart::new("item");
        start.push_attribute(("identifier", item.identifier.as_str()));
        if let Some(reference) = &item.identifier_ref {
            start.push_attribute(("identifierref", reference.as_str()));
        }
        if let Some(parameters) = &item.parameters {
            start.push_attribute(("parameters", parameters.as_str()));
        }
        if !item.is_visible {
            start.push_attribute(("isvisible", "false"));
        }
        self.event(Event::Start(start))?;

        self.text_element("title", &item.title)?;
        if let Some(score) = item.mastery_score {
            self.text_element("adlcp:masteryscore", &trim_float(score))?;
        }
        if let Some(prerequisites) = &item.prerequisites {
            self.text_element("adlcp:prerequisites", prerequisites)?;
        }
        if let Some(data) = &item.data_from_lms {
            self.text_element("adlcp:datafromlms", data)?;
        }
        if let Some(duration) = item.max_time_allowed {
            self.text_element("adlcp:maxtimeallowed", &duration.to_string())?;
        }
        if let Some(action) = item.time_limit_action {
            self.text_element("adlcp:timelimitaction", action.as_str())?;
        }
        if let Some(threshold) = &item.completion_threshold {
            let mut start = BytesStart::new("adlcp:completionThreshold");
            if threshold.completed_by_measure {
                start.push_attribute(("completedByMeasure", "true"));
            }
            if let Some(measure) = threshold.min_progress_measure {
                start.push_attribute(("minProgressMeasure", trim_float(measure.value()).as_str()));
            }
            if let Some(weight) = threshold.progress_weight {
                start.push_attribute(("progressWeight", trim_float(weight.value()).as_str()));
            }
            self.event(Event::Empty(start))?;
        }
        for child in &item.items {
            self.item(child)?;
        }
        if let Some(sequencing) = &item.sequencing {
            self.sequencing(sequencing)?;
        }
        self.end("item")
    }

    fn resource(
        &mut self,
        resource: &Resource,
        module_type: ModuleType,
    ) -> Result<(), WriteError> {
        let mut start = BytesStart::new("resource");
        start.push_attribute(("identifier", resource.identifier.as_str()));
        if !resource.resource_type.is_empty() {
            start.push_attribute(("type", resource.resource_type.as_str()));
        }
        let scorm_type_attr = match module_type {
            ModuleType::Scorm2004(_) => "adlcp:scormType",
            ModuleType::Scorm12 | ModuleType::Aicc | ModuleType::Cmi5 => "adlcp:scormtype",
        };
        start.push_attribute((scorm_type_attr, resource.scorm_type.as_str()));
        if let Some(href) = &resource.href {
            start.push_attribute(("href", href.as_str()));
        }
        if let Some(base) = &resource.xml_base {
            start.push_attribute(("xml:base", base.as_str()));
        }
        self.event(Event::Start(start))?;

        for file in &resource.files {
            let mut element = BytesStart::new("file");
            element.push_attribute(("href", file.href.as_str()));
            self.event(Event::Empty(element))?;
        }
        for dependency in &resource.dependencies {
            let mut element = BytesStart::new("dependency");
            element.push_attribute(("identifierref", dependency.identifier_ref.as_str()));
            self.event(Event::Empty(element))?;
        }
        self.end("resource")
    }

    // -- IMSSS ------------------------------------------------------------

    fn sequencing(&mut self, sequencing: &Sequencing) -> Result<(), WriteError> {
        let mut start = BytesStart::new("imsss:sequencing");
        if let Some(id) = &sequencing.id {
            start.push_attribute(("ID", id.as_str()));
        }
        if let Some(id_ref) = &sequencing.id_ref {
            start.push_attribute(("IDRef", id_ref.as_str()));
        }
        self.event(Event::Start(start))?;

        if let Some(control) = &sequencing.control_mode {
            let mut element = BytesStart::new("imsss:controlMode");
            let defaults = crate::model::sequencing::ControlMode::default();
            push_bool(&mut element, "choice", control.choice, defaults.choice);
            push_bool(
                &mut element,
                "choiceExit",
                control.choice_exit,
                defaults.choice_exit,
            );
            push_bool(&mut element, "flow", control.flow, defaults.flow);
            push_bool(
                &mut element,
                "forwardOnly",
                control.forward_only,
                defaults.forward_only,
            );
            push_bool(
                &mut element,
                "useCurrentAttemptObjectiveInfo",
                control.use_current_attempt_objective_info,
                defaults.use_current_attempt_objective_info,
            );
            push_bool(
                &mut element,
                "useCurrentAttemptProgressInfo",
                control.use_current_attempt_progress_info,
                defaults.use_current_attempt_progress_info,
            );
            self.event(Event::Empty(element))?;
        }

        if let Some(rules) = &sequencing.sequencing_rules {
            self.start("imsss:sequencingRules")?;
            for rule in &rules.pre_condition {
                self.sequencing_rule("imsss:preConditionRule", rule)?;
            }
            for rule in &rules.post_condition {
                self.sequencing_rule("imsss:postConditionRule", rule)?;
            }
            for rule in &rules.exit_condition {
                self.sequencing_rule("imsss:exitConditionRule", rule)?;
            }
            self.end("imsss:sequencingRules")?;
        }

        if let Some(limits) = &sequencing.limit_conditions {
            let mut element = BytesStart::new("imsss:limitConditions");
            if let Some(limit) = limits.attempt_limit {
                element.push_attribute(("attemptLimit", limit.to_string().as_str()));
            }
            let durations = [
                ("attemptAbsoluteDurationLimit", limits.attempt_absolute_duration_limit),
                ("attemptExperiencedDurationLimit", limits.attempt_experienced_duration_limit),
                ("activityAbsoluteDurationLimit", limits.activity_absolute_duration_limit),
                ("activityExperiencedDurationLimit", limits.activity_experienced_duration_limit),
            ];
            for (name, duration) in durations {
                if let Some(duration) = duration {
                    element.push_attribute((name, duration.to_string().as_str()));
                }
            }
            if let Some(begin) = &limits.begin_time_limit {
                element.push_attribute(("beginTimeLimit", begin.as_str()));
            }
            if let Some(end) = &limits.end_time_limit {
                element.push_attribute(("endTimeLimit", end.as_str()));
            }
            self.event(Event::Empty(element))?;
        }

        if let Some(rollup) = &sequencing.rollup_rules {
            let mut start = BytesStart::new("imsss:rollupRules");
            if !rollup.rollup_objective_satisfied {
                start.push_attribute(("rollupObjectiveSatisfied", "false"));
            }
            if !rollup.rollup_progress_completion {
                start.push_attribute(("rollupProgressCompletion", "false"));
            }
            if let Some(weight) = rollup.objective_measure_weight {
                start.push_attribute((
                    "objectiveMeasureWeight",
                    trim_float(weight.value()).as_str(),
                ));
            }
            self.event(Event::Start(start))?;
            for rule in &rollup.rules {
                self.rollup_rule(rule)?;
            }
            self.end("imsss:rollupRules")?;
        }

        if let Some(objectives) = &sequencing.objectives {
            self.start("imsss:objectives")?;
            if let Some(primary) = &objectives.primary {
                self.objective("imsss:primaryObjective", primary)?;
            }
            for objective in &objectives.list {
                self.objective("imsss:objective", objective)?;
            }
            self.end("imsss:objectives")?;
        }

        if let Some(randomization) = &sequencing.randomization_controls {
            let mut element = BytesStart::new("imsss:randomizationControls");
            if randomization.randomization_timing != Default::default() {
                element.push_attribute((
                    "randomizationTiming",
                    randomization.randomization_timing.as_str(),
                ));
            }
            if let Some(count) = randomization.select_count {
                element.push_attribute(("selectCount", count.to_string().as_str()));
            }
            if randomization.reorder_children {
                element.push_attribute(("reorderChildren", "true"));
            }
            if randomization.selection_timing != Default::default() {
                element.push_attribute((
                    "selectionTiming",
                    randomization.selection_timing.as_str(),
                ));
            }
            self.event(Event::Empty(element))?;
        }

        if let Some(delivery) = &sequencing.delivery_controls {
            let mut element = BytesStart::new("imsss:deliveryControls");
            if !delivery.tracked {
                element.push_attribute(("tracked", "false"));
            }
            if delivery.completion_set_by_content {
                element.push_attribute(("completionSetByContent", "true"));
            }
            if delivery.objective_set_by_content {
                element.push_attribute(("objectiveSetByContent", "true"));
            }
            self.event(Event::Empty(element))?;
        }

        if let Some(constrained) = &sequencing.constrained_choice_considerations {
            let mut element = BytesStart::new("adlseq:constrainedChoiceConsiderations");
            if constrained.prevent_activation {
                element.push_attribute(("preventActivation", "true"));
            }
            if constrained.constrain_choice {
                element.push_attribute(("constrainChoice", "true"));
            }
            self.event(Event::Empty(element))?;
        }

        if let Some(considerations) = &sequencing.rollup_considerations {
            let mut element = BytesStart::new("adlseq:rollupConsiderations");
            let defaults = crate::model::sequencing::RollupConsiderations::default();
            let pairs = [
                (
                    "requiredForSatisfied",
                    considerations.required_for_satisfied,
                    defaults.required_for_satisfied,
                ),
                (
                    "requiredForNotSatisfied",
                    considerations.required_for_not_satisfied,
                    defaults.required_for_not_satisfied,
                ),
                (
                    "requiredForCompleted",
                    considerations.required_for_completed,
                    defaults.required_for_completed,
                ),
                (
                    "requiredForIncomplete",
                    considerations.required_for_incomplete,
                    defaults.required_for_incomplete,
                ),
            ];
            for (name, value, default) in pairs {
                if value != default {
                    element.push_attribute((name, value.as_str()));
                }
            }
            if !considerations.measure_satisfaction_if_active {
                element.push_attribute(("measureSatisfactionIfActive", "false"));
            }
            self.event(Event::Empty(element))?;
        }

        self.end("imsss:sequencing")
    }

    fn sequencing_rule(&mut self, element: &str, rule: &SequencingRule) -> Result<(), WriteError> {
        self.start(element)?;
        self.rule_conditions(&rule.conditions)?;
        let mut action = BytesStart::new("imsss:ruleAction");
        action.push_attribute(("action", rule.action.as_str()));
        self.event(Event::Empty(action))?;
        self.end(element)
    }

    fn rule_conditions(&mut self, conditions: &RuleConditions) -> Result<(), WriteError> {
        let mut start = BytesStart::new("imsss:ruleConditions");
        if conditions.condition_combination != Default::default() {
            start.push_attribute((
                "conditionCombination",
                conditions.condition_combination.as_str(),
            ));
        }
        self.event(Event::Start(start))?;
        for condition in &conditions.conditions {
            let mut element = BytesStart::new("imsss:ruleCondition");
            if let Some(objective) = &condition.referenced_objective {
                element.push_attribute(("referencedObjective", objective.as_str()));
            }
            if let Some(threshold) = condition.measure_threshold {
                element.push_attribute((
                    "measureThreshold",
                    trim_float(threshold.value()).as_str(),
                ));
            }
            if condition.operator != Default::default() {
                element.push_attribute(("operator", condition.operator.as_str()));
            }
            element.push_attribute(("condition", condition.condition.as_str()));
            self.event(Event::Empty(element))?;
        }
        self.end("imsss:ruleConditions")
    }

    fn rollup_rule(&mut self, rule: &RollupRule) -> Result<(), WriteError> {
        let mut start = BytesStart::new("imsss:rollupRule");
        if rule.child_activity_set != Default::default() {
            start.push_attribute(("childActivitySet", rule.child_activity_set.as_str()));
        }
        if let Some(count) = rule.minimum_count {
            start.push_attribute(("minimumCount", count.to_string().as_str()));
        }
        if let Some(percent) = rule.minimum_percent {
            start.push_attribute(("minimumPercent", trim_float(percent.value()).as_str()));
        }
        self.event(Event::Start(start))?;

        let mut conditions = BytesStart::new("imsss:rollupConditions");
        if rule.conditions.condition_combination != crate::enums::ConditionCombination::Any {
            conditions.push_attribute((
                "conditionCombination",
                rule.conditions.condition_combination.as_str(),
            ));
        }
        self.event(Event::Start(conditions))?;
        for condition in &rule.conditions.conditions {
            let mut element = BytesStart::new("imsss:rollupCondition");
            if condition.operator != Default::default() {
                element.push_attribute(("operator", condition.operator.as_str()));
            }
            element.push_attribute(("condition", condition.condition.as_str()));
            self.event(Event::Empty(element))?;
        }
        self.end("imsss:rollupConditions")?;

        let mut action = BytesStart::new("imsss:rollupAction");
        action.push_attribute(("action", rule.action.as_str()));
        self.event(Event::Empty(action))?;
        self.end("imsss:rollupRule")
    }

    fn objective(&mut self, element: &str, objective: &Objective) -> Result<(), WriteError> {
        let mut start = BytesStart::new(element);
        if let Some(id) = &objective.objective_id {
            start.push_attribute(("objectiveID", id.as_str()));
        }
        if objective.satisfied_by_measure {
            start.push_attribute(("satisfiedByMeasure", "true"));
        }
        self.event(Event::Start(start))?;
        if let Some(measure) = objective.min_normalized_measure {
            self.text_element("imsss:minNormalizedMeasure", &trim_float(measure.value()))?;
        }
        for map in &objective.map_info {
            let mut element = BytesStart::new("imsss:mapInfo");
            element.push_attribute(("targetObjectiveID", map.target_objective_id.as_str()));
            if !map.read_satisfied_status {
                element.push_attribute(("readSatisfiedStatus", "false"));
            }
            if !map.read_normalized_measure {
                element.push_attribute(("readNormalizedMeasure", "false"));
            }
            if map.write_satisfied_status {
                element.push_attribute(("writeSatisfiedStatus", "true"));
            }
            if map.write_normalized_measure {
                element.push_attribute(("writeNormalizedMeasure", "true"));
            }
            self.event(Event::Empty(element))?;
        }
        self.end(element)
    }

    // -- primitives --------------------------------------------------------

    fn event(&mut self, event: Event<'_>) -> Result<(), WriteError> {
        self.writer.write_event(event).map_err(WriteError::new)
    }

    fn start(&mut self, name: &str) -> Result<(), WriteError> {
        self.event(Event::Start(BytesStart::new(name)))
    }

    fn end(&mut self, name: &str) -> Result<(), WriteError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), WriteError> {
        self.start(name)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }
}

/// Pushes a boolean attribute only when it differs from the schema default.
fn push_bool(element: &mut BytesStart<'_>, name: &str, value: bool, default: bool) {
    if value != default {
        element.push_attribute((name, if value { "true" } else { "false" }));
    }
}

/// Formats a float without a trailing `.0` (`80`, `0.8`, `-0.25`).
fn trim_float(value: f64) -> String {
    if value == value.trunc() {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use crate::parse::scorm::parse_scorm_text;
    use crate::validation::ValidationMode;

    use super::*;

    const ROUND_TRIP_12: &str = r#"<?xml version="1.0"?>
<manifest identifier="com.example.rt" version="1.0"
    xmlns="http://www.imsproject.org/xsd/imscp_rootv1p1p2"
    xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_rootv1p2">
  <metadata>
    <schema>ADL SCORM</schema>
    <schemaversion>1.2</schemaversion>
  </metadata>
  <organizations default="org1">
    <organization identifier="org1">
      <title>Round Trip</title>
      <item identifier="item1" identifierref="r1" parameters="?a=1">
        <title>One</title>
        <adlcp:masteryscore>80</adlcp:masteryscore>
        <adlcp:prerequisites>A &amp; B</adlcp:prerequisites>
      </item>
    </organization>
  </organizations>
  <resources>
    <resource identifier="r1" type="webcontent" adlcp:scormtype="sco" href="content/a.html">
      <file href="content/a.html"/>
      <dependency identifierref="r2"/>
    </resource>
    <resource identifier="r2" type="webcontent" adlcp:scormtype="asset">
      <file href="content/shared.css"/>
    </resource>
  </resources>
</manifest>"#;

    #[test]
    fn write_then_parse_is_identity_on_the_model() {
        let first = parse_scorm_text("imsmanifest.xml", ROUND_TRIP_12, ValidationMode::Strict)
            .expect("parses");
        let written =
            write_scorm(&first.manifest, first.module_type).expect("serializes");
        let second =
            parse_scorm_text("imsmanifest.xml", &written, ValidationMode::Strict).expect("re-parses");
        assert_eq!(second.manifest, first.manifest);
        assert_eq!(second.module_type, first.module_type);
        assert_eq!(second.launch_url, first.launch_url);
    }

    #[test]
    fn vocabulary_tokens_survive_verbatim() {
        let source = r#"<manifest identifier="m" xmlns:imsss="http://www.imsglobal.org/xsd/imsss">
  <metadata><schemaversion>2004 3rd Edition</schemaversion></metadata>
  <organizations default="org1">
    <organization identifier="org1">
      <title>T</title>
      <item identifier="i1" identifierref="r1">
        <title>I</title>
        <imsss:sequencing>
          <imsss:sequencingRules>
            <imsss:preConditionRule>
              <imsss:ruleConditions conditionCombination="any">
                <imsss:ruleCondition condition="attemptLimitExceeded"/>
                <imsss:ruleCondition operator="not" condition="satisfied"/>
              </imsss:ruleConditions>
              <imsss:ruleAction action="hiddenFromChoice"/>
            </imsss:preConditionRule>
          </imsss:sequencingRules>
          <imsss:limitConditions attemptLimit="2"/>
          <imsss:randomizationControls randomizationTiming="onEachNewAttempt" reorderChildren="true"/>
        </imsss:sequencing>
      </item>
    </organization>
  </organizations>
  <resources><resource identifier="r1" href="a.html"><file href="a.html"/></resource></resources>
</manifest>"#;
        let parsed = parse_scorm_text("imsmanifest.xml", source, ValidationMode::Strict)
            .expect("parses");
        let written = write_scorm(&parsed.manifest, parsed.module_type).expect("serializes");
        for token in [
            "attemptLimitExceeded",
            "hiddenFromChoice",
            "onEachNewAttempt",
            "conditionCombination=\"any\"",
            "operator=\"not\"",
            "attemptLimit=\"2\"",
            "reorderChildren=\"true\"",
        ] {
            assert!(written.contains(token), "missing {token} in:\n{written}");
        }
        let reparsed = parse_scorm_text("imsmanifest.xml", &written, ValidationMode::Strict)
            .expect("re-parses");
        assert_eq!(reparsed.manifest, parsed.manifest);
    }
}
