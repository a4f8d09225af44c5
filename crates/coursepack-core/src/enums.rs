/// Closed vocabularies shared across the four packaging specifications.
///
/// Every enum that mirrors a wire-format token set carries an `as_str`
/// method returning the exact serialized token, and serde impls (derived or
/// hand-written) that round-trip those tokens. Vocabulary tokens from the
/// IMSSS and adlcp schemas are camelCase on the wire and are preserved
/// verbatim.
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

// ---------------------------------------------------------------------------
// ModuleType
// ---------------------------------------------------------------------------

/// The edition tag carried by [`ModuleType::Scorm2004`].
///
/// Inferred from the `<schemaversion>` text of `imsmanifest.xml` combined
/// with the presence of the IMSSS namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scorm2004Edition {
    /// `<schemaversion>CAM 1.3</schemaversion>`.
    Second,
    /// `<schemaversion>2004 3rd Edition</schemaversion>`.
    Third,
    /// `<schemaversion>2004 4th Edition</schemaversion>`.
    Fourth,
}

impl Scorm2004Edition {
    /// Returns the `<schemaversion>` text associated with this edition.
    pub fn schema_version(self) -> &'static str {
        match self {
            Self::Second => "CAM 1.3",
            Self::Third => "2004 3rd Edition",
            Self::Fourth => "2004 4th Edition",
        }
    }

    /// Parses a `<schemaversion>` text into an edition.
    ///
    /// Whitespace is trimmed. Unrecognised text returns `None`; callers
    /// decide whether that is an error or a fallback to the default
    /// edition.
    pub fn from_schema_version(text: &str) -> Option<Self> {
        match text.trim() {
            "CAM 1.3" | "1.3" => Some(Self::Second),
            "2004 3rd Edition" => Some(Self::Third),
            "2004 4th Edition" => Some(Self::Fourth),
            _ => None,
        }
    }
}

/// The module taxonomy: which packaging specification a package conforms to.
///
/// This is a closed enumeration. Tin Can (`tincan.xml`) packages are
/// reported as [`ModuleType::Cmi5`] — both are xAPI course structures and
/// share the ingestion path; see the detector module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleType {
    /// SCORM 1.2 content package.
    Scorm12,
    /// SCORM 2004 content package, with its edition.
    Scorm2004(Scorm2004Edition),
    /// AICC (CMI001) course interchange files.
    Aicc,
    /// cmi5 / xAPI course structure.
    Cmi5,
}

impl ModuleType {
    /// Returns the canonical lowercase identifier for this module type.
    ///
    /// The SCORM 2004 editions are distinguished by a dotted suffix
    /// (`"scorm2004.3"` for the 3rd edition).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scorm12 => "scorm12",
            Self::Scorm2004(Scorm2004Edition::Second) => "scorm2004.2",
            Self::Scorm2004(Scorm2004Edition::Third) => "scorm2004.3",
            Self::Scorm2004(Scorm2004Edition::Fourth) => "scorm2004.4",
            Self::Aicc => "aicc",
            Self::Cmi5 => "cmi5",
        }
    }

    /// Parses the canonical identifier produced by [`ModuleType::as_str`].
    pub fn from_str_token(s: &str) -> Option<Self> {
        match s {
            "scorm12" => Some(Self::Scorm12),
            "scorm2004.2" => Some(Self::Scorm2004(Scorm2004Edition::Second)),
            "scorm2004.3" => Some(Self::Scorm2004(Scorm2004Edition::Third)),
            "scorm2004.4" => Some(Self::Scorm2004(Scorm2004Edition::Fourth)),
            "aicc" => Some(Self::Aicc),
            "cmi5" => Some(Self::Cmi5),
            _ => None,
        }
    }

    /// Returns `true` for either SCORM variant.
    pub fn is_scorm(&self) -> bool {
        matches!(self, Self::Scorm12 | Self::Scorm2004(_))
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ModuleType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ModuleType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str_token(&s)
            .ok_or_else(|| de::Error::custom(format!("unknown module type {s:?}")))
    }
}

// ---------------------------------------------------------------------------
// SCORM resource vocabulary
// ---------------------------------------------------------------------------

/// The `adlcp:scormType` (`adlcp:scormtype` in 1.2) of a resource.
///
/// Defaults to [`ScormType::Sco`] when the attribute is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScormType {
    /// A launchable object that communicates with the LMS runtime.
    #[default]
    Sco,
    /// A static asset with no runtime communication.
    Asset,
}

impl ScormType {
    /// Returns the wire token (`"sco"` / `"asset"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sco => "sco",
            Self::Asset => "asset",
        }
    }

    /// Parses the wire token, case-insensitively (content in the wild uses
    /// both `SCO` and `sco`).
    pub fn from_token(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sco" => Some(Self::Sco),
            "asset" => Some(Self::Asset),
            _ => None,
        }
    }
}

/// The `adlcp:timeLimitAction` vocabulary.
///
/// The wire tokens contain a comma and are preserved verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeLimitAction {
    /// `"exit,message"`.
    #[serde(rename = "exit,message")]
    ExitMessage,
    /// `"exit,no message"`.
    #[serde(rename = "exit,no message")]
    ExitNoMessage,
    /// `"continue,message"`.
    #[serde(rename = "continue,message")]
    ContinueMessage,
    /// `"continue,no message"`.
    #[serde(rename = "continue,no message")]
    ContinueNoMessage,
}

impl TimeLimitAction {
    /// Returns the wire token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExitMessage => "exit,message",
            Self::ExitNoMessage => "exit,no message",
            Self::ContinueMessage => "continue,message",
            Self::ContinueNoMessage => "continue,no message",
        }
    }

    /// Parses the wire token.
    pub fn from_token(s: &str) -> Option<Self> {
        match s.trim() {
            "exit,message" => Some(Self::ExitMessage),
            "exit,no message" => Some(Self::ExitNoMessage),
            "continue,message" => Some(Self::ContinueMessage),
            "continue,no message" => Some(Self::ContinueNoMessage),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// IMSSS rule vocabulary
// ---------------------------------------------------------------------------

/// How the conditions of a rule combine (`imsss:ruleConditions/@conditionCombination`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionCombination {
    /// Every condition must hold.
    #[default]
    All,
    /// At least one condition must hold.
    Any,
}

impl ConditionCombination {
    /// Returns the wire token (`"all"` / `"any"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Any => "any",
        }
    }

    /// Parses the wire token.
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "any" => Some(Self::Any),
            _ => None,
        }
    }
}

/// The unary operator applied to a rule condition (`@operator`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConditionOperator {
    /// `"noOp"` — the condition value is used as-is.
    #[default]
    #[serde(rename = "noOp")]
    NoOp,
    /// `"not"` — the condition value is negated.
    #[serde(rename = "not")]
    Not,
}

impl ConditionOperator {
    /// Returns the wire token (`"noOp"` / `"not"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoOp => "noOp",
            Self::Not => "not",
        }
    }

    /// Parses the wire token.
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "noOp" => Some(Self::NoOp),
            "not" => Some(Self::Not),
            _ => None,
        }
    }
}

/// The IMSSS condition vocabulary, shared by sequencing and rollup rules.
///
/// The camelCase wire tokens must survive serialization verbatim; LMS
/// sequencing engines dispatch on the exact strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SequencingRuleConditionType {
    /// The referenced objective is satisfied.
    Satisfied,
    /// The satisfaction status of the referenced objective is known.
    ObjectiveStatusKnown,
    /// The normalized measure of the referenced objective is known.
    ObjectiveMeasureKnown,
    /// The referenced objective's measure is greater than the threshold.
    ObjectiveMeasureGreaterThan,
    /// The referenced objective's measure is less than the threshold.
    ObjectiveMeasureLessThan,
    /// The activity is completed.
    Completed,
    /// The activity's progress status is known.
    ActivityProgressKnown,
    /// The activity has been attempted.
    Attempted,
    /// The activity's attempt limit has been exceeded.
    AttemptLimitExceeded,
    /// The activity's time limit has been exceeded.
    TimeLimitExceeded,
    /// The current time is outside the activity's available window.
    OutsideAvailableTimeRange,
    /// Unconditionally true.
    Always,
}

impl SequencingRuleConditionType {
    /// Returns the wire token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Satisfied => "satisfied",
            Self::ObjectiveStatusKnown => "objectiveStatusKnown",
            Self::ObjectiveMeasureKnown => "objectiveMeasureKnown",
            Self::ObjectiveMeasureGreaterThan => "objectiveMeasureGreaterThan",
            Self::ObjectiveMeasureLessThan => "objectiveMeasureLessThan",
            Self::Completed => "completed",
            Self::ActivityProgressKnown => "activityProgressKnown",
            Self::Attempted => "attempted",
            Self::AttemptLimitExceeded => "attemptLimitExceeded",
            Self::TimeLimitExceeded => "timeLimitExceeded",
            Self::OutsideAvailableTimeRange => "outsideAvailableTimeRange",
            Self::Always => "always",
        }
    }

    /// Parses the wire token.
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "satisfied" => Some(Self::Satisfied),
            "objectiveStatusKnown" => Some(Self::ObjectiveStatusKnown),
            "objectiveMeasureKnown" => Some(Self::ObjectiveMeasureKnown),
            "objectiveMeasureGreaterThan" => Some(Self::ObjectiveMeasureGreaterThan),
            "objectiveMeasureLessThan" => Some(Self::ObjectiveMeasureLessThan),
            "completed" => Some(Self::Completed),
            "activityProgressKnown" => Some(Self::ActivityProgressKnown),
            "attempted" => Some(Self::Attempted),
            "attemptLimitExceeded" => Some(Self::AttemptLimitExceeded),
            "timeLimitExceeded" => Some(Self::TimeLimitExceeded),
            "outsideAvailableTimeRange" => Some(Self::OutsideAvailableTimeRange),
            "always" => Some(Self::Always),
            _ => None,
        }
    }
}

/// The action a sequencing rule fires (`imsss:ruleAction/@action`).
///
/// One vocabulary covers pre-condition, post-condition, and exit-condition
/// rules; which subset is legal in which position is a validation concern,
/// not a parse concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleActionType {
    /// Pre: skip the activity during flow.
    Skip,
    /// Pre: the activity cannot be delivered.
    Disabled,
    /// Pre: hide the activity from choice navigation.
    HiddenFromChoice,
    /// Pre: stop forward-only traversal at this activity.
    StopForwardTraversal,
    /// Post: exit the parent activity.
    ExitParent,
    /// Post: exit every active activity.
    ExitAll,
    /// Post: retry the activity.
    Retry,
    /// Post: retry from the root.
    RetryAll,
    /// Post: continue to the next activity.
    #[serde(rename = "continue")]
    Continue,
    /// Post: go back to the previous activity.
    Previous,
    /// Exit: the activity exits.
    Exit,
}

impl RuleActionType {
    /// Returns the wire token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Disabled => "disabled",
            Self::HiddenFromChoice => "hiddenFromChoice",
            Self::StopForwardTraversal => "stopForwardTraversal",
            Self::ExitParent => "exitParent",
            Self::ExitAll => "exitAll",
            Self::Retry => "retry",
            Self::RetryAll => "retryAll",
            Self::Continue => "continue",
            Self::Previous => "previous",
            Self::Exit => "exit",
        }
    }

    /// Parses the wire token.
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "skip" => Some(Self::Skip),
            "disabled" => Some(Self::Disabled),
            "hiddenFromChoice" => Some(Self::HiddenFromChoice),
            "stopForwardTraversal" => Some(Self::StopForwardTraversal),
            "exitParent" => Some(Self::ExitParent),
            "exitAll" => Some(Self::ExitAll),
            "retry" => Some(Self::Retry),
            "retryAll" => Some(Self::RetryAll),
            "continue" => Some(Self::Continue),
            "previous" => Some(Self::Previous),
            "exit" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// The state a rollup rule writes into the parent (`imsss:rollupAction/@action`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RollupActionType {
    /// Mark the parent objective satisfied.
    Satisfied,
    /// Mark the parent objective not satisfied.
    NotSatisfied,
    /// Mark the parent activity completed.
    Completed,
    /// Mark the parent activity incomplete.
    Incomplete,
}

impl RollupActionType {
    /// Returns the wire token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Satisfied => "satisfied",
            Self::NotSatisfied => "notSatisfied",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
        }
    }

    /// Parses the wire token.
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "satisfied" => Some(Self::Satisfied),
            "notSatisfied" => Some(Self::NotSatisfied),
            "completed" => Some(Self::Completed),
            "incomplete" => Some(Self::Incomplete),
            _ => None,
        }
    }
}

/// Which children a rollup rule considers (`imsss:rollupRule/@childActivitySet`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RollupChildActivitySet {
    /// Every child contributes.
    #[default]
    All,
    /// Any single child suffices.
    Any,
    /// No child may satisfy the conditions.
    None,
    /// At least `minimumCount` children.
    AtLeastCount,
    /// At least `minimumPercent` of children.
    AtLeastPercent,
}

impl RollupChildActivitySet {
    /// Returns the wire token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Any => "any",
            Self::None => "none",
            Self::AtLeastCount => "atLeastCount",
            Self::AtLeastPercent => "atLeastPercent",
        }
    }

    /// Parses the wire token.
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "any" => Some(Self::Any),
            "none" => Some(Self::None),
            "atLeastCount" => Some(Self::AtLeastCount),
            "atLeastPercent" => Some(Self::AtLeastPercent),
            _ => None,
        }
    }
}

/// When randomization or selection happens
/// (`imsss:randomizationControls/@randomizationTiming` and `@selectionTiming`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RandomizationTiming {
    /// Never reorder / select.
    #[default]
    Never,
    /// Once, on the first attempt.
    Once,
    /// On every new attempt.
    OnEachNewAttempt,
}

impl RandomizationTiming {
    /// Returns the wire token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Once => "once",
            Self::OnEachNewAttempt => "onEachNewAttempt",
        }
    }

    /// Parses the wire token.
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "never" => Some(Self::Never),
            "once" => Some(Self::Once),
            "onEachNewAttempt" => Some(Self::OnEachNewAttempt),
            _ => None,
        }
    }
}

/// The adlseq `requiredForSatisfied` / `requiredForCompleted` vocabulary on
/// rollup considerations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RollupRequired {
    /// Always contributes to rollup.
    #[default]
    Always,
    /// Contributes only if attempted.
    IfAttempted,
    /// Contributes unless skipped by a pre-condition rule.
    IfNotSkipped,
    /// Contributes unless suspended.
    IfNotSuspended,
}

impl RollupRequired {
    /// Returns the wire token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::IfAttempted => "ifAttempted",
            Self::IfNotSkipped => "ifNotSkipped",
            Self::IfNotSuspended => "ifNotSuspended",
        }
    }

    /// Parses the wire token.
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "always" => Some(Self::Always),
            "ifAttempted" => Some(Self::IfAttempted),
            "ifNotSkipped" => Some(Self::IfNotSkipped),
            "ifNotSuspended" => Some(Self::IfNotSuspended),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// cmi5 vocabulary
// ---------------------------------------------------------------------------

/// How a cmi5 assignable unit is launched (`<au launchMethod="...">`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaunchMethod {
    /// The AU must own its browsing context.
    #[serde(rename = "OwnWindow")]
    OwnWindow,
    /// The LMS may reuse its own window.
    #[serde(rename = "AnyWindow")]
    AnyWindow,
}

impl LaunchMethod {
    /// Returns the wire token (`"OwnWindow"` / `"AnyWindow"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OwnWindow => "OwnWindow",
            Self::AnyWindow => "AnyWindow",
        }
    }

    /// Parses the wire token.
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "OwnWindow" => Some(Self::OwnWindow),
            "AnyWindow" => Some(Self::AnyWindow),
            _ => None,
        }
    }
}

/// The cmi5 `moveOn` criterion: which statement pattern completes the AU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveOn {
    /// A `passed` statement.
    #[serde(rename = "Passed")]
    Passed,
    /// A `completed` statement.
    #[serde(rename = "Completed")]
    Completed,
    /// Both `completed` and `passed`.
    #[serde(rename = "CompletedAndPassed")]
    CompletedAndPassed,
    /// Either `completed` or `passed`.
    #[serde(rename = "CompletedOrPassed")]
    CompletedOrPassed,
    /// The AU never moves on by statement.
    #[serde(rename = "NotApplicable")]
    NotApplicable,
}

impl MoveOn {
    /// Returns the wire token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "Passed",
            Self::Completed => "Completed",
            Self::CompletedAndPassed => "CompletedAndPassed",
            Self::CompletedOrPassed => "CompletedOrPassed",
            Self::NotApplicable => "NotApplicable",
        }
    }

    /// Parses the wire token.
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "Passed" => Some(Self::Passed),
            "Completed" => Some(Self::Completed),
            "CompletedAndPassed" => Some(Self::CompletedAndPassed),
            "CompletedOrPassed" => Some(Self::CompletedOrPassed),
            "NotApplicable" => Some(Self::NotApplicable),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Derived classification
// ---------------------------------------------------------------------------

/// How much of the IMSSS machinery a parsed module actually uses.
///
/// Computed during metadata projection; AICC, cmi5, and SCORM 1.2 modules
/// always report [`SequencingLevel::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequencingLevel {
    /// No sequencing information at all.
    #[default]
    None,
    /// Control mode or delivery controls only; no rules.
    Minimal,
    /// Sequencing rules, rollup rules, or randomization controls present.
    Full,
}

impl fmt::Display for SequencingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Minimal => f.write_str("minimal"),
            Self::Full => f.write_str("full"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn module_type_tokens_round_trip() {
        for mt in [
            ModuleType::Scorm12,
            ModuleType::Scorm2004(Scorm2004Edition::Second),
            ModuleType::Scorm2004(Scorm2004Edition::Third),
            ModuleType::Scorm2004(Scorm2004Edition::Fourth),
            ModuleType::Aicc,
            ModuleType::Cmi5,
        ] {
            assert_eq!(ModuleType::from_str_token(mt.as_str()), Some(mt));
        }
    }

    #[test]
    fn edition_from_schema_version() {
        assert_eq!(
            Scorm2004Edition::from_schema_version("CAM 1.3"),
            Some(Scorm2004Edition::Second)
        );
        assert_eq!(
            Scorm2004Edition::from_schema_version("  2004 3rd Edition "),
            Some(Scorm2004Edition::Third)
        );
        assert_eq!(
            Scorm2004Edition::from_schema_version("2004 4th Edition"),
            Some(Scorm2004Edition::Fourth)
        );
        assert_eq!(Scorm2004Edition::from_schema_version("1.2"), None);
    }

    #[test]
    fn condition_tokens_verbatim() {
        assert_eq!(
            SequencingRuleConditionType::ObjectiveStatusKnown.as_str(),
            "objectiveStatusKnown"
        );
        assert_eq!(
            SequencingRuleConditionType::OutsideAvailableTimeRange.as_str(),
            "outsideAvailableTimeRange"
        );
        assert_eq!(RuleActionType::Continue.as_str(), "continue");
        assert_eq!(RuleActionType::HiddenFromChoice.as_str(), "hiddenFromChoice");
        assert_eq!(
            RandomizationTiming::OnEachNewAttempt.as_str(),
            "onEachNewAttempt"
        );
    }

    #[test]
    fn condition_serde_matches_as_str() {
        let all = [
            SequencingRuleConditionType::Satisfied,
            SequencingRuleConditionType::ObjectiveStatusKnown,
            SequencingRuleConditionType::ObjectiveMeasureKnown,
            SequencingRuleConditionType::ObjectiveMeasureGreaterThan,
            SequencingRuleConditionType::ObjectiveMeasureLessThan,
            SequencingRuleConditionType::Completed,
            SequencingRuleConditionType::ActivityProgressKnown,
            SequencingRuleConditionType::Attempted,
            SequencingRuleConditionType::AttemptLimitExceeded,
            SequencingRuleConditionType::TimeLimitExceeded,
            SequencingRuleConditionType::OutsideAvailableTimeRange,
            SequencingRuleConditionType::Always,
        ];
        for cond in all {
            let json = serde_json::to_string(&cond).expect("condition serializes");
            assert_eq!(json, format!("\"{}\"", cond.as_str()));
            assert_eq!(SequencingRuleConditionType::from_token(cond.as_str()), Some(cond));
        }
    }

    #[test]
    fn time_limit_action_tokens() {
        assert_eq!(
            TimeLimitAction::from_token("continue,no message"),
            Some(TimeLimitAction::ContinueNoMessage)
        );
        assert_eq!(TimeLimitAction::ExitMessage.as_str(), "exit,message");
        assert_eq!(TimeLimitAction::from_token("halt"), None);
    }

    #[test]
    fn move_on_and_launch_method_tokens() {
        assert_eq!(MoveOn::CompletedOrPassed.as_str(), "CompletedOrPassed");
        assert_eq!(MoveOn::from_token("NotApplicable"), Some(MoveOn::NotApplicable));
        assert_eq!(LaunchMethod::from_token("OwnWindow"), Some(LaunchMethod::OwnWindow));
        assert_eq!(LaunchMethod::from_token("ownwindow"), None);
    }
}
