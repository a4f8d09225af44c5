/// Structural validation rules shared by SCORM 1.2 and 2004 manifests.
///
/// Each rule is a stateless struct implementing
/// [`ValidationRule<ScormContext>`]; the registry in [`scorm_rules`]
/// assembles them (plus the sequencing rules for 2004 manifests) and
/// [`validate_scorm`] folds the results. Issue codes are prefix-selected
/// through [`ScormCodes`](crate::resolve::ScormCodes) so one rule body
/// serves both generations.
use std::collections::BTreeMap;

use crate::enums::ModuleType;
use crate::model::scorm::ScormManifest;
use crate::prereq;
use crate::resolve::{ResolvedScorm, ScormCodes};

use super::{
    run_rules, IssueCode, ValidationIssue, ValidationMode, ValidationResult, ValidationRule,
};

/// Everything the SCORM rules need to see.
pub struct ScormContext<'a> {
    /// The typed manifest.
    pub manifest: &'a ScormManifest,
    /// 1.2 or 2004-with-edition; selects the code prefix and the
    /// sequencing rule set.
    pub module_type: ModuleType,
    /// The resolver's output (index maps, reachability, activity tree).
    pub resolution: &'a ResolvedScorm,
}

impl ScormContext<'_> {
    fn codes(&self) -> ScormCodes {
        ScormCodes::for_module(self.module_type)
    }
}

/// Builds the rule registry for the given module type.
pub fn scorm_rules<'a>(
    module_type: ModuleType,
) -> Vec<Box<dyn ValidationRule<ScormContext<'a>> + 'a>> {
    let mut rules: Vec<Box<dyn ValidationRule<ScormContext<'a>> + 'a>> = vec![
        Box::new(ManifestIdentifierRule),
        Box::new(IdentifierUniquenessRule),
        Box::new(OrganizationsRule),
        Box::new(ResourcesRule),
        Box::new(LaunchableResourceRule),
        Box::new(ResourceHrefRule),
        Box::new(OrphanedResourcesRule),
        Box::new(PrerequisitesSyntaxRule),
    ];
    if matches!(module_type, ModuleType::Scorm2004(_)) {
        rules.extend(super::rules_sequencing::sequencing_rules());
    }
    rules
}

/// Runs the full SCORM rule set over a context.
pub fn validate_scorm(ctx: &ScormContext<'_>, mode: ValidationMode) -> ValidationResult {
    run_rules(&scorm_rules(ctx.module_type), ctx, mode)
}

// ---------------------------------------------------------------------------
// Manifest identifier presence
// ---------------------------------------------------------------------------

/// The manifest identifier must be non-empty after trimming.
pub struct ManifestIdentifierRule;

impl ValidationRule<ScormContext<'_>> for ManifestIdentifierRule {
    fn name(&self) -> &'static str {
        "manifest-identifier"
    }

    fn validate(&self, ctx: &ScormContext<'_>, mode: ValidationMode) -> ValidationResult {
        if ctx.manifest.identifier.trim().is_empty() {
            return ValidationResult::of(ValidationIssue::error(
                mode,
                ctx.codes().missing_identifier,
                "manifest has no identifier",
                "manifest/@identifier",
            ));
        }
        ValidationResult::valid()
    }
}

// ---------------------------------------------------------------------------
// Identifier uniqueness across scopes
// ---------------------------------------------------------------------------

/// Identifiers must be unique across the manifest, organization, item,
/// and resource scopes *combined*.
///
/// Same-scope duplicates (two resources sharing an id) are reported by
/// the resolver, which also decides the first-wins lookup; this rule
/// covers the cross-scope collisions the resolver's per-scope maps
/// cannot see.
pub struct IdentifierUniquenessRule;

impl ValidationRule<ScormContext<'_>> for IdentifierUniquenessRule {
    fn name(&self) -> &'static str {
        "identifier-uniqueness"
    }

    fn validate(&self, ctx: &ScormContext<'_>, mode: ValidationMode) -> ValidationResult {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Scope {
            Manifest,
            Organization,
            Item,
            Resource,
        }

        // Collect every identifier with its scope and location, then scan
        // once; all borrows point into the manifest.
        let mut entries: Vec<(&str, Scope, String)> = Vec::new();
        entries.push((
            ctx.manifest.identifier.as_str(),
            Scope::Manifest,
            "manifest/@identifier".to_owned(),
        ));
        for organization in &ctx.manifest.organizations.list {
            entries.push((
                organization.identifier.as_str(),
                Scope::Organization,
                format!("organization[@identifier='{}']", organization.identifier),
            ));
            for top in &organization.items {
                for item in top.descendants() {
                    entries.push((
                        item.identifier.as_str(),
                        Scope::Item,
                        format!(
                            "organization[@identifier='{}']/item[@identifier='{}']",
                            organization.identifier, item.identifier
                        ),
                    ));
                }
            }
        }
        for resource in &ctx.manifest.resources {
            entries.push((
                resource.identifier.as_str(),
                Scope::Resource,
                format!("resource[@identifier='{}']", resource.identifier),
            ));
        }

        let mut result = ValidationResult::valid();
        let mut seen: BTreeMap<&str, Scope> = BTreeMap::new();
        for (identifier, scope, location) in entries {
            match seen.get(identifier) {
                None => {
                    seen.insert(identifier, scope);
                }
                Some(&first_scope) if first_scope != scope => {
                    result.push(ValidationIssue::error(
                        mode,
                        ctx.codes().duplicate_identifier,
                        format!("identifier \"{identifier}\" is reused across scopes"),
                        location,
                    ));
                }
                Some(_) => {}
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Organizations presence + default reference
// ---------------------------------------------------------------------------

/// At least one organization must exist, and the `default` reference
/// must resolve when present.
pub struct OrganizationsRule;

impl ValidationRule<ScormContext<'_>> for OrganizationsRule {
    fn name(&self) -> &'static str {
        "organizations"
    }

    fn validate(&self, ctx: &ScormContext<'_>, mode: ValidationMode) -> ValidationResult {
        let organizations = &ctx.manifest.organizations;
        if organizations.list.is_empty() {
            return ValidationResult::of(ValidationIssue::error(
                mode,
                ctx.codes().missing_organizations,
                "manifest declares no organizations",
                "manifest/organizations",
            ));
        }
        if let Some(default) = organizations.default.as_deref() {
            if !organizations.list.iter().any(|o| o.identifier == default) {
                return ValidationResult::of(ValidationIssue::error(
                    mode,
                    ctx.codes().invalid_default_organization,
                    format!("default organization \"{default}\" is not in the list"),
                    "organizations/@default",
                ));
            }
        }
        ValidationResult::valid()
    }
}

// ---------------------------------------------------------------------------
// Resources presence + identifierref resolution
// ---------------------------------------------------------------------------

/// The resource list must be non-empty, and every item `identifierref`
/// must resolve against it.
pub struct ResourcesRule;

impl ValidationRule<ScormContext<'_>> for ResourcesRule {
    fn name(&self) -> &'static str {
        "resources"
    }

    fn validate(&self, ctx: &ScormContext<'_>, mode: ValidationMode) -> ValidationResult {
        let mut result = ValidationResult::valid();
        if ctx.manifest.resources.is_empty() {
            result.push(ValidationIssue::error(
                mode,
                ctx.codes().missing_resources,
                "manifest declares no resources",
                "manifest/resources",
            ));
        }
        for node in &ctx.resolution.tree.nodes {
            let Some(reference) = node.resource_identifier.as_deref() else {
                continue;
            };
            if !ctx.resolution.resource_by_id.contains_key(reference) {
                result.push(ValidationIssue::error(
                    mode,
                    ctx.codes().missing_resource_ref,
                    format!("item references unknown resource \"{reference}\""),
                    format!(
                        "organization[@identifier='{}']/item[@identifier='{}']/@identifierref",
                        node.organization, node.item_identifier
                    ),
                ));
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Launchable resource per organization
// ---------------------------------------------------------------------------

/// Every organization must transitively contain at least one item with
/// an `identifierref`.
pub struct LaunchableResourceRule;

impl ValidationRule<ScormContext<'_>> for LaunchableResourceRule {
    fn name(&self) -> &'static str {
        "launchable-resource"
    }

    fn validate(&self, ctx: &ScormContext<'_>, mode: ValidationMode) -> ValidationResult {
        let mut result = ValidationResult::valid();
        for organization in &ctx.manifest.organizations.list {
            let launchable = organization
                .items
                .iter()
                .flat_map(|top| top.descendants())
                .any(|item| item.identifier_ref.is_some());
            if !launchable {
                result.push(ValidationIssue::error(
                    mode,
                    ctx.codes().no_launchable_item,
                    format!(
                        "organization \"{}\" contains no launchable item",
                        organization.identifier
                    ),
                    format!("organization[@identifier='{}']", organization.identifier),
                ));
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Referenced resources need an href
// ---------------------------------------------------------------------------

/// A resource referenced by any item must carry an `href`.
pub struct ResourceHrefRule;

impl ValidationRule<ScormContext<'_>> for ResourceHrefRule {
    fn name(&self) -> &'static str {
        "resource-href"
    }

    fn validate(&self, ctx: &ScormContext<'_>, mode: ValidationMode) -> ValidationResult {
        let mut result = ValidationResult::valid();
        for node in &ctx.resolution.tree.nodes {
            let Some(reference) = node.resource_identifier.as_deref() else {
                continue;
            };
            let Some(&index) = ctx.resolution.resource_by_id.get(reference) else {
                continue; // ResourcesRule reports the broken reference.
            };
            if ctx.manifest.resources[index].href.is_none() {
                result.push(ValidationIssue::error(
                    mode,
                    ctx.codes().missing_resource_href,
                    format!("resource \"{reference}\" is launched but has no href"),
                    format!("resource[@identifier='{reference}']/@href"),
                ));
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Orphaned resources (warning)
// ---------------------------------------------------------------------------

/// Resources no item reaches, directly or through dependencies.
pub struct OrphanedResourcesRule;

impl ValidationRule<ScormContext<'_>> for OrphanedResourcesRule {
    fn name(&self) -> &'static str {
        "orphaned-resources"
    }

    fn validate(&self, ctx: &ScormContext<'_>, mode: ValidationMode) -> ValidationResult {
        let mut result = ValidationResult::valid();
        for resource in &ctx.manifest.resources {
            if !ctx
                .resolution
                .referenced_resources
                .contains(&resource.identifier)
            {
                result.push(ValidationIssue::warning(
                    mode,
                    ctx.codes().orphaned_resource,
                    format!("resource \"{}\" is never referenced", resource.identifier),
                    format!("resource[@identifier='{}']", resource.identifier),
                ));
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// SCORM 1.2 prerequisites syntax
// ---------------------------------------------------------------------------

/// `adlcp:prerequisites` expressions must parse in the AICC script
/// dialect. (2004 manifests express the same intent through IMSSS rules
/// instead; the element still appears in converted content, so the rule
/// runs for both generations.)
pub struct PrerequisitesSyntaxRule;

impl ValidationRule<ScormContext<'_>> for PrerequisitesSyntaxRule {
    fn name(&self) -> &'static str {
        "prerequisites-syntax"
    }

    fn validate(&self, ctx: &ScormContext<'_>, mode: ValidationMode) -> ValidationResult {
        let mut result = ValidationResult::valid();
        for organization in &ctx.manifest.organizations.list {
            for top in &organization.items {
                for item in top.descendants() {
                    let Some(expression) = item.prerequisites.as_deref() else {
                        continue;
                    };
                    if let Err(e) = prereq::parse(expression) {
                        result.push(ValidationIssue::warning(
                            mode,
                            IssueCode::Scorm12InvalidPrerequisites,
                            format!("prerequisites expression does not parse: {e}"),
                            format!(
                                "organization[@identifier='{}']/item[@identifier='{}']/adlcp:prerequisites",
                                organization.identifier, item.identifier
                            ),
                        ));
                    }
                }
            }
        }
        result
    }
}
