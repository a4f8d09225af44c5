/// Cross-reference resolution for SCORM manifests.
///
/// Takes a parsed [`ScormManifest`] and produces the flattened activity
/// tree plus the index maps downstream stages need:
///
/// - `item_by_id` / `resource_by_id` — string key → arena/list index,
///   first occurrence winning on duplicates so lookups stay
///   deterministic (the duplicate itself is reported as an issue);
/// - the global-objective namespace (every `targetObjectiveID` written by
///   a `mapInfo` with `writeSatisfiedStatus`);
/// - file-existence verification of every `href` through the file-access
///   contract.
///
/// The activity tree is strictly a tree: nodes live in one arena vector,
/// parent and children links are indices, never owning pointers.
/// Sequencing `IDRef` indirection is materialized here by arena lookup
/// into the manifest's sequencing collection, with in-progress marking to
/// break reference cycles.
use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::enums::ModuleType;
use crate::file_access::FileAccess;
use crate::model::scorm::{Item, Organization, ScormManifest};
use crate::model::sequencing::Sequencing;
use crate::validation::{IssueCode, ValidationIssue, ValidationMode, ValidationResult};

// ---------------------------------------------------------------------------
// Code selection
// ---------------------------------------------------------------------------

/// The spec-prefixed issue codes shared by the two SCORM generations.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScormCodes {
    pub duplicate_identifier: IssueCode,
    pub missing_resource_ref: IssueCode,
    pub missing_file: IssueCode,
    pub dependency_cycle: IssueCode,
    pub missing_identifier: IssueCode,
    pub missing_organizations: IssueCode,
    pub invalid_default_organization: IssueCode,
    pub missing_resources: IssueCode,
    pub no_launchable_item: IssueCode,
    pub missing_resource_href: IssueCode,
    pub orphaned_resource: IssueCode,
}

impl ScormCodes {
    pub(crate) fn for_module(module_type: ModuleType) -> Self {
        match module_type {
            ModuleType::Scorm2004(_) => Self {
                duplicate_identifier: IssueCode::Scorm2004DuplicateIdentifier,
                missing_resource_ref: IssueCode::Scorm2004MissingResourceRef,
                missing_file: IssueCode::Scorm2004MissingFile,
                dependency_cycle: IssueCode::Scorm2004DependencyCycle,
                missing_identifier: IssueCode::Scorm2004MissingIdentifier,
                missing_organizations: IssueCode::Scorm2004MissingOrganizations,
                invalid_default_organization: IssueCode::Scorm2004InvalidDefaultOrganization,
                missing_resources: IssueCode::Scorm2004MissingResources,
                no_launchable_item: IssueCode::Scorm2004NoLaunchableItem,
                missing_resource_href: IssueCode::Scorm2004MissingResourceHref,
                orphaned_resource: IssueCode::Scorm2004OrphanedResource,
            },
            ModuleType::Scorm12 | ModuleType::Aicc | ModuleType::Cmi5 => Self {
                duplicate_identifier: IssueCode::Scorm12DuplicateIdentifier,
                missing_resource_ref: IssueCode::Scorm12MissingResourceRef,
                missing_file: IssueCode::Scorm12MissingFile,
                dependency_cycle: IssueCode::Scorm12DependencyCycle,
                missing_identifier: IssueCode::Scorm12MissingIdentifier,
                missing_organizations: IssueCode::Scorm12MissingOrganizations,
                invalid_default_organization: IssueCode::Scorm12InvalidDefaultOrganization,
                missing_resources: IssueCode::Scorm12MissingResources,
                no_launchable_item: IssueCode::Scorm12NoLaunchableItem,
                missing_resource_href: IssueCode::Scorm12MissingResourceHref,
                orphaned_resource: IssueCode::Scorm12OrphanedResource,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Activity tree
// ---------------------------------------------------------------------------

/// One node of the flattened activity tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityNode {
    /// Arena index of the parent, `None` for organization-level roots.
    pub parent: Option<usize>,
    /// Arena indices of the children, in document order.
    pub children: Vec<usize>,
    /// Identifier of the organization this node belongs to.
    pub organization: String,
    /// The item's identifier.
    pub item_identifier: String,
    /// The item's title.
    pub title: String,
    /// `true` when the item has no child items.
    pub is_leaf: bool,
    /// The item's visibility flag (default `true`).
    pub is_visible: bool,
    /// The referenced resource identifier (leaves only, when launchable).
    pub resource_identifier: Option<String>,
    /// The materialized sequencing block: inline content overlaid on the
    /// collection entry its `IDRef` names.
    pub sequencing: Option<Sequencing>,
}

/// The arena of activity nodes across all organizations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityTree {
    /// All nodes; indices are stable identifiers.
    pub nodes: Vec<ActivityNode>,
    /// Indices of organization-level root items, in document order.
    pub roots: Vec<usize>,
}

impl ActivityTree {
    /// Depth-first iteration over the subtree rooted at `index`.
    pub fn descendants(&self, index: usize) -> Vec<usize> {
        let mut out = vec![index];
        let mut cursor = 0;
        while cursor < out.len() {
            let node = &self.nodes[out[cursor]];
            out.extend(node.children.iter().copied());
            cursor += 1;
        }
        out
    }
}

/// The full output of cross-reference resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolvedScorm {
    /// The flattened activity tree.
    pub tree: ActivityTree,
    /// Item identifier → arena index (first occurrence wins).
    pub item_by_id: BTreeMap<String, usize>,
    /// Resource identifier → index into `manifest.resources` (first wins).
    pub resource_by_id: BTreeMap<String, usize>,
    /// Global objective ids written by local objectives.
    pub global_objective_ids: BTreeSet<String>,
    /// Resource identifiers reachable from items (directly or through
    /// dependency closure); feeds the orphan rule.
    pub referenced_resources: BTreeSet<String>,
    /// Issues found while resolving (duplicates, cycles, missing files).
    pub issues: ValidationResult,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolves a manifest. `fa` is consulted for file existence when given;
/// pass `None` to resolve a detached manifest (model-only tests).
pub fn resolve_scorm(
    manifest: &ScormManifest,
    module_type: ModuleType,
    fa: Option<&dyn FileAccess>,
    mode: ValidationMode,
) -> ResolvedScorm {
    let codes = ScormCodes::for_module(module_type);
    let mut resolved = ResolvedScorm::default();

    index_resources(manifest, codes, mode, &mut resolved);
    build_activity_tree(manifest, codes, mode, &mut resolved);
    let nodes = resolved.tree.nodes.clone();
    collect_global_objectives(manifest, &nodes, mode, &mut resolved);
    close_dependencies(manifest, codes, mode, &mut resolved);
    if let Some(fa) = fa {
        verify_files(manifest, codes, mode, fa, &mut resolved);
    }

    debug!(
        nodes = resolved.tree.nodes.len(),
        globals = resolved.global_objective_ids.len(),
        issues = resolved.issues.len(),
        "resolved manifest"
    );
    resolved
}

fn index_resources(
    manifest: &ScormManifest,
    codes: ScormCodes,
    mode: ValidationMode,
    resolved: &mut ResolvedScorm,
) {
    for (index, resource) in manifest.resources.iter().enumerate() {
        if resolved
            .resource_by_id
            .contains_key(&resource.identifier)
        {
            resolved.issues.push(ValidationIssue::error(
                mode,
                codes.duplicate_identifier,
                format!("duplicate resource identifier \"{}\"", resource.identifier),
                format!("resource[@identifier='{}']", resource.identifier),
            ));
            continue;
        }
        resolved
            .resource_by_id
            .insert(resource.identifier.clone(), index);
    }
}

fn build_activity_tree(
    manifest: &ScormManifest,
    codes: ScormCodes,
    mode: ValidationMode,
    resolved: &mut ResolvedScorm,
) {
    for organization in &manifest.organizations.list {
        for item in &organization.items {
            let root = add_item(manifest, organization, item, None, codes, mode, resolved);
            resolved.tree.roots.push(root);
        }
    }
}

fn add_item(
    manifest: &ScormManifest,
    organization: &Organization,
    item: &Item,
    parent: Option<usize>,
    codes: ScormCodes,
    mode: ValidationMode,
    resolved: &mut ResolvedScorm,
) -> usize {
    let index = resolved.tree.nodes.len();
    let sequencing = item
        .sequencing
        .as_ref()
        .map(|s| materialize_sequencing(manifest, s, mode, &mut resolved.issues));

    resolved.tree.nodes.push(ActivityNode {
        parent,
        children: Vec::new(),
        organization: organization.identifier.clone(),
        item_identifier: item.identifier.clone(),
        title: item.title.clone(),
        is_leaf: item.is_leaf(),
        is_visible: item.is_visible,
        resource_identifier: item.identifier_ref.clone(),
        sequencing,
    });

    if resolved.item_by_id.contains_key(&item.identifier) {
        resolved.issues.push(ValidationIssue::error(
            mode,
            codes.duplicate_identifier,
            format!("duplicate item identifier \"{}\"", item.identifier),
            format!(
                "organization[@identifier='{}']/item[@identifier='{}']",
                organization.identifier, item.identifier
            ),
        ));
    } else {
        resolved
            .item_by_id
            .insert(item.identifier.clone(), index);
    }

    for child in &item.items {
        let child_index =
            add_item(manifest, organization, child, Some(index), codes, mode, resolved);
        resolved.tree.nodes[index].children.push(child_index);
    }
    index
}

/// Materializes a sequencing block by resolving its `IDRef` chain against
/// the manifest collection.
///
/// Inline content wins field-by-field over referenced content. Chains are
/// followed transitively with an in-progress set; a cycle breaks the
/// offending reference (the inline content survives) and reports
/// [`IssueCode::Scorm2004SequencingRefCycle`].
fn materialize_sequencing(
    manifest: &ScormManifest,
    sequencing: &Sequencing,
    mode: ValidationMode,
    issues: &mut ValidationResult,
) -> Sequencing {
    let mut merged = sequencing.clone();
    let mut in_progress: BTreeSet<String> = BTreeSet::new();
    let mut current_ref = sequencing.id_ref.clone();

    while let Some(reference) = current_ref {
        if !in_progress.insert(reference.clone()) {
            issues.push(ValidationIssue::error(
                mode,
                IssueCode::Scorm2004SequencingRefCycle,
                format!("sequencing IDRef chain loops through \"{reference}\""),
                format!("imsss:sequencing[@IDRef='{reference}']"),
            ));
            break;
        }
        let Some(entry) = manifest.collection_entry(&reference) else {
            issues.push(ValidationIssue::error(
                mode,
                IssueCode::Scorm2004UnresolvedSequencingRef,
                format!("sequencing IDRef \"{reference}\" names no collection entry"),
                format!("imsss:sequencing[@IDRef='{reference}']"),
            ));
            break;
        };
        overlay_sequencing(&mut merged, entry);
        current_ref = entry.id_ref.clone();
    }

    merged.id_ref = sequencing.id_ref.clone();
    merged
}

/// Fills every `None` field of `target` from `source`.
fn overlay_sequencing(target: &mut Sequencing, source: &Sequencing) {
    macro_rules! fill {
        ($field:ident) => {
            if target.$field.is_none() {
                target.$field = source.$field.clone();
            }
        };
    }
    fill!(control_mode);
    fill!(sequencing_rules);
    fill!(limit_conditions);
    fill!(rollup_rules);
    fill!(objectives);
    fill!(randomization_controls);
    fill!(delivery_controls);
    fill!(constrained_choice_considerations);
    fill!(rollup_considerations);
}

fn collect_global_objectives(
    manifest: &ScormManifest,
    nodes: &[ActivityNode],
    mode: ValidationMode,
    resolved: &mut ResolvedScorm,
) {
    let mut writers: BTreeMap<String, usize> = BTreeMap::new();

    let mut visit = |sequencing: &Sequencing| {
        let Some(objectives) = sequencing.objectives.as_ref() else {
            return;
        };
        for objective in objectives.iter() {
            for map in &objective.map_info {
                if map.write_satisfied_status || map.write_normalized_measure {
                    *writers.entry(map.target_objective_id.clone()).or_insert(0) += 1;
                    resolved
                        .global_objective_ids
                        .insert(map.target_objective_id.clone());
                }
            }
        }
    };

    for organization in &manifest.organizations.list {
        if let Some(sequencing) = &organization.sequencing {
            visit(sequencing);
        }
    }
    for node in nodes {
        if let Some(sequencing) = &node.sequencing {
            visit(sequencing);
        }
    }

    for (objective_id, count) in writers {
        if count > 1 {
            resolved.issues.push(ValidationIssue::warning(
                mode,
                IssueCode::Scorm2004DuplicateGlobalObjective,
                format!(
                    "global objective \"{objective_id}\" is written by {count} local objectives"
                ),
                format!("imsss:mapInfo[@targetObjectiveID='{objective_id}']"),
            ));
        }
    }
}

/// Computes the referenced-resource closure and reports dependency cycles.
fn close_dependencies(
    manifest: &ScormManifest,
    codes: ScormCodes,
    mode: ValidationMode,
    resolved: &mut ResolvedScorm,
) {
    // Graph over resource list indices; petgraph's SCC decomposition finds
    // dependency cycles without risking unbounded recursion on adversarial
    // manifests.
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let petgraph_nodes: Vec<NodeIndex> = manifest
        .resources
        .iter()
        .enumerate()
        .map(|(index, _)| graph.add_node(index))
        .collect();

    for (index, resource) in manifest.resources.iter().enumerate() {
        for dependency in &resource.dependencies {
            match resolved.resource_by_id.get(&dependency.identifier_ref) {
                Some(&target) => {
                    graph.add_edge(petgraph_nodes[index], petgraph_nodes[target], ());
                }
                None => {
                    resolved.issues.push(ValidationIssue::error(
                        mode,
                        codes.missing_resource_ref,
                        format!(
                            "dependency references unknown resource \"{}\"",
                            dependency.identifier_ref
                        ),
                        format!(
                            "resource[@identifier='{}']/dependency[@identifierref='{}']",
                            resource.identifier, dependency.identifier_ref
                        ),
                    ));
                }
            }
        }
    }

    for component in tarjan_scc(&graph) {
        let is_cycle = component.len() > 1
            || component
                .first()
                .is_some_and(|&n| graph.contains_edge(n, n));
        if is_cycle {
            let members: Vec<&str> = component
                .iter()
                .map(|&n| manifest.resources[graph[n]].identifier.as_str())
                .collect();
            resolved.issues.push(ValidationIssue::error(
                mode,
                codes.dependency_cycle,
                format!("resource dependency cycle: {}", members.join(" -> ")),
                format!("resource[@identifier='{}']", members[0]),
            ));
        }
    }

    // Reachability: seed with every item-referenced resource, then walk
    // the dependency edges.
    let mut queue: Vec<String> = resolved
        .tree
        .nodes
        .iter()
        .filter_map(|n| n.resource_identifier.clone())
        .collect();
    while let Some(identifier) = queue.pop() {
        if !resolved.referenced_resources.insert(identifier.clone()) {
            continue;
        }
        if let Some(&index) = resolved.resource_by_id.get(&identifier) {
            for dependency in &manifest.resources[index].dependencies {
                queue.push(dependency.identifier_ref.clone());
            }
        }
    }
}

/// Verifies that every `href` the manifest mentions exists on the backend.
///
/// Unsafe paths (absolute, traversing, schemed) are skipped here; the
/// path-safety rules report them, and probing them would be its own
/// hazard.
fn verify_files(
    manifest: &ScormManifest,
    codes: ScormCodes,
    mode: ValidationMode,
    fa: &dyn FileAccess,
    resolved: &mut ResolvedScorm,
) {
    for resource in &manifest.resources {
        let base = resource.xml_base.as_deref().unwrap_or("");
        let mut check = |href: &str, location: String| {
            let path = strip_query(&format!("{base}{href}"));
            if !crate::validation::rules_path::is_safe_package_path(&path) {
                return;
            }
            if !fa.exists(&path) {
                resolved.issues.push(
                    ValidationIssue::error(
                        mode,
                        codes.missing_file,
                        format!("referenced file \"{path}\" does not exist in the package"),
                        location,
                    )
                    .with_fix(format!("add \"{path}\" to the package or correct the href")),
                );
            }
        };

        if let Some(href) = resource.href.as_deref() {
            check(
                href,
                format!("resource[@identifier='{}']/@href", resource.identifier),
            );
        }
        for file in &resource.files {
            check(
                &file.href,
                format!(
                    "resource[@identifier='{}']/file[@href='{}']",
                    resource.identifier, file.href
                ),
            );
        }
    }
}

/// Drops a query string or fragment from an href before existence checks.
fn strip_query(href: &str) -> String {
    let end = href
        .find(['?', '#'])
        .unwrap_or(href.len());
    href[..end].to_owned()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use crate::file_access::MemoryFileAccess;
    use crate::model::scorm::{Dependency, Organizations, Resource, ResourceFile};

    use super::*;

    fn resource(id: &str, href: Option<&str>, deps: &[&str]) -> Resource {
        Resource {
            identifier: id.to_owned(),
            resource_type: "webcontent".to_owned(),
            scorm_type: crate::enums::ScormType::Sco,
            href: href.map(str::to_owned),
            xml_base: None,
            files: href
                .iter()
                .map(|h| ResourceFile {
                    href: (*h).to_owned(),
                })
                .collect(),
            dependencies: deps
                .iter()
                .map(|d| Dependency {
                    identifier_ref: (*d).to_owned(),
                })
                .collect(),
        }
    }

    fn manifest_with(resources: Vec<Resource>, items: Vec<Item>) -> ScormManifest {
        ScormManifest {
            identifier: "m1".to_owned(),
            version: None,
            metadata: None,
            organizations: Organizations {
                default: Some("org1".to_owned()),
                list: vec![Organization {
                    identifier: "org1".to_owned(),
                    title: "Org".to_owned(),
                    items,
                    sequencing: None,
                }],
            },
            resources,
            sequencing_collection: Vec::new(),
        }
    }

    #[test]
    fn flattens_items_with_parent_links() {
        let mut parent = Item::new("parent", "P");
        let mut child = Item::new("child", "C");
        child.identifier_ref = Some("r1".to_owned());
        parent.items = vec![child];
        let manifest = manifest_with(vec![resource("r1", Some("a.html"), &[])], vec![parent]);

        let resolved = resolve_scorm(&manifest, ModuleType::Scorm12, None, ValidationMode::Strict);
        assert_eq!(resolved.tree.nodes.len(), 2);
        assert_eq!(resolved.tree.roots, vec![0]);
        let child_node = &resolved.tree.nodes[1];
        assert_eq!(child_node.parent, Some(0));
        assert!(child_node.is_leaf);
        assert_eq!(child_node.resource_identifier.as_deref(), Some("r1"));
        assert_eq!(resolved.tree.nodes[0].children, vec![1]);
        assert_eq!(resolved.item_by_id.get("child"), Some(&1));
        assert!(resolved.referenced_resources.contains("r1"));
    }

    #[test]
    fn duplicate_resources_first_wins() {
        let manifest = manifest_with(
            vec![
                resource("r1", Some("first.html"), &[]),
                resource("r1", Some("second.html"), &[]),
            ],
            vec![],
        );
        let resolved = resolve_scorm(&manifest, ModuleType::Scorm12, None, ValidationMode::Strict);
        assert_eq!(resolved.resource_by_id.get("r1"), Some(&0));
        assert_eq!(
            resolved
                .issues
                .by_code(IssueCode::Scorm12DuplicateIdentifier)
                .count(),
            1
        );
    }

    #[test]
    fn dependency_cycle_is_reported() {
        let manifest = manifest_with(
            vec![
                resource("a", None, &["b"]),
                resource("b", None, &["a"]),
            ],
            vec![],
        );
        let resolved = resolve_scorm(&manifest, ModuleType::Scorm12, None, ValidationMode::Strict);
        assert_eq!(
            resolved
                .issues
                .by_code(IssueCode::Scorm12DependencyCycle)
                .count(),
            1
        );
    }

    #[test]
    fn dependency_closure_marks_referenced() {
        let mut item = Item::new("i1", "I");
        item.identifier_ref = Some("a".to_owned());
        let manifest = manifest_with(
            vec![
                resource("a", Some("a.html"), &["b"]),
                resource("b", Some("b.html"), &[]),
                resource("orphan", Some("o.html"), &[]),
            ],
            vec![item],
        );
        let resolved = resolve_scorm(&manifest, ModuleType::Scorm12, None, ValidationMode::Strict);
        assert!(resolved.referenced_resources.contains("a"));
        assert!(resolved.referenced_resources.contains("b"));
        assert!(!resolved.referenced_resources.contains("orphan"));
    }

    #[test]
    fn missing_file_reported_through_backend() {
        let mut item = Item::new("i1", "I");
        item.identifier_ref = Some("a".to_owned());
        let manifest = manifest_with(
            vec![resource("a", Some("content/missing.html"), &[])],
            vec![item],
        );
        let fa = MemoryFileAccess::new();
        let resolved = resolve_scorm(
            &manifest,
            ModuleType::Scorm12,
            Some(&fa),
            ValidationMode::Strict,
        );
        // href and <file> both point at the missing path.
        assert_eq!(
            resolved
                .issues
                .by_code(IssueCode::Scorm12MissingFile)
                .count(),
            2
        );
    }

    #[test]
    fn query_string_stripped_before_existence_check() {
        let mut item = Item::new("i1", "I");
        item.identifier_ref = Some("a".to_owned());
        let mut res = resource("a", Some("index.html?start=1"), &[]);
        res.files = vec![ResourceFile {
            href: "index.html".to_owned(),
        }];
        let manifest = manifest_with(vec![res], vec![item]);
        let mut fa = MemoryFileAccess::new();
        fa.insert("index.html", b"x".to_vec());
        let resolved = resolve_scorm(
            &manifest,
            ModuleType::Scorm12,
            Some(&fa),
            ValidationMode::Strict,
        );
        assert!(resolved.issues.is_empty());
    }

    #[test]
    fn sequencing_idref_materializes_from_collection() {
        let mut collection_entry = Sequencing::default();
        collection_entry.id = Some("common".to_owned());
        collection_entry.control_mode = Some(crate::model::sequencing::ControlMode {
            flow: true,
            ..Default::default()
        });

        let mut item = Item::new("i1", "I");
        let mut inline = Sequencing::default();
        inline.id_ref = Some("common".to_owned());
        item.sequencing = Some(inline);

        let mut manifest = manifest_with(vec![], vec![item]);
        manifest.sequencing_collection = vec![collection_entry];

        let resolved = resolve_scorm(
            &manifest,
            ModuleType::Scorm2004(crate::enums::Scorm2004Edition::Third),
            None,
            ValidationMode::Strict,
        );
        let sequencing = resolved.tree.nodes[0].sequencing.as_ref().expect("merged");
        assert!(sequencing.control_mode.as_ref().expect("control mode").flow);
        assert!(resolved.issues.is_empty());
    }

    #[test]
    fn unresolved_idref_is_an_issue() {
        let mut item = Item::new("i1", "I");
        let mut inline = Sequencing::default();
        inline.id_ref = Some("ghost".to_owned());
        item.sequencing = Some(inline);
        let manifest = manifest_with(vec![], vec![item]);

        let resolved = resolve_scorm(
            &manifest,
            ModuleType::Scorm2004(crate::enums::Scorm2004Edition::Third),
            None,
            ValidationMode::Strict,
        );
        assert_eq!(
            resolved
                .issues
                .by_code(IssueCode::Scorm2004UnresolvedSequencingRef)
                .count(),
            1
        );
    }

    #[test]
    fn idref_cycle_is_broken_and_reported() {
        let mut entry_a = Sequencing::default();
        entry_a.id = Some("a".to_owned());
        entry_a.id_ref = Some("b".to_owned());
        let mut entry_b = Sequencing::default();
        entry_b.id = Some("b".to_owned());
        entry_b.id_ref = Some("a".to_owned());

        let mut item = Item::new("i1", "I");
        let mut inline = Sequencing::default();
        inline.id_ref = Some("a".to_owned());
        item.sequencing = Some(inline);

        let mut manifest = manifest_with(vec![], vec![item]);
        manifest.sequencing_collection = vec![entry_a, entry_b];

        let resolved = resolve_scorm(
            &manifest,
            ModuleType::Scorm2004(crate::enums::Scorm2004Edition::Third),
            None,
            ValidationMode::Strict,
        );
        assert_eq!(
            resolved
                .issues
                .by_code(IssueCode::Scorm2004SequencingRefCycle)
                .count(),
            1
        );
        // The node still carries its sequencing; the cycle only broke the
        // reference chain.
        assert!(resolved.tree.nodes[0].sequencing.is_some());
    }

    #[test]
    fn duplicate_global_objective_writers_warn() {
        use crate::model::sequencing::{Objective, ObjectiveMapInfo, Objectives};

        let write_map = |target: &str| ObjectiveMapInfo {
            write_satisfied_status: true,
            ..ObjectiveMapInfo::to_target(target)
        };
        let objective = |id: &str, target: &str| Objective {
            objective_id: Some(id.to_owned()),
            map_info: vec![write_map(target)],
            ..Objective::default()
        };

        let mut item_a = Item::new("a", "A");
        item_a.sequencing = Some(Sequencing {
            objectives: Some(Objectives {
                primary: Some(objective("obj_a", "glob.shared")),
                list: vec![],
            }),
            ..Sequencing::default()
        });
        let mut item_b = Item::new("b", "B");
        item_b.sequencing = Some(Sequencing {
            objectives: Some(Objectives {
                primary: Some(objective("obj_b", "glob.shared")),
                list: vec![],
            }),
            ..Sequencing::default()
        });

        let manifest = manifest_with(vec![], vec![item_a, item_b]);
        let resolved = resolve_scorm(
            &manifest,
            ModuleType::Scorm2004(crate::enums::Scorm2004Edition::Fourth),
            None,
            ValidationMode::Strict,
        );
        assert!(resolved.global_objective_ids.contains("glob.shared"));
        assert_eq!(
            resolved
                .issues
                .by_code(IssueCode::Scorm2004DuplicateGlobalObjective)
                .count(),
            1
        );
    }
}
