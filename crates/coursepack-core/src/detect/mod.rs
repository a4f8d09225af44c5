/// Module-type detection: an ordered registry of probing plugins.
///
/// Each plugin inspects the package through the file-access contract and
/// either claims it (returning a [`ModuleType`]) or declines. The
/// registry consults plugins in descending priority, ties broken by
/// registration order, and returns the first claim. A package no plugin
/// claims is [`DetectionError::Unknown`]; a package whose marker file
/// exists but cannot be read is [`DetectionError::Malformed`], not a
/// fall-through.
pub mod builtin;

use serde_json::json;
use tracing::debug;

use crate::enums::ModuleType;
use crate::error::DetectionError;
use crate::file_access::FileAccess;

pub use builtin::{AiccDetector, Cmi5Detector, ScormDetector, TinCanDetector, tincan_present};

// ---------------------------------------------------------------------------
// Plugin contract
// ---------------------------------------------------------------------------

/// One type-probing plugin.
///
/// Plugins are stateless and cheap; a probe should touch as few files as
/// possible (existence checks and at most one read).
pub trait DetectorPlugin {
    /// Stable plugin name, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Dispatch priority; higher runs earlier.
    fn priority(&self) -> i32;

    /// Probes the package. `Ok(None)` declines; errors abort detection.
    fn probe(&self, fa: &dyn FileAccess) -> Result<Option<ModuleType>, DetectionError>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// An ordered collection of detector plugins.
pub struct DetectorRegistry {
    plugins: Vec<Box<dyn DetectorPlugin>>,
}

impl DetectorRegistry {
    /// An empty registry. Most callers want [`DetectorRegistry::default`],
    /// which carries the built-in plugins.
    pub fn empty() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Registers a plugin. Registration order is the tie-break for equal
    /// priorities.
    pub fn register(&mut self, plugin: Box<dyn DetectorPlugin>) -> &mut Self {
        self.plugins.push(plugin);
        self
    }

    /// The registered plugin names in dispatch order.
    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.dispatch_order().iter().map(|p| p.name()).collect()
    }

    fn dispatch_order(&self) -> Vec<&dyn DetectorPlugin> {
        let mut order: Vec<&dyn DetectorPlugin> =
            self.plugins.iter().map(Box::as_ref).collect();
        // Stable sort: registration order survives within a priority tier.
        order.sort_by_key(|p| std::cmp::Reverse(p.priority()));
        order
    }

    /// Runs detection over the package.
    pub fn detect(&self, fa: &dyn FileAccess) -> Result<ModuleType, DetectionError> {
        let mut consulted = Vec::new();
        for plugin in self.dispatch_order() {
            consulted.push(plugin.name());
            match plugin.probe(fa)? {
                Some(module_type) => {
                    debug!(plugin = plugin.name(), module_type = %module_type, "package claimed");
                    return Ok(module_type);
                }
                None => continue,
            }
        }
        Err(DetectionError::unknown().with_metadata("plugins_consulted", json!(consulted)))
    }
}

impl Default for DetectorRegistry {
    /// The built-in plugin set: SCORM (100), cmi5 (90), AICC (80),
    /// Tin Can (70).
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(Box::new(ScormDetector))
            .register(Box::new(Cmi5Detector))
            .register(Box::new(AiccDetector))
            .register(Box::new(TinCanDetector));
        registry
    }
}

/// Detects the module type with the default registry.
pub fn detect(fa: &dyn FileAccess) -> Result<ModuleType, DetectionError> {
    DetectorRegistry::default().detect(fa)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use crate::file_access::MemoryFileAccess;

    use super::*;

    struct FixedDetector {
        name: &'static str,
        priority: i32,
        answer: Option<ModuleType>,
    }

    impl DetectorPlugin for FixedDetector {
        fn name(&self) -> &'static str {
            self.name
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn probe(&self, _fa: &dyn FileAccess) -> Result<Option<ModuleType>, DetectionError> {
            Ok(self.answer)
        }
    }

    #[test]
    fn priority_order_decides() {
        let mut registry = DetectorRegistry::empty();
        registry
            .register(Box::new(FixedDetector {
                name: "low",
                priority: 10,
                answer: Some(ModuleType::Aicc),
            }))
            .register(Box::new(FixedDetector {
                name: "high",
                priority: 20,
                answer: Some(ModuleType::Cmi5),
            }));
        let fa = MemoryFileAccess::new();
        assert_eq!(registry.detect(&fa).expect("claims"), ModuleType::Cmi5);
        assert_eq!(registry.plugin_names(), vec!["high", "low"]);
    }

    #[test]
    fn registration_order_breaks_ties() {
        let mut registry = DetectorRegistry::empty();
        registry
            .register(Box::new(FixedDetector {
                name: "first",
                priority: 50,
                answer: Some(ModuleType::Aicc),
            }))
            .register(Box::new(FixedDetector {
                name: "second",
                priority: 50,
                answer: Some(ModuleType::Cmi5),
            }));
        let fa = MemoryFileAccess::new();
        assert_eq!(registry.detect(&fa).expect("claims"), ModuleType::Aicc);
    }

    #[test]
    fn all_decline_is_unknown() {
        let mut registry = DetectorRegistry::empty();
        registry.register(Box::new(FixedDetector {
            name: "quiet",
            priority: 1,
            answer: None,
        }));
        let fa = MemoryFileAccess::new();
        let err = registry.detect(&fa).expect_err("unknown");
        assert!(matches!(err, DetectionError::Unknown { .. }));
        let metadata = err.metadata().expect("bag");
        assert_eq!(
            metadata.get("plugins_consulted"),
            Some(&serde_json::json!(["quiet"]))
        );
    }
}
