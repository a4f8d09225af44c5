/// The built-in detector plugins.
///
/// Priorities stagger so multi-standard wrapper packages (an AICC course
/// that also ships an `imsmanifest.xml`, a SCORM package with a companion
/// `tincan.xml`) resolve deterministically: SCORM wins over cmi5, cmi5
/// over AICC, AICC over bare Tin Can.
use crate::enums::ModuleType;
use crate::error::DetectionError;
use crate::file_access::{self, FileAccess};
use crate::parse::cmi5::{CMI5_FILE, TINCAN_FILE};
use crate::parse::scorm;
use crate::validation::ValidationMode;

use super::DetectorPlugin;

// ---------------------------------------------------------------------------
// SCORM
// ---------------------------------------------------------------------------

/// Claims packages carrying an `imsmanifest.xml` (priority 100).
///
/// On a hit the manifest is parsed and the edition sniffer decides
/// between SCORM 1.2 and the 2004 editions. An unreadable manifest is
/// [`DetectionError::Malformed`] — the package *is* SCORM-shaped, so
/// falling through to lower-priority plugins would misclassify it.
pub struct ScormDetector;

impl DetectorPlugin for ScormDetector {
    fn name(&self) -> &'static str {
        "scorm"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn probe(&self, fa: &dyn FileAccess) -> Result<Option<ModuleType>, DetectionError> {
        let Some(path) = scorm::locate_manifest(fa, true)? else {
            return Ok(None);
        };
        let text = file_access::read_to_string(fa, &path)?;
        match scorm::parse_scorm_text(&path, &text, ValidationMode::Strict) {
            Ok(output) => Ok(Some(output.module_type)),
            Err(e) => Err(DetectionError::malformed(path, e.to_string())
                .with_metadata("plugin", serde_json::json!(self.name()))),
        }
    }
}

// ---------------------------------------------------------------------------
// cmi5
// ---------------------------------------------------------------------------

/// Claims packages carrying a `cmi5.xml` (priority 90).
pub struct Cmi5Detector;

impl DetectorPlugin for Cmi5Detector {
    fn name(&self) -> &'static str {
        "cmi5"
    }

    fn priority(&self) -> i32 {
        90
    }

    fn probe(&self, fa: &dyn FileAccess) -> Result<Option<ModuleType>, DetectionError> {
        let found = fa.exists(CMI5_FILE)
            || file_access::find_case_insensitive(fa, "", CMI5_FILE)?.is_some();
        Ok(found.then_some(ModuleType::Cmi5))
    }
}

// ---------------------------------------------------------------------------
// AICC
// ---------------------------------------------------------------------------

/// Claims packages containing any `.crs` or `.au` file (priority 80).
pub struct AiccDetector;

impl DetectorPlugin for AiccDetector {
    fn name(&self) -> &'static str {
        "aicc"
    }

    fn priority(&self) -> i32 {
        80
    }

    fn probe(&self, fa: &dyn FileAccess) -> Result<Option<ModuleType>, DetectionError> {
        let stem = crate::parse::aicc::locate_stem(fa)?;
        Ok(stem.map(|_| ModuleType::Aicc))
    }
}

// ---------------------------------------------------------------------------
// Tin Can
// ---------------------------------------------------------------------------

/// Claims packages carrying a `tincan.xml` (priority 70).
///
/// Tin Can course structures are bound through the cmi5 pipeline (the
/// binding reads `tincan.xml` when `cmi5.xml` is absent), so the claim
/// reports [`ModuleType::Cmi5`]. In a SCORM package that merely *ships*
/// a companion `tincan.xml`, the SCORM plugin has already claimed the
/// package by priority and this plugin never runs.
pub struct TinCanDetector;

impl DetectorPlugin for TinCanDetector {
    fn name(&self) -> &'static str {
        "tincan"
    }

    fn priority(&self) -> i32 {
        70
    }

    fn probe(&self, fa: &dyn FileAccess) -> Result<Option<ModuleType>, DetectionError> {
        let found = fa.exists(TINCAN_FILE)
            || file_access::find_case_insensitive(fa, "", TINCAN_FILE)?.is_some();
        Ok(found.then_some(ModuleType::Cmi5))
    }
}

/// Returns `true` when the package ships a `tincan.xml` companion; feeds
/// the `xapi_enabled` metadata flag for SCORM packages.
pub fn tincan_present(fa: &dyn FileAccess) -> bool {
    fa.exists(TINCAN_FILE)
        || matches!(
            file_access::find_case_insensitive(fa, "", TINCAN_FILE),
            Ok(Some(_))
        )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use crate::enums::Scorm2004Edition;
    use crate::file_access::MemoryFileAccess;

    use super::*;

    fn scorm12_package() -> MemoryFileAccess {
        let mut fa = MemoryFileAccess::new();
        fa.insert(
            "imsmanifest.xml",
            br#"<manifest identifier="m">
  <metadata><schemaversion>1.2</schemaversion></metadata>
  <organizations/><resources/>
</manifest>"#
                .to_vec(),
        );
        fa
    }

    #[test]
    fn scorm_edition_sniffing() {
        let fa = scorm12_package();
        let claimed = ScormDetector.probe(&fa).expect("probe");
        assert_eq!(claimed, Some(ModuleType::Scorm12));

        let mut fa = MemoryFileAccess::new();
        fa.insert(
            "IMSMANIFEST.XML",
            br#"<manifest identifier="m">
  <metadata><schemaversion>2004 4th Edition</schemaversion></metadata>
  <organizations/><resources/>
</manifest>"#
                .to_vec(),
        );
        let claimed = ScormDetector.probe(&fa).expect("probe");
        assert_eq!(
            claimed,
            Some(ModuleType::Scorm2004(Scorm2004Edition::Fourth))
        );
    }

    #[test]
    fn malformed_manifest_does_not_fall_through() {
        let mut fa = MemoryFileAccess::new();
        fa.insert("imsmanifest.xml", b"<manifest><broken".to_vec());
        fa.insert("course01.crs", b"[Course]\r\nCourse_ID=C1\r\n".to_vec());
        let err = crate::detect::detect(&fa).expect_err("malformed");
        assert!(matches!(err, DetectionError::Malformed { .. }));
    }

    #[test]
    fn priority_resolves_wrappers() {
        // AICC + SCORM wrapper: SCORM wins by priority.
        let mut fa = scorm12_package();
        fa.insert("course01.crs", b"[Course]\r\nCourse_ID=C1\r\n".to_vec());
        let detected = crate::detect::detect(&fa).expect("detects");
        assert_eq!(detected, ModuleType::Scorm12);
    }

    #[test]
    fn aicc_claim_by_extension() {
        let mut fa = MemoryFileAccess::new();
        fa.insert("COURSE.AU", b"\"System_ID\",\"File_Name\"\r\n".to_vec());
        assert_eq!(
            AiccDetector.probe(&fa).expect("probe"),
            Some(ModuleType::Aicc)
        );
    }

    #[test]
    fn tincan_claims_as_cmi5() {
        let mut fa = MemoryFileAccess::new();
        fa.insert("tincan.xml", b"<tincan/>".to_vec());
        assert_eq!(
            crate::detect::detect(&fa).expect("detects"),
            ModuleType::Cmi5
        );
        assert!(tincan_present(&fa));
    }

    #[test]
    fn empty_package_is_unknown() {
        let fa = MemoryFileAccess::new();
        assert!(matches!(
            crate::detect::detect(&fa),
            Err(DetectionError::Unknown { .. })
        ));
    }
}
