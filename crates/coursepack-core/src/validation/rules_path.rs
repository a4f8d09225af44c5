/// Path-safety rules.
///
/// Every path a manifest references must stay inside the package: no
/// `..` traversal, no absolute path, no URL scheme pointing elsewhere.
/// These are security rules — they run in every mode, are never
/// downgraded by lenient mode, and cannot be disabled.
///
/// The rule target is the flat list of [`PathEntry`] values the facade
/// collects from whichever manifest family was parsed. Formats whose
/// launch paths may legitimately be web URLs (AICC web launch, cmi5 AUs)
/// mark their entries `allow_external`, which exempts them from the
/// scheme check only — traversal and absolute paths stay forbidden.
use std::sync::LazyLock;

use regex::Regex;

use super::{IssueCode, Severity, ValidationIssue, ValidationMode, ValidationResult, ValidationRule};

/// One path to vet, with the manifest location it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    /// The package-relative path (or URL) as written in the manifest.
    pub path: String,
    /// Where the manifest said it (XPath-style).
    pub location: String,
    /// `true` when an absolute URL is legitimate at this position.
    pub allow_external: bool,
}

impl PathEntry {
    /// An entry for a format where external URLs are forbidden.
    pub fn internal(path: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            location: location.into(),
            allow_external: false,
        }
    }

    /// An entry for a format where external URLs are legitimate.
    pub fn external_ok(path: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            location: location.into(),
            allow_external: true,
        }
    }
}

// A URL scheme per RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":".
static SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[A-Za-z][A-Za-z0-9+.-]*:").unwrap_or_else(|_| {
        // Never reached: the pattern above is always valid.
        Regex::new("a^").unwrap_or_else(|_| {
            Regex::new(".").unwrap_or_else(|_| unreachable!("regex engine broken"))
        })
    })
});

/// Returns `true` when `path` carries a URL scheme.
pub fn has_url_scheme(path: &str) -> bool {
    // Windows drive letters ("C:\...") match the scheme shape but are
    // absolute paths; the absolute check reports those.
    SCHEME_RE.is_match(path) && !is_drive_letter(path)
}

fn is_drive_letter(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'/' || bytes[2] == b'\\')
}

/// Returns `true` when `path` is absolute (POSIX, UNC, or drive-letter).
pub fn is_absolute_path(path: &str) -> bool {
    path.starts_with('/') || path.starts_with('\\') || is_drive_letter(path)
}

/// Returns `true` when any `/`- or `\`-separated segment is `..`.
pub fn has_traversal(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == "..")
}

/// Returns `true` when `path` is a safe package-relative path: no
/// scheme, not absolute, no traversal. Used by the resolver to decide
/// which paths are even worth probing on the backend.
pub fn is_safe_package_path(path: &str) -> bool {
    !has_url_scheme(path) && !is_absolute_path(path) && !has_traversal(path)
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// The non-disableable path-safety rule over all collected entries.
pub struct PathSafetyRule;

impl ValidationRule<[PathEntry]> for PathSafetyRule {
    fn name(&self) -> &'static str {
        "path-safety"
    }

    fn validate(&self, entries: &[PathEntry], _mode: ValidationMode) -> ValidationResult {
        let mut result = ValidationResult::valid();
        for entry in entries {
            // Severity is pinned to Error regardless of mode; these codes
            // are not in the lenient downgrade set by construction.
            if has_traversal(&entry.path) {
                result.push(ValidationIssue {
                    severity: Severity::Error,
                    code: IssueCode::UnsafePathTraversal,
                    message: format!("path \"{}\" contains a '..' segment", entry.path),
                    location: entry.location.clone(),
                    suggested_fix: Some("reference files inside the package root".to_owned()),
                });
                continue;
            }
            if is_absolute_path(&entry.path) {
                result.push(ValidationIssue {
                    severity: Severity::Error,
                    code: IssueCode::UnsafeAbsolutePath,
                    message: format!("path \"{}\" is absolute", entry.path),
                    location: entry.location.clone(),
                    suggested_fix: Some("use a package-relative path".to_owned()),
                });
                continue;
            }
            if !entry.allow_external && has_url_scheme(&entry.path) {
                result.push(ValidationIssue {
                    severity: Severity::Error,
                    code: IssueCode::UnsafeExternalUrl,
                    message: format!("path \"{}\" points outside the package", entry.path),
                    location: entry.location.clone(),
                    suggested_fix: Some("bundle the referenced content in the package".to_owned()),
                });
            }
        }
        result
    }
}

/// Runs the path-safety rule over `entries`.
pub fn validate_paths(entries: &[PathEntry], mode: ValidationMode) -> ValidationResult {
    PathSafetyRule.validate(entries, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_detection() {
        assert!(has_traversal("../../../etc/passwd"));
        assert!(has_traversal("content/../../secret"));
        assert!(has_traversal("a\\..\\b"));
        assert!(!has_traversal("content/..hidden/file.html"));
        assert!(!has_traversal("content/index.html"));
    }

    #[test]
    fn absolute_detection() {
        assert!(is_absolute_path("/etc/passwd"));
        assert!(is_absolute_path("\\\\server\\share"));
        assert!(is_absolute_path("C:\\content\\index.html"));
        assert!(!is_absolute_path("content/index.html"));
    }

    #[test]
    fn scheme_detection() {
        assert!(has_url_scheme("http://example.org/a.html"));
        assert!(has_url_scheme("javascript:alert(1)"));
        assert!(!has_url_scheme("C:\\windows\\path"));
        assert!(!has_url_scheme("content/index.html"));
    }

    #[test]
    fn rule_reports_each_kind_once() {
        let entries = vec![
            PathEntry::internal("../../../etc/passwd", "resource[@identifier='r1']/@href"),
            PathEntry::internal("/abs/path.html", "resource[@identifier='r2']/@href"),
            PathEntry::internal("https://evil.example/x", "resource[@identifier='r3']/@href"),
            PathEntry::internal("ok/fine.html", "resource[@identifier='r4']/@href"),
        ];
        let result = validate_paths(&entries, ValidationMode::Strict);
        assert_eq!(result.len(), 3);
        assert_eq!(result.by_code(IssueCode::UnsafePathTraversal).count(), 1);
        assert_eq!(result.by_code(IssueCode::UnsafeAbsolutePath).count(), 1);
        assert_eq!(result.by_code(IssueCode::UnsafeExternalUrl).count(), 1);
    }

    #[test]
    fn lenient_mode_never_downgrades() {
        let entries = vec![PathEntry::internal("../x", "loc")];
        let result = validate_paths(&entries, ValidationMode::Lenient);
        assert!(!result.is_valid());
        assert_eq!(result.errors().count(), 1);
    }

    #[test]
    fn external_allowance_only_covers_schemes() {
        let entries = vec![
            PathEntry::external_ok("https://lms.example/au/1", "au[@id='a']/url"),
            PathEntry::external_ok("../escape.html", "au[@id='b']/url"),
        ];
        let result = validate_paths(&entries, ValidationMode::Strict);
        assert_eq!(result.len(), 1);
        assert_eq!(result.by_code(IssueCode::UnsafePathTraversal).count(), 1);
    }
}
