/// Reader for the INI/CSV dialect AICC descriptor files use.
///
/// Two layouts share one lexical base:
/// - *keyed* files (`.crs`): `[Section]` headers followed by `key=value`
///   lines;
/// - *record* files (`.des`, `.au`, `.cst`, `.ort`, `.pre`): a CSV header
///   row naming the columns, then one comma-separated record per line.
///
/// Keys, section names, and column names are case-insensitive and are
/// normalized to lowercase here. Values may be double-quoted; quoted
/// values may contain commas and doubled quotes. Record delimiters are
/// CRLF or LF. Lines starting with `;` are comments.
use std::collections::BTreeMap;

use crate::error::ManifestParseError;

// ---------------------------------------------------------------------------
// Keyed (section) files
// ---------------------------------------------------------------------------

/// A parsed keyed INI document: section name → key → value.
///
/// Section and key names are lowercase; values keep their original case.
/// Repeated keys keep the first occurrence. Lines inside a section that
/// carry no `=` are accumulated as the section's free text (the
/// `[Course_Description]` block is prose, not key/value pairs).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IniDocument {
    sections: BTreeMap<String, IniSection>,
}

/// One `[Section]` of a keyed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IniSection {
    /// `key=value` pairs, keys lowercase.
    pub values: BTreeMap<String, String>,
    /// Non-`key=value` lines, joined with `\n`.
    pub free_text: String,
}

impl IniDocument {
    /// Parses a keyed INI document.
    pub fn parse(file: &str, text: &str) -> Result<Self, ManifestParseError> {
        let mut sections: BTreeMap<String, IniSection> = BTreeMap::new();
        let mut current: Option<String> = None;

        for (line_index, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[') {
                let Some(name) = name.strip_suffix(']') else {
                    return Err(ManifestParseError::new(
                        file,
                        format!("unterminated section header on line {}", line_index + 1),
                    ));
                };
                let key = name.trim().to_ascii_lowercase();
                sections.entry(key.clone()).or_default();
                current = Some(key);
                continue;
            }
            let Some(section) = current.as_ref() else {
                return Err(ManifestParseError::new(
                    file,
                    format!("line {} precedes any [section] header", line_index + 1),
                ));
            };
            let section = sections.entry(section.clone()).or_default();
            match line.split_once('=') {
                Some((key, value)) => {
                    section
                        .values
                        .entry(key.trim().to_ascii_lowercase())
                        .or_insert_with(|| unquote(value.trim()).to_owned());
                }
                None => {
                    if !section.free_text.is_empty() {
                        section.free_text.push('\n');
                    }
                    section.free_text.push_str(line);
                }
            }
        }
        Ok(Self { sections })
    }

    /// The section with the given (case-insensitive) name.
    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.get(&name.to_ascii_lowercase())
    }

    /// A value by section and key, both case-insensitive.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?
            .values
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Record (CSV) files
// ---------------------------------------------------------------------------

/// A parsed record file: lowercase column names plus one row per record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFile {
    /// Column names from the header row, lowercased.
    pub columns: Vec<String>,
    /// Data rows; each row has at most `columns.len()` fields after
    /// normalization (excess fields are appended to the last column,
    /// matching the `.cst` convention of unbounded member lists).
    pub rows: Vec<Vec<String>>,
}

impl RecordFile {
    /// Parses a record file. The first non-comment line is the header.
    pub fn parse(file: &str, text: &str) -> Result<Self, ManifestParseError> {
        let mut lines = text
            .lines()
            .map(str::trim)
            .enumerate()
            .filter(|(_, l)| !l.is_empty() && !l.starts_with(';'));

        let Some((_, header)) = lines.next() else {
            return Err(ManifestParseError::new(file, "record file has no header row"));
        };
        let columns: Vec<String> = split_record(header)
            .into_iter()
            .map(|c| c.trim().to_ascii_lowercase())
            .collect();
        if columns.is_empty() || columns.iter().all(String::is_empty) {
            return Err(ManifestParseError::new(file, "record file header is empty"));
        }

        let rows = lines
            .map(|(_, line)| split_record(line))
            .collect::<Vec<_>>();
        Ok(Self { columns, rows })
    }

    /// Index of a column by (case-insensitive) name.
    pub fn column(&self, name: &str) -> Option<usize> {
        let wanted = name.to_ascii_lowercase();
        self.columns.iter().position(|c| *c == wanted)
    }

    /// The field of `row` under the named column, trimmed; `None` when the
    /// column is absent or the row is short.
    pub fn field<'a>(&self, row: &'a [String], name: &str) -> Option<&'a str> {
        let index = self.column(name)?;
        row.get(index).map(|s| s.trim()).filter(|s| !s.is_empty())
    }
}

/// Splits one CSV record honoring double-quoted fields.
///
/// Doubled quotes inside a quoted field escape a literal quote. A lone
/// quote opens/closes quoting; commas inside quotes do not split.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(field.trim().to_owned());
                field = String::new();
            }
            _ => field.push(ch),
        }
    }
    fields.push(field.trim().to_owned());
    fields
}

/// Strips one layer of surrounding double quotes.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
