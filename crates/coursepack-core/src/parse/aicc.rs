/// Binding of the AICC descriptor-file family into [`AiccManifest`].
///
/// The package stem is discovered from the first `.crs` (or `.au`) file on
/// the backend, case-insensitively; the four mandatory files are then
/// located by extension against that stem. `.ort` and `.pre` are bound
/// when present and silently absent otherwise.
use tracing::debug;

use crate::error::{ManifestParseError, ParseError};
use crate::file_access::{self, FileAccess};
use crate::model::aicc::{
    AiccManifest, AssignableUnit, CourseInfo, CourseStructureRow, Descriptor, ObjectiveRelation,
    PrerequisiteRow,
};
use crate::newtypes::Iso8601Duration;
use crate::parse::ini::{IniDocument, RecordFile};

/// Locates the AICC package stem: the path (sans extension) of the first
/// file with a `.crs` or `.au` extension, case-insensitively.
pub fn locate_stem(fa: &dyn FileAccess) -> Result<Option<String>, crate::file_access::FileAccessError> {
    let mut fallback: Option<String> = None;
    for path in fa.list("")? {
        let lower = path.to_ascii_lowercase();
        if let Some(stem) = lower.strip_suffix(".crs") {
            return Ok(Some(path[..stem.len()].to_owned()));
        }
        if fallback.is_none() {
            if let Some(stem) = lower.strip_suffix(".au") {
                fallback = Some(path[..stem.len()].to_owned());
            }
        }
    }
    Ok(fallback)
}

/// Finds `<stem>.<extension>` case-insensitively next to the stem.
fn locate_file(
    fa: &dyn FileAccess,
    stem: &str,
    extension: &str,
) -> Result<Option<String>, crate::file_access::FileAccessError> {
    let (dir, name) = match stem.rsplit_once('/') {
        Some((dir, name)) => (dir, name),
        None => ("", stem),
    };
    file_access::find_case_insensitive(fa, dir, &format!("{name}.{extension}"))
}

/// Parses the AICC descriptor files of the package.
pub fn parse_aicc(fa: &dyn FileAccess) -> Result<AiccManifest, ParseError> {
    let stem = locate_stem(fa)?
        .ok_or_else(|| ManifestParseError::new("<package>", "no .crs descriptor file found"))?;
    let package_name = stem.rsplit_once('/').map_or(stem.as_str(), |(_, n)| n).to_owned();
    debug!(stem = %stem, "binding AICC package");

    let read = |extension: &str| -> Result<Option<(String, String)>, ParseError> {
        match locate_file(fa, &stem, extension)? {
            Some(path) => {
                let text = file_access::read_to_string(fa, &path)
                    .map_err(|e| ManifestParseError::new(&path, e.to_string()))?;
                Ok(Some((path, text)))
            }
            None => Ok(None),
        }
    };

    let (crs_path, crs_text) = read("crs")?
        .ok_or_else(|| ManifestParseError::new(format!("{stem}.crs"), "course file not found"))?;
    let course = bind_course(&crs_path, &crs_text)?;

    let descriptors = match read("des")? {
        Some((path, text)) => bind_descriptors(&path, &text)?,
        None => Vec::new(),
    };

    let assignable_units = match read("au")? {
        Some((path, text)) => bind_assignable_units(&path, &text)?,
        None => Vec::new(),
    };

    let structure = match read("cst")? {
        Some((path, text)) => bind_structure(&path, &text)?,
        None => Vec::new(),
    };

    let objective_relations = match read("ort")? {
        Some((path, text)) => bind_objective_relations(&path, &text)?,
        None => Vec::new(),
    };

    let prerequisites = match read("pre")? {
        Some((path, text)) => bind_prerequisites(&path, &text)?,
        None => Vec::new(),
    };

    Ok(AiccManifest {
        package_name,
        course,
        descriptors,
        assignable_units,
        structure,
        objective_relations,
        prerequisites,
    })
}

// ---------------------------------------------------------------------------
// Per-file binders
// ---------------------------------------------------------------------------

fn bind_course(file: &str, text: &str) -> Result<CourseInfo, ManifestParseError> {
    let doc = IniDocument::parse(file, text)?;
    let course = |key: &str| doc.get("course", key).map(str::to_owned);
    let number = |key: &str| -> Result<Option<u32>, ManifestParseError> {
        match doc.get("course", key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<u32>().map(Some).map_err(|_| {
                ManifestParseError::new(
                    file,
                    format!("[Course] {key} is not a non-negative integer: {raw:?}"),
                )
            }),
        }
    };

    let description = doc
        .section("course_description")
        .map(|s| {
            if s.free_text.is_empty() {
                s.values
                    .values()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("\n")
            } else {
                s.free_text.clone()
            }
        })
        .filter(|d| !d.is_empty());

    Ok(CourseInfo {
        course_id: course("course_id").unwrap_or_default(),
        course_title: course("course_title").unwrap_or_default(),
        course_creator: course("course_creator"),
        course_system: course("course_system"),
        level: number("level")?,
        total_aus: number("total_aus")?,
        total_blocks: number("total_blocks")?,
        version: course("version"),
        max_fields_cst: number("max_fields_cst")?,
        description,
    })
}

fn bind_descriptors(file: &str, text: &str) -> Result<Vec<Descriptor>, ManifestParseError> {
    let records = RecordFile::parse(file, text)?;
    if records.column("system_id").is_none() {
        return Err(ManifestParseError::new(file, "missing System_ID column"));
    }
    Ok(records
        .rows
        .iter()
        .filter_map(|row| {
            let system_id = records.field(row, "system_id")?;
            Some(Descriptor {
                system_id: system_id.to_owned(),
                developer_id: records.field(row, "developer_id").map(str::to_owned),
                title: records.field(row, "title").unwrap_or_default().to_owned(),
                description: records.field(row, "description").map(str::to_owned),
            })
        })
        .collect())
}

fn bind_assignable_units(
    file: &str,
    text: &str,
) -> Result<Vec<AssignableUnit>, ManifestParseError> {
    let records = RecordFile::parse(file, text)?;
    if records.column("system_id").is_none() {
        return Err(ManifestParseError::new(file, "missing System_ID column"));
    }

    let mut units = Vec::with_capacity(records.rows.len());
    for row in &records.rows {
        let Some(system_id) = records.field(row, "system_id") else {
            continue;
        };
        let score = |name: &str| -> Result<Option<f64>, ManifestParseError> {
            match records.field(row, name) {
                None => Ok(None),
                Some(raw) => raw.parse::<f64>().map(Some).map_err(|_| {
                    ManifestParseError::new(
                        file,
                        format!("AU {system_id}: {name} is not a number: {raw:?}"),
                    )
                }),
            }
        };
        let max_time_allowed = match records.field(row, "max_time_allowed") {
            None => None,
            Some(raw) => Some(Iso8601Duration::parse(raw).map_err(|e| {
                ManifestParseError::new(file, format!("AU {system_id}: max_time_allowed: {e}"))
            })?),
        };

        units.push(AssignableUnit {
            system_id: system_id.to_owned(),
            command_line: records.field(row, "command_line").map(str::to_owned),
            file_name: records
                .field(row, "file_name")
                .unwrap_or_default()
                .to_owned(),
            max_score: score("max_score")?,
            mastery_score: score("mastery_score")?,
            max_time_allowed,
            time_limit_action: records.field(row, "time_limit_action").map(str::to_owned),
            system_vendor: records.field(row, "system_vendor").map(str::to_owned),
            core_vendor: records.field(row, "core_vendor").map(str::to_owned),
            au_type: records.field(row, "type").map(str::to_owned),
            web_launch: records.field(row, "web_launch").map(str::to_owned),
            au_password: records.field(row, "au_password").map(str::to_owned),
        });
    }
    Ok(units)
}

fn bind_structure(file: &str, text: &str) -> Result<Vec<CourseStructureRow>, ManifestParseError> {
    let records = RecordFile::parse(file, text)?;
    if records.column("block").is_none() {
        return Err(ManifestParseError::new(file, "missing block column"));
    }
    Ok(records
        .rows
        .iter()
        .filter_map(|row| {
            let block = row.first().map(|s| s.trim()).filter(|s| !s.is_empty())?;
            let members = row[1..]
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect();
            Some(CourseStructureRow {
                block: block.to_owned(),
                members,
            })
        })
        .collect())
}

fn bind_objective_relations(
    file: &str,
    text: &str,
) -> Result<Vec<ObjectiveRelation>, ManifestParseError> {
    let records = RecordFile::parse(file, text)?;
    Ok(records
        .rows
        .iter()
        .filter_map(|row| {
            let objective_id = row.first().map(|s| s.trim()).filter(|s| !s.is_empty())?;
            Some(ObjectiveRelation {
                objective_id: objective_id.to_owned(),
                members: row[1..]
                    .iter()
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect(),
            })
        })
        .collect())
}

fn bind_prerequisites(file: &str, text: &str) -> Result<Vec<PrerequisiteRow>, ManifestParseError> {
    let records = RecordFile::parse(file, text)?;
    if records.column("structure_element").is_none() || records.column("prerequisite").is_none() {
        return Err(ManifestParseError::new(
            file,
            "missing structure_element / prerequisite columns",
        ));
    }
    Ok(records
        .rows
        .iter()
        .filter_map(|row| {
            let element = records.field(row, "structure_element")?;
            let prerequisite = records.field(row, "prerequisite")?;
            Some(PrerequisiteRow {
                structure_element: element.to_owned(),
                prerequisite: prerequisite.to_owned(),
            })
        })
        .collect())
}
