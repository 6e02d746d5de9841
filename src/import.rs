use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::SchoolError;
use crate::school::School;

#[derive(Debug, Deserialize)]
struct TeacherRow {
    id: String,
    name: String,
    department: String,
}

#[derive(Debug, Deserialize)]
struct StudentRow {
    id: Option<String>,
    name: String,
    grade_level: u8,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

pub fn generated_enrollment_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("MAT-{}", id[..8].to_uppercase())
}

/// Loads a small demo roster: three teachers and students across two levels.
pub fn seed(school: &mut School) -> anyhow::Result<()> {
    let teachers = [
        ("KOLP-01", "Carla Dias", "Exatas"),
        ("KOLP-02", "Marcos Pereira", "Humanas"),
        ("KOLP-03", "Helena Rocha", "Linguagens"),
    ];
    for (id, name, department) in teachers {
        school.create_teacher(id, name, department)?;
    }

    let students = [
        ("2026001", "Ana Souza", 6),
        ("2026002", "Bruno Lima", 6),
        ("2026003", "Clara Mendes", 6),
        ("2026004", "Diego Alves", 10),
        ("2026005", "Eva Martins", 10),
    ];
    for (id, name, grade_level) in students {
        school.enroll(id, name, grade_level)?;
    }

    school.assign_teacher_to_class("6ANO-A", "Matematica", "KOLP-01")?;
    school.assign_teacher_to_class("6ANO-A", "Historia", "KOLP-02")?;
    school.assign_teacher_to_class("1EM-A", "Fisica", "KOLP-01")?;
    school.assign_teacher_to_class("1EM-A", "Portugues", "KOLP-03")?;
    school.roster.set_head_teacher("6ANO-A", "KOLP-02")?;
    school.roster.set_head_teacher("1EM-A", "KOLP-03")?;

    Ok(())
}

/// Registers teachers from a CSV with `id,name,department` headers. Rows whose
/// id is already registered are skipped.
pub fn import_teachers(school: &mut School, csv_path: &Path) -> anyhow::Result<ImportSummary> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut summary = ImportSummary::default();

    for result in reader.deserialize::<TeacherRow>() {
        let row = result.with_context(|| format!("malformed row in {}", csv_path.display()))?;
        match school.create_teacher(row.id.trim(), row.name.trim(), row.department.trim()) {
            Ok(_) => summary.imported += 1,
            Err(err @ SchoolError::DuplicateTeacher(_)) => {
                warn!("skipping teacher row: {}", err);
                summary.skipped += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    info!(
        "imported {} teachers from {} ({} skipped)",
        summary.imported,
        csv_path.display(),
        summary.skipped
    );
    Ok(summary)
}

/// Enrolls students from a CSV with `id,name,grade_level` headers. A blank id
/// gets a generated enrollment id; duplicates are skipped.
pub fn import_students(school: &mut School, csv_path: &Path) -> anyhow::Result<ImportSummary> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut summary = ImportSummary::default();

    for result in reader.deserialize::<StudentRow>() {
        let row = result.with_context(|| format!("malformed row in {}", csv_path.display()))?;
        let id = row
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(generated_enrollment_id);

        match school.enroll(&id, row.name.trim(), row.grade_level) {
            Ok(_) => summary.imported += 1,
            Err(err @ SchoolError::DuplicateStudent(_)) => {
                warn!("skipping student row: {}", err);
                summary.skipped += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    info!(
        "imported {} students from {} ({} skipped)",
        summary.imported,
        csv_path.display(),
        summary.skipped
    );
    Ok(summary)
}
