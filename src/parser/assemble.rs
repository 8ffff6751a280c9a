use std::collections::HashSet;

use crate::parser::extract::courses::CourseBuckets;
use crate::parser::extract::requirements::slug;
use crate::record::{Course, DegreeRecord, Requirement, StudentInfo};

/// Builds the final record. Completed and in-progress lists are
/// key-deduplicated; the incomplete list keeps every entry so repeated
/// still-needed lines stay visible.
pub fn assemble(
    student: StudentInfo,
    requirements: Vec<Requirement>,
    courses: CourseBuckets,
) -> DegreeRecord {
    let CourseBuckets {
        mut completed,
        mut in_progress,
        incomplete,
    } = courses;

    dedupe_courses(&mut completed);
    dedupe_courses(&mut in_progress);

    DegreeRecord {
        student: StudentInfo {
            name: student.name,
            major: student.major,
            credits_required: finite_or_zero(student.credits_required),
            credits_applied: finite_or_zero(student.credits_applied),
        },
        requirements: finalize_requirements(requirements),
        completed_courses: completed,
        in_progress_courses: in_progress,
        incomplete_courses: incomplete,
        unmet_conditions: Vec::new(),
    }
}

/// First occurrence wins. The key is code, title and term (trimmed,
/// uppercased) plus the credit value's display form, so 3 and 3.0
/// collide while 3 and 3.5 do not.
pub fn dedupe_courses(courses: &mut Vec<Course>) {
    let mut seen = HashSet::new();
    courses.retain(|c| {
        seen.insert((
            c.code.trim().to_uppercase(),
            c.title.trim().to_uppercase(),
            c.term.trim().to_uppercase(),
            format!("{}", c.credits),
        ))
    });
}

/// Fills the fields a sparse card leaves blank. The id is derived from
/// the name as extracted, before the name itself gets a placeholder.
fn finalize_requirements(mut requirements: Vec<Requirement>) -> Vec<Requirement> {
    for req in &mut requirements {
        if req.id.is_empty() {
            let basis = if req.name.is_empty() { "unknown" } else { req.name.as_str() };
            req.id = slug(basis);
        }
        if req.name.is_empty() {
            req.name = "Unknown Requirement".to_string();
        }
    }
    requirements
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

// ── Tests ──
