use serde::Serialize;

/// Fulfillment status shared by requirements and course rows. Serialized
/// as the exact uppercase strings downstream consumers key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    #[serde(rename = "COMPLETE")]
    Complete,
    #[serde(rename = "IN-PROGRESS")]
    InProgress,
    #[serde(rename = "INCOMPLETE")]
    Incomplete,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Complete => "COMPLETE",
            Status::InProgress => "IN-PROGRESS",
            Status::Incomplete => "INCOMPLETE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SbcFulfillment {
    #[serde(rename = "FULL")]
    Full,
    #[serde(rename = "PARTIAL")]
    Partial,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInfo {
    pub name: String,
    pub major: String,
    pub credits_required: f64,
    pub credits_applied: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub id: String,
    pub name: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits_required: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits_applied: Option<u32>,
    pub catalog_year: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub code: String,
    pub title: String,
    // None serializes as null; a missing grade is meaningful downstream
    pub grade: Option<String>,
    pub credits: f64,
    pub term: String,
    pub sbc_category: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sbc_fulfillment: Option<SbcFulfillment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One assembled record per scanned document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DegreeRecord {
    pub student: StudentInfo,
    pub requirements: Vec<Requirement>,
    pub completed_courses: Vec<Course>,
    pub in_progress_courses: Vec<Course>,
    pub incomplete_courses: Vec<Course>,
    pub unmet_conditions: Vec<String>,
}

// ── Tests ──
