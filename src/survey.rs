//! Quick page census, independent of the full conversion pipeline.
//!
//! Scans any audit-looking page for course-code tokens and requirement
//! headings and tallies them. Useful for sizing up a capture before
//! running the real converter over it.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::Selector;
use serde::Serialize;

use crate::parser::text;
use crate::parser::{ParseError, ReportDoc};

static SCAN_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr, li, p, div").unwrap());
static HEADING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2, h3, h4, .requirementHeader, .blockheader").unwrap());

static SURVEY_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2,4}\s?[A-Z]?\d{3}[A-Z]?\b").unwrap());
static COMPLETED_HINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)complete|fulfilled|satisfied").unwrap());
static IN_PROGRESS_HINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)in progress|ip\s|registered|currently taking").unwrap());
static COMPLETED_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)complete|fulfilled").unwrap());
static IN_PROGRESS_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)in progress").unwrap());

const COURSE_DETAILS_LIMIT: usize = 280;
const REQUIREMENT_DETAIL_LIMIT: usize = 320;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SurveyStatus {
    #[serde(rename = "planned")]
    Planned,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl SurveyStatus {
    // Sightings only ever upgrade a course, never demote it
    fn rank(self) -> u8 {
        match self {
            SurveyStatus::Planned => 0,
            SurveyStatus::InProgress => 1,
            SurveyStatus::Completed => 2,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyCourse {
    pub course: String,
    pub status: SurveyStatus,
    pub details: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyRequirement {
    pub title: String,
    pub status: SurveyStatus,
    pub detail: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyTotals {
    pub total_courses: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub planned: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSurvey {
    pub generated_at: DateTime<Utc>,
    pub totals: SurveyTotals,
    pub courses: Vec<SurveyCourse>,
    pub requirements: Vec<SurveyRequirement>,
}

pub fn survey_document(html: &str) -> Result<PageSurvey, ParseError> {
    let doc = ReportDoc::parse(html)?;
    Ok(survey_parsed(&doc))
}

pub fn survey_parsed(doc: &ReportDoc) -> PageSurvey {
    let courses = collect_courses(doc);
    let requirements = sketch_requirements(doc);

    let count = |s: SurveyStatus| courses.iter().filter(|c| c.status == s).count();
    let totals = SurveyTotals {
        total_courses: courses.len(),
        completed: count(SurveyStatus::Completed),
        in_progress: count(SurveyStatus::InProgress),
        planned: count(SurveyStatus::Planned),
    };

    PageSurvey {
        generated_at: Utc::now(),
        totals,
        courses,
        requirements,
    }
}

/// Every course-code token in scannable elements, first sighting fixing
/// the output order. Later sightings may upgrade the status and always
/// refresh the details snippet.
fn collect_courses(doc: &ReportDoc) -> Vec<SurveyCourse> {
    let mut courses: Vec<SurveyCourse> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for el in doc.select(&SCAN_SEL) {
        let full = el.text();
        if full.is_empty() {
            continue;
        }

        let status = infer_course_status(&full);
        let details: String = full.chars().take(COURSE_DETAILS_LIMIT).collect();

        for m in SURVEY_CODE_RE.find_iter(&full) {
            let token = text::normalize(m.as_str()).to_uppercase();
            match index.get(&token) {
                Some(&i) => {
                    if status.rank() > courses[i].status.rank() {
                        courses[i].status = status;
                    }
                    courses[i].details = details.clone();
                }
                None => {
                    index.insert(token.clone(), courses.len());
                    courses.push(SurveyCourse {
                        course: token,
                        status,
                        details: details.clone(),
                    });
                }
            }
        }
    }

    courses
}

/// Headings paired with their nearest requirement-looking container, or
/// the direct parent when none is found.
fn sketch_requirements(doc: &ReportDoc) -> Vec<SurveyRequirement> {
    let mut requirements = Vec::new();

    for heading in doc.select(&HEADING_SEL) {
        let title = heading.text();
        if title.is_empty() {
            continue;
        }

        let block = heading
            .ancestors_or_self()
            .into_iter()
            .find(|n| n.has_class("requirement") || n.has_class("block") || n.tag() == "section")
            .or_else(|| heading.parent());
        let block_text = block.map(|b| b.text()).unwrap_or_default();

        let status = if COMPLETED_BLOCK_RE.is_match(&block_text) {
            SurveyStatus::Completed
        } else if IN_PROGRESS_BLOCK_RE.is_match(&block_text) {
            SurveyStatus::InProgress
        } else {
            SurveyStatus::Planned
        };

        requirements.push(SurveyRequirement {
            title,
            status,
            detail: block_text.chars().take(REQUIREMENT_DETAIL_LIMIT).collect(),
        });
    }

    requirements
}

fn infer_course_status(text: &str) -> SurveyStatus {
    if COMPLETED_HINT_RE.is_match(text) {
        SurveyStatus::Completed
    } else if IN_PROGRESS_HINT_RE.is_match(text) {
        SurveyStatus::InProgress
    } else {
        SurveyStatus::Planned
    }
}

// ── Tests ──
