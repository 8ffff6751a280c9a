//! Degree audit HTML parsing and record assembly.

pub mod assemble;
pub mod dom;
pub mod extract;
pub mod status;
pub mod text;

pub use dom::{ParseError, ReportDoc};

use crate::record::DegreeRecord;

/// Full pipeline over a parsed document: student header, requirement
/// cards, course tables, then assembly with dedup and backfill.
pub fn convert_parsed(doc: &ReportDoc) -> DegreeRecord {
    let student = extract::student::extract(doc);
    let default_year = extract::requirements::default_catalog_year(doc);
    let requirements = extract::requirements::extract(doc, &default_year);
    let courses = extract::courses::extract(doc);
    assemble::assemble(student, requirements, courses)
}

/// Parses raw HTML and converts it. Only input with no usable content
/// fails; anything else produces a record, however sparse.
pub fn convert_document(html: &str) -> Result<DegreeRecord, ParseError> {
    let doc = ReportDoc::parse(html)?;
    Ok(convert_parsed(&doc))
}

// ── Tests ──
