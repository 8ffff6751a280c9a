use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;

use crate::parser::dom::{Node, ReportDoc};
use crate::parser::text;
use crate::record::{Course, SbcFulfillment, Status};

static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td, th").unwrap());
static ANY_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("*").unwrap());

static STILL_NEEDED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Still needed:\s*(.*)$").unwrap());
static STILL_NEEDED_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Still needed:\s*").unwrap());
static COURSE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{3})\s*(\d{3}[A-Z]?)\b").unwrap());
static OR_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bor\b").unwrap());
static EXCEPT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Except").unwrap());
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+(\.\d+)?)").unwrap());
static DIGIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").unwrap());
static FUTURE_TERM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(FALL|SPRING|SUMMER|WINTER)\s+20\d{2}\b").unwrap());

const PLANNED_NOTE: &str = "Listed in audit without a term/grade (likely still needed / planned).";

// Credit cells above this are mis-parsed years, not real credit values
const CREDIT_SANITY_LIMIT: f64 = 10.0;

/// Course rows split into the three disjoint buckets. Dedup happens at
/// assembly; the sweep below needs the raw lists.
#[derive(Debug, Default)]
pub struct CourseBuckets {
    pub completed: Vec<Course>,
    pub in_progress: Vec<Course>,
    pub incomplete: Vec<Course>,
}

#[derive(Debug, Default, Clone, Copy)]
struct ColumnMap {
    code: Option<usize>,
    title: Option<usize>,
    grade: Option<usize>,
    credits: Option<usize>,
    term: Option<usize>,
    sbc_category: Option<usize>,
}

pub fn extract(doc: &ReportDoc) -> CourseBuckets {
    let mut buckets = CourseBuckets::default();

    for table in doc.select(&TABLE_SEL) {
        scan_table(&table.select(&ROW_SEL), &mut buckets);
    }

    sweep_loose_still_needed(doc, &mut buckets);
    buckets
}

/// One header row bounds one logical course block; only the first usable
/// header per table is consumed.
fn scan_table(rows: &[Node], buckets: &mut CourseBuckets) {
    for (i, row) in rows.iter().enumerate() {
        let header_cells = row_cells(row);
        if !is_header_row(&header_cells) {
            continue;
        }

        let columns = build_column_map(&header_cells);
        if columns.code.is_none() && columns.title.is_none() && columns.credits.is_none() {
            continue;
        }

        for row in &rows[i + 1..] {
            let cells = row_cells(row);
            if cells.is_empty() {
                continue;
            }
            // Another header starts another course block
            if is_header_row(&cells) {
                break;
            }
            scan_row(&cells, columns, buckets);
        }
        break;
    }
}

fn scan_row(cells: &[String], columns: ColumnMap, buckets: &mut CourseBuckets) {
    let row_text = cells.join(" ").trim().to_string();
    if row_text.is_empty() {
        return;
    }

    let code = cell_at(cells, columns.code);
    let title = cell_at(cells, columns.title);
    let grade = cell_at(cells, columns.grade);
    let credits_text = cell_at(cells, columns.credits);
    let term = cell_at(cells, columns.term);
    let sbc_category = cell_at(cells, columns.sbc_category);

    // No code and no title: not a real course row
    if code.is_empty() && title.is_empty() {
        return;
    }

    let credits = first_number(&credits_text);

    if row_text.to_uppercase().contains("STILL NEEDED") {
        push_still_needed(&row_text, cells, credits, buckets);
        return;
    }

    if credits > CREDIT_SANITY_LIMIT || !DIGIT_RE.is_match(&code) {
        return;
    }

    let grade_empty = grade.is_empty();
    let paren_credits = credits_text.contains('(') || credits_text.contains(')');
    let term_has_value = !term.is_empty();
    let future_term_no_grade = FUTURE_TERM_RE.is_match(&term) && grade_empty;

    let sbc_fulfillment = Some(infer_sbc_fulfillment(&sbc_category));
    let course = Course {
        code,
        title,
        grade: if grade_empty { None } else { Some(grade) },
        credits,
        term,
        sbc_category,
        status: Status::Complete,
        sbc_fulfillment,
        note: None,
    };

    if grade_empty && !term_has_value {
        buckets.incomplete.push(Course {
            status: Status::Incomplete,
            note: Some(PLANNED_NOTE.to_string()),
            ..course
        });
    } else if grade_empty || paren_credits || future_term_no_grade {
        buckets.in_progress.push(Course {
            status: Status::InProgress,
            ..course
        });
    } else {
        buckets.completed.push(course);
    }
}

/// "Still needed" narrative rows. Exactly one course code, no "Except"
/// and no "or" makes a single missing course; everything else becomes a
/// codeless entry carrying the requirement text.
fn push_still_needed(row_text: &str, cells: &[String], credits: f64, buckets: &mut CourseBuckets) {
    let requirement_text = match STILL_NEEDED_RE.captures(row_text) {
        Some(caps) => caps[1].trim().to_string(),
        None => STILL_NEEDED_PREFIX_RE.replace(row_text, "").trim().to_string(),
    };
    if requirement_text.is_empty() {
        return;
    }

    let has_except = EXCEPT_RE.is_match(&requirement_text);
    let has_or = OR_WORD_RE.is_match(&requirement_text);

    let codes: Vec<String> = if has_except {
        Vec::new()
    } else {
        COURSE_CODE_RE
            .captures_iter(&requirement_text)
            .map(|c| format!("{} {}", &c[1], &c[2]))
            .collect()
    };

    if !has_except && !has_or && codes.len() == 1 {
        // Course name from the first cell when it survives cleaning
        let course_name = cells
            .first()
            .map(|c| text::clean_course_name(c))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| requirement_text.clone());

        buckets.incomplete.push(Course {
            code: codes[0].clone(),
            title: course_name,
            grade: None,
            credits,
            term: String::new(),
            sbc_category: String::new(),
            status: Status::Incomplete,
            sbc_fulfillment: None,
            note: None,
        });
    } else {
        buckets.incomplete.push(Course {
            code: String::new(),
            title: requirement_text,
            grade: None,
            credits,
            term: String::new(),
            sbc_category: String::new(),
            status: Status::Incomplete,
            sbc_fulfillment: None,
            note: None,
        });
    }
}

/// Still-needed lines living outside any course table (summary panels,
/// loose paragraphs). Codes already recorded anywhere stay out; membership
/// keys are trimmed and uppercased first.
fn sweep_loose_still_needed(doc: &ReportDoc, buckets: &mut CourseBuckets) {
    let mut seen_codes: HashSet<String> = buckets
        .completed
        .iter()
        .chain(buckets.in_progress.iter())
        .chain(buckets.incomplete.iter())
        .map(|c| c.code.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect();

    for el in doc.select(&ANY_SEL) {
        let text = el.text();
        if !STILL_NEEDED_PREFIX_RE.is_match(&text) {
            continue;
        }

        let cleaned = STILL_NEEDED_PREFIX_RE.replace(&text, "").trim().to_string();
        if cleaned.is_empty() {
            continue;
        }
        // Range rules and multi-option lists are handled by the table walk
        if EXCEPT_RE.is_match(&cleaned) || OR_WORD_RE.is_match(&cleaned) {
            continue;
        }

        let codes: Vec<String> = COURSE_CODE_RE
            .captures_iter(&cleaned)
            .map(|c| format!("{} {}", &c[1], &c[2]))
            .collect();
        if codes.len() != 1 {
            continue;
        }

        let key = codes[0].trim().to_uppercase();
        if seen_codes.contains(&key) {
            continue;
        }

        buckets.incomplete.push(Course {
            code: codes[0].clone(),
            title: cleaned,
            grade: None,
            credits: 0.0,
            term: String::new(),
            sbc_category: String::new(),
            status: Status::Incomplete,
            sbc_fulfillment: None,
            note: None,
        });
        seen_codes.insert(key);
    }
}

fn row_cells(row: &Node) -> Vec<String> {
    row.select(&CELL_SEL).into_iter().map(|c| c.text()).collect()
}

/// Header rows mention course, title and credit somewhere in their cells.
fn is_header_row(cells: &[String]) -> bool {
    let lower: Vec<String> = cells.iter().map(|c| c.to_lowercase()).collect();
    let has = |needle: &str| lower.iter().any(|c| c.contains(needle));
    has("course") && has("title") && has("credit")
}

/// First matching column wins per field, and each cell feeds at most one
/// field ("Course Title" maps to code only).
fn build_column_map(cells: &[String]) -> ColumnMap {
    let mut map = ColumnMap::default();
    for (idx, cell) in cells.iter().enumerate() {
        let t = cell.to_lowercase();
        if t.contains("course") && map.code.is_none() {
            map.code = Some(idx);
        } else if t.contains("title") && map.title.is_none() {
            map.title = Some(idx);
        } else if t.contains("grade") && map.grade.is_none() {
            map.grade = Some(idx);
        } else if t.contains("credit") && map.credits.is_none() {
            map.credits = Some(idx);
        } else if t.contains("term") && map.term.is_none() {
            map.term = Some(idx);
        } else if (t.contains("sbc") || t.contains("category")) && map.sbc_category.is_none() {
            map.sbc_category = Some(idx);
        }
    }
    map
}

fn cell_at(cells: &[String], idx: Option<usize>) -> String {
    idx.and_then(|i| cells.get(i)).cloned().unwrap_or_default()
}

fn first_number(text: &str) -> f64 {
    NUMBER_RE
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn infer_sbc_fulfillment(category: &str) -> SbcFulfillment {
    if category.to_uppercase().contains("PARTIAL") {
        SbcFulfillment::Partial
    } else {
        SbcFulfillment::Full
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> ReportDoc {
        ReportDoc::parse(html).unwrap()
    }

    const HEADER: &str = "<tr><th>Course</th><th>Title</th><th>Grade</th><th>Credits</th><th>Term</th><th>SBC</th></tr>";

    fn table(rows: &str) -> String {
        format!("<table>{}{}</table>", HEADER, rows)
    }

    fn row(cells: &[&str]) -> String {
        let tds: String = cells.iter().map(|c| format!("<td>{}</td>", c)).collect();
        format!("<tr>{}</tr>", tds)
    }

    #[test]
    fn completed_row() {
        let html = table(&row(&["CSE 310", "Computer Networks", "A", "3", "FALL 2023", "TECH"]));
        let buckets = extract(&parse(&html));
        assert_eq!(buckets.completed.len(), 1);
        let c = &buckets.completed[0];
        assert_eq!(c.code, "CSE 310");
        assert_eq!(c.title, "Computer Networks");
        assert_eq!(c.grade.as_deref(), Some("A"));
        assert_eq!(c.credits, 3.0);
        assert_eq!(c.term, "FALL 2023");
        assert_eq!(c.status, Status::Complete);
        assert_eq!(c.sbc_fulfillment, Some(SbcFulfillment::Full));
    }

    #[test]
    fn missing_grade_is_in_progress() {
        let html = table(&row(&["CSE 316", "Fundamentals of Software", "", "3", "SPRING 2026", ""]));
        let buckets = extract(&parse(&html));
        assert!(buckets.completed.is_empty());
        assert_eq!(buckets.in_progress.len(), 1);
        assert_eq!(buckets.in_progress[0].grade, None);
        assert_eq!(buckets.in_progress[0].status, Status::InProgress);
    }

    #[test]
    fn paren_credits_is_in_progress_even_with_grade() {
        let html = table(&row(&["BIO 201", "Cell Biology", "B+", "(4)", "FALL 2024", ""]));
        let buckets = extract(&parse(&html));
        assert_eq!(buckets.in_progress.len(), 1);
        assert_eq!(buckets.in_progress[0].grade.as_deref(), Some("B+"));
        assert_eq!(buckets.in_progress[0].credits, 4.0);
    }

    #[test]
    fn no_grade_no_term_is_incomplete_with_note() {
        let html = table(&row(&["MAT 211", "Linear Algebra", "", "3", "", ""]));
        let buckets = extract(&parse(&html));
        assert_eq!(buckets.incomplete.len(), 1);
        let c = &buckets.incomplete[0];
        assert_eq!(c.status, Status::Incomplete);
        assert_eq!(c.note.as_deref(), Some(PLANNED_NOTE));
        assert_eq!(c.sbc_fulfillment, Some(SbcFulfillment::Full));
    }

    #[test]
    fn partial_sbc_category() {
        let html = table(&row(&["WRT 102", "Writing", "A", "3", "FALL 2022", "WRTD (Partial)"]));
        let buckets = extract(&parse(&html));
        assert_eq!(buckets.completed[0].sbc_fulfillment, Some(SbcFulfillment::Partial));
    }

    #[test]
    fn year_credits_excluded() {
        let html = table(&row(&["HIS 101", "World History", "A", "2023", "FALL 2023", ""]));
        let buckets = extract(&parse(&html));
        assert!(buckets.completed.is_empty());
        assert!(buckets.in_progress.is_empty());
        assert!(buckets.incomplete.is_empty());
    }

    #[test]
    fn code_without_digit_excluded() {
        let html = table(&row(&["TRANSFER", "Transfer Credit Block", "A", "3", "FALL 2020", ""]));
        let buckets = extract(&parse(&html));
        assert!(buckets.completed.is_empty());
        assert!(buckets.incomplete.is_empty());
    }

    #[test]
    fn still_needed_single_course() {
        let html = table(&row(&[
            "Econometrics Econometrics",
            "Still needed: 1 Class in ECO 321",
            "",
            "3",
            "",
            "",
        ]));
        let buckets = extract(&parse(&html));
        assert_eq!(buckets.incomplete.len(), 1);
        let c = &buckets.incomplete[0];
        assert_eq!(c.code, "ECO 321");
        assert_eq!(c.title, "Econometrics");
        assert_eq!(c.credits, 3.0);
        assert_eq!(c.grade, None);
        assert_eq!(c.sbc_fulfillment, None);
    }

    #[test]
    fn still_needed_multi_option_stays_generic() {
        let html = table(&row(&["Business Electives", "Still needed: 1 Class in ACC 210 or 311 or 314", "", "", "", ""]));
        let buckets = extract(&parse(&html));
        assert_eq!(buckets.incomplete.len(), 1);
        let c = &buckets.incomplete[0];
        assert_eq!(c.code, "");
        assert_eq!(c.title, "1 Class in ACC 210 or 311 or 314");
    }

    #[test]
    fn still_needed_except_stays_generic() {
        let html = table(&row(&["Upper Division", "Still needed: 3 Credits in ECO 300:399 Except ECO 321", "", "", "", ""]));
        let buckets = extract(&parse(&html));
        assert_eq!(buckets.incomplete.len(), 1);
        assert_eq!(buckets.incomplete[0].code, "");
    }

    #[test]
    fn compact_code_normalized_with_space() {
        let html = table(&row(&["Networks", "Still needed: 1 Class in CSE310", "", "", "", ""]));
        let buckets = extract(&parse(&html));
        assert_eq!(buckets.incomplete[0].code, "CSE 310");
    }

    #[test]
    fn second_header_bounds_the_block() {
        let html = format!(
            "<table>{}{}{}{}</table>",
            HEADER,
            row(&["CSE 310", "Computer Networks", "A", "3", "FALL 2023", ""]),
            HEADER,
            row(&["CSE 320", "Systems", "A", "3", "FALL 2023", ""]),
        );
        let buckets = extract(&parse(&html));
        assert_eq!(buckets.completed.len(), 1);
        assert_eq!(buckets.completed[0].code, "CSE 310");
    }

    #[test]
    fn each_table_scanned_independently() {
        let html = format!(
            "{}{}",
            table(&row(&["CSE 310", "Computer Networks", "A", "3", "FALL 2023", ""])),
            table(&row(&["AMS 310", "Probability", "B", "3", "SPRING 2024", ""])),
        );
        let buckets = extract(&parse(&html));
        assert_eq!(buckets.completed.len(), 2);
    }

    #[test]
    fn rows_without_code_or_title_skipped() {
        let html = table(&row(&["", "", "", "3", "FALL 2023", ""]));
        let buckets = extract(&parse(&html));
        assert!(buckets.completed.is_empty());
        assert!(buckets.in_progress.is_empty());
        assert!(buckets.incomplete.is_empty());
    }

    #[test]
    fn sweep_picks_up_loose_still_needed() {
        let html = "<div><p>Still needed: 1 Class in ECO 321</p></div>";
        let buckets = extract(&parse(html));
        assert_eq!(buckets.incomplete.len(), 1);
        let c = &buckets.incomplete[0];
        assert_eq!(c.code, "ECO 321");
        assert_eq!(c.title, "1 Class in ECO 321");
        assert_eq!(c.credits, 0.0);
    }

    #[test]
    fn sweep_skips_codes_already_recorded() {
        let html = format!(
            "{}<p>Still needed: 1 Class in CSE 310</p>",
            table(&row(&["CSE 310", "Computer Networks", "A", "3", "FALL 2023", ""])),
        );
        let buckets = extract(&parse(&html));
        assert_eq!(buckets.completed.len(), 1);
        assert!(buckets.incomplete.is_empty());
    }

    #[test]
    fn sweep_ignores_multi_code_lines() {
        let html = "<p>Still needed: ECO 321 and ECO 348</p>";
        let buckets = extract(&parse(html));
        assert!(buckets.incomplete.is_empty());
    }

    #[test]
    fn sweep_does_not_duplicate_nested_elements() {
        // The span, its paragraph and the wrapping div all start with the
        // same line; only one entry may come out
        let html = "<div><p><span>Still needed: 1 Class in ECO 321</span></p></div>";
        let buckets = extract(&parse(html));
        assert_eq!(buckets.incomplete.len(), 1);
    }

    #[test]
    fn no_tables_no_courses() {
        let buckets = extract(&parse("<p>Nothing tabular here</p>"));
        assert!(buckets.completed.is_empty());
        assert!(buckets.in_progress.is_empty());
        assert!(buckets.incomplete.is_empty());
    }
}
