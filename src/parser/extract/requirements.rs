use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;

use crate::parser::dom::ReportDoc;
use crate::parser::{status, text};
use crate::record::{Requirement, Status};

/// Container class the report generator wraps each requirement block in.
/// Matched as a substring of the class attribute.
const CARD_MARKER: &str = "MuiPaper-root";

static TH_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());
static BLOCK_HEADING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"h3[id^="block-"]"#).unwrap());
static STATUS_LABEL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[id$="_statusLabel"]"#).unwrap());

static REQUIREMENT_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Requirement").unwrap());
static DEGREE_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^Degree in ").unwrap());
static KNOWN_SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(General Education Requirements|Upper Division Credit Requirement|Major Requirements|Fall Through)")
        .unwrap()
});
static CREDITS_REQUIRED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Credits required:\s*(\d+)").unwrap());
static CREDITS_APPLIED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Credits applied:\s*(\d+)").unwrap());
static CATALOG_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Catalog year:\s*([A-Za-z]+\s+\d{4})").unwrap());
static WORD_START_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w").unwrap());
static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]+").unwrap());

pub fn extract(doc: &ReportDoc, default_catalog_year: &str) -> Vec<Requirement> {
    // Table headers first, then block headings; order decides out in the
    // first-wins dedup below
    let mut candidates = doc.select(&TH_SEL);
    candidates.extend(doc.select(&BLOCK_HEADING_SEL));

    let mut reqs: Vec<Requirement> = Vec::new();
    let mut seen: HashSet<(String, Option<u32>, Option<u32>, String)> = HashSet::new();

    for node in candidates {
        let is_heading = node.tag() == "h3";

        // Block headings prefer direct text so nested badges stay out
        let title_text = if is_heading {
            let own = node.own_text();
            if own.is_empty() {
                node.text()
            } else {
                own
            }
        } else {
            node.text()
        };
        if title_text.is_empty() {
            continue;
        }

        if !is_heading && !qualifies(&title_text) {
            continue;
        }

        let name = text::clean_requirement_name(&title_text);
        if name.is_empty() {
            continue;
        }

        let card_text = node.enclosing_card(CARD_MARKER).text();

        let req_status = if is_heading {
            node.first(&STATUS_LABEL_SEL)
                .and_then(|label| status::from_label(&label.text()))
                .unwrap_or_else(|| status::classify(&card_text))
        } else {
            status::classify(&card_text)
        };

        let credits_required = capture_u32(&CREDITS_REQUIRED_RE, &card_text);
        let credits_applied = capture_u32(&CREDITS_APPLIED_RE, &card_text);
        let catalog_year = CATALOG_YEAR_RE
            .captures(&card_text)
            .map(|c| title_case(&c[1]))
            .unwrap_or_else(|| default_catalog_year.to_string());

        let key = (
            name.clone(),
            credits_required,
            credits_applied,
            catalog_year.clone(),
        );
        if !seen.insert(key) {
            continue;
        }

        reqs.push(Requirement {
            id: slug(&name),
            name,
            status: req_status,
            credits_required,
            credits_applied,
            catalog_year,
        });
    }

    // Final pass: one requirement per name, first occurrence wins
    let mut names: HashSet<String> = HashSet::new();
    reqs.retain(|r| names.insert(r.name.clone()));
    reqs
}

fn qualifies(title: &str) -> bool {
    REQUIREMENT_WORD_RE.is_match(title)
        || DEGREE_PREFIX_RE.is_match(title)
        || KNOWN_SECTION_RE.is_match(title)
}

/// Document-wide catalog year, the default for cards without one of
/// their own.
pub fn default_catalog_year(doc: &ReportDoc) -> String {
    CATALOG_YEAR_RE
        .captures(&doc.text())
        .map(|c| title_case(&c[1]))
        .unwrap_or_default()
}

/// Lowercased name with non-word runs as underscores, capped at 64 chars.
pub fn slug(name: &str) -> String {
    let lowered = name.to_lowercase();
    NON_WORD_RE
        .replace_all(&lowered, "_")
        .chars()
        .take(64)
        .collect()
}

fn title_case(s: &str) -> String {
    WORD_START_RE
        .replace_all(s, |caps: &regex::Captures| caps[0].to_uppercase())
        .into_owned()
}

fn capture_u32(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text).and_then(|c| c[1].parse::<u32>().ok())
}

// ── Tests ──
