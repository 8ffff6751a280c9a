use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;

use crate::parser::dom::ReportDoc;
use crate::record::StudentInfo;

static DT_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dt").unwrap());
static NAME_LABEL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[data-key="content-label"]"#).unwrap());

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Academic Progress Report for\s+([A-Za-z,\s]+?)(?:Student Information|$)")
        .unwrap()
});
static MAJOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Major in\s+(.+?)\s*(?:Block|Section|Requirements?|College|Level|Overall|Catalog|Credits|Audit|$)")
        .unwrap()
});
static CREDITS_REQUIRED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Credits required:\s*([\d.]+)").unwrap());
static CREDITS_APPLIED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Credits applied:\s*([\d.]+)").unwrap());

/// Best-effort student extraction; every miss defaults silently.
pub fn extract(doc: &ReportDoc) -> StudentInfo {
    let text = doc.text();
    let labels = label_map(doc);

    // A designated content-label element wins outright, even when empty
    let name = doc
        .first(&NAME_LABEL_SEL)
        .map(|n| n.text())
        .or_else(|| NAME_RE.captures(&text).map(|c| c[1].trim().to_string()))
        .unwrap_or_default();

    let major = labels
        .get("major")
        .cloned()
        .or_else(|| MAJOR_RE.captures(&text).map(|c| c[1].trim().to_string()))
        .unwrap_or_default();

    StudentInfo {
        name,
        major,
        credits_required: capture_f64(&CREDITS_REQUIRED_RE, &text),
        credits_applied: capture_f64(&CREDITS_APPLIED_RE, &text),
    }
}

/// Definition-list terms mapped to their adjacent value text. Keys are
/// lowercased; later pairs overwrite earlier ones.
fn label_map(doc: &ReportDoc) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for dt in doc.select(&DT_SEL) {
        let label = dt.text().to_lowercase();
        if label.is_empty() {
            continue;
        }
        let value = dt.next_element().map(|n| n.text()).filter(|v| !v.is_empty());
        if let Some(value) = value {
            map.insert(label, value);
        }
    }
    map
}

fn capture_f64(re: &Regex, text: &str) -> f64 {
    re.captures(text)
        .and_then(|c| c[1].trim_end_matches('.').parse::<f64>().ok())
        .unwrap_or(0.0)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> ReportDoc {
        ReportDoc::parse(html).unwrap()
    }

    #[test]
    fn name_from_content_label() {
        let doc = parse(
            "<div data-key=\"content-label\"> Doe, Jane </div>\
             <p>Academic Progress Report for Smith, John Student Information</p>",
        );
        assert_eq!(extract(&doc).name, "Doe, Jane");
    }

    #[test]
    fn empty_content_label_short_circuits() {
        let doc = parse(
            "<div data-key=\"content-label\"></div>\
             <p>Academic Progress Report for Smith, John Student Information</p>",
        );
        assert_eq!(extract(&doc).name, "");
    }

    #[test]
    fn name_from_report_heading() {
        let doc = parse("<p>Academic Progress Report for Doe, Jane Student Information Level UG</p>");
        assert_eq!(extract(&doc).name, "Doe, Jane");
    }

    #[test]
    fn major_from_definition_list() {
        let doc = parse(
            "<dl><dt>Level</dt><dd>Undergraduate</dd>\
             <dt>Major</dt><dd>Computer Science</dd></dl>",
        );
        assert_eq!(extract(&doc).major, "Computer Science");
    }

    #[test]
    fn major_from_text_fallback() {
        let doc = parse("<p>Degree in BS Major in Applied Mathematics College of Arts and Sciences</p>");
        assert_eq!(extract(&doc).major, "Applied Mathematics");
    }

    #[test]
    fn major_fallback_at_end_of_text() {
        let doc = parse("<p>Major in Economics</p>");
        assert_eq!(extract(&doc).major, "Economics");
    }

    #[test]
    fn credits_parsed_as_floats() {
        let doc = parse("<p>Credits required: 120 Credits applied: 93.5</p>");
        let student = extract(&doc);
        assert_eq!(student.credits_required, 120.0);
        assert_eq!(student.credits_applied, 93.5);
    }

    #[test]
    fn missing_fields_default() {
        let doc = parse("<p>Nothing useful here</p>");
        let student = extract(&doc);
        assert_eq!(student.name, "");
        assert_eq!(student.major, "");
        assert_eq!(student.credits_required, 0.0);
        assert_eq!(student.credits_applied, 0.0);
    }
}
