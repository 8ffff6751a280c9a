use std::sync::LazyLock;

use regex::Regex;

static COMPLETE_PHRASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Requirement is complete").unwrap());
static NOT_COMPLETE_PHRASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Not complete").unwrap());
static IN_PROGRESS_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)When the in[- ]progress classes are completed this requirement should be complete")
        .unwrap()
});

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove the fixed phrases the report generator appends to titles, then
/// re-normalize.
pub fn strip_boilerplate(text: &str) -> String {
    let stripped = COMPLETE_PHRASE_RE.replace_all(text, "");
    let stripped = NOT_COMPLETE_PHRASE_RE.replace_all(&stripped, "");
    let stripped = IN_PROGRESS_PHRASE_RE.replace_all(&stripped, "");
    normalize(&stripped)
}

/// Doubled-label detection: even token count, case-insensitive first half
/// equal to the second. The generator sometimes renders a title twice
/// back-to-back; an empty return signals "discard this label".
pub fn dedupe_repeated_halves(text: &str) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() >= 2 && tokens.len() % 2 == 0 {
        let half = tokens.len() / 2;
        let first = tokens[..half].join(" ").to_uppercase();
        let second = tokens[half..].join(" ").to_uppercase();
        if first == second {
            return String::new();
        }
    }
    text.to_string()
}

/// Requirement titles: strip boilerplate, then drop doubled labels entirely.
pub fn clean_requirement_name(raw: &str) -> String {
    let name = strip_boilerplate(raw);
    if name.is_empty() {
        return String::new();
    }
    dedupe_repeated_halves(&name)
}

/// Course names from row cells: only the two short phrases are stripped,
/// and a doubled label keeps its first half instead of being discarded.
pub fn clean_course_name(raw: &str) -> String {
    let stripped = COMPLETE_PHRASE_RE.replace_all(raw, "");
    let stripped = NOT_COMPLETE_PHRASE_RE.replace_all(&stripped, "");
    let name = normalize(&stripped);
    let tokens: Vec<&str> = name.split_whitespace().collect();
    if !tokens.is_empty() && tokens.len() % 2 == 0 {
        let half = tokens.len() / 2;
        let first = tokens[..half].join(" ");
        let second = tokens[half..].join(" ");
        if first.to_uppercase() == second.to_uppercase() {
            return first;
        }
    }
    name
}

// ── Tests ──
