use crate::record::Status;

// Ordered rules over uppercased text; first match wins. Order is
// load-bearing: the in-progress disclaimer also contains the word
// "complete", and "INCOMPLETE" contains "COMPLETE".
const TEXT_RULES: &[(&str, Status)] = &[
    ("REQUIREMENT IS COMPLETE", Status::Complete),
    ("IN-PROGRESS", Status::InProgress),
    ("SHOULD BE COMPLETE", Status::InProgress),
    ("STILL NEEDED", Status::Incomplete),
    ("INCOMPLETE", Status::Incomplete),
];

// Status-label widgets carry short canned strings; their own rule order
// keeps "NOT COMPLETE" from reading as complete.
const LABEL_RULES: &[(&str, Status)] = &[
    ("IN-PROGRESS", Status::InProgress),
    ("IN PROGRESS", Status::InProgress),
    ("STILL NEEDED", Status::Incomplete),
    ("NOT COMPLETE", Status::Incomplete),
    ("INCOMPLETE", Status::Incomplete),
    ("COMPLETE", Status::Complete),
];

/// Classify a free-text fragment. Defaults to INCOMPLETE, the conservative
/// reading for anything the rules do not recognize.
pub fn classify(text: &str) -> Status {
    let upper = text.to_uppercase();
    for (needle, status) in TEXT_RULES {
        if upper.contains(needle) {
            return *status;
        }
    }
    Status::Incomplete
}

/// Map status-label widget text to the enum. None for empty or
/// unrecognized labels, so callers can fall back to the card text.
pub fn from_label(label: &str) -> Option<Status> {
    let upper = label.trim().to_uppercase();
    if upper.is_empty() {
        return None;
    }
    LABEL_RULES
        .iter()
        .find(|(needle, _)| upper.contains(needle))
        .map(|(_, status)| *status)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_phrase() {
        assert_eq!(classify("Requirement is Complete"), Status::Complete);
    }

    #[test]
    fn in_progress_phrases() {
        assert_eq!(classify("Some classes are IN-PROGRESS"), Status::InProgress);
        assert_eq!(classify("this requirement should be complete soon"), Status::InProgress);
        assert_eq!(
            classify("When the in-progress classes are completed this requirement should be complete"),
            Status::InProgress
        );
    }

    #[test]
    fn incomplete_phrases() {
        assert_eq!(classify("Still needed: 1 Class in ECO 321"), Status::Incomplete);
        assert_eq!(classify("Requirement incomplete"), Status::Incomplete);
    }

    #[test]
    fn complete_wins_over_cooccurring_phrases() {
        let text = "Requirement is complete. Still needed: nothing. In-progress: none.";
        assert_eq!(classify(text), Status::Complete);
    }

    #[test]
    fn unrecognized_text_defaults_to_incomplete() {
        assert_eq!(classify("Catalog year: Fall 2024"), Status::Incomplete);
        assert_eq!(classify(""), Status::Incomplete);
    }

    #[test]
    fn label_mapping() {
        assert_eq!(from_label("In-progress"), Some(Status::InProgress));
        assert_eq!(from_label("In Progress"), Some(Status::InProgress));
        assert_eq!(from_label("Complete"), Some(Status::Complete));
        assert_eq!(from_label("Not Complete"), Some(Status::Incomplete));
        assert_eq!(from_label("Incomplete"), Some(Status::Incomplete));
        assert_eq!(from_label("Still Needed"), Some(Status::Incomplete));
    }

    #[test]
    fn label_fallthrough() {
        assert_eq!(from_label(""), None);
        assert_eq!(from_label("   "), None);
        assert_eq!(from_label("✓"), None);
    }
}
