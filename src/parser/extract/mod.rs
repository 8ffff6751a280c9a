pub mod courses;
pub mod requirements;
pub mod student;

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::dom::ReportDoc;
    use crate::record::{SbcFulfillment, Status};

    fn fixture(name: &str) -> ReportDoc {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap();
        ReportDoc::parse(&html).unwrap()
    }

    #[test]
    fn student_info_from_full_audit() {
        let doc = fixture("full_audit.html");
        let info = student::extract(&doc);
        assert_eq!(info.name, "Rivera, Alex");
        assert_eq!(info.major, "Computer Science");
        assert_eq!(info.credits_required, 120.0);
        assert_eq!(info.credits_applied, 93.5);
    }

    #[test]
    fn requirements_from_full_audit() {
        let doc = fixture("full_audit.html");
        let default_year = requirements::default_catalog_year(&doc);
        assert_eq!(default_year, "Fall 2022");

        let reqs = requirements::extract(&doc, &default_year);
        let names: Vec<&str> = reqs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Major Requirements",
                "General Education Requirements",
                "Upper Division Credit Requirement",
                "Degree in Bachelor of Science",
            ]
        );

        assert_eq!(reqs[0].status, Status::Complete);
        assert_eq!(reqs[0].credits_required, Some(39));
        assert_eq!(reqs[0].credits_applied, Some(39));
        assert_eq!(reqs[0].catalog_year, "Fall 2023");

        assert_eq!(reqs[1].status, Status::InProgress);
        assert_eq!(reqs[2].status, Status::Incomplete);
        assert_eq!(reqs[2].catalog_year, "Fall 2022");
        assert_eq!(reqs[3].status, Status::InProgress);
        assert_eq!(reqs[3].id, "degree_in_bachelor_of_science");
    }

    #[test]
    fn courses_from_full_audit() {
        let doc = fixture("full_audit.html");
        let buckets = courses::extract(&doc);

        // Raw buckets: the CSE 214 repeat collapses later, at assembly
        let completed: Vec<&str> = buckets.completed.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(completed, ["CSE 214", "WRT 102", "CSE 214"]);
        assert_eq!(
            buckets.completed[1].sbc_fulfillment,
            Some(SbcFulfillment::Partial)
        );

        let in_progress: Vec<&str> =
            buckets.in_progress.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(in_progress, ["CSE 316"]);

        let incomplete: Vec<(&str, &str)> = buckets
            .incomplete
            .iter()
            .map(|c| (c.code.as_str(), c.title.as_str()))
            .collect();
        assert_eq!(
            incomplete,
            [
                ("MAT 211", "Introduction to Linear Algebra"),
                ("ECO 321", "Econometrics"),
                ("", "1 Class in ACC 210 or ACC 311 or ACC 314"),
                ("AMS 301", "1 Class in AMS 301"),
            ]
        );
    }

    #[test]
    fn legacy_audit_uses_text_fallbacks() {
        let doc = fixture("legacy_audit.html");

        let info = student::extract(&doc);
        assert_eq!(info.name, "Doe, Jane");
        assert_eq!(info.major, "Economics");
        assert_eq!(info.credits_required, 120.0);
        assert_eq!(info.credits_applied, 87.0);

        let default_year = requirements::default_catalog_year(&doc);
        assert_eq!(default_year, "Spring 2021");

        let reqs = requirements::extract(&doc, &default_year);
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].name, "Major Requirements");
        assert_eq!(reqs[0].status, Status::Incomplete);
        assert_eq!(reqs[0].catalog_year, "Spring 2021");

        let buckets = courses::extract(&doc);
        assert_eq!(buckets.completed.len(), 1);
        assert_eq!(buckets.completed[0].code, "ECO 108");
        assert!(buckets.incomplete.is_empty());
    }
}
