use super::{match_end, match_start, Section};

#[test]
fn test_markers_round_trip_through_matchers() {
    let section = Section::new(vec![], "PySH Bootstrap", vec![]);

    assert_eq!(section.start_marker(), "# PySH Bootstrap -->");
    assert_eq!(section.end_marker(), "# <-- PySH Bootstrap");
    assert_eq!(
        match_start(&section.start_marker()).as_deref(),
        Some("PySH Bootstrap")
    );
    assert_eq!(
        match_end(&section.end_marker()),
        Some(("PySH Bootstrap".to_string(), 7))
    );
}

#[test]
fn test_names_are_restricted() {
    assert_eq!(match_start("# my-section 2 -->").as_deref(), Some("my-section 2"));
    assert_eq!(match_start("# under_score -->"), None);
    assert_eq!(match_start("# dotted.name -->"), None);
    assert_eq!(match_start("#A -->"), None);
    assert_eq!(match_start("# A -->  "), None);
    assert_eq!(match_start("  # A -->"), None);
}

#[test]
fn test_start_and_end_do_not_overlap() {
    assert_eq!(match_start("# <-- A"), None);
    assert_eq!(match_end("# A -->"), None);
    assert_eq!(match_end("# <--A"), None);
}
