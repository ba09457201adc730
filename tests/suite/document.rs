//! Session documents across a save and reload.

use serde_json::{Value, json};
use transcript_engine::{
    CourseField, FilterSpec, Reconciler, SessionAction, SessionDocument, SortSpec,
};

use crate::common::{codes, course_json, open_engine, record, scale, session_json};

fn reload(engine: &Reconciler) -> Reconciler {
    let saved = engine.document().to_json_pretty().unwrap();
    let document = SessionDocument::from_json_str(&saved, &scale()).unwrap();
    Reconciler::open(document, scale())
}

#[test]
fn edits_survive_a_save_and_reload() {
    let mut engine = open_engine();
    for action in [
        SessionAction::Remove(Some("PH101".into())),
        SessionAction::Add(Some(record("BI201", "EN", 5, "A-"))),
        SessionAction::Update(Some(record("CS101", "TR", 3, "B"))),
        SessionAction::Sort(SortSpec::ascending(CourseField::Grade)),
        SessionAction::PushFilter(FilterSpec::parse(CourseField::Language, ["EN", "TR"]).unwrap()),
    ] {
        engine.apply(action).unwrap();
    }

    let reopened = reload(&engine);
    assert_eq!(reopened.working(), engine.working());
    assert_eq!(reopened.log(), engine.log());
    assert_eq!(reopened.filters(), engine.filters());
    assert_eq!(reopened.sort_spec(), engine.sort_spec());
    assert_eq!(reopened.performance(), engine.performance());
}

#[test]
fn saved_document_keeps_schema_and_unknown_keys() {
    let mut engine = open_engine();
    engine.remove("HI101").unwrap();

    let saved: Value = serde_json::from_str(&engine.document().to_json_pretty().unwrap()).unwrap();
    assert_eq!(saved["reader_settings"], json!({"zoom": 1.5}));
    assert_eq!(saved["added_course_list"], json!([]));
    assert_eq!(saved["updated_course_list"], json!([]));
    assert_eq!(saved["subtracted_course_list"][0]["course_code"], "HI101");
    assert_eq!(saved["sorting"], json!({"sort_key": null, "should_reverse": false}));
    assert_eq!(
        saved["modified_course_list"]
            .as_array()
            .unwrap()
            .iter()
            .map(|course| course["course_code"].as_str().unwrap())
            .collect::<Vec<_>>(),
        ["CS101", "MA101", "PH101", "EC101"]
    );
    assert_eq!(saved["original_course_list"].as_array().unwrap().len(), 5);
}

#[test]
fn stale_cached_working_list_is_replaced_on_open() {
    let mut raw = session_json();
    raw["modified_course_list"] = json!([course_json("ZZ999", "EN", 1, "A")]);
    raw["subtracted_course_list"] = json!([{"course_code": "EC101"}]);

    let document = SessionDocument::from_value(raw, &scale()).unwrap();
    let engine = Reconciler::open(document, scale());
    assert_eq!(codes(engine.working()), ["CS101", "MA101", "PH101", "HI101"]);
}

#[test]
fn legacy_code_only_subtraction_round_trips() {
    let mut raw = session_json();
    raw["subtracted_course_list"] = json!([{"course_code": "MA101"}]);
    let engine = Reconciler::open(SessionDocument::from_value(raw, &scale()).unwrap(), scale());

    let saved: Value = serde_json::from_str(&engine.document().to_json_pretty().unwrap()).unwrap();
    assert_eq!(saved["subtracted_course_list"], json!([{"course_code": "MA101"}]));
    assert!(engine.record("MA101").is_none());
}

#[test]
fn persisted_filters_and_sort_apply_on_open() {
    let mut raw = session_json();
    raw["filtering"] = json!([{"filter_key": "course_lang", "allowed_values": ["EN"]}]);
    raw["sorting"] = json!({"sort_key": "course_credit", "should_reverse": true});

    let mut engine = Reconciler::open(SessionDocument::from_value(raw, &scale()).unwrap(), scale());
    assert_eq!(codes(engine.working()), ["PH101", "CS101", "EC101"]);

    // The persisted direction counts as the last click on that column.
    engine.sort_column(CourseField::Credit);
    assert_eq!(engine.sort_spec(), SortSpec::ascending(CourseField::Credit));
    assert_eq!(codes(engine.working()), ["CS101", "EC101", "PH101"]);
}

#[test]
fn performance_compares_baseline_with_working_list() {
    let mut engine = open_engine();
    // Baseline: A(3) B+(4) C(4) F(3) in GPA, W(2) excluded.
    let before = engine.performance();
    assert_eq!(before.original, before.modified);
    assert_eq!(before.original.credits_attempted, 16);
    assert_eq!(before.original.credits_successful, 11);
    assert_eq!(before.original.credits_included_in_gpa, 14);
    assert_eq!(before.original.gpa_hundredths, 237);

    engine.remove("EC101").unwrap();
    let after = engine.performance();
    assert_eq!(after.modified.credits_included_in_gpa, 11);
    assert_eq!(after.modified.gpa_hundredths, 302);
    assert_eq!(after.original, before.original);
}

#[test]
fn edits_under_active_view_match_the_reloaded_list() {
    let mut engine = open_engine();
    engine.sort_column(CourseField::Credit);
    engine.add(record("BI201", "EN", 1, "A")).unwrap();
    assert_eq!(
        codes(engine.working()),
        ["BI201", "HI101", "CS101", "EC101", "MA101", "PH101"]
    );

    engine.push_filter(FilterSpec::parse(CourseField::Language, ["EN"]).unwrap());
    engine.add(record("LI301", "TR", 2, "B")).unwrap();
    engine.update(record("CS101", "EN", 7, "B")).unwrap();

    let reopened = reload(&engine);
    assert_eq!(reopened.working(), engine.working());
    assert_eq!(codes(engine.working()), ["BI201", "EC101", "PH101", "CS101"]);
}
