use serde_json::json;

use survey_spec::{LoadError, definition_schema, load_survey, load_survey_value};

#[test]
fn weekly_fixture_loads() {
    let survey = load_survey(include_str!("../tests/fixtures/weekly.json")).expect("load");
    assert_eq!(survey.id, "weekly");
    assert_eq!(survey.single_items().len(), 5);
    assert!(survey.find_item("weekly.symptoms.q4").is_some());
}

#[test]
fn unknown_opcode_is_a_load_error() {
    let result = load_survey_value(json!({
        "id": "weekly",
        "version": "1",
        "root": {
            "key": "weekly",
            "items": [
                {
                    "type": "single",
                    "key": "weekly.q1",
                    "condition": { "name": "sampleRandom", "data": [] }
                }
            ]
        }
    }));
    assert!(matches!(result, Err(LoadError::Parse(_))));
}

#[test]
fn unknown_selection_method_is_a_load_error() {
    let result = load_survey_value(json!({
        "id": "weekly",
        "version": "1",
        "root": {
            "key": "weekly",
            "selectionMethod": { "name": "uniform" },
            "items": []
        }
    }));
    assert!(matches!(result, Err(LoadError::Parse(_))));
}

#[test]
fn structural_problems_are_definition_errors() {
    let result = load_survey_value(json!({
        "id": "weekly",
        "version": "1",
        "root": {
            "key": "weekly",
            "items": [
                {
                    "type": "single",
                    "key": "weekly.q1",
                    "condition": { "name": "not", "data": [] }
                }
            ]
        }
    }));
    let err = result.expect_err("arity error");
    assert!(matches!(err, LoadError::Definition(_)));
    assert!(err.to_string().contains("'not'"));
}

#[test]
fn schema_describes_root_group() {
    let schema = definition_schema();
    let properties = schema["properties"].as_object().expect("properties");
    assert!(properties.contains_key("root"));
    assert!(properties.contains_key("version"));
}
