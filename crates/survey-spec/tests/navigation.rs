use survey_spec::builder::{
    choice_option, multiple_choice_item, page_break, required, single_choice_item,
    single_choice_slot, survey, text, text_item,
};
use survey_spec::{
    Expression, NavigationError, NavigationState, PageAddress, Survey, SurveyContext,
    SurveySession, Transition, ValidationKind, load_survey, parse_page_index,
};

/// Page 0: item A with options "0" and "1", "0" disabled once "1" is picked.
/// Page 1: item B, shown only when A is "1".
fn two_page_survey() -> Survey {
    let slot = single_choice_slot();
    let a = single_choice_item(
        "s.a",
        text("A"),
        vec![
            choice_option(
                "0",
                text("Zero"),
                Some(Expression::response_has_keys_any("s.a", &slot, &["1"])),
            ),
            choice_option("1", text("One"), None),
        ],
    );
    let b = text_item("s.b", "B")
        .with_condition(Expression::response_has_keys_any("s.a", &slot, &["1"]));
    survey("s", vec![a.into(), page_break("s.pb"), b.into()])
}

fn weekly() -> Survey {
    load_survey(include_str!("../tests/fixtures/weekly.json")).expect("weekly fixture loads")
}

#[test]
fn selecting_one_reveals_second_page() {
    let mut session = SurveySession::new(two_page_survey(), SurveyContext::default(), Vec::new());
    session
        .responses_mut()
        .select_keys("s.a", &single_choice_slot(), &["1"]);
    assert_eq!(session.page_count(), 2);

    let transition = session.advance(0).expect("advance");
    assert_eq!(
        transition,
        Transition::Moved {
            to: 1,
            reset_scroll: true
        }
    );
    assert_eq!(session.pages()[1].keys(), vec!["s.b"]);
}

#[test]
fn selecting_zero_skips_straight_to_submission() {
    let mut session = SurveySession::new(two_page_survey(), SurveyContext::default(), Vec::new());
    session
        .responses_mut()
        .select_keys("s.a", &single_choice_slot(), &["0"]);
    assert_eq!(session.page_count(), 1);

    match session.advance(0).expect("advance") {
        Transition::Submitted(answers) => {
            assert_eq!(answers.survey_id, "s");
            assert!(answers.response("s.a").is_some());
        }
        other => panic!("expected submission, got {:?}", other),
    }
}

#[test]
fn hard_rule_blocks_until_answered() {
    let c = multiple_choice_item(
        "s.c",
        text("C"),
        vec![choice_option("1", text("One"), None)],
    )
    .with_validation(required("s.c"));
    let definition = survey("s", vec![c.into(), page_break("s.pb"), text_item("s.d", "D").into()]);
    let mut session = SurveySession::new(definition, SurveyContext::default(), Vec::new());

    match session.advance(0).expect("advance") {
        Transition::Blocked(result) => {
            assert!(!result.valid);
            assert_eq!(result.errors.len(), 1);
            assert_eq!(result.errors[0].item_key, "s.c");
            assert_eq!(result.errors[0].rule_key, "r1");
            assert_eq!(result.errors[0].kind, ValidationKind::Hard);
        }
        other => panic!("expected block, got {:?}", other),
    }
    assert!(!session.is_submitted());

    session.responses_mut().select_keys("s.c", "rg.mcg", &["1"]);
    assert!(matches!(
        session.advance(0),
        Ok(Transition::Moved { to: 1, .. })
    ));
}

#[test]
fn back_is_never_gated() {
    let c = text_item("s.c", "C").with_validation(required("s.c"));
    let definition = survey("s", vec![text_item("s.a", "A").into(), page_break("s.pb"), c.into()]);
    let session = SurveySession::new(definition, SurveyContext::default(), Vec::new());
    assert!(matches!(session.back(1), Ok(Transition::Moved { to: 0, .. })));
    assert!(matches!(session.back(0), Ok(Transition::Moved { to: 0, .. })));
    assert_eq!(
        session.back(2),
        Err(NavigationError::OutOfRange { index: 2, count: 2 })
    );
}

#[test]
fn out_of_range_url_redirects_to_first_page() {
    let session = SurveySession::new(weekly(), SurveyContext::default(), Vec::new());
    let pages_path = "/surveys/weekly/pages";
    for url in ["/surveys/weekly/pages/-1", "/surveys/weekly/pages/2", "/surveys/weekly/pages/x"] {
        let address = parse_page_index(url, pages_path);
        assert_eq!(session.resolve(address), NavigationState::Redirecting, "{}", url);
    }
    assert_eq!(
        session.resolve(PageAddress::Index(1)),
        NavigationState::AtPage(1)
    );
    assert_eq!(
        session.resolve(parse_page_index("/surveys/weekly", pages_path)),
        NavigationState::AtPage(0)
    );
}

#[test]
fn submission_happens_once_and_keeps_hidden_responses() {
    let mut session = SurveySession::new(weekly(), SurveyContext::default(), Vec::new());
    let ctx = session.responses_mut();
    ctx.select_keys("weekly.q1", "rg.mcg", &["1"]);
    ctx.set_value("weekly.symptoms.q3", "rg.0", "1700000000");
    ctx.select_keys("weekly.symptoms.q4", "rg.scg", &["0"]);
    assert_eq!(session.page_count(), 4);

    // Recanting the symptoms hides the group; its answers stay recorded.
    session
        .responses_mut()
        .select_keys("weekly.q1", "rg.mcg", &["0"]);
    assert_eq!(session.page_count(), 2);
    assert!(matches!(session.advance(0), Ok(Transition::Moved { to: 1, .. })));

    let answers = match session.advance(1).expect("submit") {
        Transition::Submitted(answers) => answers,
        other => panic!("expected submission, got {:?}", other),
    };
    let keys: Vec<_> = answers.responses.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(
        keys,
        vec!["weekly.q1", "weekly.symptoms.q3", "weekly.symptoms.q4"]
    );

    assert_eq!(
        session.advance(1),
        Err(NavigationError::AlreadySubmitted("weekly".into()))
    );
    assert!(session.submit().is_err());
}

#[test]
fn prefills_are_submitted_with_unknown_keys_last() {
    let prefills = vec![
        survey_spec::ItemResponse {
            key: "weekly.legacy".into(),
            response: None,
        },
        survey_spec::ItemResponse {
            key: "weekly.q5".into(),
            response: Some(survey_spec::ResponseItem::with_items(
                "rg",
                vec![survey_spec::ResponseItem::with_value("1", "fine")],
            )),
        },
    ];
    let mut session = SurveySession::new(weekly(), SurveyContext::default(), prefills);
    let answers = session.submit().expect("submit");
    let keys: Vec<_> = answers.responses.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["weekly.q5", "weekly.legacy"]);
}

#[test]
fn soft_rules_do_not_block() {
    let mut session = SurveySession::new(weekly(), SurveyContext::default(), Vec::new());
    session
        .responses_mut()
        .select_keys("weekly.q1", "rg.mcg", &["0"]);
    let validation = session.validate_page(1).expect("page exists");
    assert!(validation.valid);
    assert_eq!(validation.warnings[0].rule_key, "w1");
    assert!(matches!(session.advance(1), Ok(Transition::Submitted(_))));
}

#[test]
fn empty_survey_submits_directly() {
    let definition = survey("s", vec![page_break("s.pb")]);
    let mut session = SurveySession::new(definition, SurveyContext::default(), Vec::new());
    assert_eq!(session.resolve(PageAddress::Unaddressed), NavigationState::Empty);
    assert!(matches!(session.advance(0), Ok(Transition::Submitted(_))));
}
