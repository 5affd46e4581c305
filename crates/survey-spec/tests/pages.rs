use survey_spec::{ResponseContext, Survey, SurveyContext, load_survey, survey_pages};

fn fixture(name: &str) -> &'static str {
    match name {
        "weekly" => include_str!("../tests/fixtures/weekly.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn weekly() -> Survey {
    load_survey(fixture("weekly")).expect("weekly fixture loads")
}

fn flagged_context() -> SurveyContext {
    let mut context = SurveyContext::default();
    context.participant_flags.insert("prev".into(), "1".into());
    context
}

fn page_keys(survey: &Survey, ctx: &ResponseContext) -> Vec<Vec<String>> {
    survey_pages(survey, ctx)
        .iter()
        .map(|page| page.keys().into_iter().map(String::from).collect())
        .collect()
}

#[test]
fn hidden_pages_are_dropped_and_later_pages_shift_down() {
    let survey = weekly();
    let ctx = ResponseContext::new(SurveyContext::default());
    assert_eq!(
        page_keys(&survey, &ctx),
        vec![vec!["weekly.q1".to_string()], vec!["weekly.q5".to_string()]]
    );
}

#[test]
fn visible_group_contributes_its_own_page_breaks() {
    let survey = weekly();
    let mut ctx = ResponseContext::new(SurveyContext::default());
    ctx.select_keys("weekly.q1", "rg.mcg", &["1", "2"]);
    assert_eq!(
        page_keys(&survey, &ctx),
        vec![
            vec!["weekly.q1".to_string()],
            vec!["weekly.symptoms.q3".to_string()],
            vec!["weekly.symptoms.q4".to_string()],
            vec!["weekly.q5".to_string()],
        ]
    );
}

#[test]
fn participant_flags_from_context_reveal_follow_up() {
    let survey = weekly();
    let mut ctx = ResponseContext::new(flagged_context());
    ctx.select_keys("weekly.q1", "rg.mcg", &["0"]);
    assert_eq!(
        page_keys(&survey, &ctx),
        vec![
            vec!["weekly.q1".to_string()],
            vec!["weekly.q2".to_string()],
            vec!["weekly.q5".to_string()],
        ]
    );

    ctx.select_keys("weekly.q1", "rg.mcg", &["2"]);
    let pages = survey_pages(&survey, &ctx);
    assert_eq!(pages[1].keys(), vec!["weekly.q2", "weekly.symptoms.q3"]);
    assert_eq!(pages.iter().map(|page| page.index).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
}

#[test]
fn partitioning_is_idempotent() {
    let survey = weekly();
    let mut ctx = ResponseContext::new(flagged_context());
    ctx.select_keys("weekly.q1", "rg.mcg", &["1"]);
    let first = survey_pages(&survey, &ctx);
    let second = survey_pages(&survey, &ctx);
    assert_eq!(first, second);
}

#[test]
fn hidden_root_yields_no_pages() {
    let mut survey = weekly();
    survey.root.condition = Some(survey_spec::Expression::has_response("weekly.q0", "rg"));
    let ctx = ResponseContext::new(SurveyContext::default());
    assert!(survey_pages(&survey, &ctx).is_empty());
}
