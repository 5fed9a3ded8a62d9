use std::collections::HashMap;

use super::*;

fn values<'a>(pairs: &[(&'a str, &'a str)]) -> HashMap<&'a str, &'a str> {
    pairs.iter().copied().collect()
}

#[test]
fn test_parse_collects_placeholders() {
    let template = PromptTemplate::parse("Q {q_id}: {answer_text} / {answer_text} {_x1}");

    let names: Vec<&str> = template.placeholders().keys().map(String::as_str).collect();
    assert_eq!(names, vec!["_x1", "answer_text", "q_id"]);
    assert_eq!(template.requirement("q_id"), Some(Requirement::Optional));
    assert_eq!(template.requirement("missing"), None);
}

#[test]
fn test_render_substitutes_every_occurrence() {
    let template = PromptTemplate::parse("{a}-{b}-{a}");

    let out = template.render(&values(&[("a", "1"), ("b", "2")])).unwrap();

    assert_eq!(out, "1-2-1");
}

#[test]
fn test_unfilled_optional_stays_literal() {
    let template = PromptTemplate::parse("Answer: {answer_text}\nWeight: {weight}");

    let out = template
        .render(&values(&[("answer_text", "We comply."), ("unused", "x")]))
        .unwrap();

    assert_eq!(out, "Answer: We comply.\nWeight: {weight}");
}

#[test]
fn test_missing_required_is_error() {
    let template = PromptTemplate::parse("Score {answer_text}")
        .require("answer_text")
        .unwrap();

    assert_eq!(
        template.render(&HashMap::new()),
        Err(TemplateError::MissingRequired {
            name: "answer_text".to_string()
        })
    );
}

#[test]
fn test_require_unknown_placeholder() {
    let err = PromptTemplate::parse("no placeholders").require("x").unwrap_err();
    assert_eq!(
        err,
        TemplateError::UnknownPlaceholder {
            name: "x".to_string()
        }
    );
}

#[test]
fn test_non_identifier_braces_are_literal() {
    let source = r#"Return JSON like {"score": 3} for {q_id}. Set {} and { spaced } and {1x}."#;

    let out = render_template(source, &values(&[("q_id", "Q2")]));

    assert_eq!(
        out,
        r#"Return JSON like {"score": 3} for Q2. Set {} and { spaced } and {1x}."#
    );
}

#[test]
fn test_unclosed_brace_and_doubled_braces() {
    assert_eq!(render_template("tail {open", &HashMap::new()), "tail {open");
    assert_eq!(
        render_template("{{q_id}}", &values(&[("q_id", "Q1")])),
        "{Q1}"
    );
}
