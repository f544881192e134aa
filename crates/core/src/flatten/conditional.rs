use crate::domain::{CaseContent, ConditionalCases, ResponseMessage};

const INDENT: &str = "  ";

/// Renders an if/elif/else tree as indented text, two spaces per level.
///
/// The first case opens with `if`, a later case without a condition is the
/// `else` branch, and every other case is an `elif`. Only the first variant of
/// a text message is shown; other message kinds inside a case are omitted.
/// Nested trees are rendered one level deeper and spliced in place.
pub fn render_conditional_cases(cases: &ConditionalCases, depth: usize) -> String {
    let indent = INDENT.repeat(depth);
    let content_indent = INDENT.repeat(depth + 1);
    let mut rendered = String::new();

    for (index, case) in cases.cases.iter().enumerate() {
        let header = match (index, case.condition.as_deref()) {
            (0, Some(condition)) => format!("if {condition}"),
            (0, None) => "if".to_string(),
            (_, Some(condition)) => format!("elif {condition}"),
            (_, None) => "else".to_string(),
        };
        rendered.push_str(&indent);
        rendered.push_str(&header);
        rendered.push('\n');

        for content in &case.case_content {
            match content {
                CaseContent::AdditionalCases(nested) => {
                    rendered.push_str(&render_conditional_cases(nested, depth + 1));
                }
                CaseContent::Message(ResponseMessage::Text(variants)) => {
                    if let Some(first) = variants.first() {
                        rendered.push_str(&content_indent);
                        rendered.push_str(first);
                        rendered.push('\n');
                    }
                }
                CaseContent::Message(_) => {}
            }
        }
    }
    rendered
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::render_conditional_cases;
    use crate::domain::ConditionalCases;

    fn cases(value: serde_json::Value) -> ConditionalCases {
        serde_json::from_value(value).expect("cases")
    }

    fn text(value: &str) -> serde_json::Value {
        json!({"message": {"text": {"text": [value]}}})
    }

    #[test]
    fn two_branches_render_in_order() {
        let rendered = render_conditional_cases(
            &cases(json!({"cases": [
                {"condition": "A", "caseContent": [text("Hi")]},
                {"caseContent": [text("Bye")]}
            ]})),
            0,
        );

        assert_eq!(rendered, "if A\n  Hi\nelse\n  Bye\n");
    }

    #[test]
    fn middle_cases_are_elif() {
        let rendered = render_conditional_cases(
            &cases(json!({"cases": [
                {"condition": "$session.params.tier = \"gold\"", "caseContent": [text("Gold")]},
                {"condition": "$session.params.tier = \"silver\"", "caseContent": [text("Silver")]},
                {"caseContent": [text("Standard")]}
            ]})),
            0,
        );

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            [
                "if $session.params.tier = \"gold\"",
                "  Gold",
                "elif $session.params.tier = \"silver\"",
                "  Silver",
                "else",
                "  Standard",
            ]
        );
    }

    #[test]
    fn first_case_without_condition_is_a_bare_if() {
        let rendered = render_conditional_cases(
            &cases(json!({"cases": [
                {"caseContent": [text("Always")]},
                {"condition": "B", "caseContent": [text("Also")]}
            ]})),
            0,
        );

        assert_eq!(rendered, "if\n  Always\nelif B\n  Also\n");
    }

    #[test]
    fn conditionless_case_in_the_middle_is_an_else_branch() {
        let rendered = render_conditional_cases(
            &cases(json!({"cases": [
                {"condition": "A", "caseContent": [text("One")]},
                {"caseContent": [text("Two")]},
                {"condition": "C", "caseContent": [text("Three")]}
            ]})),
            0,
        );

        let headers: Vec<&str> =
            rendered.lines().filter(|line| !line.starts_with(' ')).collect();
        assert_eq!(headers, ["if A", "else", "elif C"]);
    }

    #[test]
    fn nested_cases_are_kept_and_indented() {
        let rendered = render_conditional_cases(
            &cases(json!({"cases": [{
                "condition": "A",
                "caseContent": [
                    text("outer"),
                    {"additionalCases": {"cases": [
                        {"condition": "B", "caseContent": [text("inner")]},
                        {"caseContent": [text("fallback")]}
                    ]}}
                ]
            }]})),
            0,
        );

        assert_eq!(rendered, "if A\n  outer\n  if B\n    inner\n  else\n    fallback\n");
    }

    #[test]
    fn only_the_first_text_variant_is_used() {
        let rendered = render_conditional_cases(
            &cases(json!({"cases": [{
                "condition": "A",
                "caseContent": [
                    {"message": {"text": {"text": ["first", "second"]}}},
                    {"message": {"payload": {"ignored": true}}}
                ]
            }]})),
            1,
        );

        assert_eq!(rendered, "  if A\n    first\n");
    }
}
