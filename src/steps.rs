//! Codec for the `Microsoft.VSTS.TCM.Steps` work item field.
//!
//! Azure DevOps stores test case steps as an XML document inside a plain
//! string field. Ordered action/expected pairs are encoded into that document,
//! and stored documents are parsed back leniently so that hand-edited or
//! foreign-tool output never aborts an operation.

use scraper::{Html, Selector};

use crate::models::TestStep;

/// Escape the characters that are significant inside the steps XML document.
///
/// `&` must be replaced first so already-escaped output is not double-escaped.
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Encode ordered test steps into the steps XML document.
///
/// Steps are numbered 1..N and the root element records the count in its
/// `last` attribute. An empty slice produces the canonical empty document
/// `<steps id="0" last="0"></steps>`, which Azure DevOps treats as
/// "no steps defined".
pub fn build_steps_xml(steps: &[TestStep]) -> String {
    let mut xml = format!("<steps id=\"0\" last=\"{}\">", steps.len());
    for (index, step) in steps.iter().enumerate() {
        xml.push_str(&format!(
            "<step id=\"{}\" type=\"ActionStep\">\
             <parameterizedString isformatted=\"true\">{}</parameterizedString>\
             <description isformatted=\"true\">{}</description>\
             </step>",
            index + 1,
            escape_xml(&step.action),
            escape_xml(&step.expected),
        ));
    }
    xml.push_str("</steps>");
    xml
}

/// Decode a steps XML document back into ordered action/expected pairs.
///
/// Parsing is lenient by contract: malformed markup, missing elements and
/// empty input all yield an empty or partial sequence rather than an error.
/// Both encodings seen in the wild are accepted for the expected result, the
/// `description` element and a second `parameterizedString` element.
pub fn parse_steps_xml(xml: &str) -> Vec<TestStep> {
    if xml.trim().is_empty() {
        return Vec::new();
    }

    // The fragment parser lowercases element names, so selectors must too.
    let Ok(step_selector) = Selector::parse("step") else {
        return Vec::new();
    };
    let Ok(text_selector) = Selector::parse("parameterizedstring") else {
        return Vec::new();
    };
    let Ok(description_selector) = Selector::parse("description") else {
        return Vec::new();
    };

    let document = Html::parse_fragment(xml);
    let mut steps = Vec::new();

    for step in document.select(&step_selector) {
        let mut strings = step.select(&text_selector);
        let action = strings
            .next()
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default();

        let expected = step
            .select(&description_selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .filter(|text| !text.is_empty())
            .or_else(|| strings.next().map(|el| el.text().collect::<String>()))
            .unwrap_or_default();

        steps.push(TestStep { action, expected });
    }

    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(action: &str, expected: &str) -> TestStep {
        TestStep {
            action: action.to_string(),
            expected: expected.to_string(),
        }
    }

    /// # Empty Steps Encoding
    ///
    /// Tests encoding of an empty step list.
    ///
    /// ## Test Scenario
    /// - Encodes an empty slice of steps
    ///
    /// ## Expected Outcome
    /// - Produces the canonical empty document with last="0"
    #[test]
    fn test_build_empty_steps() {
        assert_eq!(build_steps_xml(&[]), "<steps id=\"0\" last=\"0\"></steps>");
    }

    /// # Two-Step Document Encoding
    ///
    /// Tests the exact document produced for a two-step test case.
    ///
    /// ## Test Scenario
    /// - Encodes two action/expected pairs
    ///
    /// ## Expected Outcome
    /// - Steps are numbered 1 and 2, last="2", and each step carries the
    ///   action in parameterizedString and the expected result in description
    #[test]
    fn test_build_two_steps() {
        let xml = build_steps_xml(&[
            step("Open the login page", "Login form is shown"),
            step("Submit valid credentials", "Dashboard is shown"),
        ]);
        assert_eq!(
            xml,
            "<steps id=\"0\" last=\"2\">\
             <step id=\"1\" type=\"ActionStep\">\
             <parameterizedString isformatted=\"true\">Open the login page</parameterizedString>\
             <description isformatted=\"true\">Login form is shown</description>\
             </step>\
             <step id=\"2\" type=\"ActionStep\">\
             <parameterizedString isformatted=\"true\">Submit valid credentials</parameterizedString>\
             <description isformatted=\"true\">Dashboard is shown</description>\
             </step>\
             </steps>"
        );
    }

    /// # XML Escaping
    ///
    /// Tests escaping of markup-significant characters in step text.
    ///
    /// ## Test Scenario
    /// - Encodes a step whose action contains &, <, > and quote characters
    ///
    /// ## Expected Outcome
    /// - The document contains entity references instead of raw characters
    /// - Parsing the document back restores the original text
    #[test]
    fn test_escaping_round_trip() {
        let original = vec![step("Click \"Save & Close\" when x < 10", "y > 5")];
        let xml = build_steps_xml(&original);

        assert!(xml.contains("&quot;Save &amp; Close&quot;"));
        assert!(xml.contains("x &lt; 10"));
        assert!(xml.contains("y &gt; 5"));
        assert!(!xml.contains("Save & Close"));

        assert_eq!(parse_steps_xml(&xml), original);
    }

    /// # Round Trip Preservation
    ///
    /// Tests that encode followed by decode preserves content and order.
    ///
    /// ## Test Scenario
    /// - Round-trips zero, one and five steps through the codec
    ///
    /// ## Expected Outcome
    /// - The decoded sequence equals the input for every size
    #[test]
    fn test_round_trip_sizes() {
        for count in [0usize, 1, 5] {
            let original: Vec<TestStep> = (0..count)
                .map(|i| step(&format!("action {i}"), &format!("expected {i}")))
                .collect();
            let decoded = parse_steps_xml(&build_steps_xml(&original));
            assert_eq!(decoded, original, "round trip failed for {count} steps");
        }
    }

    /// # Step Numbering
    ///
    /// Tests id assignment and the last attribute for a larger document.
    ///
    /// ## Test Scenario
    /// - Encodes four steps
    ///
    /// ## Expected Outcome
    /// - Ids run 1 through 4 and the root records last="4"
    #[test]
    fn test_step_numbering() {
        let steps: Vec<TestStep> = (0..4).map(|i| step(&format!("a{i}"), "e")).collect();
        let xml = build_steps_xml(&steps);

        assert!(xml.starts_with("<steps id=\"0\" last=\"4\">"));
        for id in 1..=4 {
            assert!(xml.contains(&format!("<step id=\"{id}\" type=\"ActionStep\">")));
        }
        assert!(!xml.contains("<step id=\"0\""));
        assert!(!xml.contains("<step id=\"5\""));
    }

    /// # Malformed Input Tolerance
    ///
    /// Tests that broken or foreign documents never produce an error.
    ///
    /// ## Test Scenario
    /// - Parses empty input, plain text, truncated markup and unrelated XML
    ///
    /// ## Expected Outcome
    /// - Every input decodes to an empty sequence without panicking
    #[test]
    fn test_malformed_input() {
        assert_eq!(parse_steps_xml(""), Vec::new());
        assert_eq!(parse_steps_xml("   "), Vec::new());
        assert_eq!(parse_steps_xml("not xml at all"), Vec::new());
        assert_eq!(parse_steps_xml("<steps id=\"0\" last=\"1\"><step id=\"1\""), Vec::new());
        assert_eq!(parse_steps_xml("<html><body>hello</body></html>"), Vec::new());
    }

    /// # Alternate Expected Result Encoding
    ///
    /// Tests decoding of documents that carry the expected result in a
    /// second parameterizedString element instead of description.
    ///
    /// ## Test Scenario
    /// - Parses a document in the two-parameterizedString shape produced by
    ///   the Azure DevOps web editor
    ///
    /// ## Expected Outcome
    /// - Both action and expected are recovered
    #[test]
    fn test_parse_alternate_encoding() {
        let xml = "<steps id=\"0\" last=\"1\">\
                   <step id=\"2\" type=\"ValidateStep\">\
                   <parameterizedString isformatted=\"true\">do it</parameterizedString>\
                   <parameterizedString isformatted=\"true\">it happened</parameterizedString>\
                   <description/>\
                   </step></steps>";
        assert_eq!(parse_steps_xml(xml), vec![step("do it", "it happened")]);
    }

    /// # Partial Step Tolerance
    ///
    /// Tests decoding of steps that are missing the expected result.
    ///
    /// ## Test Scenario
    /// - Parses a step with only an action element
    ///
    /// ## Expected Outcome
    /// - The action is recovered and the expected result defaults to empty
    #[test]
    fn test_parse_missing_expected() {
        let xml = "<steps id=\"0\" last=\"1\">\
                   <step id=\"1\" type=\"ActionStep\">\
                   <parameterizedString isformatted=\"true\">only action</parameterizedString>\
                   </step></steps>";
        assert_eq!(parse_steps_xml(xml), vec![step("only action", "")]);
    }
}
