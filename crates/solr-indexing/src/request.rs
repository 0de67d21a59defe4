//! Update request bodies.
//!
//! - add: `<add><doc><field name="..">..</field>...</doc></add>`
//! - delete: `<delete><id>..</id></delete>`
//! - commit/optimize: `<commit waitFlush=".." waitSearcher=".."/>`

use quick_xml::escape::{escape, partial_escape};

use crate::prepare::PreparedData;

/// Flags sent with commit and optimize directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOptions {
    pub wait_flush: bool,
    pub wait_searcher: bool,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            wait_flush: true,
            wait_searcher: true,
        }
    }
}

/// Body of an add request for one document.
pub fn add_request(data: &PreparedData) -> String {
    let mut body = String::from("<add><doc>");
    for (name, values) in data.iter() {
        let name = escape(name);
        for value in values {
            body.push_str("<field name=\"");
            body.push_str(&name);
            body.push_str("\">");
            body.push_str(&escape_value(value));
            body.push_str("</field>");
        }
    }
    body.push_str("</doc></add>");
    body
}

/// Body of a delete-by-id request.
pub fn delete_request(id: &str) -> String {
    format!("<delete><id>{}</id></delete>", escape_value(id))
}

pub fn commit_request(options: CommitOptions) -> String {
    directive("commit", options)
}

pub fn optimize_request(options: CommitOptions) -> String {
    directive("optimize", options)
}

fn directive(tag: &str, options: CommitOptions) -> String {
    format!(
        "<{} waitFlush=\"{}\" waitSearcher=\"{}\"/>",
        tag, options.wait_flush, options.wait_searcher
    )
}

/// Strip control characters XML 1.0 cannot carry, then escape `&`, `<`, `>`.
pub fn escape_value(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|&c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();
    partial_escape(&cleaned).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn data(fields: &[(&str, Vec<&str>)]) -> PreparedData {
        let mut data = PreparedData::new();
        for (name, values) in fields.iter().rev() {
            data.prepend(*name, values.iter().map(|v| v.to_string()).collect());
        }
        data
    }

    #[test]
    fn test_add_request() {
        let body = add_request(&data(&[("id", vec!["500"]), ("name", vec!["python test doc"])]));
        assert_eq!(
            body,
            "<add><doc><field name=\"id\">500</field><field name=\"name\">python test doc</field></doc></add>"
        );
    }

    #[test]
    fn test_add_request_repeats_multi_valued_fields() {
        let body = add_request(&data(&[("id", vec!["1"]), ("cat", vec!["a", "b"])]));
        assert_eq!(
            body,
            "<add><doc><field name=\"id\">1</field><field name=\"cat\">a</field><field name=\"cat\">b</field></doc></add>"
        );
    }

    #[test]
    fn test_values_are_escaped() {
        let body = add_request(&data(&[("title", vec!["Fish & <Chips>"])]));
        assert!(body.contains("<field name=\"title\">Fish &amp; &lt;Chips&gt;</field>"));

        let body = add_request(&data(&[("we\"ird", vec!["x"])]));
        assert!(body.contains("<field name=\"we&quot;ird\">x</field>"));
    }

    #[test]
    fn test_control_characters_are_stripped() {
        assert_eq!(escape_value("a\u{0}b\u{7}c\td\ne"), "abc\td\ne");
    }

    #[test]
    fn test_delete_request() {
        assert_eq!(delete_request("500"), "<delete><id>500</id></delete>");
        assert_eq!(delete_request("a&b"), "<delete><id>a&amp;b</id></delete>");
    }

    #[test]
    fn test_commit_and_optimize() {
        assert_eq!(
            commit_request(CommitOptions::default()),
            "<commit waitFlush=\"true\" waitSearcher=\"true\"/>"
        );
        let no_wait = CommitOptions {
            wait_flush: false,
            wait_searcher: false,
        };
        assert_eq!(
            optimize_request(no_wait),
            "<optimize waitFlush=\"false\" waitSearcher=\"false\"/>"
        );
    }
}
