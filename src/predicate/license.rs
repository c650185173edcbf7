//! License-expression helpers

use super::types::LicenseInputSpec;

const OPERATORS: [&str; 3] = ["AND", "OR", "WITH"];

/// Extract the license identifiers named by an expression.
///
/// Operators and grouping parentheses are dropped; identifiers keep their
/// first-seen order and appear once.
pub fn parse_licenses(expression: &str, list_version: Option<&str>) -> Vec<LicenseInputSpec> {
    let mut licenses: Vec<LicenseInputSpec> = Vec::new();
    let tokens = expression
        .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .filter(|t| !t.is_empty())
        .filter(|t| !OPERATORS.iter().any(|op| t.eq_ignore_ascii_case(op)));

    for token in tokens {
        if licenses.iter().any(|l| l.name == token) {
            continue;
        }
        let mut license = LicenseInputSpec::new(token);
        license.list_version = list_version.map(str::to_string);
        licenses.push(license);
    }
    licenses
}

/// Join several expressions with `AND`, as plain text.
pub fn combine_licenses(expressions: &[String]) -> String {
    expressions.join(" AND ")
}
