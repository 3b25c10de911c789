use crate::hcl::expr::Expression;
use crate::hcl::template::{Element, StringTemplate};

/// Sentinel meaning "ignore everything at this level and below".
pub const IGNORE_ALL: &str = "*all*";

/// Extracts the ignore list from an `ignore_changes` expression. Constant
/// folding is attempted first; expressions that do not fold to a constant
/// collection (bare identifiers, interpolations) go through a structural
/// walk instead. An expression neither path understands yields nothing,
/// which drops the directive rather than erroring.
pub fn extract_ignore_entries(expr: &Expression) -> Vec<String> {
    evaluate_constant_list(expr).unwrap_or_else(|| collect_entries_from_ast(expr))
}

/// Folds a tuple/list of string literals. The literal `"all"` short-circuits
/// the whole list to the wildcard. Returns `None` when the expression is not
/// a constant collection or the collection is empty.
fn evaluate_constant_list(expr: &Expression) -> Option<Vec<String>> {
    let Expression::Array(elements) = expr else {
        return None;
    };

    let mut entries = Vec::new();
    for element in elements.iter() {
        let value = constant_string(element)?;
        if value == "all" {
            return Some(vec![IGNORE_ALL.to_string()]);
        }
        entries.push(value);
    }

    if entries.is_empty() {
        None
    } else {
        Some(entries)
    }
}

fn constant_string(expr: &Expression) -> Option<String> {
    match expr {
        Expression::String(literal) => Some(literal.value().to_string()),
        Expression::StringTemplate(template) => single_literal(template),
        _ => None,
    }
}

/// Structural fallback: arrays recurse per element, bare identifiers and
/// identifier-rooted traversals contribute their root name, string literals
/// contribute their content. A literal `"all"` anywhere collapses the whole
/// result to the wildcard.
fn collect_entries_from_ast(expr: &Expression) -> Vec<String> {
    let mut entries = Vec::new();
    collect_into(expr, &mut entries);
    if entries.iter().any(|entry| entry == IGNORE_ALL) {
        return vec![IGNORE_ALL.to_string()];
    }
    entries
}

fn collect_into(expr: &Expression, entries: &mut Vec<String>) {
    match expr {
        Expression::Array(elements) => {
            for element in elements.iter() {
                collect_into(element, entries);
            }
        }
        Expression::Variable(name) => entries.push(name.as_str().to_string()),
        Expression::Traversal(traversal) => {
            if let Expression::Variable(root) = &traversal.expr {
                entries.push(root.as_str().to_string());
            }
        }
        Expression::String(literal) => entries.push(literal_entry(literal.value())),
        Expression::StringTemplate(template) => {
            if let Some(content) = single_literal(template) {
                entries.push(literal_entry(&content));
            }
        }
        Expression::Parenthesis(parens) => collect_into(parens.inner(), entries),
        _ => {}
    }
}

fn literal_entry(value: &str) -> String {
    if value == "all" {
        IGNORE_ALL.to_string()
    } else {
        value.to_string()
    }
}

fn single_literal(template: &StringTemplate) -> Option<String> {
    let mut elements = template.iter();
    match (elements.next(), elements.next()) {
        (Some(Element::Literal(literal)), None) => Some(literal.value().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hcl::structure::Body;

    fn ignore_changes_expr(source: &str) -> Expression {
        let body: Body = crate::hcl::parser::parse_body(source).expect("fixture should parse");
        body.get_attribute("ignore_changes").expect("attribute present").value.clone()
    }

    #[test]
    fn folds_constant_string_list() {
        let expr = ignore_changes_expr("ignore_changes = [\"tags\", \"location\"]\n");
        assert_eq!(extract_ignore_entries(&expr), vec!["tags", "location"]);
    }

    #[test]
    fn literal_all_short_circuits_to_wildcard() {
        let expr = ignore_changes_expr("ignore_changes = [\"tags\", \"all\", \"location\"]\n");
        assert_eq!(extract_ignore_entries(&expr), vec![IGNORE_ALL]);
    }

    #[test]
    fn bare_identifiers_fall_back_to_ast_walk() {
        let expr = ignore_changes_expr("ignore_changes = [tags, \"location\"]\n");
        assert_eq!(extract_ignore_entries(&expr), vec!["tags", "location"]);
    }

    #[test]
    fn traversal_contributes_its_root_name() {
        let expr = ignore_changes_expr("ignore_changes = [tags.environment]\n");
        assert_eq!(extract_ignore_entries(&expr), vec!["tags"]);
    }

    #[test]
    fn literal_all_collapses_in_fallback_too() {
        let expr = ignore_changes_expr("ignore_changes = [tags, \"all\"]\n");
        assert_eq!(extract_ignore_entries(&expr), vec![IGNORE_ALL]);
    }

    #[test]
    fn empty_list_yields_nothing() {
        let expr = ignore_changes_expr("ignore_changes = []\n");
        assert!(extract_ignore_entries(&expr).is_empty());
    }

    #[test]
    fn unsupported_expression_is_dropped_not_an_error() {
        let expr = ignore_changes_expr("ignore_changes = var.ignored[0]\n");
        // index traversal still roots at `var`
        assert_eq!(extract_ignore_entries(&expr), vec!["var"]);

        let expr = ignore_changes_expr("ignore_changes = { not = \"a list\" }\n");
        assert!(extract_ignore_entries(&expr).is_empty());
    }
}
