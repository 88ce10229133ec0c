//! Python language definition

use tree_sitter::Node;

use super::LanguageDef;

static DEFINITION: LanguageDef = LanguageDef {
    name: "python",
    grammar: || tree_sitter_python::LANGUAGE.into(),
    extensions: &["py"],
    // `async def` is a function_definition with a leading `async` token
    function_kinds: &["function_definition"],
    decorated_kind: Some("decorated_definition"),
    call_kind: "call",
    attribute_kind: "attribute",
    identifier_kind: "identifier",
    expression_statement_kind: "expression_statement",
    parenthesized_kind: Some("parenthesized_expression"),
    string_kinds: &["string", "format_specifier"],
    concatenated_string_kind: Some("concatenated_string"),
    interpolation_kind: Some("interpolation"),
    integer_kinds: &["integer"],
    float_kinds: &["float"],
    boolean_kinds: &[("true", true), ("false", false)],
    ignored_kinds: &["comment", "line_continuation"],
    separator_tokens: &[",", ";"],
    diagnostic_calls: &["print", "logger", "logging"],
    // Python 2 statements the grammar still parses
    rejected_kinds: &["print_statement", "exec_statement"],
    validate,
};

pub fn definition() -> &'static LanguageDef {
    &DEFINITION
}

fn validate(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "parameters" | "lambda_parameters" => misordered_parameter(node),
        "argument_list" => misordered_argument(node),
        _ => None,
    }
}

/// A parameter without default after one with a default, before any
/// `*`, `*args` or `**kwargs`
fn misordered_parameter(params: Node<'_>) -> Option<Node<'_>> {
    let mut seen_default = false;
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        match param.kind() {
            "default_parameter" | "typed_default_parameter" => seen_default = true,
            "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => {
                return None
            }
            "typed_parameter" => {
                let is_splat = param.named_child(0).is_some_and(|c| {
                    matches!(c.kind(), "list_splat_pattern" | "dictionary_splat_pattern")
                });
                if is_splat {
                    return None;
                }
                if seen_default {
                    return Some(param);
                }
            }
            "identifier" if seen_default => return Some(param),
            _ => {}
        }
    }
    None
}

/// A positional argument after a keyword argument or `**mapping`, or
/// `*iterable` after `**mapping`
fn misordered_argument(args: Node<'_>) -> Option<Node<'_>> {
    let mut seen_keyword = false;
    let mut seen_mapping = false;
    let mut cursor = args.walk();
    for arg in args.named_children(&mut cursor) {
        match arg.kind() {
            "keyword_argument" => seen_keyword = true,
            "dictionary_splat" => seen_mapping = true,
            "list_splat" if seen_mapping => return Some(arg),
            "list_splat" | "comment" => {}
            _ if seen_keyword || seen_mapping => return Some(arg),
            _ => {}
        }
    }
    None
}
