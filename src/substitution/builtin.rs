//! The shipped TextMate/Sublime → YASnippet substitution rules.

use super::rule::{Pattern, Replacement, Rule};
use crate::directive::Category;
use crate::error::TableError;

/// Marker inserted for backtick expressions that span lines; the leftover
/// scan picks it up again so the snippet is listed as needing attention.
pub const MULTI_LINE_UNKNOWN: &str = "yas-multi-line-unknown";

const SELECTED_TEXT: &str = "`yas-selected-text`";

fn multi_line_unknown(owner: &str, _matched: &str) -> String {
    format!("({MULTI_LINE_UNKNOWN} {owner})")
}

fn literal(pattern: &str, with: &str) -> Rule {
    Rule::new(Pattern::literal(pattern), Replacement::Literal(with.to_string()))
}

/// Builtin rules for one category, in declaration order.
pub fn rules(category: Category) -> Result<Vec<Rule>, TableError> {
    let rules = match category {
        Category::Content => vec![
            literal("${TM_RAILS_TEMPLATE_START_RUBY_EXPR}", "<%= "),
            literal("${TM_RAILS_TEMPLATE_END_RUBY_EXPR}", " %>"),
            literal("${TM_RAILS_TEMPLATE_START_RUBY_INLINE}", "<% "),
            literal("${TM_RAILS_TEMPLATE_END_RUBY_INLINE}", " -%>"),
            literal("${TM_RAILS_TEMPLATE_END_RUBY_BLOCK}", "end"),
            literal("${0:$TM_SELECTED_TEXT}", "${0:`yas-selected-text`}"),
            literal("${1:$TM_SELECTED_TEXT}", "${1:`yas-selected-text`}"),
            literal("${2:$TM_SELECTED_TEXT}", "${2:`yas-selected-text`}"),
            literal("${TM_SELECTED_TEXT}", SELECTED_TEXT),
            literal("$TM_SELECTED_TEXT", SELECTED_TEXT),
            Rule::new(
                Pattern::regex(r"\$\{(\d+)\}")?,
                Replacement::Template("$$${1}".to_string()),
            ),
            Rule::new(
                Pattern::regex(r"\$\{TM_SELECTED_TEXT:([^}]*)\}")?,
                Replacement::Template("`(or (yas-selected-text) \"${1}\")`".to_string()),
            ),
            Rule::new(
                Pattern::regex("`[^`]+\n[^`]`")?,
                Replacement::Compute(multi_line_unknown),
            ),
        ],
        Category::Condition => vec![Rule::new(
            Pattern::regex(r"^source\..*$")?,
            Replacement::Literal(String::new()),
        )],
        Category::Binding | Category::Type => Vec::new(),
    };
    Ok(rules)
}

/// Detectors for placeholders the rules could not translate.
pub(crate) const LEFTOVER_DETECTORS: [&str; 5] = [
    // ${var/regex/format/options} transformations
    r"\$\{[^/}{:]*/[^/]*/[^/]*/[^}]*\}",
    r"\$\{[^\d][^}]+\}",
    "`[^`]+`",
    r"\$TM_[\w_]+",
    r"\(yas-multi-line-unknown [^)]*\)",
];
