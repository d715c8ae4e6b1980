//! Layered substitution table.
//!
//! Each category has three layers: the shipped `builtin` rules, user `extra`
//! overrides loaded once before any snippet is processed, and the `unknown`
//! collector of values no rule could translate. Rule application merges the
//! first two layers, orders them (literals before regexes, longer literals
//! first). Content runs every rule once over the text; directives stop at the
//! first rule that matches. The collector only grows, except when a snippet id
//! is registered again and its earlier content findings are forgotten. It is
//! what the menu renderer and the diagnostics listing read.

use super::builtin::{self, LEFTOVER_DETECTORS};
use super::rule::{Edit, Pattern, Replacement, Rule};
use crate::directive::{Category, PerCategory};
use crate::error::TableError;
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use std::ops::Range;
use tracing::debug;

/// Body written for snippets that have no content to translate.
pub const UNIMPLEMENTED: &str = "(yas-unimplemented)";

/// Override replacements containing this marker are placeholders, not rules.
pub const UNKNOWN_MARKER: &str = "yas-unknown";

type RuleLayer = IndexMap<String, Rule>;

/// Result of running the merged rule set over a text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applied {
    pub text: String,
    /// True when at least one rule matched.
    pub matched: bool,
    /// Byte ranges of `text` inserted by literal and template replacements.
    pub produced: Vec<Range<usize>>,
}

/// Translated value of a single-line directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Translation {
    /// No source value and no override.
    Absent,
    /// Id-keyed override, used verbatim.
    Direct(String),
    Translated(String),
    /// No rule matched; carries the untranslated value.
    Unknown(String),
}

impl Translation {
    pub fn value(&self) -> Option<&str> {
        match self {
            Translation::Absent => None,
            Translation::Direct(value)
            | Translation::Translated(value)
            | Translation::Unknown(value) => Some(value),
        }
    }

    /// YASnippet header line for this directive; empty when nothing applies.
    ///
    /// Unknown values are kept but commented out with a second `#` so a human
    /// can fix them in place.
    pub fn directive_line(&self, category: Category) -> String {
        match self {
            Translation::Absent => String::new(),
            Translation::Direct(value) | Translation::Translated(value) if value.is_empty() => {
                String::new()
            }
            Translation::Direct(value) | Translation::Translated(value) => {
                format!("# {category}: {value}\n")
            }
            Translation::Unknown(value) => format!("## {category}: \"{value}\"\n"),
        }
    }
}

#[derive(Debug)]
pub struct SubstitutionTable {
    builtin: PerCategory<RuleLayer>,
    extra: PerCategory<RuleLayer>,
    unknown: PerCategory<IndexMap<String, String>>,
    unimplemented: IndexSet<String>,
    detectors: Vec<Regex>,
}

impl SubstitutionTable {
    /// Table loaded with the shipped rules.
    pub fn new() -> Result<Self, TableError> {
        let mut table = Self::empty()?;
        for category in Category::ALL {
            for rule in builtin::rules(category)? {
                table.add_builtin(category, rule);
            }
        }
        Ok(table)
    }

    /// Table with no rules at all; only the leftover detectors are installed.
    pub fn empty() -> Result<Self, TableError> {
        let detectors = LEFTOVER_DETECTORS
            .iter()
            .map(|source| {
                Regex::new(source).map_err(|err| TableError::InvalidPattern {
                    pattern: source.to_string(),
                    source: err,
                })
            })
            .collect::<Result<Vec<_>, TableError>>()?;
        Ok(Self {
            builtin: PerCategory::default(),
            extra: PerCategory::default(),
            unknown: PerCategory::default(),
            unimplemented: IndexSet::new(),
            detectors,
        })
    }

    pub fn add_builtin(&mut self, category: Category, rule: Rule) {
        self.builtin
            .get_mut(category)
            .insert(rule.pattern.key().to_string(), rule);
    }

    pub fn add_extra(&mut self, category: Category, rule: Rule) {
        self.extra
            .get_mut(category)
            .insert(rule.pattern.key().to_string(), rule);
    }

    /// Install a user override as a literal rule.
    ///
    /// Returns `Ok(false)` when the replacement is an unknown-marker
    /// placeholder, which is ignored rather than installed.
    pub fn install_override(
        &mut self,
        category: Category,
        pattern: &str,
        replacement: &str,
    ) -> Result<bool, TableError> {
        if replacement.contains(UNKNOWN_MARKER) {
            return Ok(false);
        }
        if pattern.is_empty() {
            return Err(TableError::EmptyPattern(category.to_string()));
        }
        debug!(%category, pattern, replacement, "installing substitution override");
        self.add_extra(
            category,
            Rule::new(
                Pattern::literal(pattern),
                Replacement::Literal(replacement.to_string()),
            ),
        );
        Ok(true)
    }

    /// Merged rules in application order.
    fn rules(&self, category: Category) -> Vec<&Rule> {
        let builtin = self.builtin.get(category);
        let extra = self.extra.get(category);
        let mut merged: Vec<&Rule> = builtin
            .iter()
            .map(|(key, rule)| extra.get(key).unwrap_or(rule))
            .chain(
                extra
                    .iter()
                    .filter(|(key, _)| !builtin.contains_key(*key))
                    .map(|(_, rule)| rule),
            )
            .collect();
        merged.sort_by_key(|rule| rule.pattern.precedence());
        merged
    }

    fn direct(&self, category: Category, owner: &str) -> Option<&Rule> {
        self.extra
            .get(category)
            .get(owner)
            .or_else(|| self.builtin.get(category).get(owner))
    }

    /// Run the merged rules over `text` without touching the collectors.
    pub fn apply(&self, category: Category, text: &str, owner: &str) -> Applied {
        let mut current = text.to_string();
        let mut matched = false;
        let mut produced = Vec::new();
        for rule in self.rules(category) {
            let outcome = rule.apply(&current, owner);
            if outcome.matched {
                matched = true;
                produced = shift_spans(&produced, &outcome.edits);
                produced.extend(
                    outcome
                        .edits
                        .iter()
                        .filter(|edit| edit.produced)
                        .map(|edit| edit.new.clone()),
                );
                current = outcome.text;
            }
        }
        Applied {
            text: current,
            matched,
            produced,
        }
    }

    /// Result of the first merged rule that matches `text`.
    fn apply_first(&self, category: Category, text: &str, owner: &str) -> Option<String> {
        self.rules(category)
            .into_iter()
            .map(|rule| rule.apply(text, owner))
            .find(|outcome| outcome.matched)
            .map(|outcome| outcome.text)
    }

    /// Translate a condition, binding or type value.
    ///
    /// Only the first matching rule applies, so one rule's output is never
    /// rewritten by another.
    pub fn translate_directive(
        &mut self,
        category: Category,
        raw: Option<&str>,
        owner: &str,
    ) -> Translation {
        if let Some(rule) = self.direct(category, owner) {
            return Translation::Direct(rule.replacement.direct_value(owner));
        }
        let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
            return Translation::Absent;
        };
        match self.apply_first(category, raw, owner) {
            Some(text) => Translation::Translated(text),
            None => {
                self.record_unknown(category, raw, owner);
                Translation::Unknown(raw.to_string())
            }
        }
    }

    /// Translate a snippet body, recording any placeholders left untranslated.
    pub fn translate_content(&mut self, raw: Option<&str>, owner: &str) -> String {
        if let Some(rule) = self.direct(Category::Content, owner) {
            return rule.replacement.direct_value(owner);
        }
        let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
            self.record_unknown(Category::Content, owner, owner);
            self.unimplemented.insert(owner.to_string());
            return UNIMPLEMENTED.to_string();
        };
        let applied = self.apply(Category::Content, raw, owner);
        let leftovers: Vec<String> = self
            .detectors
            .iter()
            .flat_map(|detector| detector.find_iter(&applied.text))
            .filter(|found| {
                !applied
                    .produced
                    .iter()
                    .any(|span| span.start <= found.start() && found.end() <= span.end)
            })
            .map(|found| found.as_str().to_string())
            .collect();
        for leftover in leftovers {
            self.record_unknown(Category::Content, &leftover, owner);
        }
        applied.text
    }

    pub fn record_unknown(&mut self, category: Category, value: &str, owner: &str) {
        self.unknown
            .get_mut(category)
            .insert(value.to_string(), owner.to_string());
    }

    /// Drop the content findings keyed by `id` itself: the unimplemented
    /// mark and its `unknown["content"]` entry.
    pub fn forget_content(&mut self, id: &str) {
        self.unimplemented.shift_remove(id);
        self.unknown.get_mut(Category::Content).shift_remove(id);
    }

    /// Untranslated values for a category, mapped to the id of the snippet that had them.
    pub fn unknown(&self, category: Category) -> &IndexMap<String, String> {
        self.unknown.get(category)
    }

    /// True when the snippet's content could not be translated at all.
    pub fn is_unimplemented(&self, id: &str) -> bool {
        self.unknown.get(Category::Content).contains_key(id)
    }

    /// Ids whose content was missing, in discovery order.
    pub fn unimplemented(&self) -> impl Iterator<Item = &str> {
        self.unimplemented.iter().map(String::as_str)
    }

    pub fn has_unknowns(&self) -> bool {
        Category::ALL
            .iter()
            .any(|category| !self.unknown.get(*category).is_empty())
    }
}

/// Carry produced spans across one rule's edits. Spans touched by an edit
/// were consumed by it and are dropped.
fn shift_spans(spans: &[Range<usize>], edits: &[Edit]) -> Vec<Range<usize>> {
    spans
        .iter()
        .filter_map(|span| {
            let mut grown = 0isize;
            for edit in edits {
                if edit.old.start < span.end && span.start < edit.old.end {
                    return None;
                }
                if edit.old.end <= span.start {
                    grown += edit.new.len() as isize - edit.old.len() as isize;
                }
            }
            let start = span.start.checked_add_signed(grown)?;
            let end = span.end.checked_add_signed(grown)?;
            Some(start..end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(pattern: &str, with: &str) -> Rule {
        Rule::new(Pattern::literal(pattern), Replacement::Literal(with.to_string()))
    }

    #[test]
    fn longer_literal_wins_over_its_prefix() {
        let mut table = SubstitutionTable::empty().unwrap();
        table.add_builtin(Category::Content, literal("ab", "X"));
        table.add_builtin(Category::Content, literal("abc", "Y"));
        let applied = table.apply(Category::Content, "abcabc", "id");
        assert_eq!(applied.text, "YY");
        assert!(applied.matched);
    }

    #[test]
    fn literal_runs_before_regex_at_the_same_position() {
        let mut table = SubstitutionTable::empty().unwrap();
        table.add_builtin(
            Category::Condition,
            Rule::new(Pattern::regex("fo+").unwrap(), Replacement::Literal("REGEX".into())),
        );
        table.add_builtin(Category::Condition, literal("foo", "bar"));
        let applied = table.apply(Category::Condition, "foo", "id");
        assert_eq!(applied.text, "bar");
    }

    #[test]
    fn extra_replaces_builtin_with_the_same_key() {
        let mut table = SubstitutionTable::empty().unwrap();
        table.add_builtin(Category::Binding, literal("^a", "C-a"));
        table.install_override(Category::Binding, "^a", "C-c a").unwrap();
        assert_eq!(table.apply(Category::Binding, "^a", "id").text, "C-c a");
    }

    #[test]
    fn unknown_marker_overrides_are_ignored() {
        let mut table = SubstitutionTable::empty().unwrap();
        let installed = table
            .install_override(Category::Condition, "text.html", "(yas-unknown)")
            .unwrap();
        assert!(!installed);
        assert!(!table.apply(Category::Condition, "text.html", "id").matched);
    }

    #[test]
    fn empty_override_pattern_is_structural() {
        let mut table = SubstitutionTable::empty().unwrap();
        let err = table.install_override(Category::Type, "", "command").unwrap_err();
        assert!(matches!(err, TableError::EmptyPattern(ref name) if name == "type"));
    }

    #[test]
    fn directive_stops_at_the_first_matching_rule() {
        let mut table = SubstitutionTable::empty().unwrap();
        table.install_override(Category::Binding, "^a", "C-a").unwrap();
        table.install_override(Category::Binding, "a", "M-x").unwrap();
        assert_eq!(
            table.translate_directive(Category::Binding, Some("^a"), "S1"),
            Translation::Translated("C-a".into())
        );
        assert_eq!(table.apply(Category::Binding, "^a", "S1").text, "C-M-x");
    }

    #[test]
    fn produced_spans_follow_later_edits() {
        let mut table = SubstitutionTable::empty().unwrap();
        table.add_builtin(Category::Content, literal("long", "`x`"));
        table.add_builtin(Category::Content, literal("s", "ss"));
        let applied = table.apply(Category::Content, "s long", "id");
        assert_eq!(applied.text, "ss `x`");
        assert_eq!(applied.produced.len(), 2);
        assert!(applied.produced.contains(&(3..6)));
        assert!(applied.produced.contains(&(0..2)));
    }

    #[test]
    fn leftover_in_raw_text_is_reported_even_if_a_rule_produced_the_same_text() {
        let mut table = SubstitutionTable::new().unwrap();
        let content = table.translate_content(Some("`yas-selected-text` ${TM_SELECTED_TEXT}"), "S1");
        assert_eq!(content, "`yas-selected-text` `yas-selected-text`");
        let unknown = table.unknown(Category::Content);
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown.get("`yas-selected-text`").map(String::as_str), Some("S1"));
    }

    #[test]
    fn forget_content_clears_the_unimplemented_mark() {
        let mut table = SubstitutionTable::new().unwrap();
        table.translate_content(None, "S1");
        assert!(table.is_unimplemented("S1"));
        table.forget_content("S1");
        assert!(!table.is_unimplemented("S1"));
        assert_eq!(table.unimplemented().count(), 0);
        assert!(!table.has_unknowns());
    }

    #[test]
    fn source_scopes_translate_to_no_condition() {
        let mut table = SubstitutionTable::new().unwrap();
        let translation =
            table.translate_directive(Category::Condition, Some("source.python"), "S1");
        assert_eq!(translation, Translation::Translated(String::new()));
        assert_eq!(translation.directive_line(Category::Condition), "");
        assert!(table.unknown(Category::Condition).is_empty());
    }

    #[test]
    fn unmatched_directive_is_flagged_and_collected() {
        let mut table = SubstitutionTable::new().unwrap();
        let translation = table.translate_directive(Category::Condition, Some("text.html"), "S1");
        assert_eq!(translation, Translation::Unknown("text.html".into()));
        assert_eq!(
            translation.directive_line(Category::Condition),
            "## condition: \"text.html\"\n"
        );
        assert_eq!(
            table.unknown(Category::Condition).get("text.html").map(String::as_str),
            Some("S1")
        );
    }

    #[test]
    fn recording_the_same_unknown_twice_keeps_one_key() {
        let mut table = SubstitutionTable::new().unwrap();
        table.translate_directive(Category::Binding, Some("@r"), "S1");
        table.translate_directive(Category::Binding, Some("@r"), "S2");
        let unknown = table.unknown(Category::Binding);
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown.get("@r").map(String::as_str), Some("S2"));
    }

    #[test]
    fn blank_directive_is_absent() {
        let mut table = SubstitutionTable::new().unwrap();
        assert_eq!(
            table.translate_directive(Category::Binding, Some("   "), "S1"),
            Translation::Absent
        );
        assert_eq!(
            table.translate_directive(Category::Type, None, "S1"),
            Translation::Absent
        );
        assert!(!table.has_unknowns());
    }

    #[test]
    fn id_keyed_directive_override_is_direct() {
        let mut table = SubstitutionTable::new().unwrap();
        table.install_override(Category::Type, "S1", "command").unwrap();
        let translation = table.translate_directive(Category::Type, None, "S1");
        assert_eq!(translation, Translation::Direct("command".into()));
        assert_eq!(translation.directive_line(Category::Type), "# type: command\n");
    }

    #[test]
    fn id_keyed_content_override_skips_rules() {
        let mut table = SubstitutionTable::new().unwrap();
        table
            .install_override(Category::Content, "S1", "keep $TM_SELECTED_TEXT")
            .unwrap();
        let content = table.translate_content(Some("${TM_SELECTED_TEXT}"), "S1");
        assert_eq!(content, "keep $TM_SELECTED_TEXT");
        assert!(table.unknown(Category::Content).is_empty());
    }

    #[test]
    fn selected_text_placeholders_translate() {
        let mut table = SubstitutionTable::new().unwrap();
        let content = table.translate_content(
            Some("${1:$TM_SELECTED_TEXT} ${TM_SELECTED_TEXT:none} ${2}"),
            "S1",
        );
        assert_eq!(
            content,
            "${1:`yas-selected-text`} `(or (yas-selected-text) \"none\")` $2"
        );
        assert!(table.unknown(Category::Content).is_empty());
    }

    #[test]
    fn leftover_placeholders_are_collected_but_kept() {
        let mut table = SubstitutionTable::new().unwrap();
        let raw = "${1/(.*)/\\u$1/} $TM_FILENAME `date`";
        let content = table.translate_content(Some(raw), "S1");
        assert_eq!(content, raw);
        let unknown = table.unknown(Category::Content);
        assert!(unknown.contains_key("${1/(.*)/\\u$1/}"));
        assert!(unknown.contains_key("$TM_FILENAME"));
        assert!(unknown.contains_key("`date`"));
        assert!(!table.is_unimplemented("S1"));
    }

    #[test]
    fn multi_line_backticks_become_an_unknown_marker() {
        let mut table = SubstitutionTable::new().unwrap();
        let content = table.translate_content(Some("x `first\nx` y"), "S9");
        assert_eq!(content, "x (yas-multi-line-unknown S9) y");
        assert!(
            table
                .unknown(Category::Content)
                .contains_key("(yas-multi-line-unknown S9)")
        );
    }

    #[test]
    fn missing_content_is_unimplemented() {
        let mut table = SubstitutionTable::new().unwrap();
        assert_eq!(table.translate_content(None, "S3"), UNIMPLEMENTED);
        assert_eq!(table.translate_content(Some(""), "S4"), UNIMPLEMENTED);
        assert!(table.is_unimplemented("S3"));
        assert!(table.is_unimplemented("S4"));
        assert_eq!(table.unimplemented().collect::<Vec<_>>(), vec!["S3", "S4"]);
    }
}
