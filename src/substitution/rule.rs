//! Substitution rules: a pattern plus what to put in its place.

use crate::error::TableError;
use regex::{Captures, Regex};
use std::cmp::Reverse;
use std::ops::Range;

/// Transform used by computed replacements: `(owner_id, matched_text) -> replacement`.
pub type ComputeFn = fn(&str, &str) -> String;

#[derive(Clone, Debug)]
pub enum Pattern {
    Literal(String),
    Regex(Regex),
}

impl Pattern {
    pub fn literal(text: impl Into<String>) -> Self {
        Pattern::Literal(text.into())
    }

    pub fn regex(source: &str) -> Result<Self, TableError> {
        Regex::new(source)
            .map(Pattern::Regex)
            .map_err(|source_err| TableError::InvalidPattern {
                pattern: source.to_string(),
                source: source_err,
            })
    }

    /// Key used when merging layers; an override replaces the rule with the same key.
    pub fn key(&self) -> &str {
        match self {
            Pattern::Literal(text) => text,
            Pattern::Regex(regex) => regex.as_str(),
        }
    }

    /// Sort key: literals first, longest literal first, regexes last in
    /// declaration order (the sort is stable).
    pub(crate) fn precedence(&self) -> (u8, Reverse<usize>) {
        match self {
            Pattern::Literal(text) => (0, Reverse(text.len())),
            Pattern::Regex(_) => (1, Reverse(0)),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Replacement {
    /// Inserted verbatim.
    Literal(String),
    /// Capture references (`$1`, `${1}`) are expanded; `$$` is a dollar sign.
    Template(String),
    /// Computed from the owning snippet id and the matched text.
    Compute(ComputeFn),
}

impl Replacement {
    /// Text used when the rule is an id-keyed direct override.
    pub fn direct_value(&self, owner: &str) -> String {
        match self {
            Replacement::Literal(text) | Replacement::Template(text) => text.clone(),
            Replacement::Compute(compute) => compute(owner, owner),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Rule {
    pub pattern: Pattern,
    pub replacement: Replacement,
}

/// One replaced match: where it was in the input and where its replacement
/// sits in the output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Edit {
    pub old: Range<usize>,
    pub new: Range<usize>,
    /// True for literal and template replacements; computed text is not counted.
    pub produced: bool,
}

/// Outcome of applying one rule to a piece of text.
pub(crate) struct RuleOutcome {
    pub text: String,
    pub matched: bool,
    /// Replaced matches in input order.
    pub edits: Vec<Edit>,
}

/// Output under construction while the matches of one rule are spliced in.
struct Splice<'t> {
    input: &'t str,
    out: String,
    last: usize,
    edits: Vec<Edit>,
}

impl<'t> Splice<'t> {
    fn new(input: &'t str) -> Self {
        Self {
            input,
            out: String::with_capacity(input.len()),
            last: 0,
            edits: Vec::new(),
        }
    }

    fn replace(&mut self, old: Range<usize>, with: &str, produced: bool) {
        self.out.push_str(&self.input[self.last..old.start]);
        let start = self.out.len();
        self.out.push_str(with);
        self.last = old.end;
        self.edits.push(Edit {
            old,
            new: start..self.out.len(),
            produced,
        });
    }

    fn finish(mut self) -> RuleOutcome {
        self.out.push_str(&self.input[self.last..]);
        RuleOutcome {
            text: self.out,
            matched: !self.edits.is_empty(),
            edits: self.edits,
        }
    }
}

impl Rule {
    pub fn new(pattern: Pattern, replacement: Replacement) -> Self {
        Self {
            pattern,
            replacement,
        }
    }

    /// Replace every non-overlapping match of the pattern once.
    pub(crate) fn apply(&self, text: &str, owner: &str) -> RuleOutcome {
        let mut splice = Splice::new(text);
        match &self.pattern {
            Pattern::Literal(needle) if needle.is_empty() => {}
            Pattern::Literal(needle) => {
                for (start, found) in text.match_indices(needle.as_str()) {
                    let (with, produced) = self.replacement_for(owner, found, None);
                    splice.replace(start..start + found.len(), &with, produced);
                }
            }
            Pattern::Regex(regex) => {
                for caps in regex.captures_iter(text) {
                    let Some(whole) = caps.get(0) else {
                        continue;
                    };
                    let (with, produced) = self.replacement_for(owner, whole.as_str(), Some(&caps));
                    splice.replace(whole.range(), &with, produced);
                }
            }
        }
        splice.finish()
    }

    fn replacement_for(
        &self,
        owner: &str,
        matched: &str,
        caps: Option<&Captures<'_>>,
    ) -> (String, bool) {
        match &self.replacement {
            Replacement::Literal(with) => (with.clone(), true),
            Replacement::Template(template) => match caps {
                Some(caps) => {
                    let mut expanded = String::new();
                    caps.expand(template, &mut expanded);
                    (expanded, true)
                }
                None => (template.clone(), true),
            },
            Replacement::Compute(compute) => (compute(owner, matched), false),
        }
    }
}
