//! Model search filters.
//!
//! Numeric attributes are constrained with a small range language: a sequence
//! of `<op><value>;` clauses where `op` is one of `<`, `>` or `=`. Clauses are
//! conjoined, so `">100;<200;"` means `100 < v < 200`. An empty filter places
//! no constraint. `language_version` uses the same grammar over dotted
//! version numbers, e.g. `">3.5.0;<3.7;"`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{WelesError, WelesResult};
use crate::request::Metadata;

/// Comparison operator of one range clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Lt,
    Gt,
    Eq,
}

impl Op {
    fn symbol(&self) -> char {
        match self {
            Op::Lt => '<',
            Op::Gt => '>',
            Op::Eq => '=',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause<T> {
    pub op: Op,
    pub value: T,
}

/// A conjunction of range clauses over values of type `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter<T> {
    clauses: Vec<Clause<T>>,
}

impl<T> Default for RangeFilter<T> {
    fn default() -> Self {
        Self {
            clauses: Vec::new(),
        }
    }
}

impl<T> RangeFilter<T> {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn clauses(&self) -> &[Clause<T>] {
        &self.clauses
    }

    pub fn is_unconstrained(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn less_than(mut self, value: T) -> Self {
        self.clauses.push(Clause { op: Op::Lt, value });
        self
    }

    pub fn greater_than(mut self, value: T) -> Self {
        self.clauses.push(Clause { op: Op::Gt, value });
        self
    }

    pub fn equal_to(mut self, value: T) -> Self {
        self.clauses.push(Clause { op: Op::Eq, value });
        self
    }
}

impl<T: PartialOrd> RangeFilter<T> {
    /// Whether `candidate` satisfies every clause.
    pub fn matches(&self, candidate: &T) -> bool {
        self.clauses.iter().all(|clause| {
            match candidate.partial_cmp(&clause.value) {
                Some(Ordering::Less) => clause.op == Op::Lt,
                Some(Ordering::Greater) => clause.op == Op::Gt,
                Some(Ordering::Equal) => clause.op == Op::Eq,
                None => false,
            }
        })
    }
}

impl<T: fmt::Display> RangeFilter<T> {
    /// Wire form, e.g. `">100;<200;"`. Empty for an unconstrained filter.
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl<T: fmt::Display> fmt::Display for RangeFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for clause in &self.clauses {
            write!(f, "{}{};", clause.op.symbol(), clause.value)?;
        }
        Ok(())
    }
}

impl<T> FromStr for RangeFilter<T>
where
    T: FromStr,
{
    type Err = WelesError;

    fn from_str(s: &str) -> WelesResult<Self> {
        let mut clauses = Vec::new();
        for raw in s.split(';') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let mut chars = raw.chars();
            let op = match chars.next() {
                Some('<') => Op::Lt,
                Some('>') => Op::Gt,
                Some('=') => Op::Eq,
                _ => {
                    return Err(WelesError::invalid(format!(
                        "range clause '{}' must start with one of '<', '>', '='",
                        raw
                    )))
                }
            };
            let operand = chars.as_str().trim();
            let value = operand.parse::<T>().map_err(|_| {
                WelesError::invalid(format!("range clause '{}' has an invalid value", raw))
            })?;
            clauses.push(Clause { op, value });
        }
        Ok(Self { clauses })
    }
}

/// A dotted version number. Missing trailing components compare as zero, so
/// `3.7` equals `3.7.0`.
#[derive(Debug, Clone, Eq)]
pub struct Version {
    parts: Vec<u64>,
}

impl Version {
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }
}

impl FromStr for Version {
    type Err = WelesError;

    fn from_str(s: &str) -> WelesResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(WelesError::invalid("version must not be empty"));
        }
        let parts = s
            .split('.')
            .map(|p| {
                p.parse::<u64>()
                    .map_err(|_| WelesError::invalid(format!("invalid version '{}'", s)))
            })
            .collect::<WelesResult<Vec<_>>>()?;
        Ok(Self { parts })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.parts.iter().map(u64::to_string).collect();
        write!(f, "{}", joined.join("."))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

/// How the `tags` filter combines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMatch {
    /// A model matches when it shares at least one tag.
    #[default]
    Any,
    /// A model matches only when it carries every tag.
    All,
}

impl TagMatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagMatch::Any => "any",
            TagMatch::All => "all",
        }
    }
}

impl FromStr for TagMatch {
    type Err = WelesError;

    fn from_str(s: &str) -> WelesResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(TagMatch::Any),
            "all" => Ok(TagMatch::All),
            other => Err(WelesError::invalid(format!(
                "tag mode must be 'any' or 'all', got '{}'",
                other
            ))),
        }
    }
}

/// Filters for a model search. Absent and unconstrained filters are omitted
/// from the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub language: Option<String>,
    pub language_version: RangeFilter<Version>,
    pub row: RangeFilter<f64>,
    pub column: RangeFilter<f64>,
    pub missing: RangeFilter<f64>,
    pub classes: RangeFilter<f64>,
    pub owner: Option<String>,
    pub tags: Vec<String>,
    /// Overrides the client's default tag mode when set.
    pub tags_mode: Option<TagMatch>,
    /// Regular expression matched against model names.
    pub regex: Option<String>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = Some(regex.into());
        self
    }

    /// Form fields for `GET models/search`. `default_tags_mode` applies when
    /// tags are given without an explicit mode.
    pub fn to_metadata(&self, default_tags_mode: TagMatch) -> Metadata {
        let mut meta = Metadata::new();
        meta.insert_opt("language", self.language.clone());
        meta.insert_opt("language_version", non_empty(&self.language_version));
        meta.insert_opt("row", non_empty(&self.row));
        meta.insert_opt("column", non_empty(&self.column));
        meta.insert_opt("missing", non_empty(&self.missing));
        meta.insert_opt("classes", non_empty(&self.classes));
        meta.insert_opt("owner", self.owner.clone());
        if !self.tags.is_empty() {
            meta.insert("tags", self.tags.clone());
            meta.insert(
                "tags_mode",
                self.tags_mode.unwrap_or(default_tags_mode).as_str(),
            );
        }
        meta.insert_opt("regex", self.regex.clone());
        meta
    }
}

fn non_empty<T: fmt::Display>(filter: &RangeFilter<T>) -> Option<String> {
    if filter.is_unconstrained() {
        None
    } else {
        Some(filter.to_wire())
    }
}
