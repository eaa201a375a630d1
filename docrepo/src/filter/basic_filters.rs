use std::any::Any;
use std::cmp::Ordering;
use std::fmt::Display;

use regex::Regex;

use crate::common::{compare_values, values_equal, Document, Value};
use crate::errors::RepoResult;

use super::FilterProvider;

// The value at a path plus, for arrays, each of its elements. Query operators match when
// any candidate satisfies them.
fn candidates<'a>(entry: &'a Document, field_name: &str) -> Vec<&'a Value> {
    match entry.get(field_name) {
        Some(value @ Value::Array(items)) => {
            let mut all = Vec::with_capacity(items.len() + 1);
            all.push(value);
            all.extend(items.iter());
            all
        }
        Some(value) => vec![value],
        None => vec![],
    }
}

fn matches_equal(entry: &Document, field_name: &str, target: &Value) -> bool {
    let values = candidates(entry, field_name);
    if values.is_empty() {
        return target.is_null();
    }
    values.iter().any(|value| values_equal(value, target))
}

pub(crate) struct AllFilter;

impl FilterProvider for AllFilter {
    fn apply(&self, _entry: &Document) -> RepoResult<bool> {
        Ok(true)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Display for AllFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AllFilter")
    }
}

/// Field equality. A null target also matches a missing field.
pub struct EqualsFilter {
    field_name: String,
    field_value: Value,
}

impl EqualsFilter {
    #[inline]
    pub(crate) fn new(field_name: String, field_value: Value) -> Self {
        EqualsFilter { field_name, field_value }
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn field_value(&self) -> &Value {
        &self.field_value
    }
}

impl Display for EqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} == {})", self.field_name, self.field_value)
    }
}

impl FilterProvider for EqualsFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> RepoResult<bool> {
        Ok(matches_equal(entry, &self.field_name, &self.field_value))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct NotEqualsFilter {
    field_name: String,
    field_value: Value,
}

impl NotEqualsFilter {
    #[inline]
    pub(crate) fn new(field_name: String, field_value: Value) -> Self {
        NotEqualsFilter { field_name, field_value }
    }
}

impl Display for NotEqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} != {})", self.field_name, self.field_value)
    }
}

impl FilterProvider for NotEqualsFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> RepoResult<bool> {
        Ok(!matches_equal(entry, &self.field_name, &self.field_value))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComparisonMode {
    Greater,
    GreaterEqual,
    Lesser,
    LesserEqual,
}

impl ComparisonMode {
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonMode::Greater => ordering == Ordering::Greater,
            ComparisonMode::GreaterEqual => ordering != Ordering::Less,
            ComparisonMode::Lesser => ordering == Ordering::Less,
            ComparisonMode::LesserEqual => ordering != Ordering::Greater,
        }
    }
}

impl Display for ComparisonMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparisonMode::Greater => write!(f, ">"),
            ComparisonMode::GreaterEqual => write!(f, ">="),
            ComparisonMode::Lesser => write!(f, "<"),
            ComparisonMode::LesserEqual => write!(f, "<="),
        }
    }
}

/// Range comparison. Only values of the same type bracket as the target can match.
pub struct ComparisonFilter {
    field_name: String,
    field_value: Value,
    mode: ComparisonMode,
}

impl ComparisonFilter {
    #[inline]
    pub(crate) fn new(field_name: String, field_value: Value, mode: ComparisonMode) -> Self {
        ComparisonFilter { field_name, field_value, mode }
    }

    pub fn mode(&self) -> ComparisonMode {
        self.mode
    }
}

impl Display for ComparisonFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} {} {})", self.field_name, self.mode, self.field_value)
    }
}

impl FilterProvider for ComparisonFilter {
    fn apply(&self, entry: &Document) -> RepoResult<bool> {
        Ok(candidates(entry, &self.field_name).iter().any(|value| {
            compare_values(value, &self.field_value)
                .map(|ordering| self.mode.accepts(ordering))
                .unwrap_or(false)
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct InFilter {
    field_name: String,
    field_values: Vec<Value>,
}

impl InFilter {
    pub(crate) fn new(field_name: String, field_values: Vec<Value>) -> Self {
        InFilter { field_name, field_values }
    }
}

impl Display for InFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} in {})", self.field_name, Value::Array(self.field_values.clone()))
    }
}

impl FilterProvider for InFilter {
    fn apply(&self, entry: &Document) -> RepoResult<bool> {
        Ok(self
            .field_values
            .iter()
            .any(|target| matches_equal(entry, &self.field_name, target)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct NotInFilter {
    field_name: String,
    field_values: Vec<Value>,
}

impl NotInFilter {
    pub(crate) fn new(field_name: String, field_values: Vec<Value>) -> Self {
        NotInFilter { field_name, field_values }
    }
}

impl Display for NotInFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} not in {})", self.field_name, Value::Array(self.field_values.clone()))
    }
}

impl FilterProvider for NotInFilter {
    fn apply(&self, entry: &Document) -> RepoResult<bool> {
        Ok(!self
            .field_values
            .iter()
            .any(|target| matches_equal(entry, &self.field_name, target)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct ExistsFilter {
    field_name: String,
    exists: bool,
}

impl ExistsFilter {
    pub(crate) fn new(field_name: String, exists: bool) -> Self {
        ExistsFilter { field_name, exists }
    }
}

impl Display for ExistsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.exists {
            write!(f, "({} exists)", self.field_name)
        } else {
            write!(f, "({} not exists)", self.field_name)
        }
    }
}

impl FilterProvider for ExistsFilter {
    fn apply(&self, entry: &Document) -> RepoResult<bool> {
        Ok(entry.contains_key(&self.field_name) == self.exists)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct RegexFilter {
    field_name: String,
    pattern: Regex,
}

impl RegexFilter {
    pub(crate) fn new(field_name: String, pattern: &str) -> RepoResult<Self> {
        let pattern = Regex::new(pattern).map_err(|err| {
            log::error!("Invalid regex {} for field {}", pattern, field_name);
            err
        })?;
        Ok(RegexFilter { field_name, pattern })
    }
}

impl Display for RegexFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} =~ /{}/)", self.field_name, self.pattern.as_str())
    }
}

impl FilterProvider for RegexFilter {
    fn apply(&self, entry: &Document) -> RepoResult<bool> {
        Ok(candidates(entry, &self.field_name)
            .iter()
            .any(|value| value.as_str().is_some_and(|s| self.pattern.is_match(s))))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
