use crate::common::Value;
use crate::errors::RepoResult;

use super::{
    ComparisonFilter, ComparisonMode, EqualsFilter, ExistsFilter, Filter, InFilter, NotEqualsFilter,
    NotInFilter, RegexFilter,
};

/// Starts a filter on a field. Dotted names address embedded documents.
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        Filter::new(EqualsFilter::new(self.field_name, value.into()))
    }

    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> Filter {
        Filter::new(NotEqualsFilter::new(self.field_name, value.into()))
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::Greater)
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::GreaterEqual)
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::Lesser)
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::LesserEqual)
    }

    pub fn in_array<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        Filter::new(InFilter::new(
            self.field_name,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn not_in<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        Filter::new(NotInFilter::new(
            self.field_name,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn exists(self, exists: bool) -> Filter {
        Filter::new(ExistsFilter::new(self.field_name, exists))
    }

    /// Matches string values against a regular expression.
    ///
    /// Fails with `InvalidQuery` if the pattern does not compile.
    pub fn regex(self, pattern: &str) -> RepoResult<Filter> {
        Ok(Filter::new(RegexFilter::new(self.field_name, pattern)?))
    }

    fn compare(self, value: Value, mode: ComparisonMode) -> Filter {
        Filter::new(ComparisonFilter::new(self.field_name, value, mode))
    }
}
