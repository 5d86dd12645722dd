//! Reporting helpers shared by keyword validators.
use std::ops::{Add, AddAssign};

use serde_json::Value;

use crate::{
    error::{Keyword, ValidationError},
    paths::{LazyLocation, Location},
    validator::ValidationContext,
};

/// Records a violation of one keyword of one compiled object.
///
/// Built at compile time, so every report only copies the failing value and its location.
#[derive(Debug, Clone)]
pub(crate) struct ErrorHandler {
    location: Location,
    keyword: Keyword,
    expected: Value,
}

impl ErrorHandler {
    pub(crate) fn new(location: Location, keyword: Keyword, expected: Value) -> Self {
        ErrorHandler {
            location,
            keyword,
            expected,
        }
    }

    /// Record an error for `instance` and return `false`.
    #[inline]
    pub(crate) fn report(
        &self,
        ctx: &mut ValidationContext<'_>,
        instance: &Value,
        location: &LazyLocation<'_>,
    ) -> bool {
        self.report_with(ctx, instance, location, None, None)
    }

    /// Record an error about a single property or item of `instance` and return `false`.
    #[inline]
    pub(crate) fn report_key(
        &self,
        ctx: &mut ValidationContext<'_>,
        instance: &Value,
        location: &LazyLocation<'_>,
        key: impl Into<String>,
    ) -> bool {
        self.report_with(ctx, instance, location, Some(key.into()), None)
    }

    pub(crate) fn report_with(
        &self,
        ctx: &mut ValidationContext<'_>,
        instance: &Value,
        location: &LazyLocation<'_>,
        data_key: Option<String>,
        extra: Option<Value>,
    ) -> bool {
        let order = ctx.errors.len();
        ctx.errors.push(ValidationError {
            order,
            schema_location: self.location.clone(),
            keyword: self.keyword,
            expected: self.expected.clone(),
            data_key,
            instance_path: location.into(),
            instance: instance.clone(),
            extra,
        });
        false
    }
}

/// Outcome of the keywords that apply to a single property or item.
///
/// `matched` tells whether any keyword applied at all, which decides if `additionalProperties`
/// and friends get to see the key. Merging is associative and [`ValidationResult::default`] is
/// the identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ValidationResult {
    matched: bool,
    errors: usize,
}

impl ValidationResult {
    /// A keyword applied and the value was valid or not.
    #[inline]
    pub(crate) fn matched(valid: bool) -> Self {
        ValidationResult {
            matched: true,
            errors: usize::from(!valid),
        }
    }

    #[inline]
    pub(crate) fn add_match(&mut self, valid: bool) {
        *self += ValidationResult::matched(valid);
    }

    #[inline]
    pub(crate) fn is_matched(self) -> bool {
        self.matched
    }

    #[inline]
    pub(crate) fn is_valid(self) -> bool {
        self.errors == 0
    }
}

impl AddAssign for ValidationResult {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.matched |= rhs.matched;
        self.errors += rhs.errors;
    }
}

impl Add for ValidationResult {
    type Output = ValidationResult;

    #[inline]
    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn identity() {
        let value = ValidationResult::matched(false);
        assert_eq!(value + ValidationResult::default(), value);
        assert_eq!(ValidationResult::default() + value, value);
        assert!(!ValidationResult::default().is_matched());
        assert!(ValidationResult::default().is_valid());
    }

    #[test_case(true, true, false)]
    #[test_case(true, false, false)]
    #[test_case(false, false, true)]
    fn associativity(a: bool, b: bool, c: bool) {
        let (a, b, c) = (
            ValidationResult::matched(a),
            ValidationResult::matched(b),
            ValidationResult::default() + ValidationResult::matched(c),
        );
        assert_eq!((a + b) + c, a + (b + c));
    }

    #[test]
    fn accumulation() {
        let mut result = ValidationResult::default();
        result.add_match(true);
        assert!(result.is_matched());
        assert!(result.is_valid());
        result.add_match(false);
        assert!(!result.is_valid());
    }
}
