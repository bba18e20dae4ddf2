//! Filter expressions and their evaluation against records.
//!
//! Registries only need equality and membership predicates: post-load
//! resolution matches on loaded attribute values and instance fields look up
//! records by one key.

use crate::record::Record;
use crate::value::Value;

/// A predicate on one record field.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// Field equals value.
    Eq {
        /// Public field name.
        field: String,
        /// Value to compare against.
        value: Value,
    },
    /// Field equals one of the values.
    In {
        /// Public field name.
        field: String,
        /// Candidate values.
        values: Vec<Value>,
    },
    /// Field is null or absent.
    IsNull {
        /// Public field name.
        field: String,
    },
}

impl FilterExpr {
    /// Build an equality predicate.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Build a membership predicate.
    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        FilterExpr::In {
            field: field.into(),
            values,
        }
    }

    /// Build a null check.
    pub fn is_null(field: impl Into<String>) -> Self {
        FilterExpr::IsNull {
            field: field.into(),
        }
    }

    /// Field the predicate applies to.
    pub fn field(&self) -> &str {
        match self {
            FilterExpr::Eq { field, .. }
            | FilterExpr::In { field, .. }
            | FilterExpr::IsNull { field } => field,
        }
    }
}

/// Evaluates filter expressions against records.
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Whether the record satisfies every filter.
    pub fn matches_all(filters: &[FilterExpr], record: &Record) -> bool {
        filters.iter().all(|f| Self::evaluate(f, record))
    }

    /// Evaluate one filter against a record.
    pub fn evaluate(filter: &FilterExpr, record: &Record) -> bool {
        match filter {
            FilterExpr::Eq { field, value } => match record.get(field) {
                Some(fv) => Self::values_equal(fv, value),
                None => false, // Missing field doesn't match
            },
            FilterExpr::In { field, values } => match record.get(field) {
                Some(fv) => values.iter().any(|v| Self::values_equal(fv, v)),
                None => false,
            },
            FilterExpr::IsNull { field } => {
                matches!(record.get(field), None | Some(Value::Null))
            }
        }
    }

    /// Check if two values are equal.
    ///
    /// Integers and floats compare numerically. A related record compares
    /// equal to another record of the same model with equal values.
    pub fn values_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Int(a), Value::Float(b)) => (*a as f64) == *b,
            (Value::Float(a), Value::Int(b)) => *a == (*b as f64),
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Self::values_equal(x, y))
            }
            _ => a == b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city() -> Record {
        Record::new("Model.City")
            .with("id", 1)
            .with("name", "Rouen")
            .with("zipcode", None::<String>)
    }

    #[test]
    fn test_eq_filter() {
        let row = city();

        assert!(FilterEvaluator::evaluate(&FilterExpr::eq("name", "Rouen"), &row));
        assert!(!FilterEvaluator::evaluate(&FilterExpr::eq("name", "Caen"), &row));
        assert!(FilterEvaluator::evaluate(&FilterExpr::eq("id", 1.0), &row));
        assert!(!FilterEvaluator::evaluate(&FilterExpr::eq("missing", 1), &row));
    }

    #[test]
    fn test_in_filter() {
        let row = city();
        let filter = FilterExpr::is_in("id", vec![Value::Int(3), Value::Int(1)]);
        assert!(FilterEvaluator::evaluate(&filter, &row));

        let filter = FilterExpr::is_in("id", vec![Value::Int(3)]);
        assert!(!FilterEvaluator::evaluate(&filter, &row));
    }

    #[test]
    fn test_is_null_filter() {
        let row = city();
        assert!(FilterEvaluator::evaluate(&FilterExpr::is_null("zipcode"), &row));
        assert!(FilterEvaluator::evaluate(&FilterExpr::is_null("absent"), &row));
        assert!(!FilterEvaluator::evaluate(&FilterExpr::is_null("name"), &row));
    }

    #[test]
    fn test_matches_all() {
        let row = city();
        let filters = vec![FilterExpr::eq("id", 1), FilterExpr::eq("name", "Rouen")];
        assert!(FilterEvaluator::matches_all(&filters, &row));

        let filters = vec![FilterExpr::eq("id", 1), FilterExpr::eq("name", "Caen")];
        assert!(!FilterEvaluator::matches_all(&filters, &row));
        assert!(FilterEvaluator::matches_all(&[], &row));
    }
}
