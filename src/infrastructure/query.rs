//! Live query model: compound filters, ordering and a limit.

use crate::infrastructure::documents::{Document, lookup};
use serde_json::{Map, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    /// Matches documents where the field exists and differs from the value.
    NotEq(String, Value),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(path.into(), value.into())
    }

    pub fn not_eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::NotEq(path.into(), value.into())
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        match self {
            Filter::Eq(path, expected) => lookup(fields, path) == Some(expected),
            Filter::NotEq(path, expected) => {
                lookup(fields, path).is_some_and(|actual| actual != expected)
            }
            Filter::And(filters) => filters.iter().all(|filter| filter.matches(fields)),
            Filter::Or(filters) => filters.iter().any(|filter| filter.matches(fields)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filter: Option<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: None,
            order_by: None,
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Evaluates the query over every document of its collection.
    ///
    /// Documents without the ordering field are left out, and ties on the ordering field are
    /// broken by document id in the same direction, so the result is fully deterministic.
    pub fn apply(&self, mut documents: Vec<Document>) -> Vec<Document> {
        if let Some(filter) = &self.filter {
            documents.retain(|document| filter.matches(&document.fields));
        }

        match &self.order_by {
            Some(order) => {
                documents.retain(|document| document.get(&order.field).is_some());
                documents.sort_by(|a, b| {
                    let ordering = match (a.get(&order.field), b.get(&order.field)) {
                        (Some(left), Some(right)) => compare_values(left, right),
                        _ => Ordering::Equal,
                    }
                    .then_with(|| a.id.cmp(&b.id));

                    match order.direction {
                        Direction::Ascending => ordering,
                        Direction::Descending => ordering.reverse(),
                    }
                });
            }
            None => documents.sort_by(|a, b| a.id.cmp(&b.id)),
        }

        if let Some(limit) = self.limit {
            documents.truncate(limit);
        }

        documents
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: null < bool < number < string < array < object.
pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => {
                let a = a.as_f64().unwrap_or(f64::NAN);
                let b = b.as_f64().unwrap_or(f64::NAN);
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
        },
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}
