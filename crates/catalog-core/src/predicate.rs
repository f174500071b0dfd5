use crate::model::Product;
use crate::registry::FieldType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Comparison operators accepted in segment rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Lt,
        Operator::Ge,
        Operator::Le,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
        }
    }

    /// Whether `actual.cmp(operand) == ord` satisfies this operator.
    pub fn accepts(&self, ord: Ordering) -> bool {
        match self {
            Operator::Eq => ord == Ordering::Equal,
            Operator::Ne => ord != Ordering::Equal,
            Operator::Gt => ord == Ordering::Greater,
            Operator::Lt => ord == Ordering::Less,
            Operator::Ge => ord != Ordering::Less,
            Operator::Le => ord != Ordering::Greater,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.symbol() == s)
            .ok_or(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TypedValue {
    Number(f64),
    String(String),
    Date(DateTime<Utc>),
    Boolean(bool),
}

impl TypedValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            TypedValue::Number(_) => FieldType::Number,
            TypedValue::String(_) => FieldType::String,
            TypedValue::Date(_) => FieldType::Date,
            TypedValue::Boolean(_) => FieldType::Boolean,
        }
    }

    /// Ordering between values of the same type; `None` across types.
    pub fn compare(&self, other: &TypedValue) -> Option<Ordering> {
        match (self, other) {
            (TypedValue::Number(a), TypedValue::Number(b)) => a.partial_cmp(b),
            (TypedValue::String(a), TypedValue::String(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            (TypedValue::Date(a), TypedValue::Date(b)) => Some(a.cmp(b)),
            (TypedValue::Boolean(a), TypedValue::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub op: Operator,
    pub value: TypedValue,
}

impl Comparison {
    pub fn new(op: Operator, value: TypedValue) -> Self {
        Self { op, value }
    }

    /// Absent or differently-typed values only satisfy `!=`.
    pub fn test(&self, actual: Option<&TypedValue>) -> bool {
        match actual.and_then(|a| a.compare(&self.value)) {
            Some(ord) => self.op.accepts(ord),
            None => self.op == Operator::Ne,
        }
    }
}

/// Conjunction of per-field comparisons. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompiledPredicate(BTreeMap<String, Comparison>);

impl CompiledPredicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the constraint for `field`, replacing any earlier one.
    pub fn insert(&mut self, field: impl Into<String>, cmp: Comparison) -> Option<Comparison> {
        self.0.insert(field.into(), cmp)
    }

    pub fn get(&self, field: &str) -> Option<&Comparison> {
        self.0.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Comparison)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.0
            .iter()
            .all(|(field, cmp)| cmp.test(product.field_value(field).as_ref()))
    }
}
