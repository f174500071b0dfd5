use crate::errors::{CatalogError, Result};
use crate::predicate::{Comparison, Operator, TypedValue};
use crate::registry::{FieldRegistry, FieldType};
use crate::upstream::resolve_local_time;
use chrono::{DateTime, Local, NaiveDate, Utc};

/// A rule split into its three tokens, not yet validated.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTokens<'a> {
    pub text: &'a str,
    pub field: &'a str,
    pub operator: &'a str,
    pub value: &'a str,
}

impl<'a> RuleTokens<'a> {
    pub fn split(text: &'a str) -> Result<Self> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        match tokens.as_slice() {
            &[field, operator, value] => Ok(Self {
                text,
                field,
                operator,
                value,
            }),
            _ => Err(CatalogError::MalformedRule {
                rule: text.to_string(),
                tokens: tokens.len(),
            }),
        }
    }
}

/// A rule checked against a registry: known field, known operator, typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub field: String,
    pub comparison: Comparison,
}

impl Rule {
    pub fn parse(text: &str, registry: &FieldRegistry) -> Result<Self> {
        let tokens = RuleTokens::split(text)?;
        let field_type =
            registry
                .field_type(tokens.field)
                .ok_or_else(|| CatalogError::UnknownField {
                    field: tokens.field.to_string(),
                    rule: text.to_string(),
                })?;
        let op = tokens
            .operator
            .parse::<Operator>()
            .map_err(|_| CatalogError::UnknownOperator {
                operator: tokens.operator.to_string(),
                rule: text.to_string(),
            })?;
        let value = coerce_value(tokens.field, field_type, tokens.value)?;
        Ok(Self {
            field: tokens.field.to_string(),
            comparison: Comparison::new(op, value),
        })
    }
}

pub fn coerce_value(field: &str, ty: FieldType, raw: &str) -> Result<TypedValue> {
    match ty {
        FieldType::Number => parse_number(raw)
            .map(TypedValue::Number)
            .ok_or_else(|| CatalogError::InvalidNumber {
                value: raw.to_string(),
                field: field.to_string(),
            }),
        FieldType::Date => parse_day_month_year(raw)
            .map(TypedValue::Date)
            .ok_or_else(|| CatalogError::InvalidDate {
                value: raw.to_string(),
                field: field.to_string(),
            }),
        FieldType::Boolean => match raw {
            "true" => Ok(TypedValue::Boolean(true)),
            "false" => Ok(TypedValue::Boolean(false)),
            _ => Err(CatalogError::InvalidBoolean {
                value: raw.to_string(),
                field: field.to_string(),
            }),
        },
        FieldType::String => Ok(TypedValue::String(raw.to_string())),
    }
}

// Whole token must be a finite decimal; "100abc", "NaN" and "inf" are rejected.
fn parse_number(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// `DD-MM-YYYY` at local midnight, as a UTC instant.
pub fn parse_day_month_year(raw: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = raw.split('-').collect();
    let &[day, month, year] = parts.as_slice() else {
        return None;
    };
    let digits = |s: &str, min: usize, max: usize| {
        (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits(day, 1, 2) || !digits(month, 1, 2) || !digits(year, 4, 4) {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?;
    resolve_local_time(&Local, date.and_hms_opt(0, 0, 0)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_requires_three_tokens() {
        let t = RuleTokens::split("  price\t>=   100 ").unwrap();
        assert_eq!((t.field, t.operator, t.value), ("price", ">=", "100"));
        assert_eq!(
            RuleTokens::split("price >").unwrap_err(),
            CatalogError::MalformedRule {
                rule: "price >".into(),
                tokens: 2
            }
        );
        assert!(matches!(
            RuleTokens::split("category = Home Office"),
            Err(CatalogError::MalformedRule { tokens: 4, .. })
        ));
        assert!(matches!(
            RuleTokens::split(""),
            Err(CatalogError::MalformedRule { tokens: 0, .. })
        ));
    }

    #[test]
    fn numbers_are_parsed_strictly() {
        assert_eq!(parse_number("100"), Some(100.0));
        assert_eq!(parse_number("-2.5"), Some(-2.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("100abc"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn dates_need_three_numeric_parts() {
        assert!(parse_day_month_year("1-2-2024").is_some());
        assert!(parse_day_month_year("29-02-2024").is_some());
        assert!(parse_day_month_year("29-02-2023").is_none());
        assert!(parse_day_month_year("2023-01-01").is_none());
        assert!(parse_day_month_year("01-01").is_none());
        assert!(parse_day_month_year("01-01-2023-05").is_none());
        assert!(parse_day_month_year("aa-01-2023").is_none());
    }

    #[test]
    fn strings_are_verbatim() {
        assert_eq!(
            coerce_value("category", FieldType::String, "Electronics").unwrap(),
            TypedValue::String("Electronics".into())
        );
    }

    #[test]
    fn booleans_are_case_sensitive() {
        assert!(coerce_value("on_sale", FieldType::Boolean, "True").is_err());
        assert_eq!(
            coerce_value("on_sale", FieldType::Boolean, "false").unwrap(),
            TypedValue::Boolean(false)
        );
    }
}
