//! Query expressions like `eo:cloud_cover<10`, parsed into the `query` extension's object.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt::Display, str::FromStr};

/// Operator tokens, in the order they are tried.
///
/// Two-character tokens come first so `>` never splits a `>=`.
const OPERATORS: [(&str, Operator); 5] = [
    (">=", Operator::Gte),
    ("<=", Operator::Lte),
    ("=", Operator::Eq),
    (">", Operator::Gt),
    ("<", Operator::Lt),
];

/// A comparison operator in a query expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Greater than or equal to (`>=`).
    Gte,

    /// Less than or equal to (`<=`).
    Lte,

    /// Equal to (`=`).
    Eq,

    /// Greater than (`>`).
    Gt,

    /// Less than (`<`).
    Lt,
}

/// One parsed `field<op>value` comparison.
///
/// # Examples
///
/// ```
/// use satsearch::{FilterExpression, Operator};
///
/// let expression: FilterExpression = "eo:cloud_cover<=10".parse().unwrap();
/// assert_eq!(expression.field, "eo:cloud_cover");
/// assert_eq!(expression.operator, Operator::Lte);
/// assert_eq!(expression.value, "10");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterExpression {
    /// The property being compared.
    pub field: String,

    /// The comparison.
    pub operator: Operator,

    /// The value, kept as a string for the server to interpret.
    pub value: String,
}

impl Operator {
    /// Returns the key this operator uses in the structured query object.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Gte => "gte",
            Operator::Lte => "lte",
            Operator::Eq => "eq",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FilterExpression {
    /// Returns this expression as `{field: {op: value}}`.
    pub fn to_query(&self) -> Map<String, Value> {
        let mut comparison = Map::new();
        let _ = comparison.insert(self.operator.to_string(), self.value.clone().into());
        let mut query = Map::new();
        let _ = query.insert(self.field.clone(), Value::Object(comparison));
        query
    }
}

impl FromStr for FilterExpression {
    type Err = Error;

    fn from_str(s: &str) -> Result<FilterExpression> {
        for (token, operator) in OPERATORS {
            if !s.contains(token) {
                continue;
            }
            let parts: Vec<&str> = s.split(token).collect();
            if let [field, value] = parts.as_slice()
                && !field.is_empty()
                && !value.is_empty()
            {
                return Ok(FilterExpression {
                    field: field.to_string(),
                    operator,
                    value: value.to_string(),
                });
            }
        }
        Err(Error::InvalidFilterSyntax(s.to_string()))
    }
}

/// Parses query expressions and merges them into one structured query object.
///
/// Expressions on the same field are merged, so `a>1` and `a<10` become
/// `{"a": {"gt": "1", "lt": "10"}}`. A repeated operator on the same field
/// keeps the last value.
///
/// # Examples
///
/// ```
/// use serde_json::json;
///
/// let query = satsearch::filter::parse_query(&["a>1", "a<10"]).unwrap();
/// assert_eq!(serde_json::Value::Object(query), json!({"a": {"gt": "1", "lt": "10"}}));
/// ```
pub fn parse_query(expressions: &[impl AsRef<str>]) -> Result<Map<String, Value>> {
    let mut query = Map::new();
    for expression in expressions {
        let expression: FilterExpression = expression.as_ref().parse()?;
        crate::merge(&mut query, expression.to_query());
    }
    Ok(query)
}
