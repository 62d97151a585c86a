use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// The direction of a sort.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending.
    #[default]
    Asc,

    /// Descending.
    Desc,
}

/// One sort directive.
///
/// Parsed from a signed field name. A leading `-` or `>` sorts descending, a
/// leading `+` or `<` sorts ascending, and an unsigned field sorts ascending.
///
/// # Examples
///
/// ```
/// use satsearch::{Direction, Sortby};
///
/// let sortby: Sortby = "-properties.datetime".parse().unwrap();
/// assert_eq!(sortby.field, "properties.datetime");
/// assert_eq!(sortby.direction, Direction::Desc);
///
/// let sortby: Sortby = "id".parse().unwrap();
/// assert_eq!(sortby.direction, Direction::Asc);
/// ```
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Sortby {
    /// The field to sort by.
    pub field: String,

    /// The direction of the sort.
    pub direction: Direction,
}

impl Sortby {
    /// Creates a new ascending sort on a field.
    pub fn asc(field: impl ToString) -> Sortby {
        Sortby {
            field: field.to_string(),
            direction: Direction::Asc,
        }
    }

    /// Creates a new descending sort on a field.
    pub fn desc(field: impl ToString) -> Sortby {
        Sortby {
            field: field.to_string(),
            direction: Direction::Desc,
        }
    }
}

impl FromStr for Sortby {
    type Err = Error;

    fn from_str(s: &str) -> Result<Sortby> {
        let (direction, field) = match s.chars().next() {
            Some('-') | Some('>') => (Direction::Desc, &s[1..]),
            Some('+') | Some('<') => (Direction::Asc, &s[1..]),
            _ => (Direction::Asc, s),
        };
        if field.is_empty() {
            Err(Error::InvalidSortSyntax(s.to_string()))
        } else {
            Ok(Sortby {
                field: field.to_string(),
                direction,
            })
        }
    }
}

impl Display for Sortby {
    /// Writes the `+field`/`-field` form used in GET requests.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.direction {
            Direction::Asc => write!(f, "+{}", self.field),
            Direction::Desc => write!(f, "-{}", self.field),
        }
    }
}
