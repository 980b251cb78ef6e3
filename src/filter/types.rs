use chrono::NaiveDate;
use std::cmp::Ordering;

use super::error::FilterError;

/// Query string lookup suffix (`field__lookup`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Exact,
    Contains,
    IContains,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Lookup {
    pub fn parse(suffix: &str) -> Option<Lookup> {
        Some(match suffix {
            "exact" => Lookup::Exact,
            "contains" => Lookup::Contains,
            "icontains" => Lookup::IContains,
            "gt" => Lookup::Gt,
            "gte" => Lookup::Gte,
            "lt" => Lookup::Lt,
            "lte" => Lookup::Lte,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lookup::Exact => "exact",
            Lookup::Contains => "contains",
            Lookup::IContains => "icontains",
            Lookup::Gt => "gt",
            Lookup::Gte => "gte",
            Lookup::Lt => "lt",
            Lookup::Lte => "lte",
        }
    }
}

pub const TEXT_LOOKUPS: &[Lookup] = &[Lookup::Exact, Lookup::Contains, Lookup::IContains];
pub const RANGE_LOOKUPS: &[Lookup] = &[Lookup::Exact, Lookup::Gt, Lookup::Lt, Lookup::Gte, Lookup::Lte];
pub const EXACT_ONLY: &[Lookup] = &[Lookup::Exact];
pub const SEARCH_LOOKUPS: &[Lookup] = &[Lookup::IContains];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Date,
}

/// A filterable field: query name, SQL expression and accepted lookups.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
    pub lookups: &'static [Lookup],
    /// Lookup applied when the parameter carries no suffix.
    pub default: Lookup,
}

impl FieldDef {
    pub const fn text(name: &'static str, column: &'static str) -> Self {
        FieldDef { name, column, kind: FieldKind::Text, lookups: TEXT_LOOKUPS, default: Lookup::Exact }
    }

    pub const fn range(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        FieldDef { name, column, kind, lookups: RANGE_LOOKUPS, default: Lookup::Exact }
    }

    pub const fn id(name: &'static str, column: &'static str) -> Self {
        FieldDef { name, column, kind: FieldKind::Integer, lookups: EXACT_ONLY, default: Lookup::Exact }
    }

    pub const fn search(name: &'static str, column: &'static str) -> Self {
        FieldDef {
            name,
            column,
            kind: FieldKind::Text,
            lookups: SEARCH_LOOKUPS,
            default: Lookup::IContains,
        }
    }

    pub fn parse_value(&self, param: &str, raw: &str) -> Result<FilterValue, FilterError> {
        match self.kind {
            FieldKind::Text => Ok(FilterValue::Text(raw.to_string())),
            FieldKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(FilterValue::Integer)
                .map_err(|_| FilterError::invalid_value(param, "Enter a whole number.")),
            FieldKind::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map(FilterValue::Date)
                .map_err(|_| FilterError::invalid_value(param, "Enter a valid date (YYYY-MM-DD).")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
}

impl FilterValue {
    fn compare(&self, other: &FilterValue) -> Option<Ordering> {
        match (self, other) {
            (FilterValue::Text(a), FilterValue::Text(b)) => Some(a.cmp(b)),
            (FilterValue::Integer(a), FilterValue::Integer(b)) => Some(a.cmp(b)),
            (FilterValue::Float(a), FilterValue::Float(b)) => a.partial_cmp(b),
            (FilterValue::Integer(a), FilterValue::Float(b)) => (*a as f64).partial_cmp(b),
            (FilterValue::Float(a), FilterValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (FilterValue::Date(a), FilterValue::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// One validated `field__lookup=value` parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: &'static str,
    pub column: &'static str,
    pub lookup: Lookup,
    pub value: FilterValue,
}

impl Condition {
    /// Evaluate against an in-memory row. A null field never matches.
    pub fn matches(&self, source: &dyn FieldSource) -> bool {
        let Some(actual) = source.field(self.field) else {
            return false;
        };
        match self.lookup {
            Lookup::Contains | Lookup::IContains => {
                let (FilterValue::Text(haystack), FilterValue::Text(needle)) = (&actual, &self.value) else {
                    return false;
                };
                if self.lookup == Lookup::Contains {
                    haystack.contains(needle.as_str())
                } else {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                }
            }
            lookup => match actual.compare(&self.value) {
                Some(ordering) => match lookup {
                    Lookup::Exact => ordering == Ordering::Equal,
                    Lookup::Gt => ordering == Ordering::Greater,
                    Lookup::Gte => ordering != Ordering::Less,
                    Lookup::Lt => ordering == Ordering::Less,
                    Lookup::Lte => ordering != Ordering::Greater,
                    Lookup::Contains | Lookup::IContains => false,
                },
                None => false,
            },
        }
    }
}

/// Field access for rows filtered in process.
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<FilterValue>;
}

/// Escape `LIKE` metacharacters and wrap the needle for a substring match.
pub fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(&'static str, i64);

    impl FieldSource for Row {
        fn field(&self, name: &str) -> Option<FilterValue> {
            match name {
                "name" => Some(FilterValue::Text(self.0.to_string())),
                "queen_year" => Some(FilterValue::Integer(self.1)),
                _ => None,
            }
        }
    }

    fn cond(field: &'static str, lookup: Lookup, value: FilterValue) -> Condition {
        Condition { field, column: field, lookup, value }
    }

    #[test]
    fn text_lookups() {
        let row = Row("North Field", 2020);
        assert!(cond("name", Lookup::Exact, FilterValue::Text("North Field".into())).matches(&row));
        assert!(cond("name", Lookup::Contains, FilterValue::Text("Field".into())).matches(&row));
        assert!(!cond("name", Lookup::Contains, FilterValue::Text("field".into())).matches(&row));
        assert!(cond("name", Lookup::IContains, FilterValue::Text("field".into())).matches(&row));
    }

    #[test]
    fn range_lookups() {
        let row = Row("a", 2020);
        assert!(cond("queen_year", Lookup::Gte, FilterValue::Integer(2020)).matches(&row));
        assert!(!cond("queen_year", Lookup::Gt, FilterValue::Integer(2020)).matches(&row));
        assert!(cond("queen_year", Lookup::Lt, FilterValue::Integer(2021)).matches(&row));
    }

    #[test]
    fn missing_fields_never_match() {
        let row = Row("a", 1);
        assert!(!cond("beeyard__id", Lookup::Exact, FilterValue::Integer(1)).matches(&row));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn parse_value_by_kind() {
        let def = FieldDef::range("date", "c.date", FieldKind::Date);
        assert_eq!(
            def.parse_value("date", "2024-05-01").unwrap(),
            FilterValue::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
        );
        assert!(def.parse_value("date__gt", "yesterday").is_err());
    }
}
