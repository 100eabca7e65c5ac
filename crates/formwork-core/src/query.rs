/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Query Planner (component F).
//!
//! Parses a flat `string -> string` map, as received from an HTTP query
//! string, into a `PlannedQuery` consumed by the Content Storage Service.
//! Parsing rules are reproduced literally from the operator contract; no
//! type coercion is attempted here.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    In,
    Nin,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    StartsWith,
    EndsWith,
}

impl Operator {
    fn parse(raw: &str) -> Self {
        match raw {
            "ne" => Operator::Ne,
            "in" => Operator::In,
            "nin" => Operator::Nin,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "contains" => Operator::Contains,
            "startsWith" => Operator::StartsWith,
            "endsWith" => Operator::EndsWith,
            _ => Operator::Eq,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Single(String),
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct PlannedFilter {
    pub field: String,
    pub op: Operator,
    pub value: FilterValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct SortClause {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone)]
pub struct PlannedQuery {
    pub filters: Vec<PlannedFilter>,
    pub sort: Vec<SortClause>,
    pub page: i64,
    pub limit: i64,
    pub populate: Vec<String>,
    pub fields: Option<Vec<String>>,
}

static FILTER_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^filters\[(.+)\]$").unwrap());

/// Plans a query from raw HTTP query-string parameters.
pub fn plan(params: &HashMap<String, String>) -> PlannedQuery {
    let mut filters = Vec::new();
    for (key, raw_value) in params {
        if let Some(caps) = FILTER_KEY.captures(key.as_str()) {
            let field = caps[1].to_string();
            let (op, value) = match raw_value.split_once(':') {
                Some((op, val)) => (Operator::parse(op), val.to_string()),
                None => (Operator::Eq, raw_value.clone()),
            };
            let value = if matches!(op, Operator::In | Operator::Nin) {
                FilterValue::List(value.split(',').map(|s| s.to_string()).collect())
            } else {
                FilterValue::Single(value)
            };
            filters.push(PlannedFilter { field, op, value });
        }
    }

    let sort = params
        .get("sort")
        .map(|raw| {
            raw.split(',')
                .filter(|s| !s.is_empty())
                .map(|clause| match clause.split_once(':') {
                    Some((field, dir)) => SortClause {
                        field: field.to_string(),
                        direction: if dir == "desc" { SortDirection::Desc } else { SortDirection::Asc },
                    },
                    None => SortClause {
                        field: clause.to_string(),
                        direction: SortDirection::Asc,
                    },
                })
                .collect()
        })
        .unwrap_or_default();

    let page = params
        .get("page")
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(1)
        .max(1);

    let limit = params
        .get("limit")
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(25)
        .clamp(1, 100);

    let populate = params
        .get("populate")
        .map(|raw| raw.split(',').filter(|s| !s.is_empty()).map(String::from).collect())
        .unwrap_or_default();

    let fields = params
        .get("fields")
        .map(|raw| raw.split(',').filter(|s| !s.is_empty()).map(String::from).collect());

    PlannedQuery {
        filters,
        sort,
        page,
        limit,
        populate,
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_filter_with_explicit_operator() {
        let planned = plan(&params(&[("filters[age]", "gte:18")]));
        assert_eq!(planned.filters.len(), 1);
        assert_eq!(planned.filters[0].field, "age");
        assert_eq!(planned.filters[0].op, Operator::Gte);
        assert_eq!(planned.filters[0].value, FilterValue::Single("18".to_string()));
    }

    #[test]
    fn test_filter_defaults_to_eq_without_colon() {
        let planned = plan(&params(&[("filters[status]", "published")]));
        assert_eq!(planned.filters[0].op, Operator::Eq);
    }

    #[test]
    fn test_in_operator_splits_on_comma() {
        let planned = plan(&params(&[("filters[status]", "in:draft,published")]));
        assert_eq!(
            planned.filters[0].value,
            FilterValue::List(vec!["draft".to_string(), "published".to_string()])
        );
    }

    #[test]
    fn test_sort_parsing_with_default_direction() {
        let planned = plan(&params(&[("sort", "title:asc,createdAt:desc,slug")]));
        assert_eq!(planned.sort.len(), 3);
        assert_eq!(planned.sort[2].field, "slug");
        assert_eq!(planned.sort[2].direction, SortDirection::Asc);
    }

    #[test]
    fn test_page_and_limit_clamping() {
        let planned = plan(&params(&[("page", "0"), ("limit", "5000")]));
        assert_eq!(planned.page, 1);
        assert_eq!(planned.limit, 100);
    }

    #[test]
    fn test_defaults_when_absent() {
        let planned = plan(&HashMap::new());
        assert_eq!(planned.page, 1);
        assert_eq!(planned.limit, 25);
        assert!(planned.populate.is_empty());
        assert!(planned.fields.is_none());
    }

    #[test]
    fn test_populate_and_fields_lists() {
        let planned = plan(&params(&[("populate", "author,tags"), ("fields", "title,slug")]));
        assert_eq!(planned.populate, vec!["author".to_string(), "tags".to_string()]);
        assert_eq!(planned.fields, Some(vec!["title".to_string(), "slug".to_string()]));
    }
}
