//! Query validator
//!
//! Checks a raw query document against the query grammar and resolves the
//! single dataset it targets. Validation is all-or-nothing and stops at the
//! first violation.
//!
//! Clauses are checked in a fixed order: TRANSFORMATIONS (GROUP, then
//! APPLY), OPTIONS (COLUMNS, then ORDER), WHERE. The first dataset id
//! encountered in that walk fixes the target; any other id afterwards is
//! rejected with `CAMPUS_MULTIPLE_DATASETS`.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::dataset::{DatasetKind, Field};
use crate::executor::CatalogLookup;

use super::ast::{
    ApplyRule, ApplyToken, Column, Comparator, Filter, GroupKey, Order, SortDirection,
    Transformations, ValidatedQuery,
};
use super::errors::{QueryError, QueryResult};
use super::key::split_key;

const WHERE: &str = "WHERE";
const OPTIONS: &str = "OPTIONS";
const TRANSFORMATIONS: &str = "TRANSFORMATIONS";

/// The dataset a query is bound to, accumulated during the walk
#[derive(Debug, Default)]
struct Binding {
    target: Option<(String, DatasetKind)>,
}

impl Binding {
    /// Binds on first use, then only accepts the same id
    fn bind<L: CatalogLookup + ?Sized>(&mut self, catalog: &L, id: &str) -> QueryResult<DatasetKind> {
        match &self.target {
            Some((bound, kind)) if bound == id => Ok(*kind),
            Some((bound, _)) => Err(QueryError::multiple_datasets(bound, id)),
            None => {
                let kind = catalog
                    .kind_of(id)
                    .ok_or_else(|| QueryError::unknown_dataset(id))?;
                self.target = Some((id.to_string(), kind));
                Ok(kind)
            }
        }
    }
}

/// Names a transformed query may project: GROUP keys and APPLY names
#[derive(Debug, Default)]
struct TransformNames {
    names: HashSet<String>,
}

impl TransformNames {
    fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn insert(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }
}

/// Stateless validator over a catalog view
pub struct QueryValidator<'a, L: CatalogLookup + ?Sized> {
    catalog: &'a L,
}

impl<'a, L: CatalogLookup + ?Sized> QueryValidator<'a, L> {
    pub fn new(catalog: &'a L) -> Self {
        Self { catalog }
    }

    /// Validates a raw document into a typed, dataset-bound query
    pub fn validate(&self, raw: &Value) -> QueryResult<ValidatedQuery> {
        let query = raw
            .as_object()
            .ok_or_else(|| QueryError::invalid("Query must be a JSON object"))?;

        let where_clause = non_null(query, WHERE);
        let options = non_null(query, OPTIONS);
        let (where_clause, options) = match (where_clause, options) {
            (Some(w), Some(o)) => (w, o),
            _ => return Err(QueryError::invalid("Missing WHERE or OPTIONS")),
        };
        if query
            .keys()
            .any(|k| k != WHERE && k != OPTIONS && k != TRANSFORMATIONS)
        {
            return Err(QueryError::invalid("Excess keys in query"));
        }
        let where_clause = where_clause
            .as_object()
            .ok_or_else(|| QueryError::invalid("WHERE must be an object"))?;
        let options = options
            .as_object()
            .ok_or_else(|| QueryError::invalid("OPTIONS must be an object"))?;

        let mut binding = Binding::default();
        let mut names = TransformNames::default();

        let transformations = match query.get(TRANSFORMATIONS) {
            None => None,
            Some(t) => {
                let t = t
                    .as_object()
                    .ok_or_else(|| QueryError::invalid("TRANSFORMATIONS must be an object"))?;
                Some(self.validate_transformations(t, &mut binding, &mut names)?)
            }
        };

        let (columns, order) = self.validate_options(
            options,
            transformations.is_some(),
            &names,
            &mut binding,
        )?;

        let filter = if where_clause.is_empty() {
            None
        } else {
            Some(self.validate_filter(where_clause, &mut binding)?)
        };

        let (dataset_id, kind) = binding
            .target
            .ok_or_else(|| QueryError::invalid("Query references no dataset"))?;

        Ok(ValidatedQuery {
            dataset_id,
            kind,
            filter,
            columns,
            order,
            transformations,
        })
    }

    fn validate_transformations(
        &self,
        transformations: &Map<String, Value>,
        binding: &mut Binding,
        names: &mut TransformNames,
    ) -> QueryResult<Transformations> {
        let (group, apply) = match (
            non_null(transformations, "GROUP"),
            non_null(transformations, "APPLY"),
        ) {
            (Some(g), Some(a)) => (g, a),
            _ => return Err(QueryError::invalid("TRANSFORMATIONS missing GROUP or APPLY")),
        };
        if transformations.len() != 2 {
            return Err(QueryError::invalid("Excess keys in TRANSFORMATIONS"));
        }

        let group = self.validate_group(group, binding, names)?;
        let apply = match apply.as_array() {
            Some(rules) => rules
                .iter()
                .map(|rule| self.validate_apply_rule(rule, binding, names))
                .collect::<QueryResult<Vec<_>>>()?,
            None => return Err(QueryError::invalid("APPLY must be an array")),
        };
        Ok(Transformations { group, apply })
    }

    fn validate_group(
        &self,
        group: &Value,
        binding: &mut Binding,
        names: &mut TransformNames,
    ) -> QueryResult<Vec<GroupKey>> {
        let keys = match group.as_array() {
            Some(keys) if !keys.is_empty() => keys,
            _ => return Err(QueryError::invalid("GROUP must be a non-empty array")),
        };
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let key = key
                .as_str()
                .ok_or_else(|| QueryError::invalid("GROUP keys must be strings"))?;
            let field = self.resolve_field("GROUP", key, binding)?;
            names.insert(key);
            out.push(GroupKey {
                key: key.to_string(),
                field,
            });
        }
        Ok(out)
    }

    fn validate_apply_rule(
        &self,
        rule: &Value,
        binding: &mut Binding,
        names: &mut TransformNames,
    ) -> QueryResult<ApplyRule> {
        let rule = rule
            .as_object()
            .ok_or_else(|| QueryError::invalid("APPLY rule must be an object"))?;
        let (name, token) = single_entry(rule)
            .ok_or_else(|| QueryError::invalid("APPLY rule must have exactly one key"))?;

        if names.contains(name) {
            return Err(QueryError::duplicate_apply(name));
        }
        if name.contains('_') {
            return Err(QueryError::invalid(format!(
                "APPLY key '{}' cannot contain an underscore",
                name
            )));
        }
        if name.trim().is_empty() {
            return Err(QueryError::invalid("APPLY key cannot be empty"));
        }
        names.insert(name);

        let token = token
            .as_object()
            .ok_or_else(|| QueryError::invalid("APPLY token must be an object"))?;
        let (token_name, target) = single_entry(token)
            .ok_or_else(|| QueryError::invalid("APPLY token must contain exactly one key"))?;
        let token = ApplyToken::parse(token_name).ok_or_else(|| {
            QueryError::invalid(format!("Invalid APPLY token '{}'", token_name))
        })?;
        let target = target
            .as_str()
            .ok_or_else(|| QueryError::invalid("APPLY token target must be a key string"))?;

        let field = self.resolve_field("APPLY", target, binding)?;
        if token.requires_numeric() && !field.is_numeric() {
            return Err(QueryError::type_mismatch(format!(
                "{} requires a numeric field, got '{}'",
                token.as_str(),
                target
            )));
        }

        Ok(ApplyRule {
            name: name.to_string(),
            token,
            field,
        })
    }

    fn validate_options(
        &self,
        options: &Map<String, Value>,
        transformed: bool,
        names: &TransformNames,
        binding: &mut Binding,
    ) -> QueryResult<(Vec<Column>, Option<Order>)> {
        let columns = non_null(options, "COLUMNS")
            .ok_or_else(|| QueryError::invalid("OPTIONS missing COLUMNS"))?;
        let order = options.get("ORDER");
        let expected = if order.is_some() { 2 } else { 1 };
        if options.len() != expected {
            return Err(QueryError::invalid("Invalid keys in OPTIONS"));
        }

        let columns = self.validate_columns(columns, transformed, names, binding)?;
        let order = match order {
            Some(order) => Some(validate_order(order, &columns)?),
            None => None,
        };
        Ok((columns, order))
    }

    fn validate_columns(
        &self,
        columns: &Value,
        transformed: bool,
        names: &TransformNames,
        binding: &mut Binding,
    ) -> QueryResult<Vec<Column>> {
        let keys = match columns.as_array() {
            Some(keys) if !keys.is_empty() => keys,
            _ => return Err(QueryError::invalid("COLUMNS must be a non-empty array")),
        };
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let key = key
                .as_str()
                .ok_or_else(|| QueryError::invalid("COLUMNS keys must be strings"))?;
            let field = if transformed {
                if !names.contains(key) {
                    return Err(QueryError::invalid_key(
                        "COLUMNS (must be a GROUP key or APPLY name)",
                        key,
                    ));
                }
                None
            } else {
                Some(self.resolve_field("COLUMNS", key, binding)?)
            };
            out.push(Column {
                key: key.to_string(),
                field,
            });
        }
        Ok(out)
    }

    fn validate_filter(&self, filter: &Map<String, Value>, binding: &mut Binding) -> QueryResult<Filter> {
        let (tag, body) = single_entry(filter)
            .ok_or_else(|| QueryError::invalid("Filter must have exactly one key"))?;

        match tag {
            "AND" => Ok(Filter::And(self.validate_logic(body, tag, binding)?)),
            "OR" => Ok(Filter::Or(self.validate_logic(body, tag, binding)?)),
            "NOT" => {
                let inner = body
                    .as_object()
                    .ok_or_else(|| QueryError::invalid("NOT must be an object"))?;
                Ok(Filter::Not(Box::new(self.validate_filter(inner, binding)?)))
            }
            "LT" => self.validate_comparison(body, Comparator::Lt, binding),
            "GT" => self.validate_comparison(body, Comparator::Gt, binding),
            "EQ" => self.validate_comparison(body, Comparator::Eq, binding),
            "IS" => {
                let (key, value) = comparison_entry(body, tag)?;
                let field = self.resolve_field(tag, key, binding)?;
                if field.is_numeric() {
                    return Err(QueryError::type_mismatch(format!(
                        "IS requires a string field, got '{}'",
                        key
                    )));
                }
                let pattern = value.as_str().ok_or_else(|| {
                    QueryError::type_mismatch("Invalid value type for IS, should be string")
                })?;
                Ok(Filter::Is {
                    field,
                    pattern: pattern.to_string(),
                })
            }
            other => Err(QueryError::invalid(format!("Invalid filter key '{}'", other))),
        }
    }

    fn validate_logic(&self, body: &Value, tag: &str, binding: &mut Binding) -> QueryResult<Vec<Filter>> {
        let children = match body.as_array() {
            Some(children) if !children.is_empty() => children,
            _ => return Err(QueryError::invalid(format!("{} must be a non-empty array", tag))),
        };
        children
            .iter()
            .map(|child| {
                let child = child.as_object().ok_or_else(|| {
                    QueryError::invalid(format!("{} children must be objects", tag))
                })?;
                self.validate_filter(child, binding)
            })
            .collect()
    }

    fn validate_comparison(
        &self,
        body: &Value,
        op: Comparator,
        binding: &mut Binding,
    ) -> QueryResult<Filter> {
        let (key, value) = comparison_entry(body, op.tag())?;
        let field = self.resolve_field(op.tag(), key, binding)?;
        if !field.is_numeric() {
            return Err(QueryError::type_mismatch(format!(
                "{} requires a numeric field, got '{}'",
                op.tag(),
                key
            )));
        }
        let value = value.as_f64().ok_or_else(|| {
            QueryError::type_mismatch(format!(
                "Invalid value type for {}, should be number",
                op.tag()
            ))
        })?;
        Ok(Filter::Compare { op, field, value })
    }

    /// Splits a qualified key, binds its dataset and resolves the field
    fn resolve_field(&self, clause: &str, key: &str, binding: &mut Binding) -> QueryResult<Field> {
        let parts = split_key(clause, key)?;
        let kind = binding.bind(self.catalog, parts.dataset_id)?;
        parts
            .resolve(kind)
            .ok_or_else(|| QueryError::invalid_key(clause, key))
    }
}

fn validate_order(order: &Value, columns: &[Column]) -> QueryResult<Order> {
    let in_columns = |key: &str| columns.iter().any(|c| c.key == key);

    match order {
        Value::String(key) => {
            if !in_columns(key) {
                return Err(QueryError::invalid_order(format!(
                    "ORDER key '{}' must be in COLUMNS",
                    key
                )));
            }
            Ok(Order {
                direction: SortDirection::Up,
                keys: vec![key.clone()],
            })
        }
        Value::Object(order_obj) => {
            let (dir, keys) = match (non_null(order_obj, "dir"), non_null(order_obj, "keys")) {
                (Some(d), Some(k)) => (d, k),
                _ => return Err(QueryError::invalid_order("ORDER missing dir or keys")),
            };
            if order_obj.len() != 2 {
                return Err(QueryError::invalid_order("Extra keys in ORDER"));
            }
            let direction = dir
                .as_str()
                .and_then(SortDirection::parse)
                .ok_or_else(|| QueryError::invalid_order("ORDER dir must be UP or DOWN"))?;
            let keys = match keys.as_array() {
                Some(keys) if !keys.is_empty() => keys,
                _ => {
                    return Err(QueryError::invalid_order(
                        "ORDER keys must be a non-empty array",
                    ))
                }
            };
            let keys = keys
                .iter()
                .map(|k| match k.as_str() {
                    Some(k) if in_columns(k) => Ok(k.to_string()),
                    Some(k) => Err(QueryError::invalid_order(format!(
                        "ORDER key '{}' must be in COLUMNS",
                        k
                    ))),
                    None => Err(QueryError::invalid_order("ORDER keys must be strings")),
                })
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(Order { direction, keys })
        }
        _ => Err(QueryError::invalid_order("Invalid ORDER type")),
    }
}

/// The sole `(key, value)` of a one-entry object
fn single_entry(map: &Map<String, Value>) -> Option<(&str, &Value)> {
    if map.len() != 1 {
        return None;
    }
    map.iter().next().map(|(k, v)| (k.as_str(), v))
}

fn comparison_entry<'v>(body: &'v Value, tag: &str) -> QueryResult<(&'v str, &'v Value)> {
    let body = body
        .as_object()
        .ok_or_else(|| QueryError::invalid(format!("{} must be an object", tag)))?;
    single_entry(body)
        .ok_or_else(|| QueryError::invalid(format!("{} must contain exactly one entry", tag)))
}

/// A present, non-null member
fn non_null<'v>(map: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    map.get(key).filter(|v| !v.is_null())
}
