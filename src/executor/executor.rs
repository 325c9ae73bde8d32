//! Query executor for campusdb
//!
//! Execution flow (strict order):
//! 1. Validate the raw document and bind it to one dataset
//! 2. Evaluate WHERE into a set of matching records
//! 3. Apply GROUP/APPLY if TRANSFORMATIONS is present
//! 4. Enforce the result ceiling
//! 5. Apply ORDER
//! 6. Project to COLUMNS
//!
//! The ceiling is checked before sorting; neither sorting nor projection
//! changes the row count.

use serde_json::Value;
use uuid::Uuid;

use crate::dataset::{DatasetKind, RecordStore};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry, Timer};
use crate::query::{Column, QueryError, QueryValidator, ValidatedQuery};

use super::aggregate::group_and_apply;
use super::errors::{ExecutorError, ExecutorResult};
use super::filters::{FilterEvaluator, MatchSet};
use super::result::{QueryOutput, Row};
use super::sorter::RowSorter;

/// Maximum number of rows a query may return
pub const RESULT_LIMIT: usize = 5000;

/// Read-only view of registered datasets
pub trait CatalogLookup {
    /// Kind of the dataset registered under `id`
    fn kind_of(&self, id: &str) -> Option<DatasetKind>;

    /// Records of the dataset registered under `id`
    fn store(&self, id: &str) -> Option<&RecordStore>;
}

/// Runs queries against a catalog view
pub struct QueryExecutor<'a, L: CatalogLookup + ?Sized> {
    catalog: &'a L,
    metrics: Option<&'a MetricsRegistry>,
}

impl<'a, L: CatalogLookup + ?Sized> QueryExecutor<'a, L> {
    pub fn new(catalog: &'a L) -> Self {
        Self {
            catalog,
            metrics: None,
        }
    }

    /// Counts outcomes in `metrics`
    pub fn with_metrics(mut self, metrics: &'a MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validates and runs a raw query document.
    ///
    /// Deterministic: the same document against an unchanged catalog
    /// yields the same rows in the same order.
    pub fn execute(&self, raw: &Value) -> ExecutorResult<QueryOutput> {
        let query_id = Uuid::new_v4().to_string();
        let timer = Timer::new();

        let result = QueryValidator::new(self.catalog)
            .validate(raw)
            .map_err(ExecutorError::from)
            .and_then(|query| self.run(&query));

        let elapsed = timer.elapsed_ms();
        match &result {
            Ok(output) => {
                if let Some(metrics) = self.metrics {
                    metrics.record_query(output.len());
                }
                let rows = output.len().to_string();
                log_event_with_fields(
                    Event::QueryComplete,
                    &[
                        ("query_id", query_id.as_str()),
                        ("dataset", output.dataset_id.as_str()),
                        ("rows", rows.as_str()),
                        ("elapsed_ms", elapsed.as_str()),
                    ],
                );
            }
            Err(err) if err.is_too_large() => {
                if let Some(metrics) = self.metrics {
                    metrics.increment_results_too_large();
                }
                log_event_with_fields(
                    Event::QueryTooLarge,
                    &[
                        ("query_id", query_id.as_str()),
                        ("reason", err.message()),
                        ("elapsed_ms", elapsed.as_str()),
                    ],
                );
            }
            Err(err) => {
                if let Some(metrics) = self.metrics {
                    metrics.increment_queries_rejected();
                }
                let code = err.query_error().map(|e| e.code().code()).unwrap_or("");
                log_event_with_fields(
                    Event::QueryRejected,
                    &[
                        ("query_id", query_id.as_str()),
                        ("code", code),
                        ("reason", err.message()),
                        ("elapsed_ms", elapsed.as_str()),
                    ],
                );
            }
        }
        result
    }

    /// Runs an already validated query
    pub fn run(&self, query: &ValidatedQuery) -> ExecutorResult<QueryOutput> {
        let store = self
            .catalog
            .store(&query.dataset_id)
            .ok_or_else(|| QueryError::unknown_dataset(query.dataset_id.as_str()))?;

        let matched = FilterEvaluator::new(store).matching(query.filter.as_ref())?;

        let mut rows = match &query.transformations {
            Some(t) => group_and_apply(store, &matched, t),
            None => materialize(store, &matched, &query.columns),
        };

        if rows.len() > RESULT_LIMIT {
            return Err(ExecutorError::result_too_large(rows.len(), RESULT_LIMIT));
        }

        if let Some(order) = &query.order {
            RowSorter::sort(&mut rows, order);
        }

        if query.is_transformed() {
            rows = rows
                .iter()
                .map(|row| row.project(query.column_keys()))
                .collect();
        }

        Ok(QueryOutput {
            dataset_id: query.dataset_id.clone(),
            rows,
        })
    }
}

/// Builds one row per matched record holding exactly the COLUMNS fields
fn materialize(store: &RecordStore, matched: &MatchSet, columns: &[Column]) -> Vec<Row> {
    matched
        .iter()
        .filter_map(|pos| store.get(*pos))
        .map(|record| {
            let mut row = Row::with_capacity(columns.len());
            for column in columns {
                if let Some(value) = column.field.and_then(|f| record.value(f)) {
                    row.insert(column.key.as_str(), value.to_scalar());
                }
            }
            row
        })
        .collect()
}

/// Evaluates a raw query against a catalog, returning the rows
pub fn evaluate<L: CatalogLookup + ?Sized>(raw: &Value, catalog: &L) -> ExecutorResult<Vec<Row>> {
    QueryExecutor::new(catalog)
        .execute(raw)
        .map(|output| output.rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Record, Room, Scalar, Section};
    use crate::executor::ExecutorErrorCode;
    use crate::query::QueryErrorCode;
    use serde_json::json;
    use std::collections::HashMap;

    struct MockCatalog {
        stores: HashMap<String, RecordStore>,
    }

    impl CatalogLookup for MockCatalog {
        fn kind_of(&self, id: &str) -> Option<DatasetKind> {
            self.stores.get(id).map(|s| s.kind())
        }

        fn store(&self, id: &str) -> Option<&RecordStore> {
            self.stores.get(id)
        }
    }

    fn section(uuid: &str, dept: &str, id: &str, avg: f64, year: i64) -> Record {
        Record::Section(Section {
            dept: dept.into(),
            id: id.into(),
            instructor: "smith, j".into(),
            title: "some course".into(),
            avg,
            pass: 50,
            fail: 2,
            audit: 0,
            uuid: uuid.into(),
            year,
        })
    }

    fn room(shortname: &str, number: &str, seats: i64) -> Record {
        Record::Room(Room {
            fullname: format!("{} building", shortname),
            shortname: shortname.into(),
            number: number.into(),
            name: format!("{}_{}", shortname, number),
            address: "".into(),
            lat: 49.0,
            lon: -123.0,
            seats,
            room_type: "Small Group".into(),
            furniture: "Movable Tables".into(),
            href: "".into(),
        })
    }

    fn catalog() -> MockCatalog {
        let mut stores = HashMap::new();
        stores.insert(
            "courses".to_string(),
            RecordStore::new(
                DatasetKind::Sections,
                vec![
                    section("1", "cpsc", "310", 85.0, 2015),
                    section("2", "math", "100", 70.0, 2015),
                    section("3", "cpsc", "110", 90.0, 2016),
                    section("4", "cpsc", "310", 75.0, 1900),
                ],
            )
            .unwrap(),
        );
        stores.insert(
            "rooms".to_string(),
            RecordStore::new(
                DatasetKind::Rooms,
                vec![room("DMP", "110", 120), room("DMP", "201", 40), room("ANGU", "098", 260)],
            )
            .unwrap(),
        );
        MockCatalog { stores }
    }

    #[test]
    fn test_filter_and_project() {
        let catalog = catalog();
        let output = QueryExecutor::new(&catalog)
            .execute(&json!({
                "WHERE": {"GT": {"courses_avg": 80}},
                "OPTIONS": {"COLUMNS": ["courses_dept", "courses_avg"]}
            }))
            .unwrap();
        assert_eq!(output.dataset_id, "courses");
        assert_eq!(output.len(), 2);
        assert_eq!(
            serde_json::to_string(&output.rows[0]).unwrap(),
            r#"{"courses_dept":"cpsc","courses_avg":85}"#
        );
    }

    #[test]
    fn test_unordered_results_follow_scan_order() {
        let catalog = catalog();
        let rows = evaluate(
            &json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["courses_uuid"]}}),
            &catalog,
        )
        .unwrap();
        let uuids: Vec<_> = rows.iter().map(|r| r.get("courses_uuid").unwrap().to_string()).collect();
        assert_eq!(uuids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_group_order_project() {
        let catalog = catalog();
        let rows = evaluate(
            &json!({
                "WHERE": {"IS": {"rooms_shortname": "*"}},
                "OPTIONS": {
                    "COLUMNS": ["totalSeats", "rooms_shortname"],
                    "ORDER": {"dir": "DOWN", "keys": ["totalSeats"]}
                },
                "TRANSFORMATIONS": {
                    "GROUP": ["rooms_shortname"],
                    "APPLY": [{"totalSeats": {"SUM": "rooms_seats"}}, {"n": {"COUNT": "rooms_name"}}]
                }
            }),
            &catalog,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("rooms_shortname"), Some(&Scalar::Text("ANGU".into())));
        assert_eq!(rows[0].get("totalSeats"), Some(&Scalar::Number(260.0)));
        assert_eq!(rows[1].get("totalSeats"), Some(&Scalar::Number(160.0)));
        // n is computed but not projected
        assert!(rows[0].get("n").is_none());
        let keys: Vec<_> = rows[0].keys().collect();
        assert_eq!(keys, vec!["totalSeats", "rooms_shortname"]);
    }

    #[test]
    fn test_validation_error_wrapped() {
        let catalog = catalog();
        let err = QueryExecutor::new(&catalog)
            .execute(&json!({
                "WHERE": {"GT": {"rooms_seats": 1}},
                "OPTIONS": {"COLUMNS": ["courses_avg"]}
            }))
            .unwrap_err();
        assert_eq!(err.code(), ExecutorErrorCode::CampusQueryRejected);
        assert_eq!(
            err.query_error().unwrap().code(),
            QueryErrorCode::CampusMultipleDatasets
        );
    }

    #[test]
    fn test_bad_wildcard_rejected_during_evaluation() {
        let catalog = catalog();
        let err = evaluate(
            &json!({
                "WHERE": {"IS": {"courses_dept": "c*s*c"}},
                "OPTIONS": {"COLUMNS": ["courses_dept"]}
            }),
            &catalog,
        )
        .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            err.query_error().unwrap().code(),
            QueryErrorCode::CampusInvalidWildcard
        );
    }

    #[test]
    fn test_metrics_recorded() {
        let catalog = catalog();
        let metrics = MetricsRegistry::new();
        let executor = QueryExecutor::new(&catalog).with_metrics(&metrics);
        executor
            .execute(&json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["rooms_name"]}}))
            .unwrap();
        executor.execute(&json!({"WHERE": {}})).unwrap_err();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.queries_executed, 1);
        assert_eq!(snapshot.rows_returned, 3);
        assert_eq!(snapshot.queries_rejected, 1);
    }

    #[test]
    fn test_idempotent() {
        let catalog = catalog();
        let query = json!({
            "WHERE": {"NOT": {"EQ": {"courses_year": 1900}}},
            "OPTIONS": {
                "COLUMNS": ["courses_id", "courses_avg"],
                "ORDER": {"dir": "UP", "keys": ["courses_id", "courses_avg"]}
            }
        });
        let first = evaluate(&query, &catalog).unwrap();
        let second = evaluate(&query, &catalog).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].get("courses_id"), Some(&Scalar::Text("100".into())));
    }
}
