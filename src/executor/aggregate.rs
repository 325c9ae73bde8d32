//! GROUP and APPLY evaluation
//!
//! Matching records are partitioned by the tuple of their GROUP field
//! values. Partitions keep first-appearance order and members keep scan
//! order. SUM and AVG accumulate in decimal and round half-up to two
//! places; MAX and MIN return the stored value untouched.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive, Zero};

use crate::dataset::{FieldValue, Record, RecordStore, Scalar};
use crate::query::{ApplyRule, ApplyToken, Transformations};

use super::filters::MatchSet;
use super::result::Row;

/// Decimal places kept by SUM and AVG
const AGGREGATE_SCALE: i64 = 2;

/// Hashable identity of one field value.
///
/// Numbers compare by bit pattern with `-0.0` folded into `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ValueKey<'a> {
    Number(u64),
    Text(&'a str),
}

impl<'a> From<FieldValue<'a>> for ValueKey<'a> {
    fn from(value: FieldValue<'a>) -> Self {
        match value {
            FieldValue::Number(n) if n == 0.0 => ValueKey::Number(0f64.to_bits()),
            FieldValue::Number(n) => ValueKey::Number(n.to_bits()),
            FieldValue::Text(s) => ValueKey::Text(s),
        }
    }
}

struct Group<'a> {
    members: Vec<&'a Record>,
}

/// Partitions the matched records and computes one row per partition
pub fn group_and_apply(store: &RecordStore, matched: &MatchSet, t: &Transformations) -> Vec<Row> {
    let mut index: HashMap<Vec<ValueKey<'_>>, usize> = HashMap::new();
    let mut groups: Vec<Group<'_>> = Vec::new();

    for record in matched.iter().filter_map(|pos| store.get(*pos)) {
        let identity: Vec<ValueKey<'_>> = t
            .group
            .iter()
            .filter_map(|g| record.value(g.field).map(ValueKey::from))
            .collect();
        match index.get(&identity) {
            Some(&i) => groups[i].members.push(record),
            None => {
                index.insert(identity, groups.len());
                groups.push(Group {
                    members: vec![record],
                });
            }
        }
    }

    groups
        .iter()
        .map(|group| build_row(group, t))
        .collect()
}

fn build_row(group: &Group<'_>, t: &Transformations) -> Row {
    let mut row = Row::with_capacity(t.group.len() + t.apply.len());
    if let Some(first) = group.members.first() {
        for key in &t.group {
            if let Some(value) = first.value(key.field) {
                row.insert(key.key.as_str(), value.to_scalar());
            }
        }
    }
    for rule in &t.apply {
        row.insert(rule.name.as_str(), apply_rule(rule, &group.members));
    }
    row
}

fn apply_rule(rule: &ApplyRule, members: &[&Record]) -> Scalar {
    aggregate(
        rule.token,
        members.iter().filter_map(|record| record.value(rule.field)),
    )
}

/// Computes one aggregate over a non-empty sequence of values
pub fn aggregate<'a>(token: ApplyToken, values: impl Iterator<Item = FieldValue<'a>>) -> Scalar {
    match token {
        ApplyToken::Max => Scalar::Number(
            values
                .filter_map(|v| v.as_number())
                .fold(f64::NEG_INFINITY, f64::max),
        ),
        ApplyToken::Min => Scalar::Number(
            values
                .filter_map(|v| v.as_number())
                .fold(f64::INFINITY, f64::min),
        ),
        ApplyToken::Sum => {
            let (sum, _) = decimal_sum(values);
            Scalar::Number(round(&sum))
        }
        ApplyToken::Avg => {
            let (sum, count) = decimal_sum(values);
            if count == 0 {
                return Scalar::Number(0.0);
            }
            Scalar::Number(round(&(sum / BigDecimal::from(count))))
        }
        ApplyToken::Count => {
            let distinct: HashSet<ValueKey<'_>> = values.map(ValueKey::from).collect();
            Scalar::Number(distinct.len() as f64)
        }
    }
}

fn decimal_sum<'a>(values: impl Iterator<Item = FieldValue<'a>>) -> (BigDecimal, u64) {
    let mut sum = BigDecimal::zero();
    let mut count = 0u64;
    for n in values.filter_map(|v| v.as_number()) {
        sum += to_decimal(n);
        count += 1;
    }
    (sum, count)
}

/// Decimal from the shortest round-tripping representation of `n`
fn to_decimal(n: f64) -> BigDecimal {
    BigDecimal::from_str(&n.to_string()).unwrap_or_else(|_| BigDecimal::zero())
}

fn round(value: &BigDecimal) -> f64 {
    value
        .with_scale_round(AGGREGATE_SCALE, RoundingMode::HalfUp)
        .to_f64()
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DatasetKind, Field, Section};
    use crate::query::GroupKey;

    fn numbers(values: &[f64]) -> impl Iterator<Item = FieldValue<'static>> + '_ {
        values.iter().map(|n| FieldValue::Number(*n))
    }

    #[test]
    fn test_basic_aggregates() {
        let v = [10.0, 20.0, 30.0];
        assert_eq!(aggregate(ApplyToken::Sum, numbers(&v)), Scalar::Number(60.0));
        assert_eq!(aggregate(ApplyToken::Avg, numbers(&v)), Scalar::Number(20.0));
        assert_eq!(aggregate(ApplyToken::Max, numbers(&v)), Scalar::Number(30.0));
        assert_eq!(aggregate(ApplyToken::Min, numbers(&v)), Scalar::Number(10.0));
        assert_eq!(aggregate(ApplyToken::Count, numbers(&v)), Scalar::Number(3.0));
    }

    #[test]
    fn test_count_is_distinct() {
        assert_eq!(
            aggregate(ApplyToken::Count, numbers(&[5.0, 5.0, 7.0])),
            Scalar::Number(2.0)
        );
        let texts = ["a", "b", "a"].into_iter().map(FieldValue::Text);
        assert_eq!(aggregate(ApplyToken::Count, texts), Scalar::Number(2.0));
    }

    #[test]
    fn test_sum_uses_decimal_arithmetic() {
        // 1.0 + 0.005 is 1.00499.. in binary floating point
        assert_eq!(
            aggregate(ApplyToken::Sum, numbers(&[1.0, 0.005])),
            Scalar::Number(1.01)
        );
        let tenths = [0.1; 10];
        assert_eq!(aggregate(ApplyToken::Sum, numbers(&tenths)), Scalar::Number(1.0));
    }

    #[test]
    fn test_avg_rounds_to_two_places() {
        assert_eq!(
            aggregate(ApplyToken::Avg, numbers(&[1.0, 2.0, 2.0])),
            Scalar::Number(1.67)
        );
    }

    #[test]
    fn test_max_min_unrounded() {
        assert_eq!(
            aggregate(ApplyToken::Max, numbers(&[49.26826, -1.0])),
            Scalar::Number(49.26826)
        );
        assert_eq!(
            aggregate(ApplyToken::Min, numbers(&[-123.25468, 0.0])),
            Scalar::Number(-123.25468)
        );
    }

    fn section(uuid: &str, dept: &str, year: i64, avg: f64) -> Record {
        Record::Section(Section {
            dept: dept.into(),
            id: "100".into(),
            instructor: "".into(),
            title: "".into(),
            avg,
            pass: 0,
            fail: 0,
            audit: 0,
            uuid: uuid.into(),
            year,
        })
    }

    fn section_with_id(uuid: &str, dept: &str, id: &str) -> Record {
        match section(uuid, dept, 2000, 0.0) {
            Record::Section(s) => Record::Section(Section { id: id.into(), ..s }),
            other => other,
        }
    }

    #[test]
    fn test_grouping_keeps_first_appearance_and_types() {
        let store = RecordStore::new(
            DatasetKind::Sections,
            vec![
                section("1", "math", 2015, 70.0),
                section("2", "cpsc", 2015, 80.0),
                section("3", "math", 2015, 90.0),
                section("4", "math", 2016, 60.0),
            ],
        )
        .unwrap();
        let t = Transformations {
            group: vec![
                GroupKey {
                    key: "courses_dept".into(),
                    field: Field::Dept,
                },
                GroupKey {
                    key: "courses_year".into(),
                    field: Field::Year,
                },
            ],
            apply: vec![ApplyRule {
                name: "avgGrade".into(),
                token: ApplyToken::Avg,
                field: Field::Avg,
            }],
        };
        let matched: MatchSet = (0..4).collect();
        let rows = group_and_apply(&store, &matched, &t);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("courses_dept"), Some(&Scalar::Text("math".into())));
        assert_eq!(rows[0].get("courses_year"), Some(&Scalar::Number(2015.0)));
        assert_eq!(rows[0].get("avgGrade"), Some(&Scalar::Number(80.0)));
        assert_eq!(rows[1].get("courses_dept"), Some(&Scalar::Text("cpsc".into())));
        assert_eq!(rows[2].get("courses_year"), Some(&Scalar::Number(2016.0)));
    }

    #[test]
    fn test_group_identity_has_no_separator_collisions() {
        let store = RecordStore::new(
            DatasetKind::Sections,
            vec![
                section_with_id("1", "a^b", "c"),
                section_with_id("2", "a", "b^c"),
            ],
        )
        .unwrap();
        let t = Transformations {
            group: vec![
                GroupKey {
                    key: "courses_dept".into(),
                    field: Field::Dept,
                },
                GroupKey {
                    key: "courses_id".into(),
                    field: Field::Id,
                },
            ],
            apply: vec![],
        };
        let matched: MatchSet = (0..2).collect();
        assert_eq!(group_and_apply(&store, &matched, &t).len(), 2);
    }

    #[test]
    fn test_empty_match_yields_no_groups() {
        let store = RecordStore::new(DatasetKind::Sections, vec![section("1", "x", 2000, 1.0)]).unwrap();
        let t = Transformations {
            group: vec![GroupKey {
                key: "courses_dept".into(),
                field: Field::Dept,
            }],
            apply: vec![],
        };
        assert!(group_and_apply(&store, &MatchSet::new(), &t).is_empty());
    }
}
