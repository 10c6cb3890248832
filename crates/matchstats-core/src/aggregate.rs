// Per-group accumulation of per-match stat records and averaging.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

use crate::schema::StatSchema;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("record has {got} fields but schema `{schema}` declares {expected}")]
    FieldCountMismatch {
        schema: String,
        expected: usize,
        got: usize,
    },
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Numeric stats for one match, positionally aligned with a [`StatSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct StatRecord {
    values: Vec<f64>,
}

impl StatRecord {
    /// A record with every schema field set to zero.
    pub fn zeroed(schema: &StatSchema) -> Self {
        Self {
            values: vec![0.0; schema.len()],
        }
    }

    /// Build from `(name, value)` pairs. Fields not mentioned stay zero and
    /// names outside the schema are ignored.
    pub fn from_pairs(schema: &StatSchema, pairs: &[(&str, f64)]) -> Self {
        let mut record = Self::zeroed(schema);
        for (name, value) in pairs {
            if let Some(idx) = schema.position(name) {
                record.values[idx] = *value;
            }
        }
        record
    }

    pub(crate) fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn get(&self, schema: &StatSchema, name: &str) -> Option<f64> {
        schema.position(name).and_then(|i| self.values.get(i).copied())
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Averaged stats for one group, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragedStatRecord {
    pub match_count: usize,
    pub stats: Vec<(String, f64)>,
}

impl AveragedStatRecord {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.stats
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

/// Serialized as `{ "match_count": n, "stats": { "<name>": value, ... } }`
/// with stats kept in schema order.
impl Serialize for AveragedStatRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Ordered<'a>(&'a [(String, f64)]);

        impl Serialize for Ordered<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (name, value) in self.0 {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("match_count", &self.match_count)?;
        map.serialize_entry("stats", &Ordered(&self.stats))?;
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// Aggregation bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Overall,
    /// A league season bucket, keyed by `LeagueKey::group_key`.
    League(String),
    /// League-marker championships whose name could not be parsed.
    Unclassified,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Overall => write!(f, "overall"),
            GroupKey::League(key) => write!(f, "{key}"),
            GroupKey::Unclassified => write!(f, "unclassified"),
        }
    }
}

#[derive(Debug, Clone)]
struct GroupAccumulator {
    sum: Vec<f64>,
    count: usize,
}

/// Running sums and counts per group for one pipeline run.
///
/// Owned by a single run and mutated through `&mut self` only, so exactly
/// one writer touches a group's sum and count at a time.
#[derive(Debug, Clone)]
pub struct Aggregator {
    schema: StatSchema,
    groups: BTreeMap<GroupKey, GroupAccumulator>,
}

impl Aggregator {
    pub fn new(schema: StatSchema) -> Self {
        Self {
            schema,
            groups: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &StatSchema {
        &self.schema
    }

    /// Fold one record into `key`, creating the group on first contribution.
    ///
    /// A record that does not match the schema width is rejected and leaves
    /// every group untouched.
    pub fn accumulate(&mut self, key: GroupKey, record: &StatRecord) -> Result<(), AggregateError> {
        let width = self.schema.len();
        if record.values.len() != width {
            return Err(AggregateError::FieldCountMismatch {
                schema: self.schema.name().to_owned(),
                expected: width,
                got: record.values.len(),
            });
        }

        let group = self.groups.entry(key).or_insert_with(|| GroupAccumulator {
            sum: vec![0.0; width],
            count: 0,
        });
        for (sum, value) in group.sum.iter_mut().zip(&record.values) {
            *sum += value;
        }
        group.count += 1;
        Ok(())
    }

    /// Number of records folded into `key` so far.
    pub fn count(&self, key: &GroupKey) -> usize {
        self.groups.get(key).map_or(0, |g| g.count)
    }

    /// Raw running sums for `key`, in schema order.
    pub fn sums(&self, key: &GroupKey) -> Option<&[f64]> {
        self.groups.get(key).map(|g| g.sum.as_slice())
    }

    pub fn group_keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.keys()
    }

    /// Average every group, rounding each field to two decimal places.
    /// Groups with a zero count are left out.
    pub fn finalize(self) -> BTreeMap<GroupKey, AveragedStatRecord> {
        let schema = self.schema;
        self.groups
            .into_iter()
            .filter(|(_, group)| group.count > 0)
            .map(|(key, group)| {
                let divisor = group.count as f64;
                let stats = schema
                    .field_names()
                    .zip(group.sum)
                    .map(|(name, sum)| (name.to_owned(), round2(sum / divisor)))
                    .collect();
                (
                    key,
                    AveragedStatRecord {
                        match_count: group.count,
                        stats,
                    },
                )
            })
            .collect()
    }
}

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
