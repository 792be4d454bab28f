use std::{collections::BTreeMap, str::FromStr};

use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::errors::{MetricsError, Result};

pub const TIME: &str = "time";
pub const ALTITUDE: &str = "altitude";
pub const HEARTRATE: &str = "heartrate";
pub const LAT: &str = "lat";
pub const LON: &str = "lon";
pub const DISTANCE: &str = "distance";

/// Number of heart rate zones, including the sub-threshold zone 0.
pub const ZONE_COUNT: usize = 6;

/// The `time` column of a stream, either as offsets from the start of the
/// recording or as wall-clock instants.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeColumn {
    Elapsed(Vec<f64>),
    Absolute(Vec<OffsetDateTime>),
}

impl TimeColumn {
    pub fn len(&self) -> usize {
        match self {
            TimeColumn::Elapsed(values) => values.len(),
            TimeColumn::Absolute(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seconds since the first sample. Elapsed columns are returned as-is.
    pub fn elapsed_seconds(&self) -> Vec<f64> {
        match self {
            TimeColumn::Elapsed(values) => values.clone(),
            TimeColumn::Absolute(values) => match values.first() {
                Some(&start) => values
                    .iter()
                    .map(|&t| (t - start).as_seconds_f64())
                    .collect(),
                None => Vec::new(),
            },
        }
    }

    /// Indices that order the column ascending. Stable for equal times.
    fn sort_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        match self {
            TimeColumn::Elapsed(values) => order.sort_by(|&a, &b| values[a].total_cmp(&values[b])),
            TimeColumn::Absolute(values) => order.sort_by_key(|&i| values[i]),
        }
        order
    }

    fn reorder(&self, order: &[usize]) -> Self {
        match self {
            TimeColumn::Elapsed(values) => {
                TimeColumn::Elapsed(order.iter().map(|&i| values[i]).collect())
            }
            TimeColumn::Absolute(values) => {
                TimeColumn::Absolute(order.iter().map(|&i| values[i]).collect())
            }
        }
    }
}

/// A recorded activity as a column-oriented table.
///
/// Every column holds exactly one cell per row. Numeric cells are optional
/// since sensors drop out mid-recording; a column that was never recorded is
/// absent from the table altogether.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamTable {
    len: usize,
    time: Option<TimeColumn>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl StreamTable {
    /// An empty table with `len` rows and no columns.
    pub fn with_len(len: usize) -> Self {
        Self {
            len,
            ..Default::default()
        }
    }

    pub fn from_time(time: TimeColumn) -> Self {
        Self {
            len: time.len(),
            time: Some(time),
            columns: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) a numeric column. The length must match the table.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<()> {
        let name = name.into();
        if name == TIME {
            return Err(MetricsError::validation(
                "the time column must be set through TimeColumn",
            ));
        }
        if self.time.is_none() && self.columns.is_empty() {
            self.len = values.len();
        } else if values.len() != self.len {
            return Err(MetricsError::validation(format!(
                "column '{name}' has {} rows, expected {}",
                values.len(),
                self.len
            )));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn time(&self) -> Option<&TimeColumn> {
        self.time.as_ref()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn has_column(&self, name: &str) -> bool {
        if name == TIME {
            self.time.is_some()
        } else {
            self.columns.contains_key(name)
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.time
            .as_ref()
            .map(|_| TIME)
            .into_iter()
            .chain(self.columns.keys().map(String::as_str))
    }

    /// Returns the table ordered ascending by time. Rows with equal times keep
    /// their relative order. Tables without a time column are returned as-is.
    pub fn sorted_by_time(self) -> Self {
        let Some(time) = &self.time else {
            return self;
        };
        let order = time.sort_order();
        if order.windows(2).all(|w| w[0] < w[1]) {
            return self;
        }

        Self {
            len: self.len,
            time: Some(time.reorder(&order)),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), order.iter().map(|&i| values[i]).collect()))
                .collect(),
        }
    }
}

pub(crate) fn select_rows<T: Clone>(values: &[T], keep: &[bool]) -> Vec<T> {
    values
        .iter()
        .zip(keep)
        .filter(|(_, k)| **k)
        .map(|(v, _)| v.clone())
        .collect()
}

/// Elevation trend of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    Uphill,
    Downhill,
}

/// A user's health profile as supplied by the caller.
///
/// Only `max_heartrate` is interpreted; other keys are carried untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthMetrics(Map<String, Value>);

impl HealthMetrics {
    pub const MAX_HEARTRATE: &'static str = "max_heartrate";

    pub fn with_max_heartrate(max_heartrate: f64) -> Self {
        let mut fields = Map::new();
        fields.insert(Self::MAX_HEARTRATE.to_string(), Value::from(max_heartrate));
        Self(fields)
    }

    pub fn max_heartrate(&self) -> Option<&Value> {
        self.0.get(Self::MAX_HEARTRATE)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HealthMetricsParseError {
    #[error("health metrics must be valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("health metrics must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

impl FromStr for HealthMetrics {
    type Err = HealthMetricsParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match serde_json::from_str::<Value>(s)? {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(HealthMetricsParseError::NotAnObject(json_kind(&other))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Seconds spent in each heart rate zone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZoneTimes([f64; ZONE_COUNT]);

impl ZoneTimes {
    pub fn new(seconds: [f64; ZONE_COUNT]) -> Self {
        Self(seconds)
    }

    pub fn add(&mut self, zone: u8, seconds: f64) {
        if let Some(slot) = self.0.get_mut(usize::from(zone)) {
            *slot += seconds;
        }
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn as_array(&self) -> &[f64; ZONE_COUNT] {
        &self.0
    }

    pub fn key(zone: usize) -> String {
        format!("zone_{zone}_time")
    }
}

impl Serialize for ZoneTimes {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ZONE_COUNT))?;
        for (zone, seconds) in self.0.iter().enumerate() {
            map.serialize_entry(&Self::key(zone), seconds)?;
        }
        map.end()
    }
}

/// Metrics derived from one activity stream.
///
/// Optional metrics are only present when the stream carried the columns
/// they are computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsResult {
    pub analyzed_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uphill_heartrate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downhill_heartrate: Option<f64>,
    #[serde(flatten)]
    pub zone_times: Option<ZoneTimes>,
}

impl MetricsResult {
    pub fn new(analyzed_at: String) -> Self {
        Self {
            analyzed_at,
            uphill_heartrate: None,
            downhill_heartrate: None,
            zone_times: None,
        }
    }
}
