//! Loading recorded activity streams from the data directory.
//!
//! Streams are stored per user as Strava stream JSON
//! (`streams/<user_id>/<activity_id>.json`). Activities that were only
//! exported as GPX (`gpx/<user_id>/<activity_id>.gpx`) are read as a fallback.

use std::{
    collections::BTreeSet,
    fs::{self, File},
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use geo::{Distance as _, Haversine, geometry::Point};
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    errors::{MetricsError, Result},
    models::{ALTITUDE, DISTANCE, LAT, LON, StreamTable, TIME, TimeColumn},
};

/// Source of activity streams.
pub trait StreamLoader {
    /// Returns the stream sorted ascending by time, or
    /// [`MetricsError::NotFound`] if the user has no stream for the activity.
    fn load(&self, activity_id: i64, user_id: Uuid) -> Result<StreamTable>;
}

#[derive(Debug, Clone)]
pub struct FileStreamLoader {
    data_dir: PathBuf,
}

impl FileStreamLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn stream_path(&self, activity_id: i64, user_id: Uuid) -> PathBuf {
        self.data_dir
            .join("streams")
            .join(user_id.to_string())
            .join(format!("{activity_id}.json"))
    }

    pub fn gpx_path(&self, activity_id: i64, user_id: Uuid) -> PathBuf {
        self.data_dir
            .join("gpx")
            .join(user_id.to_string())
            .join(format!("{activity_id}.gpx"))
    }

    /// Ids of every activity the user has a stream or GPX file for, ascending.
    pub fn activity_ids(&self, user_id: Uuid) -> Result<Vec<i64>> {
        let mut ids = BTreeSet::new();
        for (dir, extension) in [("streams", "json"), ("gpx", "gpx")] {
            let user_dir = self.data_dir.join(dir).join(user_id.to_string());
            let entries = match fs::read_dir(&user_dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            for entry in entries {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some(extension) {
                    continue;
                }
                match path.file_stem().and_then(|s| s.to_str()).map(str::parse) {
                    Some(Ok(id)) => {
                        ids.insert(id);
                    }
                    _ => debug!("Ignoring {}", path.display()),
                }
            }
        }
        Ok(ids.into_iter().collect())
    }
}

impl StreamLoader for FileStreamLoader {
    fn load(&self, activity_id: i64, user_id: Uuid) -> Result<StreamTable> {
        let stream_path = self.stream_path(activity_id, user_id);
        if stream_path.is_file() {
            debug!("Loading stream {}", stream_path.display());
            return read_stream_json(&stream_path);
        }

        let gpx_path = self.gpx_path(activity_id, user_id);
        if gpx_path.is_file() {
            debug!("Loading GPX track {}", gpx_path.display());
            return read_gpx(&gpx_path);
        }

        Err(MetricsError::NotFound {
            activity_id,
            user_id,
        })
    }
}

/// Reads a Strava stream JSON file.
pub fn read_stream_json(path: &Path) -> Result<StreamTable> {
    let file = File::open(path)?;
    let raw: Value = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| MetricsError::malformed(path, e.to_string()))?;
    parse_stream_json(raw).map_err(|message| MetricsError::malformed(path, message))
}

/// Converts parsed stream JSON into a table sorted by time.
///
/// Accepts both the keyed form (`{"time": {"data": [...]}, ...}`) and the
/// list form (`[{"type": "time", "data": [...]}, ...]`). Streams without a
/// `data` array are skipped, `latlng` is split into `lat` and `lon`, and cells
/// that are not numbers become missing values. Rows without a time cannot be
/// ordered and are dropped.
pub fn parse_stream_json(raw: Value) -> Result<StreamTable, String> {
    let streams: Vec<(String, Vec<Value>)> = match raw {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(name, stream)| stream_data(stream).map(|data| (name, data)))
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|stream| {
                let name = stream.get("type")?.as_str()?.to_string();
                stream_data(stream).map(|data| (name, data))
            })
            .collect(),
        _ => return Err("expected an object or array of streams".to_string()),
    };

    let mut time_cells = None;
    let mut columns = Vec::new();
    for (name, data) in streams {
        match name.as_str() {
            TIME => time_cells = Some(data),
            "latlng" => {
                let (lat, lon): (Vec<_>, Vec<_>) = data.iter().map(latlng_cell).unzip();
                columns.push((LAT.to_string(), lat));
                columns.push((LON.to_string(), lon));
            }
            _ => columns.push((name, data.iter().map(numeric_cell).collect())),
        }
    }

    let len = time_cells
        .as_ref()
        .map(Vec::len)
        .or_else(|| columns.first().map(|(_, values)| values.len()))
        .unwrap_or(0);
    if let Some((name, values)) = columns.iter().find(|(_, values)| values.len() != len) {
        return Err(format!(
            "stream '{name}' has {} samples, expected {len}",
            values.len()
        ));
    }

    let Some(time_cells) = time_cells else {
        let mut table = StreamTable::with_len(len);
        for (name, values) in columns {
            table.insert_column(name, values).map_err(|e| e.to_string())?;
        }
        return Ok(table);
    };

    let (time, keep) = parse_time_cells(&time_cells)?;
    let dropped = keep.iter().filter(|&&k| !k).count();
    if dropped > 0 {
        warn!("Dropping {dropped} samples without a time");
    }

    let mut table = StreamTable::from_time(time);
    for (name, values) in columns {
        let values = if dropped > 0 {
            crate::models::select_rows(&values, &keep)
        } else {
            values
        };
        table.insert_column(name, values).map_err(|e| e.to_string())?;
    }
    Ok(table.sorted_by_time())
}

fn stream_data(stream: Value) -> Option<Vec<Value>> {
    match stream {
        Value::Object(mut fields) => match fields.remove("data") {
            Some(Value::Array(data)) => Some(data),
            _ => None,
        },
        _ => None,
    }
}

fn numeric_cell(cell: &Value) -> Option<f64> {
    match cell {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn latlng_cell(cell: &Value) -> (Option<f64>, Option<f64>) {
    match cell.as_array().map(Vec::as_slice) {
        Some([lat, lon]) => (lat.as_f64(), lon.as_f64()),
        _ => (None, None),
    }
}

/// Parses time cells as elapsed seconds or RFC 3339 timestamps, whichever the
/// first present cell is. Returns the present times and a keep-mask over the
/// input cells.
fn parse_time_cells(cells: &[Value]) -> Result<(TimeColumn, Vec<bool>), String> {
    let absolute = matches!(cells.iter().find(|c| !c.is_null()), Some(Value::String(_)));

    if absolute {
        let parsed = cells
            .iter()
            .map(|cell| match cell {
                Value::String(s) => OffsetDateTime::parse(s, &Rfc3339)
                    .map(Some)
                    .map_err(|e| format!("invalid timestamp '{s}': {e}")),
                Value::Null => Ok(None),
                other => Err(format!("expected a timestamp, got {other}")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let keep = parsed.iter().map(Option::is_some).collect();
        Ok((TimeColumn::Absolute(parsed.into_iter().flatten().collect()), keep))
    } else {
        let parsed: Vec<Option<f64>> = cells.iter().map(Value::as_f64).collect();
        let keep = parsed.iter().map(Option::is_some).collect();
        Ok((TimeColumn::Elapsed(parsed.into_iter().flatten().collect()), keep))
    }
}

/// Reads a GPX track into a stream with absolute times, position, altitude
/// and cumulative distance. Points without a timestamp are skipped unless the
/// track has no timestamps at all.
pub fn read_gpx(path: &Path) -> Result<StreamTable> {
    let file = File::open(path)?;
    let gpx = gpx::read(BufReader::new(file))
        .map_err(|e| MetricsError::GpxParsing(format!("{}: {e}", path.display())))?;

    let points: Vec<&gpx::Waypoint> = gpx
        .tracks
        .iter()
        .flat_map(|track| &track.segments)
        .flat_map(|seg| &seg.points)
        .collect();
    let timed = points.iter().any(|pt| pt.time.is_some());

    let mut times = Vec::new();
    let mut lat = Vec::new();
    let mut lon = Vec::new();
    let mut altitude = Vec::new();
    let mut distance = Vec::new();
    let mut total_distance = 0.0;
    let mut last_point: Option<Point> = None;

    for pt in points {
        if timed {
            let Some(time) = pt.time else {
                continue;
            };
            times.push(OffsetDateTime::from(time));
        }
        total_distance += last_point.map_or(0.0, |prev| Haversine.distance(prev, pt.point()));
        last_point = Some(pt.point());

        lat.push(Some(pt.point().y()));
        lon.push(Some(pt.point().x()));
        altitude.push(pt.elevation);
        distance.push(Some(total_distance));
    }

    let mut table = if timed {
        StreamTable::from_time(TimeColumn::Absolute(times))
    } else {
        StreamTable::with_len(lat.len())
    };
    table.insert_column(LAT, lat)?;
    table.insert_column(LON, lon)?;
    table.insert_column(DISTANCE, distance)?;
    if altitude.iter().any(Option::is_some) {
        table.insert_column(ALTITUDE, altitude)?;
    }
    Ok(table.sorted_by_time())
}
