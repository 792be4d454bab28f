//! Uphill/downhill segmentation of an altitude profile.
//!
//! Summits and valleys are located with a topographic prominence filter so
//! that GPS noise and small undulations do not split a climb. Every sample
//! between two consecutive extrema gets the trend of that stretch.

use tracing::debug;

use crate::{
    errors::{MetricsError, Result},
    models::{ALTITUDE, Segment, StreamTable},
};

/// Default minimum prominence, in altitude units.
pub const DEFAULT_PROMINENCE: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentLabeler {
    prominence: f64,
}

impl Default for SegmentLabeler {
    fn default() -> Self {
        Self {
            prominence: DEFAULT_PROMINENCE,
        }
    }
}

impl SegmentLabeler {
    pub fn new(prominence: f64) -> Result<Self> {
        if !prominence.is_finite() || prominence < 0.0 {
            return Err(MetricsError::validation(format!(
                "prominence must be a non-negative number, got {prominence}"
            )));
        }
        Ok(Self { prominence })
    }

    /// Labels each row of the table's altitude column.
    ///
    /// Gaps in the altitude column are filled from the previous known value
    /// (leading gaps from the first known value).
    pub fn label_table(&self, table: &StreamTable) -> Result<Vec<Segment>> {
        let column = table
            .column(ALTITUDE)
            .ok_or_else(|| MetricsError::validation("missing altitude column 'altitude'"))?;
        let altitude = fill_gaps(column).ok_or_else(|| {
            MetricsError::validation("altitude column has no recorded values")
        })?;
        Ok(self.label(&altitude))
    }

    /// Labels every sample as uphill or downhill.
    ///
    /// Ranges between consecutive extrema are closed, so each interior
    /// extremum belongs to two ranges; it keeps the label of the later one.
    pub fn label(&self, altitude: &[f64]) -> Vec<Segment> {
        let mut labels = vec![Segment::Downhill; altitude.len()];
        let extrema = self.extrema(altitude);

        for pair in extrema.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let label = if altitude[end] > altitude[start] {
                Segment::Uphill
            } else {
                Segment::Downhill
            };
            labels[start..=end].fill(label);
        }

        labels
    }

    /// Indices of the first sample, every sufficiently prominent summit and
    /// valley, and the last sample, ascending and without duplicates.
    pub fn extrema(&self, altitude: &[f64]) -> Vec<usize> {
        let Some(last) = altitude.len().checked_sub(1) else {
            return Vec::new();
        };

        let peaks = prominent_peaks(altitude, self.prominence);
        let negated: Vec<f64> = altitude.iter().map(|a| -a).collect();
        let valleys = prominent_peaks(&negated, self.prominence);
        debug!(
            peaks = peaks.len(),
            valleys = valleys.len(),
            prominence = self.prominence,
            "detected altitude extrema"
        );

        let mut extrema = Vec::with_capacity(peaks.len() + valleys.len() + 2);
        extrema.push(0);
        extrema.extend(peaks);
        extrema.extend(valleys);
        extrema.push(last);
        extrema.sort_unstable();
        extrema.dedup();
        extrema
    }
}

/// Local maxima whose prominence is at least `min_prominence`.
fn prominent_peaks(x: &[f64], min_prominence: f64) -> Vec<usize> {
    local_maxima(x)
        .into_iter()
        .filter(|&peak| prominence(x, peak) >= min_prominence)
        .collect()
}

/// Interior local maxima. A flat top counts once, at its middle sample
/// (rounded down); plateaus touching either end of the series are ignored.
fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }

    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < i_max && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }

    peaks
}

/// Vertical distance between a peak and the higher of the two lowest points
/// reached on either side before the series climbs above the peak.
fn prominence(x: &[f64], peak: usize) -> f64 {
    let height = x[peak];

    let left_min = x[..=peak]
        .iter()
        .rev()
        .take_while(|&&v| v <= height)
        .fold(height, |min, &v| min.min(v));
    let right_min = x[peak..]
        .iter()
        .take_while(|&&v| v <= height)
        .fold(height, |min, &v| min.min(v));

    height - left_min.max(right_min)
}

/// Carries the last known value forward over missing cells. Returns `None`
/// when no cell holds a value.
fn fill_gaps(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let first = values.iter().flatten().copied().next()?;
    let mut last = first;
    Some(
        values
            .iter()
            .map(|v| {
                if let Some(v) = v {
                    last = *v;
                }
                last
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeColumn;

    use Segment::{Downhill, Uphill};

    fn labeler(prominence: f64) -> SegmentLabeler {
        SegmentLabeler::new(prominence).unwrap()
    }

    #[test]
    fn test_single_hill_boundary_goes_to_later_segment() {
        let altitude = [100.0, 100.0, 150.0, 100.0, 100.0];
        let labeler = labeler(10.0);
        assert_eq!(labeler.extrema(&altitude), vec![0, 2, 4]);
        assert_eq!(
            labeler.label(&altitude),
            vec![Uphill, Uphill, Downhill, Downhill, Downhill]
        );
    }

    #[test]
    fn test_small_undulations_are_suppressed() {
        let altitude = [0.0, 10.0, 5.0, 50.0, 45.0, 100.0, 0.0];
        let labeler = labeler(30.0);
        assert_eq!(labeler.extrema(&altitude), vec![0, 5, 6]);
        assert_eq!(
            labeler.label(&altitude),
            vec![Uphill, Uphill, Uphill, Uphill, Uphill, Downhill, Downhill]
        );

        // With a low threshold the bumps become their own segments.
        assert_eq!(labeler_extrema(1.0, &altitude), vec![0, 1, 2, 3, 4, 5, 6]);
    }

    fn labeler_extrema(prominence: f64, altitude: &[f64]) -> Vec<usize> {
        labeler(prominence).extrema(altitude)
    }

    #[test]
    fn test_valley_between_two_climbs() {
        let altitude = [200.0, 150.0, 100.0, 150.0, 220.0, 180.0, 120.0, 160.0, 260.0];
        let labeler = labeler(30.0);
        assert_eq!(labeler.extrema(&altitude), vec![0, 2, 4, 6, 8]);
        assert_eq!(
            labeler.label(&altitude),
            vec![Downhill, Downhill, Uphill, Uphill, Downhill, Downhill, Uphill, Uphill, Uphill]
        );
    }

    #[test]
    fn test_plateau_peak_uses_middle_index() {
        assert_eq!(local_maxima(&[0.0, 5.0, 5.0, 5.0, 0.0]), vec![2]);
        assert_eq!(local_maxima(&[0.0, 5.0, 5.0, 0.0]), vec![1]);
        // Plateau running into the end of the series is not a peak.
        assert!(local_maxima(&[0.0, 5.0, 5.0, 5.0]).is_empty());
    }

    #[test]
    fn test_prominence_measures_lower_side() {
        let x = [0.0, 80.0, 60.0, 100.0, 20.0];
        assert_eq!(prominence(&x, 3), 80.0);
        assert_eq!(prominence(&x, 1), 20.0);
    }

    #[test]
    fn test_output_length_and_boundary_extrema() {
        let labeler = SegmentLabeler::default();
        for altitude in [
            vec![],
            vec![10.0],
            vec![10.0, 20.0],
            vec![5.0, 5.0, 5.0, 5.0],
            vec![0.0, 40.0, 0.0, 40.0, 0.0, 40.0],
        ] {
            let labels = labeler.label(&altitude);
            assert_eq!(labels.len(), altitude.len());

            let extrema = labeler.extrema(&altitude);
            if !altitude.is_empty() {
                assert_eq!(extrema.first(), Some(&0));
                assert_eq!(extrema.last(), Some(&(altitude.len() - 1)));
            }
        }
    }

    #[test]
    fn test_degenerate_series() {
        let labeler = SegmentLabeler::default();
        assert!(labeler.label(&[]).is_empty());
        assert_eq!(labeler.label(&[42.0]), vec![Downhill]);
        assert_eq!(labeler.label(&[1.0, 2.0]), vec![Uphill, Uphill]);
        assert_eq!(labeler.label(&[3.0, 3.0, 3.0]), vec![Downhill; 3]);
    }

    #[test]
    fn test_label_table_requires_altitude() {
        let table = StreamTable::from_time(TimeColumn::Elapsed(vec![0.0, 1.0]));
        assert!(matches!(
            SegmentLabeler::default().label_table(&table),
            Err(MetricsError::Validation(_))
        ));
    }

    #[test]
    fn test_label_table_fills_altitude_gaps() {
        let table = StreamTable::from_time(TimeColumn::Elapsed(vec![0.0, 1.0, 2.0, 3.0]))
            .with_column(ALTITUDE, vec![None, Some(10.0), None, Some(50.0)])
            .unwrap();
        let labels = labeler(5.0).label_table(&table).unwrap();
        assert_eq!(labels, vec![Uphill; 4]);
    }

    #[test]
    fn test_fill_gaps() {
        assert_eq!(
            fill_gaps(&[None, Some(3.0), None, Some(1.0), None]),
            Some(vec![3.0, 3.0, 3.0, 1.0, 1.0])
        );
        assert_eq!(fill_gaps(&[None, None]), None);
    }

    #[test]
    fn test_invalid_prominence_rejected() {
        assert!(SegmentLabeler::new(-1.0).is_err());
        assert!(SegmentLabeler::new(f64::NAN).is_err());
        assert!(SegmentLabeler::new(0.0).is_ok());
    }
}
