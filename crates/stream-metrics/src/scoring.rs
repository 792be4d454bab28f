use crate::models::ZoneTimes;

/// Accumulates one metric over the rows of a stream.
pub trait StreamMetric {
    type Sample;
    type Score;
    fn next_sample(&mut self, sample: Self::Sample);
    fn finish(&self) -> Self::Score;
}

/// Mean of a value weighted by the duration each sample represents.
///
/// Samples without a value are left out of both sums rather than counted
/// with zero weight. The mean is undefined (`None`) when the included weights
/// sum to zero, which covers an empty input.
#[derive(Debug, Clone, Default)]
pub struct TimeWeightedMean {
    weighted_sum: f64,
    total_weight: f64,
}

impl StreamMetric for TimeWeightedMean {
    type Sample = (Option<f64>, f64);
    type Score = Option<f64>;

    fn next_sample(&mut self, (value, weight): (Option<f64>, f64)) {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return;
        };
        self.weighted_sum += value * weight;
        self.total_weight += weight;
    }

    fn finish(&self) -> Option<f64> {
        if self.total_weight == 0.0 {
            return None;
        }
        Some(self.weighted_sum / self.total_weight)
    }
}

/// Duration-weighted mean over `(value, weight)` pairs.
pub fn time_weighted_average<I>(samples: I) -> Option<f64>
where
    I: IntoIterator<Item = (Option<f64>, f64)>,
{
    let mut mean = TimeWeightedMean::default();
    for sample in samples {
        mean.next_sample(sample);
    }
    mean.finish()
}

/// Total duration spent in each heart rate zone.
#[derive(Debug, Clone, Default)]
pub struct ZoneTimeMetric {
    times: ZoneTimes,
}

impl StreamMetric for ZoneTimeMetric {
    type Sample = (u8, f64);
    type Score = ZoneTimes;

    fn next_sample(&mut self, (zone, dt): (u8, f64)) {
        self.times.add(zone, dt);
    }

    fn finish(&self) -> ZoneTimes {
        self.times
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_average() {
        let avg = time_weighted_average([(Some(100.0), 1.0), (Some(160.0), 3.0)]).unwrap();
        assert!((avg - 145.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_row_with_unit_weight() {
        assert_eq!(time_weighted_average([(Some(137.0), 1.0)]), Some(137.0));
    }

    #[test]
    fn test_missing_values_are_excluded_not_zero_weighted() {
        let avg = time_weighted_average([(Some(120.0), 2.0), (None, 10.0), (Some(150.0), 2.0)]);
        assert_eq!(avg, Some(135.0));
    }

    #[test]
    fn test_undefined_results() {
        assert_eq!(time_weighted_average(std::iter::empty()), None);
        assert_eq!(time_weighted_average([(Some(120.0), 0.0), (Some(130.0), 0.0)]), None);
        assert_eq!(time_weighted_average([(None, 1.0), (None, 5.0)]), None);
    }

    #[test]
    fn test_zone_times_accumulate() {
        let mut metric = ZoneTimeMetric::default();
        for sample in [(0, 1.0), (3, 2.0), (3, 4.0), (5, 0.5)] {
            metric.next_sample(sample);
        }
        let times = metric.finish();
        assert_eq!(times.as_array(), &[1.0, 0.0, 0.0, 6.0, 0.0, 0.5]);
        assert!((times.total() - 7.5).abs() < 1e-9);
    }
}
