pub struct StatsHelper;

impl StatsHelper {
    /// Smallest and largest finite sample, or `None` when there are none.
    pub fn min_max(samples: &[f32]) -> Option<(f32, f32)> {
        samples
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
