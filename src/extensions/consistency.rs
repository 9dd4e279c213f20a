use crate::{check_threshold, interpolate_at_zero, sort_points, Point, Reconstruction, SssError};

/// Outcome of reconstructing from every window of `k` consecutive shares
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// One reconstruction per window, in ascending order of the window's first `x`
    pub window_secrets: Vec<Reconstruction>,
    /// All windows were exact and agreed on the secret
    pub consistent: bool,
}

impl ConsistencyReport {
    /// Indices of the windows whose secret differs from the first window's
    pub fn disagreeing_windows(&self) -> Vec<usize> {
        let Some(first) = self.window_secrets.first() else {
            return Vec::new();
        };
        self.window_secrets
            .iter()
            .enumerate()
            .filter(|(_, window)| !window.is_exact() || window.secret != first.secret)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Reconstructs the secret from each run of `threshold` consecutive points
/// (after sorting by `x`) and reports whether they all agree.
///
/// Only the `m - k + 1` contiguous windows are compared, not every `k`-subset
/// of the `m` points.
///
/// With exactly `threshold` points there is a single window, which is
/// consistent iff it interpolates exactly. Any disagreement means at least one
/// share is off the polynomial.
pub fn verify_consistency(
    points: &[Point],
    threshold: usize,
) -> Result<ConsistencyReport, SssError> {
    check_threshold(points.len(), threshold)?;

    let sorted = sort_points(points.to_vec())?;
    let window_secrets = sorted
        .windows(threshold)
        .map(|window| interpolate_at_zero(window, threshold))
        .collect::<Result<Vec<_>, _>>()?;

    let mut report = ConsistencyReport {
        window_secrets,
        consistent: false,
    };
    report.consistent = report.disagreeing_windows().is_empty();

    if !report.consistent {
        log::warn!(
            "share windows {:?} disagree with the first window of {} shares",
            report.disagreeing_windows(),
            threshold
        );
    }

    Ok(report)
}
