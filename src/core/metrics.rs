//! Unbiased pass@k estimation.
//!
//! For `n` samples of which `c` passed, the probability that at least one of
//! `k` samples drawn without replacement passes is `1 - C(n-c, k) / C(n, k)`.
//! The ratio is evaluated as `prod_{i=n-c+1}^{n} (1 - k/i)` so no binomial
//! coefficient is ever materialized.

use std::fmt;

use serde::{Serialize, ser::SerializeMap};

use crate::{core::domain::AggregateCounts, error::MetricsError};

/// Sample totals per problem: either one count shared by every problem or one
/// count per problem.
#[derive(Clone, Copy, Debug)]
pub enum Totals<'a> {
    Uniform(usize),
    PerProblem(&'a [usize]),
}

/// pass@k for a single problem.
pub fn estimator(n: usize, c: usize, k: usize) -> f64 {
    if n.saturating_sub(c) < k {
        return 1.0;
    }
    1.0 - ((n - c + 1)..=n)
        .map(|i| 1.0 - k as f64 / i as f64)
        .product::<f64>()
}

/// pass@k for every problem, in input order.
pub fn estimate_pass_at_k(
    totals: Totals<'_>,
    corrects: &[usize],
    k: usize,
) -> Result<Vec<f64>, MetricsError> {
    if k == 0 {
        return Err(MetricsError::ZeroK);
    }

    let estimates = match totals {
        Totals::Uniform(n) => corrects.iter().map(|&c| estimator(n, c, k)).collect(),
        Totals::PerProblem(totals) => {
            if totals.len() != corrects.len() {
                return Err(MetricsError::LengthMismatch {
                    totals: totals.len(),
                    corrects: corrects.len(),
                });
            }
            totals
                .iter()
                .zip(corrects)
                .map(|(&n, &c)| estimator(n, c, k))
                .collect()
        }
    };

    Ok(estimates)
}

/// Reported metrics, ordered as the `k` values were requested.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PassAtK {
    entries: Vec<(usize, f64)>,
}

impl PassAtK {
    /// Averages per-problem estimates for each `k`. A `k` larger than some
    /// problem's sample count is left out of the report.
    pub fn compute(counts: &[AggregateCounts], ks: &[usize]) -> Result<Self, MetricsError> {
        let totals: Vec<usize> = counts.iter().map(|c| c.total).collect();
        let corrects: Vec<usize> = counts.iter().map(|c| c.correct).collect();

        let mut entries = Vec::with_capacity(ks.len());
        for &k in ks {
            if counts.is_empty() || !totals.iter().all(|&n| n >= k) {
                tracing::debug!("Skipping pass@{}: not every problem has {} samples", k, k);
                continue;
            }
            let estimates = estimate_pass_at_k(Totals::PerProblem(&totals), &corrects, k)?;
            let mean = estimates.iter().sum::<f64>() / estimates.len() as f64;
            entries.push((k, mean));
        }

        Ok(Self { entries })
    }

    pub fn get(&self, k: usize) -> Option<f64> {
        self.entries
            .iter()
            .find(|(entry_k, _)| *entry_k == k)
            .map(|(_, score)| *score)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for PassAtK {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, score) in &self.entries {
            map.serialize_entry(&format!("pass@{}", k), score)?;
        }
        map.end()
    }
}

impl fmt::Display for PassAtK {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&body)
    }
}
