//! Group hypothesis tests used as search objectives.
//!
//! Every function returns the p-value of its test. Degenerate inputs where
//! the statistic is undefined (no variance anywhere) resolve to a p-value
//! instead of NaN so costs stay totally ordered: equal groups give 1.0,
//! groups that differ without any spread give 0.0 in the tested direction.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};
use std::cmp::Ordering;
use thiserror::Error;

/// Largest group size for which the Mann-Whitney U test uses the exact
/// permutation distribution instead of the normal approximation.
pub const MWU_EXACT_MAX_GROUP: usize = 8;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("group '{0}' has no samples")]
    EmptyGroup(String),

    #[error("group '{group}' has {found} samples, at least {required} required")]
    TooFewSamples {
        group: String,
        required: usize,
        found: usize,
    },

    #[error("distribution error: {0}")]
    Distribution(String),
}

/// Alternative hypothesis for the two-group tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alternative {
    TwoSided,
    /// Group A tends to be larger than group B.
    Greater,
    /// Group A tends to be smaller than group B.
    Less,
}

pub fn require_samples(group: &str, values: &[f64], required: usize) -> Result<(), StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptyGroup(group.to_string()));
    }
    if values.len() < required {
        return Err(StatsError::TooFewSamples {
            group: group.to_string(),
            required,
            found: values.len(),
        });
    }
    Ok(())
}

fn positional_name(index: usize) -> String {
    format!("#{}", index + 1)
}

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = if values.len() > 1 {
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
    } else {
        0.0
    };
    (mean, variance)
}

/// Average ranks (1-based) in input order, plus the size of every tie block.
fn midranks(values: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; n];
    let mut ties = Vec::new();
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let rank = (i + j + 2) as f64 / 2.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        ties.push(j - i + 1);
        i = j + 1;
    }

    (ranks, ties)
}

fn tie_term(ties: &[usize]) -> f64 {
    ties.iter().map(|&t| (t * t * t - t) as f64).sum()
}

fn degenerate_p_value(difference: f64, alternative: Alternative) -> f64 {
    if difference == 0.0 {
        return 1.0;
    }
    match alternative {
        Alternative::TwoSided => 0.0,
        Alternative::Greater => if difference > 0.0 { 0.0 } else { 1.0 },
        Alternative::Less => if difference < 0.0 { 0.0 } else { 1.0 },
    }
}

/// Mann-Whitney U test of `a` against `b`.
///
/// Small groups use the exact permutation distribution of the rank sum,
/// conditional on the observed ties. Larger groups use the normal
/// approximation with tie and continuity corrections.
pub fn mann_whitney_u(a: &[f64], b: &[f64], alternative: Alternative) -> Result<f64, StatsError> {
    require_samples("A", a, 1)?;
    require_samples("B", b, 1)?;

    let n1 = a.len();
    let n2 = b.len();
    let pooled: Vec<f64> = a.iter().chain(b.iter()).copied().collect();
    let (ranks, ties) = midranks(&pooled);

    if n1 <= MWU_EXACT_MAX_GROUP && n2 <= MWU_EXACT_MAX_GROUP {
        return Ok(exact_rank_sum_p_value(&ranks, n1, alternative));
    }

    let rank_sum: f64 = ranks[..n1].iter().sum();
    let u1 = rank_sum - (n1 * (n1 + 1)) as f64 / 2.0;

    let n1f = n1 as f64;
    let n2f = n2 as f64;
    let n = n1f + n2f;
    let mean_u = n1f * n2f / 2.0;
    let variance = n1f * n2f / 12.0 * ((n + 1.0) - tie_term(&ties) / (n * (n - 1.0)));
    if variance <= 0.0 {
        return Ok(1.0);
    }

    let u2 = n1f * n2f - u1;
    let u = match alternative {
        Alternative::Greater => u1,
        Alternative::Less => u2,
        Alternative::TwoSided => u1.max(u2),
    };
    let z = (u - mean_u - 0.5) / variance.sqrt();

    let normal = Normal::new(0.0, 1.0).map_err(|e| StatsError::Distribution(e.to_string()))?;
    let mut p_value = normal.sf(z);
    if alternative == Alternative::TwoSided {
        p_value *= 2.0;
    }
    Ok(p_value.clamp(0.0, 1.0))
}

/// Exact tail probability of the first `n1` ranks' sum over all ways of
/// drawing `n1` of the pooled ranks. Ranks are doubled so mid-ranks count
/// as integers.
fn exact_rank_sum_p_value(ranks: &[f64], n1: usize, alternative: Alternative) -> f64 {
    let doubled: Vec<usize> = ranks.iter().map(|r| (r * 2.0).round() as usize).collect();
    let max_sum: usize = doubled.iter().sum();

    let mut counts = vec![vec![0u64; max_sum + 1]; n1 + 1];
    counts[0][0] = 1;
    for &d in &doubled {
        for k in (1..=n1).rev() {
            for s in (d..=max_sum).rev() {
                counts[k][s] += counts[k - 1][s - d];
            }
        }
    }

    let distribution = &counts[n1];
    let total: u64 = distribution.iter().sum();
    let observed: usize = doubled[..n1].iter().sum();
    let upper: u64 = distribution[observed..].iter().sum();
    let lower: u64 = distribution[..=observed].iter().sum();

    let p_value = match alternative {
        Alternative::Greater => upper as f64 / total as f64,
        Alternative::Less => lower as f64 / total as f64,
        Alternative::TwoSided => 2.0 * upper.min(lower) as f64 / total as f64,
    };
    p_value.min(1.0)
}

/// Welch's unequal-variance t-test of `a` against `b`.
pub fn welch_t(a: &[f64], b: &[f64], alternative: Alternative) -> Result<f64, StatsError> {
    require_samples("A", a, 2)?;
    require_samples("B", b, 2)?;

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let (mean_a, var_a) = mean_and_variance(a);
    let (mean_b, var_b) = mean_and_variance(b);

    let se_a = var_a / n1;
    let se_b = var_b / n2;
    let se_sq = se_a + se_b;
    if se_sq <= 0.0 {
        return Ok(degenerate_p_value(mean_a - mean_b, alternative));
    }

    let t = (mean_a - mean_b) / se_sq.sqrt();
    let df = se_sq.powi(2) / (se_a.powi(2) / (n1 - 1.0) + se_b.powi(2) / (n2 - 1.0));

    let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| StatsError::Distribution(e.to_string()))?;
    let p_value = match alternative {
        Alternative::Greater => dist.sf(t),
        Alternative::Less => dist.cdf(t),
        Alternative::TwoSided => 2.0 * dist.sf(t.abs()),
    };
    Ok(p_value.clamp(0.0, 1.0))
}

/// One-way ANOVA F-test across all groups.
pub fn one_way_anova(groups: &[&[f64]]) -> Result<f64, StatsError> {
    for (i, group) in groups.iter().enumerate() {
        require_samples(&positional_name(i), group, 1)?;
    }

    let k = groups.len();
    let total: usize = groups.iter().map(|g| g.len()).sum();
    if total <= k {
        return Err(StatsError::TooFewSamples {
            group: "all groups".to_string(),
            required: k + 1,
            found: total,
        });
    }

    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / total as f64;
    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in groups {
        let mean = group.iter().sum::<f64>() / group.len() as f64;
        ss_between += group.len() as f64 * (mean - grand_mean).powi(2);
        ss_within += group.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    }

    let df_between = (k - 1) as f64;
    let df_within = (total - k) as f64;
    let ms_within = ss_within / df_within;
    if ms_within <= 0.0 {
        return Ok(if ss_between > 0.0 { 0.0 } else { 1.0 });
    }

    let f = (ss_between / df_between) / ms_within;
    let dist = FisherSnedecor::new(df_between, df_within)
        .map_err(|e| StatsError::Distribution(e.to_string()))?;
    Ok(dist.sf(f).clamp(0.0, 1.0))
}

/// Kruskal-Wallis H-test across all groups, tie corrected.
pub fn kruskal_wallis(groups: &[&[f64]]) -> Result<f64, StatsError> {
    for (i, group) in groups.iter().enumerate() {
        require_samples(&positional_name(i), group, 1)?;
    }

    let pooled: Vec<f64> = groups.iter().flat_map(|g| g.iter()).copied().collect();
    let n = pooled.len() as f64;
    let (ranks, ties) = midranks(&pooled);

    let mut offset = 0;
    let mut weighted = 0.0;
    for group in groups {
        let rank_sum: f64 = ranks[offset..offset + group.len()].iter().sum();
        weighted += rank_sum * rank_sum / group.len() as f64;
        offset += group.len();
    }

    let h = 12.0 / (n * (n + 1.0)) * weighted - 3.0 * (n + 1.0);
    let correction = 1.0 - tie_term(&ties) / (n * n * n - n);
    if correction <= 0.0 {
        return Ok(1.0);
    }

    let dist = ChiSquared::new((groups.len() - 1) as f64)
        .map_err(|e| StatsError::Distribution(e.to_string()))?;
    Ok(dist.sf(h / correction).clamp(0.0, 1.0))
}
