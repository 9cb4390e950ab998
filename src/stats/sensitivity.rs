//! Which uncertain factors drive the outcome.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorSensitivity {
    pub factor: String,
    /// Pearson correlation between the factor and the outcome; 0 when either is constant.
    pub correlation: f64,
    pub mean: f64,
    pub std_dev: f64,
}

/// Rank factors by |correlation| descending; ties keep parameter order.
pub fn rank(names: &[String], columns: &[Vec<f64>], outcomes: &[f64]) -> Vec<FactorSensitivity> {
    let mut ranked: Vec<FactorSensitivity> = names
        .iter()
        .zip(columns)
        .map(|(name, column)| {
            let (mean, std_dev, correlation) = pearson(column, outcomes);
            FactorSensitivity {
                factor: name.clone(),
                correlation,
                mean,
                std_dev,
            }
        })
        .collect();
    ranked.sort_by(|left, right| right.correlation.abs().total_cmp(&left.correlation.abs()));
    ranked
}

/// The `limit` strongest factors with a non-zero correlation.
pub fn dominant_factors(sensitivity: &[FactorSensitivity], limit: usize) -> Vec<&str> {
    sensitivity
        .iter()
        .filter(|s| s.correlation != 0.0)
        .take(limit)
        .map(|s| s.factor.as_str())
        .collect()
}

fn pearson(xs: &[f64], ys: &[f64]) -> (f64, f64, f64) {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return (0.0, 0.0, 0.0);
    }
    let nf = n as f64;
    let mx = xs[..n].iter().sum::<f64>() / nf;
    let my = ys[..n].iter().sum::<f64>() / nf;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let std_dev = (sxx / nf).sqrt();
    let denom = (sxx * syy).sqrt();
    let r = if denom > f64::EPSILON {
        (sxy / denom).clamp(-1.0, 1.0)
    } else {
        0.0
    };
    (mx, std_dev, r)
}
