//! Inverse-CDF transforms for each supported distribution, backed by `statrs`.
//!
//! Every marginal is drawn by pushing a uniform in (0, 1) through its quantile
//! function. Independent and copula sampling share this path; only the source of
//! the uniform differs.

use statrs::distribution::{
    Beta, ContinuousCDF, DiscreteCDF, Exp, Gamma, LogNormal, Normal, Poisson, Triangular,
    Uniform, Weibull,
};

use crate::model::Distribution;

/// Keeps copula uniforms away from the exact endpoints where some quantile
/// functions diverge.
const UNIT_GUARD: f64 = 1e-12;

/// Doubling/halving steps allowed while bracketing a continuous quantile.
const BRACKET_STEPS: usize = 1_100;
const BISECT_STEPS: usize = 200;
/// Largest Poisson count the integer search will bracket.
const POISSON_CEILING: u64 = 1 << 53;

#[derive(Debug, Clone)]
pub enum Marginal {
    Uniform(Uniform),
    Normal(Normal),
    Triangular(Triangular),
    Beta(Beta),
    Gamma(Gamma),
    Weibull(Weibull),
    Poisson(Poisson),
    Exponential(Exp),
    LogNormal(LogNormal),
}

impl Marginal {
    pub fn new(distribution: &Distribution) -> Result<Self, String> {
        let marginal = match *distribution {
            Distribution::Uniform { low, high } => {
                Self::Uniform(Uniform::new(low, high).map_err(|e| e.to_string())?)
            }
            Distribution::Normal { mean, std_dev } => {
                Self::Normal(Normal::new(mean, std_dev).map_err(|e| e.to_string())?)
            }
            Distribution::Triangular { low, mode, high } => {
                Self::Triangular(Triangular::new(low, high, mode).map_err(|e| e.to_string())?)
            }
            Distribution::Beta { alpha, beta } => {
                Self::Beta(Beta::new(alpha, beta).map_err(|e| e.to_string())?)
            }
            Distribution::Gamma { shape, rate } => {
                Self::Gamma(Gamma::new(shape, rate).map_err(|e| e.to_string())?)
            }
            Distribution::Weibull { shape, scale } => {
                Self::Weibull(Weibull::new(shape, scale).map_err(|e| e.to_string())?)
            }
            Distribution::Poisson { lambda } => {
                Self::Poisson(Poisson::new(lambda).map_err(|e| e.to_string())?)
            }
            Distribution::Exponential { rate } => {
                Self::Exponential(Exp::new(rate).map_err(|e| e.to_string())?)
            }
            Distribution::LogNormal { mu, sigma } => {
                Self::LogNormal(LogNormal::new(mu, sigma).map_err(|e| e.to_string())?)
            }
        };
        Ok(marginal)
    }

    /// Quantile at `u`. The caller is responsible for clipping to parameter bounds
    /// and for rejecting non-finite results.
    pub fn quantile(&self, u: f64) -> f64 {
        let u = u.clamp(UNIT_GUARD, 1.0 - UNIT_GUARD);
        match self {
            Self::Uniform(d) => d.inverse_cdf(u),
            Self::Normal(d) => d.inverse_cdf(u),
            Self::Triangular(d) => d.inverse_cdf(u),
            Self::Beta(d) => d.inverse_cdf(u),
            Self::Gamma(d) => positive_quantile(|x| d.cdf(x), u, d.shape() / d.rate()),
            Self::Weibull(d) => d.scale() * (-(-u).ln_1p()).powf(1.0 / d.shape()),
            Self::Poisson(d) => poisson_quantile(d, u),
            Self::Exponential(d) => d.inverse_cdf(u),
            Self::LogNormal(d) => d.inverse_cdf(u),
        }
    }
}

/// Smallest `x > 0` with `cdf(x) >= u` for a continuous distribution on
/// `(0, inf)`. Brackets geometrically from `start`, then bisects.
fn positive_quantile(cdf: impl Fn(f64) -> f64, u: f64, start: f64) -> f64 {
    let mut lo = 0.0;
    let mut hi = start;
    if cdf(hi) < u {
        for _ in 0..BRACKET_STEPS {
            lo = hi;
            hi *= 2.0;
            if cdf(hi) >= u {
                break;
            }
        }
    } else {
        for _ in 0..BRACKET_STEPS {
            let half = hi * 0.5;
            if half == 0.0 || cdf(half) < u {
                lo = half;
                break;
            }
            hi = half;
        }
    }
    for _ in 0..BISECT_STEPS {
        let mid = lo + (hi - lo) * 0.5;
        if mid <= lo || mid >= hi {
            break;
        }
        if cdf(mid) < u {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    hi
}

/// Smallest count `k` with `P(X <= k) >= u`.
fn poisson_quantile(d: &Poisson, u: f64) -> f64 {
    if u <= d.cdf(0) {
        return 0.0;
    }
    // invariant: cdf(lo) < u
    let mut lo = 0u64;
    let mut hi = 1u64;
    while d.cdf(hi) < u {
        if hi >= POISSON_CEILING {
            return hi as f64;
        }
        lo = hi;
        hi *= 2;
    }
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if d.cdf(mid) < u {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    hi as f64
}

/// Standard normal used by the Gaussian copula.
#[derive(Debug, Clone)]
pub struct StandardNormal(Normal);

impl Default for StandardNormal {
    fn default() -> Self {
        Self(Normal::standard())
    }
}

impl StandardNormal {
    #[inline]
    pub fn quantile(&self, u: f64) -> f64 {
        self.0.inverse_cdf(u.clamp(UNIT_GUARD, 1.0 - UNIT_GUARD))
    }

    #[inline]
    pub fn cdf(&self, z: f64) -> f64 {
        self.0.cdf(z)
    }
}
