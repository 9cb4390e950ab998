//! Parameter space and sampler.
//!
//! [ParameterSpace] is built once per run and validates everything up front:
//! every parameter's distribution and, when present, the correlation matrix.
//! [Sampler] then draws [Sample]s from an explicit [Rng]; there is no shared
//! generator, so parallel batches stay reproducible.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{SamplingError, ValidationError};
use crate::model::{Parameter, Scenario};
use crate::sampling::correlation::{CholeskyFactor, CorrelationMatrix};
use crate::sampling::marginal::{Marginal, StandardNormal};
use crate::sampling::rng::Rng;

/// One draw: a value for every parameter, in parameter order.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    index: usize,
    names: Arc<[String]>,
    values: Vec<f64>,
}

impl Sample {
    pub(crate) fn new(index: usize, names: Arc<[String]>, values: Vec<f64>) -> Self {
        Self {
            index,
            names,
            values,
        }
    }

    /// Build a sample from `(name, value)` pairs; handy for evaluator tests.
    pub fn from_pairs<I, S>(index: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let (names, values): (Vec<String>, Vec<f64>) =
            pairs.into_iter().map(|(n, v)| (n.into(), v)).unzip();
        Self::new(index, names.into(), values)
    }

    /// Position of this sample in the run (0-based, across all batches).
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.values.get(i).copied())
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.iter().map(|(n, v)| (n.to_string(), v)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct ParameterSpace {
    parameters: Vec<Parameter>,
    names: Arc<[String]>,
    marginals: Vec<Marginal>,
    copula: Option<CholeskyFactor>,
}

impl ParameterSpace {
    pub fn new(parameters: Vec<Parameter>) -> Result<Self, ValidationError> {
        Self::build(parameters, None)
    }

    pub fn with_correlation(
        parameters: Vec<Parameter>,
        correlation: &CorrelationMatrix,
    ) -> Result<Self, ValidationError> {
        Self::build(parameters, Some(correlation))
    }

    pub fn from_scenario(scenario: &Scenario) -> Result<Self, ValidationError> {
        Self::build(scenario.parameters.clone(), scenario.correlation.as_ref())
    }

    fn build(
        parameters: Vec<Parameter>,
        correlation: Option<&CorrelationMatrix>,
    ) -> Result<Self, ValidationError> {
        let marginals = parameters
            .iter()
            .map(|p| {
                Marginal::new(p.distribution()).map_err(|reason| {
                    ValidationError::InvalidDistribution {
                        parameter: p.name().to_string(),
                        reason,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let copula = correlation
            .map(|c| c.cholesky(parameters.len()))
            .transpose()?;
        let names: Arc<[String]> = parameters
            .iter()
            .map(|p| p.name().to_string())
            .collect::<Vec<_>>()
            .into();
        Ok(Self {
            parameters,
            names,
            marginals,
            copula,
        })
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn names(&self) -> &Arc<[String]> {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn is_correlated(&self) -> bool {
        self.copula.is_some()
    }

    pub fn sampler(&self) -> Sampler<'_> {
        Sampler::new(self)
    }
}

/// Draws samples from a [ParameterSpace]. Holds scratch buffers, so each batch
/// owns one.
#[derive(Debug)]
pub struct Sampler<'a> {
    space: &'a ParameterSpace,
    normal: StandardNormal,
    z: Vec<f64>,
    correlated: Vec<f64>,
}

impl<'a> Sampler<'a> {
    pub fn new(space: &'a ParameterSpace) -> Self {
        Self {
            space,
            normal: StandardNormal::default(),
            z: vec![0.0; space.len()],
            correlated: vec![0.0; space.len()],
        }
    }

    /// Draw one sample, clipped to every parameter's bounds.
    pub fn draw(&mut self, rng: &mut Rng, index: usize) -> Result<Sample, SamplingError> {
        let space = self.space;
        let mut values = Vec::with_capacity(space.len());
        match &space.copula {
            None => {
                for marginal in &space.marginals {
                    values.push(marginal.quantile(rng.next_open_unit()));
                }
            }
            Some(factor) => {
                for z in self.z.iter_mut() {
                    *z = self.normal.quantile(rng.next_open_unit());
                }
                factor.apply(&self.z, &mut self.correlated);
                for (marginal, &y) in space.marginals.iter().zip(&self.correlated) {
                    values.push(marginal.quantile(self.normal.cdf(y)));
                }
            }
        }
        for (value, parameter) in values.iter_mut().zip(&space.parameters) {
            if !value.is_finite() {
                return Err(SamplingError::NonFinite {
                    parameter: parameter.name().to_string(),
                    value: *value,
                    sample: index,
                });
            }
            *value = parameter.clip(*value);
        }
        Ok(Sample::new(index, Arc::clone(&space.names), values))
    }

    /// `n` samples from a single stream seeded with `seed`.
    pub fn sample(&mut self, n: usize, seed: u64) -> Result<Vec<Sample>, SamplingError> {
        let mut rng = Rng::new(seed);
        (0..n).map(|index| self.draw(&mut rng, index)).collect()
    }
}

/// `sample(parameters, n, seed)`: validate the parameters, then draw `n`
/// independent samples.
pub fn sample(
    parameters: &[Parameter],
    n: usize,
    seed: u64,
) -> Result<Vec<Sample>, crate::error::Error> {
    let space = ParameterSpace::new(parameters.to_vec())?;
    let samples = space.sampler().sample(n, seed)?;
    Ok(samples)
}
