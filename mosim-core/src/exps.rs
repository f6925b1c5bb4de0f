//! Experiment generation.
//!
//! An [`Experiment`] is one simulation task: a model name plus the
//! parameter set and command options to run it with. [`gen_experiments`]
//! expands a set of candidate values per parameter into the full-factorial
//! (Cartesian product) design covering every combination, lazily.

use crate::error::{Error, Result};
use crate::param::{ParamDict, ParamValue};

/// Ordered list of factors: each entry maps a name to its candidate
/// values. A scalar factor is a one-element list.
pub type Factors = Vec<(String, Vec<ParamValue>)>;

/// One simulation task to be run. Immutable once generated.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    /// Full model name in Modelica dot notation.
    pub model: String,
    /// Parameter modifiers applied to the model.
    pub params: ParamDict,
    /// Options passed to the simulation command.
    pub options: ParamDict,
}

/// Lazy full-factorial expansion over parameter factors alone, yielding
/// one [`ParamDict`] per combination. The first listed factor varies
/// fastest.
pub fn fullfact(factors: Factors) -> Result<FullFact> {
    validate_factors(&factors)?;
    let odometer = Odometer::new(factors.iter().map(|(_, values)| values.len()).collect());
    Ok(FullFact { factors, odometer })
}

/// Lazy full-factorial expansion over models, parameters and options.
///
/// Every listed model is paired with every combination of parameter values
/// and every combination of option values. Parameters vary fastest (first
/// listed key first), then options, then the model. Order is deterministic
/// and no de-duplication takes place: the sequence yields exactly
/// `models.len() * n1 * n2 * ...` experiments.
pub fn gen_experiments(
    models: Vec<String>,
    params: Factors,
    options: Factors,
) -> Result<Experiments> {
    if models.is_empty() {
        return Err(Error::NoModels);
    }
    validate_factors(&params)?;
    validate_factors(&options)?;

    let mut dims: Vec<usize> = params.iter().map(|(_, values)| values.len()).collect();
    dims.extend(options.iter().map(|(_, values)| values.len()));
    dims.push(models.len());

    Ok(Experiments {
        models,
        params,
        options,
        odometer: Odometer::new(dims),
    })
}

fn validate_factors(factors: &Factors) -> Result<()> {
    // empty value lists would silence the whole product
    for (name, values) in factors {
        if values.is_empty() {
            return Err(Error::EmptyValueSequence(name.clone()));
        }
    }
    // catch flattening collisions before any experiment is built
    let mut probe = ParamDict::new();
    for (name, _) in factors {
        probe.insert(name.clone(), None)?;
    }
    Ok(())
}

/// See [`fullfact`].
pub struct FullFact {
    factors: Factors,
    odometer: Odometer,
}

impl Iterator for FullFact {
    type Item = ParamDict;

    fn next(&mut self) -> Option<ParamDict> {
        let digits = self.odometer.next()?;
        let mut dict = ParamDict::new();
        for (i, (name, values)) in self.factors.iter().enumerate() {
            // collisions were rejected up front
            dict.insert(name.clone(), Some(values[digits[i]].clone()))
                .ok()?;
        }
        Some(dict)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.odometer.remaining();
        (remaining, Some(remaining))
    }
}

/// See [`gen_experiments`].
pub struct Experiments {
    models: Vec<String>,
    params: Factors,
    options: Factors,
    odometer: Odometer,
}

impl Experiments {
    /// Total number of experiments in the design.
    pub fn total(&self) -> usize {
        self.odometer.total()
    }
}

impl Iterator for Experiments {
    type Item = Experiment;

    fn next(&mut self) -> Option<Experiment> {
        let digits = self.odometer.next()?;
        let mut params = ParamDict::new();
        for (i, (name, values)) in self.params.iter().enumerate() {
            params
                .insert(name.clone(), Some(values[digits[i]].clone()))
                .ok()?;
        }
        let mut options = ParamDict::new();
        let offset = self.params.len();
        for (i, (name, values)) in self.options.iter().enumerate() {
            options
                .insert(name.clone(), Some(values[digits[offset + i]].clone()))
                .ok()?;
        }
        let model = self.models[digits[digits.len() - 1]].clone();
        Some(Experiment {
            model,
            params,
            options,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.odometer.remaining();
        (remaining, Some(remaining))
    }
}

/// Mixed-radix counter backing the product iterators. The first digit
/// cycles fastest.
struct Odometer {
    dims: Vec<usize>,
    current: Vec<usize>,
    done: bool,
}

impl Odometer {
    fn new(dims: Vec<usize>) -> Self {
        let current = vec![0; dims.len()];
        Self {
            dims,
            current,
            done: false,
        }
    }

    fn total(&self) -> usize {
        self.dims.iter().product()
    }

    fn remaining(&self) -> usize {
        if self.done {
            return 0;
        }
        // position of the current combination in the product order
        let mut consumed = 0;
        let mut radix = 1;
        for (digit, dim) in self.current.iter().zip(self.dims.iter()) {
            consumed += digit * radix;
            radix *= dim;
        }
        self.total() - consumed
    }

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let digits = self.current.clone();
        // advance, carrying from the fastest digit up
        self.done = true;
        for i in 0..self.dims.len() {
            self.current[i] += 1;
            if self.current[i] < self.dims[i] {
                self.done = false;
                break;
            }
            self.current[i] = 0;
        }
        Some(digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factors(pairs: &[(&str, &[i64])]) -> Factors {
        pairs
            .iter()
            .map(|(name, values)| {
                (
                    name.to_string(),
                    values.iter().map(|v| ParamValue::Integer(*v)).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn fullfact_covers_every_combination() {
        let designs: Vec<ParamDict> =
            fullfact(factors(&[("C1.C", &[8, 10]), ("L.L", &[18, 20])]))
                .unwrap()
                .collect();
        let rendered: Vec<String> = designs.iter().map(|d| d.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "(C1(C=8), L(L=18))",
                "(C1(C=10), L(L=18))",
                "(C1(C=8), L(L=20))",
                "(C1(C=10), L(L=20))",
            ]
        );
    }

    #[test]
    fn experiment_count_is_the_product() {
        let experiments = gen_experiments(
            vec!["A".to_string(), "B".to_string()],
            factors(&[("x", &[1, 2, 3]), ("y", &[1, 2])]),
            factors(&[("stopTime", &[100, 200])]),
        )
        .unwrap();
        assert_eq!(experiments.total(), 2 * 3 * 2 * 2);
        assert_eq!(experiments.count(), 24);
    }

    #[test]
    fn params_vary_fastest_models_slowest() {
        let experiments: Vec<Experiment> = gen_experiments(
            vec!["A".to_string(), "B".to_string()],
            factors(&[("p", &[1, 2])]),
            Vec::new(),
        )
        .unwrap()
        .collect();
        let order: Vec<(String, String)> = experiments
            .into_iter()
            .map(|e| (e.model, e.params.to_string()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("A".to_string(), "(p=1)".to_string()),
                ("A".to_string(), "(p=2)".to_string()),
                ("B".to_string(), "(p=1)".to_string()),
                ("B".to_string(), "(p=2)".to_string()),
            ]
        );
    }

    #[test]
    fn empty_value_sequence_is_an_error() {
        let result = gen_experiments(
            vec!["A".to_string()],
            factors(&[("p", &[])]),
            Vec::new(),
        );
        assert!(matches!(result, Err(Error::EmptyValueSequence(_))));
    }

    #[test]
    fn no_models_is_an_error() {
        assert!(matches!(
            gen_experiments(Vec::new(), Vec::new(), Vec::new()),
            Err(Error::NoModels)
        ));
    }

    #[test]
    fn no_factors_yields_one_experiment() {
        let experiments: Vec<Experiment> =
            gen_experiments(vec!["A".to_string()], Vec::new(), Vec::new())
                .unwrap()
                .collect();
        assert_eq!(experiments.len(), 1);
        assert!(experiments[0].params.is_empty());
    }
}
