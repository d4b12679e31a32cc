//! Batched, parallel simulation.
//!
//! Paths are processed in fixed batches of [`BATCH_SIZE`]. Batches fan out
//! over the rayon pool; each batch accumulates its own sums sequentially
//! and the per-batch results are reduced in batch order on the calling
//! thread. Draw generation depends only on the global path index, so the
//! result of a run is bitwise-reproducible for a given configuration no
//! matter how many worker threads execute it.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::info;

use tenor_core::{Plain, Recorded, Sample, Tape};
use tenor_models::{Model, ModelParams};
use tenor_script::{Evaluator, Product};

use crate::config::{OverflowPolicy, SequenceKind, SimConfig};
use crate::error::SimError;
use crate::results::SimResults;
use crate::rng::{BrownianBridge, PathRng, Sobol};

/// Paths per batch; also the granularity of parallelism.
pub const BATCH_SIZE: u64 = 1024;

struct BatchOutcome {
    value_sum: f64,
    grad_sum: Vec<f64>,
    discarded: u64,
}

/// Prices `product` under `params`; entry point of the engine.
///
/// Equivalent to [`simulate`], named for callers reading the result as a
/// valuation rather than a simulation run.
pub fn monte_carlo_value(
    product: &Product,
    params: &ModelParams,
    config: &SimConfig,
) -> Result<SimResults, SimError> {
    simulate(product, params, config)
}

/// Prices `product` under `params`.
///
/// Returns the average deflated payoff under `"value"`; with
/// `compute_risk` enabled, also one average pathwise derivative per bucket
/// of [`ModelParams::bucket_labels`].
///
/// # Errors
///
/// Configuration errors, [`SimError::NumericOverflow`] on a failing path
/// under the fail-fast policy (batches run in parallel, so which failing
/// path is reported is unspecified), or [`SimError::AllPathsDiscarded`] if
/// the discard policy drops every path.
pub fn simulate(
    product: &Product,
    params: &ModelParams,
    config: &SimConfig,
) -> Result<SimResults, SimError> {
    config.validate().map_err(SimError::Config)?;

    let labels = params.bucket_labels();
    let timeline = product.timeline();
    let (value_model, _) = Model::<f64>::build(params, Plain, timeline);
    let dim = value_model.dimension();
    let bridge_times = step_end_times(timeline);

    info!(
        n_paths = config.n_paths,
        dimension = dim,
        events = product.event_count(),
        risk = config.compute_risk,
        "starting simulation"
    );

    let n_batches = config.n_paths.div_ceil(BATCH_SIZE);
    let outcomes = (0..n_batches)
        .into_par_iter()
        .map(|batch| {
            run_batch(
                batch,
                product,
                params,
                config,
                &value_model,
                dim,
                &bridge_times,
                labels.len(),
            )
        })
        .collect::<Result<Vec<_>, SimError>>()?;

    // Sequential fold in batch order keeps the reduction deterministic
    let mut value_sum = 0.0;
    let mut grad_sum = vec![0.0; labels.len()];
    let mut discarded = 0;
    for outcome in outcomes {
        value_sum += outcome.value_sum;
        for (sum, g) in grad_sum.iter_mut().zip(&outcome.grad_sum) {
            *sum += g;
        }
        discarded += outcome.discarded;
    }

    let effective = config.n_paths - discarded;
    if effective == 0 {
        return Err(SimError::AllPathsDiscarded);
    }

    let mut values = BTreeMap::new();
    values.insert("value".to_string(), value_sum / effective as f64);
    if config.compute_risk {
        for (label, g) in labels.iter().zip(grad_sum) {
            values.insert(label.clone(), g / effective as f64);
        }
    }

    info!(value = values["value"], discarded, "simulation finished");
    Ok(SimResults {
        values,
        n_paths: config.n_paths,
        discarded,
    })
}

/// End times of the timeline intervals that actually advance the clock;
/// one per Gaussian draw.
fn step_end_times(timeline: &[f64]) -> Vec<f64> {
    let mut times = Vec::with_capacity(timeline.len());
    let mut prev = 0.0;
    for &t in timeline {
        if t > prev {
            times.push(t);
            prev = t;
        }
    }
    times
}

#[allow(clippy::too_many_arguments)]
fn run_batch(
    batch: u64,
    product: &Product,
    params: &ModelParams,
    config: &SimConfig,
    value_model: &Model<f64>,
    dim: usize,
    bridge_times: &[f64],
    n_buckets: usize,
) -> Result<BatchOutcome, SimError> {
    let first = batch * BATCH_SIZE;
    let count = BATCH_SIZE.min(config.n_paths - first);

    let mut sobol = match config.sequence {
        SequenceKind::Sobol => {
            let mut s = Sobol::new(dim);
            s.skip_to(first);
            Some(s)
        }
        SequenceKind::Pseudo => None,
    };
    let mut bridge = if config.use_bridge && dim > 1 {
        Some(BrownianBridge::new(bridge_times))
    } else {
        None
    };

    let mut raw = vec![0.0; dim];
    let mut gauss = vec![0.0; dim];
    let mut outcome = BatchOutcome {
        value_sum: 0.0,
        grad_sum: vec![0.0; n_buckets],
        discarded: 0,
    };

    let mut path_f64: Vec<Sample<f64>> = Vec::with_capacity(product.event_count());
    let mut plain_evaluator = Evaluator::new(Plain, product, config.smoothing_width);
    let tape = Tape::new();

    for p in 0..count {
        let path_index = first + p;
        match &mut sobol {
            Some(s) => s.next_gauss(&mut raw),
            None => PathRng::for_path(config.seed, path_index).fill_gauss(&mut raw),
        }
        match &mut bridge {
            Some(b) => b.transform(&raw, &mut gauss),
            None => gauss.copy_from_slice(&raw),
        }

        let evaluated = if config.compute_risk {
            tape.clear();
            let cx = Recorded(&tape);
            let (model, leaves) = Model::build(params, cx, product.timeline());
            let mut path = Vec::with_capacity(product.event_count());
            model.generate_path(&gauss, &mut path);
            let mut evaluator = Evaluator::new(cx, product, config.smoothing_width);
            evaluator.evaluate(product, &path).map(|value| {
                let grads = tape.gradient(value, &leaves);
                for (sum, g) in outcome.grad_sum.iter_mut().zip(&grads) {
                    *sum += g;
                }
                value.value()
            })
        } else {
            value_model.generate_path(&gauss, &mut path_f64);
            plain_evaluator.evaluate(product, &path_f64)
        };

        match evaluated {
            Ok(value) => outcome.value_sum += value,
            Err(e) => match config.overflow {
                OverflowPolicy::FailFast => {
                    return Err(SimError::NumericOverflow {
                        path: path_index,
                        detail: e.to_string(),
                    });
                }
                OverflowPolicy::DiscardPath => outcome.discarded += 1,
            },
        }
    }
    Ok(outcome)
}
