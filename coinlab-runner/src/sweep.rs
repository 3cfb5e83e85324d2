//! Parameter sweep utilities for grid search.
//!
//! Every run in a sweep owns its engine state and borrows the shared bars
//! read-only, so runs execute in parallel with rayon.

use rayon::prelude::*;

use coinlab_core::domain::PriceBar;
use coinlab_core::engine::EngineConfig;
use coinlab_core::signals::MaType;

use crate::config::StrategyConfig;
use crate::fitness::FitnessMetric;
use crate::runner::{run_backtest_on_bars, RunError, RunOutcome};

/// Parameter grid: the list of strategy configs to run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamGrid {
    configs: Vec<StrategyConfig>,
}

impl ParamGrid {
    pub fn from_configs(configs: Vec<StrategyConfig>) -> Self {
        Self { configs }
    }

    /// Every (fast, slow) pair with fast < slow.
    pub fn ma_crossover(fast: &[usize], slow: &[usize], ma_type: MaType) -> Self {
        let mut configs = Vec::new();
        for &fast_period in fast {
            for &slow_period in slow {
                // Skip invalid combinations (fast >= slow)
                if fast_period == 0 || fast_period >= slow_period {
                    continue;
                }
                configs.push(StrategyConfig::MaCrossover {
                    fast_period,
                    slow_period,
                    ma_type,
                });
            }
        }
        Self { configs }
    }

    /// Fast 10/20/30 × slow 50/100/200, simple moving averages.
    pub fn ma_crossover_default() -> Self {
        Self::ma_crossover(&[10, 20, 30], &[50, 100, 200], MaType::Sma)
    }

    /// Every (period, oversold, overbought) triple with oversold < overbought.
    pub fn rsi_threshold(periods: &[usize], oversold: &[f64], overbought: &[f64]) -> Self {
        let mut configs = Vec::new();
        for &period in periods {
            for &low in oversold {
                for &high in overbought {
                    if period == 0 || low >= high {
                        continue;
                    }
                    configs.push(StrategyConfig::RsiThreshold {
                        period,
                        oversold: low,
                        overbought: high,
                    });
                }
            }
        }
        Self { configs }
    }

    /// Every (fast, slow, signal) triple with fast < slow.
    pub fn macd_crossover(fast: &[usize], slow: &[usize], signal: &[usize]) -> Self {
        let mut configs = Vec::new();
        for &f in fast {
            for &s in slow {
                for &sig in signal {
                    if f == 0 || sig == 0 || f >= s {
                        continue;
                    }
                    configs.push(StrategyConfig::MacdCrossover {
                        fast: f,
                        slow: s,
                        signal: sig,
                    });
                }
            }
        }
        Self { configs }
    }

    /// Append another grid's configs.
    pub fn extend(&mut self, other: ParamGrid) {
        self.configs.extend(other.configs);
    }

    /// Returns the total number of configurations in this grid.
    pub fn size(&self) -> usize {
        self.configs.len()
    }

    pub fn configs(&self) -> &[StrategyConfig] {
        &self.configs
    }
}

/// Parameter sweep executor.
///
/// Runs one backtest per grid entry over the same bars, optionally in parallel.
#[derive(Debug, Clone)]
pub struct ParamSweep {
    engine_config: EngineConfig,
    parallel: bool,
}

impl ParamSweep {
    pub fn new(engine_config: EngineConfig) -> Self {
        Self {
            engine_config,
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every config in `grid`. The first failing run aborts the sweep.
    pub fn sweep(
        &self,
        symbol: &str,
        bars: &[PriceBar],
        grid: &ParamGrid,
    ) -> Result<SweepResults, RunError> {
        self.sweep_with_progress(symbol, bars, grid, |_, _, _| {})
    }

    /// Executes a sweep with progress reporting.
    ///
    /// The callback is invoked after each backtest completes with:
    /// - Current index (0-based, grid order)
    /// - Total number of configs
    /// - The completed outcome
    pub fn sweep_with_progress<F>(
        &self,
        symbol: &str,
        bars: &[PriceBar],
        grid: &ParamGrid,
        progress_callback: F,
    ) -> Result<SweepResults, RunError>
    where
        F: Fn(usize, usize, &RunOutcome) + Send + Sync,
    {
        let total = grid.size();
        let run = |(idx, strategy): (usize, &StrategyConfig)| {
            let outcome = run_backtest_on_bars(symbol, bars, strategy, &self.engine_config)?;
            progress_callback(idx, total, &outcome);
            Ok(outcome)
        };

        let outcomes = if self.parallel {
            grid.configs
                .par_iter()
                .enumerate()
                .map(run)
                .collect::<Result<Vec<_>, RunError>>()?
        } else {
            grid.configs
                .iter()
                .enumerate()
                .map(run)
                .collect::<Result<Vec<_>, RunError>>()?
        };

        tracing::info!(symbol, runs = outcomes.len(), "sweep complete");
        Ok(SweepResults { outcomes })
    }
}

/// Results from a parameter sweep, in grid order.
#[derive(Debug, Clone)]
pub struct SweepResults {
    outcomes: Vec<RunOutcome>,
}

impl SweepResults {
    /// Returns all outcomes as a slice.
    pub fn all(&self) -> &[RunOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Outcomes ordered best first by `metric`. Ties keep grid order.
    pub fn ranked(&self, metric: FitnessMetric) -> Vec<&RunOutcome> {
        let mut sorted: Vec<_> = self.outcomes.iter().collect();
        sorted.sort_by(|a, b| {
            metric.compare(
                metric.extract(a.result.metrics()),
                metric.extract(b.result.metrics()),
            )
        });
        sorted
    }

    /// Returns the top N outcomes by `metric`.
    pub fn top_n(&self, metric: FitnessMetric, n: usize) -> Vec<&RunOutcome> {
        self.ranked(metric).into_iter().take(n).collect()
    }

    /// Returns the best outcome by `metric`.
    pub fn best(&self, metric: FitnessMetric) -> Option<&RunOutcome> {
        self.ranked(metric).into_iter().next()
    }
}
