//! Sweep orchestration over an ordered list of parameter settings.

use std::thread;

use powersim_dgp::SimSeed;
use rand::Rng as _;
use serde::{Deserialize, Serialize};

use crate::{Design, ParameterSetting, SettingResult, SimError, run_setting};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sweep {
    pub settings: Vec<ParameterSetting>,
    /// Monte Carlo runs per setting
    pub runs: usize,
    /// Significance threshold
    pub alpha: f64,
    /// Retain per-trial records in the results
    pub keep_trials: bool,
}

impl Sweep {
    /// Runs every setting in order on a single generator seeded from `seed`.
    ///
    /// Results are in setting order. The first failing trial aborts the sweep.
    pub fn run(&self, seed: SimSeed) -> Result<Vec<SettingResult>, SimError> {
        self.check_runs()?;
        let mut rng = seed.rng();
        self.settings
            .iter()
            .enumerate()
            .map(|(position, setting)| {
                self.log_start(position, setting);
                let result =
                    run_setting(setting, self.runs, self.alpha, self.keep_trials, &mut rng)?;
                log_done(&result);
                Ok(result)
            })
            .collect()
    }

    /// Runs the settings on up to `jobs` worker threads.
    ///
    /// One child seed per setting is drawn from the master generator, in setting
    /// order, before any work starts, so results depend on `seed` but not on
    /// `jobs`. Results are in setting order; if several settings fail, the error
    /// of the first one is returned.
    pub fn run_parallel(&self, seed: SimSeed, jobs: usize) -> Result<Vec<SettingResult>, SimError> {
        self.check_runs()?;
        let mut master = seed.rng();
        let work = self
            .settings
            .iter()
            .enumerate()
            .map(|(position, setting)| (position, setting, master.random::<SimSeed>()))
            .collect::<Vec<_>>();
        if work.is_empty() {
            return Ok(vec![]);
        }

        let chunk_size = work.len().div_ceil(jobs.max(1));
        let mut slots = work.iter().map(|_| None).collect::<Vec<_>>();
        thread::scope(|s| {
            for (chunk, slots) in work.chunks(chunk_size).zip(slots.chunks_mut(chunk_size)) {
                s.spawn(move || {
                    for (&(position, setting, child), slot) in chunk.iter().zip(slots) {
                        self.log_start(position, setting);
                        let result = run_setting(
                            setting,
                            self.runs,
                            self.alpha,
                            self.keep_trials,
                            &mut child.rng(),
                        );
                        if let Ok(result) = &result {
                            log_done(result);
                        }
                        *slot = Some(result);
                    }
                });
            }
        });

        slots.into_iter().flatten().collect()
    }

    fn check_runs(&self) -> Result<(), SimError> {
        if self.runs == 0 {
            return Err(SimError::NoRuns);
        }
        Ok(())
    }

    fn log_start(&self, position: usize, setting: &ParameterSetting) {
        tracing::info!(
            "setting {}/{} ({}, effect = {}, {}): {} runs",
            position + 1,
            self.settings.len(),
            setting.design.name(),
            setting.design.effect(),
            sizes_label(&setting.design),
            self.runs,
        );
    }
}

/// Sample sizes of a design, e.g. `subjects = 100, items = 50`.
fn sizes_label(design: &Design) -> String {
    let mut label = format!("subjects = {}", design.n_subjects());
    if let Some(n_items) = design.n_items() {
        label.push_str(&format!(", items = {n_items}"));
    }
    if let Some(n_trials) = design.n_trials() {
        label.push_str(&format!(", trials = {n_trials}"));
    }
    label
}

fn log_done(result: &SettingResult) {
    let summary = &result.summary;
    tracing::info!(
        setting = result.setting.id,
        power = summary.power,
        n_singular = summary.n_singular,
        n_nonconverged = summary.n_nonconverged,
        "setting done"
    );
}
