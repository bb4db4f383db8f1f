//! Status reporting and verbosity-gated progress output (C7), grounded on the
//! teacher's `Callback` hook but reshaped around ADMM's residual quantities
//! instead of an interior-point step's infeasibilities.

use macros::{build_option_enum, explicit_options, use_option};

use crate::{SolverOptions, Status};

/// Snapshot of one ADMM iteration's residuals, handed to a [`Reporter`] after
/// step 6 of the driver loop.
#[derive(Debug, Clone, Copy)]
pub struct IterationReport {
    pub iter: usize,
    pub r: f64,
    pub s: f64,
    pub eps_pri: f64,
    pub eps_dua: f64,
    pub gap: f64,
    pub eps_gap: f64,
    pub rho: f64,
}

/// End-of-solve summary handed to a [`Reporter`] once the driver has picked a
/// [`Status`].
#[derive(Debug, Clone, Copy)]
pub struct SolveSummary {
    pub status: Status,
    pub final_iter: usize,
    pub init_time: std::time::Duration,
    pub solve_time: std::time::Duration,
    /// `r / eps_pri`
    pub r_ratio: f64,
    /// `s / eps_dua`
    pub s_ratio: f64,
    /// `gap / eps_gap`
    pub gap_ratio: f64,
}

/// Hook invoked by the ADMM driver to report progress and final status.
pub trait Reporter {
    /// Creates a new reporter from solver options.
    fn new(options: &SolverOptions) -> Self
    where
        Self: Sized;

    /// Called once before the first iteration.
    fn banner(&mut self) {}

    /// Called once per iteration with the current residual snapshot. Gating
    /// on `verbose` and on the reporting stride is the reporter's own
    /// responsibility.
    fn iteration(&mut self, _report: &IterationReport) {}

    /// Called once after the driver exits, regardless of status.
    fn summary(&mut self, _summary: &SolveSummary) {}
}

/// A reporter that does nothing. Use when no per-iteration output is needed.
pub struct NoOpReporter {}

impl Reporter for NoOpReporter {
    fn new(_options: &SolverOptions) -> Self {
        Self {}
    }
}

/// Prints a startup banner, a periodic iteration table, and a closing
/// summary to stdout, gated on the `verbose` option: `verbose >= 1` for the
/// banner/summary, `verbose >= 2` for a line every 100th iteration, and
/// `verbose >= 3` for a line every 10th.
#[explicit_options(name = SolverOptions)]
#[use_option(
    name = "verbose",
    type_ = usize,
    default = "2",
    description = "Verbosity level: 0 silent, 1 banner + summary, 2 adds a line every 100th iteration, 3 every 10th"
)]
pub struct VerboseReporter {}

impl VerboseReporter {
    fn stride(&self) -> usize {
        if self.options.verbose >= 3 { 10 } else { 100 }
    }
}

impl Reporter for VerboseReporter {
    fn new(options: &SolverOptions) -> Self {
        Self {
            options: options.into(),
        }
    }

    fn banner(&mut self) {
        if self.options.verbose >= 1 {
            println!("pogs — proximal operator graph solver");
        }
        if self.options.verbose >= 2 {
            println!(
                "{:>6} | {:>10} | {:>10} | {:>10} | {:>10} | {:>10} | {:>10}",
                "iter", "r", "eps_pri", "s", "eps_dua", "gap", "eps_gap"
            );
        }
    }

    fn iteration(&mut self, report: &IterationReport) {
        if self.options.verbose < 2 {
            return;
        }
        if report.iter % self.stride() != 0 {
            return;
        }
        println!(
            "{:>6} | {:>10.3e} | {:>10.3e} | {:>10.3e} | {:>10.3e} | {:>10.3e} | {:>10.3e}",
            report.iter,
            report.r,
            report.eps_pri,
            report.s,
            report.eps_dua,
            report.gap,
            report.eps_gap,
        );
    }

    fn summary(&mut self, summary: &SolveSummary) {
        if self.options.verbose < 1 {
            return;
        }
        println!(
            "status: {} after {} iterations (init {:?}, solve {:?})",
            summary.status, summary.final_iter, summary.init_time, summary.solve_time
        );
        println!(
            "normalized residuals: r/eps_pri = {:.3e}, s/eps_dua = {:.3e}, gap/eps_gap = {:.3e}",
            summary.r_ratio, summary.s_ratio, summary.gap_ratio
        );
    }
}

build_option_enum!(
    trait_ = Reporter,
    name = "Reporters",
    variants = (NoOpReporter, VerboseReporter),
    new_arguments = (&SolverOptions,),
    doc_header = "An enum representing the available status reporters. Each variant corresponds to a specific reporting strategy."
);
