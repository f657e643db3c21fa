//! Warm-up adaptation: dual-averaging step size and a diagonal mass matrix.
//!
//! Purpose
//! -------
//! Tune the two HMC knobs that matter most during warm-up:
//! - the leapfrog step size `ε`, by Nesterov dual averaging toward a target
//!   mean acceptance statistic δ (Hoffman & Gelman, 2014);
//! - the diagonal inverse mass matrix, from the sample variance of `θ` over a
//!   single adaptation window.
//!
//! Key behaviors
//! -------------
//! - [`DualAveraging::update`] consumes one acceptance statistic per
//!   iteration; [`DualAveraging::final_step_size`] returns the averaged
//!   `ε̄` used after warm-up.
//! - [`WarmupSchedule`] splits warm-up into an initial fast buffer (15%), a
//!   slow window where `θ` draws feed [`Welford`], and a terminal fast buffer
//!   (10%). At the end of the window the inverse mass is set to the
//!   regularized variance and dual averaging restarts.
//! - Warm-ups too short for a meaningful window (< 20 iterations) adapt the
//!   step size only.
//!
//! Conventions
//! -----------
//! - Dual-averaging constants follow the usual defaults: `γ = 0.05`,
//!   `t0 = 10`, `κ = 0.75`, `μ = ln(10 ε0)`.
//! - Variance regularization: `(n / (n + 5)) · var + 1e-3 · 5 / (n + 5)`.
use ndarray::Array1;

const GAMMA: f64 = 0.05;
const T0: f64 = 10.0;
const KAPPA: f64 = 0.75;
const MIN_WINDOW_WARMUP: usize = 20;

/// Nesterov dual averaging for the leapfrog step size.
#[derive(Debug, Clone, PartialEq)]
pub struct DualAveraging {
    target: f64,
    mu: f64,
    log_step: f64,
    log_step_bar: f64,
    h_bar: f64,
    count: f64,
}

impl DualAveraging {
    pub fn new(initial_step: f64, target: f64) -> Self {
        DualAveraging {
            target,
            mu: (10.0 * initial_step).ln(),
            log_step: initial_step.ln(),
            log_step_bar: 0.0,
            h_bar: 0.0,
            count: 0.0,
        }
    }

    /// Restart around `step`, keeping the target.
    pub fn restart(&mut self, step: f64) {
        *self = DualAveraging::new(step, self.target);
    }

    /// Feed one acceptance statistic in `[0, 1]`.
    pub fn update(&mut self, accept_stat: f64) {
        let accept_stat = if accept_stat.is_finite() { accept_stat.clamp(0.0, 1.0) } else { 0.0 };
        self.count += 1.0;
        let eta = 1.0 / (self.count + T0);
        self.h_bar = (1.0 - eta) * self.h_bar + eta * (self.target - accept_stat);
        self.log_step = self.mu - self.count.sqrt() / GAMMA * self.h_bar;
        let w = self.count.powf(-KAPPA);
        self.log_step_bar = w * self.log_step + (1.0 - w) * self.log_step_bar;
    }

    /// Step size for the next warm-up iteration.
    pub fn current_step_size(&self) -> f64 {
        self.log_step.exp()
    }

    /// Averaged step size for the sampling phase.
    pub fn final_step_size(&self) -> f64 {
        if self.count == 0.0 { self.current_step_size() } else { self.log_step_bar.exp() }
    }
}

/// Running mean and variance (Welford) of a vector quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct Welford {
    count: usize,
    mean: Array1<f64>,
    m2: Array1<f64>,
}

impl Welford {
    pub fn new(dim: usize) -> Self {
        Welford { count: 0, mean: Array1::zeros(dim), m2: Array1::zeros(dim) }
    }

    pub fn push(&mut self, x: &Array1<f64>) {
        self.count += 1;
        let delta = x - &self.mean;
        self.mean.scaled_add(1.0 / self.count as f64, &delta);
        let delta2 = x - &self.mean;
        self.m2 += &(&delta * &delta2);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Regularized sample variance, shrunk toward `1e-3`.
    pub fn regularized_variance(&self) -> Option<Array1<f64>> {
        if self.count < 3 {
            return None;
        }
        let n = self.count as f64;
        let var = &self.m2 / (n - 1.0);
        Some(var.mapv(|v| (n / (n + 5.0)) * v + 1e-3 * (5.0 / (n + 5.0))))
    }

    pub fn reset(&mut self) {
        *self = Welford::new(self.mean.len());
    }
}

/// Iteration boundaries of the mass-matrix window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmupSchedule {
    pub warmup: usize,
    /// First iteration whose `θ` feeds the variance estimate.
    pub window_start: usize,
    /// Iteration after which the mass matrix is updated; `None` if warm-up is
    /// too short.
    pub window_end: Option<usize>,
}

impl WarmupSchedule {
    pub fn new(warmup: usize) -> Self {
        if warmup < MIN_WINDOW_WARMUP {
            return WarmupSchedule { warmup, window_start: warmup, window_end: None };
        }
        let init_buffer = (warmup as f64 * 0.15).ceil() as usize;
        let term_buffer = (warmup as f64 * 0.10).ceil() as usize;
        WarmupSchedule {
            warmup,
            window_start: init_buffer,
            window_end: Some(warmup - term_buffer),
        }
    }

    pub fn in_window(&self, iteration: usize) -> bool {
        matches!(self.window_end, Some(end) if iteration >= self.window_start && iteration < end)
    }

    pub fn is_window_end(&self, iteration: usize) -> bool {
        self.window_end == Some(iteration + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Acceptance below target shrinks the step; above target grows it.
    fn dual_averaging_moves_toward_target() {
        let mut low = DualAveraging::new(1.0, 0.8);
        let mut high = DualAveraging::new(1.0, 0.8);
        for _ in 0..50 {
            low.update(0.2);
            high.update(1.0);
        }
        assert!(low.final_step_size() < 1.0);
        assert!(high.final_step_size() > low.final_step_size());
    }

    #[test]
    fn welford_matches_two_pass_variance() {
        let xs = [array![1.0, 10.0], array![2.0, 10.0], array![4.0, 10.0], array![7.0, 10.0]];
        let mut w = Welford::new(2);
        for x in &xs {
            w.push(x);
        }
        let n = 4.0;
        let mean = (1.0 + 2.0 + 4.0 + 7.0) / n;
        let var: f64 = [1.0, 2.0, 4.0, 7.0].iter().map(|x: &f64| (x - mean).powi(2)).sum::<f64>()
            / (n - 1.0);
        let reg = w.regularized_variance().unwrap();
        assert_relative_eq!(reg[0], (n / (n + 5.0)) * var + 1e-3 * 5.0 / (n + 5.0));
        assert_relative_eq!(reg[1], 1e-3 * 5.0 / (n + 5.0));
    }

    #[test]
    // Purpose
    // -------
    // The window sits between the 15% and 10% buffers; short warm-ups get
    // no window.
    fn schedule_buffers() {
        let s = WarmupSchedule::new(100);
        assert_eq!(s.window_start, 15);
        assert_eq!(s.window_end, Some(90));
        assert!(s.in_window(15) && s.in_window(89) && !s.in_window(90));
        assert!(s.is_window_end(89));
        assert_eq!(WarmupSchedule::new(10).window_end, None);
    }
}
