use crate::config::SpringConfig;

/// Frame gaps longer than this (e.g. a backgrounded tab) are shortened.
const MAX_FRAME: f64 = 0.5;
/// Damping ratios this close to 1 use the critically damped solution.
const CRITICAL_BAND: f64 = 1e-6;

/// Damped spring that smooths the reading-progress bar.
///
/// Advanced with the exact solution of the damped oscillator, so any
/// validated stiffness, damping and mass stay stable and the result does not
/// depend on how the host slices its frames.
#[derive(Debug, Clone)]
pub struct ProgressSpring {
    config: SpringConfig,
    value: f64,
    velocity: f64,
    target: f64,
}

impl ProgressSpring {
    pub fn new(config: SpringConfig) -> Self {
        Self::resting_at(config, 0.0)
    }

    pub fn resting_at(config: SpringConfig, value: f64) -> Self {
        Self {
            config,
            value,
            velocity: 0.0,
            target: value,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set_target(&mut self, target: f64) {
        if target.is_finite() {
            self.target = target;
        }
    }

    pub fn is_at_rest(&self) -> bool {
        (self.value - self.target).abs() <= self.config.rest_delta
            && self.velocity.abs() <= self.config.rest_speed
    }

    /// Advance by `dt` seconds and return the new value.
    pub fn step(&mut self, dt: f64) -> f64 {
        if !dt.is_finite() || dt <= 0.0 || self.is_at_rest() {
            self.settle();
            return self.value;
        }

        let (offset, velocity) = self.displacement_after(dt.min(MAX_FRAME));
        if offset.is_finite() && velocity.is_finite() {
            self.value = self.target + offset;
            self.velocity = velocity;
        } else {
            // Parameters so extreme the exponentials overflow: the spring
            // is effectively rigid.
            self.value = self.target;
            self.velocity = 0.0;
        }

        self.settle();
        self.value
    }

    /// Offset from the target and velocity `t` seconds from now.
    fn displacement_after(&self, t: f64) -> (f64, f64) {
        let SpringConfig {
            stiffness,
            damping,
            mass,
            ..
        } = self.config;
        let omega = (stiffness / mass).sqrt();
        let zeta = damping / (2.0 * (stiffness * mass).sqrt());
        let x0 = self.value - self.target;
        let v0 = self.velocity;

        if (zeta - 1.0).abs() < CRITICAL_BAND {
            let decay = (-omega * t).exp();
            let b = v0 + omega * x0;
            let x = (x0 + b * t) * decay;
            (x, b * decay - omega * x)
        } else if zeta < 1.0 {
            let sigma = zeta * omega;
            let wd = omega * (1.0 - zeta * zeta).sqrt();
            let decay = (-sigma * t).exp();
            let b = (v0 + sigma * x0) / wd;
            let (sin, cos) = (wd * t).sin_cos();
            let x = decay * (x0 * cos + b * sin);
            let v = decay * ((b * wd - sigma * x0) * cos - (x0 * wd + sigma * b) * sin);
            (x, v)
        } else {
            let fast = -omega * (zeta + ((zeta - 1.0) * (zeta + 1.0)).sqrt());
            // r_fast * r_slow = omega^2; avoids cancellation in the slow root.
            let slow = omega * omega / fast;
            let a = (v0 - fast * x0) / (slow - fast);
            let b = x0 - a;
            let (es, ef) = ((slow * t).exp(), (fast * t).exp());
            (a * es + b * ef, a * slow * es + b * fast * ef)
        }
    }

    fn settle(&mut self) {
        if self.is_at_rest() {
            self.value = self.target;
            self.velocity = 0.0;
        }
    }
}
