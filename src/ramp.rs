use failure::Fail;

use crate::engine::{contact_bias_name, Device, Engine, SolveParams};
use crate::measure::{Currents, Measurement};
use crate::Result;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RampParams {
    pub end_bias: f64,
    /// Initial step magnitude; the sign is ignored.
    pub step_size: f64,
    pub min_step: f64,
    pub solve: SolveParams,
}

impl RampParams {
    pub fn new(end_bias: f64, step_size: f64, min_step: f64, solve: SolveParams) -> Self {
        RampParams {
            end_bias,
            step_size,
            min_step,
            solve,
        }
    }

    fn validate(&self) -> std::result::Result<(), RampError> {
        if !self.end_bias.is_finite() {
            return Err(RampError::InvalidStep(format!(
                "target bias {} is not finite",
                self.end_bias
            )));
        }
        if !self.step_size.is_finite() || self.step_size == 0.0 {
            return Err(RampError::InvalidStep(format!(
                "step size {} must be finite and non-zero",
                self.step_size
            )));
        }
        if !self.min_step.is_finite() || self.min_step <= 0.0 {
            return Err(RampError::InvalidStep(format!(
                "minimum step {} must be finite and positive",
                self.min_step
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Fail)]
pub enum RampError {
    /// Back-off pushed the step below the minimum; the bias parameter has
    /// been left at `last_bias`.
    #[fail(
        display = "Minimum step size too small ramping {} from {} (step {} < {})",
        contact, last_bias, step_size, min_step
    )]
    StepSizeExhausted {
        contact: String,
        last_bias: f64,
        step_size: f64,
        min_step: f64,
    },
    #[fail(display = "Invalid ramp: {}", _0)]
    InvalidStep(String),
}

/// What to do after each converged step, and what the ramp returns.
pub trait OnSuccess {
    type Output;

    fn on_success(&mut self, engine: &dyn Engine, device: &Device, bias: f64) -> Result<()>;

    fn finish(self) -> Self::Output;
}

/// Calls the wrapped function for its side effects; the ramp returns `()`.
pub struct Observer<F>(pub F);

impl<F> OnSuccess for Observer<F>
where
    F: FnMut(&dyn Engine, &Device) -> Result<()>,
{
    type Output = ();

    fn on_success(&mut self, engine: &dyn Engine, device: &Device, _: f64) -> Result<()> {
        (self.0)(engine, device)
    }

    fn finish(self) {}
}

/// Records `(bias, currents)` after every step; the ramp returns the
/// measurements in step order.
pub struct Collector<F> {
    measure: F,
    measurements: Vec<Measurement>,
}

impl<F> Collector<F>
where
    F: FnMut(&dyn Engine, &Device) -> Result<Currents>,
{
    pub fn new(measure: F) -> Self {
        Collector {
            measure,
            measurements: Vec::new(),
        }
    }
}

impl<F> OnSuccess for Collector<F>
where
    F: FnMut(&dyn Engine, &Device) -> Result<Currents>,
{
    type Output = Vec<Measurement>;

    fn on_success(&mut self, engine: &dyn Engine, device: &Device, bias: f64) -> Result<()> {
        let currents = (self.measure)(engine, device)?;
        self.measurements.push(Measurement::new(bias, currents));
        Ok(())
    }

    fn finish(self) -> Vec<Measurement> {
        self.measurements
    }
}

struct RampState {
    last_bias: f64,
    end_bias: f64,
    step_size: f64,
    step_sign: f64,
    min_step: f64,
}

impl RampState {
    fn new(start: f64, params: &RampParams) -> Self {
        RampState {
            last_bias: start,
            end_bias: params.end_bias,
            step_size: params.step_size.abs(),
            step_sign: if start < params.end_bias { 1.0 } else { -1.0 },
            min_step: params.min_step,
        }
    }

    fn reached(&self) -> bool {
        (self.last_bias - self.end_bias).abs() <= self.min_step
    }

    /// Next bias to try. Lands exactly on the target when a full step would
    /// cross it or stop within `min_step` of it; the step taken is then at
    /// most `step_size + min_step`.
    fn next_bias(&self) -> f64 {
        let next = self.last_bias + self.step_sign * self.step_size;
        let next_sign = if next < self.end_bias { 1.0 } else { -1.0 };
        if next_sign != self.step_sign || (self.end_bias - next).abs() <= self.min_step {
            self.end_bias
        } else {
            next
        }
    }

    fn advance(&mut self, bias: f64) {
        self.last_bias = bias;
    }

    /// Halves the step. False once it has dropped below `min_step`.
    fn back_off(&mut self) -> bool {
        self.step_size *= 0.5;
        self.step_size >= self.min_step
    }
}

/// Ramps the bias of `contact` to `params.end_bias`.
///
/// The start is whatever bias the device currently holds. `on_success` runs
/// once per converged step, never for a failed attempt; see [`Observer`] and
/// [`Collector`]. On any error nothing collected so far is returned.
pub fn ramp_bias<H: OnSuccess>(
    engine: &mut dyn Engine,
    device: &Device,
    contact: &str,
    params: &RampParams,
    mut on_success: H,
) -> Result<H::Output> {
    params.validate()?;

    let bias_name = contact_bias_name(contact);
    let start = engine.get_parameter(device, &bias_name)?;
    let mut state = RampState::new(start, params);

    info_time!("ramp {} {} -> {}", contact, start, params.end_bias);

    while !state.reached() {
        debug!(
            "{} last {:e} end {:e}",
            contact, state.last_bias, state.end_bias
        );
        let next_bias = state.next_bias();
        if next_bias == state.end_bias {
            debug!("{} next bias set to the target {:e}", contact, next_bias);
        }

        engine.set_parameter(device, &bias_name, next_bias)?;
        match engine.solve(device, &params.solve) {
            Ok(()) => {}
            Err(e) if e.is_convergence_failure() => {
                engine.set_parameter(device, &bias_name, state.last_bias)?;
                if !state.back_off() {
                    return Err(RampError::StepSizeExhausted {
                        contact: contact.to_owned(),
                        last_bias: state.last_bias,
                        step_size: state.step_size,
                        min_step: state.min_step,
                    }
                    .into());
                }
                warn!(
                    "{} failed at {:e} ({}), new step size {:e}",
                    contact, next_bias, e, state.step_size
                );
                continue;
            }
            Err(e) => return Err(e.into_error()),
        }

        debug!("{} converged at {:e}", contact, next_bias);
        state.advance(next_bias);
        on_success.on_success(engine, device, next_bias)?;
    }

    Ok(on_success.finish())
}
