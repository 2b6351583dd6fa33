mod compact;
#[cfg(test)]
pub(crate) mod scripted;

use std::fmt::{Display, Formatter};
use std::path::Path;

use failure::Fail;

use crate::Result;

pub use self::compact::{CompactEngine, MosfetParams};

/// Handle to a device living inside an engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Device {
    name: String,
}

impl Device {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Device { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for Device {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Name of the parameter holding the bias applied at `contact`.
pub fn contact_bias_name(contact: &str) -> String {
    format!("{}_bias", contact)
}

/// Budget for a single nonlinear solve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SolveParams {
    pub max_iterations: u32,
    pub rel_error: f64,
    pub abs_error: f64,
}

impl SolveParams {
    pub fn new(max_iterations: u32, rel_error: f64, abs_error: f64) -> Self {
        SolveParams {
            max_iterations,
            rel_error,
            abs_error,
        }
    }
}

impl Default for SolveParams {
    fn default() -> Self {
        SolveParams::new(100, 1e-8, 1e30)
    }
}

#[derive(Debug, Fail)]
pub enum SolveError {
    /// The solver did not reach the requested tolerance within its budget.
    /// The engine has already restored the previously converged solution.
    #[fail(
        display = "Convergence failure on {} after {} iteration(s)",
        device, iterations
    )]
    ConvergenceFailure { device: String, iterations: u32 },
    #[fail(display = "{}", _0)]
    Other(#[cause] failure::Error),
}

impl SolveError {
    pub fn is_convergence_failure(&self) -> bool {
        match self {
            SolveError::ConvergenceFailure { .. } => true,
            SolveError::Other(_) => false,
        }
    }

    /// Unwraps `Other` so the engine's own error reaches the caller as is.
    pub fn into_error(self) -> failure::Error {
        match self {
            SolveError::Other(e) => e,
            e => e.into(),
        }
    }
}

impl From<failure::Error> for SolveError {
    fn from(e: failure::Error) -> Self {
        SolveError::Other(e)
    }
}

pub trait Engine {
    fn get_parameter(&self, device: &Device, name: &str) -> Result<f64>;

    fn set_parameter(&mut self, device: &Device, name: &str, value: f64) -> Result<()>;

    /// Runs one nonlinear solve over the whole device state.
    fn solve(
        &mut self,
        device: &Device,
        params: &SolveParams,
    ) -> std::result::Result<(), SolveError>;

    fn contact_list(&self, device: &Device) -> Result<Vec<String>>;

    /// Total current flowing through `contact` at the last converged solution.
    fn contact_current(&self, device: &Device, contact: &str) -> Result<f64>;

    /// Dumps the device state to `path`.
    fn write_devices(&self, device: &Device, path: &Path) -> Result<()>;
}
