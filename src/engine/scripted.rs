use std::collections::BTreeMap;
use std::path::Path;

use failure::format_err;

use crate::engine::{contact_bias_name, Device, Engine, SolveError, SolveParams};
use crate::Result;

pub type Outcome = Box<dyn FnMut(f64, f64) -> std::result::Result<(), SolveError>>;

pub struct ScriptedEngine {
    pub contact: String,
    pub parameters: BTreeMap<String, f64>,
    /// Bias of the last converged solve.
    pub converged: f64,
    /// Every bias handed to `solve`, in order.
    pub attempts: Vec<f64>,
    pub solve_params: Vec<SolveParams>,
    outcome: Outcome,
}

impl ScriptedEngine {
    pub fn new(contact: &str, start: f64) -> Self {
        Self::with_outcome(contact, start, Box::new(|_, _| Ok(())))
    }

    pub fn with_outcome(contact: &str, start: f64, outcome: Outcome) -> Self {
        let mut parameters = BTreeMap::new();
        parameters.insert(contact_bias_name(contact), start);
        ScriptedEngine {
            contact: contact.to_owned(),
            parameters,
            converged: start,
            attempts: Vec::new(),
            solve_params: Vec::new(),
            outcome,
        }
    }

    pub fn bias(&self) -> f64 {
        self.parameters[&contact_bias_name(&self.contact)]
    }
}

impl Engine for ScriptedEngine {
    fn get_parameter(&self, _: &Device, name: &str) -> Result<f64> {
        self.parameters
            .get(name)
            .cloned()
            .ok_or_else(|| format_err!("Parameter {} not found", name))
    }

    fn set_parameter(&mut self, _: &Device, name: &str, value: f64) -> Result<()> {
        self.parameters.insert(name.to_owned(), value);
        Ok(())
    }

    fn solve(&mut self, _: &Device, params: &SolveParams) -> std::result::Result<(), SolveError> {
        let bias = self.bias();
        self.attempts.push(bias);
        self.solve_params.push(*params);
        (self.outcome)(bias, self.converged)?;
        self.converged = bias;
        Ok(())
    }

    fn contact_list(&self, _: &Device) -> Result<Vec<String>> {
        Ok(vec![self.contact.clone(), "source".to_owned()])
    }

    /// Ohmic: the current equals the applied bias.
    fn contact_current(&self, _: &Device, contact: &str) -> Result<f64> {
        if contact == self.contact {
            Ok(self.converged)
        } else {
            Ok(-self.converged)
        }
    }

    fn write_devices(&self, _: &Device, _: &Path) -> Result<()> {
        Ok(())
    }
}

pub fn convergence_failure() -> SolveError {
    SolveError::ConvergenceFailure {
        device: "scripted".to_owned(),
        iterations: 0,
    }
}
