use std::fs;
use std::path::Path;

use crate::engine::{contact_bias_name, Device, Engine, SolveParams};
use crate::measure::all_currents;
use crate::ramp::{ramp_bias, Collector, RampParams};
use crate::trace::{ExportableTrace, Sweep};
use crate::Result;

pub const GATE_SWEEP_FILE: &str = "gate_sweep.tsv";
pub const DRAIN_SWEEP_FILE: &str = "drain_sweep.tsv";

#[derive(Clone, Debug, PartialEq)]
pub struct Scenario {
    pub gate: String,
    pub drain: String,
    /// Gate bias held during the drain sweep.
    pub initial_gate_bias: f64,
    pub drain_bias: f64,
    pub gate_bias: f64,
    pub step_size: f64,
    pub min_step: f64,
    pub ramp_solve: SolveParams,
    /// Potential-only solves at zero bias.
    pub equilibrium_solve: SolveParams,
    pub equilibrium_passes: usize,
    pub drift_diffusion_solve: SolveParams,
}

impl Default for Scenario {
    fn default() -> Self {
        Scenario {
            gate: "gate".to_owned(),
            drain: "drain".to_owned(),
            initial_gate_bias: -3.0,
            drain_bias: 0.2,
            gate_bias: 5.0,
            step_size: 0.01,
            min_step: 0.001,
            ramp_solve: SolveParams::new(100, 1e-8, 1e30),
            equilibrium_solve: SolveParams::new(30, 1e-12, 1e-13),
            equilibrium_passes: 2,
            drift_diffusion_solve: SolveParams::new(30, 1e-5, 1e30),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScenarioResults {
    pub initial_gate: Sweep,
    pub drain: Sweep,
    pub gate: Sweep,
}

impl Scenario {
    fn ramp_params(&self, end_bias: f64) -> RampParams {
        RampParams::new(end_bias, self.step_size, self.min_step, self.ramp_solve)
    }

    fn sweep(
        &self,
        engine: &mut dyn Engine,
        device: &Device,
        contact: &str,
        end_bias: f64,
    ) -> Result<Sweep> {
        info!("Ramping {} to {}V", contact, end_bias);
        let measurements = ramp_bias(
            engine,
            device,
            contact,
            &self.ramp_params(end_bias),
            Collector::new(all_currents),
        )?;
        info!("{} reached {}V in {} step(s)", contact, end_bias, measurements.len());
        Ok(Sweep::new(contact, measurements))
    }

    /// Zero bias on every contact, then the equilibrium and drift-diffusion
    /// solves.
    pub fn equilibrate(&self, engine: &mut dyn Engine, device: &Device) -> Result<()> {
        debug_time!("equilibrium");
        for contact in engine.contact_list(device)? {
            engine.set_parameter(device, &contact_bias_name(&contact), 0.0)?;
        }
        for _ in 0..self.equilibrium_passes {
            engine
                .solve(device, &self.equilibrium_solve)
                .map_err(|e| e.into_error())?;
        }
        engine
            .solve(device, &self.drift_diffusion_solve)
            .map_err(|e| e.into_error())?;
        Ok(())
    }

    /// Runs the whole scenario and writes the sweeps and the device state
    /// into `output_dir`.
    pub fn run(
        &self,
        engine: &mut dyn Engine,
        device: &Device,
        output_dir: &Path,
    ) -> Result<ScenarioResults> {
        info_time!("scenario on {}", device);
        fs::create_dir_all(output_dir)?;

        self.equilibrate(engine, device)?;

        let initial_gate = self.sweep(engine, device, &self.gate, self.initial_gate_bias)?;
        let drain = self.sweep(engine, device, &self.drain, self.drain_bias)?;
        let gate = self.sweep(engine, device, &self.gate, self.gate_bias)?;

        drain.save_as_csv(&output_dir.join(DRAIN_SWEEP_FILE))?;
        gate.save_as_csv(&output_dir.join(GATE_SWEEP_FILE))?;
        engine.write_devices(device, &output_dir.join(format!("{}_state.tsv", device)))?;
        info!("Results written to {}", output_dir.display());

        Ok(ScenarioResults {
            initial_gate,
            drain,
            gate,
        })
    }
}
