use std::collections::BTreeMap;
use std::path::Path;

use failure::format_err;

use crate::engine::{contact_bias_name, Device, Engine, SolveError, SolveParams};
use crate::Result;

const BOLTZMANN_EV: f64 = 8.617_333_262e-5;

pub const CONTACTS: [&str; 4] = ["gate", "drain", "source", "bulk"];

/// Long-channel nMOS parameters, EKV-style interpolation between weak and
/// strong inversion.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MosfetParams {
    pub vth: f64,
    /// Subthreshold slope factor.
    pub n: f64,
    /// µCox·W/L, A/V².
    pub beta: f64,
    /// Channel-length modulation, 1/V.
    pub lambda: f64,
    pub rs: f64,
    pub rd: f64,
    pub temperature: f64,
}

impl Default for MosfetParams {
    fn default() -> Self {
        MosfetParams {
            vth: 0.7,
            n: 1.3,
            beta: 2e-4,
            lambda: 0.05,
            rs: 50.0,
            rd: 50.0,
            temperature: 300.0,
        }
    }
}

fn softplus(x: f64) -> f64 {
    if x > 30.0 {
        x
    } else {
        x.exp().ln_1p()
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl MosfetParams {
    fn thermal_voltage(&self) -> f64 {
        BOLTZMANN_EV * self.temperature
    }

    fn specific_current(&self) -> f64 {
        let vt = self.thermal_voltage();
        2.0 * self.n * self.beta * vt * vt
    }

    /// Forward/reverse normalized charge term and its derivative w.r.t. `u`.
    fn charge(&self, u: f64) -> (f64, f64) {
        let vt = self.thermal_voltage();
        let x = u / (2.0 * vt);
        let sp = softplus(x);
        (sp * sp, sp * sigmoid(x) / vt)
    }

    /// Channel current for terminal voltages referenced to the bulk, plus
    /// its partial derivatives w.r.t. the source and drain voltages.
    fn channel(&self, vg: f64, vs: f64, vd: f64) -> (f64, f64, f64) {
        let i_spec = self.specific_current();
        let vp = (vg - self.vth) / self.n;
        let (f_s, df_s) = self.charge(vp - vs);
        let (f_d, df_d) = self.charge(vp - vd);
        let g = f_s - f_d;
        let clm = 1.0 + self.lambda * (vd - vs);

        let id = i_spec * g * clm;
        let did_dvs = i_spec * (-df_s * clm - g * self.lambda);
        let did_dvd = i_spec * (df_d * clm + g * self.lambda);
        (id, did_dvs, did_dvd)
    }

    /// Residual of the drain current equation with the series resistances
    /// folded in, and its derivative.
    fn residual(&self, biases: &Biases, id: f64) -> (f64, f64) {
        let vs = biases.source - biases.bulk + id * self.rs;
        let vd = biases.drain - biases.bulk - id * self.rd;
        let vg = biases.gate - biases.bulk;
        let (f, df_dvs, df_dvd) = self.channel(vg, vs, vd);
        (id - f, 1.0 - self.rs * df_dvs + self.rd * df_dvd)
    }
}

struct Biases {
    gate: f64,
    drain: f64,
    source: f64,
    bulk: f64,
}

struct CompactDevice {
    model: MosfetParams,
    parameters: BTreeMap<String, f64>,
    drain_current: f64,
}

impl CompactDevice {
    fn new(model: MosfetParams) -> Self {
        CompactDevice {
            model,
            parameters: CONTACTS
                .iter()
                .map(|c| (contact_bias_name(c), 0.0))
                .collect(),
            drain_current: 0.0,
        }
    }

    fn bias(&self, contact: &str) -> f64 {
        self.parameters
            .get(&contact_bias_name(contact))
            .cloned()
            .unwrap_or(0.0)
    }

    fn biases(&self) -> Biases {
        Biases {
            gate: self.bias("gate"),
            drain: self.bias("drain"),
            source: self.bias("source"),
            bulk: self.bias("bulk"),
        }
    }

    /// Newton iteration on the drain current, starting from the last
    /// converged solution. Returns the number of iterations on success.
    fn newton(&self, params: &SolveParams) -> std::result::Result<(f64, u32), u32> {
        let biases = self.biases();
        let mut id = self.drain_current;

        for iteration in 1..=params.max_iterations {
            let (r, dr) = self.model.residual(&biases, id);
            if !dr.is_finite() || dr <= 0.0 {
                return Err(iteration);
            }
            let delta = -r / dr;
            id += delta;
            if !id.is_finite() {
                return Err(iteration);
            }

            let abs_error = delta.abs();
            let rel_error = if delta == 0.0 {
                0.0
            } else {
                abs_error / id.abs()
            };
            trace!(
                "iteration {}: id {:e}, abs {:e}, rel {:e}",
                iteration,
                id,
                abs_error,
                rel_error
            );
            if abs_error < params.abs_error && rel_error < params.rel_error {
                return Ok((id, iteration));
            }
        }
        Err(params.max_iterations)
    }
}

#[derive(Serialize)]
struct StateRecord<'a> {
    device: &'a str,
    name: &'a str,
    value: f64,
}

/// Engine backed by an analytic four-terminal MOSFET, solved for the drain
/// current by Newton iteration.
#[derive(Default)]
pub struct CompactEngine {
    devices: BTreeMap<String, CompactDevice>,
}

impl CompactEngine {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn create_device<S: Into<String>>(&mut self, name: S, model: MosfetParams) -> Device {
        let device = Device::new(name);
        self.devices
            .insert(device.name().to_owned(), CompactDevice::new(model));
        device
    }

    fn device(&self, device: &Device) -> Result<&CompactDevice> {
        self.devices
            .get(device.name())
            .ok_or_else(|| format_err!("Device {} not found", device))
    }

    fn device_mut(&mut self, device: &Device) -> Result<&mut CompactDevice> {
        self.devices
            .get_mut(device.name())
            .ok_or_else(|| format_err!("Device {} not found", device))
    }
}

impl Engine for CompactEngine {
    fn get_parameter(&self, device: &Device, name: &str) -> Result<f64> {
        self.device(device)?
            .parameters
            .get(name)
            .cloned()
            .ok_or_else(|| format_err!("Parameter {} not found on device {}", name, device))
    }

    fn set_parameter(&mut self, device: &Device, name: &str, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(format_err!("Parameter {} can't be set to {}", name, value));
        }
        self.device_mut(device)?
            .parameters
            .insert(name.to_owned(), value);
        Ok(())
    }

    fn solve(
        &mut self,
        device: &Device,
        params: &SolveParams,
    ) -> std::result::Result<(), SolveError> {
        let state = self.device_mut(device)?;
        match state.newton(params) {
            Ok((id, iterations)) => {
                trace!("{} converged in {} iteration(s)", device, iterations);
                state.drain_current = id;
                Ok(())
            }
            Err(iterations) => Err(SolveError::ConvergenceFailure {
                device: device.name().to_owned(),
                iterations,
            }),
        }
    }

    fn contact_list(&self, device: &Device) -> Result<Vec<String>> {
        self.device(device)?;
        Ok(CONTACTS.iter().map(|c| c.to_string()).collect())
    }

    fn contact_current(&self, device: &Device, contact: &str) -> Result<f64> {
        let id = self.device(device)?.drain_current;
        match contact {
            "drain" => Ok(id),
            "source" => Ok(-id),
            "gate" | "bulk" => Ok(0.0),
            _ => Err(format_err!("Contact {} not found on device {}", contact, device)),
        }
    }

    fn write_devices(&self, device: &Device, path: &Path) -> Result<()> {
        let state = self.device(device)?;
        let mut out = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)?;
        for (name, value) in state.parameters.iter() {
            out.serialize(StateRecord {
                device: device.name(),
                name,
                value: *value,
            })?;
        }
        out.serialize(StateRecord {
            device: device.name(),
            name: "drain_current",
            value: state.drain_current,
        })?;
        out.flush()?;
        Ok(())
    }
}
