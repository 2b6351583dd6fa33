use std::collections::BTreeMap;

use crate::engine::{Device, Engine};
use crate::util::Engineering;
use crate::Result;

/// Contact name to total contact current.
pub type Currents = BTreeMap<String, f64>;

/// Currents measured after a converged ramp step.
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    pub bias: f64,
    pub currents: Currents,
}

impl Measurement {
    pub fn new(bias: f64, currents: Currents) -> Self {
        Measurement { bias, currents }
    }

    pub fn current(&self, contact: &str) -> Option<f64> {
        self.currents.get(contact).cloned()
    }
}

/// Observer callback: logs the current of every contact on the device.
pub fn log_all_currents(engine: &dyn Engine, device: &Device) -> Result<()> {
    for contact in engine.contact_list(device)? {
        let current = engine.contact_current(device, &contact)?;
        info!("{}\t{}\t{}A", device, contact, Engineering(current));
    }
    Ok(())
}

/// Collector callback: the current of every contact on the device.
pub fn all_currents(engine: &dyn Engine, device: &Device) -> Result<Currents> {
    engine
        .contact_list(device)?
        .into_iter()
        .map(|contact| {
            let current = engine.contact_current(device, &contact)?;
            Ok((contact, current))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scripted::ScriptedEngine;
    use crate::engine::{CompactEngine, MosfetParams};

    #[test]
    fn collects_every_contact() {
        let engine = ScriptedEngine::new("drain", 0.25);
        let currents = all_currents(&engine, &Device::new("dut")).unwrap();
        assert_eq!(currents.len(), 2);
        assert_eq!(currents["drain"], 0.25);
        assert_eq!(currents["source"], -0.25);

        let m = Measurement::new(0.25, currents);
        assert_eq!(m.current("drain"), Some(0.25));
        assert_eq!(m.current("gate"), None);
    }

    #[test]
    fn unknown_device_fails_both_callbacks() {
        let mut engine = CompactEngine::new();
        let device = engine.create_device("mos2d", MosfetParams::default());
        log_all_currents(&engine, &device).unwrap();
        assert_eq!(all_currents(&engine, &device).unwrap().len(), 4);

        let ghost = Device::new("ghost");
        let err = log_all_currents(&engine, &ghost).unwrap_err();
        assert_eq!(err.to_string(), "Device ghost not found");
        assert!(all_currents(&engine, &ghost).is_err());
    }
}
