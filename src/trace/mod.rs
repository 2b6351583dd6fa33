pub mod file;

use itertools::Itertools;

use crate::measure::Measurement;

pub use self::file::{ExportableTrace, ImportableTrace};

/// Measurements of one collector ramp, labelled with the swept contact.
#[derive(Clone, Debug, PartialEq)]
pub struct Sweep {
    pub contact: String,
    pub measurements: Vec<Measurement>,
}

impl Sweep {
    pub fn new<S: Into<String>>(contact: S, measurements: Vec<Measurement>) -> Self {
        Sweep {
            contact: contact.into(),
            measurements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn biases(&self) -> Vec<f64> {
        self.measurements.iter().map(|m| m.bias).collect_vec()
    }

    /// Every contact measured at least once, sorted by name.
    pub fn contacts(&self) -> Vec<String> {
        self.measurements
            .iter()
            .flat_map(|m| m.currents.keys().cloned())
            .sorted()
            .dedup()
            .collect_vec()
    }

    /// `(bias, current)` pairs for `contact`, skipping steps where it was not
    /// measured.
    pub fn iv<'a>(&'a self, contact: &'a str) -> impl Iterator<Item = (f64, f64)> + 'a {
        self.measurements
            .iter()
            .filter_map(move |m| m.current(contact).map(|i| (m.bias, i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::Currents;

    fn measurement(bias: f64, currents: &[(&str, f64)]) -> Measurement {
        Measurement::new(
            bias,
            currents
                .iter()
                .map(|(c, i)| (c.to_string(), *i))
                .collect::<Currents>(),
        )
    }

    #[test]
    fn iv_skips_unmeasured_steps() {
        let sweep = Sweep::new(
            "gate",
            vec![
                measurement(0.1, &[("drain", 1e-9), ("source", -1e-9)]),
                measurement(0.2, &[("source", -2e-9)]),
                measurement(0.3, &[("drain", 3e-9)]),
            ],
        );

        assert_eq!(sweep.biases(), vec![0.1, 0.2, 0.3]);
        assert_eq!(sweep.contacts(), vec!["drain", "source"]);
        assert_eq!(
            sweep.iv("drain").collect_vec(),
            vec![(0.1, 1e-9), (0.3, 3e-9)]
        );
        assert!(sweep.iv("bulk").next().is_none());
        assert!(!sweep.is_empty());
        assert!(Sweep::new("gate", Vec::new()).is_empty());
    }
}
