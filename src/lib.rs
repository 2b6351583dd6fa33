#[macro_use]
extern crate log;
#[macro_use]
extern crate measure_time;
#[macro_use]
extern crate serde_derive;

pub mod engine;
pub mod measure;
pub mod options;
#[cfg(feature = "plot")]
pub mod plot;
pub mod ramp;
pub mod scenario;
pub mod trace;
pub mod util;

pub use crate::engine::{contact_bias_name, Device, Engine, SolveError, SolveParams};
pub use crate::measure::{all_currents, log_all_currents, Currents, Measurement};
pub use crate::ramp::{ramp_bias, Collector, Observer, RampError, RampParams};
pub use crate::trace::Sweep;

pub type Result<T> = std::result::Result<T, failure::Error>;
