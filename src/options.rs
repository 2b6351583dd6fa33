use std::path::PathBuf;

use log::LevelFilter;
use simplelog::{ColorChoice, Config, TerminalMode};
use structopt::StructOpt;

use crate::engine::{MosfetParams, SolveParams};
use crate::scenario::Scenario;
use crate::Result;

pub trait Opt {
    fn initialize_logging(&self) -> Result<()>;
}

#[derive(StructOpt, Debug)]
pub struct SimulateOpt {
    /// Results directory, created if missing
    #[structopt(
        short = "o",
        long = "output",
        default_value = "results",
        parse(from_os_str)
    )]
    pub output: PathBuf,
    #[structopt(long = "device", default_value = "mos2d")]
    pub device: String,
    /// Gate bias held during the drain sweep
    #[structopt(
        long = "initial-gate-bias",
        default_value = "-3.0",
        allow_hyphen_values = true
    )]
    pub initial_gate_bias: f64,
    #[structopt(long = "drain-bias", default_value = "0.2", allow_hyphen_values = true)]
    pub drain_bias: f64,
    #[structopt(long = "gate-bias", default_value = "5.0", allow_hyphen_values = true)]
    pub gate_bias: f64,
    #[structopt(long = "step", default_value = "0.01")]
    pub step_size: f64,
    #[structopt(long = "min-step", default_value = "0.001")]
    pub min_step: f64,
    #[structopt(long = "max-iterations", default_value = "100")]
    pub max_iterations: u32,
    #[structopt(long = "rel-error", default_value = "1e-8")]
    pub rel_error: f64,
    #[structopt(long = "abs-error", default_value = "1e30")]
    pub abs_error: f64,
    #[structopt(long = "vth", default_value = "0.7", allow_hyphen_values = true)]
    pub vth: f64,
    /// Subthreshold slope factor
    #[structopt(long = "slope-factor", default_value = "1.3")]
    pub n: f64,
    /// µCox·W/L in A/V²
    #[structopt(long = "beta", default_value = "2e-4")]
    pub beta: f64,
    #[structopt(long = "lambda", default_value = "0.05")]
    pub lambda: f64,
    #[structopt(long = "rs", default_value = "50")]
    pub rs: f64,
    #[structopt(long = "rd", default_value = "50")]
    pub rd: f64,
    #[structopt(long = "temperature", default_value = "300")]
    pub temperature: f64,
}

impl SimulateOpt {
    pub fn scenario(&self) -> Scenario {
        Scenario {
            initial_gate_bias: self.initial_gate_bias,
            drain_bias: self.drain_bias,
            gate_bias: self.gate_bias,
            step_size: self.step_size,
            min_step: self.min_step,
            ramp_solve: SolveParams::new(self.max_iterations, self.rel_error, self.abs_error),
            ..Scenario::default()
        }
    }

    pub fn mosfet(&self) -> MosfetParams {
        MosfetParams {
            vth: self.vth,
            n: self.n,
            beta: self.beta,
            lambda: self.lambda,
            rs: self.rs,
            rd: self.rd,
            temperature: self.temperature,
        }
    }
}

#[derive(StructOpt, Debug)]
pub struct ResultsOpt {
    /// Results directories written by `simulate`
    #[structopt(required = true, parse(from_os_str))]
    pub dirs: Vec<PathBuf>,
    /// Contact whose current is reported
    #[structopt(long = "contact", default_value = "drain")]
    pub contact: String,
}

#[derive(StructOpt, Debug)]
pub struct PlotOpt {
    #[structopt(flatten)]
    pub results: ResultsOpt,
    #[structopt(
        short = "o",
        long = "output",
        default_value = "iv.png",
        parse(from_os_str)
    )]
    pub output: PathBuf,
}

#[derive(StructOpt, Debug)]
pub enum Command {
    /// Run the MOSFET scenario on the compact engine
    #[structopt(name = "simulate")]
    Simulate(SimulateOpt),
    /// Log the gate sweeps of one or more results directories
    #[structopt(name = "report")]
    Report(ResultsOpt),
    /// Plot the gate sweeps of one or more results directories
    #[structopt(name = "plot")]
    Plot(PlotOpt),
}

#[derive(StructOpt, Debug)]
#[structopt(name = "mos2d-ramp")]
pub struct CliOpt {
    /// More logging, repeat for trace output
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    pub verbose: u8,
    #[structopt(subcommand)]
    pub command: Command,
}

impl CliOpt {
    fn level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

impl Opt for CliOpt {
    fn initialize_logging(&self) -> Result<()> {
        simplelog::TermLogger::init(
            self.level(),
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulate_defaults_match_the_scenario() {
        let opt = CliOpt::from_iter(&["mos2d-ramp", "simulate"]);
        assert_eq!(opt.level(), LevelFilter::Info);
        match opt.command {
            Command::Simulate(sim) => {
                assert_eq!(sim.scenario(), Scenario::default());
                assert_eq!(sim.mosfet(), MosfetParams::default());
                assert_eq!(sim.output, PathBuf::from("results"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn negative_biases_parse() {
        let opt = CliOpt::from_iter(&[
            "mos2d-ramp",
            "-vv",
            "simulate",
            "--initial-gate-bias",
            "-1.5",
            "--drain-bias",
            "-0.1",
        ]);
        assert_eq!(opt.level(), LevelFilter::Trace);
        match opt.command {
            Command::Simulate(sim) => {
                let scenario = sim.scenario();
                assert_eq!(scenario.initial_gate_bias, -1.5);
                assert_eq!(scenario.drain_bias, -0.1);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn plot_takes_several_directories() {
        let opt = CliOpt::from_iter(&["mos2d-ramp", "plot", "a", "b", "--contact", "source"]);
        match opt.command {
            Command::Plot(plot) => {
                assert_eq!(plot.results.dirs.len(), 2);
                assert_eq!(plot.results.contact, "source");
                assert_eq!(plot.output, PathBuf::from("iv.png"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
