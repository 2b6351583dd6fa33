#[macro_use]
extern crate log;

use failure::Error;
use structopt::StructOpt;

use mos2d_ramp::engine::CompactEngine;
use mos2d_ramp::options::{CliOpt, Command, Opt, PlotOpt, ResultsOpt, SimulateOpt};
use mos2d_ramp::scenario::{ScenarioResults, GATE_SWEEP_FILE};
use mos2d_ramp::trace::ImportableTrace;
use mos2d_ramp::util::Engineering;
use mos2d_ramp::{Result, Sweep};

fn load_gate_sweeps(opt: &ResultsOpt) -> Result<Vec<(String, Sweep)>> {
    opt.dirs
        .iter()
        .map(|dir| {
            let sweep = Sweep::from_csv(dir.join(GATE_SWEEP_FILE), "gate")?;
            Ok((dir.display().to_string(), sweep))
        })
        .collect()
}

#[cfg(feature = "plot")]
fn plot_results(opt: &SimulateOpt, results: &ScenarioResults) -> Result<()> {
    use mos2d_ramp::plot::{plot_iv, Axes, Curve};

    plot_iv(
        &opt.output.join("id_vd.png"),
        &Axes {
            title: &format!("I-V Curve at Gate Bias = {} V", opt.initial_gate_bias),
            x_label: "Drain Voltage (V)",
            y_label: "Drain Current (A)",
        },
        &[Curve {
            label: "drain".to_owned(),
            points: results.drain.iv("drain").collect(),
        }],
    )?;
    plot_iv(
        &opt.output.join("id_vg.png"),
        &Axes {
            title: &format!("I-V Curve at Drain Bias = {} V", opt.drain_bias),
            x_label: "Gate Voltage (V)",
            y_label: "Drain Current (A)",
        },
        &[Curve {
            label: "drain".to_owned(),
            points: results.gate.iv("drain").collect(),
        }],
    )
}

#[cfg(not(feature = "plot"))]
fn plot_results(_: &SimulateOpt, _: &ScenarioResults) -> Result<()> {
    Ok(())
}

fn simulate(opt: &SimulateOpt) -> Result<()> {
    let mut engine = CompactEngine::new();
    let device = engine.create_device(opt.device.as_str(), opt.mosfet());

    let results = opt.scenario().run(&mut engine, &device, &opt.output)?;
    for (v, i) in results.gate.iv("drain") {
        debug!("Vg {:.3}V\tId {}A", v, Engineering(i));
    }
    plot_results(opt, &results)
}

fn report(opt: &ResultsOpt) -> Result<()> {
    for (name, sweep) in load_gate_sweeps(opt)? {
        if sweep.is_empty() {
            warn!("{}: no measurements", name);
            continue;
        }
        info!("{}: {} point(s)", name, sweep.measurements.len());
        for (v, i) in sweep.iv(&opt.contact) {
            info!("{:.3}V\t{}A", v, Engineering(i));
        }
    }
    Ok(())
}

#[cfg(feature = "plot")]
fn plot(opt: &PlotOpt) -> Result<()> {
    use mos2d_ramp::plot::{plot_iv, Axes, Curve};

    let curves = load_gate_sweeps(&opt.results)?
        .into_iter()
        .map(|(label, sweep)| Curve {
            label,
            points: sweep.iv(&opt.results.contact).collect(),
        })
        .collect::<Vec<_>>();
    let y_label = format!("{} current (A)", opt.results.contact);
    plot_iv(
        &opt.output,
        &Axes {
            title: "Gate Voltage vs. Contact Current",
            x_label: "Gate Voltage (V)",
            y_label: &y_label,
        },
        &curves,
    )?;
    info!("Plot written to {}", opt.output.display());
    Ok(())
}

#[cfg(not(feature = "plot"))]
fn plot(_: &PlotOpt) -> Result<()> {
    Err(failure::err_msg(
        "Plotting is not available, rebuild with --features plot",
    ))
}

fn main() -> std::result::Result<(), Error> {
    let opt = CliOpt::from_args();
    opt.initialize_logging()?;

    match &opt.command {
        Command::Simulate(sim) => simulate(sim),
        Command::Report(results) => report(results),
        Command::Plot(p) => plot(p),
    }
}
