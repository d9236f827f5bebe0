use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::info;

use traffic_signal_sim::simulation::{
    self, build_grid_demo, build_intersection_world, DemandMode, DemandSpawner, PolicyKind,
    RenderFn, RunSummary, SimConfig, SimWorld, Simulation, DEFAULT_SPAWN_RATE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// One intersection fed by a NS and an EW approach
    Intersection,
    /// Routed traffic on a 5x5 block grid
    Grid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    Fixed,
    Actuated,
    Learned,
}

impl From<PolicyArg> for PolicyKind {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Fixed => PolicyKind::Fixed,
            PolicyArg::Actuated => PolicyKind::Actuated,
            PolicyArg::Learned => PolicyKind::Learned,
        }
    }
}

#[derive(Parser)]
#[command(name = "traffic_signal_sim")]
#[command(about = "Headless traffic signal simulation")]
struct Cli {
    /// Network to simulate
    #[arg(long, value_enum, default_value = "intersection")]
    scenario: Scenario,

    /// Signal policy applied to every intersection
    #[arg(long, value_enum, default_value = "fixed")]
    policy: PolicyArg,

    /// Time step per tick in seconds
    #[arg(long, default_value = "1.0")]
    dt: f32,

    /// Simulated seconds to run (inclusive)
    #[arg(long, default_value = "60.0")]
    max_time: f32,

    /// Seed for demand and routing
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Spawn probability per entry point per tick
    #[arg(long, default_value_t = DEFAULT_SPAWN_RATE)]
    spawn_rate: f64,

    /// Log an ASCII frame after every tick
    #[arg(long)]
    render: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    run_headless(&cli)
}

fn build_world(cli: &Cli) -> Result<(SimWorld, DemandMode)> {
    let config = SimConfig::default().with_seed(cli.seed);
    let policy = PolicyKind::from(cli.policy);
    let built = match cli.scenario {
        Scenario::Intersection => {
            build_intersection_world(config, policy).map(|world| (world, DemandMode::Approaches))
        }
        Scenario::Grid => {
            build_grid_demo(config, policy).map(|world| (world, DemandMode::BorderToBorder))
        }
    };
    built.with_context(|| format!("Failed to build {:?} scenario", cli.scenario))
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(cli: &Cli) -> Result<()> {
    info!(
        "Running traffic simulation: scenario={:?} policy={:?} seed={}",
        cli.scenario, cli.policy, cli.seed
    );

    let (world, mode) = build_world(cli)?;
    let mut spawner =
        DemandSpawner::new(cli.seed, cli.spawn_rate, mode).context("Invalid spawn rate")?;
    info!(
        "Demand: {:?} at {:.2} vehicles per entry per tick",
        spawner.mode(),
        spawner.spawn_rate()
    );
    let mut sim = Simulation::new(world, cli.dt, cli.max_time)?;

    let mut frame = simulation::render;
    let summary = if cli.render {
        let render: &mut RenderFn<'_> = &mut frame;
        sim.run(&mut spawner, Some(render))?
    } else {
        sim.run(&mut spawner, None)?
    };

    log_summary(&summary, sim.now(), sim.world());
    Ok(())
}

fn log_summary(summary: &RunSummary, elapsed: f32, world: &SimWorld) {
    let throughput = if elapsed > 0.0 {
        summary.exited as f32 / elapsed * 60.0
    } else {
        0.0
    };

    info!("=== SIMULATION COMPLETE ===");
    info!("Elapsed time: {:.2}s", elapsed);
    info!("Total vehicles entered: {}", summary.entered);
    info!("Total vehicles exited: {}", summary.exited);
    info!("Vehicles still on the network: {}", world.vehicles().len());
    info!("Average travel time: {:.2}s", summary.avg_travel_time_s);
    info!("Throughput: {:.2} vehicles/min", throughput);
    info!("SUMMARY: {}", summary);
}
