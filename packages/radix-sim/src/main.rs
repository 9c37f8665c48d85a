//! Standalone CLI for manually inspecting synthetic detection output.

use clap::Parser;
use radix_sim::{AesaSimulator, FmcwSimulator, PulseDopplerSimulator, RadarSimulator, Target};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "radix-sim", about = "Synthetic multi-vendor radar detection generator")]
struct Args {
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 10)]
    ticks: u32,

    /// Simulated seconds per tick.
    #[arg(long, default_value_t = 1.0)]
    dt: f64,

    /// Seed for reproducible noise and false alarms.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);

    let mut fmcw = FmcwSimulator::default();
    fmcw.add_target(Target::new(1, [1200.0, 800.0, 50.0], [-15.0, 5.0, 0.0], 8.0));

    let mut pulse_doppler = PulseDopplerSimulator::default();
    pulse_doppler.add_target(Target::new(2, [3000.0, -2000.0, 1500.0], [-200.0, 150.0, -5.0], 20.0));

    let mut aesa = AesaSimulator::default();
    aesa.add_target(Target::new(3, [500.0, 500.0, 100.0], [0.0, -20.0, 0.0], 5.0));

    info!(ticks = args.ticks, dt = args.dt, "starting synthetic sensor run");

    let start = chrono::Utc::now();
    for tick in 0..args.ticks {
        let timestamp = radix_sim::target::tick_timestamp(start, tick as f64 * args.dt);

        fmcw.update_targets(args.dt);
        pulse_doppler.update_targets(args.dt);
        aesa.update_targets(args.dt);

        let mut detections = fmcw.simulate_frame(timestamp, &mut rng);
        detections.extend(pulse_doppler.simulate_frame(timestamp, &mut rng));
        detections.extend(aesa.simulate_frame(timestamp, &mut rng));
        aesa.sweep_beam();

        for detection in &detections {
            println!("{}", serde_json::to_string(detection).unwrap());
        }
    }
}
