use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use physlab_input::Key;
use physlab_kernel::{FrameStatus, HeadlessHost, LabConfig, LabInspector, LabKind, Session};
use physlab_render::{DebugTextRenderer, Renderer};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "physlab-cli", about = "Headless runner for the physics labs")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the available labs
    Info,
    /// Print a lab's full configuration as YAML
    Config {
        #[arg(long, default_value = "barrier-course")]
        lab: LabKind,
    },
    /// Run a lab for a fixed number of ticks with keys held down
    Run {
        #[arg(long, default_value = "barrier-course")]
        lab: LabKind,
        /// YAML overrides; its `kind` wins over --lab
        #[arg(long)]
        config: Option<PathBuf>,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "60")]
        ticks: u64,
        /// Seconds of real time per tick
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,
        /// Keys held for the whole run, e.g. KeyD or ArrowUp
        #[arg(long, value_delimiter = ',')]
        hold: Vec<Key>,
        /// Start with barriers/limits on or off
        #[arg(long)]
        limits: Option<bool>,
        /// Flip the limits flag before these ticks
        #[arg(long, value_delimiter = ',')]
        toggle_at: Vec<u64>,
        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
        /// Print the final frame as text
        #[arg(long)]
        frame: bool,
    },
    /// Check that toggling twice rebuilds the starting layout
    ToggleCheck {
        #[arg(long, default_value = "vehicle-arena")]
        lab: LabKind,
        /// Ticks to run before toggling
        #[arg(short, long, default_value = "30")]
        ticks: u64,
    },
}

fn load_config(lab: LabKind, path: Option<&PathBuf>) -> anyhow::Result<LabConfig> {
    match path {
        Some(path) => LabConfig::load(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(LabConfig::for_kind(lab)),
    }
}

fn layout(session: &Session<HeadlessHost>) -> anyhow::Result<Vec<(&'static str, [f32; 3])>> {
    let world = session.world().context("session stopped")?;
    let snapshot = LabInspector::snapshot(world)?;
    Ok(snapshot.entities.iter().map(|e| (e.name, e.position)).collect())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("physlab-cli v{}", env!("CARGO_PKG_VERSION"));
            for kind in LabKind::ALL {
                let config = LabConfig::for_kind(kind);
                println!(
                    "{:<15} {}: control={:?} step={:?} limits={}",
                    kind.name(),
                    kind.title(),
                    config.control,
                    config.step_mode,
                    config.limits_enabled
                );
            }
        }
        Commands::Config { lab } => {
            print!("{}", LabConfig::for_kind(lab).to_yaml()?);
        }
        Commands::Run {
            lab,
            config,
            ticks,
            dt,
            hold,
            limits,
            toggle_at,
            json,
            frame,
        } => {
            let mut config = load_config(lab, config.as_ref())?;
            if let Some(limits) = limits {
                config.limits_enabled = limits;
            }
            let mut session = Session::start(HeadlessHost, config).context("starting session")?;

            let press = |session: &mut Session<HeadlessHost>| {
                for key in &hold {
                    session.key_event(*key, true);
                }
            };
            press(&mut session);

            let mut clamped = 0;
            for tick in 0..ticks {
                if toggle_at.contains(&tick) {
                    let state = session.reconfigure()?;
                    tracing::info!(tick, label = session.toggle_label(), "toggled to {state:?}");
                    // A rebuild starts with no keys held.
                    press(&mut session);
                }
                match session.tick(dt)? {
                    FrameStatus::Continue(report) => clamped += report.clamped,
                    FrameStatus::Stopped => bail!("session stopped at tick {tick}"),
                }
            }

            let world = session.world().context("session stopped")?;
            let snapshot = LabInspector::snapshot(world)?;
            if json {
                println!("{}", snapshot.to_json()?);
            } else {
                println!("{}", snapshot.summary);
                for entity in &snapshot.entities {
                    println!("  {entity}");
                }
                println!("clamped: {clamped}");
            }
            if frame {
                let renderer = DebugTextRenderer::new();
                print!("{}", renderer.render(world.scene(), world.camera()));
            }
        }
        Commands::ToggleCheck { lab, ticks } => {
            let mut session = Session::start(HeadlessHost, LabConfig::for_kind(lab))?;
            let initial = layout(&session)?;
            let initial_state = session.state();
            for _ in 0..ticks {
                session.tick(1.0 / 60.0)?;
            }

            let flipped = session.reconfigure()?;
            println!("{:?}: {} entities, button \"{}\"", flipped, layout(&session)?.len(), session.toggle_label());
            let restored = session.reconfigure()?;
            let after = layout(&session)?;
            println!("{:?}: {} entities, button \"{}\"", restored, after.len(), session.toggle_label());

            let ok = restored == initial_state && after == initial;
            println!("Match: {}", if ok { "OK" } else { "MISMATCH" });
            if !ok {
                bail!("toggling twice did not restore the initial layout");
            }
        }
    }

    Ok(())
}
