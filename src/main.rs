use std::{
    io::{self, BufRead},
    path::PathBuf,
    sync::mpsc::{self, Receiver},
    thread,
};

use anyhow::Context;
use burn::config::Config;
use clap::{Parser, ValueEnum};
use log::{info, warn};
use once_cell::sync::Lazy;
use snake_dqn::{
    algo::DQNAgent,
    checkpoint::Checkpoint,
    config::TrainingConfig,
    env::{EncodingMode, SnakeEnv},
    model::{ConvNetConfig, MlpConfig, QFunction},
    train::{Control, ScoreLog, Trainer},
};

#[cfg(not(feature = "wgpu"))]
mod backend {
    use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};

    pub type DQNBackend = Autodiff<NdArray>;
    pub type Device = NdArrayDevice;
}

#[cfg(feature = "wgpu")]
mod backend {
    use burn::backend::{wgpu::WgpuDevice, Autodiff, Wgpu};

    pub type DQNBackend = Autodiff<Wgpu>;
    pub type Device = WgpuDevice;
}

use backend::DQNBackend;

static DEVICE: Lazy<backend::Device> = Lazy::new(Default::default);

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Ray features with relative turns
    Vector,
    /// Board patch with absolute headings
    Image,
}

impl From<Mode> for EncodingMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Vector => EncodingMode::Vector,
            Mode::Image => EncodingMode::Image,
        }
    }
}

/// Train or watch a DQN agent playing snake
///
/// While running, type `t` to toggle training, `d` to toggle score reporting and `q` to save and quit.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// JSON training config, defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// State encoding, overrides the config
    #[arg(long, value_enum)]
    mode: Option<Mode>,
    /// Learn while playing
    #[arg(long)]
    train: bool,
    /// Ignore any saved checkpoint
    #[arg(long)]
    reset: bool,
    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,
    /// Checkpoint file [default: saved/snake_<mode>.ckpt]
    #[arg(long)]
    checkpoint: Option<PathBuf>,
    /// Episode score log
    #[arg(long, default_value = "saved/scores.csv")]
    scores: PathBuf,
    /// Seed every random number generator
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => TrainingConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => TrainingConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config.env.mode = mode.into();
    }
    if let Some(seed) = cli.seed {
        config.env.seed = Some(seed);
        config.agent.seed = Some(seed.wrapping_add(1));
        config.seed = Some(seed.wrapping_add(2));
    }

    let env = SnakeEnv::new(&config.env)?;
    let lr = config.agent.learning_rate;
    match config.env.mode {
        EncodingMode::Vector => {
            let net = MlpConfig::new(env.input_size(), env.num_actions());
            let online = net.q_function::<DQNBackend>(lr, DEVICE.clone());
            let target = net.q_function::<DQNBackend>(lr, DEVICE.clone());
            run(env, online, target, &config, &cli)
        }
        EncodingMode::Image => {
            let net = ConvNetConfig::new(2 * config.env.view_radius + 1, env.num_actions());
            let online = net.q_function::<DQNBackend>(lr, DEVICE.clone());
            let target = net.q_function::<DQNBackend>(lr, DEVICE.clone());
            run(env, online, target, &config, &cli)
        }
    }
}

fn run<Q: QFunction>(
    env: SnakeEnv,
    online: Q,
    target: Q,
    config: &TrainingConfig,
    cli: &Cli,
) -> anyhow::Result<()> {
    let mut agent = DQNAgent::new(online, target, &config.agent)?;

    let checkpoint = cli.checkpoint.clone().unwrap_or_else(|| {
        let mode = match config.env.mode {
            EncodingMode::Vector => "vector",
            EncodingMode::Image => "image",
        };
        PathBuf::from(format!("saved/snake_{mode}.ckpt"))
    });
    if cli.reset {
        info!("Starting from fresh weights");
    } else if checkpoint.exists() {
        let saved = Checkpoint::load(&checkpoint)
            .with_context(|| format!("failed to read checkpoint {}", checkpoint.display()))?;
        agent.restore(saved)?;
    } else {
        warn!("No checkpoint at {}, starting from fresh weights", checkpoint.display());
    }

    let scores = ScoreLog::open(&cli.scores)?;
    let mut trainer = Trainer::new(env, agent, config, cli.train)?
        .with_checkpoint_path(checkpoint)
        .with_score_log(scores);

    let controls = spawn_controls();
    trainer.run(cli.ticks, &controls)?;

    info!(
        "Stopped after {} ticks and {} episodes, {} transitions pushed",
        trainer.ticks(),
        trainer.episodes(),
        trainer.agent().push_count()
    );
    Ok(())
}

/// Read single-letter commands from stdin on a background thread
fn spawn_controls() -> Receiver<Control> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let control = match line.trim() {
                "t" => Control::ToggleTraining,
                "d" => Control::ToggleDisplay,
                "q" => Control::Quit,
                "" => continue,
                other => {
                    warn!("Unknown command {other:?}, expected t, d or q");
                    continue;
                }
            };
            if tx.send(control).is_err() {
                break;
            }
        }
    });
    rx
}
