use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rapport_core::{RapportConfig, RelationshipEngine, RelationshipState};
use rapport_engine::providers::{EchoResponder, ScriptedAnalyzer};
use rapport_engine::{ConversationService, SessionId};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod scenario;

use scenario::{Preset, Scenario};

const DEFAULT_TURNS: usize = 30;
const SIMULATED_USER: &str = "simulator";

#[derive(Parser, Debug)]
#[command(name = "rapport", author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long, global = true, default_value = "rapport.toml", env = "RAPPORT_CONFIG")]
    config: PathBuf,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scripted conversation and print the relationship after each turn
    Simulate {
        /// Built-in conversation arc
        #[arg(short, long, value_enum, conflicts_with = "scenario")]
        preset: Option<Preset>,

        /// JSON scenario file
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of turns (defaults to the scenario length, or 30 for presets)
        #[arg(short, long)]
        turns: Option<usize>,

        /// Seed for the emotion jitter
        #[arg(long, conflicts_with = "no_noise")]
        seed: Option<u64>,

        /// Disable the emotion jitter entirely
        #[arg(long)]
        no_noise: bool,

        /// Print one JSON object per turn
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML
    InspectConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TurnLine {
    turn: u64,
    state: RelationshipState,
    dwell: u32,
    trust: f32,
    comfort: f32,
    affection: f32,
    score: f32,
    affinity: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    transition: Option<String>,
    reply: String,
}

impl TurnLine {
    fn render(&self) -> String {
        let marker = self
            .transition
            .as_ref()
            .map(|t| format!("  [{}]", t))
            .unwrap_or_default();
        format!(
            "turn {:>3}  {:<8}  dwell {:>3}  T={:.3} K={:.3} A={:.3} C={:.3}{}",
            self.turn,
            self.state.as_str(),
            self.dwell,
            self.trust,
            self.comfort,
            self.affection,
            self.score,
            marker
        )
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let config = RapportConfig::load_or_default(&args.config);

    match args.command {
        Command::Simulate {
            preset,
            scenario,
            turns,
            seed,
            no_noise,
            json,
        } => {
            let scenario = match scenario {
                Some(path) => Scenario::load(&path)?,
                None => preset
                    .unwrap_or(Preset::Warm)
                    .scenario(turns.unwrap_or(DEFAULT_TURNS)),
            };
            let turns = turns.unwrap_or(scenario.len());
            simulate(config, scenario, turns, seed, no_noise, json).await
        }
        Command::InspectConfig => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

async fn simulate(
    mut config: RapportConfig,
    scenario: Scenario,
    turns: usize,
    seed: Option<u64>,
    no_noise: bool,
    json: bool,
) -> Result<()> {
    if seed.is_some() {
        config.session.noise_seed = seed;
    }
    let engine = if no_noise {
        RelationshipEngine::deterministic(config.clone())
    } else {
        RelationshipEngine::new(config.clone())
    };

    if turns > scenario.len() {
        warn!(
            "Scenario '{}' has {} steps; the remaining {} turns use the neutral fallback",
            scenario.name,
            scenario.len(),
            turns - scenario.len()
        );
    }
    info!("Simulating {} turns of '{}'", turns, scenario.name);

    let messages: Vec<String> = scenario.steps.iter().map(|s| s.message.clone()).collect();
    let analyzer = ScriptedAnalyzer::new(scenario.steps.into_iter().map(|s| s.analysis));
    let service = ConversationService::new(config, Arc::new(analyzer), Arc::new(EchoResponder))
        .with_engine(engine);

    let mut session_id: Option<SessionId> = None;
    let mut previous = RelationshipState::Stranger;
    for i in 0..turns {
        let message = messages.get(i).map(String::as_str).unwrap_or("...");
        let reply = service
            .process_message(session_id, SIMULATED_USER, message)
            .await
            .with_context(|| format!("turn {} failed", i + 1))?;
        session_id = Some(reply.session_id);

        let session = service
            .store()
            .get(reply.session_id)
            .await
            .context("session vanished during simulation")?;
        let state = &session.state;
        let current = state.relationship();
        let line = TurnLine {
            turn: state.interaction_count,
            state: current,
            dwell: state.state_duration(),
            trust: state.metrics.trust,
            comfort: state.metrics.comfort,
            affection: state.metrics.affection,
            score: state.metrics.score,
            affinity: reply.affinity,
            transition: (current != previous).then(|| format!("{} -> {}", previous, current)),
            reply: reply.message,
        };
        previous = current;

        if json {
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!("{}", line.render());
        }
    }

    if !json {
        if let Some(id) = session_id {
            if let Some(summary) = service.store().get(id).await.map(|s| s.summary()) {
                println!(
                    "final: {} with affinity {}% after {} turns",
                    summary.relationship, summary.affinity, summary.turn_count
                );
            }
        }
    }
    Ok(())
}
