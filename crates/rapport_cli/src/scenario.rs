//! Scripted conversations for offline simulation.
//!
//! A scenario is a list of user messages, each paired with the analysis the
//! mock analyzer will return for it. Presets cover the common arcs; anything
//! else comes from a JSON file.

use anyhow::{Context, Result};
use clap::ValueEnum;
use rapport_core::{EmotionVector, InteractionFeatures, Observation};
use rapport_engine::Analysis;
use serde::Deserialize;
use std::path::Path;

/// One scripted user turn.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStep {
    pub message: String,
    #[serde(flatten)]
    pub analysis: Analysis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub steps: Vec<ScenarioStep>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        let scenario: Scenario = serde_json::from_str(json).context("invalid scenario JSON")?;
        for (i, step) in scenario.steps.iter().enumerate() {
            step.analysis
                .observation
                .validate()
                .with_context(|| format!("step {} of scenario '{}'", i + 1, scenario.name))?;
        }
        Ok(scenario)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Built-in conversation arcs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Kind, curious and open the whole way through.
    Warm,
    /// Insults and pressure from the first message.
    Hostile,
    /// Warm for two thirds of the turns, then hostile.
    Mixed,
}

impl Preset {
    pub fn scenario(self, turns: usize) -> Scenario {
        let steps = (0..turns)
            .map(|i| match self {
                Preset::Warm => warm_step(i),
                Preset::Hostile => hostile_step(i),
                Preset::Mixed if i < turns * 2 / 3 => warm_step(i),
                Preset::Mixed => hostile_step(i),
            })
            .collect();
        Scenario {
            name: format!("{:?}", self).to_lowercase(),
            steps,
        }
    }
}

fn warm_step(i: usize) -> ScenarioStep {
    let mut observation = Observation::new(
        EmotionVector::new(0.6, 0.2, 0.6, 0.4),
        InteractionFeatures {
            question_depth: 0.5,
            empathy_expression: 0.8,
            self_disclosure: 0.5,
            humor: 0.6,
            positivity: 0.8,
            ..Default::default()
        },
    );
    // A new fact every few turns keeps memory growing.
    if i % 4 == 0 {
        observation = observation.with_facts([format!("shared story #{}", i / 4 + 1)]);
    }
    ScenarioStep {
        message: format!("That reminds me of something, want to hear it? ({})", i + 1),
        analysis: Analysis::new(observation, "friendly and curious"),
    }
}

fn hostile_step(i: usize) -> ScenarioStep {
    let observation = Observation::new(
        EmotionVector::new(-0.8, 0.7, 0.0, 0.0),
        InteractionFeatures {
            conflict: 0.9,
            disrespect: 0.8,
            pressure: 0.7,
            harassment: 0.8,
            ..Default::default()
        },
    );
    ScenarioStep {
        message: format!("Nobody asked you. ({})", i + 1),
        analysis: Analysis::new(observation, "insulting and pushy"),
    }
}
