//! Moodline CLI
//!
//! Command-line interface for Moodline:
//! - Ask a running server for insights or a mood prediction
//! - Analyze a history file in-process
//! - Generate a default config file

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use moodline::api::dto::{InsightsResponse, MoodPredictionResponse};
use moodline::collaborator::{ChatCompletionsClient, ScriptedGenerator, TextGenerator};
use moodline::config::Config;
use moodline::insights::InsightEngine;
use moodline::WellnessHistory;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "moodline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Wellness-signal analytics for mood timelines")]
#[command(long_about = "Moodline turns mood, sleep, focus and XP history into trends,\ncorrelations, a next-day mood forecast and recommendations.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8000", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Request insights from a running server
    Insights {
        /// History file (JSON with moodData, sleepData, focusData, xpData)
        #[arg(short = 'F', long)]
        file: PathBuf,
    },

    /// Request a next-day mood prediction from a running server
    Predict {
        /// History file
        #[arg(short = 'F', long)]
        file: PathBuf,
    },

    /// Run the insight engine in-process
    Analyze {
        /// History file
        #[arg(short = 'F', long)]
        file: PathBuf,
        /// Skip the collaborator and use local analysis only
        #[arg(long)]
        offline: bool,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let json = match cli.format.as_str() {
        "json" => true,
        "table" => false,
        other => bail!("Unknown output format: {}. Use: table, json", other),
    };

    match cli.command {
        Commands::Insights { file } => {
            let history = read_history(&file)?;
            let client = reqwest::Client::new();

            let response = client
                .post(format!("{}/api/v1/insights", cli.api_url))
                .json(&history)
                .send()
                .await
                .with_context(|| format!("Failed to reach {}", cli.api_url))?;

            let body = response_json(response).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                print_insights(&serde_json::from_value(body)?);
            }
        }

        Commands::Predict { file } => {
            let history = read_history(&file)?;
            let client = reqwest::Client::new();

            let response = client
                .post(format!("{}/api/v1/mood-prediction", cli.api_url))
                .json(&history)
                .send()
                .await
                .with_context(|| format!("Failed to reach {}", cli.api_url))?;

            let body = response_json(response).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                print_prediction(&serde_json::from_value(body)?);
            }
        }

        Commands::Analyze { file, offline } => {
            let history = read_history(&file)?;
            let config = Config::load_default();

            let generator: Arc<dyn TextGenerator> = if offline || !config.collaborator.has_api_key() {
                if !offline {
                    eprintln!("No collaborator API key configured, running offline");
                }
                Arc::new(ScriptedGenerator::unavailable())
            } else {
                Arc::new(ChatCompletionsClient::new(config.collaborator.client_config())?)
            };

            let engine = InsightEngine::new(generator, config.insight_config());
            let insights = InsightsResponse::from(engine.generate(history).await?);

            if json {
                println!("{}", serde_json::to_string_pretty(&insights)?);
            } else {
                print_insights(&insights);
            }
        }

        Commands::Config { output } => {
            let config = moodline::config::generate_default_config();

            match output {
                Some(path) => {
                    // Create parent directory if needed
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn read_history(path: &Path) -> anyhow::Result<WellnessHistory> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid history file {:?}", path))
}

async fn response_json(response: reqwest::Response) -> anyhow::Result<serde_json::Value> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or(text);
        bail!("Request failed ({}): {}", status, message);
    }
    Ok(response.json().await?)
}

fn print_insights(insights: &InsightsResponse) {
    println!("Mood trend:  {}", insights.mood_trend);
    println!(
        "Tomorrow:    {} ({:.0}% confidence, {} via {})",
        insights.prediction.next_day_mood,
        insights.prediction.confidence * 100.0,
        insights.prediction.source,
        insights.prediction.model
    );
    println!();

    println!("{:<20} | {:>8}", "Correlation", "r");
    println!("{}", "-".repeat(31));
    for (pair, r) in &insights.correlations {
        println!("{:<20} | {:>8.3}", pair, r);
    }
    println!();

    println!("Recommendations:");
    for rec in &insights.recommendations {
        println!("  - {}", rec);
    }

    if !insights.patterns.is_empty() {
        println!();
        println!("Patterns:");
        for pattern in &insights.patterns {
            println!("  - {}", pattern);
        }
    }
}

fn print_prediction(prediction: &MoodPredictionResponse) {
    println!("Predicted mood: {}", prediction.predicted_mood);
    println!("Score:          {:.2}/10", prediction.predicted_score);
    println!("Confidence:     {:.0}%", prediction.confidence * 100.0);
    println!(
        "Model:          {}{}",
        prediction.model,
        if prediction.fallback { " (fallback)" } else { "" }
    );
}
