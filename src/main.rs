//! Link Topology Editor (CLI).
//!
//! Lädt eine Feature-Sammlung in eine Edit-Session und meldet pro Link
//! Kreuzungs- und Merge-Kandidaten.

use anyhow::Context;
use clap::{Parser, Subcommand};
use link_topology_editor::app::use_cases::topology::{check_crossings, merge_candidates};
use link_topology_editor::{EditSession, EditorOptions, Feature};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "link-topology-editor", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Prüft Links auf Kreuzungen und zusammenführbare Nachbarn
    Check {
        /// JSON-Datei mit Features (Liste oder `{ "features": [...] }`)
        features: PathBuf,
        /// Optionen als TOML
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Akzeptierte Formen der Eingabedatei.
#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureInput {
    Collection { features: Vec<Feature> },
    List(Vec<Feature>),
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Check { features, config } => check(&features, config.as_deref()),
    }
}

fn load_features(path: &Path) -> anyhow::Result<Vec<Feature>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("{} nicht lesbar", path.display()))?;
    let input: FeatureInput = serde_json::from_str(&content)
        .with_context(|| format!("{} ist keine gültige Feature-Sammlung", path.display()))?;
    Ok(match input {
        FeatureInput::Collection { features } | FeatureInput::List(features) => features,
    })
}

fn check(path: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    log::info!(
        "Link Topology Editor v{} prüft {}",
        env!("CARGO_PKG_VERSION"),
        path.display()
    );
    let options = config
        .map(EditorOptions::load_from_file)
        .unwrap_or_default();
    let features = load_features(path)?;
    let session = EditSession::with_features(options, features)
        .context("Features bilden kein gültiges Netzwerk")?;

    let mut links: Vec<_> = session.map().links_iter().map(|link| link.id.clone()).collect();
    links.sort();

    let mut findings = 0;
    for link in &links {
        for crossing in check_crossings(&session, link)? {
            findings += 1;
            println!(
                "{}: Kreuzung ({:?}) mit {} bei ({:.3}, {:.3}), {:.1} px",
                link,
                crossing.kind,
                crossing.candidate_link,
                crossing.x(),
                crossing.position.y,
                crossing.distance
            );
        }
        for candidate in merge_candidates(&session, link)? {
            findings += 1;
            println!(
                "{}: zusammenführbar mit {} ({:?} / {:?})",
                link, candidate.other, candidate.end, candidate.other_end
            );
        }
    }
    log::info!("{} Links geprüft, {} Befunde", links.len(), findings);
    Ok(())
}
