// SPDX-FileCopyrightText: 2026 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use plfanzen_challenge_builder::config::{Config, form_state_to_yaml, load_form_state};
use plfanzen_challenge_builder::pipeline::emit;
use plfanzen_challenge_builder::{
    Counter, FieldKind, FormState, Output, build_document, validate_field,
};

#[derive(Parser, Debug)]
#[command(name = "challenge-builder", about = "Build challenge.yml files for the CTF platform")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write an empty form with a single service to fill in
    Template {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Validate a form and print the generated document
    Preview {
        #[arg(long)]
        form: PathBuf,
    },
    /// Validate a form and write the generated document to a file
    Generate {
        #[arg(long)]
        form: PathBuf,
        /// Defaults to $CHALLENGE_OUTPUT or challenge.yml
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check a single value (name, tag, flag-tag, flag-static, dns-name)
    Check { kind: FieldKind, value: String },
}

fn build_from_file(form_path: &Path) -> anyhow::Result<String> {
    let state = load_form_state(form_path)?;
    let preview = state.tag_preview();
    if !preview.is_empty() {
        tracing::info!("{preview}");
    }
    match build_document(&state.collect()) {
        Ok(yaml) => Ok(yaml),
        Err(e) => {
            eprintln!("{}", e.report());
            std::process::exit(1);
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Command::Template { out } => {
            let state = FormState::initial(&mut Counter::default());
            let yaml = form_state_to_yaml(&state)?;
            let output = out.map(Output::File).unwrap_or(Output::Preview);
            emit(&yaml, &output, &mut std::io::stdout())?;
        }
        Command::Preview { form } => {
            let yaml = build_from_file(&form)?;
            emit(&yaml, &Output::Preview, &mut std::io::stdout())?;
        }
        Command::Generate { form, out } => {
            let yaml = build_from_file(&form)?;
            let path = out.unwrap_or(config.output_path);
            emit(&yaml, &Output::File(path), &mut std::io::stdout())?;
        }
        Command::Check { kind, value } => {
            let result = validate_field(kind, &value);
            println!("{}", serde_json::to_string(&result)?);
            if !result.is_valid() {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
