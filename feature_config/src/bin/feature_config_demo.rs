// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! A small CLI for exercising the feature configuration engine against a
//! JSON toolchain description, useful for manually poking at a
//! configuration while developing one.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use feature_config::config::ToolchainConfig;
use feature_config::variables::Scope;
use feature_config::Engine;

#[derive(Parser, Debug)]
#[command(name = "feature_config_demo")]
#[command(about = "Resolves and expands a toolchain feature configuration", long_about = None)]
struct Args {
    /// Path to a JSON-encoded `ToolchainConfig`.
    #[arg(long, value_name = "FILE")]
    config: PathBuf,

    /// Selectable names to request, in addition to the configuration's
    /// defaults.
    #[arg(long = "feature", value_name = "NAME")]
    requested: Vec<String>,

    /// Build action to expand a command line and environment for.
    #[arg(long, value_name = "ACTION")]
    action: String,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let raw = fs::read_to_string(&args.config)
        .with_context(|| format!("reading {}", args.config.display()))?;
    let config: ToolchainConfig =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", args.config.display()))?;

    let engine = Engine::build(&config).context("building feature configuration engine")?;
    let feature_configuration = engine
        .get_feature_configuration(args.requested)
        .context("resolving requested features")?;

    let scope = Scope::new();
    let command_line = feature_configuration.get_command_line(&args.action, &scope, None)?;
    println!("command line: {command_line:?}");

    let environment = feature_configuration.get_environment(&args.action, &scope)?;
    for (key, value) in environment.iter() {
        println!("env: {key}={value}");
    }

    if let Ok(tool) = feature_configuration.get_tool_for_action(&args.action) {
        println!("tool: {} ({:?})", tool.path, tool.execution_requirements);
    }

    Ok(())
}
