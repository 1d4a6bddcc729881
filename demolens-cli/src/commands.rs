//! CLI subcommand handlers.

use crate::{Commands, ConfigAction};
use demolens_core::codec;
use demolens_core::registry::{self, Options};
use demolens_core::{DemoConfig, InterpretationMethod};
use serde_json::{Value as Json, json};
use std::path::{Path, PathBuf};
use tracing::info;

/// Interpretation method as accepted on the command line.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodArg {
    Default,
    Shapley,
    None,
}

impl From<MethodArg> for InterpretationMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Default => Self::Default,
            MethodArg::Shapley => Self::Shapley,
            MethodArg::None => Self::None,
        }
    }
}

/// Handle a CLI subcommand.
pub fn handle_command(command: Commands, workspace: &Path, config: DemoConfig) -> anyhow::Result<()> {
    match command {
        Commands::Components => handle_components(),
        Commands::Describe { name, options } => {
            let component = registry::resolve_with(&name, &parse_options(options.as_deref())?)?;
            print_json(&component.template_context())
        }
        Commands::Sample { name, options } => {
            let component = registry::resolve_with(&name, &parse_options(options.as_deref())?)?;
            print_json(&component.generate_sample())
        }
        Commands::Interpret {
            demo,
            inputs,
            method,
            seed,
        } => {
            let mut config = config;
            if let Some(seed) = seed {
                config.interpretation.seed = seed;
            }
            handle_interpret(demo, &inputs, method.into(), &config)
        }
        Commands::Flag {
            name,
            value,
            slot,
            dir,
        } => handle_flag(&name, &value, slot, &flag_dir(dir, &config)),
        Commands::Restore { name, stored, dir } => {
            let component = registry::resolve(&name)?;
            let stored = parse_raw(&stored)?;
            let restored = component.restore_flagged(&flag_dir(dir, &config), &stored, None)?;
            print_json(&restored)
        }
        Commands::Config { action } => handle_config(action, workspace),
    }
}

fn handle_components() -> anyhow::Result<()> {
    let registry = registry::builtin();
    println!("Registered component types ({}):", registry.len());
    for name in registry.names() {
        match registry.component_of(name) {
            Some(component) if component != name => println!("  {name} -> {component}"),
            _ => println!("  {name}"),
        }
    }
    Ok(())
}

fn handle_interpret(
    demo: crate::demos::Demo,
    inputs: &[String],
    method: InterpretationMethod,
    config: &DemoConfig,
) -> anyhow::Result<()> {
    let interface = demo.interface(config)?;
    let raw = if inputs.is_empty() {
        demo.default_inputs(&interface)
    } else {
        inputs.iter().map(|s| parse_raw(s)).collect::<anyhow::Result<Vec<_>>>()?
    };

    let output = interface.process(&raw)?;
    let interpretation = interface.interpret_with(&raw, method)?;
    info!(demo = ?demo, method = ?method, "Interpreted demo");
    print_json(&json!({
        "output": output,
        "interpretation": interpretation,
    }))
}

fn handle_flag(name: &str, value: &str, slot: Option<String>, dir: &Path) -> anyhow::Result<()> {
    let component = registry::resolve(name)?;
    let raw = parse_raw(value)?;
    let slot = slot.unwrap_or_else(|| format!("{}_input", component.name()));
    std::fs::create_dir_all(dir)?;
    let stored = component.save_flagged(dir, &slot, &raw, None)?;
    info!(component = component.name(), slot = %slot, dir = %dir.display(), "Flagged value");
    print_json(&stored)
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(".demolens");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&DemoConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = demolens_core::config::load_config(Some(workspace), None)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}

fn flag_dir(dir: Option<PathBuf>, config: &DemoConfig) -> PathBuf {
    dir.unwrap_or_else(|| config.flagging.dir.clone())
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a command line value: an existing file becomes an upload object,
/// valid JSON is taken as is, anything else is a plain string.
pub fn parse_raw(input: &str) -> anyhow::Result<Json> {
    let path = Path::new(input);
    if path.is_file() {
        let bytes = std::fs::read(path)?;
        let mime = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or("application/octet-stream", codec::mime_for_extension);
        return Ok(json!({
            "name": input,
            "size": bytes.len(),
            "data": codec::encode_data_url(mime, &bytes),
        }));
    }
    Ok(serde_json::from_str(input).unwrap_or_else(|_| Json::String(input.to_string())))
}

fn parse_options(options: Option<&str>) -> anyhow::Result<Options> {
    match options {
        None => Ok(Options::new()),
        Some(text) => match serde_json::from_str(text)? {
            Json::Object(map) => Ok(map),
            other => anyhow::bail!("options must be a JSON object, got {other}"),
        },
    }
}
