use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use forge_configgen::config::Config;
use forge_configgen::inventory::load_devices;
use forge_configgen::render::{render_json, render_yaml, OutputFormat, Renderer};
use forge_configgen::templates::{parse_template, FsTemplateSource};
use forge_configgen::utils::{device_config_filename, is_valid_hostname};
use forge_configgen::{ConfigGenerator, GeneratedConfig, IdentityKeys, MergeEngine, Node};

#[derive(Parser)]
#[command(name = "forge-configgen")]
#[command(about = "Generate device configs from inventory and role templates", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate configs for every device in the inventory files
    Generate {
        /// Inventory files (JSON or YAML): device query responses or normalized records
        #[arg(required = true)]
        inventory: Vec<PathBuf>,

        /// Directory holding <role>.yaml templates (env: TEMPLATES_DIR)
        #[arg(long, short = 't')]
        templates_dir: Option<String>,

        /// Output format: yaml, json or text (env: OUTPUT_FORMAT)
        #[arg(long, short = 'f')]
        format: Option<OutputFormat>,

        /// Tera template for text output (env: TEXT_TEMPLATE)
        #[arg(long)]
        text_template: Option<String>,

        /// Write <device>.<ext> files here instead of stdout (env: OUTPUT_DIR)
        #[arg(long, short = 'o')]
        output_dir: Option<String>,

        /// Comma-separated identity keys for list merging (env: IDENTITY_KEYS)
        #[arg(long)]
        identity_keys: Option<IdentityKeys>,
    },

    /// Merge an override document onto a base document
    Merge {
        base: PathBuf,

        #[arg(value_name = "OVERRIDE")]
        overlay: PathBuf,

        /// Output format: yaml or json
        #[arg(long, short = 'f', default_value = "yaml")]
        format: OutputFormat,

        /// Comma-separated identity keys for list merging (env: IDENTITY_KEYS)
        #[arg(long)]
        identity_keys: Option<IdentityKeys>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so configs can be piped from stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forge_configgen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::load();

    match cli.command {
        Commands::Generate {
            inventory,
            templates_dir,
            format,
            text_template,
            output_dir,
            identity_keys,
        } => {
            if let Some(dir) = templates_dir {
                cfg.templates_dir = dir;
            }
            if let Some(format) = format {
                cfg.output_format = format;
            }
            if let Some(path) = text_template {
                cfg.text_template = path;
            }
            if let Some(dir) = output_dir {
                cfg.output_dir = dir;
            }
            if let Some(keys) = identity_keys {
                cfg.identity_keys = keys;
            }
            generate(&cfg, &inventory).await
        }
        Commands::Merge {
            base,
            overlay,
            format,
            identity_keys,
        } => {
            let keys = identity_keys.unwrap_or(cfg.identity_keys);
            merge_files(&base, &overlay, format, keys).await
        }
    }
}

async fn generate(cfg: &Config, inventory: &[PathBuf]) -> Result<()> {
    tracing::info!("Templates: {}", cfg.templates_dir);
    tracing::info!("Output format: {}", cfg.output_format);
    tracing::debug!("Identity keys: {}", cfg.identity_keys);

    let text_template = if cfg.output_format == OutputFormat::Text {
        if cfg.text_template.is_empty() {
            return Err(anyhow!("Text output requires --text-template or TEXT_TEMPLATE"));
        }
        Some(
            tokio::fs::read_to_string(&cfg.text_template)
                .await
                .with_context(|| format!("Failed to read text template {}", cfg.text_template))?,
        )
    } else {
        None
    };
    let renderer = Renderer::for_format(cfg.output_format, text_template.as_deref())?;

    let mut devices = Vec::new();
    for path in inventory {
        devices.extend(load_devices(path).await?);
    }
    tracing::info!("Generating configs for {} device(s)", devices.len());

    let generator = ConfigGenerator::new(
        Arc::new(FsTemplateSource::new(&cfg.templates_dir)),
        MergeEngine::new(cfg.identity_keys.clone()),
        renderer,
    );

    let stream = devices.len() > 1;
    let mut failed = 0usize;
    for (device, result) in devices.iter().zip(generator.generate_all(&devices).await) {
        let outcome = match result {
            Ok(generated) => emit(cfg, &generated, stream).await,
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            tracing::error!("{}: {:#}", device.name, e);
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(anyhow!("{} of {} device(s) failed", failed, devices.len()));
    }
    Ok(())
}

async fn emit(cfg: &Config, generated: &GeneratedConfig, stream: bool) -> Result<()> {
    if cfg.output_dir.is_empty() {
        if stream {
            print!("{}", cfg.output_format.stream_separator(&generated.content));
        }
        print!("{}", generated.content);
        return Ok(());
    }

    if !is_valid_hostname(&generated.device) {
        return Err(anyhow!("Refusing to write config for invalid device name {:?}", generated.device));
    }

    tokio::fs::create_dir_all(&cfg.output_dir)
        .await
        .with_context(|| format!("Failed to create output dir {}", cfg.output_dir))?;

    let path = Path::new(&cfg.output_dir)
        .join(device_config_filename(&generated.device, cfg.output_format.extension()));
    tokio::fs::write(&path, &generated.content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!("Wrote {}", path.display());
    Ok(())
}

async fn read_tree(path: &Path) -> Result<Node> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_template(&content, path)
}

async fn merge_files(base: &Path, overlay: &Path, format: OutputFormat, keys: IdentityKeys) -> Result<()> {
    let base = read_tree(base).await?;
    let overlay = read_tree(overlay).await?;

    let merged = MergeEngine::new(keys).merge(&base, &overlay);
    let out = match format {
        OutputFormat::Yaml => render_yaml(&merged)?,
        OutputFormat::Json => render_json(&merged)?,
        OutputFormat::Text => return Err(anyhow!("Text output needs a device; use generate")),
    };
    print!("{}", out);
    Ok(())
}
