use anyhow::{anyhow, Context as _, Result};
use std::fmt;
use std::str::FromStr;
use tera::{Context, Tera};

use crate::models::{DeviceRecord, Node};

const TEXT_TEMPLATE_NAME: &str = "config";

/// Output encoding for a merged config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
    /// Rendered through a user-supplied tera template
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
            OutputFormat::Text => "cfg",
        }
    }

    /// Output emitted for a device whose role has no template
    pub fn placeholder(&self) -> &'static str {
        match self {
            OutputFormat::Yaml => "---\n",
            OutputFormat::Json => "{}\n",
            OutputFormat::Text => "",
        }
    }

    /// Separator written before a document when several share one stream.
    /// Only YAML needs one, and not when the document already opens with it.
    pub fn stream_separator(&self, content: &str) -> &'static str {
        match self {
            OutputFormat::Yaml if !content.starts_with("---") => "---\n",
            _ => "",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            "text" | "cli" => Ok(OutputFormat::Text),
            other => Err(anyhow!("Unknown output format: {}", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
            OutputFormat::Text => "text",
        })
    }
}

/// Serializes merged trees into their final text form
#[derive(Debug)]
pub struct Renderer {
    format: OutputFormat,
    tera: Option<Tera>,
}

impl Renderer {
    pub fn yaml() -> Self {
        Self {
            format: OutputFormat::Yaml,
            tera: None,
        }
    }

    pub fn json() -> Self {
        Self {
            format: OutputFormat::Json,
            tera: None,
        }
    }

    /// Text renderer. The template sees the merged tree as `config` and the
    /// inventory record as `device`.
    pub fn text(template: &str) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEXT_TEMPLATE_NAME, template)
            .map_err(|e| anyhow!("Invalid template: {}", e))?;

        Ok(Self {
            format: OutputFormat::Text,
            tera: Some(tera),
        })
    }

    /// Build a renderer for a format; text output needs template source
    pub fn for_format(format: OutputFormat, text_template: Option<&str>) -> Result<Self> {
        match format {
            OutputFormat::Yaml => Ok(Self::yaml()),
            OutputFormat::Json => Ok(Self::json()),
            OutputFormat::Text => {
                let template = text_template
                    .ok_or_else(|| anyhow!("Text output requires a text template"))?;
                Self::text(template)
            }
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn render(&self, device: &DeviceRecord, tree: &Node) -> Result<String> {
        match self.format {
            OutputFormat::Yaml => render_yaml(tree),
            OutputFormat::Json => render_json(tree),
            OutputFormat::Text => {
                let tera = self
                    .tera
                    .as_ref()
                    .ok_or_else(|| anyhow!("Text renderer has no template"))?;

                let mut context = Context::new();
                context.insert("config", tree);
                context.insert("device", device);

                tera.render(TEXT_TEMPLATE_NAME, &context)
                    .map_err(|e| anyhow!("Template rendering failed for {}: {}", device.name, e))
            }
        }
    }
}

/// Render a tree as YAML, keys in tree order
pub fn render_yaml(tree: &Node) -> Result<String> {
    serde_yaml::to_string(tree).context("Failed to serialize config as YAML")
}

pub fn render_json(tree: &Node) -> Result<String> {
    let mut out = serde_json::to_string_pretty(tree).context("Failed to serialize config as JSON")?;
    out.push('\n');
    Ok(out)
}
