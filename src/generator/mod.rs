use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::builders::builder_for_platform;
use crate::merge::MergeEngine;
use crate::models::{DeviceRecord, Node};
use crate::render::Renderer;
use crate::templates::TemplateSource;

/// GeneratedConfig is the rendered output for one device
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedConfig {
    pub device: String,
    pub role: String,
    pub content: String,
    /// False when the role had no template and the placeholder was emitted
    pub template_found: bool,
}

/// ConfigGenerator runs template lookup, tree building, merge and rendering
/// for each device
pub struct ConfigGenerator {
    templates: Arc<dyn TemplateSource>,
    engine: MergeEngine,
    renderer: Renderer,
}

impl ConfigGenerator {
    pub fn new(templates: Arc<dyn TemplateSource>, engine: MergeEngine, renderer: Renderer) -> Self {
        Self {
            templates,
            engine,
            renderer,
        }
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Build the device's override tree and merge it onto a role template
    pub fn merge_device(&self, device: &DeviceRecord, template: &Node) -> Result<Node> {
        let builder = builder_for_platform(&device.platform);
        let overlay = builder
            .build(device)
            .with_context(|| format!("Failed to build {} config for {}", builder.name(), device.name))?;

        tracing::debug!(
            "Merging {} override for {} onto '{}' template",
            builder.name(),
            device.name,
            device.role
        );
        Ok(self.engine.merge(template, &overlay))
    }

    async fn load_template(&self, role: &str) -> Result<Option<Node>> {
        self.templates
            .load(role)
            .await
            .with_context(|| format!("Failed to load template for role '{}'", role))
    }

    /// Merge and render one device against an already loaded role template
    fn render_device(&self, device: &DeviceRecord, template: Option<&Node>) -> Result<GeneratedConfig> {
        let Some(template) = template else {
            tracing::warn!(
                "No template for role '{}', emitting placeholder for {}",
                device.role,
                device.name
            );
            return Ok(GeneratedConfig {
                device: device.name.clone(),
                role: device.role.clone(),
                content: self.renderer.format().placeholder().to_string(),
                template_found: false,
            });
        };

        let merged = self.merge_device(device, template)?;
        let content = self.renderer.render(device, &merged)?;

        tracing::info!("Generated config for {} (role: {})", device.name, device.role);
        Ok(GeneratedConfig {
            device: device.name.clone(),
            role: device.role.clone(),
            content,
            template_found: true,
        })
    }

    /// Generate the config for one device
    pub async fn generate(&self, device: &DeviceRecord) -> Result<GeneratedConfig> {
        let template = self.load_template(&device.role).await?;
        self.render_device(device, template.as_ref())
    }

    /// Generate configs for many devices. Each distinct role template is loaded
    /// once, concurrently, and shared read-only by every device of that role.
    /// Results keep input order; one device failing does not stop the others.
    pub async fn generate_all(&self, devices: &[DeviceRecord]) -> Vec<Result<GeneratedConfig>> {
        let mut roles: Vec<&str> = Vec::new();
        for device in devices {
            if !roles.contains(&device.role.as_str()) {
                roles.push(&device.role);
            }
        }
        tracing::debug!("Loading {} role template(s) for {} device(s)", roles.len(), devices.len());

        let loaded = join_all(roles.iter().map(|role| self.load_template(role))).await;
        let templates: HashMap<&str, Result<Option<Node>>> = roles.into_iter().zip(loaded).collect();

        devices
            .iter()
            .map(|device| match templates.get(device.role.as_str()) {
                Some(Ok(template)) => self.render_device(device, template.as_ref()),
                Some(Err(e)) => Err(anyhow!("{:#}", e)),
                None => Err(anyhow!("No template lookup for role '{}'", device.role)),
            })
            .collect()
    }
}
