//! Role baseline templates.
//!
//! A template is a YAML or JSON document holding the baseline config tree for
//! one device role. A missing template is a normal outcome (`Ok(None)`);
//! only unreadable or malformed files are errors.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::models::Node;
use crate::utils::is_valid_hostname;

/// File extensions tried, in order, for a role template
pub const TEMPLATE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Loads the baseline tree for a device role
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn load(&self, role: &str) -> Result<Option<Node>>;
}

/// Templates stored as `<dir>/<role>.yaml` (or `.yml` / `.json`)
#[derive(Debug, Clone)]
pub struct FsTemplateSource {
    dir: PathBuf,
}

impl FsTemplateSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Parse a template document. An empty document is an empty mapping.
pub fn parse_template(content: &str, path: &Path) -> Result<Node> {
    let is_json = path.extension().is_some_and(|e| e == "json");

    let node: Node = if is_json {
        serde_json::from_str(content)
            .with_context(|| format!("Invalid JSON template {}", path.display()))?
    } else {
        serde_yaml::from_str(content)
            .with_context(|| format!("Invalid YAML template {}", path.display()))?
    };

    Ok(if node.is_null() { Node::default() } else { node })
}

#[async_trait]
impl TemplateSource for FsTemplateSource {
    async fn load(&self, role: &str) -> Result<Option<Node>> {
        if !is_valid_hostname(role) {
            return Err(anyhow!("Invalid role name for template lookup: {:?}", role));
        }

        for ext in TEMPLATE_EXTENSIONS {
            let path = self.dir.join(format!("{}.{}", role, ext));
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    tracing::debug!("Loaded template for role '{}' from {}", role, path.display());
                    return parse_template(&content, &path).map(Some);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(anyhow!("Failed to read template {}: {}", path.display(), e));
                }
            }
        }

        tracing::debug!("No template for role '{}' in {}", role, self.dir.display());
        Ok(None)
    }
}

/// Templates held in memory, keyed by role
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateSource {
    templates: HashMap<String, Node>,
}

impl MemoryTemplateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, role: impl Into<String>, template: Node) -> Self {
        self.templates.insert(role.into(), template);
        self
    }
}

#[async_trait]
impl TemplateSource for MemoryTemplateSource {
    async fn load(&self, role: &str) -> Result<Option<Node>> {
        Ok(self.templates.get(role).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_empty_yaml_is_empty_mapping() {
        let node = parse_template("", Path::new("leaf.yaml")).unwrap();
        assert_eq!(node, Node::default());
        let node = parse_template("---\n", Path::new("leaf.yaml")).unwrap();
        assert_eq!(node, Node::default());
    }

    #[test]
    fn test_parse_json_template() {
        let node = parse_template(r#"{"system": {"name": "x"}}"#, Path::new("spine.json")).unwrap();
        assert_eq!(node, Node::from(json!({"system": {"name": "x"}})));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let err = parse_template("a: [1, 2", Path::new("leaf.yaml")).unwrap_err();
        assert!(err.to_string().contains("leaf.yaml"));
    }

    #[tokio::test]
    async fn test_fs_source_loads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("leaf.yaml"),
            "interface:\n  - name: ethernet-1/1\n    admin-state: enable\n",
        )
        .await
        .unwrap();

        let source = FsTemplateSource::new(dir.path());
        let template = source.load("leaf").await.unwrap();
        assert_eq!(
            template,
            Some(Node::from(json!({"interface": [{"name": "ethernet-1/1", "admin-state": "enable"}]})))
        );
    }

    #[tokio::test]
    async fn test_fs_source_falls_back_to_json() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("border.json"), r#"{"a": 1}"#).await.unwrap();

        let source = FsTemplateSource::new(dir.path());
        assert_eq!(source.load("border").await.unwrap(), Some(Node::from(json!({"a": 1}))));
    }

    #[tokio::test]
    async fn test_fs_source_missing_template_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsTemplateSource::new(dir.path());
        assert_eq!(source.load("spine").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fs_source_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsTemplateSource::new(dir.path());
        assert!(source.load("../leaf").await.is_err());
        assert!(source.load("").await.is_err());
    }

    #[test]
    fn test_memory_source() {
        let source = MemoryTemplateSource::new().with_template("leaf", Node::from(json!({"a": 1})));
        assert_eq!(
            tokio_test::block_on(source.load("leaf")).unwrap(),
            Some(Node::from(json!({"a": 1})))
        );
        assert_eq!(tokio_test::block_on(source.load("spine")).unwrap(), None);
    }
}
