//! Conversion options for mdocx.
//!
//! [`ConvertOptions`] is the option set both converters consume. It can be
//! built in code or loaded from an `mdocx.toml` file via [`Config`], which
//! also carries named style presets under `[templates.<name>]`.
//!
//! ## Environment Variable Expansion
//!
//! String values loaded from a file support `${VAR}` and `${VAR:-default}`:
//!
//! - `title`, `author`, `subject`, `description`
//! - `image_output_dir`
//! - `diagrams.kroki_url`, `diagrams.command`

mod expand;

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdocx.toml";

/// How heading anchors are written into generated markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingAnchorStyle {
    /// No explicit anchors.
    #[default]
    None,
    /// `## Title <a id="title"></a>`
    Inline,
    /// `## Title {#title}`
    Attribute,
}

/// Page orientation of generated documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    #[default]
    Portrait,
    Landscape,
}

/// Diagram rendering backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramEngine {
    /// Diagram blocks stay as code blocks.
    #[default]
    None,
    /// HTTP rendering through a Kroki server.
    Kroki,
    /// Local rendering command (e.g. `mmdc`).
    Command,
}

/// Diagram rendering settings (`[diagrams]`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiagramsConfig {
    pub engine: DiagramEngine,
    /// Kroki server URL, required for the `kroki` engine.
    pub kroki_url: Option<String>,
    /// Program to run, required for the `command` engine.
    pub command: Option<String>,
    /// Command arguments. `{input}`, `{output}` and `{theme}` are substituted.
    pub args: Vec<String>,
    /// Per-diagram timeout.
    pub timeout_secs: u64,
    /// Deadline for all diagrams of one conversion call.
    pub deadline_secs: Option<u64>,
    /// Rasters wider than this are downscaled.
    pub max_width: u32,
    /// Rasters taller than this are downscaled.
    pub max_height: u32,
    /// Render DPI, used when rasterizing vector output.
    pub dpi: u32,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            engine: DiagramEngine::None,
            kroki_url: None,
            command: None,
            args: ["-i", "{input}", "-o", "{output}", "-t", "{theme}", "-b", "white"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            timeout_secs: 30,
            deadline_secs: None,
            max_width: 1600,
            max_height: 2400,
            dpi: 192,
        }
    }
}

impl DiagramsConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

/// List reconstruction settings (`[list_indent]`).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ListIndentConfig {
    /// Left margin of one nesting level, in points.
    pub unit_pt: f32,
    /// Leading non-breaking spaces per nesting level.
    pub nbsp_per_level: usize,
}

impl Default for ListIndentConfig {
    fn default() -> Self {
        Self {
            unit_pt: 18.0,
            nbsp_per_level: 4,
        }
    }
}

/// Visual style preset applied to generated documents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StylePreset {
    pub body_font: String,
    pub code_font: String,
    /// Hex RGB without `#`.
    pub heading_color: String,
    /// Body text size in points.
    pub base_size_pt: usize,
    /// Code text size in points.
    pub code_size_pt: usize,
}

impl Default for StylePreset {
    fn default() -> Self {
        Self {
            body_font: "Calibri".to_owned(),
            code_font: "Consolas".to_owned(),
            heading_color: "1F3864".to_owned(),
            base_size_pt: 11,
            code_size_pt: 10,
        }
    }
}

/// Options consumed by both converters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Named style preset from `[templates]`.
    pub template: Option<String>,
    /// Theme passed to the diagram renderer.
    pub diagram_theme: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub description: Option<String>,
    /// Insert a table of contents before the body.
    pub generate_toc: bool,
    /// Keep external hyperlinks when producing markup.
    pub preserve_links: bool,
    /// Return images as separate files instead of inline data URIs.
    pub extract_images: bool,
    /// Directory prefix used for extracted image links.
    pub image_output_dir: PathBuf,
    pub heading_anchor_style: HeadingAnchorStyle,
    pub page_orientation: PageOrientation,
    pub diagrams: DiagramsConfig,
    pub list_indent: ListIndentConfig,

    /// Resolved style preset (set from `template` after loading).
    #[serde(skip)]
    pub style: StylePreset,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            template: None,
            diagram_theme: "default".to_owned(),
            title: None,
            author: None,
            subject: None,
            description: None,
            generate_toc: false,
            preserve_links: true,
            extract_images: false,
            image_output_dir: PathBuf::from("images"),
            heading_anchor_style: HeadingAnchorStyle::None,
            page_orientation: PageOrientation::Portrait,
            diagrams: DiagramsConfig::default(),
            list_indent: ListIndentConfig::default(),
            style: StylePreset::default(),
        }
    }
}

impl ConvertOptions {
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_toc(mut self, enabled: bool) -> Self {
        self.generate_toc = enabled;
        self
    }

    #[must_use]
    pub fn with_anchor_style(mut self, style: HeadingAnchorStyle) -> Self {
        self.heading_anchor_style = style;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: StylePreset) -> Self {
        self.style = style;
        self
    }
}

/// Contents of an `mdocx.toml` file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub options: ConvertOptions,
    /// Named style presets.
    pub templates: HashMap<String, StylePreset>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`diagrams.kroki_url`").
        field: String,
        /// Error message (e.g., "${`KROKI_URL`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration.
    ///
    /// With an explicit `config_path` the file must exist. Otherwise
    /// `mdocx.toml` is searched for in `start_dir` and its parents, falling
    /// back to defaults when none is found.
    pub fn load(config_path: Option<&Path>, start_dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }
        match Self::discover(start_dir) {
            Some(found) => Self::load_from_file(&found),
            None => {
                tracing::debug!(dir = %start_dir.display(), "no mdocx.toml found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.resolve_template()?;
        config.validate()?;
        Ok(config)
    }

    /// Search `start_dir` and its parents for the config file.
    #[must_use]
    pub fn discover(start_dir: &Path) -> Option<PathBuf> {
        let mut current = start_dir.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        if config.options.image_output_dir.is_relative() {
            config.options.image_output_dir = config_dir.join(&config.options.image_output_dir);
        }
        config.config_path = Some(path.to_path_buf());
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Validate option values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let diagrams = &self.options.diagrams;
        match diagrams.engine {
            DiagramEngine::Kroki => {
                let url = diagrams.kroki_url.as_deref().ok_or_else(|| {
                    ConfigError::Validation(
                        "diagrams.engine = \"kroki\" requires diagrams.kroki_url".to_owned(),
                    )
                })?;
                require_non_empty(url, "diagrams.kroki_url")?;
                require_http_url(url, "diagrams.kroki_url")?;
            }
            DiagramEngine::Command => {
                let command = diagrams.command.as_deref().ok_or_else(|| {
                    ConfigError::Validation(
                        "diagrams.engine = \"command\" requires diagrams.command".to_owned(),
                    )
                })?;
                require_non_empty(command, "diagrams.command")?;
            }
            DiagramEngine::None => {}
        }
        if diagrams.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "diagrams.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        if diagrams.max_width == 0 || diagrams.max_height == 0 {
            return Err(ConfigError::Validation(
                "diagrams.max_width and diagrams.max_height must be greater than 0".to_owned(),
            ));
        }
        if diagrams.dpi == 0 || diagrams.dpi > 1000 {
            return Err(ConfigError::Validation(
                "diagrams.dpi must be between 1 and 1000".to_owned(),
            ));
        }
        let indent = &self.options.list_indent;
        if indent.unit_pt <= 0.0 || indent.nbsp_per_level == 0 {
            return Err(ConfigError::Validation(
                "list_indent.unit_pt and list_indent.nbsp_per_level must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    /// Apply the named template to `options.style`.
    fn resolve_template(&mut self) -> Result<(), ConfigError> {
        if let Some(name) = &self.options.template {
            let preset = self.templates.get(name).ok_or_else(|| {
                ConfigError::Validation(format!("template \"{name}\" is not defined"))
            })?;
            self.options.style = preset.clone();
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let options = &mut self.options;
        expand::expand_opt(&mut options.title, "title")?;
        expand::expand_opt(&mut options.author, "author")?;
        expand::expand_opt(&mut options.subject, "subject")?;
        expand::expand_opt(&mut options.description, "description")?;
        expand::expand_opt(&mut options.diagrams.kroki_url, "diagrams.kroki_url")?;
        expand::expand_opt(&mut options.diagrams.command, "diagrams.command")?;
        if let Some(dir) = options.image_output_dir.to_str() {
            options.image_output_dir = PathBuf::from(expand::expand_env(dir, "image_output_dir")?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_options() {
        let options = ConvertOptions::default();
        assert_eq!(options.diagram_theme, "default");
        assert!(options.preserve_links);
        assert!(!options.generate_toc);
        assert_eq!(options.heading_anchor_style, HeadingAnchorStyle::None);
        assert_eq!(options.page_orientation, PageOrientation::Portrait);
        assert_eq!(options.diagrams.engine, DiagramEngine::None);
        assert_eq!(options.list_indent.unit_pt, 18.0);
        assert_eq!(options.style, StylePreset::default());
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.options, ConvertOptions::default());
        assert!(config.templates.is_empty());
    }

    #[test]
    fn test_parse_top_level_options() {
        let config = Config::from_toml(
            r#"
title = "Handbook"
generate_toc = true
preserve_links = false
heading_anchor_style = "attribute"
page_orientation = "landscape"
"#,
        )
        .unwrap();
        assert_eq!(config.options.title.as_deref(), Some("Handbook"));
        assert!(config.options.generate_toc);
        assert!(!config.options.preserve_links);
        assert_eq!(
            config.options.heading_anchor_style,
            HeadingAnchorStyle::Attribute
        );
        assert_eq!(config.options.page_orientation, PageOrientation::Landscape);
    }

    #[test]
    fn test_template_resolves_style() {
        let config = Config::from_toml(
            r#"
template = "corporate"

[templates.corporate]
body_font = "Arial"
heading_color = "C00000"
"#,
        )
        .unwrap();
        assert_eq!(config.options.style.body_font, "Arial");
        assert_eq!(config.options.style.heading_color, "C00000");
        assert_eq!(config.options.style.code_font, "Consolas");
    }

    #[test]
    fn test_unknown_template_rejected() {
        let err = Config::from_toml(r#"template = "missing""#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_kroki_engine_requires_url() {
        let err = Config::from_toml(
            r#"
[diagrams]
engine = "kroki"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("kroki_url"));
    }

    #[test]
    fn test_kroki_url_must_be_http() {
        let err = Config::from_toml(
            r#"
[diagrams]
engine = "kroki"
kroki_url = "kroki.io"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_command_engine() {
        let config = Config::from_toml(
            r#"
diagram_theme = "forest"

[diagrams]
engine = "command"
command = "mmdc"
timeout_secs = 5
deadline_secs = 60
"#,
        )
        .unwrap();
        let diagrams = &config.options.diagrams;
        assert_eq!(diagrams.engine, DiagramEngine::Command);
        assert_eq!(diagrams.command.as_deref(), Some("mmdc"));
        assert_eq!(diagrams.timeout(), Duration::from_secs(5));
        assert_eq!(diagrams.deadline(), Some(Duration::from_secs(60)));
        assert!(diagrams.args.contains(&"{input}".to_owned()));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = Config::from_toml(
            r"
[diagrams]
timeout_secs = 0
",
        )
        .unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_list_indent_section() {
        let config = Config::from_toml(
            r"
[list_indent]
unit_pt = 36.0
nbsp_per_level = 2
",
        )
        .unwrap();
        assert_eq!(config.options.list_indent.unit_pt, 36.0);
        assert_eq!(config.options.list_indent.nbsp_per_level, 2);
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/mdocx.toml")), Path::new("."))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_discover_in_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mdocx.toml"), "generate_toc = true\n").unwrap();
        let nested = dir.path().join("docs/guide");
        std::fs::create_dir_all(&nested).unwrap();

        let config = Config::load(None, &nested).unwrap();
        assert!(config.options.generate_toc);
        assert_eq!(config.config_path, Some(dir.path().join("mdocx.toml")));
        assert_eq!(config.options.image_output_dir, dir.path().join("images"));
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(None, dir.path()).unwrap();
        assert!(config.config_path.is_none());
        assert_eq!(config.options.diagram_theme, "default");
    }
}
