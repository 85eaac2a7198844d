use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::form::clamp_slide_count;
use crate::core::model::{AspectRatio, Language};
use crate::services::llm::LlmConfig;

pub const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_output")]
    pub output_folder: String,

    #[serde(default = "default_data")]
    pub data_folder: String,

    pub llm: LlmConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub defaults: CreateDefaults,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RenderConfig {
    /// Device pixels per CSS pixel used when rasterizing slides.
    #[serde(default = "default_pixel_ratio")]
    pub pixel_ratio: f32,
    /// Extra `.ttf`/`.otf` files (Arabic faces, brand fonts).
    pub fonts_dir: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: default_pixel_ratio(),
            fonts_dir: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateDefaults {
    #[serde(default = "default_visual_style")]
    pub visual_style: String,
    #[serde(default = "default_slide_count")]
    pub slide_count: u32,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub language: Language,
}

impl Default for CreateDefaults {
    fn default() -> Self {
        Self {
            visual_style: default_visual_style(),
            slide_count: default_slide_count(),
            aspect_ratio: AspectRatio::default(),
            language: Language::default(),
        }
    }
}

fn default_output() -> String {
    "output".to_string()
}
fn default_data() -> String {
    "data".to_string()
}
fn default_pixel_ratio() -> f32 {
    3.0
}
fn default_visual_style() -> String {
    "Minimalist Clean".to_string()
}
fn default_slide_count() -> u32 {
    5
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("{} not found. Please create one.", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = serde_yaml_ng::from_str(content)?;
        config.llm.apply_env();
        config.render.pixel_ratio = config.render.pixel_ratio.clamp(1.0, 4.0);
        config.defaults.slide_count = clamp_slide_count(config.defaults.slide_count);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(CONFIG_FILE, content).context("Failed to write config.yml")?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output_folder)?;
        fs::create_dir_all(&self.data_folder)?;
        Ok(())
    }
}
