use crate::font::SignatureFont;
use crate::layout::{LayoutConfig, Letterhead};
use crate::renderer::LetterRenderer;
use crate::LetterError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The script font looked for when nothing else is configured
pub const DEFAULT_SCRIPT_FONT: &str = "BrushScriptStd.ttf";

/// Renderer settings, usually read from a TOML file such as:
///
/// ```toml
/// script_font = "/usr/share/fonts/BrushScriptStd.ttf"
///
/// [letterhead]
/// institution = "Example University"
///
/// [layout]
/// block_width = 140.0
/// ```
///
/// Anything left out keeps its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub script_font: Option<PathBuf>,
    pub letterhead: Letterhead,
    pub layout: LayoutConfig,
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Config, LetterError> {
        toml::from_str(contents).map_err(Into::into)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, LetterError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// The script font to use: `cli` if given, then the configured font, then
    /// [DEFAULT_SCRIPT_FONT]
    pub fn script_font_path(&self, cli: Option<&Path>) -> PathBuf {
        cli.map(Path::to_path_buf)
            .or_else(|| self.script_font.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRIPT_FONT))
    }

    pub fn into_renderer(self, signature_font: SignatureFont) -> LetterRenderer {
        let mut renderer = LetterRenderer::new(signature_font);
        renderer.layout = self.layout;
        renderer.letterhead = self.letterhead;
        renderer
    }
}
