//! Rendering capability traits.
//!
//! The conversion pipeline only knows [`RendererLauncher`] and
//! [`DiagramRenderer`]; any engine able to rasterize a diagram grammar can
//! sit behind them.

use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::error::DiagramError;
use crate::language::DiagramLanguage;

/// One diagram to render.
#[derive(Debug, Clone, Copy)]
pub struct Diagram<'a> {
    pub language: DiagramLanguage,
    pub source: &'a str,
    pub theme: &'a str,
    /// Time budget for this diagram.
    pub timeout: Duration,
}

impl Diagram<'_> {
    /// Content-derived identifier.
    ///
    /// First 16 hex digits of SHA-256 over `"{endpoint}:{theme}:{source}"`,
    /// so identical sources share one rendering.
    #[must_use]
    pub fn id(&self) -> String {
        let content = format!(
            "{}:{}:{}",
            self.language.kroki_endpoint(),
            self.theme,
            self.source
        );
        let hash = hex::encode(Sha256::digest(content.as_bytes()));
        format!("diagram-{}", &hash[..16])
    }
}

/// A running rendering engine.
///
/// Shared by every diagram of one conversion call and never across calls.
/// Implementations must be thread-safe for parallel rendering.
pub trait DiagramRenderer: Send + Sync {
    /// Render a diagram to image bytes (PNG, or SVG for vector engines).
    fn render(&self, diagram: &Diagram<'_>) -> Result<Vec<u8>, DiagramError>;

    /// Release engine resources. Called exactly once, on every exit path.
    fn shutdown(&mut self) {}
}

/// Starts a [`DiagramRenderer`] on demand.
pub trait RendererLauncher: Send + Sync {
    fn launch(&self) -> Result<Box<dyn DiagramRenderer>, DiagramError>;
}
