//! Diagram rendering for mdocx.
//!
//! Fenced diagram blocks (`mermaid`, `plantuml`, `dot`, ...) are pulled out
//! of markup text, rendered by an out-of-process engine to PNG, and replaced
//! by `![...](diagram:<id>)` image references before tokenizing.
//!
//! # Architecture
//!
//! - [`RendererLauncher`] / [`DiagramRenderer`]: narrow engine capability
//! - [`KrokiLauncher`]: HTTP rendering through a Kroki server
//! - [`CommandLauncher`]: local rendering command in a private temp dir
//! - [`DiagramSession`]: one engine per conversion call, launched lazily,
//!   shut down on drop, identical sources rendered once
//! - [`raster`]: SVG rasterization, downscaling and size probing
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use mdocx_diagrams::{DiagramSession, KrokiLauncher, SessionOptions};
//!
//! let launcher = KrokiLauncher::new("https://kroki.io", Duration::from_secs(30));
//! let mut session = DiagramSession::new(&launcher, SessionOptions::default());
//! let pass = session.process("```mermaid\ngraph TD\n  A --> B\n```\n").unwrap();
//! assert_eq!(pass.replaced, 1);
//! ```

mod command;
mod error;
mod extract;
mod kroki;
mod language;
pub mod raster;
mod renderer;
mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

use mdocx_config::{ConvertOptions, DiagramEngine};

pub use command::CommandLauncher;
pub use error::DiagramError;
pub use extract::{DIAGRAM_SCHEME, DiagramBlock, find_diagram_blocks};
pub use kroki::KrokiLauncher;
pub use language::DiagramLanguage;
pub use raster::{Raster, RasterLimits};
pub use renderer::{Diagram, DiagramRenderer, RendererLauncher};
pub use session::{DiagramFailure, DiagramPass, DiagramRecord, DiagramSession, SessionOptions};

/// Build the launcher selected by `options.diagrams.engine`.
///
/// Returns `None` when diagram rendering is disabled or the engine is
/// missing its required setting.
#[must_use]
pub fn launcher_from_options(options: &ConvertOptions) -> Option<Box<dyn RendererLauncher>> {
    let diagrams = &options.diagrams;
    match diagrams.engine {
        DiagramEngine::None => None,
        DiagramEngine::Kroki => {
            let url = diagrams.kroki_url.as_deref()?;
            Some(Box::new(KrokiLauncher::new(url, diagrams.timeout())))
        }
        DiagramEngine::Command => {
            let command = diagrams.command.as_deref()?;
            Some(Box::new(CommandLauncher::new(
                command,
                diagrams.args.clone(),
            )))
        }
    }
}

impl SessionOptions {
    /// Session settings from conversion options.
    #[must_use]
    pub fn from_options(options: &ConvertOptions) -> Self {
        let diagrams = &options.diagrams;
        Self {
            theme: options.diagram_theme.clone(),
            timeout: diagrams.timeout(),
            deadline: diagrams.deadline(),
            limits: RasterLimits {
                max_width: diagrams.max_width,
                max_height: diagrams.max_height,
                dpi: diagrams.dpi,
            },
        }
    }
}
