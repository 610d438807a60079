//! Per-call diagram rendering session.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::error::DiagramError;
use crate::extract::{self, DiagramBlock};
use crate::raster::{self, RasterLimits};
use crate::renderer::{Diagram, DiagramRenderer, RendererLauncher};

/// A rendered diagram, valid for one conversion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramRecord {
    /// Content-derived id, referenced as `diagram:<id>`.
    pub id: String,
    pub source: String,
    /// PNG bytes.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// A diagram block that could not be rendered and was left in place.
#[derive(Debug)]
pub struct DiagramFailure {
    pub index: usize,
    pub language: &'static str,
    pub error: DiagramError,
}

/// Outcome of [`DiagramSession::process`].
#[derive(Debug, Default)]
pub struct DiagramPass {
    /// Markup with rendered blocks replaced by image references.
    pub text: String,
    /// Records keyed by id.
    pub records: HashMap<String, DiagramRecord>,
    /// Blocks replaced by an image reference.
    pub replaced: usize,
    pub failures: Vec<DiagramFailure>,
}

/// Rendering settings for one session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub theme: String,
    /// Per-diagram timeout.
    pub timeout: Duration,
    /// Budget for the whole call.
    pub deadline: Option<Duration>,
    pub limits: RasterLimits,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            theme: "default".to_owned(),
            timeout: Duration::from_secs(30),
            deadline: None,
            limits: RasterLimits::default(),
        }
    }
}

/// Owns the rendering engine for exactly one conversion call.
///
/// The engine is launched on the first diagram and shut down when the
/// session is dropped, on success and failure alike.
pub struct DiagramSession<'a> {
    launcher: &'a dyn RendererLauncher,
    renderer: Option<Box<dyn DiagramRenderer>>,
    options: SessionOptions,
    started: Instant,
    cache: HashMap<String, DiagramRecord>,
}

impl<'a> DiagramSession<'a> {
    #[must_use]
    pub fn new(launcher: &'a dyn RendererLauncher, options: SessionOptions) -> Self {
        Self {
            launcher,
            renderer: None,
            options,
            started: Instant::now(),
            cache: HashMap::new(),
        }
    }

    /// Whether the engine has been started.
    #[must_use]
    pub fn is_launched(&self) -> bool {
        self.renderer.is_some()
    }

    /// Render every diagram block in `text` and splice the results back.
    ///
    /// Failed blocks stay untouched and are reported in
    /// [`DiagramPass::failures`]. Only an expired call deadline is an error.
    pub fn process(&mut self, text: &str) -> Result<DiagramPass, DiagramError> {
        let blocks = extract::find_diagram_blocks(text);
        if blocks.is_empty() {
            return Ok(DiagramPass {
                text: text.to_owned(),
                ..DiagramPass::default()
            });
        }
        tracing::debug!(count = blocks.len(), "rendering diagrams");

        let mut failures = Vec::new();
        let ids: Vec<String> = blocks.iter().map(|b| self.diagram(b).id()).collect();

        match self.ensure_launched() {
            Ok(()) => {
                let results = self.render_missing(&blocks, &ids)?;
                for (block, result) in results {
                    match result {
                        Ok(record) => {
                            self.cache.insert(record.id.clone(), record);
                        }
                        Err(error) => failures.push(DiagramFailure {
                            index: block.index,
                            language: block.language.kroki_endpoint(),
                            error,
                        }),
                    }
                }
            }
            Err(error) => {
                tracing::warn!("diagram renderer failed to start: {error}");
                let message = error.to_string();
                failures.extend(blocks.iter().map(|block| DiagramFailure {
                    index: block.index,
                    language: block.language.kroki_endpoint(),
                    error: DiagramError::Launch(message.clone()),
                }));
            }
        }

        let mut records = HashMap::new();
        let mut replaced = 0;
        let text = extract::splice(text, &blocks, |block| {
            let id = &ids[block.index];
            let record = self.cache.get(id)?;
            records.insert(id.clone(), record.clone());
            replaced += 1;
            Some(extract::image_reference(block.language, id))
        });

        tracing::info!(rendered = replaced, failed = failures.len(), "diagrams processed");
        Ok(DiagramPass {
            text,
            records,
            replaced,
            failures,
        })
    }

    fn diagram<'b>(&'b self, block: &'b DiagramBlock) -> Diagram<'b> {
        Diagram {
            language: block.language,
            source: &block.source,
            theme: &self.options.theme,
            timeout: self.options.timeout,
        }
    }

    fn ensure_launched(&mut self) -> Result<(), DiagramError> {
        if self.renderer.is_none() {
            self.renderer = Some(self.launcher.launch()?);
        }
        Ok(())
    }

    /// Remaining call budget, `None` when unbounded.
    fn remaining(&self) -> Option<Duration> {
        self.options
            .deadline
            .map(|d| d.saturating_sub(self.started.elapsed()))
    }

    /// Render blocks whose id is not cached yet, first occurrence only.
    #[allow(clippy::type_complexity)]
    fn render_missing<'b>(
        &self,
        blocks: &'b [DiagramBlock],
        ids: &[String],
    ) -> Result<Vec<(&'b DiagramBlock, Result<DiagramRecord, DiagramError>)>, DiagramError> {
        let Some(renderer) = self.renderer.as_deref() else {
            return Ok(Vec::new());
        };

        let mut seen = std::collections::HashSet::new();
        let pending: Vec<(&DiagramBlock, &String)> = blocks
            .iter()
            .zip(ids)
            .filter(|&(_, id)| !self.cache.contains_key(id) && seen.insert(id.as_str()))
            .collect();

        let results: Vec<_> = pending
            .par_iter()
            .map(|(block, id)| (*block, self.render_one(renderer, block, id)))
            .collect();

        if let Some(deadline) = self.options.deadline
            && results
                .iter()
                .any(|(_, r)| matches!(r, Err(DiagramError::DeadlineExceeded(_))))
        {
            return Err(DiagramError::DeadlineExceeded(deadline));
        }
        Ok(results)
    }

    fn render_one(
        &self,
        renderer: &dyn DiagramRenderer,
        block: &DiagramBlock,
        id: &str,
    ) -> Result<DiagramRecord, DiagramError> {
        let mut diagram = self.diagram(block);
        if let Some(remaining) = self.remaining() {
            if remaining.is_zero() {
                return Err(DiagramError::DeadlineExceeded(
                    self.options.deadline.unwrap_or_default(),
                ));
            }
            diagram.timeout = diagram.timeout.min(remaining);
        }

        let started = Instant::now();
        let bytes = match renderer.render(&diagram) {
            Err(DiagramError::Timeout(_)) if self.remaining().is_some_and(|r| r.is_zero()) => {
                return Err(DiagramError::DeadlineExceeded(
                    self.options.deadline.unwrap_or_default(),
                ));
            }
            other => other?,
        };
        let raster = raster::normalize(&bytes, self.options.limits)?;
        tracing::debug!(
            index = block.index,
            id,
            width = raster.width,
            height = raster.height,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "rendered diagram"
        );

        Ok(DiagramRecord {
            id: id.to_owned(),
            source: block.source.clone(),
            bytes: raster.bytes,
            width: raster.width,
            height: raster.height,
        })
    }
}

impl Drop for DiagramSession<'_> {
    fn drop(&mut self) {
        if let Some(mut renderer) = self.renderer.take() {
            renderer.shutdown();
            tracing::debug!("diagram renderer shut down");
        }
    }
}
