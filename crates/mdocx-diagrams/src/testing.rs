//! In-process renderer for tests that must not touch the network.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::DiagramError;
use crate::renderer::{Diagram, DiagramRenderer, RendererLauncher};

/// Encode a blank RGBA PNG of the given size.
#[must_use]
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(RgbaImage::new(width, height))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map(|()| bytes)
        .unwrap_or_default()
}

/// Launcher whose renderer returns a 40x20 PNG, or fails for sources
/// containing `invalid`.
#[derive(Debug, Default, Clone)]
pub struct FakeLauncher {
    pub fail_launch: bool,
    pub launches: Arc<AtomicUsize>,
    pub renders: Arc<AtomicUsize>,
    pub shutdowns: Arc<AtomicUsize>,
}

impl RendererLauncher for FakeLauncher {
    fn launch(&self) -> Result<Box<dyn DiagramRenderer>, DiagramError> {
        if self.fail_launch {
            return Err(DiagramError::Launch("fake engine unavailable".to_owned()));
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeRenderer {
            renders: Arc::clone(&self.renders),
            shutdowns: Arc::clone(&self.shutdowns),
        }))
    }
}

struct FakeRenderer {
    renders: Arc<AtomicUsize>,
    shutdowns: Arc<AtomicUsize>,
}

impl DiagramRenderer for FakeRenderer {
    fn render(&self, diagram: &Diagram<'_>) -> Result<Vec<u8>, DiagramError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        if diagram.source.contains("invalid") {
            return Err(DiagramError::Process {
                status: "exit status: 1".to_owned(),
                stderr: "Parse error on line 1".to_owned(),
            });
        }
        Ok(png_bytes(40, 20))
    }

    fn shutdown(&mut self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}
