//! Markdown to DOCX conversion.
//!
//! # Pipeline
//!
//! 1. Leading metadata block is stripped and merged into the options
//! 2. Diagram blocks are rendered and replaced by `diagram:` image references
//! 3. Nested-link typos are repaired
//! 4. Markup is parsed into a [`tokens::Block`] tree
//! 5. Builders map tokens to a [`model::Document`] inside a per-call
//!    [`ConversionSession`]
//! 6. [`writer::write_docx`] packs the element tree
//!
//! # Example
//!
//! ```
//! use mdocx_config::ConvertOptions;
//! use mdocx_docx::MarkdownToDocx;
//!
//! let converter = MarkdownToDocx::new(ConvertOptions::default());
//! let result = converter.convert("# Hello\n\nWorld\n").unwrap();
//! assert!(!result.output.is_empty());
//! ```

pub mod builders;
mod error;
pub mod front_matter;
pub mod model;
pub mod normalize;
mod session;
pub mod styles;
pub mod tokens;
pub mod writer;

use std::time::Instant;

use mdocx_config::ConvertOptions;
use mdocx_core::{Conversion, ConversionError, ConversionMetadata, ConversionWarning, WarningCode};
use mdocx_diagrams::{
    DiagramError, DiagramPass, DiagramSession, RendererLauncher, SessionOptions,
    launcher_from_options,
};

pub use error::{BuildError, WriteError};
pub use session::{ConversionSession, ImageSource, Stats};

use crate::model::{DocElement, Document, DocumentProperties, Paragraph, ParagraphStyle};
use crate::tokens::Block;
use crate::writer::WriterOptions;

/// Converts markup text to DOCX.
///
/// The converter holds configuration only. All per-call state lives in a
/// [`ConversionSession`] created by each call, so one converter can be
/// reused and shared between threads.
pub struct MarkdownToDocx {
    options: ConvertOptions,
    launcher: Option<Box<dyn RendererLauncher>>,
    images: Option<Box<dyn ImageSource>>,
}

impl MarkdownToDocx {
    /// Create a converter; the diagram engine is taken from `options`.
    #[must_use]
    pub fn new(options: ConvertOptions) -> Self {
        let launcher = launcher_from_options(&options);
        Self {
            options,
            launcher,
            images: None,
        }
    }

    /// Use a specific diagram engine.
    #[must_use]
    pub fn with_diagram_launcher(mut self, launcher: impl RendererLauncher + 'static) -> Self {
        self.launcher = Some(Box::new(launcher));
        self
    }

    /// Disable diagram rendering; diagram blocks stay code blocks.
    #[must_use]
    pub fn without_diagrams(mut self) -> Self {
        self.launcher = None;
        self
    }

    /// Resolve non-inline image sources through `images`.
    #[must_use]
    pub fn with_image_source(mut self, images: impl ImageSource + 'static) -> Self {
        self.images = Some(Box::new(images));
        self
    }

    #[must_use]
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert markup to DOCX bytes.
    pub fn convert(&self, markup: &str) -> Result<Conversion<Vec<u8>>, ConversionError> {
        let started = Instant::now();
        let built = self.convert_to_document(markup)?;

        let options = WriterOptions {
            style: built.options.style.clone(),
            orientation: built.options.page_orientation,
        };
        let bytes = writer::write_docx(&built.conversion.output, &options)
            .map_err(|e| ConversionError::WriteFailed(e.to_string()))?;

        let mut conversion = built.conversion;
        let metadata = ConversionMetadata {
            output_size: bytes.len(),
            processing_time_ms: elapsed_ms(started),
            ..conversion.metadata
        };
        tracing::info!(
            input_size = metadata.input_size,
            output_size = metadata.output_size,
            diagrams = metadata.diagram_count,
            warnings = conversion.warnings.len(),
            elapsed_ms = metadata.processing_time_ms,
            "converted markdown to docx"
        );
        Ok(Conversion {
            output: bytes,
            metadata,
            warnings: std::mem::take(&mut conversion.warnings),
            images: Vec::new(),
        })
    }

    /// Convert markup to the element tree without packing it.
    pub fn convert_elements(&self, markup: &str) -> Result<Conversion<Document>, ConversionError> {
        self.convert_to_document(markup).map(|built| built.conversion)
    }

    fn convert_to_document(&self, markup: &str) -> Result<Built, ConversionError> {
        let started = Instant::now();
        if markup.trim().is_empty() {
            return Err(ConversionError::EmptyInput);
        }

        let mut options = self.options.clone();
        let mut warnings = Vec::new();

        let split = front_matter::split(markup);
        if let Some(error) = split.error {
            warnings.push(
                ConversionWarning::new(WarningCode::InvalidFrontMatter, "metadata block ignored")
                    .with_detail(error),
            );
        }
        if let Some(front_matter) = split.front_matter {
            front_matter.merge_into(&mut options);
        }

        let pass = self.render_diagrams(split.body, &options, &mut warnings)?;
        let text = normalize::fix_nested_links(&pass.text);
        let blocks = tokens::parse(&text);

        let anchors = builders::anchor_map(&blocks);
        let mut session = ConversionSession::new(anchors)
            .with_diagrams(pass.records)
            .with_image_source(self.images.as_deref())
            .with_limits(SessionOptions::from_options(&options).limits);

        let mut elements = Vec::new();
        if let Some(title) = &options.title
            && !starts_with_heading(&blocks, title)
        {
            elements.push(DocElement::Paragraph(Paragraph::new(
                ParagraphStyle::Title,
                vec![model::InlineElement::Run(model::Run::new(
                    title.as_str(),
                    model::RunStyle::default(),
                ))],
            )));
        }
        if options.generate_toc {
            elements.extend(builders::build_toc(session.anchors()));
        }
        elements.extend(builders::build_body(&blocks, &mut session));

        let (numberings, session_warnings, stats) = session.into_parts();
        warnings.extend(session_warnings.into_vec());

        let document = Document {
            elements,
            numberings,
            properties: DocumentProperties {
                title: options.title.clone(),
                author: options.author.clone(),
                subject: options.subject.clone(),
                description: options.description.clone(),
            },
        };
        let metadata = ConversionMetadata {
            input_size: markup.len(),
            output_size: 0,
            processing_time_ms: elapsed_ms(started),
            diagram_count: stats.diagrams,
            internal_link_count: stats.internal_links,
            external_link_count: stats.external_links,
            image_count: stats.images,
        };
        Ok(Built {
            conversion: Conversion {
                output: document,
                metadata,
                warnings,
                images: Vec::new(),
            },
            options,
        })
    }

    /// Render diagrams with an engine owned by this call only.
    fn render_diagrams(
        &self,
        text: &str,
        options: &ConvertOptions,
        warnings: &mut Vec<ConversionWarning>,
    ) -> Result<DiagramPass, ConversionError> {
        let Some(launcher) = self.launcher.as_deref() else {
            return Ok(DiagramPass {
                text: text.to_owned(),
                ..DiagramPass::default()
            });
        };

        let mut session = DiagramSession::new(launcher, SessionOptions::from_options(options));
        let pass = session.process(text).map_err(|e| match e {
            DiagramError::DeadlineExceeded(limit) => ConversionError::Timeout(limit),
            other => ConversionError::TranscodeFailed(other.to_string()),
        })?;

        for failure in &pass.failures {
            let warning = ConversionWarning::new(
                WarningCode::DiagramRenderFailed,
                format!("{} diagram #{} left as code", failure.language, failure.index + 1),
            )
            .with_detail(failure.error.to_string());
            tracing::warn!(code = %warning.code, "{warning}");
            warnings.push(warning);
        }
        Ok(pass)
    }
}

/// Element tree plus the options after metadata merging.
struct Built {
    conversion: Conversion<Document>,
    options: ConvertOptions,
}

fn starts_with_heading(blocks: &[Block], title: &str) -> bool {
    matches!(
        blocks.first(),
        Some(Block::Heading { level: 1, inlines }) if tokens::plain_text(inlines).trim() == title.trim()
    )
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
