use std::sync::LazyLock;

use mdocx_anchors::LinkKind;
use regex::Regex;

use crate::builders::image;
use crate::error::BuildError;
use crate::model::{InlineElement, Run, RunStyle};
use crate::session::ConversionSession;
use crate::tokens::Inline;

static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<\s*(/)?\s*([a-zA-Z][a-zA-Z0-9]*)[^>]*>$").expect("invalid html tag regex")
});

/// Open counts of raw HTML formatting tags.
///
/// Tags open and close across sibling inlines, so the counts live for the
/// whole inline sequence.
#[derive(Debug, Clone, Copy, Default)]
struct HtmlToggles {
    underline: u16,
    bold: u16,
    italic: u16,
    strike: u16,
}

impl HtmlToggles {
    fn apply(self, base: &RunStyle) -> RunStyle {
        let mut style = base.clone();
        style.underline |= self.underline > 0;
        style.bold |= self.bold > 0;
        style.italic |= self.italic > 0;
        style.strike |= self.strike > 0;
        style
    }
}

/// Map an inline sequence to runs, links and images.
pub(crate) fn build_inlines(
    inlines: &[Inline],
    base: &RunStyle,
    session: &mut ConversionSession<'_>,
) -> Result<Vec<InlineElement>, BuildError> {
    let mut builder = InlineBuilder {
        session,
        toggles: HtmlToggles::default(),
        out: Vec::new(),
    };
    builder.walk(inlines, base)?;
    Ok(builder.out)
}

struct InlineBuilder<'s, 'a> {
    session: &'s mut ConversionSession<'a>,
    toggles: HtmlToggles,
    out: Vec<InlineElement>,
}

impl InlineBuilder<'_, '_> {
    fn walk(&mut self, inlines: &[Inline], base: &RunStyle) -> Result<(), BuildError> {
        for inline in inlines {
            match inline {
                Inline::Text(text) => self.run(text, base),
                Inline::Code(code) => {
                    let style = RunStyle {
                        code: true,
                        ..base.clone()
                    };
                    self.run(code, &style);
                }
                Inline::Emphasis(children) => {
                    let style = RunStyle {
                        italic: true,
                        ..base.clone()
                    };
                    self.walk(children, &style)?;
                }
                Inline::Strong(children) => {
                    let style = RunStyle {
                        bold: true,
                        ..base.clone()
                    };
                    self.walk(children, &style)?;
                }
                Inline::Strikethrough(children) => {
                    let style = RunStyle {
                        strike: true,
                        ..base.clone()
                    };
                    self.walk(children, &style)?;
                }
                Inline::SoftBreak => self.run(" ", base),
                Inline::HardBreak => self.out.push(InlineElement::Break),
                Inline::Link { href, children, .. } => self.link(href, children, base)?,
                Inline::Image { src, alt, .. } => {
                    let element = image::build(src, alt, self.session)?;
                    self.out.push(element);
                }
                Inline::Html(tag) => self.html(tag),
                Inline::Unsupported(kind) => self.session.warn(
                    mdocx_core::WarningCode::UnsupportedToken,
                    format!("skipped {}", kind.as_str()),
                ),
            }
        }
        Ok(())
    }

    fn run(&mut self, text: &str, base: &RunStyle) {
        if text.is_empty() {
            return;
        }
        let style = self.toggles.apply(base);
        if let Some(InlineElement::Run(last)) = self.out.last_mut()
            && last.style == style
        {
            last.text.push_str(text);
            return;
        }
        self.out.push(InlineElement::Run(Run::new(text, style)));
    }

    fn link(&mut self, href: &str, children: &[Inline], base: &RunStyle) -> Result<(), BuildError> {
        let style = RunStyle {
            hyperlink: true,
            ..base.clone()
        };
        let mut inner = InlineBuilder {
            session: &mut *self.session,
            toggles: self.toggles,
            out: Vec::new(),
        };
        inner.walk(children, &style)?;
        self.toggles = inner.toggles;

        let mut runs = Vec::new();
        let mut extra = Vec::new();
        for element in inner.out {
            match element {
                InlineElement::Run(run) => runs.push(run),
                other => extra.push(other),
            }
        }
        if runs.is_empty() && extra.is_empty() {
            runs.push(Run::new(href, self.toggles.apply(&style)));
        }

        let element = match LinkKind::classify(href) {
            LinkKind::Internal(fragment) => {
                let Some(anchor) = self.session.resolve_internal(&fragment) else {
                    self.out.extend(runs.into_iter().map(|mut run| {
                        run.style.hyperlink = false;
                        InlineElement::Run(run)
                    }));
                    self.out.extend(extra);
                    return Ok(());
                };
                self.session.stats.internal_links += 1;
                InlineElement::InternalRef { anchor, runs }
            }
            LinkKind::External(url) => {
                self.session.stats.external_links += 1;
                InlineElement::ExternalRef { url, runs }
            }
            LinkKind::Reference { .. } | LinkKind::Image(_) => InlineElement::ExternalRef {
                url: href.to_owned(),
                runs,
            },
        };
        self.out.push(element);
        self.out.extend(extra);
        Ok(())
    }

    fn html(&mut self, tag: &str) {
        let Some(caps) = HTML_TAG_RE.captures(tag.trim()) else {
            return;
        };
        let closing = caps.get(1).is_some();
        let name = caps[2].to_ascii_lowercase();
        let counter = match name.as_str() {
            "u" | "ins" => &mut self.toggles.underline,
            "b" | "strong" => &mut self.toggles.bold,
            "i" | "em" => &mut self.toggles.italic,
            "s" | "del" | "strike" => &mut self.toggles.strike,
            "br" => {
                self.out.push(InlineElement::Break);
                return;
            }
            _ => return,
        };
        *counter = if closing {
            counter.saturating_sub(1)
        } else {
            counter.saturating_add(1)
        };
    }
}
