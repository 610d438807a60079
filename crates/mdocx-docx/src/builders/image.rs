use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use mdocx_core::{ConversionWarning, WarningCode};
use mdocx_diagrams::{DIAGRAM_SCHEME, raster};

use crate::error::BuildError;
use crate::model::{Image, InlineElement, Run, RunStyle};
use crate::session::ConversionSession;

/// Embed an image, preferring a rendered diagram for `diagram:` sources.
///
/// Sources that cannot be loaded degrade to an italic `[alt]` run.
pub(super) fn build(
    src: &str,
    alt: &str,
    session: &mut ConversionSession<'_>,
) -> Result<InlineElement, BuildError> {
    if let Some(id) = src.strip_prefix(DIAGRAM_SCHEME) {
        let Some(record) = session.diagram(id) else {
            return Ok(unavailable(src, alt, session));
        };
        let image = Image {
            bytes: record.bytes.clone(),
            width: record.width,
            height: record.height,
            alt: alt.to_owned(),
        };
        session.stats.diagrams += 1;
        return Ok(InlineElement::Image(image));
    }

    let bytes = if src.starts_with("data:") {
        decode_data_uri(src)?
    } else {
        match session.load_image(src) {
            Some(bytes) => bytes,
            None => return Ok(unavailable(src, alt, session)),
        }
    };

    let raster = raster::normalize(&bytes, session.limits()).map_err(|e| BuildError::InvalidImage {
        src: short_source(src),
        message: e.to_string(),
    })?;
    session.stats.images += 1;
    Ok(InlineElement::Image(Image {
        bytes: raster.bytes,
        width: raster.width,
        height: raster.height,
        alt: alt.to_owned(),
    }))
}

fn unavailable(src: &str, alt: &str, session: &mut ConversionSession<'_>) -> InlineElement {
    session.warnings.push(
        ConversionWarning::new(WarningCode::ImageUnavailable, "image not embedded")
            .with_detail(short_source(src)),
    );
    InlineElement::Run(Run::new(
        format!("[{alt}]"),
        RunStyle {
            italic: true,
            ..RunStyle::default()
        },
    ))
}

/// Payload of a base64 `data:` URI.
fn decode_data_uri(src: &str) -> Result<Vec<u8>, BuildError> {
    let (header, payload) = src
        .split_once(',')
        .ok_or_else(|| BuildError::InvalidDataUri("missing ','".to_owned()))?;
    if !header.ends_with(";base64") {
        return Err(BuildError::InvalidDataUri(
            "only base64 payloads are supported".to_owned(),
        ));
    }
    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(payload)
        .map_err(|e| BuildError::InvalidDataUri(e.to_string()))
}

/// Source for messages; data URIs are cut to their header.
fn short_source(src: &str) -> String {
    match src.split_once(',') {
        Some((header, _)) if src.starts_with("data:") => format!("{header},..."),
        _ => src.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdocx_anchors::AnchorMap;
    use mdocx_diagrams::DiagramRecord;
    use mdocx_diagrams::testing::png_bytes;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn session<'a>() -> ConversionSession<'a> {
        ConversionSession::new(AnchorMap::new())
    }

    #[test]
    fn test_diagram_uses_record_dimensions() {
        let record = DiagramRecord {
            id: "diagram-abc".to_owned(),
            source: "graph TD".to_owned(),
            bytes: png_bytes(64, 32),
            width: 64,
            height: 32,
        };
        let mut session =
            session().with_diagrams(HashMap::from([(record.id.clone(), record.clone())]));
        let element = build("diagram:diagram-abc", "flow", &mut session).unwrap();
        assert_eq!(
            element,
            InlineElement::Image(Image {
                bytes: record.bytes,
                width: 64,
                height: 32,
                alt: "flow".to_owned(),
            })
        );
        assert_eq!(session.stats.diagrams, 1);
    }

    #[test]
    fn test_data_uri_is_decoded() {
        let src = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(5, 7)));
        let mut session = session();
        let InlineElement::Image(image) = build(&src, "dot", &mut session).unwrap() else {
            panic!("expected image");
        };
        assert_eq!((image.width, image.height), (5, 7));
        assert_eq!(session.stats.images, 1);
    }

    #[test]
    fn test_missing_source_degrades_to_alt_text() {
        let mut session = session();
        let element = build("missing.png", "Logo", &mut session).unwrap();
        assert_eq!(
            element,
            InlineElement::Run(Run::new(
                "[Logo]",
                RunStyle {
                    italic: true,
                    ..RunStyle::default()
                }
            ))
        );
        assert_eq!(session.warnings.count(WarningCode::ImageUnavailable), 1);
        assert_eq!(session.stats.images, 0);
    }

    #[test]
    fn test_image_source_is_consulted() {
        let loader = |src: &str| (src == "logo.png").then(|| png_bytes(10, 10));
        let mut session = session().with_image_source(Some(&loader));
        assert!(matches!(
            build("logo.png", "Logo", &mut session).unwrap(),
            InlineElement::Image(_)
        ));
    }

    #[test]
    fn test_bad_data_uri_is_build_error() {
        let err = decode_data_uri("data:image/png;base64,@@@").unwrap_err();
        assert!(matches!(err, BuildError::InvalidDataUri(_)));
        assert!(decode_data_uri("data:text/plain,hello").is_err());
    }
}
