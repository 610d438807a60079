//! Supported diagram languages.

/// Diagram language named in a fence info string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramLanguage {
    Mermaid,
    PlantUml,
    C4PlantUml,
    GraphViz,
    D2,
    Ditaa,
    BlockDiag,
    SeqDiag,
    ActDiag,
    NwDiag,
    Bpmn,
    Bytefield,
    Excalidraw,
    Erd,
    Nomnoml,
    Pikchr,
    Structurizr,
    Svgbob,
    Vega,
    VegaLite,
    WaveDrom,
    TikZ,
}

impl DiagramLanguage {
    /// Parse a fence language tag.
    ///
    /// Accepts plain names (`mermaid`) and the `kroki-` prefixed form
    /// (`kroki-mermaid`). Returns `None` for anything that is not a diagram.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_lowercase();
        let lang = tag.strip_prefix("kroki-").unwrap_or(&tag);

        let parsed = match lang {
            "mermaid" => Self::Mermaid,
            "plantuml" | "puml" => Self::PlantUml,
            "c4plantuml" => Self::C4PlantUml,
            "graphviz" | "dot" => Self::GraphViz,
            "d2" => Self::D2,
            "ditaa" => Self::Ditaa,
            "blockdiag" => Self::BlockDiag,
            "seqdiag" => Self::SeqDiag,
            "actdiag" => Self::ActDiag,
            "nwdiag" => Self::NwDiag,
            "bpmn" => Self::Bpmn,
            "bytefield" => Self::Bytefield,
            "excalidraw" => Self::Excalidraw,
            "erd" => Self::Erd,
            "nomnoml" => Self::Nomnoml,
            "pikchr" => Self::Pikchr,
            "structurizr" => Self::Structurizr,
            "svgbob" => Self::Svgbob,
            "vega" => Self::Vega,
            "vegalite" | "vega-lite" => Self::VegaLite,
            "wavedrom" => Self::WaveDrom,
            "tikz" => Self::TikZ,
            _ => return None,
        };
        Some(parsed)
    }

    /// Kroki endpoint name; also used as the canonical language name.
    #[must_use]
    pub fn kroki_endpoint(self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::PlantUml => "plantuml",
            Self::C4PlantUml => "c4plantuml",
            Self::GraphViz => "graphviz",
            Self::D2 => "d2",
            Self::Ditaa => "ditaa",
            Self::BlockDiag => "blockdiag",
            Self::SeqDiag => "seqdiag",
            Self::ActDiag => "actdiag",
            Self::NwDiag => "nwdiag",
            Self::Bpmn => "bpmn",
            Self::Bytefield => "bytefield",
            Self::Excalidraw => "excalidraw",
            Self::Erd => "erd",
            Self::Nomnoml => "nomnoml",
            Self::Pikchr => "pikchr",
            Self::Structurizr => "structurizr",
            Self::Svgbob => "svgbob",
            Self::Vega => "vega",
            Self::VegaLite => "vegalite",
            Self::WaveDrom => "wavedrom",
            Self::TikZ => "tikz",
        }
    }

    /// Source file extension used by local rendering commands.
    #[must_use]
    pub fn file_extension(self) -> &'static str {
        match self {
            Self::Mermaid => "mmd",
            Self::PlantUml | Self::C4PlantUml => "puml",
            Self::GraphViz => "dot",
            Self::D2 => "d2",
            Self::Vega | Self::VegaLite | Self::Excalidraw | Self::WaveDrom => "json",
            Self::Bpmn => "bpmn",
            Self::TikZ => "tex",
            _ => "txt",
        }
    }
}
