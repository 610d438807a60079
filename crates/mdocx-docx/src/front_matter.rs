//! Leading `---` metadata block.

use serde::Deserialize;

use mdocx_config::ConvertOptions;

/// Recognized metadata keys. Unknown keys are ignored.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub description: Option<String>,
}

impl FrontMatter {
    /// Fill options the caller left unset. Explicit options win.
    pub fn merge_into(self, options: &mut ConvertOptions) {
        options.title = options.title.take().or(self.title);
        options.author = options.author.take().or(self.author);
        options.subject = options.subject.take().or(self.subject);
        options.description = options.description.take().or(self.description);
    }
}

/// Result of [`split`].
#[derive(Debug)]
pub struct Split<'a> {
    pub front_matter: Option<FrontMatter>,
    /// Markup after the metadata block.
    pub body: &'a str,
    /// Parse error of a present but malformed block.
    pub error: Option<String>,
}

/// Split a leading metadata block from `text`.
///
/// The block must open on the very first line with `---` and close with a
/// `---` (or `...`) line. A malformed block is still stripped.
#[must_use]
pub fn split(text: &str) -> Split<'_> {
    let no_block = Split {
        front_matter: None,
        body: text,
        error: None,
    };

    let trimmed = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(rest) = trimmed
        .strip_prefix("---\n")
        .or_else(|| trimmed.strip_prefix("---\r\n"))
    else {
        return no_block;
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let content = line.trim_end();
        if content == "---" || content == "..." {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return match serde_yaml::from_str::<Option<FrontMatter>>(yaml) {
                Ok(front_matter) => Split {
                    front_matter: Some(front_matter.unwrap_or_default()),
                    body,
                    error: None,
                },
                Err(e) => Split {
                    front_matter: None,
                    body,
                    error: Some(e.to_string()),
                },
            };
        }
        offset += line.len();
    }
    no_block
}
