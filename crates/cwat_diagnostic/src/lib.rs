mod render;
pub mod sources;

pub use termcolor;

use derive_where::derive_where;
use termcolor::{Color, ColorSpec};

use self::sources::Sources;

/// A fatal error, with the source lines it points at.
#[derive_where(Debug, Clone)]
pub struct Diagnostic<S: Sources> {
    pub message: Option<String>,
    pub snippets: Vec<Snippet<S>>,
}

impl<S: Sources> Diagnostic<S> {
    pub fn error() -> Self {
        Self {
            message: None,
            snippets: vec![],
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_snippet(mut self, snippet: Snippet<S>) -> Self {
        self.snippets.push(snippet);
        self
    }
}

/// A labelled source line. Lines are 1-based.
#[derive_where(Debug, Clone)]
pub struct Snippet<S: Sources> {
    pub label: String,
    pub kind: SnippetKind,

    pub source_id: S::SourceId,
    pub line: usize,
}

impl<S: Sources> Snippet<S> {
    pub fn new(
        kind: SnippetKind,
        label: impl Into<String>,
        source_id: S::SourceId,
        line: usize,
    ) -> Self {
        Self {
            label: label.into(),
            kind,

            source_id,
            line,
        }
    }

    pub fn primary(label: impl Into<String>, source_id: S::SourceId, line: usize) -> Self {
        Self::new(SnippetKind::Primary, label, source_id, line)
    }

    pub fn secondary(label: impl Into<String>, source_id: S::SourceId, line: usize) -> Self {
        Self::new(SnippetKind::Secondary, label, source_id, line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SnippetKind {
    Primary,
    Secondary,
}

#[derive(Debug)]
pub struct Config {
    /// Lines of context drawn around each snippet.
    pub context_size: usize,

    pub error_color: ColorSpec,

    pub emphasis: ColorSpec,
    pub subtle: ColorSpec,

    pub gutter: &'static str,

    pub underline: &'static str,
    pub underline_after: &'static str,
}

impl Default for Config {
    fn default() -> Self {
        let mut error_color = ColorSpec::new();
        error_color.set_fg(Some(Color::Red));
        error_color.set_bold(true);

        let mut subtle = ColorSpec::new();
        subtle.set_italic(true);
        subtle.set_dimmed(true);

        let mut emphasis = ColorSpec::new();
        emphasis.set_bold(true);

        Self {
            context_size: 1,

            error_color,
            emphasis,
            subtle,

            gutter: "│",

            underline: "^",
            underline_after: " ",
        }
    }
}
