use cwat_diagnostic::termcolor::{ColorChoice, StandardStream};
use cwat_diagnostic::{Config, Snippet};
use cwat_frontend::{CompileError, ErrorKind};

use crate::session::{SourceId, SourceMap};

pub type Diagnostic = cwat_diagnostic::Diagnostic<SourceMap>;

pub trait DiagnosticEmitter {
    fn emit_diagnostic(&mut self, diagnostic: Diagnostic, sources: &SourceMap);
}

impl DiagnosticEmitter for Vec<Diagnostic> {
    fn emit_diagnostic(&mut self, diagnostic: Diagnostic, _sources: &SourceMap) {
        self.push(diagnostic);
    }
}

pub struct PrettyDiagnosticEmitter {
    pub stream: StandardStream,
    pub config: Config,
}

impl PrettyDiagnosticEmitter {
    pub fn new(color: ColorChoice) -> Self {
        Self {
            stream: StandardStream::stderr(color),
            config: Config::default(),
        }
    }
}

impl Default for PrettyDiagnosticEmitter {
    fn default() -> Self {
        Self::new(ColorChoice::Auto)
    }
}

impl DiagnosticEmitter for PrettyDiagnosticEmitter {
    fn emit_diagnostic(&mut self, diagnostic: Diagnostic, sources: &SourceMap) {
        if let Err(err) = diagnostic.write_to_stream(sources, &self.config, &mut self.stream) {
            log::error!("failed to emit diagnostic: {err}");
        }
    }
}

pub trait IntoDiagnostic {
    fn into_diagnostic(self, source_id: SourceId) -> Diagnostic;
}

impl IntoDiagnostic for CompileError {
    fn into_diagnostic(self, source_id: SourceId) -> Diagnostic {
        let label = match self.kind {
            ErrorKind::Lex => "invalid token on this line",
            ErrorKind::Syntax => "unexpected syntax",
            ErrorKind::Scope => "name used here",
            ErrorKind::Type => "in this expression",
        };

        Diagnostic::error()
            .with_message(format!("{}: {}", self.kind, self.message))
            .with_snippet(Snippet::primary(label, source_id, self.line))
    }
}
