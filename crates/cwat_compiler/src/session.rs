use cwat_diagnostic::sources::{self, Cached};
use cwat_utils::keyvec::{declare_key_type, KeyVec};

use crate::diagnostics::{DiagnosticEmitter, IntoDiagnostic};

declare_key_type! { pub struct SourceId; }

#[derive(Default, Debug, Clone)]
pub struct SourceMap {
    inner: KeyVec<SourceId, Cached<Source>>,
}

#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub source: String,
}

impl Source {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

impl SourceMap {
    pub fn insert(&mut self, source: Source) -> SourceId {
        self.inner.insert(Cached::new(source))
    }
}

impl sources::Sources for SourceMap {
    type SourceId = SourceId;
    type Source = Source;

    fn get_source(&self, id: Self::SourceId) -> Option<&Cached<Self::Source>> {
        self.inner.get(id)
    }
}

impl sources::Source for Source {
    fn name_str(&self) -> &str {
        &self.name
    }

    fn source_str(&self) -> &str {
        &self.source
    }
}

/// Returned once an error has been handed to the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorsEmitted;

pub struct Session<D: DiagnosticEmitter> {
    pub sources: SourceMap,
    pub diagnostics: D,
}

impl<D: DiagnosticEmitter> Session<D> {
    pub fn new(diagnostics: D) -> Self {
        Self {
            sources: SourceMap::default(),
            diagnostics,
        }
    }

    /// Compiles one source file, reporting its error to the emitter on failure.
    pub fn compile(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<String, ErrorsEmitted> {
        let source = Source::new(name, source);
        log::debug!("compiling `{}`", source.name);

        let result = crate::compile(&source.source);
        let source_id = self.sources.insert(source);

        result.map_err(|err| self.report(err, source_id))
    }

    pub fn report(
        &mut self,
        diagnostic: impl IntoDiagnostic,
        source_id: SourceId,
    ) -> ErrorsEmitted {
        let diagnostic = diagnostic.into_diagnostic(source_id);
        self.diagnostics.emit_diagnostic(diagnostic, &self.sources);
        ErrorsEmitted
    }
}
