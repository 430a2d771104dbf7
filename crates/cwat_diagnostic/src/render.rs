use std::collections::BTreeMap;
use std::io;
use std::ops::RangeInclusive;

use termcolor::{ColorSpec, WriteColor};
use unicode_width::UnicodeWidthStr;

use super::sources::{Cached, Source, Sources};
use super::{Config, Diagnostic, Snippet, SnippetKind};

const TAB: &str = "    ";

impl<S: Sources> Diagnostic<S> {
    pub fn write_to_stream(
        &self,
        sources: &S,
        config: &Config,
        stream: &mut impl WriteColor,
    ) -> io::Result<()> {
        DiagnosticWriter {
            diagnostic: self,
            sources,
            stream,
            config,
        }
        .draw_all()
    }
}

struct DiagnosticWriter<'stream, 'a, W: WriteColor, S: Sources> {
    diagnostic: &'a Diagnostic<S>,
    sources: &'a S,

    stream: &'stream mut W,
    config: &'a Config,
}

impl<'a, W: WriteColor, S: Sources> DiagnosticWriter<'_, 'a, W, S> {
    fn draw_all(mut self) -> io::Result<()> {
        self.draw_header()?;

        let by_source = self.snippets_by_source();

        if by_source.is_empty() {
            writeln!(self.stream)?;
        }

        for (source, mut snippets) in by_source.into_values() {
            snippets.sort_by_key(|snippet| snippet.line);

            for (snippets, lines) in self.group_lines(source, snippets) {
                self.draw_group(source, &snippets, lines)?;
            }
        }

        Ok(())
    }

    fn draw_header(&mut self) -> io::Result<()> {
        self.stream.set_color(&self.config.error_color)?;
        write!(self.stream, "Error:")?;

        self.stream.reset()?;

        match &self.diagnostic.message {
            Some(message) => writeln!(self.stream, " {message}")?,
            None => writeln!(self.stream)?,
        }

        Ok(())
    }

    fn draw_group(
        &mut self,
        source: &Cached<S::Source>,
        snippets: &[&'a Snippet<S>],
        lines: RangeInclusive<usize>,
    ) -> io::Result<()> {
        let line_num_width = 1 + (*lines.end()).max(1).ilog10() as usize;

        self.stream.set_color(&self.config.subtle)?;
        writeln!(self.stream, "In {}:{}", source.name_str(), snippets[0].line)?;
        self.stream.reset()?;

        for line in lines {
            let line_str = source
                .line_str(line - 1)
                .unwrap_or_default()
                .replace('\t', TAB);

            self.draw_gutter(Some(line), line_num_width)?;
            writeln!(self.stream, "{line_str}")?;

            for snippet in snippets.iter().filter(|snippet| snippet.line == line) {
                let content = line_str.trim_start();
                let offset = str_width(&line_str[..line_str.len() - content.len()]);
                let width = str_width(content.trim_end()).max(1);

                self.draw_gutter(None, line_num_width)?;

                self.stream.set_color(self.snippet_color(snippet.kind))?;
                write!(self.stream, "{:<offset$}", "")?;
                write!(self.stream, "{}", self.config.underline.repeat(width))?;
                writeln!(
                    self.stream,
                    "{}{}",
                    self.config.underline_after, snippet.label
                )?;
                self.stream.reset()?;
            }
        }

        writeln!(self.stream)?;

        Ok(())
    }

    fn draw_gutter(&mut self, line: Option<usize>, line_num_width: usize) -> io::Result<()> {
        self.stream.set_color(&self.config.subtle)?;

        match line {
            Some(line) => write!(self.stream, "{line:>line_num_width$}")?,
            None => write!(self.stream, "{:>line_num_width$}", "")?,
        }

        write!(self.stream, " {} ", self.config.gutter)?;

        self.stream.reset()?;

        Ok(())
    }

    #[allow(clippy::type_complexity)]
    fn snippets_by_source(
        &self,
    ) -> BTreeMap<S::SourceId, (&'a Cached<S::Source>, Vec<&'a Snippet<S>>)> {
        let mut by_source = BTreeMap::new();

        for snippet in &self.diagnostic.snippets {
            let Some(source) = self.sources.get_source(snippet.source_id) else {
                continue;
            };

            by_source
                .entry(snippet.source_id)
                .or_insert_with(|| (source, vec![]))
                .1
                .push(snippet);
        }

        by_source
    }

    /// Splits line-sorted snippets into groups whose context windows overlap.
    #[allow(clippy::type_complexity)]
    fn group_lines(
        &self,
        source: &Cached<S::Source>,
        snippets: Vec<&'a Snippet<S>>,
    ) -> Vec<(Vec<&'a Snippet<S>>, RangeInclusive<usize>)> {
        let context = self.config.context_size;
        let last_line = source.num_lines();

        let mut groups: Vec<(Vec<&'a Snippet<S>>, RangeInclusive<usize>)> = vec![];

        for snippet in snippets {
            let start = snippet.line.saturating_sub(context).max(1);
            let end = (snippet.line + context).min(last_line).max(start);

            match groups.last_mut() {
                Some((group, lines)) if start <= *lines.end() + 1 => {
                    group.push(snippet);
                    *lines = *lines.start()..=end.max(*lines.end());
                }
                _ => groups.push((vec![snippet], start..=end)),
            }
        }

        groups
    }

    fn snippet_color(&self, kind: SnippetKind) -> &'a ColorSpec {
        match kind {
            SnippetKind::Primary => &self.config.error_color,
            SnippetKind::Secondary => &self.config.emphasis,
        }
    }
}

fn str_width(s: &str) -> usize {
    let num_tabs = s.chars().filter(|&ch| ch == '\t').count();
    s.width() + num_tabs * TAB.len()
}

#[cfg(test)]
mod tests {
    use termcolor::NoColor;

    use crate::sources::{Cached, Sources};
    use crate::{Config, Diagnostic, Snippet};

    #[must_use]
    fn diagnostic_to_string<S: Sources>(diagnostic: &Diagnostic<S>, sources: &S) -> String {
        let config = Config::default();
        let mut stream = NoColor::new(vec![]);

        diagnostic
            .write_to_stream(sources, &config, &mut stream)
            .unwrap();

        String::from_utf8(stream.into_inner()).unwrap()
    }

    fn sources(source: &str) -> Vec<Cached<(String, String)>> {
        vec![Cached::new(("test.c".to_owned(), source.to_owned()))]
    }

    #[test]
    fn message_only() {
        let diagnostic = Diagnostic::<Vec<Cached<(String, String)>>>::error()
            .with_message("no input");

        assert_eq!(
            diagnostic_to_string(&diagnostic, &sources("")),
            "Error: no input\n\n"
        );
    }

    #[test]
    fn underlines_trimmed_line() {
        let sources = sources("void f() {\n    int x = 1.5;\n}");

        let diagnostic = Diagnostic::error()
            .with_message("types mismatching")
            .with_snippet(Snippet::primary("here", 0, 2));

        assert_eq!(
            diagnostic_to_string(&diagnostic, &sources),
            "Error: types mismatching\n\
             In test.c:2\n\
             1 │ void f() {\n\
             2 │     int x = 1.5;\n\
             \x20 │     ^^^^^^^^^^^^ here\n\
             3 │ }\n\
             \n"
        );
    }

    #[test]
    fn overlapping_snippets_share_a_group() {
        let sources = sources("int a;\nint a;");

        let diagnostic = Diagnostic::error()
            .with_snippet(Snippet::secondary("first", 0, 1))
            .with_snippet(Snippet::primary("second", 0, 2));

        assert_eq!(
            diagnostic_to_string(&diagnostic, &sources),
            "Error:\n\
             In test.c:1\n\
             1 │ int a;\n\
             \x20 │ ^^^^^^ first\n\
             2 │ int a;\n\
             \x20 │ ^^^^^^ second\n\
             \n"
        );
    }
}
