use std::fmt;
use std::hash::Hash;

pub trait Sources {
    type SourceId: Copy + Eq + Hash + Ord + fmt::Debug;
    type Source: Source;

    fn get_source(&self, id: Self::SourceId) -> Option<&Cached<Self::Source>>;
}

pub trait Source {
    fn name_str(&self) -> &str;
    fn source_str(&self) -> &str;
}

impl<S: Source> Sources for Vec<Cached<S>> {
    type SourceId = usize;
    type Source = S;

    fn get_source(&self, id: Self::SourceId) -> Option<&Cached<Self::Source>> {
        self.get(id)
    }
}

impl Source for (String, String) {
    fn name_str(&self) -> &str {
        &self.0
    }

    fn source_str(&self) -> &str {
        &self.1
    }
}

/// A source together with the byte offsets of its line breaks.
#[derive(Debug, Clone)]
pub struct Cached<S: Source> {
    source: S,
    line_breaks: Vec<usize>,
}

impl<S: Source> Cached<S> {
    pub fn new(source: S) -> Self {
        let line_breaks = source
            .source_str()
            .char_indices()
            .filter_map(|(i, ch)| (ch == '\n').then_some(i))
            .collect();

        Self {
            source,
            line_breaks,
        }
    }

    pub fn as_source(&self) -> &S {
        &self.source
    }

    pub fn line_to_byte(&self, index: usize) -> Option<usize> {
        if index == 0 {
            Some(0)
        } else {
            self.line_breaks.get(index - 1).map(|&byte| byte + 1)
        }
    }

    /// Text of the line at 0-based `index`, without its line terminator.
    pub fn line_str(&self, index: usize) -> Option<&str> {
        let start = self.line_to_byte(index)?;
        let end = self
            .line_to_byte(index + 1)
            .unwrap_or(self.source_str().len());

        let s = &self.source_str()[start..end];
        let s = s.strip_suffix('\n').unwrap_or(s);
        let s = s.strip_suffix('\r').unwrap_or(s);

        Some(s)
    }

    pub fn num_lines(&self) -> usize {
        1 + self.line_breaks.len()
    }
}

impl<S: Source> Source for Cached<S> {
    fn name_str(&self) -> &str {
        self.source.name_str()
    }

    fn source_str(&self) -> &str {
        self.source.source_str()
    }
}

#[cfg(test)]
mod tests {
    use super::Cached;

    fn cached_str(s: impl Into<String>) -> Cached<(String, String)> {
        Cached::new(("sample".to_owned(), s.into()))
    }

    #[test]
    fn test_line_to_byte() {
        let cached = cached_str("");
        assert_eq!(cached.line_to_byte(0), Some(0));
        assert_eq!(cached.line_to_byte(1), None);

        let cached = cached_str("x\n");
        assert_eq!(cached.line_to_byte(0), Some(0));
        assert_eq!(cached.line_to_byte(1), Some(2));
        assert_eq!(cached.line_to_byte(2), None);

        let cached = cached_str("\nx");
        assert_eq!(cached.line_to_byte(0), Some(0));
        assert_eq!(cached.line_to_byte(1), Some(1));
        assert_eq!(cached.line_to_byte(2), None);
    }

    #[test]
    fn test_line_str() {
        let cached = cached_str("");
        assert_eq!(cached.line_str(0), Some(""));
        assert_eq!(cached.line_str(1), None);

        let cached = cached_str("int a;\r\nint b;\n");
        assert_eq!(cached.line_str(0), Some("int a;"));
        assert_eq!(cached.line_str(1), Some("int b;"));
        assert_eq!(cached.line_str(2), Some(""));
        assert_eq!(cached.line_str(3), None);
        assert_eq!(cached.num_lines(), 3);
    }
}
