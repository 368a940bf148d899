// Header corpus: per-language column header lists.
//
// The loader reads the aggregated `Directory,...` CSV the similarity pipeline
// consumes. The aggregator builds that CSV from a scraped table corpus.

pub mod aggregate;
pub mod loader;

/// Column headers collected for a single language.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageHeaders {
    /// Language code, e.g. "en" or "de".
    pub language: String,
    /// Header tokens in input order. Never contains empty strings.
    pub headers: Vec<String>,
}

impl LanguageHeaders {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// All languages loaded for one run, in input row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderCorpus {
    languages: Vec<LanguageHeaders>,
}

impl HeaderCorpus {
    /// Build a corpus from `(language, headers)` pairs.
    ///
    /// Headers are trimmed and empty entries dropped. A language given twice
    /// keeps its first position but takes the later header list.
    pub fn from_pairs<L, I, H>(pairs: I) -> Self
    where
        L: Into<String>,
        H: AsRef<str>,
        I: IntoIterator<Item = (L, Vec<H>)>,
    {
        let mut corpus = Self::default();
        for (language, headers) in pairs {
            corpus.insert(language.into(), headers.iter().map(|h| h.as_ref()));
        }
        corpus
    }

    /// Insert or replace a language's header list. Returns true if the
    /// language was already present.
    pub(crate) fn insert<'a>(
        &mut self,
        language: String,
        headers: impl Iterator<Item = &'a str>,
    ) -> bool {
        let headers: Vec<String> = headers
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect();

        match self.languages.iter_mut().find(|l| l.language == language) {
            Some(existing) => {
                existing.headers = headers;
                true
            }
            None => {
                self.languages.push(LanguageHeaders { language, headers });
                false
            }
        }
    }

    pub fn languages(&self) -> &[LanguageHeaders] {
        &self.languages
    }

    pub fn get(&self, language: &str) -> Option<&LanguageHeaders> {
        self.languages.iter().find(|l| l.language == language)
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}
