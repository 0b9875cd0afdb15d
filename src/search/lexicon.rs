//! Process-wide read-only lexical resources / 全局只读词典资源
//!
//! - English stopword set used by the Latin branch
//! - Japanese morphological analyzer (lindera + embedded IPADIC)
//!
//! Both are built lazily on first use and never mutated afterwards.

use std::borrow::Cow;
use std::collections::HashSet;

use lindera::dictionary::{load_dictionary_from_kind, DictionaryKind};
use lindera::mode::Mode;
use lindera::segmenter::Segmenter;
use once_cell::sync::Lazy;

/// Standard English stopword list / 英文停用词
const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and",
    "any", "are", "aren't", "as", "at", "be", "because", "been", "before", "being",
    "below", "between", "both", "but", "by", "can", "cannot", "could", "couldn't",
    "did", "didn't", "do", "does", "doesn't", "doing", "don't", "down", "during",
    "each", "few", "for", "from", "further", "had", "hadn't", "has", "hasn't",
    "have", "haven't", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "i", "if", "in", "into", "is", "isn't", "it", "it's",
    "its", "itself", "just", "me", "more", "most", "my", "myself", "no", "nor",
    "not", "now", "of", "off", "on", "once", "only", "or", "other", "ought", "our",
    "ours", "ourselves", "out", "over", "own", "same", "she", "should", "shouldn't",
    "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through",
    "to", "too", "under", "until", "up", "very", "was", "wasn't", "we", "were",
    "weren't", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "won't", "would", "wouldn't", "you", "your", "yours",
    "yourself", "yourselves",
];

/// Stopword lookup / 停用词表
pub trait StopwordSet: Send + Sync {
    /// Case-insensitive membership / 不区分大小写
    fn is_stopword(&self, word: &str) -> bool;
}

pub struct EnglishStopwords {
    words: HashSet<&'static str>,
}

impl EnglishStopwords {
    fn new() -> Self {
        Self {
            words: ENGLISH_STOPWORDS.iter().copied().collect(),
        }
    }
}

impl StopwordSet for EnglishStopwords {
    fn is_stopword(&self, word: &str) -> bool {
        self.words.contains(word.to_lowercase().as_str())
    }
}

/// Dictionary-based tokenization yielding surface forms / 形态素分析
pub trait MorphologicalAnalyzer: Send + Sync {
    fn surface_forms(&self, text: &str) -> Vec<String>;
}

/// IPADIC-backed analyzer / 基于 IPADIC 的分析器
pub struct LinderaAnalyzer {
    segmenter: Segmenter,
}

impl LinderaAnalyzer {
    pub fn load() -> Result<Self, String> {
        let dictionary = load_dictionary_from_kind(DictionaryKind::IPADIC)
            .map_err(|e| format!("failed to load IPADIC dictionary: {}", e))?;
        let segmenter = Segmenter::new(Mode::Normal, dictionary, None);
        Ok(Self { segmenter })
    }
}

impl MorphologicalAnalyzer for LinderaAnalyzer {
    fn surface_forms(&self, text: &str) -> Vec<String> {
        match self.segmenter.segment(Cow::Borrowed(text)) {
            Ok(tokens) => tokens
                .into_iter()
                .map(|token| token.text.trim().to_string())
                .filter(|surface| !surface.is_empty())
                .collect(),
            Err(e) => {
                tracing::warn!("Japanese segmentation failed for {:?}: {}", text, e);
                WhitespaceAnalyzer.surface_forms(text)
            }
        }
    }
}

/// Fallback when no dictionary is available / 无词典时的退化实现
pub struct WhitespaceAnalyzer;

impl MorphologicalAnalyzer for WhitespaceAnalyzer {
    fn surface_forms(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }
}

static STOPWORDS: Lazy<EnglishStopwords> = Lazy::new(EnglishStopwords::new);

static JAPANESE: Lazy<Box<dyn MorphologicalAnalyzer>> = Lazy::new(|| match LinderaAnalyzer::load() {
    Ok(analyzer) => {
        tracing::info!("Japanese analyzer ready (IPADIC)");
        Box::new(analyzer)
    }
    Err(e) => {
        tracing::warn!("{}, falling back to whitespace splitting", e);
        Box::new(WhitespaceAnalyzer)
    }
});

/// Global English stopwords / 全局英文停用词
pub fn english_stopwords() -> &'static dyn StopwordSet {
    &*STOPWORDS
}

/// Global Japanese analyzer / 全局日语分析器
pub fn japanese_analyzer() -> &'static dyn MorphologicalAnalyzer {
    &**JAPANESE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwords_case_insensitive() {
        let stopwords = english_stopwords();
        assert!(stopwords.is_stopword("the"));
        assert!(stopwords.is_stopword("The"));
        assert!(stopwords.is_stopword("OF"));
        assert!(!stopwords.is_stopword("fate"));
    }

    #[test]
    fn test_whitespace_analyzer() {
        assert_eq!(WhitespaceAnalyzer.surface_forms(" 東京  タワー "), vec!["東京", "タワー"]);
    }

    #[test]
    fn test_japanese_analyzer_covers_input() {
        let forms = japanese_analyzer().surface_forms("東京タワー");
        assert!(!forms.is_empty());
        assert!(forms.iter().all(|f| !f.trim().is_empty()));
        assert_eq!(forms.concat(), "東京タワー");
    }

    #[test]
    fn test_ipadic_splits_compound() {
        let forms = japanese_analyzer().surface_forms("東京タワー");
        assert!(forms.len() > 1, "dictionary segmentation expected, got {:?}", forms);
        assert_eq!(forms[0], "東京");
        assert!(forms.contains(&"タワー".to_string()));
    }

    #[test]
    fn test_lindera_analyzer_loads() {
        let analyzer = LinderaAnalyzer::load().unwrap();
        assert_eq!(analyzer.surface_forms("魔法少女"), vec!["魔法", "少女"]);
    }
}
