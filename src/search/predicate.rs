//! Fuzzy predicate builder / 模糊匹配条件构造
//!
//! A keyword becomes either:
//! - an exact-equality predicate, when it contains [`ESCAPE_CHAR`] (literal bypass), or
//! - a case-insensitive literal substring predicate over name / translated-name /
//!   alias fields, OR'd with one pattern per significant token.
//!
//! The predicate is evaluated in memory via [`FuzzyPredicate::matches`] and rendered
//! to SQL by the SQLite catalog.

use regex::{Regex, RegexBuilder};

use super::tokenizer::{is_significant, to_simplified};
use crate::models::FieldValues;

/// Keywords containing this character are matched literally and exactly / 转义字符
pub const ESCAPE_CHAR: char = '\\';

/// Which field a value comes from / 字段角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Name,
    Translated,
    Alias,
}

/// One case-insensitive substring pattern / 子串模式
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Lowercased literal / 小写字面量
    needle: String,
    regex: Regex,
}

impl Pattern {
    fn new(literal: &str) -> Option<Self> {
        let regex = RegexBuilder::new(&regex::escape(literal))
            .case_insensitive(true)
            .build()
            .ok()?;
        Some(Self {
            needle: literal.to_lowercase(),
            regex,
        })
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

#[derive(Debug, Clone)]
pub enum MatchMode {
    /// Field equality only / 精确匹配
    Exact(String),
    /// Any pattern contained in any field / 子串匹配
    Contains(Vec<Pattern>),
}

/// Match predicate over name-like fields / 匹配条件
#[derive(Debug, Clone)]
pub struct FuzzyPredicate {
    mode: MatchMode,
    include_translated: bool,
}

impl FuzzyPredicate {
    /// Build from a keyword and its tokens / 由关键词和分词构造
    pub fn build(keyword: &str, tokens: &[String], include_translated: bool) -> Self {
        let keyword = keyword.trim();

        if keyword.contains(ESCAPE_CHAR) {
            return Self {
                mode: MatchMode::Exact(keyword.to_string()),
                include_translated,
            };
        }

        let mut patterns: Vec<Pattern> = Vec::new();
        let mut push = |literal: &str| {
            let lower = literal.to_lowercase();
            if literal.is_empty() || patterns.iter().any(|p| p.needle == lower) {
                return;
            }
            if let Some(pattern) = Pattern::new(literal) {
                patterns.push(pattern);
            }
        };

        push(keyword);
        let simplified = to_simplified(keyword);
        if simplified != keyword {
            push(&simplified);
        }
        for token in tokens.iter().filter(|t| is_significant(t)) {
            push(token);
        }

        Self {
            mode: MatchMode::Contains(patterns),
            include_translated,
        }
    }

    pub fn mode(&self) -> &MatchMode {
        &self.mode
    }

    pub fn is_exact(&self) -> bool {
        matches!(self.mode, MatchMode::Exact(_))
    }

    /// Whether a field of this role participates / 该字段是否参与匹配
    pub fn covers(&self, role: FieldRole) -> bool {
        role != FieldRole::Translated || self.include_translated
    }

    /// Evaluate against a record's fields / 对记录求值
    pub fn matches(&self, fields: &FieldValues<'_>) -> bool {
        let translated = fields.translated.filter(|_| self.include_translated);
        let mut values = fields
            .names
            .iter()
            .copied()
            .chain(translated)
            .chain(fields.aliases.iter().copied());

        match &self.mode {
            MatchMode::Exact(value) => values.any(|v| v == value),
            MatchMode::Contains(patterns) => {
                values.any(|v| patterns.iter().any(|p| p.is_match(v)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tokenizer::tokenize;

    fn fields<'a>(names: &[&'a str], translated: Option<&'a str>, aliases: &[&'a str]) -> FieldValues<'a> {
        FieldValues {
            names: names.to_vec(),
            translated,
            aliases: aliases.to_vec(),
        }
    }

    #[test]
    fn test_substring_case_insensitive() {
        let predicate = FuzzyPredicate::build("Fate", &tokenize("Fate"), true);
        assert!(predicate.matches(&fields(&["fate/stay night"], None, &[])));
        assert!(predicate.matches(&fields(&["x"], Some("FATE/Zero"), &[])));
        assert!(!predicate.matches(&fields(&["Steins;Gate"], None, &[])));
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let predicate = FuzzyPredicate::build("a.b+", &[], false);
        assert!(predicate.matches(&fields(&["xa.b+y"], None, &[])));
        assert!(!predicate.matches(&fields(&["axbb"], None, &[])));
    }

    #[test]
    fn test_translated_field_respects_flag() {
        let with = FuzzyPredicate::build("命运", &[], true);
        let without = FuzzyPredicate::build("命运", &[], false);
        let record = fields(&["Fate"], Some("命运之夜"), &[]);
        assert!(with.matches(&record));
        assert!(!without.matches(&record));
        assert!(!without.covers(FieldRole::Translated));
        assert!(without.covers(FieldRole::Alias));
    }

    #[test]
    fn test_escape_char_forces_exact() {
        let tokens = tokenize(r"Fate\Zero");
        assert!(!tokens.is_empty());
        let predicate = FuzzyPredicate::build(r"Fate\Zero", &tokens, true);
        assert!(predicate.is_exact());
        assert!(predicate.matches(&fields(&[r"Fate\Zero"], None, &[])));
        assert!(!predicate.matches(&fields(&[r"Fate\Zero Extra"], None, &[])));
        assert!(!predicate.matches(&fields(&["Fate"], None, &[])));
        assert!(!predicate.matches(&fields(&["Zero"], None, &[])));
    }

    #[test]
    fn test_short_tokens_not_patterns() {
        let predicate = FuzzyPredicate::build("ab cd", &["ab".to_string(), "cd".to_string()], false);
        match predicate.mode() {
            MatchMode::Contains(patterns) => {
                let needles: Vec<&str> = patterns.iter().map(Pattern::needle).collect();
                assert_eq!(needles, vec!["ab cd"]);
            }
            MatchMode::Exact(_) => panic!("expected substring predicate"),
        }
    }

    #[test]
    fn test_tokens_widen_matches_monotonically() {
        let keyword = "stay night fate";
        let all_tokens = tokenize(keyword);
        let records = [
            fields(&["Fate/Zero"], None, &[]),
            fields(&["Stay Alive"], None, &[]),
            fields(&["Midnight"], None, &[]),
            fields(&["Clannad"], None, &[]),
        ];

        let count = |tokens: &[String]| {
            let predicate = FuzzyPredicate::build(keyword, tokens, false);
            records.iter().filter(|r| predicate.matches(r)).count()
        };

        let full = count(&all_tokens);
        for skip in 0..all_tokens.len() {
            let fewer: Vec<String> = all_tokens
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, t)| t.clone())
                .collect();
            assert!(count(&fewer) <= full);
        }
        assert!(count(&[]) <= full);
        assert_eq!(full, 3);
    }

    #[test]
    fn test_traditional_keyword_also_matches_simplified() {
        let predicate = FuzzyPredicate::build("戀愛", &[], false);
        assert!(predicate.matches(&fields(&["恋爱游戏"], None, &[])));
        assert!(predicate.matches(&fields(&["戀愛遊戲"], None, &[])));
    }
}
