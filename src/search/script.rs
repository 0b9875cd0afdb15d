//! Script classifier / 文字体系分类
//!
//! Splits a keyword into per-script buckets (Chinese, Latin, Japanese).
//! Han characters are ambiguous: they resolve to Japanese when the whole
//! input contains any kana, otherwise to Chinese.

/// Writing system of a single character / 字符所属文字体系
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Chinese,
    Japanese,
    Latin,
    Other,
}

/// Classified keyword, one string per script / 按文字体系分桶的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptBuckets {
    pub chinese: String,
    pub latin: String,
    pub japanese: String,
}

/// Hiragana / Katakana (incl. phonetic extensions and half-width forms)
pub fn is_kana(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{309f}' |  // Hiragana
        '\u{30a0}'..='\u{30ff}' |  // Katakana
        '\u{31f0}'..='\u{31ff}' |  // Katakana Phonetic Extensions
        '\u{ff66}'..='\u{ff9f}'    // Half-width Katakana
    )
}

/// CJK ideographs / 汉字
pub fn is_han(c: char) -> bool {
    matches!(c,
        '\u{4e00}'..='\u{9fff}' |  // CJK Unified Ideographs
        '\u{3400}'..='\u{4dbf}' |  // CJK Extension A
        '\u{f900}'..='\u{faff}'    // CJK Compatibility Ideographs
    )
}

/// Check if text contains any kana / 检测文本是否包含假名
pub fn contains_kana(text: &str) -> bool {
    text.chars().any(is_kana)
}

/// Classify one character; `han_as_japanese` comes from a whole-input kana check
pub fn classify_char(c: char, han_as_japanese: bool) -> Script {
    if c.is_ascii_alphanumeric() {
        Script::Latin
    } else if is_kana(c) {
        Script::Japanese
    } else if is_han(c) {
        if han_as_japanese {
            Script::Japanese
        } else {
            Script::Chinese
        }
    } else {
        Script::Other
    }
}

/// Split text into script buckets / 分桶
///
/// Expects punctuation to be replaced by whitespace already. Any
/// character classified `Other` flushes the current run without starting
/// a new one.
pub fn classify(text: &str) -> ScriptBuckets {
    let han_as_japanese = contains_kana(text);
    let mut buckets = ScriptBuckets::default();
    let mut run = String::new();
    let mut run_script = Script::Other;

    for c in text.chars() {
        let script = classify_char(c, han_as_japanese);
        if script != run_script {
            buckets.flush(run_script, &mut run);
            run_script = script;
        }
        if script != Script::Other {
            run.push(c);
        }
    }
    buckets.flush(run_script, &mut run);

    buckets
}

impl ScriptBuckets {
    fn flush(&mut self, script: Script, run: &mut String) {
        if run.is_empty() {
            return;
        }
        let bucket = match script {
            Script::Chinese => &mut self.chinese,
            Script::Latin => &mut self.latin,
            Script::Japanese => &mut self.japanese,
            Script::Other => {
                run.clear();
                return;
            }
        };
        if !bucket.is_empty() {
            bucket.push(' ');
        }
        bucket.push_str(run);
        run.clear();
    }

    /// Iterate over the runs of one bucket / 遍历某个桶中的片段
    pub fn runs(bucket: &str) -> impl Iterator<Item = &str> {
        bucket.split(' ').filter(|r| !r.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_latin_only() {
        let buckets = classify("Fate stay night");
        assert_eq!(buckets.latin, "Fate stay night");
        assert!(buckets.chinese.is_empty());
        assert!(buckets.japanese.is_empty());
    }

    #[test]
    fn test_han_without_kana_is_chinese() {
        let buckets = classify("妹");
        assert_eq!(buckets.chinese, "妹");
        assert!(buckets.japanese.is_empty());
    }

    #[test]
    fn test_single_kana_converts_all_han() {
        // "の" sits far away from the first Han run
        let buckets = classify("魔法少女 test 物語の");
        assert!(buckets.chinese.is_empty());
        assert_eq!(buckets.japanese, "魔法少女 物語の");
        assert_eq!(buckets.latin, "test");
    }

    #[test]
    fn test_mixed_runs_split_on_script_change() {
        let buckets = classify("命运之夜Fate2");
        assert_eq!(buckets.chinese, "命运之夜");
        assert_eq!(buckets.latin, "Fate2");
    }

    #[test]
    fn test_other_characters_are_boundaries() {
        // Hangul and accented letters are neither Latin nor CJK here
        let buckets = classify("ab한cd éf");
        assert_eq!(buckets.latin, "ab cd f");
    }

    #[test]
    fn test_runs_iterator() {
        let runs: Vec<&str> = ScriptBuckets::runs("ab cd").collect();
        assert_eq!(runs, vec!["ab", "cd"]);
        assert_eq!(ScriptBuckets::runs("").count(), 0);
    }
}
