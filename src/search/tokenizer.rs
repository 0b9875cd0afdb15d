//! Multilingual keyword segmenter / 多语言分词
//!
//! Each script bucket is tokenized independently:
//! - Chinese: 2/3/4-character windows over the Han stream (first two of each size)
//! - Latin: whitespace split + English stopword removal
//! - Japanese: dictionary morphological analysis (surface forms)
//!
//! Output order is Chinese → Latin → Japanese.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::lexicon::{english_stopwords, japanese_analyzer};
use super::script::{classify, is_han, ScriptBuckets};

/// Tokens shorter than this (in chars) never reach predicates or score boosts / 最短有效词长
pub const MIN_TOKEN_CHARS: usize = 3;

/// Window sizes for Chinese slicing / 中文切片窗口
const CHINESE_WINDOWS: [usize; 3] = [2, 3, 4];

/// Windows kept per size / 每种窗口保留数
const WINDOWS_PER_SIZE: usize = 2;

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{P}\p{S}]+").expect("punctuation pattern is valid"));

/// Replace punctuation and symbols with whitespace, then trim / 标点替换为空格
pub fn strip_punctuation(text: &str) -> String {
    PUNCTUATION.replace_all(text, " ").trim().to_string()
}

/// Tokenize a keyword / 对关键词进行分词
///
/// Deterministic: the same input always yields the same tokens in the same order.
pub fn tokenize(keyword: &str) -> Vec<String> {
    let cleaned = strip_punctuation(keyword);
    if cleaned.is_empty() {
        return Vec::new();
    }

    let buckets = classify(&cleaned);
    let mut tokens = chinese_ngrams(&buckets.chinese);
    tokens.extend(latin_words(&buckets.latin));
    tokens.extend(japanese_words(&buckets.japanese));
    tokens
}

/// Whether a token is long enough to matter / 是否为有效词
pub fn is_significant(token: &str) -> bool {
    token.chars().count() >= MIN_TOKEN_CHARS
}

/// Chinese n-gram windows / 中文 N-gram
///
/// Example: "魔法少女" -> ["魔法", "法少", "魔法少", "法少女", "魔法少女"]
pub fn chinese_ngrams(bucket: &str) -> Vec<String> {
    let chars: Vec<char> = bucket.chars().filter(|c| is_han(*c)).collect();
    let mut ngrams = Vec::new();

    for n in CHINESE_WINDOWS {
        if n > chars.len() {
            break;
        }
        ngrams.extend(
            chars
                .windows(n)
                .take(WINDOWS_PER_SIZE)
                .map(|window| window.iter().collect::<String>()),
        );
    }

    ngrams
}

/// Latin words without stopwords / 英文分词（去停用词）
pub fn latin_words(bucket: &str) -> Vec<String> {
    let stopwords = english_stopwords();
    bucket
        .split_whitespace()
        .filter(|word| !stopwords.is_stopword(word))
        .map(str::to_string)
        .collect()
}

/// Japanese surface forms, run by run / 日语分词
pub fn japanese_words(bucket: &str) -> Vec<String> {
    let analyzer = japanese_analyzer();
    ScriptBuckets::runs(bucket)
        .flat_map(|run| analyzer.surface_forms(run))
        .filter(|surface| !surface.trim().is_empty())
        .collect()
}

/// Traditional → simplified pairs for common characters / 繁简对照（常用字）
const TRADITIONAL_PAIRS: &[(char, char)] = &[
    ('國', '国'), ('學', '学'), ('書', '书'), ('電', '电'), ('話', '话'),
    ('語', '语'), ('說', '说'), ('讀', '读'), ('寫', '写'), ('聽', '听'),
    ('見', '见'), ('視', '视'), ('開', '开'), ('關', '关'), ('門', '门'),
    ('間', '间'), ('時', '时'), ('會', '会'), ('對', '对'), ('為', '为'),
    ('無', '无'), ('從', '从'), ('來', '来'), ('後', '后'), ('發', '发'),
    ('動', '动'), ('機', '机'), ('車', '车'), ('東', '东'), ('風', '风'),
    ('雲', '云'), ('長', '长'), ('遠', '远'), ('進', '进'), ('過', '过'),
    ('還', '还'), ('運', '运'), ('記', '记'), ('圖', '图'), ('畫', '画'),
    ('聲', '声'), ('樂', '乐'), ('藝', '艺'), ('術', '术'), ('體', '体'),
    ('愛', '爱'), ('實', '实'), ('現', '现'), ('夢', '梦'), ('裡', '里'),
    ('頭', '头'), ('點', '点'), ('線', '线'), ('邊', '边'), ('戰', '战'),
    ('鬥', '斗'), ('勝', '胜'), ('敗', '败'), ('師', '师'), ('醫', '医'),
    ('導', '导'), ('習', '习'), ('戀', '恋'), ('戲', '戏'), ('遊', '游'),
    ('劍', '剑'), ('靈', '灵'), ('傳', '传'), ('貓', '猫'),
    ('館', '馆'), ('騎', '骑'), ('龍', '龙'), ('鳥', '鸟'), ('島', '岛'),
    ('園', '园'), ('彈', '弹'), ('殺', '杀'), ('燈', '灯'), ('們', '们'),
];

static TO_SIMPLIFIED: Lazy<HashMap<char, char>> =
    Lazy::new(|| TRADITIONAL_PAIRS.iter().copied().collect());

/// Fold traditional characters to simplified / 繁体转简体
pub fn to_simplified(text: &str) -> String {
    text.chars()
        .map(|c| TO_SIMPLIFIED.get(&c).copied().unwrap_or(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_latin_drops_stopwords() {
        let tokens = tokenize("The Fate of the World");
        assert_eq!(tokens, vec!["Fate", "World"]);
    }

    #[test]
    fn test_tokenize_punctuation_splits_words() {
        let tokens = tokenize("Fate/stay night!");
        assert_eq!(tokens, vec!["Fate", "stay", "night"]);
    }

    #[test]
    fn test_chinese_windows_capped() {
        let tokens = chinese_ngrams("魔法少女小圆");
        assert_eq!(
            tokens,
            vec!["魔法", "法少", "魔法少", "法少女", "魔法少女", "法少女小"]
        );
        assert_eq!(tokens.len(), 6);
    }

    #[test]
    fn test_single_han_yields_no_windows() {
        assert!(tokenize("妹").is_empty());
        assert!(tokenize("妹").len() <= 6);
    }

    #[test]
    fn test_short_chinese_input() {
        assert_eq!(chinese_ngrams("妹妹"), vec!["妹妹"]);
        assert_eq!(chinese_ngrams("我的妹"), vec!["我的", "的妹", "我的妹"]);
    }

    #[test]
    fn test_chinese_stream_ignores_run_breaks() {
        assert_eq!(chinese_ngrams("命运 之夜"), chinese_ngrams("命运之夜"));
    }

    #[test]
    fn test_mixed_order_chinese_latin_japanese() {
        let tokens = tokenize("命运之夜 Fate");
        assert_eq!(tokens[..5].to_vec(), vec!["命运", "运之", "命运之", "运之夜", "命运之夜"]);
        assert_eq!(tokens[5], "Fate");
    }

    #[test]
    fn test_japanese_branch_used_with_kana() {
        let tokens = tokenize("東京タワー");
        assert!(!tokens.is_empty());
        assert_eq!(tokens.concat(), "東京タワー");
        assert!(chinese_ngrams(&classify("東京タワー").chinese).is_empty());
    }

    #[test]
    fn test_japanese_runs_segmented_in_order() {
        // kana present, so 魔法 joins the Japanese bucket as its own run
        let tokens = tokenize("まどか 魔法");
        assert_eq!(tokens.concat(), "まどか魔法");
        assert_eq!(tokens.last().map(String::as_str), Some("魔法"));
        assert!(tokens.len() >= 2);
    }

    #[test]
    fn test_tokenize_deterministic() {
        for keyword in ["Fate/stay night", "魔法少女まどか☆マギカ", "命运石之门 Steins;Gate", ""] {
            assert_eq!(tokenize(keyword), tokenize(keyword));
        }
    }

    #[test]
    fn test_is_significant() {
        assert!(is_significant("abc"));
        assert!(is_significant("魔法少"));
        assert!(!is_significant("魔法"));
        assert!(!is_significant("ab"));
    }

    #[test]
    fn test_to_simplified() {
        assert_eq!(to_simplified("戀愛遊戲"), "恋爱游戏");
        assert_eq!(to_simplified("Fate"), "Fate");
    }

    #[test]
    fn test_traditional_table_has_no_identity_pairs() {
        assert!(TRADITIONAL_PAIRS.iter().all(|(t, s)| t != s));
    }
}
