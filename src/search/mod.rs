//! Search module - fuzzy matching and ranking over the catalog / 搜索模块
//!
//! Pipeline / 流程：
//! - tokenizer: script classification + per-script segmentation
//! - predicate: keyword + tokens → match predicate (exact / substring)
//! - resolver: fuzzy lookup of related producers, persons, characters, tags
//! - scorer: weighted relevance score with contributing signals
//! - engine: direct + related fusion, dedup, ranking, pagination
//!
//! Features / 特性：
//! - Supports mixed Chinese, Japanese and Latin keywords
//! - Supports simplified/traditional matching
//! - Stateless per request, safe to share across tasks

pub mod engine;
pub mod lexicon;
pub mod predicate;
pub mod resolver;
pub mod schema;
pub mod scorer;
pub mod script;
pub mod tokenizer;

pub use engine::SearchEngine;
pub use predicate::FuzzyPredicate;
pub use resolver::{resolve_related, RelatedEntities};
pub use schema::{Candidate, MatchType, Page, ScoredResult, SearchRequest};
pub use scorer::{score_work, Signal};
pub use tokenizer::tokenize;
