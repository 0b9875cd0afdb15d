//! Search request / result schema / 搜索请求与结果定义

use serde::{Deserialize, Serialize};

use super::scorer::Signal;
use crate::error::SearchError;
use crate::models::{EntityRecord, RecordId, SearchKind, Work};

/// Upper bound for `limit` / 每页上限
pub const MAX_LIMIT: u32 = 100;

/// How a candidate was found / 命中方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Own fields matched the predicate / 直接命中
    Direct,
    /// Only reached through a related entity / 关联命中
    Related,
}

/// Scored or looked-up record / 候选记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Candidate {
    Work(Work),
    Entity(EntityRecord),
}

impl Candidate {
    pub fn id(&self) -> RecordId {
        match self {
            Candidate::Work(work) => work.id(),
            Candidate::Entity(entity) => entity.id,
        }
    }
}

/// Search result / 搜索结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub candidate: Candidate,
    pub match_type: MatchType,
    /// Contributing signals, for display only / 命中信号
    pub match_info: Vec<Signal>,
    pub score: u32,
}

/// One page of results / 分页结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: usize,
    pub items_per_page: u32,
    pub total_pages: usize,
    pub current_page: u32,
}

impl<T> Page<T> {
    /// Slice `[(page-1)*limit, page*limit)` out of a ranked list / 分页
    pub fn paginate(items: Vec<T>, page: u32, limit: u32) -> Self {
        let total_items = items.len();
        let per_page = limit.max(1) as usize;
        let skip = (page.max(1) as usize - 1).saturating_mul(per_page);

        Self {
            items: items.into_iter().skip(skip).take(per_page).collect(),
            total_items,
            items_per_page: limit,
            total_pages: total_items.div_ceil(per_page),
            current_page: page,
        }
    }

    pub fn empty(page: u32, limit: u32) -> Self {
        Self::paginate(Vec::new(), page, limit)
    }
}

/// Validated search request / 已校验的搜索请求
///
/// Fields are only reachable through the validating constructors, so a
/// request handed to the engine always has a non-empty keyword, `page >= 1`
/// and `limit` within `[1, MAX_LIMIT]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchRequest {
    /// Trimmed, never empty / 已去除首尾空白
    keyword: String,
    kind: SearchKind,
    page: u32,
    limit: u32,
    /// Expand through related entities / 是否关联扩展
    expand_related: bool,
}

impl SearchRequest {
    pub fn new(keyword: &str, kind: SearchKind) -> Result<Self, SearchError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(SearchError::Validation("keyword must not be empty".to_string()));
        }
        Ok(Self {
            keyword: keyword.to_string(),
            kind,
            page: 1,
            limit: 20,
            expand_related: false,
        })
    }

    pub fn with_page(mut self, page: i64) -> Result<Self, SearchError> {
        self.page = validate_page(page)?;
        Ok(self)
    }

    pub fn with_limit(mut self, limit: i64) -> Result<Self, SearchError> {
        self.limit = validate_limit(limit)?;
        Ok(self)
    }

    pub fn expand_related(mut self, enabled: bool) -> Self {
        self.expand_related = enabled;
        self
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn kind(&self) -> SearchKind {
        self.kind
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn expands_related(&self) -> bool {
        self.expand_related
    }

    /// Build from raw string parameters (HTTP query) / 从原始参数构造
    ///
    /// Missing page/limit fall back to 1 / `default_limit`; anything
    /// non-numeric or out of range is a validation error.
    pub fn parse(
        keyword: Option<&str>,
        kind: Option<&str>,
        page: Option<&str>,
        limit: Option<&str>,
        related: Option<&str>,
        default_limit: u32,
    ) -> Result<Self, SearchError> {
        let keyword =
            keyword.ok_or_else(|| SearchError::Validation("keyword is required".to_string()))?;
        let kind: SearchKind = kind
            .ok_or_else(|| SearchError::Validation("kind is required".to_string()))?
            .parse()?;

        let page = match page {
            Some(raw) => parse_number("page", raw)?,
            None => 1,
        };
        let limit = match limit {
            Some(raw) => parse_number("limit", raw)?,
            None => i64::from(default_limit),
        };
        let expand_related = match related.map(|r| r.trim().to_lowercase()) {
            None => false,
            Some(flag) => match flag.as_str() {
                "" | "0" | "false" | "no" => false,
                "1" | "true" | "yes" => true,
                other => {
                    return Err(SearchError::Validation(format!(
                        "related must be a boolean, got {:?}",
                        other
                    )))
                }
            },
        };

        Ok(Self::new(keyword, kind)?
            .with_page(page)?
            .with_limit(limit)?
            .expand_related(expand_related))
    }
}

fn parse_number(name: &str, raw: &str) -> Result<i64, SearchError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| SearchError::Validation(format!("{} must be a number, got {:?}", name, raw)))
}

fn validate_page(page: i64) -> Result<u32, SearchError> {
    if page < 1 || page > i64::from(u32::MAX) {
        return Err(SearchError::Validation(format!("page must be >= 1, got {}", page)));
    }
    Ok(page as u32)
}

fn validate_limit(limit: i64) -> Result<u32, SearchError> {
    if limit < 1 || limit > i64::from(MAX_LIMIT) {
        return Err(SearchError::Validation(format!(
            "limit must be within [1, {}], got {}",
            MAX_LIMIT, limit
        )));
    }
    Ok(limit as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_slices() {
        let page = Page::paginate((1..=25).collect::<Vec<_>>(), 2, 10);
        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total_items, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.items_per_page, 10);
    }

    #[test]
    fn test_paginate_beyond_last_page() {
        let page = Page::paginate((1..=7).collect::<Vec<_>>(), 5, 100);
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 7);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_empty_page() {
        let page: Page<u8> = Page::empty(1, 20);
        assert_eq!(page.total_items, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_request_validation() {
        assert!(SearchRequest::new("  ", SearchKind::Game).is_err());
        let request = SearchRequest::new(" Fate ", SearchKind::Game).unwrap();
        assert_eq!(request.keyword(), "Fate");
        assert!(request.clone().with_page(0).unwrap_err().is_validation());
        assert!(request.clone().with_limit(0).is_err());
        assert!(request.clone().with_limit(101).is_err());
        assert_eq!(request.with_limit(100).unwrap().limit(), 100);
    }

    #[test]
    fn test_parse_raw_parameters() {
        let request =
            SearchRequest::parse(Some("Fate"), Some("game"), Some("2"), Some("50"), Some("true"), 20)
                .unwrap();
        assert_eq!(request.page(), 2);
        assert_eq!(request.limit(), 50);
        assert!(request.expands_related());

        let defaults = SearchRequest::parse(Some("Fate"), Some("novel"), None, None, None, 20).unwrap();
        assert_eq!(defaults.page(), 1);
        assert_eq!(defaults.limit(), 20);
        assert!(!defaults.expands_related());
    }

    #[test]
    fn test_failed_setter_leaves_no_request() {
        // an invalid page/limit never yields a request the engine could run
        let base = SearchRequest::new("Fate", SearchKind::Game).unwrap();
        assert!(base.clone().with_page(0).is_err());
        assert!(base.clone().with_limit(0).is_err());
        assert!(base.clone().with_limit(-5).is_err());
        assert_eq!(base.page(), 1);
        assert_eq!(base.limit(), 20);
        assert_eq!(base.kind(), SearchKind::Game);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let cases = [
            (None, Some("game"), None, None),
            (Some("Fate"), None, None, None),
            (Some("Fate"), Some("tag"), None, None),
            (Some("Fate"), Some("game"), Some("abc"), None),
            (Some("Fate"), Some("game"), Some("-1"), None),
            (Some("Fate"), Some("game"), None, Some("1.5")),
            (Some("Fate"), Some("game"), None, Some("0")),
        ];
        for (keyword, kind, page, limit) in cases {
            let err = SearchRequest::parse(keyword, kind, page, limit, None, 20).unwrap_err();
            assert!(err.is_validation());
        }
    }
}
