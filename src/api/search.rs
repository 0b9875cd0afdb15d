use axum::{
    extract::{Query, State},
    Json,
};
use catalog_search::search::{Page, ScoredResult, SearchRequest};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse};
use crate::state::AppState;

/// Raw query parameters, validated by `SearchRequest::parse` / 原始查询参数
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub keyword: Option<String>,
    pub kind: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub related: Option<String>,
}

/// GET /api/search - 搜索
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Page<ScoredResult>>>, ApiError> {
    let request = SearchRequest::parse(
        params.keyword.as_deref(),
        params.kind.as_deref(),
        params.page.as_deref(),
        params.limit.as_deref(),
        params.related.as_deref(),
        state.config.search.default_limit,
    )?;

    if let Some(page) = state.cache.get(&request) {
        return Ok(Json(ApiResponse::success(page)));
    }

    let page = state.engine.search(&request).await?;
    state.cache.insert(request, page.clone());
    Ok(Json(ApiResponse::success(page)))
}
