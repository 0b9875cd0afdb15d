//! Search engine - fuzzy match, related expansion, scoring and fusion / 搜索引擎
//!
//! Flow for games / novels:
//! 1. direct query with the keyword predicate
//! 2. (optional) related-entity resolution + referencing query, direct ids excluded
//! 3. score, +direct bonus, stable sort by score desc
//! 4. paginate
//!
//! Producers / persons / characters degrade to a plain fuzzy lookup.

use super::predicate::FuzzyPredicate;
use super::resolver::{resolve_related, RelatedEntities, ENTITY_CAP};
use super::schema::{Candidate, MatchType, Page, ScoredResult, SearchRequest};
use super::scorer::score_work;
use super::tokenizer::tokenize;
use crate::catalog::{CatalogStore, ReferenceFilter, WorkQuery};
use crate::error::SearchError;
use crate::models::{EntityKind, SearchTarget, Work, WorkKind};

/// Search engine over a catalog store / 搜索引擎
pub struct SearchEngine<S> {
    store: S,
    entity_cap: usize,
}

impl<S: CatalogStore> SearchEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            entity_cap: ENTITY_CAP,
        }
    }

    /// Override the per-kind related-entity cap / 设置关联实体上限
    pub fn with_entity_cap(mut self, cap: usize) -> Self {
        self.entity_cap = cap.max(1);
        self
    }

    /// Run one search request / 执行搜索
    pub async fn search(&self, request: &SearchRequest) -> Result<Page<ScoredResult>, SearchError> {
        let keyword = request.keyword();
        let tokens = tokenize(keyword);
        tracing::debug!(
            "Search keyword={:?} kind={:?} page={} limit={} related={} tokens={:?}",
            keyword,
            request.kind(),
            request.page(),
            request.limit(),
            request.expands_related(),
            tokens
        );

        let ranked = match request.kind().target() {
            SearchTarget::Work(kind) => self.search_works(kind, request, &tokens).await?,
            SearchTarget::Entity(kind) => self.lookup_entities(kind, keyword, &tokens).await?,
        };

        Ok(Page::paginate(ranked, request.page(), request.limit()))
    }

    async fn search_works(
        &self,
        kind: WorkKind,
        request: &SearchRequest,
        tokens: &[String],
    ) -> Result<Vec<ScoredResult>, SearchError> {
        let keyword = request.keyword();
        let predicate = FuzzyPredicate::build(keyword, tokens, true);
        let direct = self
            .store
            .find_works(kind, &WorkQuery::Matching(predicate))
            .await?;

        let (related, related_works) = if request.expands_related() {
            let related = resolve_related(&self.store, keyword, tokens, self.entity_cap).await?;
            let works = if related.is_empty() {
                Vec::new()
            } else {
                let exclude = direct.iter().map(Work::id).collect();
                let filter = ReferenceFilter::from_related(&related, exclude);
                self.store
                    .find_works(kind, &WorkQuery::Referencing(filter))
                    .await?
            };
            (related, works)
        } else {
            (RelatedEntities::default(), Vec::new())
        };

        tracing::debug!(
            "Search {:?}: {} direct, {} related",
            keyword,
            direct.len(),
            related_works.len()
        );

        Ok(fuse(direct, related_works, keyword, tokens, &related))
    }

    async fn lookup_entities(
        &self,
        kind: EntityKind,
        keyword: &str,
        tokens: &[String],
    ) -> Result<Vec<ScoredResult>, SearchError> {
        let predicate = FuzzyPredicate::build(keyword, tokens, kind.has_translated_name());
        let records = self.store.find_entities(kind, &predicate, None).await?;
        Ok(records
            .into_iter()
            .map(|record| ScoredResult {
                candidate: Candidate::Entity(record),
                match_type: MatchType::Direct,
                match_info: Vec::new(),
                score: 0,
            })
            .collect())
    }
}

/// Merge, dedup, score and rank / 合并、去重、打分、排序
///
/// Direct membership wins over related membership for the same id. Ties keep
/// catalog order: direct hits first, then related, each in store order.
pub fn fuse(
    direct: Vec<Work>,
    related: Vec<Work>,
    keyword: &str,
    tokens: &[String],
    entities: &RelatedEntities,
) -> Vec<ScoredResult> {
    let mut seen = std::collections::HashSet::new();
    let tagged = direct
        .into_iter()
        .map(|work| (work, MatchType::Direct))
        .chain(related.into_iter().map(|work| (work, MatchType::Related)));

    let mut results: Vec<ScoredResult> = tagged
        .filter(|(work, _)| seen.insert(work.id()))
        .map(|(work, match_type)| {
            let score = score_work(&work, keyword, tokens, entities);
            ScoredResult {
                score: score.finalize(match_type),
                match_info: score.signals,
                match_type,
                candidate: Candidate::Work(work),
            }
        })
        .collect();

    // sort_by is stable
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::models::{EntityRecord, EntityRef, GameRecord, NovelRecord, SearchKind};
    use crate::search::scorer::Signal;

    fn catalog() -> MemoryCatalog {
        let mut fsn = GameRecord::new(1, ["Fate/stay night"]);
        fsn.staff = vec![EntityRef::new(100, "Kinoko Nasu")];

        let mut tsukihime = GameRecord::new(2, ["Tsukihime"]);
        tsukihime.staff = vec![EntityRef::new(100, "Kinoko Nasu")];

        let mut mahoyo = GameRecord::new(3, ["Mahoutsukai no Yoru"]);
        mahoyo.tags = vec![EntityRef::new(300, "Fate series")];

        let clannad = GameRecord::new(4, ["CLANNAD"]);

        let mut kara = NovelRecord::new(5, "Kara no Kyoukai");
        kara.authors = vec![EntityRef::new(100, "Kinoko Nasu")];

        MemoryCatalog::new()
            .with_entity(EntityRecord::new(EntityKind::Person, 100, "Kinoko Nasu"))
            .with_entity(EntityRecord::new(EntityKind::Tag, 300, "Fate series"))
            .with_work(Work::Game(fsn))
            .with_work(Work::Game(tsukihime))
            .with_work(Work::Game(mahoyo))
            .with_work(Work::Game(clannad))
            .with_work(Work::Novel(kara))
    }

    fn request(keyword: &str, kind: SearchKind) -> SearchRequest {
        SearchRequest::new(keyword, kind).unwrap()
    }

    fn ids(page: &Page<ScoredResult>) -> Vec<i64> {
        page.items.iter().map(|r| r.candidate.id()).collect()
    }

    #[tokio::test]
    async fn test_direct_only_latin_keyword() {
        let engine = SearchEngine::new(catalog());
        let page = engine.search(&request("Fate", SearchKind::Game)).await.unwrap();

        assert_eq!(ids(&page), vec![1]);
        let hit = &page.items[0];
        assert_eq!(hit.match_type, MatchType::Direct);
        assert_eq!(hit.score, 80 + 100);
        assert_eq!(hit.match_info, vec![Signal::TitleContain]);
    }

    #[tokio::test]
    async fn test_expansion_reaches_works_through_staff() {
        let engine = SearchEngine::new(catalog());
        let req = request("Nasu", SearchKind::Game).expand_related(true);
        let page = engine.search(&req).await.unwrap();

        // both games reference the person, neither title matches
        assert_eq!(ids(&page), vec![1, 2]);
        assert!(page.items.iter().all(|r| r.match_type == MatchType::Related));
        assert!(page.items.iter().all(|r| r.score == 60));
    }

    #[tokio::test]
    async fn test_title_hit_beats_staff_only_hit() {
        let engine = SearchEngine::new(catalog());
        let req = request("Fate", SearchKind::Game).expand_related(true);
        let page = engine.search(&req).await.unwrap();

        // game 3 reaches the result only through the "Fate series" tag
        assert_eq!(ids(&page), vec![1, 3]);
        assert_eq!(page.items[0].match_type, MatchType::Direct);
        assert_eq!(page.items[0].score, 180);
        assert_eq!(page.items[1].match_type, MatchType::Related);
        assert_eq!(page.items[1].score, 20);
        assert_eq!(page.items[1].match_info, vec![Signal::Tag]);
    }

    #[tokio::test]
    async fn test_direct_wins_dedup() {
        let mut fsn = GameRecord::new(1, ["Fate/stay night"]);
        fsn.tags = vec![EntityRef::new(300, "Fate series")];
        let store = MemoryCatalog::new()
            .with_entity(EntityRecord::new(EntityKind::Tag, 300, "Fate series"))
            .with_work(Work::Game(fsn));
        let engine = SearchEngine::new(store);

        let req = request("Fate", SearchKind::Game).expand_related(true);
        let page = engine.search(&req).await.unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].match_type, MatchType::Direct);
        assert_eq!(page.items[0].score, 80 + 20 + 100);
    }

    #[test]
    fn test_fuse_dedups_and_keeps_catalog_order_on_ties() {
        let a = Work::Game(GameRecord::new(1, ["x"]));
        let b = Work::Game(GameRecord::new(2, ["y"]));
        let c = Work::Game(GameRecord::new(3, ["z"]));
        let results = fuse(
            vec![b.clone(), a.clone()],
            vec![a, c],
            "q",
            &[],
            &RelatedEntities::default(),
        );
        let order: Vec<(i64, MatchType)> = results
            .iter()
            .map(|r| (r.candidate.id(), r.match_type))
            .collect();
        assert_eq!(
            order,
            vec![(2, MatchType::Direct), (1, MatchType::Direct), (3, MatchType::Related)]
        );
    }

    #[tokio::test]
    async fn test_novel_search_uses_novel_titles() {
        let engine = SearchEngine::new(catalog());
        let page = engine
            .search(&request("kyoukai", SearchKind::Novel))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![5]);
        assert_eq!(page.items[0].score, 180);
    }

    #[tokio::test]
    async fn test_entity_kind_is_plain_lookup() {
        let engine = SearchEngine::new(catalog());
        let page = engine
            .search(&request("nasu", SearchKind::Person).expand_related(true))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![100]);
        assert_eq!(page.items[0].score, 0);
        assert!(page.items[0].match_info.is_empty());
        assert_eq!(page.items[0].match_type, MatchType::Direct);
    }

    #[tokio::test]
    async fn test_empty_direct_without_expansion_is_empty_page() {
        let engine = SearchEngine::new(catalog());
        let page = engine
            .search(&request("nothing matches", SearchKind::Game))
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn test_page_beyond_total() {
        let engine = SearchEngine::new(catalog());
        let req = request("a", SearchKind::Game)
            .with_limit(100)
            .unwrap()
            .with_page(3)
            .unwrap();
        let page = engine.search(&req).await.unwrap();
        assert!(page.items.is_empty());
        // CLANNAD, Fate/stay night, Mahoutsukai no Yoru
        assert_eq!(page.total_items, 3);
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn test_search_is_idempotent() {
        let engine = SearchEngine::new(catalog());
        let req = request("Fate", SearchKind::Game).expand_related(true);
        let first = serde_json::to_string(&engine.search(&req).await.unwrap()).unwrap();
        let second = serde_json::to_string(&engine.search(&req).await.unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_escape_keyword_is_exact_only() {
        let store = MemoryCatalog::new()
            .with_work(Work::Game(GameRecord::new(1, [r"Fate\Zero"])))
            .with_work(Work::Game(GameRecord::new(2, ["Fate/Zero"])));
        let engine = SearchEngine::new(store);
        let page = engine
            .search(&request(r"Fate\Zero", SearchKind::Game))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![1]);
        assert_eq!(page.items[0].match_info[0], Signal::TitleExact);
    }
}
