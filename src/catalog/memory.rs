//! In-memory catalog / 内存目录

use async_trait::async_trait;

use super::{CatalogStore, ReferenceFilter, WorkQuery};
use crate::error::StoreError;
use crate::models::{EntityKind, EntityRecord, Work, WorkKind};
use crate::search::predicate::FuzzyPredicate;

/// Denormalized records held in vectors / 内存中的反规范化记录
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    entities: Vec<EntityRecord>,
    works: Vec<Work>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entity(&mut self, record: EntityRecord) {
        self.entities.retain(|e| !(e.kind == record.kind && e.id == record.id));
        self.entities.push(record);
        self.entities.sort_by_key(|e| e.id);
    }

    pub fn add_work(&mut self, work: Work) {
        self.works.retain(|w| !(w.kind() == work.kind() && w.id() == work.id()));
        self.works.push(work);
        self.works.sort_by_key(Work::id);
    }

    pub fn with_entity(mut self, record: EntityRecord) -> Self {
        self.add_entity(record);
        self
    }

    pub fn with_work(mut self, work: Work) -> Self {
        self.add_work(work);
        self
    }
}

fn references(work: &Work, filter: &ReferenceFilter) -> bool {
    let view = work.view();
    EntityKind::ALL.iter().any(|kind| {
        let wanted = filter.ids(*kind);
        view.entity_refs.of(*kind).iter().any(|r| wanted.contains(&r.id))
    })
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn find_works(&self, kind: WorkKind, query: &WorkQuery) -> Result<Vec<Work>, StoreError> {
        let works = self.works.iter().filter(|w| w.kind() == kind);
        let found = match query {
            WorkQuery::Matching(predicate) => works
                .filter(|w| predicate.matches(&w.field_values()))
                .cloned()
                .collect(),
            WorkQuery::Referencing(filter) => works
                .filter(|w| !filter.exclude.contains(&w.id()))
                .filter(|w| references(w, filter))
                .cloned()
                .collect(),
        };
        Ok(found)
    }

    async fn find_entities(
        &self,
        kind: EntityKind,
        predicate: &FuzzyPredicate,
        limit: Option<usize>,
    ) -> Result<Vec<EntityRecord>, StoreError> {
        Ok(self
            .entities
            .iter()
            .filter(|e| e.kind == kind && predicate.matches(&e.field_values()))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}
