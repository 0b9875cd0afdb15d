//! Catalog store seam / 目录存储接口
//!
//! The search pipeline only reads from the catalog. Two implementations:
//! - `SqliteCatalog`: sqlx-backed store (production)
//! - `MemoryCatalog`: in-process vectors (tests, seeding)
//!
//! Both return rows ordered by id; that order is the "catalog order" ties fall back to.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{EntityKind, EntityRecord, RecordId, Work, WorkKind};
use crate::search::predicate::FuzzyPredicate;
use crate::search::resolver::RelatedEntities;

pub use memory::MemoryCatalog;
pub use sqlite::SqliteCatalog;

/// Works referencing any of the given entities / 引用过滤
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceFilter {
    pub producers: Vec<RecordId>,
    pub persons: Vec<RecordId>,
    pub characters: Vec<RecordId>,
    pub tags: Vec<RecordId>,
    /// Ids excluded from the result (already direct hits) / 排除的ID
    pub exclude: Vec<RecordId>,
}

impl ReferenceFilter {
    pub fn from_related(related: &RelatedEntities, exclude: Vec<RecordId>) -> Self {
        Self {
            producers: related.ids(EntityKind::Producer),
            persons: related.ids(EntityKind::Person),
            characters: related.ids(EntityKind::Character),
            tags: related.ids(EntityKind::Tag),
            exclude,
        }
    }

    pub fn ids(&self, kind: EntityKind) -> &[RecordId] {
        match kind {
            EntityKind::Producer => &self.producers,
            EntityKind::Person => &self.persons,
            EntityKind::Character => &self.characters,
            EntityKind::Tag => &self.tags,
        }
    }

    pub fn is_empty(&self) -> bool {
        EntityKind::ALL.iter().all(|kind| self.ids(*kind).is_empty())
    }
}

/// Work query / 作品查询
#[derive(Debug, Clone)]
pub enum WorkQuery {
    /// Own fields match the predicate / 自身字段匹配
    Matching(FuzzyPredicate),
    /// References one of the given entities / 引用了指定实体
    Referencing(ReferenceFilter),
}

/// Read-only catalog access / 只读目录访问
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Works of one kind with references resolved, in id order / 查询作品
    async fn find_works(&self, kind: WorkKind, query: &WorkQuery) -> Result<Vec<Work>, StoreError>;

    /// Entities of one kind matching the predicate, in id order / 查询实体
    async fn find_entities(
        &self,
        kind: EntityKind,
        predicate: &FuzzyPredicate,
        limit: Option<usize>,
    ) -> Result<Vec<EntityRecord>, StoreError>;
}

#[async_trait]
impl<T: CatalogStore + ?Sized> CatalogStore for Box<T> {
    async fn find_works(&self, kind: WorkKind, query: &WorkQuery) -> Result<Vec<Work>, StoreError> {
        (**self).find_works(kind, query).await
    }

    async fn find_entities(
        &self,
        kind: EntityKind,
        predicate: &FuzzyPredicate,
        limit: Option<usize>,
    ) -> Result<Vec<EntityRecord>, StoreError> {
        (**self).find_entities(kind, predicate, limit).await
    }
}
