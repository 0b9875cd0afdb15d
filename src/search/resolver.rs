//! Related-entity resolver / 关联实体解析
//!
//! Fans out one capped fuzzy lookup per entity kind, concurrently.

use serde::{Deserialize, Serialize};

use super::predicate::FuzzyPredicate;
use crate::catalog::CatalogStore;
use crate::error::StoreError;
use crate::models::{EntityCandidate, EntityKind, RecordId};

/// Default cap per entity kind / 每类实体上限
pub const ENTITY_CAP: usize = 10;

/// Entity candidates grouped by kind / 按类型分组的关联实体
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedEntities {
    pub producers: Vec<EntityCandidate>,
    pub persons: Vec<EntityCandidate>,
    pub characters: Vec<EntityCandidate>,
    pub tags: Vec<EntityCandidate>,
}

impl RelatedEntities {
    pub fn of(&self, kind: EntityKind) -> &[EntityCandidate] {
        match kind {
            EntityKind::Producer => &self.producers,
            EntityKind::Person => &self.persons,
            EntityKind::Character => &self.characters,
            EntityKind::Tag => &self.tags,
        }
    }

    pub fn ids(&self, kind: EntityKind) -> Vec<RecordId> {
        self.of(kind).iter().map(|c| c.id).collect()
    }

    pub fn contains(&self, kind: EntityKind, id: RecordId) -> bool {
        self.of(kind).iter().any(|c| c.id == id)
    }

    pub fn is_empty(&self) -> bool {
        EntityKind::ALL.iter().all(|kind| self.of(*kind).is_empty())
    }

    pub fn len(&self) -> usize {
        EntityKind::ALL.iter().map(|kind| self.of(*kind).len()).sum()
    }
}

/// Resolve entities matching the keyword / 解析与关键词匹配的实体
///
/// Always returns all four lists; any of them may be empty. Store errors
/// propagate as-is.
pub async fn resolve_related<S>(
    store: &S,
    keyword: &str,
    tokens: &[String],
    cap: usize,
) -> Result<RelatedEntities, StoreError>
where
    S: CatalogStore + ?Sized,
{
    let lookup = |kind: EntityKind| {
        let predicate = FuzzyPredicate::build(keyword, tokens, kind.has_translated_name());
        async move {
            let records = store.find_entities(kind, &predicate, Some(cap)).await?;
            Ok::<Vec<EntityCandidate>, StoreError>(
                records.into_iter().take(cap).map(EntityCandidate::from).collect(),
            )
        }
    };

    let (producers, persons, characters, tags) = tokio::try_join!(
        lookup(EntityKind::Producer),
        lookup(EntityKind::Person),
        lookup(EntityKind::Character),
        lookup(EntityKind::Tag),
    )?;

    let related = RelatedEntities {
        producers,
        persons,
        characters,
        tags,
    };
    tracing::debug!(
        "Related entities for {:?}: producers={} persons={} characters={} tags={}",
        keyword,
        related.producers.len(),
        related.persons.len(),
        related.characters.len(),
        related.tags.len()
    );
    Ok(related)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::models::EntityRecord;
    use crate::search::tokenizer::tokenize;

    #[tokio::test]
    async fn test_resolve_caps_each_kind() {
        let mut store = MemoryCatalog::new();
        for id in 1..=15 {
            store.add_entity(EntityRecord::new(EntityKind::Tag, id, format!("magic {}", id)));
        }
        store.add_entity(EntityRecord::new(EntityKind::Producer, 1, "Magic Soft"));

        let related = resolve_related(&store, "magic", &tokenize("magic"), ENTITY_CAP)
            .await
            .unwrap();
        assert_eq!(related.tags.len(), ENTITY_CAP);
        assert_eq!(related.tags[0].id, 1);
        assert_eq!(related.producers.len(), 1);
        assert!(related.persons.is_empty());
        assert!(related.characters.is_empty());
        assert_eq!(related.len(), 11);
    }

    #[tokio::test]
    async fn test_resolve_uses_translated_name_for_persons_only() {
        let mut store = MemoryCatalog::new();
        store.add_entity(EntityRecord::new(EntityKind::Person, 1, "Kinoko Nasu").with_name_cn("奈须蘑菇"));
        store.add_entity(EntityRecord::new(EntityKind::Producer, 2, "TYPE-MOON").with_name_cn("奈须工作室"));

        let related = resolve_related(&store, "奈须", &tokenize("奈须"), ENTITY_CAP)
            .await
            .unwrap();
        assert_eq!(related.ids(EntityKind::Person), vec![1]);
        assert!(related.producers.is_empty());
        assert!(related.contains(EntityKind::Person, 1));
    }

    #[tokio::test]
    async fn test_resolve_empty() {
        let store = MemoryCatalog::new();
        let related = resolve_related(&store, "nothing", &[], ENTITY_CAP).await.unwrap();
        assert!(related.is_empty());
    }
}
