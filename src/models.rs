use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::SearchError;

/// Catalog record identifier / 记录ID
pub type RecordId = i64;

/// Auxiliary entity kinds / 关联实体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Producer,
    Person,
    Character,
    Tag,
}

impl EntityKind {
    /// Resolution order used by the related-entity pass / 关联解析顺序
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Producer,
        EntityKind::Person,
        EntityKind::Character,
        EntityKind::Tag,
    ];

    /// Persons and characters carry a translated name, producers and tags do not / 是否有译名字段
    pub fn has_translated_name(self) -> bool {
        matches!(self, EntityKind::Person | EntityKind::Character)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Producer => "producer",
            EntityKind::Person => "person",
            EntityKind::Character => "character",
            EntityKind::Tag => "tag",
        }
    }
}

/// Work kinds that go through scoring and fusion / 作品类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkKind {
    Game,
    Novel,
}

impl WorkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkKind::Game => "game",
            WorkKind::Novel => "novel",
        }
    }
}

/// Search target selected by the caller / 搜索目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Game,
    Novel,
    Producer,
    Person,
    Character,
}

/// Where a search request is routed / 搜索路由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget {
    /// Scored and fused / 打分融合
    Work(WorkKind),
    /// Plain fuzzy lookup / 直接模糊查找
    Entity(EntityKind),
}

impl SearchKind {
    pub fn target(self) -> SearchTarget {
        match self {
            SearchKind::Game => SearchTarget::Work(WorkKind::Game),
            SearchKind::Novel => SearchTarget::Work(WorkKind::Novel),
            SearchKind::Producer => SearchTarget::Entity(EntityKind::Producer),
            SearchKind::Person => SearchTarget::Entity(EntityKind::Person),
            SearchKind::Character => SearchTarget::Entity(EntityKind::Character),
        }
    }
}

impl FromStr for SearchKind {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "game" | "games" => Ok(SearchKind::Game),
            "novel" | "novels" => Ok(SearchKind::Novel),
            "producer" | "producers" => Ok(SearchKind::Producer),
            "person" | "persons" => Ok(SearchKind::Person),
            "character" | "characters" => Ok(SearchKind::Character),
            other => Err(SearchError::Validation(format!("unknown search kind: {}", other))),
        }
    }
}

/// Reference resolved to display form / 已解析的引用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl EntityRef {
    pub fn new(id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            aliases: Vec::new(),
            image: None,
        }
    }
}

/// Producer / person / character / tag record / 实体记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: RecordId,
    pub kind: EntityKind,
    pub name: String,
    /// Translated name (persons and characters only) / 译名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_cn: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl EntityRecord {
    pub fn new(kind: EntityKind, id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            name_cn: None,
            aliases: Vec::new(),
            image: None,
        }
    }

    pub fn with_name_cn(mut self, name_cn: impl Into<String>) -> Self {
        self.name_cn = Some(name_cn.into());
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }
}

/// Read-only projection produced by the related-entity resolver / 关联实体候选
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCandidate {
    pub id: RecordId,
    pub display_name: String,
    pub aliases: Vec<String>,
    pub kind: EntityKind,
}

impl From<EntityRecord> for EntityCandidate {
    fn from(record: EntityRecord) -> Self {
        Self {
            id: record.id,
            display_name: record.name_cn.unwrap_or(record.name),
            aliases: record.aliases,
            kind: record.kind,
        }
    }
}

/// Game read model / 游戏
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: RecordId,
    /// Original titles (multi-valued) / 原名
    pub names: Vec<String>,
    /// Translated title / 译名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_cn: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub producers: Vec<EntityRef>,
    #[serde(default)]
    pub staff: Vec<EntityRef>,
    #[serde(default)]
    pub characters: Vec<EntityRef>,
    #[serde(default)]
    pub tags: Vec<EntityRef>,
}

impl GameRecord {
    pub fn new<I, S>(id: RecordId, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            names: names.into_iter().map(Into::into).collect(),
            name_cn: None,
            aliases: Vec::new(),
            image: None,
            producers: Vec::new(),
            staff: Vec::new(),
            characters: Vec::new(),
            tags: Vec::new(),
        }
    }
}

/// Novel read model / 小说
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NovelRecord {
    pub id: RecordId,
    pub name: String,
    /// Localized name / 本地化名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_cn: Option<String>,
    /// Alternate names / 别名
    #[serde(default)]
    pub alternate_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default)]
    pub publishers: Vec<EntityRef>,
    #[serde(default)]
    pub authors: Vec<EntityRef>,
    #[serde(default)]
    pub characters: Vec<EntityRef>,
    #[serde(default)]
    pub tags: Vec<EntityRef>,
}

impl NovelRecord {
    pub fn new(id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            name_cn: None,
            alternate_names: Vec::new(),
            cover: None,
            publishers: Vec::new(),
            authors: Vec::new(),
            characters: Vec::new(),
            tags: Vec::new(),
        }
    }
}

/// Catalog work, dispatched by kind / 作品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Work {
    Game(GameRecord),
    Novel(NovelRecord),
}

/// References of a work grouped by entity kind / 按类型分组的引用
#[derive(Debug, Clone, Copy)]
pub struct EntityRefs<'a> {
    pub producers: &'a [EntityRef],
    pub persons: &'a [EntityRef],
    pub characters: &'a [EntityRef],
    pub tags: &'a [EntityRef],
}

impl<'a> EntityRefs<'a> {
    pub fn of(&self, kind: EntityKind) -> &'a [EntityRef] {
        match kind {
            EntityKind::Producer => self.producers,
            EntityKind::Person => self.persons,
            EntityKind::Character => self.characters,
            EntityKind::Tag => self.tags,
        }
    }
}

/// Kind-independent shape the scorer works on / 打分视图
#[derive(Debug, Clone)]
pub struct WorkView<'a> {
    pub title_fields: Vec<&'a str>,
    pub entity_refs: EntityRefs<'a>,
}

/// Name-like fields a fuzzy predicate is evaluated against / 可匹配字段
#[derive(Debug, Clone, Default)]
pub struct FieldValues<'a> {
    pub names: Vec<&'a str>,
    pub translated: Option<&'a str>,
    pub aliases: Vec<&'a str>,
}

impl Work {
    pub fn id(&self) -> RecordId {
        match self {
            Work::Game(game) => game.id,
            Work::Novel(novel) => novel.id,
        }
    }

    pub fn kind(&self) -> WorkKind {
        match self {
            Work::Game(_) => WorkKind::Game,
            Work::Novel(_) => WorkKind::Novel,
        }
    }

    /// Normalize into title fields + entity references / 归一化为打分视图
    pub fn view(&self) -> WorkView<'_> {
        match self {
            Work::Game(game) => WorkView {
                title_fields: game
                    .names
                    .iter()
                    .map(String::as_str)
                    .chain(game.name_cn.as_deref())
                    .collect(),
                entity_refs: EntityRefs {
                    producers: &game.producers,
                    persons: &game.staff,
                    characters: &game.characters,
                    tags: &game.tags,
                },
            },
            Work::Novel(novel) => WorkView {
                title_fields: std::iter::once(novel.name.as_str())
                    .chain(novel.name_cn.as_deref())
                    .chain(novel.alternate_names.iter().map(String::as_str))
                    .collect(),
                entity_refs: EntityRefs {
                    producers: &novel.publishers,
                    persons: &novel.authors,
                    characters: &novel.characters,
                    tags: &novel.tags,
                },
            },
        }
    }

    pub fn field_values(&self) -> FieldValues<'_> {
        match self {
            Work::Game(game) => FieldValues {
                names: game.names.iter().map(String::as_str).collect(),
                translated: game.name_cn.as_deref(),
                aliases: game.aliases.iter().map(String::as_str).collect(),
            },
            Work::Novel(novel) => FieldValues {
                names: vec![novel.name.as_str()],
                translated: novel.name_cn.as_deref(),
                aliases: novel.alternate_names.iter().map(String::as_str).collect(),
            },
        }
    }
}

impl EntityRecord {
    pub fn field_values(&self) -> FieldValues<'_> {
        FieldValues {
            names: vec![self.name.as_str()],
            translated: self.name_cn.as_deref(),
            aliases: self.aliases.iter().map(String::as_str).collect(),
        }
    }
}
