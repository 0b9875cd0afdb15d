//! SQLite catalog store / SQLite 目录存储
//!
//! Storage layout:
//! - `entities`: producers / persons / characters / tags, keyed by (kind, id)
//! - `games`, `novels`: works; multi-valued names live in JSON array columns
//! - `work_refs`: work → entity references with display order
//!
//! Features:
//! - WAL mode + busy_timeout, same as the search index databases
//! - every searchable column has a `*_lc` shadow folded with `str::to_lowercase` at
//!   write time; substring predicates run `instr` against the shadow, equality
//!   against the original
//! - id lists travel as one JSON array bind read through `json_each`, so their
//!   size never hits the bind-variable limit
//! - references resolved by joining `work_refs` to `entities` (dangling ids drop out)

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};

use super::{CatalogStore, ReferenceFilter, WorkQuery};
use crate::error::StoreError;
use crate::models::{
    EntityKind, EntityRecord, EntityRef, GameRecord, NovelRecord, RecordId, Work, WorkKind,
};
use crate::search::predicate::{FieldRole, FuzzyPredicate, MatchMode};

/// A searchable column / 可搜索列
#[derive(Debug, Clone, Copy)]
struct Column {
    name: &'static str,
    /// Lowercased shadow of `name` / 小写影子列
    folded: &'static str,
    role: FieldRole,
    /// JSON array of strings / JSON 数组列
    array: bool,
}

const fn column(name: &'static str, folded: &'static str, role: FieldRole, array: bool) -> Column {
    Column {
        name,
        folded,
        role,
        array,
    }
}

const ENTITY_COLUMNS: &[Column] = &[
    column("name", "name_lc", FieldRole::Name, false),
    column("name_cn", "name_cn_lc", FieldRole::Translated, false),
    column("aliases", "aliases_lc", FieldRole::Alias, true),
];

const GAME_COLUMNS: &[Column] = &[
    column("names", "names_lc", FieldRole::Name, true),
    column("name_cn", "name_cn_lc", FieldRole::Translated, false),
    column("aliases", "aliases_lc", FieldRole::Alias, true),
];

const NOVEL_COLUMNS: &[Column] = &[
    column("name", "name_lc", FieldRole::Name, false),
    column("name_cn", "name_cn_lc", FieldRole::Translated, false),
    column("aliases", "aliases_lc", FieldRole::Alias, true),
];

fn work_table(kind: WorkKind) -> (&'static str, &'static [Column]) {
    match kind {
        WorkKind::Game => ("games", GAME_COLUMNS),
        WorkKind::Novel => ("novels", NOVEL_COLUMNS),
    }
}

/// Append `(clause OR clause ...)` for the predicate / 追加匹配条件
fn push_predicate(qb: &mut QueryBuilder<'_, Sqlite>, columns: &[Column], predicate: &FuzzyPredicate) {
    let columns: Vec<&Column> = columns.iter().filter(|c| predicate.covers(c.role)).collect();
    let mut first = true;
    qb.push("(");

    match predicate.mode() {
        MatchMode::Exact(value) => {
            for col in &columns {
                if !first {
                    qb.push(" OR ");
                }
                first = false;
                if col.array {
                    qb.push(format!(
                        "EXISTS (SELECT 1 FROM json_each(t.{}) j WHERE j.value = ",
                        col.name
                    ));
                    qb.push_bind(value.clone());
                    qb.push(")");
                } else {
                    qb.push(format!("t.{} = ", col.name));
                    qb.push_bind(value.clone());
                }
            }
        }
        MatchMode::Contains(patterns) => {
            for pattern in patterns {
                for col in &columns {
                    if !first {
                        qb.push(" OR ");
                    }
                    first = false;
                    if col.array {
                        qb.push(format!(
                            "EXISTS (SELECT 1 FROM json_each(t.{}) j WHERE instr(j.value, ",
                            col.folded
                        ));
                        qb.push_bind(pattern.needle().to_string());
                        qb.push(") > 0)");
                    } else {
                        qb.push(format!("instr(t.{}, ", col.folded));
                        qb.push_bind(pattern.needle().to_string());
                        qb.push(") > 0");
                    }
                }
            }
        }
    }

    if first {
        qb.push("0");
    }
    qb.push(")");
}

/// Append the reference filter / 追加引用过滤条件
fn push_reference_filter(qb: &mut QueryBuilder<'_, Sqlite>, kind: WorkKind, filter: &ReferenceFilter) {
    if filter.is_empty() {
        qb.push("0");
        return;
    }

    qb.push("t.id IN (SELECT r.work_id FROM work_refs r WHERE r.work_kind = ");
    qb.push_bind(kind.as_str());
    qb.push(" AND (");
    let mut first = true;
    for entity_kind in EntityKind::ALL {
        let ids = filter.ids(entity_kind);
        if ids.is_empty() {
            continue;
        }
        if !first {
            qb.push(" OR ");
        }
        first = false;
        qb.push("(r.ref_kind = ");
        qb.push_bind(entity_kind.as_str());
        qb.push(" AND r.ref_id IN (SELECT value FROM json_each(");
        qb.push_bind(encode_ids(ids));
        qb.push(")))");
    }
    qb.push("))");

    if !filter.exclude.is_empty() {
        qb.push(" AND t.id NOT IN (SELECT value FROM json_each(");
        qb.push_bind(encode_ids(&filter.exclude));
        qb.push("))");
    }
}

fn decode_list(row: &SqliteRow, id: RecordId, column: &'static str) -> Result<Vec<String>, StoreError> {
    let raw: Option<String> = row.try_get(column)?;
    match raw {
        Some(text) if !text.is_empty() => serde_json::from_str(&text)
            .map_err(|source| StoreError::Decode { id, column, source }),
        _ => Ok(Vec::new()),
    }
}

fn encode_list(values: &[String]) -> String {
    serde_json::Value::from(values.to_vec()).to_string()
}

/// JSON array of lowercased values / 小写 JSON 数组
fn encode_folded_list(values: &[String]) -> String {
    let folded: Vec<String> = values.iter().map(|v| v.to_lowercase()).collect();
    serde_json::Value::from(folded).to_string()
}

fn fold(value: Option<&str>) -> Option<String> {
    value.map(|v| v.to_lowercase())
}

fn encode_ids(ids: &[RecordId]) -> String {
    serde_json::Value::from(ids.to_vec()).to_string()
}

/// Resolved references of one work, per entity kind / 单个作品的引用
type RefMap = HashMap<(RecordId, EntityKind), Vec<EntityRef>>;

/// SQLite-backed catalog / SQLite 目录
#[derive(Clone)]
pub struct SqliteCatalog {
    db: Pool<Sqlite>,
}

impl SqliteCatalog {
    /// Open the catalog database (WAL mode) / 打开目录数据库
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let db = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(database_url)
            .await?;

        // 启用WAL模式，提高并发读性能
        sqlx::query("PRAGMA journal_mode=WAL").execute(&db).await?;
        // 设置busy_timeout，避免锁超时
        sqlx::query("PRAGMA busy_timeout=5000").execute(&db).await?;

        tracing::info!("Catalog database opened: {} (WAL mode)", database_url);
        Ok(Self { db })
    }

    /// Use an existing pool / 使用现有连接池
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    pub async fn close(&self) {
        self.db.close().await;
    }

    /// Create tables if missing, keeps existing data / 初始化表结构
    pub async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                kind TEXT NOT NULL,
                id INTEGER NOT NULL,
                name TEXT NOT NULL,
                name_cn TEXT,
                aliases TEXT NOT NULL DEFAULT '[]',
                image TEXT,
                name_lc TEXT NOT NULL,
                name_cn_lc TEXT,
                aliases_lc TEXT NOT NULL DEFAULT '[]',
                PRIMARY KEY(kind, id)
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY,
                names TEXT NOT NULL DEFAULT '[]',
                name_cn TEXT,
                aliases TEXT NOT NULL DEFAULT '[]',
                image TEXT,
                names_lc TEXT NOT NULL DEFAULT '[]',
                name_cn_lc TEXT,
                aliases_lc TEXT NOT NULL DEFAULT '[]'
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS novels (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                name_cn TEXT,
                aliases TEXT NOT NULL DEFAULT '[]',
                image TEXT,
                name_lc TEXT NOT NULL,
                name_cn_lc TEXT,
                aliases_lc TEXT NOT NULL DEFAULT '[]'
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS work_refs (
                work_kind TEXT NOT NULL,
                work_id INTEGER NOT NULL,
                ref_kind TEXT NOT NULL,
                ref_id INTEGER NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY(work_kind, work_id, ref_kind, ref_id)
            ) WITHOUT ROWID
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_work_refs_ref ON work_refs(ref_kind, ref_id)")
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Insert or replace an entity / 写入实体
    pub async fn insert_entity(&self, record: &EntityRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT OR REPLACE INTO entities (kind, id, name, name_cn, aliases, image, name_lc, name_cn_lc, aliases_lc) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.kind.as_str())
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.name_cn)
        .bind(encode_list(&record.aliases))
        .bind(&record.image)
        .bind(record.name.to_lowercase())
        .bind(fold(record.name_cn.as_deref()))
        .bind(encode_folded_list(&record.aliases))
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Insert or replace a game with its references / 写入游戏
    pub async fn insert_game(&self, game: &GameRecord) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            "INSERT OR REPLACE INTO games (id, names, name_cn, aliases, image, names_lc, name_cn_lc, aliases_lc) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(game.id)
        .bind(encode_list(&game.names))
        .bind(&game.name_cn)
        .bind(encode_list(&game.aliases))
        .bind(&game.image)
        .bind(encode_folded_list(&game.names))
        .bind(fold(game.name_cn.as_deref()))
        .bind(encode_folded_list(&game.aliases))
        .execute(&mut *tx)
        .await?;

        let refs = [
            (EntityKind::Producer, &game.producers),
            (EntityKind::Person, &game.staff),
            (EntityKind::Character, &game.characters),
            (EntityKind::Tag, &game.tags),
        ];
        Self::replace_refs(&mut tx, WorkKind::Game, game.id, &refs).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Insert or replace a novel with its references / 写入小说
    pub async fn insert_novel(&self, novel: &NovelRecord) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            "INSERT OR REPLACE INTO novels (id, name, name_cn, aliases, image, name_lc, name_cn_lc, aliases_lc) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(novel.id)
        .bind(&novel.name)
        .bind(&novel.name_cn)
        .bind(encode_list(&novel.alternate_names))
        .bind(&novel.cover)
        .bind(novel.name.to_lowercase())
        .bind(fold(novel.name_cn.as_deref()))
        .bind(encode_folded_list(&novel.alternate_names))
        .execute(&mut *tx)
        .await?;

        let refs = [
            (EntityKind::Producer, &novel.publishers),
            (EntityKind::Person, &novel.authors),
            (EntityKind::Character, &novel.characters),
            (EntityKind::Tag, &novel.tags),
        ];
        Self::replace_refs(&mut tx, WorkKind::Novel, novel.id, &refs).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn replace_refs(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        kind: WorkKind,
        work_id: RecordId,
        refs: &[(EntityKind, &Vec<EntityRef>)],
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM work_refs WHERE work_kind = ? AND work_id = ?")
            .bind(kind.as_str())
            .bind(work_id)
            .execute(&mut **tx)
            .await?;

        for (ref_kind, entries) in refs {
            for (position, entry) in entries.iter().enumerate() {
                sqlx::query(
                    "INSERT OR REPLACE INTO work_refs (work_kind, work_id, ref_kind, ref_id, position) VALUES (?, ?, ?, ?, ?)",
                )
                .bind(kind.as_str())
                .bind(work_id)
                .bind(ref_kind.as_str())
                .bind(entry.id)
                .bind(position as i64)
                .execute(&mut **tx)
                .await?;
            }
        }
        Ok(())
    }

    /// Load resolved references for a set of works / 批量加载引用
    async fn load_refs(&self, kind: WorkKind, work_ids: &[RecordId]) -> Result<RefMap, StoreError> {
        let mut refs = RefMap::new();
        if work_ids.is_empty() {
            return Ok(refs);
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT r.work_id, r.ref_kind, e.id, e.name, e.aliases, e.image \
             FROM work_refs r JOIN entities e ON e.kind = r.ref_kind AND e.id = r.ref_id \
             WHERE r.work_kind = ",
        );
        qb.push_bind(kind.as_str());
        qb.push(" AND r.work_id IN (SELECT value FROM json_each(");
        qb.push_bind(encode_ids(work_ids));
        qb.push(")) ORDER BY r.work_id, r.ref_kind, r.position");

        let rows = qb.build().fetch_all(&self.db).await?;
        for row in &rows {
            let work_id: RecordId = row.try_get("work_id")?;
            let ref_kind: String = row.try_get("ref_kind")?;
            let Some(ref_kind) = parse_entity_kind(&ref_kind) else {
                continue;
            };
            let id: RecordId = row.try_get("id")?;
            let entry = EntityRef {
                id,
                name: row.try_get("name")?,
                aliases: decode_list(row, id, "aliases")?,
                image: row.try_get("image")?,
            };
            refs.entry((work_id, ref_kind)).or_default().push(entry);
        }
        Ok(refs)
    }
}

fn parse_entity_kind(value: &str) -> Option<EntityKind> {
    EntityKind::ALL.into_iter().find(|kind| kind.as_str() == value)
}

fn take_refs(refs: &mut RefMap, work_id: RecordId, kind: EntityKind) -> Vec<EntityRef> {
    refs.remove(&(work_id, kind)).unwrap_or_default()
}

fn decode_work(kind: WorkKind, row: &SqliteRow, refs: &mut RefMap) -> Result<Work, StoreError> {
    let id: RecordId = row.try_get("id")?;
    let work = match kind {
        WorkKind::Game => Work::Game(GameRecord {
            id,
            names: decode_list(row, id, "names")?,
            name_cn: row.try_get("name_cn")?,
            aliases: decode_list(row, id, "aliases")?,
            image: row.try_get("image")?,
            producers: take_refs(refs, id, EntityKind::Producer),
            staff: take_refs(refs, id, EntityKind::Person),
            characters: take_refs(refs, id, EntityKind::Character),
            tags: take_refs(refs, id, EntityKind::Tag),
        }),
        WorkKind::Novel => Work::Novel(NovelRecord {
            id,
            name: row.try_get("name")?,
            name_cn: row.try_get("name_cn")?,
            alternate_names: decode_list(row, id, "aliases")?,
            cover: row.try_get("image")?,
            publishers: take_refs(refs, id, EntityKind::Producer),
            authors: take_refs(refs, id, EntityKind::Person),
            characters: take_refs(refs, id, EntityKind::Character),
            tags: take_refs(refs, id, EntityKind::Tag),
        }),
    };
    Ok(work)
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn find_works(&self, kind: WorkKind, query: &WorkQuery) -> Result<Vec<Work>, StoreError> {
        let (table, columns) = work_table(kind);
        let select = match kind {
            WorkKind::Game => "SELECT t.id, t.names, t.name_cn, t.aliases, t.image FROM games t WHERE ",
            WorkKind::Novel => "SELECT t.id, t.name, t.name_cn, t.aliases, t.image FROM novels t WHERE ",
        };

        let mut qb = QueryBuilder::<Sqlite>::new(select);
        match query {
            WorkQuery::Matching(predicate) => push_predicate(&mut qb, columns, predicate),
            WorkQuery::Referencing(filter) => push_reference_filter(&mut qb, kind, filter),
        }
        qb.push(" ORDER BY t.id");

        let rows = qb.build().fetch_all(&self.db).await?;
        let ids = rows
            .iter()
            .map(|row| row.try_get::<RecordId, _>("id"))
            .collect::<Result<Vec<_>, _>>()?;
        let mut refs = self.load_refs(kind, &ids).await?;

        tracing::debug!("Catalog {} query returned {} rows", table, rows.len());
        rows.iter().map(|row| decode_work(kind, row, &mut refs)).collect()
    }

    async fn find_entities(
        &self,
        kind: EntityKind,
        predicate: &FuzzyPredicate,
        limit: Option<usize>,
    ) -> Result<Vec<EntityRecord>, StoreError> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT t.id, t.name, t.name_cn, t.aliases, t.image FROM entities t WHERE t.kind = ",
        );
        qb.push_bind(kind.as_str());
        qb.push(" AND ");
        push_predicate(&mut qb, ENTITY_COLUMNS, predicate);
        qb.push(" ORDER BY t.id");
        if let Some(limit) = limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit as i64);
        }

        let rows = qb.build().fetch_all(&self.db).await?;
        rows.iter()
            .map(|row| {
                let id: RecordId = row.try_get("id")?;
                Ok(EntityRecord {
                    id,
                    kind,
                    name: row.try_get("name")?,
                    name_cn: row.try_get("name_cn")?,
                    aliases: decode_list(row, id, "aliases")?,
                    image: row.try_get("image")?,
                })
            })
            .collect()
    }
}
