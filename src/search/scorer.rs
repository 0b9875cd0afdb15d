//! Relevance scorer / 相关性打分
//!
//! Pure and synchronous. Works are normalized through [`Work::view`] so the
//! scorer never branches on record shape.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::resolver::RelatedEntities;
use super::schema::MatchType;
use super::tokenizer::is_significant;
use crate::models::{EntityKind, Work};

/// Weight table / 权重表
#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub title_exact: u32,
    pub title_contain: u32,
    pub producer: u32,
    pub person: u32,
    pub character: u32,
    pub tag: u32,
    pub token: u32,
    /// Added to every direct hit / 直接命中加分
    pub direct_bonus: u32,
}

pub const WEIGHTS: Weights = Weights {
    title_exact: 100,
    title_contain: 80,
    producer: 60,
    person: 60,
    character: 40,
    tag: 20,
    token: 10,
    direct_bonus: 100,
};

impl Weights {
    pub fn membership(&self, kind: EntityKind) -> u32 {
        match kind {
            EntityKind::Producer => self.producer,
            EntityKind::Person => self.person,
            EntityKind::Character => self.character,
            EntityKind::Tag => self.tag,
        }
    }

    pub fn bonus(&self, match_type: MatchType) -> u32 {
        match match_type {
            MatchType::Direct => self.direct_bonus,
            MatchType::Related => 0,
        }
    }
}

/// A contributing signal, kept for explainability / 命中信号
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", content = "value", rename_all = "snake_case")]
pub enum Signal {
    TitleExact,
    TitleContain,
    Producer,
    Person,
    Character,
    Tag,
    Token(String),
}

impl Signal {
    fn membership(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Producer => Signal::Producer,
            EntityKind::Person => Signal::Person,
            EntityKind::Character => Signal::Character,
            EntityKind::Tag => Signal::Tag,
        }
    }
}

/// Raw score before the direct bonus / 原始分
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Score {
    pub value: u32,
    pub signals: Vec<Signal>,
}

impl Score {
    fn add(&mut self, weight: u32, signal: Signal) {
        self.value += weight;
        self.signals.push(signal);
    }

    /// Final value for a given match type / 最终得分
    pub fn finalize(&self, match_type: MatchType) -> u32 {
        self.value + WEIGHTS.bonus(match_type)
    }
}

/// Score one work / 对作品打分
pub fn score_work(work: &Work, keyword: &str, tokens: &[String], related: &RelatedEntities) -> Score {
    let view = work.view();
    let needle = keyword.trim().to_lowercase();
    let titles: Vec<String> = view.title_fields.iter().map(|t| t.to_lowercase()).collect();
    let mut score = Score::default();

    if !needle.is_empty() {
        if titles.iter().any(|t| *t == needle) {
            score.add(WEIGHTS.title_exact, Signal::TitleExact);
        } else if titles.iter().any(|t| t.contains(&needle)) {
            score.add(WEIGHTS.title_contain, Signal::TitleContain);
        }
    }

    // dangling or unresolved references simply never match
    for kind in EntityKind::ALL {
        if view
            .entity_refs
            .of(kind)
            .iter()
            .any(|r| related.contains(kind, r.id))
        {
            score.add(WEIGHTS.membership(kind), Signal::membership(kind));
        }
    }

    let mut seen: HashSet<String> = HashSet::new();
    for token in tokens.iter().filter(|t| is_significant(t)) {
        let lower = token.to_lowercase();
        if lower == needle || !seen.insert(lower.clone()) {
            continue;
        }
        if titles.iter().any(|t| t.contains(&lower)) {
            score.add(WEIGHTS.token, Signal::Token(token.clone()));
        }
    }

    score
}
