//! In-memory entity store implementing `Backend`
//!
//! Holds entities grouped by collection, with precomputed full-text, tag and
//! link indices. Useful for tests, demos and small embedded datasets.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::entity::Backend;
use crate::query::Hit;
use crate::resolver::{ResolveError, ResolveResult};

/// Tag value: a single string or a list of strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    One(String),
    Many(Vec<String>),
}

impl TagValue {
    pub fn values(&self) -> &[String] {
        match self {
            TagValue::One(value) => std::slice::from_ref(value),
            TagValue::Many(values) => values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub collection: String,
    #[serde(default)]
    pub text: String,
    /// Sub-path (e.g. `/title`) to value
    #[serde(default)]
    pub tags: BTreeMap<String, TagValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "type")]
    pub collection: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub from: EntityRef,
    pub to: EntityRef,
}

/// Serialized form of a store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: HashSet<String>,
    /// word -> entity id -> occurrences
    words: HashMap<String, IndexMap<String, f64>>,
    /// (collection, sub-path, value) -> entity ids
    tags: HashMap<(String, String, String), Vec<String>>,
    /// (collection, id) -> ids on the other side
    links: HashMap<(String, String), Vec<String>>,
}

impl MemoryStore {
    pub fn new(data: StoreData) -> Self {
        let mut store = MemoryStore::default();
        for entity in &data.entities {
            store.index_entity(entity);
        }
        for link in &data.links {
            store.index_link(link);
        }
        log::debug!(
            "memory store: {} entities, {} links, {} collections",
            data.entities.len(),
            data.links.len(),
            store.collections.len()
        );
        store
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let data: StoreData = serde_json::from_str(json)?;
        Ok(Self::new(data))
    }

    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }

    fn index_entity(&mut self, entity: &Entity) {
        self.collections.insert(entity.collection.clone());
        for word in words(&entity.text) {
            *self
                .words
                .entry(word)
                .or_default()
                .entry(entity.id.clone())
                .or_insert(0.0) += 1.0;
        }
        for (path, value) in &entity.tags {
            for value in value.values() {
                self.tags
                    .entry((entity.collection.clone(), path.clone(), value.clone()))
                    .or_default()
                    .push(entity.id.clone());
            }
        }
    }

    fn index_link(&mut self, link: &Link) {
        let mut connect = |from: &EntityRef, to: &EntityRef| {
            self.links
                .entry((from.collection.clone(), from.id.clone()))
                .or_default()
                .push(to.id.clone());
        };
        connect(&link.from, &link.to);
        connect(&link.to, &link.from);
    }

    fn search_words(&self, term: &str) -> Vec<Hit<String>> {
        let terms: Vec<String> = words(term).collect();
        let Some((first, rest)) = terms.split_first() else {
            return Vec::new();
        };
        let Some(candidates) = self.words.get(first) else {
            return Vec::new();
        };
        candidates
            .iter()
            .filter_map(|(id, weight)| {
                let mut total = *weight;
                for word in rest {
                    total += self.words.get(word)?.get(id)?;
                }
                Some(Hit::new(id.clone(), total))
            })
            .collect()
    }
}

/// Lowercased alphanumeric words of `text`
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl Backend for MemoryStore {
    type Id = String;

    async fn tag_query(&self, collection: &str, path: &str, value: &str) -> ResolveResult<String> {
        if !self.collections.contains(collection) {
            return Err(ResolveError::UnknownCollection(collection.to_string()));
        }
        let key = (collection.to_string(), path.to_string(), value.to_string());
        Ok(self
            .tags
            .get(&key)
            .map(|ids| ids.iter().map(|id| Hit::new(id.clone(), 1.0)).collect())
            .unwrap_or_default())
    }

    async fn full_text(&self, term: &str) -> ResolveResult<String> {
        Ok(self.search_words(term))
    }

    async fn linked(&self, collection: &str, id: &str) -> Result<Vec<String>, ResolveError> {
        let key = (collection.to_string(), id.to_string());
        Ok(self.links.get(&key).cloned().unwrap_or_default())
    }
}

/// Incremental construction of a `MemoryStore`
#[derive(Debug, Default)]
pub struct StoreBuilder {
    data: StoreData,
}

impl StoreBuilder {
    pub fn entity(mut self, collection: &str, id: &str, text: &str) -> Self {
        self.data.entities.push(Entity {
            id: id.to_string(),
            collection: collection.to_string(),
            text: text.to_string(),
            tags: BTreeMap::new(),
        });
        self
    }

    /// Tag the most recently added entity
    pub fn tag(mut self, path: &str, value: &str) -> Self {
        if let Some(entity) = self.data.entities.last_mut() {
            let tag = entity
                .tags
                .entry(path.to_string())
                .or_insert_with(|| TagValue::Many(Vec::new()));
            match tag {
                TagValue::Many(values) => values.push(value.to_string()),
                TagValue::One(existing) => {
                    *tag = TagValue::Many(vec![existing.clone(), value.to_string()]);
                }
            }
        }
        self
    }

    pub fn link(mut self, from: (&str, &str), to: (&str, &str)) -> Self {
        let entity_ref = |(collection, id): (&str, &str)| EntityRef {
            collection: collection.to_string(),
            id: id.to_string(),
        };
        self.data.links.push(Link {
            from: entity_ref(from),
            to: entity_ref(to),
        });
        self
    }

    pub fn build(self) -> MemoryStore {
        MemoryStore::new(self.data)
    }
}
