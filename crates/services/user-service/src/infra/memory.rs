//! In-process implementation of [`DocumentStore`].
//!
//! Mirrors the server's matching rules for the subset of queries the
//! compiler produces: equality against an array field matches any element,
//! numbers compare across integer widths, and `$gte`/`$lte` only match
//! values of the same type.

use std::cmp::Ordering;

use async_trait::async_trait;
use bson::{Bson, Document};
use futures::stream::{self, StreamExt};
use tokio::sync::RwLock;

use common::{Clause, Comparison, FindOptions, Predicate, Projection, StoreError, StoreResult};
use domain::FIELD_ID;

use super::store::{DocumentCursor, DocumentStore};

/// Document store holding everything in memory, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, document: Document) -> StoreResult<()> {
        let id = document
            .get(FIELD_ID)
            .cloned()
            .ok_or_else(|| StoreError::backend("document has no _id"))?;

        let mut documents = self.documents.write().await;
        if documents.iter().any(|d| d.get(FIELD_ID) == Some(&id)) {
            let id = match id.as_str() {
                Some(id) => id.to_string(),
                None => id.to_string(),
            };
            return Err(StoreError::DuplicateKey(id));
        }
        documents.push(document);
        Ok(())
    }

    async fn delete_one(&self, predicate: &Predicate) -> StoreResult<u64> {
        let mut documents = self.documents.write().await;
        match documents.iter().position(|d| matches(d, predicate)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn update_one(&self, predicate: &Predicate, fields: Document) -> StoreResult<u64> {
        let mut documents = self.documents.write().await;
        match documents.iter_mut().find(|d| matches(d, predicate)) {
            Some(document) => {
                for (key, value) in fields {
                    document.insert(key, value);
                }
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn find_one(
        &self,
        predicate: &Predicate,
        projection: &Projection,
    ) -> StoreResult<Option<Document>> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .find(|d| matches(d, predicate))
            .map(|d| project(d, projection)))
    }

    async fn find(
        &self,
        predicate: &Predicate,
        options: &FindOptions,
    ) -> StoreResult<DocumentCursor> {
        let documents = self.documents.read().await;
        let mut selected: Vec<&Document> =
            documents.iter().filter(|d| matches(d, predicate)).collect();

        if let Some(sort) = &options.sort {
            // Stable, so ties keep insertion order
            selected.sort_by(|a, b| {
                let ordering = compare_field(a.get(&sort.field), b.get(&sort.field));
                if sort.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = match options.limit {
            0 => usize::MAX,
            n => usize::try_from(n).unwrap_or(usize::MAX),
        };

        let page: Vec<StoreResult<Document>> = selected
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|d| Ok(project(d, &options.projection)))
            .collect();
        Ok(stream::iter(page).boxed())
    }

    async fn count(&self, predicate: &Predicate) -> StoreResult<u64> {
        let documents = self.documents.read().await;
        Ok(documents.iter().filter(|d| matches(d, predicate)).count() as u64)
    }
}

fn matches(document: &Document, predicate: &Predicate) -> bool {
    predicate
        .clauses()
        .iter()
        .all(|clause| clause_matches(document, clause))
}

fn clause_matches(document: &Document, clause: &Clause) -> bool {
    let Some(value) = document.get(&clause.field) else {
        return false;
    };
    match value {
        Bson::Array(items) => {
            items.iter().any(|item| satisfies(item, clause)) || satisfies(value, clause)
        }
        _ => satisfies(value, clause),
    }
}

fn satisfies(actual: &Bson, clause: &Clause) -> bool {
    match clause.comparison {
        Comparison::Eq => {
            actual == &clause.value || order(actual, &clause.value) == Some(Ordering::Equal)
        }
        Comparison::Gte => matches!(
            order(actual, &clause.value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Comparison::Lte => matches!(
            order(actual, &clause.value),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

/// Order two values of comparable types; `None` when the types differ.
fn order(a: &Bson, b: &Bson) -> Option<Ordering> {
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        _ => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Sort order for possibly-missing fields; missing sorts first.
fn compare_field(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => order(x, y).unwrap_or(Ordering::Equal),
    }
}

fn project(document: &Document, projection: &Projection) -> Document {
    let mut shaped = document.clone();
    for field in projection.excluded() {
        shaped.remove(field);
    }
    shaped
}
