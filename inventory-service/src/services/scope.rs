//! Row-level owner policy.
//!
//! Every owned document carries an `owner_id`. Handlers never build owner
//! filters themselves: they obtain a [`ScopedCollection`] from the acting
//! [`OwnerScope`], which adds the owner to every filter and refuses to write
//! documents that belong to someone else.

use crate::services::error::InventoryError;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{ClientSession, Collection};
use serde::{de::DeserializeOwned, Serialize};

pub const OWNER_FIELD: &str = "owner_id";

/// Implemented by every document type subject to the owner policy.
pub trait Owned {
    fn owner_id(&self) -> &str;
}

/// The acting identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerScope {
    owner_id: String,
}

impl OwnerScope {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Adds the owner constraint to `filter`, replacing any caller-supplied
    /// `owner_id`.
    pub fn filter(&self, mut filter: Document) -> Document {
        filter.insert(OWNER_FIELD, self.owner_id.clone());
        filter
    }

    pub fn by_id(&self, id: &str) -> Document {
        self.filter(doc! { "_id": id })
    }

    pub fn ensure_owns<T: Owned>(&self, item: &T) -> Result<(), InventoryError> {
        if item.owner_id() == self.owner_id {
            Ok(())
        } else {
            tracing::error!(
                owner_id = %self.owner_id,
                document_owner = %item.owner_id(),
                "Refusing to write a document owned by another user"
            );
            Err(InventoryError::OwnershipViolation)
        }
    }

    pub fn collection<T>(&self, inner: Collection<T>) -> ScopedCollection<'_, T> {
        ScopedCollection { inner, scope: self }
    }
}

/// Owner-restricted view of a collection.
pub struct ScopedCollection<'a, T> {
    inner: Collection<T>,
    scope: &'a OwnerScope,
}

impl<'a, T> ScopedCollection<'a, T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    pub async fn find(
        &self,
        filter: Document,
        options: impl Into<Option<FindOptions>>,
    ) -> Result<Vec<T>, InventoryError> {
        let cursor = self.inner.find(self.scope.filter(filter), options).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, InventoryError> {
        Ok(self.inner.find_one(self.scope.filter(filter), None).await?)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>, InventoryError> {
        Ok(self.inner.find_one(self.scope.by_id(id), None).await?)
    }

    pub async fn find_by_id_with_session(
        &self,
        id: &str,
        session: &mut ClientSession,
    ) -> Result<Option<T>, InventoryError> {
        Ok(self
            .inner
            .find_one_with_session(self.scope.by_id(id), None, session)
            .await?)
    }

    pub async fn exists(&self, filter: Document) -> Result<bool, InventoryError> {
        Ok(self.find_one(filter).await?.is_some())
    }

    pub async fn insert(&self, item: &T) -> Result<(), InventoryError>
    where
        T: Owned,
    {
        self.scope.ensure_owns(item)?;
        self.inner.insert_one(item, None).await?;
        Ok(())
    }

    pub async fn insert_with_session(
        &self,
        item: &T,
        session: &mut ClientSession,
    ) -> Result<(), InventoryError>
    where
        T: Owned,
    {
        self.scope.ensure_owns(item)?;
        self.inner
            .insert_one_with_session(item, None, session)
            .await?;
        Ok(())
    }

    /// Applies `update` to the owned document `id` and returns it as updated.
    pub async fn update_by_id(&self, id: &str, update: Document) -> Result<Option<T>, InventoryError> {
        Ok(self
            .inner
            .find_one_and_update(self.scope.by_id(id), update, return_after())
            .await?)
    }

    /// Like [`Self::update_by_id`] with an arbitrary filter, inside a session.
    pub async fn find_one_and_update_with_session(
        &self,
        filter: Document,
        update: Document,
        session: &mut ClientSession,
    ) -> Result<Option<T>, InventoryError> {
        Ok(self
            .inner
            .find_one_and_update_with_session(
                self.scope.filter(filter),
                update,
                return_after(),
                session,
            )
            .await?)
    }

    pub async fn update_many(&self, filter: Document, update: Document) -> Result<u64, InventoryError> {
        let result = self
            .inner
            .update_many(self.scope.filter(filter), update, None)
            .await?;
        Ok(result.modified_count)
    }

    /// Deletes the owned document `id`, returning it if it existed.
    pub async fn delete_by_id(&self, id: &str) -> Result<Option<T>, InventoryError> {
        Ok(self
            .inner
            .find_one_and_delete(self.scope.by_id(id), None)
            .await?)
    }

    pub async fn delete_by_id_with_session(
        &self,
        id: &str,
        session: &mut ClientSession,
    ) -> Result<bool, InventoryError> {
        let result = self
            .inner
            .delete_one_with_session(self.scope.by_id(id), None, session)
            .await?;
        Ok(result.deleted_count == 1)
    }

    /// Runs `pipeline` after an owner `$match` stage.
    pub async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, InventoryError> {
        let stages = std::iter::once(doc! { "$match": self.scope.filter(Document::new()) })
            .chain(pipeline);
        let cursor = self.inner.aggregate(stages, None).await?;
        Ok(cursor.try_collect().await?)
    }
}

fn return_after() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}
