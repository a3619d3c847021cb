//! Storage traits.
//!
//! Implemented by storage backends (e.g. `shiftover-store-sqlite`). Higher
//! layers depend on these abstractions, not on a concrete backend.

use std::{collections::HashSet, future::Future};

use uuid::Uuid;

use crate::{StoreError, document::Document};

/// Per-key document storage with locked read-modify-write.
pub trait ScheduleStore: Send + Sync {
  type Error: StoreError;

  /// Read the last committed document for `key` without taking the write
  /// lock. A missing row is the empty document.
  fn load(&self, key: Uuid) -> impl Future<Output = Result<Document, Self::Error>> + Send + '_;

  /// Run `mutate` over the document for `key` under the write lock, in a
  /// transaction opened and committed by the store. See
  /// [`apply`](crate::apply::apply) for the protocol.
  fn apply<F>(
    &self,
    key: Uuid,
    mutate: F,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_
  where
    F: FnOnce(Document) -> crate::Result<Document> + Send + 'static;
}

/// Batch lookup of which users still exist.
pub trait UserDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The subset of `ids` that exist.
  fn existing_users(
    &self,
    ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<HashSet<Uuid>, Self::Error>> + Send + '_;
}
