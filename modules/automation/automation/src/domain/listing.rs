//! Per-record authorization filter over a storage cursor.
//!
//! Records are judged one at a time in query order. Refused records are
//! dropped silently. Any storage or oracle failure aborts the whole listing;
//! partial results are never returned. The cursor is closed on every path.

use authz_oracle_sdk::{AuthorizationOracle, Protected};
use conductor_security::SecurityContext;

use super::error::DomainError;
use super::repo::{Collection, Cursor, Document, ListQuery};

/// Run `query` and keep the records the subject may read.
///
/// # Errors
/// Returns [`DomainError::Storage`] on a query, iteration or close failure
/// and [`DomainError::Authorization`] when the oracle cannot decide.
pub async fn stream<T>(
    ctx: &SecurityContext,
    oracle: &dyn AuthorizationOracle,
    collection: &dyn Collection<T>,
    query: &ListQuery,
) -> Result<Vec<T>, DomainError>
where
    T: Document + Protected,
{
    let mut cursor = collection.find(query).await?;
    let outcome = approve_all(ctx, oracle, &mut cursor).await;
    let closed = cursor.close().await;

    match (outcome, closed) {
        (Ok(records), Ok(())) => Ok(records),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                tracing::warn!(
                    collection = T::COLLECTION,
                    error = %close_err,
                    "cursor close failed after aborted listing"
                );
            }
            Err(e)
        }
    }
}

async fn approve_all<T>(
    ctx: &SecurityContext,
    oracle: &dyn AuthorizationOracle,
    cursor: &mut Box<dyn Cursor<T>>,
) -> Result<Vec<T>, DomainError>
where
    T: Document + Protected,
{
    let mut approved = Vec::new();
    let mut dropped = 0usize;
    while let Some(record) = cursor.next().await? {
        if oracle.can_read(ctx, &record).await? {
            approved.push(record);
        } else {
            dropped += 1;
        }
    }
    tracing::debug!(
        collection = T::COLLECTION,
        approved = approved.len(),
        dropped,
        "acl filter applied"
    );
    Ok(approved)
}

/// Keep the already-loaded records the subject may read, preserving order.
///
/// # Errors
/// Returns [`DomainError::Authorization`] when the oracle cannot decide.
pub async fn retain_readable<T>(
    ctx: &SecurityContext,
    oracle: &dyn AuthorizationOracle,
    records: Vec<T>,
) -> Result<Vec<T>, DomainError>
where
    T: Protected,
{
    let mut approved = Vec::with_capacity(records.len());
    for record in records {
        if oracle.can_read(ctx, &record).await? {
            approved.push(record);
        }
    }
    Ok(approved)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use authz_oracle_sdk::AuthZResolverError;
    use automation_sdk::models::Team;
    use chrono::Utc;
    use conductor_security::{AccessControlEntry, Role};
    use uuid::Uuid;

    use super::*;
    use crate::domain::repo::{Filter, StorageError};

    fn team(name: &str, reader: Option<Uuid>) -> Team {
        let now = Utc::now();
        Team {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            description: String::new(),
            organization_id: Uuid::new_v4(),
            created_by: Uuid::nil(),
            modified_by: Uuid::nil(),
            created: now,
            modified: now,
            roles: reader
                .map(|id| vec![AccessControlEntry::user(id, Role::Read)])
                .unwrap_or_default(),
        }
    }

    /// Grants read when the subject holds any ACE; fails after `fail_after` calls.
    struct AceOracle {
        calls: AtomicUsize,
        fail_after: Option<usize>,
    }

    impl AceOracle {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_after: None,
            }
        }
    }

    #[async_trait]
    impl AuthorizationOracle for AceOracle {
        async fn can_read(
            &self,
            ctx: &SecurityContext,
            resource: &dyn Protected,
        ) -> Result<bool, AuthZResolverError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_after.is_some_and(|limit| n >= limit) {
                return Err(AuthZResolverError::ServiceUnavailable("down".to_owned()));
            }
            Ok(resource
                .access_entries()
                .iter()
                .any(|e| ctx.holds(e.principal)))
        }

        async fn can_write(
            &self,
            _ctx: &SecurityContext,
            _resource: &dyn Protected,
        ) -> Result<bool, AuthZResolverError> {
            Ok(false)
        }
    }

    /// Yields `items`, then fails with a backend error if `fail_at_end`.
    struct ScriptedCursor {
        items: std::vec::IntoIter<Team>,
        fail_at_end: bool,
        closed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Cursor<Team> for ScriptedCursor {
        async fn next(&mut self) -> Result<Option<Team>, StorageError> {
            match self.items.next() {
                Some(t) => Ok(Some(t)),
                None if self.fail_at_end => Err(StorageError::backend("cursor died")),
                None => Ok(None),
            }
        }

        async fn close(self: Box<Self>) -> Result<(), StorageError> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct ScriptedCollection {
        items: Vec<Team>,
        fail_at_end: bool,
        closed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Collection<Team> for ScriptedCollection {
        async fn find(&self, _query: &ListQuery) -> Result<Box<dyn Cursor<Team>>, StorageError> {
            Ok(Box::new(ScriptedCursor {
                items: self.items.clone().into_iter(),
                fail_at_end: self.fail_at_end,
                closed: self.closed.clone(),
            }))
        }

        async fn get(&self, _id: Uuid) -> Result<Option<Team>, StorageError> {
            Ok(None)
        }

        async fn count(&self, _filter: &Filter) -> Result<usize, StorageError> {
            Ok(self.items.len())
        }

        async fn insert(&self, _doc: Team) -> Result<(), StorageError> {
            Ok(())
        }

        async fn replace(&self, _doc: Team) -> Result<(), StorageError> {
            Ok(())
        }

        async fn delete(&self, _id: Uuid) -> Result<bool, StorageError> {
            Ok(false)
        }

        async fn delete_many(&self, _filter: &Filter) -> Result<usize, StorageError> {
            Ok(0)
        }
    }

    fn collection(items: Vec<Team>, fail_at_end: bool) -> ScriptedCollection {
        ScriptedCollection {
            items,
            fail_at_end,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    #[tokio::test]
    async fn refused_records_are_dropped_in_query_order() {
        let me = Uuid::new_v4();
        let ctx = SecurityContext::builder().subject_id(me).build();
        let coll = collection(
            vec![
                team("a", Some(me)),
                team("hidden", None),
                team("b", Some(me)),
            ],
            false,
        );

        let out = stream(&ctx, &AceOracle::new(), &coll, &ListQuery::default())
            .await
            .unwrap();

        let names: Vec<_> = out.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert!(coll.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn storage_error_mid_stream_aborts_and_closes_cursor() {
        let me = Uuid::new_v4();
        let ctx = SecurityContext::builder().subject_id(me).build();
        let coll = collection(vec![team("a", Some(me))], true);

        let err = stream(&ctx, &AceOracle::new(), &coll, &ListQuery::default())
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Storage(_)));
        assert!(coll.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn oracle_error_aborts_and_closes_cursor() {
        let me = Uuid::new_v4();
        let ctx = SecurityContext::builder().subject_id(me).build();
        let coll = collection(vec![team("a", Some(me)), team("b", Some(me))], false);
        let oracle = AceOracle {
            calls: AtomicUsize::new(0),
            fail_after: Some(1),
        };

        let err = stream(&ctx, &oracle, &coll, &ListQuery::default())
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Authorization(_)));
        assert!(coll.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn retain_readable_filters_loaded_records() {
        let me = Uuid::new_v4();
        let ctx = SecurityContext::builder().subject_id(me).build();

        let out = retain_readable(
            &ctx,
            &AceOracle::new(),
            vec![team("mine", Some(me)), team("theirs", Some(Uuid::new_v4()))],
        )
        .await
        .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "mine");
    }
}
