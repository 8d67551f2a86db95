//! Transaction helper that keeps the caller's error type intact.
//!
//! The closure's writes are committed when it returns `Ok` and rolled back when it returns
//! `Err`. Failures of the transaction machinery itself (begin/commit) surface as
//! [`ServiceError::TransactionAborted`].

use crate::errors::ServiceError;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionError, TransactionTrait};
use std::future::Future;
use std::pin::Pin;
use tracing::warn;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Runs `f` inside a single transaction.
///
/// ```rust,ignore
/// let order = with_transaction(&db, |txn| {
///     Box::pin(async move {
///         let order = order.insert(txn).await?;
///         decrement_stock(txn, item_id, 2).await?;
///         Ok(order)
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<F, T>(db: &DatabaseConnection, f: F) -> Result<T, ServiceError>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, ServiceError>> + Send,
    T: Send,
{
    db.transaction::<_, T, ServiceError>(f)
        .await
        .map_err(|err| match err {
            TransactionError::Connection(db_err) => {
                warn!(error = %db_err, "transaction aborted by the store");
                ServiceError::TransactionAborted(db_err.to_string())
            }
            TransactionError::Transaction(service_err) => service_err,
        })
}
