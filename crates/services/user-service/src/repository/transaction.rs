//! Transaction helper shared by the repositories.
//!
//! The closure receives the open transaction; everything it does through
//! that handle is committed when it returns `Ok` and rolled back when it
//! returns `Err`.

use std::future::Future;
use std::pin::Pin;

use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend,
    IsolationLevel, TransactionTrait,
};

use common::AppResult;

/// Boxed future returned by a transactional closure.
pub type TxFuture<'a, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>;

/// Run `f` inside a database transaction.
///
/// Postgres runs at READ COMMITTED; SQLite transactions are always
/// serializable and reject explicit settings, so none are passed there.
pub async fn in_transaction<F, T>(db: &DatabaseConnection, f: F) -> AppResult<T>
where
    F: for<'a> FnOnce(&'a DatabaseTransaction) -> TxFuture<'a, T> + Send,
    T: Send,
{
    let (isolation, access) = match db.get_database_backend() {
        DbBackend::Sqlite => (None, None),
        _ => (Some(IsolationLevel::ReadCommitted), Some(AccessMode::ReadWrite)),
    };

    let txn = db.begin_with_config(isolation, access).await?;

    let result = f(&txn).await;
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!("Transaction rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}
