//! Multi-document transactions with retry on MongoDB's transient labels.

use crate::services::error::{is_unknown_commit_result, InventoryError};
use crate::services::metrics::TRANSACTION_RETRIES;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use mongodb::{Client as MongoClient, ClientSession};
use std::future::Future;
use std::time::Duration;

#[derive(Clone)]
pub struct TransactionRunner {
    client: MongoClient,
    max_elapsed: Duration,
}

impl TransactionRunner {
    pub fn new(client: MongoClient, max_elapsed: Duration) -> Self {
        Self {
            client,
            max_elapsed,
        }
    }

    fn policy(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(20),
            max_interval: Duration::from_millis(500),
            max_elapsed_time: Some(self.max_elapsed),
            ..Default::default()
        }
    }

    /// Runs `body` inside a fresh transaction and commits it.
    ///
    /// The session is handed to `body` by value and handed back with the
    /// result. An `Err` aborts the transaction. The whole attempt is repeated
    /// only while the failure carries `TransientTransactionError`.
    pub async fn run<T, F, Fut>(&self, name: &'static str, mut body: F) -> Result<T, InventoryError>
    where
        F: FnMut(ClientSession) -> Fut,
        Fut: Future<Output = (ClientSession, Result<T, InventoryError>)>,
    {
        let mut policy = self.policy();
        let mut attempt = 1u32;

        loop {
            match self.attempt(&mut body).await {
                Err(e) if e.is_transient() => match policy.next_backoff() {
                    Some(delay) => {
                        tracing::warn!(
                            transaction = name,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Transient transaction failure, retrying"
                        );
                        metrics::counter!(TRANSACTION_RETRIES, "transaction" => name).increment(1);
                        attempt += 1;
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        tracing::error!(transaction = name, attempt, error = %e, "Transaction retries exhausted");
                        return Err(e);
                    }
                },
                other => return other,
            }
        }
    }

    async fn attempt<T, F, Fut>(&self, body: &mut F) -> Result<T, InventoryError>
    where
        F: FnMut(ClientSession) -> Fut,
        Fut: Future<Output = (ClientSession, Result<T, InventoryError>)>,
    {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        let (mut session, result) = body(session).await;
        match result {
            Ok(value) => {
                self.commit(&mut session).await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    tracing::warn!(error = %abort_err, "Failed to abort transaction");
                }
                Err(e)
            }
        }
    }

    async fn commit(&self, session: &mut ClientSession) -> Result<(), InventoryError> {
        let mut policy = self.policy();
        loop {
            match session.commit_transaction().await {
                Ok(()) => return Ok(()),
                Err(e) if is_unknown_commit_result(&e) => match policy.next_backoff() {
                    Some(delay) => {
                        tracing::warn!(error = %e, "Commit result unknown, retrying commit");
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(e.into()),
                },
                Err(e) => return Err(e.into()),
            }
        }
    }
}
