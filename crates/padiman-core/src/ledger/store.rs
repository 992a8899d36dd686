//! LedgerStore - wallet and coffer snapshots in the key/value store.

use std::sync::Arc;

use serde_json::Value;

use super::Ledger;
use crate::domain::{Coffer, PadimanError, Wallet};
use crate::persistence::{self, keys};
use crate::ports::KvStore;

#[derive(Clone)]
pub struct LedgerStore {
    kv: Arc<dyn KvStore>,
}

impl LedgerStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Load both accounts. Missing keys start empty; malformed ones are
    /// `CorruptRecord`.
    pub async fn load(&self) -> Result<Ledger, PadimanError> {
        let wallet: Wallet = persistence::load(self.kv.as_ref(), keys::WALLET)
            .await?
            .unwrap_or_default();
        let coffer: Coffer = persistence::load(self.kv.as_ref(), keys::COFFER)
            .await?
            .unwrap_or_default();
        Ok(Ledger::new(wallet, coffer))
    }

    /// Snapshot entries for a batched write.
    pub fn entries(&self, ledger: &Ledger) -> Result<Vec<(String, Value)>, PadimanError> {
        Ok(vec![
            persistence::encode(keys::WALLET, &ledger.wallet)?,
            persistence::encode(keys::COFFER, &ledger.coffer)?,
        ])
    }

    pub async fn save(&self, ledger: &Ledger) -> Result<(), PadimanError> {
        let entries = self.entries(ledger)?;
        self.kv.set_many(entries).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Naira;
    use crate::impls::InMemoryKvStore;
    use crate::ledger::Stamp;
    use crate::ports::{SystemClock, UlidGenerator};
    use chrono::Utc;
    use serde_json::json;
    use ulid::Ulid;

    #[tokio::test]
    async fn empty_store_loads_empty_ledger() {
        let store = LedgerStore::new(Arc::new(InMemoryKvStore::new()));
        assert_eq!(store.load().await.unwrap(), Ledger::default());
    }

    #[tokio::test]
    async fn saved_ledger_loads_back() {
        let store = LedgerStore::new(Arc::new(InMemoryKvStore::new()));
        let ids = UlidGenerator::new(SystemClock);
        let stamp = Stamp::new(&ids, Utc::now());

        let mut ledger = Ledger::default();
        ledger.deposit(Naira::new(1_000), &stamp).unwrap();
        ledger
            .hold_in_escrow(
                crate::domain::TaskId::from_ulid(Ulid::new()),
                Naira::new(300),
                &stamp,
            )
            .unwrap();
        store.save(&ledger).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, ledger);
        assert!(loaded.check_consistency().is_ok());
    }

    #[tokio::test]
    async fn malformed_wallet_is_not_reset() {
        let kv = Arc::new(InMemoryKvStore::new());
        kv.set(keys::WALLET, json!({"balance": "lots"})).await.unwrap();
        let store = LedgerStore::new(kv.clone());

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, PadimanError::CorruptRecord { .. }));
        assert_eq!(
            kv.get(keys::WALLET).await.unwrap(),
            Some(json!({"balance": "lots"}))
        );
    }
}
