use serde::{Deserialize, Serialize};

/// One historical leaderboard line in the external record service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub score: i64,
}

/// Client for the external leaderboard record service.
///
/// The service is a plain key/value store with `read` and `write` actions,
/// independent of live session state. Failures are reported to the caller
/// and must never take a room down with them.
#[derive(Clone)]
pub enum RecordStore {
    Http(HttpRecordStore),
    /// Used when no record service is configured; `append` is swallowed and
    /// `list` is empty.
    Noop,
}

impl RecordStore {
    pub fn http(base_url: String) -> Self {
        RecordStore::Http(HttpRecordStore {
            base_url,
            client: reqwest::Client::new(),
        })
    }

    pub async fn list(&self) -> anyhow::Result<Vec<PlayerRecord>> {
        match self {
            RecordStore::Http(store) => store.list().await,
            RecordStore::Noop => Ok(Vec::new()),
        }
    }

    pub async fn append(&self, name: &str, score: i64) -> anyhow::Result<()> {
        match self {
            RecordStore::Http(store) => store.append(name, score).await,
            RecordStore::Noop => Ok(()),
        }
    }
}

#[derive(Clone)]
pub struct HttpRecordStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRecordStore {
    async fn list(&self) -> anyhow::Result<Vec<PlayerRecord>> {
        let records = self
            .client
            .get(format!("{}?action=read", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(records)
    }

    async fn append(&self, name: &str, score: i64) -> anyhow::Result<()> {
        self.client
            .post(format!("{}?action=write", self.base_url))
            .json(&PlayerRecord {
                name: String::from(name),
                score,
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
