//! Record storage: the data-source port and an in-memory implementation
//! persisted as a JSON snapshot.

use std::{
    cmp::Ordering,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{
    domain::{NewRecord, Period, Record, RecordId, RecordScope, UserId},
    errors::{Error, Result},
};

/// Which records a fetch covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordFilter {
    pub scope: RecordScope,
    pub period: Period,
    /// Reference day for `period`.
    pub today: NaiveDate,
}

impl RecordFilter {
    pub fn new(scope: RecordScope, today: NaiveDate) -> Self {
        Self {
            scope,
            period: Period::All,
            today,
        }
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    fn admits(&self, record: &Record, owner: UserId) -> bool {
        record.visible_to(owner)
            && record.kind_matches(self.scope)
            && self.period.contains(record.date, self.today)
    }
}

/// Newest first: date, then creation time, then id. A total order, so pages
/// stay consistent between requests.
pub fn record_order(a: &Record, b: &Record) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

/// Data-source port. Soft-deleted records never leave a source.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// One window of the ordered result set plus the total it was cut from.
    async fn fetch_page(
        &self,
        owner: UserId,
        filter: RecordFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Record>, usize)>;

    /// The whole ordered result set.
    async fn fetch_all(&self, owner: UserId, filter: RecordFilter) -> Result<Vec<Record>>;

    async fn insert(&self, owner: UserId, record: NewRecord) -> Result<Record>;

    async fn get(&self, owner: UserId, id: RecordId) -> Result<Record>;

    /// Only the owner may delete; a missing or already deleted record is `NotFound`.
    async fn soft_delete(&self, owner: UserId, id: RecordId) -> Result<()>;
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    next_id: u64,
    records: Vec<Record>,
}

impl Snapshot {
    fn allocate_id(&mut self) -> RecordId {
        let max_seen = self.records.iter().map(|r| r.id.0).max().unwrap_or(0);
        self.next_id = self.next_id.max(max_seen + 1);
        let id = RecordId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Record store kept in memory, optionally mirrored to a JSON file.
pub struct MemoryStore {
    path: Option<PathBuf>,
    state: RwLock<Snapshot>,
}

impl MemoryStore {
    /// A store with no backing file.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(Snapshot::default()),
        }
    }

    /// Seed a file-less store with existing records.
    pub fn with_records(records: Vec<Record>) -> Self {
        let mut snapshot = Snapshot {
            next_id: 0,
            records,
        };
        snapshot.next_id = snapshot.records.iter().map(|r| r.id.0).max().unwrap_or(0) + 1;
        Self {
            path: None,
            state: RwLock::new(snapshot),
        }
    }

    /// Load the snapshot at `path`; a missing or empty file starts an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = load_snapshot(&path).await?.unwrap_or_default();
        tracing::info!(
            path = %path.display(),
            records = snapshot.records.len(),
            "record store opened"
        );
        Ok(Self {
            path: Some(path),
            state: RwLock::new(snapshot),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        save_snapshot(path, snapshot).await
    }

    async fn select(&self, owner: UserId, filter: RecordFilter) -> Vec<Record> {
        let state = self.state.read().await;
        let mut out: Vec<Record> = state
            .records
            .iter()
            .filter(|r| filter.admits(r, owner))
            .cloned()
            .collect();
        out.sort_by(record_order);
        out
    }
}

#[async_trait]
impl RecordSource for MemoryStore {
    async fn fetch_page(
        &self,
        owner: UserId,
        filter: RecordFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Record>, usize)> {
        let all = self.select(owner, filter).await;
        let total = all.len();
        let page = all.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    async fn fetch_all(&self, owner: UserId, filter: RecordFilter) -> Result<Vec<Record>> {
        Ok(self.select(owner, filter).await)
    }

    async fn insert(&self, owner: UserId, new: NewRecord) -> Result<Record> {
        let mut state = self.state.write().await;
        // Build the next snapshot aside; memory only changes once the file is written.
        let mut next = state.clone();
        let record = Record {
            id: next.allocate_id(),
            owner,
            date: new.date,
            time: new.time,
            created_at: Utc::now(),
            deleted: false,
            body: new.body,
        };
        next.records.push(record.clone());
        self.persist(&next).await?;
        *state = next;
        tracing::debug!(user_id = owner.0, record_id = record.id.0, "record inserted");
        Ok(record)
    }

    async fn get(&self, owner: UserId, id: RecordId) -> Result<Record> {
        let state = self.state.read().await;
        state
            .records
            .iter()
            .find(|r| r.id == id && r.visible_to(owner))
            .cloned()
            .ok_or(Error::NotFound(id))
    }

    async fn soft_delete(&self, owner: UserId, id: RecordId) -> Result<()> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let record = next
            .records
            .iter_mut()
            .find(|r| r.id == id && r.owner == owner && !r.deleted)
            .ok_or(Error::NotFound(id))?;
        record.deleted = true;
        self.persist(&next).await?;
        *state = next;
        tracing::info!(user_id = owner.0, record_id = id.0, "record deleted");
        Ok(())
    }
}

async fn load_snapshot(path: &Path) -> Result<Option<Snapshot>> {
    if !tokio::fs::try_exists(path).await? {
        return Ok(None);
    }
    let txt = tokio::fs::read_to_string(path).await?;
    if txt.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&txt)?))
}

/// Write to a sibling temp file, then rename over the snapshot.
async fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let txt = serde_json::to_string_pretty(snapshot)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, txt).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{fixtures::expense, RecordBody, TransactionType};
    use rust_decimal::Decimal;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
    }

    fn filter(scope: RecordScope) -> RecordFilter {
        RecordFilter::new(scope, today())
    }

    fn new_expense(day: u32, amount: i64) -> NewRecord {
        NewRecord {
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            time: None,
            body: RecordBody::Transaction {
                tx_type: TransactionType::Expense,
                amount: Decimal::from(amount),
                category: "Еда".to_string(),
                description: None,
            },
        }
    }

    fn plan(shared: bool) -> NewRecord {
        NewRecord {
            date: today(),
            time: None,
            body: RecordBody::Plan {
                title: "Dinner".to_string(),
                description: None,
                category: "семья".to_string(),
                shared,
            },
        }
    }

    #[tokio::test]
    async fn ids_are_monotonic_and_fetch_is_newest_first() {
        let store = MemoryStore::in_memory();
        let a = store.insert(UserId(1), new_expense(1, 100)).await.unwrap();
        let b = store.insert(UserId(1), new_expense(3, 200)).await.unwrap();
        let c = store.insert(UserId(1), new_expense(2, 300)).await.unwrap();
        assert!(a.id < b.id && b.id < c.id);

        let all = store
            .fetch_all(UserId(1), filter(RecordScope::Expenses))
            .await
            .unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![b.id, c.id, a.id]);
    }

    #[tokio::test]
    async fn fetch_page_returns_window_and_total() {
        let records: Vec<_> = (1..=12).map(|i| expense(i, 10, "Еда", None)).collect();
        let store = MemoryStore::with_records(records);

        let (page, total) = store
            .fetch_page(UserId(1), filter(RecordScope::Expenses), 10, 5)
            .await
            .unwrap();
        assert_eq!(total, 12);
        // Newest first, so the last window holds the two oldest records.
        let ids: Vec<_> = page.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn scope_and_visibility() {
        let store = MemoryStore::in_memory();
        store.insert(UserId(1), new_expense(1, 100)).await.unwrap();
        store.insert(UserId(1), plan(true)).await.unwrap();
        store.insert(UserId(1), plan(false)).await.unwrap();

        let partner_plans = store
            .fetch_all(UserId(2), filter(RecordScope::Plans))
            .await
            .unwrap();
        assert_eq!(partner_plans.len(), 1);

        let partner_expenses = store
            .fetch_all(UserId(2), filter(RecordScope::Expenses))
            .await
            .unwrap();
        assert!(partner_expenses.is_empty());

        let income = store
            .fetch_all(UserId(1), filter(RecordScope::Income))
            .await
            .unwrap();
        assert!(income.is_empty());
    }

    #[tokio::test]
    async fn period_narrows_fetch() {
        let store = MemoryStore::in_memory();
        store.insert(UserId(1), new_expense(1, 100)).await.unwrap();
        store.insert(UserId(1), new_expense(30, 100)).await.unwrap();

        let week = filter(RecordScope::Expenses).with_period(Period::Week);
        assert_eq!(store.fetch_all(UserId(1), week).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn soft_delete_hides_record_and_is_owner_only() {
        let store = MemoryStore::in_memory();
        let rec = store.insert(UserId(1), new_expense(1, 100)).await.unwrap();

        assert!(matches!(
            store.soft_delete(UserId(2), rec.id).await,
            Err(Error::NotFound(_))
        ));
        store.soft_delete(UserId(1), rec.id).await.unwrap();
        assert!(matches!(
            store.soft_delete(UserId(1), rec.id).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.get(UserId(1), rec.id).await,
            Err(Error::NotFound(_))
        ));
        let (_, total) = store
            .fetch_page(UserId(1), filter(RecordScope::Expenses), 0, 5)
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("fpb-store-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("records.json");
        let _ = tokio::fs::remove_file(&path).await;

        let first = {
            let store = MemoryStore::open(&path).await.unwrap();
            let rec = store.insert(UserId(7), new_expense(5, 42)).await.unwrap();
            store.insert(UserId(7), new_expense(6, 43)).await.unwrap();
            store.soft_delete(UserId(7), rec.id).await.unwrap();
            rec
        };

        let reopened = MemoryStore::open(&path).await.unwrap();
        let all = reopened
            .fetch_all(UserId(7), filter(RecordScope::Expenses))
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_ne!(all[0].id, first.id);

        let next = reopened.insert(UserId(7), new_expense(7, 44)).await.unwrap();
        assert!(next.id > all[0].id);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn failed_write_leaves_memory_untouched() {
        let dir = std::env::temp_dir().join(format!("fpb-store-fail-{}", std::process::id()));
        let _ = tokio::fs::remove_dir_all(&dir).await;
        let path = dir.join("records.json");

        // The parent directory does not exist yet, so every write fails.
        let store = MemoryStore::open(&path).await.unwrap();
        assert!(store.insert(UserId(7), new_expense(5, 42)).await.is_err());
        let all = store
            .fetch_all(UserId(7), filter(RecordScope::Expenses))
            .await
            .unwrap();
        assert!(all.is_empty());

        tokio::fs::create_dir_all(&dir).await.unwrap();
        let rec = store.insert(UserId(7), new_expense(5, 42)).await.unwrap();
        assert_eq!(rec.id, RecordId(1));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
        assert!(store.soft_delete(UserId(7), rec.id).await.is_err());
        assert_eq!(store.get(UserId(7), rec.id).await.unwrap().id, rec.id);
    }
}
