//! 일별 랭킹 캐시
//!
//! (보스, 난이도, 직업, 날짜) 하나당 JSON 파일 하나를 저장합니다.
//! 완전히 지난 날짜만 저장하고, 진행 중인 날짜는 데이터가 계속 늘어나므로 매번 새로 받습니다.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate};

use super::client::RankingQuery;
use super::error::FFLogsError;
use super::record::RankingRecord;
use super::window::is_day_elapsed;
use crate::plugin::{BlobCache, StorageError};

pub struct DailyRankingCache {
    blobs: BlobCache,
    /// 같은 키에 대한 동시 조회를 한 번의 fetch 로 묶기 위한 키별 잠금
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl DailyRankingCache {
    pub fn new(blobs: BlobCache) -> Self {
        Self {
            blobs,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// `{boss}_{difficulty}_{job}_{YYYYMMDD}`
    pub fn key(query: &RankingQuery, day: NaiveDate) -> String {
        format!(
            "{}_{}_{}_{}",
            query.boss,
            query.difficulty,
            query.job,
            day.format("%Y%m%d")
        )
    }

    fn file_name(key: &str) -> String {
        format!("{}.json", key)
    }

    fn key_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(key.to_string()).or_default().clone()
    }

    /// 다른 작업이 기다리고 있지 않으면 키별 잠금을 지움
    fn release_lock(&self, key: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // map 과 `lock` 두 개만 남았으면 아무도 쓰지 않음
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// 캐시에 있으면 캐시에서, 없으면 `fetch` 로 가져옵니다.
    ///
    /// 지난 날짜의 결과만 저장합니다. 캐시 파일이 깨져 있으면 없는 것으로 취급합니다.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        query: &RankingQuery,
        day: NaiveDate,
        fetch: F,
    ) -> Result<Vec<RankingRecord>, FFLogsError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<RankingRecord>, FFLogsError>>,
    {
        let key = Self::key(query, day);

        let lock = self.key_lock(&key);
        let guard = lock.lock().await;
        let result = self.load_or_fetch(&key, day, fetch).await;
        drop(guard);
        self.release_lock(&key, lock);

        result
    }

    async fn load_or_fetch<F, Fut>(
        &self,
        key: &str,
        day: NaiveDate,
        fetch: F,
    ) -> Result<Vec<RankingRecord>, FFLogsError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<RankingRecord>, FFLogsError>>,
    {
        let name = Self::file_name(key);

        // fetch 시작 전 시각 기준. 조회 도중 자정이 지나도 불완전한 데이터는 저장하지 않음
        let elapsed = is_day_elapsed(day, Local::now());

        if elapsed {
            match self.blobs.load_json_async::<Vec<RankingRecord>>(&name).await {
                Ok(records) => {
                    tracing::debug!("[FFLogs] cache hit {} ({} records)", key, records.len());
                    return Ok(records);
                }
                Err(StorageError::CacheMiss { .. }) => {}
                Err(e) => {
                    tracing::warn!("[FFLogs] unreadable cache entry {}, refetching: {}", key, e);
                }
            }
        }

        let records = fetch().await?;

        if elapsed {
            if let Err(e) = self.blobs.save_json_async(&name, &records).await {
                tracing::warn!("[FFLogs] could not save cache entry {}: {}", key, e);
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    const QUERY: RankingQuery = RankingQuery {
        boss: 73,
        difficulty: 101,
        job: 13,
    };

    fn record(total: f64) -> RankingRecord {
        RankingRecord {
            total: Some(total),
            ..Default::default()
        }
    }

    fn yesterday() -> NaiveDate {
        Local::now().date_naive().pred_opt().unwrap()
    }

    /// 호출 횟수를 세는 fetch
    fn counting_fetch(
        calls: &AtomicUsize,
        records: Vec<RankingRecord>,
    ) -> impl Future<Output = Result<Vec<RankingRecord>, FFLogsError>> + '_ {
        calls.fetch_add(1, Ordering::SeqCst);
        async move { Ok(records) }
    }

    #[test]
    fn test_key_format() {
        let day = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
        assert_eq!(DailyRankingCache::key(&QUERY, day), "73_101_13_20200102");
    }

    #[test]
    fn test_keys_are_distinct() {
        let day = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
        let a = RankingQuery { boss: 1, difficulty: 11, job: 1 };
        let b = RankingQuery { boss: 11, difficulty: 1, job: 1 };
        assert_ne!(DailyRankingCache::key(&a, day), DailyRankingCache::key(&b, day));
    }

    #[tokio::test]
    async fn test_elapsed_day_is_fetched_once() {
        let dir = tempdir().unwrap();
        let cache = DailyRankingCache::new(BlobCache::new(dir.path()));
        let calls = AtomicUsize::new(0);
        let day = yesterday();

        let first = cache
            .get_or_fetch(&QUERY, day, || counting_fetch(&calls, vec![record(1.0), record(2.0)]))
            .await
            .unwrap();
        let second = cache
            .get_or_fetch(&QUERY, day, || counting_fetch(&calls, vec![record(99.0)]))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert!(dir.path().join(format!("{}.json", DailyRankingCache::key(&QUERY, day))).exists());
    }

    #[tokio::test]
    async fn test_today_is_never_cached() {
        let dir = tempdir().unwrap();
        let cache = DailyRankingCache::new(BlobCache::new(dir.path()));
        let calls = AtomicUsize::new(0);
        let today = Local::now().date_naive();

        // 오늘 키로 파일이 있어도 읽지 않음
        let name = format!("{}.json", DailyRankingCache::key(&QUERY, today));
        BlobCache::new(dir.path()).save_json(&name, &vec![record(5.0)]).unwrap();

        for _ in 0..3 {
            let records = cache
                .get_or_fetch(&QUERY, today, || counting_fetch(&calls, vec![record(7.0)]))
                .await
                .unwrap();
            assert_eq!(records, vec![record(7.0)]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fetch_error_is_not_cached() {
        let dir = tempdir().unwrap();
        let cache = DailyRankingCache::new(BlobCache::new(dir.path()));
        let day = yesterday();

        let err = cache
            .get_or_fetch(&QUERY, day, || async { Err(FFLogsError::Auth) })
            .await
            .unwrap_err();
        assert!(matches!(err, FFLogsError::Auth));

        let calls = AtomicUsize::new(0);
        cache
            .get_or_fetch(&QUERY, day, || counting_fetch(&calls, vec![]))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_refetched() {
        let dir = tempdir().unwrap();
        let blobs = BlobCache::new(dir.path());
        let cache = DailyRankingCache::new(blobs.clone());
        let day = yesterday();
        let name = format!("{}.json", DailyRankingCache::key(&QUERY, day));
        blobs.save(&name, b"\x80garbage").unwrap();

        let calls = AtomicUsize::new(0);
        let records = cache
            .get_or_fetch(&QUERY, day, || counting_fetch(&calls, vec![record(3.0)]))
            .await
            .unwrap();
        assert_eq!(records, vec![record(3.0)]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // 새 결과로 덮어씀
        let stored: Vec<RankingRecord> = blobs.load_json(&name).unwrap();
        assert_eq!(stored, vec![record(3.0)]);
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(DailyRankingCache::new(BlobCache::new(dir.path())));
        let calls = Arc::new(AtomicUsize::new(0));
        let day = yesterday();

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let cache = cache.clone();
            let calls = calls.clone();
            tasks.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(&QUERY, day, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok(vec![record(1.0)])
                    })
                    .await
                    .unwrap()
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap(), vec![record(1.0)]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.lock_count(), 0);
    }

    #[tokio::test]
    async fn test_key_locks_are_released() {
        let dir = tempdir().unwrap();
        let cache = DailyRankingCache::new(BlobCache::new(dir.path()));
        let calls = AtomicUsize::new(0);

        let mut day = yesterday();
        for _ in 0..5 {
            cache
                .get_or_fetch(&QUERY, day, || counting_fetch(&calls, vec![record(1.0)]))
                .await
                .unwrap();
            day = day.pred_opt().unwrap();
        }
        // 실패한 조회도 잠금을 남기지 않음
        cache
            .get_or_fetch(&QUERY, day, || async { Err(FFLogsError::Auth) })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(cache.lock_count(), 0);
    }
}
