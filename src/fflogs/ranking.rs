//! 기간 랭킹 집계와 백분위 계산

use chrono::NaiveDate;

use super::cache::DailyRankingCache;
use super::client::{RankingQuery, RankingSource};
use super::error::FFLogsError;
use super::record::{Metric, RankingRecord};
use super::window::window;

/// 보고할 백분위 (높은 순)
pub const PERCENTILES: [u32; 7] = [100, 99, 95, 75, 50, 25, 10];

/// 기본 집계 기간 (일)
pub const DEFAULT_WINDOW_DAYS: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileRow {
    pub percentile: u32,
    pub value: f64,
}

pub struct RankingAggregator<S> {
    cache: DailyRankingCache,
    source: S,
}

impl<S: RankingSource> RankingAggregator<S> {
    pub fn new(cache: DailyRankingCache, source: S) -> Self {
        Self { cache, source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// `anchor` 부터 과거로 `window_days` 일치 랭킹을 모아 지표 값을 내림차순으로 반환
    ///
    /// 날짜별로 순서대로 조회합니다. 한 날짜라도 실패하면 전체가 실패합니다.
    pub async fn aggregate(
        &self,
        query: &RankingQuery,
        metric: Metric,
        anchor: NaiveDate,
        window_days: u32,
        token: &str,
    ) -> Result<Vec<f64>, FFLogsError> {
        let mut rankings = Vec::new();
        for day in window(anchor, window_days) {
            let records = self
                .cache
                .get_or_fetch(query, day, || self.source.fetch(query, day, token))
                .await?;
            rankings.extend(records);
        }

        let values = project(rankings, metric);
        if values.is_empty() {
            return Err(FFLogsError::NoData);
        }

        tracing::info!(
            "[FFLogs] encounter {} spec {} ({}): {} records over {} days",
            query.boss,
            query.job,
            metric,
            values.len(),
            window_days
        );
        Ok(values)
    }
}

/// 지표 값만 뽑아 내림차순 정렬. 값이 없는 레코드는 제외합니다.
pub fn project(records: Vec<RankingRecord>, metric: Metric) -> Vec<f64> {
    let mut values: Vec<f64> = records
        .iter()
        .filter_map(|record| metric.value(record))
        .filter(|value| value.is_finite())
        .collect();
    values.sort_by(|a, b| b.total_cmp(a));
    values
}

/// 내림차순 목록에서 `percentile` 에 해당하는 위치
///
/// `floor(total * (100 - percentile) / 100)`, `[0, total - 1]` 범위로 자릅니다.
pub fn percentile_index(total: usize, percentile: u32) -> usize {
    if total == 0 {
        return 0;
    }
    let below = 100 - percentile.min(100) as usize;
    (total * below / 100).min(total - 1)
}

/// 내림차순 값 목록의 백분위 표
pub fn percentile_table(values: &[f64]) -> Vec<PercentileRow> {
    if values.is_empty() {
        return Vec::new();
    }
    PERCENTILES
        .iter()
        .map(|&percentile| PercentileRow {
            percentile,
            value: values[percentile_index(values.len(), percentile)],
        })
        .collect()
}
