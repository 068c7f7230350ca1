//! FFLogs API v1 (REST) 클라이언트
//!
//! 문서: https://cn.fflogs.com/v1/docs
//! 토큰은 `api_key` 쿼리 파라미터로 전달합니다.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::FFLogsError;
use super::record::RankingRecord;
use super::window::day_bounds_millis;

/// 기본 API 주소
pub const DEFAULT_BASE_URL: &str = "https://cn.fflogs.com/v1";
/// 한 번의 조회에서 따라갈 최대 페이지 수 기본값
pub const DEFAULT_MAX_PAGES: u32 = 100;

/// 조회 대상 (보스, 난이도, 직업)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RankingQuery {
    /// FFLogs Encounter ID
    pub boss: u32,
    /// 100 = Normal/Ultimate, 101 = Savage
    pub difficulty: u32,
    /// FFLogs spec ID
    pub job: u32,
}

/// 하루치 랭킹을 가져오는 쪽
#[async_trait::async_trait]
pub trait RankingSource: Send + Sync {
    async fn fetch(
        &self,
        query: &RankingQuery,
        day: NaiveDate,
        token: &str,
    ) -> Result<Vec<RankingRecord>, FFLogsError>;
}

/// `/rankings/encounter` 응답 한 페이지
#[derive(Debug, Deserialize)]
struct RankingPage {
    #[serde(rename = "hasMorePages")]
    has_more_pages: bool,
    rankings: Vec<RankingRecord>,
}

/// FFLogs API 클라이언트
#[derive(Debug)]
pub struct FFLogsClient {
    http: reqwest::Client,
    base_url: String,
    max_pages: AtomicU32,
}

impl FFLogsClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_pages: AtomicU32::new(DEFAULT_MAX_PAGES),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages.load(Ordering::Relaxed)
    }

    pub fn set_max_pages(&self, max_pages: u32) {
        self.max_pages.store(max_pages.max(1), Ordering::Relaxed);
    }

    /// GET 요청 후 JSON 파싱
    ///
    /// 401이면 `Auth`, 그 밖의 200이 아닌 응답/전송 실패/파싱 실패는 `Fetch`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, FFLogsError> {
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(FFLogsError::Auth);
        }
        if status != StatusCode::OK {
            return Err(FFLogsError::Fetch(format!("unexpected status {}", status)));
        }

        Ok(response.json().await?)
    }

    /// 하루(`day` 자정 ~ 다음 날 자정)의 모든 페이지를 순서대로 가져옵니다.
    ///
    /// 중간 페이지에서 실패하면 이미 받은 페이지도 버리고 에러를 반환합니다.
    pub async fn fetch_rankings(
        &self,
        query: &RankingQuery,
        day: NaiveDate,
        token: &str,
    ) -> Result<Vec<RankingRecord>, FFLogsError> {
        let (start, end) = day_bounds_millis(day);
        let filter = format!("date.{}.{}", start, end);
        let url = format!("{}/rankings/encounter/{}", self.base_url, query.boss);
        let max_pages = self.max_pages();

        let mut rankings = Vec::new();
        let mut page: u32 = 1;
        loop {
            if page > max_pages {
                tracing::warn!(
                    "[FFLogs] encounter {} on {} still has more pages after {}",
                    query.boss,
                    day,
                    max_pages
                );
                return Err(FFLogsError::BoundsExceeded { max_pages });
            }

            let request = self.http.get(&url).query(&[
                ("metric", "rdps".to_string()),
                ("difficulty", query.difficulty.to_string()),
                ("spec", query.job.to_string()),
                ("page", page.to_string()),
                ("filter", filter.clone()),
                ("api_key", token.to_string()),
            ]);

            let res: RankingPage = self.get_json(request).await?;
            rankings.extend(res.rankings);

            if !res.has_more_pages {
                break;
            }
            page += 1;
        }

        tracing::debug!(
            "[FFLogs] encounter {} spec {} on {}: {} records in {} pages",
            query.boss,
            query.job,
            day,
            rankings.len(),
            page
        );
        Ok(rankings)
    }

    /// 인스턴스(zone) 목록
    pub async fn zones(&self, token: &str) -> Result<serde_json::Value, FFLogsError> {
        let request = self
            .http
            .get(format!("{}/zones", self.base_url))
            .query(&[("api_key", token)]);
        self.get_json(request).await
    }

    /// 직업(class/spec) 목록
    pub async fn classes(&self, token: &str) -> Result<serde_json::Value, FFLogsError> {
        let request = self
            .http
            .get(format!("{}/classes", self.base_url))
            .query(&[("api_key", token)]);
        self.get_json(request).await
    }
}

#[async_trait::async_trait]
impl RankingSource for FFLogsClient {
    async fn fetch(
        &self,
        query: &RankingQuery,
        day: NaiveDate,
        token: &str,
    ) -> Result<Vec<RankingRecord>, FFLogsError> {
        self.fetch_rankings(query, day, token).await
    }
}
