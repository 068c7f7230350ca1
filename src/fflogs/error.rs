use crate::plugin::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum FFLogsError {
    /// 401 응답
    #[error("FFLogs rejected the token")]
    Auth,
    #[error("FFLogs did not return valid data: {0}")]
    Fetch(String),
    #[error("no ranking data in the requested window")]
    NoData,
    #[error("FFLogs still reported more pages after {max_pages} pages")]
    BoundsExceeded { max_pages: u32 },
    #[error("unknown boss: {0}")]
    UnknownBoss(String),
    #[error("unknown job: {0}")]
    UnknownJob(String),
    #[error("unknown metric: {0}")]
    UnknownMetric(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<reqwest::Error> for FFLogsError {
    fn from(e: reqwest::Error) -> Self {
        // 토큰이 URL 쿼리에 들어가므로 에러 메시지에서 URL 제거
        Self::Fetch(e.without_url().to_string())
    }
}
