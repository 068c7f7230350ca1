//! FFLogs 관련 모듈
//!
//! - `client`: FFLogs API v1 클라이언트 (페이지 단위 랭킹 조회)
//! - `cache`: 날짜별 랭킹 캐시
//! - `ranking`: 기간 집계와 백분위 계산
//! - `mapping`: 보스/직업 이름 ↔ FFLogs ID 매핑
//! - `plugin`: `/dps` 명령 플러그인

pub mod cache;
pub mod client;
pub mod error;
pub mod mapping;
pub mod plugin;
pub mod ranking;
pub mod record;
pub mod token;
pub mod window;

// 편의를 위한 re-export
pub use cache::DailyRankingCache;
pub use client::{FFLogsClient, RankingQuery, RankingSource};
pub use error::FFLogsError;
pub use mapping::{get_boss_info, get_job_info, BossInfo, JobInfo};
pub use plugin::{Command, FFLogsPlugin};
pub use ranking::{percentile_index, percentile_table, PercentileRow, RankingAggregator, PERCENTILES};
pub use record::{Metric, RankingRecord};
pub use token::TokenStore;
