//! FFLogs DPS 백분위 플러그인
//!
//! 사용법:
//! - `/dps <보스> <직업> [rdps|adps|pdps]`: 최근 기간의 DPS 백분위
//! - `/dps token <토큰>`: FFLogs API 토큰 설정
//! - `/dps zones`, `/dps classes`: FFLogs 에 등록된 인스턴스/직업 수
//! - `/dps status`: 플러그인 상태

use std::path::Path;
use std::sync::Arc;

use chrono::Local;

use super::cache::DailyRankingCache;
use super::client::{FFLogsClient, RankingQuery, DEFAULT_MAX_PAGES};
use super::error::FFLogsError;
use super::mapping::{get_boss_info, get_job_info, BossInfo, JobInfo};
use super::ranking::{percentile_table, RankingAggregator, DEFAULT_WINDOW_DAYS};
use super::record::Metric;
use super::token::TokenStore;
use super::window::anchor_day;
use crate::config::FFLogs as FFLogsConfig;
use crate::plugin::{Plugin, PluginData, PluginError, PluginStorage, StorageError};

pub const PLUGIN_NAME: &str = "fflogs";
const SECTION: &str = "fflogs";
const COMMAND_PREFIX: &str = "/dps";

const USAGE: &str = "Usage:\n\
    /dps <boss> <job> [rdps|adps|pdps]\n\
    /dps token <token>\n\
    /dps zones | classes | status";

/// `/dps` 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dps {
        boss: String,
        job: String,
        metric: Option<String>,
    },
    Token(String),
    Zones,
    Classes,
    Status,
    Help,
}

impl Command {
    /// `/dps` 로 시작하지 않으면 `None`
    pub fn parse(text: &str) -> Option<Self> {
        let mut args = text.split_whitespace();
        if !args.next()?.eq_ignore_ascii_case(COMMAND_PREFIX) {
            return None;
        }
        let args: Vec<&str> = args.collect();

        let command = match args.as_slice() {
            ["token", token] => Command::Token(token.to_string()),
            ["zones"] => Command::Zones,
            ["classes"] => Command::Classes,
            ["status"] => Command::Status,
            words => Self::parse_dps(words).unwrap_or(Command::Help),
        };
        Some(command)
    }

    /// `<보스> <직업> [지표]`. 보스와 직업 이름에는 공백이 들어갈 수 있습니다.
    ///
    /// 뒤에서부터 읽습니다. 마지막 단어가 지표이면 떼어 내고, 남은 단어의 가장 긴
    /// 직업 이름 꼬리를 직업으로, 나머지를 보스로 봅니다.
    fn parse_dps(words: &[&str]) -> Option<Self> {
        if words.len() < 2 {
            return None;
        }

        let (rest, metric) = match words.split_last() {
            Some((last, rest)) if words.len() >= 3 && last.parse::<Metric>().is_ok() => {
                (rest, Some(*last))
            }
            _ => (words, None),
        };

        let (boss, job, metric) = if let Some((boss, job)) = split_job(rest) {
            (boss, job, metric)
        } else if let (None, Some((last, head))) = (metric, rest.split_last()) {
            // 마지막 단어가 알 수 없는 지표인 경우 (`e12s whm hps`)
            match split_job(head) {
                Some((boss, job)) => (boss, job, Some(*last)),
                None => {
                    let (boss, job) = split_unknown(rest)?;
                    (boss, job, None)
                }
            }
        } else {
            let (boss, job) = split_unknown(rest)?;
            (boss, job, metric)
        };

        Some(Command::Dps {
            boss: boss.join(" "),
            job: job.join(" "),
            metric: metric.map(str::to_string),
        })
    }
}

type Split<'a, 'w> = (&'a [&'w str], &'a [&'w str]);

/// 알려진 직업 이름 중 가장 긴 꼬리로 나눔. 보스 쪽에 한 단어 이상 남김.
fn split_job<'a, 'w>(words: &'a [&'w str]) -> Option<Split<'a, 'w>> {
    (1..words.len())
        .map(|at| words.split_at(at))
        .find(|(_, job)| get_job_info(&job.join(" ")).is_some())
}

/// 직업 이름을 모를 때: 가장 긴 보스 이름 머리로 나누고, 그것도 없으면 마지막 단어를 직업으로 봄.
/// 잘못된 이름은 조회 단계에서 안내합니다.
fn split_unknown<'a, 'w>(words: &'a [&'w str]) -> Option<Split<'a, 'w>> {
    if words.len() < 2 {
        return None;
    }
    let split = (1..words.len())
        .rev()
        .map(|at| words.split_at(at))
        .find(|(boss, _)| get_boss_info(&boss.join(" ")).is_some())
        .unwrap_or_else(|| words.split_at(words.len() - 1));
    Some(split)
}

/// FFLogs 목록 조회 대상
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Zones,
    Classes,
}

impl Listing {
    pub fn as_str(self) -> &'static str {
        match self {
            Listing::Zones => "zones",
            Listing::Classes => "classes",
        }
    }
}

pub struct FFLogsPlugin {
    storage: PluginStorage,
    data: Arc<PluginData>,
    tokens: TokenStore,
    aggregator: RankingAggregator<FFLogsClient>,
}

impl FFLogsPlugin {
    /// `data_dir/plugin-fflogs/` 에 설정과 캐시를 둡니다.
    pub fn new(config: &FFLogsConfig, data_dir: &Path) -> Result<Self, PluginError> {
        let data = Arc::new(PluginData::open(PLUGIN_NAME, data_dir)?);

        let client = FFLogsClient::new(&config.base_url);
        client.set_max_pages(read_number(&data, "max_pages", DEFAULT_MAX_PAGES)?);

        let cache = DailyRankingCache::new(data.blobs().clone());
        let plugin = Self {
            storage: PluginStorage::Enabled(data.clone()),
            tokens: TokenStore::new(data.clone()),
            aggregator: RankingAggregator::new(cache, client),
            data,
        };
        // 기본 기간 설정을 파일에 남겨 둠
        plugin.window_days()?;

        Ok(plugin)
    }

    fn client(&self) -> &FFLogsClient {
        self.aggregator.source()
    }

    /// 집계 기간 (`[fflogs] range`, 기본 14일)
    fn window_days(&self) -> Result<u32, StorageError> {
        read_number(&self.data, "range", DEFAULT_WINDOW_DAYS)
    }

    /// 명령 처리
    pub async fn handle(&self, command: Command) -> String {
        match command {
            Command::Dps { boss, job, metric } => self.dps(&boss, &job, metric.as_deref()).await,
            Command::Token(token) => {
                // 설정 파일 쓰기는 blocking 스레드에서
                let tokens = self.tokens.clone();
                match tokio::task::spawn_blocking(move || tokens.set(&token)).await {
                    Ok(Ok(())) => "Token saved".to_string(),
                    Ok(Err(e)) => {
                        tracing::error!("could not save FFLogs token: {}", e);
                        "Could not save the token, please try again later".to_string()
                    }
                    Err(e) => {
                        tracing::error!("token save task failed: {}", e);
                        "Could not save the token, please try again later".to_string()
                    }
                }
            }
            Command::Zones => self.count_reply(Listing::Zones).await,
            Command::Classes => self.count_reply(Listing::Classes).await,
            Command::Status => self.status(),
            Command::Help => USAGE.to_string(),
        }
    }

    /// DPS 백분위 조회
    pub async fn dps(&self, boss: &str, job: &str, metric: Option<&str>) -> String {
        let Some(boss_info) = get_boss_info(boss) else {
            return format!("Could not find {}, please try a different name", boss);
        };
        let Some(job_info) = get_job_info(job) else {
            return format!("Could not find {}, please try a different name", job);
        };
        let metric = match metric.map(str::parse::<Metric>).transpose() {
            Ok(metric) => metric.unwrap_or_default(),
            Err(_) => {
                return format!(
                    "Could not find metric {}, only adps, rdps and pdps are supported",
                    metric.unwrap_or_default()
                )
            }
        };

        let Some(token) = self.tokens.get() else {
            return "FFLogs token is not set, use /dps token <token>".to_string();
        };

        match self.percentiles(boss_info, job_info, metric, &token).await {
            Ok(values) => render_report(boss_info, job_info, metric, &values),
            Err(e) => {
                tracing::warn!("[FFLogs] {} {} ({}) failed: {}", boss_info.name, job_info.name, metric, e);
                failure_message(&e)
            }
        }
    }

    async fn percentiles(
        &self,
        boss: &BossInfo,
        job: &JobInfo,
        metric: Metric,
        token: &str,
    ) -> Result<Vec<f64>, FFLogsError> {
        let query = RankingQuery {
            boss: boss.encounter_id,
            difficulty: boss.difficulty,
            job: job.spec_id,
        };
        let window_days = self.window_days()?;
        let anchor = anchor_day(Local::now());

        self.aggregator
            .aggregate(&query, metric, anchor, window_days, token)
            .await
    }

    async fn count_reply(&self, listing: Listing) -> String {
        let Some(token) = self.tokens.get() else {
            return "FFLogs token is not set, use /dps token <token>".to_string();
        };

        let what = listing.as_str();
        let result = match listing {
            Listing::Zones => self.client().zones(&token).await,
            Listing::Classes => self.client().classes(&token).await,
        };
        match result {
            Ok(value) => {
                let count = value.as_array().map(Vec::len).unwrap_or(0);
                format!("FFLogs lists {} {}", count, what)
            }
            Err(e) => {
                tracing::warn!("[FFLogs] {} failed: {}", what, e);
                failure_message(&e)
            }
        }
    }
}

/// 설정 값을 숫자로 읽기. 없으면 기본값을 저장하고, 잘못된 값이면 기본값 사용.
fn read_number(data: &PluginData, option: &str, default: u32) -> Result<u32, StorageError> {
    let raw = data
        .config()
        .get_or_insert(SECTION, option, &default.to_string())?;
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => {
            tracing::warn!("invalid [{}] {} = {:?}, using {}", SECTION, option, raw, default);
            Ok(default)
        }
    }
}

/// 성공 응답
pub fn render_report(boss: &BossInfo, job: &JobInfo, metric: Metric, values: &[f64]) -> String {
    let mut reply = format!("{} {} ({})", boss.name, job.name, metric);
    reply += &format!("\nTotal: {} records", values.len());
    for row in percentile_table(values) {
        reply += &format!("\n{}% : {:.2}", row.percentile, row.value);
    }
    reply
}

/// 실패 응답
pub fn failure_message(error: &FFLogsError) -> String {
    match error {
        FFLogsError::Auth => "FFLogs rejected the token, please check the token".to_string(),
        FFLogsError::NoData => "FFLogs has no data for this, please try again later".to_string(),
        FFLogsError::Fetch(_) | FFLogsError::BoundsExceeded { .. } => {
            "FFLogs did not return valid data, please try again later".to_string()
        }
        FFLogsError::Storage(_) => "Local storage error, please try again later".to_string(),
        FFLogsError::UnknownBoss(name) | FFLogsError::UnknownJob(name) => {
            format!("Could not find {}, please try a different name", name)
        }
        FFLogsError::UnknownMetric(name) => format!(
            "Could not find metric {}, only adps, rdps and pdps are supported",
            name
        ),
    }
}

#[async_trait::async_trait]
impl Plugin for FFLogsPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn storage(&self) -> &PluginStorage {
        &self.storage
    }

    async fn on_message(&self, text: &str) -> Option<String> {
        let command = Command::parse(text)?;
        Some(self.handle(command).await)
    }

    fn enable(&self) {
        tracing::info!("[FFLogs] using {}", self.client().base_url());
    }

    fn reload(&self) -> Result<(), PluginError> {
        self.data.config().reload()?;
        self.client()
            .set_max_pages(read_number(&self.data, "max_pages", DEFAULT_MAX_PAGES)?);
        Ok(())
    }

    fn status(&self) -> String {
        let token = if self.tokens.get().is_some() { "set" } else { "not set" };
        let window = self
            .window_days()
            .map(|days| days.to_string())
            .unwrap_or_else(|_| "?".to_string());
        format!(
            "token {}, window {} days, max {} pages, data in {}",
            token,
            window,
            self.client().max_pages(),
            self.data.base_path().display()
        )
    }
}
