//! FFLogs 랭킹 레코드와 DPS 지표

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::FFLogsError;

/// `/rankings/encounter` 응답의 레코드 1개
///
/// 사용하는 수치 필드 외의 값은 `extra` 에 그대로 보관되어 캐시에 함께 저장됩니다.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RankingRecord {
    /// rDPS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    /// aDPS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_per_second_amount: Option<f64>,
    /// pDPS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_dps: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// DPS 지표 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Metric {
    #[default]
    Rdps,
    Adps,
    Pdps,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Adps, Metric::Rdps, Metric::Pdps];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Rdps => "rdps",
            Metric::Adps => "adps",
            Metric::Pdps => "pdps",
        }
    }

    /// 레코드에서 이 지표에 해당하는 값
    pub fn value(self, record: &RankingRecord) -> Option<f64> {
        match self {
            Metric::Rdps => record.total,
            Metric::Adps => record.other_per_second_amount,
            Metric::Pdps => record.raw_dps,
        }
    }
}

impl FromStr for Metric {
    type Err = FFLogsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FFLogsError::UnknownMetric(s.to_string()))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
