//! 날짜 계산
//!
//! 하루의 경계는 서버 로컬 시간 자정입니다.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone};

/// `day` 의 로컬 자정
pub fn local_midnight(day: NaiveDate) -> DateTime<Local> {
    let naive = day.and_time(NaiveTime::MIN);
    // 서머타임으로 자정이 없는 날은 UTC 기준으로 대체
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

/// API 필터용 (시작, 끝) 밀리초 타임스탬프. 끝 = 다음 날 자정.
pub fn day_bounds_millis(day: NaiveDate) -> (i64, i64) {
    let start = local_midnight(day);
    let end = day
        .succ_opt()
        .map(local_midnight)
        .unwrap_or_else(|| start + Duration::days(1));
    (start.timestamp_millis(), end.timestamp_millis())
}

/// 하루가 완전히 지났는지 (다음 날 자정 < now)
pub fn is_day_elapsed(day: NaiveDate, now: DateTime<Local>) -> bool {
    match day.succ_opt() {
        Some(next) => local_midnight(next) < now,
        None => false,
    }
}

/// 집계 기준일: 어제. 오늘 데이터는 아직 다 모이지 않았습니다.
pub fn anchor_day(now: DateTime<Local>) -> NaiveDate {
    let today = now.date_naive();
    today.pred_opt().unwrap_or(today)
}

/// `anchor` 부터 과거로 `days` 일
pub fn window(anchor: NaiveDate, days: u32) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(anchor), |day| day.pred_opt()).take(days as usize)
}
