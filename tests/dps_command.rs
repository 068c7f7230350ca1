//! `/dps` 명령 전체 흐름 (가짜 FFLogs 서버 사용)

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fflogs_percentile::config::FFLogs as FFLogsConfig;
use fflogs_percentile::fflogs::FFLogsPlugin;
use fflogs_percentile::plugin::{Plugin, PluginManager};
use tempfile::tempdir;
use warp::http::StatusCode;
use warp::{Filter, Reply};

struct FakeFFLogs {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

/// 어느 날짜를 요청해도 rdps 100, 50 두 건을 돌려주는 서버. 토큰은 `good-token` 만 허용.
fn start_fake_fflogs() -> FakeFFLogs {
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = hits.clone();
    let route = warp::path!("rankings" / "encounter" / u32)
        .and(warp::query::<HashMap<String, String>>())
        .map(move |boss: u32, params: HashMap<String, String>| {
            counter.fetch_add(1, Ordering::SeqCst);
            if params.get("api_key").map(String::as_str) != Some("good-token") {
                return StatusCode::UNAUTHORIZED.into_response();
            }
            warp::reply::json(&serde_json::json!({
                "hasMorePages": false,
                "rankings": [
                    { "name": "a", "encounterID": boss, "total": 100.0, "other_per_second_amount": 95.0, "raw_dps": 90.0 },
                    { "name": "b", "encounterID": boss, "total": 50.0, "other_per_second_amount": 45.0, "raw_dps": 40.0 },
                ],
            }))
            .into_response()
        });

    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    FakeFFLogs { addr, hits }
}

fn plugin_for(fake: &FakeFFLogs, data_dir: &std::path::Path) -> FFLogsPlugin {
    let config = FFLogsConfig {
        base_url: format!("http://{}", fake.addr),
    };
    FFLogsPlugin::new(&config, data_dir).unwrap()
}

#[tokio::test]
async fn test_report_over_default_window() {
    let fake = start_fake_fflogs();
    let dir = tempdir().unwrap();
    let plugin = plugin_for(&fake, dir.path());

    assert_eq!(plugin.on_message("/dps token good-token").await.unwrap(), "Token saved");

    let report = plugin.on_message("/dps e12s whm").await.unwrap();
    let lines: Vec<&str> = report.lines().collect();
    // 14일 x 2건
    assert_eq!(lines[0], "Eden's Promise White Mage (rdps)");
    assert_eq!(lines[1], "Total: 28 records");
    assert_eq!(lines[2], "100% : 100.00");
    assert_eq!(lines[3], "99% : 100.00");
    assert_eq!(lines[6], "50% : 50.00");
    assert_eq!(lines[8], "10% : 50.00");
    assert_eq!(fake.hits.load(Ordering::SeqCst), 14);

    // 지난 날짜는 모두 캐시에서 읽음
    let report = plugin.on_message("/dps e12s whm pdps").await.unwrap();
    assert!(report.starts_with("Eden's Promise White Mage (pdps)\nTotal: 28 records\n100% : 90.00"));
    assert_eq!(fake.hits.load(Ordering::SeqCst), 14);

    let cached = std::fs::read_dir(dir.path().join("plugin-fflogs"))
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("76_101_13_"))
        .count();
    assert_eq!(cached, 14);
}

#[tokio::test]
async fn test_window_length_comes_from_config() {
    let fake = start_fake_fflogs();
    let dir = tempdir().unwrap();
    let plugin = plugin_for(&fake, dir.path());

    let path = dir.path().join("plugin-fflogs").join("fflogs.toml");
    std::fs::write(&path, "[fflogs]\ntoken = \"good-token\"\nrange = \"3\"\n").unwrap();
    plugin.reload().unwrap();

    let report = plugin.on_message("/dps e9s blm adps").await.unwrap();
    assert!(report.contains("Total: 6 records"));
    assert!(report.contains("100% : 95.00"));
    assert_eq!(fake.hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_bad_token_reports_auth_failure() {
    let fake = start_fake_fflogs();
    let dir = tempdir().unwrap();
    let plugin = plugin_for(&fake, dir.path());

    plugin.on_message("/dps token wrong").await.unwrap();
    let reply = plugin.on_message("/dps e12s whm").await.unwrap();
    assert_eq!(reply, "FFLogs rejected the token, please check the token");
    // 첫 요청에서 중단
    assert_eq!(fake.hits.load(Ordering::SeqCst), 1);

    // 실패한 날짜는 캐시되지 않음
    plugin.on_message("/dps token good-token").await.unwrap();
    let report = plugin.on_message("/dps e12s whm").await.unwrap();
    assert!(report.contains("Total: 28 records"));
}

#[tokio::test]
async fn test_unknown_names_make_no_requests() {
    let fake = start_fake_fflogs();
    let dir = tempdir().unwrap();
    let plugin = plugin_for(&fake, dir.path());
    plugin.on_message("/dps token good-token").await.unwrap();

    let reply = plugin.on_message("/dps nowhere whm").await.unwrap();
    assert_eq!(reply, "Could not find nowhere, please try a different name");
    let reply = plugin.on_message("/dps e12s whm hps").await.unwrap();
    assert!(reply.starts_with("Could not find metric hps"));
    assert_eq!(fake.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dispatch_through_manager() {
    let fake = start_fake_fflogs();
    let dir = tempdir().unwrap();
    let mut manager = PluginManager::new();
    manager
        .register(Arc::new(plugin_for(&fake, dir.path())))
        .unwrap();

    assert!(manager.dispatch("/dps status").await.is_empty());
    manager.enable("fflogs").unwrap();

    let replies = manager.dispatch("/dps status").await;
    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("token not set"));
    assert!(manager.dispatch("good morning").await.is_empty());
    assert!(manager.status("fflogs").unwrap().starts_with("[fflogs] enabled:"));
}
