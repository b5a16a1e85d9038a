// tests/cycle_e2e.rs
//
// Full pipeline runs against in-memory collaborators: the announcement
// scenario, bootstrap, fetch isolation at cycle level, enrichment failure,
// and the fatal error classes (roster, corrupt state, state write).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tempfile::TempDir;

use streak_herald::config::AppConfig;
use streak_herald::cycle::{run_cycle, CycleDeps};
use streak_herald::decision::ThresholdTable;
use streak_herald::engine::ComparisonPolicy;
use streak_herald::ladder::{ActivityRecord, MemberId, SeasonBucket};
use streak_herald::notify::Notifier;
use streak_herald::snapshot::{StateStore, StreakSnapshot};
use streak_herald::sources::{LiveStatus, LiveStatusSource, RosterSource, StreakSource};

// --- fakes -----------------------------------------------------------------

struct FakeRoster {
    registered: Vec<MemberId>,
    names: HashMap<MemberId, String>,
    fail: bool,
}

impl FakeRoster {
    fn of(members: &[(&str, &str)]) -> Self {
        Self {
            registered: members.iter().map(|(id, _)| id.to_string()).collect(),
            names: members
                .iter()
                .map(|(id, name)| (id.to_string(), name.to_string()))
                .collect(),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            registered: Vec::new(),
            names: HashMap::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl RosterSource for FakeRoster {
    async fn registered_members(&self) -> Result<Vec<MemberId>> {
        if self.fail {
            return Err(anyhow!("roster service unavailable"));
        }
        Ok(self.registered.clone())
    }

    async fn display_names(&self) -> Result<HashMap<MemberId, String>> {
        if self.fail {
            return Err(anyhow!("roster service unavailable"));
        }
        Ok(self.names.clone())
    }
}

struct FakeStreaks {
    streaks: HashMap<MemberId, u32>,
    failing: Vec<MemberId>,
}

impl FakeStreaks {
    fn of(streaks: &[(&str, u32)]) -> Self {
        Self {
            streaks: streaks
                .iter()
                .map(|(id, s)| (id.to_string(), *s))
                .collect(),
            failing: Vec::new(),
        }
    }

    fn failing_for(mut self, member: &str) -> Self {
        self.failing.push(member.to_string());
        self
    }
}

#[async_trait]
impl StreakSource for FakeStreaks {
    async fn fetch_ladders(&self, member: &str) -> Result<Vec<SeasonBucket>> {
        if self.failing.iter().any(|m| m == member) {
            return Err(anyhow!("timeout fetching {member}"));
        }
        let streak = *self.streaks.get(member).unwrap_or(&0);
        let mut bucket = SeasonBucket::new();
        bucket.insert(
            "53".to_string(),
            vec![ActivityRecord {
                current_win_streak: streak,
                last_played: 2_000_000_000,
            }],
        );
        Ok(vec![bucket])
    }
}

enum FakeLive {
    Silent,
    Live(&'static str),
    Broken,
}

#[async_trait]
impl LiveStatusSource for FakeLive {
    async fn live_status(&self, _member: &str) -> Result<Option<LiveStatus>> {
        match self {
            FakeLive::Silent => Ok(None),
            FakeLive::Live(login) => Ok(Some(LiveStatus {
                login: login.to_string(),
                is_live: true,
            })),
            FakeLive::Broken => Err(anyhow!("stream platform down")),
        }
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, m)| m.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, channel_id: &str, message: &str) -> Result<()> {
        if self.fail {
            return Err(anyhow!("relay refused"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), message.to_string()));
        Ok(())
    }
}

// --- harness ---------------------------------------------------------------

fn test_config(state_path: PathBuf) -> AppConfig {
    AppConfig {
        workers: 4,
        recency_window_secs: 432_000,
        recency_filter: false,
        comparison: ComparisonPolicy::Strict,
        thresholds: ThresholdTable::builtin(),
        state_path,
        trigger_token: "secret".to_string(),
        cycle_budget_secs: 300,
        store_base_url: "http://store.invalid".to_string(),
        guild_api_url: "http://guild.invalid".to_string(),
        guild_id: "g".to_string(),
        bot_token: "b".to_string(),
        member_role_id: "r".to_string(),
        announce_url: "http://announce.invalid".to_string(),
        announcement_channel_id: "chan-1".to_string(),
        stream_api_url: "http://stream.invalid".to_string(),
        stream_client_id: None,
        bind_addr: "127.0.0.1:0".to_string(),
    }
}

struct Harness {
    cfg: AppConfig,
    deps: CycleDeps,
    notifier: Arc<RecordingNotifier>,
    _dir: TempDir,
}

fn harness(
    roster: FakeRoster,
    streaks: FakeStreaks,
    live: FakeLive,
    notifier: RecordingNotifier,
) -> Harness {
    let dir = TempDir::new().unwrap();
    let state_path = dir.path().join("win_streaks.json");
    let notifier = Arc::new(notifier);
    let deps = CycleDeps {
        roster: Arc::new(roster),
        streaks: Arc::new(streaks),
        live: Arc::new(live),
        notifier: Arc::clone(&notifier) as Arc<dyn Notifier>,
        store: StateStore::new(&state_path),
    };
    Harness {
        cfg: test_config(state_path),
        deps,
        notifier,
        _dir: dir,
    }
}

fn snap(entries: &[(&str, u32)]) -> StreakSnapshot {
    entries
        .iter()
        .map(|(id, s)| (id.to_string(), *s))
        .collect()
}

// --- scenarios -------------------------------------------------------------

#[tokio::test]
async fn milestone_crossing_announces_and_commits_baseline() {
    let h = harness(
        FakeRoster::of(&[("A", "Alpha"), ("B", "Bravo")]),
        FakeStreaks::of(&[("A", 4), ("B", 8)]),
        FakeLive::Silent,
        RecordingNotifier::default(),
    );
    h.deps.store.save(&snap(&[("A", 3), ("B", 8)])).await.unwrap();

    let report = run_cycle(&h.cfg, &h.deps).await.unwrap();

    assert!(!report.bootstrap);
    assert_eq!(report.announced, 1);
    assert_eq!(report.dispatch_failures, 0);
    let messages = h.notifier.messages();
    assert_eq!(messages, vec!["Alpha is on a 4 game win streak!"]);

    let baseline = h.deps.store.load().await.unwrap().unwrap();
    assert_eq!(baseline, snap(&[("A", 4), ("B", 8)]));
}

#[tokio::test]
async fn bootstrap_cycle_is_silent_but_persists() {
    let h = harness(
        FakeRoster::of(&[("A", "Alpha"), ("B", "Bravo")]),
        FakeStreaks::of(&[("A", 10), ("B", 15)]),
        FakeLive::Silent,
        RecordingNotifier::default(),
    );

    let report = run_cycle(&h.cfg, &h.deps).await.unwrap();

    assert!(report.bootstrap);
    assert_eq!(report.announced, 0);
    assert!(h.notifier.messages().is_empty());
    assert_eq!(
        h.deps.store.load().await.unwrap().unwrap(),
        snap(&[("A", 10), ("B", 15)])
    );
}

#[tokio::test]
async fn fetch_failure_drops_member_but_cycle_completes() {
    let h = harness(
        FakeRoster::of(&[("A", "Alpha"), ("B", "Bravo"), ("C", "Charlie")]),
        FakeStreaks::of(&[("A", 2), ("B", 9), ("C", 5)]).failing_for("B"),
        FakeLive::Silent,
        RecordingNotifier::default(),
    );
    h.deps.store.save(&snap(&[])).await.unwrap();

    let report = run_cycle(&h.cfg, &h.deps).await.unwrap();

    assert_eq!(report.fetched, 2);
    let baseline = h.deps.store.load().await.unwrap().unwrap();
    assert_eq!(baseline, snap(&[("A", 2), ("C", 5)]), "B absent, not zero");
}

#[tokio::test]
async fn live_member_gets_tune_in_line() {
    let h = harness(
        FakeRoster::of(&[("A", "Alpha")]),
        FakeStreaks::of(&[("A", 6)]),
        FakeLive::Live("alphastream"),
        RecordingNotifier::default(),
    );
    h.deps.store.save(&snap(&[("A", 1)])).await.unwrap();

    run_cycle(&h.cfg, &h.deps).await.unwrap();

    let messages = h.notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Killing spree! Alpha"));
    assert!(messages[0].ends_with(
        "Tune in to https://www.twitch.tv/alphastream and show your support!"
    ));
}

#[tokio::test]
async fn enrichment_failure_never_suppresses_announcement() {
    let h = harness(
        FakeRoster::of(&[("A", "Alpha")]),
        FakeStreaks::of(&[("A", 6)]),
        FakeLive::Broken,
        RecordingNotifier::default(),
    );
    h.deps.store.save(&snap(&[("A", 1)])).await.unwrap();

    let report = run_cycle(&h.cfg, &h.deps).await.unwrap();

    assert_eq!(report.announced, 1);
    assert_eq!(report.dispatch_failures, 0);
    assert_eq!(
        h.notifier.messages(),
        vec!["Killing spree! Alpha is on a 6 game win streak!"]
    );
}

#[tokio::test]
async fn delivery_failure_is_counted_but_cycle_commits() {
    let h = harness(
        FakeRoster::of(&[("A", "Alpha")]),
        FakeStreaks::of(&[("A", 4)]),
        FakeLive::Silent,
        RecordingNotifier {
            fail: true,
            ..Default::default()
        },
    );
    h.deps.store.save(&snap(&[])).await.unwrap();

    let report = run_cycle(&h.cfg, &h.deps).await.unwrap();

    assert_eq!(report.dispatch_failures, 1);
    assert_eq!(
        h.deps.store.load().await.unwrap().unwrap(),
        snap(&[("A", 4)]),
        "baseline still commits after delivery failures"
    );
}

#[tokio::test]
async fn roster_failure_is_fatal_and_leaves_state_untouched() {
    let h = harness(
        FakeRoster::failing(),
        FakeStreaks::of(&[]),
        FakeLive::Silent,
        RecordingNotifier::default(),
    );

    assert!(run_cycle(&h.cfg, &h.deps).await.is_err());
    assert!(h.deps.store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn corrupt_state_is_fatal_and_nothing_announces() {
    let h = harness(
        FakeRoster::of(&[("A", "Alpha")]),
        FakeStreaks::of(&[("A", 4)]),
        FakeLive::Silent,
        RecordingNotifier::default(),
    );
    tokio::fs::write(h.deps.store.path(), b"not json at all")
        .await
        .unwrap();

    assert!(run_cycle(&h.cfg, &h.deps).await.is_err());
    assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn unusable_state_path_fails_the_cycle() {
    let mut h = harness(
        FakeRoster::of(&[("A", "Alpha")]),
        FakeStreaks::of(&[("A", 4)]),
        FakeLive::Silent,
        RecordingNotifier::default(),
    );
    // Point the store below a regular file so the directory cannot be created.
    let blocker = h._dir.path().join("blocker");
    tokio::fs::write(&blocker, b"file").await.unwrap();
    let bad_path = blocker.join("win_streaks.json");
    h.deps.store = StateStore::new(&bad_path);
    h.cfg.state_path = bad_path;

    assert!(run_cycle(&h.cfg, &h.deps).await.is_err());
}

#[tokio::test]
async fn unregistered_guild_members_are_not_evaluated() {
    // "B" holds the role but is not registered in the store; "C" is registered
    // but lost the role. Neither is fetched.
    let h = harness(
        FakeRoster {
            registered: vec!["A".to_string(), "C".to_string()],
            names: [
                ("A".to_string(), "Alpha".to_string()),
                ("B".to_string(), "Bravo".to_string()),
            ]
            .into(),
            fail: false,
        },
        FakeStreaks::of(&[("A", 2), ("B", 4), ("C", 4)]),
        FakeLive::Silent,
        RecordingNotifier::default(),
    );

    let report = run_cycle(&h.cfg, &h.deps).await.unwrap();

    assert_eq!(report.roster_size, 1);
    assert_eq!(
        h.deps.store.load().await.unwrap().unwrap(),
        snap(&[("A", 2)])
    );
}
