//! Run Loop Tests: the engine as an observer of wallet notifications
//!
//! These tests verify:
//! 1. Initial pass on start, then one pass per notification
//! 2. A newer notification supersedes an in-flight pass
//! 3. Events are broadcast and shutdown stops the loop

use std::sync::Arc;
use std::time::Duration;
use walletgate::{
    EngineEvent, MemoryKv, NavigationLog, ScriptedWallet, SessionConfig, SessionEngine, Shutdown, SignBehavior,
    Transition, WalletProvider,
};

const ALICE: &str = "0xAA00000000000000000000000000000000000011";
const BOB: &str = "0xBB00000000000000000000000000000000000022";

struct Running {
    wallet: ScriptedWallet,
    nav: NavigationLog,
    engine: Arc<SessionEngine>,
    shutdown: Shutdown,
    task: tokio::task::JoinHandle<anyhow::Result<()>>,
}

fn start(wallet: ScriptedWallet) -> Running {
    let nav = NavigationLog::new();
    let engine = Arc::new(SessionEngine::new(
        SessionConfig::new("test"),
        Arc::new(wallet.clone()),
        Box::new(MemoryKv::new()),
        Arc::new(nav.clone()),
    ));
    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    let runner = engine.clone();
    let task = tokio::spawn(async move { runner.run(stop).await });
    Running { wallet, nav, engine, shutdown, task }
}

async fn eventually(what: &str, check: impl Fn() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

async fn stop(running: Running) {
    running.shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(2), running.task).await;
    assert!(matches!(result, Ok(Ok(Ok(())))), "engine did not stop cleanly");
}

/// Test: connected wallet at start → authenticated by the initial pass
#[tokio::test]
async fn initial_pass_authenticates() {
    let running = start(ScriptedWallet::connected(ALICE, 97));

    let view = running.engine.view();
    eventually("authentication", || view.is_authenticated()).await;
    assert_eq!(running.wallet.sign_requests(), 1);
    assert_eq!(running.nav.count(), 1);

    stop(running).await;
}

/// Test: wallet events drive passes: connect → authenticate, switch account → teardown
#[tokio::test]
async fn notifications_drive_transitions() {
    let running = start(ScriptedWallet::new());
    let mut events = running.engine.events();

    running.wallet.connect(ALICE, 97);
    let view = running.engine.view();
    eventually("authentication", || view.is_authenticated()).await;

    running.wallet.switch_account(BOB);
    eventually("teardown", || !view.is_authenticated()).await;
    eventually("wallet disconnect", || !running.wallet.state().is_connected).await;
    assert!(running.engine.stored_record().is_none());

    let mut transitions = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let EngineEvent::Transition { transition, .. } = event {
            transitions.push(transition);
        }
    }
    assert!(transitions.iter().any(|t| matches!(t, Transition::Authenticated { .. })));
    assert!(transitions.iter().any(|t| matches!(t, Transition::Disconnected { .. })));

    stop(running).await;
}

/// Test: rapid chain switch while the signature prompt is open supersedes the stale pass
#[tokio::test]
async fn newer_notification_supersedes_pending_pass() {
    let wallet = ScriptedWallet::new();
    wallet.set_sign_behavior(SignBehavior::Hold);
    let running = start(wallet);

    running.wallet.connect(ALICE, 97);
    eventually("first prompt", || running.wallet.sign_requests() == 1).await;
    assert!(running.engine.stored_record().is_none());

    running.wallet.set_sign_behavior(SignBehavior::Approve);
    running.wallet.switch_chain(11_155_111);

    let view = running.engine.view();
    eventually("authentication", || view.is_authenticated()).await;
    assert_eq!(running.engine.stored_record().map(|r| r.chain_id), Some(11_155_111));
    assert_eq!(view.user_info().map(|u| u.chain_id), Some(11_155_111));
    assert_eq!(running.wallet.sign_requests(), 2);
    // the superseded pass never redirected
    assert_eq!(running.nav.count(), 1);

    stop(running).await;
}

/// Test: failed pass is reported as an event and leaves the loop running
#[tokio::test]
async fn failures_are_reported_and_loop_continues() {
    let wallet = ScriptedWallet::new();
    wallet.set_sign_behavior(SignBehavior::Reject);
    let running = start(wallet);
    let mut events = running.engine.events();

    running.wallet.connect(ALICE, 97);
    let failed = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match events.recv().await {
                Ok(EngineEvent::Failed { error, .. }) => return error,
                Ok(_) => continue,
                Err(e) => panic!("event stream closed: {e}"),
            }
        }
    })
    .await
    .expect("failure event");
    assert!(failed.is_user_abort());
    assert_eq!(running.nav.count(), 0);

    running.wallet.set_sign_behavior(SignBehavior::Approve);
    running.wallet.switch_chain(1);
    let view = running.engine.view();
    eventually("authentication on retry", || view.is_authenticated()).await;

    stop(running).await;
}
