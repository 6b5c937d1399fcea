//! Store Tests: file-backed session persistence across engine restarts

use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use walletgate::{
    FileKv, NavigationLog, ScriptedWallet, SessionConfig, SessionEngine, SessionStore, Transition,
};

static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

fn lock_env() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner())
}

const ALICE: &str = "0x12D79D457E935110a5fD52351490063Eff3bcD22";

fn engine(app: &str, wallet: &ScriptedWallet) -> SessionEngine {
    SessionEngine::new(
        SessionConfig::new(app),
        Arc::new(wallet.clone()),
        Box::new(FileKv::for_app(app)),
        Arc::new(NavigationLog::new()),
    )
}

/// Test: app data dir honours WALLETGATE_ROOT
#[test]
fn file_store_lives_under_root() {
    let _guard = lock_env();
    let dir = TempDir::new().expect("tempdir");
    std::env::set_var("WALLETGATE_ROOT", dir.path());

    let kv = FileKv::for_app("dapp");
    assert_eq!(kv.dir(), dir.path().join("dapp").join("data"));
}

/// Test: session authenticated in one engine resumes in the next ("page reload")
#[test]
fn session_survives_restart() {
    let _guard = lock_env();
    let dir = TempDir::new().expect("tempdir");
    std::env::set_var("WALLETGATE_ROOT", dir.path());

    let rt = tokio::runtime::Runtime::new().expect("runtime");
    rt.block_on(async {
        let wallet = ScriptedWallet::connected(ALICE, 97);
        let first = engine("reload", &wallet);
        assert!(matches!(first.reconcile().await, Ok(Transition::Authenticated { .. })));
        drop(first);

        let raw = std::fs::read_to_string(dir.path().join("reload/data/userAccount.json")).expect("record file");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["shortAddress"], "0x12D79D...3bcD22");

        let second = engine("reload", &wallet);
        assert!(matches!(second.reconcile().await, Ok(Transition::Resumed { .. })));
        assert_eq!(wallet.sign_requests(), 1);
        assert_eq!(second.view().short_address().as_deref(), Some("0x12D79D...3bcD22"));
    });
}

/// Test: corrupted file on disk is ignored, then replaced on next authentication
#[test]
fn corrupted_file_is_replaced() {
    let _guard = lock_env();
    let dir = TempDir::new().expect("tempdir");
    std::env::set_var("WALLETGATE_ROOT", dir.path());

    let data = dir.path().join("corrupt/data");
    std::fs::create_dir_all(&data).expect("mkdir");
    std::fs::write(data.join("userAccount.json"), "{{{").expect("write");

    let store = SessionStore::new(Box::new(FileKv::for_app("corrupt")));
    assert!(store.load().is_none());
    assert!(store.try_load().is_err());

    let rt = tokio::runtime::Runtime::new().expect("runtime");
    rt.block_on(async {
        let wallet = ScriptedWallet::connected(ALICE, 11_155_111);
        let engine = engine("corrupt", &wallet);
        assert!(matches!(engine.reconcile().await, Ok(Transition::Authenticated { .. })));
    });
    assert_eq!(store.load().map(|r| r.chain_id), Some(11_155_111));
}
