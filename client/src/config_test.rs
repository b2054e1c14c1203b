use super::*;
use std::sync::{Mutex, MutexGuard, PoisonError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// # Safety
/// Callers hold `ENV_LOCK` so no other test touches the environment.
unsafe fn clear_client_env() {
    unsafe {
        std::env::remove_var("VIDSHARE_API_URL");
        std::env::remove_var("VIDSHARE_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("VIDSHARE_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("VIDSHARE_PROFILE_CACHE");
    }
}

#[test]
fn from_env_uses_defaults() {
    let _env = env_lock();
    unsafe { clear_client_env() };

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg, ClientConfig::default());
    assert_eq!(cfg.api_url, "http://localhost:8000/api/v1");
    assert_eq!(cfg.timeouts.request(), Duration::from_secs(30));
}

#[test]
fn from_env_parses_overrides() {
    let _env = env_lock();
    unsafe {
        clear_client_env();
        std::env::set_var("VIDSHARE_API_URL", "https://videos.example.test/api/v1/");
        std::env::set_var("VIDSHARE_REQUEST_TIMEOUT_SECS", "5");
        std::env::set_var("VIDSHARE_CONNECT_TIMEOUT_SECS", "2");
        std::env::set_var("VIDSHARE_PROFILE_CACHE", "/tmp/vidshare/me.json");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_url, "https://videos.example.test/api/v1");
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 5, connect_secs: 2 });
    assert_eq!(cfg.profile_cache, PathBuf::from("/tmp/vidshare/me.json"));

    unsafe { clear_client_env() };
}

#[test]
fn from_env_ignores_unparseable_timeouts() {
    let _env = env_lock();
    unsafe {
        clear_client_env();
        std::env::set_var("VIDSHARE_REQUEST_TIMEOUT_SECS", "soon");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.timeouts.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);

    unsafe { clear_client_env() };
}

#[test]
fn normalize_api_url_rejects_other_schemes() {
    let err = normalize_api_url("ftp://example.test").unwrap_err().to_string();
    assert!(err.contains("must be http(s)"));
    assert!(normalize_api_url("").is_err());
}
