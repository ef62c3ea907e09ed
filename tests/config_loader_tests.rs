use app_access::config::ConfigLoader;
use std::{
    env, fs,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    unsafe {
        env::remove_var("APP_ACCESS_PROFILE");
        env::remove_var("APP_ACCESS_API_BIND_ADDR");
        env::remove_var("APP_ACCESS_LOG_LEVEL");
        env::remove_var("APP_ACCESS_DATABASE_URL");
        env::remove_var("APP_ACCESS_BROKER_BASE_URL");
        env::remove_var("APP_ACCESS_BROKER_API_KEY");
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();

    let dir = TempDir::new().unwrap();
    let config = ConfigLoader::with_base_dir(dir.path().to_path_buf())
        .load()
        .unwrap();

    assert_eq!(config.profile, "local");
    assert_eq!(config.api_bind_addr, "0.0.0.0:8080");
    assert_eq!(config.broker_base_url, "https://backend.composio.dev/api/v3");
    assert!(config.broker_api_key.is_none());
}

#[test]
fn env_file_values_are_applied() {
    let _guard = env_guard();
    clear_env();

    let dir = TempDir::new().unwrap();
    write_env_file(
        &dir,
        ".env",
        "APP_ACCESS_API_BIND_ADDR=127.0.0.1:9999\nAPP_ACCESS_LOG_LEVEL=debug\n",
    );

    let config = ConfigLoader::with_base_dir(dir.path().to_path_buf())
        .load()
        .unwrap();

    assert_eq!(config.api_bind_addr, "127.0.0.1:9999");
    assert_eq!(config.log_level, "debug");
}

#[test]
fn profile_specific_file_overrides_base() {
    let _guard = env_guard();
    clear_env();

    let dir = TempDir::new().unwrap();
    write_env_file(
        &dir,
        ".env",
        "APP_ACCESS_PROFILE=staging\nAPP_ACCESS_LOG_LEVEL=info\n",
    );
    write_env_file(
        &dir,
        ".env.staging",
        "APP_ACCESS_LOG_LEVEL=warn\nAPP_ACCESS_BROKER_API_KEY=ck_staging\n",
    );

    let config = ConfigLoader::with_base_dir(dir.path().to_path_buf())
        .load()
        .unwrap();

    assert_eq!(config.profile, "staging");
    assert_eq!(config.log_level, "warn");
    assert_eq!(config.broker_api_key.as_deref(), Some("ck_staging"));
}

#[test]
fn process_environment_wins_over_files() {
    let _guard = env_guard();
    clear_env();

    let dir = TempDir::new().unwrap();
    write_env_file(&dir, ".env", "APP_ACCESS_LOG_LEVEL=info\n");

    unsafe {
        env::set_var("APP_ACCESS_LOG_LEVEL", "trace");
    }
    let config = ConfigLoader::with_base_dir(dir.path().to_path_buf())
        .load()
        .unwrap();
    clear_env();

    assert_eq!(config.log_level, "trace");
}

#[test]
fn non_local_profile_without_broker_key_fails() {
    let _guard = env_guard();
    clear_env();

    let dir = TempDir::new().unwrap();
    write_env_file(&dir, ".env", "APP_ACCESS_PROFILE=production\n");

    let result = ConfigLoader::with_base_dir(dir.path().to_path_buf()).load();
    assert!(result.is_err());
}

#[test]
fn invalid_bind_addr_is_rejected() {
    let _guard = env_guard();
    clear_env();

    let dir = TempDir::new().unwrap();
    write_env_file(&dir, ".env", "APP_ACCESS_API_BIND_ADDR=not-an-addr\n");

    let result = ConfigLoader::with_base_dir(dir.path().to_path_buf()).load();
    assert!(result.is_err());
}
