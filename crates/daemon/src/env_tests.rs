// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

struct EnvGuard(&'static str);

impl EnvGuard {
    fn set(name: &'static str, value: &str) -> Self {
        std::env::set_var(name, value);
        Self(name)
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        std::env::remove_var(self.0);
    }
}

#[test]
#[serial]
fn defaults_apply_when_unset() {
    assert_eq!(url(), DEFAULT_URL);
    assert_eq!(workers(), 2);
    assert_eq!(prefetch(), 1);
    assert_eq!(visibility_timeout(), Duration::from_secs(300));
    assert_eq!(ping_timeout(), Duration::from_secs(1));
    assert_eq!(max_attempts(), 3);
    assert_eq!(result_ttl(), Duration::from_secs(86_400));
}

#[test]
#[serial]
fn values_are_parsed() {
    let _a = EnvGuard::set("ERRAND_WORKERS", "8");
    let _b = EnvGuard::set("ERRAND_PING_TIMEOUT_MS", " 250 ");
    let _c = EnvGuard::set("ERRAND_URL", "tcp://0.0.0.0:7000");
    assert_eq!(workers(), 8);
    assert_eq!(ping_timeout(), Duration::from_millis(250));
    assert_eq!(url(), "tcp://0.0.0.0:7000");
}

#[yare::parameterized(
    garbage = { "many" },
    negative = { "-3" },
    zero = { "0" },
)]
#[serial]
fn bad_worker_counts_fall_back_to_something_runnable(value: &str) {
    let _g = EnvGuard::set("ERRAND_WORKERS", value);
    assert!(workers() >= 1);
}

#[test]
#[serial]
fn state_dir_prefers_explicit_override() {
    let _a = EnvGuard::set("ERRAND_STATE_DIR", "/tmp/errand-test");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/tmp/errand-test"));
}

#[test]
#[serial]
fn state_dir_falls_back_to_xdg() {
    let _a = EnvGuard::set("XDG_STATE_HOME", "/tmp/xdg");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/tmp/xdg/errand"));
}
