use crate::gate::{is_exempt_callback, is_exempt_text, SubscriptionGate, CACHE_TTL};
use crate::ui::buttons;
use std::time::{Duration, Instant};
use teloxide::types::UserId;

const USER: UserId = UserId(42);
const OTHER: UserId = UserId(43);

#[test]
fn verdicts_are_cached_within_the_ttl() {
    let gate = SubscriptionGate::new();
    assert_eq!(gate.cached_verdict(USER), None);

    gate.remember(USER, true);
    let now = Instant::now();
    assert_eq!(gate.verdict_at(USER, now), Some(true));
    assert_eq!(gate.verdict_at(OTHER, now), None);

    gate.remember(USER, false);
    assert_eq!(gate.verdict_at(USER, Instant::now()), Some(false));
}

#[test]
fn verdicts_expire_after_the_ttl() {
    let gate = SubscriptionGate::new();
    gate.remember(USER, true);

    let now = Instant::now();
    assert_eq!(gate.verdict_at(USER, now + CACHE_TTL - Duration::from_secs(1)), Some(true));
    assert_eq!(gate.verdict_at(USER, now + CACHE_TTL + Duration::from_secs(1)), None);
}

#[test]
fn invalidation_drops_the_verdict() {
    let gate = SubscriptionGate::new();
    gate.remember(USER, true);
    gate.invalidate(USER);
    assert_eq!(gate.cached_verdict(USER), None);
}

#[test]
fn entry_commands_are_exempt_for_everyone() {
    assert!(is_exempt_text("/start", false));
    assert!(is_exempt_text("  /cancel  ", false));
    assert!(is_exempt_text("/START", false));
    assert!(is_exempt_text("/help me please", false));
    assert!(!is_exempt_text("salom", false));
}

#[test]
fn admin_buttons_are_exempt_only_for_admins() {
    assert!(is_exempt_text(buttons::ADD_LESSON, true));
    assert!(is_exempt_text(buttons::STATS, true));
    assert!(!is_exempt_text(buttons::ADD_LESSON, false));
    assert!(!is_exempt_text(buttons::STATS, false));
}

#[test]
fn recheck_callbacks_are_exempt_for_everyone() {
    assert!(is_exempt_callback("check-sub", false));
    assert!(is_exempt_callback("faculty-back", false));
    assert!(is_exempt_callback("no-action", false));
    assert!(!is_exempt_callback("faculty@1", false));
}

#[test]
fn admin_callbacks_are_exempt_only_for_admins() {
    assert!(is_exempt_callback("addfak@3", true));
    assert!(is_exempt_callback("del-fakultet@3", true));
    assert!(is_exempt_callback("fakultetdel@3", true));
    assert!(is_exempt_callback("chan-add", true));
    assert!(!is_exempt_callback("addfak@3", false));
    assert!(!is_exempt_callback("fakultetdel@3", false));
    assert!(!is_exempt_callback("faculty@1", true));
}
