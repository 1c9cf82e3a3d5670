//! End-to-end scoring scenarios
//!
//! Each test drives the engine through one realistic transfer and checks the
//! reasons, level and action the pipeline would act on.

mod common;

use chrono::Duration;
use common::{
    browser, established_user, transfer, unavailable_engine, AssessmentAssertions, TestEngine,
    AFTERNOON,
};
use txguard_sdk::{Action, HistoryQuery, Metrics, RiskLevel, UserContext};

// ============================================================================
// Baseline
// ============================================================================

#[tokio::test]
async fn test_round_amount_from_known_device_is_approved() {
    let t = TestEngine::at(AFTERNOON);
    let device = browser();
    t.register_device("alice", &device).await;

    let assessment = t
        .assess(
            transfer("tx-a", "alice", 1000.0),
            established_user("alice", t.now_utc()),
            device,
        )
        .await;

    assert_eq!(assessment.reasons, vec!["Round number transaction"]);
    // 0.3 amount points at weight 0.20
    assessment.assert_score(0.06);
    assessment.assert_level(RiskLevel::Low);
    assessment.assert_action(Action::Approve);
    assert!(!assessment.requires_review);
}

#[tokio::test]
async fn test_first_transfer_flags_new_device_only() {
    let t = TestEngine::at(AFTERNOON);

    let assessment = t
        .assess(
            transfer("tx-1", "bob", 240.0),
            established_user("bob", t.now_utc()),
            browser(),
        )
        .await;

    assert_eq!(assessment.reasons, vec!["New device detected"]);
    assessment.assert_action(Action::Approve);
}

// ============================================================================
// Hard stops
// ============================================================================

#[tokio::test]
async fn test_large_transfer_to_disallowed_country_is_blocked() {
    let t = TestEngine::at(AFTERNOON);

    let assessment = t
        .assess(
            transfer("tx-b", "carol", 15_000.0)
                .with_recipient_country("KP")
                .with_kyc_verified(false),
            established_user("carol", t.now_utc()),
            browser(),
        )
        .await;

    assert!(assessment.score >= 0.8, "score {}", assessment.score);
    assessment.assert_level(RiskLevel::High);
    assessment.assert_action(Action::Block);
    assert!(assessment.requires_review);
    assessment.assert_has_reason("Amount exceeds single transaction limit");
    assessment.assert_has_reason("Recipient country not in allowed list");
    assessment.assert_has_reason("New device detected");
    assert!(!assessment.is_fail_safe());
}

// ============================================================================
// Velocity
// ============================================================================

#[tokio::test]
async fn test_burst_of_transfers_trips_velocity() {
    let t = TestEngine::at("2024-03-15T13:10:00+00:00");
    let user = established_user("dave", t.now_utc());
    let device = browser();

    for i in 0..4 {
        let assessment = t
            .assess(
                transfer(&format!("tx-c{}", i), "dave", 180.0),
                user.clone(),
                device.clone(),
            )
            .await;
        assessment.assert_lacks_reason("High transaction velocity detected");
        t.clock.advance(Duration::minutes(10));
    }

    // Four transfers recorded between 13:10 and 13:40; this one is at 13:50
    let assessment = t
        .assess(transfer("tx-c4", "dave", 180.0), user, device)
        .await;
    assessment.assert_has_reason("High transaction velocity detected");
    assert_eq!(assessment.reasons, vec!["High transaction velocity detected"]);
    // 0.5 velocity points at weight 0.25
    assessment.assert_score(0.125);
}

#[tokio::test]
async fn test_daily_limits_use_recorded_history() {
    let t = TestEngine::at(AFTERNOON);
    let device = browser();
    t.register_device("erin", &device).await;
    for i in 0..10 {
        t.seed_history("erin", 4_900.0, 90 + i * 20).await;
    }

    let assessment = t
        .assess(
            transfer("tx-d", "erin", 1_500.0),
            established_user("erin", t.now_utc()),
            device,
        )
        .await;

    assert_eq!(
        assessment.reasons,
        vec![
            "Daily amount limit exceeded",
            "Daily transaction limit exceeded"
        ]
    );
    assessment.assert_score(0.25);
}

// ============================================================================
// Behavior
// ============================================================================

#[tokio::test]
async fn test_new_account_large_unverified_transfer() {
    let t = TestEngine::at(AFTERNOON);
    let device = browser();
    t.register_device("frank", &device).await;
    let user = UserContext::new("frank")
        .with_country("US")
        .with_created_at(t.now_utc() - Duration::days(2));

    let assessment = t
        .assess(
            transfer("tx-e", "frank", 6_000.0).with_kyc_verified(false),
            user,
            device,
        )
        .await;

    assessment.assert_has_reason("Large transaction without KYC verification");
    assessment.assert_has_reason("New account (less than 7 days old)");
    // 0.9 behavioral at 0.20; 6000 is also a round amount (0.3 at 0.20)
    assessment.assert_score(0.24);
    assessment.assert_action(Action::Approve);
}

#[tokio::test]
async fn test_night_transfer_from_bot_on_private_network() {
    let t = TestEngine::at("2024-03-15T23:30:00-05:00");
    let device = txguard_sdk::DeviceContext::new("HeadlessChrome/121.0 (puppeteer)", "10.8.0.4");

    let assessment = t
        .assess(
            transfer("tx-f", "gina", 350.0),
            established_user("gina", t.now_utc()),
            device,
        )
        .await;

    assert_eq!(
        assessment.reasons,
        vec![
            "New device detected",
            "Bot-like user agent detected",
            "Private IP address detected",
            "Transaction during suspicious time window"
        ]
    );
    // device saturates at 1.0 (0.20) + behavioral 0.3 (0.06)
    assessment.assert_score(0.26);
}

// ============================================================================
// Degraded store
// ============================================================================

#[tokio::test]
async fn test_unavailable_store_degrades_but_still_scores() {
    let engine = unavailable_engine(AFTERNOON);
    let now = chrono::DateTime::parse_from_rfc3339(AFTERNOON)
        .unwrap()
        .with_timezone(&chrono::Utc);

    let assessment = engine
        .assess(
            transfer("tx-g", "hank", 250.0),
            established_user("hank", now),
            browser(),
        )
        .await;

    assert!(!assessment.is_fail_safe());
    assert_eq!(
        assessment.reasons,
        vec![
            "Unable to verify transaction history",
            "Unable to verify device information"
        ]
    );
    // 0.3 at 0.25 + 0.3 at 0.20
    assessment.assert_score(0.135);
    assessment.assert_action(Action::Approve);

    let metrics = engine.metrics().unwrap();
    assert_eq!(metrics.counter("degraded_velocity").get(), 1);
    assert_eq!(metrics.counter("degraded_device").get(), 1);
    assert_eq!(metrics.counter("fail_safe_total").get(), 0);

    // Nothing could be persisted; history reads surface the store error
    assert!(engine.get_history(&HistoryQuery::all()).await.is_err());
}
