//! End-to-end tests for the wallet, payment, and number provisioning flows.
//!
//! Each test gets its own migrated database from `#[sqlx::test]` and runs
//! against a full router via `axum-test`, with dummy or locally-configured
//! providers injected through [`crate::test_utils`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    api::models::wallets::BalanceResponse,
    config::{PaymentConfig, StripeConfig},
    db::{
        handlers::{Numbers, Repository, Transactions, Wallets, numbers::NumberFilter},
        models::{
            numbers::{NumberCreateDBRequest, NumberType},
            transactions::{TransactionCreateDBRequest, TransactionStatus, TransactionType},
        },
    },
    payment_providers,
    telephony::{AvailableNumber, NumberSearch, ProvisionedNumber, TelephonyProvider, dummy::DummyProvider},
    test_utils::{create_test_app, create_test_user},
    types::Currency,
};

async fn balance_usd(pool: &PgPool, user_id: crate::types::UserId) -> Decimal {
    let mut conn = pool.acquire().await.unwrap();
    Wallets::new(&mut conn)
        .get_by_user(user_id)
        .await
        .unwrap()
        .map(|w| w.balance_usd)
        .unwrap_or(Decimal::ZERO)
}

async fn credit_usd(pool: &PgPool, user_id: crate::types::UserId, amount: Decimal) {
    let mut conn = pool.acquire().await.unwrap();
    let mut wallets = Wallets::new(&mut conn);
    wallets.get_or_create(user_id).await.unwrap();
    wallets.credit(user_id, amount, Currency::Usd).await.unwrap();
}

#[sqlx::test]
#[test_log::test]
async fn test_balance_endpoint_creates_zero_wallet(pool: PgPool) {
    let (user, key) = create_test_user(&pool).await;
    let server = create_test_app(pool.clone(), None, None);

    let response = server.get("/api/wallet/balance").authorization_bearer(&key).await;
    response.assert_status_ok();

    let balance: BalanceResponse = response.json();
    assert_eq!(balance.user_id, user.id);
    assert_eq!(balance.balance_usd, Decimal::ZERO);
    assert_eq!(balance.balance_inr, Decimal::ZERO);
}

#[sqlx::test]
#[test_log::test]
async fn test_wallet_requires_authentication(pool: PgPool) {
    let server = create_test_app(pool, None, None);

    let response = server.get("/api/wallet/balance").await;
    assert_eq!(response.status_code().as_u16(), 401);

    let response = server.get("/api/wallet/balance").authorization_bearer("ak-invalid").await;
    assert_eq!(response.status_code().as_u16(), 401);
}

#[sqlx::test]
#[test_log::test]
async fn test_purchase_without_provider_returns_503(pool: PgPool) {
    let (_user, key) = create_test_user(&pool).await;
    let server = create_test_app(pool, None, None);

    let response = server
        .post("/api/numbers/purchase")
        .authorization_bearer(&key)
        .json(&serde_json::json!({"phone_number": "+14155550100"}))
        .await;

    assert_eq!(response.status_code().as_u16(), 503);
}

#[sqlx::test]
#[test_log::test]
async fn test_underfunded_purchase_never_reaches_the_carrier(pool: PgPool) {
    let (user, key) = create_test_user(&pool).await;
    let telephony = Arc::new(DummyProvider::new());
    let server = create_test_app(pool.clone(), None, Some(telephony.clone()));

    let response = server
        .post("/api/numbers/purchase")
        .authorization_bearer(&key)
        .json(&serde_json::json!({"phone_number": "+14155550100"}))
        .await;

    // Empty wallet, $1.50 monthly cost
    assert_eq!(response.status_code().as_u16(), 402);
    assert_eq!(telephony.purchase_calls.load(Ordering::SeqCst), 0);

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(Numbers::new(&mut conn).count_for_user(user.id).await.unwrap(), 0);
    assert_eq!(Transactions::new(&mut conn).count_for_user(user.id).await.unwrap(), 0);
}

#[sqlx::test]
#[test_log::test]
async fn test_purchase_debits_wallet_and_writes_ledger(pool: PgPool) {
    let (user, key) = create_test_user(&pool).await;
    credit_usd(&pool, user.id, Decimal::from(5)).await;

    let telephony = Arc::new(DummyProvider::new());
    let server = create_test_app(pool.clone(), None, Some(telephony.clone()));

    let response = server
        .post("/api/numbers/purchase")
        .authorization_bearer(&key)
        .json(&serde_json::json!({
            "phone_number": "+14155550100",
            "display_name": "Front Desk"
        }))
        .await;

    response.assert_status_ok();
    assert_eq!(telephony.purchase_calls.load(Ordering::SeqCst), 1);

    // $5.00 - $1.50
    assert_eq!(balance_usd(&pool, user.id).await, Decimal::new(350, 2));

    let mut conn = pool.acquire().await.unwrap();

    let numbers = Numbers::new(&mut conn).list(&NumberFilter::for_user(user.id)).await.unwrap();
    assert_eq!(numbers.len(), 1);
    assert_eq!(numbers[0].phone_number, "+14155550100");
    assert_eq!(numbers[0].display_name.as_deref(), Some("Front Desk"));

    let mut transactions = Transactions::new(&mut conn);
    assert_eq!(transactions.count_for_user(user.id).await.unwrap(), 1);
    assert_eq!(
        transactions.completed_sum(user.id, Currency::Usd).await.unwrap(),
        Decimal::new(-150, 2)
    );
}

#[sqlx::test]
#[test_log::test]
async fn test_carrier_failure_leaves_wallet_untouched(pool: PgPool) {
    let (user, key) = create_test_user(&pool).await;
    credit_usd(&pool, user.id, Decimal::from(5)).await;

    let telephony = Arc::new(DummyProvider::failing());
    let server = create_test_app(pool.clone(), None, Some(telephony.clone()));

    let response = server
        .post("/api/numbers/purchase")
        .authorization_bearer(&key)
        .json(&serde_json::json!({"phone_number": "+14155550100"}))
        .await;

    assert_eq!(response.status_code().as_u16(), 502);
    assert_eq!(balance_usd(&pool, user.id).await, Decimal::from(5));

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(Numbers::new(&mut conn).count_for_user(user.id).await.unwrap(), 0);
    assert_eq!(Transactions::new(&mut conn).count_for_user(user.id).await.unwrap(), 0);
}

#[sqlx::test]
#[test_log::test]
async fn test_release_deletes_locally_and_calls_carrier(pool: PgPool) {
    let (user, key) = create_test_user(&pool).await;
    credit_usd(&pool, user.id, Decimal::from(5)).await;

    let telephony = Arc::new(DummyProvider::new());
    let server = create_test_app(pool.clone(), None, Some(telephony.clone()));

    let response = server
        .post("/api/numbers/purchase")
        .authorization_bearer(&key)
        .json(&serde_json::json!({"phone_number": "+14155550100"}))
        .await;
    response.assert_status_ok();
    let number: serde_json::Value = response.json();
    let number_id = number["id"].as_str().unwrap();

    let response = server
        .post(&format!("/api/numbers/{number_id}/release"))
        .authorization_bearer(&key)
        .await;
    assert_eq!(response.status_code().as_u16(), 204);
    assert_eq!(telephony.release_calls.load(Ordering::SeqCst), 1);

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(Numbers::new(&mut conn).count_for_user(user.id).await.unwrap(), 0);

    // The debit stays in the ledger even after the number is gone
    assert_eq!(Transactions::new(&mut conn).count_for_user(user.id).await.unwrap(), 1);
}

#[sqlx::test]
#[test_log::test]
async fn test_update_number_settings(pool: PgPool) {
    let (user, key) = create_test_user(&pool).await;

    let mut conn = pool.acquire().await.unwrap();
    let number = Numbers::new(&mut conn)
        .create(&NumberCreateDBRequest {
            business_id: None,
            user_id: Some(user.id),
            phone_number: "+14155550100".to_string(),
            display_name: None,
            country_code: "US".to_string(),
            number_type: NumberType::Local,
            monthly_cost: Decimal::new(150, 2),
            currency: Currency::Usd,
            provider_sid: Some("PN123".to_string()),
            voice_webhook_url: None,
            voice_enabled: true,
            sms_enabled: true,
        })
        .await
        .unwrap();
    drop(conn);

    let server = create_test_app(pool.clone(), None, None);

    let response = server
        .patch(&format!("/api/numbers/{}", number.id))
        .authorization_bearer(&key)
        .json(&serde_json::json!({"display_name": "Reception", "is_primary": true}))
        .await;
    response.assert_status_ok();

    let updated: serde_json::Value = response.json();
    assert_eq!(updated["display_name"], "Reception");
    assert_eq!(updated["is_primary"], true);
    // Untouched fields survive the partial update
    assert_eq!(updated["is_active"], true);
}

#[sqlx::test]
#[test_log::test]
async fn test_release_of_foreign_number_is_404(pool: PgPool) {
    let (owner, _owner_key) = create_test_user(&pool).await;
    let (_other, other_key) = create_test_user(&pool).await;

    let mut conn = pool.acquire().await.unwrap();
    let number = Numbers::new(&mut conn)
        .create(&NumberCreateDBRequest {
            business_id: None,
            user_id: Some(owner.id),
            phone_number: "+14155550100".to_string(),
            display_name: None,
            country_code: "US".to_string(),
            number_type: NumberType::Local,
            monthly_cost: Decimal::new(150, 2),
            currency: Currency::Usd,
            provider_sid: Some("PN123".to_string()),
            voice_webhook_url: None,
            voice_enabled: true,
            sms_enabled: true,
        })
        .await
        .unwrap();
    drop(conn);

    let server = create_test_app(pool.clone(), None, Some(Arc::new(DummyProvider::new())));

    let response = server
        .post(&format!("/api/numbers/{}/release", number.id))
        .authorization_bearer(&other_key)
        .await;
    assert_eq!(response.status_code().as_u16(), 404);
}

#[sqlx::test]
#[test_log::test]
async fn test_checkout_records_pending_transaction(pool: PgPool) {
    let (user, key) = create_test_user(&pool).await;
    let payment = Arc::new(payment_providers::dummy::DummyProvider::new(Decimal::from(25)));
    let server = create_test_app(pool.clone(), Some(payment), None);

    let response = server
        .post("/api/payment/create-checkout-session")
        .authorization_bearer(&key)
        .json(&serde_json::json!({"amount": 25, "currency": "USD"}))
        .await;
    response.assert_status_ok();

    let session: serde_json::Value = response.json();
    let session_id = session["session_id"].as_str().unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let transaction = Transactions::new(&mut conn)
        .get_by_checkout_session(session_id)
        .await
        .unwrap()
        .expect("pending transaction should exist");
    assert_eq!(transaction.status, TransactionStatus::Pending);
    assert_eq!(transaction.amount, Decimal::from(25));

    // Nothing credited until the webhook confirms payment
    assert_eq!(balance_usd(&pool, user.id).await, Decimal::ZERO);
}

#[sqlx::test]
#[test_log::test]
async fn test_confirm_settles_checkout_once(pool: PgPool) {
    let (user, key) = create_test_user(&pool).await;
    let payment = Arc::new(payment_providers::dummy::DummyProvider::new(Decimal::from(25)));
    let server = create_test_app(pool.clone(), Some(payment), None);

    let response = server
        .post("/api/payment/create-checkout-session")
        .authorization_bearer(&key)
        .json(&serde_json::json!({"amount": 25, "currency": "USD"}))
        .await;
    response.assert_status_ok();
    let session: serde_json::Value = response.json();
    let session_id = session["session_id"].as_str().unwrap().to_string();

    let response = server
        .post("/api/payment/confirm")
        .authorization_bearer(&key)
        .json(&serde_json::json!({"session_id": session_id}))
        .await;
    response.assert_status_ok();
    assert_eq!(balance_usd(&pool, user.id).await, Decimal::from(25));

    // Confirming again returns the settled row without a second credit
    let response = server
        .post("/api/payment/confirm")
        .authorization_bearer(&key)
        .json(&serde_json::json!({"session_id": session_id}))
        .await;
    response.assert_status_ok();
    assert_eq!(balance_usd(&pool, user.id).await, Decimal::from(25));

    let mut conn = pool.acquire().await.unwrap();
    let transaction = Transactions::new(&mut conn)
        .get_by_checkout_session(&session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(transaction.status, TransactionStatus::Completed);
}

#[sqlx::test]
#[test_log::test]
async fn test_confirm_unknown_session_is_404(pool: PgPool) {
    let (_user, key) = create_test_user(&pool).await;
    let payment = Arc::new(payment_providers::dummy::DummyProvider::new(Decimal::from(25)));
    let server = create_test_app(pool, Some(payment), None);

    // A well-formed session id the ledger has never seen
    let session_id = format!("dummy_session_{}_{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4());
    let response = server
        .post("/api/payment/confirm")
        .authorization_bearer(&key)
        .json(&serde_json::json!({"session_id": session_id}))
        .await;
    assert_eq!(response.status_code().as_u16(), 404);
}

#[sqlx::test]
#[test_log::test]
async fn test_checkout_rejects_nonpositive_amount(pool: PgPool) {
    let (_user, key) = create_test_user(&pool).await;
    let payment = Arc::new(payment_providers::dummy::DummyProvider::new(Decimal::from(25)));
    let server = create_test_app(pool, Some(payment), None);

    let response = server
        .post("/api/payment/create-checkout-session")
        .authorization_bearer(&key)
        .json(&serde_json::json!({"amount": 0, "currency": "USD"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
}

fn stripe_signature(secret: &str, body: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let timestamp = chrono::Utc::now().timestamp();
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.{body}").as_bytes());
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

#[sqlx::test]
#[test_log::test]
async fn test_replayed_webhook_credits_once(pool: PgPool) {
    const WEBHOOK_SECRET: &str = "whsec_test_secret";

    let (user, _key) = create_test_user(&pool).await;

    // Pending top-up waiting for the processor's confirmation
    {
        let mut conn = pool.acquire().await.unwrap();
        let wallet = Wallets::new(&mut conn).get_or_create(user.id).await.unwrap();
        Transactions::new(&mut conn)
            .create(&TransactionCreateDBRequest {
                user_id: user.id,
                wallet_id: wallet.id,
                transaction_type: TransactionType::Credit,
                amount: Decimal::from(20),
                currency: Currency::Usd,
                status: TransactionStatus::Pending,
                description: Some("Wallet top-up".to_string()),
                checkout_session_id: Some("cs_test_123".to_string()),
                payment_intent_id: None,
                number_id: None,
            })
            .await
            .unwrap();
    }

    let payment = payment_providers::create_provider(PaymentConfig::Stripe(StripeConfig {
        secret_key: "sk_test_key".to_string(),
        webhook_secret: WEBHOOK_SECRET.to_string(),
        api_base: None,
    }));
    let server = create_test_app(pool.clone(), Some(payment), None);

    let body = serde_json::json!({
        "type": "checkout.session.completed",
        "data": {"object": {"id": "cs_test_123", "payment_intent": "pi_1"}}
    })
    .to_string();

    for _ in 0..2 {
        let response = server
            .post("/api/payment/webhook")
            .add_header("stripe-signature", stripe_signature(WEBHOOK_SECRET, &body))
            .text(body.clone())
            .await;
        response.assert_status_ok();
    }

    // Replay delivered twice, credited once
    assert_eq!(balance_usd(&pool, user.id).await, Decimal::from(20));

    let mut conn = pool.acquire().await.unwrap();
    let transaction = Transactions::new(&mut conn)
        .get_by_checkout_session("cs_test_123")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(transaction.status, TransactionStatus::Completed);
}

#[sqlx::test]
#[test_log::test]
async fn test_webhook_rejects_bad_signature(pool: PgPool) {
    let (user, _key) = create_test_user(&pool).await;
    let payment = payment_providers::create_provider(PaymentConfig::Stripe(StripeConfig {
        secret_key: "sk_test_key".to_string(),
        webhook_secret: "whsec_real".to_string(),
        api_base: None,
    }));
    let server = create_test_app(pool.clone(), Some(payment), None);

    let body = serde_json::json!({
        "type": "checkout.session.completed",
        "data": {"object": {"id": "cs_test_123"}}
    })
    .to_string();

    let response = server
        .post("/api/payment/webhook")
        .add_header("stripe-signature", stripe_signature("whsec_wrong", &body))
        .text(body)
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
    assert_eq!(balance_usd(&pool, user.id).await, Decimal::ZERO);
}

#[sqlx::test]
#[test_log::test]
async fn test_failure_webhook_marks_pending_failed(pool: PgPool) {
    const WEBHOOK_SECRET: &str = "whsec_test_secret";

    let (user, _key) = create_test_user(&pool).await;
    {
        let mut conn = pool.acquire().await.unwrap();
        let wallet = Wallets::new(&mut conn).get_or_create(user.id).await.unwrap();
        Transactions::new(&mut conn)
            .create(&TransactionCreateDBRequest {
                user_id: user.id,
                wallet_id: wallet.id,
                transaction_type: TransactionType::Credit,
                amount: Decimal::from(20),
                currency: Currency::Usd,
                status: TransactionStatus::Pending,
                description: None,
                checkout_session_id: Some("cs_expired".to_string()),
                payment_intent_id: None,
                number_id: None,
            })
            .await
            .unwrap();
    }

    let payment = payment_providers::create_provider(PaymentConfig::Stripe(StripeConfig {
        secret_key: "sk_test_key".to_string(),
        webhook_secret: WEBHOOK_SECRET.to_string(),
        api_base: None,
    }));
    let server = create_test_app(pool.clone(), Some(payment), None);

    let body = serde_json::json!({
        "type": "checkout.session.expired",
        "data": {"object": {"id": "cs_expired"}}
    })
    .to_string();

    let response = server
        .post("/api/payment/webhook")
        .add_header("stripe-signature", stripe_signature(WEBHOOK_SECRET, &body))
        .text(body)
        .await;
    response.assert_status_ok();

    let mut conn = pool.acquire().await.unwrap();
    let transaction = Transactions::new(&mut conn)
        .get_by_checkout_session("cs_expired")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(transaction.status, TransactionStatus::Failed);
    assert_eq!(balance_usd(&pool, user.id).await, Decimal::ZERO);
}

/// Carrier stub whose purchase call spends from the wallet mid-flight,
/// standing in for a concurrent debit landing between the sufficiency gate
/// and the commit-time guarded debit
struct RacingCarrier {
    pool: PgPool,
    user_id: crate::types::UserId,
    drain: Decimal,
    release_calls: AtomicUsize,
}

#[async_trait::async_trait]
impl TelephonyProvider for RacingCarrier {
    async fn search_available(&self, _search: &NumberSearch) -> crate::telephony::Result<Vec<AvailableNumber>> {
        Ok(Vec::new())
    }

    async fn monthly_cost(&self, _country: &str, _number_type: NumberType) -> crate::telephony::Result<Decimal> {
        Ok(Decimal::new(150, 2))
    }

    async fn purchase_number(
        &self,
        phone_number: &str,
        _voice_webhook_url: Option<&str>,
    ) -> crate::telephony::Result<ProvisionedNumber> {
        let mut conn = self.pool.acquire().await.unwrap();
        Wallets::new(&mut conn)
            .debit(self.user_id, self.drain, Currency::Usd)
            .await
            .unwrap()
            .unwrap();
        Ok(ProvisionedNumber {
            sid: "PN-race".to_string(),
            phone_number: phone_number.to_string(),
        })
    }

    async fn release_number(&self, _provider_sid: &str) -> crate::telephony::Result<()> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[sqlx::test]
#[test_log::test]
async fn test_commit_time_insufficiency_reports_remaining_balance(pool: PgPool) {
    let (user, key) = create_test_user(&pool).await;
    credit_usd(&pool, user.id, Decimal::from(5)).await;

    let carrier = Arc::new(RacingCarrier {
        pool: pool.clone(),
        user_id: user.id,
        drain: Decimal::from(4),
        release_calls: AtomicUsize::new(0),
    });
    let server = create_test_app(pool.clone(), None, Some(carrier.clone()));

    let response = server
        .post("/api/numbers/purchase")
        .authorization_bearer(&key)
        .json(&serde_json::json!({"phone_number": "+14155550100"}))
        .await;

    // $1.00 left against a $1.50 cost: the 402 quotes the real remainder
    assert_eq!(response.status_code().as_u16(), 402);
    let message = response.text();
    assert!(message.contains("1.50 USD"), "{message}");
    assert!(message.contains("1.00 USD"), "{message}");

    // Purchase rolled back and the carrier number was released
    assert_eq!(carrier.release_calls.load(Ordering::SeqCst), 1);
    assert_eq!(balance_usd(&pool, user.id).await, Decimal::from(1));
    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(Numbers::new(&mut conn).count_for_user(user.id).await.unwrap(), 0);
}

#[sqlx::test]
#[test_log::test]
async fn test_guarded_debit_rejects_overdraw(pool: PgPool) {
    let (user, _key) = create_test_user(&pool).await;
    credit_usd(&pool, user.id, Decimal::from(1)).await;

    let mut conn = pool.acquire().await.unwrap();
    let mut wallets = Wallets::new(&mut conn);

    let result = wallets.debit(user.id, Decimal::new(150, 2), Currency::Usd).await.unwrap();
    assert!(result.is_none());

    // Balance unchanged by the rejected debit
    let wallet = wallets.get_by_user(user.id).await.unwrap().unwrap();
    assert_eq!(wallet.balance_usd, Decimal::from(1));
}

#[sqlx::test]
#[test_log::test]
async fn test_credit_then_equal_debit_restores_balance(pool: PgPool) {
    let (user, _key) = create_test_user(&pool).await;
    credit_usd(&pool, user.id, Decimal::new(237, 2)).await;

    let mut conn = pool.acquire().await.unwrap();
    let mut wallets = Wallets::new(&mut conn);
    let before = wallets.get_by_user(user.id).await.unwrap().unwrap().balance_usd;

    wallets.credit(user.id, Decimal::from(10), Currency::Usd).await.unwrap();
    wallets.debit(user.id, Decimal::from(10), Currency::Usd).await.unwrap().unwrap();

    // Exact round trip back to the starting balance
    let after = wallets.get_by_user(user.id).await.unwrap().unwrap().balance_usd;
    assert_eq!(after, before);
    assert_eq!(after, Decimal::new(237, 2));
}

#[sqlx::test]
#[test_log::test]
async fn test_currencies_are_isolated(pool: PgPool) {
    let (user, _key) = create_test_user(&pool).await;

    let mut conn = pool.acquire().await.unwrap();
    let mut wallets = Wallets::new(&mut conn);
    wallets.get_or_create(user.id).await.unwrap();
    wallets.credit(user.id, Decimal::from(500), Currency::Inr).await.unwrap();

    // A large INR balance cannot fund a USD debit
    let result = wallets.debit(user.id, Decimal::from(1), Currency::Usd).await.unwrap();
    assert!(result.is_none());

    let wallet = wallets.get_by_user(user.id).await.unwrap().unwrap();
    assert_eq!(wallet.balance_inr, Decimal::from(500));
    assert_eq!(wallet.balance_usd, Decimal::ZERO);
}

#[sqlx::test]
#[test_log::test]
async fn test_completed_sum_matches_wallet_balance(pool: PgPool) {
    let (user, _key) = create_test_user(&pool).await;

    let mut conn = pool.acquire().await.unwrap();
    let wallet = Wallets::new(&mut conn).get_or_create(user.id).await.unwrap();

    // Completed credit and debit, plus a pending credit the sum must ignore
    let rows = [
        (TransactionType::Credit, Decimal::from(10), TransactionStatus::Completed),
        (TransactionType::Debit, Decimal::new(150, 2), TransactionStatus::Completed),
        (TransactionType::Credit, Decimal::from(99), TransactionStatus::Pending),
    ];
    for (transaction_type, amount, status) in rows {
        Transactions::new(&mut conn)
            .create(&TransactionCreateDBRequest {
                user_id: user.id,
                wallet_id: wallet.id,
                transaction_type,
                amount,
                currency: Currency::Usd,
                status,
                description: None,
                checkout_session_id: None,
                payment_intent_id: None,
                number_id: None,
            })
            .await
            .unwrap();
    }

    let mut wallets = Wallets::new(&mut conn);
    wallets.credit(user.id, Decimal::from(10), Currency::Usd).await.unwrap();
    wallets.debit(user.id, Decimal::new(150, 2), Currency::Usd).await.unwrap().unwrap();

    let sum = Transactions::new(&mut conn).completed_sum(user.id, Currency::Usd).await.unwrap();
    let wallet = Wallets::new(&mut conn).get_by_user(user.id).await.unwrap().unwrap();
    assert_eq!(sum, wallet.balance_usd);
    assert_eq!(sum, Decimal::new(850, 2));
}

#[sqlx::test]
#[test_log::test]
async fn test_inbound_call_answers_known_number(pool: PgPool) {
    let (user, _key) = create_test_user(&pool).await;

    let mut conn = pool.acquire().await.unwrap();
    Numbers::new(&mut conn)
        .create(&NumberCreateDBRequest {
            business_id: None,
            user_id: Some(user.id),
            phone_number: "+14155550100".to_string(),
            display_name: Some("Acme Dental".to_string()),
            country_code: "US".to_string(),
            number_type: NumberType::Local,
            monthly_cost: Decimal::new(150, 2),
            currency: Currency::Usd,
            provider_sid: Some("PN123".to_string()),
            voice_webhook_url: None,
            voice_enabled: true,
            sms_enabled: true,
        })
        .await
        .unwrap();
    drop(conn);

    let server = create_test_app(pool, None, None);

    let response = server
        .post("/call")
        .form(&[("To", "+14155550100"), ("From", "+14155550999"), ("CallSid", "CA1")])
        .await;

    response.assert_status_ok();
    let body = response.text();
    assert!(body.contains("<Say"));
    assert!(body.contains("Acme Dental"));
}

#[sqlx::test]
#[test_log::test]
async fn test_inbound_call_rejects_unknown_number(pool: PgPool) {
    let server = create_test_app(pool, None, None);

    let response = server.post("/call").form(&[("To", "+19999999999")]).await;

    response.assert_status_ok();
    assert!(response.text().contains("<Reject/>"));
}

#[sqlx::test]
#[test_log::test]
async fn test_initial_admin_user_is_idempotent(pool: PgPool) {
    let first = crate::create_initial_admin_user("admin@test.local", Some("ak-admin-secret"), &pool)
        .await
        .unwrap();
    let second = crate::create_initial_admin_user("admin@test.local", Some("ak-admin-secret"), &pool)
        .await
        .unwrap();
    assert_eq!(first, second);

    let mut conn = pool.acquire().await.unwrap();
    let user = crate::db::handlers::Users::new(&mut conn)
        .get_by_api_key("ak-admin-secret")
        .await
        .unwrap()
        .expect("admin key should resolve");
    assert!(user.is_admin);
    assert_eq!(user.id, first);
}
