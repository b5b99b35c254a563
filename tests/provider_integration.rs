//! Integration tests for the Stripe and Twilio clients against local mock
//! servers speaking the same HTTP contract.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use secrecy::SecretString;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::time::timeout;
use uuid::Uuid;

use warmeleads::checkout::{
    CheckoutBridge, CheckoutRequest, OrderDescriptor, StripeCheckout,
};
use warmeleads::config::{StripeConfig, TwilioConfig};
use warmeleads::error::{CheckoutError, ValidationError};
use warmeleads::funnel::model::{ContactInfo, Industry};
use warmeleads::funnel::Recommendation;
use warmeleads::notify::{LeadNotifier, TwilioWhatsApp};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Requests seen by the mock, as (path, form fields).
#[derive(Clone, Default)]
struct MockState {
    existing_customer: Option<String>,
    fail_sessions: bool,
    seen: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
}

async fn list_customers(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state
        .seen
        .lock()
        .unwrap()
        .push(("GET /v1/customers".into(), query));
    let data = match state.existing_customer {
        Some(id) => vec![json!({"id": id})],
        None => vec![],
    };
    Json(json!({"object": "list", "data": data}))
}

async fn create_customer(
    State(state): State<MockState>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    state
        .seen
        .lock()
        .unwrap()
        .push(("POST /v1/customers".into(), form));
    Json(json!({"id": "cus_new"}))
}

async fn create_checkout_session(
    State(state): State<MockState>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    state
        .seen
        .lock()
        .unwrap()
        .push(("POST /v1/checkout/sessions".into(), form));
    if state.fail_sessions {
        return (
            StatusCode::PAYMENT_REQUIRED,
            Json(json!({"error": {"message": "Your card was declined."}})),
        )
            .into_response();
    }
    Json(json!({"id": "cs_test_123", "url": "https://checkout.stripe.test/cs_test_123"}))
        .into_response()
}

async fn twilio_messages(
    State(state): State<MockState>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    state
        .seen
        .lock()
        .unwrap()
        .push(("POST twilio".into(), form));
    (StatusCode::CREATED, Json(json!({"sid": "SM123"})))
}

async fn start_mock(state: MockState) -> String {
    let app = Router::new()
        .route("/v1/customers", get(list_customers).post(create_customer))
        .route("/v1/checkout/sessions", post(create_checkout_session))
        .route(
            "/2010-04-01/Accounts/{sid}/Messages.json",
            post(twilio_messages),
        )
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("http://127.0.0.1:{port}")
}

fn stripe(base: &str) -> StripeCheckout {
    StripeCheckout::new(StripeConfig {
        secret_key: SecretString::from("sk_test_dummy".to_string()),
        api_base: base.to_string(),
        success_url: "https://warmeleads.test/ok".into(),
        cancel_url: "https://warmeleads.test/cancel".into(),
    })
}

fn request(email: &str) -> CheckoutRequest {
    CheckoutRequest {
        amount: 106_250,
        currency: "eur".into(),
        customer: ContactInfo {
            name: "Lotte".into(),
            email: email.into(),
            phone: "+31612345678".into(),
            company: "Lotte Energie".into(),
        },
        order: OrderDescriptor {
            package: Recommendation::Exclusieve,
            quantity: 25,
            industry: Some(Industry::HomeBatteries),
            conversation_id: Uuid::new_v4(),
        },
    }
}

#[tokio::test]
async fn stripe_creates_customer_and_session() {
    timeout(TEST_TIMEOUT, async {
        let state = MockState::default();
        let base = start_mock(state.clone()).await;

        let session = stripe(&base)
            .create_session(&request("lotte@energie.nl"))
            .await
            .unwrap();
        assert_eq!(session.session_id, "cs_test_123");
        assert_eq!(session.url, "https://checkout.stripe.test/cs_test_123");

        let seen = state.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].0, "GET /v1/customers");
        assert_eq!(seen[0].1["email"], "lotte@energie.nl");
        assert_eq!(seen[1].0, "POST /v1/customers");
        assert_eq!(seen[1].1["metadata[company]"], "Lotte Energie");

        let form = &seen[2].1;
        assert_eq!(form["customer"], "cus_new");
        assert_eq!(form["mode"], "payment");
        assert_eq!(form["line_items[0][price_data][unit_amount]"], "106250");
        assert_eq!(form["line_items[0][price_data][currency]"], "eur");
        assert_eq!(
            form["line_items[0][price_data][product_data][name]"],
            "25x Exclusieve leads (Thuisbatterijen)"
        );
        assert_eq!(form["metadata[package]"], "exclusieve");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn stripe_reuses_existing_customer() {
    timeout(TEST_TIMEOUT, async {
        let state = MockState {
            existing_customer: Some("cus_existing".into()),
            ..Default::default()
        };
        let base = start_mock(state.clone()).await;

        stripe(&base)
            .create_session(&request("lotte@energie.nl"))
            .await
            .unwrap();

        let seen = state.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].0, "POST /v1/checkout/sessions");
        assert_eq!(seen[1].1["customer"], "cus_existing");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn stripe_error_message_is_surfaced() {
    timeout(TEST_TIMEOUT, async {
        let state = MockState {
            fail_sessions: true,
            ..Default::default()
        };
        let base = start_mock(state).await;

        let err = stripe(&base)
            .create_session(&request("lotte@energie.nl"))
            .await
            .unwrap_err();
        match err {
            CheckoutError::Provider {
                status, message, ..
            } => {
                assert_eq!(status, 402);
                assert_eq!(message, "Your card was declined.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn stripe_validates_before_any_request() {
    timeout(TEST_TIMEOUT, async {
        let state = MockState::default();
        let base = start_mock(state.clone()).await;

        let err = stripe(&base)
            .create_session(&request(""))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Validation(ValidationError::MissingContactField("email"))
        ));
        assert!(!err.is_retryable());
        assert!(state.seen.lock().unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn stripe_unreachable_is_retryable() {
    timeout(TEST_TIMEOUT, async {
        // Bind and drop to get a port with nothing listening.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = stripe(&format!("http://127.0.0.1:{port}"))
            .create_session(&request("lotte@energie.nl"))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::RequestFailed { .. }));
        assert!(err.is_retryable());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn whatsapp_notifies_every_recipient() {
    timeout(TEST_TIMEOUT, async {
        let state = MockState::default();
        let base = start_mock(state.clone()).await;

        let notifier = TwilioWhatsApp::new(TwilioConfig {
            account_sid: "AC123".into(),
            auth_token: SecretString::from("token".to_string()),
            from_number: "+14155238886".into(),
            to_numbers: vec!["+31611111111".into(), "whatsapp:+31622222222".into()],
            api_base: base,
        });

        notifier.notify("Nieuwe lead").await.unwrap();

        let seen = state.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].1["From"], "whatsapp:+14155238886");
        assert_eq!(seen[0].1["To"], "whatsapp:+31611111111");
        assert_eq!(seen[1].1["To"], "whatsapp:+31622222222");
        assert_eq!(seen[1].1["Body"], "Nieuwe lead");
    })
    .await
    .expect("test timed out");
}
