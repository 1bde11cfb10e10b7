//! HTTP-level tests for the shop routes.
//!
//! Routers are driven with `oneshot`; the payment provider is replaced by an
//! in-process gateway so no request leaves the test.

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use shop_core::{
    AccountStore, MemoryAccountStore, MemoryMailer, MemoryOrderStore, NewAccount, NewOrder,
    OrderStore,
};
use shop_payments::{
    CheckoutGateway, CheckoutRequest, CheckoutSession, FulfillmentReport, FulfillmentService,
    LineItem, OrderFulfiller, PaymentError, Result, WebhookHandler, WebhookVerifier,
};
use shop_server::flash;
use shop_server::handlers::PURCHASE_FAILED_MESSAGE;
use shop_server::state::{AppState, SiteSettings};

const WEBHOOK_SECRET: &str = "whsec_test";
const CHECKOUT_URL: &str = "http://test.com";

// =============================================================================
// Test Infrastructure
// =============================================================================

#[derive(Default)]
struct MockGateway {
    created: Mutex<Vec<CheckoutRequest>>,
    retrieved: Mutex<Vec<String>>,
    reject_sessions: bool,
    line_items: Vec<u32>,
}

impl MockGateway {
    fn rejecting() -> Self {
        Self {
            reject_sessions: true,
            ..Default::default()
        }
    }

    fn with_line_items(quantities: Vec<u32>) -> Self {
        Self {
            line_items: quantities,
            ..Default::default()
        }
    }
}

#[async_trait]
impl CheckoutGateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        self.created.lock().unwrap().push(request.clone());
        Ok(CheckoutSession {
            id: "cs_test_created".into(),
            url: Some(CHECKOUT_URL.into()),
            ..Default::default()
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession> {
        self.retrieved.lock().unwrap().push(session_id.to_string());
        if self.reject_sessions {
            return Err(PaymentError::InvalidRequest(format!("No such checkout.session: '{session_id}'")));
        }
        Ok(CheckoutSession {
            id: session_id.to_string(),
            ..Default::default()
        })
    }

    async fn list_line_items(&self, _session_id: &str) -> Result<Vec<LineItem>> {
        Ok(self
            .line_items
            .iter()
            .map(|&quantity| LineItem { quantity })
            .collect())
    }
}

/// Records every session it is asked to fulfil
#[derive(Default)]
struct RecordingFulfiller {
    calls: Mutex<Vec<CheckoutSession>>,
}

#[async_trait]
impl OrderFulfiller for RecordingFulfiller {
    async fn fulfill(&self, session: &CheckoutSession) -> Result<FulfillmentReport> {
        self.calls.lock().unwrap().push(session.clone());
        Ok(FulfillmentReport::default())
    }
}

fn app_with_site(
    gateway: Arc<MockGateway>,
    fulfiller: Arc<dyn OrderFulfiller>,
    orders: Arc<MemoryOrderStore>,
    site: SiteSettings,
) -> Router {
    let verifier = WebhookVerifier::new(WEBHOOK_SECRET);
    shop_server::router(AppState {
        gateway,
        webhook: Arc::new(WebhookHandler::new(verifier, fulfiller)),
        orders,
        site,
    })
}

fn app_with(
    gateway: Arc<MockGateway>,
    fulfiller: Arc<dyn OrderFulfiller>,
    orders: Arc<MemoryOrderStore>,
    admin_token: Option<&str>,
) -> Router {
    app_with_site(
        gateway,
        fulfiller,
        orders,
        SiteSettings {
            publishable_key: "pk_test".into(),
            admin_token: admin_token.map(String::from),
            ..Default::default()
        },
    )
}

fn app(gateway: Arc<MockGateway>) -> Router {
    app_with(
        gateway,
        Arc::new(RecordingFulfiller::default()),
        Arc::new(MemoryOrderStore::new()),
        None,
    )
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn purchase_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/purchase")
        .header(header::HOST, "shop.test")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn webhook_request(payload: &[u8], signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }
    builder.body(Body::from(payload.to_vec())).unwrap()
}

fn sign(payload: &[u8]) -> String {
    WebhookVerifier::new(WEBHOOK_SECRET)
        .sign(payload, chrono::Utc::now().timestamp())
        .unwrap()
}

fn completed_event() -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "id": "evt_test",
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": "cs_test_paid",
            "customer_details": { "name": "John Doe", "email": "john.doe@example.com" },
            "shipping_details": {
                "address": { "line1": "123 Main St", "city": "Springfield", "state": "IL", "postal_code": "62701" }
            }
        }}
    }))
    .unwrap()
}

// =============================================================================
// Home
// =============================================================================

#[tokio::test]
async fn home_renders_unbound_form() {
    let response = app(Arc::new(MockGateway::default()))
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let html = body_text(response).await;
    assert!(html.contains(r#"name="quantity""#));
    assert!(html.contains(r#"value="1""#));
}

#[tokio::test]
async fn home_shows_and_clears_flash_messages() {
    let set = flash::set_cookie(&[flash::FlashMessage::error(PURCHASE_FAILED_MESSAGE)]);
    let pair = set.split(';').next().unwrap().to_string();

    let response = app(Arc::new(MockGateway::default()))
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::COOKIE, pair)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cleared.contains("Max-Age=0"));
    assert!(body_text(response).await.contains(PURCHASE_FAILED_MESSAGE));
}

// =============================================================================
// Purchase
// =============================================================================

#[tokio::test]
async fn purchase_redirects_for_every_allowed_quantity() {
    for quantity in 1..=10u32 {
        let gateway = Arc::new(MockGateway::default());
        let response = app(gateway.clone())
            .oneshot(purchase_request(&format!("quantity={quantity}")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["hx-redirect"], CHECKOUT_URL);

        let created = gateway.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].quantity, quantity);
        assert_eq!(
            created[0].success_url,
            "http://shop.test/purchase_success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(created[0].cancel_url, "http://shop.test/");
    }
}

#[tokio::test]
async fn purchase_without_quantity_rerenders_form() {
    let gateway = Arc::new(MockGateway::default());
    let response = app(gateway.clone())
        .oneshot(purchase_request(""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("hx-redirect").is_none());
    let html = body_text(response).await;
    assert!(html.contains("This field is required."));
    assert!(gateway.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn purchase_out_of_range_rerenders_form() {
    let gateway = Arc::new(MockGateway::default());
    let response = app(gateway.clone())
        .oneshot(purchase_request("quantity=11"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Ensure this value is less than or equal to 10."));
    assert!(gateway.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn purchase_without_content_type_rerenders_form() {
    let gateway = Arc::new(MockGateway::default());
    let response = app(gateway.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/purchase")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("This field is required."));
    assert!(gateway.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn purchase_multipart_without_quantity_rerenders_form() {
    let gateway = Arc::new(MockGateway::default());
    let body = "--BOUNDARY\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhi\r\n--BOUNDARY--\r\n";
    let response = app(gateway.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/purchase")
                .header(header::CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("This field is required."));
    assert!(gateway.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn purchase_uses_site_url_over_host_header() {
    let gateway = Arc::new(MockGateway::default());
    let router = app_with_site(
        gateway.clone(),
        Arc::new(RecordingFulfiller::default()),
        Arc::new(MemoryOrderStore::new()),
        SiteSettings {
            site_url: Some("https://shop.example.com".into()),
            publishable_key: "pk_test".into(),
            ..Default::default()
        },
    );

    let mut request = purchase_request("quantity=2");
    request
        .headers_mut()
        .insert(header::HOST, "attacker.test".parse().unwrap());
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let created = gateway.created.lock().unwrap();
    assert_eq!(
        created[0].success_url,
        "https://shop.example.com/purchase_success?session_id={CHECKOUT_SESSION_ID}"
    );
    assert_eq!(created[0].cancel_url, "https://shop.example.com/");
}

#[tokio::test]
async fn purchase_rejects_get() {
    let response = app(Arc::new(MockGateway::default()))
        .oneshot(Request::builder().uri("/purchase").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// Purchase success
// =============================================================================

#[tokio::test]
async fn purchase_success_renders_for_known_session() {
    let gateway = Arc::new(MockGateway::default());
    let response = app(gateway.clone())
        .oneshot(
            Request::builder()
                .uri("/purchase_success?session_id=cs_test_session_id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Thank you for your purchase!"));
    assert_eq!(*gateway.retrieved.lock().unwrap(), vec!["cs_test_session_id"]);
}

#[tokio::test]
async fn purchase_success_with_rejected_session_flashes_and_redirects() {
    let gateway = Arc::new(MockGateway::rejecting());
    let response = app(gateway)
        .oneshot(
            Request::builder()
                .uri("/purchase_success?session_id=test_session_id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/");

    let cookies: Vec<_> = response.headers().get_all(header::SET_COOKIE).iter().collect();
    assert_eq!(cookies.len(), 1);
    let messages = flash::from_set_cookie(cookies[0].to_str().unwrap());
    assert_eq!(messages.len(), 1);
    assert_eq!(
        messages[0].text,
        "There was a problem while buying your product. Please try again."
    );
}

#[tokio::test]
async fn purchase_success_without_session_id_skips_provider() {
    let gateway = Arc::new(MockGateway::default());
    let response = app(gateway.clone())
        .oneshot(Request::builder().uri("/purchase_success").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/");
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(gateway.retrieved.lock().unwrap().is_empty());
}

// =============================================================================
// Webhook
// =============================================================================

#[tokio::test]
async fn webhook_bad_signature_is_rejected_whatever_the_payload() {
    let payloads: [&[u8]; 3] = [
        b"payload",
        br#"{"type":"checkout.session.completed","data":{"object":{"id":"cs_1"}}}"#,
        b"",
    ];

    for payload in payloads {
        let fulfiller = Arc::new(RecordingFulfiller::default());
        let router = app_with(
            Arc::new(MockGateway::default()),
            fulfiller.clone(),
            Arc::new(MemoryOrderStore::new()),
            None,
        );

        let forged = WebhookVerifier::new("not_the_secret")
            .sign(payload, chrono::Utc::now().timestamp())
            .unwrap();
        let response = router
            .clone()
            .oneshot(webhook_request(payload, Some(forged.as_str())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router
            .clone()
            .oneshot(webhook_request(payload, Some("invalid_signature")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router.oneshot(webhook_request(payload, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert!(fulfiller.calls.lock().unwrap().is_empty());
    }
}

#[tokio::test]
async fn webhook_completed_checkout_fulfils_once() {
    let fulfiller = Arc::new(RecordingFulfiller::default());
    let router = app_with(
        Arc::new(MockGateway::default()),
        fulfiller.clone(),
        Arc::new(MemoryOrderStore::new()),
        None,
    );

    let payload = completed_event();
    let response = router
        .oneshot(webhook_request(&payload, Some(sign(&payload).as_str())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let calls = fulfiller.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, "cs_test_paid");
    assert_eq!(calls[0].customer_name.as_deref(), Some("John Doe"));
    assert_eq!(calls[0].customer_email.as_deref(), Some("john.doe@example.com"));
}

#[tokio::test]
async fn webhook_other_event_type_is_rejected() {
    let fulfiller = Arc::new(RecordingFulfiller::default());
    let router = app_with(
        Arc::new(MockGateway::default()),
        fulfiller.clone(),
        Arc::new(MemoryOrderStore::new()),
        None,
    );

    let payload = br#"{"id":"evt_2","type":"checkout.session.expired","data":{"object":{"id":"cs_x"}}}"#;
    let response = router
        .oneshot(webhook_request(payload, Some(sign(payload).as_str())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(fulfiller.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn webhook_end_to_end_records_orders_and_mails() {
    let gateway = Arc::new(MockGateway::with_line_items(vec![2, 3]));
    let orders = Arc::new(MemoryOrderStore::new());
    let accounts = Arc::new(MemoryAccountStore::new());
    let mailer = Arc::new(MemoryMailer::new());
    accounts
        .ensure(NewAccount::staff("staff_user@example.com"))
        .await
        .unwrap();

    let fulfillment = Arc::new(FulfillmentService::new(
        gateway.clone(),
        orders.clone(),
        accounts,
        mailer.clone(),
        "from@example.com",
    ));
    let router = app_with(gateway, fulfillment, orders.clone(), None);

    let payload = completed_event();
    let response = router
        .oneshot(webhook_request(&payload, Some(sign(&payload).as_str())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let stored = orders.all();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].quantity, 2);
    assert_eq!(stored[1].quantity, 3);
    assert_eq!(
        stored[0].shipping_details.as_deref(),
        Some("123 Main St\nSpringfield\nIL\n62701")
    );

    let outbox = mailer.outbox();
    assert_eq!(outbox.len(), 2);
    assert_eq!(outbox[0].to, vec!["john.doe@example.com"]);
    assert_eq!(outbox[1].to, vec!["staff_user@example.com"]);
}

// =============================================================================
// Static assets
// =============================================================================

#[tokio::test]
async fn stylesheet_served_from_bundled_directory() {
    let response = app(Arc::new(MockGateway::default()))
        .oneshot(Request::builder().uri("/static/shop.css").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Health & admin
// =============================================================================

#[tokio::test]
async fn health_reports_backends() {
    let response = app(Arc::new(MockGateway::default()))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["payment_gateway"], "mock");
    assert_eq!(json["orders_reachable"], true);
}

#[tokio::test]
async fn admin_orders_requires_token() {
    let orders = Arc::new(MemoryOrderStore::new());
    orders.create(NewOrder::new(4)).await.unwrap();
    let router = app_with(
        Arc::new(MockGateway::default()),
        Arc::new(RecordingFulfiller::default()),
        orders,
        Some("s3cret"),
    );

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/admin/orders").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/admin/orders")
                .header(header::AUTHORIZATION, "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/admin/orders")
                .header(header::AUTHORIZATION, "Bearer s3cret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["quantity"], 4);
}

#[tokio::test]
async fn admin_orders_absent_without_token() {
    let response = app(Arc::new(MockGateway::default()))
        .oneshot(Request::builder().uri("/admin/orders").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
