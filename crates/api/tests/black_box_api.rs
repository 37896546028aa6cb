use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use totes_api::app::{AppState, build_app};
use totes_auth::{ACTIVE_STATE, INACTIVE_STATE, JwtClaims, PermissionId, PermissionRegistry, Role, User, UserType, hash_password};
use totes_core::EntityId;
use totes_infra::seed::{AdminAccount, seed};
use totes_infra::{AuditEntry, AuditError, AuditLog, InMemoryAuditLog, Services};

const JWT_SECRET: &str = "test-secret";
const ADMIN: &str = "root@totes.test";
const ADMIN_PASSWORD: &str = "root-password";
const CLERK: &str = "clerk@totes.test";
const CLERK_PASSWORD: &str = "clerk-password";
// Lowest cost bcrypt accepts.
const TEST_COST: u32 = 4;

struct TestServer {
    base_url: String,
    services: Services,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> (Self, Arc<InMemoryAuditLog>) {
        let audit = Arc::new(InMemoryAuditLog::new());
        (Self::spawn_with_log(audit.clone()).await, audit)
    }

    /// Same router as prod over in-memory storage, on an ephemeral port.
    async fn spawn_with_log(audit_log: Arc<dyn AuditLog>) -> Self {
        let services = Services::in_memory();
        let registry = PermissionRegistry::with_defaults();
        let admin = AdminAccount { email: ADMIN.into(), password: ADMIN_PASSWORD.into(), bcrypt_cost: TEST_COST };
        seed(&services, &registry, Some(admin)).await.expect("seeding failed");
        add_clerk(&services, &registry).await;

        let state = AppState::new(
            services.clone(),
            audit_log,
            registry,
            JWT_SECRET,
            ChronoDuration::minutes(10),
            TEST_COST,
        );
        let app = build_app(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, services, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A user whose only permission is listing customers.
async fn add_clerk(services: &Services, registry: &PermissionRegistry) {
    let role = Role::new("clerk", "", vec![registry.code(PermissionId::GetAllCustomers)]).unwrap();
    let role = services.roles.create(role).await.unwrap();
    let user_type = services.user_types.create(UserType::new("front desk", "", vec![role.id]).unwrap()).await.unwrap();
    let hash = hash_password(CLERK_PASSWORD, TEST_COST).unwrap();
    let user = User::new(CLERK, hash, user_type.id, EntityId::new(ACTIVE_STATE).unwrap()).unwrap();
    services.users.create(user).await.unwrap();
}

fn mint_jwt(sub: &str) -> String {
    let now = Utc::now();
    let claims = JwtClaims { sub: sub.to_string(), issued_at: now, expires_at: now + ChronoDuration::minutes(10) };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn customer(personal_id: &str) -> Value {
    json!({
        "customer_name": "Lucia",
        "last_name": "Mora",
        "customer_id": personal_id,
        "email": "lucia@example.com",
        "identifier_type_id": 1
    })
}

struct FailingAuditLog;

#[async_trait::async_trait]
impl AuditLog for FailingAuditLog {
    async fn append(&self, _entry: AuditEntry) -> Result<(), AuditError> {
        Err(AuditError("audit store unavailable".into()))
    }
}

#[tokio::test]
async fn health_is_open() {
    let (srv, audit) = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(audit.entries().is_empty());
}

#[tokio::test]
async fn anonymous_requests_are_audited_then_denied() {
    let (srv, audit) = TestServer::spawn().await;

    let res = reqwest::get(srv.url("/customers")).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "permission denied: GET_ALL_CUSTOMERS");

    let entries = audit.entries();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.principal == "anonymous"));
    assert_eq!(entries[0].message, "Attempting to list customers");
    assert_eq!(entries[1].message, "Access denied for list customers");
}

#[tokio::test]
async fn invalid_tokens_are_rejected_before_the_pipeline() {
    let (srv, audit) = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/customers")).bearer_auth("not-a-jwt").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(srv.url("/customers"))
        .header("Authorization", "Basic cm9vdDpwdw==")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(audit.entries().is_empty());
}

#[tokio::test]
async fn failed_attempt_log_aborts_before_anything_runs() {
    let srv = TestServer::spawn_with_log(Arc::new(FailingAuditLog)).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/customers"))
        .bearer_auth(mint_jwt(ADMIN))
        .json(&customer("CC-500"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(srv.services.customers.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_permission_creates_nothing() {
    let (srv, audit) = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(CLERK);

    let res = client.get(srv.url("/customers")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(srv.url("/users"))
        .bearer_auth(&token)
        .json(&json!({ "email": "new@totes.test", "password": "pw-123456", "user_type_id": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(srv.services.users.find_by_key("email", "new@totes.test").await.is_err());

    let last = audit.entries().pop().unwrap();
    assert_eq!(last.principal, CLERK);
    assert_eq!(last.message, "Access denied for create user");
}

#[tokio::test]
async fn customer_lifecycle_maps_errors_to_statuses() {
    let (srv, _audit) = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(ADMIN);

    let res = client.post(srv.url("/customers")).bearer_auth(&token).json(&customer("CC-1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert!(id > 0);

    let res = client.post(srv.url("/customers")).bearer_auth(&token).json(&customer("CC-1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .post(srv.url("/customers"))
        .bearer_auth(&token)
        .json(&json!({ "customer_name": "Lucia" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(srv.url(&format!("/customers/{id}"))).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = client.get(srv.url("/customers/999")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = client.get(srv.url("/customers/abc")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(srv.url("/customers/search/last_name?q=MOR")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let found: Vec<Value> = res.json().await.unwrap();
    assert_eq!(found.len(), 1);
    let res = client.get(srv.url("/customers/search/last_name?q=zz")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = client.get(srv.url("/customers/search/last_name")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(srv.url("/customers/customer-id/CC-1")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn concurrent_creates_of_one_key_yield_one_winner() {
    let (srv, _audit) = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(ADMIN);

    let send = || client.post(srv.url("/customers")).bearer_auth(&token).json(&customer("CC-race")).send();
    let (a, b) = tokio::join!(send(), send());
    let mut statuses = [a.unwrap().status(), b.unwrap().status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);
    assert_eq!(srv.services.customers.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn login_issues_usable_tokens() {
    let (srv, _audit) = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/login"))
        .json(&json!({ "email": ADMIN, "password": ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    let res = client.get(srv.url("/users")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let users: Vec<Value> = res.json().await.unwrap();
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));

    let res = client
        .post(srv.url("/login"))
        .json(&json!({ "email": ADMIN, "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(srv.url("/login"))
        .json(&json!({ "email": "ghost@totes.test", "password": "whatever" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.post(srv.url("/login")).body("{").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn inactive_users_cannot_log_in_or_act() {
    let (srv, _audit) = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let clerk = srv.services.users.find_by_key("email", CLERK).await.unwrap();
    let res = client
        .patch(srv.url(&format!("/users/{}/state", clerk.id)))
        .bearer_auth(mint_jwt(ADMIN))
        .json(&json!({ "user_state_type_id": INACTIVE_STATE }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(srv.url("/login"))
        .json(&json!({ "email": CLERK, "password": CLERK_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.get(srv.url("/customers")).bearer_auth(mint_jwt(CLERK)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn check_permission_requires_a_caller() {
    let (srv, _audit) = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let code = PermissionRegistry::with_defaults().code(PermissionId::GetAllCustomers);
    let path = format!("/auth/check-permission?email={CLERK}&permission_id={code}");

    let res = client.get(srv.url(&path)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.get(srv.url(&path)).bearer_auth(mint_jwt(CLERK)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["has_permission"], true);

    let res = client
        .get(srv.url(&format!("/auth/check-permission?email={CLERK}&permission_id=x")))
        .bearer_auth(mint_jwt(CLERK))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(srv.url("/auth/explain?permission=CREATE_USER"))
        .bearer_auth(mint_jwt(CLERK))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["granted"], false);
    assert_eq!(body["denial_reason"]["kind"], "missing_permission");
}

#[tokio::test]
async fn billing_and_invoicing_compute_totals_server_side() {
    let (srv, _audit) = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(ADMIN);

    let post = |path: &str, body: Value| client.post(srv.url(path)).bearer_auth(&token).json(&body).send();

    let item: Value = post("/items", json!({ "name": "Filter", "stock": 5, "selling_price": 1000, "item_type_id": 1 }))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let item_id = item["id"].as_i64().unwrap();
    let discount: Value = post("/discount-types", json!({ "name": "Loyal", "adjustment": { "kind": "percentage", "basis_points": 1000 } }))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let tax: Value = post("/tax-types", json!({ "name": "VAT", "adjustment": { "kind": "percentage", "basis_points": 1900 } }))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let res = post("/billing/subtotal", json!([{ "id": item_id, "stock": 3 }])).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap()["subtotal"], 3000);

    // 3000 - 10% = 2700; + 19% = 3213
    let res = post(
        "/billing/total",
        json!({ "items": [{ "id": item_id, "stock": 3 }], "discount_type_ids": [discount["id"]], "tax_type_ids": [tax["id"]] }),
    )
    .await
    .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap()["total"], 3213);

    let res = post("/billing/subtotal", json!([{ "id": 999, "stock": 1 }])).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = post("/billing/subtotal", json!([{ "id": item_id, "stock": 0 }])).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let buyer: Value = post("/customers", customer("CC-9")).await.unwrap().json().await.unwrap();
    let draft = |quantity: i64| {
        json!({
            "enterprise_data": "Totes Ltd",
            "customer_id": buyer["id"],
            "items": [{ "id": item_id, "stock": quantity }],
            "tax_type_ids": [tax["id"]]
        })
    };

    let res = post("/invoices", draft(6)).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = post("/invoices", draft(2)).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let invoice: Value = res.json().await.unwrap();
    assert_eq!(invoice["subtotal"], 2000);
    assert_eq!(invoice["total"], 2380);
    assert_eq!(invoice["customer_personal_id"], "CC-9");

    // Stock is checked, not consumed.
    let res = client.get(srv.url(&format!("/items/{item_id}/stock?quantity=5"))).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.json::<Value>().await.unwrap()["has_enough_stock"], true);
}

#[tokio::test]
async fn a_time_slot_holds_three_appointments() {
    let (srv, _audit) = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(ADMIN);

    let book = |customer_id: i64| {
        client
            .post(srv.url("/appointments"))
            .bearer_auth(&token)
            .json(&json!({ "date_time": "2024-05-02T10:00:00", "customer_id": customer_id }))
            .send()
    };
    for customer_id in 1..=3 {
        assert_eq!(book(customer_id).await.unwrap().status(), StatusCode::CREATED);
    }
    assert_eq!(book(4).await.unwrap().status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(srv.url("/appointments/hourly-count?date=2024-05-02"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["appointments_per_hour"], json!([{ "hour": 10, "count": 3 }]));

    let res = client
        .get(srv.url("/appointments/by-customer-and-date?customer_id=2&date_time=2024-05-02%2010:00:00"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap()["customer_id"], 2);
}

#[tokio::test]
async fn undecodable_path_ids_are_audited_like_any_other_input() {
    let (srv, audit) = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/customers/%FF")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let entries = audit.entries();
    assert_eq!(entries.len(), 2);
    assert!(entries[1].message.starts_with("Access denied for get customer"));

    let res = client.get(srv.url("/customers/%FF")).bearer_auth(mint_jwt(ADMIN)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let last = audit.entries().pop().unwrap();
    assert_eq!(last.principal, ADMIN);
    assert!(last.message.starts_with("Invalid request for get customer"));
}

#[tokio::test]
async fn customer_updates_cannot_take_anothers_identifier() {
    let (srv, _audit) = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(ADMIN);

    let first: Value =
        client.post(srv.url("/customers")).bearer_auth(&token).json(&customer("CC-1")).send().await.unwrap().json().await.unwrap();
    client.post(srv.url("/customers")).bearer_auth(&token).json(&customer("CC-2")).send().await.unwrap();

    let path = format!("/customers/{}", first["id"]);
    let res = client.put(srv.url(&path)).bearer_auth(&token).json(&customer("CC-2")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let res = client.put(srv.url(&path)).bearer_auth(&token).json(&customer("CC-1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = client.put(srv.url("/customers/999")).bearer_auth(&token).json(&customer("CC-1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn additional_expenses_can_be_edited_and_removed() {
    let (srv, _audit) = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(ADMIN);

    let item: Value = client
        .post(srv.url("/items"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Filter", "stock": 5, "selling_price": 1000, "item_type_id": 1 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let expense = |amount: i64| json!({ "name": "Shipping", "item_id": item["id"], "expense": amount, "description": "courier" });

    let res = client.post(srv.url("/additional-expenses")).bearer_auth(&token).json(&expense(300)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    let path = format!("/additional-expenses/{}", created["id"]);

    let res = client.put(srv.url(&path)).bearer_auth(&token).json(&expense(450)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap()["expense"], 450);
    let res = client.put(srv.url(&path)).bearer_auth(&token).json(&expense(-1)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let res = client.put(srv.url("/additional-expenses/999")).bearer_auth(&token).json(&expense(1)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.delete(srv.url(&path)).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.json::<Value>().await.unwrap()["message"].is_string());
    let res = client.delete(srv.url(&path)).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = client.get(srv.url(&path)).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn moving_an_appointment_respects_the_slot_limit() {
    let (srv, _audit) = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(ADMIN);

    let at = |date_time: &str, customer_id: i64| json!({ "date_time": date_time, "customer_id": customer_id });
    let mut booked = Vec::new();
    for customer_id in 1..=3 {
        let res = client
            .post(srv.url("/appointments"))
            .bearer_auth(&token)
            .json(&at("2024-05-02T10:00:00", customer_id))
            .send()
            .await
            .unwrap();
        booked.push(res.json::<Value>().await.unwrap()["id"].as_i64().unwrap());
    }
    let res = client
        .post(srv.url("/appointments"))
        .bearer_auth(&token)
        .json(&at("2024-05-02T11:00:00", 4))
        .send()
        .await
        .unwrap();
    let later = res.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let res = client
        .put(srv.url(&format!("/appointments/{later}")))
        .bearer_auth(&token)
        .json(&at("2024-05-02T10:00:00", 4))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Staying in a full slot is not a new booking.
    let res = client
        .put(srv.url(&format!("/appointments/{}", booked[0])))
        .bearer_auth(&token)
        .json(&at("2024-05-02T10:00:00", 7))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .put(srv.url("/appointments/999"))
        .bearer_auth(&token)
        .json(&at("2024-05-02T12:00:00", 4))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn external_sales_register_unknown_buyers_once() {
    let (srv, _audit) = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(ADMIN);

    let item: Value = client
        .post(srv.url("/items"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Filter", "stock": 5, "selling_price": 1000, "item_type_id": 1 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let report = |item_id: &Value| {
        let mut body = customer("CC-77");
        body["reporter_name"] = json!("Ferreteria Sol");
        body["reporter_id"] = json!("NIT-77");
        body["item_id"] = item_id.clone();
        body["stock"] = json!(2);
        body
    };

    let res = client.post(srv.url("/external-sales")).bearer_auth(&token).json(&report(&item["id"])).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let sale: Value = res.json().await.unwrap();
    assert_eq!(sale["item_name"], "Filter");
    assert_eq!(sale["customer_email"], "lucia@example.com");

    let res = client.post(srv.url("/external-sales")).bearer_auth(&token).json(&report(&item["id"])).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.json::<Value>().await.unwrap()["customer_id"], sale["customer_id"]);
    assert_eq!(srv.services.customers.list().await.unwrap().len(), 1);

    let res = client.post(srv.url("/external-sales")).bearer_auth(&token).json(&report(&json!(999))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.get(srv.url("/external-sales")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.json::<Vec<Value>>().await.unwrap().len(), 2);
    let res = client.get(srv.url(&format!("/external-sales/{}", sale["id"]))).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url("/external-sales")).bearer_auth(mint_jwt(CLERK)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
