use crate::{
    api::app,
    repairs::{AccessPolicy, Customer, Employee, MemoryStore, TicketService},
};
use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header::AUTHORIZATION, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const STAFF_TOKEN: &str = "staff-token-0000000001";
const ALICE_TOKEN: &str = "alice-token-0000000001";
const BOB_TOKEN: &str = "bob-token-00000000001";
const LURKER_TOKEN: &str = "lurker-token-000000001";

struct TestContext {
    store: Arc<MemoryStore>,
    router: Router,
    alice: Customer,
    bob: Customer,
    employee: Employee,
}

impl TestContext {
    async fn new(policy: AccessPolicy) -> Self {
        let store = Arc::new(MemoryStore::new());

        let staff = store.add_user(true).await;
        store.add_token(staff, STAFF_TOKEN).await;
        let employee = store.add_employee(staff, "plumbing", "Pat Wrench").await;

        let alice_user = store.add_user(false).await;
        store.add_token(alice_user, ALICE_TOKEN).await;
        let alice = store
            .add_customer(alice_user, "Alice Example", "1 Main St")
            .await;

        let bob_user = store.add_user(false).await;
        store.add_token(bob_user, BOB_TOKEN).await;
        let bob = store.add_customer(bob_user, "Bob Example", "2 Side St").await;

        let lurker = store.add_user(false).await;
        store.add_token(lurker, LURKER_TOKEN).await;

        let service = Arc::new(TicketService::new(store.clone(), policy));
        let router = app(service, store.clone());

        Self {
            store,
            router,
            alice,
            bob,
            employee,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<Response> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Token {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };
        Ok(self.router.clone().oneshot(request).await?)
    }

    async fn create(&self, token: &str, description: &str, emergency: bool) -> Result<i64> {
        let response = self
            .send(
                Method::POST,
                "/tickets",
                Some(token),
                Some(json!({ "description": description, "emergency": emergency })),
            )
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await?;
        body["id"]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("missing ticket id in {body}"))
    }
}

async fn body_json(response: Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .map(|items| items.iter().filter_map(|item| item["id"].as_i64()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn create_binds_ticket_to_callers_customer() -> Result<()> {
    let ctx = TestContext::new(AccessPolicy::Hardened).await;

    let response = ctx
        .send(
            Method::POST,
            "/tickets",
            Some(ALICE_TOKEN),
            Some(json!({
                "description": "Leaky faucet",
                "emergency": false,
                "customer": ctx.bob.id
            })),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await?;
    assert_eq!(body["customer"]["id"], ctx.alice.id);
    assert_eq!(body["customer"]["full_name"], "Alice Example");
    assert_eq!(body["customer"]["address"], "1 Main St");
    assert!(body["customer"].get("user").is_none());
    assert_eq!(body["employee"], Value::Null);
    assert_eq!(body["description"], "Leaky faucet");
    assert_eq!(body["emergency"], false);
    assert_eq!(body["date_completed"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn create_rejects_missing_fields_and_bad_bodies() -> Result<()> {
    let ctx = TestContext::new(AccessPolicy::Hardened).await;

    let missing_emergency = ctx
        .send(
            Method::POST,
            "/tickets",
            Some(ALICE_TOKEN),
            Some(json!({ "description": "No flag" })),
        )
        .await?;
    assert_eq!(missing_emergency.status(), StatusCode::BAD_REQUEST);
    let body = body_json(missing_emergency).await?;
    assert_eq!(body["error"], "invalid_input");

    let missing_description = ctx
        .send(
            Method::POST,
            "/tickets",
            Some(ALICE_TOKEN),
            Some(json!({ "emergency": true })),
        )
        .await?;
    assert_eq!(missing_description.status(), StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/tickets")
        .header(AUTHORIZATION, format!("Token {ALICE_TOKEN}"))
        .header("content-type", "application/json")
        .body(Body::from("{not json"))?;
    let malformed = ctx.router.clone().oneshot(request).await?;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    let body = body_json(malformed).await?;
    assert_eq!(body["error"], "invalid_input");
    let syntax_message = body["message"].as_str().unwrap_or_default().to_string();
    assert!(syntax_message.starts_with("malformed request:"));

    let wrong_type = ctx
        .send(
            Method::POST,
            "/tickets",
            Some(ALICE_TOKEN),
            Some(json!({ "description": "Leaky faucet", "emergency": "yes" })),
        )
        .await?;
    assert_eq!(wrong_type.status(), StatusCode::BAD_REQUEST);
    let body = body_json(wrong_type).await?;
    assert_eq!(body["error"], "invalid_input");
    let type_message = body["message"].as_str().unwrap_or_default();
    assert!(type_message.contains("emergency"), "{type_message}");
    assert_ne!(type_message, syntax_message);
    Ok(())
}

#[tokio::test]
async fn non_numeric_ids_get_json_errors_after_auth() -> Result<()> {
    let ctx = TestContext::new(AccessPolicy::Hardened).await;

    let response = ctx
        .send(Method::GET, "/tickets/abc", Some(STAFF_TOKEN), None)
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok()),
        Some("application/json")
    );
    let body = body_json(response).await?;
    assert_eq!(body["error"], "invalid_input");
    assert!(body["message"]
        .as_str()
        .is_some_and(|message| message.contains("abc")));

    let anonymous = ctx.send(Method::DELETE, "/tickets/abc", None, None).await?;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let assign = ctx
        .send(
            Method::PUT,
            "/tickets/abc",
            Some(STAFF_TOKEN),
            Some(json!({ "employee": ctx.employee.id })),
        )
        .await?;
    assert_eq!(assign.status(), StatusCode::BAD_REQUEST);

    for uri in ["/employees/abc", "/customers/abc"] {
        let response = ctx.send(Method::GET, uri, Some(STAFF_TOKEN), None).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = body_json(response).await?;
        assert_eq!(body["error"], "invalid_input", "{uri}");
    }
    Ok(())
}

#[tokio::test]
async fn malformed_query_gets_json_error() -> Result<()> {
    let ctx = TestContext::new(AccessPolicy::Hardened).await;

    let response = ctx
        .send(
            Method::GET,
            "/tickets?status=done&status=all",
            Some(STAFF_TOKEN),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await?;
    assert_eq!(body["error"], "invalid_input");

    let anonymous = ctx
        .send(Method::GET, "/tickets?status=done&status=all", None, None)
        .await?;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn create_without_customer_record_is_not_found() -> Result<()> {
    let ctx = TestContext::new(AccessPolicy::Hardened).await;
    let response = ctx
        .send(
            Method::POST,
            "/tickets",
            Some(LURKER_TOKEN),
            Some(json!({ "description": "Who am I", "emergency": false })),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn missing_or_unknown_token_is_unauthorized() -> Result<()> {
    let ctx = TestContext::new(AccessPolicy::Hardened).await;

    let anonymous = ctx.send(Method::GET, "/tickets", None, None).await?;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        anonymous
            .headers()
            .get("www-authenticate")
            .and_then(|value| value.to_str().ok()),
        Some("Token")
    );

    let unknown = ctx
        .send(
            Method::GET,
            "/employees",
            Some("unknown-token-000000001"),
            None,
        )
        .await?;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(unknown).await?;
    assert_eq!(body["error"], "unauthenticated");
    Ok(())
}

#[tokio::test]
async fn list_scopes_customers_and_filters_staff() -> Result<()> {
    let ctx = TestContext::new(AccessPolicy::Hardened).await;
    let first = ctx.create(ALICE_TOKEN, "Leaky faucet", false).await?;
    let second = ctx.create(BOB_TOKEN, "Broken heater", true).await?;
    assert!(ctx.store.complete_ticket(second, Utc::now()).await);

    let staff_all = ctx
        .send(Method::GET, "/tickets", Some(STAFF_TOKEN), None)
        .await?;
    assert_eq!(staff_all.status(), StatusCode::OK);
    assert_eq!(ids(&body_json(staff_all).await?), vec![first, second]);

    let staff_done = ctx
        .send(Method::GET, "/tickets?status=done", Some(STAFF_TOKEN), None)
        .await?;
    assert_eq!(ids(&body_json(staff_done).await?), vec![second]);

    let staff_unknown = ctx
        .send(Method::GET, "/tickets?status=bogus", Some(STAFF_TOKEN), None)
        .await?;
    assert_eq!(ids(&body_json(staff_unknown).await?), vec![first, second]);

    let alice_done = ctx
        .send(Method::GET, "/tickets?status=done", Some(ALICE_TOKEN), None)
        .await?;
    assert_eq!(ids(&body_json(alice_done).await?), vec![first]);

    let lurker = ctx
        .send(Method::GET, "/tickets", Some(LURKER_TOKEN), None)
        .await?;
    assert_eq!(lurker.status(), StatusCode::OK);
    assert!(ids(&body_json(lurker).await?).is_empty());
    Ok(())
}

#[tokio::test]
async fn get_hides_foreign_tickets_under_hardened_policy() -> Result<()> {
    let ctx = TestContext::new(AccessPolicy::Hardened).await;
    let ticket = ctx.create(ALICE_TOKEN, "Leaky faucet", false).await?;
    let uri = format!("/tickets/{ticket}");

    let own = ctx.send(Method::GET, &uri, Some(ALICE_TOKEN), None).await?;
    assert_eq!(own.status(), StatusCode::OK);

    let foreign = ctx.send(Method::GET, &uri, Some(BOB_TOKEN), None).await?;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

    let staff = ctx.send(Method::GET, &uri, Some(STAFF_TOKEN), None).await?;
    assert_eq!(staff.status(), StatusCode::OK);

    let missing = ctx
        .send(Method::GET, "/tickets/9999", Some(STAFF_TOKEN), None)
        .await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body = body_json(missing).await?;
    assert_eq!(body["error"], "not_found");
    Ok(())
}

#[tokio::test]
async fn lenient_policy_shows_any_ticket_by_id() -> Result<()> {
    let ctx = TestContext::new(AccessPolicy::Lenient).await;
    let ticket = ctx.create(ALICE_TOKEN, "Leaky faucet", false).await?;
    let response = ctx
        .send(
            Method::GET,
            &format!("/tickets/{ticket}"),
            Some(BOB_TOKEN),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn assign_employee_round_trip() -> Result<()> {
    let ctx = TestContext::new(AccessPolicy::Hardened).await;
    let ticket = ctx.create(ALICE_TOKEN, "Leaky faucet", false).await?;
    let uri = format!("/tickets/{ticket}");

    let assigned = ctx
        .send(
            Method::PUT,
            &uri,
            Some(STAFF_TOKEN),
            Some(json!({ "employee": ctx.employee.id })),
        )
        .await?;
    assert_eq!(assigned.status(), StatusCode::NO_CONTENT);
    let bytes = to_bytes(assigned.into_body(), usize::MAX).await?;
    assert!(bytes.is_empty());

    let detail = ctx.send(Method::GET, &uri, Some(ALICE_TOKEN), None).await?;
    let body = body_json(detail).await?;
    assert_eq!(body["employee"]["id"], ctx.employee.id);
    assert_eq!(body["employee"]["full_name"], "Pat Wrench");
    assert_eq!(body["employee"]["specialty"], "plumbing");
    assert!(body["employee"].get("user").is_none());
    Ok(())
}

#[tokio::test]
async fn assign_rejects_customers_and_bad_references() -> Result<()> {
    let ctx = TestContext::new(AccessPolicy::Hardened).await;
    let ticket = ctx.create(ALICE_TOKEN, "Leaky faucet", false).await?;
    let uri = format!("/tickets/{ticket}");

    let customer = ctx
        .send(
            Method::PUT,
            &uri,
            Some(ALICE_TOKEN),
            Some(json!({ "employee": ctx.employee.id })),
        )
        .await?;
    assert_eq!(customer.status(), StatusCode::FORBIDDEN);
    let body = body_json(customer).await?;
    assert_eq!(body["error"], "forbidden");

    let no_employee = ctx
        .send(Method::PUT, &uri, Some(STAFF_TOKEN), Some(json!({})))
        .await?;
    assert_eq!(no_employee.status(), StatusCode::BAD_REQUEST);

    let unknown_employee = ctx
        .send(
            Method::PUT,
            &uri,
            Some(STAFF_TOKEN),
            Some(json!({ "employee": 9999 })),
        )
        .await?;
    assert_eq!(unknown_employee.status(), StatusCode::NOT_FOUND);

    let unknown_ticket = ctx
        .send(
            Method::PUT,
            "/tickets/9999",
            Some(STAFF_TOKEN),
            Some(json!({ "employee": ctx.employee.id })),
        )
        .await?;
    assert_eq!(unknown_ticket.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn delete_is_staff_only_and_final() -> Result<()> {
    let ctx = TestContext::new(AccessPolicy::Lenient).await;
    let ticket = ctx.create(ALICE_TOKEN, "Leaky faucet", false).await?;
    let uri = format!("/tickets/{ticket}");

    let owner = ctx
        .send(Method::DELETE, &uri, Some(ALICE_TOKEN), None)
        .await?;
    assert_eq!(owner.status(), StatusCode::FORBIDDEN);

    let staff = ctx
        .send(Method::DELETE, &uri, Some(STAFF_TOKEN), None)
        .await?;
    assert_eq!(staff.status(), StatusCode::NO_CONTENT);

    let gone = ctx.send(Method::GET, &uri, Some(STAFF_TOKEN), None).await?;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let again = ctx
        .send(Method::DELETE, &uri, Some(STAFF_TOKEN), None)
        .await?;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn employees_and_customers_are_listed() -> Result<()> {
    let ctx = TestContext::new(AccessPolicy::Hardened).await;

    let employees = ctx
        .send(Method::GET, "/employees", Some(ALICE_TOKEN), None)
        .await?;
    assert_eq!(employees.status(), StatusCode::OK);
    let body = body_json(employees).await?;
    assert_eq!(ids(&body), vec![ctx.employee.id]);
    assert_eq!(body[0]["user"], ctx.employee.user_id);

    let customers = ctx
        .send(Method::GET, "/customers", Some(STAFF_TOKEN), None)
        .await?;
    assert_eq!(ids(&body_json(customers).await?), vec![ctx.alice.id, ctx.bob.id]);

    let one = ctx
        .send(
            Method::GET,
            &format!("/customers/{}", ctx.bob.id),
            Some(STAFF_TOKEN),
            None,
        )
        .await?;
    let body = body_json(one).await?;
    assert_eq!(body["address"], "2 Side St");

    let missing = ctx
        .send(Method::GET, "/employees/9999", Some(STAFF_TOKEN), None)
        .await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn responses_carry_request_id() -> Result<()> {
    let ctx = TestContext::new(AccessPolicy::Hardened).await;
    let response = ctx.send(Method::GET, "/health", None, None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let root = ctx.send(Method::GET, "/", None, None).await?;
    assert_eq!(root.status(), StatusCode::OK);
    let bytes = to_bytes(root.into_body(), usize::MAX).await?;
    assert!(String::from_utf8_lossy(&bytes).starts_with(env!("CARGO_PKG_NAME")));
    Ok(())
}
