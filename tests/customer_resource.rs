/// HTTP tests for the customer endpoints, run against the in-memory store.
mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{build_credit, TestApp};
use credit_application_system::errors::{BAD_REQUEST_TITLE, CONFLICT_TITLE, NOT_FOUND_TITLE};
use credit_application_system::models::CustomerId;
use credit_application_system::repository::{CreditRepository, CustomerRepository};
use credit_application_system::services::verify_password;

const URL: &str = "/api/customers";

fn customer_dto() -> Value {
    json!({
        "firstName": "Cami",
        "lastName": "Cavalcante",
        "cpf": "28475934625",
        "income": 1000.0,
        "email": "camila@gmail.com",
        "password": "1234",
        "zipCode": "000000",
        "street": "Rua da Cami, 123"
    })
}

#[tokio::test]
async fn should_create_a_customer_and_return_201_status() {
    let app = TestApp::new();

    let (status, body) = app.send_json("POST", URL, &customer_dto()).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], json!(1));
    assert_eq!(body["firstName"], json!("Cami"));
    assert_eq!(body["cpf"], json!("28475934625"));
    assert_eq!(body["income"].as_f64(), Some(1000.0));
    assert_eq!(body["zipCode"], json!("000000"));
    assert!(body.get("password").is_none());

    let stored = app.store.find_by_id(CustomerId(1)).await.unwrap().unwrap();
    assert_ne!(stored.password_hash, "1234");
    assert!(verify_password("1234", &stored.password_hash));
}

#[tokio::test]
async fn should_not_save_a_customer_with_same_cpf_and_return_409_status() {
    let app = TestApp::new();
    app.send_json("POST", URL, &customer_dto()).await;

    let mut duplicate = customer_dto();
    duplicate["email"] = json!("other@gmail.com");
    let (status, body) = app.send_json("POST", URL, &duplicate).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["title"], json!(CONFLICT_TITLE));
}

#[tokio::test]
async fn should_not_save_a_customer_with_same_email_and_return_409_status() {
    let app = TestApp::new();
    app.send_json("POST", URL, &customer_dto()).await;

    let mut duplicate = customer_dto();
    duplicate["cpf"] = json!("00259430064");
    let (status, _) = app.send_json("POST", URL, &duplicate).await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn should_not_save_a_customer_with_invalid_fields_and_return_400_status() {
    let app = TestApp::new();
    let mut invalid = customer_dto();
    invalid["firstName"] = json!("");
    invalid["cpf"] = json!("12345678900");
    invalid["email"] = json!("not-an-email");

    let (status, body) = app.send_json("POST", URL, &invalid).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], json!(BAD_REQUEST_TITLE));
    let details = body["details"].as_object().unwrap();
    assert!(details.contains_key("firstName"));
    assert!(details.contains_key("cpf"));
    assert!(details.contains_key("email"));
}

#[tokio::test]
async fn should_reject_values_the_columns_cannot_hold_with_400_status() {
    let app = TestApp::new();

    let mut long_name = customer_dto();
    long_name["firstName"] = json!("a".repeat(300));
    let (status, body) = app.send_json("POST", URL, &long_name).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["firstName"].is_string());

    let mut fractional_cents = customer_dto();
    fractional_cents["income"] = json!(1000.555);
    let (status, body) = app.send_json("POST", URL, &fractional_cents).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["income"].is_string());

    let mut huge_income = customer_dto();
    huge_income["income"] = json!("1234567890123456789012345678901234567890");
    let (status, _) = app.send_json("POST", URL, &huge_income).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.store.find_by_id(CustomerId(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn created_customer_matches_what_is_read_back() {
    let app = TestApp::new();
    let mut dto = customer_dto();
    dto["income"] = json!("9999999999999.99");

    let (_, created) = app.send_json("POST", URL, &dto).await;
    let (_, found) = app.get(&format!("{}/1", URL)).await;

    assert_eq!(created, found);
    assert_eq!(found["income"].to_string(), "9999999999999.99");
}

#[tokio::test]
async fn should_find_customer_by_id_and_return_200_status() {
    let app = TestApp::new();
    app.send_json("POST", URL, &customer_dto()).await;

    let (status, body) = app.get(&format!("{}/1", URL)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["firstName"], json!("Cami"));
    assert_eq!(body["lastName"], json!("Cavalcante"));
    assert_eq!(body["email"], json!("camila@gmail.com"));
    assert_eq!(body["street"], json!("Rua da Cami, 123"));
}

#[tokio::test]
async fn should_not_find_customer_with_invalid_id_and_return_404_status() {
    let app = TestApp::new();

    let (status, body) = app.get(&format!("{}/7", URL)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["title"], json!(NOT_FOUND_TITLE));
}

#[tokio::test]
async fn should_update_a_customer_and_return_200_status() {
    let app = TestApp::new();
    app.send_json("POST", URL, &customer_dto()).await;

    let update = json!({
        "firstName": "CamiUpdate",
        "lastName": "CavalcanteUpdate",
        "income": 5000.0,
        "zipCode": "45656",
        "street": "Rua Updated"
    });
    let (status, body) = app
        .send_json("PATCH", &format!("{}?customerId=1", URL), &update)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["firstName"], json!("CamiUpdate"));
    assert_eq!(body["lastName"], json!("CavalcanteUpdate"));
    assert_eq!(body["income"].as_f64(), Some(5000.0));
    assert_eq!(body["zipCode"], json!("45656"));
    assert_eq!(body["cpf"], json!("28475934625"));
    assert_eq!(body["email"], json!("camila@gmail.com"));
}

#[tokio::test]
async fn should_not_update_a_customer_with_invalid_fields_and_return_400_status() {
    let app = TestApp::new();
    app.send_json("POST", URL, &customer_dto()).await;

    let update = json!({
        "firstName": "",
        "lastName": "CavalcanteUpdate",
        "income": -5.0,
        "zipCode": "45656",
        "street": "Rua Updated"
    });
    let (status, body) = app
        .send_json("PATCH", &format!("{}?customerId=1", URL), &update)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], json!(BAD_REQUEST_TITLE));
    assert!(body["details"]["firstName"].is_string());
    assert!(body["details"]["income"].is_string());

    let stored = app.store.find_by_id(CustomerId(1)).await.unwrap().unwrap();
    assert_eq!(stored.first_name, "Cami");
    assert_eq!(stored.last_name, "Cavalcante");
    assert_eq!(stored.address.zip_code, "000000");
}

#[tokio::test]
async fn should_not_update_an_unknown_customer_and_return_404_status() {
    let app = TestApp::new();
    let update = json!({
        "firstName": "CamiUpdate",
        "lastName": "CavalcanteUpdate",
        "income": 5000.0,
        "zipCode": "45656",
        "street": "Rua Updated"
    });

    let (status, _) = app
        .send_json("PATCH", &format!("{}?customerId=3", URL), &update)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_delete_customer_with_credits_and_return_204_status() {
    let app = TestApp::new();
    app.send_json("POST", URL, &customer_dto()).await;
    let customer = app.store.find_by_id(CustomerId(1)).await.unwrap().unwrap();
    let credit = CreditRepository::save(app.store.as_ref(), build_credit(&customer))
        .await
        .unwrap();

    let (status, body) = app
        .send(
            axum::http::Request::builder()
                .method("DELETE")
                .uri(format!("{}/1", URL))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    assert!(app.store.find_by_id(customer.id).await.unwrap().is_none());
    assert!(app
        .store
        .find_by_credit_code(credit.credit_code)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn should_not_delete_an_unknown_customer_and_return_404_status() {
    let app = TestApp::new();

    let (status, _) = app
        .send(
            axum::http::Request::builder()
                .method("DELETE")
                .uri(format!("{}/5", URL))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_and_docs_are_served() {
    let app = TestApp::new();

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));

    let (status, doc) = app.get("/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/credits"].is_object());
}

#[tokio::test]
async fn delete_all_clears_both_tables() {
    let app = TestApp::new();
    let customer = app.save_customer(common::build_customer()).await;
    CreditRepository::save(app.store.as_ref(), build_credit(&customer))
        .await
        .unwrap();

    CustomerRepository::delete_all(app.store.as_ref()).await.unwrap();
    CreditRepository::delete_all(app.store.as_ref()).await.unwrap();

    let (_, body) = app
        .get(&format!("/api/credits?customerId={}", customer.id))
        .await;
    assert_eq!(body, json!([]));
}
