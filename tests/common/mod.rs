#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use bigdecimal::BigDecimal;
use chrono::{Local, Months, NaiveDate};
use serde_json::Value;
use tower::util::ServiceExt; // for `oneshot`

use credit_application_system::config::CreditRules;
use credit_application_system::handlers::AppState;
use credit_application_system::memory::InMemoryStore;
use credit_application_system::models::{Address, Customer, NewCredit, NewCustomer};
use credit_application_system::repository::CustomerRepository;
use credit_application_system::routes;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = Arc::new(AppState {
            customers: store.clone(),
            credits: store.clone(),
            credit_rules: CreditRules::default(),
        });
        let router = routes::app(state, routes::api_routes());
        Self { router, store }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .uri(uri)
                .header("accept", "application/json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn send_json(&self, method: &str, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body).unwrap()))
                .unwrap(),
        )
        .await
    }

    pub async fn save_customer(&self, customer: NewCustomer) -> Customer {
        CustomerRepository::save(self.store.as_ref(), customer)
            .await
            .unwrap()
    }
}

pub fn build_customer() -> NewCustomer {
    build_customer_with("00259430064", "ricardomarino@gmail.com")
}

pub fn build_customer_with(cpf: &str, email: &str) -> NewCustomer {
    NewCustomer {
        first_name: "Ricardo Marino".to_string(),
        last_name: "Da Silva Oliveira".to_string(),
        cpf: cpf.to_string(),
        email: email.to_string(),
        password_hash: "salt$digest".to_string(),
        address: Address {
            zip_code: "123456".to_string(),
            street: "Rua Ernani Braga, número 70".to_string(),
        },
        income: BigDecimal::from_str("1000.0").unwrap(),
    }
}

pub fn in_months(months: u32) -> NaiveDate {
    Local::now()
        .date_naive()
        .checked_add_months(Months::new(months))
        .unwrap()
}

pub fn build_credit(customer: &Customer) -> NewCredit {
    NewCredit::new(
        BigDecimal::from_str("1000.0").unwrap(),
        in_months(1),
        5,
        customer.id,
    )
}
