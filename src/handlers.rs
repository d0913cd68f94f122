use crate::config::CreditRules;
use crate::errors::AppError;
use crate::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::models::*;
use crate::repository::{CreditRepository, CustomerRepository};
use crate::services::{CreditService, CustomerService};
use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub customers: Arc<dyn CustomerRepository>,
    pub credits: Arc<dyn CreditRepository>,
    pub credit_rules: CreditRules,
}

impl AppState {
    fn customer_service(&self) -> CustomerService {
        CustomerService::new(self.customers.clone())
    }

    fn credit_service(&self) -> CreditService {
        CreditService::new(
            self.credits.clone(),
            self.customers.clone(),
            self.credit_rules.clone(),
        )
    }
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

// ============ Credits ============

/// POST /api/credits
///
/// Validates the application against the credit rules and stores it as IN_PROGRESS.
#[utoipa::path(
    post,
    path = "/api/credits",
    request_body = CreditDto,
    responses(
        (status = 201, description = "Credit created", body = CreditView),
        (status = 400, description = "Invalid application", body = ExceptionDetails),
        (status = 404, description = "Unknown customer", body = ExceptionDetails)
    ),
    tag = "credits"
)]
pub async fn save_credit(
    State(state): State<Arc<AppState>>,
    ValidatedJson(dto): ValidatedJson<CreditDto>,
) -> Result<(StatusCode, Json<CreditView>), AppError> {
    tracing::info!(
        "POST /api/credits - customer_id: {}, installments: {}",
        dto.customer_id,
        dto.number_of_installments
    );

    let (credit, customer) = state.credit_service().save(dto).await?;
    Ok((StatusCode::CREATED, Json(CreditView::new(&credit, &customer))))
}

/// GET /api/credits?customerId={id}
#[utoipa::path(
    get,
    path = "/api/credits",
    params(("customerId" = i64, Query, description = "Owner of the credits")),
    responses(
        (status = 200, description = "Credits of the customer", body = [CreditViewList]),
        (status = 400, description = "Missing or invalid customerId", body = ExceptionDetails)
    ),
    tag = "credits"
)]
pub async fn find_all_credits_by_customer(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<CustomerIdParam>,
) -> Result<Json<Vec<CreditViewList>>, AppError> {
    tracing::info!("GET /api/credits - customer_id: {}", params.customer_id);

    let credits = state
        .credit_service()
        .find_all_by_customer(params.customer_id)
        .await?;

    Ok(Json(credits.iter().map(CreditViewList::from).collect()))
}

/// GET /api/credits/{creditCode}?customerId={id}
///
/// Only the owning customer can read a credit; anyone else gets a 404.
#[utoipa::path(
    get,
    path = "/api/credits/{creditCode}",
    params(
        ("creditCode" = Uuid, Path, description = "Credit code"),
        ("customerId" = i64, Query, description = "Owner of the credit")
    ),
    responses(
        (status = 200, description = "Credit found", body = CreditView),
        (status = 404, description = "Unknown code or different owner", body = ExceptionDetails)
    ),
    tag = "credits"
)]
pub async fn find_credit_by_code(
    State(state): State<Arc<AppState>>,
    ApiPath(credit_code): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<CustomerIdParam>,
) -> Result<Json<CreditView>, AppError> {
    tracing::info!(
        "GET /api/credits/{} - customer_id: {}",
        credit_code,
        params.customer_id
    );

    let (credit, customer) = state
        .credit_service()
        .find_by_credit_code(params.customer_id, credit_code)
        .await?;

    Ok(Json(CreditView::new(&credit, &customer)))
}

// ============ Customers ============

/// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    request_body = CustomerDto,
    responses(
        (status = 201, description = "Customer registered", body = CustomerView),
        (status = 400, description = "Invalid customer data", body = ExceptionDetails),
        (status = 409, description = "cpf or email already registered", body = ExceptionDetails)
    ),
    tag = "customers"
)]
pub async fn save_customer(
    State(state): State<Arc<AppState>>,
    ValidatedJson(dto): ValidatedJson<CustomerDto>,
) -> Result<(StatusCode, Json<CustomerView>), AppError> {
    tracing::info!("POST /api/customers - email: {}", dto.email);

    let customer = state.customer_service().save(dto).await?;
    Ok((StatusCode::CREATED, Json(CustomerView::from(&customer))))
}

/// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    params(("id" = i64, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer found", body = CustomerView),
        (status = 404, description = "Customer not found", body = ExceptionDetails)
    ),
    tag = "customers"
)]
pub async fn find_customer_by_id(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<CustomerId>,
) -> Result<Json<CustomerView>, AppError> {
    tracing::info!("GET /api/customers/{}", id);

    let customer = state.customer_service().find_by_id(id).await?;
    Ok(Json(CustomerView::from(&customer)))
}

/// PATCH /api/customers?customerId={id}
#[utoipa::path(
    patch,
    path = "/api/customers",
    params(("customerId" = i64, Query, description = "Customer to update")),
    request_body = CustomerUpdateDto,
    responses(
        (status = 200, description = "Customer updated", body = CustomerView),
        (status = 400, description = "Invalid customer data", body = ExceptionDetails),
        (status = 404, description = "Customer not found", body = ExceptionDetails)
    ),
    tag = "customers"
)]
pub async fn update_customer(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<CustomerIdParam>,
    ValidatedJson(dto): ValidatedJson<CustomerUpdateDto>,
) -> Result<Json<CustomerView>, AppError> {
    tracing::info!("PATCH /api/customers - customer_id: {}", params.customer_id);

    let customer = state
        .customer_service()
        .update(params.customer_id, dto)
        .await?;
    Ok(Json(CustomerView::from(&customer)))
}

/// DELETE /api/customers/{id}
///
/// Also removes every credit of the customer.
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    params(("id" = i64, Path, description = "Customer id")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 404, description = "Customer not found", body = ExceptionDetails)
    ),
    tag = "customers"
)]
pub async fn delete_customer(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<CustomerId>,
) -> Result<StatusCode, AppError> {
    tracing::info!("DELETE /api/customers/{}", id);

    state.customer_service().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
