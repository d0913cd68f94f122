use axum::{http::StatusCode, response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::errors::ExceptionDetails;
use crate::handlers;
use crate::models::{
    CreditDto, CreditStatus, CreditView, CreditViewList, CustomerDto, CustomerUpdateDto,
    CustomerView,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Credit Application System",
        description = "Customer registration and credit applications"
    ),
    paths(
        handlers::save_credit,
        handlers::find_all_credits_by_customer,
        handlers::find_credit_by_code,
        handlers::save_customer,
        handlers::find_customer_by_id,
        handlers::update_customer,
        handlers::delete_customer,
    ),
    components(schemas(
        CreditDto,
        CreditView,
        CreditViewList,
        CreditStatus,
        CustomerDto,
        CustomerUpdateDto,
        CustomerView,
        ExceptionDetails,
    )),
    tags(
        (name = "credits", description = "Credit applications"),
        (name = "customers", description = "Customer registry")
    )
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document.
pub async fn serve_openapi_spec() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Serves the Swagger UI HTML page.
///
/// The page loads the document served by `serve_openapi_spec`.
pub async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Credit Application System - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}
