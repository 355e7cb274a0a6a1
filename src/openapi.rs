use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DealDesk API",
        version = "1.0.0",
        description = r#"
# DealDesk CRM API

Multi-tenant CRM backend for deal tracking and payment ledgers.

## Features

- **Deal Management**: Deals with deterministic human-readable numbers and an always-consistent running balance
- **Payment Ledger**: Record, edit and delete payments; every write moves the deal balance atomically
- **Customer Directory**: Customers with cascade deletion across deals, payments and service contracts
- **Employee Directory**: Recorder identity for ledger entries
- **AMS Contracts**: Annual maintenance service agreements per customer

## Tenancy

Every resource lives under a numeric `company_id` path segment. Entities that
exist but belong to another company answer `403 Forbidden`.

## Error Handling

```json
{
  "error": "Bad Request",
  "message": "Payment of 500 exceeds the deal's remaining balance",
  "timestamp": "2026-01-01T00:00:00Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `per_page` (default 20) and
return totals alongside the page.
"#,
        contact(name = "DealDesk", email = "support@dealdesk.io")
    ),
    paths(
        // Deals
        crate::handlers::deals::list_deals,
        crate::handlers::deals::create_deal,
        crate::handlers::deals::update_deal,
        crate::handlers::deals::delete_deal,

        // Payments
        crate::handlers::deals::list_payments,
        crate::handlers::deals::record_payment,
        crate::handlers::deals::update_payment,
        crate::handlers::deals::delete_payment,
        crate::handlers::deals::payment_history,

        // Customers
        crate::handlers::customers::list_customers,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::customer_rollup,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::update_customer,
        crate::handlers::customers::delete_customer,

        // Employees
        crate::handlers::employees::list_employees,
        crate::handlers::employees::create_employee,
        crate::handlers::employees::get_employee,
        crate::handlers::employees::update_employee,
        crate::handlers::employees::delete_employee,

        // Contracts
        crate::handlers::contracts::list_contracts,
        crate::handlers::contracts::create_contract,
        crate::handlers::contracts::get_contract,
        crate::handlers::contracts::update_contract,
        crate::handlers::contracts::delete_contract,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::handlers::deals::DeleteByIdBody,
    )),
    tags(
        (name = "Deals", description = "Deal lifecycle and numbering"),
        (name = "Payments", description = "Payment ledger against deals"),
        (name = "Customers", description = "Customer directory and rollups"),
        (name = "Employees", description = "Employee directory"),
        (name = "Contracts", description = "AMS service contracts"),
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at `/swagger-ui`, serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
