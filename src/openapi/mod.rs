use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockroom API",
        version = "1.0.0",
        description = r#"
# Stockroom Inventory API

Tracks stock items, the orders that move them in and out, and the alerts raised when stock
runs low.

## Authentication

Every endpoint except sign-in, sign-up, server time and health requires a bearer token:

```
Authorization: Bearer <access-token>
```

## Listing

List endpoints accept `page`, `limit`, `sort=field:asc|desc`, `fields`, `search` and
per-field operators such as `quantity[lt]=5` or `or[name][regex]=tape`. Responses carry
`results` and `totalResults`; `page`, `limit` and `totalPages` appear when paging was requested.

## Realtime

`GET /api/v1/ws?token=<access-token>` opens a WebSocket that pushes `inventory-update`,
`new-alert`, `order-created` and `online-users` events.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:8080", description = "Local development")),
    modifiers(&BearerAuth),
    security(("bearer_auth" = [])),
    tags(
        (name = "auth", description = "Sign-in and account endpoints"),
        (name = "users", description = "User administration"),
        (name = "inventory", description = "Stock items"),
        (name = "categories", description = "Item categories"),
        (name = "orders", description = "Incoming and outgoing stock movements"),
        (name = "alerts", description = "Low-stock alerts and scheduled sweeps"),
        (name = "chatbot", description = "Natural-language inventory questions")
    ),
    paths(
        crate::handlers::auth::sign_in,
        crate::handlers::auth::sign_up,
        crate::handlers::auth::server_time,
        crate::handlers::auth::check_token,
        crate::handlers::auth::change_password,

        crate::handlers::users::create_user,
        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::users_by_role,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,

        crate::handlers::inventory::create_item,
        crate::handlers::inventory::list_items,
        crate::handlers::inventory::low_stock,
        crate::handlers::inventory::get_item,
        crate::handlers::inventory::update_item,
        crate::handlers::inventory::delete_item,

        crate::handlers::categories::create_category,
        crate::handlers::categories::list_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,

        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::order_history,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order,
        crate::handlers::orders::cancel_order,

        crate::handlers::alerts::active_count,
        crate::handlers::alerts::list_alerts,
        crate::handlers::alerts::get_alert,
        crate::handlers::alerts::dismiss_alert,
        crate::handlers::alerts::dismiss_item_alerts,
        crate::handlers::alerts::trigger_forecasting,
        crate::handlers::alerts::trigger_reorder_alerts,

        crate::handlers::chatbot::query,
    ),
    components(
        schemas(
            crate::entities::user::Model,
            crate::entities::UserRole,
            crate::entities::category::Model,
            crate::entities::InventoryItemView,
            crate::entities::inventory_item::Forecast,
            crate::entities::ItemUnit,
            crate::entities::order::Model,
            crate::entities::OrderType,
            crate::entities::OrderStatus,
            crate::entities::OrderLine,
            crate::entities::alert::Model,
            crate::entities::AlertStatus,
            crate::entities::AlertType,

            crate::handlers::auth::SignInRequest,
            crate::handlers::auth::SignUpRequest,
            crate::handlers::auth::TokenResponse,
            crate::handlers::auth::MessageResponse,
            crate::services::users::CreateUserRequest,
            crate::services::users::UpdateUserRequest,
            crate::services::users::ChangePasswordRequest,
            crate::services::inventory::CreateInventoryItemRequest,
            crate::services::inventory::UpdateInventoryItemRequest,
            crate::services::categories::CreateCategoryRequest,
            crate::services::categories::UpdateCategoryRequest,
            crate::services::orders::OrderLineRequest,
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::UpdateOrderRequest,
            crate::services::orders::OrderCreator,
            crate::services::orders::OrderView,
            crate::services::alerts::AlertCount,
            crate::services::forecasting::ForecastSummary,
            crate::services::reorder_alerts::ReorderSummary,
            crate::services::chatbot::ChatbotQueryRequest,
            crate::services::chatbot::ChatbotResponse,

            crate::errors::FieldError,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
