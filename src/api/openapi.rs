//! OpenAPI specification definition.
//!
//! Aggregates all route handlers and schemas for OpenAPI documentation generation.

use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        crate::routes::auth::login,
        crate::routes::auth::logout,
        // Users
        crate::routes::users::register,
        crate::routes::users::list_users,
        crate::routes::users::get_user,
        crate::routes::users::me,
        crate::routes::users::put_avatar,
        crate::routes::users::delete_avatar,
        crate::routes::users::set_password,
        // Subscriptions
        crate::routes::users::list_subscriptions,
        crate::routes::users::subscribe,
        crate::routes::users::unsubscribe,
        // Tags
        crate::routes::tags::list_tags,
        crate::routes::tags::get_tag,
        // Ingredients
        crate::routes::ingredients::list_ingredients,
        crate::routes::ingredients::get_ingredient,
        // Recipes
        crate::routes::recipes::list_recipes,
        crate::routes::recipes::create_recipe,
        crate::routes::recipes::get_recipe,
        crate::routes::recipes::update_recipe,
        crate::routes::recipes::delete_recipe,
        crate::routes::recipes::get_link,
        // Favorites
        crate::routes::recipes::add_favorite,
        crate::routes::recipes::remove_favorite,
        // Shopping cart
        crate::routes::recipes::add_to_cart,
        crate::routes::recipes::remove_from_cart,
        crate::routes::recipes::download_shopping_cart,
        // Short links
        crate::routes::short_links::resolve_short_link,
        // OpenAPI
        crate::routes::openapi::serve_openapi_json,
    ),
    components(schemas(
        crate::models::Tag,
        crate::models::Ingredient,
        crate::models::UserResponse,
        crate::models::RegisterRequest,
        crate::models::RegisterResponse,
        crate::models::SubscriptionResponse,
        crate::models::RecipeResponse,
        crate::models::RecipeShortResponse,
        crate::models::RecipeIngredientResponse,
        crate::models::UserPage,
        crate::models::RecipePage,
        crate::models::SubscriptionPage,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Token issue and revocation"),
        (name = "Users", description = "Registration, profiles and avatars"),
        (name = "Subscriptions", description = "Following recipe authors"),
        (name = "Tags", description = "Recipe tag catalogue"),
        (name = "Ingredients", description = "Ingredient catalogue with prefix search"),
        (name = "Recipes", description = "Recipe CRUD and short links"),
        (name = "Favorites", description = "Per-user favorite recipes"),
        (name = "Shopping cart", description = "Cart management and aggregated list download"),
        (name = "Short links", description = "Public short-link redirects"),
        (name = "OpenAPI", description = "OpenAPI specification"),
    ),
    info(
        title = "Recipe Sharing API",
        description = "REST API for publishing recipes, following authors and building shopping lists",
        version = "1.0.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080/api", description = "Local development server"),
        (url = "https://recipes.example.org/api", description = "Production server")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        // Update version to match Cargo.toml version
        openapi.info.version = env!("CARGO_PKG_VERSION").to_string();

        // Initialize components if they don't exist
        if openapi.components.is_none() {
            openapi.components = Some(utoipa::openapi::Components::new());
        }

        let components = openapi.components.as_mut().unwrap();
        use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
        components.add_security_scheme(
            "token_auth",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "Token-based authentication. Pass the key as `Token <key>`.",
            ))),
        );
    }
}
