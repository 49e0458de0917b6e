//! Unit tests for model serialization and field validation

use std::path::PathBuf;

use chrono::Utc;
use recipe_sharing_api::config::AppConfig;
use recipe_sharing_api::models::validation;
use recipe_sharing_api::models::{
    Recipe, RecipeShortResponse, RegisterResponse, SubscriptionResponse, User, UserResponse,
};
use serde_json::json;
use url::Url;

fn test_config() -> AppConfig {
    AppConfig {
        port: 8080,
        base_url: Url::parse("http://localhost:8080").unwrap(),
        media_root: PathBuf::from("/tmp/media"),
        page_size: 6,
    }
}

fn test_user() -> User {
    User {
        id: 3,
        email: "cook@example.com".to_string(),
        username: "cook".to_string(),
        first_name: "Julia".to_string(),
        last_name: "Child".to_string(),
        password_hash: "sha256$1$ab$cd".to_string(),
        avatar: None,
        created_at: Utc::now(),
    }
}

#[test]
fn test_user_response_shape() {
    let response = UserResponse::from_user(&test_user(), false, &test_config());
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(
        value,
        json!({
            "email": "cook@example.com",
            "id": 3,
            "username": "cook",
            "first_name": "Julia",
            "last_name": "Child",
            "is_subscribed": false,
            "avatar": null
        })
    );
}

#[test]
fn test_user_response_avatar_is_absolute() {
    let mut user = test_user();
    user.avatar = Some("avatars/abc.png".to_string());

    let response = UserResponse::from_user(&user, true, &test_config());
    assert_eq!(
        response.avatar.as_deref(),
        Some("http://localhost:8080/media/avatars/abc.png")
    );
    assert!(response.is_subscribed);
}

#[test]
fn test_register_response_omits_subscription_fields() {
    let response = RegisterResponse::from_user(&test_user());
    let value = serde_json::to_value(&response).unwrap();

    assert!(value.get("is_subscribed").is_none());
    assert!(value.get("avatar").is_none());
    assert_eq!(value["username"], "cook");
}

#[test]
fn test_recipe_short_response_shape() {
    let recipe = Recipe {
        id: 12,
        author_id: 3,
        name: "Ratatouille".to_string(),
        text: "Slice and bake.".to_string(),
        image: "recipes/r12.png".to_string(),
        cooking_time: 45,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let response = RecipeShortResponse::from_recipe(&recipe, &test_config());
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(
        value,
        json!({
            "id": 12,
            "name": "Ratatouille",
            "image": "http://localhost:8080/media/recipes/r12.png",
            "cooking_time": 45
        })
    );
}

#[test]
fn test_subscription_response_is_always_subscribed() {
    let response = SubscriptionResponse::from_author(&test_user(), Vec::new(), 0, &test_config());
    assert!(response.is_subscribed);
    assert_eq!(response.recipes_count, 0);
    assert!(response.recipes.is_empty());
}

#[test]
fn test_email_validation_messages() {
    assert!(validation::validate_email("cook@example.com").is_ok());
    assert_eq!(
        validation::validate_email("not-an-email").unwrap_err(),
        "Enter a valid email address."
    );
}

#[test]
fn test_username_validation_messages() {
    assert!(validation::validate_username("chef.master_2024").is_ok());
    let message = validation::validate_username("has space").unwrap_err();
    assert!(message.starts_with("Enter a valid username."));
    assert_eq!(
        validation::validate_username(&"x".repeat(151)).unwrap_err(),
        "Ensure this field has no more than 150 characters."
    );
}

#[test]
fn test_password_validation_messages() {
    assert_eq!(
        validation::validate_password("short").unwrap_err(),
        "This password is too short. It must contain at least 8 characters."
    );
    assert_eq!(
        validation::validate_password("1234567890").unwrap_err(),
        "This password is entirely numeric."
    );
    assert!(validation::validate_password("garlic-and-thyme").is_ok());
}

#[test]
fn test_required_field_messages() {
    assert_eq!(
        validation::required(&None).unwrap_err(),
        "This field is required."
    );
    assert_eq!(
        validation::required(&Some("  ".to_string())).unwrap_err(),
        "This field may not be blank."
    );
}
