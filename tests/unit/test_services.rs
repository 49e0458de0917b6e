//! Unit tests for services

use recipe_sharing_api::services::{
    ImageError, ImageService, SHOPPING_LIST_FILENAME, TokenService, hash_password,
    render_shopping_list, verify_password,
};
use recipe_sharing_api::storage::ShoppingListItem;
use uuid::Uuid;

// 1x1 transparent PNG
const PNG_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

#[test]
fn test_password_roundtrip() {
    let stored = hash_password("garlic-and-thyme");
    assert!(verify_password("garlic-and-thyme", &stored));
    assert!(!verify_password("wrong-password", &stored));
}

#[test]
fn test_password_hashes_are_salted() {
    let a = hash_password("same-password");
    let b = hash_password("same-password");
    assert_ne!(a, b, "two hashes of the same password should differ");
}

#[test]
fn test_token_roundtrip_across_instances() {
    let issuer = TokenService::new("test-secret-key-at-least-32-chars");
    let verifier = TokenService::new("test-secret-key-at-least-32-chars");
    let session_id = Uuid::new_v4();

    let token = issuer.generate_token(7, "chef", session_id).unwrap();
    let claims = verifier.validate_token(&token).unwrap();

    assert_eq!(claims.user_id(), Some(7));
    assert_eq!(claims.session_id, session_id.to_string());
}

#[test]
fn test_token_rejected_with_different_secret() {
    let issuer = TokenService::new("test-secret-key-at-least-32-chars");
    let verifier = TokenService::new("other-secret-key-at-least-32-char");

    let token = issuer.generate_token(7, "chef", Uuid::new_v4()).unwrap();
    assert!(verifier.validate_token(&token).is_err());
}

#[test]
fn test_image_service_saves_and_removes() {
    let dir = tempfile::tempdir().unwrap();
    let service = ImageService::new(dir.path());

    let relative = service.save_data_uri(PNG_DATA_URI, "avatars").unwrap();
    assert!(relative.starts_with("avatars/"));
    assert!(relative.ends_with(".png"));
    assert!(dir.path().join(&relative).exists());

    service.remove(&relative);
    assert!(!dir.path().join(&relative).exists());
}

#[test]
fn test_image_service_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let service = ImageService::new(dir.path());

    assert!(matches!(
        service.save_data_uri("plain text", "avatars"),
        Err(ImageError::NotDataUri)
    ));
    assert!(matches!(
        service.save_data_uri("data:image/png;base64,!!bad!!", "avatars"),
        Err(ImageError::Base64(_))
    ));
}

#[test]
fn test_shopping_list_rendering() {
    let items = vec![
        ShoppingListItem {
            name: "eggs".to_string(),
            measurement_unit: "pcs".to_string(),
            total_amount: 6,
        },
        ShoppingListItem {
            name: "flour".to_string(),
            measurement_unit: "g".to_string(),
            total_amount: 500,
        },
    ];

    let text = render_shopping_list(&items);
    assert_eq!(text, "eggs (pcs) - 6\nflour (g) - 500");
    assert_eq!(SHOPPING_LIST_FILENAME, "shopping_cart.txt");
}
