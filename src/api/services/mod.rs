//! Services module - business logic shared by the route handlers.

pub mod image_service;
pub mod password;
pub mod shopping_list;
pub mod token_service;

// Re-export for convenience
pub use image_service::{ImageError, ImageService};
pub use password::{hash_password, verify_password};
pub use shopping_list::{SHOPPING_LIST_FILENAME, render_shopping_list};
pub use token_service::{Claims, SharedTokenService, TokenService};
