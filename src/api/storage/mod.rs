//! Storage module for the API.
//!
//! PostgreSQL repositories, one per aggregate, plus the session store.

pub mod error;
pub mod favorites;
pub mod ingredients;
pub mod recipes;
pub mod session_store;
pub mod shopping_cart;
pub mod short_links;
pub mod subscriptions;
pub mod tags;
pub mod users;

pub use error::StorageError;
pub use favorites::FavoriteRepo;
pub use ingredients::IngredientRepo;
pub use recipes::{
    AuthorRecipeRow, IngredientAmount, NewRecipe, RecipeDetails, RecipeFilters,
    RecipeIngredientRow, RecipeRepo, RecipeWrite,
};
pub use session_store::{DbSessionStore, SessionRecord, start_session_cleanup_task};
pub use shopping_cart::{ShoppingCartRepo, ShoppingListItem};
pub use short_links::ShortLinkRepo;
pub use subscriptions::SubscriptionRepo;
pub use tags::TagRepo;
pub use users::{NewUser, UserRepo};
