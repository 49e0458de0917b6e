// Models module - domain rows, API representations and pagination

pub mod ingredient;
pub mod pagination;
pub mod recipe;
pub mod tag;
pub mod user;
pub mod validation;

pub use ingredient::{Ingredient, IngredientSeed};
pub use pagination::{MAX_LIMIT, Page, PageQuery, Pagination, RecipePage, SubscriptionPage, UserPage};
pub use recipe::{Recipe, RecipeIngredientResponse, RecipeResponse, RecipeShortResponse};
pub use tag::Tag;
pub use user::{RegisterRequest, RegisterResponse, SubscriptionResponse, User, UserResponse};
