//! Recipe repository.
//!
//! Handles recipe CRUD with:
//! - Atomic create/update of the recipe row plus its tag and ingredient links
//! - Filtered, paginated listing with per-viewer flags
//! - Batch hydration of tags, ingredients and authors (no per-row queries)

use std::collections::{HashMap, HashSet};

use sqlx::{PgPool, Postgres, Transaction};

use super::error::{StorageError, map_constraint_error};
use super::subscriptions::SubscriptionRepo;
use crate::models::{Pagination, Recipe, Tag, User};

/// Filters for recipe listings. Tag slugs use OR semantics; the two
/// user-scoped filters carry the id of the user whose favorites/cart
/// should be matched.
#[derive(Debug, Default)]
pub struct RecipeFilters {
    pub author: Option<i64>,
    pub tag_slugs: Option<Vec<String>>,
    pub favorited_by: Option<i64>,
    pub in_cart_of: Option<i64>,
}

/// One ingredient line to store with a recipe.
#[derive(Debug, Clone, Copy)]
pub struct IngredientAmount {
    pub ingredient_id: i64,
    pub amount: i32,
}

/// Fields for a new recipe.
pub struct NewRecipe<'a> {
    pub author_id: i64,
    pub name: &'a str,
    pub text: &'a str,
    pub image: &'a str,
    pub cooking_time: i32,
    pub tag_ids: &'a [i64],
    pub ingredients: &'a [IngredientAmount],
}

/// Partial update. Scalar fields keep their stored value when `None`;
/// tag and ingredient links are always replaced.
pub struct RecipeWrite<'a> {
    pub name: Option<&'a str>,
    pub text: Option<&'a str>,
    pub image: Option<&'a str>,
    pub cooking_time: Option<i32>,
    pub tag_ids: &'a [i64],
    pub ingredients: &'a [IngredientAmount],
}

/// An ingredient line joined with its reference fields.
#[derive(Debug, Clone)]
pub struct RecipeIngredientRow {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// A recipe with everything the full API representation needs.
#[derive(Debug)]
pub struct RecipeDetails {
    pub recipe: Recipe,
    pub author: User,
    pub author_subscribed: bool,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<RecipeIngredientRow>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// Compact per-author recipe row for subscription listings.
#[derive(Debug, sqlx::FromRow)]
pub struct AuthorRecipeRow {
    pub author_id: i64,
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(sqlx::FromRow)]
struct ListRow {
    #[sqlx(flatten)]
    recipe: Recipe,
    is_favorited: bool,
    is_in_shopping_cart: bool,
    total: i64,
}

#[derive(sqlx::FromRow)]
struct DetailRow {
    #[sqlx(flatten)]
    recipe: Recipe,
    is_favorited: bool,
    is_in_shopping_cart: bool,
}

pub struct RecipeRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> RecipeRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the bare recipe row.
    pub async fn get(&self, id: i64) -> Result<Recipe, StorageError> {
        sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, author_id, name, text, image, cooking_time, created_at, updated_at
            FROM recipes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| StorageError::not_found("recipe", id))
    }

    /// Fetch the full representation of one recipe, flags computed for
    /// `viewer`.
    pub async fn details(
        &self,
        id: i64,
        viewer: Option<i64>,
    ) -> Result<RecipeDetails, StorageError> {
        let row = sqlx::query_as::<_, DetailRow>(
            r#"
            SELECT r.id, r.author_id, r.name, r.text, r.image, r.cooking_time,
                   r.created_at, r.updated_at,
                   EXISTS(SELECT 1 FROM favorites f
                          WHERE f.recipe_id = r.id AND f.user_id = $2) AS is_favorited,
                   EXISTS(SELECT 1 FROM shopping_cart c
                          WHERE c.recipe_id = r.id AND c.user_id = $2) AS is_in_shopping_cart
            FROM recipes r
            WHERE r.id = $1
            "#,
        )
        .bind(id)
        .bind(viewer)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| StorageError::not_found("recipe", id))?;

        let mut hydrated = self
            .hydrate(
                vec![(row.recipe, row.is_favorited, row.is_in_shopping_cart)],
                viewer,
            )
            .await?;
        hydrated
            .pop()
            .ok_or_else(|| StorageError::Other("recipe hydration returned no rows".to_string()))
    }

    /// List recipes newest-first with filters and pagination. Returns the
    /// hydrated page plus the total count across all pages.
    pub async fn list(
        &self,
        filters: &RecipeFilters,
        viewer: Option<i64>,
        pagination: &Pagination,
    ) -> Result<(Vec<RecipeDetails>, i64), StorageError> {
        let rows = sqlx::query_as::<_, ListRow>(
            r#"
            SELECT r.id, r.author_id, r.name, r.text, r.image, r.cooking_time,
                   r.created_at, r.updated_at,
                   EXISTS(SELECT 1 FROM favorites f
                          WHERE f.recipe_id = r.id AND f.user_id = $1) AS is_favorited,
                   EXISTS(SELECT 1 FROM shopping_cart c
                          WHERE c.recipe_id = r.id AND c.user_id = $1) AS is_in_shopping_cart,
                   COUNT(*) OVER() AS total
            FROM recipes r
            WHERE ($2::BIGINT IS NULL OR r.author_id = $2)
              AND ($3::TEXT[] IS NULL OR EXISTS (
                    SELECT 1 FROM recipe_tags rt
                    JOIN tags t ON t.id = rt.tag_id
                    WHERE rt.recipe_id = r.id AND t.slug = ANY($3)))
              AND ($4::BIGINT IS NULL OR EXISTS (
                    SELECT 1 FROM favorites ff
                    WHERE ff.recipe_id = r.id AND ff.user_id = $4))
              AND ($5::BIGINT IS NULL OR EXISTS (
                    SELECT 1 FROM shopping_cart cc
                    WHERE cc.recipe_id = r.id AND cc.user_id = $5))
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(viewer)
        .bind(filters.author)
        .bind(filters.tag_slugs.as_deref())
        .bind(filters.favorited_by)
        .bind(filters.in_cart_of)
        .bind(pagination.limit_i64())
        .bind(pagination.offset())
        .fetch_all(self.pool)
        .await?;

        // The window total is lost when the page is empty
        let total = match rows.first() {
            Some(row) => row.total,
            None => self.count(filters).await?,
        };

        let triples = rows
            .into_iter()
            .map(|r| (r.recipe, r.is_favorited, r.is_in_shopping_cart))
            .collect();
        let details = self.hydrate(triples, viewer).await?;
        Ok((details, total))
    }

    async fn count(&self, filters: &RecipeFilters) -> Result<i64, StorageError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM recipes r
            WHERE ($1::BIGINT IS NULL OR r.author_id = $1)
              AND ($2::TEXT[] IS NULL OR EXISTS (
                    SELECT 1 FROM recipe_tags rt
                    JOIN tags t ON t.id = rt.tag_id
                    WHERE rt.recipe_id = r.id AND t.slug = ANY($2)))
              AND ($3::BIGINT IS NULL OR EXISTS (
                    SELECT 1 FROM favorites ff
                    WHERE ff.recipe_id = r.id AND ff.user_id = $3))
              AND ($4::BIGINT IS NULL OR EXISTS (
                    SELECT 1 FROM shopping_cart cc
                    WHERE cc.recipe_id = r.id AND cc.user_id = $4))
            "#,
        )
        .bind(filters.author)
        .bind(filters.tag_slugs.as_deref())
        .bind(filters.favorited_by)
        .bind(filters.in_cart_of)
        .fetch_one(self.pool)
        .await?;
        Ok(count.0)
    }

    /// Create a recipe with its tag and ingredient links (atomic).
    pub async fn create(&self, new: NewRecipe<'_>) -> Result<i64, StorageError> {
        let mut tx = self.pool.begin().await?;

        let (recipe_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO recipes (author_id, name, text, image, cooking_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(new.author_id)
        .bind(new.name)
        .bind(new.text)
        .bind(new.image)
        .bind(new.cooking_time)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint_error(e, "recipe"))?;

        attach_tags(&mut tx, recipe_id, new.tag_ids).await?;
        attach_ingredients(&mut tx, recipe_id, new.ingredients).await?;

        tx.commit().await?;
        Ok(recipe_id)
    }

    /// Update a recipe and replace its tag and ingredient links (atomic).
    pub async fn update(&self, id: i64, write: RecipeWrite<'_>) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE recipes
            SET name = COALESCE($2, name),
                text = COALESCE($3, text),
                image = COALESCE($4, image),
                cooking_time = COALESCE($5, cooking_time),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(write.name)
        .bind(write.text)
        .bind(write.image)
        .bind(write.cooking_time)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("recipe", id));
        }

        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        attach_tags(&mut tx, id, write.tag_ids).await?;

        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        attach_ingredients(&mut tx, id, write.ingredients).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete a recipe; joins cascade. Reports whether a row existed.
    pub async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Recipes per author in short form, newest first, optionally capped
    /// per author. Used by subscription listings.
    pub async fn short_by_authors(
        &self,
        author_ids: &[i64],
        per_author_limit: Option<i64>,
    ) -> Result<Vec<AuthorRecipeRow>, StorageError> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, AuthorRecipeRow>(
            r#"
            SELECT author_id, id, name, image, cooking_time
            FROM (
                SELECT r.author_id, r.id, r.name, r.image, r.cooking_time,
                       ROW_NUMBER() OVER (
                           PARTITION BY r.author_id
                           ORDER BY r.created_at DESC, r.id DESC
                       ) AS rn
                FROM recipes r
                WHERE r.author_id = ANY($1)
            ) ranked
            WHERE $2::BIGINT IS NULL OR rn <= $2
            ORDER BY author_id, rn
            "#,
        )
        .bind(author_ids)
        .bind(per_author_limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Recipe counts per author, independent of any listing limit.
    pub async fn counts_by_authors(
        &self,
        author_ids: &[i64],
    ) -> Result<HashMap<i64, i64>, StorageError> {
        if author_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT author_id, COUNT(*)
            FROM recipes
            WHERE author_id = ANY($1)
            GROUP BY author_id
            "#,
        )
        .bind(author_ids)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    /// Attach tags, ingredients, authors and subscription flags to a page
    /// of recipe rows, preserving row order.
    async fn hydrate(
        &self,
        rows: Vec<(Recipe, bool, bool)>,
        viewer: Option<i64>,
    ) -> Result<Vec<RecipeDetails>, StorageError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let recipe_ids: Vec<i64> = rows.iter().map(|(r, _, _)| r.id).collect();
        let author_ids: Vec<i64> = {
            let mut seen = HashSet::new();
            rows.iter()
                .map(|(r, _, _)| r.author_id)
                .filter(|id| seen.insert(*id))
                .collect()
        };

        let authors = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, first_name, last_name, password_hash, avatar, created_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(&author_ids)
        .fetch_all(self.pool)
        .await?;
        let author_map: HashMap<i64, User> = authors.into_iter().map(|u| (u.id, u)).collect();

        let subscribed = match viewer {
            Some(viewer_id) => {
                SubscriptionRepo::new(self.pool)
                    .subscribed_author_ids(viewer_id, &author_ids)
                    .await?
            }
            None => HashSet::new(),
        };

        #[derive(sqlx::FromRow)]
        struct TagRow {
            recipe_id: i64,
            id: i64,
            name: String,
            slug: String,
        }
        let tag_rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT rt.recipe_id, t.id, t.name, t.slug
            FROM recipe_tags rt
            JOIN tags t ON t.id = rt.tag_id
            WHERE rt.recipe_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(&recipe_ids)
        .fetch_all(self.pool)
        .await?;
        let mut tags_by_recipe: HashMap<i64, Vec<Tag>> = HashMap::new();
        for row in tag_rows {
            tags_by_recipe.entry(row.recipe_id).or_default().push(Tag {
                id: row.id,
                name: row.name,
                slug: row.slug,
            });
        }

        #[derive(sqlx::FromRow)]
        struct IngredientLineRow {
            recipe_id: i64,
            id: i64,
            name: String,
            measurement_unit: String,
            amount: i32,
        }
        let ingredient_rows = sqlx::query_as::<_, IngredientLineRow>(
            r#"
            SELECT ri.recipe_id, i.id, i.name, i.measurement_unit, ri.amount
            FROM recipe_ingredients ri
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = ANY($1)
            ORDER BY ri.id
            "#,
        )
        .bind(&recipe_ids)
        .fetch_all(self.pool)
        .await?;
        let mut ingredients_by_recipe: HashMap<i64, Vec<RecipeIngredientRow>> = HashMap::new();
        for row in ingredient_rows {
            ingredients_by_recipe
                .entry(row.recipe_id)
                .or_default()
                .push(RecipeIngredientRow {
                    id: row.id,
                    name: row.name,
                    measurement_unit: row.measurement_unit,
                    amount: row.amount,
                });
        }

        let mut details = Vec::with_capacity(rows.len());
        for (recipe, is_favorited, is_in_shopping_cart) in rows {
            let author = author_map
                .get(&recipe.author_id)
                .cloned()
                .ok_or_else(|| StorageError::not_found("user", recipe.author_id))?;
            let author_subscribed = subscribed.contains(&recipe.author_id);
            details.push(RecipeDetails {
                tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
                ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
                author,
                author_subscribed,
                is_favorited,
                is_in_shopping_cart,
                recipe,
            });
        }
        Ok(details)
    }
}

async fn attach_tags(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    tag_ids: &[i64],
) -> Result<(), StorageError> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) SELECT $1, UNNEST($2::BIGINT[])")
        .bind(recipe_id)
        .bind(tag_ids)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_constraint_error(e, "tag"))?;
    Ok(())
}

async fn attach_ingredients(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    items: &[IngredientAmount],
) -> Result<(), StorageError> {
    if items.is_empty() {
        return Ok(());
    }
    let ids: Vec<i64> = items.iter().map(|i| i.ingredient_id).collect();
    let amounts: Vec<i32> = items.iter().map(|i| i.amount).collect();
    sqlx::query(
        r#"
        INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount)
        SELECT $1, ingredient_id, amount
        FROM UNNEST($2::BIGINT[], $3::INT[]) AS u(ingredient_id, amount)
        "#,
    )
    .bind(recipe_id)
    .bind(&ids)
    .bind(&amounts)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_constraint_error(e, "ingredient"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::users::{NewUser, UserRepo};

    async fn test_pool() -> PgPool {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required for storage tests");
        let pool = PgPool::connect(&url).await.expect("connect");
        sqlx::migrate!("./migrations").run(&pool).await.expect("migrate");
        pool
    }

    async fn make_author(pool: &PgPool) -> User {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        UserRepo::new(pool)
            .create(NewUser {
                email: &format!("author-{}@example.com", suffix),
                username: &format!("author-{}", suffix),
                first_name: "Recipe",
                last_name: "Author",
                password_hash: "x",
            })
            .await
            .expect("create author")
    }

    async fn make_tag(pool: &PgPool) -> i64 {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let (id,): (i64,) =
            sqlx::query_as("INSERT INTO tags (name, slug) VALUES ($1, $2) RETURNING id")
                .bind(format!("tag-{}", &suffix[..8]))
                .bind(format!("slug-{}", &suffix[..8]))
                .fetch_one(pool)
                .await
                .expect("create tag");
        id
    }

    async fn make_ingredient(pool: &PgPool) -> i64 {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, 'g') RETURNING id",
        )
        .bind(format!("ingredient-{}", suffix))
        .fetch_one(pool)
        .await
        .expect("create ingredient");
        id
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_and_fetch_details() {
        let pool = test_pool().await;
        let repo = RecipeRepo::new(&pool);
        let author = make_author(&pool).await;
        let tag_id = make_tag(&pool).await;
        let ingredient_id = make_ingredient(&pool).await;

        let recipe_id = repo
            .create(NewRecipe {
                author_id: author.id,
                name: "Pancakes",
                text: "Mix and fry.",
                image: "recipes/test.png",
                cooking_time: 20,
                tag_ids: &[tag_id],
                ingredients: &[IngredientAmount {
                    ingredient_id,
                    amount: 200,
                }],
            })
            .await
            .expect("create recipe");

        let details = repo.details(recipe_id, None).await.expect("details");
        assert_eq!(details.recipe.name, "Pancakes");
        assert_eq!(details.author.id, author.id);
        assert_eq!(details.tags.len(), 1);
        assert_eq!(details.ingredients.len(), 1);
        assert_eq!(details.ingredients[0].amount, 200);
        assert!(!details.is_favorited);
        assert!(!details.is_in_shopping_cart);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn update_replaces_links() {
        let pool = test_pool().await;
        let repo = RecipeRepo::new(&pool);
        let author = make_author(&pool).await;
        let tag_a = make_tag(&pool).await;
        let tag_b = make_tag(&pool).await;
        let ing_a = make_ingredient(&pool).await;
        let ing_b = make_ingredient(&pool).await;

        let recipe_id = repo
            .create(NewRecipe {
                author_id: author.id,
                name: "Soup",
                text: "Boil.",
                image: "recipes/soup.png",
                cooking_time: 40,
                tag_ids: &[tag_a],
                ingredients: &[IngredientAmount {
                    ingredient_id: ing_a,
                    amount: 1,
                }],
            })
            .await
            .expect("create");

        repo.update(
            recipe_id,
            RecipeWrite {
                name: Some("Better soup"),
                text: None,
                image: None,
                cooking_time: None,
                tag_ids: &[tag_b],
                ingredients: &[IngredientAmount {
                    ingredient_id: ing_b,
                    amount: 5,
                }],
            },
        )
        .await
        .expect("update");

        let details = repo.details(recipe_id, None).await.expect("details");
        assert_eq!(details.recipe.name, "Better soup");
        assert_eq!(details.recipe.text, "Boil.");
        assert_eq!(details.tags[0].id, tag_b);
        assert_eq!(details.ingredients[0].id, ing_b);
        assert_eq!(details.ingredients[0].amount, 5);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn duplicate_ingredient_link_rejected() {
        let pool = test_pool().await;
        let repo = RecipeRepo::new(&pool);
        let author = make_author(&pool).await;
        let ingredient_id = make_ingredient(&pool).await;

        let err = repo
            .create(NewRecipe {
                author_id: author.id,
                name: "Broken",
                text: "x",
                image: "recipes/broken.png",
                cooking_time: 5,
                tag_ids: &[],
                ingredients: &[
                    IngredientAmount {
                        ingredient_id,
                        amount: 1,
                    },
                    IngredientAmount {
                        ingredient_id,
                        amount: 2,
                    },
                ],
            })
            .await
            .expect_err("duplicate link");
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn list_filters_by_author() {
        let pool = test_pool().await;
        let repo = RecipeRepo::new(&pool);
        let author = make_author(&pool).await;
        let other = make_author(&pool).await;

        for (who, name) in [(&author, "Mine"), (&other, "Theirs")] {
            repo.create(NewRecipe {
                author_id: who.id,
                name,
                text: "x",
                image: "recipes/x.png",
                cooking_time: 5,
                tag_ids: &[],
                ingredients: &[],
            })
            .await
            .expect("create");
        }

        let filters = RecipeFilters {
            author: Some(author.id),
            ..Default::default()
        };
        let (page, total) = repo
            .list(&filters, None, &Pagination::new(1, 10))
            .await
            .expect("list");
        assert_eq!(total, 1);
        assert_eq!(page[0].recipe.name, "Mine");
        assert_eq!(page[0].author.id, author.id);
    }
}
