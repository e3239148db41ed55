//! Domain-shaped cache operations.
//!
//! Each helper binds one [`CacheKey`] variant to one [`TtlTier`]. Callers
//! never see store failures: a miss and an outage look the same.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::cache::keys::SEARCH_PATTERN;
use crate::cache::{CacheKey, CacheStore, TtlTier};
use crate::utils::hash::{json_digest, short_digest};

/// Lifetime of the health-check sentinel key.
const HEALTH_CHECK_TTL_SECS: u64 = 10;

/// Result of the synthetic store round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheHealth {
    pub ok: bool,
    pub message: String,
}

/// Generates a typed get/set pair plus a single-key delete for one cached
/// entity.
macro_rules! entity_accessors {
    ($(
        $(#[$meta:meta])*
        $get:ident / $set:ident / $invalidate:ident ( $($arg:ident),* ) => $key:expr, $tier:expr;
    )*) => {
        $(
            $(#[$meta])*
            pub async fn $get<T: DeserializeOwned>(&self, $($arg: &str),*) -> Option<T> {
                self.store.get(&$key.build()).await
            }

            $(#[$meta])*
            pub async fn $set<T: Serialize + ?Sized>(&self, $($arg: &str,)* value: &T) -> bool {
                self.store.set(&$key.build(), value, $tier.seconds()).await
            }

            $(#[$meta])*
            pub async fn $invalidate(&self, $($arg: &str),*) -> bool {
                self.store.del(&$key.build()).await
            }
        )*
    };
}

/// Façade over [`CacheStore`] for the recipe domain.
#[derive(Clone)]
pub struct CacheService {
    store: CacheStore,
}

impl CacheService {
    pub fn new(store: CacheStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    entity_accessors! {
        /// A user's profile document.
        get_user_profile / set_user_profile / invalidate_user_profile(user_id)
            => CacheKey::UserProfile(user_id), TtlTier::Long;
        /// A user's favourite recipes.
        get_user_favorites / set_user_favorites / invalidate_user_favorites(user_id)
            => CacheKey::UserFavorites(user_id), TtlTier::Medium;
        /// Recipes authored or saved by a user.
        get_user_recipes / set_user_recipes / invalidate_user_recipes(user_id)
            => CacheKey::UserRecipes(user_id), TtlTier::Medium;
        get_recipe / set_recipe / invalidate_recipe(recipe_id)
            => CacheKey::Recipe(recipe_id), TtlTier::Long;
        get_recipe_reviews / set_recipe_reviews / invalidate_recipe_reviews(recipe_id)
            => CacheKey::RecipeReviews(recipe_id), TtlTier::Medium;
        get_popular_recipes / set_popular_recipes / invalidate_popular_recipes()
            => CacheKey::PopularRecipes, TtlTier::Medium;
        get_recent_recipes / set_recent_recipes / invalidate_recent_recipes()
            => CacheKey::RecentRecipes, TtlTier::Short;
        get_session / set_session / delete_session(session_id)
            => CacheKey::Session(session_id), TtlTier::Long;
    }

    // ========================================================================
    // Search
    // ========================================================================

    pub async fn get_search_results<T, F>(&self, query: &str, filters: &F) -> Option<T>
    where
        T: DeserializeOwned,
        F: Serialize + ?Sized,
    {
        let key = search_key(query, filters)?;
        self.store.get(&key).await
    }

    pub async fn set_search_results<T, F>(&self, query: &str, filters: &F, results: &T) -> bool
    where
        T: Serialize + ?Sized,
        F: Serialize + ?Sized,
    {
        match search_key(query, filters) {
            Some(key) => {
                self.store
                    .set(&key, results, TtlTier::Short.seconds())
                    .await
            }
            None => false,
        }
    }

    /// Drop the cached results for one query and filter combination.
    pub async fn invalidate_search_results<F: Serialize + ?Sized>(
        &self,
        query: &str,
        filters: &F,
    ) -> bool {
        match search_key(query, filters) {
            Some(key) => self.store.del(&key).await,
            None => false,
        }
    }

    pub async fn get_search_suggestions<T: DeserializeOwned>(&self, query: &str) -> Option<T> {
        let query = normalize_query(query);
        self.store
            .get(&CacheKey::SearchSuggestions(&query).build())
            .await
    }

    pub async fn set_search_suggestions<T: Serialize + ?Sized>(
        &self,
        query: &str,
        suggestions: &T,
    ) -> bool {
        let query = normalize_query(query);
        self.store
            .set(
                &CacheKey::SearchSuggestions(&query).build(),
                suggestions,
                TtlTier::Medium.seconds(),
            )
            .await
    }

    // ========================================================================
    // AI generation
    // ========================================================================

    /// A generated recipe, keyed by a digest of the prompt.
    pub async fn get_ai_recipe<T: DeserializeOwned>(&self, prompt: &str) -> Option<T> {
        let hash = prompt_hash(prompt);
        self.store.get(&CacheKey::AiRecipe(&hash).build()).await
    }

    pub async fn set_ai_recipe<T: Serialize + ?Sized>(&self, prompt: &str, recipe: &T) -> bool {
        let hash = prompt_hash(prompt);
        self.store
            .set(
                &CacheKey::AiRecipe(&hash).build(),
                recipe,
                TtlTier::VeryLong.seconds(),
            )
            .await
    }

    pub async fn invalidate_ai_recipe(&self, prompt: &str) -> bool {
        let hash = prompt_hash(prompt);
        self.store.del(&CacheKey::AiRecipe(&hash).build()).await
    }

    // ========================================================================
    // Transient data
    // ========================================================================

    pub async fn get_temp<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.store.get(&CacheKey::Temp(key).build()).await
    }

    /// Store transient data; `tier` defaults to [`TtlTier::Short`].
    pub async fn set_temp<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        tier: Option<TtlTier>,
    ) -> bool {
        let ttl = tier.unwrap_or(TtlTier::Short).seconds();
        self.store.set(&CacheKey::Temp(key).build(), value, ttl).await
    }

    pub async fn delete_temp(&self, key: &str) -> bool {
        self.store.del(&CacheKey::Temp(key).build()).await
    }

    // ========================================================================
    // Counters
    // ========================================================================

    /// Returns the new view count, or 0 when the store is unavailable.
    pub async fn increment_recipe_views(&self, recipe_id: &str) -> i64 {
        self.store
            .incr(
                &CacheKey::RecipeViews(recipe_id).build(),
                TtlTier::VeryLong.seconds(),
            )
            .await
    }

    pub async fn get_recipe_views(&self, recipe_id: &str) -> i64 {
        self.store
            .get(&CacheKey::RecipeViews(recipe_id).build())
            .await
            .unwrap_or(0)
    }

    /// Record `user_id` as active on `date` (`YYYY-MM-DD`).
    pub async fn track_daily_active_user(&self, date: &str, user_id: &str) -> bool {
        let key = CacheKey::DailyActiveUsers(date).build();
        let added = self.store.sadd(&key, user_id).await;
        self.store.expire(&key, TtlTier::VeryLong.seconds()).await;
        added
    }

    pub async fn is_daily_active_user(&self, date: &str, user_id: &str) -> bool {
        self.store
            .sismember(&CacheKey::DailyActiveUsers(date).build(), user_id)
            .await
    }

    /// Count calls by one user to one endpoint in a fixed window of `window`.
    pub async fn increment_api_usage(&self, user_id: &str, endpoint: &str, window: TtlTier) -> i64 {
        self.store
            .incr(
                &CacheKey::ApiRateLimit { user_id, endpoint }.build(),
                window.seconds(),
            )
            .await
    }

    // ========================================================================
    // Cache-aside
    // ========================================================================

    /// Return the cached value under `key`, or run `loader` and cache its
    /// successful result. Loader errors propagate and are never cached.
    pub async fn get_or_set<T, E, F, Fut>(&self, key: &str, tier: TtlTier, loader: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.store.get(key).await {
            return Ok(cached);
        }
        let value = loader().await?;
        self.store.set(key, &value, tier.seconds()).await;
        Ok(value)
    }

    // ========================================================================
    // Invalidation groups
    // ========================================================================
    //
    // Branches run concurrently and are best effort: a failed branch is
    // logged, not retried, and does not undo the others.

    /// Clear a user's profile, favourites and every cached recipe list.
    ///
    /// The recipe lists go by prefix glob, so clearing `u1` also clears
    /// the lists of any user id that starts with `u1` (`u10`, `u1x`, ...).
    pub async fn invalidate_user_data(&self, user_id: &str) -> bool {
        let profile = CacheKey::UserProfile(user_id).build();
        let favorites = CacheKey::UserFavorites(user_id).build();
        let recipes = CacheKey::UserRecipes(user_id).pattern();

        let (profile_ok, favorites_ok, recipes_ok) = futures::join!(
            self.store.del(&profile),
            self.store.del(&favorites),
            self.store.del_pattern(&recipes),
        );

        group_outcome(
            "user",
            user_id,
            &[
                (profile.as_str(), profile_ok),
                (favorites.as_str(), favorites_ok),
                (recipes.as_str(), recipes_ok),
            ],
        )
    }

    /// Clear a recipe, its reviews, and the listings it may appear in.
    pub async fn invalidate_recipe_data(&self, recipe_id: &str) -> bool {
        let recipe = CacheKey::Recipe(recipe_id).build();
        let reviews = CacheKey::RecipeReviews(recipe_id).build();
        let popular = CacheKey::PopularRecipes.build();
        let recent = CacheKey::RecentRecipes.build();

        let (recipe_ok, reviews_ok, popular_ok, recent_ok) = futures::join!(
            self.store.del(&recipe),
            self.store.del(&reviews),
            self.store.del(&popular),
            self.store.del(&recent),
        );

        group_outcome(
            "recipe",
            recipe_id,
            &[
                (recipe.as_str(), recipe_ok),
                (reviews.as_str(), reviews_ok),
                (popular.as_str(), popular_ok),
                (recent.as_str(), recent_ok),
            ],
        )
    }

    /// Clear every cached search result and suggestion list.
    pub async fn invalidate_search_cache(&self) -> bool {
        let ok = self.store.del_pattern(SEARCH_PATTERN).await;
        group_outcome("search", "*", &[(SEARCH_PATTERN, ok)])
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Write a sentinel key, read it back and delete it.
    pub async fn health_check(&self) -> CacheHealth {
        let token = Uuid::new_v4().to_string();
        let key = CacheKey::Temp(&format!("health-check-{token}")).build();

        let written = self.store.set(&key, &token, HEALTH_CHECK_TTL_SECS).await;
        let read: Option<String> = self.store.get(&key).await;
        self.store.del(&key).await;

        match (written, read) {
            (true, Some(value)) if value == token => CacheHealth {
                ok: true,
                message: "Cache round trip succeeded".to_string(),
            },
            (true, Some(_)) => CacheHealth {
                ok: false,
                message: "Cache returned a different sentinel value".to_string(),
            },
            (true, None) => CacheHealth {
                ok: false,
                message: "Sentinel key could not be read back".to_string(),
            },
            (false, _) => CacheHealth {
                ok: false,
                message: "Sentinel key could not be written".to_string(),
            },
        }
    }
}

fn group_outcome(group: &str, id: &str, branches: &[(&str, bool)]) -> bool {
    let mut all_ok = true;
    for (target, ok) in branches {
        if !ok {
            all_ok = false;
            warn!(group, id = %id, target = %target, "Cache invalidation branch failed");
        }
    }
    all_ok
}

/// Lower-case, trim and collapse whitespace so equivalent queries share a key.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn search_key<F: Serialize + ?Sized>(query: &str, filters: &F) -> Option<String> {
    let filters_hash = match json_digest(filters) {
        Ok(hash) => hash,
        Err(e) => {
            warn!(error = %e, "Search filters could not be hashed");
            return None;
        }
    };
    let query = normalize_query(query);
    Some(
        CacheKey::Search {
            query: &query,
            filters_hash: &filters_hash,
        }
        .build(),
    )
}

fn prompt_hash(prompt: &str) -> String {
    short_digest(prompt.trim().as_bytes())
}
