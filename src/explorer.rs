//! User-level recipe operations
//!
//! [`Explorer`] ties the API client, the TTL cache, the favorites file and the
//! resilience helpers together. Every operation returns an [`Outcome`] so the
//! UI can tell "nothing found" apart from "too slow" and "offline" without ever
//! seeing an error.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::cache::TtlStore;
use crate::config::Config;
use crate::data::api::normalize_letters;
use crate::data::{ApiError, FavoritesStore, Recipe, RecipeClient};
use crate::resilience::{self, Interrupted, RetryPolicy};

/// Extra time an HTTP request may take after the user-level deadline passed
const ABANDON_GRACE: Duration = Duration::from_secs(2);

/// Result of a user-level operation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Data is available (possibly from a stale cache entry)
    Ready(T),
    /// The sources answered but had nothing
    NoResults,
    /// The API did not answer in time and nothing was cached
    TimedOut(Duration),
    /// The API failed and nothing was cached
    Unavailable(String),
}

impl<T> Outcome<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Outcome::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Advisory text for everything except `Ready`
    pub fn message(&self) -> Option<String> {
        match self {
            Outcome::Ready(_) => None,
            Outcome::NoResults => Some("No results found.".to_string()),
            Outcome::TimedOut(after) => Some(format!(
                "The recipe service did not answer within {:.1}s. Try again later.",
                after.as_secs_f64()
            )),
            Outcome::Unavailable(reason) => Some(format!("Recipes unavailable: {}", reason)),
        }
    }
}

impl Outcome<Vec<Recipe>> {
    fn from_list(result: Result<Vec<Recipe>, ApiError>) -> Self {
        match result {
            Ok(recipes) if recipes.is_empty() => Outcome::NoResults,
            Ok(recipes) => Outcome::Ready(recipes),
            Err(e) => Outcome::from_error(e),
        }
    }
}

impl<T> Outcome<T> {
    fn from_error(error: ApiError) -> Self {
        match error {
            ApiError::TimedOut(after) => Outcome::TimedOut(after),
            other => Outcome::Unavailable(other.to_string()),
        }
    }
}

/// Why one way of loading recipe details came up empty
#[derive(Debug, Error)]
enum DetailsError {
    #[error("recipe service: {0}")]
    Api(#[from] ApiError),

    #[error("recipe {0} does not exist")]
    NotFound(String),

    #[error("recipe {0} is not saved as a favorite")]
    NotFavorite(String),
}

/// Recipe operations with caching, timeouts and fallbacks
#[derive(Debug, Clone)]
pub struct Explorer {
    client: RecipeClient,
    cache: TtlStore,
    favorites: FavoritesStore,
    timeout: Duration,
    retry: RetryPolicy,
    related_limit: usize,
    random_race: usize,
    force_refresh: bool,
}

impl Explorer {
    /// Builds the explorer `main` runs with.
    ///
    /// Fails only if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = RecipeClient::with_timeouts(
            config.api_base_url.clone(),
            config.request_timeout,
            config.request_timeout + ABANDON_GRACE,
        )?
        .with_concurrency(config.concurrency);
        let cache = TtlStore::new(&config.cache_path).with_ttl(config.cache_ttl);
        let favorites = FavoritesStore::new(&config.favorites_path);

        Ok(Self {
            client,
            cache,
            favorites,
            timeout: config.request_timeout,
            retry: config.retry,
            related_limit: config.related_limit,
            random_race: config.random_race,
            force_refresh: config.force_refresh,
        })
    }

    /// Builds an explorer from ready-made parts with default tuning
    pub fn with_parts(client: RecipeClient, cache: TtlStore, favorites: FavoritesStore) -> Self {
        Self {
            client,
            cache,
            favorites,
            timeout: Duration::from_secs(8),
            retry: RetryPolicy::default(),
            related_limit: 5,
            random_race: 3,
            force_refresh: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &TtlStore {
        &self.cache
    }

    pub fn favorites_store(&self) -> &FavoritesStore {
        &self.favorites
    }

    /// Recipes whose name contains `term`
    pub async fn search(&self, term: &str, refresh: bool) -> Outcome<Vec<Recipe>> {
        let term = term.trim().to_string();
        let key = format!("search:{}", term.to_lowercase());
        let client = self.client.clone();
        let fetch = async move { client.search_by_name(&term).await };

        self.cached_list(&key, fetch, refresh).await
    }

    /// Recipes starting with any of the given letters
    pub async fn by_letters(&self, letters: &str, refresh: bool) -> Outcome<Vec<Recipe>> {
        let key = format!("letters:{}", normalize_letters(letters).iter().collect::<String>());

        let letters = letters.to_string();
        let client = self.client.clone();
        let fetch = async move { client.search_by_first_letters(&letters).await };

        self.cached_list(&key, fetch, refresh).await
    }

    /// Recipes that use `ingredient`
    pub async fn by_ingredient(&self, ingredient: &str, refresh: bool) -> Outcome<Vec<Recipe>> {
        let ingredient = ingredient.trim().to_string();
        let key = format!("ingredient:{}", ingredient.to_lowercase());
        let client = self.client.clone();
        let fetch = async move { client.search_by_ingredient(&ingredient).await };

        self.cached_list(&key, fetch, refresh).await
    }

    /// Other recipes from the same category as `recipe`
    pub async fn related(&self, recipe: &Recipe, refresh: bool) -> Outcome<Vec<Recipe>> {
        let limit = self.related_limit;
        let key = format!("related:{}:{}", recipe.id, limit);
        let client = self.client.clone();
        let recipe = recipe.clone();
        let fetch = async move { client.get_related(&recipe, limit).await };

        self.cached_list(&key, fetch, refresh).await
    }

    /// A random recipe; whichever of several parallel requests lands first. Never cached.
    pub async fn random(&self) -> Outcome<Recipe> {
        let client = self.client.clone();
        let attempts = self.random_race;
        let fetch = async move { client.get_random_fastest(attempts).await };

        match self.guarded(fetch).await {
            Ok(Some(recipe)) => Outcome::Ready(recipe),
            Ok(None) => Outcome::NoResults,
            Err(e) => Outcome::from_error(e),
        }
    }

    /// Full details of recipe `id`.
    ///
    /// Tries the cached API lookup (retried on failure) first, then the copy
    /// saved in favorites.
    pub async fn details(&self, id: &str, refresh: bool) -> Outcome<Recipe> {
        let id = id.trim();
        let strategies: Vec<BoxFuture<'_, Result<Recipe, DetailsError>>> = vec![
            self.lookup(id, refresh).boxed(),
            async move {
                self.favorites
                    .find_by_id(id)
                    .await
                    .ok_or_else(|| DetailsError::NotFavorite(id.to_string()))
            }
            .boxed(),
        ];

        match resilience::first_success(strategies).await {
            Ok(recipe) => Outcome::Ready(recipe),
            Err(all) => {
                info!(id, error = %all, "recipe details unavailable");
                let api_failure = all.failures.into_iter().find_map(|e| match e {
                    DetailsError::Api(api) => Some(api),
                    _ => None,
                });
                match api_failure {
                    Some(e) => Outcome::from_error(e),
                    None => Outcome::NoResults,
                }
            }
        }
    }

    /// Saved favorites in insertion order
    pub async fn favorites(&self) -> Vec<Recipe> {
        self.favorites.list().await
    }

    pub async fn add_favorite(&self, recipe: &Recipe) -> bool {
        self.favorites.add(recipe).await
    }

    pub async fn remove_favorite(&self, id: &str) -> bool {
        self.favorites.remove(id).await
    }

    pub async fn is_favorite(&self, id: &str) -> bool {
        self.favorites.contains(id).await
    }

    /// Drops expired cache entries; returns how many were removed
    pub async fn evict_expired(&self) -> usize {
        self.cache.evict_expired().await
    }

    async fn lookup(&self, id: &str, refresh: bool) -> Result<Recipe, DetailsError> {
        let key = format!("recipe:{}", id);
        let client = self.client.clone();
        let retry = self.retry;
        let owned_id = id.to_string();
        let fetch = async move { retry.run(|| client.get_by_id(&owned_id)).await };

        let found = self
            .cache
            .get_or_fetch(&key, || self.guarded(fetch), refresh || self.force_refresh)
            .await?;

        found.ok_or_else(|| DetailsError::NotFound(id.to_string()))
    }

    async fn cached_list<F>(&self, key: &str, fetch: F, refresh: bool) -> Outcome<Vec<Recipe>>
    where
        F: std::future::Future<Output = Result<Vec<Recipe>, ApiError>> + Send + 'static,
    {
        let result = self
            .cache
            .get_or_fetch(key, || self.guarded(fetch), refresh || self.force_refresh)
            .await;

        Outcome::from_list(result)
    }

    /// Runs `fetch` under the configured deadline
    async fn guarded<T, F>(&self, fetch: F) -> Result<T, ApiError>
    where
        F: std::future::Future<Output = Result<T, ApiError>> + Send + 'static,
        T: Send + 'static,
    {
        match resilience::with_deadline(fetch, self.timeout).await {
            Ok(result) => result,
            Err(Interrupted::TimedOut(after)) => Err(ApiError::TimedOut(after)),
            Err(Interrupted::Aborted(reason)) => Err(ApiError::Aborted(reason)),
        }
    }
}
