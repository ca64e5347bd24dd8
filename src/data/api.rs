//! TheMealDB recipe API client
//!
//! This module fetches recipes from the public TheMealDB v1 JSON API and
//! normalises the raw meal objects into [`Recipe`] records.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::{dedup_by_id, Ingredient, Recipe};
use crate::resilience;

/// Base URL for the TheMealDB API (public test key)
pub const THEMEALDB_BASE_URL: &str = "https://www.themealdb.com/api/json/v1/1";

/// The API numbers ingredient/measure pairs from 1 to 20
const MAX_INGREDIENTS: usize = 20;

/// Default number of letter searches allowed in flight at once
const DEFAULT_CONCURRENCY: usize = 3;

/// Errors that can occur when talking to the recipe API
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API returned HTTP {0}")]
    Status(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The request did not finish in time
    #[error("Request timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    /// The request task panicked or was aborted
    #[error("Request aborted: {0}")]
    Aborted(String),

    /// Every request of a fan-out failed
    #[error("All {0} requests failed")]
    AllRequestsFailed(usize),
}

/// Envelope used by every endpoint: `{"meals": [...]}`
///
/// `meals` is `null` when nothing matched, and occasionally a string
/// describing an error; both read as "no meals".
#[derive(Debug, Deserialize)]
struct MealsResponse {
    #[serde(default)]
    meals: Value,
}

/// Client for the recipe API
#[derive(Debug, Clone)]
pub struct RecipeClient {
    client: Client,
    base_url: String,
    concurrency: usize,
}

impl Default for RecipeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeClient {
    /// Create a new RecipeClient pointing at TheMealDB
    pub fn new() -> Self {
        Self::with_base_url(THEMEALDB_BASE_URL)
    }

    /// Create a new RecipeClient pointing at another server (mirrors, tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a new RecipeClient whose requests give up on their own.
    ///
    /// `connect_timeout` bounds establishing the connection and
    /// `request_timeout` the whole exchange, so abandoned requests do not
    /// linger for the rest of the process.
    pub fn with_timeouts(
        base_url: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(concat!("recipe-explorer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a new RecipeClient with a custom HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Set how many requests a fan-out may keep in flight
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Searches recipes whose name contains `term`
    pub async fn search_by_name(&self, term: &str) -> Result<Vec<Recipe>, ApiError> {
        self.fetch_meals("search.php", &[("s", term)]).await
    }

    /// Looks up a single recipe; `Ok(None)` when the id is unknown
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Recipe>, ApiError> {
        let meals = self.fetch_meals("lookup.php", &[("i", id)]).await?;
        Ok(meals.into_iter().next())
    }

    /// Lists recipes whose name starts with `letter`
    pub async fn search_by_first_letter(&self, letter: char) -> Result<Vec<Recipe>, ApiError> {
        let letter = letter.to_string();
        self.fetch_meals("search.php", &[("f", letter.as_str())]).await
    }

    /// Searches several first letters with bounded concurrency.
    ///
    /// Non-letters and repeated letters are ignored. Results are merged in
    /// alphabetical letter order without duplicates, so the same set of
    /// letters always yields the same list. Letters whose request failed add
    /// nothing; if every request failed the call fails.
    pub async fn search_by_first_letters(&self, letters: &str) -> Result<Vec<Recipe>, ApiError> {
        let letters = normalize_letters(letters);
        if letters.is_empty() {
            return Ok(Vec::new());
        }

        let searches: Vec<_> = letters
            .iter()
            .map(|&letter| {
                let client = self.clone();
                async move { client.search_by_first_letter(letter).await }
            })
            .collect();
        let results = resilience::run_bounded(searches, self.concurrency).await;

        if results.iter().all(Option::is_none) {
            return Err(ApiError::AllRequestsFailed(letters.len()));
        }

        let merged = results.into_iter().flatten().flatten().collect();
        Ok(dedup_by_id(merged))
    }

    /// Lists recipes that use `ingredient` (partial records)
    pub async fn search_by_ingredient(&self, ingredient: &str) -> Result<Vec<Recipe>, ApiError> {
        let ingredient = ingredient.trim().replace(' ', "_");
        self.fetch_meals("filter.php", &[("i", ingredient.as_str())])
            .await
    }

    /// Lists up to `limit` other recipes from the same category (partial records)
    pub async fn get_related(&self, recipe: &Recipe, limit: usize) -> Result<Vec<Recipe>, ApiError> {
        let Some(category) = recipe.category.as_deref() else {
            return Ok(Vec::new());
        };

        let meals = self.fetch_meals("filter.php", &[("c", category)]).await?;
        Ok(meals
            .into_iter()
            .filter(|meal| meal.id != recipe.id)
            .take(limit)
            .collect())
    }

    /// Fetches one random recipe
    pub async fn get_random(&self) -> Result<Option<Recipe>, ApiError> {
        let meals = self.fetch_meals("random.php", &[]).await?;
        Ok(meals.into_iter().next())
    }

    /// Asks for a random recipe `attempts` times at once and keeps whichever answer lands first
    pub async fn get_random_fastest(&self, attempts: usize) -> Result<Option<Recipe>, ApiError> {
        let requests = (0..attempts.max(1)).map(|_| {
            let client = self.clone();
            async move { client.get_random().await }
        });

        resilience::race(requests).await.unwrap_or(Ok(None))
    }

    /// Issues a GET against `endpoint` and parses the meals envelope
    async fn fetch_meals(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Vec<Recipe>, ApiError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, ?query, "requesting recipes");

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        let envelope: MealsResponse = serde_json::from_str(&text)?;

        Ok(parse_meals(envelope.meals))
    }
}

/// Lowercased ASCII letters from `input`, sorted, no repeats
pub fn normalize_letters(input: &str) -> Vec<char> {
    let mut letters: Vec<char> = input
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    letters.sort_unstable();
    letters.dedup();
    letters
}

/// Converts the `meals` value into recipes, skipping malformed entries
fn parse_meals(meals: Value) -> Vec<Recipe> {
    match meals {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(parse_meal)
            .collect(),
        _ => Vec::new(),
    }
}

/// Normalises one raw meal object; `None` without an id or a name
fn parse_meal(meal: &Map<String, Value>) -> Option<Recipe> {
    let id = text_field(meal, "idMeal")?;
    let name = text_field(meal, "strMeal")?;

    let ingredients = (1..=MAX_INGREDIENTS)
        .filter_map(|n| {
            let name = text_field(meal, &format!("strIngredient{}", n))?;
            Some(Ingredient {
                name,
                measure: text_field(meal, &format!("strMeasure{}", n)),
            })
        })
        .collect();

    let tags = text_field(meal, "strTags")
        .map(|tags| {
            tags.split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(Recipe {
        id,
        name,
        category: text_field(meal, "strCategory"),
        area: text_field(meal, "strArea"),
        instructions: text_field(meal, "strInstructions"),
        thumbnail: text_field(meal, "strMealThumb"),
        tags,
        youtube: text_field(meal, "strYoutube"),
        source: text_field(meal, "strSource"),
        ingredients,
    })
}

/// Reads a string (or number) field, treating blanks and nulls as absent
fn text_field(meal: &Map<String, Value>, key: &str) -> Option<String> {
    let text = match meal.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Trimmed-down lookup.php response
    const FULL_MEAL: &str = r#"{
        "meals": [{
            "idMeal": "52772",
            "strMeal": "Teriyaki Chicken Casserole",
            "strDrinkAlternate": null,
            "strCategory": "Chicken",
            "strArea": "Japanese",
            "strInstructions": "Preheat oven to 350F.\r\nCombine soy sauce.",
            "strMealThumb": "https://www.themealdb.com/images/media/meals/wvpsxx1468256321.jpg",
            "strTags": "Meat,Casserole, ",
            "strYoutube": "https://www.youtube.com/watch?v=4aZr5hZXP_s",
            "strIngredient1": "soy sauce",
            "strIngredient2": "water",
            "strIngredient3": "",
            "strIngredient4": null,
            "strMeasure1": "3/4 cup",
            "strMeasure2": " ",
            "strMeasure3": "",
            "strMeasure4": null,
            "strSource": null
        }]
    }"#;

    #[test]
    fn test_parse_full_meal() {
        let envelope: MealsResponse = serde_json::from_str(FULL_MEAL).unwrap();
        let recipes = parse_meals(envelope.meals);

        assert_eq!(recipes.len(), 1);
        let recipe = &recipes[0];
        assert_eq!(recipe.id, "52772");
        assert_eq!(recipe.name, "Teriyaki Chicken Casserole");
        assert_eq!(recipe.category.as_deref(), Some("Chicken"));
        assert_eq!(recipe.area.as_deref(), Some("Japanese"));
        assert_eq!(recipe.tags, vec!["Meat", "Casserole"]);
        assert_eq!(recipe.source, None);
        assert_eq!(
            recipe.ingredients,
            vec![
                Ingredient {
                    name: "soy sauce".to_string(),
                    measure: Some("3/4 cup".to_string()),
                },
                Ingredient {
                    name: "water".to_string(),
                    measure: None,
                },
            ]
        );
        assert!(!recipe.is_partial());
    }

    #[test]
    fn test_parse_null_meals_is_empty() {
        let envelope: MealsResponse = serde_json::from_str(r#"{"meals": null}"#).unwrap();
        assert!(parse_meals(envelope.meals).is_empty());
    }

    #[test]
    fn test_parse_error_string_meals_is_empty() {
        let envelope: MealsResponse = serde_json::from_str(r#"{"meals": "Invalid ID"}"#).unwrap();
        assert!(parse_meals(envelope.meals).is_empty());
    }

    #[test]
    fn test_parse_skips_meals_without_id() {
        let envelope: MealsResponse = serde_json::from_str(
            r#"{"meals": [{"strMeal": "Nameless"}, {"idMeal": "1", "strMeal": "Kept"}]}"#,
        )
        .unwrap();

        let recipes = parse_meals(envelope.meals);

        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].name, "Kept");
    }

    #[test]
    fn test_filter_record_is_partial() {
        let envelope: MealsResponse = serde_json::from_str(
            r#"{"meals": [{"strMeal": "Brown Stew Chicken", "strMealThumb": "x.jpg", "idMeal": "52940"}]}"#,
        )
        .unwrap();

        let recipes = parse_meals(envelope.meals);

        assert!(recipes[0].is_partial());
        assert_eq!(recipes[0].thumbnail.as_deref(), Some("x.jpg"));
    }

    #[test]
    fn test_normalize_letters() {
        assert_eq!(normalize_letters("aBa1 c!"), vec!['a', 'b', 'c']);
        assert_eq!(normalize_letters("cab"), normalize_letters("bca"));
        assert!(normalize_letters("123").is_empty());
    }

    #[test]
    fn test_with_client_trims_trailing_slash() {
        let client = RecipeClient::with_base_url("http://localhost:1234/api/");
        assert_eq!(client.base_url(), "http://localhost:1234/api");
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn meal(id: &str, name: &str, category: &str) -> Value {
        json!({"idMeal": id, "strMeal": name, "strCategory": category})
    }

    fn meals(items: Vec<Value>) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "meals": items }))
    }

    #[tokio::test]
    async fn test_search_by_name_sends_query() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.php"))
            .and(query_param("s", "arrabiata"))
            .respond_with(meals(vec![meal("52771", "Spicy Arrabiata Penne", "Vegetarian")]))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = RecipeClient::with_base_url(mock_server.uri());
        let recipes = client.search_by_name("arrabiata").await.expect("search failed");

        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].id, "52771");
    }

    #[tokio::test]
    async fn test_get_by_id_unknown_is_none() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lookup.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "meals": null })))
            .mount(&mock_server)
            .await;

        let client = RecipeClient::with_base_url(mock_server.uri());

        assert_eq!(client.get_by_id("0").await.expect("lookup failed"), None);
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = RecipeClient::with_base_url(mock_server.uri());
        let err = client.search_by_name("soup").await.unwrap_err();

        assert!(matches!(err, ApiError::Status(503)));
    }

    #[tokio::test]
    async fn test_invalid_body_is_parse_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let client = RecipeClient::with_base_url(mock_server.uri());
        let err = client.get_random().await.unwrap_err();

        assert!(matches!(err, ApiError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_first_letters_merges_in_order_and_tolerates_failures() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.php"))
            .and(query_param("f", "b"))
            .respond_with(meals(vec![
                meal("2", "Bread", "Side"),
                meal("1", "Apple Frangipan Tart", "Dessert"),
            ]))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search.php"))
            .and(query_param("f", "a"))
            .respond_with(meals(vec![meal("1", "Apple Frangipan Tart", "Dessert")]))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search.php"))
            .and(query_param("f", "c"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = RecipeClient::with_base_url(mock_server.uri()).with_concurrency(2);
        let recipes = client.search_by_first_letters("A c B").await.expect("search failed");

        let ids: Vec<_> = recipes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_first_letters_order_ignores_typing_order() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.php"))
            .and(query_param("f", "a"))
            .respond_with(meals(vec![meal("1", "Apam Balik", "Dessert")]))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search.php"))
            .and(query_param("f", "b"))
            .respond_with(meals(vec![meal("2", "Bakewell Tart", "Dessert")]))
            .mount(&mock_server)
            .await;

        let client = RecipeClient::with_base_url(mock_server.uri());
        let typed_ba = client.search_by_first_letters("ba").await.expect("search failed");
        let typed_ab = client.search_by_first_letters("ab").await.expect("search failed");

        assert_eq!(typed_ba, typed_ab);
        assert_eq!(typed_ba[0].id, "1");
    }

    #[tokio::test]
    async fn test_first_letters_runs_in_a_spawned_task() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.php"))
            .respond_with(meals(vec![meal("3", "Chocolate Gateau", "Dessert")]))
            .mount(&mock_server)
            .await;

        let client = RecipeClient::with_base_url(mock_server.uri());
        let recipes = tokio::spawn(async move { client.search_by_first_letters("cd").await })
            .await
            .expect("task should not panic")
            .expect("search failed");

        assert_eq!(recipes.len(), 1);
    }

    #[tokio::test]
    async fn test_request_timeout_abandons_hung_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(meals(vec![]).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let client = RecipeClient::with_timeouts(
            mock_server.uri(),
            Duration::from_millis(50),
            Duration::from_millis(50),
        )
        .expect("client should build");
        let err = client.get_random().await.unwrap_err();

        assert!(matches!(err, ApiError::RequestFailed(ref e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn test_first_letters_all_failed_is_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = RecipeClient::with_base_url(mock_server.uri());
        let err = client.search_by_first_letters("xy").await.unwrap_err();

        assert!(matches!(err, ApiError::AllRequestsFailed(2)));
    }

    #[tokio::test]
    async fn test_search_by_ingredient_uses_underscores() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/filter.php"))
            .and(query_param("i", "chicken_breast"))
            .respond_with(meals(vec![json!({"idMeal": "5", "strMeal": "Katsu"})]))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = RecipeClient::with_base_url(mock_server.uri());
        let recipes = client.search_by_ingredient(" chicken breast ").await.unwrap();

        assert_eq!(recipes[0].name, "Katsu");
    }

    #[tokio::test]
    async fn test_get_related_excludes_self_and_limits() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/filter.php"))
            .and(query_param("c", "Seafood"))
            .respond_with(meals(vec![
                meal("10", "Fish Pie", "Seafood"),
                meal("11", "Kedgeree", "Seafood"),
                meal("12", "Paella", "Seafood"),
                meal("13", "Sushi", "Seafood"),
            ]))
            .mount(&mock_server)
            .await;

        let client = RecipeClient::with_base_url(mock_server.uri());
        let recipe = Recipe {
            category: Some("Seafood".to_string()),
            ..Recipe::summary("11", "Kedgeree")
        };

        let related = client.get_related(&recipe, 2).await.unwrap();

        let ids: Vec<_> = related.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["10", "12"]);
    }

    #[tokio::test]
    async fn test_get_related_without_category_skips_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(meals(vec![]))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = RecipeClient::with_base_url(mock_server.uri());
        let related = client
            .get_related(&Recipe::summary("1", "Mystery"), 5)
            .await
            .unwrap();

        assert!(related.is_empty());
    }

    #[tokio::test]
    async fn test_get_random_fastest_returns_a_recipe() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/random.php"))
            .respond_with(meals(vec![meal("7", "Shakshuka", "Vegetarian")]))
            .mount(&mock_server)
            .await;

        let client = RecipeClient::with_base_url(mock_server.uri());
        let recipe = client.get_random_fastest(3).await.unwrap();

        assert_eq!(recipe.map(|r| r.name), Some("Shakshuka".to_string()));
    }
}
