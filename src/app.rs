//! Application state management for the recipe explorer
//!
//! This module contains the console menu state machine. Key handling is
//! synchronous and only records what to do next as a pending [`Action`]; the
//! main loop then awaits [`App::run_pending`], which talks to the [`Explorer`].

use crossterm::event::{KeyCode, KeyEvent};

use crate::cli::StartupConfig;
use crate::data::Recipe;
use crate::explorer::{Explorer, Outcome};

/// Entries of the main menu, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    SearchByName,
    LookupById,
    SearchByLetters,
    SearchByIngredient,
    Random,
    Favorites,
    ClearExpired,
    Quit,
}

impl MenuItem {
    pub const ALL: [MenuItem; 8] = [
        MenuItem::SearchByName,
        MenuItem::LookupById,
        MenuItem::SearchByLetters,
        MenuItem::SearchByIngredient,
        MenuItem::Random,
        MenuItem::Favorites,
        MenuItem::ClearExpired,
        MenuItem::Quit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::SearchByName => "Search recipes by name",
            MenuItem::LookupById => "Look up a recipe by id",
            MenuItem::SearchByLetters => "Browse by first letters",
            MenuItem::SearchByIngredient => "Search by ingredient",
            MenuItem::Random => "Surprise me (random recipe)",
            MenuItem::Favorites => "View favorites",
            MenuItem::ClearExpired => "Clear expired cache entries",
            MenuItem::Quit => "Quit",
        }
    }
}

/// What the text prompt is collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Name,
    RecipeId,
    Letters,
    Ingredient,
}

impl PromptKind {
    pub fn question(&self) -> &'static str {
        match self {
            PromptKind::Name => "Recipe name",
            PromptKind::RecipeId => "Recipe id",
            PromptKind::Letters => "First letters (e.g. abc)",
            PromptKind::Ingredient => "Ingredient",
        }
    }
}

/// Work queued by a key press, executed by [`App::run_pending`]
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Search(String),
    Lookup(String),
    Letters(String),
    Ingredient(String),
    Random,
    Related(Recipe),
    ShowFavorites,
    ToggleFavorite(Recipe),
    RemoveFavorite(String),
    ClearExpired,
}

/// Application state enum representing the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Main menu
    Menu,
    /// Text input for a search
    Prompt(PromptKind),
    /// List of recipes returned by a search
    Results,
    /// One recipe in full
    Detail,
    /// Saved favorites
    Favorites,
}

/// Severity of the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Warning,
}

/// One-line message shown under the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// Selected entry of [`MenuItem::ALL`]
    pub menu_index: usize,
    /// Text typed into the prompt
    pub input: String,
    /// Heading of the results view
    pub results_title: String,
    pub results: Vec<Recipe>,
    pub results_index: usize,
    pub favorites: Vec<Recipe>,
    pub favorites_index: usize,
    /// Recipe shown in the detail view
    pub detail: Option<Recipe>,
    pub detail_is_favorite: bool,
    pub detail_scroll: u16,
    /// View to return to when leaving the detail view
    pub detail_origin: AppState,
    pub status: Option<Status>,
    pub show_help: bool,
    pub should_quit: bool,
    /// Work to run on the next loop iteration
    pub pending: Option<Action>,
    /// Last list query, re-run with `r`
    last_query: Option<Action>,
    /// Bypass fresh cache entries for the next action only
    refresh_next: bool,
    explorer: Explorer,
}

impl App {
    /// Creates a new App instance showing the menu
    pub fn new(explorer: Explorer) -> Self {
        Self {
            state: AppState::Menu,
            menu_index: 0,
            input: String::new(),
            results_title: String::new(),
            results: Vec::new(),
            results_index: 0,
            favorites: Vec::new(),
            favorites_index: 0,
            detail: None,
            detail_is_favorite: false,
            detail_scroll: 0,
            detail_origin: AppState::Menu,
            status: None,
            show_help: false,
            should_quit: false,
            pending: None,
            last_query: None,
            refresh_next: false,
            explorer,
        }
    }

    /// Creates a new App instance with the given startup configuration.
    ///
    /// An initial `--search` term is queued so the first loop iteration runs it.
    pub fn with_startup_config(explorer: Explorer, config: &StartupConfig) -> Self {
        let mut app = Self::new(explorer);
        if let Some(term) = &config.initial_search {
            app.pending = Some(Action::Search(term.clone()));
        }
        app
    }

    /// Returns the currently highlighted menu entry
    pub fn selected_menu_item(&self) -> MenuItem {
        MenuItem::ALL[self.menu_index.min(MenuItem::ALL.len() - 1)]
    }

    pub fn selected_result(&self) -> Option<&Recipe> {
        self.results.get(self.results_index)
    }

    pub fn selected_favorite(&self) -> Option<&Recipe> {
        self.favorites.get(self.favorites_index)
    }

    /// Whether an action is waiting to run
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    fn info(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            kind: StatusKind::Info,
            text: text.into(),
        });
    }

    fn warn(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            kind: StatusKind::Warning,
            text: text.into(),
        });
    }

    /// Handles keyboard input based on current state
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Ignore input while an action is running
        if self.pending.is_some() {
            return;
        }

        // Help overlay intercepts all keys when shown
        if self.show_help {
            if matches!(
                key_event.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return;
        }

        match self.state.clone() {
            AppState::Menu => self.handle_menu_key(key_event),
            AppState::Prompt(kind) => self.handle_prompt_key(kind, key_event),
            AppState::Results => self.handle_results_key(key_event),
            AppState::Detail => self.handle_detail_key(key_event),
            AppState::Favorites => self.handle_favorites_key(key_event),
        }
    }

    fn handle_menu_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.menu_index = self.menu_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.menu_index + 1 < MenuItem::ALL.len() {
                    self.menu_index += 1;
                }
            }
            KeyCode::Char(c @ '1'..='8') => {
                self.menu_index = (c as usize) - ('1' as usize);
                self.activate_menu_item();
            }
            KeyCode::Enter => self.activate_menu_item(),
            KeyCode::Char('?') => self.show_help = true,
            _ => {}
        }
    }

    fn activate_menu_item(&mut self) {
        self.status = None;
        match self.selected_menu_item() {
            MenuItem::SearchByName => self.open_prompt(PromptKind::Name),
            MenuItem::LookupById => self.open_prompt(PromptKind::RecipeId),
            MenuItem::SearchByLetters => self.open_prompt(PromptKind::Letters),
            MenuItem::SearchByIngredient => self.open_prompt(PromptKind::Ingredient),
            MenuItem::Random => self.pending = Some(Action::Random),
            MenuItem::Favorites => self.pending = Some(Action::ShowFavorites),
            MenuItem::ClearExpired => self.pending = Some(Action::ClearExpired),
            MenuItem::Quit => self.should_quit = true,
        }
    }

    fn open_prompt(&mut self, kind: PromptKind) {
        self.input.clear();
        self.state = AppState::Prompt(kind);
    }

    fn handle_prompt_key(&mut self, kind: PromptKind, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Esc => {
                self.input.clear();
                self.state = AppState::Menu;
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => {
                let value = self.input.trim().to_string();
                if value.is_empty() {
                    self.warn(format!("{} must not be empty.", kind.question()));
                    return;
                }
                self.status = None;
                self.pending = Some(match kind {
                    PromptKind::Name => Action::Search(value),
                    PromptKind::RecipeId => Action::Lookup(value),
                    PromptKind::Letters => Action::Letters(value),
                    PromptKind::Ingredient => Action::Ingredient(value),
                });
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn handle_results_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                self.status = None;
                self.state = AppState::Menu;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.results_index = self.results_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.results_index + 1 < self.results.len() {
                    self.results_index += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(recipe) = self.selected_result().cloned() {
                    self.open_recipe(recipe, AppState::Results);
                }
            }
            KeyCode::Char('r') => {
                if let Some(query) = self.last_query.clone() {
                    self.refresh_next = true;
                    self.pending = Some(query);
                }
            }
            KeyCode::Char('?') => self.show_help = true,
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                self.detail_scroll = 0;
                self.status = None;
                self.state = self.detail_origin.clone();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.detail_scroll = self.detail_scroll.saturating_add(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.detail_scroll = self.detail_scroll.saturating_sub(1);
            }
            KeyCode::Char('g') => self.detail_scroll = 0,
            KeyCode::Char('f') => {
                if let Some(recipe) = self.detail.clone() {
                    self.pending = Some(Action::ToggleFavorite(recipe));
                }
            }
            KeyCode::Char('r') => {
                if let Some(recipe) = self.detail.clone() {
                    self.pending = Some(Action::Related(recipe));
                }
            }
            KeyCode::Char('?') => self.show_help = true,
            _ => {}
        }
    }

    fn handle_favorites_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => self.state = AppState::Menu,
            KeyCode::Up | KeyCode::Char('k') => {
                self.favorites_index = self.favorites_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.favorites_index + 1 < self.favorites.len() {
                    self.favorites_index += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(recipe) = self.selected_favorite().cloned() {
                    self.open_recipe(recipe, AppState::Favorites);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(recipe) = self.selected_favorite() {
                    self.pending = Some(Action::RemoveFavorite(recipe.id.clone()));
                }
            }
            KeyCode::Char('?') => self.show_help = true,
            _ => {}
        }
    }

    /// Shows `recipe`, fetching the full record first if it is partial
    fn open_recipe(&mut self, recipe: Recipe, origin: AppState) {
        self.detail_origin = origin;
        if recipe.is_partial() {
            self.pending = Some(Action::Lookup(recipe.id));
        } else {
            self.show_detail(recipe, false);
        }
    }

    fn show_detail(&mut self, recipe: Recipe, is_favorite: bool) {
        self.detail = Some(recipe);
        self.detail_is_favorite = is_favorite;
        self.detail_scroll = 0;
        self.state = AppState::Detail;
    }

    /// Runs the pending action, if any, and updates the view with its outcome
    pub async fn run_pending(&mut self) {
        let Some(action) = self.pending.take() else {
            return;
        };
        let refresh = std::mem::take(&mut self.refresh_next);

        match action {
            Action::Search(term) => {
                let outcome = self.explorer.search(&term, refresh).await;
                self.last_query = Some(Action::Search(term.clone()));
                self.show_results(format!("Recipes matching \"{}\"", term), outcome);
            }
            Action::Letters(letters) => {
                let outcome = self.explorer.by_letters(&letters, refresh).await;
                self.last_query = Some(Action::Letters(letters.clone()));
                self.show_results(format!("Recipes starting with \"{}\"", letters), outcome);
            }
            Action::Ingredient(ingredient) => {
                let outcome = self.explorer.by_ingredient(&ingredient, refresh).await;
                self.last_query = Some(Action::Ingredient(ingredient.clone()));
                self.show_results(format!("Recipes with {}", ingredient), outcome);
            }
            Action::Related(recipe) => {
                let outcome = self.explorer.related(&recipe, refresh).await;
                self.last_query = Some(Action::Related(recipe.clone()));
                self.show_results(format!("More like {}", recipe.name), outcome);
            }
            Action::Lookup(id) => {
                let outcome = self.explorer.details(&id, refresh).await;
                self.show_single(outcome).await;
            }
            Action::Random => {
                self.detail_origin = AppState::Menu;
                let outcome = self.explorer.random().await;
                self.show_single(outcome).await;
            }
            Action::ShowFavorites => {
                self.favorites = self.explorer.favorites().await;
                self.favorites_index = 0;
                self.state = AppState::Favorites;
                if self.favorites.is_empty() {
                    self.info("No favorites yet. Press f on a recipe to save it.");
                }
            }
            Action::ToggleFavorite(recipe) => {
                if self.explorer.is_favorite(&recipe.id).await {
                    if self.explorer.remove_favorite(&recipe.id).await {
                        self.detail_is_favorite = false;
                        self.info(format!("Removed {} from favorites.", recipe.name));
                    } else {
                        self.warn("Could not update favorites.");
                    }
                } else if self.explorer.add_favorite(&recipe).await {
                    self.detail_is_favorite = true;
                    self.info(format!("Saved {} to favorites.", recipe.name));
                } else {
                    self.warn("Could not update favorites.");
                }
            }
            Action::RemoveFavorite(id) => {
                if !self.explorer.remove_favorite(&id).await {
                    self.warn("Could not update favorites.");
                }
                self.favorites = self.explorer.favorites().await;
                self.favorites_index = self
                    .favorites_index
                    .min(self.favorites.len().saturating_sub(1));
            }
            Action::ClearExpired => {
                let removed = self.explorer.evict_expired().await;
                self.info(format!("Removed {} expired cache entries.", removed));
            }
        }
    }

    fn show_results(&mut self, title: String, outcome: Outcome<Vec<Recipe>>) {
        if let Some(message) = outcome.message() {
            self.advise(&outcome, message);
            return;
        }

        if let Outcome::Ready(recipes) = outcome {
            self.results_title = title;
            self.results_index = 0;
            self.info(format!("{} recipes", recipes.len()));
            self.results = recipes;
            self.state = AppState::Results;
        }
    }

    async fn show_single(&mut self, outcome: Outcome<Recipe>) {
        if let Some(message) = outcome.message() {
            self.advise(&outcome, message);
            return;
        }

        if let Outcome::Ready(recipe) = outcome {
            let is_favorite = self.explorer.is_favorite(&recipe.id).await;
            self.status = None;
            self.show_detail(recipe, is_favorite);
        }
    }

    /// Shows a non-ready outcome: "no results" as info, failures as warnings
    fn advise<T>(&mut self, outcome: &Outcome<T>, message: String) {
        match outcome {
            Outcome::NoResults => self.info(message),
            _ => self.warn(message),
        }
    }
}
