//! Recipe list screens
//!
//! Renders search results and the favorites list. Both show one recipe per
//! line with its category and cuisine when known.

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::Recipe;

/// Renders search results
pub fn render_results(frame: &mut Frame, app: &App) {
    render_list(
        frame,
        app,
        &app.results_title,
        &app.results,
        app.results_index,
        "↑↓ move  Enter open  r reload  Esc menu  ? help",
    );
}

/// Renders the favorites list
pub fn render_favorites(frame: &mut Frame, app: &App) {
    render_list(
        frame,
        app,
        "Favorites",
        &app.favorites,
        app.favorites_index,
        "↑↓ move  Enter open  d remove  Esc menu  ? help",
    );
}

fn render_list(
    frame: &mut Frame,
    app: &App,
    title: &str,
    recipes: &[Recipe],
    selected: usize,
    hints: &str,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // List
            Constraint::Length(1), // Status
            Constraint::Length(1), // Key hints
        ])
        .split(frame.area());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", title));

    let inner_height = chunks[0].height.saturating_sub(2) as usize;
    let lines = list_lines(recipes, selected, inner_height);

    frame.render_widget(Paragraph::new(lines).block(block), chunks[0]);
    super::render_status(frame, app, chunks[1]);
    super::render_hints(frame, chunks[2], hints);
}

/// Builds the visible window of lines, keeping the selection on screen
fn list_lines(recipes: &[Recipe], selected: usize, height: usize) -> Vec<Line<'static>> {
    if recipes.is_empty() {
        return vec![Line::from(Span::styled(
            "Nothing here yet.",
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let height = height.max(1);
    let offset = selected.saturating_sub(height - 1);

    recipes
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(i, recipe)| recipe_line(recipe, i == selected))
        .collect()
}

fn recipe_line(recipe: &Recipe, selected: bool) -> Line<'static> {
    let name_style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::styled(if selected { "▶ " } else { "  " }, name_style),
        Span::styled(recipe.name.clone(), name_style),
    ];

    let subtitle = recipe.subtitle();
    if !subtitle.is_empty() {
        spans.push(Span::styled(
            format!("  ({})", subtitle),
            Style::default().fg(Color::DarkGray),
        ));
    }

    spans.push(Span::styled(
        format!("  #{}", recipe.id),
        Style::default().fg(Color::DarkGray),
    ));

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipes(n: usize) -> Vec<Recipe> {
        (0..n)
            .map(|i| Recipe::summary(i.to_string(), format!("Recipe {}", i)))
            .collect()
    }

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_empty_list_shows_placeholder() {
        let lines = list_lines(&[], 0, 10);
        assert_eq!(lines.len(), 1);
        assert!(text(&lines[0]).contains("Nothing here"));
    }

    #[test]
    fn test_window_follows_selection() {
        let all = recipes(20);

        let top = list_lines(&all, 0, 5);
        assert_eq!(top.len(), 5);
        assert!(text(&top[0]).contains("Recipe 0"));

        let scrolled = list_lines(&all, 12, 5);
        assert!(text(&scrolled[0]).contains("Recipe 8"));
        assert!(text(&scrolled[4]).contains("▶ Recipe 12"));
    }

    #[test]
    fn test_recipe_line_includes_subtitle_and_id() {
        let recipe = Recipe {
            category: Some("Pasta".to_string()),
            area: Some("Italian".to_string()),
            ..Recipe::summary("52771", "Spicy Arrabiata Penne")
        };

        let line = text(&recipe_line(&recipe, false));

        assert!(line.contains("Spicy Arrabiata Penne"));
        assert!(line.contains("(Pasta · Italian)"));
        assert!(line.contains("#52771"));
    }
}
