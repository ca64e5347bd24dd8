//! Recipe detail screen UI
//!
//! Renders one recipe in full: heading, ingredients, numbered steps and links,
//! inside a scrollable bordered box.

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::data::Recipe;

/// Color scheme for the detail view
mod colors {
    use ratatui::style::Color;

    /// Section headers
    pub const HEADER: Color = Color::Cyan;
    /// Secondary/dimmed text
    pub const SECONDARY: Color = Color::Gray;
    /// Favorite marker
    pub const FAVORITE: Color = Color::Yellow;
}

/// Renders the recipe detail screen
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Content (scrollable)
            Constraint::Length(1), // Status
            Constraint::Length(1), // Key hints
        ])
        .split(frame.area());

    let Some(recipe) = &app.detail else {
        let empty = Paragraph::new("No recipe selected.")
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, chunks[0]);
        return;
    };

    let mut title = vec![Span::styled(
        format!(" {} ", recipe.name),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if app.detail_is_favorite {
        title.push(Span::styled("★ ", Style::default().fg(colors::FAVORITE)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER))
        .title(Line::from(title));

    let paragraph = Paragraph::new(detail_lines(recipe))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));

    frame.render_widget(paragraph, chunks[0]);
    super::render_status(frame, app, chunks[1]);
    super::render_hints(
        frame,
        chunks[2],
        "↑↓ scroll  f favorite  r related  Esc back  ? help",
    );
}

fn header(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(colors::HEADER)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Builds the content lines for a recipe
pub fn detail_lines(recipe: &Recipe) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let subtitle = recipe.subtitle();
    if !subtitle.is_empty() {
        lines.push(Line::from(Span::styled(
            subtitle,
            Style::default().fg(colors::SECONDARY),
        )));
    }
    if !recipe.tags.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("Tags: {}", recipe.tags.join(", ")),
            Style::default().fg(colors::SECONDARY),
        )));
    }
    lines.push(Line::from(""));

    lines.push(header("Ingredients"));
    if recipe.ingredients.is_empty() {
        lines.push(Line::from("  (not listed)"));
    }
    for ingredient in &recipe.ingredients {
        lines.push(Line::from(format!("  • {}", ingredient.display())));
    }
    lines.push(Line::from(""));

    lines.push(header("Instructions"));
    let steps = recipe.steps();
    if steps.is_empty() {
        lines.push(Line::from("  (no instructions)"));
    }
    for (i, step) in steps.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("{:>3}. ", i + 1), Style::default().fg(Color::Yellow)),
            Span::raw(step.to_string()),
        ]));
    }

    let links: Vec<_> = [("Video", &recipe.youtube), ("Source", &recipe.source)]
        .into_iter()
        .filter_map(|(label, url)| url.as_ref().map(|url| format!("{}: {}", label, url)))
        .collect();
    if !links.is_empty() {
        lines.push(Line::from(""));
        lines.push(header("Links"));
        for link in links {
            lines.push(Line::from(format!("  {}", link)));
        }
    }

    lines
}
