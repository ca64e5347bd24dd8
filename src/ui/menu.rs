//! Main menu and text prompt screens

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, MenuItem, PromptKind};

/// Splits the screen into header, body, status line and hint line
fn screen_layout(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(3),    // Body
            Constraint::Length(1), // Status
            Constraint::Length(1), // Key hints
        ])
        .split(area)
}

fn render_title(frame: &mut Frame, area: Rect) {
    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            "Recipe Explorer",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  powered by TheMealDB", Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::BOTTOM));

    frame.render_widget(title, area);
}

/// Renders the main menu
pub fn render_menu(frame: &mut Frame, app: &App) {
    let chunks = screen_layout(frame.area());

    render_title(frame, chunks[0]);

    let lines: Vec<Line> = MenuItem::ALL
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let selected = i == app.menu_index;
            let marker = if selected { "▶ " } else { "  " };
            let style = if selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(marker, style),
                Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(item.label(), style),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), chunks[1]);
    super::render_status(frame, app, chunks[2]);
    super::render_hints(frame, chunks[3], "↑↓ move  Enter select  1-8 shortcut  ? help  q quit");
}

/// Renders the text prompt for a search
pub fn render_prompt(frame: &mut Frame, app: &App, kind: PromptKind) {
    let chunks = screen_layout(frame.area());

    render_title(frame, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(chunks[1]);

    let input = Paragraph::new(Line::from(vec![
        Span::raw(app.input.clone()),
        Span::styled("█", Style::default().fg(Color::Cyan)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", kind.question())),
    );

    frame.render_widget(input, body[0]);
    super::render_status(frame, app, chunks[2]);
    super::render_hints(frame, chunks[3], "Enter search  Esc back");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlStore;
    use crate::data::{FavoritesStore, RecipeClient};
    use crate::explorer::Explorer;
    use ratatui::{backend::TestBackend, Terminal};
    use tempfile::TempDir;

    fn create_test_app() -> (App, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let explorer = Explorer::with_parts(
            RecipeClient::with_base_url("http://127.0.0.1:9"),
            TtlStore::new(temp_dir.path().join("cache.json")),
            FavoritesStore::new(temp_dir.path().join("favorites.json")),
        );
        (App::new(explorer), temp_dir)
    }

    fn rendered(draw: impl FnOnce(&mut Frame)) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(draw).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_menu_lists_every_item() {
        let (app, _temp_dir) = create_test_app();

        let content = rendered(|frame| render_menu(frame, &app));

        assert!(content.contains("Recipe Explorer"));
        for item in MenuItem::ALL {
            assert!(content.contains(item.label()), "missing {}", item.label());
        }
    }

    #[test]
    fn test_prompt_shows_question_and_input() {
        let (mut app, _temp_dir) = create_test_app();
        app.input = "tarragon".to_string();

        let content = rendered(|frame| render_prompt(frame, &app, PromptKind::Ingredient));

        assert!(content.contains("Ingredient"));
        assert!(content.contains("tarragon"));
    }
}
