//! UI rendering module for the recipe explorer
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod help_overlay;
pub mod menu;
pub mod recipe_detail;
pub mod recipe_list;

pub use help_overlay::render as render_help_overlay;
pub use menu::{render_menu, render_prompt};
pub use recipe_detail::render as render_recipe_detail;
pub use recipe_list::{render_favorites, render_results};

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, StatusKind};

/// Renders the status message (or a busy notice) into a one-line area
pub fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.is_busy() {
        Line::from(Span::styled(
            "Loading recipes...",
            Style::default().fg(Color::Cyan),
        ))
    } else if let Some(status) = &app.status {
        let color = match status.kind {
            StatusKind::Info => Color::Green,
            StatusKind::Warning => Color::Yellow,
        };
        Line::from(Span::styled(status.text.clone(), Style::default().fg(color)))
    } else {
        Line::from("")
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// Renders a dimmed key-hint line
pub fn render_hints(frame: &mut Frame, area: Rect, hints: &str) {
    let paragraph = Paragraph::new(hints.to_string()).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}
