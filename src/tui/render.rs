//! UI rendering functions for the TUI.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::catalog::{Card, CatalogView, Notice, Pager, PosterStatus, ViewBody};

use super::state::App;
use super::types::Screen;

/// Width of one card, borders included.
const CARD_WIDTH: u16 = 30;
/// Height of one card, borders included.
const CARD_HEIGHT: u16 = 5;

/// Draw the UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();
    let view = app.view();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Search bar
            Constraint::Min(0),    // Grid or playback
            Constraint::Length(3), // Pager
            Constraint::Length(1), // Key hints
        ])
        .split(size);

    draw_header(frame, &view, chunks[0]);
    draw_search_bar(frame, app, chunks[1]);

    match app.screen {
        Screen::Catalog => draw_body(frame, app, &view.body, chunks[2]),
        Screen::Playback => draw_playback(frame, app, chunks[2]),
    }

    draw_pager(frame, &view.pager, chunks[3]);
    draw_footer(frame, app, chunks[4]);

    if let Some(error) = &app.error_message {
        draw_error_popup(frame, error);
    }

    if app.show_help {
        draw_help_modal(frame);
    }
}

fn draw_header(frame: &mut Frame, view: &CatalogView, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "Myt-V",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(view.stats.as_str(), Style::default().fg(Color::Cyan)),
    ]))
    .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn draw_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let border_style = if app.search_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let search_text = if app.search_input.is_empty() && !app.search_focused {
        "Press '/' to search..."
    } else {
        &app.search_input
    };

    let search = Paragraph::new(search_text)
        .style(if app.search_focused {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Buscar")
                .border_style(border_style),
        );

    frame.render_widget(search, area);

    if app.search_focused {
        let width = app.search_input.chars().count() as u16;
        frame.set_cursor_position((area.x + width + 1, area.y + 1));
    }
}

fn draw_body(frame: &mut Frame, app: &App, body: &ViewBody, area: Rect) {
    match body {
        ViewBody::Loading => {
            let loading = Paragraph::new("Cargando catálogo...")
                .style(Style::default().fg(Color::Yellow))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(loading, area);
        }
        ViewBody::Failed(notice) => draw_notice(frame, notice, Color::Red, area),
        ViewBody::Empty(notice) => draw_notice(frame, notice, Color::DarkGray, area),
        ViewBody::Grid(cards) => draw_grid(frame, app, cards, area),
    }
}

fn draw_notice(frame: &mut Frame, notice: &Notice, color: Color, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(notice.icon, Style::default().fg(color))),
        Line::from(Span::styled(
            notice.heading,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(notice.detail),
    ];
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(paragraph, area);
}

fn draw_grid(frame: &mut Frame, app: &App, cards: &[Card], area: Rect) {
    let columns = (area.width / CARD_WIDTH).max(1) as usize;
    let visible_rows = (area.height / CARD_HEIGHT).max(1) as usize;

    // Keep the selected card's row on screen
    let selected_row = app.selected / columns;
    let first_row = selected_row.saturating_sub(visible_rows - 1);

    for (index, card) in cards.iter().enumerate() {
        let row = index / columns;
        if row < first_row || row >= first_row + visible_rows {
            continue;
        }
        let col = (index % columns) as u16;
        let rect = Rect {
            x: area.x + col * CARD_WIDTH,
            y: area.y + (row - first_row) as u16 * CARD_HEIGHT,
            width: CARD_WIDTH.min(area.width),
            height: CARD_HEIGHT.min(area.height),
        };
        draw_card(frame, app, card, index == app.selected, rect);
    }
}

fn draw_card(frame: &mut Frame, app: &App, card: &Card, selected: bool, area: Rect) {
    let border_style = if selected {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let poster = match app.posters.status(card.id) {
        Some(PosterStatus::Loaded { size, .. }) => Span::styled(
            format!("🖼 {} KB", size.div_ceil(1024)),
            Style::default().fg(Color::Green),
        ),
        _ => Span::styled(card.poster.placeholder, Style::default().fg(Color::Magenta)),
    };

    let text = vec![
        Line::from(poster),
        Line::from(Span::styled(
            card.subtitle.as_str(),
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(
            card.href.as_str(),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let title = truncate(&card.title, CARD_WIDTH.saturating_sub(4) as usize);
    let paragraph = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border_style),
    );

    frame.render_widget(paragraph, area);
}

fn draw_playback(frame: &mut Frame, app: &App, area: Rect) {
    let Some(playing) = &app.now_playing else {
        return;
    };

    let text = vec![
        Line::from(Span::styled(
            playing.title.as_str(),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!(
            "Modo: {}",
            playing.strategy.as_deref().unwrap_or("...")
        )),
        Line::from(playing.status.as_str()),
        Line::from(""),
        Line::from(Span::styled(
            playing.href.as_str(),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Reproducción"));

    frame.render_widget(paragraph, area);
}

fn draw_pager(frame: &mut Frame, pager: &Pager, area: Rect) {
    let control = |label: &'static str, enabled: bool| {
        if enabled {
            Span::styled(label, Style::default().fg(Color::Cyan))
        } else {
            Span::styled(label, Style::default().fg(Color::DarkGray))
        }
    };

    let line = Line::from(vec![
        control("◀ Anterior", pager.prev_enabled),
        Span::raw("   "),
        Span::styled(pager.label(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("   "),
        control("Siguiente ▶", pager.next_enabled),
    ]);

    let paragraph = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(paragraph, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = if app.search_focused {
        "[Enter/Esc] leave search  [Bksp] delete"
    } else {
        match app.screen {
            Screen::Catalog => {
                "[/] search  [←→] page  [↑↓] select  [Enter] watch  [?] help  [q] quit"
            }
            Screen::Playback => "[Esc] back to catalog  [?] help",
        }
    };

    let footer = Paragraph::new(help_text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, area);
}

fn draw_error_popup(frame: &mut Frame, error: &str) {
    let area = centered_rect(60, 20, frame.area());
    frame.render_widget(Clear, area);

    let popup = Paragraph::new(error)
        .style(Style::default().fg(Color::Red))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Error")
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(popup, area);
}

fn draw_help_modal(frame: &mut Frame) {
    let area = centered_rect(60, 70, frame.area());
    frame.render_widget(Clear, area);

    let content = "\
Catalog
───────
  /           Focus search bar
  ← / →       Previous / next page
  k / ↑       Previous card
  j / ↓       Next card
  Enter       Watch selected title
  q           Quit

Search Bar
──────────
  (Type)      Filter by title
  Backspace   Delete character
  Enter/Esc   Leave search

Playback
────────
  Esc         Back to catalog

  ?           Show/hide this help
  Ctrl+C      Force quit

Press ? to close";

    let help_text = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(help_text, area);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}…", text.chars().take(max.saturating_sub(1)).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Helper function to create a centered rect.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Keybindings;
    use crate::error::AppError;
    use crate::types::Title;
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};
    use std::time::Duration;

    fn app() -> App {
        App::new(24, Duration::from_millis(300), Keybindings::default()).0
    }

    fn render(app: &mut App) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn contents(buffer: &Buffer) -> String {
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[tokio::test]
    async fn test_draw_is_idempotent() {
        let mut app = app();
        app.set_catalog(Ok((1..=30)
            .map(|id| Title {
                id,
                name: Some(format!("Title {}", id)),
                duration: Some(5400.0),
                ..Default::default()
            })
            .collect()));

        let first = render(&mut app);
        let second = render(&mut app);
        assert_eq!(first, second);

        let text = contents(&first);
        assert!(text.contains("30 películas"));
        assert!(text.contains("1 / 2"));
        assert!(text.contains("Title 1"));
    }

    #[tokio::test]
    async fn test_draw_failed_catalog() {
        let mut app = app();
        app.set_catalog(Err(AppError::Network("refused".into())));

        let text = contents(&render(&mut app));
        assert!(text.contains("Error al cargar el catálogo"));
        assert!(text.contains("1 / 1"));
    }

    #[tokio::test]
    async fn test_draw_loading() {
        let mut app = app();
        let text = contents(&render(&mut app));
        assert!(text.contains("Cargando"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long title", 6), "a ver…");
    }
}
