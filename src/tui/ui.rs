use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::host::NotifyLevel;

use super::TuiHost;

pub fn draw(frame: &mut Frame, app: &App<TuiHost>) {
    // Main horizontal split: stories on the left, context on the right
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
        .split(frame.area());

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Story list
            Constraint::Length(1), // Key hints
        ])
        .split(main_chunks[0]);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Selected story
            Constraint::Min(0),    // Context preview
            Constraint::Length(1), // Last notification
        ])
        .split(main_chunks[1]);

    render_header(frame, app, left_chunks[0]);
    render_story_list(frame, app, left_chunks[1]);
    render_left_status(frame, app, left_chunks[2]);

    render_story_details(frame, app, right_chunks[0]);
    render_context(frame, app, right_chunks[1]);
    render_notification(frame, app, right_chunks[2]);

    if app.show_help {
        render_help(frame);
    }
}

fn render_header(frame: &mut Frame, app: &App<TuiHost>, area: Rect) {
    let stats = format!(
        " {} Stories | {} Unread",
        app.hits.len(),
        app.unread_count()
    );

    let block = Block::default()
        .title(" Hacker News ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(stats).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_story_list(frame: &mut Frame, app: &App<TuiHost>, area: Rect) {
    let items: Vec<ListItem> = app
        .hits
        .iter()
        .map(|hit| {
            let style = if app.is_read(hit) {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };

            let line = Line::from(vec![
                Span::styled(format!("{:>4} ", hit.points), Style::default().fg(Color::Yellow)),
                Span::styled(hit.title.as_str(), style),
                Span::styled(
                    format!(" ({})", hit.num_comments),
                    Style::default().fg(Color::Blue),
                ),
            ]);

            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !app.hits.is_empty() {
        state.select(Some(app.selected_index));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_left_status(frame: &mut Frame, app: &App<TuiHost>, area: Rect) {
    let status = if app.is_refreshing {
        "Loading front page..."
    } else {
        "j/k:nav  o:open  a:add to context  r:refresh  ?:help  q:quit"
    };

    let paragraph = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_story_details(frame: &mut Frame, app: &App<TuiHost>, area: Rect) {
    let lines = match app.selected_hit() {
        Some(hit) => vec![Line::from(hit.title.as_str()), Line::from(hit.link())],
        None => vec![Line::from("No story selected")],
    };

    let block = Block::default()
        .title(" Story ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

fn render_context(frame: &mut Frame, app: &App<TuiHost>, area: Rect) {
    let content = if let Some(hn_id) = app.extraction.pending() {
        format!("Fetching article for item {hn_id}...")
    } else {
        match app.host.messages.last() {
            Some(message) => message.content.clone(),
            None => "Press 'a' to add the selected article to context.".to_string(),
        }
    };

    let block = Block::default()
        .title(format!(" Context ({}) ", app.host.messages.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

fn render_notification(frame: &mut Frame, app: &App<TuiHost>, area: Rect) {
    let Some((level, text)) = &app.host.status else {
        return;
    };

    let color = match level {
        NotifyLevel::Info => Color::DarkGray,
        NotifyLevel::Warning => Color::Yellow,
        NotifyLevel::Error => Color::Red,
    };

    let paragraph = Paragraph::new(text.as_str()).style(Style::default().fg(color));
    frame.render_widget(paragraph, area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 60, frame.area());

    let help_text = [
        "",
        " Navigation:",
        "   j / ↓    Move down",
        "   k / ↑    Move up",
        "   g / G    Jump to top / bottom",
        "",
        " Actions:",
        "   o/Enter  Open in browser",
        "   a        Add article to context",
        "   r        Reload front page",
        "",
        " General:",
        "   ?        Toggle this help",
        "   q        Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(ratatui::widgets::Clear, area);
    frame.render_widget(paragraph, area);
}

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
