use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::routes::Route;
use crate::session::Session;

/// Header tabs: function key, label, target.
pub const NAV_ITEMS: [(&str, &str, Route); 3] = [
    ("F1", "Área do Participante", Route::Participant),
    ("F2", "Atividades", Route::Activities),
    ("F3", "Área do Administrador", Route::Admin),
];

/// Tabs visible to this session. The admin tab is only shown to admins.
pub fn visible_tabs(session: &Session) -> Vec<(&'static str, &'static str, Route)> {
    NAV_ITEMS
        .into_iter()
        .filter(|(_, _, route)| *route != Route::Admin || session.is_admin())
        .collect()
}

pub fn render(frame: &mut Frame, area: Rect, session: Option<&Session>, current: Route) {
    let block = Block::new()
        .borders(Borders::BOTTOM)
        .border_style(Style::new().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [brand, nav, right] = Layout::horizontal([
        Constraint::Length(10),
        Constraint::Min(0),
        Constraint::Length(30),
    ])
    .areas(inner);

    frame.render_widget(Paragraph::new("SisWeek".bold().cyan()), brand);

    let Some(session) = session else {
        return;
    };

    let mut spans = Vec::new();
    for (key, label, route) in visible_tabs(session) {
        let style = if route == current {
            Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::new()
        };
        spans.push(Span::styled(format!("{} ", key), Style::new().fg(Color::DarkGray)));
        spans.push(Span::styled(label, style));
        spans.push(Span::raw("   "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), nav);

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw(session.display_name().to_string()),
            Span::styled("  F10 Sair", Style::new().fg(Color::DarkGray)),
        ]))
        .right_aligned(),
        right,
    );
}
