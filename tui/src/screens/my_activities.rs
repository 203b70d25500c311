use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Wrap};

use shared::types::{
    Activity, AttendanceRecord, AttendanceStatus, attendance_status, format_date, format_datetime,
};

use super::Action;
use super::activities::NOT_INFORMED;

pub const ITEMS_PER_PAGE: usize = 6;
pub const LOAD_ERROR_MESSAGE: &str = "Erro ao buscar suas atividades.";
const NOT_REGISTERED: &str = "Não registrado";

/// The participant's attendance records, paginated.
#[derive(Debug, Default)]
pub struct MyActivitiesScreen {
    rows: Vec<(AttendanceRecord, Activity)>,
    page: usize,
    loading: bool,
    error: Option<String>,
}

impl MyActivitiesScreen {
    pub fn begin_load(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn on_loaded(&mut self, result: Result<Vec<(AttendanceRecord, Activity)>, String>) {
        self.loading = false;
        match result {
            Ok(rows) => {
                self.rows = rows;
                self.page = 0;
            }
            Err(message) => {
                self.rows.clear();
                self.error = Some(message);
            }
        }
    }

    pub fn total_pages(&self) -> usize {
        self.rows.len().div_ceil(ITEMS_PER_PAGE)
    }

    /// Zero-based.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_rows(&self) -> &[(AttendanceRecord, Activity)] {
        let start = (self.page * ITEMS_PER_PAGE).min(self.rows.len());
        let end = (start + ITEMS_PER_PAGE).min(self.rows.len());
        &self.rows[start..end]
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Right | KeyCode::PageDown | KeyCode::Char('l') => {
                if self.page + 1 < self.total_pages() {
                    self.page += 1;
                }
                None
            }
            KeyCode::Left | KeyCode::PageUp | KeyCode::Char('h') => {
                self.page = self.page.saturating_sub(1);
                None
            }
            KeyCode::Char('r') if !self.loading => Some(Action::LoadMyActivities),
            _ => None,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let [title, body, footer] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(Paragraph::new("Minhas Atividades".bold()), title);

        if self.loading {
            frame.render_widget(Paragraph::new("Carregando suas atividades..."), body);
            return;
        }
        if let Some(e) = &self.error {
            frame.render_widget(Paragraph::new(e.as_str()).red(), body);
            frame.render_widget(Paragraph::new("r tentar novamente").dark_gray(), footer);
            return;
        }
        if self.rows.is_empty() {
            frame.render_widget(
                Paragraph::new("Você ainda não está participando de nenhuma atividade."),
                body,
            );
            return;
        }

        let now = Local::now();
        let rows = self.page_rows();
        let slots = Layout::vertical(rows.iter().map(|_| Constraint::Length(6))).split(body);
        for ((record, activity), slot) in rows.iter().zip(slots.iter()) {
            let status = attendance_status(record, Some(activity), now);
            render_card(frame, *slot, record, activity, status);
        }

        let mut hint = String::from("r recarregar");
        if self.total_pages() > 1 {
            hint = format!(
                "← Anterior · Página {} de {} · Próxima → · {}",
                self.page + 1,
                self.total_pages(),
                hint
            );
        }
        frame.render_widget(Paragraph::new(hint).dark_gray(), footer);
    }
}

fn badge_color(status: AttendanceStatus) -> Color {
    match status {
        AttendanceStatus::Completed => Color::Green,
        AttendanceStatus::Ongoing => Color::Cyan,
        AttendanceStatus::Pending => Color::Yellow,
        AttendanceStatus::NotStarted => Color::Gray,
        AttendanceStatus::Finished => Color::Red,
    }
}

fn render_card(
    frame: &mut Frame,
    area: Rect,
    record: &AttendanceRecord,
    activity: &Activity,
    status: AttendanceStatus,
) {
    let name = if activity.activity_name.is_empty() {
        "Atividade sem nome"
    } else {
        activity.activity_name.as_str()
    };
    let description = if activity.description.is_empty() {
        "Sem descrição"
    } else {
        activity.description.as_str()
    };

    let lines = vec![
        Line::raw(description.to_string()),
        Line::from(vec![
            Span::raw("Período: ").dark_gray(),
            Span::raw(format!(
                "{} até {}",
                format_date(activity.start_date.as_deref(), NOT_INFORMED),
                format_date(activity.end_date.as_deref(), NOT_INFORMED)
            )),
        ]),
        Line::from(vec![
            Span::raw("Entrada: ").dark_gray(),
            time_span(record.entry_time.as_deref()),
            Span::raw("   Saída: ").dark_gray(),
            time_span(record.exit_time.as_deref()),
        ]),
    ];

    let block = Block::bordered()
        .title(Line::from(name.to_string()).bold())
        .title(
            Line::from(Span::styled(
                format!(" {} ", status.label()),
                Style::new().fg(Color::Black).bg(badge_color(status)),
            ))
            .right_aligned(),
        );

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }).block(block), area);
}

fn time_span(raw: Option<&str>) -> Span<'static> {
    match raw {
        Some(_) => Span::raw(format_datetime(raw, NOT_REGISTERED)).green(),
        None => Span::raw(NOT_REGISTERED).dark_gray(),
    }
}
