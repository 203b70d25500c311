use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, Cell, Paragraph, Row, Table, TableState};

use shared::types::{Activity, ActivityError, format_datetime};

use super::Action;

pub const NOT_INFORMED: &str = "Não informado";

/// Read-only list of every activity.
#[derive(Debug, Default)]
pub struct ActivitiesScreen {
    activities: Vec<Activity>,
    selected: usize,
    loading: bool,
    error: Option<String>,
}

impl ActivitiesScreen {
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn begin_load(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn on_loaded(&mut self, result: Result<Vec<Activity>, ActivityError>) {
        self.loading = false;
        match result {
            Ok(activities) => {
                self.activities = activities;
                self.selected = self.selected.min(self.activities.len().saturating_sub(1));
            }
            Err(e) => self.error = Some(e.to_message()),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.activities.len() {
                    self.selected += 1;
                }
                None
            }
            KeyCode::Char('r') if !self.loading => Some(Action::LoadActivities),
            _ => None,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let [title, body, hint] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(Paragraph::new("Atividades".bold()), title);
        frame.render_widget(
            Paragraph::new("↑/↓ navegar · r recarregar").dark_gray(),
            hint,
        );

        if self.loading {
            frame.render_widget(Paragraph::new("Carregando atividades..."), body);
            return;
        }
        if let Some(e) = &self.error {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::styled(e.clone(), Style::new().fg(Color::Red)),
                    Line::raw("Pressione r para tentar novamente."),
                ]),
                body,
            );
            return;
        }
        if self.activities.is_empty() {
            frame.render_widget(Paragraph::new("Nenhuma atividade cadastrada."), body);
            return;
        }

        frame.render_stateful_widget(
            activity_table(&self.activities, false),
            body,
            &mut TableState::default().with_selected(Some(self.selected)),
        );
    }
}

/// Table of activities shared with the admin screen. `with_keywords` adds
/// the keyword column.
pub fn activity_table(activities: &[Activity], with_keywords: bool) -> Table<'static> {
    let mut header = vec![
        "Nome da Atividade",
        "Descrição",
        "Data de Início",
        "Data de Término",
        "Status",
    ];
    if with_keywords {
        header.push("Palavras-chave");
    }

    let rows: Vec<Row> = activities
        .iter()
        .map(|a| {
            let status = if a.is_active {
                Cell::from(a.status_label()).green()
            } else {
                Cell::from(a.status_label()).red()
            };
            let mut cells = vec![
                Cell::from(a.activity_name.clone()),
                Cell::from(a.description.clone()),
                Cell::from(format_datetime(a.start_date.as_deref(), NOT_INFORMED)),
                Cell::from(format_datetime(a.end_date.as_deref(), NOT_INFORMED)),
                status,
            ];
            if with_keywords {
                cells.push(Cell::from(format!(
                    "{} / {}",
                    a.keyword_entry.as_deref().unwrap_or("-"),
                    a.keyword_exit.as_deref().unwrap_or("-")
                )));
            }
            Row::new(cells)
        })
        .collect();

    let mut widths = vec![
        Constraint::Percentage(22),
        Constraint::Percentage(30),
        Constraint::Length(17),
        Constraint::Length(17),
        Constraint::Length(8),
    ];
    if with_keywords {
        widths.push(Constraint::Min(12));
    }

    Table::new(rows, widths)
        .header(Row::new(header).style(Style::new().add_modifier(Modifier::BOLD)))
        .block(Block::bordered())
        .row_highlight_style(Style::new().fg(Color::Yellow).add_modifier(Modifier::REVERSED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn sample() -> Vec<Activity> {
        let mut a = Activity::placeholder(1);
        a.activity_name = "Minicurso de Python".into();
        a.is_active = true;
        a.start_date = Some("2025-10-01T14:00:00".into());
        vec![a, Activity::placeholder(2)]
    }

    fn screen_text(screen: &ActivitiesScreen) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal.draw(|f| screen.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_renders_rows_with_fallback_dates() {
        let mut s = ActivitiesScreen::default();
        s.on_loaded(Ok(sample()));
        let text = screen_text(&s);
        assert!(text.contains("Minicurso de Python"));
        assert!(text.contains("01/10/2025 14:00"));
        assert!(text.contains(NOT_INFORMED));
        assert!(text.contains("Inativa"));
    }

    #[test]
    fn test_load_error_offers_retry() {
        let mut s = ActivitiesScreen::default();
        s.begin_load();
        s.on_loaded(Err(ActivityError::LoadFailed));
        assert_eq!(s.error(), Some("Erro ao buscar atividades."));
        assert_eq!(
            s.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE)),
            Some(Action::LoadActivities)
        );
    }
}
