use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;

use shared::types::{ActivityDraft, ActivityError};

use crate::ui::form::{Field, Form, FormInput};

use super::Action;

pub const CREATED_MESSAGE: &str = "Atividade cadastrada com sucesso!";

const NAME: usize = 0;
const DESCRIPTION: usize = 1;
const START: usize = 2;
const END: usize = 3;
const KEYWORD_ENTRY: usize = 4;
const KEYWORD_EXIT: usize = 5;
const ACTIVE: usize = 6;

/// Inputs for an activity. The edit dialog adds the "active" checkbox.
pub fn activity_form(with_active: bool) -> Form {
    let mut fields = vec![
        Field::text("Nome da Atividade"),
        Field::text("Descrição"),
        Field::text("Data de Início (dd/mm/aaaa hh:mm)"),
        Field::text("Data de Término (dd/mm/aaaa hh:mm)"),
        Field::text("Palavra-chave de entrada"),
        Field::text("Palavra-chave de saída"),
    ];
    if with_active {
        fields.push(Field::toggle("Ativa", true));
    }
    Form::new(fields)
}

pub fn read_draft(form: &Form) -> ActivityDraft {
    ActivityDraft {
        name: form.value(NAME).to_string(),
        description: form.value(DESCRIPTION).to_string(),
        start: form.value(START).to_string(),
        end: form.value(END).to_string(),
        keyword_entry: form.value(KEYWORD_ENTRY).to_string(),
        keyword_exit: form.value(KEYWORD_EXIT).to_string(),
        is_active: form.len() <= ACTIVE || form.checked(ACTIVE),
    }
}

pub fn fill_form(form: &mut Form, draft: &ActivityDraft) {
    form.set_value(NAME, &draft.name);
    form.set_value(DESCRIPTION, &draft.description);
    form.set_value(START, &draft.start);
    form.set_value(END, &draft.end);
    form.set_value(KEYWORD_ENTRY, &draft.keyword_entry);
    form.set_value(KEYWORD_EXIT, &draft.keyword_exit);
    form.set_checked(ACTIVE, draft.is_active);
}

/// "Cadastro de Atividade" screen.
#[derive(Debug)]
pub struct RegisterActivityScreen {
    form: Form,
    error: Option<String>,
    notice: Option<String>,
    loading: bool,
}

impl Default for RegisterActivityScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterActivityScreen {
    pub fn new() -> Self {
        Self {
            form: activity_form(false),
            error: None,
            notice: None,
            loading: false,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if self.loading {
            return None;
        }

        match self.form.handle_key(key) {
            FormInput::Submit => match read_draft(&self.form).into_form() {
                Ok(form) => {
                    self.loading = true;
                    self.error = None;
                    self.notice = None;
                    Some(Action::CreateActivity(form))
                }
                Err(e) => {
                    self.error = Some(e.to_message());
                    None
                }
            },
            FormInput::Edited => {
                self.notice = None;
                None
            }
            _ => None,
        }
    }

    pub fn on_created(&mut self, result: Result<(), ActivityError>) {
        self.loading = false;
        match result {
            Ok(()) => {
                self.form.clear();
                self.error = None;
                self.notice = Some(CREATED_MESSAGE.to_string());
            }
            Err(e) => self.error = Some(e.to_message()),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let [title, fields, message, hint] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(18),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .areas(area);

        frame.render_widget(Paragraph::new("Cadastro de Atividade".bold()), title);
        self.form.render(frame, fields);

        let status = if self.loading {
            Line::styled("Cadastrando...", Style::new().fg(Color::Cyan))
        } else if let Some(e) = &self.error {
            Line::styled(e.clone(), Style::new().fg(Color::Red))
        } else if let Some(n) = &self.notice {
            Line::styled(n.clone(), Style::new().fg(Color::Green))
        } else {
            Line::raw("")
        };
        frame.render_widget(Paragraph::new(status), message);
        frame.render_widget(
            Paragraph::new("Enter cadastrar · Tab próximo campo").dark_gray(),
            hint,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn press(screen: &mut RegisterActivityScreen, code: KeyCode) -> Option<Action> {
        screen.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn fill(screen: &mut RegisterActivityScreen, values: &[&str]) {
        for value in values {
            for c in value.chars() {
                press(screen, KeyCode::Char(c));
            }
            press(screen, KeyCode::Tab);
        }
    }

    #[test]
    fn test_valid_form_is_submitted() {
        let mut s = RegisterActivityScreen::new();
        fill(
            &mut s,
            &[
                "Minicurso de Python",
                "Minicurso ministrado pelo professor",
                "01/10/2025 14:00",
                "01/10/2025 16:00",
                "ROCHEDO",
                "",
            ],
        );
        match press(&mut s, KeyCode::Enter) {
            Some(Action::CreateActivity(form)) => {
                assert_eq!(form.activity_name, "Minicurso de Python");
                assert_eq!(form.keyword_entry.as_deref(), Some("ROCHEDO"));
                assert!(form.keyword_exit.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_end_before_start_is_local_error() {
        let mut s = RegisterActivityScreen::new();
        fill(
            &mut s,
            &["Nome", "Desc", "01/10/2025 16:00", "01/10/2025 14:00"],
        );
        assert_eq!(press(&mut s, KeyCode::Enter), None);
        assert_eq!(s.error(), Some("O término deve ser posterior ao início."));
    }

    #[test]
    fn test_success_clears_form() {
        let mut s = RegisterActivityScreen::new();
        fill(&mut s, &["Nome"]);
        s.on_created(Ok(()));
        assert_eq!(s.notice(), Some(CREATED_MESSAGE));
        assert_eq!(s.form.value(NAME), "");
    }

    #[test]
    fn test_draft_round_trip_through_form() {
        let mut form = activity_form(true);
        let draft = ActivityDraft {
            name: "A".into(),
            description: "B".into(),
            start: "01/10/2025 14:00".into(),
            end: "01/10/2025 16:00".into(),
            keyword_entry: "E".into(),
            keyword_exit: "S".into(),
            is_active: false,
        };
        fill_form(&mut form, &draft);
        assert_eq!(read_draft(&form), draft);
    }
}
