use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph};

use shared::types::{RegistrationError, RegistrationForm};

use crate::routes::Route;
use crate::ui::form::{Field, Form, FormInput};
use crate::ui::modal::centered;

use super::Action;

pub const REGISTERED_MESSAGE: &str = "Usuário cadastrado com sucesso! Faça o login para continuar.";

#[derive(Debug)]
pub struct RegisterScreen {
    form: Form,
    error: Option<String>,
    loading: bool,
}

impl Default for RegisterScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterScreen {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![
                Field::text("Nome"),
                Field::text("Sobrenome"),
                Field::text("Email"),
                Field::cpf("CPF"),
                Field::password("Senha"),
            ]),
            error: None,
            loading: false,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn collect(&self) -> RegistrationForm {
        RegistrationForm {
            name: self.form.value(0).to_string(),
            surname: self.form.value(1).to_string(),
            email: self.form.value(2).to_string(),
            cpf: self.form.value(3).to_string(),
            password: self.form.value(4).to_string(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if self.loading {
            return None;
        }
        if key.code == KeyCode::F(4) {
            return Some(Action::Navigate(Route::Login));
        }

        match self.form.handle_key(key) {
            FormInput::Submit => match self.collect().into_request() {
                Ok(data) => {
                    self.loading = true;
                    self.error = None;
                    Some(Action::Register(data))
                }
                Err(e) => {
                    self.error = Some(e.to_message());
                    None
                }
            },
            FormInput::Cancel => Some(Action::Navigate(Route::Login)),
            _ => None,
        }
    }

    pub fn on_result(&mut self, result: Result<(), RegistrationError>) {
        self.loading = false;
        match result {
            Ok(()) => *self = Self::new(),
            Err(e) => self.error = Some(e.to_message()),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let card = centered(area, 60, 24);
        let block = Block::bordered().title(" Cadastre-se ".bold());
        let inner = block.inner(card);
        frame.render_widget(block, card);

        let [fields, message, hint] = Layout::vertical([
            Constraint::Length(15),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .areas(inner);

        self.form.render(frame, fields);

        let status = if self.loading {
            Line::styled("Cadastrando...", Style::new().fg(Color::Cyan))
        } else if let Some(e) = &self.error {
            Line::styled(e.clone(), Style::new().fg(Color::Red))
        } else {
            Line::raw("")
        };
        frame.render_widget(Paragraph::new(status), message);

        frame.render_widget(
            Paragraph::new(vec![
                Line::raw("Enter cadastrar · Tab próximo campo"),
                Line::raw("Já possui uma conta? F4 Entrar"),
            ])
            .dark_gray(),
            hint,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(screen: &mut RegisterScreen, code: KeyCode) -> Option<Action> {
        screen.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn fill(screen: &mut RegisterScreen, values: [&str; 5]) {
        for value in values {
            for c in value.chars() {
                press(screen, KeyCode::Char(c));
            }
            press(screen, KeyCode::Tab);
        }
    }

    #[test]
    fn test_submit_joins_names_and_masks_cpf() {
        let mut s = RegisterScreen::new();
        fill(&mut s, ["Ana", "Souza", "ana@ufpa.br", "12345678901", "segredo"]);

        match press(&mut s, KeyCode::Enter) {
            Some(Action::Register(data)) => {
                assert_eq!(data.name, "Ana Souza");
                assert_eq!(data.cpf, "123.456.789-01");
                assert_eq!(data.email, "ana@ufpa.br");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_incomplete_cpf_is_rejected_locally() {
        let mut s = RegisterScreen::new();
        fill(&mut s, ["Ana", "Souza", "ana@ufpa.br", "123", "segredo"]);
        assert_eq!(press(&mut s, KeyCode::Enter), None);
        assert_eq!(s.error(), Some("CPF deve conter 11 dígitos"));
    }

    #[test]
    fn test_escape_returns_to_login() {
        let mut s = RegisterScreen::new();
        assert_eq!(
            press(&mut s, KeyCode::Esc),
            Some(Action::Navigate(Route::Login))
        );
    }
}
