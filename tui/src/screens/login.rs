use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph};

use shared::types::{LoginData, LoginError};

use crate::routes::Route;
use crate::ui::form::{Field, Form, FormInput};
use crate::ui::modal::centered;

use super::Action;

const IDENTIFIER: usize = 0;
const PASSWORD: usize = 1;

#[derive(Debug)]
pub struct LoginScreen {
    form: Form,
    error: Option<String>,
    notice: Option<String>,
    loading: bool,
}

impl Default for LoginScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginScreen {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![Field::text("CPF ou e-mail"), Field::password("Senha")]),
            error: None,
            notice: None,
            loading: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Message shown above the form, e.g. after a registration.
    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if self.loading {
            return None;
        }
        if key.code == KeyCode::F(4) {
            return Some(Action::Navigate(Route::Register));
        }

        match self.form.handle_key(key) {
            FormInput::Submit => {
                let data = LoginData::from_identifier(
                    self.form.value(IDENTIFIER),
                    self.form.value(PASSWORD),
                );
                match data.validate() {
                    Ok(()) => {
                        self.loading = true;
                        self.error = None;
                        self.notice = None;
                        Some(Action::Login(data))
                    }
                    Err(e) => {
                        self.error = Some(e.to_message());
                        None
                    }
                }
            }
            _ => None,
        }
    }

    pub fn on_result(&mut self, result: Result<(), LoginError>) {
        self.loading = false;
        match result {
            Ok(()) => *self = Self::new(),
            Err(e) => self.error = Some(e.to_message()),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let card = centered(area, 60, 16);
        let block = Block::bordered().title(" Login com sua conta ".bold());
        let inner = block.inner(card);
        frame.render_widget(block, card);

        let [notice, fields, message, hint] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(6),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .areas(inner);

        if let Some(text) = &self.notice {
            frame.render_widget(Paragraph::new(text.as_str()).green(), notice);
        }

        self.form.render(frame, fields);

        let status = if self.loading {
            Line::styled("Entrando...", Style::new().fg(Color::Cyan))
        } else if let Some(e) = &self.error {
            Line::styled(e.clone(), Style::new().fg(Color::Red))
        } else {
            Line::raw("")
        };
        frame.render_widget(Paragraph::new(status), message);

        frame.render_widget(
            Paragraph::new(vec![
                Line::raw("Enter entrar · Tab próximo campo"),
                Line::raw("Não possui uma conta? F4 Cadastre-se"),
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

    fn press(screen: &mut LoginScreen, code: KeyCode) -> Option<Action> {
        screen.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(screen: &mut LoginScreen, text: &str) {
        for c in text.chars() {
            press(screen, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_submit_builds_login_data() {
        let mut s = LoginScreen::new();
        type_text(&mut s, "123.456.789-01");
        press(&mut s, KeyCode::Tab);
        type_text(&mut s, "segredo");

        match press(&mut s, KeyCode::Enter) {
            Some(Action::Login(data)) => {
                assert_eq!(data.cpf.as_deref(), Some("12345678901"));
                assert_eq!(data.password, "segredo");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(s.is_loading());
        assert_eq!(press(&mut s, KeyCode::Enter), None);
    }

    #[test]
    fn test_missing_password_stays_local() {
        let mut s = LoginScreen::new();
        type_text(&mut s, "ana@ufpa.br");
        assert_eq!(press(&mut s, KeyCode::Enter), None);
        assert!(s.error().is_some());
    }

    #[test]
    fn test_failed_login_shows_message() {
        let mut s = LoginScreen::new();
        s.loading = true;
        s.on_result(Err(LoginError::InvalidCredentials));
        assert!(!s.is_loading());
        assert_eq!(s.error(), Some("Credenciais inválidas"));
    }

    #[test]
    fn test_f4_goes_to_register() {
        let mut s = LoginScreen::new();
        assert_eq!(
            press(&mut s, KeyCode::F(4)),
            Some(Action::Navigate(Route::Register))
        );
    }
}
