use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use shared::types::{CPF_DIGITS, add_cpf_mask, remove_cpf_mask};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Password,
    /// Digits only, shown with the `000.000.000-00` mask as they are typed.
    Cpf,
    /// Checkbox toggled with Space.
    Toggle,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub label: &'static str,
    pub kind: FieldKind,
    value: String,
    checked: bool,
}

impl Field {
    fn new(label: &'static str, kind: FieldKind) -> Self {
        Self {
            label,
            kind,
            value: String::new(),
            checked: false,
        }
    }

    pub fn text(label: &'static str) -> Self {
        Self::new(label, FieldKind::Text)
    }

    pub fn password(label: &'static str) -> Self {
        Self::new(label, FieldKind::Password)
    }

    pub fn cpf(label: &'static str) -> Self {
        Self::new(label, FieldKind::Cpf)
    }

    pub fn toggle(label: &'static str, checked: bool) -> Self {
        Self {
            checked,
            ..Self::new(label, FieldKind::Toggle)
        }
    }

    fn push(&mut self, c: char) {
        match self.kind {
            FieldKind::Text | FieldKind::Password => self.value.push(c),
            FieldKind::Cpf => {
                let mut digits = remove_cpf_mask(&self.value);
                if c.is_ascii_digit() && digits.len() < CPF_DIGITS {
                    digits.push(c);
                }
                self.value = add_cpf_mask(&digits);
            }
            FieldKind::Toggle => {
                if c == ' ' {
                    self.checked = !self.checked;
                }
            }
        }
    }

    fn backspace(&mut self) {
        match self.kind {
            FieldKind::Text | FieldKind::Password => {
                self.value.pop();
            }
            FieldKind::Cpf => {
                let mut digits = remove_cpf_mask(&self.value);
                digits.pop();
                self.value = add_cpf_mask(&digits);
            }
            FieldKind::Toggle => {}
        }
    }

    fn display(&self) -> String {
        match self.kind {
            FieldKind::Password => "•".repeat(self.value.chars().count()),
            FieldKind::Toggle => {
                if self.checked { "[x]".into() } else { "[ ]".into() }
            }
            _ => self.value.clone(),
        }
    }
}

/// Result of feeding a key to a [`Form`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormInput {
    Edited,
    Submit,
    Cancel,
    Ignored,
}

/// A vertical list of labelled inputs with one focused field.
#[derive(Debug, Clone)]
pub struct Form {
    fields: Vec<Field>,
    focus: usize,
}

impl Form {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields, focus: 0 }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.as_str()).unwrap_or("")
    }

    pub fn checked(&self, index: usize) -> bool {
        self.fields.get(index).is_some_and(|f| f.checked)
    }

    pub fn set_value(&mut self, index: usize, value: &str) {
        if let Some(field) = self.fields.get_mut(index) {
            field.value = match field.kind {
                FieldKind::Cpf => add_cpf_mask(value),
                _ => value.to_string(),
            };
        }
    }

    pub fn set_checked(&mut self, index: usize, checked: bool) {
        if let Some(field) = self.fields.get_mut(index) {
            field.checked = checked;
        }
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Empty every text field and move focus to the top. Toggles keep
    /// their state.
    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
        }
        self.focus = 0;
    }

    fn next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    fn previous(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormInput {
        match key.code {
            KeyCode::Enter => FormInput::Submit,
            KeyCode::Esc => FormInput::Cancel,
            KeyCode::Tab | KeyCode::Down => {
                self.next();
                FormInput::Edited
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.previous();
                FormInput::Edited
            }
            KeyCode::Backspace => match self.fields.get_mut(self.focus) {
                Some(field) => {
                    field.backspace();
                    FormInput::Edited
                }
                None => FormInput::Ignored,
            },
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                match self.fields.get_mut(self.focus) {
                    Some(field) => {
                        field.push(c);
                        FormInput::Edited
                    }
                    None => FormInput::Ignored,
                }
            }
            _ => FormInput::Ignored,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::vertical(self.fields.iter().map(|_| Constraint::Length(3)))
            .split(area);

        for (index, (field, row)) in self.fields.iter().zip(rows.iter()).enumerate() {
            let focused = index == self.focus;
            let border = if focused {
                Style::new().fg(Color::Yellow)
            } else {
                Style::new().fg(Color::DarkGray)
            };

            let mut spans = vec![Span::raw(field.display())];
            if focused && field.kind != FieldKind::Toggle {
                spans.push(Span::styled("▏", Style::new().add_modifier(Modifier::SLOW_BLINK)));
            }

            let input = Paragraph::new(Line::from(spans)).block(
                Block::bordered()
                    .title(field.label)
                    .border_style(border),
            );
            frame.render_widget(input, *row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(form: &mut Form, text: &str) {
        for c in text.chars() {
            form.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_cpf_is_masked_while_typing() {
        let mut form = Form::new(vec![Field::cpf("CPF")]);
        type_text(&mut form, "1234");
        assert_eq!(form.value(0), "123.4");
        type_text(&mut form, "5678901999");
        assert_eq!(form.value(0), "123.456.789-01");

        form.handle_key(key(KeyCode::Backspace));
        assert_eq!(form.value(0), "123.456.789-0");
    }

    #[test]
    fn test_cpf_ignores_letters() {
        let mut form = Form::new(vec![Field::cpf("CPF")]);
        type_text(&mut form, "1a2b");
        assert_eq!(form.value(0), "12");
    }

    #[test]
    fn test_focus_wraps() {
        let mut form = Form::new(vec![Field::text("a"), Field::text("b")]);
        form.handle_key(key(KeyCode::Tab));
        assert_eq!(form.focus(), 1);
        form.handle_key(key(KeyCode::Tab));
        assert_eq!(form.focus(), 0);
        form.handle_key(key(KeyCode::BackTab));
        assert_eq!(form.focus(), 1);
    }

    #[test]
    fn test_toggle_and_submit() {
        let mut form = Form::new(vec![Field::toggle("Ativa", true)]);
        form.handle_key(key(KeyCode::Char(' ')));
        assert!(!form.checked(0));
        assert_eq!(form.handle_key(key(KeyCode::Enter)), FormInput::Submit);
        assert_eq!(form.handle_key(key(KeyCode::Esc)), FormInput::Cancel);
    }

    #[test]
    fn test_password_is_hidden() {
        let mut form = Form::new(vec![Field::password("Senha")]);
        type_text(&mut form, "abc");
        assert_eq!(form.value(0), "abc");
        assert_eq!(form.fields[0].display(), "•••");
    }

    #[test]
    fn test_clear_keeps_toggles() {
        let mut form = Form::new(vec![Field::text("Nome"), Field::toggle("Ativa", true)]);
        type_text(&mut form, "x");
        form.clear();
        assert_eq!(form.value(0), "");
        assert!(form.checked(1));
    }
}
