use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, List, ListItem, ListState, Paragraph};

use crate::routes::Route;
use crate::ui::modal::{Tone, render_dialog};

use super::Action;

struct MenuItem {
    title: &'static str,
    description: &'static str,
    route: Route,
}

/// Card menu of a landing page.
pub struct Menu {
    heading: &'static str,
    items: &'static [MenuItem],
    selected: usize,
}

const PARTICIPANT_ITEMS: &[MenuItem] = &[
    MenuItem {
        title: "Ler QR Code",
        description: "Registrar entrada ou saída de uma atividade",
        route: Route::QrReader,
    },
    MenuItem {
        title: "Minhas Atividades",
        description: "Acompanhar suas presenças",
        route: Route::MyActivities,
    },
    MenuItem {
        title: "Atividades",
        description: "Ver a programação do SisWeek",
        route: Route::Activities,
    },
];

const ADMIN_ITEMS: &[MenuItem] = &[
    MenuItem {
        title: "Cadastrar Atividade",
        description: "Cadastrar atividades do SisWeek",
        route: Route::RegisterActivity,
    },
    MenuItem {
        title: "Listar Atividades",
        description: "Listar atividades do SisWeek",
        route: Route::ActivityTable,
    },
];

impl Menu {
    pub fn participant() -> Self {
        Self {
            heading: "Área do Participante",
            items: PARTICIPANT_ITEMS,
            selected: 0,
        }
    }

    pub fn admin() -> Self {
        Self {
            heading: "Área do Administrador",
            items: ADMIN_ITEMS,
            selected: 0,
        }
    }

    pub fn selected_route(&self) -> Option<Route> {
        self.items.get(self.selected).map(|i| i.route)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.items.len() {
                    self.selected += 1;
                }
                None
            }
            KeyCode::Enter => self.selected_route().map(Action::Navigate),
            _ => None,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, greeting: Option<&str>) {
        let [title, list] =
            Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(area);

        let mut heading = vec![Line::from(self.heading.bold())];
        if let Some(name) = greeting {
            heading.push(Line::from(format!("Olá, {}", name)).dark_gray());
        }
        frame.render_widget(Paragraph::new(heading), title);

        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|item| {
                ListItem::new(vec![
                    Line::from(item.title.bold()),
                    Line::from(item.description).dark_gray(),
                    Line::raw(""),
                ])
            })
            .collect();

        let mut state = ListState::default().with_selected(Some(self.selected));
        let list_widget = List::new(items)
            .block(Block::bordered())
            .highlight_style(Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .highlight_symbol("› ");
        frame.render_stateful_widget(list_widget, list, &mut state);
    }
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

const INSTRUCTION_STEPS: [&str; 3] = [
    "A sua presença nas atividades será confirmada pela leitura de QR Codes.",
    "Durante cada atividade, serão disponibilizados dois códigos: um para entrada e outro para saída.",
    "É fundamental que você realize a leitura de ambos os QR Codes para que sua presença seja validada.",
];

/// Participant landing page with the how-to dialog shown once per login.
pub struct ParticipantHome {
    pub menu: Menu,
    show_instructions: bool,
}

impl Default for ParticipantHome {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticipantHome {
    pub fn new() -> Self {
        Self {
            menu: Menu::participant(),
            show_instructions: false,
        }
    }

    /// Called on login.
    pub fn arm_instructions(&mut self) {
        self.show_instructions = true;
    }

    pub fn instructions_open(&self) -> bool {
        self.show_instructions
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if self.show_instructions {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.show_instructions = false;
            }
            return None;
        }
        self.menu.handle_key(key)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, greeting: Option<&str>) {
        self.menu.render(frame, area, greeting);
        if self.show_instructions {
            render_instructions(frame);
        }
    }
}

fn render_instructions(frame: &mut Frame) {
    let mut body: Vec<Line> = INSTRUCTION_STEPS
        .iter()
        .enumerate()
        .map(|(i, step)| {
            Line::from(vec![
                Span::styled(format!(" {} ", i + 1), Style::new().fg(Color::Black).bg(Color::Cyan)),
                Span::raw(format!(" {}", step)),
            ])
        })
        .collect();
    body.push(Line::raw(""));
    body.push(Line::raw(
        "Você pode acompanhar suas atividades na seção \"Minhas Atividades\".",
    ));

    render_dialog(
        frame,
        " Como registrar sua presença ",
        body,
        "Enter Entendi · Esc fechar",
        Tone::Info,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_menu_navigation() {
        let mut m = Menu::participant();
        assert_eq!(
            m.handle_key(key(KeyCode::Enter)),
            Some(Action::Navigate(Route::QrReader))
        );
        m.handle_key(key(KeyCode::Down));
        m.handle_key(key(KeyCode::Down));
        m.handle_key(key(KeyCode::Down));
        assert_eq!(m.selected_route(), Some(Route::Activities));
        m.handle_key(key(KeyCode::Up));
        assert_eq!(m.selected_route(), Some(Route::MyActivities));
    }

    #[test]
    fn test_admin_menu_routes() {
        let mut m = Menu::admin();
        m.handle_key(key(KeyCode::Down));
        assert_eq!(
            m.handle_key(key(KeyCode::Enter)),
            Some(Action::Navigate(Route::ActivityTable))
        );
    }

    #[test]
    fn test_instructions_swallow_keys_until_dismissed() {
        let mut home = ParticipantHome::new();
        home.arm_instructions();
        assert_eq!(home.handle_key(key(KeyCode::Down)), None);
        assert!(home.instructions_open());

        home.handle_key(key(KeyCode::Esc));
        assert!(!home.instructions_open());
        assert_eq!(
            home.handle_key(key(KeyCode::Enter)),
            Some(Action::Navigate(Route::QrReader))
        );
    }
}
