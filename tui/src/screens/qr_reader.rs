use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph, Wrap};

use crate::scan::{ModalAction, Permission, ScanMachine};
use crate::ui::modal::{Tone, render_dialog};

use super::Action;

/// Input side of the QR reader. Scan state itself lives in the shared
/// [`ScanMachine`].
#[derive(Debug, Default)]
pub struct QrReaderScreen {
    keyboard: bool,
    input: String,
}

impl QrReaderScreen {
    /// `keyboard` enables typing the payload while scanning.
    pub fn new(keyboard: bool) -> Self {
        Self {
            keyboard,
            input: String::new(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn reset(&mut self) {
        self.input.clear();
    }

    pub fn handle_key(&mut self, key: KeyEvent, machine: &ScanMachine) -> Option<Action> {
        if machine.modal().is_some() {
            return match key.code {
                KeyCode::Enter | KeyCode::Char('n') => {
                    Some(Action::ScanModal(ModalAction::ScanAgain))
                }
                KeyCode::Esc | KeyCode::Char('m') => {
                    Some(Action::ScanModal(ModalAction::GoToMyActivities))
                }
                _ => None,
            };
        }

        match machine.permission() {
            Permission::Unknown => None,
            Permission::Denied(_) => match key.code {
                KeyCode::Char('r') | KeyCode::Enter => Some(Action::ProbeCamera),
                _ => None,
            },
            Permission::Granted if machine.is_scanning() => self.scanning_key(key),
            Permission::Granted if machine.is_submitting() => None,
            Permission::Granted => match key.code {
                KeyCode::Enter | KeyCode::Char('s') => {
                    self.input.clear();
                    Some(Action::StartScan)
                }
                KeyCode::Char('r') => Some(Action::ProbeCamera),
                _ => None,
            },
        }
    }

    fn scanning_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                self.input.clear();
                Some(Action::StopScan)
            }
            KeyCode::Enter if self.keyboard => {
                let line = std::mem::take(&mut self.input);
                (!line.trim().is_empty()).then_some(Action::KeyboardLine(line))
            }
            KeyCode::Backspace if self.keyboard => {
                self.input.pop();
                None
            }
            KeyCode::Char(c) if self.keyboard => {
                self.input.push(c);
                None
            }
            _ => None,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, machine: &ScanMachine) {
        let block = Block::bordered().title(" Leitor de QR Code ".bold());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [status, details] =
            Layout::vertical([Constraint::Min(6), Constraint::Length(4)]).areas(inner);

        let lines = match machine.permission() {
            Permission::Unknown => vec![Line::raw("Verificando permissões da câmera...")],
            Permission::Denied(_) => {
                let mut lines = vec![Line::styled(
                    "Erro de acesso à câmera",
                    Style::new().fg(Color::Red).bold(),
                )];
                if let Some(e) = machine.error() {
                    lines.push(Line::raw(e.to_string()));
                }
                lines.extend([
                    Line::raw(""),
                    Line::raw("r Tentar Novamente").yellow(),
                    Line::raw(""),
                    Line::raw("Dicas:").bold(),
                    Line::raw(" • Verifique se a câmera está conectada"),
                    Line::raw(" • Confirme que seu usuário pode acessar /dev/video*"),
                    Line::raw(" • Use o leitor por teclado se não houver câmera"),
                ]);
                lines
            }
            Permission::Granted => self.granted_lines(machine),
        };
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), status);

        let mut info = Vec::new();
        if let Some(text) = machine.last_read() {
            info.push(Line::from(format!("QR Code lido: {}", text)));
        }
        if machine.permission() == Permission::Granted {
            if let Some(e) = machine.error() {
                info.push(Line::styled(e.to_string(), Style::new().fg(Color::Red)));
            }
        }
        frame.render_widget(Paragraph::new(info), details);

        if let Some(modal) = machine.modal() {
            render_dialog(
                frame,
                &format!(" {} ", modal.title()),
                vec![Line::raw(modal.message().to_string())],
                "Enter Escanear outro · Esc Minhas Atividades",
                if modal.is_success() { Tone::Success } else { Tone::Danger },
            );
        }
    }

    fn granted_lines(&self, machine: &ScanMachine) -> Vec<Line<'static>> {
        if machine.is_submitting() {
            return vec![Line::styled(
                "Processando QR Code...",
                Style::new().fg(Color::Cyan),
            )];
        }

        if machine.is_scanning() {
            let mut lines = vec![
                Line::raw("Escaneando... Aponte para o QR Code").cyan(),
                Line::raw("Esc Parar Escaneamento").dark_gray(),
            ];
            if self.keyboard {
                lines.push(Line::raw(""));
                lines.push(Line::raw("Leia o código com o leitor ou digite e pressione Enter:"));
                lines.push(Line::from(format!("> {}▏", self.input)).yellow());
            }
            return lines;
        }

        let count = machine.devices().len();
        let mut lines = vec![Line::raw("Enter Iniciar Escaneamento").yellow()];
        if count > 0 {
            lines.push(Line::raw(format!("{} câmera(s) encontrada(s)", count)).dark_gray());
        }
        lines
    }
}
