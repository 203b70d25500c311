use std::path::Path;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, Clear, Paragraph, TableState};

use shared::types::{Activity, ActivityDraft, ActivityError};

use crate::api::QrKind;
use crate::ui::form::{Form, FormInput};
use crate::ui::modal::{Tone, centered, render_dialog};

use super::Action;
use super::activities::activity_table;
use super::activity_form::{activity_form, fill_form, read_draft};

pub const UPDATED_MESSAGE: &str = "Atividade atualizada com sucesso!";
pub const DEACTIVATED_MESSAGE: &str = "Atividade desativada com sucesso!";
pub const DELETED_MESSAGE: &str = "Atividade excluída com sucesso!";

#[derive(Debug)]
pub enum TableDialog {
    Edit {
        id: i64,
        form: Form,
        error: Option<String>,
    },
    ConfirmDeactivate(Activity),
    ConfirmDelete(Activity),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Notice {
    Info(String),
    Error(String),
}

/// Admin table: edit, deactivate, delete, and download QR codes.
#[derive(Debug, Default)]
pub struct ActivityTableScreen {
    activities: Vec<Activity>,
    selected: usize,
    loading: bool,
    busy: bool,
    error: Option<String>,
    dialog: Option<TableDialog>,
    notice: Option<Notice>,
}

impl ActivityTableScreen {
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn dialog(&self) -> Option<&TableDialog> {
        self.dialog.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        match &self.notice {
            Some(Notice::Info(m)) | Some(Notice::Error(m)) => Some(m),
            None => None,
        }
    }

    fn current(&self) -> Option<&Activity> {
        self.activities.get(self.selected)
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

    fn replace(&mut self, updated: Activity) {
        if let Some(slot) = self.activities.iter_mut().find(|a| a.id == updated.id) {
            *slot = updated;
        }
    }

    pub fn on_updated(&mut self, result: Result<Activity, ActivityError>) {
        self.busy = false;
        match result {
            Ok(activity) => {
                self.replace(activity);
                self.dialog = None;
                self.notice = Some(Notice::Info(UPDATED_MESSAGE.into()));
            }
            Err(e) => {
                if let Some(TableDialog::Edit { error, .. }) = &mut self.dialog {
                    *error = Some(e.to_message());
                } else {
                    self.notice = Some(Notice::Error(e.to_message()));
                }
            }
        }
    }

    pub fn on_deactivated(&mut self, result: Result<Activity, ActivityError>) {
        self.busy = false;
        self.dialog = None;
        match result {
            Ok(activity) => {
                self.replace(activity);
                self.notice = Some(Notice::Info(DEACTIVATED_MESSAGE.into()));
            }
            Err(e) => self.notice = Some(Notice::Error(e.to_message())),
        }
    }

    pub fn on_deleted(&mut self, id: i64, result: Result<(), ActivityError>) {
        self.busy = false;
        self.dialog = None;
        match result {
            Ok(()) => {
                self.activities.retain(|a| a.id != id);
                self.selected = self.selected.min(self.activities.len().saturating_sub(1));
                self.notice = Some(Notice::Info(DELETED_MESSAGE.into()));
            }
            Err(e) => self.notice = Some(Notice::Error(e.to_message())),
        }
    }

    pub fn on_qr_saved(&mut self, kind: QrKind, result: Result<&Path, ActivityError>) {
        self.busy = false;
        self.notice = Some(match result {
            Ok(path) => Notice::Info(format!("{} salvo em {}", kind.title(), path.display())),
            Err(e) => Notice::Error(e.to_message()),
        });
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if self.busy {
            return None;
        }
        if self.dialog.is_some() {
            return self.handle_dialog_key(key);
        }

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
            KeyCode::Char('r') if !self.loading => {
                self.notice = None;
                Some(Action::LoadActivities)
            }
            KeyCode::Char('e') => {
                let activity = self.current()?;
                let mut form = activity_form(true);
                fill_form(&mut form, &ActivityDraft::from_activity(activity));
                self.dialog = Some(TableDialog::Edit {
                    id: activity.id,
                    form,
                    error: None,
                });
                None
            }
            KeyCode::Char('d') => {
                let activity = self.current()?.clone();
                if activity.is_active {
                    self.dialog = Some(TableDialog::ConfirmDeactivate(activity));
                } else {
                    self.notice = Some(Notice::Error("A atividade já está inativa.".into()));
                }
                None
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                let activity = self.current()?.clone();
                self.dialog = Some(TableDialog::ConfirmDelete(activity));
                None
            }
            KeyCode::Char('n') => self.download(QrKind::Entry),
            KeyCode::Char('s') => self.download(QrKind::Exit),
            _ => None,
        }
    }

    fn download(&mut self, kind: QrKind) -> Option<Action> {
        let id = self.current()?.id;
        self.busy = true;
        self.notice = Some(Notice::Info(format!("Baixando {}...", kind.title())));
        Some(Action::DownloadQr { id, kind })
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) -> Option<Action> {
        let dialog = self.dialog.as_mut()?;
        match dialog {
            TableDialog::Edit { id, form, error } => match form.handle_key(key) {
                FormInput::Submit => match read_draft(form).into_update() {
                    Ok(update) => {
                        let id = *id;
                        *error = None;
                        self.busy = true;
                        Some(Action::UpdateActivity { id, update })
                    }
                    Err(e) => {
                        *error = Some(e.to_message());
                        None
                    }
                },
                FormInput::Cancel => {
                    self.dialog = None;
                    None
                }
                _ => None,
            },
            TableDialog::ConfirmDeactivate(activity) => match key.code {
                KeyCode::Enter | KeyCode::Char('y') => {
                    let action = Action::DeactivateActivity {
                        id: activity.id,
                        update: activity.deactivated(),
                    };
                    self.busy = true;
                    Some(action)
                }
                KeyCode::Esc | KeyCode::Char('n') => {
                    self.dialog = None;
                    None
                }
                _ => None,
            },
            TableDialog::ConfirmDelete(activity) => match key.code {
                KeyCode::Enter | KeyCode::Char('y') => {
                    let id = activity.id;
                    self.busy = true;
                    Some(Action::DeleteActivity(id))
                }
                KeyCode::Esc | KeyCode::Char('n') => {
                    self.dialog = None;
                    None
                }
                _ => None,
            },
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let [title, body, status, hint] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(Paragraph::new("Gerenciar Atividades".bold()), title);
        frame.render_widget(
            Paragraph::new(
                "e editar · d desativar · x excluir · n QR entrada · s QR saída · r recarregar",
            )
            .dark_gray(),
            hint,
        );

        match &self.notice {
            Some(Notice::Info(m)) => {
                frame.render_widget(Paragraph::new(m.as_str()).green(), status)
            }
            Some(Notice::Error(m)) => {
                frame.render_widget(Paragraph::new(m.as_str()).red(), status)
            }
            None => {}
        }

        if self.loading {
            frame.render_widget(Paragraph::new("Carregando atividades..."), body);
        } else if let Some(e) = &self.error {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::styled(e.clone(), Style::new().fg(Color::Red)),
                    Line::raw("Pressione r para tentar novamente."),
                ]),
                body,
            );
        } else if self.activities.is_empty() {
            frame.render_widget(Paragraph::new("Nenhuma atividade cadastrada."), body);
        } else {
            frame.render_stateful_widget(
                activity_table(&self.activities, true),
                body,
                &mut TableState::default().with_selected(Some(self.selected)),
            );
        }

        match &self.dialog {
            Some(TableDialog::Edit { form, error, .. }) => {
                self.render_edit(frame, form, error.as_deref())
            }
            Some(TableDialog::ConfirmDeactivate(a)) => render_dialog(
                frame,
                " Desativar Atividade ",
                vec![
                    Line::raw(format!(
                        "Tem certeza que deseja desativar a atividade \"{}\"?",
                        a.activity_name
                    )),
                    Line::raw("Participantes não poderão mais registrar presença."),
                ],
                "Enter confirmar · Esc cancelar",
                Tone::Danger,
            ),
            Some(TableDialog::ConfirmDelete(a)) => render_dialog(
                frame,
                " Excluir Atividade ",
                vec![
                    Line::raw(format!(
                        "Tem certeza que deseja excluir a atividade \"{}\"?",
                        a.activity_name
                    )),
                    Line::raw("Esta ação não pode ser desfeita."),
                ],
                "Enter excluir · Esc cancelar",
                Tone::Danger,
            ),
            None => {}
        }
    }

    fn render_edit(&self, frame: &mut Frame, form: &Form, error: Option<&str>) {
        let area = centered(frame.area(), 70, 27);
        let block = Block::bordered()
            .title(" Editar Atividade ")
            .border_style(Style::new().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(Clear, area);
        frame.render_widget(block, area);

        let [fields, message, hint] = Layout::vertical([
            Constraint::Length(21),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .areas(inner);

        form.render(frame, fields);
        let message_line = match (self.busy, error) {
            (true, _) => Line::styled("Salvando...", Style::new().fg(Color::Cyan)),
            (false, Some(e)) => Line::styled(e.to_string(), Style::new().fg(Color::Red)),
            (false, None) => Line::raw(""),
        };
        frame.render_widget(Paragraph::new(message_line), message);
        frame.render_widget(
            Paragraph::new("Enter salvar · Esc cancelar · Espaço marca \"Ativa\"").dark_gray(),
            hint,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn activity(id: i64, active: bool) -> Activity {
        let mut a = Activity::placeholder(id);
        a.activity_name = format!("Atividade {}", id);
        a.description = "Descrição".into();
        a.is_active = active;
        a.start_date = Some("2025-10-01T14:00:00".into());
        a.end_date = Some("2025-10-01T16:00:00".into());
        a
    }

    fn loaded() -> ActivityTableScreen {
        let mut s = ActivityTableScreen::default();
        s.on_loaded(Ok(vec![activity(1, true), activity(2, false)]));
        s
    }

    #[test]
    fn test_deactivate_sends_full_body_with_flag_cleared() {
        let mut s = loaded();
        s.handle_key(key(KeyCode::Char('d')));
        assert!(matches!(s.dialog(), Some(TableDialog::ConfirmDeactivate(_))));

        match s.handle_key(key(KeyCode::Enter)) {
            Some(Action::DeactivateActivity { id, update }) => {
                assert_eq!(id, 1);
                assert!(!update.is_active);
                assert_eq!(update.activity_name, "Atividade 1");
            }
            other => panic!("unexpected {:?}", other),
        }

        let mut done = activity(1, false);
        done.activity_name = "Atividade 1".into();
        s.on_deactivated(Ok(done));
        assert!(!s.activities()[0].is_active);
        assert_eq!(s.notice(), Some(DEACTIVATED_MESSAGE));
    }

    #[test]
    fn test_inactive_activity_cannot_be_deactivated() {
        let mut s = loaded();
        s.handle_key(key(KeyCode::Down));
        s.handle_key(key(KeyCode::Char('d')));
        assert!(s.dialog().is_none());
        assert_eq!(s.notice(), Some("A atividade já está inativa."));
    }

    #[test]
    fn test_edit_prefills_and_submits_update() {
        let mut s = loaded();
        s.handle_key(key(KeyCode::Char('e')));
        match s.handle_key(key(KeyCode::Enter)) {
            Some(Action::UpdateActivity { id, update }) => {
                assert_eq!(id, 1);
                assert_eq!(update.activity_name, "Atividade 1");
                assert!(update.is_active);
                assert!(update.start_date.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }

        s.on_updated(Err(ActivityError::UpdateFailed));
        match s.dialog() {
            Some(TableDialog::Edit { error, .. }) => {
                assert_eq!(error.as_deref(), Some("Erro ao atualizar atividade."))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_delete_confirmation_and_removal() {
        let mut s = loaded();
        s.handle_key(key(KeyCode::Char('x')));
        assert_eq!(s.handle_key(key(KeyCode::Enter)), Some(Action::DeleteActivity(1)));
        s.on_deleted(1, Ok(()));
        assert_eq!(s.activities().len(), 1);
        assert_eq!(s.notice(), Some(DELETED_MESSAGE));
    }

    #[test]
    fn test_escape_closes_confirmation() {
        let mut s = loaded();
        s.handle_key(key(KeyCode::Char('x')));
        assert_eq!(s.handle_key(key(KeyCode::Esc)), None);
        assert!(s.dialog().is_none());
    }

    #[test]
    fn test_qr_download_request_and_failure() {
        let mut s = loaded();
        assert_eq!(
            s.handle_key(key(KeyCode::Char('s'))),
            Some(Action::DownloadQr {
                id: 1,
                kind: QrKind::Exit
            })
        );
        // Busy until the download settles.
        assert_eq!(s.handle_key(key(KeyCode::Char('n'))), None);

        s.on_qr_saved(QrKind::Exit, Err(ActivityError::QrImageUnavailable));
        assert!(s.notice().unwrap().starts_with("Não foi possível carregar o QR Code"));
    }
}
