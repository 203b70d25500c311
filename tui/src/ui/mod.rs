//! Drawing. Each screen renders itself; this module lays out the frame.

pub mod form;
pub mod header;
pub mod modal;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::Stylize;
use ratatui::widgets::Paragraph;

use crate::app::App;
use crate::routes::Route;
use crate::scan::lock;

pub fn draw(frame: &mut Frame, app: &App) {
    let session = app.session();
    let header_height = if session.is_some() { 2 } else { 0 };

    let [top, body, status] = Layout::vertical([
        Constraint::Length(header_height),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    if session.is_some() {
        header::render(frame, top, session, app.route());
    }

    let greeting = session.map(|s| s.display_name());
    match app.route() {
        Route::Login => app.login.render(frame, body),
        Route::Register => app.register.render(frame, body),
        Route::Participant => app.participant.render(frame, body, greeting),
        Route::Admin => app.admin.render(frame, body, greeting),
        Route::Activities => app.activities.render(frame, body),
        Route::ActivityTable => app.activity_table.render(frame, body),
        Route::RegisterActivity => app.activity_form.render(frame, body),
        Route::MyActivities => app.my_activities.render(frame, body),
        Route::QrReader => {
            let machine = lock(&app.scan);
            app.qr_reader.render(frame, body, &machine);
        }
    }

    let hint = if session.is_some() {
        format!("{}  ·  Ctrl+C sair", app.route().title())
    } else {
        "Ctrl+C sair".to_string()
    };
    frame.render_widget(Paragraph::new(hint).dark_gray(), status);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppEvent;
    use crate::session::test_tokens::token_for;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use shared::types::AppConfig;
    use tokio::sync::mpsc;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_header_only_with_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.session.file = dir.path().join("s.json").display().to_string();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(&config, tx);

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(!screen_text(&terminal).contains("F10 Sair"));

        app.handle_event(AppEvent::LoginFinished(Ok(token_for(3, "ADMIN"))));
        terminal.draw(|f| draw(f, &app)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("F10 Sair"));
        assert!(text.contains("Área do Administrador"));
    }
}
