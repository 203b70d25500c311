use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};

/// A `width` x `height` rect centered in `area`, clamped to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [rect] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    rect
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Danger,
}

impl Tone {
    fn color(&self) -> Color {
        match self {
            Self::Info => Color::Cyan,
            Self::Success => Color::Green,
            Self::Danger => Color::Red,
        }
    }
}

/// Draw a dialog over whatever is below it. `footer` lists the keys that
/// close it.
pub fn render_dialog(
    frame: &mut Frame,
    title: &str,
    body: Vec<Line<'_>>,
    footer: &str,
    tone: Tone,
) {
    let height = body.len() as u16 + 5;
    let area = centered(frame.area(), 64, height);

    let mut lines = body;
    lines.push(Line::raw(""));
    lines.push(Line::styled(footer.to_string(), Style::new().fg(Color::DarkGray)));

    let dialog = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::bordered()
            .title(title.to_string())
            .border_style(Style::new().fg(tone.color())),
    );

    frame.render_widget(Clear, area);
    frame.render_widget(dialog, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_fits_inside() {
        let area = Rect::new(0, 0, 100, 40);
        let r = centered(area, 60, 10);
        assert_eq!((r.width, r.height), (60, 10));
        assert_eq!((r.x, r.y), (20, 15));
    }

    #[test]
    fn test_centered_clamps_to_area() {
        let area = Rect::new(0, 0, 30, 5);
        let r = centered(area, 60, 10);
        assert_eq!((r.width, r.height), (30, 5));
    }
}
