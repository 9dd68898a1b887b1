use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    controller::Session,
    engine::{CharClass, Stats, TestResult},
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

const LEGEND: &str = "(tab) restart / (esc)ape";

impl Widget for &Session {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let engine = self.engine();

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
        let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);
        let underlined_dim_bold_style = Style::default()
            .patch(dim_bold_style)
            .add_modifier(Modifier::UNDERLINED);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Length(3), // stats
                Constraint::Min(3),    // target text
                Constraint::Length(3), // input
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled("typometer", bold_style.fg(Color::Cyan)))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        render_stats(engine.stats(), chunks[1], buf);

        // zip skips any character without a display cell
        let spans = engine
            .target()
            .iter()
            .zip(engine.display())
            .map(|(&expected, class)| match class {
                CharClass::Untyped => Span::styled(expected.to_string(), dim_bold_style),
                CharClass::Current => {
                    Span::styled(expected.to_string(), underlined_dim_bold_style)
                }
                CharClass::Correct => Span::styled(expected.to_string(), green_bold_style),
                CharClass::Incorrect => Span::styled(
                    match expected {
                        ' ' => "·".to_owned(),
                        c => c.to_string(),
                    },
                    red_bold_style,
                ),
            })
            .collect::<Vec<Span>>();

        Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL).title("text"))
            .wrap(Wrap { trim: false })
            .render(chunks[2], buf);

        let input = engine.input();
        let (input_title, input_style) = if input.enabled {
            ("type here", Style::default())
        } else {
            ("done", dim_bold_style)
        };
        let mut input_line = vec![Span::styled(input.value.clone(), input_style)];
        if input.focused {
            input_line.push(Span::styled(" ", Style::default().add_modifier(Modifier::REVERSED)));
        }
        Paragraph::new(Line::from(input_line))
            .block(Block::default().borders(Borders::ALL).title(input_title))
            .render(chunks[3], buf);

        Paragraph::new(Span::styled(LEGEND, italic_style)).render(chunks[4], buf);

        if let Some(result) = self.overlay() {
            render_overlay(result, area, buf);
        }
    }
}

fn render_stats(stats: Stats, area: Rect, buf: &mut Buffer) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let cells = [
        ("WPM", stats.wpm_label()),
        ("Errors", stats.errors_label()),
        ("Time", stats.time_label()),
    ];
    for ((title, value), column) in cells.into_iter().zip(columns.iter()) {
        Paragraph::new(value)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(title))
            .render(*column, buf);
    }
}

fn render_overlay(result: TestResult, area: Rect, buf: &mut Buffer) {
    let lines = [
        format!("WPM: {}", result.wpm),
        format!("Errors: {}", result.errors),
        String::new(),
        "(enter) restart / (esc)ape".to_string(),
    ];
    let content_width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16;
    let popup = centered_rect(content_width + 4, lines.len() as u16 + 2, area);

    Clear.render(popup, buf);
    Paragraph::new(lines.into_iter().map(Line::from).collect::<Vec<Line>>())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Results")
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .render(popup, buf);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock, controller::Controller, engine::EngineSettings, texts::TextSource,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use rand::{rngs::StdRng, SeedableRng};
    use std::{rc::Rc, time::Duration};

    fn controller(text: &str) -> (Controller<StdRng>, ManualClock) {
        let clock = ManualClock::new();
        let c = Controller::new(
            TextSource::new([text]).unwrap(),
            StdRng::seed_from_u64(0),
            Rc::new(clock.clone()),
            EngineSettings::default(),
        );
        (c, clock)
    }

    fn rendered(c: &Controller<StdRng>, area: Rect) -> (Buffer, String) {
        let mut buffer = Buffer::empty(area);
        c.session().render(area, &mut buffer);
        let text = buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        (buffer, text)
    }

    #[test]
    fn test_blank_session_renders_text_and_zero_stats() {
        let (c, _clock) = controller("cat");
        let (_, text) = rendered(&c, Rect::new(0, 0, 80, 24));

        assert!(text.contains("cat"));
        assert!(text.contains("WPM"));
        assert!(text.contains("Errors"));
        assert!(text.contains("0s"));
        assert!(text.contains(LEGEND));
        assert!(!text.contains("Results"));
    }

    #[test]
    fn test_highlight_styles() {
        let (mut c, _clock) = controller("abc");
        c.handle_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE));
        let (buffer, _) = rendered(&c, Rect::new(0, 0, 80, 24));

        let cells: Vec<_> = buffer
            .content()
            .iter()
            .filter(|cell| matches!(cell.symbol(), "a" | "b" | "c"))
            .filter(|cell| cell.fg != Color::Reset || !cell.modifier.is_empty())
            .collect();
        assert!(cells
            .iter()
            .any(|cell| cell.symbol() == "a" && cell.fg == Color::Red));
        assert!(cells
            .iter()
            .any(|cell| cell.symbol() == "b" && cell.modifier.contains(Modifier::UNDERLINED)));
    }

    #[test]
    fn test_overlay_shows_result() {
        let (mut c, clock) = controller("ab");
        for ch in "ab".chars() {
            clock.advance(Duration::from_secs(1));
            c.handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
        }
        let (_, text) = rendered(&c, Rect::new(0, 0, 80, 24));

        assert!(text.contains("Results"));
        // (2 / 5) / (1 / 60) = 24
        assert!(text.contains("WPM: 24"));
        assert!(text.contains("Errors: 0"));
    }

    #[test]
    fn test_small_area_does_not_panic() {
        let (mut c, clock) = controller("ab");
        for ch in "ab".chars() {
            clock.advance(Duration::from_secs(1));
            c.handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
        }
        let area = Rect::new(0, 0, 12, 4);
        let (buffer, _) = rendered(&c, area);

        assert_eq!(*buffer.area(), area);
    }

    #[test]
    fn test_centered_rect_clamps() {
        let area = Rect::new(0, 0, 10, 5);
        assert_eq!(centered_rect(20, 20, area), area);
        assert_eq!(centered_rect(4, 1, area), Rect::new(3, 2, 4, 1));
    }
}
