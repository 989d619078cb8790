use std::io::{Stdout, stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use scrollspy_core::{PageLayout, ScrollEvent, ScrollSpy, TrackerConfig, tracker};
use scrollspy_protocol::{NavUpdate, ScrollState, Section, StyleToken};

/// Page pixels represented by one terminal row.
const PX_PER_ROW: f64 = 20.0;
/// Navbar, progress bar, status line.
const CHROME_ROWS: u16 = 3;
const LINE_STEP: f64 = PX_PER_ROW * 2.0;
const FRAME: Duration = Duration::from_millis(16);

const SECTION_COLORS: [Color; 5] = [
    Color::Blue,
    Color::Green,
    Color::Yellow,
    Color::Cyan,
    Color::Red,
];

fn token_style(token: StyleToken) -> Style {
    match token {
        StyleToken::NavLinkActive => Style::default()
            .fg(Color::Black)
            .bg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
        StyleToken::NavLinkIdle => Style::default().fg(Color::Gray),
        StyleToken::NavbarTransparent => Style::default().bg(Color::Reset),
        StyleToken::NavbarScrolled => Style::default().bg(Color::DarkGray),
        StyleToken::ProgressBar => Style::default().fg(Color::Magenta),
    }
}

type Term = Terminal<CrosstermBackend<Stdout>>;

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

pub fn run(layout: PageLayout) -> Result<()> {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal();
        original_hook(info);
    }));

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, layout);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn log_updates(updates: &[NavUpdate]) {
    for update in updates {
        match update {
            NavUpdate::SetProgress { progress } => tracing::trace!(progress, "progress"),
            other => tracing::info!(update = ?other, "navigation update"),
        }
    }
}

fn event_loop(terminal: &mut Term, layout: PageLayout) -> Result<()> {
    let document_height = layout.document_height();
    let sections = layout.sections.clone();
    let config = layout.tracker.clone();
    let mut spy = ScrollSpy::from_layout(layout);

    let mut scroll_y: f64 = 0.0;
    let mut reported_scroll: Option<f64> = None;
    let mut viewport_rows: Option<u16> = None;
    let mut last_frame = Instant::now();

    loop {
        let size = terminal.size()?;
        let rows = size.height.saturating_sub(CHROME_ROWS);
        let viewport_height = f64::from(rows) * PX_PER_ROW;
        let max_scroll = (document_height - viewport_height).max(0.0);
        scroll_y = scroll_y.clamp(0.0, max_scroll);
        let scroll = ScrollState::new(scroll_y, viewport_height, document_height);

        if viewport_rows != Some(rows) {
            viewport_rows = Some(rows);
            reported_scroll = Some(scroll_y);
            log_updates(&spy.handle(ScrollEvent::Resize(scroll)));
        } else if reported_scroll != Some(scroll_y) {
            reported_scroll = Some(scroll_y);
            log_updates(&spy.handle(ScrollEvent::Scroll(scroll)));
        }

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f64();
        last_frame = now;
        log_updates(&spy.handle(ScrollEvent::Tick { dt }));

        terminal.draw(|frame| draw(frame, &spy, &sections, &config, &scroll))?;

        if !event::poll(FRAME)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Up | KeyCode::Char('k') => scroll_y -= LINE_STEP,
                KeyCode::Down | KeyCode::Char('j') => scroll_y += LINE_STEP,
                KeyCode::PageUp => scroll_y -= viewport_height * 0.9,
                KeyCode::PageDown | KeyCode::Char(' ') => scroll_y += viewport_height * 0.9,
                KeyCode::Home => scroll_y = 0.0,
                KeyCode::End => scroll_y = max_scroll,
                KeyCode::Char(c) => {
                    if let Some(target) = jump_target(&sections, c) {
                        scroll_y = target;
                    }
                }
                _ => {}
            },
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollDown => scroll_y += LINE_STEP,
                MouseEventKind::ScrollUp => scroll_y -= LINE_STEP,
                _ => {}
            },
            _ => {}
        }
    }

    Ok(())
}

/// Scroll offset reached by pressing digit `key`, like clicking the n-th
/// nav link.
fn jump_target(sections: &[Section], key: char) -> Option<f64> {
    let n = key.to_digit(10)? as usize;
    sections.get(n.checked_sub(1)?).map(|s| s.offset_top)
}

/// Content row holding document coordinate `y`, if it is on screen.
fn row_of(y: f64, scroll_y: f64, rows: u16) -> Option<u16> {
    let row = ((y - scroll_y) / PX_PER_ROW).floor();
    (row >= 0.0 && row < f64::from(rows)).then_some(row as u16)
}

fn draw(
    frame: &mut Frame<'_>,
    spy: &ScrollSpy,
    sections: &[Section],
    config: &TrackerConfig,
    scroll: &ScrollState,
) {
    let area = frame.area();
    let rows = area.height.saturating_sub(CHROME_ROWS);
    let navbar_style = token_style(StyleToken::navbar(spy.scrolled()));

    // Navbar
    let mut nav = vec![Span::styled(" scrollspy ", navbar_style.add_modifier(Modifier::BOLD))];
    for (i, section) in sections.iter().enumerate() {
        let link = token_style(StyleToken::nav_link(*spy.active() == section.id));
        nav.push(Span::styled("  ", navbar_style));
        nav.push(Span::styled(
            format!("{} {}", i + 1, section.label),
            navbar_style.patch(link),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(nav)).style(navbar_style),
        Rect::new(0, 0, area.width, 1),
    );

    // Progress bar
    let filled = (f64::from(area.width) * spy.progress()).round() as usize;
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "━".repeat(filled),
            token_style(StyleToken::ProgressBar),
        ))),
        Rect::new(0, 1, area.width, 1),
    );

    // Simulated page
    let clamped = scroll.clamped();
    let probe = tracker::probe_point(&clamped, config);
    let probe_row = row_of(probe, clamped.scroll_y, rows);
    let mut lines = Vec::with_capacity(usize::from(rows));
    for row in 0..rows {
        let top = clamped.scroll_y + f64::from(row) * PX_PER_ROW;
        let found = sections.iter().enumerate().find(|(_, s)| s.contains(top));
        let mut spans = match found {
            Some((i, section)) => {
                let mut style = Style::default().fg(SECTION_COLORS[i % SECTION_COLORS.len()]);
                if *spy.active() == section.id {
                    style = style.add_modifier(Modifier::BOLD);
                }
                let starts_here = section.offset_top > top - PX_PER_ROW;
                let text = if starts_here {
                    format!(
                        "▌ {} #{}  top={:.0}px height={:.0}px",
                        section.label, section.id, section.offset_top, section.offset_height
                    )
                } else {
                    "▌".to_string()
                };
                vec![Span::styled(text, style)]
            }
            None => vec![Span::styled("  ·", Style::default().fg(Color::DarkGray))],
        };
        if probe_row == Some(row) {
            spans.push(Span::styled(
                format!("   ◀ probe {probe:.0}px"),
                Style::default().fg(Color::Magenta),
            ));
        }
        lines.push(Line::from(spans));
    }
    frame.render_widget(Paragraph::new(lines), Rect::new(0, 2, area.width, rows));

    // Status
    let bottom = if tracker::is_at_bottom(&clamped, config) {
        " | bottom rule"
    } else {
        ""
    };
    let status = format!(
        " ↑↓ scroll | PgUp/PgDn page | 1-{} jump | q quit | y={:.0}px of {:.0}px{bottom}",
        sections.len().min(9),
        clamped.scroll_y,
        clamped.max_scroll(),
    );
    frame.render_widget(
        Paragraph::new(status).style(Style::default().fg(Color::White).bg(Color::DarkGray)),
        Rect::new(0, area.height.saturating_sub(1), area.width, 1),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_jump_to_sections() {
        let layout = PageLayout::portfolio();
        assert_eq!(jump_target(&layout.sections, '1'), Some(0.0));
        assert_eq!(jump_target(&layout.sections, '3'), Some(1540.0));
        assert_eq!(jump_target(&layout.sections, '0'), None);
        assert_eq!(jump_target(&layout.sections, '9'), None);
        assert_eq!(jump_target(&layout.sections, 'x'), None);
    }

    #[test]
    fn probe_row_only_when_visible() {
        assert_eq!(row_of(300.0, 0.0, 40), Some(15));
        assert_eq!(row_of(310.0, 0.0, 40), Some(15));
        assert_eq!(row_of(900.0, 0.0, 40), None);
        assert_eq!(row_of(-5.0, 0.0, 40), None);
    }
}
