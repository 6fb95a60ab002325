//! Video screen: launch the promotional video, then continue to the claim.

use crate::{
    app::{App, ScreenAction},
    chain::{CHAIN_HOME_URL, FAUCET_URL},
    nav::Route,
    screens::{field, render_footer, title_bar, Screen},
};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const ABOUT: &str = "This soulbound NFT represents your status as an original user of the \
OPN Chain testnet. It's non-transferable and permanently linked to your wallet, serving as \
proof of your early support and participation in the IOPn ecosystem.";

/// The video plays outside the terminal, so Continue never waits for it to end.
const FOOTER_HINTS: [(&str, &str); 4] = [
    ("Enter", "Continue (no need to finish the video)"),
    ("W", "Watch again"),
    ("D", "Disconnect"),
    ("Q", "Quit"),
];

pub struct VideoScreen {
    launched: bool,
    error: Option<String>,
}

impl VideoScreen {
    pub fn new() -> Self {
        Self {
            launched: false,
            error: None,
        }
    }

    pub fn reset(&mut self) {
        self.launched = false;
        self.error = None;
    }

    pub fn launched(&mut self) {
        self.launched = true;
        self.error = None;
    }

    pub fn launch_failed(&mut self, error: String) {
        self.launched = false;
        self.error = Some(error);
    }

    pub fn is_launched(&self) -> bool {
        self.launched
    }

    pub fn handle_key(&mut self, key: KeyCode) -> ScreenAction {
        match key {
            KeyCode::Enter | KeyCode::Char('c') | KeyCode::Char('C') => {
                ScreenAction::Navigate(Route::Claim)
            }
            // Re-mounting the screen plays the video again.
            KeyCode::Char('w') | KeyCode::Char('W') => ScreenAction::Reload,
            KeyCode::Char('o') | KeyCode::Char('O') => ScreenAction::Open(CHAIN_HOME_URL.to_string()),
            KeyCode::Char('f') | KeyCode::Char('F') => ScreenAction::Open(FAUCET_URL.to_string()),
            KeyCode::Char('d') | KeyCode::Char('D') => ScreenAction::Disconnect,
            _ => ScreenAction::None,
        }
    }
}

impl Screen for VideoScreen {
    fn render(&self, frame: &mut Frame, area: Rect, app: &App) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Title bar
                Constraint::Length(5), // Player
                Constraint::Min(6),    // About
                Constraint::Length(4), // Links
                Constraint::Length(2), // Footer
            ])
            .split(area);

        let (status, color) = if self.launched {
            ("Playing in external player", Color::Green)
        } else if self.error.is_some() {
            ("Video unavailable", Color::Red)
        } else {
            ("Starting video...", Color::Yellow)
        };
        frame.render_widget(title_bar("WATCH", status, color), chunks[0]);

        let mut player_lines = vec![field("Video", app.settings.video_url.clone(), Color::Cyan)];
        if let Some(addr) = app.session.primary_address() {
            player_lines.push(field("Wallet", addr.short(), Color::Cyan));
        }
        if let Some(err) = &self.error {
            player_lines.push(field("Error", err.clone(), Color::Red));
        }
        let player = Paragraph::new(player_lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(Span::styled(" Video ", Style::default().fg(Color::White))),
        );
        frame.render_widget(player, chunks[1]);

        let about = Paragraph::new(vec![
            Line::from(Span::styled(
                "You're ready to claim the Genesis n-Badge",
                Style::default()
                    .fg(Color::LightMagenta)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(ABOUT, Style::default().fg(Color::White))),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(about, chunks[2]);

        let links = Paragraph::new(vec![
            Line::from(vec![
                Span::styled("  [O] ", Style::default().fg(Color::LightMagenta)),
                Span::styled("Visit OPN Chain  ", Style::default().fg(Color::White)),
                Span::styled(CHAIN_HOME_URL, Style::default().fg(Color::DarkGray)),
            ]),
            Line::from(vec![
                Span::styled("  [F] ", Style::default().fg(Color::LightMagenta)),
                Span::styled("Get Test Tokens  ", Style::default().fg(Color::White)),
                Span::styled(FAUCET_URL, Style::default().fg(Color::DarkGray)),
            ]),
        ])
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(links, chunks[3]);

        render_footer(frame, chunks[4], app, &FOOTER_HINTS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        let mut screen = VideoScreen::new();
        assert_eq!(screen.handle_key(KeyCode::Enter), ScreenAction::Navigate(Route::Claim));
        assert_eq!(screen.handle_key(KeyCode::Char('w')), ScreenAction::Reload);
        assert_eq!(
            screen.handle_key(KeyCode::Char('f')),
            ScreenAction::Open(FAUCET_URL.to_string())
        );
        assert_eq!(screen.handle_key(KeyCode::Char('d')), ScreenAction::Disconnect);
        assert_eq!(screen.handle_key(KeyCode::Char('x')), ScreenAction::None);
    }

    #[test]
    fn test_continue_available_before_video_ends() {
        let mut screen = VideoScreen::new();
        screen.launched();
        assert_eq!(screen.handle_key(KeyCode::Enter), ScreenAction::Navigate(Route::Claim));
        assert_eq!(FOOTER_HINTS[0].0, "Enter");
        assert!(FOOTER_HINTS[0].1.contains("no need to finish"));
    }

    #[test]
    fn test_launch_state() {
        let mut screen = VideoScreen::new();
        screen.launch_failed("no player".to_string());
        assert!(!screen.is_launched());
        screen.launched();
        assert!(screen.is_launched());
        screen.reset();
        assert!(!screen.is_launched());
    }
}
