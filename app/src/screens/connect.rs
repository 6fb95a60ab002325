//! Connect screen: the only way into a wallet session.

use crate::{
    app::{App, ScreenAction},
    screens::{render_footer, title_bar, Screen},
    wallet::Session,
};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const BANNER: &str = r#"
   ╔═══════════════════════════════════════╗
   ║                                       ║
   ║              G E N E S I S            ║
   ║                 n-Badge               ║
   ║                                       ║
   ╚═══════════════════════════════════════╝
"#;

pub struct ConnectScreen {
    /// User pressed Connect during this visit.
    pub connect_requested: bool,
    pub connecting: bool,
    pub logging_out: bool,
}

impl ConnectScreen {
    pub fn new() -> Self {
        Self {
            connect_requested: false,
            connecting: false,
            logging_out: false,
        }
    }

    /// Start a visit. Returns `true` if an inherited session must be logged
    /// out, since no connect has been requested yet in this visit.
    pub fn mount(&mut self, session: &Session) -> bool {
        self.connect_requested = false;
        self.connecting = false;
        session.authenticated
    }

    /// Mark an explicit connect. Refused while a login or logout is running.
    pub fn begin_connect(&mut self) -> bool {
        if self.connecting || self.logging_out {
            return false;
        }
        self.connect_requested = true;
        self.connecting = true;
        true
    }

    /// Login finished. Returns whether it answered an explicit connect.
    pub fn login_completed(&mut self) -> bool {
        let explicit = self.connect_requested && self.connecting;
        self.connecting = false;
        explicit
    }

    pub fn login_failed(&mut self) {
        self.connecting = false;
        self.connect_requested = false;
    }

    pub fn handle_key(&mut self, key: KeyCode) -> ScreenAction {
        match key {
            KeyCode::Enter | KeyCode::Char('c') | KeyCode::Char('C') => {
                if self.connecting || self.logging_out {
                    ScreenAction::None
                } else {
                    ScreenAction::Connect
                }
            }
            _ => ScreenAction::None,
        }
    }

    fn button_label(&self) -> (&'static str, Color) {
        if self.logging_out {
            ("Disconnecting...", Color::DarkGray)
        } else if self.connecting {
            ("Connecting... approve the request in your wallet", Color::Yellow)
        } else {
            ("[Enter] Connect Wallet", Color::LightMagenta)
        }
    }
}

impl Screen for ConnectScreen {
    fn render(&self, frame: &mut Frame, area: Rect, app: &App) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints([
                Constraint::Length(3), // Title bar
                Constraint::Length(8), // Banner
                Constraint::Length(4), // Tagline
                Constraint::Length(3), // Button
                Constraint::Min(0),
                Constraint::Length(2), // Footer
            ])
            .split(area);

        let (status, color) = if app.session.authenticated {
            ("Connected", Color::Green)
        } else {
            ("Not connected", Color::Yellow)
        };
        frame.render_widget(title_bar("CONNECT", status, color), chunks[0]);

        let banner = Paragraph::new(BANNER)
            .style(Style::default().fg(Color::Magenta))
            .alignment(Alignment::Center);
        frame.render_widget(banner, chunks[1]);

        let tagline = Paragraph::new(vec![
            Line::from(Span::styled(
                "The Definitive OPN Chain Badge",
                Style::default().fg(Color::LightMagenta),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "EXCLUSIVE ACCESS  |  LIMITED EDITION",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(tagline, chunks[2]);

        let (label, label_color) = self.button_label();
        let button = Paragraph::new(Span::styled(
            label,
            Style::default().fg(label_color).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(button, chunks[3]);

        render_footer(frame, chunks[5], app, &[("Enter", "Connect"), ("Q", "Quit")]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_requests_logout_only_for_live_session() {
        let mut screen = ConnectScreen::new();
        assert!(!screen.mount(&Session::default()));

        let live = Session {
            authenticated: true,
            wallets: Vec::new(),
        };
        screen.connect_requested = true;
        assert!(screen.mount(&live));
        assert!(!screen.connect_requested);
    }

    #[test]
    fn test_connect_is_single_flight() {
        let mut screen = ConnectScreen::new();
        assert_eq!(screen.handle_key(KeyCode::Enter), ScreenAction::Connect);
        assert!(screen.begin_connect());
        assert!(!screen.begin_connect());
        assert_eq!(screen.handle_key(KeyCode::Enter), ScreenAction::None);

        assert!(screen.login_completed());
        assert!(!screen.connecting);
    }

    #[test]
    fn test_login_without_request_is_not_explicit() {
        let mut screen = ConnectScreen::new();
        assert!(!screen.login_completed());

        screen.begin_connect();
        screen.login_failed();
        assert!(!screen.login_completed());
    }

    #[test]
    fn test_connect_blocked_while_logging_out() {
        let mut screen = ConnectScreen::new();
        screen.logging_out = true;
        assert_eq!(screen.handle_key(KeyCode::Enter), ScreenAction::None);
        assert!(!screen.begin_connect());
    }
}
