//! Claim screen: eligibility status and the claim button.

use crate::{
    app::{App, ScreenAction},
    chain::{CHAIN_HOME_URL, FAUCET_URL, OPN_TESTNET},
    claim::{ClaimAttempt, ClaimOutcome, ClaimPhase, ClaimProgress, ClaimStatus, STATUS_CHECK_FAILED},
    eth::Address,
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

pub struct ClaimScreen {
    /// Bumped on every mount; results tagged with an older epoch are dropped.
    pub epoch: u64,
    pub status: ClaimStatus,
    pub status_error: Option<String>,
    pub attempt: ClaimAttempt,
    checked: Option<Address>,
}

impl ClaimScreen {
    pub fn new() -> Self {
        Self {
            epoch: 0,
            status: ClaimStatus::Unknown,
            status_error: None,
            attempt: ClaimAttempt::default(),
            checked: None,
        }
    }

    /// Start a visit. A pending attempt survives re-mounts until the session ends.
    pub fn mount(&mut self) {
        self.epoch += 1;
        self.status = ClaimStatus::Unknown;
        self.status_error = None;
        if self.attempt.phase != ClaimPhase::PendingUnconfirmed {
            self.attempt = ClaimAttempt::default();
        }
        self.checked = None;
    }

    /// Forget the attempt of a session that has been logged out.
    pub fn end_session(&mut self) {
        self.attempt = ClaimAttempt::default();
    }

    /// Begin a status check for `address`; returns the epoch to tag it with.
    pub fn start_check(&mut self, address: Address) -> u64 {
        self.status = ClaimStatus::Checking;
        self.status_error = None;
        self.checked = Some(address);
        self.epoch
    }

    /// Address the current status belongs to.
    pub fn checked_address(&self) -> Option<Address> {
        self.checked
    }

    pub fn handle_status(&mut self, epoch: u64, address: Address, result: Result<ClaimStatus, String>) {
        if epoch != self.epoch || self.checked != Some(address) {
            tracing::debug!(epoch, %address, "dropping stale status check");
            return;
        }
        match result {
            Ok(status) => {
                self.status = status;
                self.status_error = None;
            }
            Err(_) => {
                self.status = ClaimStatus::Unknown;
                self.status_error = Some(STATUS_CHECK_FAILED.to_string());
            }
        }
    }

    pub fn handle_progress(&mut self, epoch: u64, progress: &ClaimProgress) {
        if epoch == self.epoch {
            self.attempt.progress(progress);
        }
    }

    pub fn handle_finished(&mut self, epoch: u64, outcome: &ClaimOutcome) {
        if epoch != self.epoch {
            tracing::debug!(epoch, "dropping claim outcome for unmounted screen");
            return;
        }
        self.attempt.finish(outcome);
        if let Some(status) = outcome.status_update() {
            self.status = status;
        }
    }

    pub fn handle_key(&mut self, key: KeyCode) -> ScreenAction {
        match key {
            KeyCode::Enter | KeyCode::Char('c') | KeyCode::Char('C') => ScreenAction::Claim,
            // Re-checking mid-claim would drop the running attempt.
            KeyCode::Char('r') | KeyCode::Char('R') if !self.attempt.in_flight() => ScreenAction::Reload,
            KeyCode::Char('e') | KeyCode::Char('E') => match &self.attempt.tx_hash {
                Some(hash) => ScreenAction::Open(OPN_TESTNET.tx_url(hash)),
                None => ScreenAction::None,
            },
            KeyCode::Char('o') | KeyCode::Char('O') => ScreenAction::Open(CHAIN_HOME_URL.to_string()),
            KeyCode::Char('f') | KeyCode::Char('F') => ScreenAction::Open(FAUCET_URL.to_string()),
            KeyCode::Char('d') | KeyCode::Char('D') => ScreenAction::Disconnect,
            _ => ScreenAction::None,
        }
    }

    fn title_status(&self) -> (&'static str, Color) {
        if self.attempt.phase.is_claimed() {
            return ("Claimed", Color::Green);
        }
        if self.attempt.phase == ClaimPhase::PendingUnconfirmed {
            return ("Pending", Color::Yellow);
        }
        match self.status {
            ClaimStatus::Unknown if self.status_error.is_some() => ("Status unavailable", Color::Red),
            ClaimStatus::Unknown => ("No wallet", Color::DarkGray),
            ClaimStatus::Checking => ("Checking...", Color::Yellow),
            ClaimStatus::OpenNotClaimed => ("Open", Color::Green),
            ClaimStatus::OpenAlreadyClaimed => ("Already claimed", Color::Cyan),
            ClaimStatus::Closed => ("Not open yet", Color::Yellow),
        }
    }

    fn body(&self) -> Vec<Line<'static>> {
        let bold = |text: &'static str, color: Color| {
            Line::from(Span::styled(
                text,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
        };
        let plain = |text: String, color: Color| Line::from(Span::styled(text, Style::default().fg(color)));

        if self.attempt.phase.is_claimed() {
            let mut lines = vec![
                bold("Genesis n-Badge claimed!", Color::Green),
                Line::from(""),
                plain("Welcome to the OPN Chain. Your soulbound badge is in your wallet.".to_string(), Color::White),
            ];
            if let Some(hash) = &self.attempt.tx_hash {
                lines.push(Line::from(""));
                lines.push(plain(format!("tx {}", hash), Color::DarkGray));
                lines.push(plain(format!("[E] View on {}", OPN_TESTNET.explorer_name), Color::LightMagenta));
            }
            return lines;
        }

        if self.attempt.phase == ClaimPhase::PendingUnconfirmed {
            let mut lines = vec![
                bold("Claim submitted, not yet confirmed", Color::Yellow),
                Line::from(""),
                plain(
                    "The transaction may still land. Check the explorer before trying again.".to_string(),
                    Color::White,
                ),
            ];
            if let Some(hash) = &self.attempt.tx_hash {
                lines.push(Line::from(""));
                lines.push(plain(format!("tx {}", hash), Color::DarkGray));
                lines.push(plain(format!("[E] View on {}", OPN_TESTNET.explorer_name), Color::LightMagenta));
            }
            return lines;
        }

        match self.status {
            ClaimStatus::Checking => vec![plain("Checking claim status...".to_string(), Color::Yellow)],
            ClaimStatus::Unknown => match &self.status_error {
                Some(err) => vec![
                    plain(err.clone(), Color::Red),
                    Line::from(""),
                    plain("[R] Retry".to_string(), Color::LightMagenta),
                ],
                None => vec![plain("Connect a wallet to check eligibility.".to_string(), Color::DarkGray)],
            },
            ClaimStatus::Closed => vec![
                bold("Claiming is not open yet", Color::Yellow),
                Line::from(""),
                plain("Please check back later.".to_string(), Color::White),
            ],
            ClaimStatus::OpenAlreadyClaimed => vec![
                bold("You already hold the Genesis n-Badge", Color::Cyan),
                Line::from(""),
                plain("Each wallet can claim one badge.".to_string(), Color::White),
            ],
            ClaimStatus::OpenNotClaimed => {
                let (label, color) = match self.attempt.phase {
                    ClaimPhase::Submitting => ("Confirm the transaction in your wallet...", Color::Yellow),
                    ClaimPhase::AwaitingReceipt => ("Waiting for confirmation...", Color::Yellow),
                    ClaimPhase::ReceiptAmbiguous => ("Verifying your claim...", Color::Yellow),
                    _ => ("[Enter] Claim Genesis n-Badge", Color::LightMagenta),
                };
                let mut lines = vec![bold(label, color)];
                if let Some(hash) = &self.attempt.tx_hash {
                    lines.push(Line::from(""));
                    lines.push(plain(format!("tx {}", hash), Color::DarkGray));
                }
                lines
            }
        }
    }
}

impl Screen for ClaimScreen {
    fn render(&self, frame: &mut Frame, area: Rect, app: &App) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Title bar
                Constraint::Length(6), // Wallet card
                Constraint::Min(7),    // Claim panel
                Constraint::Length(2), // Attempt error
                Constraint::Length(2), // Footer
            ])
            .split(area);

        let (status, color) = self.title_status();
        frame.render_widget(title_bar("GENESIS n-BADGE", status, color), chunks[0]);

        let wallet = app
            .session
            .primary_address()
            .map(|a| a.short())
            .unwrap_or_else(|| "not connected".to_string());
        let card = Paragraph::new(vec![
            field("Wallet", wallet, Color::Cyan),
            field("Network", format!("{} ({})", OPN_TESTNET.name, OPN_TESTNET.id), Color::Cyan),
            field("Contract", app.settings.contract_address.short(), Color::Cyan),
            field("Token", "Soulbound ERC-721".to_string(), Color::White),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(Span::styled(" Badge ", Style::default().fg(Color::White))),
        );
        frame.render_widget(card, chunks[1]);

        let panel = Paragraph::new(self.body())
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        frame.render_widget(panel, chunks[2]);

        if let Some(err) = &self.attempt.error {
            let color = if self.attempt.phase == ClaimPhase::PendingUnconfirmed {
                Color::Yellow
            } else {
                Color::Red
            };
            let line = Paragraph::new(Line::from(vec![
                Span::styled(" ✗ ", Style::default().fg(color)),
                Span::styled(err.as_str(), Style::default().fg(color)),
            ]))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            frame.render_widget(line, chunks[3]);
        }

        let mut hints = Vec::new();
        if !self.attempt.phase.blocks_submit() {
            hints.push(("Enter", "Claim"));
        }
        hints.push(("R", "Refresh"));
        if self.attempt.tx_hash.is_some() {
            hints.push(("E", OPN_TESTNET.explorer_name));
        }
        hints.extend([("F", "Faucet"), ("D", "Disconnect"), ("Q", "Quit")]);
        render_footer(frame, chunks[4], app, &hints);
    }
}
