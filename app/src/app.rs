//! Application state machine.

use crate::{
    chain::{ChainReader, RpcReader, OPN_TESTNET},
    claim::{self, ClaimFlow, ClaimOutcome, ClaimProgress, ClaimStatus},
    config::{AppConfig, Settings},
    eth::Address,
    nav::{Navigator, Route},
    rpc::RpcClient,
    screens::{claim::ClaimScreen, connect::ConnectScreen, video::VideoScreen, Screen},
    wallet::{RpcWallet, Session, WalletProvider},
};
use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::Frame;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Messages for async operations.
#[derive(Debug, Clone)]
pub enum AppMessage {
    /// Wallet granted account access
    LoginCompleted(Vec<Address>),
    /// Wallet login failed or was refused
    LoginFailed(String),
    /// Wallet acknowledged the logout
    LogoutCompleted,
    /// Eligibility check finished for `address` (mount `epoch` of the Claim screen)
    StatusChecked {
        epoch: u64,
        address: Address,
        result: Result<ClaimStatus, String>,
    },
    /// Claim attempt progressed
    ClaimProgress { epoch: u64, progress: ClaimProgress },
    /// Claim attempt reached a terminal outcome
    ClaimFinished { epoch: u64, outcome: ClaimOutcome },
}

/// Action returned from screen handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenAction {
    None,
    Navigate(Route),
    Connect,
    Disconnect,
    Claim,
    Reload,
    Open(String),
}

/// Opens URLs (video, explorer, faucet) outside the terminal.
pub type Opener = fn(&str) -> std::io::Result<()>;

fn system_open(url: &str) -> std::io::Result<()> {
    open::that(url)
}

/// Main application state.
pub struct App {
    pub settings: Settings,
    pub config: AppConfig,
    /// Where the fragment is persisted; `None` keeps it in memory only.
    pub config_path: Option<PathBuf>,
    pub nav: Navigator,
    pub session: Session,
    pub wallet: Arc<dyn WalletProvider>,
    pub flow: ClaimFlow,
    pub opener: Opener,
    pub quit: bool,

    // Screen states
    pub connect: ConnectScreen,
    pub video: VideoScreen,
    pub claim: ClaimScreen,

    // Transient state
    pub status_message: Option<String>,
    pub error_message: Option<String>,
}

impl App {
    pub fn new(settings: Settings, fragment: Option<String>) -> Result<Self> {
        let config = AppConfig::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load config, using defaults");
            AppConfig::default()
        });

        if settings.has_placeholder_app_id() {
            tracing::warn!("wallet app id is the placeholder; set BADGE_WALLET_APP_ID");
        }

        let wallet: Arc<dyn WalletProvider> =
            Arc::new(RpcWallet::new(settings.wallet_url.clone(), &settings.wallet_app_id));
        let reader: Arc<dyn ChainReader> = Arc::new(RpcReader::new(
            RpcClient::new(settings.rpc_url.clone()),
            settings.contract_address,
        ));

        let fragment = fragment.unwrap_or_else(|| config.fragment.clone());
        let mut app = Self::with_parts(settings, wallet, reader, &fragment);
        app.config = config;
        app.config_path = Some(AppConfig::path());
        Ok(app)
    }

    /// Build an app from explicit collaborators.
    pub fn with_parts(
        settings: Settings,
        wallet: Arc<dyn WalletProvider>,
        reader: Arc<dyn ChainReader>,
        fragment: &str,
    ) -> Self {
        let flow = ClaimFlow::new(reader, OPN_TESTNET, settings.contract_address);
        Self {
            settings,
            config: AppConfig::default(),
            config_path: None,
            nav: Navigator::from_fragment(fragment),
            session: Session::default(),
            wallet,
            flow,
            opener: system_open,
            quit: false,
            connect: ConnectScreen::new(),
            video: VideoScreen::new(),
            claim: ClaimScreen::new(),
            status_message: None,
            error_message: None,
        }
    }

    /// Mount the screen for the initial route. A deep link into Video or
    /// Claim lands on Connect, since no session survives a restart.
    pub fn start(&mut self, tx: mpsc::Sender<AppMessage>) {
        let route = self.nav.route();
        self.navigate(route, tx);
    }

    /// Navigate (guarded), persist the fragment, and mount the target screen.
    pub fn navigate(&mut self, route: Route, tx: mpsc::Sender<AppMessage>) {
        let target = self.nav.navigate_guarded(route, self.session.authenticated);
        self.persist_fragment();
        self.mount(target, tx);
    }

    fn persist_fragment(&mut self) {
        if self.config.fragment == self.nav.fragment() {
            return;
        }
        self.config.fragment = self.nav.fragment().to_string();
        if let Some(path) = &self.config_path {
            if let Err(e) = self.config.save_to(path) {
                tracing::warn!(error = %e, "could not persist navigation fragment");
            }
        }
    }

    fn mount(&mut self, route: Route, tx: mpsc::Sender<AppMessage>) {
        match route {
            Route::Connect => {
                if self.connect.mount(&self.session) {
                    tracing::info!("stale session on connect screen, logging out");
                    self.logout(tx);
                }
            }
            Route::Video => {
                self.video.reset();
                self.play_video();
            }
            Route::Claim => {
                self.claim.mount();
                self.start_status_check(tx);
            }
        }
    }

    fn play_video(&mut self) {
        let url = self.settings.video_url.clone();
        match (self.opener)(&url) {
            Ok(()) => self.video.launched(),
            Err(e) => {
                tracing::warn!(%url, error = %e, "could not open video");
                self.video.launch_failed(format!("Could not open video: {}", e));
            }
        }
    }

    fn open_url(&mut self, url: &str) {
        if let Err(e) = (self.opener)(url) {
            tracing::warn!(%url, error = %e, "could not open link");
            self.error_message = Some(format!("Could not open {}: {}", url, e));
        } else {
            self.status_message = Some(format!("Opened {}", url));
        }
    }

    /// Run the eligibility check for the first wallet, if there is one.
    fn start_status_check(&mut self, tx: mpsc::Sender<AppMessage>) {
        let Some(address) = self.session.primary_address() else {
            return;
        };
        let epoch = self.claim.start_check(address);
        let reader = self.flow.reader();

        tokio::spawn(async move {
            let result = claim::check_eligibility(reader.as_ref(), address)
                .await
                .map_err(|e| {
                    tracing::error!(%address, error = %e, "claim status check failed");
                    e.to_string()
                });
            let _ = tx
                .send(AppMessage::StatusChecked {
                    epoch,
                    address,
                    result,
                })
                .await;
        });
    }

    fn start_login(&mut self, tx: mpsc::Sender<AppMessage>) {
        if !self.connect.begin_connect() {
            return;
        }
        self.status_message = Some("Connecting wallet...".to_string());

        // A lingering session is dropped before a fresh login.
        let relogin = self.session.authenticated;
        if relogin {
            self.session.logout();
            self.claim.end_session();
        }

        let wallet = self.wallet.clone();
        tokio::spawn(async move {
            if relogin {
                if let Err(e) = wallet.disconnect().await {
                    tracing::warn!(error = %e, "logout before login failed");
                }
            }
            match wallet.connect().await {
                Ok(accounts) => {
                    let _ = tx.send(AppMessage::LoginCompleted(accounts)).await;
                }
                Err(e) => {
                    let _ = tx.send(AppMessage::LoginFailed(e.to_string())).await;
                }
            }
        });
    }

    /// Clear the session now and tell the wallet in the background.
    fn logout(&mut self, tx: mpsc::Sender<AppMessage>) {
        self.session.logout();
        self.claim.end_session();
        self.connect.logging_out = true;

        let wallet = self.wallet.clone();
        tokio::spawn(async move {
            if let Err(e) = wallet.disconnect().await {
                tracing::warn!(error = %e, "wallet logout failed");
            }
            let _ = tx.send(AppMessage::LogoutCompleted).await;
        });
    }

    fn start_claim(&mut self, tx: mpsc::Sender<AppMessage>) {
        if !self.claim.status.can_claim() {
            return;
        }
        let Some(wallet) = self.session.primary().cloned() else {
            self.claim.attempt.error = Some("No wallet connected".to_string());
            return;
        };
        if !self.claim.attempt.begin() {
            tracing::debug!("claim already in flight, ignoring submit");
            return;
        }

        let epoch = self.claim.epoch;
        let flow = self.flow.clone();
        tokio::spawn(async move {
            // Progress is queued without bound and forwarded in order, so the
            // hash is never lost to a full channel and always precedes the outcome.
            let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
            let run = async move {
                flow.run(&wallet, move |progress| {
                    let _ = progress_tx.send(progress);
                })
                .await
            };
            let forward = {
                let tx = tx.clone();
                async move {
                    while let Some(progress) = progress_rx.recv().await {
                        let _ = tx.send(AppMessage::ClaimProgress { epoch, progress }).await;
                    }
                }
            };
            let (outcome, ()) = tokio::join!(run, forward);
            let _ = tx.send(AppMessage::ClaimFinished { epoch, outcome }).await;
        });
    }

    /// Apply a session change: re-check guards and eligibility.
    fn session_changed(&mut self, tx: mpsc::Sender<AppMessage>) {
        if self.nav.enforce_guard(self.session.authenticated) {
            self.persist_fragment();
            self.mount(Route::Connect, tx);
            return;
        }
        if self.nav.route() == Route::Claim
            && self.claim.checked_address() != self.session.primary_address()
        {
            self.start_status_check(tx);
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        match self.nav.route() {
            Route::Connect => self.connect.render(frame, area, self),
            Route::Video => self.video.render(frame, area, self),
            Route::Claim => self.claim.render(frame, area, self),
        }
    }

    pub async fn handle_key(&mut self, key: KeyCode, tx: mpsc::Sender<AppMessage>) -> Result<()> {
        // Clear transient messages on any key
        self.error_message = None;
        self.status_message = None;

        if key == KeyCode::Esc {
            self.quit = self.can_quit();
            return Ok(());
        }

        let action = match self.nav.route() {
            Route::Connect => self.connect.handle_key(key),
            Route::Video => self.video.handle_key(key),
            Route::Claim => self.claim.handle_key(key),
        };
        self.handle_screen_action(action, tx);
        Ok(())
    }

    fn handle_screen_action(&mut self, action: ScreenAction, tx: mpsc::Sender<AppMessage>) {
        match action {
            ScreenAction::None => {}
            ScreenAction::Navigate(route) => self.navigate(route, tx),
            ScreenAction::Connect => self.start_login(tx),
            ScreenAction::Disconnect => {
                self.logout(tx.clone());
                self.navigate(Route::Connect, tx);
            }
            ScreenAction::Claim => self.start_claim(tx),
            ScreenAction::Reload => {
                let route = self.nav.route();
                self.mount(route, tx);
            }
            ScreenAction::Open(url) => self.open_url(&url),
        }
    }

    pub async fn handle_message(&mut self, msg: AppMessage, tx: mpsc::Sender<AppMessage>) -> Result<()> {
        match msg {
            AppMessage::LoginCompleted(accounts) => {
                tracing::info!(accounts = accounts.len(), "wallet connected");
                self.session = Session::login(accounts, self.wallet.clone());
                self.status_message = Some("Wallet connected".to_string());
                let explicit = self.connect.login_completed();
                self.session_changed(tx.clone());
                if explicit && self.nav.route() == Route::Connect {
                    self.navigate(Route::Video, tx);
                }
            }
            AppMessage::LoginFailed(e) => {
                tracing::warn!(error = %e, "wallet login failed");
                self.connect.login_failed();
                self.error_message = Some(format!("Login failed: {}", e));
            }
            AppMessage::LogoutCompleted => {
                self.connect.logging_out = false;
            }
            AppMessage::StatusChecked {
                epoch,
                address,
                result,
            } => {
                if self.nav.route() == Route::Claim {
                    self.claim.handle_status(epoch, address, result);
                }
            }
            AppMessage::ClaimProgress { epoch, progress } => {
                self.claim.handle_progress(epoch, &progress);
            }
            AppMessage::ClaimFinished { epoch, outcome } => {
                self.claim.handle_finished(epoch, &outcome);
            }
        }
        Ok(())
    }

    pub fn can_quit(&self) -> bool {
        !self.claim.attempt.in_flight()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }
}
