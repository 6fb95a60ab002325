//! Claim lifecycle: eligibility check, submission, confirmation, and the
//! balance fallback for receipts that cannot be observed.
//!
//! ```text
//! Idle -> Submitting -> AwaitingReceipt -> Confirmed
//!                    \                  -> Failed (reverted)
//!                     -> Failed         -> ReceiptAmbiguous -> ConfirmedViaBalanceFallback
//!                                                           -> PendingUnconfirmed
//! ```
//!
//! An unobservable receipt is never reported as a failure: the transaction may
//! still land, and telling the user it failed invites a second mint attempt.

use crate::chain::{ChainConfig, ChainError, ChainReader, ChainWriter, ContractCall, ReceiptStatus, TxReceipt};
use crate::eth::{Address, TxHash};
use crate::wallet::WalletHandle;
use std::sync::Arc;
use std::time::Duration;

pub const RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const FALLBACK_GRACE: Duration = Duration::from_secs(5);

pub const STATUS_CHECK_FAILED: &str = "Failed to check claim status. Please try refreshing the page.";

/// Timing of the confirmation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimTimings {
    pub receipt_timeout: Duration,
    pub poll_interval: Duration,
    pub fallback_grace: Duration,
}

impl Default for ClaimTimings {
    fn default() -> Self {
        Self {
            receipt_timeout: RECEIPT_TIMEOUT,
            poll_interval: RECEIPT_POLL_INTERVAL,
            fallback_grace: FALLBACK_GRACE,
        }
    }
}

/// Eligibility of the connected wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClaimStatus {
    #[default]
    Unknown,
    Checking,
    OpenNotClaimed,
    OpenAlreadyClaimed,
    Closed,
}

impl ClaimStatus {
    /// A closed claim window wins over the balance.
    pub fn from_chain(claim_open: bool, balance: u128) -> Self {
        if !claim_open {
            ClaimStatus::Closed
        } else if balance > 0 {
            ClaimStatus::OpenAlreadyClaimed
        } else {
            ClaimStatus::OpenNotClaimed
        }
    }

    pub fn can_claim(&self) -> bool {
        *self == ClaimStatus::OpenNotClaimed
    }
}

/// Read `claimOpen()` then `balanceOf(owner)`. No retry.
pub async fn check_eligibility(
    reader: &dyn ChainReader,
    owner: Address,
) -> Result<ClaimStatus, ChainError> {
    let open = reader.claim_open().await?;
    let balance = reader.balance_of(owner).await?;
    tracing::info!(%owner, open, balance, "claim status checked");
    Ok(ClaimStatus::from_chain(open, balance))
}

/// Why an attempt failed, classified from the error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimFailure {
    Cancelled,
    AlreadyClaimed,
    ClaimClosed,
    Reverted,
    Other(String),
}

impl ClaimFailure {
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("rejected") || lower.contains("denied") {
            ClaimFailure::Cancelled
        } else if text.contains("AlreadyClaimed") || lower.contains("already claimed") {
            ClaimFailure::AlreadyClaimed
        } else if text.contains("ClaimClosed") {
            ClaimFailure::ClaimClosed
        } else {
            ClaimFailure::Other(text.to_string())
        }
    }

    /// Classify a chain error, taking decoded revert data into account.
    pub fn from_error(err: &ChainError) -> Self {
        match err.contract_error() {
            Some(name) => Self::classify(&format!("{}: {}", name, err)),
            None => Self::classify(&err.to_string()),
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ClaimFailure::Cancelled => "Transaction cancelled by user",
            ClaimFailure::AlreadyClaimed => "You have already claimed your Genesis n-Badge",
            ClaimFailure::ClaimClosed => "Claiming is not open yet. Please check back later",
            ClaimFailure::Reverted | ClaimFailure::Other(_) => "Failed to claim badge. Please try again.",
        }
    }
}

/// Result of waiting for a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptOutcome {
    Confirmed(TxReceipt),
    Reverted(TxReceipt),
    /// Timed out, or the lookup itself failed.
    Ambiguous(String),
}

/// Poll for the receipt until it is included or the wait runs out.
pub async fn wait_for_receipt(
    reader: &dyn ChainReader,
    hash: &TxHash,
    timings: &ClaimTimings,
) -> ReceiptOutcome {
    let poll = async {
        loop {
            match reader.receipt(hash).await {
                Ok(Some(receipt)) => {
                    return match receipt.status {
                        ReceiptStatus::Success => ReceiptOutcome::Confirmed(receipt),
                        ReceiptStatus::Reverted => ReceiptOutcome::Reverted(receipt),
                    }
                }
                Ok(None) => tokio::time::sleep(timings.poll_interval).await,
                Err(e) => return ReceiptOutcome::Ambiguous(format!("receipt lookup failed: {}", e)),
            }
        }
    };

    match tokio::time::timeout(timings.receipt_timeout, poll).await {
        Ok(outcome) => outcome,
        Err(_) => ReceiptOutcome::Ambiguous(format!(
            "no receipt after {}s",
            timings.receipt_timeout.as_secs()
        )),
    }
}

/// Terminal result of one claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Confirmed { tx_hash: TxHash },
    ConfirmedViaBalanceFallback { tx_hash: TxHash },
    /// Receipt never observed and the balance did not show the badge yet.
    Pending { tx_hash: TxHash, explorer_url: String },
    Failed { failure: ClaimFailure, tx_hash: Option<TxHash> },
}

impl ClaimOutcome {
    pub fn is_claimed(&self) -> bool {
        matches!(
            self,
            ClaimOutcome::Confirmed { .. } | ClaimOutcome::ConfirmedViaBalanceFallback { .. }
        )
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            ClaimOutcome::Confirmed { tx_hash }
            | ClaimOutcome::ConfirmedViaBalanceFallback { tx_hash }
            | ClaimOutcome::Pending { tx_hash, .. } => Some(*tx_hash),
            ClaimOutcome::Failed { tx_hash, .. } => *tx_hash,
        }
    }

    /// Eligibility the outcome implies, if it changes anything.
    pub fn status_update(&self) -> Option<ClaimStatus> {
        match self {
            o if o.is_claimed() => Some(ClaimStatus::OpenAlreadyClaimed),
            ClaimOutcome::Failed { failure: ClaimFailure::AlreadyClaimed, .. } => {
                Some(ClaimStatus::OpenAlreadyClaimed)
            }
            ClaimOutcome::Failed { failure: ClaimFailure::ClaimClosed, .. } => Some(ClaimStatus::Closed),
            _ => None,
        }
    }
}

/// Progress published while an attempt runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimProgress {
    Submitted(TxHash),
    ReceiptAmbiguous,
}

/// Submission phase of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClaimPhase {
    #[default]
    Idle,
    Submitting,
    AwaitingReceipt,
    ReceiptAmbiguous,
    Confirmed,
    ConfirmedViaBalanceFallback,
    PendingUnconfirmed,
    Failed,
}

impl ClaimPhase {
    /// Phases during which a new submit is ignored.
    pub fn in_flight(&self) -> bool {
        matches!(
            self,
            ClaimPhase::Submitting | ClaimPhase::AwaitingReceipt | ClaimPhase::ReceiptAmbiguous
        )
    }

    pub fn is_claimed(&self) -> bool {
        matches!(self, ClaimPhase::Confirmed | ClaimPhase::ConfirmedViaBalanceFallback)
    }

    /// Phases after which no further submit is accepted in this session.
    /// A pending transaction may still land, so resubmitting risks a double mint.
    pub fn blocks_submit(&self) -> bool {
        self.in_flight() || *self == ClaimPhase::PendingUnconfirmed
    }
}

/// State of the current claim attempt as the Claim screen sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimAttempt {
    pub phase: ClaimPhase,
    pub tx_hash: Option<TxHash>,
    pub error: Option<String>,
}

impl ClaimAttempt {
    /// Start a new attempt. Returns `false`, changing nothing, if one is in
    /// flight or the previous one is still pending on chain.
    pub fn begin(&mut self) -> bool {
        if self.phase.blocks_submit() {
            return false;
        }
        *self = ClaimAttempt {
            phase: ClaimPhase::Submitting,
            ..Default::default()
        };
        true
    }

    pub fn in_flight(&self) -> bool {
        self.phase.in_flight()
    }

    pub fn progress(&mut self, progress: &ClaimProgress) {
        match progress {
            ClaimProgress::Submitted(hash) => {
                self.tx_hash = Some(*hash);
                self.phase = ClaimPhase::AwaitingReceipt;
            }
            ClaimProgress::ReceiptAmbiguous => self.phase = ClaimPhase::ReceiptAmbiguous,
        }
    }

    /// Apply the terminal outcome. Always leaves the attempt out of flight.
    pub fn finish(&mut self, outcome: &ClaimOutcome) {
        if let Some(hash) = outcome.tx_hash() {
            self.tx_hash = Some(hash);
        }
        match outcome {
            ClaimOutcome::Confirmed { .. } => {
                self.phase = ClaimPhase::Confirmed;
                self.error = None;
            }
            ClaimOutcome::ConfirmedViaBalanceFallback { .. } => {
                self.phase = ClaimPhase::ConfirmedViaBalanceFallback;
                self.error = None;
            }
            ClaimOutcome::Pending { explorer_url, .. } => {
                self.phase = ClaimPhase::PendingUnconfirmed;
                self.error = Some(format!(
                    "Transaction may still be processing. Check here: {}",
                    explorer_url
                ));
            }
            ClaimOutcome::Failed { failure, .. } => {
                self.phase = if *failure == ClaimFailure::Cancelled {
                    ClaimPhase::Idle
                } else {
                    ClaimPhase::Failed
                };
                self.error = Some(failure.message().to_string());
            }
        }
    }
}

/// Drives one claim attempt against the chain.
#[derive(Clone)]
pub struct ClaimFlow {
    reader: Arc<dyn ChainReader>,
    chain: ChainConfig,
    contract: Address,
    timings: ClaimTimings,
}

impl ClaimFlow {
    pub fn new(reader: Arc<dyn ChainReader>, chain: ChainConfig, contract: Address) -> Self {
        Self {
            reader,
            chain,
            contract,
            timings: ClaimTimings::default(),
        }
    }

    pub fn reader(&self) -> Arc<dyn ChainReader> {
        self.reader.clone()
    }

    /// Switch the wallet to the target chain and send `claim()`.
    pub async fn submit(&self, wallet: &WalletHandle) -> Result<TxHash, ClaimFailure> {
        let writer = wallet.signer(self.contract);
        let sent: Result<TxHash, ChainError> = async {
            wallet.switch_chain(&self.chain).await?;
            writer.write(ContractCall::Claim).await
        }
        .await;
        sent.map_err(|e| {
            tracing::warn!(error = %e, "claim submission failed");
            ClaimFailure::from_error(&e)
        })
    }

    /// Wait for the receipt; fall back to a single balance check if it
    /// cannot be observed.
    pub async fn confirm(
        &self,
        owner: Address,
        tx_hash: TxHash,
        mut progress: impl FnMut(ClaimProgress) + Send,
    ) -> ClaimOutcome {
        let reason = match wait_for_receipt(self.reader.as_ref(), &tx_hash, &self.timings).await {
            ReceiptOutcome::Confirmed(receipt) => {
                tracing::info!(tx_hash = %receipt.transaction_hash, block = receipt.block_number, "claim confirmed");
                return ClaimOutcome::Confirmed { tx_hash };
            }
            ReceiptOutcome::Reverted(receipt) => {
                tracing::warn!(tx_hash = %receipt.transaction_hash, block = receipt.block_number, "claim reverted");
                return ClaimOutcome::Failed {
                    failure: ClaimFailure::Reverted,
                    tx_hash: Some(tx_hash),
                };
            }
            ReceiptOutcome::Ambiguous(reason) => reason,
        };

        tracing::warn!(%tx_hash, %reason, "receipt not observed, checking balance");
        progress(ClaimProgress::ReceiptAmbiguous);
        tokio::time::sleep(self.timings.fallback_grace).await;

        match self.reader.balance_of(owner).await {
            Ok(balance) if balance > 0 => {
                tracing::info!(%tx_hash, balance, "claim confirmed by balance");
                return ClaimOutcome::ConfirmedViaBalanceFallback { tx_hash };
            }
            Ok(_) => tracing::warn!(%tx_hash, "balance still zero"),
            Err(e) => tracing::error!(%tx_hash, error = %e, "balance check failed"),
        }

        ClaimOutcome::Pending {
            tx_hash,
            explorer_url: self.chain.tx_url(&tx_hash),
        }
    }

    /// Run a full attempt: submit, then confirm.
    pub async fn run(
        &self,
        wallet: &WalletHandle,
        mut progress: impl FnMut(ClaimProgress) + Send,
    ) -> ClaimOutcome {
        let tx_hash = match self.submit(wallet).await {
            Ok(hash) => hash,
            Err(failure) => return ClaimOutcome::Failed { failure, tx_hash: None },
        };
        tracing::info!(%tx_hash, "claim submitted");
        progress(ClaimProgress::Submitted(tx_hash));
        self.confirm(wallet.address, tx_hash, progress).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted chain reader.

    use super::*;
    use crate::chain::ReadValue;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeReader {
        pub claim_open: Mutex<VecDeque<Result<bool, String>>>,
        pub balances: Mutex<VecDeque<Result<u128, String>>>,
        /// Receipt lookups in order; once drained, the receipt stays pending.
        pub receipts: Mutex<VecDeque<Result<Option<TxReceipt>, String>>>,
        pub reads: Mutex<Vec<ContractCall>>,
        pub receipt_lookups: Mutex<u32>,
    }

    impl FakeReader {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn open(self, open: bool) -> Self {
            self.claim_open.lock().unwrap().push_back(Ok(open));
            self
        }

        pub fn balance(self, balance: Result<u128, &str>) -> Self {
            self.balances
                .lock()
                .unwrap()
                .push_back(balance.map_err(str::to_string));
            self
        }

        pub fn receipt(self, receipt: Result<Option<TxReceipt>, &str>) -> Self {
            self.receipts
                .lock()
                .unwrap()
                .push_back(receipt.map_err(str::to_string));
            self
        }

        pub fn read_count(&self) -> usize {
            self.reads.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChainReader for FakeReader {
        async fn read(&self, call: ContractCall) -> Result<ReadValue, ChainError> {
            self.reads.lock().unwrap().push(call);
            let next = match call {
                ContractCall::ClaimOpen => self
                    .claim_open
                    .lock()
                    .unwrap()
                    .pop_front()
                    .map(|r| r.map(ReadValue::Bool)),
                ContractCall::BalanceOf(_) => self
                    .balances
                    .lock()
                    .unwrap()
                    .pop_front()
                    .map(|r| r.map(ReadValue::Uint)),
                ContractCall::Claim => Some(Ok(ReadValue::Unit)),
            };
            next.unwrap_or_else(|| Err("no scripted response".to_string()))
                .map_err(ChainError::Other)
        }

        async fn receipt(&self, _hash: &TxHash) -> Result<Option<TxReceipt>, ChainError> {
            *self.receipt_lookups.lock().unwrap() += 1;
            self.receipts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(None))
                .map_err(ChainError::Other)
        }
    }

    pub fn receipt(hash: TxHash, status: ReceiptStatus) -> TxReceipt {
        TxReceipt {
            transaction_hash: hash,
            block_number: 100,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{receipt, FakeReader};
    use super::*;
    use crate::chain::OPN_TESTNET;
    use crate::wallet::testing::FakeWallet;

    const OWNER: Address = Address([0x11; 20]);
    const CONTRACT: Address = Address([0xcc; 20]);
    const HASH: TxHash = TxHash([0x42; 32]);

    fn flow(reader: Arc<FakeReader>) -> ClaimFlow {
        ClaimFlow::new(reader, OPN_TESTNET, CONTRACT)
    }

    fn wallet(fake: Arc<FakeWallet>) -> WalletHandle {
        WalletHandle::new(OWNER, fake)
    }

    #[test]
    fn test_status_from_chain() {
        assert_eq!(ClaimStatus::from_chain(false, 0), ClaimStatus::Closed);
        assert_eq!(ClaimStatus::from_chain(false, 3), ClaimStatus::Closed);
        assert_eq!(ClaimStatus::from_chain(true, 1), ClaimStatus::OpenAlreadyClaimed);
        assert_eq!(ClaimStatus::from_chain(true, 0), ClaimStatus::OpenNotClaimed);

        assert!(ClaimStatus::OpenNotClaimed.can_claim());
        assert!(!ClaimStatus::Closed.can_claim());
        assert!(!ClaimStatus::OpenAlreadyClaimed.can_claim());
        assert!(!ClaimStatus::Unknown.can_claim());
    }

    #[tokio::test]
    async fn test_eligibility_reads_open_then_balance() {
        let reader = FakeReader::new().open(true).balance(Ok(0));
        let status = check_eligibility(&reader, OWNER).await.unwrap();
        assert_eq!(status, ClaimStatus::OpenNotClaimed);
        assert_eq!(
            *reader.reads.lock().unwrap(),
            vec![ContractCall::ClaimOpen, ContractCall::BalanceOf(OWNER)]
        );
    }

    #[tokio::test]
    async fn test_eligibility_failure_is_not_retried() {
        let reader = FakeReader::new().open(true).balance(Err("connection reset"));
        assert!(check_eligibility(&reader, OWNER).await.is_err());
        assert_eq!(reader.read_count(), 2);
    }

    #[test]
    fn test_failure_classification() {
        assert_eq!(
            ClaimFailure::classify("MetaMask Tx Signature: User denied transaction signature."),
            ClaimFailure::Cancelled
        );
        assert_eq!(ClaimFailure::classify("User rejected the request"), ClaimFailure::Cancelled);
        assert_eq!(
            ClaimFailure::classify("execution reverted: AlreadyClaimed()"),
            ClaimFailure::AlreadyClaimed
        );
        assert_eq!(ClaimFailure::classify("badge already claimed"), ClaimFailure::AlreadyClaimed);
        assert_eq!(ClaimFailure::classify("ClaimClosed"), ClaimFailure::ClaimClosed);
        assert_eq!(
            ClaimFailure::classify("insufficient funds for gas"),
            ClaimFailure::Other("insufficient funds for gas".to_string())
        );
        assert_eq!(
            ClaimFailure::Other(String::new()).message(),
            "Failed to claim badge. Please try again."
        );
    }

    #[tokio::test]
    async fn test_success_receipt_confirms() {
        let reader = Arc::new(
            FakeReader::new()
                .receipt(Ok(None))
                .receipt(Ok(Some(receipt(HASH, ReceiptStatus::Success)))),
        );
        let fake = Arc::new(FakeWallet::new(vec![OWNER]).sending(Ok(HASH)));

        let mut seen = Vec::new();
        let outcome = flow(reader.clone())
            .run(&wallet(fake.clone()), |p| seen.push(p))
            .await;

        assert_eq!(outcome, ClaimOutcome::Confirmed { tx_hash: HASH });
        assert_eq!(seen, vec![ClaimProgress::Submitted(HASH)]);
        assert_eq!(*fake.switched.lock().unwrap(), vec![OPN_TESTNET.id]);
        assert_eq!(fake.sent_count(), 1);
        assert_eq!(*reader.receipt_lookups.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reverted_receipt_fails_with_hash() {
        let reader = Arc::new(
            FakeReader::new().receipt(Ok(Some(receipt(HASH, ReceiptStatus::Reverted)))),
        );
        let fake = Arc::new(FakeWallet::new(vec![OWNER]).sending(Ok(HASH)));

        let outcome = flow(reader.clone()).run(&wallet(fake), |_| {}).await;

        assert_eq!(
            outcome,
            ClaimOutcome::Failed {
                failure: ClaimFailure::Reverted,
                tx_hash: Some(HASH)
            }
        );
        // No balance fallback for a definite revert.
        assert_eq!(reader.read_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_positive_balance_confirms_via_fallback() {
        let reader = Arc::new(FakeReader::new().balance(Ok(1)));
        let fake = Arc::new(FakeWallet::new(vec![OWNER]).sending(Ok(HASH)));

        let start = tokio::time::Instant::now();
        let mut seen = Vec::new();
        let outcome = flow(reader.clone())
            .run(&wallet(fake), |p| seen.push(p))
            .await;

        assert_eq!(outcome, ClaimOutcome::ConfirmedViaBalanceFallback { tx_hash: HASH });
        assert!(outcome.is_claimed());
        assert_eq!(
            seen,
            vec![ClaimProgress::Submitted(HASH), ClaimProgress::ReceiptAmbiguous]
        );
        assert!(start.elapsed() >= RECEIPT_TIMEOUT + FALLBACK_GRACE);
        // 2s polling over a 120s window.
        let lookups = *reader.receipt_lookups.lock().unwrap();
        assert!((60..=61).contains(&lookups), "lookups = {}", lookups);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_zero_balance_is_pending() {
        let reader = Arc::new(FakeReader::new().balance(Ok(0)));
        let fake = Arc::new(FakeWallet::new(vec![OWNER]).sending(Ok(HASH)));

        let outcome = flow(reader).run(&wallet(fake), |_| {}).await;

        let expected_url = OPN_TESTNET.tx_url(&HASH);
        assert_eq!(
            outcome,
            ClaimOutcome::Pending {
                tx_hash: HASH,
                explorer_url: expected_url.clone()
            }
        );

        let mut attempt = ClaimAttempt::default();
        assert!(attempt.begin());
        attempt.finish(&outcome);
        assert_eq!(attempt.phase, ClaimPhase::PendingUnconfirmed);
        assert_eq!(attempt.tx_hash, Some(HASH));
        assert!(attempt.error.as_deref().unwrap().contains(&expected_url));

        // Pending is final: a second submit is refused and the hash is kept.
        assert!(!attempt.in_flight());
        assert!(!attempt.begin());
        assert_eq!(attempt.phase, ClaimPhase::PendingUnconfirmed);
        assert_eq!(attempt.tx_hash, Some(HASH));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_error_then_failed_balance_is_pending() {
        let reader = Arc::new(
            FakeReader::new()
                .receipt(Err("header not found"))
                .balance(Err("rate limited")),
        );

        let start = tokio::time::Instant::now();
        let outcome = flow(reader.clone()).confirm(OWNER, HASH, |_| {}).await;

        assert!(matches!(outcome, ClaimOutcome::Pending { tx_hash: HASH, .. }));
        // Lookup error short-circuits the wait; only the grace period elapses.
        assert!(start.elapsed() < RECEIPT_TIMEOUT);
        assert!(start.elapsed() >= FALLBACK_GRACE);
        // Exactly one balance read.
        assert_eq!(reader.read_count(), 1);
    }

    #[tokio::test]
    async fn test_user_rejection_returns_to_idle() {
        let reader = Arc::new(FakeReader::new());
        let fake = Arc::new(
            FakeWallet::new(vec![OWNER]).sending(Err("User rejected the request.".to_string())),
        );

        let mut seen = Vec::new();
        let outcome = flow(reader.clone())
            .run(&wallet(fake), |p| seen.push(p))
            .await;

        assert_eq!(
            outcome,
            ClaimOutcome::Failed {
                failure: ClaimFailure::Cancelled,
                tx_hash: None
            }
        );
        assert!(seen.is_empty());
        assert_eq!(*reader.receipt_lookups.lock().unwrap(), 0);

        let mut attempt = ClaimAttempt::default();
        attempt.begin();
        attempt.finish(&outcome);
        assert_eq!(attempt.phase, ClaimPhase::Idle);
        assert_eq!(attempt.error.as_deref(), Some("Transaction cancelled by user"));
        assert_eq!(attempt.tx_hash, None);
    }

    #[tokio::test]
    async fn test_chain_switch_failure_fails_without_sending() {
        let reader = Arc::new(FakeReader::new());
        let fake = Arc::new(FakeWallet {
            accounts: vec![OWNER],
            switch_error: Some("wallet is locked".to_string()),
            ..Default::default()
        });

        let outcome = flow(reader).run(&wallet(fake.clone()), |_| {}).await;

        assert!(matches!(
            outcome,
            ClaimOutcome::Failed { failure: ClaimFailure::Other(_), tx_hash: None }
        ));
        assert_eq!(fake.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_already_claimed_error_forces_status() {
        let reader = Arc::new(FakeReader::new());
        let fake = Arc::new(
            FakeWallet::new(vec![OWNER])
                .sending(Err("execution reverted: AlreadyClaimed()".to_string())),
        );

        let outcome = flow(reader).run(&wallet(fake), |_| {}).await;

        assert_eq!(outcome.status_update(), Some(ClaimStatus::OpenAlreadyClaimed));
        let mut attempt = ClaimAttempt::default();
        attempt.begin();
        attempt.finish(&outcome);
        assert_eq!(attempt.phase, ClaimPhase::Failed);
        assert_eq!(
            attempt.error.as_deref(),
            Some("You have already claimed your Genesis n-Badge")
        );
    }

    #[test]
    fn test_attempt_guard_blocks_reentry() {
        let mut attempt = ClaimAttempt::default();
        assert!(attempt.begin());
        assert_eq!(attempt.phase, ClaimPhase::Submitting);
        assert!(!attempt.begin());

        attempt.progress(&ClaimProgress::Submitted(HASH));
        assert_eq!(attempt.phase, ClaimPhase::AwaitingReceipt);
        assert_eq!(attempt.tx_hash, Some(HASH));
        assert!(!attempt.begin());

        attempt.progress(&ClaimProgress::ReceiptAmbiguous);
        assert!(!attempt.begin());

        attempt.finish(&ClaimOutcome::Failed {
            failure: ClaimFailure::Other("boom".to_string()),
            tx_hash: None,
        });
        assert!(!attempt.in_flight());
        assert_eq!(attempt.tx_hash, Some(HASH));

        // Retry discards the previous attempt.
        assert!(attempt.begin());
        assert_eq!(attempt.tx_hash, None);
        assert_eq!(attempt.error, None);
    }

    #[test]
    fn test_outcome_status_updates() {
        assert_eq!(
            ClaimOutcome::Confirmed { tx_hash: HASH }.status_update(),
            Some(ClaimStatus::OpenAlreadyClaimed)
        );
        assert_eq!(
            ClaimOutcome::Failed {
                failure: ClaimFailure::ClaimClosed,
                tx_hash: None
            }
            .status_update(),
            Some(ClaimStatus::Closed)
        );
        assert_eq!(
            ClaimOutcome::Pending {
                tx_hash: HASH,
                explorer_url: String::new()
            }
            .status_update(),
            None
        );
    }
}
