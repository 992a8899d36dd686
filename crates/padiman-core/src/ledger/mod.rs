//! Ledger - wallet and platform coffer money movement.
//!
//! `Ledger` is a plain value: every operation checks its preconditions first
//! and only then touches balances and logs, so an `Err` means nothing moved.
//! Persistence lives in [`LedgerStore`]; callers that need several steps to
//! be all-or-nothing run them on a clone and save the clone at the end.

pub mod store;

pub use self::store::LedgerStore;

use chrono::{DateTime, Utc};

use crate::domain::{
    Balances, Coffer, Decision, DecisionRequest, FundingPurpose, Naira, PadimanError, RunnerId, TaskId,
    Transaction, TransactionKind, TransactionMeta, Wallet,
};
use crate::ports::{IdGenerator, Prompter};

/// Id source and timestamp for the transactions one operation appends.
#[derive(Clone, Copy)]
pub struct Stamp<'a> {
    pub ids: &'a dyn IdGenerator,
    pub at: DateTime<Utc>,
}

impl<'a> Stamp<'a> {
    pub fn new(ids: &'a dyn IdGenerator, at: DateTime<Utc>) -> Self {
        Self { ids, at }
    }

    fn transaction(&self, kind: TransactionKind, amount: Naira, meta: TransactionMeta) -> Transaction {
        Transaction {
            id: self.ids.generate_transaction_id(),
            kind,
            amount,
            meta,
            timestamp: self.at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    pub wallet: Wallet,
    pub coffer: Coffer,
}

impl Ledger {
    pub fn new(wallet: Wallet, coffer: Coffer) -> Self {
        Self { wallet, coffer }
    }

    pub fn balances(&self) -> Balances {
        Balances {
            wallet_balance: self.wallet.balance,
            escrow_committed: self.wallet.escrow_total(),
            platform_coffer: self.coffer.balance,
        }
    }

    /// Wallet log, newest first.
    pub fn recent_transactions(&self, limit: usize) -> Vec<Transaction> {
        self.wallet
            .transactions
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Both logs replay to the stored balances and the coffer covers every
    /// open escrow.
    pub fn check_consistency(&self) -> Result<(), PadimanError> {
        if !self.wallet.is_consistent() {
            return Err(self.consistency("wallet log does not replay to its balances".into()));
        }
        if !self.coffer.is_consistent() {
            return Err(self.consistency("coffer log does not replay to its balance".into()));
        }
        let open = self.wallet.escrow_total();
        if self.coffer.balance < open {
            return Err(self.consistency(format!(
                "coffer {} does not cover open escrows {open}",
                self.coffer.balance
            )));
        }
        Ok(())
    }

    pub fn deposit(&mut self, amount: Naira, stamp: &Stamp<'_>) -> Result<(), PadimanError> {
        if amount.is_zero() {
            return Err(PadimanError::Validation("deposit must be positive".into()));
        }
        self.wallet.balance = credit(self.wallet.balance, amount, "wallet")?;
        self.wallet.transactions.push(stamp.transaction(
            TransactionKind::Deposit,
            amount,
            TransactionMeta::default(),
        ));
        Ok(())
    }

    pub fn withdraw(&mut self, amount: Naira, stamp: &Stamp<'_>) -> Result<(), PadimanError> {
        if amount.is_zero() {
            return Err(PadimanError::Validation("withdrawal must be positive".into()));
        }
        self.debit(TransactionKind::Withdrawal, amount, TransactionMeta::default(), stamp)
    }

    pub fn deduct(
        &mut self,
        amount: Naira,
        meta: TransactionMeta,
        stamp: &Stamp<'_>,
    ) -> Result<(), PadimanError> {
        self.debit(TransactionKind::Deduct, amount, meta, stamp)
    }

    fn debit(
        &mut self,
        kind: TransactionKind,
        amount: Naira,
        meta: TransactionMeta,
        stamp: &Stamp<'_>,
    ) -> Result<(), PadimanError> {
        let Some(rest) = self.wallet.balance.checked_sub(amount) else {
            return Err(PadimanError::insufficient(amount, self.wallet.balance));
        };
        self.wallet.balance = rest;
        self.wallet.transactions.push(stamp.transaction(kind, amount, meta));
        Ok(())
    }

    /// The deposit prompt to show when the wallet can't cover `amount`.
    pub fn funding_request(&self, amount: Naira, purpose: FundingPurpose) -> Option<DecisionRequest> {
        let available = self.wallet.balance;
        if available >= amount {
            return None;
        }
        Some(DecisionRequest::Deposit {
            purpose,
            required: amount,
            available,
            shortfall: amount.saturating_sub(available),
        })
    }

    /// Apply the user's answer to a deposit prompt for `amount`.
    ///
    /// `Confirm` deposits exactly the shortfall. A deposit smaller than the
    /// shortfall is refused without depositing anything.
    pub fn apply_funding(
        &mut self,
        amount: Naira,
        decision: Decision,
        stamp: &Stamp<'_>,
    ) -> Result<(), PadimanError> {
        let shortfall = amount.saturating_sub(self.wallet.balance);
        if shortfall.is_zero() {
            return Ok(());
        }
        let deposit = match decision {
            Decision::Decline => {
                return Err(PadimanError::Declined(format!("deposit of {shortfall} declined")));
            }
            Decision::Confirm => shortfall,
            Decision::Deposit(offered) if offered < shortfall => {
                return Err(PadimanError::insufficient(
                    amount,
                    self.wallet.balance + offered,
                ));
            }
            Decision::Deposit(offered) => offered,
        };
        self.deposit(deposit, stamp)
    }

    /// Make sure the wallet covers `amount`, asking `prompter` for a deposit
    /// when it doesn't.
    pub async fn ensure_funds(
        &mut self,
        amount: Naira,
        purpose: FundingPurpose,
        prompter: &dyn Prompter,
        stamp: &Stamp<'_>,
    ) -> Result<(), PadimanError> {
        let Some(request) = self.funding_request(amount, purpose) else {
            return Ok(());
        };
        let decision = prompter.decide(&request).await;
        self.apply_funding(amount, decision, stamp)
    }

    /// Move `amount` from the wallet balance into escrow for `task_id`,
    /// backed by the coffer.
    pub fn hold_in_escrow(
        &mut self,
        task_id: TaskId,
        amount: Naira,
        stamp: &Stamp<'_>,
    ) -> Result<(), PadimanError> {
        if amount.is_zero() {
            return Err(PadimanError::Validation("escrow amount must be positive".into()));
        }
        let coffer = credit(self.coffer.balance, amount, "coffer")?;
        let held = credit(self.wallet.held_for(task_id), amount, "escrow")?;
        self.deduct(amount, TransactionMeta::for_task(task_id), stamp)?;

        self.wallet.escrows.insert(task_id, held);
        self.wallet.transactions.push(stamp.transaction(
            TransactionKind::EscrowHold,
            amount,
            TransactionMeta::for_task(task_id),
        ));
        self.coffer.balance = coffer;
        self.coffer.transactions.push(stamp.transaction(
            TransactionKind::EscrowHold,
            amount,
            TransactionMeta::for_task(task_id),
        ));
        Ok(())
    }

    /// Pay the escrow held for `task_id` out of the coffer. Returns the amount.
    pub fn release_escrow(
        &mut self,
        task_id: TaskId,
        runner_id: Option<RunnerId>,
        stamp: &Stamp<'_>,
    ) -> Result<Naira, PadimanError> {
        let meta = TransactionMeta::for_task(task_id).with_runner(runner_id);
        self.settle_escrow(task_id, TransactionKind::EscrowRelease, meta, stamp)
    }

    /// Return the escrow held for `task_id` to the poster. Returns the amount.
    pub fn refund_escrow(&mut self, task_id: TaskId, stamp: &Stamp<'_>) -> Result<Naira, PadimanError> {
        let meta = TransactionMeta::for_task(task_id);
        self.settle_escrow(task_id, TransactionKind::EscrowRefund, meta, stamp)
    }

    fn settle_escrow(
        &mut self,
        task_id: TaskId,
        kind: TransactionKind,
        meta: TransactionMeta,
        stamp: &Stamp<'_>,
    ) -> Result<Naira, PadimanError> {
        let held = self.wallet.held_for(task_id);
        if held.is_zero() {
            return Err(PadimanError::Validation(format!("no escrow held for {task_id}")));
        }
        let Some(coffer_rest) = self.coffer.balance.checked_sub(held) else {
            return Err(self.consistency(format!(
                "coffer {} cannot cover escrow {held} for {task_id}",
                self.coffer.balance
            )));
        };
        let wallet = credit(self.wallet.balance, held, "wallet")?;

        self.coffer.balance = coffer_rest;
        self.coffer
            .transactions
            .push(stamp.transaction(kind, held, meta.clone()));

        self.wallet.escrows.remove(&task_id);
        self.wallet.balance = wallet;
        self.wallet.transactions.push(stamp.transaction(kind, held, meta));
        Ok(held)
    }

    /// Collect a finders fee from the wallet into the coffer.
    pub fn hold_finders_fee_in_coffer(
        &mut self,
        task_id: TaskId,
        amount: Naira,
        stamp: &Stamp<'_>,
    ) -> Result<(), PadimanError> {
        if amount.is_zero() {
            return Err(PadimanError::Validation("finders fee must be positive".into()));
        }
        let coffer = credit(self.coffer.balance, amount, "coffer")?;
        self.deduct(
            amount,
            TransactionMeta::for_task(task_id).with_note("finders_fee"),
            stamp,
        )?;
        self.coffer.balance = coffer;
        self.coffer.transactions.push(stamp.transaction(
            TransactionKind::FindersFee,
            amount,
            TransactionMeta::for_task(task_id),
        ));
        Ok(())
    }

    fn consistency(&self, message: String) -> PadimanError {
        tracing::error!(
            wallet = %self.wallet.balance,
            escrow = %self.wallet.escrow_total(),
            coffer = %self.coffer.balance,
            "{message}"
        );
        PadimanError::Consistency(message)
    }
}

fn credit(balance: Naira, amount: Naira, account: &str) -> Result<Naira, PadimanError> {
    balance.checked_add(amount).ok_or_else(|| {
        PadimanError::Validation(format!("{account} balance {balance} cannot take {amount} more"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::ScriptedPrompter;
    use crate::ports::{SystemClock, UlidGenerator};
    use rstest::rstest;
    use ulid::Ulid;

    fn ids() -> UlidGenerator<SystemClock> {
        UlidGenerator::new(SystemClock)
    }

    fn task_id() -> TaskId {
        TaskId::from_ulid(Ulid::new())
    }

    fn funded(ids: &dyn IdGenerator, amount: u64) -> Ledger {
        let mut ledger = Ledger::default();
        ledger
            .deposit(Naira::new(amount), &Stamp::new(ids, Utc::now()))
            .unwrap();
        ledger
    }

    fn assert_conserved(ledger: &Ledger) {
        assert!(ledger.wallet.is_consistent());
        assert!(ledger.coffer.is_consistent());
        assert!(ledger.check_consistency().is_ok());
    }

    #[test]
    fn deposit_rejects_zero() {
        let ids = ids();
        let mut ledger = Ledger::default();
        let err = ledger
            .deposit(Naira::ZERO, &Stamp::new(&ids, Utc::now()))
            .unwrap_err();
        assert!(matches!(err, PadimanError::Validation(_)));
        assert!(ledger.wallet.transactions.is_empty());
    }

    #[test]
    fn deduct_beyond_balance_moves_nothing() {
        let ids = ids();
        let mut ledger = funded(&ids, 100);
        let before = ledger.clone();

        let err = ledger
            .deduct(
                Naira::new(594),
                TransactionMeta::default(),
                &Stamp::new(&ids, Utc::now()),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            PadimanError::InsufficientFunds { shortfall, .. } if shortfall == Naira::new(494)
        ));
        assert_eq!(ledger, before);
    }

    #[rstest]
    #[case::exact(100, 100, true)]
    #[case::partial(100, 40, true)]
    #[case::too_much(100, 101, false)]
    #[case::zero(100, 0, false)]
    fn withdraw_bounds(#[case] balance: u64, #[case] amount: u64, #[case] ok: bool) {
        let ids = ids();
        let mut ledger = funded(&ids, balance);
        let result = ledger.withdraw(Naira::new(amount), &Stamp::new(&ids, Utc::now()));
        assert_eq!(result.is_ok(), ok);
        if ok {
            assert_eq!(ledger.wallet.balance, Naira::new(balance - amount));
        } else {
            assert_eq!(ledger.wallet.balance, Naira::new(balance));
        }
        assert_conserved(&ledger);
    }

    #[test]
    fn escrow_hold_then_release_round_trips() {
        let ids = ids();
        let stamp = Stamp::new(&ids, Utc::now());
        let mut ledger = funded(&ids, 10_000);
        let task = task_id();

        ledger.hold_in_escrow(task, Naira::new(625), &stamp).unwrap();
        assert_eq!(ledger.wallet.balance, Naira::new(9_375));
        assert_eq!(ledger.wallet.held_for(task), Naira::new(625));
        assert_eq!(ledger.coffer.balance, Naira::new(625));
        assert_conserved(&ledger);

        let runner = RunnerId::from_ulid(Ulid::new());
        let paid = ledger.release_escrow(task, Some(runner), &stamp).unwrap();
        assert_eq!(paid, Naira::new(625));
        assert_eq!(ledger.wallet.balance, Naira::new(10_000));
        assert!(ledger.wallet.escrows.is_empty());
        assert!(ledger.coffer.balance.is_zero());
        assert_conserved(&ledger);

        let last = ledger.recent_transactions(1);
        assert_eq!(last[0].kind, TransactionKind::EscrowRelease);
        assert_eq!(last[0].meta.runner_id, Some(runner));
    }

    #[test]
    fn escrow_hold_then_refund_round_trips() {
        let ids = ids();
        let stamp = Stamp::new(&ids, Utc::now());
        let mut ledger = funded(&ids, 1_000);
        let task = task_id();

        ledger.hold_in_escrow(task, Naira::new(400), &stamp).unwrap();
        ledger.refund_escrow(task, &stamp).unwrap();

        assert_eq!(ledger.wallet.balance, Naira::new(1_000));
        assert!(ledger.coffer.balance.is_zero());
        assert_conserved(&ledger);
    }

    #[test]
    fn failed_hold_leaves_coffer_untouched() {
        let ids = ids();
        let mut ledger = funded(&ids, 10);
        let before = ledger.clone();
        assert!(
            ledger
                .hold_in_escrow(task_id(), Naira::new(50), &Stamp::new(&ids, Utc::now()))
                .is_err()
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn release_without_hold_is_rejected() {
        let ids = ids();
        let mut ledger = funded(&ids, 10);
        let err = ledger
            .release_escrow(task_id(), None, &Stamp::new(&ids, Utc::now()))
            .unwrap_err();
        assert!(matches!(err, PadimanError::Validation(_)));
    }

    #[test]
    fn underfunded_coffer_is_a_consistency_error() {
        let ids = ids();
        let stamp = Stamp::new(&ids, Utc::now());
        let mut ledger = funded(&ids, 1_000);
        let task = task_id();
        ledger.hold_in_escrow(task, Naira::new(500), &stamp).unwrap();

        // simulate a desynced snapshot
        ledger.coffer.balance = Naira::new(100);
        let before = ledger.clone();

        let err = ledger.release_escrow(task, None, &stamp).unwrap_err();
        assert!(matches!(err, PadimanError::Consistency(_)));
        assert_eq!(ledger, before);
        assert!(ledger.check_consistency().is_err());
    }

    #[test]
    fn finders_fee_goes_to_coffer() {
        let ids = ids();
        let stamp = Stamp::new(&ids, Utc::now());
        let mut ledger = funded(&ids, 1_000);
        let task = task_id();

        ledger
            .hold_finders_fee_in_coffer(task, Naira::new(200), &stamp)
            .unwrap();
        assert_eq!(ledger.wallet.balance, Naira::new(800));
        assert_eq!(ledger.coffer.balance, Naira::new(200));
        assert!(ledger.wallet.escrows.is_empty());
        assert_eq!(
            ledger.recent_transactions(1)[0].meta.note.as_deref(),
            Some("finders_fee")
        );
        assert_conserved(&ledger);
    }

    #[test]
    fn recent_transactions_are_newest_first() {
        let ids = ids();
        let stamp = Stamp::new(&ids, Utc::now());
        let mut ledger = Ledger::default();
        for amount in 1..=5 {
            ledger.deposit(Naira::new(amount), &stamp).unwrap();
        }
        let recent: Vec<u64> = ledger
            .recent_transactions(3)
            .iter()
            .map(|t| t.amount.amount())
            .collect();
        assert_eq!(recent, vec![5, 4, 3]);
    }

    #[test]
    fn overflowing_deposit_is_refused() {
        let ids = ids();
        let stamp = Stamp::new(&ids, Utc::now());
        let mut ledger = funded(&ids, u64::MAX);
        let before = ledger.clone();

        let err = ledger.deposit(Naira::new(10), &stamp).unwrap_err();
        assert!(matches!(err, PadimanError::Validation(_)));
        assert_eq!(ledger, before);
        assert_conserved(&ledger);
    }

    #[test]
    fn overflowing_coffer_credit_moves_nothing() {
        let ids = ids();
        let stamp = Stamp::new(&ids, Utc::now());
        let mut ledger = funded(&ids, 1_000);
        // coffer already at the ceiling, as if loaded from a snapshot
        ledger.coffer.balance = Naira::new(u64::MAX);
        let before = ledger.clone();

        let hold = ledger.hold_in_escrow(task_id(), Naira::new(10), &stamp);
        assert!(matches!(hold, Err(PadimanError::Validation(_))));
        let fee = ledger.hold_finders_fee_in_coffer(task_id(), Naira::new(10), &stamp);
        assert!(matches!(fee, Err(PadimanError::Validation(_))));
        assert_eq!(ledger, before);
    }

    #[test]
    fn release_into_a_full_wallet_moves_nothing() {
        let ids = ids();
        let stamp = Stamp::new(&ids, Utc::now());
        let mut ledger = funded(&ids, 1_000);
        let task = task_id();
        ledger.hold_in_escrow(task, Naira::new(500), &stamp).unwrap();
        ledger.deposit(Naira::new(u64::MAX - 500), &stamp).unwrap();
        let before = ledger.clone();

        let err = ledger.release_escrow(task, None, &stamp).unwrap_err();
        assert!(matches!(err, PadimanError::Validation(_)));
        assert_eq!(ledger, before);
        assert_conserved(&ledger);
    }

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Deposit(u64),
        Hold(usize, u64),
        Fee(usize, u64),
        Release(usize),
        Refund(usize),
        Withdraw(u64),
    }

    #[rstest]
    #[case::two_errands(
        &[
            Step::Deposit(10_000),
            Step::Hold(0, 625),
            Step::Fee(1, 200),
            Step::Hold(1, 1_400),
            Step::Release(0),
            Step::Withdraw(3_000),
            Step::Refund(1),
        ],
        (6_800, 0, 200),
    )]
    #[case::refund_before_release(
        &[
            Step::Deposit(2_000),
            Step::Hold(1, 900),
            Step::Hold(0, 300),
            Step::Refund(1),
            Step::Fee(0, 150),
            Step::Withdraw(1_000),
            Step::Release(0),
        ],
        (850, 0, 150),
    )]
    #[case::escrow_left_open(
        &[
            Step::Deposit(5_000),
            Step::Fee(0, 100),
            Step::Hold(0, 700),
            Step::Hold(1, 800),
            Step::Withdraw(400),
            Step::Refund(0),
            Step::Deposit(50),
        ],
        (3_750, 800, 900),
    )]
    fn interleaved_moves_stay_conserved(
        #[case] steps: &[Step],
        #[case] expected: (u64, u64, u64),
    ) {
        let ids = ids();
        let stamp = Stamp::new(&ids, Utc::now());
        let tasks = [task_id(), task_id()];
        let mut ledger = Ledger::default();

        for step in steps {
            match *step {
                Step::Deposit(n) => ledger.deposit(Naira::new(n), &stamp).unwrap(),
                Step::Hold(t, n) => ledger.hold_in_escrow(tasks[t], Naira::new(n), &stamp).unwrap(),
                Step::Fee(t, n) => ledger
                    .hold_finders_fee_in_coffer(tasks[t], Naira::new(n), &stamp)
                    .unwrap(),
                Step::Release(t) => {
                    ledger.release_escrow(tasks[t], None, &stamp).unwrap();
                }
                Step::Refund(t) => {
                    ledger.refund_escrow(tasks[t], &stamp).unwrap();
                }
                Step::Withdraw(n) => ledger.withdraw(Naira::new(n), &stamp).unwrap(),
            }
            assert_conserved(&ledger);
            let (balance, escrow) = ledger.wallet.replay();
            assert_eq!(balance, ledger.wallet.balance.as_signed(), "after {step:?}");
            assert_eq!(escrow, ledger.wallet.escrow_total().as_signed(), "after {step:?}");
            assert_eq!(ledger.coffer.replay(), ledger.coffer.balance.as_signed(), "after {step:?}");
        }

        let b = ledger.balances();
        assert_eq!(
            (b.wallet_balance.amount(), b.escrow_committed.amount(), b.platform_coffer.amount()),
            expected
        );
    }

    #[rstest]
    #[case::declined(Decision::Decline, false, 100)]
    #[case::too_small(Decision::Deposit(Naira::new(200)), false, 100)]
    #[case::confirmed(Decision::Confirm, true, 594)]
    #[case::generous(Decision::Deposit(Naira::new(1_000)), true, 1_100)]
    #[tokio::test]
    async fn ensure_funds_follows_the_answer(
        #[case] decision: Decision,
        #[case] ok: bool,
        #[case] balance_after: u64,
    ) {
        let ids = ids();
        let stamp = Stamp::new(&ids, Utc::now());
        let mut ledger = funded(&ids, 100);
        let prompter = ScriptedPrompter::new([decision]);

        let result = ledger
            .ensure_funds(Naira::new(594), FundingPurpose::Escrow, &prompter, &stamp)
            .await;
        assert_eq!(result.is_ok(), ok);
        assert_eq!(ledger.wallet.balance, Naira::new(balance_after));

        let asked = prompter.asked().await;
        assert!(matches!(
            asked.as_slice(),
            [DecisionRequest::Deposit { shortfall, .. }] if *shortfall == Naira::new(494)
        ));
    }

    #[tokio::test]
    async fn ensure_funds_does_not_prompt_when_covered() {
        let ids = ids();
        let mut ledger = funded(&ids, 1_000);
        let prompter = ScriptedPrompter::default();
        ledger
            .ensure_funds(
                Naira::new(594),
                FundingPurpose::FindersFee,
                &prompter,
                &Stamp::new(&ids, Utc::now()),
            )
            .await
            .unwrap();
        assert!(prompter.asked().await.is_empty());
    }
}
