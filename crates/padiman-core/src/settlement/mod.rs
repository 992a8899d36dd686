//! Settlement - the task state machine and the money moves attached to it.
//!
//! `Posted -> Accepted -> Completed`, `Posted -> Cancelled`.
//!
//! Every state change runs under one operation lock: load the task list and
//! ledger, check, compute on local copies, then write all touched snapshots
//! in a single `set_many`. Nothing is persisted on any error path.
//!
//! Accept may need the user (finders fee confirmation, deposits). It never
//! waits for an answer while holding the lock; it returns
//! [`AcceptOutcome::Pending`] and is rerun by [`Settlement::resume_accept`].

pub mod accept;

pub use self::accept::{AcceptOutcome, AcceptStep, PendingAccept};

use std::sync::Arc;

use tokio::sync::Mutex;

use self::accept::AcceptContext;
use crate::domain::{
    Balances, Decision, DecisionRequest, DomainEvent, FundingPurpose, GeoPoint, Naira,
    PadimanError, RevealedContact, Task, TaskId, TaskStatus, Transaction,
};
use crate::geo::{GeoLocator, distance_between, route_distance_km};
use crate::ledger::{Ledger, LedgerStore, Stamp};
use crate::matching::{Pricing, RankedTask, nearby};
use crate::ports::{Clock, EventSink, IdGenerator, KvStore, ProfileProvider, Prompter};
use crate::tasks::{self, TaskStore};

/// Default page size for `recent_transactions`.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Input of [`Settlement::post`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub desc: String,
    pub errand_geo: Option<GeoPoint>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            desc: desc.into(),
            errand_geo: None,
        }
    }

    pub fn with_errand(mut self, errand_geo: GeoPoint) -> Self {
        self.errand_geo = Some(errand_geo);
        self
    }
}

/// Collaborators of a [`Settlement`].
pub struct SettlementDeps {
    pub kv: Arc<dyn KvStore>,
    pub profiles: Arc<dyn ProfileProvider>,
    pub locator: Arc<GeoLocator>,
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
    pub events: Arc<dyn EventSink>,
    pub pricing: Pricing,
    pub nearby_radius_km: f64,
}

pub struct Settlement {
    kv: Arc<dyn KvStore>,
    tasks: TaskStore,
    ledger: LedgerStore,
    profiles: Arc<dyn ProfileProvider>,
    locator: Arc<GeoLocator>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    events: Arc<dyn EventSink>,
    pricing: Pricing,
    nearby_radius_km: f64,
    op_lock: Mutex<()>,
}

impl Settlement {
    pub fn new(deps: SettlementDeps) -> Self {
        Self {
            tasks: TaskStore::new(deps.kv.clone()),
            ledger: LedgerStore::new(deps.kv.clone()),
            kv: deps.kv,
            profiles: deps.profiles,
            locator: deps.locator,
            clock: deps.clock,
            ids: deps.ids,
            events: deps.events,
            pricing: deps.pricing,
            nearby_radius_km: deps.nearby_radius_km,
            op_lock: Mutex::new(()),
        }
    }

    pub fn pricing(&self) -> &Pricing {
        &self.pricing
    }

    // ---- wallet ----

    pub async fn deposit(&self, amount: Naira) -> Result<Balances, PadimanError> {
        self.wallet_op("deposit", amount, |ledger, stamp| ledger.deposit(amount, stamp))
            .await
    }

    pub async fn withdraw(&self, amount: Naira) -> Result<Balances, PadimanError> {
        self.wallet_op("withdraw", amount, |ledger, stamp| ledger.withdraw(amount, stamp))
            .await
    }

    async fn wallet_op(
        &self,
        action: &'static str,
        amount: Naira,
        apply: impl FnOnce(&mut Ledger, &Stamp<'_>) -> Result<(), PadimanError>,
    ) -> Result<Balances, PadimanError> {
        let balances = {
            let _guard = self.op_lock.lock().await;
            let mut ledger = self.ledger.load().await?;
            apply(&mut ledger, &Stamp::new(self.ids.as_ref(), self.clock.now()))?;
            self.ledger.save(&ledger).await?;
            ledger.balances()
        };
        tracing::info!(action, amount = %amount, balance = %balances.wallet_balance, "wallet updated");
        self.events.emit(DomainEvent::WalletChanged);
        Ok(balances)
    }

    pub async fn balances(&self) -> Result<Balances, PadimanError> {
        Ok(self.ledger.load().await?.balances())
    }

    /// Wallet transactions, newest first.
    pub async fn recent_transactions(&self, limit: usize) -> Result<Vec<Transaction>, PadimanError> {
        Ok(self.ledger.load().await?.recent_transactions(limit))
    }

    // ---- tasks ----

    /// All tasks, newest first.
    pub async fn tasks(&self) -> Result<Vec<Task>, PadimanError> {
        self.tasks.load().await
    }

    pub async fn task(&self, task_id: TaskId) -> Result<Task, PadimanError> {
        self.tasks.get(task_id).await
    }

    /// Create a task in `Posted`, stamped with the poster's location.
    ///
    /// Posts inside the free quota are marked `free_post`; later ones carry
    /// a provisional `quoted_trip_cost`. No money moves at post time.
    pub async fn post(&self, new: NewTask) -> Result<Task, PadimanError> {
        let mut task = Task::new(
            self.ids.generate_task_id(),
            new.title,
            new.desc,
            self.clock.now(),
        )?;
        task.errand_geo = new.errand_geo;
        task.poster_geo = self.locator.poster_geo().await?;

        {
            let _guard = self.op_lock.lock().await;
            let mut tasks = self.tasks.load().await?;
            let nth = self.tasks.post_count().await? + 1;

            if self.pricing.is_free_post(nth) {
                task.free_post = true;
            } else {
                let km = distance_between(task.poster_geo.as_ref(), task.errand_geo.as_ref());
                task.quoted_trip_cost = self.pricing.trip_cost(km);
            }

            tasks.insert(0, task.clone());
            let mut entries = self.tasks.entries(&tasks)?;
            entries.push(self.tasks.count_entry(nth)?);
            self.kv.set_many(entries).await?;

            tracing::info!(
                task_id = %task.id,
                nth,
                free = task.free_post,
                located = task.poster_geo.is_some(),
                "task posted"
            );
        }

        self.events.emit(DomainEvent::TasksChanged {
            task_id: Some(task.id),
        });
        Ok(task)
    }

    /// Posted tasks near the runner, nearest first.
    pub async fn nearby_tasks(&self) -> Result<Vec<RankedTask>, PadimanError> {
        let runner_geo = self.runner_position().await?;
        self.nearby_tasks_from(runner_geo.as_ref()).await
    }

    pub async fn nearby_tasks_from(
        &self,
        runner_geo: Option<&GeoPoint>,
    ) -> Result<Vec<RankedTask>, PadimanError> {
        let tasks = self.tasks.load().await?;
        Ok(nearby(tasks, runner_geo, self.nearby_radius_km))
    }

    /// Poster contact, once a finders fee unlocked it for an accepted task.
    pub async fn revealed_contact(
        &self,
        task_id: TaskId,
    ) -> Result<Option<RevealedContact>, PadimanError> {
        let task = self.tasks.get(task_id).await?;
        if task.status != TaskStatus::Accepted || !task.contact_revealed {
            return Ok(None);
        }
        Ok(task.revealed_contact)
    }

    /// The runner's position: profile geo (refreshed when stale), else a
    /// device fix.
    async fn runner_position(&self) -> Result<Option<GeoPoint>, PadimanError> {
        if let Some(geo) = self.locator.ensure_profile_geo(false).await? {
            return Ok(Some(geo));
        }
        self.locator.current_position(false).await
    }

    // ---- accept ----

    /// Start accepting `task_id` as this device's runner.
    pub async fn accept(&self, task_id: TaskId) -> Result<AcceptOutcome, PadimanError> {
        let runner_id = self.profiles.runner_id().await?;
        let runner_geo = self.runner_position().await?;
        self.run_accept(AcceptContext::new(task_id, runner_id, runner_geo))
            .await
    }

    /// Continue an accept with the user's answer to its pending question.
    pub async fn resume_accept(
        &self,
        pending: PendingAccept,
        decision: Decision,
    ) -> Result<AcceptOutcome, PadimanError> {
        self.run_accept(pending.answered(decision)).await
    }

    /// Accept, asking `prompter` every question until the flow finishes.
    pub async fn accept_interactive(
        &self,
        task_id: TaskId,
        prompter: &dyn Prompter,
    ) -> Result<Task, PadimanError> {
        let mut outcome = self.accept(task_id).await?;
        loop {
            match outcome {
                AcceptOutcome::Accepted(task) => return Ok(task),
                AcceptOutcome::Pending(pending) => {
                    let decision = prompter.decide(pending.request()).await;
                    outcome = self.resume_accept(pending, decision).await?;
                }
            }
        }
    }

    async fn run_accept(&self, ctx: AcceptContext) -> Result<AcceptOutcome, PadimanError> {
        let task_id = ctx.task_id;
        let result = self.try_accept(ctx).await;
        match &result {
            Ok(AcceptOutcome::Accepted(task)) => {
                self.events.emit(DomainEvent::TasksChanged {
                    task_id: Some(task.id),
                });
                if task.finders_fee_paid || !task.escrow.is_zero() {
                    self.events.emit(DomainEvent::WalletChanged);
                    self.events.emit(DomainEvent::CofferChanged);
                }
            }
            Ok(AcceptOutcome::Pending(pending)) => {
                tracing::debug!(task_id = %task_id, step = ?pending.step(), "accept waiting on user");
            }
            Err(e) => {
                tracing::warn!(task_id = %task_id, error = %e, "accept aborted");
            }
        }
        result
    }

    async fn try_accept(&self, ctx: AcceptContext) -> Result<AcceptOutcome, PadimanError> {
        let _guard = self.op_lock.lock().await;
        let now = self.clock.now();
        let stamp = Stamp::new(self.ids.as_ref(), now);

        let mut tasks = self.tasks.load().await?;
        let idx = tasks::position(&tasks, ctx.task_id)?;
        let mut task = tasks[idx].clone();
        ensure_status(&task, TaskStatus::Posted, "accept")?;

        // scratch copy; committed only when the whole flow succeeds
        let mut ledger = self.ledger.load().await?;
        ledger.check_consistency()?;

        let runner_geo = ctx.runner_geo;
        let post_count = self.tasks.post_count().await?;
        let poster_km = distance_between(task.poster_geo.as_ref(), runner_geo.as_ref());
        let fee = self.pricing.finders_fee(poster_km);

        if self
            .pricing
            .finders_fee_required(post_count, task.finders_fee_paid, fee)
        {
            match ctx.answer(AcceptStep::ConfirmFindersFee) {
                None => {
                    let request = DecisionRequest::ConfirmFindersFee {
                        task_id: task.id,
                        fee,
                        distance_km: poster_km,
                    };
                    return Ok(ctx.ask(AcceptStep::ConfirmFindersFee, request));
                }
                Some(Decision::Confirm) => {}
                Some(_) => {
                    return Err(PadimanError::Declined(format!(
                        "finders fee of {fee} not paid"
                    )));
                }
            }

            if let Some(request) = ledger.funding_request(fee, FundingPurpose::FindersFee) {
                let Some(answer) = ctx.answer(AcceptStep::FundFindersFee) else {
                    return Ok(ctx.ask(AcceptStep::FundFindersFee, request));
                };
                ledger.apply_funding(fee, answer, &stamp)?;
            }
            ledger.hold_finders_fee_in_coffer(task.id, fee, &stamp)?;

            let contact = self
                .profiles
                .load_profile()
                .await?
                .map(|p| p.contact())
                .unwrap_or_default();
            task.mark_finders_fee_paid(fee, contact);
        }

        let route_km = route_distance_km(
            task.poster_geo.as_ref(),
            runner_geo.as_ref(),
            task.errand_geo.as_ref(),
        );
        let cost = self.pricing.trip_cost(route_km);
        if task.escrow.is_zero() && !cost.is_zero() {
            if let Some(request) = ledger.funding_request(cost, FundingPurpose::Escrow) {
                let Some(answer) = ctx.answer(AcceptStep::FundEscrow) else {
                    return Ok(ctx.ask(AcceptStep::FundEscrow, request));
                };
                ledger.apply_funding(cost, answer, &stamp)?;
            }
            ledger.hold_in_escrow(task.id, cost, &stamp)?;
            task.mark_escrow_held(cost);
        }

        task.mark_accepted(ctx.runner_id, now);
        tasks[idx] = task.clone();

        let mut entries = self.tasks.entries(&tasks)?;
        entries.extend(self.ledger.entries(&ledger)?);
        self.kv.set_many(entries).await?;

        tracing::info!(
            task_id = %task.id,
            runner_id = %ctx.runner_id,
            route_km,
            escrow = %task.escrow,
            finders_fee = %task.finders_fee,
            "task accepted"
        );
        Ok(AcceptOutcome::Accepted(task))
    }

    // ---- complete / cancel ----

    /// Poster confirms the errand is done: escrow goes out of the coffer.
    pub async fn complete(&self, task_id: TaskId) -> Result<Task, PadimanError> {
        self.finish(task_id, TaskStatus::Accepted, "complete").await
    }

    /// Poster withdraws a task nobody accepted; any escrow is refunded.
    pub async fn cancel(&self, task_id: TaskId) -> Result<Task, PadimanError> {
        self.finish(task_id, TaskStatus::Posted, "cancel").await
    }

    async fn finish(
        &self,
        task_id: TaskId,
        from: TaskStatus,
        action: &'static str,
    ) -> Result<Task, PadimanError> {
        let (task, moved) = {
            let _guard = self.op_lock.lock().await;
            let stamp = Stamp::new(self.ids.as_ref(), self.clock.now());

            let mut tasks = self.tasks.load().await?;
            let idx = tasks::position(&tasks, task_id)?;
            let mut task = tasks[idx].clone();
            ensure_status(&task, from, action)?;

            let mut ledger = self.ledger.load().await?;
            let moved = if task.escrow.is_zero() {
                Naira::ZERO
            } else if from == TaskStatus::Accepted {
                ledger.release_escrow(task.id, task.runner_id, &stamp)?
            } else {
                ledger.refund_escrow(task.id, &stamp)?
            };

            if from == TaskStatus::Accepted {
                task.mark_completed();
            } else {
                task.mark_cancelled();
            }
            tasks[idx] = task.clone();

            let mut entries = self.tasks.entries(&tasks)?;
            if !moved.is_zero() {
                entries.extend(self.ledger.entries(&ledger)?);
            }
            self.kv.set_many(entries).await?;
            (task, moved)
        };

        tracing::info!(task_id = %task.id, status = %task.status, escrow = %moved, "task settled");
        self.events.emit(DomainEvent::TasksChanged {
            task_id: Some(task.id),
        });
        if !moved.is_zero() {
            self.events.emit(DomainEvent::WalletChanged);
            self.events.emit(DomainEvent::CofferChanged);
        }
        Ok(task)
    }
}

fn ensure_status(task: &Task, expected: TaskStatus, action: &'static str) -> Result<(), PadimanError> {
    if task.status == expected {
        Ok(())
    } else {
        Err(PadimanError::InvalidTransition {
            task_id: task.id,
            status: task.status,
            action,
        })
    }
}
