//! Command-line parsing.

use anyhow::{Context, Result, anyhow, bail};
use padiman_core::Naira;
use padiman_core::domain::TaskId;

pub const USAGE: &str = "\
usage: padiman [--at LAT,LON] <command>

commands:
  deposit <amount>                      add funds to the wallet
  withdraw <amount>                     take funds out of the wallet
  balances                              wallet, escrow and platform coffer
  history [limit]                       recent wallet transactions
  profile <phone> <address>             save contact details
  post <title> <desc> [--errand LAT,LON]
  tasks                                 every task, newest first
  nearby                                posted tasks close to you
  accept <task-id>                      take a task (asks before paying)
  complete <task-id>                    release escrow to the runner
  cancel <task-id>                      withdraw a task nobody accepted
  contact <task-id>                     poster contact, once unlocked
  demo                                  run a scripted session in memory

--at sets the device location used for posting and matching.";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Deposit(Naira),
    Withdraw(Naira),
    Balances,
    History(Option<usize>),
    Profile { phone: String, address: String },
    Post {
        title: String,
        desc: String,
        errand: Option<(f64, f64)>,
    },
    Tasks,
    Nearby,
    Accept(TaskId),
    Complete(TaskId),
    Cancel(TaskId),
    Contact(TaskId),
    Demo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cli {
    pub at: Option<(f64, f64)>,
    pub command: Command,
}

pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Cli> {
    let mut at = None;
    let mut errand = None;
    let mut words = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--at" => at = Some(coords(args.next().as_deref())?),
            "--errand" => errand = Some(coords(args.next().as_deref())?),
            _ => words.push(arg),
        }
    }

    let mut words = words.into_iter();
    let name = words.next().ok_or_else(|| anyhow!("missing command"))?;
    let mut next = |what: &str| {
        words
            .next()
            .ok_or_else(|| anyhow!("{name}: missing {what}"))
    };

    let command = match name.as_str() {
        "deposit" => Command::Deposit(amount(&next("amount")?)?),
        "withdraw" => Command::Withdraw(amount(&next("amount")?)?),
        "balances" => Command::Balances,
        "history" => Command::History(
            next("limit")
                .ok()
                .map(|raw| raw.parse().context("limit must be a number"))
                .transpose()?,
        ),
        "profile" => Command::Profile {
            phone: next("phone")?,
            address: next("address")?,
        },
        "post" => Command::Post {
            title: next("title")?,
            desc: next("description")?,
            errand,
        },
        "tasks" => Command::Tasks,
        "nearby" => Command::Nearby,
        "accept" => Command::Accept(task_id(&next("task id")?)?),
        "complete" => Command::Complete(task_id(&next("task id")?)?),
        "cancel" => Command::Cancel(task_id(&next("task id")?)?),
        "contact" => Command::Contact(task_id(&next("task id")?)?),
        "demo" => Command::Demo,
        other => bail!("unknown command {other:?}"),
    };
    Ok(Cli { at, command })
}

fn amount(raw: &str) -> Result<Naira> {
    let value: u64 = raw
        .replace(',', "")
        .parse()
        .with_context(|| format!("invalid amount {raw:?}"))?;
    Ok(Naira::new(value))
}

fn task_id(raw: &str) -> Result<TaskId> {
    raw.parse()
        .map_err(|_| anyhow!("invalid task id {raw:?}"))
}

fn coords(raw: Option<&str>) -> Result<(f64, f64)> {
    let raw = raw.ok_or_else(|| anyhow!("expected LAT,LON"))?;
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| anyhow!("expected LAT,LON, got {raw:?}"))?;
    Ok((
        lat.trim().parse().context("invalid latitude")?,
        lon.trim().parse().context("invalid longitude")?,
    ))
}
