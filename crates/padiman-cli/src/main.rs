mod args;
mod prompt;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use padiman_core::domain::{GeoPoint, Profile, ProfileLocation, Task};
use padiman_core::impls::{InMemoryKvStore, JsonFileKvStore, ScriptedPrompter, StaticLocationSource};
use padiman_core::matching::RankedTask;
use padiman_core::ports::{KvStore, ProfileProvider};
use padiman_core::settlement::{DEFAULT_HISTORY_LIMIT, NewTask};
use padiman_core::{AppBuilder, Config, Marketplace, Naira};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::{Cli, Command, USAGE};
use crate::prompt::StdinPrompter;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = match args::parse(std::env::args().skip(1)) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env().context("reading configuration")?;
    let fix = cli.at.map(|(lat, lon)| GeoPoint::new(lat, lon, Utc::now()));
    let location = Arc::new(StaticLocationSource::new(fix));

    if cli.command == Command::Demo {
        return demo(config).await;
    }

    let kv: Arc<dyn KvStore> = Arc::new(
        JsonFileKvStore::open(&config.data_dir)
            .await
            .with_context(|| format!("opening {}", config.data_dir.display()))?,
    );
    tracing::debug!(dir = %config.data_dir.display(), located = cli.at.is_some(), "opening marketplace");
    let market = AppBuilder::new(config)
        .kv_store(kv)
        .location_source(location)
        .build()?;

    execute(&market, cli.command).await
}

async fn execute(market: &Marketplace, command: Command) -> Result<()> {
    let settlement = market.settlement();
    match command {
        Command::Deposit(amount) => {
            let b = settlement.deposit(amount).await?;
            println!("deposited {amount}; balance {}", b.wallet_balance);
        }
        Command::Withdraw(amount) => {
            let b = settlement.withdraw(amount).await?;
            println!("withdrew {amount}; balance {}", b.wallet_balance);
        }
        Command::Balances => {
            let b = settlement.balances().await?;
            println!("wallet          {}", b.wallet_balance);
            println!("escrow          {}", b.escrow_committed);
            println!("platform coffer {}", b.platform_coffer);
        }
        Command::History(limit) => {
            let txns = settlement
                .recent_transactions(limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
                .await?;
            if txns.is_empty() {
                println!("no transactions yet");
            }
            for t in txns {
                let task = t.meta.task_id.map(|id| id.to_string()).unwrap_or_default();
                println!(
                    "{}  {:<14} {:>10}  {task}",
                    t.timestamp.format("%Y-%m-%d %H:%M"),
                    format!("{:?}", t.kind),
                    t.amount.to_string()
                );
            }
        }
        Command::Profile { phone, address } => {
            let mut profile = market.profiles().load_profile().await?.unwrap_or_default();
            profile.phone = Some(phone);
            profile.location.address = Some(address);
            market.profiles().save_profile(&profile).await?;
            println!("profile saved");
        }
        Command::Post {
            title,
            desc,
            errand,
        } => {
            let mut new = NewTask::new(title, desc);
            if let Some((lat, lon)) = errand {
                new = new.with_errand(GeoPoint::new(lat, lon, Utc::now()));
            }
            let task = settlement.post(new).await?;
            print_task(&task);
            if task.free_post {
                println!("posted for free");
            } else if !task.quoted_trip_cost.is_zero() {
                println!("provisional trip cost {}", task.quoted_trip_cost);
            }
        }
        Command::Tasks => {
            for task in settlement.tasks().await? {
                print_task(&task);
            }
        }
        Command::Nearby => {
            let nearby = settlement.nearby_tasks().await?;
            if nearby.is_empty() {
                println!("no open tasks nearby");
            }
            for ranked in &nearby {
                print_ranked(ranked);
            }
        }
        Command::Accept(task_id) => {
            let task = settlement
                .accept_interactive(task_id, &StdinPrompter::new())
                .await?;
            println!("accepted {}", task.id);
            if !task.escrow.is_zero() {
                println!("escrow secured: {}", task.escrow);
            }
        }
        Command::Complete(task_id) => {
            let task = settlement.complete(task_id).await?;
            println!("completed {}", task.id);
        }
        Command::Cancel(task_id) => {
            let task = settlement.cancel(task_id).await?;
            println!("cancelled {}", task.id);
        }
        Command::Contact(task_id) => match settlement.revealed_contact(task_id).await? {
            Some(contact) => {
                println!("phone   {}", contact.phone.as_deref().unwrap_or("-"));
                println!("address {}", contact.address.as_deref().unwrap_or("-"));
            }
            None => println!("contact is not revealed for this task"),
        },
        Command::Demo => anyhow::bail!("demo runs on its own in-memory store"),
    }
    Ok(())
}

fn print_task(task: &Task) {
    let escrow = if task.escrow.is_zero() {
        String::new()
    } else {
        format!("  escrow {}", task.escrow)
    };
    println!("{}  [{}] {}{escrow}", task.id, task.status, task.title);
}

fn print_ranked(ranked: &RankedTask) {
    let distance = ranked
        .distance_from_runner_km
        .map(|km| format!("{km:.1} km away"))
        .unwrap_or_default();
    println!("{}  {}  {distance}", ranked.task.id, ranked.task.title);
}

/// Scripted session against an in-memory store: post, accept, complete.
async fn demo(config: Config) -> Result<()> {
    let device = Arc::new(StaticLocationSource::new(Some(GeoPoint::new(
        9.08,
        7.40,
        Utc::now(),
    ))));
    let market = AppBuilder::new(config)
        .kv_store(Arc::new(InMemoryKvStore::new()))
        .location_source(device.clone())
        .build()?;
    let settlement = market.settlement();

    market
        .profiles()
        .save_profile(&Profile {
            phone: Some("+2348000000000".into()),
            location: ProfileLocation {
                address: Some("12 Aminu Kano Crescent, Wuse II".into()),
                ..ProfileLocation::default()
            },
            ..Profile::default()
        })
        .await?;

    let task = settlement
        .post(NewTask::new("Buy bread", "Two loaves from the corner shop"))
        .await?;
    println!("posted {} (free: {})", task.title, task.free_post);

    // runner side: a fresh fix a few kilometres away
    device
        .set(Some(GeoPoint::new(9.10, 7.42, Utc::now())))
        .await;
    market.locator().ensure_profile_geo(true).await?;
    settlement.deposit(Naira::new(10_000)).await?;

    for ranked in settlement.nearby_tasks().await? {
        print_ranked(&ranked);
    }

    // inside the free quota with a funded wallet nothing needs confirming
    let prompter = ScriptedPrompter::default();
    let task = settlement.accept_interactive(task.id, &prompter).await?;
    println!("accepted; escrow {}", task.escrow);
    print_balances(&market).await?;

    settlement.complete(task.id).await?;
    println!("completed");
    print_balances(&market).await
}

async fn print_balances(market: &Marketplace) -> Result<()> {
    let b = market.settlement().balances().await?;
    println!(
        "wallet {}  escrow {}  coffer {}",
        b.wallet_balance, b.escrow_committed, b.platform_coffer
    );
    Ok(())
}
