//! slide-cli: headless driver for the weekly slide ledger.
//!
//! Usage:
//!   slide-cli --db slide.db                 print a ledger summary
//!   slide-cli --db slide.db --pull          replace local state from the cloud first
//!   slide-cli --db slide.db --ipc-mode      JSON-line commands on stdin

use anyhow::Result;
use serde::{Deserialize, Serialize};
use slide_core::{
    config::LedgerConfig,
    reports::{PlayerCarryBreakdown, RunningBalance},
    store::{KeyValueStore, MemoryKvStore, SqliteKvStore},
    sync::{SyncState, SyncStatus},
    types::{AccountNumber, EntityId, Money},
    LedgerStore, PlayerRecord, WeekLedger,
};
use std::env;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    AddPlayer { name: String, account_number: AccountNumber },
    RemovePlayer { player_id: EntityId },
    CreateWeek { name: String },
    SetActiveWeek { week_id: Option<EntityId> },
    DeleteWeek { week_id: EntityId },
    AddToWeek { week_id: EntityId, name: String, account_number: AccountNumber },
    AddRosterToWeek { week_id: EntityId },
    SetIn { week_id: EntityId, record_id: EntityId, amount: Money },
    SetOut { week_id: EntityId, record_id: EntityId, amount: Money },
    StartClose { week_id: EntityId },
    CancelClose { week_id: EntityId },
    MarkPaid { week_id: EntityId, record_id: EntityId, amount: Option<Money> },
    MarkUnpaid { week_id: EntityId, record_id: EntityId },
    MarkPartial { week_id: EntityId, record_id: EntityId, paid_amount: Money },
    MarkAllPaid { week_id: EntityId },
    CloseWeek { week_id: EntityId },
    ReopenWeek { week_id: EntityId },
    NextWeek { week_id: EntityId },
    DuplicateWeek { week_id: EntityId, name: String },
    CarryPayment {
        account_number: AccountNumber,
        amount: Money,
        #[serde(default)]
        note: String,
        #[serde(default)]
        week_id: Option<EntityId>,
    },
    PayOffCarry {
        account_number: AccountNumber,
        #[serde(default)]
        note: String,
    },
    UndoPayment { account_number: AccountNumber, payment_id: EntityId },
    Breakdown { account_number: AccountNumber },
    Export,
    Import { data: String },
    Push,
    Pull,
    Quit,
}

#[derive(Serialize)]
struct SyncView {
    state: &'static str,
    last_synced: Option<String>,
    error: Option<String>,
    pending: bool,
}

impl SyncView {
    fn new(status: SyncStatus, pending: bool) -> Self {
        let state = match status.state {
            SyncState::Idle => "idle",
            SyncState::Syncing => "syncing",
            SyncState::Success => "success",
            SyncState::Error => "error",
        };
        Self {
            state,
            last_synced: status.last_synced,
            error: status.error,
            pending,
        }
    }
}

#[derive(Serialize)]
struct UiState<'a> {
    ok: bool,
    revision: u64,
    active_week_id: Option<&'a str>,
    weeks: &'a [WeekLedger],
    players: &'a [PlayerRecord],
    total_carry_outstanding: Money,
    running_balance: RunningBalance,
    cloud_configured: bool,
    sync: SyncView,
}

/// Extra payload attached to a reply, for commands that return data.
enum Reply {
    Created(Option<EntityId>),
    Breakdown(Option<PlayerCarryBreakdown>),
    Export(String),
    Ok(bool),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let pull = args.iter().any(|a| a == "--pull");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");

    let config = LedgerConfig::from_env();
    if !ipc_mode {
        println!("Slide ledger");
        println!("  db:       {db}");
        println!("  key:      {}", config.storage_key);
        println!("  cloud:    {}", if config.remote.is_configured() { "configured" } else { "off" });
        println!();
    }

    let kv: Arc<dyn KeyValueStore> = if db == ":memory:" {
        Arc::new(MemoryKvStore::new())
    } else {
        Arc::new(SqliteKvStore::open(db)?)
    };
    let mut store = LedgerStore::build(config, kv);
    store.init();

    if pull && store.cloud_configured() {
        match store.sync_from_cloud().await {
            Ok(true) => log::info!("Pulled ledger from cloud"),
            Ok(false) => log::info!("No cloud copy yet"),
            Err(e) => log::warn!("Cloud pull failed: {e}"),
        }
    }

    if ipc_mode {
        run_ipc_loop(&mut store).await?;
    } else {
        print_summary(&store);
    }

    // Push whatever the debounce timer was still holding, or wait out a
    // write that already left it, before the runtime goes away.
    if store.has_pending_sync() {
        if let Err(e) = store.force_sync_to_cloud().await {
            log::warn!("Final cloud sync failed: {e}");
        }
    } else {
        store.flush_sync().await;
    }
    Ok(())
}

async fn run_ipc_loop(store: &mut LedgerStore) -> Result<()> {
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = std::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let cmd: IpcCommand = match serde_json::from_str(&line) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{err_json}")?;
                stdout.flush()?;
                continue;
            }
        };
        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        let reply = handle_command(store, cmd).await;
        let mut state = serde_json::to_value(build_ui_state(store, reply_ok(&reply)))?;
        match reply {
            Reply::Created(id) => state["id"] = serde_json::to_value(id)?,
            Reply::Breakdown(b) => state["breakdown"] = serde_json::to_value(b)?,
            Reply::Export(data) => state["export"] = serde_json::Value::String(data),
            Reply::Ok(_) => {}
        }
        writeln!(stdout, "{state}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn reply_ok(reply: &Reply) -> bool {
    match reply {
        Reply::Created(id) => id.is_some(),
        Reply::Breakdown(b) => b.is_some(),
        Reply::Export(_) => true,
        Reply::Ok(ok) => *ok,
    }
}

async fn handle_command(store: &mut LedgerStore, cmd: IpcCommand) -> Reply {
    use IpcCommand::*;
    match cmd {
        GetState | Quit => Reply::Ok(true),
        AddPlayer { name, account_number } => {
            Reply::Created(store.add_player(&name, account_number).map(|p| p.id.clone()))
        }
        RemovePlayer { player_id } => Reply::Ok(store.remove_player(&player_id)),
        CreateWeek { name } => Reply::Created(Some(store.create_week(&name).id.clone())),
        SetActiveWeek { week_id } => Reply::Ok(store.set_active_week(week_id.as_deref())),
        DeleteWeek { week_id } => Reply::Ok(store.delete_week(&week_id)),
        AddToWeek { week_id, name, account_number } => {
            Reply::Created(store.add_player_to_week(&week_id, &name, account_number))
        }
        AddRosterToWeek { week_id } => Reply::Ok(store.add_roster_to_week(&week_id).is_some()),
        SetIn { week_id, record_id, amount } => Reply::Ok(store.set_player_in(&week_id, &record_id, amount)),
        SetOut { week_id, record_id, amount } => Reply::Ok(store.set_player_out(&week_id, &record_id, amount)),
        StartClose { week_id } => Reply::Ok(store.start_close(&week_id)),
        CancelClose { week_id } => Reply::Ok(store.cancel_close(&week_id)),
        MarkPaid { week_id, record_id, amount } => {
            Reply::Ok(store.mark_player_paid(&week_id, &record_id, amount))
        }
        MarkUnpaid { week_id, record_id } => Reply::Ok(store.mark_player_unpaid(&week_id, &record_id)),
        MarkPartial { week_id, record_id, paid_amount } => {
            Reply::Ok(store.mark_player_partial(&week_id, &record_id, paid_amount))
        }
        MarkAllPaid { week_id } => Reply::Ok(store.mark_all_paid(&week_id)),
        CloseWeek { week_id } => Reply::Ok(store.close_week_and_update_carries(&week_id)),
        ReopenWeek { week_id } => Reply::Ok(store.reopen_week(&week_id)),
        NextWeek { week_id } => Reply::Created(store.create_next_week_from_closed(&week_id)),
        DuplicateWeek { week_id, name } => Reply::Created(store.duplicate_week(&week_id, &name)),
        CarryPayment { account_number, amount, note, week_id } => {
            let payment = match week_id {
                Some(week_id) => store.record_week_carry_payment(account_number, &week_id, amount, &note),
                None => store.record_carry_payment(account_number, amount, &note),
            };
            Reply::Created(payment.map(|p| p.id))
        }
        PayOffCarry { account_number, note } => {
            Reply::Created(store.pay_off_all_carry(account_number, &note).map(|p| p.id))
        }
        UndoPayment { account_number, payment_id } => {
            Reply::Ok(store.undo_carry_payment(account_number, &payment_id).is_some())
        }
        Breakdown { account_number } => Reply::Breakdown(store.player_carry_breakdown(account_number)),
        Export => match store.export() {
            Ok(data) => Reply::Export(data),
            Err(e) => {
                log::error!("Export failed: {e}");
                Reply::Ok(false)
            }
        },
        Import { data } => Reply::Ok(store.import(&data)),
        Push => Reply::Ok(store.force_sync_to_cloud().await.is_ok()),
        Pull => Reply::Ok(store.sync_from_cloud().await.is_ok()),
    }
}

fn build_ui_state(store: &LedgerStore, ok: bool) -> UiState<'_> {
    UiState {
        ok,
        revision: store.revision(),
        active_week_id: store.active_week_id(),
        weeks: store.weeks(),
        players: store.players(),
        total_carry_outstanding: store.total_carry_outstanding(),
        running_balance: store.running_balance(),
        cloud_configured: store.cloud_configured(),
        sync: SyncView::new(store.sync_status(), store.has_pending_sync()),
    }
}

fn print_summary(store: &LedgerStore) {
    println!("=== WEEKS ===");
    if store.weeks().is_empty() {
        println!("  (no weeks yet)");
    }
    for week in store.weeks() {
        let marker = if store.active_week_id() == Some(week.id.as_str()) { "*" } else { " " };
        println!(
            " {marker} {:<16} {:<13} | in ${:.2} | out ${:.2} | vig ${:.2} | collected {:.0}%",
            week.name,
            week.status().as_str(),
            week.in_total(),
            week.out_total(),
            week.vig(),
            week.collection_rate(),
        );
    }

    println!();
    println!("=== CARRY BALANCES ===");
    let carrying: Vec<_> = store.players().iter().filter(|p| p.has_carry()).collect();
    if carrying.is_empty() {
        println!("  (nobody is carrying a balance)");
    }
    for player in carrying {
        println!(
            "  #{:<5} {:<20} ${:.2}",
            player.account_number,
            player.name,
            player.carry_balance()
        );
    }
    println!("  total outstanding: ${:.2}", store.total_carry_outstanding());

    let balance = store.running_balance();
    println!();
    println!("=== RUNNING BALANCE (closed weeks) ===");
    println!("  expected:    ${:.2}", balance.total_expected);
    println!("  collected:   ${:.2}", balance.total_collected);
    println!("  outstanding: ${:.2}", balance.total_outstanding);
}
