//! The ledger store: owns every week and the roster, and coordinates
//! anything that spans both.
//!
//! RULES:
//!   - Every mutating call runs to completion, then persists the whole
//!     snapshot locally and schedules a debounced remote write.
//!   - Roster players and week records are joined by account number only.
//!   - Lookups that miss return `None` / `false`. Precondition violations
//!     (closing a closed week, reopening an open one) are silent no-ops.
//!
//! CARRY LIFECYCLE:
//!   close:  carried+pending → unpaid, then add each carry_forward to the
//!           roster, then seal the week.
//!   reopen: subtract each carry_forward from the roster (statuses still
//!           intact), then reset statuses and reactivate.

use crate::{
    clock::{format_timestamp, parse_timestamp, Clock, SystemClock},
    config::LedgerConfig,
    error::{LedgerResult, RemoteResult},
    ids::{IdGenerator, UuidIds},
    player::{CarryPayment, PlayerRecord},
    player_week::{PaymentStatus, PlayerWeekRecord},
    remote::{JsonBinService, RemoteDocumentService},
    reports::{self, PlayerCarryBreakdown, RunningBalance},
    snapshot::LedgerSnapshot,
    store::KeyValueStore,
    sync::{CloudSync, SyncStatus},
    types::{AccountNumber, EntityId, Money, SNAPSHOT_VERSION},
    week::WeekLedger,
};
use chrono::{Duration, NaiveTime};
use std::sync::Arc;
use tokio::sync::watch;

pub struct LedgerStore {
    weeks: Vec<WeekLedger>,
    players: Vec<PlayerRecord>,
    active_week_id: Option<EntityId>,
    initialized: bool,
    config: LedgerConfig,
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    sync: CloudSync,
    revision: watch::Sender<u64>,
}

impl LedgerStore {
    pub fn new(
        config: LedgerConfig,
        kv: Arc<dyn KeyValueStore>,
        remote: Arc<dyn RemoteDocumentService>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let sync = CloudSync::new(remote, Arc::clone(&clock), config.sync_debounce, config.sync_reset);
        let (revision, _) = watch::channel(0);
        Self {
            weeks: Vec::new(),
            players: Vec::new(),
            active_week_id: None,
            initialized: false,
            config,
            kv,
            clock,
            ids,
            sync,
            revision,
        }
    }

    /// Production wiring: JSONBin remote, system clock, random UUIDs.
    pub fn build(config: LedgerConfig, kv: Arc<dyn KeyValueStore>) -> Self {
        let remote = Arc::new(JsonBinService::new(
            config.remote.clone(),
            Arc::clone(&kv),
            config.document_id_key.clone(),
        ));
        Self::new(config, kv, remote, Arc::new(SystemClock), Arc::new(UuidIds))
    }

    // ── Initialization & persistence ──────────────────────────────

    /// Load the local snapshot and run the one-time carry backfill.
    /// Idempotent.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.load();
        if self.migrate_carry_balances() {
            self.save();
        }
        self.initialized = true;
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn load(&mut self) {
        let raw = match self.kv.get(&self.config.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                log::error!("Failed to read local snapshot: {e}");
                return;
            }
        };
        match LedgerSnapshot::from_json(&raw) {
            Ok(snapshot) => {
                self.apply(snapshot);
                log::info!(
                    "Loaded {} weeks and {} players from local store",
                    self.weeks.len(),
                    self.players.len()
                );
            }
            Err(e) => log::error!("Failed to load app data: {e}"),
        }
    }

    /// Backfill roster balances from closed weeks for data written before
    /// carry tracking existed. Skipped as soon as any player shows carry
    /// activity (a balance or a payment history).
    pub fn migrate_carry_balances(&mut self) -> bool {
        let tracked = self
            .players
            .iter()
            .any(|p| p.carry_balance() != 0.0 || !p.carry_payments().is_empty());
        if tracked {
            return false;
        }

        let mut changed = false;
        for week in self.weeks.iter().filter(|w| w.is_closed()) {
            for record in week.players() {
                let carry = record.carry_forward();
                if carry <= 0.0 {
                    continue;
                }
                if let Some(player) = self
                    .players
                    .iter_mut()
                    .find(|p| p.account_number == record.account_number)
                {
                    player.add_carry(carry);
                    changed = true;
                }
            }
        }
        if changed {
            log::info!("Backfilled roster carry balances from closed weeks");
        }
        changed
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            weeks: self.weeks.clone(),
            players: self.players.clone(),
            active_week_id: self.active_week_id.clone(),
            version: SNAPSHOT_VERSION,
        }
    }

    fn apply(&mut self, snapshot: LedgerSnapshot) {
        self.weeks = snapshot.weeks;
        self.players = snapshot.players;
        self.active_week_id = snapshot.active_week_id;
    }

    /// Write the snapshot locally. The revision only moves when the write
    /// landed. No remote write.
    fn persist_local(&mut self, snapshot: &LedgerSnapshot) {
        let written = snapshot
            .to_json()
            .and_then(|json| self.kv.set(&self.config.storage_key, &json));
        match written {
            Ok(()) => self.revision.send_modify(|r| *r += 1),
            Err(e) => log::error!("Failed to save app data: {e}"),
        }
    }

    /// Persist locally, then schedule the debounced remote write.
    pub fn save(&mut self) {
        let snapshot = self.snapshot();
        self.persist_local(&snapshot);
        self.sync.schedule(&snapshot);
    }

    /// Drop all in-memory state and the local snapshot.
    pub fn clear(&mut self) {
        self.weeks.clear();
        self.players.clear();
        self.active_week_id = None;
        self.sync.cancel_pending();
        match self.kv.remove(&self.config.storage_key) {
            Ok(()) => self.revision.send_modify(|r| *r += 1),
            Err(e) => log::error!("Failed to clear local snapshot: {e}"),
        }
    }

    pub fn export(&self) -> LedgerResult<String> {
        self.snapshot().to_json_pretty()
    }

    /// Replace all state with an exported snapshot. On any parse or shape
    /// error nothing changes and `false` is returned.
    pub fn import(&mut self, raw: &str) -> bool {
        match LedgerSnapshot::from_json(raw) {
            Ok(snapshot) => {
                self.apply(snapshot);
                self.save();
                true
            }
            Err(e) => {
                log::error!("Failed to import data: {e}");
                false
            }
        }
    }

    /// Bumped on every mutation that reached the local store.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    // ── Cloud sync ────────────────────────────────────────────────

    pub fn sync_status(&self) -> SyncStatus {
        self.sync.status()
    }

    pub fn subscribe_sync(&self) -> watch::Receiver<SyncStatus> {
        self.sync.subscribe()
    }

    pub fn cloud_configured(&self) -> bool {
        self.sync.is_configured()
    }

    pub fn has_pending_sync(&self) -> bool {
        self.sync.has_pending()
    }

    /// Drop a scheduled remote write. Local state is unaffected.
    pub fn cancel_pending_sync(&mut self) {
        self.sync.cancel_pending();
    }

    pub async fn force_sync_to_cloud(&mut self) -> RemoteResult<()> {
        let snapshot = self.snapshot();
        self.sync.push_now(&snapshot).await
    }

    /// Wait for remote writes that are already running.
    pub async fn flush_sync(&self) {
        self.sync.flush().await;
    }

    /// Replace local state with the remote document. `Ok(false)` when no
    /// remote document exists yet. A scheduled push of the pre-pull state
    /// is dropped first so it cannot overwrite what was pulled.
    pub async fn sync_from_cloud(&mut self) -> RemoteResult<bool> {
        self.sync.cancel_pending();
        match self.sync.pull().await? {
            Some(snapshot) => {
                self.apply(snapshot.clone());
                self.persist_local(&snapshot);
                log::info!("Replaced local state from cloud");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ── Roster ────────────────────────────────────────────────────

    pub fn players(&self) -> &[PlayerRecord] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, id: &str) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_by_account(&self, account_number: AccountNumber) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| p.account_number == account_number)
    }

    fn player_by_account_mut(&mut self, account_number: AccountNumber) -> Option<&mut PlayerRecord> {
        self.players.iter_mut().find(|p| p.account_number == account_number)
    }

    /// Add a roster player. `None` if the account number is taken.
    pub fn add_player(&mut self, name: &str, account_number: AccountNumber) -> Option<&PlayerRecord> {
        if self.player_by_account(account_number).is_some() {
            log::warn!("Account {account_number} already on the roster");
            return None;
        }
        let now = self.clock.timestamp();
        let player = PlayerRecord::new(self.ids.next_id(), name, account_number, &now);
        self.players.push(player);
        self.save();
        self.players.last()
    }

    /// Rename / renumber. Refuses an account number held by someone else.
    pub fn update_player(&mut self, id: &str, name: &str, account_number: AccountNumber) -> bool {
        let clash = self
            .players
            .iter()
            .any(|p| p.account_number == account_number && p.id != id);
        if clash {
            log::warn!("Account {account_number} already on the roster");
            return false;
        }
        let Some(player) = self.players.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        player.name = name.to_string();
        player.account_number = account_number;
        self.save();
        true
    }

    /// Historical week records keep the account number; nothing is
    /// reconciled.
    pub fn remove_player(&mut self, id: &str) -> bool {
        let Some(idx) = self.players.iter().position(|p| p.id == id) else {
            return false;
        };
        self.players.remove(idx);
        self.save();
        true
    }

    // ── Weeks ─────────────────────────────────────────────────────

    pub fn weeks(&self) -> &[WeekLedger] {
        &self.weeks
    }

    pub fn week_count(&self) -> usize {
        self.weeks.len()
    }

    pub fn week(&self, id: &str) -> Option<&WeekLedger> {
        self.weeks.iter().find(|w| w.id == id)
    }

    fn week_index(&self, id: &str) -> Option<usize> {
        self.weeks.iter().position(|w| w.id == id)
    }

    pub fn active_week_id(&self) -> Option<&str> {
        self.active_week_id.as_deref()
    }

    pub fn active_week(&self) -> Option<&WeekLedger> {
        self.week(self.active_week_id.as_deref()?)
    }

    /// Weeks not yet closed (active or in review).
    pub fn open_weeks(&self) -> impl Iterator<Item = &WeekLedger> {
        self.weeks.iter().filter(|w| !w.is_closed())
    }

    pub fn closed_weeks(&self) -> impl Iterator<Item = &WeekLedger> {
        self.weeks.iter().filter(|w| w.is_closed())
    }

    /// Point at an existing week, or clear the pointer.
    pub fn set_active_week(&mut self, id: Option<&str>) -> bool {
        if let Some(id) = id {
            if self.week_index(id).is_none() {
                return false;
            }
        }
        self.active_week_id = id.map(str::to_string);
        self.save();
        true
    }

    fn new_week(&self, name: &str) -> WeekLedger {
        let now = self.clock.now();
        let end = now + Duration::days(self.config.week_length_days);
        WeekLedger::new(
            self.ids.next_id(),
            name,
            format_timestamp(now),
            format_timestamp(end),
            &format_timestamp(now),
        )
    }

    pub fn create_week(&mut self, name: &str) -> &WeekLedger {
        let week = self.new_week(name);
        self.weeks.push(week);
        self.save();
        &self.weeks[self.weeks.len() - 1]
    }

    /// Remove a week, clearing the active pointer and any chain links to it.
    pub fn delete_week(&mut self, id: &str) -> bool {
        let Some(idx) = self.week_index(id) else {
            return false;
        };
        self.weeks.remove(idx);
        for week in &mut self.weeks {
            if week.previous_week_id.as_deref() == Some(id) {
                week.previous_week_id = None;
            }
            if week.next_week_id.as_deref() == Some(id) {
                week.next_week_id = None;
            }
        }
        if self.active_week_id.as_deref() == Some(id) {
            self.active_week_id = None;
        }
        self.save();
        true
    }

    pub fn rename_week(&mut self, id: &str, name: &str) -> bool {
        let now = self.clock.timestamp();
        let Some(idx) = self.week_index(id) else {
            return false;
        };
        self.weeks[idx].name = name.to_string();
        self.weeks[idx].touch(&now);
        self.save();
        true
    }

    // ── Week membership & stakes ──────────────────────────────────

    /// Index of a week that still accepts stake edits.
    fn editable_week(&self, week_id: &str) -> Option<usize> {
        let idx = self.week_index(week_id)?;
        if self.weeks[idx].is_closed() {
            log::warn!("Week {week_id} is closed; edit ignored");
            return None;
        }
        Some(idx)
    }

    fn new_record(&self, name: &str, account_number: AccountNumber, now: &str) -> PlayerWeekRecord {
        let mut record = PlayerWeekRecord::new(self.ids.next_id(), name, account_number, now);
        let prior = self.player_by_account(account_number).map_or(0.0, |p| p.carry_balance());
        record.set_prior_carry_balance(prior, now);
        record
    }

    /// Add a player to a week. Returns the new record's id.
    pub fn add_player_to_week(
        &mut self,
        week_id: &str,
        name: &str,
        account_number: AccountNumber,
    ) -> Option<EntityId> {
        let idx = self.editable_week(week_id)?;
        let now = self.clock.timestamp();
        let record = self.new_record(name, account_number, &now);
        let id = record.id.clone();
        self.weeks[idx].add_player(record, &now);
        self.save();
        Some(id)
    }

    /// Copy every roster player not already in the week. Returns how many
    /// were added.
    pub fn add_roster_to_week(&mut self, week_id: &str) -> Option<usize> {
        let idx = self.editable_week(week_id)?;
        let now = self.clock.timestamp();
        let missing: Vec<PlayerWeekRecord> = self
            .players
            .iter()
            .filter(|p| self.weeks[idx].player_by_account(p.account_number).is_none())
            .map(|p| self.new_record(&p.name, p.account_number, &now))
            .collect();
        let added = missing.len();
        for record in missing {
            self.weeks[idx].add_player(record, &now);
        }
        if added > 0 {
            self.save();
        }
        Some(added)
    }

    pub fn remove_player_from_week(&mut self, week_id: &str, record_id: &str) -> bool {
        let Some(idx) = self.editable_week(week_id) else {
            return false;
        };
        let now = self.clock.timestamp();
        if self.weeks[idx].remove_player(record_id, &now).is_none() {
            return false;
        }
        self.save();
        true
    }

    fn edit_record(
        &mut self,
        idx: usize,
        record_id: &str,
        f: impl FnOnce(&mut PlayerWeekRecord, &str),
    ) -> bool {
        let now = self.clock.timestamp();
        if self.weeks[idx].update_player(record_id, &now, |r| f(r, &now)).is_none() {
            return false;
        }
        self.save();
        true
    }

    pub fn set_player_in(&mut self, week_id: &str, record_id: &str, amount: Money) -> bool {
        let Some(idx) = self.editable_week(week_id) else { return false };
        self.edit_record(idx, record_id, |r, now| r.set_in(amount, now))
    }

    pub fn set_player_out(&mut self, week_id: &str, record_id: &str, amount: Money) -> bool {
        let Some(idx) = self.editable_week(week_id) else { return false };
        self.edit_record(idx, record_id, |r, now| r.set_out(amount, now))
    }

    pub fn set_player_note(&mut self, week_id: &str, record_id: &str, note: &str) -> bool {
        let Some(idx) = self.editable_week(week_id) else { return false };
        self.edit_record(idx, record_id, |r, now| r.set_note(note, now))
    }

    // ── Close review ──────────────────────────────────────────────

    pub fn start_close(&mut self, week_id: &str) -> bool {
        let now = self.clock.timestamp();
        let Some(idx) = self.week_index(week_id) else { return false };
        if !self.weeks[idx].start_close(&now) {
            return false;
        }
        log::info!("Week {week_id} entered close review");
        self.save();
        true
    }

    pub fn cancel_close(&mut self, week_id: &str) -> bool {
        let now = self.clock.timestamp();
        let Some(idx) = self.week_index(week_id) else { return false };
        if !self.weeks[idx].cancel_close(&now) {
            return false;
        }
        log::info!("Week {week_id} close review cancelled");
        self.save();
        true
    }

    /// Index of a week in close review; payment statuses only move there.
    fn reviewing_week(&self, week_id: &str) -> Option<usize> {
        let idx = self.week_index(week_id)?;
        if !self.weeks[idx].is_pending_close() {
            log::warn!("Week {week_id} is not in close review; payment change ignored");
            return None;
        }
        Some(idx)
    }

    pub fn mark_player_paid(&mut self, week_id: &str, record_id: &str, amount: Option<Money>) -> bool {
        let Some(idx) = self.reviewing_week(week_id) else { return false };
        self.edit_record(idx, record_id, |r, now| r.mark_paid(amount, now))
    }

    pub fn mark_player_unpaid(&mut self, week_id: &str, record_id: &str) -> bool {
        let Some(idx) = self.reviewing_week(week_id) else { return false };
        self.edit_record(idx, record_id, |r, now| r.mark_unpaid(now))
    }

    pub fn mark_player_partial(&mut self, week_id: &str, record_id: &str, paid_amount: Money) -> bool {
        let Some(idx) = self.reviewing_week(week_id) else { return false };
        self.edit_record(idx, record_id, |r, now| r.mark_partial(paid_amount, now))
    }

    pub fn reset_player_payment(&mut self, week_id: &str, record_id: &str) -> bool {
        let Some(idx) = self.reviewing_week(week_id) else { return false };
        self.edit_record(idx, record_id, |r, now| r.reset_payment_status(now))
    }

    pub fn mark_all_paid(&mut self, week_id: &str) -> bool {
        let Some(idx) = self.reviewing_week(week_id) else { return false };
        let now = self.clock.timestamp();
        self.weeks[idx].mark_all_paid(&now);
        self.save();
        true
    }

    // ── Close / reopen ────────────────────────────────────────────

    /// Seal a week and push every unpaid remainder onto the roster.
    pub fn close_week_and_update_carries(&mut self, week_id: &str) -> bool {
        let Some(idx) = self.week_index(week_id) else { return false };
        if self.weeks[idx].is_closed() {
            return false;
        }
        let now = self.clock.timestamp();

        // A carried record nobody reviewed defaults to unpaid, so its carry
        // is not silently dropped. Must happen before carry_forward is read.
        let week = &mut self.weeks[idx];
        for record in week.players_mut() {
            if record.carried() && record.payment_status() == PaymentStatus::Pending {
                record.mark_unpaid(&now);
            }
        }
        week.calculate_totals();

        let carries: Vec<(AccountNumber, Money)> = week
            .players()
            .iter()
            .filter(|r| r.carry_forward() > 0.0)
            .map(|r| (r.account_number, r.carry_forward()))
            .collect();

        for (account, amount) in carries {
            match self.player_by_account_mut(account) {
                Some(player) => player.add_carry(amount),
                None => log::warn!("No roster player for account {account}; carry of {amount} not tracked"),
            }
        }

        self.weeks[idx].finalize_close(&now);
        log::info!("Week {week_id} closed");
        self.save();
        true
    }

    /// Undo a close: take this week's carries back off the roster, then
    /// reset every payment status and reactivate.
    pub fn reopen_week(&mut self, week_id: &str) -> bool {
        let Some(idx) = self.week_index(week_id) else { return false };
        if !self.weeks[idx].is_closed() {
            return false;
        }
        let now = self.clock.timestamp();

        // Read carry_forward while the statuses it depends on still exist.
        let carries: Vec<(AccountNumber, Money)> = self.weeks[idx]
            .players()
            .iter()
            .filter(|r| r.carry_forward() > 0.0)
            .map(|r| (r.account_number, r.carry_forward()))
            .collect();
        for (account, amount) in carries {
            if let Some(player) = self.player_by_account_mut(account) {
                player.remove_carry(amount);
            }
        }

        self.weeks[idx].unwind_close(&now);
        log::info!("Week {week_id} reopened");
        self.save();
        true
    }

    // ── Follow-on weeks ───────────────────────────────────────────

    /// Start the week after a closed one, seeded with its carries.
    pub fn create_next_week_from_closed(&mut self, closed_week_id: &str) -> Option<EntityId> {
        let src = self.week_index(closed_week_id)?;
        if !self.weeks[src].is_closed() {
            return None;
        }

        let name = format!("Week {}", self.weeks.len() + 1);
        let mut next = self.new_week(&name);
        let now = self.clock.timestamp();

        // Day after the source's end, pinned to a fixed hour.
        let source_end = parse_timestamp(&self.weeks[src].end).unwrap_or_else(|| self.clock.now());
        let anchor = NaiveTime::from_hms_opt(self.config.week_start_hour, 0, 0).unwrap_or_default();
        let start = (source_end.date_naive() + Duration::days(1))
            .and_time(anchor)
            .and_utc();
        next.start = format_timestamp(start);
        next.end = format_timestamp(start + Duration::days(self.config.week_length_days));

        next.previous_week_id = Some(self.weeks[src].id.clone());
        let next_id = next.id.clone();

        for carry in self.weeks[src].carry_forward_data() {
            let mut record = self.new_record(&carry.name, carry.account_number, &now);
            record.carry_over(carry.carry_amount, Some(closed_week_id.to_string()), &now);
            next.add_player(record, &now);
        }
        next.calculate_totals();

        self.weeks[src].next_week_id = Some(next_id.clone());
        self.weeks[src].touch(&now);
        self.weeks.push(next);
        self.active_week_id = Some(next_id.clone());
        log::info!("Created {name} from closed week {closed_week_id}");
        self.save();
        Some(next_id)
    }

    /// Copy a week's players into a fresh week with zero stakes. A nonzero
    /// result rides along as a carry of that raw result.
    pub fn duplicate_week(&mut self, id: &str, new_name: &str) -> Option<EntityId> {
        let src = self.week_index(id)?;
        let now = self.clock.timestamp();
        let mut copy = self.new_week(new_name);

        for source in self.weeks[src].players() {
            let mut record = self.new_record(&source.name, source.account_number, &now);
            if source.result() != 0.0 {
                record.carry_over(source.result(), Some(id.to_string()), &now);
            }
            copy.add_player(record, &now);
        }
        copy.calculate_totals();

        let copy_id = copy.id.clone();
        self.weeks.push(copy);
        self.save();
        Some(copy_id)
    }

    // ── Carry payments ────────────────────────────────────────────

    /// Lump-sum payment against an account's balance.
    pub fn record_carry_payment(
        &mut self,
        account_number: AccountNumber,
        amount: Money,
        note: &str,
    ) -> Option<CarryPayment> {
        self.apply_payment(account_number, amount, note, None)
    }

    /// Payment against the carry one specific week produced.
    pub fn record_week_carry_payment(
        &mut self,
        account_number: AccountNumber,
        week_id: &str,
        amount: Money,
        note: &str,
    ) -> Option<CarryPayment> {
        self.apply_payment(account_number, amount, note, Some(week_id.to_string()))
    }

    fn apply_payment(
        &mut self,
        account_number: AccountNumber,
        amount: Money,
        note: &str,
        week_id: Option<EntityId>,
    ) -> Option<CarryPayment> {
        let id = self.ids.next_id();
        let now = self.clock.timestamp();
        let payment = self
            .player_by_account_mut(account_number)?
            .record_payment(id, amount, note, week_id, &now);
        self.save();
        Some(payment)
    }

    pub fn pay_off_all_carry(&mut self, account_number: AccountNumber, note: &str) -> Option<CarryPayment> {
        let id = self.ids.next_id();
        let now = self.clock.timestamp();
        let payment = self
            .player_by_account_mut(account_number)?
            .pay_off_all(id, note, &now)?;
        self.save();
        Some(payment)
    }

    pub fn undo_carry_payment(&mut self, account_number: AccountNumber, payment_id: &str) -> Option<CarryPayment> {
        let removed = self
            .player_by_account_mut(account_number)?
            .remove_payment(payment_id)?;
        self.save();
        Some(removed)
    }

    // ── Reports ───────────────────────────────────────────────────

    pub fn running_balance(&self) -> RunningBalance {
        reports::running_balance(&self.weeks)
    }

    pub fn player_carry_breakdown(&self, account_number: AccountNumber) -> Option<PlayerCarryBreakdown> {
        let player = self.player_by_account(account_number)?;
        Some(reports::player_carry_breakdown(&self.weeks, player))
    }

    /// Sum of every roster balance.
    pub fn total_carry_outstanding(&self) -> Money {
        self.players.iter().map(|p| p.carry_balance()).sum()
    }
}
