//! In-process poker contract.
//!
//! Implements every ledger trait against a shared in-memory table registry so
//! the engine can be driven without a node. Reads, writes and subscriptions can
//! be scripted to fail or stall, and every read is counted, which is what the
//! integration tests lean on to observe refresh behaviour.

use super::{
    contract::{ContractCall, ContractReader, ContractSigner, EventSource, Receipt},
    errors::{LedgerError, LedgerResult},
    events::{EventKind, LedgerEvent},
    types::{Address, CiphertextHandle, TableId, TxHash},
};
use crate::{
    amount::Wei,
    table::{
        BettingInfo, CommunityCards, GameState, PlayerBettingState, TableStateRecord,
    },
};
use async_trait::async_trait;
use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};
use tokio::sync::{Mutex, mpsc};

/// Subscriber channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Minimum buy-in expressed in big blinds
const MIN_BUY_IN_BIG_BLINDS: Wei = 20;

/// Read calls that can be counted, delayed or failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadKind {
    TableState,
    BettingInfo,
    Players,
    PlayerBettingState,
    CommunityCards,
    TableWinner,
    HoleCards,
}

/// Parameters of a table inserted directly, bypassing `createTable`
#[derive(Debug, Clone)]
pub struct TableSetup {
    pub min_buy_in: Wei,
    pub max_players: u64,
    pub small_blind: Wei,
    pub big_blind: Wei,
}

impl Default for TableSetup {
    fn default() -> Self {
        Self {
            min_buy_in: 200_000_000_000_000_000,
            max_players: 6,
            small_blind: 5_000_000_000_000_000,
            big_blind: 10_000_000_000_000_000,
        }
    }
}

struct MemoryTable {
    record: TableStateRecord,
    small_blind: Wei,
    big_blind: Wei,
    winner: Option<Address>,
    betting: BettingInfo,
    players: Vec<Address>,
    player_states: HashMap<Address, PlayerBettingState>,
    community: Option<CommunityCards>,
    hole_cards: HashMap<Address, [CiphertextHandle; 2]>,
}

impl MemoryTable {
    fn new(setup: &TableSetup) -> Self {
        Self {
            record: TableStateRecord {
                state: GameState::Waiting,
                num_players: 0,
                max_players: setup.max_players,
                min_buy_in: setup.min_buy_in,
                countdown_start: 0,
                countdown_duration: 0,
                current_round: 0,
                is_seated: false,
            },
            small_blind: setup.small_blind,
            big_blind: setup.big_blind,
            winner: None,
            betting: BettingInfo {
                pot: 0,
                current_bet: 0,
                current_player: Address::zero(),
                current_player_index: 0,
            },
            players: Vec::new(),
            player_states: HashMap::new(),
            community: None,
            hole_cards: HashMap::new(),
        }
    }

    fn seat(&mut self, player: &Address, chips: Wei) {
        self.players.push(player.clone());
        self.player_states.insert(
            player.clone(),
            PlayerBettingState {
                chips,
                current_bet: 0,
                total_bet: 0,
                has_folded: false,
                has_acted: false,
                is_current_player: false,
            },
        );
        self.hole_cards.insert(
            player.clone(),
            [CiphertextHandle::random(), CiphertextHandle::random()],
        );
        self.record.num_players = self.players.len() as u64;
    }
}

#[derive(Default)]
struct LedgerState {
    tables: BTreeMap<TableId, MemoryTable>,
    next_table_id: TableId,
    block_number: u64,
    subscribers: Vec<mpsc::Sender<LedgerEvent>>,
    read_counts: HashMap<ReadKind, usize>,
    read_failures: HashMap<ReadKind, VecDeque<LedgerError>>,
    read_delays: HashMap<ReadKind, VecDeque<Duration>>,
    scripted_reverts: HashMap<&'static str, VecDeque<LedgerError>>,
    subscribe_failure: Option<LedgerError>,
    confirmation_delay: Duration,
    pending: HashMap<TxHash, LedgerResult<Vec<LedgerEvent>>>,
    submitted: Vec<(Address, ContractCall)>,
}

impl LedgerState {
    fn table(&self, table_id: TableId) -> LedgerResult<&MemoryTable> {
        self.tables
            .get(&table_id)
            .ok_or_else(|| LedgerError::reverted("TABLE_NOT_FOUND"))
    }

    fn table_mut(&mut self, table_id: TableId) -> LedgerResult<&mut MemoryTable> {
        self.tables
            .get_mut(&table_id)
            .ok_or_else(|| LedgerError::reverted("TABLE_NOT_FOUND"))
    }

    fn insert_table(&mut self, setup: &TableSetup) -> TableId {
        self.next_table_id += 1;
        let table_id = self.next_table_id;
        self.tables.insert(table_id, MemoryTable::new(setup));
        table_id
    }

    fn broadcast(&mut self, event: &LedgerEvent) {
        self.subscribers
            .retain(|sender| match sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("Event subscriber channel full, dropping {}", event.name());
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            });
    }

    /// Execute a mutation, returning the events it emits.
    fn apply(&mut self, sender: &Address, call: &ContractCall) -> LedgerResult<Vec<LedgerEvent>> {
        match call {
            ContractCall::CreateTable {
                min_buy_in,
                max_players,
                small_blind,
                big_blind,
            } => {
                if *min_buy_in == 0 {
                    return Err(LedgerError::reverted("INVALID_BUY_IN"));
                }
                if !(2..=10).contains(max_players) {
                    return Err(LedgerError::reverted("INVALID_MAX_PLAYERS"));
                }
                if big_blind <= small_blind {
                    return Err(LedgerError::reverted("INVALID_BLINDS"));
                }
                if *min_buy_in < big_blind.saturating_mul(MIN_BUY_IN_BIG_BLINDS) {
                    return Err(LedgerError::reverted("BUY_IN_TOO_LOW"));
                }
                let table_id = self.insert_table(&TableSetup {
                    min_buy_in: *min_buy_in,
                    max_players: *max_players,
                    small_blind: *small_blind,
                    big_blind: *big_blind,
                });
                Ok(vec![LedgerEvent::new(
                    table_id,
                    EventKind::TableCreated {
                        creator: sender.clone(),
                        min_buy_in: *min_buy_in,
                        max_players: *max_players,
                    },
                )])
            }

            ContractCall::JoinTable { table_id, buy_in } => {
                let table = self.table_mut(*table_id)?;
                if table.players.contains(sender) {
                    return Err(LedgerError::reverted("ALREADY_SEATED"));
                }
                if table.players.len() as u64 >= table.record.max_players {
                    return Err(LedgerError::reverted("TABLE_FULL"));
                }
                if *buy_in < table.record.min_buy_in {
                    return Err(LedgerError::reverted("INSUFFICIENT_BUY_IN"));
                }
                table.seat(sender, *buy_in);
                Ok(vec![LedgerEvent::new(
                    *table_id,
                    EventKind::PlayerJoined {
                        player: sender.clone(),
                        buy_in: *buy_in,
                    },
                )])
            }

            ContractCall::Fold { table_id }
            | ContractCall::Check { table_id }
            | ContractCall::Call { table_id }
            | ContractCall::Raise { table_id, .. } => {
                let table = self.table_mut(*table_id)?;
                if table.record.state != GameState::Playing {
                    return Err(LedgerError::reverted("GAME_NOT_PLAYING"));
                }
                let current_bet = table.betting.current_bet;
                let player = table
                    .player_states
                    .get_mut(sender)
                    .ok_or_else(|| LedgerError::reverted("NOT_SEATED"))?;
                player.has_acted = true;

                let kind = match call {
                    ContractCall::Fold { .. } => {
                        player.has_folded = true;
                        EventKind::PlayerFolded {
                            player: sender.clone(),
                        }
                    }
                    ContractCall::Check { .. } => EventKind::PlayerChecked {
                        player: sender.clone(),
                    },
                    ContractCall::Raise { amount, .. } => {
                        let target = current_bet.saturating_add(*amount);
                        let added = target.saturating_sub(player.current_bet);
                        player.chips = player.chips.saturating_sub(added);
                        player.current_bet = target;
                        player.total_bet = player.total_bet.saturating_add(added);
                        table.betting.current_bet = target;
                        table.betting.pot = table.betting.pot.saturating_add(added);
                        EventKind::PlayerRaised {
                            player: sender.clone(),
                            amount: *amount,
                        }
                    }
                    _ => {
                        let added = current_bet.saturating_sub(player.current_bet);
                        player.chips = player.chips.saturating_sub(added);
                        player.current_bet = current_bet;
                        player.total_bet = player.total_bet.saturating_add(added);
                        table.betting.pot = table.betting.pot.saturating_add(added);
                        EventKind::PlayerCalled {
                            player: sender.clone(),
                            amount: added,
                        }
                    }
                };
                Ok(vec![LedgerEvent::new(*table_id, kind)])
            }

            ContractCall::AdvanceGame { table_id } => {
                let table = self.table_mut(*table_id)?;
                match table.record.state {
                    GameState::Waiting | GameState::Countdown => {
                        if table.players.len() < 2 {
                            return Err(LedgerError::reverted("NOT_ENOUGH_PLAYERS"));
                        }
                        table.record.state = GameState::Playing;
                        table.record.current_round += 1;
                        table.betting = BettingInfo {
                            pot: table.small_blind.saturating_add(table.big_blind),
                            current_bet: table.big_blind,
                            current_player: table.players[0].clone(),
                            current_player_index: 0,
                        };
                        Ok(vec![LedgerEvent::new(
                            *table_id,
                            EventKind::GameStarted {
                                round: table.record.current_round,
                            },
                        )])
                    }
                    GameState::Playing | GameState::Finished => {
                        Err(LedgerError::reverted("CANNOT_ADVANCE"))
                    }
                }
            }

            ContractCall::StartNewRound { table_id } => {
                let table = self.table_mut(*table_id)?;
                if table.record.state != GameState::Finished {
                    return Err(LedgerError::reverted("GAME_NOT_FINISHED"));
                }
                table.record.state = GameState::Waiting;
                table.winner = None;
                table.community = None;
                Ok(Vec::new())
            }
        }
    }
}

/// Shared in-memory contract
#[derive(Clone)]
pub struct InMemoryLedger {
    address: Address,
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            state: Arc::new(Mutex::new(LedgerState::default())),
        }
    }

    /// Contract address this ledger answers for
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// A signer bound to `identity`
    pub fn signer(&self, identity: Address) -> MemorySigner {
        MemorySigner {
            ledger: self.clone(),
            identity,
        }
    }

    /// Insert a table without emitting events
    pub async fn insert_table(&self, setup: TableSetup) -> TableId {
        self.state.lock().await.insert_table(&setup)
    }

    /// Seat a player without emitting events
    pub async fn seat_player(&self, table_id: TableId, player: &Address, chips: Wei) -> LedgerResult<()> {
        let mut state = self.state.lock().await;
        state.table_mut(table_id)?.seat(player, chips);
        Ok(())
    }

    pub async fn update_table_state(
        &self,
        table_id: TableId,
        update: impl FnOnce(&mut TableStateRecord),
    ) -> LedgerResult<()> {
        let mut state = self.state.lock().await;
        update(&mut state.table_mut(table_id)?.record);
        Ok(())
    }

    pub async fn set_betting_info(&self, table_id: TableId, betting: BettingInfo) -> LedgerResult<()> {
        let mut state = self.state.lock().await;
        state.table_mut(table_id)?.betting = betting;
        Ok(())
    }

    pub async fn set_player_state(
        &self,
        table_id: TableId,
        player: &Address,
        player_state: PlayerBettingState,
    ) -> LedgerResult<()> {
        let mut state = self.state.lock().await;
        state
            .table_mut(table_id)?
            .player_states
            .insert(player.clone(), player_state);
        Ok(())
    }

    pub async fn set_community_cards(&self, table_id: TableId, cards: Option<CommunityCards>) -> LedgerResult<()> {
        let mut state = self.state.lock().await;
        state.table_mut(table_id)?.community = cards;
        Ok(())
    }

    /// Record a winner and mark the table finished
    pub async fn finish_game(&self, table_id: TableId, winner: &Address) -> LedgerResult<()> {
        let mut state = self.state.lock().await;
        let table = state.table_mut(table_id)?;
        table.record.state = GameState::Finished;
        table.winner = Some(winner.clone());
        Ok(())
    }

    pub async fn set_hole_cards(
        &self,
        table_id: TableId,
        player: &Address,
        handles: [CiphertextHandle; 2],
    ) -> LedgerResult<()> {
        let mut state = self.state.lock().await;
        state
            .table_mut(table_id)?
            .hole_cards
            .insert(player.clone(), handles);
        Ok(())
    }

    /// Push an event to every attached listener
    pub async fn emit(&self, event: LedgerEvent) {
        self.state.lock().await.broadcast(&event);
    }

    /// Fail the next read of `kind` with `error`
    pub async fn fail_next_read(&self, kind: ReadKind, error: LedgerError) {
        let mut state = self.state.lock().await;
        state.read_failures.entry(kind).or_default().push_back(error);
    }

    /// Stall the next read of `kind` for `delay`; the value returned is the
    /// one present when the read started
    pub async fn delay_next_read(&self, kind: ReadKind, delay: Duration) {
        let mut state = self.state.lock().await;
        state.read_delays.entry(kind).or_default().push_back(delay);
    }

    /// Revert the next submission of `method` with `reason`
    pub async fn revert_next(&self, method: &'static str, reason: &str) {
        let mut state = self.state.lock().await;
        state
            .scripted_reverts
            .entry(method)
            .or_default()
            .push_back(LedgerError::reverted(reason));
    }

    /// Fail the next subscription attempt
    pub async fn fail_next_subscribe(&self, error: LedgerError) {
        self.state.lock().await.subscribe_failure = Some(error);
    }

    /// Time between submission and receipt
    pub async fn set_confirmation_delay(&self, delay: Duration) {
        self.state.lock().await.confirmation_delay = delay;
    }

    pub async fn read_count(&self, kind: ReadKind) -> usize {
        self.state
            .lock()
            .await
            .read_counts
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }

    pub async fn submitted_calls(&self) -> Vec<(Address, ContractCall)> {
        self.state.lock().await.submitted.clone()
    }

    /// Listeners still attached
    pub async fn subscriber_count(&self) -> usize {
        let mut state = self.state.lock().await;
        state.subscribers.retain(|sender| !sender.is_closed());
        state.subscribers.len()
    }

    async fn read<T>(
        &self,
        kind: ReadKind,
        read: impl FnOnce(&LedgerState) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let (result, delay) = {
            let mut state = self.state.lock().await;
            *state.read_counts.entry(kind).or_default() += 1;
            let delay = state
                .read_delays
                .get_mut(&kind)
                .and_then(VecDeque::pop_front);
            let failure = state
                .read_failures
                .get_mut(&kind)
                .and_then(VecDeque::pop_front);
            let result = match failure {
                Some(error) => Err(error),
                None => read(&*state),
            };
            (result, delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

#[async_trait]
impl ContractReader for InMemoryLedger {
    async fn get_table_state(&self, table_id: TableId) -> LedgerResult<TableStateRecord> {
        self.read(ReadKind::TableState, |state| {
            Ok(state.table(table_id)?.record.clone())
        })
        .await
    }

    async fn get_betting_info(&self, table_id: TableId) -> LedgerResult<BettingInfo> {
        self.read(ReadKind::BettingInfo, |state| {
            Ok(state.table(table_id)?.betting.clone())
        })
        .await
    }

    async fn get_players(&self, table_id: TableId) -> LedgerResult<Vec<Address>> {
        self.read(ReadKind::Players, |state| {
            Ok(state.table(table_id)?.players.clone())
        })
        .await
    }

    async fn get_player_betting_state(
        &self,
        table_id: TableId,
        player: &Address,
    ) -> LedgerResult<PlayerBettingState> {
        self.read(ReadKind::PlayerBettingState, |state| {
            state
                .table(table_id)?
                .player_states
                .get(player)
                .cloned()
                .ok_or_else(|| LedgerError::reverted("NOT_SEATED"))
        })
        .await
    }

    async fn get_community_cards(&self, table_id: TableId) -> LedgerResult<CommunityCards> {
        self.read(ReadKind::CommunityCards, |state| {
            state
                .table(table_id)?
                .community
                .clone()
                .ok_or_else(|| LedgerError::reverted("COMMUNITY_CARDS_NOT_DEALT"))
        })
        .await
    }

    async fn get_table_winner(&self, table_id: TableId) -> LedgerResult<Option<Address>> {
        self.read(ReadKind::TableWinner, |state| {
            Ok(state.table(table_id)?.winner.clone())
        })
        .await
    }
}

#[async_trait]
impl EventSource for InMemoryLedger {
    async fn subscribe(&self, contract: &Address) -> LedgerResult<mpsc::Receiver<LedgerEvent>> {
        let mut state = self.state.lock().await;
        if let Some(error) = state.subscribe_failure.take() {
            return Err(error);
        }
        if contract != &self.address {
            return Err(LedgerError::Subscription(format!(
                "no contract deployed at {contract}"
            )));
        }
        let (sender, receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        state.subscribers.push(sender);
        Ok(receiver)
    }
}

/// Signer view of an [`InMemoryLedger`]
#[derive(Clone)]
pub struct MemorySigner {
    ledger: InMemoryLedger,
    identity: Address,
}

#[async_trait]
impl ContractSigner for MemorySigner {
    fn identity(&self) -> &Address {
        &self.identity
    }

    async fn submit(&self, call: ContractCall) -> LedgerResult<TxHash> {
        let mut state = self.ledger.state.lock().await;
        state.submitted.push((self.identity.clone(), call.clone()));

        let scripted = state
            .scripted_reverts
            .get_mut(call.method())
            .and_then(VecDeque::pop_front);
        let outcome = match scripted {
            Some(error) => Err(error),
            None => state.apply(&self.identity, &call),
        };

        let tx_hash = TxHash::random();
        state.pending.insert(tx_hash, outcome);
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> LedgerResult<Receipt> {
        let delay = self.ledger.state.lock().await.confirmation_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.ledger.state.lock().await;
        let events = state
            .pending
            .remove(&tx_hash)
            .ok_or(LedgerError::Dropped(tx_hash))??;

        state.block_number += 1;
        for event in &events {
            state.broadcast(event);
        }
        Ok(Receipt {
            tx_hash,
            block_number: state.block_number,
            events,
        })
    }

    async fn get_my_hole_cards(&self, table_id: TableId) -> LedgerResult<[CiphertextHandle; 2]> {
        let identity = self.identity.clone();
        self.ledger
            .read(ReadKind::HoleCards, move |state| {
                state
                    .table(table_id)?
                    .hole_cards
                    .get(&identity)
                    .copied()
                    .ok_or_else(|| LedgerError::reverted("NOT_SEATED"))
            })
            .await
    }
}
