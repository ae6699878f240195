//! Remote reads that populate the [`TableCache`].
//!
//! Every fetch writes into the cache and returns nothing. A failed read is
//! logged and leaves that field at its previous value; the other fields of the
//! same refresh still land.

use super::{
    cache::{RefreshTicket, TableCache},
    models::{CommunityCards, GameState, TableSnapshot},
};
use crate::ledger::{Address, ContractReader, TableId};
use futures_util::future::join_all;
use std::{collections::HashMap, sync::Arc};

/// Reads table data from the contract into the cache
#[derive(Clone)]
pub struct RemoteTableReader {
    contract: Option<Arc<dyn ContractReader>>,
    cache: Arc<TableCache>,
}

impl RemoteTableReader {
    /// Create a new reader.
    ///
    /// # Arguments
    ///
    /// * `contract` - Contract binding; every fetch is a silent no-op without one
    /// * `cache` - Cache the results are written to
    pub fn new(contract: Option<Arc<dyn ContractReader>>, cache: Arc<TableCache>) -> Self {
        Self { contract, cache }
    }

    pub fn is_configured(&self) -> bool {
        self.contract.is_some()
    }

    pub fn cache(&self) -> &Arc<TableCache> {
        &self.cache
    }

    /// Fetch everything for `table_id`.
    ///
    /// Table state, betting info, players and community cards are read
    /// concurrently. Per-player betting states are read once the player list
    /// resolves; if that read failed, the cached list is used instead.
    pub async fn refresh_all(&self, table_id: TableId) {
        let Some((contract, ticket)) = self.prepare(table_id).await else {
            return;
        };
        let contract = contract.as_ref();
        log::debug!("Table {}: refresh #{} started", table_id, ticket.seq());

        let (_, _, players, _) = tokio::join!(
            self.load_table_state(contract, &ticket),
            self.load_betting_info(contract, &ticket),
            self.load_players(contract, &ticket),
            self.load_community_cards(contract, &ticket),
        );

        let players = match players {
            Some(players) => players,
            None => self.cache.players().await,
        };
        self.load_all_player_states(contract, &ticket, &players).await;

        log::debug!("Table {}: refresh #{} finished", table_id, ticket.seq());
    }

    pub async fn fetch_table_state(&self, table_id: TableId) {
        if let Some((contract, ticket)) = self.prepare(table_id).await {
            self.load_table_state(contract.as_ref(), &ticket).await;
        }
    }

    pub async fn fetch_betting_info(&self, table_id: TableId) {
        if let Some((contract, ticket)) = self.prepare(table_id).await {
            self.load_betting_info(contract.as_ref(), &ticket).await;
        }
    }

    pub async fn fetch_players(&self, table_id: TableId) {
        if let Some((contract, ticket)) = self.prepare(table_id).await {
            self.load_players(contract.as_ref(), &ticket).await;
        }
    }

    pub async fn fetch_player_state(&self, table_id: TableId, player: &Address) {
        let Some((contract, ticket)) = self.prepare(table_id).await else {
            return;
        };
        match contract.get_player_betting_state(table_id, player).await {
            Ok(state) => {
                self.cache
                    .apply_player_state(&ticket, player.clone(), state)
                    .await;
            }
            Err(e) => log::warn!("Table {}: failed to fetch state of {}: {}", table_id, player, e),
        }
    }

    /// Fetch the betting state of every listed player and replace the mapping.
    pub async fn fetch_all_player_states(&self, table_id: TableId, players: &[Address]) {
        if let Some((contract, ticket)) = self.prepare(table_id).await {
            self.load_all_player_states(contract.as_ref(), &ticket, players)
                .await;
        }
    }

    pub async fn fetch_community_cards(&self, table_id: TableId) {
        if let Some((contract, ticket)) = self.prepare(table_id).await {
            self.load_community_cards(contract.as_ref(), &ticket).await;
        }
    }

    async fn prepare(&self, table_id: TableId) -> Option<(Arc<dyn ContractReader>, RefreshTicket)> {
        let contract = self.contract.clone()?;
        match self.cache.begin_refresh(table_id).await {
            Some(ticket) => Some((contract, ticket)),
            None => {
                log::debug!("Table {}: not tracked, skipping fetch", table_id);
                None
            }
        }
    }

    async fn load_table_state(&self, contract: &dyn ContractReader, ticket: &RefreshTicket) {
        let table_id = ticket.table_id;
        let record = match contract.get_table_state(table_id).await {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Table {}: failed to fetch table state: {}", table_id, e);
                return;
            }
        };

        let winner = if record.state == GameState::Finished {
            match contract.get_table_winner(table_id).await {
                Ok(winner) => winner.filter(|w| !w.is_zero()),
                Err(e) => {
                    log::warn!("Table {}: failed to fetch winner: {}", table_id, e);
                    None
                }
            }
        } else {
            None
        };

        self.cache
            .apply_table_state(ticket, TableSnapshot::from_record(table_id, record, winner))
            .await;
    }

    async fn load_betting_info(&self, contract: &dyn ContractReader, ticket: &RefreshTicket) {
        match contract.get_betting_info(ticket.table_id).await {
            Ok(betting) => {
                self.cache.apply_betting_info(ticket, betting).await;
            }
            Err(e) => log::warn!("Table {}: failed to fetch betting info: {}", ticket.table_id, e),
        }
    }

    async fn load_players(
        &self,
        contract: &dyn ContractReader,
        ticket: &RefreshTicket,
    ) -> Option<Vec<Address>> {
        match contract.get_players(ticket.table_id).await {
            Ok(players) => {
                self.cache.apply_players(ticket, players.clone()).await;
                Some(players)
            }
            Err(e) => {
                log::warn!("Table {}: failed to fetch players: {}", ticket.table_id, e);
                None
            }
        }
    }

    async fn load_community_cards(&self, contract: &dyn ContractReader, ticket: &RefreshTicket) {
        let cards = match contract.get_community_cards(ticket.table_id).await {
            Ok(cards) => cards,
            Err(e) if e.is_not_dealt() => CommunityCards::not_dealt(),
            Err(e) => {
                log::warn!("Table {}: failed to fetch community cards: {}", ticket.table_id, e);
                return;
            }
        };
        self.cache.apply_community_cards(ticket, cards).await;
    }

    async fn load_all_player_states(
        &self,
        contract: &dyn ContractReader,
        ticket: &RefreshTicket,
        players: &[Address],
    ) {
        let table_id = ticket.table_id;
        let results = join_all(players.iter().map(|player| async move {
            (player, contract.get_player_betting_state(table_id, player).await)
        }))
        .await;

        let mut states = HashMap::with_capacity(results.len());
        for (player, result) in results {
            match result {
                Ok(state) => {
                    states.insert(player.clone(), state);
                }
                Err(e) => {
                    log::warn!("Table {}: failed to fetch state of {}: {}", table_id, player, e)
                }
            }
        }
        self.cache.apply_player_states(ticket, states).await;
    }
}
