pub mod call;
pub mod genesis;
#[cfg(feature = "native")]
pub mod query;

#[cfg(test)]
mod tests;

use std::marker::PhantomData;

use borsh::{BorshDeserialize, BorshSerialize};
use oru_modules_api::{Error, ModuleInfo, Prefix};
use oru_rollup_staking::{Level, StakerIndex, StateHash};
use oru_state::WorkingSet;

pub use genesis::RefutationConfig;

/// Verifies a single-tick execution proof against the agreed pre-state.
/// Implemented outside this module by the PVM; the dispute logic only ever
/// consumes proofs, it never produces them.
pub trait ProofVerifier {
    /// Checks `proof` starting from `start` and returns the computed
    /// post-state. An error means the proof itself is malformed or does not
    /// apply to `start`.
    fn verify(proof: &[u8], start: &StateHash) -> anyhow::Result<StateHash>;
}

/// One boundary of a dissection: the claimed state after `tick` ticks.
/// `None` means the mover claims the machine cannot be advanced to this
/// tick at all.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    BorshDeserialize,
    BorshSerialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct DissectionChunk {
    pub state: Option<StateHash>,
    pub tick: u64,
}

/// The two seats of a game. `Alice` is always the lower staker index, so a
/// game's identity does not depend on who opened it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    BorshDeserialize,
    BorshSerialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum Player {
    Alice,
    Bob,
}

impl Player {
    fn other(self) -> Self {
        match self {
            Player::Alice => Player::Bob,
            Player::Bob => Player::Alice,
        }
    }
}

/// A running refutation game between two stakers. The dissection always
/// spans the currently disputed tick range: its first chunk is the last
/// point of agreement and its final chunk carries the claim under dispute.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    BorshDeserialize,
    BorshSerialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct RefutationGame {
    pub alice: StakerIndex,
    pub bob: StakerIndex,
    pub turn: Player,
    pub dissection: Vec<DissectionChunk>,
    pub move_deadline: Level,
}

impl RefutationGame {
    pub fn player(&self, seat: Player) -> StakerIndex {
        match seat {
            Player::Alice => self.alice,
            Player::Bob => self.bob,
        }
    }

    fn seat_of(&self, index: StakerIndex) -> Option<Player> {
        if index == self.alice {
            Some(Player::Alice)
        } else if index == self.bob {
            Some(Player::Bob)
        } else {
            None
        }
    }
}

/// The identity of a game: the unordered pair of its players, normalized so
/// each pair can have at most one open game.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    BorshDeserialize,
    BorshSerialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct GameKey {
    alice: StakerIndex,
    bob: StakerIndex,
}

impl GameKey {
    pub fn new(a: StakerIndex, b: StakerIndex) -> Self {
        if a <= b {
            Self { alice: a, bob: b }
        } else {
            Self { alice: b, bob: a }
        }
    }

    pub fn alice(&self) -> StakerIndex {
        self.alice
    }

    pub fn bob(&self) -> StakerIndex {
        self.bob
    }
}

/// Why a game ended. Every termination path goes through exactly one of
/// these variants; there is no other way for a game to leave storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// The loser proposed a dissection violating the edge policy.
    InvalidMove,
    /// The loser supplied a proof that did not check out.
    ProofRejected,
    /// The loser let its move deadline pass.
    Timeout,
    /// A valid proof settled the disputed tick.
    ConflictResolved,
}

/// The result of a resolved game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub winner: StakerIndex,
    pub loser: StakerIndex,
    pub reason: Reason,
}

/// The oru-refutation module runs dissection games between stakers
/// committed to conflicting commitments. Losing a game burns the loser's
/// bond through the staking module; winning leaves the winner untouched and
/// never cements anything by itself.
pub struct Refutation<C: oru_modules_api::Context, Vm: ProofVerifier> {
    /// The address of the oru-refutation module.
    pub(crate) address: C::Address,

    /// Open games, at most one per unordered staker pair.
    pub(crate) games: oru_state::StateMap<GameKey, RefutationGame>,

    /// Blocks a player has to move before anyone may call timeout.
    pub(crate) timeout_period: oru_state::StateValue<u64>,

    /// Reference to the staking module holding commitments and bonds.
    pub(crate) staking: oru_rollup_staking::RollupStaking<C>,

    /// Reference to the chain-state module supplying the current level.
    pub(crate) chain_state: oru_chain_state::ChainState<C>,

    _verifier: PhantomData<fn() -> Vm>,
}

impl<C: oru_modules_api::Context, Vm: ProofVerifier> Default for Refutation<C, Vm> {
    fn default() -> Self {
        Self {
            address: oru_modules_api::module_address::<C>(module_path!(), "Refutation"),
            games: oru_state::StateMap::new(
                Prefix::new_storage(module_path!(), "Refutation", "games").into(),
            ),
            timeout_period: oru_state::StateValue::new(
                Prefix::new_storage(module_path!(), "Refutation", "timeout_period").into(),
            ),
            staking: oru_rollup_staking::RollupStaking::default(),
            chain_state: oru_chain_state::ChainState::default(),
            _verifier: PhantomData,
        }
    }
}

impl<C: oru_modules_api::Context, Vm: ProofVerifier> ModuleInfo for Refutation<C, Vm> {
    type Context = C;

    fn address(&self) -> &C::Address {
        &self.address
    }
}

impl<C: oru_modules_api::Context, Vm: ProofVerifier> oru_modules_api::Module for Refutation<C, Vm> {
    type Context = C;

    type Config = RefutationConfig;

    type CallMessage = call::CallMessage<C>;

    fn genesis(
        &self,
        config: &Self::Config,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<(), Error> {
        Ok(self.init_module(config, working_set)?)
    }

    fn call(
        &self,
        msg: Self::CallMessage,
        context: &Self::Context,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<oru_modules_api::CallResponse, Error> {
        match msg {
            call::CallMessage::StartGame {
                opponent,
                player_commitment,
                opponent_commitment,
            } => self
                .start_game(
                    &opponent,
                    player_commitment,
                    opponent_commitment,
                    context,
                    working_set,
                )
                .map(|_| oru_modules_api::CallResponse::default()),
            call::CallMessage::Move {
                opponent,
                game_move,
            } => self
                .apply_move(&opponent, game_move, context, working_set)
                .map(|_| oru_modules_api::CallResponse::default()),
            call::CallMessage::Timeout { player_a, player_b } => self
                .timeout(&player_a, &player_b, working_set)
                .map(|_| oru_modules_api::CallResponse::default()),
        }
        .map_err(|e| Error::ModuleError(e.into()))
    }
}

impl<C: oru_modules_api::Context, Vm: ProofVerifier> Refutation<C, Vm> {
    /// The open game between two staker indices, if any.
    pub fn game(
        &self,
        a: StakerIndex,
        b: StakerIndex,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Option<RefutationGame> {
        self.games.get(&GameKey::new(a, b), working_set)
    }
}
