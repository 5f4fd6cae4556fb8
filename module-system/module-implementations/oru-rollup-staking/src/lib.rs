pub mod call;
pub mod genesis;
pub mod registry;
#[cfg(feature = "native")]
pub mod query;


use core::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use oru_bank::Amount;
use oru_modules_api::{Error, Hasher, ModuleInfo, Prefix};
use oru_state::WorkingSet;

pub use genesis::RollupStakingConfig;

/// A rollup block height, re-exported for callers composing this module.
pub type Level = oru_chain_state::Level;

/// The digest identifying a commitment. Computed over the borsh encoding of
/// the commitment tuple.
#[derive(
    Debug,
    Default,
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
pub struct CommitmentHash([u8; 32]);

impl CommitmentHash {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<[u8; 32]> for CommitmentHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for CommitmentHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for CommitmentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// An opaque claim about the rollup state, produced by the PVM and never
/// interpreted here.
#[derive(
    Debug,
    Default,
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
pub struct StateHash([u8; 32]);

impl StateHash {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for StateHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for StateHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// A compact per-rollup staker identifier. Allocated monotonically and never
/// reused, so historical stake references stay unambiguous.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    BorshDeserialize,
    BorshSerialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct StakerIndex(pub u64);

impl fmt::Display for StakerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A claim that processing the inbox up to `inbox_level` brings the rollup
/// to `compressed_state` after `number_of_ticks` ticks, starting from the
/// state claimed by `predecessor`.
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
pub struct Commitment {
    pub predecessor: CommitmentHash,
    pub inbox_level: Level,
    pub compressed_state: StateHash,
    pub number_of_ticks: u64,
}

impl Commitment {
    /// The identity of a commitment is the digest of its borsh encoding.
    pub fn hash<H: Hasher>(&self) -> CommitmentHash {
        let bytes = self
            .try_to_vec()
            .expect("Commitment serialization cannot fail");
        CommitmentHash(H::digest(bytes))
    }
}

/// A (hash, inbox level) pair locating a commitment in the tree. Used both
/// for the last cemented commitment and for per-staker stake pointers.
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
pub struct CommitmentPointer {
    pub hash: CommitmentHash,
    pub inbox_level: Level,
}

/// Economic constants of the rollup, fixed at genesis.
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
pub struct RollupConstants {
    /// The bond frozen per staker.
    pub stake_amount: Amount,
    /// Blocks between a commitment's inbox level and its predecessor's.
    pub commitment_period: u64,
    /// Minimum age (in blocks) a commitment must reach before cementing;
    /// also the curfew for fresh publications at a level.
    pub challenge_window: u64,
    /// Maximum distance between a new commitment and the last cemented one.
    pub max_lookahead: u64,
    /// Sections per dissection move in the refutation game.
    pub number_of_sections: u64,
    /// How many cemented commitments are retained for delayed effects.
    pub cemented_commitments_kept: u64,
}

/// The oru-rollup-staking module owns the commitment tree, the last cemented
/// commitment pointer, staker bonds, and the staker index registry. Stakers
/// deposit a bond, publish commitments that extend the tree, and cement the
/// unique undisputed child of the LCC once its challenge window has passed.
#[derive(Clone)]
pub struct RollupStaking<C: oru_modules_api::Context> {
    /// The address of the oru-rollup-staking module.
    pub(crate) address: C::Address,

    /// Economic constants, set once at genesis.
    pub(crate) constants: oru_state::StateValue<RollupConstants>,

    /// The last cemented commitment: the canonical root of all future
    /// commitments.
    pub(crate) last_cemented: oru_state::StateValue<CommitmentPointer>,

    /// Every live commitment, cemented or pending, keyed by hash.
    pub(crate) commitments: oru_state::StateMap<CommitmentHash, Commitment>,

    /// The block level at which a commitment was first published, for the
    /// challenge-window aging check at cement time.
    pub(crate) commitment_added_level: oru_state::StateMap<CommitmentHash, Level>,

    /// The block level of the first publication at a given inbox level, for
    /// the curfew check.
    pub(crate) first_publication_level: oru_state::StateMap<Level, Level>,

    /// The stakers of each commitment. A bounded, insertion-ordered sequence
    /// scanned linearly; cardinality is capped by the active staker count,
    /// so a hash set would buy nothing and cost predictability.
    pub(crate) commitment_stakers: oru_state::StateMap<CommitmentHash, Vec<StakerIndex>>,

    /// The commitments published at each inbox level. Same bounded-sequence
    /// pattern as `commitment_stakers`.
    pub(crate) commitments_at_inbox_level: oru_state::StateMap<Level, Vec<CommitmentHash>>,

    /// Retention ring of cemented commitments, keyed by a monotone sequence
    /// number in `oldest_cemented..next_cemented`.
    pub(crate) cemented_commitments: oru_state::StateMap<u64, CommitmentHash>,
    pub(crate) oldest_cemented: oru_state::StateValue<u64>,
    pub(crate) next_cemented: oru_state::StateValue<u64>,

    /// Registry: address to index, allocated on first deposit.
    pub(crate) staker_indexes: oru_state::StateMap<C::Address, StakerIndex>,

    /// Registry: index back to address.
    pub(crate) staker_addresses: oru_state::StateMap<StakerIndex, C::Address>,

    /// Registry: the next index to allocate. Indices are never reused.
    pub(crate) next_staker_index: oru_state::StateValue<u64>,

    /// Registry: the indices of stakers not yet withdrawn or slashed.
    pub(crate) active_stakers: oru_state::StateVec<StakerIndex>,

    /// Per staker, the newest commitment it stakes on.
    pub(crate) staked_commitments: oru_state::StateMap<StakerIndex, CommitmentPointer>,

    /// Reference to the bank module holding balances and bonds.
    pub(crate) bank: oru_bank::Bank<C>,

    /// Reference to the chain-state module supplying the current level.
    pub(crate) chain_state: oru_chain_state::ChainState<C>,
}

impl<C: oru_modules_api::Context> Default for RollupStaking<C> {
    fn default() -> Self {
        let new_prefix =
            |storage_name: &str| Prefix::new_storage(module_path!(), "RollupStaking", storage_name);
        Self {
            address: oru_modules_api::module_address::<C>(module_path!(), "RollupStaking"),
            constants: oru_state::StateValue::new(new_prefix("constants").into()),
            last_cemented: oru_state::StateValue::new(new_prefix("last_cemented").into()),
            commitments: oru_state::StateMap::new(new_prefix("commitments").into()),
            commitment_added_level: oru_state::StateMap::new(
                new_prefix("commitment_added_level").into(),
            ),
            first_publication_level: oru_state::StateMap::new(
                new_prefix("first_publication_level").into(),
            ),
            commitment_stakers: oru_state::StateMap::new(new_prefix("commitment_stakers").into()),
            commitments_at_inbox_level: oru_state::StateMap::new(
                new_prefix("commitments_at_inbox_level").into(),
            ),
            cemented_commitments: oru_state::StateMap::new(
                new_prefix("cemented_commitments").into(),
            ),
            oldest_cemented: oru_state::StateValue::new(new_prefix("oldest_cemented").into()),
            next_cemented: oru_state::StateValue::new(new_prefix("next_cemented").into()),
            staker_indexes: oru_state::StateMap::new(new_prefix("staker_indexes").into()),
            staker_addresses: oru_state::StateMap::new(new_prefix("staker_addresses").into()),
            next_staker_index: oru_state::StateValue::new(new_prefix("next_staker_index").into()),
            active_stakers: oru_state::StateVec::new(new_prefix("active_stakers").into()),
            staked_commitments: oru_state::StateMap::new(new_prefix("staked_commitments").into()),
            bank: oru_bank::Bank::default(),
            chain_state: oru_chain_state::ChainState::default(),
        }
    }
}

impl<C: oru_modules_api::Context> ModuleInfo for RollupStaking<C> {
    type Context = C;

    fn address(&self) -> &C::Address {
        &self.address
    }
}

impl<C: oru_modules_api::Context> oru_modules_api::Module for RollupStaking<C> {
    type Context = C;

    type Config = RollupStakingConfig;

    type CallMessage = call::CallMessage;

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
            call::CallMessage::DepositStake => self.deposit_stake(context, working_set),
            call::CallMessage::Publish(commitment) => {
                self.publish(commitment, context, working_set)
            }
            call::CallMessage::Cement(hash) => self.cement(hash, working_set),
            call::CallMessage::WithdrawStake => self.withdraw_stake(context, working_set),
        }
        .map_err(|e| Error::ModuleError(e.into()))
    }
}

impl<C: oru_modules_api::Context> RollupStaking<C> {
    /// Looks up a commitment by hash. Returns [`None`] for commitments that
    /// were deallocated as dangling siblings or pruned from the retention
    /// ring.
    pub fn get_commitment(
        &self,
        hash: &CommitmentHash,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Option<Commitment> {
        self.commitments.get(hash, working_set)
    }

    /// The last cemented commitment pointer.
    pub fn last_cemented(
        &self,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Option<CommitmentPointer> {
        self.last_cemented.get(working_set)
    }

    /// The economic constants fixed at genesis.
    pub fn constants(
        &self,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Option<RollupConstants> {
        self.constants.get(working_set)
    }
}
