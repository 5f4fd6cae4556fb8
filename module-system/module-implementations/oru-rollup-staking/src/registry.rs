//! The staker index registry. Indices are small integers allocated
//! monotonically per rollup, so the per-commitment staker sets stay cheap to
//! store and scan. An index is never handed out twice.

use oru_state::WorkingSet;

use crate::{CommitmentPointer, RollupStaking, StakerIndex};

impl<C: oru_modules_api::Context> RollupStaking<C> {
    /// Allocates the next staker index for `address` and records the
    /// two-way mapping. Callers must have checked that the address has no
    /// index yet.
    pub(crate) fn fresh_index(
        &self,
        address: &C::Address,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> StakerIndex {
        let next = self.next_staker_index.get(working_set).unwrap_or_default();
        let index = StakerIndex(next);
        self.staker_indexes.set(address, &index, working_set);
        self.staker_addresses.set(&index, address, working_set);
        self.next_staker_index.set(&(next + 1), working_set);
        index
    }

    /// Whether the staker behind `index` has neither withdrawn nor been
    /// slashed. Linear scan over the bounded active sequence.
    pub fn is_active(&self, index: StakerIndex, working_set: &mut WorkingSet<C::Storage>) -> bool {
        self.active_stakers
            .iter(working_set)
            .any(|active| active == index)
    }

    /// All currently active staker indices, in activation order.
    pub fn list_active(&self, working_set: &mut WorkingSet<C::Storage>) -> Vec<StakerIndex> {
        self.active_stakers.iter(working_set).collect()
    }

    /// The index allocated to `address`, if it ever deposited.
    pub fn staker_index(
        &self,
        address: &C::Address,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Option<StakerIndex> {
        self.staker_indexes.get(address, working_set)
    }

    /// The address behind `index`.
    pub fn staker_address(
        &self,
        index: StakerIndex,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Option<C::Address> {
        self.staker_addresses.get(&index, working_set)
    }

    /// The newest commitment `index` stakes on.
    pub fn staked_commitment(
        &self,
        index: StakerIndex,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Option<CommitmentPointer> {
        self.staked_commitments.get(&index, working_set)
    }

    /// Whether `index` appears in the staker sequence of `hash`. Used to
    /// check conflicts when a refutation game starts.
    pub fn is_staked_on(
        &self,
        index: StakerIndex,
        hash: &crate::CommitmentHash,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> bool {
        self.commitment_stakers
            .get(hash, working_set)
            .unwrap_or_default()
            .contains(&index)
    }

    pub(crate) fn activate(&self, index: StakerIndex, working_set: &mut WorkingSet<C::Storage>) {
        if !self.is_active(index, working_set) {
            self.active_stakers.push(&index, working_set);
        }
    }

    pub(crate) fn deactivate(&self, index: StakerIndex, working_set: &mut WorkingSet<C::Storage>) {
        let remaining: Vec<StakerIndex> = self
            .active_stakers
            .iter(working_set)
            .filter(|active| *active != index)
            .collect();
        self.active_stakers.set_all(remaining, working_set);
    }
}
