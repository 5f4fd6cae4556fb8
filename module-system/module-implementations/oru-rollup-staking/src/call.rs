use oru_bank::BalanceUpdate;
use oru_modules_api::CallResponse;
use oru_state::WorkingSet;
use thiserror::Error;

use crate::{Commitment, CommitmentHash, CommitmentPointer, Level, RollupStaking, StakerIndex};

/// This enumeration represents the available call messages for interacting
/// with the oru-rollup-staking module.
#[derive(borsh::BorshDeserialize, borsh::BorshSerialize, Debug, PartialEq, Clone)]
pub enum CallMessage {
    /// Freezes the rollup's stake amount from the sender's balance and
    /// activates it as a staker anchored at the last cemented commitment.
    DepositStake,
    /// Publishes a commitment and advances the sender's stake onto it.
    Publish(Commitment),
    /// Cements the unique undisputed child of the last cemented commitment.
    Cement(CommitmentHash),
    /// Releases the sender's bond. Only permitted once the sender's stake
    /// sits at or before the last cemented commitment.
    WithdrawStake,
}

/// Errors raised by staking and cementation operations. All abort the
/// enclosing transaction with no state change.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StakingError {
    #[error("Commitments must have a non-zero number of ticks")]
    ZeroTickCommitment,
    #[error("Predecessor commitment {0} is not known")]
    PredecessorNotFound(CommitmentHash),
    #[error("Commitment inbox level {found} is not one commitment period after its predecessor (expected {expected})")]
    BadInboxLevel { expected: Level, found: Level },
    #[error("Commitment inbox level {found} exceeds the lookahead limit {limit}")]
    TooFarAhead { limit: Level, found: Level },
    #[error("The curfew for publishing at inbox level {0} has passed")]
    CommitmentPastCurfew(Level),
    #[error("Commitment inbox level {inbox_level} has not been reached yet (current level {current_level})")]
    CommitmentFromFuture {
        inbox_level: Level,
        current_level: Level,
    },
    #[error("The staker may only advance its stake along a single branch")]
    StakerBacktracked,
    #[error("The sender's balance is below the required stake amount")]
    StakerFundsTooLow,
    #[error("The sender is not an active staker")]
    NotStaked,
    #[error("The sender already holds an active stake")]
    AlreadyStaked,
    #[error("Withdrawal requires the stake to sit on the last cemented commitment or an ancestor")]
    NotStakedOnLccOrAncestor,
    #[error("Commitment {0} is not known")]
    CommitmentNotFound(CommitmentHash),
    #[error("The commitment's predecessor is not the last cemented commitment")]
    ParentNotLcc,
    #[error("The commitment's challenge window ends at level {cementable_at} (current level {current_level})")]
    CommitmentTooRecent {
        cementable_at: Level,
        current_level: Level,
    },
    #[error("Several active commitments exist at this inbox level")]
    Disputed,
    #[error("A different commitment is the active candidate at this inbox level")]
    InvalidCommitmentToCement,
    #[error("No staker is registered under index {0}")]
    UnknownStakerIndex(StakerIndex),
    #[error("The rollup staking module has not been initialized")]
    NotInitialized,
}

impl<C: oru_modules_api::Context> RollupStaking<C> {
    pub(crate) fn deposit_stake(
        &self,
        context: &C,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<CallResponse, StakingError> {
        let sender = context.sender();
        let existing = self.staker_indexes.get(sender, working_set);
        if let Some(index) = existing {
            if self.is_active(index, working_set) {
                return Err(StakingError::AlreadyStaked);
            }
        }

        let constants = self
            .constants
            .get(working_set)
            .ok_or(StakingError::NotInitialized)?;
        let lcc = self
            .last_cemented
            .get(working_set)
            .ok_or(StakingError::NotInitialized)?;

        let update = self
            .bank
            .freeze(sender, constants.stake_amount, working_set)
            .map_err(|_| StakingError::StakerFundsTooLow)?;

        // A withdrawn staker that returns keeps its old index; fresh stakers
        // get the next one. Either way no index is ever handed to a second
        // address.
        let index = match existing {
            Some(index) => index,
            None => self.fresh_index(sender, working_set),
        };
        self.activate(index, working_set);
        self.staked_commitments.set(&index, &lcc, working_set);

        self.emit_bond_event(working_set, "Stake deposited", index, &update);
        Ok(CallResponse::default())
    }

    pub(crate) fn publish(
        &self,
        commitment: Commitment,
        context: &C,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<CallResponse, StakingError> {
        let constants = self
            .constants
            .get(working_set)
            .ok_or(StakingError::NotInitialized)?;
        let lcc = self
            .last_cemented
            .get(working_set)
            .ok_or(StakingError::NotInitialized)?;
        let now = self.chain_state.current_level(working_set);

        if commitment.number_of_ticks == 0 {
            return Err(StakingError::ZeroTickCommitment);
        }

        let pred_level = if commitment.predecessor == lcc.hash {
            lcc.inbox_level
        } else {
            self.commitments
                .get(&commitment.predecessor, working_set)
                .ok_or(StakingError::PredecessorNotFound(commitment.predecessor))?
                .inbox_level
        };
        let expected = pred_level + constants.commitment_period;
        if commitment.inbox_level != expected {
            return Err(StakingError::BadInboxLevel {
                expected,
                found: commitment.inbox_level,
            });
        }

        let limit = lcc.inbox_level + constants.max_lookahead;
        if commitment.inbox_level > limit {
            return Err(StakingError::TooFarAhead {
                limit,
                found: commitment.inbox_level,
            });
        }

        let first_at_level = self
            .first_publication_level
            .get(&commitment.inbox_level, working_set);
        if let Some(first) = first_at_level {
            if now > first + constants.challenge_window {
                return Err(StakingError::CommitmentPastCurfew(commitment.inbox_level));
            }
        }

        if commitment.inbox_level >= now {
            return Err(StakingError::CommitmentFromFuture {
                inbox_level: commitment.inbox_level,
                current_level: now,
            });
        }

        let index = self
            .staker_indexes
            .get(context.sender(), working_set)
            .filter(|index| self.is_active(*index, working_set))
            .ok_or(StakingError::NotStaked)?;
        let staked = self
            .staked_commitments
            .get(&index, working_set)
            .ok_or(StakingError::NotStaked)?;

        // A stake only ever moves forward along one branch: the new
        // commitment's ancestor chain must pass through the staker's current
        // commitment. A stake sitting at or below the LCC is on cemented
        // history (an actively staked sibling would have blocked cementing),
        // so the walk anchors at the LCC instead; that also keeps it inside
        // the retention window. Bounded by max_lookahead/commitment_period.
        if commitment.inbox_level <= staked.inbox_level
            || commitment.inbox_level <= lcc.inbox_level
        {
            return Err(StakingError::StakerBacktracked);
        }
        let (anchor_level, anchor_hash) = if staked.inbox_level > lcc.inbox_level {
            (staked.inbox_level, staked.hash)
        } else {
            (lcc.inbox_level, lcc.hash)
        };
        let mut newly_staked = Vec::new();
        let mut cursor_hash = commitment.predecessor;
        let mut cursor_level = pred_level;
        while cursor_level > anchor_level {
            newly_staked.push(cursor_hash);
            let ancestor = self
                .commitments
                .get(&cursor_hash, working_set)
                .ok_or(StakingError::PredecessorNotFound(cursor_hash))?;
            cursor_hash = ancestor.predecessor;
            cursor_level = cursor_level.saturating_sub(constants.commitment_period);
        }
        if cursor_hash != anchor_hash {
            return Err(StakingError::StakerBacktracked);
        }

        let hash = commitment.hash::<C::Hasher>();
        if self.commitments.get(&hash, working_set).is_none() {
            self.commitments.set(&hash, &commitment, working_set);
            self.commitment_added_level.set(&hash, &now, working_set);
            let mut at_level = self
                .commitments_at_inbox_level
                .get(&commitment.inbox_level, working_set)
                .unwrap_or_default();
            at_level.push(hash);
            self.commitments_at_inbox_level
                .set(&commitment.inbox_level, &at_level, working_set);
        }
        if first_at_level.is_none() {
            self.first_publication_level
                .set(&commitment.inbox_level, &now, working_set);
        }

        self.staked_commitments.set(
            &index,
            &CommitmentPointer {
                hash,
                inbox_level: commitment.inbox_level,
            },
            working_set,
        );
        self.add_staker_to(&hash, index, working_set);
        for ancestor in &newly_staked {
            self.add_staker_to(ancestor, index, working_set);
        }

        working_set.add_event(
            "Commitment published",
            &format!(
                "staker={index}, hash={hash}, inbox_level={}",
                commitment.inbox_level
            ),
        );
        Ok(CallResponse::default())
    }

    pub(crate) fn cement(
        &self,
        hash: CommitmentHash,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<CallResponse, StakingError> {
        let constants = self
            .constants
            .get(working_set)
            .ok_or(StakingError::NotInitialized)?;
        let lcc = self
            .last_cemented
            .get(working_set)
            .ok_or(StakingError::NotInitialized)?;
        let now = self.chain_state.current_level(working_set);

        let commitment = self
            .commitments
            .get(&hash, working_set)
            .ok_or(StakingError::CommitmentNotFound(hash))?;
        if commitment.predecessor != lcc.hash {
            return Err(StakingError::ParentNotLcc);
        }

        let added = self
            .commitment_added_level
            .get(&hash, working_set)
            .ok_or(StakingError::CommitmentNotFound(hash))?;
        let cementable_at = added + constants.challenge_window;
        if now < cementable_at {
            return Err(StakingError::CommitmentTooRecent {
                cementable_at,
                current_level: now,
            });
        }

        // A commitment at this level is active if it is a direct child of
        // the LCC and at least one still-active staker stakes on it. Slashed
        // stakers no longer count, so a branch dies with its last staker.
        let candidates = self
            .commitments_at_inbox_level
            .get(&commitment.inbox_level, working_set)
            .unwrap_or_default();
        let mut active = Vec::new();
        for candidate in &candidates {
            let is_child = self
                .commitments
                .get(candidate, working_set)
                .map_or(false, |c| c.predecessor == lcc.hash);
            if !is_child {
                continue;
            }
            let stakers = self
                .commitment_stakers
                .get(candidate, working_set)
                .unwrap_or_default();
            if stakers
                .iter()
                .any(|index| self.is_active(*index, working_set))
            {
                active.push(*candidate);
            }
        }
        match active.as_slice() {
            [only] if *only == hash => {}
            [_] => return Err(StakingError::InvalidCommitmentToCement),
            [] => return Err(StakingError::InvalidCommitmentToCement),
            _ => return Err(StakingError::Disputed),
        }

        self.last_cemented.set(
            &CommitmentPointer {
                hash,
                inbox_level: commitment.inbox_level,
            },
            working_set,
        );

        // Every sibling is now provably dangling; reclaim it together with
        // its staker associations.
        for sibling in candidates.iter().filter(|c| **c != hash) {
            self.commitments.delete(sibling, working_set);
            self.commitment_stakers.delete(sibling, working_set);
            self.commitment_added_level.delete(sibling, working_set);
        }
        self.commitments_at_inbox_level
            .set(&commitment.inbox_level, &vec![hash], working_set);

        self.retain_cemented(hash, &constants, working_set);

        working_set.add_event(
            "Commitment cemented",
            &format!("hash={hash}, inbox_level={}", commitment.inbox_level),
        );
        Ok(CallResponse::default())
    }

    pub(crate) fn withdraw_stake(
        &self,
        context: &C,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<CallResponse, StakingError> {
        let sender = context.sender();
        let index = self
            .staker_indexes
            .get(sender, working_set)
            .filter(|index| self.is_active(*index, working_set))
            .ok_or(StakingError::NotStaked)?;
        let staked = self
            .staked_commitments
            .get(&index, working_set)
            .ok_or(StakingError::NotStaked)?;
        let lcc = self
            .last_cemented
            .get(working_set)
            .ok_or(StakingError::NotInitialized)?;

        if staked.inbox_level > lcc.inbox_level {
            return Err(StakingError::NotStakedOnLccOrAncestor);
        }

        let update = self
            .bank
            .release(sender, working_set)
            .map_err(|_| StakingError::NotStaked)?;

        self.deactivate(index, working_set);
        self.staked_commitments.delete(&index, working_set);
        if let Some(mut stakers) = self.commitment_stakers.get(&staked.hash, working_set) {
            stakers.retain(|i| *i != index);
            self.commitment_stakers
                .set(&staked.hash, &stakers, working_set);
        }

        self.emit_bond_event(working_set, "Stake withdrawn", index, &update);
        Ok(CallResponse::default())
    }

    /// Slashing entry point used by refutation game resolution. Burns the
    /// staker's bond and deactivates it; the index is never reused. Never
    /// reachable through a call message.
    pub fn remove_staker(
        &self,
        index: StakerIndex,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<BalanceUpdate, StakingError> {
        let address = self
            .staker_addresses
            .get(&index, working_set)
            .ok_or(StakingError::UnknownStakerIndex(index))?;
        let update = self
            .bank
            .burn(&address, working_set)
            .map_err(|_| StakingError::NotStaked)?;

        self.deactivate(index, working_set);
        self.staked_commitments.delete(&index, working_set);

        self.emit_bond_event(working_set, "Staker slashed", index, &update);
        Ok(update)
    }

    fn add_staker_to(
        &self,
        hash: &CommitmentHash,
        index: StakerIndex,
        working_set: &mut WorkingSet<C::Storage>,
    ) {
        let mut stakers = self
            .commitment_stakers
            .get(hash, working_set)
            .unwrap_or_default();
        if !stakers.contains(&index) {
            stakers.push(index);
            self.commitment_stakers.set(hash, &stakers, working_set);
        }
    }

    /// Appends the newly cemented commitment to the retention ring and
    /// prunes everything older than the configured retention count. The
    /// prune is an explicit loop bounded by the ring length, never a
    /// recursive predecessor walk.
    fn retain_cemented(
        &self,
        hash: CommitmentHash,
        constants: &crate::RollupConstants,
        working_set: &mut WorkingSet<C::Storage>,
    ) {
        let next = self.next_cemented.get(working_set).unwrap_or_default();
        self.cemented_commitments.set(&next, &hash, working_set);
        self.next_cemented.set(&(next + 1), working_set);

        let mut oldest = self.oldest_cemented.get(working_set).unwrap_or_default();
        while (next + 1).saturating_sub(oldest) > constants.cemented_commitments_kept {
            if let Some(pruned) = self.cemented_commitments.remove(&oldest, working_set) {
                if let Some(old) = self.commitments.remove(&pruned, working_set) {
                    self.commitment_stakers.delete(&pruned, working_set);
                    self.commitment_added_level.delete(&pruned, working_set);
                    self.first_publication_level
                        .delete(&old.inbox_level, working_set);
                    self.commitments_at_inbox_level
                        .delete(&old.inbox_level, working_set);
                }
            }
            oldest += 1;
        }
        self.oldest_cemented.set(&oldest, working_set);
    }

    fn emit_bond_event(
        &self,
        working_set: &mut WorkingSet<C::Storage>,
        kind: &str,
        index: StakerIndex,
        update: &BalanceUpdate,
    ) {
        working_set.add_event(
            kind,
            &format!(
                "staker={index}, spendable={}, frozen={}",
                update.spendable, update.frozen
            ),
        );
    }
}
