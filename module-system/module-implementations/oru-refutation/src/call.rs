use oru_rollup_staking::call::StakingError;
use oru_rollup_staking::{CommitmentHash, StakerIndex};
use oru_state::WorkingSet;
use thiserror::Error;

use crate::{
    DissectionChunk, GameKey, Outcome, Player, ProofVerifier, Reason, Refutation, RefutationGame,
};

/// This enumeration represents the available call messages for interacting
/// with the oru-refutation module.
#[derive(borsh::BorshDeserialize, borsh::BorshSerialize, Debug, PartialEq, Clone)]
pub enum CallMessage<C: oru_modules_api::Context> {
    /// Opens a game against `opponent`, citing the two conflicting
    /// commitments. The opener moves first.
    StartGame {
        opponent: C::Address,
        player_commitment: CommitmentHash,
        opponent_commitment: CommitmentHash,
    },
    /// Plays one move in the game against `opponent`.
    Move {
        opponent: C::Address,
        game_move: GameMove,
    },
    /// Resolves the game between the two players against whoever let its
    /// deadline pass. Anyone may send this.
    Timeout {
        player_a: C::Address,
        player_b: C::Address,
    },
}

/// A move: pick the first disputed section of the current dissection by its
/// starting tick, then refine it.
#[derive(borsh::BorshDeserialize, borsh::BorshSerialize, Debug, PartialEq, Clone)]
pub struct GameMove {
    /// The tick opening the chosen section. The mover agrees with every
    /// state up to and including this boundary.
    pub choice: u64,
    pub step: Step,
}

/// The refinement accompanying a choice: a finer dissection while the
/// section spans several ticks, a single-tick execution proof once it does
/// not.
#[derive(borsh::BorshDeserialize, borsh::BorshSerialize, Debug, PartialEq, Clone)]
pub enum Step {
    Dissection(Vec<DissectionChunk>),
    Proof(Vec<u8>),
}

/// Errors raised by refutation operations. These abort the transaction;
/// they are distinct from forfeits, which resolve the game against the
/// mover instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RefutationError {
    #[error("A game between these stakers is already running")]
    GameAlreadyStarted,
    #[error("No game is running between these stakers")]
    GameNotFound,
    #[error("The cited commitments do not conflict")]
    NoConflict,
    #[error("Both players of a game must be active stakers")]
    NotStaked,
    #[error("It is the other player's turn")]
    NotYourTurn,
    #[error("Malformed move: {0}")]
    InvalidMove(&'static str),
    #[error("The move deadline has not passed yet")]
    TimeoutNotElapsed,
    #[error("The refutation module has not been initialized")]
    NotInitialized,
    #[error(transparent)]
    Staking(#[from] StakingError),
}

impl<C: oru_modules_api::Context, Vm: ProofVerifier> Refutation<C, Vm> {
    pub(crate) fn start_game(
        &self,
        opponent: &C::Address,
        player_commitment: CommitmentHash,
        opponent_commitment: CommitmentHash,
        context: &C,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<(), RefutationError> {
        let player = self.staker_of(context.sender(), working_set)?;
        let rival = self.staker_of(opponent, working_set)?;
        if player == rival {
            return Err(RefutationError::NoConflict);
        }
        let key = GameKey::new(player, rival);
        if self.games.get(&key, working_set).is_some() {
            return Err(RefutationError::GameAlreadyStarted);
        }

        let ours = self
            .staking
            .get_commitment(&player_commitment, working_set)
            .ok_or(StakingError::CommitmentNotFound(player_commitment))?;
        let theirs = self
            .staking
            .get_commitment(&opponent_commitment, working_set)
            .ok_or(StakingError::CommitmentNotFound(opponent_commitment))?;

        // A conflict is two distinct claims about the same inbox level,
        // branching off a common predecessor, each backed by its player.
        if player_commitment == opponent_commitment
            || ours.inbox_level != theirs.inbox_level
            || ours.predecessor != theirs.predecessor
            || !self
                .staking
                .is_staked_on(player, &player_commitment, working_set)
            || !self
                .staking
                .is_staked_on(rival, &opponent_commitment, working_set)
        {
            return Err(RefutationError::NoConflict);
        }

        let pred = self
            .staking
            .get_commitment(&theirs.predecessor, working_set)
            .ok_or(StakingError::CommitmentNotFound(theirs.predecessor))?;

        // The disputed range covers the opponent's whole commitment: from
        // the agreed predecessor state to the claim under attack.
        let dissection = vec![
            DissectionChunk {
                state: Some(pred.compressed_state),
                tick: 0,
            },
            DissectionChunk {
                state: Some(theirs.compressed_state),
                tick: theirs.number_of_ticks,
            },
        ];

        let timeout_period = self
            .timeout_period
            .get(working_set)
            .ok_or(RefutationError::NotInitialized)?;
        let now = self.chain_state.current_level(working_set);
        let game = RefutationGame {
            alice: key.alice(),
            bob: key.bob(),
            turn: if player == key.alice() {
                Player::Alice
            } else {
                Player::Bob
            },
            dissection,
            move_deadline: now + timeout_period,
        };
        self.games.set(&key, &game, working_set);

        working_set.add_event(
            "Game started",
            &format!("alice={}, bob={}, opener={player}", key.alice(), key.bob()),
        );
        Ok(())
    }

    /// Plays one move. Returns the outcome when the move ends the game:
    /// either through a proof settling the final tick or through a forfeit
    /// for a semantically invalid refinement.
    pub(crate) fn apply_move(
        &self,
        opponent: &C::Address,
        game_move: GameMove,
        context: &C,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<Option<Outcome>, RefutationError> {
        let mover = self.staker_of(context.sender(), working_set)?;
        let rival = self
            .staking
            .staker_index(opponent, working_set)
            .ok_or(RefutationError::GameNotFound)?;
        let key = GameKey::new(mover, rival);
        let mut game = self
            .games
            .get(&key, working_set)
            .ok_or(RefutationError::GameNotFound)?;
        let seat = game.seat_of(mover).ok_or(RefutationError::GameNotFound)?;
        if seat != game.turn {
            return Err(RefutationError::NotYourTurn);
        }

        let position = game
            .dissection
            .iter()
            .position(|chunk| chunk.tick == game_move.choice)
            .ok_or(RefutationError::InvalidMove(
                "choice is not a dissection boundary",
            ))?;
        if position + 1 >= game.dissection.len() {
            return Err(RefutationError::InvalidMove("choice must open a section"));
        }
        let start = game.dissection[position];
        let end = game.dissection[position + 1];
        let section_len = end.tick - start.tick;

        match game_move.step {
            Step::Dissection(chunks) => {
                if section_len <= 1 {
                    return Err(RefutationError::InvalidMove(
                        "single-tick sections require a proof",
                    ));
                }
                let constants = self
                    .staking
                    .constants(working_set)
                    .ok_or(RefutationError::NotInitialized)?;
                if let Err(why) =
                    check_dissection(&chunks, &start, &end, constants.number_of_sections)
                {
                    // Violating the edge policy forfeits the game, it does
                    // not abort the transaction.
                    working_set.add_event("Dissection rejected", why);
                    let outcome =
                        self.resolve(key, &game, game.turn.other(), Reason::InvalidMove, working_set)?;
                    return Ok(Some(outcome));
                }

                let timeout_period = self
                    .timeout_period
                    .get(working_set)
                    .ok_or(RefutationError::NotInitialized)?;
                let now = self.chain_state.current_level(working_set);
                game.dissection = chunks;
                game.turn = game.turn.other();
                game.move_deadline = now + timeout_period;
                self.games.set(&key, &game, working_set);

                working_set.add_event(
                    "Dissection refined",
                    &format!("mover={mover}, from_tick={}, to_tick={}", start.tick, end.tick),
                );
                Ok(None)
            }
            Step::Proof(proof) => {
                if section_len != 1 {
                    return Err(RefutationError::InvalidMove(
                        "only single-tick sections take a proof",
                    ));
                }
                let (winner_seat, reason) = match start.state {
                    // No agreed state to prove from: the mover cannot win
                    // this tick.
                    None => (game.turn.other(), Reason::ProofRejected),
                    Some(agreed) => match Vm::verify(&proof, &agreed) {
                        Err(_) => (game.turn.other(), Reason::ProofRejected),
                        // The mover disputes the claimed end state. A valid
                        // proof reaching exactly that state vindicates the
                        // claim; anything else refutes it.
                        Ok(post) if Some(post) == end.state => {
                            (game.turn.other(), Reason::ConflictResolved)
                        }
                        Ok(_) => (game.turn, Reason::ConflictResolved),
                    },
                };
                let outcome = self.resolve(key, &game, winner_seat, reason, working_set)?;
                Ok(Some(outcome))
            }
        }
    }

    pub(crate) fn timeout(
        &self,
        player_a: &C::Address,
        player_b: &C::Address,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<Outcome, RefutationError> {
        let a = self
            .staking
            .staker_index(player_a, working_set)
            .ok_or(RefutationError::GameNotFound)?;
        let b = self
            .staking
            .staker_index(player_b, working_set)
            .ok_or(RefutationError::GameNotFound)?;
        let key = GameKey::new(a, b);
        let game = self
            .games
            .get(&key, working_set)
            .ok_or(RefutationError::GameNotFound)?;

        let now = self.chain_state.current_level(working_set);
        if now <= game.move_deadline {
            return Err(RefutationError::TimeoutNotElapsed);
        }
        self.resolve(key, &game, game.turn.other(), Reason::Timeout, working_set)
    }

    /// Destroys the game and slashes the loser. The single exit point for
    /// every termination path.
    fn resolve(
        &self,
        key: GameKey,
        game: &RefutationGame,
        winner_seat: Player,
        reason: Reason,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<Outcome, RefutationError> {
        let winner = game.player(winner_seat);
        let loser = game.player(winner_seat.other());
        self.games.delete(&key, working_set);
        // A staker can play one game per rival. Losing any of them burns the
        // bond and deactivates the index, so a loser already slashed in a
        // parallel game has nothing left to take; the remaining games still
        // terminate.
        if self.staking.is_active(loser, working_set) {
            self.staking.remove_staker(loser, working_set)?;
        }

        working_set.add_event(
            "Game resolved",
            &format!("winner={winner}, loser={loser}, reason={reason:?}"),
        );
        Ok(Outcome {
            winner,
            loser,
            reason,
        })
    }

    fn staker_of(
        &self,
        address: &C::Address,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<StakerIndex, RefutationError> {
        self.staking
            .staker_index(address, working_set)
            .filter(|index| self.staking.is_active(*index, working_set))
            .ok_or(RefutationError::NotStaked)
    }
}

/// Checks a refinement of the section `(start, end)` against the edge
/// policy: anchored at the last agreed state, landing on the section end
/// with a differing claim, partitioned into the protocol's section count
/// with strictly increasing ticks.
fn check_dissection(
    chunks: &[DissectionChunk],
    start: &DissectionChunk,
    end: &DissectionChunk,
    number_of_sections: u64,
) -> Result<(), &'static str> {
    let section_len = end.tick - start.tick;
    let expected_sections = number_of_sections.min(section_len);
    if chunks.len() as u64 != expected_sections + 1 {
        return Err("wrong number of sections");
    }

    let first = &chunks[0];
    if first.tick != start.tick || first.state != start.state {
        return Err("first chunk must repeat the agreed state");
    }

    let last = &chunks[chunks.len() - 1];
    if last.tick != end.tick {
        return Err("last chunk must land on the section end");
    }
    if last.state.is_none() || last.state == end.state {
        return Err("last chunk must carry a differing claim");
    }

    for pair in chunks.windows(2) {
        if pair[1].tick <= pair[0].tick {
            return Err("ticks must strictly increase");
        }
    }
    Ok(())
}
