use oru_bank::{Bank, BankConfig};
use oru_chain_state::{ChainState, ChainStateConfig};
use oru_modules_api::default_context::DefaultContext;
use oru_modules_api::utils::generate_address;
use oru_modules_api::{Context, Module};
use oru_rollup_staking::call::CallMessage as StakingCall;
use oru_rollup_staking::{
    Commitment, RollupConstants, RollupStaking, RollupStakingConfig, StakerIndex, StateHash,
};
use oru_state::{MockStorage, WorkingSet};

use crate::call::{GameMove, RefutationError, Step};
use crate::{
    DissectionChunk, Outcome, ProofVerifier, Reason, Refutation, RefutationConfig,
};

type C = DefaultContext;
type Hash = sha2::Sha256;

const STAKE: u64 = 100;
const CHALLENGE_WINDOW: u64 = 5;
const TIMEOUT_PERIOD: u64 = 10;
const TICKS: u64 = 8;

/// A proof is simply the claimed post-state; anything that is not 32 bytes
/// does not verify.
struct MockProofVerifier;

impl ProofVerifier for MockProofVerifier {
    fn verify(proof: &[u8], _start: &StateHash) -> anyhow::Result<StateHash> {
        let bytes: [u8; 32] = proof
            .try_into()
            .map_err(|_| anyhow::anyhow!("malformed proof"))?;
        Ok(StateHash::new(bytes))
    }
}

type Ref = Refutation<C, MockProofVerifier>;

struct Setup {
    refutation: Ref,
    staking: RollupStaking<C>,
    bank: Bank<C>,
    chain_state: ChainState<C>,
    alice: C,
    bob: C,
    c_alice: Commitment,
    c_bob: Commitment,
}

fn state(byte: u8) -> StateHash {
    StateHash::new([byte; 32])
}

/// Two stakers staked on conflicting commitments at inbox level 1, game not
/// yet started.
fn setup() -> (Setup, WorkingSet<MockStorage>) {
    let refutation = Ref::default();
    let staking = RollupStaking::<C>::default();
    let bank = Bank::<C>::default();
    let chain_state = ChainState::<C>::default();
    let mut ws = WorkingSet::new(MockStorage::new());

    let alice = C::new(generate_address::<C>("alice"));
    let bob = C::new(generate_address::<C>("bob"));

    bank.genesis(
        &BankConfig {
            address_and_balances: vec![(*alice.sender(), 1_000), (*bob.sender(), 1_000)],
        },
        &mut ws,
    )
    .unwrap();
    chain_state
        .genesis(&ChainStateConfig { initial_level: 2 }, &mut ws)
        .unwrap();
    staking
        .genesis(
            &RollupStakingConfig {
                constants: RollupConstants {
                    stake_amount: STAKE,
                    commitment_period: 1,
                    challenge_window: CHALLENGE_WINDOW,
                    max_lookahead: 10,
                    number_of_sections: 4,
                    cemented_commitments_kept: 2,
                },
                genesis_state_hash: state(0),
                genesis_inbox_level: 0,
            },
            &mut ws,
        )
        .unwrap();
    refutation
        .genesis(
            &RefutationConfig {
                timeout_period: TIMEOUT_PERIOD,
            },
            &mut ws,
        )
        .unwrap();

    let lcc = staking.last_cemented(&mut ws).unwrap().hash;
    let c_alice = Commitment {
        predecessor: lcc,
        inbox_level: 1,
        compressed_state: state(10),
        number_of_ticks: TICKS,
    };
    let c_bob = Commitment {
        predecessor: lcc,
        inbox_level: 1,
        compressed_state: state(20),
        number_of_ticks: TICKS,
    };

    for (ctx, commitment) in [(&alice, &c_alice), (&bob, &c_bob)] {
        staking
            .call(StakingCall::DepositStake, ctx, &mut ws)
            .unwrap();
        staking
            .call(StakingCall::Publish(commitment.clone()), ctx, &mut ws)
            .unwrap();
    }

    (
        Setup {
            refutation,
            staking,
            bank,
            chain_state,
            alice,
            bob,
            c_alice,
            c_bob,
        },
        ws,
    )
}

fn index_of(s: &Setup, ctx: &C, ws: &mut WorkingSet<MockStorage>) -> StakerIndex {
    s.staking.staker_index(ctx.sender(), ws).unwrap()
}

fn start(s: &Setup, ws: &mut WorkingSet<MockStorage>) {
    s.refutation
        .start_game(
            s.bob.sender(),
            s.c_alice.hash::<Hash>(),
            s.c_bob.hash::<Hash>(),
            &s.alice,
            ws,
        )
        .unwrap();
}

fn chunk(state_byte: u8, tick: u64) -> DissectionChunk {
    DissectionChunk {
        state: Some(state(state_byte)),
        tick,
    }
}

#[test]
fn starting_requires_a_real_conflict() {
    let (s, mut ws) = setup();

    // Citing the same commitment twice is no conflict.
    assert_eq!(
        Err(RefutationError::NoConflict),
        s.refutation.start_game(
            s.bob.sender(),
            s.c_alice.hash::<Hash>(),
            s.c_alice.hash::<Hash>(),
            &s.alice,
            &mut ws,
        )
    );

    // An outsider cannot open a game.
    let carol = C::new(generate_address::<C>("carol"));
    assert_eq!(
        Err(RefutationError::NotStaked),
        s.refutation.start_game(
            s.bob.sender(),
            s.c_alice.hash::<Hash>(),
            s.c_bob.hash::<Hash>(),
            &carol,
            &mut ws,
        )
    );

    start(&s, &mut ws);
    let alice_index = index_of(&s, &s.alice, &mut ws);
    let bob_index = index_of(&s, &s.bob, &mut ws);
    assert!(s.refutation.game(alice_index, bob_index, &mut ws).is_some());

    // One game per pair, regardless of who opens the second.
    assert_eq!(
        Err(RefutationError::GameAlreadyStarted),
        s.refutation.start_game(
            s.alice.sender(),
            s.c_bob.hash::<Hash>(),
            s.c_alice.hash::<Hash>(),
            &s.bob,
            &mut ws,
        )
    );
}

#[test]
fn dissection_narrows_to_proof_and_refuter_wins() {
    let (s, mut ws) = setup();
    start(&s, &mut ws);
    let alice_index = index_of(&s, &s.alice, &mut ws);
    let bob_index = index_of(&s, &s.bob, &mut ws);

    // Alice opens by dissecting the full range [0, 8] into 4 sections,
    // ending with a claim differing from Bob's commitment state.
    let refinement = vec![
        chunk(0, 0),
        chunk(31, 2),
        chunk(32, 4),
        chunk(33, 6),
        chunk(34, 8),
    ];
    let out = s
        .refutation
        .apply_move(
            s.bob.sender(),
            GameMove {
                choice: 0,
                step: Step::Dissection(refinement),
            },
            &s.alice,
            &mut ws,
        )
        .unwrap();
    assert!(out.is_none());

    // Bob disputes the first section [0, 2]: two ticks, two sections.
    let refinement = vec![chunk(0, 0), chunk(41, 1), chunk(42, 2)];
    let out = s
        .refutation
        .apply_move(
            s.alice.sender(),
            GameMove {
                choice: 0,
                step: Step::Dissection(refinement),
            },
            &s.bob,
            &mut ws,
        )
        .unwrap();
    assert!(out.is_none());

    // Single tick reached: Alice proves the step from the agreed state at
    // tick 0 ends somewhere other than Bob's claim at tick 1.
    let out = s
        .refutation
        .apply_move(
            s.bob.sender(),
            GameMove {
                choice: 0,
                step: Step::Proof(state(99).as_bytes().to_vec()),
            },
            &s.alice,
            &mut ws,
        )
        .unwrap();
    assert_eq!(
        Some(Outcome {
            winner: alice_index,
            loser: bob_index,
            reason: Reason::ConflictResolved,
        }),
        out
    );

    // Bob is slashed and the game is gone.
    assert!(!s.staking.is_active(bob_index, &mut ws));
    assert_eq!(0, s.bank.frozen_of(s.bob.sender(), &mut ws));
    assert!(s.refutation.game(alice_index, bob_index, &mut ws).is_none());

    // With the conflict gone, Alice's branch cements.
    s.chain_state.set_level(2 + CHALLENGE_WINDOW, &mut ws);
    s.staking
        .call(StakingCall::Cement(s.c_alice.hash::<Hash>()), &s.alice, &mut ws)
        .unwrap();
}

#[test]
fn proof_matching_the_claim_slashes_the_mover() {
    let (s, mut ws) = setup();
    start(&s, &mut ws);
    let alice_index = index_of(&s, &s.alice, &mut ws);
    let bob_index = index_of(&s, &s.bob, &mut ws);

    let refinement = vec![
        chunk(0, 0),
        chunk(31, 2),
        chunk(32, 4),
        chunk(33, 6),
        chunk(34, 8),
    ];
    s.refutation
        .apply_move(
            s.bob.sender(),
            GameMove {
                choice: 0,
                step: Step::Dissection(refinement),
            },
            &s.alice,
            &mut ws,
        )
        .unwrap();
    let refinement = vec![chunk(0, 0), chunk(41, 1), chunk(42, 2)];
    s.refutation
        .apply_move(
            s.alice.sender(),
            GameMove {
                choice: 0,
                step: Step::Dissection(refinement),
            },
            &s.bob,
            &mut ws,
        )
        .unwrap();

    // Alice's proof computes exactly Bob's claimed state at tick 1: the
    // claim stands, Alice forfeits.
    let out = s
        .refutation
        .apply_move(
            s.bob.sender(),
            GameMove {
                choice: 0,
                step: Step::Proof(state(41).as_bytes().to_vec()),
            },
            &s.alice,
            &mut ws,
        )
        .unwrap();
    assert_eq!(
        Some(Outcome {
            winner: bob_index,
            loser: alice_index,
            reason: Reason::ConflictResolved,
        }),
        out
    );
    assert!(!s.staking.is_active(alice_index, &mut ws));
}

#[test]
fn invalid_refinement_forfeits_the_game() {
    let (s, mut ws) = setup();
    start(&s, &mut ws);
    let alice_index = index_of(&s, &s.alice, &mut ws);
    let bob_index = index_of(&s, &s.bob, &mut ws);

    // The final chunk must differ from the disputed claim; repeating Bob's
    // commitment state agrees with him and forfeits.
    let refinement = vec![
        chunk(0, 0),
        chunk(31, 2),
        chunk(32, 4),
        chunk(33, 6),
        chunk(20, 8),
    ];
    let out = s
        .refutation
        .apply_move(
            s.bob.sender(),
            GameMove {
                choice: 0,
                step: Step::Dissection(refinement),
            },
            &s.alice,
            &mut ws,
        )
        .unwrap();
    assert_eq!(
        Some(Outcome {
            winner: bob_index,
            loser: alice_index,
            reason: Reason::InvalidMove,
        }),
        out
    );
    assert!(!s.staking.is_active(alice_index, &mut ws));
    assert!(s.refutation.game(alice_index, bob_index, &mut ws).is_none());
}

#[test]
fn structurally_malformed_moves_abort_instead() {
    let (s, mut ws) = setup();
    start(&s, &mut ws);

    // A proof on a multi-tick section is not even a move.
    assert_eq!(
        Err(RefutationError::InvalidMove(
            "only single-tick sections take a proof"
        )),
        s.refutation.apply_move(
            s.bob.sender(),
            GameMove {
                choice: 0,
                step: Step::Proof(vec![1, 2, 3]),
            },
            &s.alice,
            &mut ws,
        )
    );

    // Out of turn.
    assert_eq!(
        Err(RefutationError::NotYourTurn),
        s.refutation.apply_move(
            s.alice.sender(),
            GameMove {
                choice: 0,
                step: Step::Dissection(vec![]),
            },
            &s.bob,
            &mut ws,
        )
    );

    // The game survives both aborts.
    let alice_index = index_of(&s, &s.alice, &mut ws);
    let bob_index = index_of(&s, &s.bob, &mut ws);
    assert!(s.refutation.game(alice_index, bob_index, &mut ws).is_some());
}

#[test]
fn timeout_slashes_whoever_holds_the_turn() {
    let (s, mut ws) = setup();
    start(&s, &mut ws);
    let alice_index = index_of(&s, &s.alice, &mut ws);
    let bob_index = index_of(&s, &s.bob, &mut ws);

    assert_eq!(
        Err(RefutationError::TimeoutNotElapsed),
        s.refutation
            .timeout(s.alice.sender(), s.bob.sender(), &mut ws)
            .map(|_| ())
    );

    // Alice (the opener) never moves; past the deadline anyone can call.
    s.chain_state
        .set_level(2 + TIMEOUT_PERIOD + 1, &mut ws);
    let outcome = s
        .refutation
        .timeout(s.alice.sender(), s.bob.sender(), &mut ws)
        .unwrap();
    assert_eq!(
        Outcome {
            winner: bob_index,
            loser: alice_index,
            reason: Reason::Timeout,
        },
        outcome
    );

    // Scenario D postconditions: bond burned, index removed.
    assert_eq!(0, s.bank.frozen_of(s.alice.sender(), &mut ws));
    assert!(!s.staking.is_active(alice_index, &mut ws));
    assert!(s.staking.staked_commitment(alice_index, &mut ws).is_none());
    assert!(s.refutation.game(alice_index, bob_index, &mut ws).is_none());
}

#[test]
fn parallel_games_terminate_after_the_loser_is_slashed() {
    let (s, mut ws) = setup();

    // Carol stakes on a third conflicting branch and Alice opens against
    // both rivals.
    let carol = C::new(generate_address::<C>("carol"));
    s.bank
        .transfer(*carol.sender(), STAKE, &s.alice, &mut ws)
        .unwrap();
    s.staking
        .call(StakingCall::DepositStake, &carol, &mut ws)
        .unwrap();
    let lcc = s.staking.last_cemented(&mut ws).unwrap().hash;
    let c_carol = Commitment {
        predecessor: lcc,
        inbox_level: 1,
        compressed_state: state(30),
        number_of_ticks: TICKS,
    };
    s.staking
        .call(StakingCall::Publish(c_carol.clone()), &carol, &mut ws)
        .unwrap();

    start(&s, &mut ws);
    s.refutation
        .start_game(
            carol.sender(),
            s.c_alice.hash::<Hash>(),
            c_carol.hash::<Hash>(),
            &s.alice,
            &mut ws,
        )
        .unwrap();

    let alice_index = index_of(&s, &s.alice, &mut ws);
    let carol_index = s.staking.staker_index(carol.sender(), &mut ws).unwrap();

    // Bob's timeout slashes Alice first.
    s.chain_state.set_level(2 + TIMEOUT_PERIOD + 1, &mut ws);
    s.refutation
        .timeout(s.alice.sender(), s.bob.sender(), &mut ws)
        .unwrap();
    assert!(!s.staking.is_active(alice_index, &mut ws));

    // The second game still resolves; the bond can only be burned once.
    let outcome = s
        .refutation
        .timeout(s.alice.sender(), carol.sender(), &mut ws)
        .unwrap();
    assert_eq!(
        Outcome {
            winner: carol_index,
            loser: alice_index,
            reason: Reason::Timeout,
        },
        outcome
    );
    assert!(s.refutation.game(alice_index, carol_index, &mut ws).is_none());
    assert!(s.staking.is_active(carol_index, &mut ws));
}

#[test]
fn moves_require_an_open_game() {
    let (s, mut ws) = setup();
    assert_eq!(
        Err(RefutationError::GameNotFound),
        s.refutation.apply_move(
            s.bob.sender(),
            GameMove {
                choice: 0,
                step: Step::Proof(vec![]),
            },
            &s.alice,
            &mut ws,
        )
    );
}
