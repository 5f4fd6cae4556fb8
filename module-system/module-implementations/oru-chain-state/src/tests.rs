use oru_modules_api::default_context::DefaultContext;
use oru_modules_api::Module;
use oru_state::{MockStorage, WorkingSet};

use crate::{ChainState, ChainStateConfig};

#[test]
fn level_advances_from_genesis() {
    let chain_state = ChainState::<DefaultContext>::default();
    let mut ws = WorkingSet::new(MockStorage::new());

    chain_state
        .genesis(&ChainStateConfig { initial_level: 10 }, &mut ws)
        .unwrap();
    assert_eq!(10, chain_state.current_level(&mut ws));

    assert_eq!(11, chain_state.advance_level(&mut ws));
    chain_state.set_level(50, &mut ws);
    assert_eq!(50, chain_state.current_level(&mut ws));
}
