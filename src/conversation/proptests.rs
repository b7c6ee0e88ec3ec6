//! Property-based tests for the conversation store
//!
//! These tests verify the turn-ordering invariants hold across arbitrary
//! sequences of exchanges and resets.

use super::*;
use proptest::prelude::*;

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        4 => ("[a-zA-Z0-9 ?]{0,40}", "[a-zA-Z0-9 .]{0,80}")
            .prop_map(|(user, assistant)| Event::Exchange { user, assistant }),
        1 => Just(Event::Reset),
    ]
}

fn check_invariants(conv: &Conversation) -> Result<(), TestCaseError> {
    let turns = conv.turns();
    prop_assert!(!turns.is_empty());
    prop_assert_eq!(&turns[0], &Turn::seed());
    prop_assert_eq!(turns.len() % 2, 1);
    for (i, turn) in turns.iter().enumerate().skip(1) {
        let expected = if i % 2 == 1 { Role::User } else { Role::Assistant };
        prop_assert_eq!(turn.role, expected, "turn {} has the wrong role", i);
    }
    let expected_state = if turns.len() == 1 {
        ConvState::Seeded
    } else {
        ConvState::Accumulating
    };
    prop_assert_eq!(conv.state(), expected_state);
    Ok(())
}

proptest! {
    #[test]
    fn prop_invariants_hold_after_any_events(events in prop::collection::vec(arb_event(), 0..40)) {
        let mut conv = Conversation::new();
        check_invariants(&conv)?;
        for event in events {
            conv.apply(event);
            check_invariants(&conv)?;
        }
    }

    #[test]
    fn prop_exchange_appends_exactly_two(
        events in prop::collection::vec(arb_event(), 0..20),
        user in "[a-z ]{0,20}",
        assistant in "[a-z ]{0,20}",
    ) {
        let mut conv = Conversation::new();
        for event in events {
            conv.apply(event);
        }
        let before = conv.turns().to_vec();

        conv.apply(Event::Exchange { user: user.clone(), assistant: assistant.clone() });

        let after = conv.turns();
        prop_assert_eq!(after.len(), before.len() + 2);
        prop_assert_eq!(&after[..before.len()], &before[..]);
        prop_assert_eq!(&after[before.len()], &Turn::new(Role::User, user));
        prop_assert_eq!(&after[before.len() + 1], &Turn::new(Role::Assistant, assistant));
    }

    #[test]
    fn prop_reset_always_yields_seed(events in prop::collection::vec(arb_event(), 0..40)) {
        let mut conv = Conversation::new();
        for event in events {
            conv.apply(event);
        }
        prop_assert_eq!(conv.apply(Event::Reset), ConvState::Seeded);
        prop_assert_eq!(conv.turns(), &[Turn::seed()][..]);
    }
}
