//! Property-based tests for button payload parsing.
//!
//! 1. Arbitrary strings never make `CallbackData::parse` panic.
//! 2. Every payload the menus can emit parses back to itself.
//! 3. Out-of-range pickers are always rejected.
//! 4. Times off the hour are rejected.

use duetask_proto::{CallbackData, Identity, ProtoError};
use proptest::prelude::*;

/// Strategy for payloads the server actually emits.
fn arb_callback() -> impl Strategy<Value = CallbackData> {
    prop_oneof![
        prop::sample::select(Identity::ALL.to_vec()).prop_map(CallbackData::SelectIdentity),
        Just(CallbackData::AddTask),
        Just(CallbackData::ViewTasks),
        Just(CallbackData::ClearTasks),
        Just(CallbackData::BackToMenu),
        any::<usize>().prop_map(CallbackData::Done),
        any::<usize>().prop_map(CallbackData::Edit),
        any::<usize>().prop_map(CallbackData::Delete),
        (1970i32..=9999, 1u32..=12, 1u32..=31)
            .prop_map(|(year, month, day)| CallbackData::Date { year, month, day }),
        (0u32..24).prop_map(|hour| CallbackData::Time { hour, minute: 0 }),
    ]
}

proptest! {
    #[test]
    fn parse_never_panics(data in ".{0,64}") {
        let _ = CallbackData::parse(&data);
    }

    #[test]
    fn emitted_payloads_parse_back(callback in arb_callback()) {
        prop_assert_eq!(CallbackData::parse(&callback.encode()), Ok(callback));
    }

    #[test]
    fn hours_past_midnight_rejected(hour in 24u32..10_000) {
        let data = format!("time_{hour}_0");
        prop_assert!(matches!(
            CallbackData::parse(&data),
            Err(ProtoError::MalformedCallback(_))
        ));
    }

    #[test]
    fn minutes_past_the_hour_rejected(hour in 0u32..24, minute in 1u32..60) {
        let data = format!("time_{hour}_{minute}");
        prop_assert!(matches!(
            CallbackData::parse(&data),
            Err(ProtoError::MalformedCallback(_))
        ));
    }
}
