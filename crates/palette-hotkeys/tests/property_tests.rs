//! Property-based tests for hotkey parsing and registry bookkeeping

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;
use palette_hotkeys::{
    ActiveElement, HotkeyOptions, HotkeyRegistry, HotkeyToken, Key, KeyCombo, KeyEvent, Modifier,
};

/// Strategy for generating valid modifiers
fn modifier_strategy() -> impl Strategy<Value = Modifier> {
    prop_oneof![
        Just(Modifier::Alt),
        Just(Modifier::Control),
        Just(Modifier::Shift),
        Just(Modifier::Command),
    ]
}

/// Strategy for generating valid keys
fn key_strategy() -> impl Strategy<Value = Key> {
    prop_oneof![
        (b'a'..=b'z').prop_map(|c| Key::Char(c as char)),
        (b'0'..=b'9').prop_map(|c| Key::Char(c as char)),
        Just(Key::Enter),
        Just(Key::Escape),
        Just(Key::Backspace),
        Just(Key::Up),
        Just(Key::Down),
        (1u8..=12u8).prop_map(Key::F),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Add(char),
    Remove(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (b'a'..=b'h').prop_map(|c| Op::Add(c as char)),
        (0usize..16).prop_map(Op::Remove),
    ]
}

proptest! {
    /// Modifier order and letter case never change the normalized combo
    #[test]
    fn prop_combo_order_and_case_insensitive(
        modifiers in prop::collection::vec(modifier_strategy(), 0..4),
        key in key_strategy(),
    ) {
        let forward: Vec<String> = modifiers.iter().map(|m| m.to_string()).collect();
        let mut backward: Vec<String> = forward.iter().map(|m| m.to_uppercase()).collect();
        backward.reverse();

        let mut a = forward.clone();
        a.push(key.to_string());
        let mut b = backward;
        b.push(key.to_string().to_uppercase());

        let left: KeyCombo = a.join("+").parse().unwrap();
        let right: KeyCombo = b.join("+").parse().unwrap();
        prop_assert_eq!(left, right);
    }

    /// The set of bound combos equals the combos added and not yet removed
    #[test]
    fn prop_bound_set_matches_live_registrations(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let registry = HotkeyRegistry::new(ActiveElement::new());
        let mut live: Vec<(HotkeyToken, char)> = Vec::new();
        let mut removed: Vec<HotkeyToken> = Vec::new();

        for op in ops {
            match op {
                Op::Add(c) => {
                    let token = registry
                        .bind(&c.to_string(), || {}, HotkeyOptions::default())
                        .unwrap();
                    live.push((token, c));
                }
                Op::Remove(idx) => {
                    if !live.is_empty() {
                        let (token, _) = live.remove(idx % live.len());
                        prop_assert!(registry.unregister(token));
                        removed.push(token);
                    } else if let Some(token) = removed.last() {
                        prop_assert!(!registry.unregister(*token));
                    }
                }
            }
        }

        let expected: BTreeSet<String> = live.iter().map(|(_, c)| c.to_string()).collect();
        let actual: BTreeSet<String> = registry
            .bindings()
            .into_iter()
            .map(|b| b.combo.to_string())
            .collect();
        prop_assert_eq!(expected, actual);
        prop_assert_eq!(registry.len(), live.len());
    }

    /// A held key fires once per discrete press unless repeat is allowed
    #[test]
    fn prop_repeat_suppression(presses in prop::collection::vec(0usize..5, 1..10)) {
        let registry = HotkeyRegistry::new(ActiveElement::new());
        let strict = Arc::new(AtomicUsize::new(0));
        let lenient = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&strict);
        let l = Arc::clone(&lenient);
        registry.bind("a", move || { s.fetch_add(1, Ordering::SeqCst); }, HotkeyOptions::default()).unwrap();
        registry
            .bind("b", move || { l.fetch_add(1, Ordering::SeqCst); }, HotkeyOptions::default().with_allow_repeat(true))
            .unwrap();

        let mut total_events = 0;
        for repeats in &presses {
            for combo in ["a", "b"] {
                registry.dispatch(&KeyEvent::press(combo).unwrap());
                for _ in 0..*repeats {
                    registry.dispatch(&KeyEvent::repeated(combo).unwrap());
                }
            }
            total_events += 1 + repeats;
        }

        prop_assert_eq!(strict.load(Ordering::SeqCst), presses.len());
        prop_assert_eq!(lenient.load(Ordering::SeqCst), total_events);
    }
}
