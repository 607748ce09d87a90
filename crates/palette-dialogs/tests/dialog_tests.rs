use std::sync::Arc;

use palette_dialogs::*;
use palette_hotkeys::{ActiveElement, HotkeyOptions, HotkeyRegistry, KeyEvent, ScopeId};
use parking_lot::Mutex;
use proptest::prelude::*;

type Steps = Arc<Mutex<Vec<String>>>;

fn recording(steps: &Steps, name: &str) -> DialogHandlers {
    let (c, d) = (Arc::clone(steps), Arc::clone(steps));
    let (close, dismiss) = (format!("{name}:close"), format!("{name}:dismiss"));
    DialogHandlers::new()
        .on_close(move || c.lock().push(close))
        .on_dismiss(move || d.lock().push(dismiss))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_button_takes_dismiss_path() {
        let mut stack: DialogStack = DialogStack::new(ActiveElement::new());
        let steps: Steps = Arc::default();
        let id = stack.open("body".to_string(), DialogOptions::default(), recording(&steps, "d"));
        assert!(stack.dismiss(id));
        assert_eq!(*steps.lock(), vec!["d:dismiss", "d:close"]);
    }

    #[test]
    fn test_keys_reach_topmost_dialog_only() {
        let mut stack: DialogStack = DialogStack::new(ActiveElement::new());
        let steps: Steps = Arc::default();
        stack.open("lower".to_string(), DialogOptions::default(), recording(&steps, "lower"));
        stack.open("upper".to_string(), DialogOptions::default(), recording(&steps, "upper"));

        stack.handle_key(&KeyEvent::press("escape").unwrap());
        assert_eq!(*steps.lock(), vec!["upper:dismiss", "upper:close"]);
        stack.handle_key(&KeyEvent::press("control+enter").unwrap());
        assert_eq!(
            *steps.lock(),
            vec!["upper:dismiss", "upper:close", "lower:close"]
        );
    }

    #[test]
    fn test_scoped_hotkeys_follow_dialog_ownership() {
        let active = ActiveElement::new();
        let hotkeys = HotkeyRegistry::new(active.clone());
        let mut stack: DialogStack = DialogStack::new(active.clone());
        let fired: Steps = Arc::default();

        let f = Arc::clone(&fired);
        hotkeys
            .bind("a", move || f.lock().push("document".to_string()), HotkeyOptions::default())
            .unwrap();
        let id = stack.open("d".to_string(), DialogOptions::default(), DialogHandlers::new());
        let f = Arc::clone(&fired);
        hotkeys
            .bind("a", move || f.lock().push("dialog".to_string()), HotkeyOptions::default())
            .unwrap();
        assert_eq!(active.current(), stack.scope(id).unwrap());

        hotkeys.dispatch(&KeyEvent::press("a").unwrap());
        stack.close(id);
        hotkeys.dispatch(&KeyEvent::press("a").unwrap());
        assert_eq!(*fired.lock(), vec!["dialog", "document"]);
    }

    #[test]
    fn test_resize_resets_every_dialog() {
        let mut stack: DialogStack<()> = DialogStack::new(ActiveElement::new());
        let a = stack.open((), DialogOptions::default(), DialogHandlers::new());
        let b = stack.open((), DialogOptions::default(), DialogHandlers::new());
        for id in [a, b] {
            stack.begin_drag(id, Pointer::new(0, 0)).unwrap();
            stack.drag_to(Pointer::new(20, 50)).unwrap();
            stack.end_drag().unwrap();
            assert_eq!(stack.position(id).unwrap(), Position::new(50, 20));
        }
        stack.begin_drag(b, Pointer::new(0, 0)).unwrap();
        stack.resize();
        assert_eq!(stack.position(a).unwrap(), Position::ORIGIN);
        assert_eq!(stack.position(b).unwrap(), Position::ORIGIN);
    }

    #[test]
    fn test_unknown_dialog_errors() {
        let mut stack: DialogStack = DialogStack::new(ActiveElement::new());
        let id = stack.open("x".to_string(), DialogOptions::default(), DialogHandlers::new());
        stack.close(id);
        assert_eq!(stack.position(id), Err(DialogError::NotFound(id)));
        assert_eq!(
            stack.begin_drag(id, Pointer::default()),
            Err(DialogError::NotFound(id))
        );
    }
}

#[derive(Debug, Clone)]
enum Op {
    Open,
    Close(usize),
    Dismiss(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Open),
        1 => (0usize..8).prop_map(Op::Close),
        1 => (0usize..8).prop_map(Op::Dismiss),
    ]
}

proptest! {
    /// The active element is always the topmost dialog, or the root when none is open,
    /// and every dialog sees dismiss (if any) strictly before its single close
    #[test]
    fn prop_active_element_tracks_top(ops in prop::collection::vec(op_strategy(), 0..32)) {
        let active = ActiveElement::new();
        let mut stack: DialogStack<usize> = DialogStack::new(active.clone());
        let steps: Steps = Arc::default();
        let mut opened = 0usize;

        for op in ops {
            match op {
                Op::Open => {
                    let name = opened.to_string();
                    stack.open(opened, DialogOptions::default(), recording(&steps, &name));
                    opened += 1;
                }
                Op::Close(idx) | Op::Dismiss(idx) if stack.is_empty() => {
                    let _ = idx;
                }
                Op::Close(idx) => {
                    let ids = stack.ids();
                    prop_assert!(stack.close(ids[idx % ids.len()]));
                }
                Op::Dismiss(idx) => {
                    let ids = stack.ids();
                    prop_assert!(stack.dismiss(ids[idx % ids.len()]));
                }
            }
            let expected = match stack.top() {
                Some(top) => stack.scope(top).unwrap(),
                None => ScopeId::ROOT,
            };
            prop_assert_eq!(active.current(), expected);
            prop_assert_eq!(active.depth(), stack.len());
        }

        let steps = steps.lock();
        for n in 0..opened {
            let close = format!("{n}:close");
            let dismiss = format!("{n}:dismiss");
            let closes = steps.iter().filter(|s| **s == close).count();
            prop_assert!(closes <= 1);
            if let Some(d) = steps.iter().position(|s| *s == dismiss) {
                let c = steps.iter().position(|s| *s == close);
                prop_assert!(c.map(|c| c > d).unwrap_or(false));
            }
        }
    }
}
