//! Conflict detection for hotkey bindings

use std::collections::BTreeMap;

use crate::models::KeyCombo;
use crate::registry::{BindingInfo, HotkeyToken};
use crate::scope::ScopeId;

/// Several live bindings claiming the same trigger in the same scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub trigger: KeyCombo,
    /// `None` for global bindings
    pub scope: Option<ScopeId>,
    pub tokens: Vec<HotkeyToken>,
}

/// Detects (combo, scope) pairs claimed more than once
pub struct ConflictDetector;

impl ConflictDetector {
    /// Conflicts ordered by the first token involved
    pub fn detect(bindings: &[BindingInfo]) -> Vec<Conflict> {
        let mut claims: BTreeMap<(String, Option<ScopeId>), Vec<&BindingInfo>> = BTreeMap::new();

        for binding in bindings {
            let scope = if binding.global {
                None
            } else {
                Some(binding.scope)
            };
            claims
                .entry((binding.trigger.to_string(), scope))
                .or_default()
                .push(binding);
        }

        let mut conflicts: Vec<Conflict> = claims
            .into_iter()
            .filter(|(_, claimants)| claimants.len() > 1)
            .map(|((_, scope), claimants)| Conflict {
                trigger: claimants[0].trigger.clone(),
                scope,
                tokens: claimants.iter().map(|b| b.token).collect(),
            })
            .collect();

        conflicts.sort_by_key(|c| c.tokens[0]);
        conflicts
    }
}
