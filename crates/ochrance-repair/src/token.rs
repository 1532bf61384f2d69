//! The Ephapax token: a single-use repair permit, modeled as a move-only
//! handle.
//!
//! Rust's ownership model expresses "consume by move" natively: [`consume`]
//! takes `self` by value, so calling it twice on the same binding is a
//! compile error, not a runtime check. The remaining risk — a token created
//! and then silently dropped without ever being consumed — is caught by a
//! [`Drop`] guard that panics, since that case genuinely can only be
//! detected at runtime.
//!
//! [`consume`]: EphapaxToken::consume

use crate::action::RepairAction;

/// A single-use repair permit parameterised by a specific [`RepairAction`].
/// Created exactly when a verifier detects a remediable failure; consumed
/// exactly once by [`crate::engine::repair`].
pub struct EphapaxToken {
    action: Option<RepairAction>,
    consumed: bool,
}

impl EphapaxToken {
    /// Issue a token for `action`. The only constructor — there is no
    /// `Default` and no way to fabricate a token without naming the action
    /// it permits.
    #[must_use]
    pub fn issue(action: RepairAction) -> Self {
        Self {
            action: Some(action),
            consumed: false,
        }
    }

    /// Inspect the pending action without consuming the token.
    ///
    /// # Panics
    /// Panics if the token has already been consumed (unreachable through
    /// the public API alone, since `consume` takes `self` by value, but
    /// kept as a defensive check for the internal `Option` invariant).
    #[must_use]
    pub fn action(&self) -> &RepairAction {
        self.action.as_ref().expect("token already consumed")
    }

    /// Consume the token, yielding the action it permits. Takes `self` by
    /// value: once called, the binding is moved and the compiler rejects
    /// any further use, making double-consumption a compile error rather
    /// than a runtime one.
    ///
    /// ```compile_fail
    /// # use ochrance_repair::{EphapaxToken, RepairAction};
    /// let token = EphapaxToken::issue(RepairAction::RebuildIndex);
    /// let _first = token.consume();
    /// let _second = token.consume(); // moved value used after move
    /// ```
    #[must_use]
    pub fn consume(mut self) -> RepairAction {
        self.consumed = true;
        self.action.take().expect("token already consumed")
    }
}

impl Drop for EphapaxToken {
    /// Panics if the token is dropped without having been consumed.
    fn drop(&mut self) {
        if !self.consumed {
            panic!("Ephapax repair token dropped without being consumed exactly once");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_yields_the_issued_action() {
        let token = EphapaxToken::issue(RepairAction::RestoreBlock(2));
        assert_eq!(token.consume(), RepairAction::RestoreBlock(2));
    }

    #[test]
    #[should_panic(expected = "dropped without being consumed")]
    fn drop_without_consume_panics() {
        let _token = EphapaxToken::issue(RepairAction::RebuildIndex);
        // `_token` drops at end of scope, never consumed.
    }

    #[test]
    fn action_is_inspectable_before_consuming() {
        let token = EphapaxToken::issue(RepairAction::QuarantineFile {
            index: 3,
            path: "f".into(),
        });
        assert_eq!(
            token.action(),
            &RepairAction::QuarantineFile {
                index: 3,
                path: "f".into()
            }
        );
        let _ = token.consume();
    }
}
