//! Permission bits and the authorization gate.

use serde::{Deserialize, Serialize};

use super::AccessError;

/// The create/update/delete capability bits of a role on a menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionBits {
    /// May create records.
    pub is_create: bool,
    /// May update records.
    pub is_update: bool,
    /// May delete records.
    pub is_delete: bool,
}

impl PermissionBits {
    /// All bits set.
    pub const ALL: Self = Self {
        is_create: true,
        is_update: true,
        is_delete: true,
    };

    /// Creates a bit set.
    #[must_use]
    pub const fn new(is_create: bool, is_update: bool, is_delete: bool) -> Self {
        Self {
            is_create,
            is_update,
            is_delete,
        }
    }

    /// True when no bit is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !self.is_create && !self.is_update && !self.is_delete
    }

    /// Bitwise OR.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            is_create: self.is_create || other.is_create,
            is_update: self.is_update || other.is_update,
            is_delete: self.is_delete || other.is_delete,
        }
    }

    /// Whether these bits permit `action`. Viewing needs no bit.
    #[must_use]
    pub const fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => true,
            Action::Create => self.is_create,
            Action::Update => self.is_update,
            Action::Delete => self.is_delete,
        }
    }
}

/// Effective bits of a user: OR across every role row for the menu.
#[must_use]
pub fn effective<I>(rows: I) -> PermissionBits
where
    I: IntoIterator<Item = PermissionBits>,
{
    rows.into_iter()
        .fold(PermissionBits::default(), PermissionBits::union)
}

/// What a handler is about to do to a menu's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Read.
    View,
    /// Insert.
    Create,
    /// Modify.
    Update,
    /// Remove.
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::View => write!(f, "view"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// The gate every handler passes before touching a menu's records.
///
/// # Errors
///
/// `AccessError::MenuNotVisible` when the menu is outside the user's tree,
/// `AccessError::MissingPermission` when the required bit is absent.
pub fn check_gate(
    path: &str,
    visible: bool,
    bits: PermissionBits,
    action: Action,
) -> Result<(), AccessError> {
    if !visible {
        return Err(AccessError::MenuNotVisible(path.to_string()));
    }
    if !bits.allows(action) {
        return Err(AccessError::MissingPermission {
            path: path.to_string(),
            action,
        });
    }
    Ok(())
}

/// Storage step needed to apply a permission upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertPlan {
    /// Row absent and nothing requested.
    Noop,
    /// Row absent, insert these bits.
    Insert(PermissionBits),
    /// Row present, overwrite with these bits.
    Update(PermissionBits),
    /// All bits cleared on an existing row.
    Delete,
}

/// Plans an upsert. A row only exists while at least one bit is set.
#[must_use]
pub const fn plan_upsert(existing: Option<PermissionBits>, requested: PermissionBits) -> UpsertPlan {
    match (existing, requested.is_empty()) {
        (None, true) => UpsertPlan::Noop,
        (Some(_), true) => UpsertPlan::Delete,
        (None, false) => UpsertPlan::Insert(requested),
        (Some(_), false) => UpsertPlan::Update(requested),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_effective_ors_across_roles() {
        let bits = effective([
            PermissionBits::new(true, false, false),
            PermissionBits::new(false, false, true),
        ]);
        assert_eq!(bits, PermissionBits::new(true, false, true));
        assert!(effective([]).is_empty());
    }

    #[rstest]
    #[case(Action::View, PermissionBits::default(), true)]
    #[case(Action::Create, PermissionBits::new(true, false, false), true)]
    #[case(Action::Update, PermissionBits::new(true, false, false), false)]
    #[case(Action::Delete, PermissionBits::ALL, true)]
    fn test_allows(#[case] action: Action, #[case] bits: PermissionBits, #[case] expected: bool) {
        assert_eq!(bits.allows(action), expected);
    }

    #[test]
    fn test_gate_requires_visibility_first() {
        let err = check_gate("/master/bank", false, PermissionBits::ALL, Action::View).unwrap_err();
        assert!(matches!(err, AccessError::MenuNotVisible(_)));
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_gate_requires_bit() {
        let err = check_gate(
            "/master/bank",
            true,
            PermissionBits::new(false, true, true),
            Action::Create,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AccessError::MissingPermission {
                action: Action::Create,
                ..
            }
        ));
        assert!(check_gate("/master/bank", true, PermissionBits::default(), Action::View).is_ok());
    }

    #[test]
    fn test_plan_upsert_cases() {
        let some = PermissionBits::new(true, false, false);
        assert_eq!(plan_upsert(None, PermissionBits::default()), UpsertPlan::Noop);
        assert_eq!(plan_upsert(Some(some), PermissionBits::default()), UpsertPlan::Delete);
        assert_eq!(plan_upsert(None, some), UpsertPlan::Insert(some));
        assert_eq!(plan_upsert(Some(PermissionBits::ALL), some), UpsertPlan::Update(some));
    }

    fn arb_bits() -> impl Strategy<Value = PermissionBits> {
        (any::<bool>(), any::<bool>(), any::<bool>())
            .prop_map(|(c, u, d)| PermissionBits::new(c, u, d))
    }

    fn apply(row: Option<PermissionBits>, plan: UpsertPlan) -> Option<PermissionBits> {
        match plan {
            UpsertPlan::Noop => row,
            UpsertPlan::Insert(bits) | UpsertPlan::Update(bits) => Some(bits),
            UpsertPlan::Delete => None,
        }
    }

    proptest! {
        /// Applying the same upsert twice leaves the same row as applying it once.
        #[test]
        fn prop_upsert_idempotent(existing in proptest::option::of(arb_bits()), requested in arb_bits()) {
            let once = apply(existing, plan_upsert(existing, requested));
            let twice = apply(once, plan_upsert(once, requested));
            prop_assert_eq!(once, twice);
        }

        /// No row ever survives with every bit cleared.
        #[test]
        fn prop_no_empty_rows(existing in proptest::option::of(arb_bits()), requested in arb_bits()) {
            let row = apply(existing, plan_upsert(existing, requested));
            prop_assert!(row.is_none_or(|bits| !bits.is_empty()));
        }
    }
}
