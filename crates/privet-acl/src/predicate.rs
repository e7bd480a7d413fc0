//! The visibility predicate.

use crate::types::{AccessList, Viewer};

/// Decide whether `viewer` may see an item with the given allow-list.
///
/// - `Public` is visible to everyone, anonymous included.
/// - `RestrictedTo(set)` is visible only to an identified viewer whose id
///   is an exact member of `set`. An empty set hides the item from all.
pub fn is_visible(viewer: &Viewer, access: &AccessList) -> bool {
    match access {
        AccessList::Public => true,
        AccessList::RestrictedTo(allowed) => viewer.id().is_some_and(|id| allowed.contains(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ViewerId, ViewerSet};

    fn restricted(ids: &[&str]) -> AccessList {
        AccessList::RestrictedTo(ids.iter().map(|id| ViewerId::new(*id)).collect())
    }

    #[test]
    fn test_public_visible_to_all() {
        assert!(is_visible(&Viewer::Anonymous, &AccessList::Public));
        assert!(is_visible(&Viewer::identified("1"), &AccessList::Public));
    }

    #[test]
    fn test_restricted_members_only() {
        let access = restricted(&["5", "12"]);
        assert!(is_visible(&Viewer::identified("5"), &access));
        assert!(is_visible(&Viewer::identified("12"), &access));
        assert!(!is_visible(&Viewer::identified("1"), &access));
        assert!(!is_visible(&Viewer::Anonymous, &access));
    }

    #[test]
    fn test_no_prefix_matching() {
        assert!(!is_visible(&Viewer::identified("12"), &restricted(&["1"])));
        assert!(!is_visible(&Viewer::identified("1"), &restricted(&["12"])));
        assert!(!is_visible(&Viewer::identified("2"), &restricted(&["12"])));
    }

    #[test]
    fn test_empty_restriction_hides_from_everyone() {
        let access = AccessList::RestrictedTo(ViewerSet::new());
        assert!(!is_visible(&Viewer::Anonymous, &access));
        assert!(!is_visible(&Viewer::identified("0"), &access));
        assert!(!is_visible(&Viewer::identified(""), &access));
    }

    #[test]
    fn test_anonymous_never_matches_guest_like_tokens() {
        assert!(!is_visible(&Viewer::Anonymous, &restricted(&["0"])));
        assert!(!is_visible(&Viewer::Anonymous, &restricted(&[""])));
    }
}
