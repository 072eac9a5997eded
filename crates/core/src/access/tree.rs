//! Menu forest construction.
//!
//! Menus arrive as a flat list (one query) and are assembled in memory:
//! a menu is hidden when it or any ancestor is soft-deleted, a visible menu
//! whose parent is hidden hangs under its nearest visible ancestor, and
//! siblings are ordered by `(sort, label, id)`. Parent chains that never
//! reach the root are cycles; every menu on or below one is dropped and
//! reported back to the caller.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::permission::PermissionBits;

/// Parent id of top-level menus.
pub const ROOT: i32 = 0;

/// One menu row, as loaded from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuRecord {
    /// Menu ID.
    pub id: i32,
    /// Display label.
    pub label: String,
    /// Route path; also the authorization key handlers declare.
    pub path: String,
    /// Parent menu ID, [`ROOT`] for top level.
    pub parent_id: i32,
    /// Sibling order.
    pub sort: i32,
    /// Soft-delete flag.
    pub is_delete: bool,
}

/// A node of the rendered tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuNode {
    /// Menu ID.
    pub id: i32,
    /// Display label.
    pub label: String,
    /// Route path.
    pub path: String,
    /// Parent ID as stored.
    pub parent_id: i32,
    /// Sibling order.
    pub sort: i32,
    /// Bits for a role, present only on per-role trees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<PermissionBits>,
    /// Children in display order.
    pub children: Vec<MenuNode>,
}

/// Result of building a forest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuForest {
    /// Top-level nodes in display order.
    pub roots: Vec<MenuNode>,
    /// IDs dropped because their parent chain loops, ascending.
    pub cyclic: Vec<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reach {
    Root { hidden: bool },
    Cycle,
}

/// Resolves, for every menu, whether its chain reaches the root and whether
/// anything on the way is soft-deleted.
fn resolve(index: &HashMap<i32, &MenuRecord>) -> HashMap<i32, Reach> {
    let mut memo: HashMap<i32, Reach> = HashMap::with_capacity(index.len());

    for &start in index.keys() {
        if memo.contains_key(&start) {
            continue;
        }

        let mut path = Vec::new();
        let mut on_path = HashSet::new();
        let mut current = start;

        let outcome = loop {
            if let Some(&known) = memo.get(&current) {
                break known;
            }
            if !on_path.insert(current) {
                break Reach::Cycle;
            }
            path.push(current);
            let Some(menu) = index.get(&current) else {
                break Reach::Root { hidden: false };
            };
            if menu.parent_id == ROOT || !index.contains_key(&menu.parent_id) {
                break Reach::Root { hidden: false };
            }
            current = menu.parent_id;
        };

        let mut acc = outcome;
        for id in path.iter().rev() {
            if let (Reach::Root { hidden }, Some(menu)) = (acc, index.get(id)) {
                acc = Reach::Root {
                    hidden: hidden || menu.is_delete,
                };
            }
            memo.insert(*id, acc);
        }
    }

    memo
}

/// Builds the forest of `menus` restricted to `visible` (all menus when `None`).
#[must_use]
pub fn build_forest(menus: &[MenuRecord], visible: Option<&HashSet<i32>>) -> MenuForest {
    let index: HashMap<i32, &MenuRecord> = menus.iter().map(|m| (m.id, m)).collect();
    let reach = resolve(&index);

    let wanted = |id: i32| visible.is_none_or(|set| set.contains(&id));

    let mut cyclic: Vec<i32> = reach
        .iter()
        .filter(|(id, r)| **r == Reach::Cycle && wanted(**id))
        .map(|(id, _)| *id)
        .collect();
    cyclic.sort_unstable();

    let shown: HashSet<i32> = reach
        .iter()
        .filter(|(id, r)| **r == Reach::Root { hidden: false } && wanted(**id))
        .map(|(id, _)| *id)
        .collect();

    let mut children: HashMap<i32, Vec<&MenuRecord>> = HashMap::new();
    for id in &shown {
        let Some(menu) = index.get(id) else { continue };
        let mut parent = menu.parent_id;
        while parent != ROOT && !shown.contains(&parent) {
            match index.get(&parent) {
                Some(ancestor) => parent = ancestor.parent_id,
                None => parent = ROOT,
            }
        }
        children.entry(parent).or_default().push(menu);
    }
    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| {
            a.sort
                .cmp(&b.sort)
                .then_with(|| a.label.cmp(&b.label))
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    MenuForest {
        roots: assemble(ROOT, &children),
        cyclic,
    }
}

fn assemble(parent: i32, children: &HashMap<i32, Vec<&MenuRecord>>) -> Vec<MenuNode> {
    children.get(&parent).map_or_else(Vec::new, |siblings| {
        siblings
            .iter()
            .map(|menu| MenuNode {
                id: menu.id,
                label: menu.label.clone(),
                path: menu.path.clone(),
                parent_id: menu.parent_id,
                sort: menu.sort,
                permission: None,
                children: assemble(menu.id, children),
            })
            .collect()
    })
}

/// Attaches bits to every node; menus without a row get all-false bits.
pub fn annotate(nodes: &mut [MenuNode], bits: &HashMap<i32, PermissionBits>) {
    for node in nodes {
        node.permission = Some(bits.get(&node.id).copied().unwrap_or_default());
        annotate(&mut node.children, bits);
    }
}

/// Whether setting `id`'s parent to `parent_id` would close a loop.
///
/// `id` is `None` for a menu not yet stored.
#[must_use]
pub fn would_cycle(menus: &[MenuRecord], id: Option<i32>, parent_id: i32) -> bool {
    let Some(id) = id else { return false };
    let index: HashMap<i32, i32> = menus.iter().map(|m| (m.id, m.parent_id)).collect();

    let mut seen = HashSet::new();
    let mut current = parent_id;
    while current != ROOT {
        if current == id || !seen.insert(current) {
            return true;
        }
        match index.get(&current) {
            Some(&next) => current = next,
            None => return false,
        }
    }
    false
}

/// Collects ids in display order, depth first.
#[must_use]
pub fn flatten_ids(nodes: &[MenuNode]) -> Vec<i32> {
    let mut out = Vec::new();
    let mut stack: Vec<&MenuNode> = nodes.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node.id);
        stack.extend(node.children.iter().rev());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu(id: i32, parent_id: i32, sort: i32) -> MenuRecord {
        MenuRecord {
            id,
            label: format!("Menu {id}"),
            path: format!("/m{id}"),
            parent_id,
            sort,
            is_delete: false,
        }
    }

    fn ids(nodes: &[MenuNode]) -> Vec<i32> {
        nodes.iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_hidden_parent_hoists_to_visible_ancestor() {
        let menus = vec![menu(1, 0, 1), menu(2, 1, 1), menu(3, 1, 2), menu(4, 3, 1)];
        let visible: HashSet<i32> = [1, 2, 4].into_iter().collect();

        let forest = build_forest(&menus, Some(&visible));

        assert_eq!(ids(&forest.roots), vec![1]);
        assert_eq!(ids(&forest.roots[0].children), vec![2, 4]);
        assert!(forest.roots[0].children[1].children.is_empty());
        assert!(forest.cyclic.is_empty());
    }

    #[test]
    fn test_no_visible_ancestor_hoists_to_root() {
        let menus = vec![menu(1, 0, 1), menu(2, 1, 1)];
        let visible: HashSet<i32> = [2].into_iter().collect();
        let forest = build_forest(&menus, Some(&visible));
        assert_eq!(ids(&forest.roots), vec![2]);
    }

    #[test]
    fn test_soft_delete_hides_descendants() {
        let mut menus = vec![menu(1, 0, 1), menu(2, 1, 1), menu(3, 2, 1), menu(4, 0, 2)];
        menus[1].is_delete = true;

        let forest = build_forest(&menus, None);

        assert_eq!(flatten_ids(&forest.roots), vec![1, 4]);
    }

    #[test]
    fn test_siblings_sorted_by_sort_then_label() {
        let mut menus = vec![menu(1, 0, 2), menu(2, 0, 1), menu(3, 0, 1)];
        menus[1].label = "Zeta".into();
        menus[2].label = "Alpha".into();

        let forest = build_forest(&menus, None);

        assert_eq!(ids(&forest.roots), vec![3, 2, 1]);
    }

    #[test]
    fn test_cycle_dropped_and_reported() {
        let menus = vec![menu(1, 0, 1), menu(2, 3, 1), menu(3, 2, 1), menu(4, 3, 1)];

        let forest = build_forest(&menus, None);

        assert_eq!(ids(&forest.roots), vec![1]);
        assert_eq!(forest.cyclic, vec![2, 3, 4]);
    }

    #[test]
    fn test_missing_parent_treated_as_root() {
        let menus = vec![menu(5, 99, 1)];
        let forest = build_forest(&menus, None);
        assert_eq!(ids(&forest.roots), vec![5]);
    }

    #[test]
    fn test_annotate_defaults_to_false() {
        let menus = vec![menu(1, 0, 1), menu(2, 1, 1)];
        let mut forest = build_forest(&menus, None);
        let bits: HashMap<i32, PermissionBits> =
            [(2, PermissionBits::new(true, false, false))].into_iter().collect();

        annotate(&mut forest.roots, &bits);

        assert_eq!(forest.roots[0].permission, Some(PermissionBits::default()));
        assert_eq!(
            forest.roots[0].children[0].permission,
            Some(PermissionBits::new(true, false, false))
        );
    }

    #[test]
    fn test_would_cycle() {
        let menus = vec![menu(1, 0, 1), menu(2, 1, 1), menu(3, 2, 1)];
        assert!(would_cycle(&menus, Some(1), 3));
        assert!(would_cycle(&menus, Some(2), 2));
        assert!(!would_cycle(&menus, Some(3), 1));
        assert!(!would_cycle(&menus, None, 3));
        assert!(!would_cycle(&menus, Some(2), 0));
    }
}
