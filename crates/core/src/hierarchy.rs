//! Equipment hierarchy: tree building, subtree selection, status rollups.
//!
//! Equipment rows form a forest per vessel via `parent_id`. This module
//! turns a flat list into nested nodes, rejects cyclic parent chains,
//! derives the per-equipment status from running hours, and folds the
//! forest into dashboard counts.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Status thresholds
// ---------------------------------------------------------------------------

/// Ratio of current to overhaul-interval hours at which equipment is Critical.
pub const CRITICAL_RATIO: f64 = 0.90;

/// Ratio of current to overhaul-interval hours at which equipment is Warning.
pub const WARNING_RATIO: f64 = 0.70;

/// Derived equipment condition, computed from running hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipmentStatus {
    Normal,
    Warning,
    Critical,
}

impl EquipmentStatus {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }

    /// Parse from a string, returning an error for unknown statuses.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "Normal" => Ok(Self::Normal),
            "Warning" => Ok(Self::Warning),
            "Critical" => Ok(Self::Critical),
            other => Err(CoreError::Validation(format!(
                "Unknown equipment status: '{other}'"
            ))),
        }
    }
}

/// Derive equipment status from cumulative hours and the overhaul interval.
///
/// `>= 90%` of the interval is Critical, `>= 70%` is Warning, otherwise
/// Normal. Equipment without a (positive) interval is always Normal.
pub fn derive_status(current_hours: f64, overhaul_interval_hours: Option<f64>) -> EquipmentStatus {
    let Some(interval) = overhaul_interval_hours else {
        return EquipmentStatus::Normal;
    };
    if interval <= 0.0 {
        return EquipmentStatus::Normal;
    }
    let ratio = current_hours / interval;
    if ratio >= CRITICAL_RATIO {
        EquipmentStatus::Critical
    } else if ratio >= WARNING_RATIO {
        EquipmentStatus::Warning
    } else {
        EquipmentStatus::Normal
    }
}

/// Percent of the overhaul interval consumed, for gauge displays.
///
/// `None` when no positive interval is configured.
pub fn percent_to_overhaul(current_hours: f64, overhaul_interval_hours: Option<f64>) -> Option<f64> {
    let interval = overhaul_interval_hours?;
    if interval <= 0.0 {
        return None;
    }
    Some(current_hours / interval * 100.0)
}

// ---------------------------------------------------------------------------
// Equipment category
// ---------------------------------------------------------------------------

/// Closed set of equipment categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EquipmentCategory {
    MainEngine,
    Generator,
    Boiler,
    Turbocharger,
    Pump,
    Compressor,
    SteeringGear,
    EmergencyGenerator,
    Purifier,
    HeatExchanger,
    Crane,
    FuelSystem,
    ExhaustSystem,
    Other,
}

impl EquipmentCategory {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MainEngine => "Main Engine",
            Self::Generator => "Generator",
            Self::Boiler => "Boiler",
            Self::Turbocharger => "Turbocharger",
            Self::Pump => "Pump",
            Self::Compressor => "Compressor",
            Self::SteeringGear => "Steering Gear",
            Self::EmergencyGenerator => "Emergency Generator",
            Self::Purifier => "Purifier",
            Self::HeatExchanger => "Heat Exchanger",
            Self::Crane => "Crane",
            Self::FuelSystem => "Fuel System",
            Self::ExhaustSystem => "Exhaust System",
            Self::Other => "Other",
        }
    }

    /// Parse from a string. Unknown categories fold into `Other` so that
    /// legacy rows never break tree rendering.
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "Main Engine" => Self::MainEngine,
            "Generator" => Self::Generator,
            "Boiler" => Self::Boiler,
            "Turbocharger" => Self::Turbocharger,
            "Pump" => Self::Pump,
            "Compressor" => Self::Compressor,
            "Steering Gear" => Self::SteeringGear,
            "Emergency Generator" => Self::EmergencyGenerator,
            "Purifier" => Self::Purifier,
            "Heat Exchanger" => Self::HeatExchanger,
            "Crane" => Self::Crane,
            "Fuel System" => Self::FuelSystem,
            "Exhaust System" => Self::ExhaustSystem,
            _ => Self::Other,
        }
    }
}

// ---------------------------------------------------------------------------
// Tree building
// ---------------------------------------------------------------------------

/// Flat equipment row, the input to tree building.
#[derive(Debug, Clone, Serialize)]
pub struct EquipmentItem {
    pub id: DbId,
    pub parent_id: Option<DbId>,
    pub equipment_code: String,
    pub name: String,
    pub category: EquipmentCategory,
    pub sort_order: i32,
    pub current_running_hours: f64,
    pub overhaul_interval_hours: Option<f64>,
}

/// A node in the built equipment forest.
#[derive(Debug, Clone, Serialize)]
pub struct EquipmentNode {
    #[serde(flatten)]
    pub item: EquipmentItem,
    /// Derived from running hours at build time.
    pub status: EquipmentStatus,
    pub children: Vec<EquipmentNode>,
}

/// Build a forest from a flat equipment list scoped to one vessel.
///
/// Children are ordered by `(sort_order, name)`. A node whose parent is not
/// in the list becomes a root (the parent may be filtered out or deleted).
/// Fails with [`CoreError::Cycle`] if any parent chain revisits a node.
pub fn build_forest(items: &[EquipmentItem]) -> Result<Vec<EquipmentNode>, CoreError> {
    let by_id: HashMap<DbId, &EquipmentItem> = items.iter().map(|i| (i.id, i)).collect();

    // Walk every parent chain before allocating any nodes.
    for item in items {
        detect_cycle(item, &by_id)?;
    }

    let mut children_of: HashMap<Option<DbId>, Vec<&EquipmentItem>> = HashMap::new();
    for item in items {
        // Reattach orphans (parent filtered out) at the root.
        let key = match item.parent_id {
            Some(pid) if by_id.contains_key(&pid) => Some(pid),
            _ => None,
        };
        children_of.entry(key).or_default().push(item);
    }

    Ok(build_level(None, &children_of))
}

fn detect_cycle(
    start: &EquipmentItem,
    by_id: &HashMap<DbId, &EquipmentItem>,
) -> Result<(), CoreError> {
    let mut seen = HashSet::new();
    seen.insert(start.id);
    let mut cursor = start.parent_id;
    while let Some(pid) = cursor {
        if !seen.insert(pid) {
            return Err(CoreError::Cycle(format!(
                "equipment {} is part of a parent cycle",
                start.id
            )));
        }
        cursor = by_id.get(&pid).and_then(|p| p.parent_id);
    }
    Ok(())
}

fn build_level(
    parent: Option<DbId>,
    children_of: &HashMap<Option<DbId>, Vec<&EquipmentItem>>,
) -> Vec<EquipmentNode> {
    let mut level: Vec<&EquipmentItem> = children_of.get(&parent).cloned().unwrap_or_default();
    level.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.name.cmp(&b.name))
    });

    level
        .into_iter()
        .map(|item| EquipmentNode {
            status: derive_status(item.current_running_hours, item.overhaul_interval_hours),
            children: build_level(Some(item.id), children_of),
            item: item.clone(),
        })
        .collect()
}

/// Return `node_id` and all of its descendants, for cascading delete.
///
/// The output order is parent-before-child. Tolerates (ignores) nodes whose
/// parent chain is cyclic; callers validate with [`build_forest`] first when
/// that matters.
pub fn collect_subtree(items: &[EquipmentItem], node_id: DbId) -> Vec<DbId> {
    let mut children_of: HashMap<DbId, Vec<DbId>> = HashMap::new();
    for item in items {
        if let Some(pid) = item.parent_id {
            children_of.entry(pid).or_default().push(item.id);
        }
    }

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![node_id];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        out.push(id);
        if let Some(kids) = children_of.get(&id) {
            stack.extend(kids.iter().copied());
        }
    }
    out
}

/// Validate that moving `node_id` under `new_parent_id` keeps the forest
/// acyclic. The new parent must exist, must not be the node itself, and
/// must not be one of the node's descendants.
pub fn validate_reparent(
    items: &[EquipmentItem],
    node_id: DbId,
    new_parent_id: DbId,
) -> Result<(), CoreError> {
    if node_id == new_parent_id {
        return Err(CoreError::Cycle(format!(
            "equipment {node_id} cannot be its own parent"
        )));
    }
    if !items.iter().any(|i| i.id == new_parent_id) {
        return Err(CoreError::Referential {
            entity: "equipment",
            id: new_parent_id,
        });
    }
    if collect_subtree(items, node_id).contains(&new_parent_id) {
        return Err(CoreError::Cycle(format!(
            "equipment {node_id} cannot be reparented under its descendant {new_parent_id}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Status rollup
// ---------------------------------------------------------------------------

/// Dashboard counts over one vessel's equipment forest.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusRollup {
    pub total: usize,
    pub normal: usize,
    pub warning: usize,
    pub critical: usize,
    /// Counts keyed by category display name, deterministically ordered.
    pub by_category: BTreeMap<&'static str, usize>,
}

/// Fold the forest into per-status and per-category counts. O(n).
pub fn aggregate_status(forest: &[EquipmentNode]) -> StatusRollup {
    let mut rollup = StatusRollup::default();
    fold_nodes(forest, &mut rollup);
    rollup
}

fn fold_nodes(nodes: &[EquipmentNode], rollup: &mut StatusRollup) {
    for node in nodes {
        rollup.total += 1;
        match node.status {
            EquipmentStatus::Normal => rollup.normal += 1,
            EquipmentStatus::Warning => rollup.warning += 1,
            EquipmentStatus::Critical => rollup.critical += 1,
        }
        *rollup.by_category.entry(node.item.category.as_str()).or_default() += 1;
        fold_nodes(&node.children, rollup);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn id(n: u128) -> DbId {
        DbId::from_u128(n)
    }

    fn item(n: u128, parent: Option<u128>) -> EquipmentItem {
        EquipmentItem {
            id: id(n),
            parent_id: parent.map(id),
            equipment_code: format!("EQ-{n:03}"),
            name: format!("Equipment {n}"),
            category: EquipmentCategory::Other,
            sort_order: 0,
            current_running_hours: 0.0,
            overhaul_interval_hours: None,
        }
    }

    // -- derive_status --------------------------------------------------------

    #[test]
    fn status_without_interval_is_normal() {
        assert_eq!(derive_status(50_000.0, None), EquipmentStatus::Normal);
    }

    #[test]
    fn status_below_warning_is_normal() {
        assert_eq!(derive_status(16_000.0, Some(24_000.0)), EquipmentStatus::Normal);
    }

    #[test]
    fn status_at_warning_boundary() {
        // 70% exactly.
        assert_eq!(derive_status(16_800.0, Some(24_000.0)), EquipmentStatus::Warning);
    }

    #[test]
    fn status_at_critical_boundary() {
        // 90% exactly.
        assert_eq!(derive_status(21_600.0, Some(24_000.0)), EquipmentStatus::Critical);
    }

    #[test]
    fn status_just_over_critical_boundary() {
        // 21800/24000 = 90.8%, above the 90% line.
        assert_eq!(derive_status(21_800.0, Some(24_000.0)), EquipmentStatus::Critical);
    }

    #[test]
    fn status_with_zero_interval_is_normal() {
        assert_eq!(derive_status(100.0, Some(0.0)), EquipmentStatus::Normal);
    }

    // -- percent_to_overhaul --------------------------------------------------

    #[test]
    fn percent_without_interval_is_none() {
        assert_eq!(percent_to_overhaul(100.0, None), None);
    }

    #[test]
    fn percent_halfway() {
        assert_eq!(percent_to_overhaul(12_000.0, Some(24_000.0)), Some(50.0));
    }

    #[test]
    fn percent_can_exceed_hundred() {
        assert_eq!(percent_to_overhaul(30_000.0, Some(24_000.0)), Some(125.0));
    }

    // -- build_forest ---------------------------------------------------------

    #[test]
    fn flat_list_builds_forest_of_roots() {
        let items = vec![item(1, None), item(2, None)];
        let forest = build_forest(&items).unwrap();
        assert_eq!(forest.len(), 2);
        assert!(forest.iter().all(|n| n.children.is_empty()));
    }

    #[test]
    fn children_nest_under_parent() {
        let items = vec![item(1, None), item(2, Some(1)), item(3, Some(2))];
        let forest = build_forest(&items).unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].children.len(), 1);
        assert_eq!(forest[0].children[0].children.len(), 1);
        assert_eq!(forest[0].children[0].children[0].item.id, id(3));
    }

    #[test]
    fn children_sorted_by_sort_order_then_name() {
        let mut a = item(2, Some(1));
        a.sort_order = 5;
        a.name = "Aft unit".into();
        let mut b = item(3, Some(1));
        b.sort_order = 1;
        let mut c = item(4, Some(1));
        c.sort_order = 5;
        c.name = "Fore unit".into();

        let forest = build_forest(&[item(1, None), a, b, c]).unwrap();
        let kids: Vec<DbId> = forest[0].children.iter().map(|n| n.item.id).collect();
        assert_eq!(kids, vec![id(3), id(2), id(4)]);
    }

    #[test]
    fn orphan_becomes_root() {
        // Parent 9 is not in the list (e.g. deactivated).
        let items = vec![item(1, None), item(2, Some(9))];
        let forest = build_forest(&items).unwrap();
        assert_eq!(forest.len(), 2);
    }

    #[test]
    fn two_node_cycle_rejected() {
        let items = vec![item(1, Some(2)), item(2, Some(1))];
        assert_matches!(build_forest(&items), Err(CoreError::Cycle(_)));
    }

    #[test]
    fn self_parent_rejected() {
        let items = vec![item(1, Some(1))];
        assert_matches!(build_forest(&items), Err(CoreError::Cycle(_)));
    }

    #[test]
    fn deep_cycle_rejected() {
        let items = vec![item(1, Some(3)), item(2, Some(1)), item(3, Some(2)), item(4, None)];
        assert_matches!(build_forest(&items), Err(CoreError::Cycle(_)));
    }

    #[test]
    fn node_status_derived_in_tree() {
        let mut hot = item(1, None);
        hot.current_running_hours = 21_800.0;
        hot.overhaul_interval_hours = Some(24_000.0);
        let forest = build_forest(&[hot]).unwrap();
        assert_eq!(forest[0].status, EquipmentStatus::Critical);
    }

    // -- collect_subtree ------------------------------------------------------

    #[test]
    fn subtree_includes_self_and_descendants() {
        let items = vec![
            item(1, None),
            item(2, Some(1)),
            item(3, Some(2)),
            item(4, None),
        ];
        let mut ids = collect_subtree(&items, id(1));
        ids.sort();
        assert_eq!(ids, vec![id(1), id(2), id(3)]);
    }

    #[test]
    fn leaf_subtree_is_self_only() {
        let items = vec![item(1, None), item(2, Some(1))];
        assert_eq!(collect_subtree(&items, id(2)), vec![id(2)]);
    }

    #[test]
    fn subtree_of_unknown_node_is_just_the_id() {
        let items = vec![item(1, None)];
        assert_eq!(collect_subtree(&items, id(9)), vec![id(9)]);
    }

    // -- validate_reparent ----------------------------------------------------

    #[test]
    fn reparent_to_sibling_ok() {
        let items = vec![item(1, None), item(2, Some(1)), item(3, Some(1))];
        assert!(validate_reparent(&items, id(2), id(3)).is_ok());
    }

    #[test]
    fn reparent_to_self_rejected() {
        let items = vec![item(1, None)];
        assert_matches!(validate_reparent(&items, id(1), id(1)), Err(CoreError::Cycle(_)));
    }

    #[test]
    fn reparent_under_own_descendant_rejected() {
        let items = vec![item(1, None), item(2, Some(1)), item(3, Some(2))];
        assert_matches!(validate_reparent(&items, id(1), id(3)), Err(CoreError::Cycle(_)));
    }

    #[test]
    fn reparent_to_missing_parent_rejected() {
        let items = vec![item(1, None)];
        assert_matches!(
            validate_reparent(&items, id(1), id(9)),
            Err(CoreError::Referential { entity: "equipment", .. })
        );
    }

    // -- aggregate_status -----------------------------------------------------

    #[test]
    fn rollup_counts_statuses_and_categories() {
        let mut main = item(1, None);
        main.category = EquipmentCategory::MainEngine;
        main.current_running_hours = 21_800.0;
        main.overhaul_interval_hours = Some(24_000.0);

        let mut turbo = item(2, Some(1));
        turbo.category = EquipmentCategory::Turbocharger;
        turbo.current_running_hours = 7_500.0;
        turbo.overhaul_interval_hours = Some(10_000.0);

        let mut gen = item(3, None);
        gen.category = EquipmentCategory::Generator;

        let forest = build_forest(&[main, turbo, gen]).unwrap();
        let rollup = aggregate_status(&forest);

        assert_eq!(rollup.total, 3);
        assert_eq!(rollup.critical, 1);
        assert_eq!(rollup.warning, 1);
        assert_eq!(rollup.normal, 1);
        assert_eq!(rollup.by_category.get("Main Engine"), Some(&1));
        assert_eq!(rollup.by_category.get("Turbocharger"), Some(&1));
        assert_eq!(rollup.by_category.get("Generator"), Some(&1));
    }

    #[test]
    fn rollup_of_empty_forest_is_zero() {
        assert_eq!(aggregate_status(&[]), StatusRollup::default());
    }

    // -- category parsing -----------------------------------------------------

    #[test]
    fn category_round_trip() {
        assert_eq!(
            EquipmentCategory::parse_lossy(EquipmentCategory::SteeringGear.as_str()),
            EquipmentCategory::SteeringGear
        );
    }

    #[test]
    fn unknown_category_folds_to_other() {
        assert_eq!(EquipmentCategory::parse_lossy("Warp Drive"), EquipmentCategory::Other);
    }

    // -- status parsing -------------------------------------------------------

    #[test]
    fn status_round_trip() {
        for s in [EquipmentStatus::Normal, EquipmentStatus::Warning, EquipmentStatus::Critical] {
            assert_eq!(EquipmentStatus::parse(s.as_str()).unwrap(), s);
        }
    }

    #[test]
    fn unknown_status_rejected() {
        assert_matches!(EquipmentStatus::parse("Broken"), Err(CoreError::Validation(_)));
    }
}
