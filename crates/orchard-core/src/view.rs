//! Retained view model shared by the reconciler and the display pass.
//!
//! Nodes are keyed by the identity of what they show (a plot position, a
//! fruit id, a buff kind), never by position in a list. Every mutation of
//! the [`ViewTree`] is mirrored as a [`ViewOp`] so a renderer can replay the
//! batch against its own retained surface.

use std::collections::{BTreeMap, BTreeSet};

use orchard_types::{FruitId, PlantTypeId, PlotId};

use crate::placement::Position;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Slots in the page header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeaderSlot {
    /// Signed-in user name.
    Username,
    /// Balance.
    Money,
    /// Names of the active global weather.
    GlobalWeather,
    /// Countdown to the next fruit spawn window.
    NextSpawn,
    /// Countdown to the next weather roll.
    NextWeather,
}

/// Identity of a view node.
///
/// Plot-scoped keys carry the 1-based board position, which is stable for
/// locked plots that have no server id yet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKey {
    /// A header slot.
    Header(HeaderSlot),
    /// Plot container.
    Plot(u32),
    /// Info panel of a planted plot.
    PlotInfo(u32),
    /// Plant name heading.
    PlotTitle(u32),
    /// Committed stage line.
    StageText(u32),
    /// Growth countdown line (display-owned text).
    GrowthCountdown(u32),
    /// Container for buff countdowns.
    EffectsPanel(u32),
    /// One buff countdown, by effect key (display-owned).
    BuffCountdown(u32, String),
    /// Harvest-ready banner of a single-harvest plot.
    ReadyLabel(u32),
    /// Plant sprite.
    PlantImage(u32),
    /// Text on a locked or unresolvable plot.
    PlotNotice(u32),
    /// Buy action on the next purchasable plot.
    BuyPlotButton(u32),
    /// Plant action on an empty plot.
    PlantSeedButton(u32),
    /// Fertilizer action on a planted plot.
    FertilizerButton(u32),
    /// Dig-up action on a planted plot.
    DigUpButton(u32),
    /// A fruit hanging on a plot.
    Fruit(FruitId),
    /// Weather badge of a fruit.
    WeatherIcon(FruitId),
}

// ---------------------------------------------------------------------------
// Props
// ---------------------------------------------------------------------------

/// Structural class of a plot container. Changing it recreates the
/// container and its whole subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotShape {
    /// Not owned.
    Locked,
    /// Owned, nothing planted.
    Empty {
        /// Server id.
        plot_id: PlotId,
    },
    /// Owned, planted with a known type.
    Planted {
        /// Server id.
        plot_id: PlotId,
        /// What grows here.
        plant_type_id: PlantTypeId,
    },
    /// Owned, planted with a type missing from the catalog.
    Placeholder {
        /// Server id.
        plot_id: PlotId,
    },
}

/// Where a fruit sits on its plant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FruitAnchor {
    /// Fixed anchor of single-harvest plants.
    Anchored,
    /// Scatter position on a perennial plant.
    At(Position),
}

/// A player action bound to a button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Buy a locked plot.
    BuyPlot {
        /// Board position.
        plot_number: u32,
        /// Price.
        cost: i64,
    },
    /// Open the seed picker for a plot.
    PlantSeed {
        /// Target plot.
        plot_id: PlotId,
    },
    /// Open the fertilizer picker for a plot.
    UseFertilizer {
        /// Target plot.
        plot_id: PlotId,
    },
    /// Dig up the plant on a plot.
    DigUp {
        /// Target plot.
        plot_id: PlotId,
        /// Plant name for the confirmation prompt.
        plant_name: String,
    },
}

/// Renderable content of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeProps {
    /// Plot container.
    Plot {
        /// Structural class.
        shape: PlotShape,
        /// A single-harvest plant has ripe fruit.
        ready: bool,
    },
    /// Grouping panel without content of its own.
    Panel,
    /// A line of text.
    Text(String),
    /// An image by asset path.
    Image(String),
    /// A fruit sprite.
    Fruit {
        /// Asset path.
        image: String,
        /// Position on the plant.
        anchor: FruitAnchor,
        /// Weight-driven scale, two decimals.
        scale: f64,
    },
    /// A weather badge.
    WeatherIcon {
        /// Asset path.
        icon: String,
        /// Weather or combination name.
        name: String,
    },
    /// A clickable action.
    Button {
        /// Caption.
        label: String,
        /// What it does.
        action: ButtonAction,
    },
}

/// One mutation of the view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewOp {
    /// Insert a node under `parent` (or at the root).
    Create {
        /// New node.
        key: NodeKey,
        /// Parent, `None` for roots.
        parent: Option<NodeKey>,
        /// Content.
        props: NodeProps,
    },
    /// Replace a node's content in place, keeping its identity.
    Update {
        /// Existing node.
        key: NodeKey,
        /// New content.
        props: NodeProps,
    },
    /// Delete a node and its whole subtree.
    Remove {
        /// Root of the removed subtree.
        key: NodeKey,
    },
}

impl ViewOp {
    /// Key the operation applies to.
    pub const fn key(&self) -> &NodeKey {
        match self {
            Self::Create { key, .. } | Self::Update { key, .. } | Self::Remove { key } => key,
        }
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// A node in the retained tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewNode {
    /// Parent, `None` for roots.
    pub parent: Option<NodeKey>,
    /// Content.
    pub props: NodeProps,
    /// Children in creation order.
    pub children: Vec<NodeKey>,
}

/// Retained tree of view nodes keyed by identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewTree {
    nodes: BTreeMap<NodeKey, ViewNode>,
}

impl ViewTree {
    /// Empty tree.
    pub const fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }

    /// Look up a node.
    pub fn get(&self, key: &NodeKey) -> Option<&ViewNode> {
        self.nodes.get(key)
    }

    /// Content of a node.
    pub fn props(&self, key: &NodeKey) -> Option<&NodeProps> {
        self.nodes.get(key).map(|node| &node.props)
    }

    /// Text of a text node.
    pub fn text(&self, key: &NodeKey) -> Option<&str> {
        match self.props(key) {
            Some(NodeProps::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Whether a node exists.
    pub fn contains(&self, key: &NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Children of a node in creation order.
    pub fn children(&self, key: &NodeKey) -> &[NodeKey] {
        self.nodes
            .get(key)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every key in the tree.
    pub fn keys(&self) -> impl Iterator<Item = &NodeKey> {
        self.nodes.keys()
    }

    /// Create the node or bring its content up to date.
    ///
    /// A node that exists under a different parent is removed and created
    /// again, since its identity in the rendered surface changed.
    pub fn upsert(
        &mut self,
        key: NodeKey,
        parent: Option<&NodeKey>,
        props: NodeProps,
        ops: &mut Vec<ViewOp>,
    ) {
        let same_parent = self
            .nodes
            .get(&key)
            .map(|node| node.parent.as_ref() == parent);
        match same_parent {
            Some(true) => {
                if let Some(node) = self.nodes.get_mut(&key) {
                    if node.props != props {
                        node.props.clone_from(&props);
                        ops.push(ViewOp::Update { key, props });
                    }
                }
            }
            Some(false) => {
                self.remove(&key, ops);
                self.insert(key, parent, props, ops);
            }
            None => self.insert(key, parent, props, ops),
        }
    }

    /// Create the node if it does not exist; leave existing content alone.
    pub fn ensure(
        &mut self,
        key: NodeKey,
        parent: Option<&NodeKey>,
        props: NodeProps,
        ops: &mut Vec<ViewOp>,
    ) {
        if !self.contains(&key) {
            self.insert(key, parent, props, ops);
        }
    }

    /// Replace the text of an existing text node when it differs.
    pub fn set_text(&mut self, key: &NodeKey, text: &str, ops: &mut Vec<ViewOp>) {
        if let Some(node) = self.nodes.get_mut(key) {
            let changed = !matches!(&node.props, NodeProps::Text(current) if current == text);
            if changed {
                node.props = NodeProps::Text(text.to_owned());
                ops.push(ViewOp::Update {
                    key: key.clone(),
                    props: node.props.clone(),
                });
            }
        }
    }

    /// Remove a node and its subtree. One [`ViewOp::Remove`] is emitted for
    /// the subtree root. Returns whether the node existed.
    pub fn remove(&mut self, key: &NodeKey, ops: &mut Vec<ViewOp>) -> bool {
        let Some(node) = self.nodes.remove(key) else {
            return false;
        };
        if let Some(parent) = node.parent.as_ref().and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|child| child != key);
        }
        let mut pending = node.children;
        while let Some(child) = pending.pop() {
            if let Some(removed) = self.nodes.remove(&child) {
                pending.extend(removed.children);
            }
        }
        ops.push(ViewOp::Remove { key: key.clone() });
        true
    }

    /// Remove every child of `parent` for which `keep` is false.
    pub fn retain_children(
        &mut self,
        parent: &NodeKey,
        keep: impl Fn(&NodeKey) -> bool,
        ops: &mut Vec<ViewOp>,
    ) {
        let doomed: Vec<NodeKey> = self
            .children(parent)
            .iter()
            .filter(|child| !keep(*child))
            .cloned()
            .collect();
        for child in &doomed {
            self.remove(child, ops);
        }
    }

    /// Remove root nodes for which `keep` is false.
    pub fn retain_roots(&mut self, keep: impl Fn(&NodeKey) -> bool, ops: &mut Vec<ViewOp>) {
        let doomed: BTreeSet<NodeKey> = self
            .nodes
            .iter()
            .filter(|&(key, node)| node.parent.is_none() && !keep(key))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            self.remove(key, ops);
        }
    }

    fn insert(
        &mut self,
        key: NodeKey,
        parent: Option<&NodeKey>,
        props: NodeProps,
        ops: &mut Vec<ViewOp>,
    ) {
        // A child is only attached under a parent that exists.
        let parent = parent.filter(|p| self.nodes.contains_key(p)).cloned();
        if let Some(parent_node) = parent.as_ref().and_then(|p| self.nodes.get_mut(p)) {
            parent_node.children.push(key.clone());
        }
        ops.push(ViewOp::Create {
            key: key.clone(),
            parent: parent.clone(),
            props: props.clone(),
        });
        self.nodes.insert(
            key,
            ViewNode {
                parent,
                props,
                children: Vec::new(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> NodeProps {
        NodeProps::Text(s.to_owned())
    }

    #[test]
    fn upsert_creates_then_updates_then_noops() {
        let mut tree = ViewTree::new();
        let mut ops = Vec::new();
        let key = NodeKey::Header(HeaderSlot::Money);

        tree.upsert(key.clone(), None, text("10"), &mut ops);
        tree.upsert(key.clone(), None, text("20"), &mut ops);
        tree.upsert(key.clone(), None, text("20"), &mut ops);

        assert_eq!(ops.len(), 2);
        assert!(matches!(ops.first(), Some(ViewOp::Create { .. })));
        assert!(matches!(ops.get(1), Some(ViewOp::Update { .. })));
        assert_eq!(tree.text(&key), Some("20"));
    }

    #[test]
    fn ensure_never_rewrites() {
        let mut tree = ViewTree::new();
        let mut ops = Vec::new();
        let key = NodeKey::GrowthCountdown(1);
        tree.ensure(key.clone(), None, text(""), &mut ops);
        tree.set_text(&key, "Next Stage: 01:00", &mut ops);
        tree.ensure(key.clone(), None, text(""), &mut ops);
        assert_eq!(ops.len(), 2);
        assert_eq!(tree.text(&key), Some("Next Stage: 01:00"));
    }

    #[test]
    fn remove_cascades_with_single_op() {
        let mut tree = ViewTree::new();
        let mut ops = Vec::new();
        let plot = NodeKey::Plot(1);
        let info = NodeKey::PlotInfo(1);
        let stage = NodeKey::StageText(1);
        tree.upsert(plot.clone(), None, NodeProps::Panel, &mut ops);
        tree.upsert(info.clone(), Some(&plot), NodeProps::Panel, &mut ops);
        tree.upsert(stage.clone(), Some(&info), text("Stage: 1 / 20"), &mut ops);
        ops.clear();

        assert!(tree.remove(&plot, &mut ops));
        assert_eq!(ops, vec![ViewOp::Remove { key: plot }]);
        assert!(tree.is_empty());
        assert!(!tree.contains(&stage));
    }

    #[test]
    fn reparenting_recreates() {
        let mut tree = ViewTree::new();
        let mut ops = Vec::new();
        let a = NodeKey::Plot(1);
        let b = NodeKey::Plot(2);
        let child = NodeKey::DigUpButton(1);
        tree.upsert(a.clone(), None, NodeProps::Panel, &mut ops);
        tree.upsert(b.clone(), None, NodeProps::Panel, &mut ops);
        tree.upsert(child.clone(), Some(&a), NodeProps::Panel, &mut ops);
        ops.clear();

        tree.upsert(child.clone(), Some(&b), NodeProps::Panel, &mut ops);
        assert_eq!(ops.len(), 2);
        assert!(tree.children(&a).is_empty());
        assert_eq!(tree.children(&b), [child]);
    }

    #[test]
    fn retain_children_filters() {
        let mut tree = ViewTree::new();
        let mut ops = Vec::new();
        let plot = NodeKey::Plot(1);
        tree.upsert(plot.clone(), None, NodeProps::Panel, &mut ops);
        for id in 1..=3 {
            tree.upsert(NodeKey::Fruit(FruitId(id)), Some(&plot), NodeProps::Panel, &mut ops);
        }
        ops.clear();
        tree.retain_children(&plot, |k| *k != NodeKey::Fruit(FruitId(2)), &mut ops);
        assert_eq!(ops.len(), 1);
        assert_eq!(tree.children(&plot).len(), 2);
    }
}
