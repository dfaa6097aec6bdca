//! Snapshot-to-view reconciliation.
//!
//! The reconciler turns each authoritative snapshot into the smallest batch
//! of [`ViewOp`]s that brings the retained [`ViewTree`] in line with it:
//!
//! 1. Header nodes (user, money, global weather) are upserted.
//! 2. Every board position is classified as locked, empty, planted, or a
//!    placeholder for an unknown plant type. A change of class recreates the
//!    plot container; anything else diffs the children by key.
//! 3. Fruit nodes are keyed by fruit id. New perennial fruit is scattered
//!    through the [`PlacementAllocator`]; fruit that left the snapshot loses
//!    both its node and its placement record.
//! 4. Placement records of plots with no placed fruit left are purged.
//!
//! Countdown text is not touched here. The reconciler creates the countdown
//! nodes empty and the display pass owns their text, so reconciling the same
//! snapshot twice yields no operations at any wall-clock time.

use std::collections::{BTreeMap, BTreeSet};

use orchard_types::{FruitId, FruitTypeId, PlantTypeId, Plot, PlotId, Snapshot};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::config::{DisplayConfig, EngineConfig, PlacementConfig};
use crate::placement::PlacementAllocator;
use crate::profile::{
    HarvestModel, PlantProfile, fruit_scale, resolve_profiles, weather_icon,
};
use crate::view::{
    ButtonAction, FruitAnchor, HeaderSlot, NodeKey, NodeProps, PlotShape, ViewOp, ViewTree,
};
use crate::weather::{WeatherResolver, global_weather_label};

/// A snapshot entity that could not be resolved against the catalog.
///
/// Faults are local: the affected entity renders degraded and the rest of
/// the board reconciles normally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityFault {
    /// A planted plot names a plant type missing from the catalog.
    #[error("plot {plot_number} references unknown plant type {plant_type_id}")]
    UnknownPlantType {
        /// Board position.
        plot_number: u32,
        /// The unresolved reference.
        plant_type_id: PlantTypeId,
    },

    /// A fruit names a fruit type missing from the catalog.
    #[error("fruit {fruit_id} references unknown fruit type {fruit_type_id}")]
    UnknownFruitType {
        /// The fruit.
        fruit_id: FruitId,
        /// The unresolved reference.
        fruit_type_id: FruitTypeId,
    },

    /// A fruit's recorded weather effects could not be decoded.
    #[error("fruit {fruit_id} has unreadable weather effects")]
    MalformedEffects {
        /// The fruit.
        fruit_id: FruitId,
    },

    /// The next purchasable plot has no price in the catalog.
    #[error("plot {plot_number} is purchasable but has no listed cost")]
    MissingPlotCost {
        /// Board position.
        plot_number: u32,
    },
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    /// View mutations, in application order.
    pub ops: Vec<ViewOp>,
    /// Entity-local faults encountered.
    pub faults: Vec<IntegrityFault>,
}

/// Owner of the view tree and the placement registry.
#[derive(Debug, Clone)]
pub struct Reconciler {
    plot_count: u32,
    placement_config: PlacementConfig,
    display: DisplayConfig,
    tree: ViewTree,
    placement: PlacementAllocator,
    rng: StdRng,
}

impl Reconciler {
    /// Reconciler with an empty view.
    ///
    /// Fruit layouts are reproducible when `placement.seed` is set.
    pub fn new(config: &EngineConfig) -> Self {
        let rng = config
            .placement
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            plot_count: config.board.plot_count,
            placement_config: config.placement.clone(),
            display: config.display,
            tree: ViewTree::new(),
            placement: PlacementAllocator::from_config(&config.placement),
            rng,
        }
    }

    /// The retained view.
    pub const fn tree(&self) -> &ViewTree {
        &self.tree
    }

    /// Mutable view for the display pass. The placement registry stays
    /// out of reach.
    pub(crate) const fn view_mut(&mut self) -> &mut ViewTree {
        &mut self.tree
    }

    /// The placement registry.
    pub const fn placement(&self) -> &PlacementAllocator {
        &self.placement
    }

    /// Bring the view in line with `snapshot`.
    pub fn reconcile(&mut self, snapshot: &Snapshot) -> ReconcileReport {
        let profiles = resolve_profiles(&snapshot.game_data, &self.placement_config, &self.display);
        let mut report = ReconcileReport::default();

        self.reconcile_header(snapshot, &mut report.ops);

        let last_position = snapshot
            .plots
            .iter()
            .map(|plot| plot.plot_number)
            .max()
            .unwrap_or(0)
            .max(self.plot_count);
        for plot_number in 1..=last_position {
            self.reconcile_position(plot_number, snapshot, &profiles, &mut report);
        }
        self.tree.retain_roots(
            |key| !matches!(key, NodeKey::Plot(n) if *n > last_position),
            &mut report.ops,
        );

        let scattered: BTreeSet<PlotId> = snapshot
            .plots
            .iter()
            .filter(|plot| {
                plot.plant_type_id
                    .and_then(|id| profiles.get(&id))
                    .is_some_and(|p| matches!(p.model, HarvestModel::Perennial { .. }))
            })
            .map(|plot| plot.id)
            .collect();
        for purged in self.placement.retain_parents(&scattered) {
            debug!(plot_id = %purged, "purged placement records");
        }

        report
    }

    /// Remove every node and forget every placement. Returns the removals.
    pub fn teardown(&mut self) -> Vec<ViewOp> {
        let mut ops = Vec::new();
        self.tree.retain_roots(|_| false, &mut ops);
        self.placement.retain_parents(&BTreeSet::new());
        ops
    }

    // -----------------------------------------------------------------------
    // Header
    // -----------------------------------------------------------------------

    fn reconcile_header(&mut self, snapshot: &Snapshot, ops: &mut Vec<ViewOp>) {
        let tree = &mut self.tree;
        tree.upsert(
            NodeKey::Header(HeaderSlot::Username),
            None,
            NodeProps::Text(snapshot.user.username.clone()),
            ops,
        );
        tree.upsert(
            NodeKey::Header(HeaderSlot::Money),
            None,
            NodeProps::Text(format_money(snapshot.user.money)),
            ops,
        );
        tree.upsert(
            NodeKey::Header(HeaderSlot::GlobalWeather),
            None,
            NodeProps::Text(global_weather_label(&snapshot.global_weather)),
            ops,
        );
        for slot in [HeaderSlot::NextSpawn, HeaderSlot::NextWeather] {
            tree.ensure(NodeKey::Header(slot), None, NodeProps::Text(String::new()), ops);
        }
    }

    // -----------------------------------------------------------------------
    // Plots
    // -----------------------------------------------------------------------

    fn reconcile_position(
        &mut self,
        plot_number: u32,
        snapshot: &Snapshot,
        profiles: &BTreeMap<PlantTypeId, PlantProfile>,
        report: &mut ReconcileReport,
    ) {
        let plot = snapshot.plot_at(plot_number);
        let profile = plot
            .and_then(|p| p.plant_type_id)
            .and_then(|id| profiles.get(&id));
        let shape = classify(plot, profile);
        if let PlotShape::Placeholder { .. } = shape {
            if let Some(plant_type_id) = plot.and_then(|p| p.plant_type_id) {
                warn!(plot_number, plant_type_id = %plant_type_id, "plot references unknown plant type");
                report.faults.push(IntegrityFault::UnknownPlantType {
                    plot_number,
                    plant_type_id,
                });
            }
        }

        let ready = matches!(
            (profile.map(|p| p.model), plot),
            (Some(HarvestModel::SingleHarvest { .. }), Some(p)) if !p.fruits.is_empty()
        );

        let container = NodeKey::Plot(plot_number);
        let previous = match self.tree.props(&container) {
            Some(NodeProps::Plot { shape, .. }) => Some(*shape),
            _ => None,
        };
        if let Some(old) = previous.filter(|old| *old != shape) {
            self.tree.remove(&container, &mut report.ops);
            if let Some(old_id) = shape_plot_id(old) {
                self.placement.purge(old_id);
            }
            debug!(plot_number, ?old, new = ?shape, "plot container recreated");
        }
        self.tree.upsert(
            container.clone(),
            None,
            NodeProps::Plot { shape, ready },
            &mut report.ops,
        );

        let mut wanted = BTreeSet::new();
        match (plot, profile) {
            (None, _) => self.locked_children(plot_number, snapshot, &mut wanted, report),
            (Some(plot), None) if plot.plant_type_id.is_none() => {
                self.upsert(
                    &mut wanted,
                    NodeKey::PlantSeedButton(plot_number),
                    &container,
                    button("Plant Seed", ButtonAction::PlantSeed { plot_id: plot.id }),
                    &mut report.ops,
                );
            }
            (Some(_), None) => {
                self.upsert(
                    &mut wanted,
                    NodeKey::PlotNotice(plot_number),
                    &container,
                    NodeProps::Text("Unknown plant".to_owned()),
                    &mut report.ops,
                );
            }
            (Some(plot), Some(profile)) => {
                self.planted_children(plot, profile, ready, snapshot, &mut wanted, report);
            }
        }

        self.prune(&container, &wanted, &mut report.ops);
    }

    fn locked_children(
        &mut self,
        plot_number: u32,
        snapshot: &Snapshot,
        wanted: &mut BTreeSet<NodeKey>,
        report: &mut ReconcileReport,
    ) {
        let container = NodeKey::Plot(plot_number);
        let owned = u32::try_from(snapshot.owned_plot_count()).unwrap_or(u32::MAX);
        let purchasable = plot_number == owned.saturating_add(1);
        let cost = snapshot.game_data.plot_cost(plot_number);

        let notice = match (purchasable, cost) {
            (true, Some(cost)) => format!("Locked\nCost: {}", format_money(cost)),
            _ => "Locked".to_owned(),
        };
        self.upsert(
            wanted,
            NodeKey::PlotNotice(plot_number),
            &container,
            NodeProps::Text(notice),
            &mut report.ops,
        );

        match (purchasable, cost) {
            (true, Some(cost)) => self.upsert(
                wanted,
                NodeKey::BuyPlotButton(plot_number),
                &container,
                button(
                    "Buy Plot",
                    ButtonAction::BuyPlot {
                        plot_number,
                        cost,
                    },
                ),
                &mut report.ops,
            ),
            (true, None) => {
                warn!(plot_number, "purchasable plot has no listed cost");
                report
                    .faults
                    .push(IntegrityFault::MissingPlotCost { plot_number });
            }
            (false, _) => {}
        }
    }

    fn planted_children(
        &mut self,
        plot: &Plot,
        profile: &PlantProfile,
        ready: bool,
        snapshot: &Snapshot,
        wanted: &mut BTreeSet<NodeKey>,
        report: &mut ReconcileReport,
    ) {
        let n = plot.plot_number;
        let container = NodeKey::Plot(n);
        let info = NodeKey::PlotInfo(n);
        self.upsert(wanted, info.clone(), &container, NodeProps::Panel, &mut report.ops);

        if ready {
            self.upsert(
                wanted,
                NodeKey::ReadyLabel(n),
                &info,
                NodeProps::Text("Ready to Harvest!".to_owned()),
                &mut report.ops,
            );
        } else {
            self.upsert(
                wanted,
                NodeKey::PlotTitle(n),
                &info,
                NodeProps::Text(profile.name.clone()),
                &mut report.ops,
            );
            self.upsert(
                wanted,
                NodeKey::StageText(n),
                &info,
                NodeProps::Text(format!(
                    "Stage: {} / {}",
                    plot.growth_stage, profile.rule.max_stage
                )),
                &mut report.ops,
            );
            for (key, props) in [
                (NodeKey::GrowthCountdown(n), NodeProps::Text(String::new())),
                (NodeKey::EffectsPanel(n), NodeProps::Panel),
            ] {
                self.tree.ensure(key.clone(), Some(&info), props, &mut report.ops);
                wanted.insert(key);
            }
            self.upsert(
                wanted,
                NodeKey::PlantImage(n),
                &container,
                NodeProps::Image(profile.plant_image(plot.growth_stage)),
                &mut report.ops,
            );
            self.upsert(
                wanted,
                NodeKey::FertilizerButton(n),
                &container,
                button(
                    "Use Fertilizer",
                    ButtonAction::UseFertilizer { plot_id: plot.id },
                ),
                &mut report.ops,
            );
        }

        self.reconcile_fruits(plot, profile, snapshot, wanted, report);

        self.upsert(
            wanted,
            NodeKey::DigUpButton(n),
            &container,
            button(
                "Dig Up",
                ButtonAction::DigUp {
                    plot_id: plot.id,
                    plant_name: profile.name.clone(),
                },
            ),
            &mut report.ops,
        );
    }

    fn reconcile_fruits(
        &mut self,
        plot: &Plot,
        profile: &PlantProfile,
        snapshot: &Snapshot,
        wanted: &mut BTreeSet<NodeKey>,
        report: &mut ReconcileReport,
    ) {
        let container = NodeKey::Plot(plot.plot_number);
        let resolver = WeatherResolver::new(&snapshot.game_data);

        // Stale records go first so new fruit is placed against live fruit only.
        let live: BTreeSet<FruitId> = plot.fruits.iter().map(|fruit| fruit.id).collect();
        for released in self.placement.retain_fruits(plot.id, &live) {
            debug!(plot_id = %plot.id, fruit_id = %released, "released fruit placement");
        }

        for fruit in &plot.fruits {
            let Some(fruit_type) = snapshot.game_data.fruit(fruit.fruit_type_id) else {
                warn!(
                    fruit_id = %fruit.id,
                    fruit_type_id = %fruit.fruit_type_id,
                    "fruit references unknown fruit type"
                );
                report.faults.push(IntegrityFault::UnknownFruitType {
                    fruit_id: fruit.id,
                    fruit_type_id: fruit.fruit_type_id,
                });
                continue;
            };

            let anchor = match profile.model {
                HarvestModel::SingleHarvest { .. } => FruitAnchor::Anchored,
                HarvestModel::Perennial { range, .. } => {
                    let placed = self.placement.place(plot.id, fruit.id, range, &mut self.rng);
                    FruitAnchor::At(placed.position)
                }
            };
            let scale = fruit_scale(
                fruit.weight,
                self.display.fruit_base_weight,
                profile.model.scale(),
            );
            let fruit_key = NodeKey::Fruit(fruit.id);
            self.upsert(
                wanted,
                fruit_key.clone(),
                &container,
                NodeProps::Fruit {
                    image: profile.fruit_image(&fruit_type.image_suffix),
                    anchor,
                    scale,
                },
                &mut report.ops,
            );

            match fruit.effect_ids() {
                Ok(ids) => {
                    if let Some(weather) = resolver.resolve(&ids) {
                        self.upsert(
                            wanted,
                            NodeKey::WeatherIcon(fruit.id),
                            &fruit_key,
                            NodeProps::WeatherIcon {
                                icon: weather_icon(&weather.icon),
                                name: weather.name,
                            },
                            &mut report.ops,
                        );
                    }
                }
                Err(e) => {
                    warn!(fruit_id = %fruit.id, error = %e, "unreadable fruit weather effects");
                    report
                        .faults
                        .push(IntegrityFault::MalformedEffects { fruit_id: fruit.id });
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn upsert(
        &mut self,
        wanted: &mut BTreeSet<NodeKey>,
        key: NodeKey,
        parent: &NodeKey,
        props: NodeProps,
        ops: &mut Vec<ViewOp>,
    ) {
        wanted.insert(key.clone());
        self.tree.upsert(key, Some(parent), props, ops);
    }

    /// Remove every node under `root` that this pass did not produce.
    /// Buff countdowns belong to the display pass and are left alone.
    fn prune(&mut self, root: &NodeKey, wanted: &BTreeSet<NodeKey>, ops: &mut Vec<ViewOp>) {
        let mut stack = vec![root.clone()];
        while let Some(parent) = stack.pop() {
            self.tree.retain_children(
                &parent,
                |child| wanted.contains(child) || matches!(child, NodeKey::BuffCountdown(..)),
                ops,
            );
            stack.extend(
                self.tree
                    .children(&parent)
                    .iter()
                    .filter(|child| wanted.contains(*child))
                    .cloned(),
            );
        }
    }
}

fn classify(plot: Option<&Plot>, profile: Option<&PlantProfile>) -> PlotShape {
    match (plot, profile) {
        (None, _) => PlotShape::Locked,
        (Some(plot), Some(profile)) => PlotShape::Planted {
            plot_id: plot.id,
            plant_type_id: profile.id,
        },
        (Some(plot), None) if plot.plant_type_id.is_some() => {
            PlotShape::Placeholder { plot_id: plot.id }
        }
        (Some(plot), None) => PlotShape::Empty { plot_id: plot.id },
    }
}

const fn shape_plot_id(shape: PlotShape) -> Option<PlotId> {
    match shape {
        PlotShape::Locked => None,
        PlotShape::Empty { plot_id }
        | PlotShape::Planted { plot_id, .. }
        | PlotShape::Placeholder { plot_id } => Some(plot_id),
    }
}

fn button(label: &str, action: ButtonAction) -> NodeProps {
    NodeProps::Button {
        label: label.to_owned(),
        action,
    }
}

/// Render a balance with thousands separators.
pub fn format_money(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::new();
    if amount < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && digits.len().saturating_sub(i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_grouping() {
        assert_eq!(format_money(0), "0");
        assert_eq!(format_money(999), "999");
        assert_eq!(format_money(1200), "1,200");
        assert_eq!(format_money(15_000_000), "15,000,000");
        assert_eq!(format_money(-4500), "-4,500");
    }

    #[test]
    fn classification() {
        assert_eq!(classify(None, None), PlotShape::Locked);
        let plot = Plot {
            id: PlotId(3),
            plot_number: 1,
            plant_type_id: None,
            growth_stage: 0,
            planted_at: None,
            growth_boost_seconds: 0.0,
            fertilizer_applied_effect: None,
            fruits: Vec::new(),
        };
        assert_eq!(
            classify(Some(&plot), None),
            PlotShape::Empty { plot_id: PlotId(3) }
        );
        let orphan = Plot {
            plant_type_id: Some(PlantTypeId(42)),
            ..plot
        };
        assert_eq!(
            classify(Some(&orphan), None),
            PlotShape::Placeholder { plot_id: PlotId(3) }
        );
    }
}
