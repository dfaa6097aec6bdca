//! Per-tick refresh of clock-derived text.
//!
//! Runs between syncs against the installed snapshot. It rewrites the text
//! of countdown nodes and adds or drops buff countdowns as buffs expire
//! locally. It only receives the [`ViewTree`], never the placement
//! registry, and never changes a plot's structure.

use std::collections::{BTreeMap, BTreeSet};

use orchard_types::{EffectKind, Snapshot};
use tracing::debug;

use crate::clock::{BuffResidual, DerivedClock, GrowthRule, UNAVAILABLE_COUNTDOWN, format_countdown};
use crate::view::{HeaderSlot, NodeKey, NodeProps, ViewOp, ViewTree};

/// Recompute every clock-derived node. Returns the resulting operations.
pub fn refresh(tree: &mut ViewTree, snapshot: &Snapshot, clock: &DerivedClock) -> Vec<ViewOp> {
    let mut ops = Vec::new();

    tree.set_text(
        &NodeKey::Header(HeaderSlot::NextSpawn),
        &format_countdown(clock.seconds_to_next_spawn()),
        &mut ops,
    );
    tree.set_text(
        &NodeKey::Header(HeaderSlot::NextWeather),
        &format_countdown(clock.seconds_to_next_weather()),
        &mut ops,
    );

    for plot in &snapshot.plots {
        let Some(plant) = plot
            .plant_type_id
            .and_then(|id| snapshot.game_data.plant(id))
        else {
            continue;
        };
        let n = plot.plot_number;

        let countdown = NodeKey::GrowthCountdown(n);
        if tree.contains(&countdown) {
            let projection = clock.growth(
                GrowthRule::for_plant(plant),
                plot.planted_at.as_deref(),
                plot.growth_boost_seconds,
                plot.growth_stage,
            );
            tree.set_text(&countdown, &projection.countdown_text(), &mut ops);
        }

        let panel = NodeKey::EffectsPanel(n);
        if !tree.contains(&panel) {
            continue;
        }
        let buffs = plot.timed_buffs().unwrap_or_else(|e| {
            debug!(plot_number = n, error = %e, "unreadable plot buffs");
            BTreeMap::new()
        });
        let mut shown = BTreeSet::new();
        for (effect, buff) in &buffs {
            let remaining = match clock.buff(&buff.expiry) {
                BuffResidual::Active { seconds_left } => format_countdown(seconds_left),
                BuffResidual::Unavailable => UNAVAILABLE_COUNTDOWN.to_owned(),
                BuffResidual::Expired => continue,
            };
            let key = NodeKey::BuffCountdown(n, effect.clone());
            let text = format!("{}: {remaining}", buff_label(effect));
            if tree.contains(&key) {
                tree.set_text(&key, &text, &mut ops);
            } else {
                tree.upsert(key.clone(), Some(&panel), NodeProps::Text(text), &mut ops);
            }
            shown.insert(key);
        }
        tree.retain_children(&panel, |key| shown.contains(key), &mut ops);
    }

    ops
}

/// Label of a buff countdown; unknown keys show as-is.
pub fn buff_label(effect: &str) -> &str {
    EffectKind::from_key(effect).map_or(effect, |kind| kind.display_name())
}
