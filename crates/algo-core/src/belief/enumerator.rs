//! Exact enumeration of hidden assignments consistent with one viewer's knowledge.
//!
//! Each closed slot first gets a local domain (its color, minus everything the
//! viewer can rule out, minus contents outside the nearest opened neighbors).
//! Worlds are then built hand by hand with a depth-first walk that only keeps
//! strictly ascending sequences, which yields the same set as filtering the
//! full Cartesian product of the domains, without materializing it.

use crate::error::GameError;
use crate::game::history::History;
use crate::model::card::CardId;
use crate::model::color::Color;
use crate::model::content::Content;
use crate::model::hand::{ClosedSlot, HandView, OpenedSlot};
use crate::model::player::PlayerId;
use crate::model::rules::Rules;
use std::collections::{BTreeMap, BTreeSet};

/// A closed opponent slot, in the column order shared by every world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRef {
    pub player: PlayerId,
    pub slot: usize,
    pub card_id: CardId,
    pub color: Color,
}

/// All worlds consistent with the viewer's knowledge. Never empty once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeliefState {
    slots: Vec<SlotRef>,
    worlds: Vec<Vec<Content>>,
}

impl BeliefState {
    pub fn slots(&self) -> &[SlotRef] {
        &self.slots
    }

    pub fn worlds(&self) -> &[Vec<Content>] {
        &self.worlds
    }

    pub fn world_count(&self) -> usize {
        self.worlds.len()
    }

    pub fn column(&self, player: PlayerId, slot: usize) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot_ref| slot_ref.player == player && slot_ref.slot == slot)
    }

    /// Belief after learning that `column` holds `content`: the worlds that agree,
    /// with the now-known column dropped. `self` is left untouched.
    pub fn resolve(&self, column: usize, content: Content) -> BeliefState {
        let mut slots = self.slots.clone();
        if column < slots.len() {
            slots.remove(column);
        }
        let worlds = self
            .worlds
            .iter()
            .filter(|world| world.get(column) == Some(&content))
            .map(|world| {
                let mut reduced = world.clone();
                reduced.remove(column);
                reduced
            })
            .collect();
        BeliefState { slots, worlds }
    }

    /// `player`'s closed-slot contents in world `world`, as (slot, content) pairs.
    pub fn assignment(&self, world: usize, player: PlayerId) -> Vec<(usize, Content)> {
        let Some(row) = self.worlds.get(world) else {
            return Vec::new();
        };
        self.slots
            .iter()
            .zip(row.iter())
            .filter(|(slot_ref, _)| slot_ref.player == player)
            .map(|(slot_ref, content)| (slot_ref.slot, *content))
            .collect()
    }
}

/// Contents that can never be hidden in an opponent's hand: everything opened,
/// the viewer's own hand, and the viewer's freshly drawn card.
pub fn global_exclusions(
    own: &[Content],
    opened: &[Content],
    drawn: Option<Content>,
) -> BTreeSet<Content> {
    own.iter()
        .chain(opened.iter())
        .copied()
        .chain(drawn)
        .collect()
}

/// Enumerates the belief state of `viewer` over the closed slots of `opponents`.
pub fn enumerate_worlds(
    rules: &Rules,
    viewer: PlayerId,
    own: &[Content],
    opponents: &[HandView],
    opened: &[Content],
    drawn: Option<Content>,
    history: &History,
) -> Result<BeliefState, GameError> {
    let excluded = global_exclusions(own, opened, drawn);
    enumerate_with_exclusions(rules, Some(viewer), &excluded, opponents, history)
}

/// Lower-level form taking a precomputed exclusion set.
pub fn enumerate_with_exclusions(
    rules: &Rules,
    viewer: Option<PlayerId>,
    excluded: &BTreeSet<Content>,
    targets: &[HandView],
    history: &History,
) -> Result<BeliefState, GameError> {
    let mut slots = Vec::new();
    let mut worlds: Vec<Vec<Content>> = vec![Vec::new()];

    for view in targets {
        let layout = layout(rules, excluded, view, history);
        let mut hand_worlds = Vec::new();
        let mut current = Vec::with_capacity(view.closed.len());
        assign(&layout, 0, None, &mut current, &mut hand_worlds);
        if hand_worlds.is_empty() {
            return Err(GameError::BeliefContradiction {
                viewer,
                hand: view.player,
            });
        }

        slots.extend(view.closed.iter().map(|closed| SlotRef {
            player: view.player,
            slot: closed.slot,
            card_id: closed.card_id,
            color: closed.color,
        }));

        worlds = worlds
            .iter()
            .flat_map(|prefix| {
                hand_worlds.iter().map(move |suffix| {
                    let mut world = Vec::with_capacity(prefix.len() + suffix.len());
                    world.extend_from_slice(prefix);
                    world.extend_from_slice(suffix);
                    world
                })
            })
            .collect();
    }

    Ok(BeliefState { slots, worlds })
}

/// Number of consistent worlds, without building them. Zero means a contradiction.
pub fn count_worlds(
    rules: &Rules,
    excluded: &BTreeSet<Content>,
    targets: &[HandView],
    history: &History,
) -> u64 {
    targets.iter().fold(1u64, |total, view| {
        let layout = layout(rules, excluded, view, history);
        total.saturating_mul(count_ascending(&layout))
    })
}

/// Candidate contents for one closed slot before any joint consistency check.
pub fn candidate_domain(
    rules: &Rules,
    excluded: &BTreeSet<Content>,
    view: &HandView,
    closed: &ClosedSlot,
    history: &History,
) -> Vec<Content> {
    let tried: BTreeSet<Content> = history.failed_guesses(closed.card_id).collect();
    let (lower, upper) = neighbor_bounds(&view.opened, closed.slot);
    rules
        .ranks()
        .map(|rank| Content::new(closed.color, rank))
        .filter(|content| !excluded.contains(content))
        .filter(|content| !tried.contains(content))
        .filter(|content| lower.is_none_or(|bound| bound < *content))
        .filter(|content| upper.is_none_or(|bound| *content < bound))
        .collect()
}

/// Exclusive bounds from the opened slots immediately left and right of `target`.
///
/// Only the adjacent opened neighbors are consulted; chains of closed slots in
/// between are not used to tighten the bound further.
pub fn neighbor_bounds(opened: &[OpenedSlot], target: usize) -> (Option<Content>, Option<Content>) {
    let lower = opened
        .iter()
        .filter(|entry| entry.slot < target)
        .max_by_key(|entry| entry.slot)
        .map(|entry| entry.content);
    let upper = opened
        .iter()
        .filter(|entry| entry.slot > target)
        .min_by_key(|entry| entry.slot)
        .map(|entry| entry.content);
    (lower, upper)
}

#[derive(Debug, Clone)]
enum Position {
    Known(Content),
    Hidden(Vec<Content>),
}

impl Position {
    fn options(&self) -> &[Content] {
        match self {
            Position::Known(content) => std::slice::from_ref(content),
            Position::Hidden(domain) => domain,
        }
    }
}

fn layout(
    rules: &Rules,
    excluded: &BTreeSet<Content>,
    view: &HandView,
    history: &History,
) -> Vec<Position> {
    let mut positions: Vec<Option<Position>> = vec![None; view.len];
    for opened in &view.opened {
        if let Some(entry) = positions.get_mut(opened.slot) {
            *entry = Some(Position::Known(opened.content));
        }
    }
    for closed in &view.closed {
        if let Some(entry) = positions.get_mut(closed.slot) {
            *entry = Some(Position::Hidden(candidate_domain(
                rules, excluded, view, closed, history,
            )));
        }
    }
    // A slot missing from both lists can hold nothing: empty domain.
    positions
        .into_iter()
        .map(|entry| entry.unwrap_or(Position::Hidden(Vec::new())))
        .collect()
}

fn assign(
    layout: &[Position],
    index: usize,
    floor: Option<Content>,
    current: &mut Vec<Content>,
    out: &mut Vec<Vec<Content>>,
) {
    let Some(position) = layout.get(index) else {
        out.push(current.clone());
        return;
    };
    match position {
        Position::Known(content) => {
            if floor.is_none_or(|below| below < *content) {
                assign(layout, index + 1, Some(*content), current, out);
            }
        }
        Position::Hidden(domain) => {
            for &content in domain {
                if floor.is_none_or(|below| below < content) {
                    current.push(content);
                    assign(layout, index + 1, Some(content), current, out);
                    current.pop();
                }
            }
        }
    }
}

fn count_ascending(layout: &[Position]) -> u64 {
    let mut frontier: BTreeMap<Option<Content>, u64> = BTreeMap::new();
    frontier.insert(None, 1);
    for position in layout {
        let mut next: BTreeMap<Option<Content>, u64> = BTreeMap::new();
        for (floor, ways) in &frontier {
            for &content in position.options() {
                if floor.is_none_or(|below| below < content) {
                    let entry = next.entry(Some(content)).or_insert(0);
                    *entry = entry.saturating_add(*ways);
                }
            }
        }
        frontier = next;
    }
    frontier.values().fold(0u64, |acc, ways| acc.saturating_add(*ways))
}
