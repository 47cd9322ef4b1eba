// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Chooses the active input and output audio node.
//!
//! Each direction keeps its plugged nodes in most-recently-touched order.
//! Plugging or selecting a node moves it to the back; the back is active.
//! Unplugging removes a node without reordering the rest, so the previously
//! touched node takes over when the active one goes away.

pub mod global;
mod mru;
mod node;
pub mod scenario;

use std::collections::HashMap;

use remain::sorted;
use serde::Serialize;
use thiserror::Error;

pub use mru::Iter;
pub use mru::MruList;
pub use node::AudioDeviceType;
pub use node::AudioNode;
pub use node::Direction;
pub use node::NodeId;

#[sorted]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("node {0} is already plugged")]
    DuplicateNode(NodeId),
    #[error("unknown device type {0}")]
    UnknownDeviceType(u32),
    #[error("node {0} is not plugged")]
    UnknownNode(NodeId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Receives the active node of a direction whenever it changes.
pub trait ActiveNodeObserver {
    /// `node_id` is `None` when the last node of `direction` was unplugged.
    fn active_node_changed(&mut self, direction: Direction, node_id: Option<NodeId>);
}

impl ActiveNodeObserver for () {
    fn active_node_changed(&mut self, _direction: Direction, _node_id: Option<NodeId>) {}
}

pub struct DeviceSelectionPolicy<O = ()> {
    input: MruList,
    output: MruList,
    last_plugged_time: Option<u64>,
    observer: O,
}

impl Default for DeviceSelectionPolicy {
    fn default() -> Self {
        Self::new(())
    }
}

#[derive(Serialize)]
struct DirectionDump<'a> {
    active: Option<NodeId>,
    nodes: &'a MruList,
}

#[derive(Serialize)]
struct PolicyDump<'a> {
    input: DirectionDump<'a>,
    output: DirectionDump<'a>,
}

impl<O: ActiveNodeObserver> DeviceSelectionPolicy<O> {
    pub fn new(observer: O) -> Self {
        Self {
            input: MruList::new(),
            output: MruList::new(),
            last_plugged_time: None,
            observer,
        }
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Adds `node` to its direction and makes it active.
    pub fn plug(&mut self, node: AudioNode) -> Result<()> {
        if self.direction_of(node.id).is_some() {
            return Err(Error::DuplicateNode(node.id));
        }
        match self.last_plugged_time {
            Some(last) if node.plugged_time <= last => {
                log::warn!(
                    "node {} plugged at {} which is not after {last}",
                    node.id,
                    node.plugged_time
                );
            }
            _ => self.last_plugged_time = Some(node.plugged_time),
        }
        let direction = node.direction();
        log::info!(
            "plug {direction} node {} type {:?} {:?}",
            node.id,
            node.device_type,
            node.name
        );
        self.update(direction, |list| list.push_back(node));
        Ok(())
    }

    /// Removes the node. The previously touched node of the same direction
    /// becomes active if the removed node was active.
    pub fn unplug(&mut self, id: NodeId) -> Result<AudioNode> {
        let direction = self.direction_of(id).ok_or(Error::UnknownNode(id))?;
        log::info!("unplug {direction} node {id}");
        self.update(direction, |list| list.remove(id)).ok_or(Error::UnknownNode(id))
    }

    /// Makes a plugged node active.
    pub fn select(&mut self, id: NodeId) -> Result<()> {
        let direction = self.direction_of(id).ok_or(Error::UnknownNode(id))?;
        log::info!("select {direction} node {id}");
        self.update(direction, |list| list.move_to_back(id));
        Ok(())
    }

    /// Replaces the plugged set with `nodes`.
    ///
    /// Nodes missing from `nodes` are unplugged, then new nodes are plugged
    /// oldest first so the most recently plugged one ends up active. A node
    /// present before and after keeps its position and has its data
    /// refreshed, unless its `plugged_time` grew: then it was re-plugged and
    /// goes through unplug and plug.
    pub fn update_nodes(&mut self, nodes: impl IntoIterator<Item = AudioNode>) -> Result<()> {
        let mut incoming = HashMap::new();
        let mut snapshot = Vec::new();
        for node in nodes {
            if incoming.insert(node.id, node.direction()).is_some() {
                return Err(Error::DuplicateNode(node.id));
            }
            snapshot.push(node);
        }

        let mut removed = Vec::new();
        for direction in Direction::ALL {
            removed.extend(
                self.list(direction)
                    .ids()
                    .filter(|id| incoming.get(id) != Some(&direction)),
            );
        }
        for id in removed {
            self.unplug(id)?;
        }

        let mut added = Vec::new();
        let mut replugged = Vec::new();
        let mut refreshed = Vec::new();
        for node in snapshot {
            match self.list(node.direction()).get(node.id) {
                Some(stored) if node.plugged_time > stored.plugged_time => {
                    replugged.push(node.id);
                    added.push(node);
                }
                Some(_) => refreshed.push(node),
                None => added.push(node),
            }
        }
        for id in replugged {
            self.unplug(id)?;
        }
        for node in refreshed {
            if let Some(stored) = self.list_mut(node.direction()).get_mut(node.id) {
                *stored = node;
            }
        }

        added.sort_by_key(|node| (node.plugged_time, node.id));
        for node in added {
            self.plug(node)?;
        }
        Ok(())
    }

    /// Unplugs every node.
    pub fn clear(&mut self) {
        for direction in Direction::ALL {
            self.update(direction, |list| *list = MruList::new());
        }
        self.last_plugged_time = None;
    }

    pub fn active_node(&self, direction: Direction) -> Option<NodeId> {
        self.list(direction).back().map(|node| node.id)
    }

    pub fn active_input_node_id(&self) -> Option<NodeId> {
        self.active_node(Direction::Input)
    }

    pub fn active_output_node_id(&self) -> Option<NodeId> {
        self.active_node(Direction::Output)
    }

    /// Plugged nodes of `direction`, least preferred first.
    pub fn nodes(&self, direction: Direction) -> Iter<'_> {
        self.list(direction).iter()
    }

    pub fn node(&self, id: NodeId) -> Option<&AudioNode> {
        self.input.get(id).or_else(|| self.output.get(id))
    }

    pub fn len(&self, direction: Direction) -> usize {
        self.list(direction).len()
    }

    pub fn is_empty(&self, direction: Direction) -> bool {
        self.list(direction).is_empty()
    }

    pub fn dump_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&PolicyDump {
            input: self.dump_direction(Direction::Input),
            output: self.dump_direction(Direction::Output),
        })
    }

    fn dump_direction(&self, direction: Direction) -> DirectionDump<'_> {
        DirectionDump {
            active: self.active_node(direction),
            nodes: self.list(direction),
        }
    }

    fn direction_of(&self, id: NodeId) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|&direction| self.list(direction).contains(id))
    }

    fn list(&self, direction: Direction) -> &MruList {
        match direction {
            Direction::Input => &self.input,
            Direction::Output => &self.output,
        }
    }

    fn list_mut(&mut self, direction: Direction) -> &mut MruList {
        match direction {
            Direction::Input => &mut self.input,
            Direction::Output => &mut self.output,
        }
    }

    // Applies `f` to the list of `direction` and notifies the observer if
    // the active node changed.
    fn update<R>(&mut self, direction: Direction, f: impl FnOnce(&mut MruList) -> R) -> R {
        let before = self.active_node(direction);
        let ret = f(self.list_mut(direction));
        let after = self.active_node(direction);
        if before != after {
            log::debug!("active {direction} node changed: {before:?} -> {after:?}");
            self.observer.active_node_changed(direction, after);
        }
        ret
    }
}
