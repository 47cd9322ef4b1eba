// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::collections::HashMap;

use serde::Serialize;
use serde::Serializer;

use crate::AudioNode;
use crate::NodeId;

// Slot 0 never holds a node. It links the tail back to the head so every
// prev/next index is valid.
const SENTINEL: usize = 0;

struct Link {
    node: Option<AudioNode>,
    prev: usize,
    next: usize,
}

/// Nodes ordered from least recently to most recently touched.
///
/// Nodes live in a vector of slots linked by index. Appending, moving a
/// node to the back and removing any node are O(1).
pub struct MruList {
    slots: Vec<Link>,
    free: Vec<usize>,
    index: HashMap<NodeId, usize>,
}

impl Default for MruList {
    fn default() -> Self {
        Self::new()
    }
}

impl MruList {
    pub fn new() -> Self {
        Self {
            slots: vec![Link {
                node: None,
                prev: SENTINEL,
                next: SENTINEL,
            }],
            free: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&AudioNode> {
        let slot = *self.index.get(&id)?;
        self.slots[slot].node.as_ref()
    }

    /// The stored node may be updated but its id must stay the same.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut AudioNode> {
        let slot = *self.index.get(&id)?;
        self.slots[slot].node.as_mut()
    }

    /// The most recently touched node.
    pub fn back(&self) -> Option<&AudioNode> {
        self.slots[self.slots[SENTINEL].prev].node.as_ref()
    }

    /// Appends `node`. The caller must make sure its id is not present.
    pub fn push_back(&mut self, node: AudioNode) {
        debug_assert!(!self.contains(node.id), "duplicate node {}", node.id);
        let id = node.id;
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot].node = Some(node);
                slot
            }
            None => {
                self.slots.push(Link {
                    node: Some(node),
                    prev: SENTINEL,
                    next: SENTINEL,
                });
                self.slots.len() - 1
            }
        };
        self.index.insert(id, slot);
        self.link_back(slot);
    }

    /// Moves the node to the back. Returns false if it is not present.
    pub fn move_to_back(&mut self, id: NodeId) -> bool {
        let Some(&slot) = self.index.get(&id) else {
            return false;
        };
        self.unlink(slot);
        self.link_back(slot);
        true
    }

    pub fn remove(&mut self, id: NodeId) -> Option<AudioNode> {
        let slot = self.index.remove(&id)?;
        self.unlink(slot);
        self.free.push(slot);
        self.slots[slot].node.take()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            slots: &self.slots,
            cursor: self.slots[SENTINEL].next,
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().map(|node| node.id)
    }

    fn link_back(&mut self, slot: usize) {
        let last = self.slots[SENTINEL].prev;
        self.slots[slot].prev = last;
        self.slots[slot].next = SENTINEL;
        self.slots[last].next = slot;
        self.slots[SENTINEL].prev = slot;
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = (self.slots[slot].prev, self.slots[slot].next);
        self.slots[prev].next = next;
        self.slots[next].prev = prev;
    }
}

pub struct Iter<'a> {
    slots: &'a [Link],
    cursor: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a AudioNode;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == SENTINEL {
            return None;
        }
        let link = &self.slots[self.cursor];
        self.cursor = link.next;
        link.node.as_ref()
    }
}

impl Serialize for MruList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::MruList;
    use crate::AudioDeviceType;
    use crate::AudioNode;
    use crate::NodeId;

    fn usb(id: u64) -> AudioNode {
        AudioNode::new(NodeId(id), false, AudioDeviceType::Usb, id)
    }

    fn ids(list: &MruList) -> Vec<u64> {
        list.ids().map(|id| id.0).collect()
    }

    #[test]
    fn empty() {
        let list = MruList::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert!(list.back().is_none());
        assert_eq!(list.iter().count(), 0);
    }

    #[test]
    fn push_and_move() {
        let mut list = MruList::new();
        for id in 1..=4 {
            list.push_back(usb(id));
        }
        assert_eq!(ids(&list), [1, 2, 3, 4]);
        assert_eq!(list.back().map(|n| n.id), Some(NodeId(4)));

        assert!(list.move_to_back(NodeId(2)));
        assert_eq!(ids(&list), [1, 3, 4, 2]);
        assert!(list.move_to_back(NodeId(2)));
        assert_eq!(ids(&list), [1, 3, 4, 2]);
        assert!(list.move_to_back(NodeId(1)));
        assert_eq!(ids(&list), [3, 4, 2, 1]);
        assert!(!list.move_to_back(NodeId(9)));
    }

    #[test]
    fn remove_anywhere() {
        let mut list = MruList::new();
        for id in 1..=4 {
            list.push_back(usb(id));
        }
        assert_eq!(list.remove(NodeId(1)).map(|n| n.id), Some(NodeId(1)));
        assert_eq!(ids(&list), [2, 3, 4]);
        assert_eq!(list.remove(NodeId(3)).map(|n| n.id), Some(NodeId(3)));
        assert_eq!(ids(&list), [2, 4]);
        assert_eq!(list.remove(NodeId(4)).map(|n| n.id), Some(NodeId(4)));
        assert_eq!(ids(&list), [2]);
        assert!(list.remove(NodeId(4)).is_none());
        assert_eq!(list.back().map(|n| n.id), Some(NodeId(2)));
        assert!(list.remove(NodeId(2)).is_some());
        assert!(list.is_empty());
        assert!(list.back().is_none());
    }

    #[test]
    fn slots_are_reused() {
        let mut list = MruList::new();
        list.push_back(usb(1));
        list.push_back(usb(2));
        list.remove(NodeId(1));
        list.push_back(usb(3));
        assert_eq!(list.slots.len(), 3);
        assert_eq!(ids(&list), [2, 3]);
        assert!(list.get(NodeId(1)).is_none());
        assert_eq!(list.get(NodeId(3)).map(|n| n.plugged_time), Some(3));
    }

    #[test]
    fn get_mut_keeps_position() {
        let mut list = MruList::new();
        list.push_back(usb(1));
        list.push_back(usb(2));
        if let Some(node) = list.get_mut(NodeId(1)) {
            node.name = "Dock".to_string();
        }
        assert_eq!(ids(&list), [1, 2]);
        assert_eq!(list.get(NodeId(1)).map(|n| n.name.as_str()), Some("Dock"));
        assert!(list.get_mut(NodeId(3)).is_none());
    }

    #[test]
    fn serialize_in_order() {
        let mut list = MruList::new();
        list.push_back(usb(1));
        list.push_back(usb(2));
        list.move_to_back(NodeId(1));
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json[0]["id"], 2);
        assert_eq!(json[1]["id"], 1);
        assert_eq!(json[1]["device_type"], "usb");
    }
}
