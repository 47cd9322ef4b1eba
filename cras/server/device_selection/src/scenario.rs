// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::fmt::Display;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use serde::Serialize;

use crate::ActiveNodeObserver;
use crate::AudioNode;
use crate::DeviceSelectionPolicy;
use crate::NodeId;

/// A device topology event as delivered by the device layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Plug(AudioNode),
    Unplug(NodeId),
    Select(NodeId),
    NodesChanged(Vec<AudioNode>),
}

impl Event {
    pub fn apply<O: ActiveNodeObserver>(
        &self,
        policy: &mut DeviceSelectionPolicy<O>,
    ) -> crate::Result<()> {
        match self {
            Event::Plug(node) => policy.plug(node.clone()),
            Event::Unplug(id) => policy.unplug(*id).map(|_| ()),
            Event::Select(id) => policy.select(*id),
            Event::NodesChanged(nodes) => policy.update_nodes(nodes.iter().cloned()),
        }
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::Plug(node) => write!(f, "plug {} {}", node.direction(), node.id),
            Event::Unplug(id) => write!(f, "unplug {id}"),
            Event::Select(id) => write!(f, "select {id}"),
            Event::NodesChanged(nodes) => write!(f, "nodes changed ({} nodes)", nodes.len()),
        }
    }
}

/// An ordered list of events, stored as JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub events: Vec<Event>,
}

impl Scenario {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        serde_json::from_str(s).context("invalid scenario")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read scenario {}", path.display()))?;
        Self::parse(&s).with_context(|| format!("cannot parse scenario {}", path.display()))
    }

    /// Applies the events in order, calling `after_each` after every event.
    /// Stops at the first event the policy rejects.
    pub fn replay<O: ActiveNodeObserver>(
        &self,
        policy: &mut DeviceSelectionPolicy<O>,
        mut after_each: impl FnMut(usize, &Event, &DeviceSelectionPolicy<O>),
    ) -> anyhow::Result<()> {
        for (i, event) in self.events.iter().enumerate() {
            event
                .apply(policy)
                .with_context(|| format!("event #{i} ({event}) failed"))?;
            after_each(i, event, policy);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::AudioDeviceType;

    const SCENARIO: &str = r#"{
  "events": [
    {"plug": {"id": 1, "is_input": false, "device_type": "internal_speaker", "plugged_time": 1}},
    {"plug": {"id": 2, "is_input": false, "device_type": "usb", "name": "Dock", "plugged_time": 2}},
    {"select": 1},
    {"nodes_changed": [
      {"id": 1, "is_input": false, "device_type": "internal_speaker", "plugged_time": 1},
      {"id": 3, "is_input": true, "device_type": "internal_mic", "plugged_time": 3}
    ]},
    {"unplug": 3}
  ]
}"#;

    #[test]
    fn parse() {
        let scenario = Scenario::parse(SCENARIO).unwrap();
        assert_eq!(scenario.events.len(), 5);
        assert_eq!(
            scenario.events[1],
            Event::Plug(
                AudioNode::new(NodeId(2), false, AudioDeviceType::Usb, 2).with_name("Dock")
            )
        );
        assert_eq!(scenario.events[2], Event::Select(NodeId(1)));
        assert_eq!(scenario.events[4].to_string(), "unplug 0:3");
    }

    #[test]
    fn parse_error() {
        let err = Scenario::parse(r#"{"events": [{"eject": 1}]}"#).unwrap_err();
        assert!(format!("{err:#}").contains("invalid scenario"), "{err:#}");
    }

    #[test]
    fn replay() {
        let scenario = Scenario::parse(SCENARIO).unwrap();
        let mut policy = DeviceSelectionPolicy::default();
        let mut seen = vec![];
        scenario
            .replay(&mut policy, |i, _, policy| {
                seen.push((
                    i,
                    policy.active_input_node_id().map(|id| id.0),
                    policy.active_output_node_id().map(|id| id.0),
                ));
            })
            .unwrap();
        assert_eq!(
            seen,
            [
                (0, None, Some(1)),
                (1, None, Some(2)),
                (2, None, Some(1)),
                (3, Some(3), Some(1)),
                (4, None, Some(1)),
            ]
        );
    }

    #[test]
    fn replay_stops_at_failure() {
        let scenario = Scenario {
            events: vec![
                Event::Plug(AudioNode::new(NodeId(1), true, AudioDeviceType::Mic, 1)),
                Event::Select(NodeId(2)),
                Event::Unplug(NodeId(1)),
            ],
        };
        let mut policy = DeviceSelectionPolicy::default();
        let mut count = 0;
        let err = scenario
            .replay(&mut policy, |_, _, _| count += 1)
            .unwrap_err();
        assert_eq!(count, 1);
        let msg = format!("{err:#}");
        assert!(msg.contains("event #1 (select 0:2) failed"), "{msg}");
        assert!(msg.contains("node 0:2 is not plugged"), "{msg}");
        assert_eq!(policy.active_input_node_id(), Some(NodeId(1)));
    }

    #[test]
    fn load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCENARIO.as_bytes()).unwrap();
        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.events.len(), 5);

        let err = Scenario::load(Path::new("/nonexistent/scenario.json")).unwrap_err();
        assert!(format!("{err:#}").contains("cannot read scenario"));
    }
}
