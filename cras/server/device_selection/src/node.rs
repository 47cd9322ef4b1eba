// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;

/// Identifies an audio node.
///
/// The upper 32 bits hold the device index and the lower 32 bits hold the
/// node index within that device.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn new(dev_index: u32, node_index: u32) -> Self {
        Self((dev_index as u64) << 32 | node_index as u64)
    }

    pub fn dev_index(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub fn node_index(self) -> u32 {
        self.0 as u32
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.dev_index(), self.node_index())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Input, Direction::Output];

    pub fn from_is_input(is_input: bool) -> Self {
        if is_input {
            Direction::Input
        } else {
            Direction::Output
        }
    }

    pub fn is_input(self) -> bool {
        self == Direction::Input
    }

    fn as_str(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of hardware behind a node.
///
/// Selection never looks at the type. It is carried for logs and dumps.
#[repr(u32)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioDeviceType {
    InternalSpeaker = 0,
    Headphone = 1,
    Hdmi = 2,
    Lineout = 3,
    InternalMic = 4,
    Mic = 5,
    FrontMic = 6,
    RearMic = 7,
    KeyboardMic = 8,
    Hotword = 9,
    PostMixLoopback = 10,
    PostDspLoopback = 11,
    AlsaLoopback = 12,
    Usb = 13,
    Bluetooth = 14,
    BluetoothNbMic = 15,
    Other = 16,
}

// Indexed by the discriminant.
const DEVICE_TYPES: &[AudioDeviceType] = &[
    AudioDeviceType::InternalSpeaker,
    AudioDeviceType::Headphone,
    AudioDeviceType::Hdmi,
    AudioDeviceType::Lineout,
    AudioDeviceType::InternalMic,
    AudioDeviceType::Mic,
    AudioDeviceType::FrontMic,
    AudioDeviceType::RearMic,
    AudioDeviceType::KeyboardMic,
    AudioDeviceType::Hotword,
    AudioDeviceType::PostMixLoopback,
    AudioDeviceType::PostDspLoopback,
    AudioDeviceType::AlsaLoopback,
    AudioDeviceType::Usb,
    AudioDeviceType::Bluetooth,
    AudioDeviceType::BluetoothNbMic,
    AudioDeviceType::Other,
];

impl TryFrom<u32> for AudioDeviceType {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Error> {
        DEVICE_TYPES
            .get(value as usize)
            .copied()
            .ok_or(Error::UnknownDeviceType(value))
    }
}

/// A plugged audio node as reported by the device layer.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct AudioNode {
    pub id: NodeId,
    pub is_input: bool,
    pub device_type: AudioDeviceType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Monotonic counter assigned when the node was plugged.
    pub plugged_time: u64,
}

impl AudioNode {
    pub fn new(
        id: NodeId,
        is_input: bool,
        device_type: AudioDeviceType,
        plugged_time: u64,
    ) -> Self {
        Self {
            id,
            is_input,
            device_type,
            name: String::new(),
            plugged_time,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn direction(&self) -> Direction {
        Direction::from_is_input(self.is_input)
    }
}
