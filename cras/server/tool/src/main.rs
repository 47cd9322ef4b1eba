// Copyright 2025 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use cras_device_selection::scenario::Event;
use cras_device_selection::scenario::Scenario;
use cras_device_selection::ActiveNodeObserver;
use cras_device_selection::AudioDeviceType;
use cras_device_selection::AudioNode;
use cras_device_selection::DeviceSelectionPolicy;
use cras_device_selection::Direction;
use cras_device_selection::NodeId;

#[derive(Parser)]
enum Cli {
    /// Replay a device event scenario and print the active nodes.
    Replay(ReplayCommand),
    /// Print an example scenario.
    #[command(name = "example-scenario")]
    ExampleScenario(ExampleScenarioCommand),
}

trait Command {
    fn run(self) -> anyhow::Result<()>;
}

impl Command for Cli {
    fn run(self) -> anyhow::Result<()> {
        match self {
            Cli::Replay(c) => c.run(),
            Cli::ExampleScenario(c) => c.run(),
        }
    }
}

struct LoggingObserver;

impl ActiveNodeObserver for LoggingObserver {
    fn active_node_changed(&mut self, direction: Direction, node_id: Option<NodeId>) {
        match node_id {
            Some(id) => log::info!("active {direction} node is now {id}"),
            None => log::info!("no active {direction} node"),
        }
    }
}

fn format_active(id: Option<NodeId>) -> String {
    id.map_or_else(|| "none".to_string(), |id| id.to_string())
}

#[derive(Args)]
struct ReplayCommand {
    /// Path to the scenario JSON file.
    path: PathBuf,

    /// Print the final state as JSON instead of the active nodes after
    /// each event.
    #[arg(long)]
    dump: bool,
}

impl Command for ReplayCommand {
    fn run(self) -> anyhow::Result<()> {
        let scenario = Scenario::load(&self.path)?;
        let mut policy = DeviceSelectionPolicy::new(LoggingObserver);
        scenario.replay(&mut policy, |i, event, policy| {
            if !self.dump {
                println!(
                    "#{i} {event}: input={} output={}",
                    format_active(policy.active_input_node_id()),
                    format_active(policy.active_output_node_id())
                );
            }
        })?;
        if self.dump {
            println!("{}", policy.dump_json()?);
        }
        Ok(())
    }
}

#[derive(Args)]
struct ExampleScenarioCommand;

impl Command for ExampleScenarioCommand {
    fn run(self) -> anyhow::Result<()> {
        let output = |id, device_type, plugged_time| {
            AudioNode::new(NodeId(id), false, device_type, plugged_time)
        };
        let scenario = Scenario {
            events: vec![
                Event::Plug(output(1, AudioDeviceType::InternalSpeaker, 1).with_name("Speaker")),
                Event::Plug(output(2, AudioDeviceType::Hdmi, 2).with_name("HDMI")),
                Event::Plug(output(3, AudioDeviceType::Usb, 3).with_name("USB")),
                Event::Select(NodeId(2)),
                Event::Plug(output(4, AudioDeviceType::Headphone, 4).with_name("Headphone")),
                Event::Unplug(NodeId(4)),
            ],
        };
        println!("{}", serde_json::to_string_pretty(&scenario)?);
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    Cli::parse().run()
}
