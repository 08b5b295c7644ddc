use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::error::ControlError;
use crate::view::MAX_VIEWS;

/// External mutation request. Every control-surface call becomes one of
/// these, queued and applied only at phase 1 of the next tick so phases
/// 2-5 always see a consistent snapshot.
#[derive(Debug, Clone)]
pub enum ControlCommand {
    SetLocation(String),
    SetViewCount(usize),
    SetTurbidityForView { view: usize, value: f32 },
    SpawnEntityGroup { preset: String, group: String },
    SpawnEntityGroupInHabitats {
        preset: String,
        group: String,
        habitats: Vec<String>,
    },
    SetEntityGroupPopulation { group: String, fraction: f32 },
    SetEntityGroupViewVisibility {
        group: String,
        view: usize,
        fraction: f32,
    },
    RemoveEntityGroup(String),
    /// The asset-loading collaborator signals a preset's visuals are ready;
    /// deferred spawns for it are released.
    NotifyAssetsReady(String),
}

pub fn command_queue() -> (Sender<ControlCommand>, Receiver<ControlCommand>) {
    crossbeam_channel::unbounded()
}

/// Drain everything queued since the last tick. Only the simulation calls
/// this, once per tick.
pub fn drain(receiver: &Receiver<ControlCommand>, mut apply: impl FnMut(ControlCommand)) {
    loop {
        match receiver.try_recv() {
            Ok(command) => {
                log::debug!("applying control command: {command:?}");
                apply(command);
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }
}

/// Cheap-to-clone handle the control surfaces (UI, network listener,
/// scripted setup) use to enqueue commands from any thread. Argument
/// ranges are validated here, before anything reaches the queue.
#[derive(Clone)]
pub struct ControlHandle {
    sender: Sender<ControlCommand>,
}

impl ControlHandle {
    pub fn new(sender: Sender<ControlCommand>) -> Self {
        Self { sender }
    }

    fn send(&self, command: ControlCommand) -> Result<(), ControlError> {
        self.sender
            .send(command)
            .map_err(|_| ControlError::QueueClosed)
    }

    pub fn set_location(&self, name: &str) -> Result<(), ControlError> {
        self.send(ControlCommand::SetLocation(name.to_owned()))
    }

    pub fn set_view_count(&self, n: usize) -> Result<(), ControlError> {
        if !(1..=MAX_VIEWS).contains(&n) {
            return Err(ControlError::ViewCountOutOfRange(n));
        }
        self.send(ControlCommand::SetViewCount(n))
    }

    pub fn set_turbidity_for_view(&self, view: usize, value: f32) -> Result<(), ControlError> {
        if view >= MAX_VIEWS {
            return Err(ControlError::ViewIndexOutOfRange(view));
        }
        if !(-1.0..=1.0).contains(&value) {
            return Err(ControlError::TurbidityOutOfRange(value));
        }
        self.send(ControlCommand::SetTurbidityForView { view, value })
    }

    pub fn spawn_entity_group(&self, preset: &str, group: &str) -> Result<(), ControlError> {
        self.send(ControlCommand::SpawnEntityGroup {
            preset: preset.to_owned(),
            group: group.to_owned(),
        })
    }

    pub fn spawn_entity_group_in_habitats(
        &self,
        preset: &str,
        group: &str,
        habitats: &[String],
    ) -> Result<(), ControlError> {
        self.send(ControlCommand::SpawnEntityGroupInHabitats {
            preset: preset.to_owned(),
            group: group.to_owned(),
            habitats: habitats.to_vec(),
        })
    }

    pub fn set_entity_group_population(
        &self,
        group: &str,
        fraction: f32,
    ) -> Result<(), ControlError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ControlError::FractionOutOfRange(fraction));
        }
        self.send(ControlCommand::SetEntityGroupPopulation {
            group: group.to_owned(),
            fraction,
        })
    }

    pub fn set_entity_group_view_visibility(
        &self,
        group: &str,
        view: usize,
        fraction: f32,
    ) -> Result<(), ControlError> {
        if view >= MAX_VIEWS {
            return Err(ControlError::ViewIndexOutOfRange(view));
        }
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ControlError::FractionOutOfRange(fraction));
        }
        self.send(ControlCommand::SetEntityGroupViewVisibility {
            group: group.to_owned(),
            view,
            fraction,
        })
    }

    pub fn remove_entity_group(&self, group: &str) -> Result<(), ControlError> {
        self.send(ControlCommand::RemoveEntityGroup(group.to_owned()))
    }

    pub fn notify_assets_ready(&self, preset: &str) -> Result<(), ControlError> {
        self.send(ControlCommand::NotifyAssetsReady(preset.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_validates_ranges_before_queueing() {
        let (tx, rx) = command_queue();
        let handle = ControlHandle::new(tx);

        assert!(handle.set_view_count(0).is_err());
        assert!(handle.set_view_count(5).is_err());
        assert!(handle.set_turbidity_for_view(4, 0.0).is_err());
        assert!(handle.set_turbidity_for_view(0, 2.0).is_err());
        assert!(handle.set_entity_group_population("g", 1.5).is_err());
        assert!(rx.is_empty());

        assert!(handle.set_view_count(2).is_ok());
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn drain_empties_the_queue() {
        let (tx, rx) = command_queue();
        let handle = ControlHandle::new(tx);
        handle.set_view_count(2).unwrap();
        handle.set_location("Reef").unwrap();

        let mut seen = 0;
        drain(&rx, |_| seen += 1);
        assert_eq!(seen, 2);
        assert!(rx.is_empty());
    }
}
