//! Subscriber-side copies of a channel's session.
//!
//! A view starts from a [`Snapshot`] and folds the channel's [`Envelope`]s in
//! sequence order with the same [`Session::apply`] the router uses.
//! Audience views only read; the presenter view can also build commands and
//! preview clustering locally with the shared engine.


use crate::clusterer::{Cluster, ClusterError, kmeans};
use crate::router::Command;
use crate::session::{Envelope, Session, Snapshot, Step};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which side of the demo a connection is on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Presenter,
    #[default]
    Audience,
}

impl Role {
    pub fn can_drive(&self) -> bool {
        matches!(self, Role::Presenter)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MirrorError {
    /// Events were skipped; the view must resync from a fresh snapshot
    #[error("Missed events: expected seq {expected}, got {got}")]
    SequenceGap { expected: u64, got: u64 },

    #[error("Event for channel {got} applied to view of {expected}")]
    ChannelMismatch { expected: String, got: String },
}

/// Local copy of one channel's session
#[derive(Debug, Clone)]
pub struct MirrorView {
    channel: String,
    session: Session,
    last_seq: u64,
    /// Cosmetic animation counter, advances only while clustering runs
    pulse: u32,
}

impl MirrorView {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            channel: snapshot.channel,
            session: snapshot.session,
            last_seq: snapshot.seq,
            pulse: 0,
        }
    }

    /// Fold one envelope.
    ///
    /// Returns `Ok(false)` for events already contained in the snapshot.
    pub fn apply(&mut self, envelope: &Envelope) -> Result<bool, MirrorError> {
        if envelope.channel != self.channel {
            return Err(MirrorError::ChannelMismatch {
                expected: self.channel.clone(),
                got: envelope.channel.clone(),
            });
        }

        if envelope.seq <= self.last_seq {
            return Ok(false);
        }
        if envelope.seq != self.last_seq + 1 {
            return Err(MirrorError::SequenceGap {
                expected: self.last_seq + 1,
                got: envelope.seq,
            });
        }

        self.session.apply(&envelope.event);
        self.last_seq = envelope.seq;
        if self.session.step != Step::ClusteringRunning {
            self.pulse = 0;
        }
        Ok(true)
    }

    /// Replace local state with a fresh snapshot of the same channel
    pub fn resync(&mut self, snapshot: Snapshot) -> Result<(), MirrorError> {
        if snapshot.channel != self.channel {
            return Err(MirrorError::ChannelMismatch {
                expected: self.channel.clone(),
                got: snapshot.channel,
            });
        }
        self.session = snapshot.session;
        self.last_seq = snapshot.seq;
        self.pulse = 0;
        Ok(())
    }

    /// Advance the processing animation; stays at 0 unless clustering runs
    pub fn tick(&mut self) -> u32 {
        if self.session.step == Step::ClusteringRunning {
            self.pulse = self.pulse.wrapping_add(1);
        } else {
            self.pulse = 0;
        }
        self.pulse
    }

    pub fn pulse(&self) -> u32 {
        self.pulse
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }
}

/// Read-only view for audience members
#[derive(Debug, Clone)]
pub struct AudienceView {
    mirror: MirrorView,
}

impl AudienceView {
    pub fn join(snapshot: Snapshot) -> Self {
        Self {
            mirror: MirrorView::from_snapshot(snapshot),
        }
    }

    pub fn apply(&mut self, envelope: &Envelope) -> Result<bool, MirrorError> {
        self.mirror.apply(envelope)
    }

    pub fn resync(&mut self, snapshot: Snapshot) -> Result<(), MirrorError> {
        self.mirror.resync(snapshot)
    }

    pub fn tick(&mut self) -> u32 {
        self.mirror.tick()
    }

    pub fn mirror(&self) -> &MirrorView {
        &self.mirror
    }
}

/// The driving view: mirrors state like everyone else and issues commands.
///
/// Commands are not applied locally; the presenter waits for its own echo.
#[derive(Debug, Clone)]
pub struct PresenterView {
    mirror: MirrorView,
}

impl PresenterView {
    pub fn join(snapshot: Snapshot) -> Self {
        Self {
            mirror: MirrorView::from_snapshot(snapshot),
        }
    }

    pub fn apply(&mut self, envelope: &Envelope) -> Result<bool, MirrorError> {
        self.mirror.apply(envelope)
    }

    pub fn resync(&mut self, snapshot: Snapshot) -> Result<(), MirrorError> {
        self.mirror.resync(snapshot)
    }

    pub fn tick(&mut self) -> u32 {
        self.mirror.tick()
    }

    pub fn mirror(&self) -> &MirrorView {
        &self.mirror
    }

    pub fn start(&self, script_id: impl Into<String>) -> Command {
        Command::Start {
            script_id: script_id.into(),
        }
    }

    pub fn add_point(&self, x: f64, y: f64) -> Command {
        Command::AddPoint { id: None, x, y }
    }

    pub fn move_point(&self, id: impl Into<String>, x: f64, y: f64) -> Command {
        Command::MovePoint {
            id: id.into(),
            x,
            y,
        }
    }

    pub fn remove_point(&self, id: impl Into<String>) -> Command {
        Command::RemovePoint { id: id.into() }
    }

    pub fn clear_points(&self) -> Command {
        Command::ClearPoints
    }

    pub fn run_clustering(&self, k: Option<usize>) -> Command {
        Command::RunClustering { k }
    }

    pub fn stop(&self) -> Command {
        Command::Stop
    }

    /// Cluster the mirrored points locally without touching the mirror.
    ///
    /// Runs the same engine the router does, so only the random seeding can
    /// make the preview differ from the authoritative result.
    pub fn preview_clusters(
        &self,
        k: Option<usize>,
        seed: Option<u64>,
    ) -> Result<Vec<Cluster>, ClusterError> {
        let session = self.mirror.session();
        let k = k.unwrap_or_else(|| session.default_k());
        kmeans(&session.points, k, seed)
    }
}
