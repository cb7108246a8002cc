mod command;
mod explain;
mod hub;


pub use command::Command;
pub use hub::ChannelHub;

use crate::catalog::DemoCatalog;
use crate::clusterer::{Cluster, ClusteringEngine, KMeans, annotate_points};
use crate::session::{CommandError, Envelope, Event, Point, PointId, Session, Snapshot};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Pause between announcing a clustering run and computing it
pub const DEFAULT_CLUSTERING_DELAY: Duration = Duration::from_millis(1500);

/// Events buffered per subscriber before it lags
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Session plus the sequence number of the last event folded into it
struct RouterState {
    session: Session,
    seq: u64,
}

/// Shared handle on a channel's state and its event sender.
///
/// Each event is folded into the session and sent while the state lock is
/// held, so every subscriber observes events in acceptance order.
#[derive(Clone)]
struct Broadcaster {
    channel: String,
    state: Arc<Mutex<RouterState>>,
    events: broadcast::Sender<Envelope>,
}

impl Broadcaster {
    fn lock(&self) -> MutexGuard<'_, RouterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fold `event` into the session and fan it out. Caller holds the state lock.
    fn publish(&self, state: &mut RouterState, event: Event) -> Envelope {
        state.session.apply(&event);
        state.seq += 1;

        let envelope = Envelope {
            channel: self.channel.clone(),
            seq: state.seq,
            event,
        };

        // No receivers is fine; the next joiner gets a snapshot.
        let _ = self.events.send(envelope.clone());
        envelope
    }
}

/// Sole mutator of one channel's session and the fan-out point for its events.
///
/// Whole commands are serialized by `gate`, which stays held across the
/// clustering delay; joins never touch it.
pub struct Router {
    broadcaster: Broadcaster,
    catalog: Arc<DemoCatalog>,
    engine: Arc<dyn ClusteringEngine>,
    gate: Arc<tokio::sync::Mutex<()>>,
    clustering_delay: Duration,
}

/// Second half of a clustering run, after `clustering-started` went out
struct PendingRun {
    broadcaster: Broadcaster,
    engine: Arc<dyn ClusteringEngine>,
    delay: Duration,
    points: Vec<Point>,
    k: usize,
}

impl PendingRun {
    async fn finish(self) -> Result<Vec<Cluster>, CommandError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let engine = Arc::clone(&self.engine);
        let input = self.points.clone();
        let k = self.k;
        let outcome = match tokio::task::spawn_blocking(move || engine.cluster(&input, k)).await {
            Ok(Ok(clusters)) => Ok(clusters),
            Ok(Err(e)) => Err(e.to_string()),
            Err(e) => Err(format!("clustering task aborted: {}", e)),
        };

        let channel = &self.broadcaster.channel;
        let mut state = self.broadcaster.lock();
        match outcome {
            Ok(clusters) => {
                let annotated = annotate_points(&self.points, &clusters);
                let explanations =
                    explain::clustering_complete(self.engine.name(), &clusters, annotated.len());
                info!(channel = %channel, clusters = clusters.len(), "clustering complete");
                self.broadcaster.publish(
                    &mut state,
                    Event::ClusteringComplete {
                        clusters: clusters.clone(),
                        points: annotated,
                        explanations,
                    },
                );
                Ok(clusters)
            }
            Err(reason) => {
                warn!(channel = %channel, %reason, "clustering failed");
                self.broadcaster.publish(
                    &mut state,
                    Event::ClusteringFailed {
                        explanations: explain::clustering_failed(&reason),
                    },
                );
                Err(CommandError::ComputationFailure(reason))
            }
        }
    }
}

/// Builder for a [`Router`]
pub struct RouterBuilder {
    channel: String,
    catalog: Arc<DemoCatalog>,
    engine: Arc<dyn ClusteringEngine>,
    clustering_delay: Duration,
    capacity: usize,
}

impl RouterBuilder {
    pub fn new(channel: impl Into<String>, catalog: Arc<DemoCatalog>) -> Self {
        Self {
            channel: channel.into(),
            catalog,
            engine: Arc::new(KMeans::new()),
            clustering_delay: DEFAULT_CLUSTERING_DELAY,
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn engine(mut self, engine: Arc<dyn ClusteringEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn clustering_delay(mut self, delay: Duration) -> Self {
        self.clustering_delay = delay;
        self
    }

    /// Per-subscriber event buffer, at least 1
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn build(self) -> Router {
        let (events, _) = broadcast::channel(self.capacity);
        Router {
            broadcaster: Broadcaster {
                channel: self.channel,
                state: Arc::new(Mutex::new(RouterState {
                    session: Session::new(),
                    seq: 0,
                })),
                events,
            },
            catalog: self.catalog,
            engine: self.engine,
            gate: Arc::new(tokio::sync::Mutex::new(())),
            clustering_delay: self.clustering_delay,
        }
    }
}

impl Router {
    pub fn builder(channel: impl Into<String>, catalog: Arc<DemoCatalog>) -> RouterBuilder {
        RouterBuilder::new(channel, catalog)
    }

    pub fn channel(&self) -> &str {
        &self.broadcaster.channel
    }

    pub fn subscriber_count(&self) -> usize {
        self.broadcaster.events.receiver_count()
    }

    /// Consistent copy of the current session
    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock_state();
        self.snapshot_of(&state)
    }

    /// Join the channel: a snapshot plus a receiver that yields exactly the
    /// events after it.
    pub fn subscribe(&self) -> (Snapshot, broadcast::Receiver<Envelope>) {
        let state = self.lock_state();
        let rx = self.broadcaster.events.subscribe();
        let snapshot = self.snapshot_of(&state);
        debug!(channel = self.channel(), seq = snapshot.seq, "subscriber joined");
        (snapshot, rx)
    }

    /// Dispatch a wire command to the matching operation
    pub async fn execute(&self, command: Command) -> Result<(), CommandError> {
        match command {
            Command::Start { script_id } => self.start(&script_id).await,
            Command::AddPoint { id, x, y } => self.add_point(id, x, y).await.map(|_| ()),
            Command::MovePoint { id, x, y } => self.move_point(&id, x, y).await.map(|_| ()),
            Command::RemovePoint { id } => self.remove_point(&id).await,
            Command::ClearPoints => self.clear_points().await,
            Command::RunClustering { k } => self.run_clustering(k).await.map(|_| ()),
            Command::Stop => {
                self.stop().await;
                Ok(())
            }
        }
    }

    /// Activate a demo, discarding whatever the session held
    pub async fn start(&self, script_id: &str) -> Result<(), CommandError> {
        let _gate = self.gate.lock().await;

        let demo = self
            .catalog
            .get(script_id)
            .ok_or_else(|| CommandError::NotFound(format!("demo '{}'", script_id)))?;

        info!(channel = self.channel(), script_id, "session started");
        let mut state = self.lock_state();
        self.publish(
            &mut state,
            Event::SessionStarted {
                script_id: demo.id.clone(),
                default_params: demo.default_params.clone(),
                explanations: demo.intro.clone(),
            },
        );
        Ok(())
    }

    pub async fn add_point(&self, id: Option<PointId>, x: f64, y: f64) -> Result<Point, CommandError> {
        let _gate = self.gate.lock().await;
        let mut state = self.lock_state();

        require_editable(&state.session)?;
        require_finite(x, y)?;
        if let Some(max) = state.session.max_points() {
            if state.session.points.len() >= max {
                return Err(CommandError::InvalidArgument(format!(
                    "canvas is full ({} points)",
                    max
                )));
            }
        }

        let point = match id {
            Some(id) if id.is_empty() => {
                return Err(CommandError::InvalidArgument("point id is empty".to_string()));
            }
            Some(id) if state.session.contains_point(&id) => {
                return Err(CommandError::InvalidArgument(format!(
                    "point '{}' already exists",
                    id
                )));
            }
            Some(id) => Point::new(id, x, y),
            None => Point::with_generated_id(x, y),
        };

        debug!(channel = self.channel(), id = %point.id, x, y, "point added");
        self.publish(
            &mut state,
            Event::PointAdded {
                point: point.clone(),
            },
        );
        Ok(point)
    }

    pub async fn move_point(&self, id: &str, x: f64, y: f64) -> Result<Point, CommandError> {
        let _gate = self.gate.lock().await;
        let mut state = self.lock_state();

        require_point(&state.session, id)?;
        require_finite(x, y)?;

        self.publish(
            &mut state,
            Event::PointMoved {
                id: id.to_string(),
                x,
                y,
            },
        );
        state
            .session
            .point(id)
            .cloned()
            .ok_or_else(|| CommandError::NotFound(format!("point '{}'", id)))
    }

    pub async fn remove_point(&self, id: &str) -> Result<(), CommandError> {
        let _gate = self.gate.lock().await;
        let mut state = self.lock_state();

        require_point(&state.session, id)?;

        debug!(channel = self.channel(), id, "point removed");
        self.publish(&mut state, Event::PointRemoved { id: id.to_string() });
        Ok(())
    }

    pub async fn clear_points(&self) -> Result<(), CommandError> {
        let _gate = self.gate.lock().await;
        let mut state = self.lock_state();

        if !state.session.is_running {
            return Err(CommandError::InvalidArgument("no session is running".to_string()));
        }

        info!(channel = self.channel(), "points cleared");
        self.publish(
            &mut state,
            Event::PointsCleared {
                explanations: explain::cleared(),
            },
        );
        Ok(())
    }

    /// Two-phase clustering: broadcast `clustering-started`, compute, then
    /// broadcast `clustering-complete` or `clustering-failed`.
    ///
    /// `k` falls back to the demo's default. A failing engine reverts the
    /// step to started, keeps points and clusters, and still reports
    /// `ComputationFailure` to the caller.
    pub async fn run_clustering(&self, k: Option<usize>) -> Result<Vec<Cluster>, CommandError> {
        let gate = Arc::clone(&self.gate).lock_owned().await;

        let (points, k) = {
            let mut state = self.lock_state();
            require_editable(&state.session)?;
            if state.session.points.is_empty() {
                return Err(CommandError::InvalidArgument(
                    "no points to cluster".to_string(),
                ));
            }

            let k = k.unwrap_or_else(|| state.session.default_k());
            if k == 0 {
                return Err(CommandError::InvalidArgument(
                    "k must be at least 1".to_string(),
                ));
            }

            let points = state.session.points.clone();
            info!(channel = self.channel(), k, points = points.len(), "clustering started");
            self.publish(&mut state, Event::ClusteringStarted);
            (points, k)
        };

        // Runs to completion on its own task even if the caller goes away,
        // holding the gate until the result is published.
        let run = PendingRun {
            broadcaster: self.broadcaster.clone(),
            engine: Arc::clone(&self.engine),
            delay: self.clustering_delay,
            points,
            k,
        };
        tokio::spawn(async move {
            let _gate = gate;
            run.finish().await
        })
        .await
        .map_err(|e| CommandError::ComputationFailure(format!("clustering task aborted: {}", e)))?
    }

    /// End the session. Always broadcasts `session-ended`, even when idle.
    pub async fn stop(&self) {
        let _gate = self.gate.lock().await;
        let mut state = self.lock_state();

        info!(channel = self.channel(), "session ended");
        self.publish(&mut state, Event::SessionEnded);
    }

    fn lock_state(&self) -> MutexGuard<'_, RouterState> {
        self.broadcaster.lock()
    }

    fn snapshot_of(&self, state: &RouterState) -> Snapshot {
        Snapshot {
            channel: self.channel().to_string(),
            seq: state.seq,
            session: state.session.clone(),
            taken_at: chrono::Utc::now(),
        }
    }

    fn publish(&self, state: &mut RouterState, event: Event) -> Envelope {
        self.broadcaster.publish(state, event)
    }
}

fn require_editable(session: &Session) -> Result<(), CommandError> {
    if !session.is_running {
        return Err(CommandError::InvalidArgument("no session is running".to_string()));
    }
    if !session.step.accepts_edits() {
        return Err(CommandError::InvalidArgument(format!(
            "session is {}",
            session.step
        )));
    }
    Ok(())
}

fn require_point(session: &Session, id: &str) -> Result<(), CommandError> {
    if !session.is_running {
        return Err(CommandError::NotFound("no session is running".to_string()));
    }
    if !session.contains_point(id) {
        return Err(CommandError::NotFound(format!("point '{}'", id)));
    }
    Ok(())
}

fn require_finite(x: f64, y: f64) -> Result<(), CommandError> {
    if !x.is_finite() || !y.is_finite() {
        return Err(CommandError::InvalidArgument(
            "coordinates must be finite numbers".to_string(),
        ));
    }
    Ok(())
}
