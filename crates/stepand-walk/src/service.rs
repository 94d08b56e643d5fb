//! Walk service - runs one walk session
//!
//! The WalkService owns the tracker of a single walk. Location samples,
//! timer expiries and user commands all arrive through channels and are
//! handled one at a time by [`WalkService::run`], so the tracker never needs
//! a lock.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use stepand_core::mission::generate_missions;
use stepand_core::{
    Completion, LocationProvider, Mission, MissionId, MissionState, NavigationFix, RangeTransition,
    UserLocation, WalkConfig, WalkEvent, WalkEventPayload, WalkSummary, WalkTracker,
};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::error::{Result, WalkError};
use crate::scheduler::{TaskId, TaskScheduler};

/// Commands sent to the walk service
#[derive(Debug)]
pub enum WalkCommand {
    /// User confirms the current mission
    ConfirmMission {
        response: oneshot::Sender<Result<Completion>>,
    },
    /// Get the current progress
    GetSnapshot { response: oneshot::Sender<WalkSnapshot> },
    /// End the walk early
    Stop,
}

/// Messages from scheduled tasks back to the loop
#[derive(Debug)]
enum TimerMessage {
    DwellElapsed { mission_id: MissionId, entry: u32 },
    ClockTick,
}

/// Point-in-time view of a running walk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkSnapshot {
    pub session_id: Uuid,
    pub current_mission: Option<MissionId>,
    pub current_state: Option<MissionState>,
    /// Geometry from the last sample to the current mission
    pub fix: Option<NavigationFix>,
    pub missions_completed: usize,
    pub missions_total: usize,
    pub travelled_m: f64,
    pub elapsed: Duration,
    pub chapter: String,
}

/// Handle for interacting with the walk service
#[derive(Clone)]
pub struct WalkHandle {
    command_tx: mpsc::Sender<WalkCommand>,
    session_id: Uuid,
}

impl WalkHandle {
    /// Session this handle controls
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Complete the current mission; only accepted while it is in range
    pub async fn confirm_mission(&self) -> Result<Completion> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(WalkCommand::ConfirmMission { response: tx })
            .await
            .map_err(|_| WalkError::NotRunning)?;

        rx.await
            .map_err(|_| WalkError::Channel("Failed to receive confirmation".into()))?
    }

    /// Get the current progress
    pub async fn snapshot(&self) -> Result<WalkSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(WalkCommand::GetSnapshot { response: tx })
            .await
            .map_err(|_| WalkError::NotRunning)?;

        rx.await
            .map_err(|_| WalkError::Channel("Failed to receive snapshot".into()))
    }

    /// End the walk; the service still emits the final summary
    pub async fn stop(&self) -> Result<()> {
        self.command_tx
            .send(WalkCommand::Stop)
            .await
            .map_err(|_| WalkError::NotRunning)
    }

    /// Handle wired to a bare command receiver, for testing callers
    #[cfg(any(test, feature = "test-utils"))]
    pub fn mock() -> (Self, mpsc::Receiver<WalkCommand>) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let handle = Self {
            command_tx,
            session_id: Uuid::new_v4(),
        };
        (handle, command_rx)
    }
}

/// Why the session loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    AllCompleted,
    Stopped,
    StreamEnded,
}

/// How the feeder task ended
#[derive(Debug)]
enum FeedEnd {
    Exhausted,
    Failed(String),
    Shutdown,
}

/// Runs a single walk session
pub struct WalkService {
    /// Configuration
    config: WalkConfig,
    /// Taken by the feeder task when the walk starts
    provider: Option<Box<dyn LocationProvider>>,
    /// Session identifier stamped on every event
    session_id: Uuid,
    /// Event broadcaster
    event_tx: broadcast::Sender<WalkEvent>,
    /// Command receiver
    command_rx: mpsc::Receiver<WalkCommand>,
    /// Timer messages
    timer_tx: mpsc::Sender<TimerMessage>,
    timer_rx: mpsc::Receiver<TimerMessage>,
    /// Dwell timers and the walk clock
    scheduler: TaskScheduler,
    /// Pending dwell timer of the current mission
    dwell_task: Option<TaskId>,
}

impl WalkService {
    /// Create a new walk service
    pub fn new(
        config: WalkConfig,
        provider: impl LocationProvider + 'static,
    ) -> Result<(Self, WalkHandle, broadcast::Receiver<WalkEvent>)> {
        config.validate()?;

        let session_id = Uuid::new_v4();
        let (event_tx, event_rx) = broadcast::channel(config.event_buffer);
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);
        let (timer_tx, timer_rx) = mpsc::channel(config.command_buffer);

        let handle = WalkHandle {
            command_tx,
            session_id,
        };

        let service = Self {
            config,
            provider: Some(Box::new(provider)),
            session_id,
            event_tx,
            command_rx,
            timer_tx,
            timer_rx,
            scheduler: TaskScheduler::new(),
            dwell_task: None,
        };

        Ok((service, handle, event_rx))
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Additional event receiver
    pub fn subscribe(&self) -> broadcast::Receiver<WalkEvent> {
        self.event_tx.subscribe()
    }

    /// Run the walk to completion, stop, or loss of the location stream
    pub async fn run(mut self) -> Result<WalkSummary> {
        let mut provider = self.provider.take().ok_or(WalkError::NotRunning)?;
        info!(
            session = %self.session_id,
            provider = provider.name(),
            genre = %self.config.genre,
            "Starting walk"
        );
        let started_at = Instant::now();

        let (start, mut tracker) = match start_tracker(provider.as_mut()).await {
            Ok(started) => started,
            Err(e) => {
                warn!(error = %e, "Could not start walk");
                if let Err(stop_err) = provider.stop().await {
                    warn!(error = %stop_err, "Failed to stop location provider");
                }
                return Err(e.into());
            }
        };

        self.emit(WalkEventPayload::Started {
            start,
            missions: tracker.missions().len(),
            first_mission: tracker.current_mission().map(Mission::id),
        });
        // The user may already be standing at the first target
        self.handle_sample(&mut tracker, start);

        let (sample_tx, mut sample_rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let feeder = tokio::spawn(feed_samples(provider, sample_tx, shutdown_rx));

        let clock_tx = self.timer_tx.clone();
        self.scheduler
            .schedule_repeating("walk-clock", self.config.clock_interval, move || {
                let tx = clock_tx.clone();
                async move {
                    let _ = tx.send(TimerMessage::ClockTick).await;
                }
            });

        // Main event loop
        let exit = loop {
            if tracker.is_finished() {
                break Exit::AllCompleted;
            }

            tokio::select! {
                changed = sample_rx.changed() => {
                    if changed.is_err() {
                        break Exit::StreamEnded;
                    }
                    let sample = *sample_rx.borrow_and_update();
                    if let Some(sample) = sample {
                        self.handle_sample(&mut tracker, sample);
                    }
                }

                Some(message) = self.timer_rx.recv() => {
                    self.handle_timer(&mut tracker, message, started_at);
                }

                Some(command) = self.command_rx.recv() => {
                    if !self.handle_command(&mut tracker, command, started_at) {
                        break Exit::Stopped;
                    }
                }
            }
        };

        self.dwell_task = None;
        self.scheduler.cancel_all();
        let _ = shutdown_tx.send(());

        match feeder.await {
            Ok(FeedEnd::Failed(reason)) => {
                self.emit(WalkEventPayload::LocationLost { reason });
            }
            Ok(FeedEnd::Exhausted) if exit == Exit::StreamEnded => {
                self.emit(WalkEventPayload::LocationLost {
                    reason: "location stream ended".to_string(),
                });
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Location feeder task failed"),
        }

        let summary = tracker.summary(self.config.genre, started_at.elapsed());
        info!(
            session = %self.session_id,
            ?exit,
            completed = summary.missions_completed,
            total = summary.missions_total,
            rank = %summary.rank,
            "Walk finished"
        );
        self.emit(WalkEventPayload::Finished {
            summary: summary.clone(),
        });

        Ok(summary)
    }

    /// Feed one location sample to the tracker
    fn handle_sample(&mut self, tracker: &mut WalkTracker, sample: UserLocation) {
        let update = tracker.observe(sample);
        let Some(mission_id) = update.mission_id else {
            return;
        };

        if let Some(fix) = update.fix {
            self.emit(WalkEventPayload::NavigationUpdated {
                mission_id,
                fix,
                travelled_m: update.travelled_m,
            });
        }

        match update.transition {
            Some(RangeTransition::Entered { entry }) => self.on_entered(mission_id, entry),
            Some(RangeTransition::Left) => {
                self.cancel_dwell();
                self.emit(WalkEventPayload::MissionOutOfRange { mission_id });
            }
            None => {}
        }
    }

    fn handle_timer(&mut self, tracker: &mut WalkTracker, message: TimerMessage, started_at: Instant) {
        match message {
            TimerMessage::ClockTick => {
                self.emit(WalkEventPayload::Tick {
                    elapsed: started_at.elapsed(),
                });
            }
            TimerMessage::DwellElapsed { mission_id, entry } => {
                match tracker.complete_after_dwell(mission_id, entry) {
                    Ok(Some(completion)) => self.on_completed(tracker, completion),
                    Ok(None) => debug!(mission = %mission_id, entry, "Ignoring stale dwell timer"),
                    Err(e) => warn!(mission = %mission_id, error = %e, "Dwell completion failed"),
                }
            }
        }
    }

    /// Handle a command; returns false when the loop should end
    fn handle_command(&mut self, tracker: &mut WalkTracker, command: WalkCommand, started_at: Instant) -> bool {
        match command {
            WalkCommand::ConfirmMission { response } => {
                let result = tracker.confirm_current().map_err(WalkError::from);
                match &result {
                    Ok(completion) => self.on_completed(tracker, *completion),
                    Err(e) => debug!(error = %e, "Confirmation rejected"),
                }
                if response.send(result).is_err() {
                    warn!("Confirmation response dropped");
                }
                true
            }

            WalkCommand::GetSnapshot { response } => {
                let snapshot = self.snapshot(tracker, started_at);
                if response.send(snapshot).is_err() {
                    warn!("Snapshot response dropped");
                }
                true
            }

            WalkCommand::Stop => {
                info!(session = %self.session_id, "Stop requested");
                false
            }
        }
    }

    fn on_entered(&mut self, mission_id: MissionId, entry: u32) {
        self.emit(WalkEventPayload::MissionInRange { mission_id, entry });
        if self.config.auto_complete {
            self.arm_dwell(mission_id, entry);
        }
    }

    fn on_completed(&mut self, tracker: &WalkTracker, completion: Completion) {
        self.cancel_dwell();
        self.emit(WalkEventPayload::MissionCompleted {
            mission_id: completion.mission_id,
            reason: completion.reason,
            next: completion.next,
            story_progress: tracker.completed_count(),
            chapter: tracker.story_chapter().to_string(),
        });

        if let (Some(next), Some(entry)) = (completion.next, completion.next_entered) {
            self.on_entered(next, entry);
        }
    }

    fn arm_dwell(&mut self, mission_id: MissionId, entry: u32) {
        self.cancel_dwell();
        let tx = self.timer_tx.clone();
        let task = self.scheduler.schedule_once(
            format!("dwell-{}", mission_id),
            self.config.dwell_delay,
            async move {
                let _ = tx.send(TimerMessage::DwellElapsed { mission_id, entry }).await;
            },
        );
        self.dwell_task = Some(task.id());
    }

    fn cancel_dwell(&mut self) {
        if let Some(id) = self.dwell_task.take() {
            self.scheduler.cancel(id);
        }
    }

    fn snapshot(&self, tracker: &WalkTracker, started_at: Instant) -> WalkSnapshot {
        let current = tracker.current_mission();
        let fix = match (tracker.last_sample(), current) {
            (Some(sample), Some(mission)) => Some(NavigationFix::compute(sample, mission)),
            _ => None,
        };

        WalkSnapshot {
            session_id: self.session_id,
            current_mission: current.map(Mission::id),
            current_state: current.map(Mission::state),
            fix,
            missions_completed: tracker.completed_count(),
            missions_total: tracker.missions().len(),
            travelled_m: tracker.travelled_m(),
            elapsed: started_at.elapsed(),
            chapter: tracker.story_chapter().to_string(),
        }
    }

    fn emit(&self, payload: WalkEventPayload) {
        trace!(event_type = ?payload.event_type(), "emit");
        // No subscribers is fine; the summary is also returned from run()
        let _ = self.event_tx.send(WalkEvent::new(self.session_id, payload));
    }
}

/// Initial fix and the missions placed around it
async fn start_tracker(provider: &mut dyn LocationProvider) -> stepand_core::Result<(UserLocation, WalkTracker)> {
    let start = provider.current().await?;
    let missions = generate_missions(&start.coordinate)?;
    debug!(start = %start.coordinate, missions = missions.len(), "Generated missions");
    Ok((start, WalkTracker::starting_at(missions, start)))
}

/// Pull samples from the provider into the watch channel until told to stop
///
/// The provider is always stopped before this returns.
async fn feed_samples(
    mut provider: Box<dyn LocationProvider>,
    tx: watch::Sender<Option<UserLocation>>,
    mut shutdown: oneshot::Receiver<()>,
) -> FeedEnd {
    let end = loop {
        tokio::select! {
            _ = &mut shutdown => break FeedEnd::Shutdown,

            sample = provider.next_sample() => match sample {
                Ok(Some(sample)) => {
                    tx.send_replace(Some(sample));
                }
                Ok(None) => {
                    debug!(provider = provider.name(), "Location stream ended");
                    break FeedEnd::Exhausted;
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Location provider failed");
                    break FeedEnd::Failed(e.to_string());
                }
            },
        }
    };

    if let Err(e) = provider.stop().await {
        warn!(provider = provider.name(), error = %e, "Failed to stop location provider");
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ScriptedLocationProvider;
    use std::sync::atomic::Ordering;
    use stepand_core::{Coordinate, CompletionReason, Rank, StepandError};

    const START: (f64, f64) = (35.0, 139.0);

    fn at(c: Coordinate) -> UserLocation {
        UserLocation::new(c)
    }

    fn start() -> Coordinate {
        Coordinate::new(START.0, START.1).unwrap()
    }

    fn config() -> WalkConfig {
        WalkConfig {
            event_buffer: 4096,
            ..Default::default()
        }
    }

    fn targets() -> Vec<Coordinate> {
        generate_missions(&start())
            .unwrap()
            .iter()
            .map(Mission::location)
            .collect()
    }

    /// Straight-line samples from `from` to `to`, excluding `from`
    fn leg(from: Coordinate, to: Coordinate, steps: usize) -> Vec<UserLocation> {
        (1..=steps)
            .map(|i| {
                let t = i as f64 / steps as f64;
                let lat = from.latitude() + (to.latitude() - from.latitude()) * t;
                let lon = from.longitude() + (to.longitude() - from.longitude()) * t;
                at(Coordinate::new(lat, lon).unwrap())
            })
            .collect()
    }

    /// Visit every mission in order, lingering `linger` samples at each
    fn full_route(linger: usize) -> Vec<UserLocation> {
        let mut route = Vec::new();
        let mut from = start();
        for target in targets() {
            route.extend(leg(from, target, 10));
            route.extend(std::iter::repeat(at(target)).take(linger));
            from = target;
        }
        route
    }

    fn scripted(samples: Vec<UserLocation>) -> ScriptedLocationProvider {
        ScriptedLocationProvider::new(at(start()), samples, Duration::from_secs(1))
    }

    fn drain(events: &mut broadcast::Receiver<WalkEvent>) -> Vec<WalkEventPayload> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event.payload);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_walk_completes_all_missions() {
        let provider = scripted(full_route(4));
        let stopped = provider.stop_flag();
        let (service, _handle, mut events) = WalkService::new(config(), provider).unwrap();

        let summary = service.run().await.unwrap();

        assert_eq!(summary.missions_completed, 4);
        assert_eq!(summary.completion_percent, 100.0);
        assert_eq!(summary.rank, Rank::S);
        assert!(summary.distance_m > 500.0);
        assert!(stopped.load(Ordering::SeqCst));

        let payloads = drain(&mut events);
        assert!(matches!(payloads.first(), Some(WalkEventPayload::Started { missions: 4, .. })));
        assert!(matches!(payloads.last(), Some(WalkEventPayload::Finished { .. })));

        let completed: Vec<_> = payloads
            .iter()
            .filter_map(|p| match p {
                WalkEventPayload::MissionCompleted {
                    mission_id,
                    reason,
                    story_progress,
                    ..
                } => Some((*mission_id, *reason, *story_progress)),
                _ => None,
            })
            .collect();
        assert_eq!(
            completed,
            vec![
                (MissionId(1), CompletionReason::DwellElapsed, 1),
                (MissionId(2), CompletionReason::DwellElapsed, 2),
                (MissionId(3), CompletionReason::DwellElapsed, 3),
                (MissionId(4), CompletionReason::DwellElapsed, 4),
            ]
        );
        assert!(payloads.iter().any(|p| matches!(p, WalkEventPayload::Tick { .. })));
        assert!(!payloads.iter().any(|p| matches!(p, WalkEventPayload::LocationLost { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_yields_partial_summary() {
        let provider = scripted(vec![at(start()); 60]);
        let stopped = provider.stop_flag();
        let (service, handle, _events) = WalkService::new(config(), provider).unwrap();
        let run = tokio::spawn(service.run());

        tokio::time::sleep(Duration::from_secs(3)).await;
        handle.stop().await.unwrap();

        let summary = run.await.unwrap().unwrap();
        assert_eq!(summary.missions_completed, 0);
        assert_eq!(summary.rank, Rank::D);
        assert!(summary.elapsed >= Duration::from_secs(3));
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_range_cancels_dwell() {
        let first = targets()[0];
        let mut route = leg(start(), first, 5);
        route.extend(leg(first, start(), 5));
        route.extend(vec![at(start()); 5]);

        let (service, _handle, mut events) = WalkService::new(config(), scripted(route)).unwrap();
        let summary = service.run().await.unwrap();

        assert_eq!(summary.missions_completed, 0);
        let payloads = drain(&mut events);
        assert!(payloads
            .iter()
            .any(|p| matches!(p, WalkEventPayload::MissionInRange { entry: 1, .. })));
        assert!(payloads
            .iter()
            .any(|p| matches!(p, WalkEventPayload::MissionOutOfRange { .. })));
        assert!(!payloads
            .iter()
            .any(|p| matches!(p, WalkEventPayload::MissionCompleted { .. })));
        assert!(payloads
            .iter()
            .any(|p| matches!(p, WalkEventPayload::LocationLost { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reentry_completes_after_new_dwell() {
        let first = targets()[0];
        let away = at(start());
        let mut route = leg(start(), first, 5);
        route.push(away);
        route.extend(vec![at(first); 4]);

        let (service, _handle, mut events) = WalkService::new(config(), scripted(route)).unwrap();
        service.run().await.unwrap();

        let mission_events: Vec<_> = drain(&mut events)
            .into_iter()
            .filter(|p| p.event_type() == stepand_core::EventType::Mission)
            .collect();

        assert!(matches!(mission_events[0], WalkEventPayload::MissionInRange { entry: 1, .. }));
        assert!(matches!(mission_events[1], WalkEventPayload::MissionOutOfRange { .. }));
        assert!(matches!(mission_events[2], WalkEventPayload::MissionInRange { entry: 2, .. }));
        assert!(matches!(
            mission_events[3],
            WalkEventPayload::MissionCompleted {
                mission_id: MissionId(1),
                reason: CompletionReason::DwellElapsed,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_confirmation() {
        let first = targets()[0];
        let mut route = leg(start(), first, 5);
        route.extend(vec![at(first); 30]);

        let config = WalkConfig {
            auto_complete: false,
            ..config()
        };
        let (service, handle, mut events) = WalkService::new(config, scripted(route)).unwrap();
        let run = tokio::spawn(service.run());

        // Confirming before arrival is rejected
        let early = handle.confirm_mission().await.unwrap_err();
        assert!(early.is_client_error());
        assert!(matches!(
            early,
            WalkError::Core(StepandError::MissionNotInRange { id: MissionId(1), .. })
        ));

        loop {
            let event = events.recv().await.unwrap();
            if matches!(event.payload, WalkEventPayload::MissionInRange { .. }) {
                break;
            }
        }

        let completion = handle.confirm_mission().await.unwrap();
        assert_eq!(completion.mission_id, MissionId(1));
        assert_eq!(completion.reason, CompletionReason::UserConfirmed);
        assert_eq!(completion.next, Some(MissionId(2)));

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.current_mission, Some(MissionId(2)));
        assert_eq!(snapshot.missions_completed, 1);

        handle.stop().await.unwrap();
        let summary = run.await.unwrap().unwrap();
        assert_eq!(summary.missions_completed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_at_start() {
        let (service, handle, _events) =
            WalkService::new(config(), scripted(vec![at(start()); 10])).unwrap();
        let session_id = handle.session_id();
        let run = tokio::spawn(service.run());

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.session_id, session_id);
        assert_eq!(snapshot.current_mission, Some(MissionId(1)));
        assert_eq!(snapshot.current_state, Some(MissionState::Pending));
        assert_eq!(snapshot.missions_total, 4);
        assert!(snapshot.fix.unwrap().distance_m > 100.0);

        handle.stop().await.unwrap();
        run.await.unwrap().unwrap();

        // The service is gone
        assert!(matches!(handle.snapshot().await, Err(WalkError::NotRunning)));
    }

    #[tokio::test]
    async fn test_unavailable_location_aborts_start() {
        let provider = ScriptedLocationProvider::unavailable();
        let stopped = provider.stop_flag();
        let (service, _handle, mut events) = WalkService::new(config(), provider).unwrap();

        let err = service.run().await.unwrap_err();
        assert_eq!(err.error_code(), "LOCATION_UNAVAILABLE");
        assert!(stopped.load(Ordering::SeqCst));
        assert!(drain(&mut events).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_failure_ends_walk() {
        let provider = scripted(vec![at(start()); 3]).with_failure("gps lost");
        let (service, _handle, mut events) = WalkService::new(config(), provider).unwrap();

        let summary = service.run().await.unwrap();
        assert_eq!(summary.missions_completed, 0);

        let payloads = drain(&mut events);
        assert!(payloads
            .iter()
            .any(|p| matches!(p, WalkEventPayload::LocationLost { reason } if reason.contains("gps lost"))));
        assert!(matches!(payloads.last(), Some(WalkEventPayload::Finished { .. })));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = WalkConfig {
            clock_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(WalkService::new(config, scripted(vec![])).is_err());
    }

    #[tokio::test]
    async fn test_mock_handle_commands() {
        let (handle, mut rx) = WalkHandle::mock();

        handle.stop().await.unwrap();
        assert!(matches!(rx.recv().await.unwrap(), WalkCommand::Stop));

        let pending = tokio::spawn({
            let handle = handle.clone();
            async move { handle.snapshot().await }
        });
        match rx.recv().await.unwrap() {
            WalkCommand::GetSnapshot { response } => drop(response),
            other => panic!("Expected GetSnapshot, got {:?}", other),
        }
        assert!(matches!(pending.await.unwrap(), Err(WalkError::Channel(_))));
    }
}
