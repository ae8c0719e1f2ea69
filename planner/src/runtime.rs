//! Executes session commands as tasks and feeds their outcomes back.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::{
    backend::{PickupPointSource, RouteStore},
    duplicate::DuplicateRouteChecker,
    error::PlannerError,
    map::MapSurface,
    notice::NoticeLevel,
    provider::RoutingProvider,
    session::{Command, Msg, Session},
};

/// Shared handles every spawned task needs.
pub struct Services<P, B> {
    provider: Arc<P>,
    backend: Arc<B>,
    checker: DuplicateRouteChecker<B>,
    route_timeout: Duration,
}

impl<P, B> Clone for Services<P, B> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            backend: Arc::clone(&self.backend),
            checker: self.checker.clone(),
            route_timeout: self.route_timeout,
        }
    }
}

impl<P, B> Services<P, B>
where
    P: RoutingProvider,
    B: PickupPointSource + RouteStore,
{
    pub fn new(provider: Arc<P>, backend: Arc<B>, route_timeout: Duration) -> Self {
        let checker = DuplicateRouteChecker::new(Arc::clone(&backend));
        Self {
            provider,
            backend,
            checker,
            route_timeout,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn execute(self, command: Command) -> Msg {
        match command {
            Command::FetchPickupPoints { generation } => Msg::PickupPointsFetched {
                generation,
                result: self.backend.get_all().await,
            },
            Command::RequestRoute { generation, request } => {
                let result = tokio::time::timeout(self.route_timeout, self.provider.route(&request))
                    .await
                    .unwrap_or(Err(PlannerError::Timeout(self.route_timeout)));
                Msg::RouteFetched { generation, result }
            }
            Command::CheckDuplicate { generation, ids } => Msg::DuplicateChecked {
                generation,
                verdict: self.checker.check(&ids).await,
            },
            Command::SaveDraft { generation, draft } => Msg::RouteSaved {
                generation,
                result: self.backend.create(&draft).await,
            },
            Command::FetchRoute { ticket, id } => Msg::ViewedRouteFetched {
                ticket,
                result: self.backend.get_by_id(&id).await,
            },
        }
    }
}

/// The provider request currently running, if any.
struct RouteTask {
    cancel: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

pub struct Runtime<S, P, B> {
    session: Session<S>,
    services: Services<P, B>,
    tx: mpsc::UnboundedSender<Msg>,
    rx: mpsc::UnboundedReceiver<Msg>,
    in_flight: usize,
    route_task: Option<RouteTask>,
}

impl<S, P, B> Runtime<S, P, B>
where
    S: MapSurface,
    P: RoutingProvider,
    B: PickupPointSource + RouteStore,
{
    pub fn new(session: Session<S>, services: Services<P, B>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session,
            services,
            tx,
            rx,
            in_flight: 0,
            route_task: None,
        }
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<S> {
        &mut self.session
    }

    pub fn services(&self) -> &Services<P, B> {
        &self.services
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Apply a message and spawn whatever it asks for.
    pub fn dispatch(&mut self, msg: Msg) {
        for command in self.session.update(msg) {
            self.spawn(command);
        }
    }

    fn spawn(&mut self, command: Command) {
        self.in_flight += 1;
        let services = self.services.clone();
        let tx = self.tx.clone();
        if let Command::RequestRoute { generation, .. } = &command {
            let generation = *generation;
            let (cancel, cancelled) = oneshot::channel();
            let previous = self.route_task.take().map(|task| {
                let _ = task.cancel.send(());
                task.handle
            });
            let handle = tokio::spawn(async move {
                // at most one provider request at a time
                if let Some(previous) = previous {
                    let _ = previous.await;
                }
                let msg = tokio::select! {
                    msg = services.execute(command) => msg,
                    _ = cancelled => {
                        tracing::debug!(generation = generation.value(), "route request cancelled");
                        Msg::RouteFetched {
                            generation,
                            result: Err(PlannerError::Superseded),
                        }
                    }
                };
                let _ = tx.send(msg);
            });
            self.route_task = Some(RouteTask { cancel, handle });
            return;
        }
        tokio::spawn(async move {
            let msg = services.execute(command).await;
            // receiver lives as long as the runtime
            let _ = tx.send(msg);
        });
    }

    /// Process results until no task is left in flight.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            let Some(msg) = self.rx.recv().await else {
                break;
            };
            self.in_flight -= 1;
            self.dispatch(msg);
        }
    }

    /// Drain session notices into the log.
    pub fn log_notices(&mut self) {
        for notice in self.session.take_notices() {
            match notice.level {
                NoticeLevel::Error => tracing::error!(title = %notice.title, "{}", notice.message),
                NoticeLevel::Info | NoticeLevel::Success => {
                    tracing::info!(title = %notice.title, "{}", notice.message)
                }
            }
        }
    }

    /// Reload now, then on every poll tick, until `shutdown` resolves.
    pub async fn run(&mut self, poll_interval: Option<Duration>, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        let mut ticker = poll_interval.map(|period| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            interval
        });

        self.dispatch(Msg::Reload);
        if let Some(interval) = ticker.as_mut() {
            // first tick completes immediately
            interval.tick().await;
        }

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutting down planner loop");
                    break;
                }
                Some(msg) = self.rx.recv() => {
                    self.in_flight -= 1;
                    self.dispatch(msg);
                }
                _ = tick(ticker.as_mut()) => {
                    tracing::debug!("poll interval elapsed, reloading");
                    self.dispatch(Msg::Poll);
                }
            }
            self.log_notices();
        }
    }
}

async fn tick(interval: Option<&mut tokio::time::Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
