mod events;
mod mission_form_api;
mod mission_order_api;
mod rate_setting_api;
mod unit_location_api;

use async_channel::{Receiver, Sender, TrySendError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::{
    api::API,
    entities::MissionForm,
    error::{not_found_error, Error},
    external::{Backend, Geocoder, RouteService},
};

pub use events::Event;

/// Events queued beyond this many are dropped until a subscriber catches up.
pub const EVENT_CAPACITY: usize = 1024;

const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(10);

struct Session {
    form: MissionForm,
    touched: Instant,
}

impl Session {
    fn new(form: MissionForm) -> Self {
        Self {
            form,
            touched: Instant::now(),
        }
    }
}

type Forms = Arc<Mutex<HashMap<Uuid, Session>>>;

/// Mission desk engine: delegates CRUD to the backend and owns the
/// in-progress mission form sessions.
#[derive(Clone)]
pub struct Engine {
    backend: Arc<dyn Backend>,
    router: Arc<dyn RouteService + Send + Sync>,
    geocoder: Arc<dyn Geocoder + Send + Sync>,
    forms: Forms,
    events: Sender<Event>,
    subscriber: Receiver<Event>,
}

impl Engine {
    pub fn new<B, R, G>(backend: B, router: R, geocoder: G) -> Self
    where
        B: Backend + 'static,
        R: RouteService + Send + Sync + 'static,
        G: Geocoder + Send + Sync + 'static,
    {
        let (events, subscriber) = async_channel::bounded(EVENT_CAPACITY);

        Self {
            backend: Arc::new(backend),
            router: Arc::new(router),
            geocoder: Arc::new(geocoder),
            forms: Arc::new(Mutex::new(HashMap::new())),
            events,
            subscriber,
        }
    }

    /// Replaces the event queue with one holding at most `capacity` events.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        let (events, subscriber) = async_channel::bounded(capacity.max(1));
        self.events = events;
        self.subscriber = subscriber;
        self
    }

    /// A receiver for workflow events. Receivers share one queue, so each
    /// event reaches exactly one of them.
    pub fn events(&self) -> Receiver<Event> {
        self.subscriber.clone()
    }

    fn emit(&self, event: Event) {
        tracing::debug!(event = event.name(), "emit");

        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::debug!(event = event.name(), "event queue full, dropping");
            }
            Err(TrySendError::Closed(_)) => tracing::warn!("event channel closed"),
        }
    }

    /// Drops every form session untouched for at least `max_idle` and
    /// returns how many were dropped.
    pub async fn evict_idle_forms(&self, max_idle: Duration) -> usize {
        let mut forms = self.forms.lock().await;
        let before = forms.len();

        forms.retain(|id, session| {
            let idle = session.touched.elapsed() >= max_idle;
            if idle {
                tracing::info!(form_id = %id, "mission form expired");
            }
            !idle
        });

        before - forms.len()
    }

    /// Periodically evicts form sessions idle for `max_idle`.
    pub fn spawn_form_sweeper(&self, max_idle: Duration) -> JoinHandle<()> {
        let engine = self.clone();
        let period = (max_idle / 4).max(MIN_SWEEP_PERIOD);

        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(period);

            loop {
                ticks.tick().await;

                let expired = engine.evict_idle_forms(max_idle).await;
                if expired > 0 {
                    tracing::debug!(expired, "swept idle mission forms");
                }
            }
        })
    }

    async fn insert_form(&self, form: MissionForm) {
        self.forms.lock().await.insert(form.id, Session::new(form));
    }

    async fn with_form<T, F>(&self, id: Uuid, f: F) -> Result<T, Error>
    where
        F: FnOnce(&mut MissionForm) -> Result<T, Error> + Send,
        T: Send,
    {
        let mut forms = self.forms.lock().await;
        let session = forms.get_mut(&id).ok_or_else(not_found_error)?;
        session.touched = Instant::now();

        f(&mut session.form)
    }
}

impl API for Engine {}
