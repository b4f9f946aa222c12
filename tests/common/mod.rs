#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_channel::Receiver;
use async_trait::async_trait;
use tokio::sync::Semaphore;

use missiondesk::api::{MissionOrderAPI, RateSettingAPI, UnitLocationAPI};
use missiondesk::engine::{Engine, Event};
use missiondesk::entities::{
    Coordinates, MissionOrder, RateSetting, RateSettingParams, RouteComputation, RouteLeg,
    UnitLocation, UnitLocationParams,
};
use missiondesk::error::{invalid_state_error, not_found_error, upstream_error, Error};
use missiondesk::external::{Geocoder, MissionOrderStore, RateProvider, RouteService};

pub const HQ: Coordinates = Coordinates {
    lat: 31.35,
    lng: 48.72,
};

pub fn units() -> Vec<UnitLocation> {
    vec![
        UnitLocation {
            id: 1,
            name: "HQ".into(),
            latitude: HQ.lat,
            longitude: HQ.lng,
            is_default: true,
        },
        UnitLocation {
            id: 2,
            name: "Branch".into(),
            latitude: 30.43,
            longitude: 48.18,
            is_default: false,
        },
    ]
}

pub struct BackendState {
    pub units: Vec<UnitLocation>,
    pub rate_settings: Vec<RateSetting>,
    pub orders: BTreeMap<i64, MissionOrder>,
    pub next_id: i64,
    pub rate: Result<Option<f64>, Error>,
}

/// In-memory backend. Clones share state, so a test keeps a handle after
/// moving one into the engine.
#[derive(Clone)]
pub struct FakeBackend {
    pub state: Arc<Mutex<BackendState>>,
    rate_gate: Option<Arc<Semaphore>>,
    create_gate: Option<Arc<Semaphore>>,
    creates: Arc<AtomicUsize>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BackendState {
                units: units(),
                rate_settings: vec![RateSetting {
                    id: 1,
                    rate_per_km: 5000.0,
                    description: "default".into(),
                }],
                orders: BTreeMap::new(),
                next_id: 100,
                rate: Ok(Some(5000.0)),
            })),
            rate_gate: None,
            create_gate: None,
            creates: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Rate lookups block until the returned gate receives a permit.
    pub fn gate_rate(&mut self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.rate_gate = Some(gate.clone());
        gate
    }

    /// Order creation blocks until the returned gate receives a permit.
    pub fn gate_create(&mut self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.create_gate = Some(gate.clone());
        gate
    }

    pub async fn wait_for_creates(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.creates.load(Ordering::SeqCst) < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("no order was created");
    }

    pub fn set_rate(&self, rate: Result<Option<f64>, Error>) {
        self.state.lock().unwrap().rate = rate;
    }

    pub fn insert_order(&self, order: MissionOrder) {
        let id = order.id.unwrap();
        self.state.lock().unwrap().orders.insert(id, order);
    }

    pub fn order(&self, id: i64) -> Option<MissionOrder> {
        self.state.lock().unwrap().orders.get(&id).cloned()
    }
}

#[async_trait]
impl UnitLocationAPI for FakeBackend {
    async fn list_unit_locations(&self) -> Result<Vec<UnitLocation>, Error> {
        Ok(self.state.lock().unwrap().units.clone())
    }

    async fn find_unit_location(&self, id: i64) -> Result<UnitLocation, Error> {
        let state = self.state.lock().unwrap();
        state
            .units
            .iter()
            .find(|unit| unit.id == id)
            .cloned()
            .ok_or_else(not_found_error)
    }

    async fn find_default_unit_location(&self) -> Result<UnitLocation, Error> {
        let state = self.state.lock().unwrap();
        state
            .units
            .iter()
            .find(|unit| unit.is_default)
            .cloned()
            .ok_or_else(not_found_error)
    }

    async fn create_unit_location(
        &self,
        params: UnitLocationParams,
    ) -> Result<UnitLocation, Error> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let unit = UnitLocation {
            id: state.next_id,
            name: params.name,
            latitude: params.latitude,
            longitude: params.longitude,
            is_default: params.is_default,
        };
        state.units.push(unit.clone());
        Ok(unit)
    }

    async fn update_unit_location(
        &self,
        id: i64,
        params: UnitLocationParams,
    ) -> Result<UnitLocation, Error> {
        let mut state = self.state.lock().unwrap();
        let unit = state
            .units
            .iter_mut()
            .find(|unit| unit.id == id)
            .ok_or_else(not_found_error)?;
        unit.name = params.name;
        unit.latitude = params.latitude;
        unit.longitude = params.longitude;
        unit.is_default = params.is_default;
        Ok(unit.clone())
    }

    async fn delete_unit_location(&self, id: i64) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        let before = state.units.len();
        state.units.retain(|unit| unit.id != id);
        if state.units.len() == before {
            return Err(not_found_error());
        }
        Ok(())
    }
}

#[async_trait]
impl RateSettingAPI for FakeBackend {
    async fn list_rate_settings(&self) -> Result<Vec<RateSetting>, Error> {
        Ok(self.state.lock().unwrap().rate_settings.clone())
    }

    async fn find_rate_setting(&self, id: i64) -> Result<RateSetting, Error> {
        let state = self.state.lock().unwrap();
        state
            .rate_settings
            .iter()
            .find(|setting| setting.id == id)
            .cloned()
            .ok_or_else(not_found_error)
    }

    async fn find_active_rate_setting(&self) -> Result<RateSetting, Error> {
        self.find_rate_setting(1).await
    }

    async fn create_rate_setting(&self, params: RateSettingParams) -> Result<RateSetting, Error> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let setting = RateSetting {
            id: state.next_id,
            rate_per_km: params.rate_per_km,
            description: params.description,
        };
        state.rate_settings.push(setting.clone());
        Ok(setting)
    }

    async fn update_rate_setting(
        &self,
        id: i64,
        params: RateSettingParams,
    ) -> Result<RateSetting, Error> {
        let mut state = self.state.lock().unwrap();
        let setting = state
            .rate_settings
            .iter_mut()
            .find(|setting| setting.id == id)
            .ok_or_else(not_found_error)?;
        setting.rate_per_km = params.rate_per_km;
        setting.description = params.description;
        Ok(setting.clone())
    }

    async fn delete_rate_setting(&self, id: i64) -> Result<(), Error> {
        self.state
            .lock()
            .unwrap()
            .rate_settings
            .retain(|setting| setting.id != id);
        Ok(())
    }
}

#[async_trait]
impl MissionOrderAPI for FakeBackend {
    async fn list_mission_orders(&self) -> Result<Vec<MissionOrder>, Error> {
        Ok(self.state.lock().unwrap().orders.values().cloned().collect())
    }

    async fn find_mission_order(&self, id: i64) -> Result<MissionOrder, Error> {
        self.order(id).ok_or_else(not_found_error)
    }

    async fn delete_mission_order(&self, id: i64) -> Result<(), Error> {
        self.state
            .lock()
            .unwrap()
            .orders
            .remove(&id)
            .map(|_| ())
            .ok_or_else(not_found_error)
    }
}

#[async_trait]
impl MissionOrderStore for FakeBackend {
    async fn create_mission_order(&self, mut order: MissionOrder) -> Result<MissionOrder, Error> {
        self.creates.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.create_gate {
            gate.acquire().await.unwrap().forget();
        }

        if order.id.is_some() {
            return Err(invalid_state_error());
        }
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        order.id = Some(id);
        state.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn update_mission_order(
        &self,
        id: i64,
        mut order: MissionOrder,
    ) -> Result<MissionOrder, Error> {
        let mut state = self.state.lock().unwrap();
        if !state.orders.contains_key(&id) {
            return Err(not_found_error());
        }
        order.id = Some(id);
        state.orders.insert(id, order.clone());
        Ok(order)
    }
}

#[async_trait]
impl RateProvider for FakeBackend {
    async fn fetch_rate_per_km(&self) -> Result<Option<f64>, Error> {
        if let Some(gate) = &self.rate_gate {
            gate.acquire().await.unwrap().forget();
        }

        self.state.lock().unwrap().rate.clone()
    }
}

/// Router whose legs cost 10 km and half an hour per hop. Calls can be
/// held back one at a time and failure switched on.
#[derive(Clone, Default)]
pub struct ScriptedRouter {
    calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
    holds: Arc<Mutex<VecDeque<Arc<Semaphore>>>>,
}

impl ScriptedRouter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The next call waits until the returned gate receives a permit.
    pub fn hold_next(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.holds.lock().unwrap().push_back(gate.clone());
        gate
    }

    pub async fn wait_for_calls(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.calls() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("router was not called");
    }
}

fn leg(waypoints: Vec<Coordinates>) -> RouteLeg {
    let hops = (waypoints.len() - 1) as f64;

    RouteLeg {
        path: waypoints,
        distance_km: 10.0 * hops,
        duration_hours: 0.5 * hops,
    }
}

#[async_trait]
impl RouteService for ScriptedRouter {
    async fn compute_route(
        &self,
        origin: Coordinates,
        destinations: &[Coordinates],
    ) -> Result<RouteComputation, Error> {
        let hold = self.holds.lock().unwrap().pop_front();
        let failing = self.failing.load(Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(hold) = hold {
            hold.acquire().await.unwrap().forget();
        }

        if failing {
            return Err(upstream_error());
        }

        let mut forward = vec![origin];
        forward.extend_from_slice(destinations);

        let mut back: Vec<Coordinates> = destinations.iter().rev().copied().collect();
        back.push(origin);

        Ok(RouteComputation::new(leg(forward), leg(back)))
    }
}

#[derive(Clone, Default)]
pub struct FakeGeocoder {
    failing: Arc<AtomicBool>,
}

impl FakeGeocoder {
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn reverse_geocode(&self, point: Coordinates) -> Result<String, Error> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(upstream_error());
        }

        Ok(format!("Place {:.2}, {:.2}", point.lat, point.lng))
    }
}

pub struct Harness {
    pub engine: Engine,
    pub backend: FakeBackend,
    pub router: ScriptedRouter,
    pub geocoder: FakeGeocoder,
    pub events: Receiver<Event>,
}

pub fn harness_with(backend: FakeBackend) -> Harness {
    let router = ScriptedRouter::default();
    let geocoder = FakeGeocoder::default();
    let engine = Engine::new(backend.clone(), router.clone(), geocoder.clone());
    let events = engine.events();

    Harness {
        engine,
        backend,
        router,
        geocoder,
        events,
    }
}

pub fn harness() -> Harness {
    harness_with(FakeBackend::new())
}

pub async fn next_event(events: &Receiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("no event within timeout")
        .expect("event channel closed")
}

/// Skips events until one with the given name arrives.
pub async fn wait_for(events: &Receiver<Event>, name: &str) -> Event {
    loop {
        let event = next_event(events).await;
        if event.name() == name {
            return event;
        }
    }
}
