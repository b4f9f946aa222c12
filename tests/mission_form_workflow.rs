mod common;

use std::time::Duration;

use tokio_test::{assert_err, assert_ok};

use common::{
    harness, harness_with, next_event, wait_for, FakeBackend, FakeGeocoder, ScriptedRouter, HQ,
};

use missiondesk::api::{MissionFormAPI, UnitLocationAPI};
use missiondesk::engine::{Engine, Event, EVENT_CAPACITY};
use missiondesk::entities::{
    CalendarDate, Coordinates, Destination, MissionDetails, MissionOrder, RateStatus,
};
use missiondesk::error::{invalid_input_error, invalid_state_error, not_found_error, upstream_error};

const AHVAZ: Coordinates = Coordinates {
    lat: 31.32,
    lng: 48.67,
};

const DEZFUL: Coordinates = Coordinates {
    lat: 32.38,
    lng: 48.40,
};

#[tokio::test]
async fn new_form_routes_from_default_unit() {
    let h = harness();

    let form = h.engine.open_mission_form(None).await.unwrap();
    assert_eq!(form.origin.as_ref().unwrap().name, "HQ");
    assert_eq!(form.rate, RateStatus::Loading);

    let event = wait_for(&h.events, "rate_resolved").await;
    assert_eq!(
        event,
        Event::RateResolved {
            form_id: form.id,
            rate_per_km: 5000.0
        }
    );

    let form = h.engine.add_destination(form.id, AHVAZ).await.unwrap();

    let route = form.route.as_ref().unwrap();
    assert_eq!(route.forward_distance_km, 10.0);
    assert_eq!(route.return_distance_km, 10.0);
    assert_eq!(route.total_distance_km, 20.0);
    assert_eq!(route.total_duration_hours, 1.0);
    assert_eq!(route.forward_path, vec![HQ, AHVAZ]);
    assert_eq!(route.return_path, vec![AHVAZ, HQ]);
    assert_eq!(form.final_cost, 100000.0);
    assert_eq!(form.destinations.last().unwrap().title, "Place 31.32, 48.67");
    assert_eq!(form.mission_coordinates, "31.320000, 48.670000");

    assert_eq!(
        next_event(&h.events).await,
        Event::RouteUpdated {
            form_id: form.id,
            seq: 1,
            final_cost: 100000.0
        }
    );
}

#[tokio::test]
async fn destination_added_while_rate_loads_waits_for_rate() {
    let mut backend = FakeBackend::new();
    let gate = backend.gate_rate();
    let h = harness_with(backend);

    let form = h.engine.open_mission_form(None).await.unwrap();
    let form = h.engine.add_destination(form.id, AHVAZ).await.unwrap();

    assert_eq!(form.destinations.len(), 1);
    assert!(form.route.is_none());
    assert_eq!(form.final_cost, 0.0);
    assert_eq!(h.router.calls(), 0);

    gate.add_permits(1);

    wait_for(&h.events, "rate_resolved").await;
    wait_for(&h.events, "route_updated").await;

    let form = h.engine.find_mission_form(form.id).await.unwrap();
    assert_eq!(form.rate.name(), "ready");
    assert_eq!(form.final_cost, 100000.0);
    assert_eq!(h.router.calls(), 1);
}

#[tokio::test]
async fn unavailable_rate_falls_back_to_zero() {
    let backend = FakeBackend::new();
    backend.set_rate(Err(upstream_error()));
    let h = harness_with(backend);

    let form = h.engine.open_mission_form(None).await.unwrap();
    wait_for(&h.events, "rate_resolved").await;

    let form = h.engine.add_destination(form.id, AHVAZ).await.unwrap();

    assert_eq!(form.rate, RateStatus::Ready { rate_per_km: 0.0 });
    assert_eq!(form.route.as_ref().unwrap().total_distance_km, 20.0);
    assert_eq!(form.final_cost, 0.0);
}

#[tokio::test]
async fn missing_rate_value_falls_back_to_zero() {
    let backend = FakeBackend::new();
    backend.set_rate(Ok(None));
    let h = harness_with(backend);

    let form = h.engine.open_mission_form(None).await.unwrap();

    match wait_for(&h.events, "rate_resolved").await {
        Event::RateResolved { rate_per_km, .. } => assert_eq!(rate_per_km, 0.0),
        other => panic!("unexpected event {:?}", other),
    }

    let form = h.engine.find_mission_form(form.id).await.unwrap();
    assert_eq!(form.rate_per_km(), Some(0.0));
}

#[tokio::test]
async fn removing_last_destination_clears_route() {
    let h = harness();

    let form = h.engine.open_mission_form(None).await.unwrap();
    wait_for(&h.events, "rate_resolved").await;
    h.engine.add_destination(form.id, AHVAZ).await.unwrap();

    let form = h.engine.remove_destination(form.id, 0).await.unwrap();

    assert!(form.destinations.is_empty());
    assert!(form.route.is_none());
    assert_eq!(form.final_cost, 0.0);
    assert_eq!(form.summary().total_distance_km, 0.0);
    assert_eq!(form.mission_coordinates, "");
    assert_eq!(form.mission_location, "");
    wait_for(&h.events, "route_cleared").await;
    assert_eq!(h.router.calls(), 1);
}

#[tokio::test]
async fn removing_a_middle_destination_reroutes_the_rest() {
    let h = harness();

    let form = h.engine.open_mission_form(None).await.unwrap();
    wait_for(&h.events, "rate_resolved").await;
    h.engine.add_destination(form.id, AHVAZ).await.unwrap();
    let form = h.engine.add_destination(form.id, DEZFUL).await.unwrap();
    assert_eq!(form.final_cost, 200000.0);

    let form = h.engine.remove_destination(form.id, 0).await.unwrap();

    assert_eq!(form.destinations.coordinates(), vec![DEZFUL]);
    assert_eq!(form.route.as_ref().unwrap().forward_path, vec![HQ, DEZFUL]);
    assert_eq!(form.final_cost, 100000.0);
    assert_eq!(form.mission_coordinates, "32.380000, 48.400000");
}

#[tokio::test]
async fn removing_out_of_range_is_rejected() {
    let h = harness();

    let form = h.engine.open_mission_form(None).await.unwrap();
    h.engine.add_destination(form.id, AHVAZ).await.unwrap();

    let err = assert_err!(h.engine.remove_destination(form.id, 1).await);

    assert_eq!(err, invalid_input_error());
    let form = h.engine.find_mission_form(form.id).await.unwrap();
    assert_eq!(form.destinations.len(), 1);
}

#[tokio::test]
async fn invalid_coordinates_are_rejected() {
    let h = harness();

    let form = h.engine.open_mission_form(None).await.unwrap();
    let err = assert_err!(
        h.engine
            .add_destination(form.id, Coordinates { lat: 95.0, lng: 48.0 })
            .await
    );

    assert_eq!(err, invalid_input_error());
}

#[tokio::test]
async fn stale_route_result_is_discarded() {
    let h = harness();

    let form = h.engine.open_mission_form(None).await.unwrap();
    wait_for(&h.events, "rate_resolved").await;

    let gate = h.router.hold_next();
    let first = tokio::spawn({
        let engine = h.engine.clone();
        async move { engine.add_destination(form.id, AHVAZ).await }
    });
    h.router.wait_for_calls(1).await;

    let form = h.engine.add_destination(form.id, DEZFUL).await.unwrap();
    assert_eq!(form.route.as_ref().unwrap().total_distance_km, 40.0);
    assert_eq!(form.final_cost, 200000.0);

    gate.add_permits(1);
    first.await.unwrap().unwrap();

    assert_eq!(
        wait_for(&h.events, "stale_route_discarded").await,
        Event::StaleRouteDiscarded {
            form_id: form.id,
            seq: 1
        }
    );

    let form = h.engine.find_mission_form(form.id).await.unwrap();
    assert_eq!(form.route.as_ref().unwrap().total_distance_km, 40.0);
    assert_eq!(form.final_cost, 200000.0);
}

#[tokio::test]
async fn in_flight_result_does_not_resurrect_cleared_route() {
    let h = harness();

    let form = h.engine.open_mission_form(None).await.unwrap();
    wait_for(&h.events, "rate_resolved").await;

    let gate = h.router.hold_next();
    let pending = tokio::spawn({
        let engine = h.engine.clone();
        async move { engine.add_destination(form.id, AHVAZ).await }
    });
    h.router.wait_for_calls(1).await;

    let form = h.engine.remove_destination(form.id, 0).await.unwrap();
    assert!(form.route.is_none());

    gate.add_permits(1);
    let form = pending.await.unwrap().unwrap();

    assert!(form.route.is_none());
    assert_eq!(form.final_cost, 0.0);
}

#[tokio::test]
async fn route_failure_keeps_previous_route() {
    let h = harness();

    let form = h.engine.open_mission_form(None).await.unwrap();
    wait_for(&h.events, "rate_resolved").await;
    h.engine.add_destination(form.id, AHVAZ).await.unwrap();

    h.router.fail(true);
    let form = h.engine.add_destination(form.id, DEZFUL).await.unwrap();

    assert_eq!(form.destinations.len(), 2);
    assert_eq!(form.route.as_ref().unwrap().total_distance_km, 20.0);
    assert_eq!(form.final_cost, 100000.0);
    assert_eq!(form.last_error.as_deref(), Some("upstream error"));

    match wait_for(&h.events, "route_failed").await {
        Event::RouteFailed { seq, message, .. } => {
            assert_eq!(seq, 2);
            assert_eq!(message, "upstream error");
        }
        other => panic!("unexpected event {:?}", other),
    }

    h.router.fail(false);
    let form = h.engine.remove_destination(form.id, 1).await.unwrap();
    assert!(form.last_error.is_none());
}

#[tokio::test]
async fn geocoding_failure_leaves_title_empty() {
    let h = harness();
    h.geocoder.fail(true);

    let form = h.engine.open_mission_form(None).await.unwrap();
    let form = h.engine.add_destination(form.id, AHVAZ).await.unwrap();

    assert_eq!(form.destinations.len(), 1);
    assert_eq!(form.destinations.last().unwrap().title, "");
    assert_eq!(form.mission_location, "");
}

#[tokio::test]
async fn changing_origin_reroutes() {
    let h = harness();

    let form = h.engine.open_mission_form(None).await.unwrap();
    wait_for(&h.events, "rate_resolved").await;
    h.engine.add_destination(form.id, AHVAZ).await.unwrap();

    let form = h.engine.select_origin(form.id, 2).await.unwrap();

    assert_eq!(form.origin.as_ref().unwrap().name, "Branch");
    let route = form.route.as_ref().unwrap();
    assert_eq!(route.forward_path[0], Coordinates { lat: 30.43, lng: 48.18 });
    assert_eq!(h.router.calls(), 2);

    let err = h.engine.select_origin(form.id, 99).await.unwrap_err();
    assert_eq!(err, invalid_input_error());
}

fn persisted_order(from_unit: &str) -> MissionOrder {
    let mut order = MissionOrder {
        id: Some(7),
        from_unit: from_unit.into(),
        mission_location: "Ahvaz".into(),
        mission_coordinates: "31.320000, 48.670000".into(),
        forward_distance: 12.5,
        return_distance: 13.0,
        total_distance: 25.5,
        forward_time: 0.4,
        return_time: 0.45,
        total_time: 0.85,
        final_cost: 127500.0,
        ..Default::default()
    };
    order.details.first_name = "Sara".into();
    order.details.day = Some(CalendarDate::new(2024, 5, 1).unwrap());
    order
        .destinations
        .add(Destination::new(AHVAZ, "Ahvaz".into()));
    order
}

#[tokio::test]
async fn edit_form_shows_persisted_summary_then_updates_in_place() {
    let mut backend = FakeBackend::new();
    backend.insert_order(persisted_order("Branch"));
    let gate = backend.gate_rate();
    let h = harness_with(backend);

    let form = h.engine.open_mission_form(Some(7)).await.unwrap();

    assert_eq!(form.mission_order_id, Some(7));
    assert_eq!(form.origin.as_ref().unwrap().name, "Branch");
    assert_eq!(form.details.first_name, "Sara");
    assert_eq!(form.summary().total_distance_km, 25.5);
    assert_eq!(form.final_cost, 127500.0);

    gate.add_permits(1);
    wait_for(&h.events, "route_updated").await;

    let order = h.engine.submit_mission_form(form.id).await.unwrap();

    assert_eq!(order.id, Some(7));
    assert_eq!(order.from_unit, "Branch");
    assert_eq!(order.total_distance, 20.0);
    assert_eq!(order.final_cost, 100000.0);
    assert_eq!(h.backend.order(7).unwrap(), order);

    let form = h.engine.find_mission_form(form.id).await.unwrap();
    assert_eq!(form.destinations.len(), 1);
}

#[tokio::test]
async fn edit_form_with_unknown_unit_has_no_origin() {
    let backend = FakeBackend::new();
    backend.insert_order(persisted_order("Closed Office"));
    let h = harness_with(backend);

    let form = h.engine.open_mission_form(Some(7)).await.unwrap();
    assert!(form.origin.is_none());

    wait_for(&h.events, "rate_resolved").await;
    assert_eq!(h.router.calls(), 0);

    let err = h.engine.submit_mission_form(form.id).await.unwrap_err();
    assert_eq!(err, invalid_state_error());
}

#[tokio::test]
async fn editing_a_missing_order_is_not_found() {
    let h = harness();

    let err = h.engine.open_mission_form(Some(404)).await.unwrap_err();

    assert_eq!(err, not_found_error());
}

#[tokio::test]
async fn submitting_a_new_order_creates_and_resets_the_form() {
    let h = harness();

    let form = h.engine.open_mission_form(None).await.unwrap();
    wait_for(&h.events, "rate_resolved").await;

    let details = MissionDetails {
        first_name: "Reza".into(),
        last_name: "Karimi".into(),
        personnel_number: "1042".into(),
        day: Some(CalendarDate::new(2024, 6, 2).unwrap()),
        mission_subject: "Inspection".into(),
        total_weight_kg: Some(120.0),
        ..Default::default()
    };
    h.engine
        .update_mission_details(form.id, details.clone())
        .await
        .unwrap();
    h.engine.add_destination(form.id, AHVAZ).await.unwrap();

    let order = h.engine.submit_mission_form(form.id).await.unwrap();

    let id = order.id.unwrap();
    let stored = h.backend.order(id).unwrap();
    assert_eq!(stored.details, details);
    assert_eq!(stored.from_unit, "HQ");
    assert_eq!(stored.destinations.coordinates(), vec![AHVAZ]);
    assert_eq!(stored.mission_location, "Place 31.32, 48.67");
    assert_eq!(stored.total_distance, 20.0);
    assert_eq!(stored.total_time, 1.0);
    assert_eq!(stored.final_cost, 100000.0);

    let form = h.engine.find_mission_form(form.id).await.unwrap();
    assert!(form.destinations.is_empty());
    assert!(form.route.is_none());
    assert_eq!(form.details, MissionDetails::default());
    assert_eq!(form.origin.as_ref().unwrap().name, "HQ");
}

#[tokio::test]
async fn discarded_form_is_gone() {
    let h = harness();

    let form = h.engine.open_mission_form(None).await.unwrap();
    h.engine.discard_mission_form(form.id).await.unwrap();

    assert_eq!(
        h.engine.find_mission_form(form.id).await.unwrap_err(),
        not_found_error()
    );
    assert_eq!(
        h.engine.discard_mission_form(form.id).await.unwrap_err(),
        not_found_error()
    );
}

#[tokio::test]
async fn default_unit_cannot_be_deleted() {
    let h = harness();

    let err = h.engine.delete_unit_location(1).await.unwrap_err();
    assert_eq!(err, invalid_state_error());

    assert_ok!(h.engine.delete_unit_location(2).await);
    assert_eq!(h.engine.list_unit_locations().await.unwrap().len(), 1);
}

#[tokio::test]
async fn stored_cost_is_recomputed_on_submit() {
    let backend = FakeBackend::new();
    let mut order = persisted_order("HQ");
    order.final_cost = 1.0;
    backend.insert_order(order);
    let h = harness_with(backend);

    let form = h.engine.open_mission_form(Some(7)).await.unwrap();
    wait_for(&h.events, "route_updated").await;

    h.engine.submit_mission_form(form.id).await.unwrap();

    let stored = h.backend.order(7).unwrap();
    assert_eq!(stored.total_distance, 20.0);
    assert_eq!(stored.final_cost, 100000.0);
}

#[tokio::test]
async fn destination_added_during_create_is_kept() {
    let mut backend = FakeBackend::new();
    let gate = backend.gate_create();
    let h = harness_with(backend);

    let form = h.engine.open_mission_form(None).await.unwrap();
    let id = form.id;
    wait_for(&h.events, "rate_resolved").await;
    h.engine.add_destination(id, AHVAZ).await.unwrap();

    let engine = h.engine.clone();
    let submit = tokio::spawn(async move { engine.submit_mission_form(id).await });
    h.backend.wait_for_creates(1).await;

    h.engine.add_destination(id, DEZFUL).await.unwrap();
    gate.add_permits(1);

    let order = assert_ok!(submit.await.unwrap());
    assert_eq!(order.destinations.coordinates(), vec![AHVAZ]);

    let form = h.engine.find_mission_form(id).await.unwrap();
    assert_eq!(form.destinations.coordinates(), vec![AHVAZ, DEZFUL]);
    assert_eq!(form.final_cost, 200000.0);
}

#[tokio::test]
async fn idle_forms_are_evicted() {
    let h = harness();

    let idle = h.engine.open_mission_form(None).await.unwrap();
    let active = h.engine.open_mission_form(None).await.unwrap();
    wait_for(&h.events, "rate_resolved").await;
    wait_for(&h.events, "rate_resolved").await;

    tokio::time::sleep(Duration::from_millis(60)).await;
    h.engine.find_mission_form(active.id).await.unwrap();

    assert_eq!(h.engine.evict_idle_forms(Duration::from_millis(50)).await, 1);
    assert_eq!(
        h.engine.find_mission_form(idle.id).await.unwrap_err(),
        not_found_error()
    );
    assert_ok!(h.engine.find_mission_form(active.id).await);

    assert_eq!(h.engine.evict_idle_forms(Duration::from_secs(3600)).await, 0);
}

#[tokio::test]
async fn sweeper_expires_abandoned_forms() {
    let h = harness();

    let form = h.engine.open_mission_form(None).await.unwrap();
    wait_for(&h.events, "rate_resolved").await;

    let sweeper = h.engine.spawn_form_sweeper(Duration::from_millis(40));
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert_err!(h.engine.find_mission_form(form.id).await);

    sweeper.abort();
}

#[tokio::test]
async fn undrained_events_are_dropped_beyond_capacity() {
    let h = harness();
    assert_eq!(h.events.capacity(), Some(EVENT_CAPACITY));

    let engine = Engine::new(
        FakeBackend::new(),
        ScriptedRouter::default(),
        FakeGeocoder::default(),
    )
    .with_event_capacity(1);
    let events = engine.events();

    let form = engine.open_mission_form(None).await.unwrap();
    tokio::time::timeout(Duration::from_secs(2), async {
        while events.is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("rate was not resolved");

    let form = engine.add_destination(form.id, AHVAZ).await.unwrap();
    assert_eq!(form.final_cost, 100000.0);

    assert_eq!(events.len(), 1);
    assert_eq!(next_event(&events).await.name(), "rate_resolved");
    assert!(events.is_empty());
}
