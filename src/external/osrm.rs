use async_trait::async_trait;
use geo_types::LineString;
use serde::Deserialize;

use crate::entities::{round2, Coordinates, RouteComputation, RouteLeg};
use crate::error::{invalid_input_error, upstream_error, Error};
use crate::external::RouteService;

#[derive(Clone, Debug)]
pub struct Osrm {
    api_base: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct Response {
    code: String,
    message: Option<String>,
    routes: Option<Vec<Route>>,
}

#[derive(Debug, Deserialize)]
struct Route {
    distance: f64,
    duration: f64,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<[f64; 2]>,
}

impl Osrm {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            http: reqwest::Client::new(),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn route_leg(&self, waypoints: Vec<Coordinates>) -> Result<RouteLeg, Error> {
        let waypoints = waypoints
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
            .join(";");

        let url = format!(
            "{}/route/v1/driving/{}",
            self.api_base.trim_end_matches('/'),
            waypoints
        );

        let res = self
            .http
            .get(url)
            .query(&[("overview", "full")])
            .query(&[("geometries", "geojson")])
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if status_code >= 400 && status_code < 500 {
            return Err(invalid_input_error());
        } else if status_code != 200 {
            return Err(upstream_error());
        }

        let data: Response = res.json().await?;

        if data.code != "Ok" {
            tracing::warn!(code = %data.code, message = ?data.message, "routing request rejected");
            return Err(upstream_error());
        }

        let route = data
            .routes
            .and_then(|routes| routes.into_iter().next())
            .ok_or_else(upstream_error)?;

        let line = LineString::<f64>::from(route.geometry.coordinates);

        Ok(RouteLeg {
            path: line.into_iter().map(Coordinates::from).collect(),
            distance_km: round2(route.distance / 1000.0),
            duration_hours: round2(route.duration / 3600.0),
        })
    }
}

#[async_trait]
impl RouteService for Osrm {
    #[tracing::instrument(skip(self))]
    async fn compute_route(
        &self,
        origin: Coordinates,
        destinations: &[Coordinates],
    ) -> Result<RouteComputation, Error> {
        if destinations.is_empty() {
            return Err(invalid_input_error());
        }

        let (forward, back) = futures::try_join!(
            self.route_leg(forward_waypoints(origin, destinations)),
            self.route_leg(return_waypoints(origin, destinations)),
        )?;

        Ok(RouteComputation::new(forward, back))
    }
}

fn forward_waypoints(origin: Coordinates, destinations: &[Coordinates]) -> Vec<Coordinates> {
    std::iter::once(origin)
        .chain(destinations.iter().copied())
        .collect()
}

fn return_waypoints(origin: Coordinates, destinations: &[Coordinates]) -> Vec<Coordinates> {
    destinations
        .iter()
        .rev()
        .copied()
        .chain(std::iter::once(origin))
        .collect()
}

#[test]
fn waypoints_run_out_and_back() {
    let origin = Coordinates { lat: 1.0, lng: 1.0 };
    let a = Coordinates { lat: 2.0, lng: 2.0 };
    let b = Coordinates { lat: 3.0, lng: 3.0 };

    assert_eq!(forward_waypoints(origin, &[a, b]), vec![origin, a, b]);
    assert_eq!(return_waypoints(origin, &[a, b]), vec![b, a, origin]);
}

#[test]
fn decodes_geojson_route() {
    let data: Response = serde_json::from_value(serde_json::json!({
        "code": "Ok",
        "routes": [{
            "distance": 10234.0,
            "duration": 1800.0,
            "geometry": { "type": "LineString", "coordinates": [[48.72, 31.35], [48.73, 31.36]] }
        }]
    }))
    .unwrap();

    let route = data.routes.unwrap().remove(0);
    let line = LineString::<f64>::from(route.geometry.coordinates);
    let path: Vec<Coordinates> = line.into_iter().map(Coordinates::from).collect();

    assert_eq!(path[0], Coordinates { lat: 31.35, lng: 48.72 });
    assert_eq!(round2(route.distance / 1000.0), 10.23);
    assert_eq!(round2(route.duration / 3600.0), 0.5);
}
