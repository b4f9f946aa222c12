use super::{Engine, Event};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::MissionFormAPI,
    entities::{Coordinates, Destination, MissionDetails, MissionForm, MissionOrder, RouteRequest},
    error::{not_found_error, Error},
};

#[async_trait]
impl MissionFormAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn open_mission_form(
        &self,
        mission_order_id: Option<i64>,
    ) -> Result<MissionForm, Error> {
        let units = self.backend.list_unit_locations().await?;

        let form = match mission_order_id {
            Some(id) => {
                let order = self.backend.find_mission_order(id).await?;
                MissionForm::for_order(order, units)
            }
            None => MissionForm::new(units),
        };

        let id = form.id;
        self.insert_form(form.clone()).await;

        tracing::info!(form_id = %id, "mission form opened");

        let engine = self.clone();
        tokio::spawn(async move { engine.load_rate(id).await });

        Ok(form)
    }

    #[tracing::instrument(skip(self))]
    async fn find_mission_form(&self, id: Uuid) -> Result<MissionForm, Error> {
        self.with_form(id, |form| Ok(form.clone())).await
    }

    #[tracing::instrument(skip(self, details))]
    async fn update_mission_details(
        &self,
        id: Uuid,
        details: MissionDetails,
    ) -> Result<MissionForm, Error> {
        self.with_form(id, |form| {
            form.update_details(details);
            Ok(form.clone())
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn select_origin(&self, id: Uuid, unit_id: i64) -> Result<MissionForm, Error> {
        let request = self
            .with_form(id, |form| form.select_origin(unit_id))
            .await?;

        self.settle(id, request).await
    }

    #[tracing::instrument(skip(self))]
    async fn add_destination(&self, id: Uuid, point: Coordinates) -> Result<MissionForm, Error> {
        let point = Coordinates::new(point.lat, point.lng)?;

        // fail fast before the geocoder round trip
        self.find_mission_form(id).await?;

        let title = match self.geocoder.reverse_geocode(point).await {
            Ok(title) => title,
            Err(err) => {
                tracing::warn!(error = %err, "reverse geocoding failed, leaving title empty");
                String::new()
            }
        };

        let request = self
            .with_form(id, |form| Ok(form.add_destination(Destination::new(point, title))))
            .await?;

        self.settle(id, request).await
    }

    #[tracing::instrument(skip(self))]
    async fn remove_destination(&self, id: Uuid, index: usize) -> Result<MissionForm, Error> {
        let (request, cleared) = self
            .with_form(id, |form| {
                let request = form.remove_destination(index)?;
                Ok((request, form.destinations.is_empty()))
            })
            .await?;

        if cleared {
            self.emit(Event::RouteCleared { form_id: id });
        }

        self.settle(id, request).await
    }

    #[tracing::instrument(skip(self))]
    async fn submit_mission_form(&self, id: Uuid) -> Result<MissionOrder, Error> {
        let (order, mission_order_id) = self
            .with_form(id, |form| Ok((form.to_mission_order()?, form.mission_order_id)))
            .await?;

        let saved = match mission_order_id {
            Some(order_id) => self.backend.update_mission_order(order_id, order).await?,
            None => {
                let saved = self.backend.create_mission_order(order.clone()).await?;

                // edits made while the create was in flight were not saved
                let reset = self.with_form(id, |form| {
                    let unchanged = form.to_mission_order().map_or(false, |now| now == order);
                    if unchanged {
                        form.reset();
                    }
                    Ok(unchanged)
                });

                match reset.await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::warn!(form_id = %id, "form changed during submission, keeping it")
                    }
                    Err(err) => tracing::debug!(error = %err, "form closed before reset"),
                }

                saved
            }
        };

        tracing::info!(form_id = %id, mission_order_id = ?saved.id, "mission order saved");

        Ok(saved)
    }

    #[tracing::instrument(skip(self))]
    async fn discard_mission_form(&self, id: Uuid) -> Result<(), Error> {
        self.forms
            .lock()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(not_found_error)
    }
}

impl Engine {
    /// Resolves the session's rate, falling back to zero when the backend
    /// cannot provide one.
    #[tracing::instrument(skip(self))]
    async fn load_rate(&self, id: Uuid) {
        let rate_per_km = match self.backend.fetch_rate_per_km().await {
            Ok(Some(rate_per_km)) if rate_per_km >= 0.0 => rate_per_km,
            Ok(_) => {
                tracing::warn!("no usable rate setting, using 0");
                0.0
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch rate setting, using 0");
                0.0
            }
        };

        let request = match self
            .with_form(id, |form| Ok(form.resolve_rate(rate_per_km)))
            .await
        {
            Ok(request) => request,
            Err(_) => {
                tracing::debug!("form closed before rate resolved");
                return;
            }
        };

        self.emit(Event::RateResolved {
            form_id: id,
            rate_per_km,
        });

        if let Some(request) = request {
            self.recalculate(request).await;
        }
    }

    /// Runs a recalculation, if one was issued, and returns the form as
    /// it stands afterwards.
    async fn settle(
        &self,
        id: Uuid,
        request: Option<RouteRequest>,
    ) -> Result<MissionForm, Error> {
        if let Some(request) = request {
            self.recalculate(request).await;
        }

        self.find_mission_form(id).await
    }

    #[tracing::instrument(skip(self, request), fields(form_id = %request.form_id, seq = request.seq))]
    async fn recalculate(&self, request: RouteRequest) {
        let result = self
            .router
            .compute_route(request.origin, &request.destinations)
            .await;

        let mut forms = self.forms.lock().await;

        let form = match forms.get_mut(&request.form_id) {
            Some(session) => &mut session.form,
            None => return,
        };

        let event = match result {
            Ok(route) => {
                if form.apply_route(request.seq, route) {
                    Event::RouteUpdated {
                        form_id: request.form_id,
                        seq: request.seq,
                        final_cost: form.final_cost,
                    }
                } else {
                    Event::StaleRouteDiscarded {
                        form_id: request.form_id,
                        seq: request.seq,
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "route recalculation failed");

                if form.record_failure(request.seq, err.to_string()) {
                    Event::RouteFailed {
                        form_id: request.form_id,
                        seq: request.seq,
                        message: err.to_string(),
                    }
                } else {
                    Event::StaleRouteDiscarded {
                        form_id: request.form_id,
                        seq: request.seq,
                    }
                }
            }
        };

        drop(forms);

        self.emit(event);
    }
}
