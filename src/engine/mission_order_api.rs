use super::Engine;

use async_trait::async_trait;

use crate::{
    api::MissionOrderAPI,
    entities::MissionOrder,
    error::Error,
};

#[async_trait]
impl MissionOrderAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn list_mission_orders(&self) -> Result<Vec<MissionOrder>, Error> {
        self.backend.list_mission_orders().await
    }

    #[tracing::instrument(skip(self))]
    async fn find_mission_order(&self, id: i64) -> Result<MissionOrder, Error> {
        self.backend.find_mission_order(id).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_mission_order(&self, id: i64) -> Result<(), Error> {
        self.backend.delete_mission_order(id).await
    }
}
