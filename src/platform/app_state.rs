use std::sync::Arc;

use crate::{
    orders::transition::TransitionPolicy,
    platform::{config::AppConfig, db::DbPool},
    sms::{NotificationGateway, ReqwestTransport},
    store::{FeedbackRepository, OrderRepository, OutboxStore, pg::PgStore},
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub config: Arc<AppConfig>,
    pub orders: Arc<dyn OrderRepository>,
    pub feedback: Arc<dyn FeedbackRepository>,
    pub outbox: Arc<dyn OutboxStore>,
    pub gateway: Arc<NotificationGateway>,
}

impl AppState {
    /// Wires every store to PostgreSQL and the gateway to the real provider.
    pub fn new(config: AppConfig, db_pool: DbPool) -> Self {
        let store = Arc::new(PgStore::new(db_pool.clone()));
        let transport = Arc::new(ReqwestTransport::new(reqwest::Client::new()));
        let gateway = NotificationGateway::new(config.sms.clone(), transport, store.clone());

        Self {
            db_pool,
            config: Arc::new(config),
            orders: store.clone(),
            feedback: store.clone(),
            outbox: store,
            gateway: Arc::new(gateway),
        }
    }

    pub fn transition_policy(&self) -> TransitionPolicy {
        TransitionPolicy::from_config(self.config.orders.strict_transitions)
    }
}
