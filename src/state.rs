use std::sync::Arc;

use sea_orm::DatabaseConnection;
use secrecy::SecretString;

use crate::notify::NotificationQueue;

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub jwt_secret: Arc<SecretString>,
    pub notifications: NotificationQueue,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, jwt_secret: SecretString) -> Self {
        Self {
            orm,
            jwt_secret: Arc::new(jwt_secret),
            notifications: NotificationQueue::new(),
        }
    }
}
