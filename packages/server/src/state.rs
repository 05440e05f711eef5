use sea_orm::DatabaseConnection;

use crate::activity::ActivityRecorder;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub activity: ActivityRecorder,
}
