// Application state shared across handlers
use std::sync::Arc;

use crate::{
    app_config::AppConfig,
    db::DieselPool,
    services::{AuthProvider, EmailService, JwtService, ObjectStorage},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub diesel_pool: DieselPool,
    pub jwt_service: Arc<JwtService>,
    pub auth_provider: Arc<dyn AuthProvider>,
    pub storage: Arc<dyn ObjectStorage>,
    pub email_service: Arc<EmailService>,
    pub max_connections: u32,
}
