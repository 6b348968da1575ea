use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub price_list_path: String,
    pub zapi_instance_id: String,
    pub zapi_token: String,
    pub zapi_client_token: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "agendabot.db".to_string()),
            price_list_path: env::var("PRICE_LIST_PATH")
                .unwrap_or_else(|_| "data/price_list.json".to_string()),
            zapi_instance_id: env::var("Z_API_INSTANCE_ID").unwrap_or_default(),
            zapi_token: env::var("Z_API_TOKEN").unwrap_or_default(),
            zapi_client_token: env::var("ZAPI_CLIENT_TOKEN").unwrap_or_default(),
        }
    }
}
