use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub salon_config_path: String,
    pub appointments_path: String,
    pub conversation_timeout_minutes: i64,
    pub whatsapp_api_version: String,
    pub whatsapp_phone_number_id: String,
    pub whatsapp_access_token: String,
    pub whatsapp_verify_token: String,
    pub whatsapp_app_secret: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            salon_config_path: env::var("SALON_CONFIG_PATH")
                .unwrap_or_else(|_| "salon.json".to_string()),
            appointments_path: env::var("APPOINTMENTS_PATH")
                .unwrap_or_else(|_| "appointments.json".to_string()),
            conversation_timeout_minutes: env::var("CONVERSATION_TIMEOUT_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|m| *m > 0)
                .unwrap_or(30),
            whatsapp_api_version: env::var("WHATSAPP_API_VERSION")
                .unwrap_or_else(|_| "v18.0".to_string()),
            whatsapp_phone_number_id: env::var("WHATSAPP_PHONE_NUMBER_ID").unwrap_or_default(),
            whatsapp_access_token: env::var("WHATSAPP_ACCESS_TOKEN").unwrap_or_default(),
            whatsapp_verify_token: env::var("WHATSAPP_VERIFY_TOKEN").unwrap_or_default(),
            whatsapp_app_secret: env::var("WHATSAPP_APP_SECRET").unwrap_or_default(),
        }
    }
}
