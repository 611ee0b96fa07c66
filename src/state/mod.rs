pub mod app_settings;
pub mod backoff;
pub mod live;
pub mod messages;
pub mod network;
pub mod refresher;
pub mod socket;
