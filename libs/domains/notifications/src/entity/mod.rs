//! Sea-ORM entities backing the provider configuration store.

pub mod app_setting;
pub mod provider_config;
