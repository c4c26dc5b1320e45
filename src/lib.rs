pub mod address;
pub mod comm;
pub mod config;
pub mod consts;
pub mod driver;
pub mod gateway;
pub mod homeassistant;
pub mod lamp;
