pub mod bot;
pub mod channels;
pub mod config;
pub mod panels;
pub mod shared;
pub mod tickets;
pub mod web_server;
