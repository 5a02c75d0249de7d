pub mod browser;
pub mod config;
pub mod effects;
pub mod injector;
pub mod logging;
pub mod page;
pub mod session;
