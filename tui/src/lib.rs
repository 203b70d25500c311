pub mod api;
pub mod app;
pub mod camera;
pub mod routes;
pub mod scan;
pub mod screens;
pub mod session;
pub mod ui;
