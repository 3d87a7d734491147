pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;
pub mod ui;

pub fn init(verbose: bool) {
    infra::logging::init(verbose);
}
