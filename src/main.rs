mod app;
mod audio;
mod config;
mod error;
mod library;
mod logging;
mod mpris;
mod player;
mod runtime;
mod session;
mod settings;
mod sync;
mod ui;

#[cfg(test)]
mod testing;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
