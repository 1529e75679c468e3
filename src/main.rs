use anyhow::Context;
use chrono::{Local, Utc};
use cowatch::{
    app::App,
    config::Config,
    display::{Screen, WidgetFramebuffer},
    state::{FileStorage, Store},
    view::HeadlessSurface,
    weather::{self, Weather},
};
use log::{error, info, LevelFilter};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

/// All of the widget's cadences hang off this one loop interval
const TICK_INTERVAL: Duration = Duration::from_secs(1);

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_module("cowatch", LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = Config::load();
    let store = Store::new(Box::new(FileStorage::load(
        config.settings_path.clone(),
    )));

    let place = weather::resolve_place(&config);
    info!("Showing weather for {}", place.city);
    let weather = Weather::new(&place);
    weather.refresh(); // Initial fetch; later ones ride the staleness check

    let mut app = App::new(
        store,
        weather,
        HeadlessSurface,
        Utc::now().timestamp_millis(),
    );
    let mut screen = Screen::new(WidgetFramebuffer::new());

    let terminated = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&terminated);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .context("Error installing shutdown handler")?;

    info!("Starting tick loop");
    while !terminated.load(Ordering::Relaxed) {
        // A bad tick (e.g. settings flush to a full disk) shouldn't kill
        // the clock; log it and keep ticking
        if let Err(err) = tick(&mut app, &mut screen) {
            error!("Error during tick: {err:?}");
        }
        thread::sleep(TICK_INTERVAL);
    }
    info!("Shutting down");
    Ok(())
}

fn tick(
    app: &mut App<HeadlessSurface>,
    screen: &mut Screen<WidgetFramebuffer>,
) -> anyhow::Result<()> {
    app.tick(Instant::now());
    let state = app.frame_state(Local::now());
    screen.tick(&state)?;
    Ok(())
}
