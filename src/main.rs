use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use mappit::{
    camera::{self, CameraPosition, Drag, Viewport},
    pin::{self, NewPin, Pin},
    reaction::{self, Bookmark, Like},
    settings, GeoPoint, Searcher, Store, Theme, INTERACTION_DISTANCE,
};

/// Drop pins on a map and find the ones close enough to open
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Directory holding the saved camera, reactions and settings
    #[arg(long, global = true, env = "MAPPIT_STATE_DIR")]
    state_dir: Option<PathBuf>,
    #[arg(short, long, global = true, action)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Distance in meters between two points given as <lat>,<lon>
    Distance {
        #[arg(allow_hyphen_values = true)]
        from: GeoPoint,
        #[arg(allow_hyphen_values = true)]
        to: GeoPoint,
    },
    /// Inspect or change the saved camera
    Camera {
        #[command(subcommand)]
        action: CameraAction,
    },
    /// Rotate the saved camera by one drag gesture
    #[command(allow_negative_numbers = true)]
    Drag {
        /// Touch position, viewport pixels
        #[arg(long)]
        x: f32,
        #[arg(long)]
        y: f32,
        /// Motion since the last update, pixels
        #[arg(long)]
        dx: f32,
        #[arg(long)]
        dy: f32,
        #[arg(long, default_value_t = 1080)]
        width: u32,
        #[arg(long, default_value_t = 1920)]
        height: u32,
    },
    /// List pins around a point, the saved camera target by default
    Near {
        /// JSON array of pin rows
        #[arg(short, long, env = "MAPPIT_PINS")]
        pins: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        at: Option<GeoPoint>,
        /// Max distance in meters
        #[arg(short, long, default_value_t = 1000.0)]
        radius: f64,
        #[arg(short, long, action)]
        sort_by_distance: bool,
    },
    /// Show a pin's details if it is within reach
    Open {
        #[arg(short, long, env = "MAPPIT_PINS")]
        pins: PathBuf,
        pin_id: Uuid,
        #[arg(long, allow_hyphen_values = true)]
        at: Option<GeoPoint>,
    },
    /// Drop a new pin at the saved camera target
    Drop {
        #[arg(short, long, env = "MAPPIT_PINS")]
        pins: PathBuf,
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value_t = String::new())]
        description: String,
        /// Author of the pin
        #[arg(short, long, default_value_t = Uuid::nil())]
        user: Uuid,
    },
    /// Delete a pin you authored
    Delete {
        #[arg(short, long, env = "MAPPIT_PINS")]
        pins: PathBuf,
        pin_id: Uuid,
        #[arg(short, long)]
        user: Uuid,
    },
    /// List the pins a user dropped, newest first
    Profile {
        #[arg(short, long, env = "MAPPIT_PINS")]
        pins: PathBuf,
        #[arg(short, long)]
        user: Uuid,
    },
    /// Like a pin, or take the like back
    Like {
        #[arg(short, long, env = "MAPPIT_PINS")]
        pins: PathBuf,
        pin_id: Uuid,
        #[arg(short, long)]
        user: Uuid,
    },
    /// Bookmark a pin, or remove the bookmark
    Bookmark {
        #[arg(short, long, env = "MAPPIT_PINS")]
        pins: PathBuf,
        pin_id: Uuid,
        #[arg(short, long)]
        user: Uuid,
    },
    /// List the pins a user bookmarked
    Bookmarks {
        #[arg(short, long, env = "MAPPIT_PINS")]
        pins: PathBuf,
        #[arg(short, long)]
        user: Uuid,
    },
    /// Theme and app lock preferences
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    /// light, dark or system
    Theme { theme: Theme },
    AppLock {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Subcommand)]
enum CameraAction {
    Show,
    /// Recenter the camera
    Move {
        #[arg(allow_hyphen_values = true)]
        at: GeoPoint,
        #[arg(short, long)]
        zoom: Option<f32>,
    },
    Incline,
    Straighten,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let state_dir = match args.state_dir {
        Some(dir) => dir,
        None => dirs::cache_dir()
            .context("no cache directory, pass --state-dir")?
            .join("mappit"),
    };

    match args.command {
        Command::Distance { from, to } => {
            println!("{:.1}", mappit::distance(from, to));
        }
        Command::Camera { action } => {
            let store = open_store(&state_dir)?;
            let mut camera = camera::load_camera(&store)?;
            match action {
                CameraAction::Show => {}
                CameraAction::Move { at, zoom } => {
                    camera.move_to(at);
                    if let Some(zoom) = zoom {
                        camera.set_zoom(zoom);
                    }
                    camera::save_camera(&store, &camera)?;
                }
                CameraAction::Incline => camera.incline(),
                CameraAction::Straighten => camera.straighten(),
            }
            print_camera(&camera);
        }
        Command::Drag {
            x,
            y,
            dx,
            dy,
            width,
            height,
        } => {
            let store = open_store(&state_dir)?;
            let mut camera = camera::load_camera(&store)?;
            camera.apply_drag(&Drag::new(x, y, dx, dy), &Viewport::new(width, height));
            camera::save_camera(&store, &camera)?;
            println!("{:.1}", camera.bearing);
        }
        Command::Near {
            pins,
            at,
            radius,
            sort_by_distance,
        } => {
            let center = resolve_center(at, &state_dir)?;
            let pins = read_pins(&pins)?;
            let searcher = Searcher::new(center, radius, sort_by_distance);
            let found = searcher.search(&pins);
            eprintln!(
                "Found {} pins within {} m of {}, * within {} m",
                found.len(),
                radius,
                searcher.center(),
                INTERACTION_DISTANCE
            );
            for m in found {
                let mark = if m.interactable { "*" } else { " " };
                println!("{}\t{:.1}\t{}\t{}", mark, m.distance, m.pin.id, m.pin.title);
            }
        }
        Command::Open { pins, pin_id, at } => {
            let center = resolve_center(at, &state_dir)?;
            let pins = read_pins(&pins)?;
            let pin = pin::find_pin(&pins, pin_id)?;
            let pin = mappit::open_pin(center, pin)?;
            print_pin(pin);
        }
        Command::Drop {
            pins: pins_path,
            title,
            description,
            user,
        } => {
            let store = open_store(&state_dir)?;
            let camera = camera::load_camera(&store)?;
            let mut pins = if pins_path.exists() {
                read_pins(&pins_path)?
            } else {
                Vec::new()
            };
            let new = NewPin::at(camera.target, title, description, user);
            let pin = Pin::from_new(new, Uuid::new_v4(), Utc::now());
            println!("{}", pin.id);
            pins.push(pin);
            write_pins(&pins_path, &pins)?;
        }
        Command::Delete {
            pins: pins_path,
            pin_id,
            user,
        } => {
            let mut pins = read_pins(&pins_path)?;
            let deleted = pin::delete_pin(&mut pins, pin_id, user)?;
            write_pins(&pins_path, &pins)?;

            let store = open_store(&state_dir)?;
            let mut likes: Vec<Like> = reaction::load(&store)?;
            reaction::forget_pin(&mut likes, pin_id);
            reaction::save(&store, &likes)?;
            let mut bookmarks: Vec<Bookmark> = reaction::load(&store)?;
            reaction::forget_pin(&mut bookmarks, pin_id);
            reaction::save(&store, &bookmarks)?;

            println!("{}", deleted.title);
        }
        Command::Profile { pins, user } => {
            let pins = read_pins(&pins)?;
            for p in pin::pins_of_user(&pins, user) {
                print_row(p);
            }
        }
        Command::Like { pins, pin_id, user } => {
            let pins = read_pins(&pins)?;
            pin::find_pin(&pins, pin_id)?;
            let store = open_store(&state_dir)?;
            let mut likes: Vec<Like> = reaction::load(&store)?;
            let liked = reaction::toggle(&mut likes, user, pin_id);
            reaction::save(&store, &likes)?;
            let state = if liked { "liked" } else { "unliked" };
            println!("{}\t{}", state, reaction::count_for_pin(&likes, pin_id));
        }
        Command::Bookmark { pins, pin_id, user } => {
            let pins = read_pins(&pins)?;
            pin::find_pin(&pins, pin_id)?;
            let store = open_store(&state_dir)?;
            let mut bookmarks: Vec<Bookmark> = reaction::load(&store)?;
            let saved = reaction::toggle(&mut bookmarks, user, pin_id);
            reaction::save(&store, &bookmarks)?;
            println!("{}", if saved { "bookmarked" } else { "unbookmarked" });
        }
        Command::Bookmarks { pins, user } => {
            let pins = read_pins(&pins)?;
            let store = open_store(&state_dir)?;
            let bookmarks: Vec<Bookmark> = reaction::load(&store)?;
            for p in reaction::bookmarked_pins(&bookmarks, &pins, user) {
                print_row(p);
            }
        }
        Command::Settings { action } => {
            let store = open_store(&state_dir)?;
            let mut prefs = settings::load_settings(&store)?;
            match action {
                SettingsAction::Show => {}
                SettingsAction::Theme { theme } => {
                    prefs.theme = theme;
                    settings::save_settings(&store, &prefs)?;
                }
                SettingsAction::AppLock { enabled } => {
                    prefs.app_lock = enabled;
                    settings::save_settings(&store, &prefs)?;
                }
            }
            println!("theme\t{}", prefs.theme);
            println!("app_lock\t{}", prefs.app_lock);
        }
    }
    Ok(())
}

fn open_store(dir: &Path) -> Result<Store> {
    let store = Store::new(dir).with_context(|| format!("opening state dir {}", dir.display()))?;
    debug!(path = %store.path().display(), "state dir");
    Ok(store)
}

fn read_pins(path: &Path) -> Result<Vec<Pin>> {
    let pins =
        pin::load_pins(path).with_context(|| format!("reading pins from {}", path.display()))?;
    for p in pins.iter().filter(|p| !p.location().is_valid()) {
        warn!(pin = %p.id, location = %p.location(), "coordinate out of range");
    }
    Ok(pins)
}

fn write_pins(path: &Path, pins: &[Pin]) -> Result<()> {
    pin::save_pins(path, pins).with_context(|| format!("writing {}", path.display()))
}

fn resolve_center(at: Option<GeoPoint>, state_dir: &Path) -> Result<GeoPoint> {
    match at {
        Some(at) => Ok(at),
        None => Ok(camera::load_camera(&open_store(state_dir)?)?.target),
    }
}

fn print_camera(camera: &CameraPosition) {
    println!("target\t{}", camera.target);
    println!("zoom\t{:.1}", camera.zoom);
    println!("tilt\t{:.1}", camera.tilt);
    println!("bearing\t{:.1}", camera.bearing);
}

fn print_row(pin: &Pin) {
    let day = pin::format_day(&pin.created_at.with_timezone(&Local));
    println!("{}\t{}\t{}", day, pin.id, pin.title);
}

fn print_pin(pin: &Pin) {
    println!("{}", pin.title);
    println!("{}", pin::format_timestamp(&pin.created_at.with_timezone(&Local)));
    println!("{}", pin.location());
    if !pin.description.is_empty() {
        println!();
        println!("{}", pin.description);
    }
}
