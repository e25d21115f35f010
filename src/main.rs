use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use rand::Rng;

mod assets;
mod color;
mod config;
mod demo;
mod font;
mod geometry;
mod gui;
mod input;
mod match_state;
mod particles;
mod render;
mod text_manager;
mod tint;

use assets::{ARROW_DOWN_FILE, AssetLoader};
use color::Color;
use config::{RenderConfig, default_config_path};
use demo::DemoRally;
use font::TextFlags;
use geometry::{SCREEN_HEIGHT, SCREEN_WIDTH, Vector2};
use gui::{DEFAULT_OVERLAY_OPACITY, Imgui, SelectBoxAction};
use input::{FrameInput, KeyAction, SdlInput};
use match_state::PlayerSide;
use particles::BloodSplatter;
use render::{BACKGROUND_IMAGE, BackendKind, RenderBackend, create_backend};
use text_manager::{StringId, TextManager};

const FRAME_TIME: Duration = Duration::from_nanos(1_000_000_000 / 60);
const NAME_LENGTH: usize = 16;
const CHAT_LENGTH: usize = 30;
const BLOOD_PER_HIT: usize = 12;
const BACKGROUND_DIR: &str = "backgrounds";
const SWAP_COLORS_IMAGE: &str = ARROW_DOWN_FILE;

/// Which screen the main loop is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Match,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuOutcome {
    Stay,
    Start,
    Quit,
}

/// Menu widget values that are not part of the saved config
struct MenuState {
    colors: [[f32; 3]; 2],
    name_cursor: usize,
    backgrounds: Vec<String>,
    background_index: usize,
    chat_lines: Vec<String>,
    chat_local: Vec<bool>,
    chat_selected: usize,
    chat_input: String,
    chat_cursor: usize,
    confirm_quit: bool,
    languages: Vec<String>,
}

impl MenuState {
    fn new(config: &RenderConfig) -> Self {
        let backgrounds = list_backgrounds(&config.data_dir, &config.background);
        let background_index = backgrounds
            .iter()
            .position(|name| *name == config.background)
            .unwrap_or(0);
        let mut state = MenuState {
            colors: [
                color_to_sliders(config.left_color),
                color_to_sliders(config.right_color),
            ],
            name_cursor: config.player_name.chars().count(),
            backgrounds,
            background_index,
            chat_lines: Vec::new(),
            chat_local: Vec::new(),
            chat_selected: 0,
            chat_input: String::new(),
            chat_cursor: 0,
            confirm_quit: false,
            languages: list_languages(&config.data_dir, &config.language),
        };
        state.log_chat("welcome to blobby volley", false);
        state
    }

    fn log_chat(&mut self, line: &str, local: bool) {
        self.chat_lines.push(line.to_string());
        self.chat_local.push(local);
        self.chat_selected = self.chat_lines.len() - 1;
    }
}

fn color_to_sliders(color: Color) -> [f32; 3] {
    [color.r, color.g, color.b].map(|channel| channel as f32 / 255.0)
}

fn sliders_to_color(sliders: [f32; 3]) -> Color {
    let [r, g, b] = sliders.map(|value| (value.clamp(0.0, 1.0) * 255.0).round() as u8);
    Color::new(r, g, b)
}

/// Background images found in `<data_dir>/backgrounds`, as asset names.
/// The configured background is always part of the list.
fn list_backgrounds(data_dir: &Path, current: &str) -> Vec<String> {
    let mut names: Vec<String> = match fs::read_dir(data_dir.join(BACKGROUND_DIR)) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| {
                let lower = name.to_lowercase();
                lower.ends_with(".bmp") || lower.ends_with(".png")
            })
            .map(|name| format!("{}/{}", BACKGROUND_DIR, name))
            .collect(),
        Err(e) => {
            warn!("Could not list backgrounds in {}: {}", data_dir.display(), e);
            Vec::new()
        }
    };
    if !names.iter().any(|name| name == current) {
        names.push(current.to_string());
    }
    names.sort();
    names
}

/// Language codes with a `lang_<code>.json` in `data_dir`, plus English and
/// the configured language
fn list_languages(data_dir: &Path, current: &str) -> Vec<String> {
    let mut codes: Vec<String> = match fs::read_dir(data_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter_map(|name| {
                name.strip_prefix("lang_")
                    .and_then(|rest| rest.strip_suffix(".json"))
                    .map(str::to_string)
            })
            .collect(),
        Err(e) => {
            warn!("Could not list languages in {}: {}", data_dir.display(), e);
            Vec::new()
        }
    };
    for code in ["en", current] {
        if !codes.iter().any(|c| c == code) {
            codes.push(code.to_string());
        }
    }
    codes.sort();
    codes
}

/// The language after `current`, wrapping around
fn next_language<'a>(languages: &'a [String], current: &str) -> Option<&'a str> {
    let index = languages.iter().position(|code| code == current)?;
    languages.get((index + 1) % languages.len()).map(String::as_str)
}

/// Builds the main menu for one frame
fn do_menu(
    gui: &mut Imgui,
    backend: &mut dyn RenderBackend,
    config: &mut RenderConfig,
    menu: &mut MenuState,
    input: &FrameInput,
    rng: &mut impl Rng,
) -> MenuOutcome {
    let mut outcome = MenuOutcome::Stay;
    let screen = Vector2::new(SCREEN_WIDTH as f32, SCREEN_HEIGHT as f32);

    if input.key_action == Some(KeyAction::Back) {
        menu.confirm_quit = !menu.confirm_quit;
        gui.reset_selection();
    }
    // The menu stays visible behind the quit dialog but ignores input
    gui.set_inactive(menu.confirm_quit);

    let id = gui.next_id();
    gui.do_image(id, screen * 0.5, BACKGROUND_IMAGE, Vector2::ZERO);
    let id = gui.next_id();
    gui.do_overlay(id, Vector2::ZERO, screen, Color::BLACK, DEFAULT_OVERLAY_OPACITY);

    // Blob colors, one column per side
    for side in PlayerSide::BOTH {
        let x = match side {
            PlayerSide::Left => 30.0,
            PlayerSide::Right => 430.0,
        };
        let title = match side {
            PlayerSide::Left => StringId::OptionsLeftPlayer,
            PlayerSide::Right => StringId::OptionsRightPlayer,
        };
        let id = gui.next_id();
        gui.do_text_id(id, Vector2::new(x, 20.0), title, TextFlags::NORMAL);

        let labels = [StringId::OptionsRed, StringId::OptionsGreen, StringId::OptionsBlue];
        for (channel, label) in labels.into_iter().enumerate() {
            let y = 55.0 + channel as f32 * 55.0;
            let id = gui.next_id();
            gui.do_text_id(id, Vector2::new(x, y), label, TextFlags::SMALL_FONT);
            let id = gui.next_id();
            gui.do_scrollbar(id, Vector2::new(x, y + 13.0), &mut menu.colors[side.index()][channel]);
        }

        let mut color = sliders_to_color(menu.colors[side.index()]);
        let id = gui.next_id();
        if gui.do_blob(id, Vector2::new(x + 300.0, 150.0), color) {
            color = Color::new(rng.random(), rng.random(), rng.random());
            menu.colors[side.index()] = color_to_sliders(color);
            debug!("Random {:?} color {:?}", side, color);
        }
        config.set_blob_color(side, color);
    }

    let id = gui.next_id();
    if gui.do_image_button(id, Vector2::new(400.0, 150.0), Vector2::new(24.0, 24.0), SWAP_COLORS_IMAGE) {
        menu.colors.swap(0, 1);
    }

    let id = gui.next_id();
    gui.do_text_id(id, Vector2::new(30.0, 240.0), StringId::OptionsName, TextFlags::NORMAL);
    let id = gui.next_id();
    gui.do_editbox(
        id,
        Vector2::new(170.0, 235.0),
        NAME_LENGTH,
        &mut config.player_name,
        &mut menu.name_cursor,
        TextFlags::NORMAL,
        false,
    );

    let shadow_label = format!(
        "{} {}",
        gui.text().get(StringId::OptionsShowShadow),
        if config.show_shadow { "on" } else { "off" }
    );
    let id = gui.next_id();
    if gui.do_button(id, Vector2::new(30.0, 290.0), &shadow_label, TextFlags::NORMAL) {
        config.show_shadow = !config.show_shadow;
    }

    let id = gui.next_id();
    gui.do_text_id(id, Vector2::new(30.0, 330.0), StringId::OptionsBackground, TextFlags::NORMAL);
    let id = gui.next_id();
    let action = gui.do_selectbox(
        id,
        Vector2::new(30.0, 355.0),
        Vector2::new(390.0, 470.0),
        &menu.backgrounds,
        &mut menu.background_index,
        TextFlags::SMALL_FONT,
    );
    if action != SelectBoxAction::None {
        if let Some(name) = menu.backgrounds.get(menu.background_index).cloned() {
            if name != config.background && backend.set_background(&name) {
                config.background = name.clone();
                menu.log_chat(&format!("background {}", name), false);
            }
        }
    }

    let id = gui.next_id();
    gui.do_text_id(id, Vector2::new(430.0, 250.0), StringId::ChatTitle, TextFlags::NORMAL);
    let id = gui.next_id();
    gui.do_chatbox(
        id,
        Vector2::new(430.0, 275.0),
        Vector2::new(770.0, 470.0),
        &menu.chat_lines,
        &mut menu.chat_selected,
        &menu.chat_local,
        TextFlags::SMALL_FONT,
    );
    let id = gui.next_id();
    gui.do_editbox(
        id,
        Vector2::new(430.0, 482.0),
        CHAT_LENGTH,
        &mut menu.chat_input,
        &mut menu.chat_cursor,
        TextFlags::SMALL_FONT,
        false,
    );
    let id = gui.next_id();
    if gui.do_button_id(id, Vector2::new(700.0, 480.0), StringId::ChatSend, TextFlags::NORMAL)
        && !menu.chat_input.is_empty()
    {
        let line = format!("{}: {}", config.player_name, menu.chat_input);
        menu.log_chat(&line, true);
        menu.chat_input.clear();
        menu.chat_cursor = 0;
    }

    let id = gui.next_id();
    let language_label = format!("lang {}", config.language);
    if gui.do_button(id, Vector2::new(30.0, 530.0), &language_label, TextFlags::NORMAL) {
        if let Some(code) = next_language(&menu.languages, &config.language) {
            let text = TextManager::load(code, &config.data_dir);
            info!("Switched language to '{}'", text.language());
            config.language = text.language().to_string();
            gui.set_text_manager(text);
        }
    }

    let id = gui.next_id();
    if gui.do_button_id(id, Vector2::new(400.0, 530.0), StringId::MenuStart, TextFlags::ALIGN_CENTER) {
        outcome = MenuOutcome::Start;
    }
    let id = gui.next_id();
    if gui.do_button_id(id, Vector2::new(400.0, 565.0), StringId::MenuQuit, TextFlags::ALIGN_CENTER) {
        menu.confirm_quit = true;
        gui.reset_selection();
    }

    gui.set_inactive(false);
    if menu.confirm_quit {
        let id = gui.next_id();
        gui.do_overlay(
            id,
            Vector2::new(200.0, 220.0),
            Vector2::new(600.0, 380.0),
            Color::BLACK,
            DEFAULT_OVERLAY_OPACITY,
        );
        let id = gui.next_id();
        gui.do_text_id(id, Vector2::new(400.0, 250.0), StringId::MenuQuit, TextFlags::ALIGN_CENTER);
        let id = gui.next_id();
        if gui.do_button_id(id, Vector2::new(300.0, 320.0), StringId::Ok, TextFlags::ALIGN_CENTER) {
            outcome = MenuOutcome::Quit;
        }
        let id = gui.next_id();
        if gui.do_button_id(id, Vector2::new(500.0, 320.0), StringId::Cancel, TextFlags::ALIGN_CENTER) {
            menu.confirm_quit = false;
            gui.reset_selection();
        }
    }

    gui.do_cursor(gui.using_cursor());
    outcome
}

/// Builds the in-match overlay; returns true to go back to the menu.
/// Back toggles the pause dialog.
fn do_match_overlay(gui: &mut Imgui, config: &RenderConfig, input: &FrameInput, paused: &mut bool) -> bool {
    if input.key_action == Some(KeyAction::Back) {
        *paused = !*paused;
        gui.reset_selection();
    }

    let id = gui.next_id();
    gui.do_text(id, Vector2::new(10.0, 10.0), &config.player_name, TextFlags::SMALL_FONT);

    let mut back = false;
    if *paused {
        let id = gui.next_id();
        gui.do_overlay(
            id,
            Vector2::new(200.0, 220.0),
            Vector2::new(600.0, 400.0),
            Color::BLACK,
            DEFAULT_OVERLAY_OPACITY,
        );
        let id = gui.next_id();
        gui.do_text_id(id, Vector2::new(400.0, 250.0), StringId::GamePaused, TextFlags::ALIGN_CENTER);
        let id = gui.next_id();
        if gui.do_button_id(id, Vector2::new(400.0, 310.0), StringId::Ok, TextFlags::ALIGN_CENTER) {
            *paused = false;
        }
        let id = gui.next_id();
        back = gui.do_button_id(
            id,
            Vector2::new(400.0, 350.0),
            StringId::MenuBackToMenu,
            TextFlags::ALIGN_CENTER,
        );
        gui.do_cursor(gui.using_cursor());
    }
    back
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = default_config_path();
    let mut config = RenderConfig::load_or_default(&config_path);
    info!(
        "Starting with {:?} backend at {}x{}",
        config.backend, config.width, config.height
    );

    let sdl_context = sdl2::init()?;
    let video_subsystem = sdl_context.video()?;
    let _image_context = sdl2::image::init(sdl2::image::InitFlag::PNG)?;
    sdl_context.mouse().show_cursor(false);
    video_subsystem.text_input().start();

    let loader = AssetLoader::new(&config.data_dir);
    let mut backend = create_backend(&video_subsystem, &config, &loader)?;
    backend.show_shadow(config.show_shadow);

    let text = TextManager::load(&config.language, &config.data_dir);
    info!("Using language '{}'", text.language());
    let mut gui = Imgui::new(text);

    let mut input = SdlInput::new(sdl_context.event_pump()?, (config.width, config.height));
    input.set_pointer_scaling(backend.kind() == BackendKind::OpenGl);

    let mut rng = rand::rng();
    let mut menu = MenuState::new(&config);
    let mut rally = DemoRally::new();
    let mut blood = BloodSplatter::new();
    let mut screen = Screen::Menu;
    let mut paused = false;

    'running: loop {
        let frame_start = Instant::now();
        let frame_input = input.poll();
        if frame_input.quit {
            break 'running;
        }

        gui.begin(frame_input.clone());
        match screen {
            Screen::Menu => match do_menu(
                &mut gui,
                backend.as_mut(),
                &mut config,
                &mut menu,
                &frame_input,
                &mut rng,
            ) {
                MenuOutcome::Stay => {}
                MenuOutcome::Start => {
                    info!("Match started");
                    gui.reset_selection();
                    rally = DemoRally::new();
                    paused = false;
                    screen = Screen::Match;
                }
                MenuOutcome::Quit => break 'running,
            },
            Screen::Match => {
                for side in PlayerSide::BOTH {
                    backend.set_blob_color(side, config.blob_color(side))?;
                }
                backend.show_shadow(config.show_shadow);
                backend.set_mouse_marker(frame_input.pointer.x);

                let back = do_match_overlay(&mut gui, &config, &frame_input, &mut paused);

                let snapshot = if paused {
                    rally.snapshot()
                } else {
                    let frame = rally.step();
                    if let Some((side, position)) = frame.hit {
                        blood.spawn(&mut rng, position, side, BLOOD_PER_HIT);
                    }
                    blood.step();
                    frame.snapshot
                };

                backend.draw_game(&snapshot)?;
                blood.draw(backend.as_mut())?;

                if back {
                    info!("Back to menu");
                    gui.reset_selection();
                    blood.clear();
                    screen = Screen::Menu;
                }
            }
        }
        gui.end(backend.as_mut())?;
        backend.refresh()?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_TIME {
            std::thread::sleep(FRAME_TIME - elapsed);
        }
    }

    if gui.duplicate_ids() > 0 {
        warn!("{} duplicate GUI ids seen this session", gui.duplicate_ids());
    }
    if let Err(e) = config.save(&config_path) {
        error!("Failed to save config: {}", e);
    }
    info!("Bye");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slider_color_conversion() {
        let color = Color::new(0, 128, 255);
        assert_eq!(sliders_to_color(color_to_sliders(color)), color);
        assert_eq!(sliders_to_color([2.0, -1.0, 0.5]), Color::new(255, 0, 128));
    }

    #[test]
    fn test_list_languages_and_cycle() {
        let dir = std::env::temp_dir().join(format!("blobby-gfx-lang-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("lang_de.json"), b"{}").unwrap();
        fs::write(dir.join("lang_fr.json"), b"{}").unwrap();
        fs::write(dir.join("config.json"), b"{}").unwrap();

        let codes = list_languages(&dir, "en");
        assert_eq!(codes, vec!["de", "en", "fr"]);
        assert_eq!(next_language(&codes, "en"), Some("fr"));
        assert_eq!(next_language(&codes, "fr"), Some("de"));
        assert_eq!(next_language(&codes, "xx"), None);

        let missing = list_languages(&dir.join("nope"), "it");
        assert_eq!(missing, vec!["en", "it"]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_list_backgrounds() {
        let dir = std::env::temp_dir().join(format!("blobby-gfx-bg-{}", std::process::id()));
        let backgrounds = dir.join(BACKGROUND_DIR);
        fs::create_dir_all(&backgrounds).unwrap();
        fs::write(backgrounds.join("strand1.bmp"), b"").unwrap();
        fs::write(backgrounds.join("notes.txt"), b"").unwrap();

        let names = list_backgrounds(&dir, "backgrounds/strand2.bmp");
        assert_eq!(names, vec!["backgrounds/strand1.bmp", "backgrounds/strand2.bmp"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_list_backgrounds_missing_dir() {
        let names = list_backgrounds(Path::new("/nonexistent/blobby"), "backgrounds/strand2.bmp");
        assert_eq!(names, vec!["backgrounds/strand2.bmp"]);
    }

    #[test]
    fn test_chat_log_follows_latest() {
        let mut menu = MenuState::new(&RenderConfig::default());
        menu.log_chat("player: hi", true);
        assert_eq!(menu.chat_selected, 1);
        assert_eq!(menu.chat_local, vec![false, true]);
    }
}
