// src/app.rs
use crate::diary::{DiaryError, DiaryStore, Note};
use crate::mixer::{Mixer, SystemClock};
use crate::playback::RodioBackend;
use crate::scene::SceneId;
use crate::settings::{self, AppSettings};
use crate::storage::{DetachedStore, FileStore, KeyValueStore, SharedStore, FIRST_OPENED_KEY, MIXER_STATE_KEY};
use crate::theme::RootStyle;
use crate::ui;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

pub const TOAST_DURATION: Duration = Duration::from_millis(3500);
pub const SAVED_PING_DURATION: Duration = Duration::from_millis(1200);

pub const SPECIAL_MESSAGE: &str = "Hi love.

This is your relax room.
A small, calm place, all yours.

When the world gets noisy,
here you can pick a sound
and slow down.

I love you (all the same).
Always and forever.

Fra";

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Page {
    Christmas,
    RelaxRoom,
    Images,
    Diary,
}

impl Page {
    pub const NAV: [Page; 4] = [Page::Christmas, Page::RelaxRoom, Page::Images, Page::Diary];

    pub fn label(self) -> &'static str {
        match self {
            Page::Christmas => "Christmas",
            Page::RelaxRoom => "Relax room",
            Page::Images => "Images",
            Page::Diary => "Diary",
        }
    }
}

/// Editor state for the diary dock shared by every page.
#[derive(Default)]
pub struct DiaryDock {
    pub open: bool,
    pub editing_id: Option<String>,
    pub title: String,
    pub text: String,
    pub saved_ping: Option<Instant>,
    pub error: Option<String>,
}

impl DiaryDock {
    pub fn can_save(&self) -> bool {
        !self.title.trim().is_empty() || !self.text.trim().is_empty()
    }

    pub fn start_new(&mut self) {
        self.open = true;
        self.editing_id = None;
        self.title.clear();
        self.text.clear();
        self.error = None;
    }

    pub fn start_edit(&mut self, note: &Note) {
        self.open = true;
        self.editing_id = Some(note.id.clone());
        self.title = note.title.clone();
        self.text = note.body.clone();
        self.error = None;
    }
}

pub struct RelaxRoomApp {
    pub page: Page,
    pub settings: AppSettings,
    pub config_dir: PathBuf,
    pub mixer: Mixer<RodioBackend, SystemClock>,
    pub diary: DiaryStore,
    pub notes: Vec<Note>,
    pub dock: DiaryDock,
    pub special_open: bool,
    pub welcome_toast: Option<Instant>,
    pub gallery: Vec<PathBuf>,
}

/// Image files directly inside `dir`, sorted by name.
pub fn scan_images(dir: &Path) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
                .unwrap_or(false)
        })
        .collect();
    images.sort();
    images
}

/// The root style the window wears on `page`. The Christmas page always
/// shows the Xmas palette, whatever scene is selected.
pub fn page_root_style(page: Page, scene_style: &RootStyle) -> RootStyle {
    match page {
        Page::Christmas => RootStyle::for_scene(SceneId::Xmas),
        _ => scene_style.clone(),
    }
}

/// Marks the first run in the store. Returns true only the first time.
pub fn take_first_run(store: &dyn KeyValueStore) -> bool {
    if store.get_bool(FIRST_OPENED_KEY, false) {
        return false;
    }
    store.set_bool(FIRST_OPENED_KEY, true);
    true
}

impl RelaxRoomApp {
    pub fn new(cc: &eframe::CreationContext) -> Result<Self> {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let (config_dir, store): (PathBuf, SharedStore) = match settings::get_config_dir() {
            Ok(dir) => {
                let store: SharedStore = Arc::new(FileStore::open(dir.join(settings::LOCAL_STORE_FILE)));
                (dir, store)
            }
            Err(e) => {
                log::warn!("{}. Nothing will be remembered this session.", e);
                let store: SharedStore = Arc::new(DetachedStore);
                (std::env::current_dir()?, store)
            }
        };
        let settings = settings::load_settings(&config_dir);

        let fresh_mixer = store.get_raw(MIXER_STATE_KEY).is_none();
        let backend = RodioBackend::new(settings.asset_root(&config_dir));
        let mut mixer = Mixer::load(backend, SystemClock, store.clone(), settings.crossfade_duration());
        if fresh_mixer {
            mixer.set_volume(settings.start_volume);
        }
        mixer.resume_if_playing();

        let diary = DiaryStore::new(store.clone());
        let notes = diary.list();

        let (page, welcome_toast) = if take_first_run(&*store) {
            log::info!("First run, opening the Christmas page");
            (Page::Christmas, Some(Instant::now()))
        } else {
            (Page::RelaxRoom, None)
        };

        let gallery = scan_images(&settings.images_root(&config_dir));
        log::info!("Found {} gallery images", gallery.len());

        Ok(Self {
            page,
            settings,
            config_dir,
            mixer,
            diary,
            notes,
            dock: DiaryDock::default(),
            special_open: false,
            welcome_toast,
            gallery,
        })
    }

    pub fn refresh_notes(&mut self) {
        self.notes = self.diary.list();
    }

    pub fn save_dock(&mut self) {
        if !self.dock.can_save() {
            return;
        }
        let id = self.dock.editing_id.clone();
        match self.diary.save(id.as_deref(), &self.dock.title, &self.dock.text) {
            Ok(_) => {
                self.dock.saved_ping = Some(Instant::now());
                self.dock.error = None;
                self.dock.editing_id = None;
                self.dock.title.clear();
                self.dock.text.clear();
            }
            Err(DiaryError::NotFound(missing)) => {
                log::warn!("Note {} disappeared before it could be updated", missing);
                self.dock.error = Some("This note no longer exists.".to_string());
                self.dock.editing_id = None;
            }
            Err(e) => self.dock.error = Some(e.to_string()),
        }
        self.refresh_notes();
    }

    pub fn delete_note(&mut self, id: &str) {
        self.notes = self.diary.delete(id);
        if self.dock.editing_id.as_deref() == Some(id) {
            self.dock.start_new();
        }
    }

    pub fn rescan_gallery(&mut self) {
        self.gallery = scan_images(&self.settings.images_root(&self.config_dir));
    }
}

impl eframe::App for RelaxRoomApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // --- State Updates ---
        if self.mixer.tick() {
            ctx.request_repaint();
        }

        if let Some(time) = self.welcome_toast {
            if time.elapsed() > TOAST_DURATION {
                self.welcome_toast = None;
            } else {
                ctx.request_repaint_after(Duration::from_millis(100));
            }
        }
        if let Some(time) = self.dock.saved_ping {
            if time.elapsed() > SAVED_PING_DURATION {
                self.dock.saved_ping = None;
            } else {
                ctx.request_repaint_after(Duration::from_millis(100));
            }
        }

        let style = page_root_style(self.page, self.mixer.root_style());
        let visuals: egui::Visuals = (&style).into();
        ctx.set_visuals(visuals);

        // --- UI Drawing ---
        ui::draw_main_view(self, ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.mixer.teardown();
        settings::save_settings(&self.config_dir, &self.settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::fs;

    #[test]
    fn first_run_is_taken_once() {
        let store = MemoryStore::new();
        assert!(take_first_run(&store));
        assert!(!take_first_run(&store));
        assert!(store.get_bool(FIRST_OPENED_KEY, false));
    }

    #[test]
    fn gallery_scan_keeps_images_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.jpg", "a.PNG", "notes.txt", "c.jpeg"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("d.png"), b"x").unwrap();

        let names: Vec<_> = scan_images(dir.path())
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.jpg", "c.jpeg"]);
    }

    #[test]
    fn christmas_page_overrides_the_scene_theme() {
        use crate::theme::{BG_1, GLOW_1};

        let ocean = RootStyle::for_scene(SceneId::Ocean);
        let christmas = page_root_style(Page::Christmas, &ocean);
        assert_eq!(christmas, RootStyle::for_scene(SceneId::Xmas));
        assert_eq!(christmas.property(BG_1), Some("63 29 43"));

        for page in [Page::RelaxRoom, Page::Images, Page::Diary] {
            assert_eq!(page_root_style(page, &ocean).property(GLOW_1), Some("34 211 238"));
        }
    }

    #[test]
    fn dock_requires_some_content() {
        let mut dock = DiaryDock::default();
        assert!(!dock.can_save());
        dock.text = "  hello ".to_string();
        assert!(dock.can_save());
        dock.start_new();
        assert!(dock.open);
        assert!(!dock.can_save());
    }
}
