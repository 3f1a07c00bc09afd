// src/mixer.rs

//! Scene audio mixer: two looping handles, one audible (`active`) and one
//! being prepared (`standby`), with a frame-driven crossfade between them.
//!
//! `MixerState::transitioning` is true exactly while a crossfade is scheduled,
//! and every mutation is written through to the key-value store.

use crate::playback::{clamp01, AudioBackend, AudioHandle, PlaybackError};
use crate::scene::{scene, SceneId};
use crate::storage::{self, KeyValueStore, SharedStore, MIXER_STATE_KEY, SCENE_KEY};
use crate::theme::RootStyle;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const DEFAULT_VOLUME: f32 = 0.85;
pub const MIN_CROSSFADE_MS: u64 = 650;
pub const MAX_CROSSFADE_MS: u64 = 900;
pub const DEFAULT_CROSSFADE_MS: u64 = 850;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MixerState {
    pub scene_id: SceneId,
    pub is_playing: bool,
    pub volume: f32,
    pub needs_gesture: bool,
    pub transitioning: bool,
}

impl Default for MixerState {
    fn default() -> Self {
        Self {
            scene_id: SceneId::default(),
            is_playing: false,
            volume: DEFAULT_VOLUME,
            needs_gesture: false,
            transitioning: false,
        }
    }
}

/// What may be found under the mixer key; validated before use.
#[derive(Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoredMixerState {
    scene_id: String,
    is_playing: bool,
    volume: f32,
    needs_gesture: bool,
}

impl Default for StoredMixerState {
    fn default() -> Self {
        Self {
            scene_id: SceneId::default().as_str().to_string(),
            is_playing: false,
            volume: DEFAULT_VOLUME,
            needs_gesture: false,
        }
    }
}

impl MixerState {
    /// Reads the persisted state, normalizing the scene and volume.
    /// No crossfade survives a restart, so `transitioning` is always false.
    /// Without a usable mixer entry, the last selected scene is kept.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match storage::get_json::<Option<StoredMixerState>>(store, MIXER_STATE_KEY, None) {
            Some(stored) => Self {
                scene_id: SceneId::from_str_or_default(&stored.scene_id),
                is_playing: stored.is_playing,
                volume: clamp01(stored.volume),
                needs_gesture: stored.needs_gesture,
                transitioning: false,
            },
            None => Self {
                scene_id: SceneId::from_str_or_default(
                    &store.get_string(SCENE_KEY, SceneId::default().as_str()),
                ),
                ..Self::default()
            },
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) {
        storage::set_json(store, MIXER_STATE_KEY, self);
    }
}

pub trait Clock {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

pub fn clamp_crossfade(duration: Duration) -> Duration {
    let ms = (duration.as_millis() as u64).clamp(MIN_CROSSFADE_MS, MAX_CROSSFADE_MS);
    Duration::from_millis(ms)
}

/// Quadratic ease-in-out. Monotonic with `e(0) = 0` and `e(1) = 1`.
pub fn ease_in_out(t: f32) -> f32 {
    let t = clamp01(t);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// The scheduled crossfade. Holding one is what keeps the frame loop alive;
/// dropping it cancels every later tick.
#[derive(Debug, Clone, Copy)]
struct Crossfade {
    started_at: Instant,
    duration: Duration,
    start_active_volume: f32,
    target_volume: f32,
    resume_playing: bool,
}

impl Crossfade {
    fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        clamp01(elapsed.as_secs_f32() / self.duration.as_secs_f32())
    }
}

/// Rebinds `slot` to `src` unless it is already bound there.
fn ensure_bound<'a, B: AudioBackend>(
    backend: &mut B,
    slot: &'a mut Option<B::Handle>,
    src: &str,
) -> Result<&'a mut B::Handle, PlaybackError> {
    let handle = match slot.take() {
        Some(handle) if handle.source() == src => handle,
        other => {
            if let Some(mut stale) = other {
                stale.pause();
            }
            backend.open(src)?
        }
    };
    Ok(slot.insert(handle))
}

pub struct Mixer<B: AudioBackend, C: Clock = SystemClock> {
    state: MixerState,
    backend: B,
    clock: C,
    store: SharedStore,
    active: Option<B::Handle>,
    standby: Option<B::Handle>,
    fade: Option<Crossfade>,
    crossfade_duration: Duration,
    root_style: RootStyle,
}

impl<B: AudioBackend, C: Clock> Mixer<B, C> {
    /// Builds a mixer from the persisted state. Handles are opened lazily.
    pub fn load(backend: B, clock: C, store: SharedStore, crossfade_duration: Duration) -> Self {
        let state = MixerState::load(&*store);
        log::info!(
            "Mixer restored: scene '{}', volume {:.2}, playing {}",
            state.scene_id,
            state.volume,
            state.is_playing
        );
        Self {
            root_style: RootStyle::for_scene(state.scene_id),
            state,
            backend,
            clock,
            store,
            active: None,
            standby: None,
            fade: None,
            crossfade_duration: clamp_crossfade(crossfade_duration),
        }
    }

    pub fn state(&self) -> &MixerState {
        &self.state
    }

    pub fn root_style(&self) -> &RootStyle {
        &self.root_style
    }

    pub fn crossfade_duration(&self) -> Duration {
        self.crossfade_duration
    }

    fn persist(&self) {
        self.state.save(&*self.store);
    }

    fn set_scene(&mut self, id: SceneId) {
        self.state.scene_id = id;
        self.root_style.apply_scene(id);
        self.store.set_string(SCENE_KEY, id.as_str());
    }

    /// A persisted playing state is treated as intent: try to start again.
    pub fn resume_if_playing(&mut self) {
        if self.state.is_playing {
            self.play();
        }
    }

    pub fn play(&mut self) {
        if self.fade.is_some() {
            return;
        }
        self.state.needs_gesture = false;

        let src = scene(self.state.scene_id).src;
        let volume = self.state.volume;
        let started = ensure_bound(&mut self.backend, &mut self.active, src).and_then(|handle| {
            handle.set_volume(volume);
            handle.play()
        });

        match started {
            Ok(()) => {
                self.state.is_playing = true;
                log::info!("Playing scene '{}'", self.state.scene_id);
            }
            Err(e) => {
                log::warn!("Playback of '{}' was refused: {}", src, e);
                self.state.is_playing = false;
                self.state.needs_gesture = true;
            }
        }
        self.persist();
    }

    pub fn pause(&mut self) {
        self.cancel_fade();
        for handle in [&mut self.active, &mut self.standby].into_iter().flatten() {
            handle.pause();
        }
        self.state.is_playing = false;
        self.persist();
    }

    pub fn toggle(&mut self) {
        if self.state.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.state.volume = clamp01(volume);
        if self.fade.is_none() {
            if let Some(active) = self.active.as_mut() {
                active.set_volume(self.state.volume);
            }
        }
        self.persist();
    }

    pub fn switch_scene(&mut self, target: SceneId) {
        if target == self.state.scene_id {
            return;
        }
        if self.fade.is_some() || self.state.transitioning {
            log::debug!("Ignoring switch to '{}' while a crossfade is running", target);
            return;
        }

        if !self.state.is_playing {
            self.set_scene(target);
            self.persist();
            log::info!("Switched to scene '{}' (silent)", target);
            return;
        }

        self.state.transitioning = true;
        self.set_scene(target);

        let target_volume = self.state.volume;
        let start_active_volume = self.active.as_ref().map_or(0.0, |h| h.volume());
        let src = scene(target).src;
        let started = ensure_bound(&mut self.backend, &mut self.standby, src).and_then(|handle| {
            handle.set_volume(0.0);
            handle.play()
        });

        if let Err(e) = started {
            log::warn!("Crossfade to '{}' aborted, playback refused: {}", target, e);
            if let Some(active) = self.active.as_mut() {
                active.pause();
            }
            self.state.transitioning = false;
            self.state.is_playing = false;
            self.state.needs_gesture = true;
            self.persist();
            return;
        }

        self.fade = Some(Crossfade {
            started_at: self.clock.now(),
            duration: self.crossfade_duration,
            start_active_volume,
            target_volume,
            resume_playing: self.state.is_playing,
        });
        log::info!("Crossfading to scene '{}' over {:?}", target, self.crossfade_duration);
        self.persist();
    }

    /// Advances the crossfade by one frame. Returns true while more frames
    /// are needed.
    pub fn tick(&mut self) -> bool {
        let Some(fade) = self.fade else {
            return false;
        };

        let t = fade.progress(self.clock.now());
        if t < 1.0 {
            let e = ease_in_out(t);
            if let Some(active) = self.active.as_mut() {
                active.set_volume(fade.start_active_volume * (1.0 - e));
            }
            if let Some(standby) = self.standby.as_mut() {
                standby.set_volume(fade.target_volume * e);
            }
            return true;
        }

        self.finish_fade(fade);
        false
    }

    fn finish_fade(&mut self, fade: Crossfade) {
        self.fade = None;
        self.retire_active();
        std::mem::swap(&mut self.active, &mut self.standby);
        if let Some(active) = self.active.as_mut() {
            active.set_volume(fade.target_volume);
            // Volume moved while fading: apply it now that nothing else owns it.
            if self.state.volume != fade.target_volume {
                active.set_volume(self.state.volume);
            }
        }

        self.state.transitioning = false;
        self.state.is_playing = fade.resume_playing;
        log::info!("Crossfade to '{}' complete", self.state.scene_id);
        self.persist();
    }

    /// Stops, silences and rewinds the active handle.
    fn retire_active(&mut self) {
        if let Some(old) = self.active.as_mut() {
            old.pause();
            old.set_volume(0.0);
            old.rewind();
        }
    }

    /// Drops the scheduled crossfade. The incoming handle is adopted as
    /// active (paused, at the target volume) and the outgoing one is retired.
    fn cancel_fade(&mut self) -> bool {
        let Some(fade) = self.fade.take() else {
            return false;
        };

        self.retire_active();
        std::mem::swap(&mut self.active, &mut self.standby);
        if let Some(active) = self.active.as_mut() {
            active.pause();
            active.set_volume(fade.target_volume);
        }
        self.state.transitioning = false;
        log::debug!("Crossfade to '{}' cancelled", self.state.scene_id);
        true
    }

    /// Stops all audio without touching playback intent.
    pub fn teardown(&mut self) {
        self.cancel_fade();
        for handle in [&mut self.active, &mut self.standby].into_iter().flatten() {
            handle.pause();
        }
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::fake::{FakeBackend, FakeHandle};
    use crate::storage::MemoryStore;
    use crate::theme::{BG_1, GLOW_1};
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;

    #[derive(Clone)]
    struct ManualClock(Rc<Cell<Instant>>);

    impl ManualClock {
        fn new() -> Self {
            Self(Rc::new(Cell::new(Instant::now())))
        }

        fn advance(&self, ms: u64) {
            self.0.set(self.0.get() + Duration::from_millis(ms));
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.0.get()
        }
    }

    struct Rig {
        mixer: Mixer<FakeBackend, ManualClock>,
        backend: FakeBackend,
        clock: ManualClock,
        store: SharedStore,
    }

    fn rig_with(store: SharedStore) -> Rig {
        let backend = FakeBackend::default();
        let clock = ManualClock::new();
        let mixer = Mixer::load(
            backend.clone(),
            clock.clone(),
            store.clone(),
            Duration::from_millis(800),
        );
        Rig { mixer, backend, clock, store }
    }

    fn rig() -> Rig {
        rig_with(Arc::new(MemoryStore::new()))
    }

    fn active(rig: &Rig) -> &FakeHandle {
        rig.mixer.active.as_ref().expect("active handle")
    }

    fn standby(rig: &Rig) -> &FakeHandle {
        rig.mixer.standby.as_ref().expect("standby handle")
    }

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-5, "{} != {}", a, b);
    }

    /// Playing `Rain` at 0.7.
    fn playing_rain() -> Rig {
        let mut rig = rig();
        rig.mixer.switch_scene(SceneId::Rain);
        rig.mixer.set_volume(0.7);
        rig.mixer.play();
        assert!(rig.mixer.state().is_playing);
        rig
    }

    #[test]
    fn load_defaults_when_absent_or_corrupt() {
        let store = MemoryStore::new();
        assert_eq!(MixerState::load(&store), MixerState::default());
        assert_eq!(MixerState::default().scene_id, SceneId::Xmas);
        assert_eq!(MixerState::default().volume, 0.85);

        store.set_raw(MIXER_STATE_KEY, "{\"sceneId\": ".to_string());
        assert_eq!(MixerState::load(&store), MixerState::default());
    }

    #[test]
    fn missing_state_restores_last_selected_scene() {
        let store = MemoryStore::new();
        store.set_string(SCENE_KEY, "ocean");
        let state = MixerState::load(&store);
        assert_eq!(state.scene_id, SceneId::Ocean);
        assert_eq!(state.volume, DEFAULT_VOLUME);
        assert!(!state.is_playing);

        store.set_raw(MIXER_STATE_KEY, "not json".to_string());
        assert_eq!(MixerState::load(&store).scene_id, SceneId::Ocean);

        store.set_string(SCENE_KEY, "forest");
        assert_eq!(MixerState::load(&store).scene_id, SceneId::Xmas);

        let shared: SharedStore = Arc::new(MemoryStore::new());
        shared.set_string(SCENE_KEY, "soft");
        let rig = rig_with(shared);
        assert_eq!(rig.mixer.state().scene_id, SceneId::Soft);
        assert_eq!(rig.mixer.root_style().property(BG_1), Some("43 31 31"));
    }

    #[test]
    fn load_normalizes_scene_volume_and_transition() {
        let store = MemoryStore::new();
        store.set_raw(
            MIXER_STATE_KEY,
            r#"{"sceneId":"forest","isPlaying":true,"volume":3.5,"needsGesture":false,"transitioning":true}"#
                .to_string(),
        );
        let state = MixerState::load(&store);
        assert_eq!(state.scene_id, SceneId::Xmas);
        assert_eq!(state.volume, 1.0);
        assert!(state.is_playing);
        assert!(!state.transitioning);
    }

    #[test]
    fn saved_state_loads_back_equivalent() {
        let store = MemoryStore::new();
        let state = MixerState {
            scene_id: SceneId::Ocean,
            is_playing: true,
            volume: 0.4,
            needs_gesture: true,
            transitioning: false,
        };
        state.save(&store);
        assert_eq!(MixerState::load(&store), state);
    }

    #[test]
    fn set_volume_clamps() {
        let mut rig = rig();
        rig.mixer.set_volume(-0.3);
        assert_eq!(rig.mixer.state().volume, 0.0);
        rig.mixer.set_volume(1.4);
        assert_eq!(rig.mixer.state().volume, 1.0);
        rig.mixer.set_volume(f32::NAN);
        assert_eq!(rig.mixer.state().volume, 0.0);
    }

    #[test]
    fn set_volume_applies_to_active_handle() {
        let mut rig = playing_rain();
        rig.mixer.set_volume(0.3);
        assert_close(active(&rig).volume, 0.3);
        assert_eq!(MixerState::load(&*rig.store).volume, 0.3);
    }

    #[test]
    fn play_binds_active_to_current_scene() {
        let mut rig = rig();
        rig.mixer.play();
        let state = *rig.mixer.state();
        assert!(state.is_playing);
        assert!(!state.needs_gesture);
        assert_eq!(active(&rig).src, "audio/xmas.mp3");
        assert!(active(&rig).playing);
        assert_close(active(&rig).volume, 0.85);
        assert!(MixerState::load(&*rig.store).is_playing);
    }

    #[test]
    fn handles_are_reused_for_the_same_source() {
        let mut rig = rig();
        rig.mixer.play();
        rig.mixer.pause();
        rig.mixer.play();
        assert_eq!(rig.backend.opened(), vec!["audio/xmas.mp3".to_string()]);
    }

    #[test]
    fn refused_play_requires_gesture() {
        let mut rig = rig();
        rig.backend.refuse("audio/xmas.mp3");
        rig.mixer.play();
        assert!(!rig.mixer.state().is_playing);
        assert!(rig.mixer.state().needs_gesture);
        assert!(MixerState::load(&*rig.store).needs_gesture);

        rig.backend.allow_all();
        rig.mixer.play();
        assert!(rig.mixer.state().is_playing);
        assert!(!rig.mixer.state().needs_gesture);
    }

    #[test]
    fn resume_attempts_persisted_playback() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        MixerState { is_playing: true, ..MixerState::default() }.save(&*store);

        let mut rig = rig_with(store);
        rig.backend.refuse("audio/xmas.mp3");
        rig.mixer.resume_if_playing();
        assert!(!rig.mixer.state().is_playing);
        assert!(rig.mixer.state().needs_gesture);
    }

    #[test]
    fn pause_is_idempotent() {
        let mut rig = playing_rain();
        rig.mixer.pause();
        rig.mixer.pause();
        assert!(!rig.mixer.state().is_playing);
        assert!(!active(&rig).playing);
    }

    #[test]
    fn switching_to_current_scene_is_a_noop() {
        let mut rig = playing_rain();
        let before = *rig.mixer.state();
        rig.mixer.switch_scene(SceneId::Rain);
        assert_eq!(*rig.mixer.state(), before);
        assert!(rig.mixer.standby.is_none());
    }

    #[test]
    fn silent_switch_is_instant() {
        let mut rig = rig();
        rig.mixer.switch_scene(SceneId::Ocean);
        let state = *rig.mixer.state();
        assert_eq!(state.scene_id, SceneId::Ocean);
        assert!(!state.transitioning);
        assert!(rig.backend.opened().is_empty());
        assert_eq!(rig.store.get_string(SCENE_KEY, ""), "ocean");
        assert_eq!(rig.mixer.root_style().property(BG_1), Some("2 44 34"));
        assert_eq!(MixerState::load(&*rig.store).scene_id, SceneId::Ocean);
    }

    #[test]
    fn full_crossfade_swaps_handles() {
        let mut rig = playing_rain();
        rig.mixer.switch_scene(SceneId::Ocean);
        assert!(rig.mixer.state().transitioning);
        assert_eq!(rig.mixer.state().scene_id, SceneId::Ocean);
        assert_eq!(rig.mixer.root_style().property(GLOW_1), Some("34 211 238"));
        assert!(MixerState::load(&*rig.store).transitioning);

        rig.clock.advance(400);
        assert!(rig.mixer.tick());
        assert_close(active(&rig).volume, 0.35);
        assert_close(standby(&rig).volume, 0.35);

        rig.clock.advance(400);
        assert!(!rig.mixer.tick());

        let state = *rig.mixer.state();
        assert!(!state.transitioning);
        assert!(state.is_playing);
        assert_eq!(active(&rig).src, "audio/ocean.mp3");
        assert_close(active(&rig).volume, 0.7);
        assert!(active(&rig).playing);
        assert_eq!(standby(&rig).src, "audio/rain.mp3");
        assert_eq!(standby(&rig).volume, 0.0);
        assert!(!standby(&rig).playing);
        assert!(standby(&rig).position_reset);
        assert_eq!(rig.backend.log.borrow().rewinds, 1);
        assert!(!MixerState::load(&*rig.store).transitioning);
    }

    #[test]
    fn fade_volumes_move_monotonically() {
        let mut rig = playing_rain();
        rig.mixer.switch_scene(SceneId::Soft);
        let mut last_in = 0.0;
        let mut last_out = 0.7;
        for _ in 0..7 {
            rig.clock.advance(100);
            assert!(rig.mixer.tick());
            assert!(standby(&rig).volume >= last_in);
            assert!(active(&rig).volume <= last_out);
            last_in = standby(&rig).volume;
            last_out = active(&rig).volume;
        }
    }

    #[test]
    fn switch_during_crossfade_is_rejected() {
        let mut rig = playing_rain();
        rig.mixer.switch_scene(SceneId::Ocean);
        let during = *rig.mixer.state();
        rig.mixer.switch_scene(SceneId::Asmr);
        assert_eq!(*rig.mixer.state(), during);
        assert_eq!(rig.mixer.state().scene_id, SceneId::Ocean);
    }

    #[test]
    fn pause_mid_fade_cancels_ticks() {
        let mut rig = playing_rain();
        rig.mixer.switch_scene(SceneId::Ocean);
        rig.clock.advance(400);
        assert!(rig.mixer.tick());

        rig.mixer.pause();
        let state = *rig.mixer.state();
        assert!(!state.transitioning);
        assert!(!state.is_playing);

        let writes = rig.backend.volume_writes();
        rig.clock.advance(1000);
        assert!(!rig.mixer.tick());
        assert_eq!(rig.backend.volume_writes(), writes);

        // The incoming handle is owned as active at the target volume.
        assert_eq!(active(&rig).src, "audio/ocean.mp3");
        assert_close(active(&rig).volume, 0.7);
        assert_eq!(standby(&rig).volume, 0.0);
        assert!(!active(&rig).playing && !standby(&rig).playing);

        rig.mixer.switch_scene(SceneId::Asmr);
        assert_eq!(rig.mixer.state().scene_id, SceneId::Asmr);
    }

    #[test]
    fn refused_standby_aborts_crossfade() {
        let mut rig = playing_rain();
        rig.backend.refuse("audio/ocean.mp3");
        rig.mixer.switch_scene(SceneId::Ocean);
        let state = *rig.mixer.state();
        assert_eq!(state.scene_id, SceneId::Ocean);
        assert!(!state.transitioning);
        assert!(!state.is_playing);
        assert!(state.needs_gesture);
        assert!(!active(&rig).playing);
        assert!(!rig.mixer.tick());
    }

    #[test]
    fn volume_change_mid_fade_lands_after_completion() {
        let mut rig = playing_rain();
        rig.mixer.switch_scene(SceneId::Ocean);
        rig.clock.advance(200);
        rig.mixer.tick();
        let out_volume = active(&rig).volume;
        rig.mixer.set_volume(0.2);
        assert_eq!(active(&rig).volume, out_volume);

        rig.clock.advance(800);
        rig.mixer.tick();
        assert_close(active(&rig).volume, 0.2);
    }

    #[test]
    fn teardown_keeps_intent_but_stops_audio() {
        let mut rig = playing_rain();
        rig.mixer.switch_scene(SceneId::Xmas);
        rig.clock.advance(300);
        rig.mixer.tick();
        rig.mixer.teardown();

        let persisted = MixerState::load(&*rig.store);
        assert!(persisted.is_playing);
        assert!(!rig.mixer.state().transitioning);
        assert!(!active(&rig).playing);
        assert!(!rig.mixer.tick());
    }

    #[test]
    fn crossfade_duration_is_bounded() {
        assert_eq!(clamp_crossfade(Duration::from_millis(100)), Duration::from_millis(650));
        assert_eq!(clamp_crossfade(Duration::from_secs(3)), Duration::from_millis(900));
        assert_eq!(rig().mixer.crossfade_duration(), Duration::from_millis(800));
    }

    #[test]
    fn ease_is_anchored_and_monotonic() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        let mut previous = 0.0;
        for i in 1..=100 {
            let e = ease_in_out(i as f32 / 100.0);
            assert!(e >= previous);
            previous = e;
        }
    }
}
