use crate::scene::SceneId;
use egui::{Color32, CornerRadius, Stroke, Visuals};
use std::collections::BTreeMap;

pub type Rgb = [u8; 3];

/// Five color triples tied to a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg1: Rgb,
    pub bg2: Rgb,
    pub bg3: Rgb,
    pub glow1: Rgb,
    pub glow2: Rgb,
}

pub const BG_1: &str = "--bg-1";
pub const BG_2: &str = "--bg-2";
pub const BG_3: &str = "--bg-3";
pub const GLOW_1: &str = "--glow-1";
pub const GLOW_2: &str = "--glow-2";

// --- Scene Palettes ---

const RAIN: Palette = Palette { bg1: [15, 23, 42], bg2: [30, 41, 59], bg3: [51, 65, 85], glow1: [245, 158, 11], glow2: [236, 72, 153] };
const OCEAN: Palette = Palette { bg1: [2, 44, 34], bg2: [6, 78, 59], bg3: [15, 118, 110], glow1: [34, 211, 238], glow2: [16, 185, 129] };
const ASMR: Palette = Palette { bg1: [46, 16, 101], bg2: [76, 29, 149], bg3: [109, 40, 217], glow1: [217, 70, 239], glow2: [168, 85, 247] };
const SOFT: Palette = Palette { bg1: [43, 31, 31], bg2: [75, 46, 46], bg3: [107, 63, 63], glow1: [251, 191, 36], glow2: [244, 114, 182] };
const XMAS: Palette = Palette { bg1: [63, 29, 43], bg2: [127, 29, 29], bg3: [185, 28, 28], glow1: [250, 204, 21], glow2: [34, 197, 94] };

pub fn palette_for(id: SceneId) -> Palette {
    match id {
        SceneId::Rain => RAIN,
        SceneId::Ocean => OCEAN,
        SceneId::Asmr => ASMR,
        SceneId::Soft => SOFT,
        SceneId::Xmas => XMAS,
    }
}

fn format_rgb(v: Rgb) -> String {
    format!("{} {} {}", v[0], v[1], v[2])
}

impl Palette {
    /// Projects the palette onto the named root style variables.
    pub fn style_vars(&self) -> [(&'static str, String); 5] {
        [
            (BG_1, format_rgb(self.bg1)),
            (BG_2, format_rgb(self.bg2)),
            (BG_3, format_rgb(self.bg3)),
            (GLOW_1, format_rgb(self.glow1)),
            (GLOW_2, format_rgb(self.glow2)),
        ]
    }
}

/// The document-level styling context: named variables the views read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootStyle {
    vars: BTreeMap<&'static str, String>,
}

impl RootStyle {
    pub fn for_scene(id: SceneId) -> Self {
        let mut style = Self::default();
        style.apply_scene(id);
        style
    }

    pub fn set_property(&mut self, name: &'static str, value: String) {
        self.vars.insert(name, value);
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn apply_scene(&mut self, id: SceneId) {
        for (name, value) in palette_for(id).style_vars() {
            self.set_property(name, value);
        }
    }

    /// Reads a variable back as a color. Missing or malformed values are gray.
    pub fn color(&self, name: &str) -> Color32 {
        let parsed: Option<Vec<u8>> = self
            .property(name)
            .and_then(|v| v.split_whitespace().map(|c| c.parse::<u8>().ok()).collect());
        match parsed.as_deref() {
            Some([r, g, b]) => Color32::from_rgb(*r, *g, *b),
            _ => Color32::from_gray(40),
        }
    }

    pub fn glow(&self) -> Color32 {
        self.color(GLOW_1)
    }

    /// Translucent card fill layered over the background.
    pub fn card_fill(&self, highlighted: bool) -> Color32 {
        let alpha = if highlighted { 38 } else { 20 };
        Color32::from_white_alpha(alpha)
    }
}

/// Adapter to convert the root style into egui::Visuals
impl From<&RootStyle> for Visuals {
    fn from(style: &RootStyle) -> Self {
        let mut visuals = Visuals::dark();

        let bg1 = style.color(BG_1);
        let bg2 = style.color(BG_2);
        let bg3 = style.color(BG_3);
        let glow1 = style.color(GLOW_1);

        visuals.override_text_color = Some(Color32::from_gray(228));
        visuals.panel_fill = bg1;
        visuals.window_fill = bg2;
        visuals.extreme_bg_color = bg1;
        visuals.faint_bg_color = bg2;
        visuals.window_stroke = Stroke::new(1.0, Color32::from_white_alpha(30));
        visuals.window_corner_radius = CornerRadius::same(16);
        visuals.selection.bg_fill = bg3;
        visuals.selection.stroke = Stroke::new(1.0, glow1);
        visuals.hyperlink_color = glow1;

        visuals.widgets.inactive.bg_fill = bg2;
        visuals.widgets.inactive.weak_bg_fill = bg2;
        visuals.widgets.hovered.bg_fill = bg3;
        visuals.widgets.hovered.weak_bg_fill = bg3;
        visuals.widgets.active.bg_fill = bg3;
        visuals.widgets.active.bg_stroke = Stroke::new(1.0, glow1);

        visuals
    }
}
