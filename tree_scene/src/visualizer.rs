//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ FORMED  progress ████████░░  mode  classifier  tier  fps     │
//! │                                                              │
//! │                         ·  ✦  ·                              │
//! │                       · ·  ●  · ·       (perspective view    │
//! │                     · · ▣ · · · ● ·      of every published  │
//! │                   · · · · ● · · ▣ · ·    transform buffer)   │
//! │                                                ┌──────────┐  │
//! │                                                │  hand    │  │
//! │                                                │  inset   │  │
//! │ key legend                                     └──────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Foliage and ornaments are depth-tested square splats; photo panels are
//! filled quads.  Each group is drawn under its own yaw, so the spinning
//! foliage never touches its transforms.

use anyhow::{anyhow, Context};
use glam::{Mat4, Vec2, Vec3};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use morph_core::{HandSignal, MorphGroup, PopulationKind, Scene};

use crate::sim_camera::SimHand;

// ════════════════════════════════════════════════════════════════════════════
// Style constants
// ════════════════════════════════════════════════════════════════════════════

const BG_COLOR:      u32 = 0xFF05080F;
const HUD_BG:        u32 = 0xFF0F1A2A;
const TEXT_COLOR:    u32 = 0xFFEEEEEE;
const DIM_TEXT:      u32 = 0xFF888888;
const GOLD:          u32 = 0xFFFFD700;
const CHAOS_RED:     u32 = 0xFFFF4444;
/// Photo border, linear RGB like the entity colours.
const PHOTO_FRAME:   [f32; 3] = [0.957, 0.945, 0.910];
const FOV_Y_DEG:     f32 = 45.0;
const NEAR:          f32 = 0.1;
const FAR:           f32 = 200.0;
/// Splat size in pixels for unit scale at unit clip depth.
const FOLIAGE_PX:    f32 = 40.0;
const ORNAMENT_PX:   f32 = 260.0;
/// Photo panel half-extent in world units.
const PHOTO_HALF:    Vec2 = Vec2::new(0.4, 0.5);
const INSET_W:       usize = 160;
const INSET_H:       usize = 120;
const ARROW_STEP:    f32 = 0.03;
const LEGEND:        &str =
    "Space=toggle  G=gesture  mouse=hand  H/click=open hand  arrows/drag=orbit  T=tier  Q=quit";
const DRAG_GAIN:     f32 = 0.01;

// ════════════════════════════════════════════════════════════════════════════
// Controls / Hud
// ════════════════════════════════════════════════════════════════════════════

/// Everything the window produced this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Controls {
    pub quit:           bool,
    pub toggle:         bool,
    pub gesture_toggle: bool,
    pub tier_toggle:    bool,
    /// Requested (azimuth, height) change for the free orbit.
    pub orbit_drag:     (f32, f32),
    pub hand:           SimHand,
}

/// Text and indicators drawn over the scene.
#[derive(Clone, Debug, Default)]
pub struct Hud<'a> {
    pub mode:       &'a str,
    pub classifier: Option<&'a str>,
    pub status:     &'a str,
    pub fps:        f32,
    pub hand:       Option<HandSignal>,
}

// ════════════════════════════════════════════════════════════════════════════
// Projection
// ════════════════════════════════════════════════════════════════════════════

/// A world point on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x:     f32,
    pub y:     f32,
    /// NDC depth, smaller is nearer.
    pub depth: f32,
    /// Clip-space `w` (distance along the view axis).
    pub w:     f32,
}

/// Project `p` through `view_proj` onto a `width × height` screen.  Points
/// behind the near plane or beyond the far plane give `None`.
pub fn project(view_proj: &Mat4, p: Vec3, width: usize, height: usize) -> Option<ScreenPoint> {
    let clip = *view_proj * p.extend(1.0);
    if clip.w <= NEAR {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    if !(-1.0..=1.0).contains(&ndc.z) {
        return None;
    }
    Some(ScreenPoint {
        x:     (ndc.x * 0.5 + 0.5) * width as f32,
        y:     (1.0 - (ndc.y * 0.5 + 0.5)) * height as f32,
        depth: ndc.z,
        w:     clip.w,
    })
}

pub fn view_projection(scene: &Scene, width: usize, height: usize) -> Mat4 {
    let aspect = width as f32 / height.max(1) as f32;
    Mat4::perspective_rh(FOV_Y_DEG.to_radians(), aspect, NEAR, FAR) * scene.camera().view_matrix()
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:     Window,
    buf:        Vec<u32>,
    depth:      Vec<f32>,
    width:      usize,
    height:     usize,
    last_mouse: Option<(f32, f32)>,
}

impl Visualizer {
    pub fn new(title: &str, width: usize, height: usize) -> anyhow::Result<Self> {
        let mut window = Window::new(
            title,
            width, height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("opening {}x{} viewer window", width, height))?;

        window.set_target_fps(60);

        Ok(Visualizer {
            window,
            buf:        vec![BG_COLOR; width * height],
            depth:      vec![f32::INFINITY; width * height],
            width,
            height,
            last_mouse: None,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard and mouse.
    pub fn poll(&mut self) -> Controls {
        let mut c = Controls::default();
        if !self.window.is_open() {
            c.quit = true;
            return c;
        }

        // Keys that trigger on first press only
        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        c.quit           = one_shot(Key::Q) || one_shot(Key::Escape);
        c.toggle         = one_shot(Key::Space);
        c.gesture_toggle = one_shot(Key::G);
        c.tier_toggle    = one_shot(Key::T);

        // Arrow keys orbit while held
        let held = |k: Key| self.window.is_key_down(k);
        if held(Key::Left)  { c.orbit_drag.0 -= ARROW_STEP; }
        if held(Key::Right) { c.orbit_drag.0 += ARROW_STEP; }
        if held(Key::Up)    { c.orbit_drag.1 += ARROW_STEP * 3.0; }
        if held(Key::Down)  { c.orbit_drag.1 -= ARROW_STEP * 3.0; }

        let pressed = self.window.get_mouse_down(MouseButton::Left);
        let mouse   = self.window.get_mouse_pos(MouseMode::Discard);
        if let (true, Some((mx, my)), Some((lx, ly))) = (pressed, mouse, self.last_mouse) {
            c.orbit_drag.0 -= (mx - lx) * DRAG_GAIN;
            c.orbit_drag.1 += (my - ly) * DRAG_GAIN * 3.0;
        }
        self.last_mouse = mouse;

        if let Some((mx, my)) = mouse {
            c.hand = SimHand {
                present: true,
                open:    pressed || self.window.is_key_down(Key::H),
                u:       mx / self.width as f32,
                v:       my / self.height as f32,
            };
        }
        c
    }

    /// Render one frame.
    pub fn render(&mut self, scene: &Scene, hud: &Hud) {
        self.buf.fill(BG_COLOR);
        self.depth.fill(f32::INFINITY);

        let view_proj = view_projection(scene, self.width, self.height);
        for group in scene.groups() {
            self.draw_group(&view_proj, group);
        }

        self.draw_hud(scene, hud);
        self.window.update_with_buffer(&self.buf, self.width, self.height).ok();
    }

    // ── Scene ─────────────────────────────────────────────────────────────

    fn draw_group(&mut self, view_proj: &Mat4, group: &MorphGroup) {
        let model = Mat4::from_rotation_y(group.group_yaw());
        let mvp   = *view_proj * model;
        let (w, h) = (self.width, self.height);

        for (t, record) in group.transforms().iter().zip(group.population().iter()) {
            if t.scale <= 0.0 {
                continue;
            }
            let color = to_argb(record.color);
            match group.kind() {
                PopulationKind::Photos => {
                    let m = mvp * t.matrix();
                    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
                        .map(|(sx, sy)| project(&m, Vec3::new(sx * PHOTO_HALF.x, sy * PHOTO_HALF.y, 0.0), w, h));
                    if let [Some(a), Some(b), Some(c), Some(d)] = corners {
                        let depth = (a.depth + b.depth + c.depth + d.depth) * 0.25;
                        let frame = to_argb(PHOTO_FRAME);
                        self.fill_triangle(a, b, c, depth, frame);
                        self.fill_triangle(a, c, d, depth, frame);
                        // Picture area: inset toward the centroid, tinted.
                        let mid = Vec2::new((a.x + c.x) * 0.5, (a.y + c.y) * 0.5);
                        let inset = |p: ScreenPoint| ScreenPoint {
                            x: mid.x + (p.x - mid.x) * 0.8,
                            y: mid.y + (p.y - mid.y) * 0.8,
                            ..p
                        };
                        let tinted = to_argb(mix(record.color, PHOTO_FRAME, 0.2));
                        self.fill_triangle(inset(a), inset(b), inset(c), depth - 1e-5, tinted);
                        self.fill_triangle(inset(a), inset(c), inset(d), depth - 1e-5, tinted);
                    }
                }
                kind => {
                    let Some(p) = project(&mvp, t.position, w, h) else { continue };
                    let px = if kind == PopulationKind::Foliage { FOLIAGE_PX } else { ORNAMENT_PX };
                    let size = (t.scale * px / p.w).clamp(1.0, 24.0);
                    self.splat(p, size, color);
                }
            }
        }
    }

    fn splat(&mut self, p: ScreenPoint, size: f32, color: u32) {
        let half = (size * 0.5).max(0.5);
        let x0 = (p.x - half).floor().max(0.0) as usize;
        let y0 = (p.y - half).floor().max(0.0) as usize;
        let x1 = ((p.x + half).ceil().max(0.0) as usize).min(self.width);
        let y1 = ((p.y + half).ceil().max(0.0) as usize).min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                self.plot(x, y, p.depth, color);
            }
        }
    }

    fn fill_triangle(&mut self, a: ScreenPoint, b: ScreenPoint, c: ScreenPoint, depth: f32, color: u32) {
        let edge = |p: (f32, f32), q: (f32, f32), r: (f32, f32)| {
            (q.0 - p.0) * (r.1 - p.1) - (q.1 - p.1) * (r.0 - p.0)
        };
        let (pa, pb, pc) = ((a.x, a.y), (b.x, b.y), (c.x, c.y));
        let area = edge(pa, pb, pc);
        if area.abs() < 1e-3 {
            return;
        }
        let x0 = a.x.min(b.x).min(c.x).floor().max(0.0) as usize;
        let y0 = a.y.min(b.y).min(c.y).floor().max(0.0) as usize;
        let x1 = (a.x.max(b.x).max(c.x).ceil().max(0.0) as usize).min(self.width);
        let y1 = (a.y.max(b.y).max(c.y).ceil().max(0.0) as usize).min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                let s  = (x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(pb, pc, s) * area.signum();
                let w1 = edge(pc, pa, s) * area.signum();
                let w2 = edge(pa, pb, s) * area.signum();
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    self.plot(x, y, depth, color);
                }
            }
        }
    }

    fn plot(&mut self, x: usize, y: usize, depth: f32, color: u32) {
        let i = y * self.width + x;
        if depth < self.depth[i] {
            self.depth[i] = depth;
            self.buf[i]   = color;
        }
    }

    // ── HUD ───────────────────────────────────────────────────────────────

    fn draw_hud(&mut self, scene: &Scene, hud: &Hud) {
        let target = scene.target();
        let state_color = if target.value() == 0.0 { CHAOS_RED } else { GOLD };

        self.fill_rect(0, 0, self.width, 28, HUD_BG);
        self.draw_label(target.label(), 10, 6, state_color);

        // Progress bar
        let bar_w = 120;
        self.draw_border(70, 5, bar_w, 8, DIM_TEXT);
        let filled = (scene.progress().clamp(0.0, 1.0) * (bar_w - 2) as f32) as usize;
        self.fill_rect(71, 6, filled, 6, state_color);

        let mut line = format!("mode {}", hud.mode);
        if let Some(name) = hud.classifier {
            line.push_str(&format!("  classifier {}", name));
        }
        line.push_str(&format!(
            "  tier {}  intro {:?}  fps {:.0}",
            if scene.tier().is_constrained() { "constrained" } else { "desktop" },
            scene.intro_phase(),
            hud.fps,
        ));
        self.draw_label(&line, 210, 6, TEXT_COLOR);
        self.draw_label(hud.status, 10, 18, DIM_TEXT);

        if let Some(hand) = hud.hand {
            self.draw_hand_inset(hand);
        }

        self.draw_label(LEGEND, 10, self.height - 12, DIM_TEXT);
    }

    fn draw_hand_inset(&mut self, hand: HandSignal) {
        let x0 = self.width.saturating_sub(INSET_W + 10);
        let y0 = self.height.saturating_sub(INSET_H + 24);
        self.fill_rect(x0, y0, INSET_W, INSET_H, HUD_BG);
        self.draw_border(x0, y0, INSET_W, INSET_H, DIM_TEXT);
        if !hand.tracked {
            self.draw_label("no hand", x0 + 6, y0 + 6, DIM_TEXT);
        }
        let cx = x0 + ((hand.x * 0.5 + 0.5) * (INSET_W - 1) as f32) as usize;
        let cy = y0 + ((0.5 - hand.y * 0.5) * (INSET_H - 1) as f32) as usize;
        let color = if hand.open { CHAOS_RED } else { GOLD };
        let r = if hand.open { 10 } else { 5 };
        self.draw_border(cx.saturating_sub(r), cy.saturating_sub(r), 2 * r + 1, 2 * r + 1, color);
        self.draw_label(if hand.open { "open" } else { "closed" }, x0 + 6, y0 + INSET_H - 10, color);
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x + w).min(self.width) {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..(y + h).min(self.height) {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            self.buf[y * self.width + x] = color;
        }
    }

    /// 3×5 bitmap text; case-insensitive.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = glyph(ch).unwrap_or(UNKNOWN_GLYPH);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.set_pixel(cx + col, y + row, color);
                    }
                }
            }
            cx += 4; // 3 wide + 1 gap
            if cx + 4 > self.width { break; }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HUD font: 3×5 cells, one bit per pixel, MSB on the left
// ────────────────────────────────────────────────────────────────────────────

const UNKNOWN_GLYPH: [u8; 5] = [0b111, 0b001, 0b010, 0b000, 0b010];

/// Lowercase letters, digits, and the punctuation the HUD and status lines
/// print.
const FONT: &[(char, [u8; 5])] = &[
    ('a', [0b111, 0b101, 0b111, 0b101, 0b101]),
    ('b', [0b110, 0b101, 0b110, 0b101, 0b110]),
    ('c', [0b111, 0b100, 0b100, 0b100, 0b111]),
    ('d', [0b110, 0b101, 0b101, 0b101, 0b110]),
    ('e', [0b111, 0b100, 0b111, 0b100, 0b111]),
    ('f', [0b111, 0b100, 0b111, 0b100, 0b100]),
    ('g', [0b111, 0b100, 0b101, 0b101, 0b111]),
    ('h', [0b101, 0b101, 0b111, 0b101, 0b101]),
    ('i', [0b111, 0b010, 0b010, 0b010, 0b111]),
    ('j', [0b001, 0b001, 0b001, 0b101, 0b111]),
    ('k', [0b101, 0b101, 0b110, 0b101, 0b101]),
    ('l', [0b100, 0b100, 0b100, 0b100, 0b111]),
    ('m', [0b101, 0b111, 0b101, 0b101, 0b101]),
    ('n', [0b110, 0b101, 0b101, 0b101, 0b101]),
    ('o', [0b010, 0b101, 0b101, 0b101, 0b010]),
    ('p', [0b111, 0b101, 0b111, 0b100, 0b100]),
    ('q', [0b111, 0b101, 0b101, 0b111, 0b001]),
    ('r', [0b110, 0b101, 0b110, 0b101, 0b101]),
    ('s', [0b011, 0b100, 0b010, 0b001, 0b110]),
    ('t', [0b111, 0b010, 0b010, 0b010, 0b010]),
    ('u', [0b101, 0b101, 0b101, 0b101, 0b111]),
    ('v', [0b101, 0b101, 0b101, 0b010, 0b010]),
    ('w', [0b101, 0b101, 0b101, 0b111, 0b101]),
    ('x', [0b101, 0b101, 0b010, 0b101, 0b101]),
    ('y', [0b101, 0b101, 0b111, 0b010, 0b010]),
    ('z', [0b111, 0b001, 0b010, 0b100, 0b111]),
    ('0', [0b111, 0b101, 0b101, 0b101, 0b111]),
    ('1', [0b010, 0b110, 0b010, 0b010, 0b111]),
    ('2', [0b111, 0b001, 0b111, 0b100, 0b111]),
    ('3', [0b111, 0b001, 0b111, 0b001, 0b111]),
    ('4', [0b101, 0b101, 0b111, 0b001, 0b001]),
    ('5', [0b111, 0b100, 0b111, 0b001, 0b111]),
    ('6', [0b111, 0b100, 0b111, 0b101, 0b111]),
    ('7', [0b111, 0b001, 0b001, 0b001, 0b001]),
    ('8', [0b111, 0b101, 0b111, 0b101, 0b111]),
    ('9', [0b111, 0b101, 0b111, 0b001, 0b111]),
    (' ', [0b000, 0b000, 0b000, 0b000, 0b000]),
    ('.', [0b000, 0b000, 0b000, 0b000, 0b010]),
    (',', [0b000, 0b000, 0b000, 0b010, 0b100]),
    (':', [0b000, 0b010, 0b000, 0b010, 0b000]),
    (';', [0b000, 0b010, 0b000, 0b010, 0b100]),
    ('=', [0b000, 0b111, 0b000, 0b111, 0b000]),
    ('-', [0b000, 0b000, 0b111, 0b000, 0b000]),
    ('/', [0b001, 0b001, 0b010, 0b100, 0b100]),
    ('(', [0b010, 0b100, 0b100, 0b100, 0b010]),
    (')', [0b010, 0b001, 0b001, 0b001, 0b010]),
    ('\'', [0b010, 0b010, 0b000, 0b000, 0b000]),
    ('?', UNKNOWN_GLYPH),
];

fn glyph(c: char) -> Option<[u8; 5]> {
    let c = c.to_ascii_lowercase();
    FONT.iter().find(|(k, _)| *k == c).map(|&(_, g)| g)
}

/// Linear RGB in `[0, 1]` to opaque ARGB.
fn to_argb([r, g, b]: [f32; 3]) -> u32 {
    let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
    0xFF000000 | (c(r) << 16) | (c(g) << 8) | c(b)
}

/// `t` = 0 gives `a`, `t` = 1 gives `b`.
fn mix(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    Vec3::from(a).lerp(Vec3::from(b), t.clamp(0.0, 1.0)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use morph_core::{DeviceTier, SceneConfig};

    fn scene() -> Scene {
        Scene::new(SceneConfig::new(DeviceTier::Constrained).with_seed(Some(1)).with_intro(false))
    }

    #[test]
    fn look_at_point_projects_to_centre() {
        let s = scene();
        let vp = view_projection(&s, 800, 600);
        let p = project(&vp, s.camera().look_at, 800, 600).unwrap();
        assert!((p.x - 400.0).abs() < 0.5 && (p.y - 300.0).abs() < 0.5);
    }

    #[test]
    fn points_behind_camera_are_culled() {
        let s = scene();
        let vp = view_projection(&s, 800, 600);
        let behind = s.camera().position * 2.0 - s.camera().look_at;
        assert_eq!(project(&vp, behind, 800, 600), None);
    }

    #[test]
    fn higher_points_draw_higher_on_screen() {
        let s = scene();
        let vp = view_projection(&s, 800, 600);
        let low  = project(&vp, Vec3::new(0.0, 0.0, 0.0), 800, 600).unwrap();
        let high = project(&vp, Vec3::new(0.0, 9.0, 0.0), 800, 600).unwrap();
        assert!(high.y < low.y);
    }

    #[test]
    fn colour_packing() {
        assert_eq!(to_argb([1.0, 0.0, 0.0]), 0xFFFF0000);
        assert_eq!(to_argb([0.0, 2.0, -1.0]), 0xFF00FF00);
        assert_eq!(to_argb(mix([0.0; 3], [1.0; 3], 0.0)), 0xFF000000);
        assert_eq!(to_argb(mix([0.0; 3], [1.0; 3], 1.0)), 0xFFFFFFFF);
    }

    #[test]
    fn hud_text_is_fully_covered_by_the_font() {
        let labels = [
            LEGEND, "CHAOS", "FORMED", "mode gesture", "manual", "classifier skin-heuristic",
            "landmark", "tier constrained desktop", "intro Waiting Launching Settling Done",
            "fps 60", "no hand", "open", "closed", "Gesture control unavailable (x); manual mode",
        ];
        for text in labels {
            for c in text.chars() {
                assert!(glyph(c).is_some(), "no glyph for {:?} in {:?}", c, text);
            }
        }
        assert_eq!(glyph('A'), glyph('a'));
        assert_eq!(glyph('#'), None);
    }
}
