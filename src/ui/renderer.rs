/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The renderer only reads a `FrameView`. One world tile maps to one
/// terminal row and `CELL_W` columns; sprites snap to the tile under them.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use log::{debug, info};

use crate::domain::entity::{EnemyKind, Facing, ItemKind, Owner, Weapon};
use crate::domain::tile::TileKind;
use crate::sim::view::{FrameView, Hud, Sprite, SpriteKind};
use crate::sim::world::Phase;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: [u8; 16],  // up to 16 bytes (supports ZWJ emoji sequences)
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool,    // true = this char occupies 2 terminal columns
    cont: bool,    // true = continuation of previous wide char (skip render)
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// Using the same RGB for `Clear(ClearType::All)` and every cell keeps
    /// VTE-based terminals from showing lines between rows.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0,0,0, 0,0,0,0, 0,0,0,0, 0,0,0,0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 16],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0,0,0, 0,0,0,0, 0,0,0,0, 0,0,0,0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char, bg: Color) -> Self {
        let mut cell = Self::from_char(c, Color::Reset, bg);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (cx, ch) in (x..self.width).zip(s.chars()) {
            self.set(cx, y, Cell::from_char(ch, fg, bg));
        }
    }

    /// Paint a whole row with `bg`.
    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }

    /// Put a wide glyph at (x, y), keeping the background already there.
    fn put_wide(&mut self, x: usize, y: usize, ch: char) {
        let bg = self.get(x, y).bg;
        self.set(x, y, Cell::from_char_wide(ch, bg));
        self.set(x + 1, y, Cell::WIDE_CONT);
    }

    /// Put a narrow two-column glyph at (x, y), keeping the background.
    fn put_pair(&mut self, x: usize, y: usize, pair: (char, char), fg: Color) {
        let bg = self.get(x, y).bg;
        self.set(x, y, Cell::from_char(pair.0, fg, bg));
        self.set(x + 1, y, Cell::from_char(pair.1, fg, bg));
    }
}

// ── Glyphs ──

/// What to draw for one tile-sized cell.
#[derive(Clone, Copy, PartialEq, Debug)]
enum Glyph {
    Pair(char, char, Color, Color),
    Wide(char, Color),
}

const GRASS_BG: Color = Color::Rgb { r: 34, g: 82, b: 40 };
const WATER_BG: Color = Color::Rgb { r: 22, g: 52, b: 120 };
const WOOD_BG: Color = Color::Rgb { r: 100, g: 65, b: 30 };

fn tile_glyph(kind: TileKind, tx: i32, ty: i32) -> Glyph {
    let speckle = (tx * 7 + ty * 3).rem_euclid(5) == 0;
    match kind {
        TileKind::Grass if speckle => Glyph::Pair('\'', ' ', Color::Rgb { r: 90, g: 160, b: 80 }, GRASS_BG),
        TileKind::Grass => Glyph::Pair(' ', ' ', Color::White, GRASS_BG),
        TileKind::Water => {
            let wave = if (tx + ty) % 2 == 0 { '~' } else { '≈' };
            Glyph::Pair(wave, ' ', Color::Rgb { r: 100, g: 160, b: 230 }, WATER_BG)
        }
        TileKind::Bridge => Glyph::Pair('═', '═', Color::Rgb { r: 200, g: 160, b: 100 }, WOOD_BG),
        TileKind::Dock => Glyph::Pair('▤', '▤', Color::Rgb { r: 180, g: 130, b: 70 }, WOOD_BG),
        TileKind::Rock => Glyph::Pair('▓', '▓', Color::Rgb { r: 150, g: 150, b: 150 }, Color::Rgb { r: 70, g: 70, b: 70 }),
        TileKind::Tree => Glyph::Wide('🌲', GRASS_BG),
        TileKind::House => Glyph::Wide('🏠', GRASS_BG),
    }
}

fn item_glyph(kind: ItemKind) -> Glyph {
    match kind {
        ItemKind::Currency => Glyph::Wide('💎', Color::Reset),
        ItemKind::Heart => Glyph::Wide('💖', Color::Reset),
        ItemKind::Bomb => Glyph::Wide('💣', Color::Reset),
        ItemKind::Key => Glyph::Wide('🔑', Color::Reset),
        ItemKind::Treasure => Glyph::Wide('👑', Color::Reset),
        ItemKind::Material => Glyph::Wide('🪵', Color::Reset),
        ItemKind::Weapon => Glyph::Wide('🏹', Color::Reset),
        ItemKind::Ammo => Glyph::Pair('➶', '➶', Color::Rgb { r: 230, g: 220, b: 180 }, Color::Reset),
    }
}

fn enemy_glyph(kind: EnemyKind) -> char {
    match kind {
        EnemyKind::Grunt => '👹',
        EnemyKind::Brute => '👺',
        EnemyKind::Archer => '🧟',
        EnemyKind::Boss => '🐉',
    }
}

fn arrow_char(heading: Facing) -> char {
    match heading {
        Facing::Up => '↑',
        Facing::Down => '↓',
        Facing::Left => '←',
        Facing::Right => '→',
    }
}

/// Sword swing drawn in the tile the player faces.
fn swing_pair(facing: Facing) -> (char, char) {
    match facing {
        Facing::Up | Facing::Down => ('│', ' '),
        Facing::Left | Facing::Right => ('─', '─'),
    }
}

/// "♥♥♥♡♡♡"
fn hearts(health: u32, max: u32) -> String {
    let full = health.min(max) as usize;
    format!("{}{}", "♥".repeat(full), "♡".repeat(max as usize - full))
}

fn hud_line(hud: &Hud) -> String {
    let weapon = match hud.weapon {
        Some(Weapon::Sword) => "Sword",
        Some(Weapon::Crossbow) => "Crossbow",
        None => "-",
    };
    let shield = if hud.has_shield { " Shield" } else { "" };
    let bomb = if hud.has_bomb { " Bomb" } else { "" };
    format!(
        " {}  ◆{:<5} Keys:{}  Ammo:{:<3} [{}]{}{}",
        hearts(hud.health, hud.max_health), hud.currency, hud.keys, hud.ammo, weapon, shield, bomb,
    )
}

fn inventory_line(hud: &Hud) -> String {
    let parts: Vec<String> = hud
        .inventory
        .iter()
        .map(|(kind, n)| format!("{}×{}", kind.label(), n))
        .collect();
    format!(" Pack: {}", if parts.is_empty() { "-".to_string() } else { parts.join("  ") })
}

// ── Renderer ──

/// Terminal columns per world tile.
const CELL_W: usize = 2;

/// Vertical layout
const HUD_ROW: usize = 0;
const PACK_ROW: usize = 1;
const MAP_ROW: usize = 2;
/// HUD rows above the map plus message, prompt and help rows below it.
const RESERVED_ROWS: usize = MAP_ROW + 3;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            enhanced_keys: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns whether the
    /// terminal will report key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }
        info!("terminal ready, key release events: {}", self.enhanced_keys);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    /// Viewport size in tiles that fits the current terminal.
    pub fn viewport_tiles(&self) -> (usize, usize) {
        let cols = (self.term_w / CELL_W).max(1);
        let rows = self.term_h.saturating_sub(RESERVED_ROWS).max(1);
        (cols, rows)
    }

    pub fn render(&mut self, view: &FrameView) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            debug!("terminal resized to {}x{}", tw, th);
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change → clear for clean transition
        if self.last_phase != Some(view.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(view.phase);
        }

        self.compose(view);

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Do NOT use ResetColor here: the terminal default may differ from BASE_BG.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                // Skip continuation cells (right half of wide emoji)
                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                // For wide cells, also check if the continuation changed
                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    // Wide char printed: cursor advanced 2 columns
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ══════════════════════════════════════════════════════════════
    // Compose: build front buffer content
    // ══════════════════════════════════════════════════════════════

    fn compose(&mut self, view: &FrameView) {
        self.front.clear();
        let (view_cols, view_rows) = self.viewport_tiles();

        // ── HUD rows ──
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud_line(&view.hud), Color::White, HUD_BG);
        self.front.put_str(0, PACK_ROW, &inventory_line(&view.hud), Color::Grey, Color::Reset);

        // ── Map ──
        for tile in &view.tiles {
            if let Some((col, row)) = self.cell_at(view, tile.sx, tile.sy, view_cols, view_rows) {
                self.put_glyph(col, row, tile_glyph(tile.kind, tile.tx, tile.ty));
            }
        }
        for sprite in view.sprites.iter().filter(|s| !s.hidden) {
            self.compose_sprite(view, sprite, view_cols, view_rows);
        }

        // ── Message / prompt / help ──
        let msg_row = MAP_ROW + view_rows;
        if let Some(msg) = &view.message {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &format!(" ◈ {} ", msg), Color::Black, MSG_BG);
        }
        if let Some(prompt) = view.prompt {
            self.front.put_str(1, msg_row + 1, prompt, Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);
        }
        let help = " Move:WASD/↑↓←→  Attack:Space/J  Use:E/K  Weapon:Q/L  Pause:P  Quit:Esc";
        self.front.put_str(0, msg_row + 2, help, Color::DarkGrey, Color::Reset);

        // ── Overlays ──
        match view.phase {
            Phase::GameOver => self.compose_end_screen(
                "✕  GAME OVER  ✕", Color::Rgb { r: 255, g: 60, b: 60 }, view, view_cols, view_rows,
            ),
            Phase::Won => self.compose_end_screen(
                "★  YOU WIN!  ★", Color::Rgb { r: 255, g: 220, b: 50 }, view, view_cols, view_rows,
            ),
            Phase::Playing if view.paused => self.compose_pause_overlay(view_cols, view_rows),
            Phase::Playing => {}
        }
    }

    /// Terminal cell for a screen-pixel position, if it lands in the map area.
    fn cell_at(&self, view: &FrameView, sx: f32, sy: f32, cols: usize, rows: usize) -> Option<(usize, usize)> {
        let gx = (sx / view.tile_size).floor();
        let gy = (sy / view.tile_size).floor();
        if gx < 0.0 || gy < 0.0 || gx as usize >= cols || gy as usize >= rows {
            return None;
        }
        Some((gx as usize * CELL_W, MAP_ROW + gy as usize))
    }

    fn put_glyph(&mut self, col: usize, row: usize, glyph: Glyph) {
        match glyph {
            Glyph::Pair(c0, c1, fg, bg) if bg == Color::Reset => self.front.put_pair(col, row, (c0, c1), fg),
            Glyph::Pair(c0, c1, fg, bg) => {
                self.front.set(col, row, Cell::from_char(c0, fg, bg));
                self.front.set(col + 1, row, Cell::from_char(c1, fg, bg));
            }
            Glyph::Wide(ch, bg) if bg == Color::Reset => self.front.put_wide(col, row, ch),
            Glyph::Wide(ch, bg) => {
                self.front.set(col, row, Cell::from_char_wide(ch, bg));
                self.front.set(col + 1, row, Cell::WIDE_CONT);
            }
        }
    }

    fn compose_sprite(&mut self, view: &FrameView, sprite: &Sprite, cols: usize, rows: usize) {
        // Boxes snap by their center; arrows are points.
        let half = match sprite.kind {
            SpriteKind::Arrow { .. } => 0.0,
            _ => view.tile_size / 2.0,
        };
        let Some((col, row)) = self.cell_at(view, sprite.sx + half, sprite.sy + half, cols, rows) else {
            return;
        };

        match sprite.kind {
            SpriteKind::Boat { repaired: true } => self.front.put_wide(col, row, '⛵'),
            SpriteKind::Boat { repaired: false } => {
                self.front.put_pair(col, row, ('╰', '╯'), Color::Rgb { r: 160, g: 110, b: 60 })
            }
            SpriteKind::Item(kind) => self.put_glyph(col, row, item_glyph(kind)),
            SpriteKind::Enemy { kind, .. } => self.front.put_wide(col, row, enemy_glyph(kind)),
            SpriteKind::Arrow { owner, heading } => {
                let fg = match owner {
                    Owner::Player => Color::White,
                    Owner::Enemy => Color::Rgb { r: 255, g: 90, b: 90 },
                };
                self.front.put_pair(col, row, (arrow_char(heading), ' '), fg);
            }
            SpriteKind::Player { facing, attacking, on_boat, weapon } => {
                let ch = if on_boat { '🚣' } else if attacking { '🤺' } else { '🧍' };
                self.front.put_wide(col, row, ch);
                if attacking && weapon == Weapon::Sword && !on_boat {
                    self.compose_swing(view, sprite, facing, cols, rows);
                }
            }
        }
    }

    fn compose_swing(&mut self, view: &FrameView, sprite: &Sprite, facing: Facing, cols: usize, rows: usize) {
        let dir = facing.unit() * view.tile_size;
        let cx = sprite.sx + view.tile_size / 2.0 + dir.x;
        let cy = sprite.sy + view.tile_size / 2.0 + dir.y;
        if let Some((col, row)) = self.cell_at(view, cx, cy, cols, rows) {
            self.front.put_pair(col, row, swing_pair(facing), Color::Rgb { r: 230, g: 230, b: 255 });
        }
    }

    /// Dark box centered over the map. Returns its top-left and width.
    fn overlay_box(&mut self, box_w: usize, box_h: usize, cols: usize, rows: usize) -> (usize, usize, usize) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let view_cols = cols * CELL_W;
        let box_w = box_w.min(view_cols);
        let box_h = box_h.min(rows);
        let box_x = view_cols.saturating_sub(box_w) / 2;
        let box_y = MAP_ROW + rows.saturating_sub(box_h) / 2;
        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::from_char(' ', Color::Reset, dim));
            }
        }
        (box_x, box_y, box_w)
    }

    fn compose_end_screen(&mut self, title: &str, color: Color, view: &FrameView, cols: usize, rows: usize) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let (x, y, w) = self.overlay_box(34, 7, cols, rows);
        let centered = |s: &str| x + w.saturating_sub(s.chars().count()) / 2;

        self.front.put_str(centered(title), y + 1, title, color, dim);
        let currency = format!("◆ Currency: {}", view.hud.currency);
        self.front.put_str(centered(&currency), y + 3, &currency, Color::White, dim);
        let hint = "R: Restart   ESC: Quit";
        self.front.put_str(centered(hint), y + 5, hint, Color::Rgb { r: 80, g: 255, b: 80 }, dim);
    }

    fn compose_pause_overlay(&mut self, cols: usize, rows: usize) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let hdr = Color::Rgb { r: 255, g: 220, b: 50 };
        let key_c = Color::Rgb { r: 100, g: 200, b: 255 };
        let (x, y, _) = self.overlay_box(30, 8, cols, rows);

        self.front.put_str(x + 6, y + 1, "╔════════════════╗", hdr, dim);
        self.front.put_str(x + 6, y + 2, "║     PAUSED     ║", hdr, dim);
        self.front.put_str(x + 6, y + 3, "╚════════════════╝", hdr, dim);
        self.front.put_str(x + 3, y + 5, "P   Resume", key_c, dim);
        self.front.put_str(x + 3, y + 6, "R   Restart   ESC Quit", key_c, dim);
    }
}
