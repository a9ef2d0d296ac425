//! Panel geometry and SSD1306 command-sequence constants.

/// Panel width in pixels.
pub const WIDTH: usize = 72;
/// Panel height in pixels.
pub const HEIGHT: usize = 40;
/// Vertical pages (8 rows each) covering `HEIGHT`.
pub const PAGES: usize = HEIGHT / 8;
/// Bytes per bitplane: one byte per page per column.
pub const PLANE_BYTES: usize = WIDTH * PAGES;

/// Nominal time to park the row counter for 8 rows before streaming a sub-frame.
pub const PRE_FRAME_US: u32 = 785;
/// Nominal time for one full 48-row sub-frame cycle.
pub const FRAME_TIME_US: u32 = 4709;

/// Display controller NOP opcode, used to pad short pending commands.
pub const CMD_NOP: u8 = 0x3e;
/// Display off.
pub const CMD_DISPLAY_OFF: u8 = 0xae;
/// Display on.
pub const CMD_DISPLAY_ON: u8 = 0xaf;
/// Set multiplex ratio (argument is rows - 1; 0 is the invalid "park" value).
pub const CMD_SET_MULTIPLEX: u8 = 0xa8;
/// Set display offset.
pub const CMD_SET_DISPLAY_OFFSET: u8 = 0xd3;
/// Set contrast (Bank0).
pub const CMD_SET_CONTRAST: u8 = 0x81;

/// Commands that park the row counter before a sub-frame is streamed:
/// multiplex ratio -> invalid value 1, display offset -> 52.
pub const PRE_FRAME_CMDS: [u8; 4] = [CMD_SET_MULTIPLEX, 0, CMD_SET_DISPLAY_OFFSET, 52];

/// Commands that restore the display offset and release the scanner to draw
/// the 57-row sub-frame window.
pub const POST_FRAME_CMDS: [u8; 4] = [
    CMD_SET_DISPLAY_OFFSET,
    40 + (64 - 57),
    CMD_SET_MULTIPLEX,
    57 - 1,
];

/// One-time controller bring-up sequence: shortest pre-charge, highest
/// internal oscillator frequency (required to fit the grayscale timing
/// budget), GDRAM addressing mode, charge pump enabled, display on.
pub const INIT_SEQUENCE: [u8; 27] = [
    CMD_DISPLAY_OFF,
    0x20, 0x00, // horizontal addressing mode
    0x40,       // start line 0
    0xa1,       // segment remap 1
    CMD_SET_MULTIPLEX, 63, // transient; parked/restored every sub-frame
    0xc8,       // COM scan direction 1
    CMD_SET_DISPLAY_OFFSET, 0,
    0xda, 0x12, // COM pins: alt config, no L/R remap
    0xd5, 0xf0, // clock divide = 1, osc freq ~= 370 kHz (highest)
    0xd9, 0x11, // pre-charge phase 1 = phase 2 = 1 (shortest)
    0xdb, 0x20, // Vcomh deselect level 0.77 x Vcc
    CMD_SET_CONTRAST, 0x7f, // transient
    0xa4,       // use GDRAM (not all-on)
    0xa6,       // normal, not inverse
    0x8d, 0x14, // charge pump enabled
    0xad, 0x30, // 30uA Iref
    CMD_DISPLAY_ON,
];

/// Controller bring-up sequence for the conventional (non-grayscale) mode
/// the panel is left in after `stop()`: ordinary pre-charge and oscillator
/// settings, multiplex ratio covering the real panel height, ending with
/// the same column/page window restored so the panel addresses GDRAM the
/// same way whether it was ever started or not.
pub const STOPPED_SEQUENCE: [u8; 33] = [
    CMD_DISPLAY_OFF,
    0x20, 0x00,
    0x40,
    0xa1,
    CMD_SET_MULTIPLEX, (HEIGHT - 1) as u8,
    0xc8,
    CMD_SET_DISPLAY_OFFSET, 0,
    0xda, 0x12,
    0xd5, 0x80,
    0xd9, 0xf1,
    0xdb, 0x20,
    CMD_SET_CONTRAST, 0x7f,
    0xa4,
    0xa6,
    0x8d, 0x14,
    0xad, 0x30,
    CMD_DISPLAY_ON,
    0x21, 28, 99,
    0x22, 0, 4,
];

/// GDRAM column window: set column start/end addresses.
pub const SET_COLUMN_WINDOW: [u8; 3] = [0x21, 28, 99];
/// GDRAM page window: set page start/end addresses.
pub const SET_PAGE_WINDOW: [u8; 3] = [0x22, 0, 4];

/// Bytes of physical GDRAM the controller exposes (128 segments x 8 pages),
/// cleared once at bring-up before the column/page window narrows the
/// addressable region to the panel's actual `PLANE_BYTES`.
pub const GDRAM_BYTES: usize = 1024;

/// Expand a `0..=127` brightness setting into the three per-sub-frame
/// contrast bytes that give each sub-frame a different duty-cycle weight,
/// spreading the controller's contrast range across the three sub-frames
/// to widen the gap between the two gray levels.
pub const fn expand_contrast(c: u8) -> [u8; 3] {
    [c >> 5, c >> 1, (c << 1) | 1]
}

/// Default per-sub-frame contrast bytes, corresponding to `expand_contrast(127)`.
pub const DEFAULT_CONTRAST: u8 = 127;
