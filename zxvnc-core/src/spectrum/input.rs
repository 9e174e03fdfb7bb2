//! Spectrum input → RFB key / pointer events.
//!
//! The Spectrum sends its full input state on every change. The
//! [`InputTracker`] keeps the last dispatched record and turns each new
//! one into the minimal set of events.

use bitflags::bitflags;

use crate::spectrum::telemetry::InputRecord;

bitflags! {
    /// Kempston mouse buttons as reported by the Spectrum.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ButtonMask: u8 {
        const LEFT = 0b001;
        const MIDDLE = 0b010;
        const RIGHT = 0b100;
    }
}

impl ButtonMask {
    /// RFB pointer button mask (button 1 = bit 0, 2 = bit 1, 3 = bit 2).
    ///
    /// Bits beyond the three buttons are kept in the mask for change
    /// detection but never forwarded.
    pub fn to_rfb(self) -> u8 {
        let mut mask = 0;
        if self.contains(ButtonMask::LEFT) {
            mask |= 1;
        }
        if self.contains(ButtonMask::MIDDLE) {
            mask |= 2;
        }
        if self.contains(ButtonMask::RIGHT) {
            mask |= 4;
        }
        mask
    }
}

// ── Key mapping ──────────────────────────────────────────────────

const XK_BACKSPACE: u32 = 0xff08;
const XK_RETURN: u32 = 0xff0d;
const XK_ESCAPE: u32 = 0xff1b;
const XK_LEFT: u32 = 0xff51;
const XK_UP: u32 = 0xff52;
const XK_RIGHT: u32 = 0xff53;
const XK_DOWN: u32 = 0xff54;

/// X keysym for a Spectrum key code.
///
/// Control codes from the ROM keyboard map become their X equivalents;
/// printable codes are already Latin-1 keysyms.
pub fn keysym(code: u8) -> u32 {
    match code {
        7 => XK_ESCAPE,
        8 => XK_LEFT,
        9 => XK_RIGHT,
        10 => XK_DOWN,
        11 => XK_UP,
        12 => XK_BACKSPACE,
        13 => XK_RETURN,
        other => other as u32,
    }
}

// ── InputEvent ───────────────────────────────────────────────────

/// An event to inject into the remote session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key { keysym: u32, down: bool },
    Pointer { x: u16, y: u16, buttons: u8 },
}

// ── InputTracker ─────────────────────────────────────────────────

/// Deduplicates telemetry records into events.
#[derive(Debug, Default)]
pub struct InputTracker {
    last: InputRecord,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `record` with the last one and return the events it implies.
    ///
    /// A key change between two non-zero codes releases the old key before
    /// pressing the new one.
    pub fn observe(&mut self, record: InputRecord) -> Vec<InputEvent> {
        let old = std::mem::replace(&mut self.last, record);
        let mut events = Vec::new();

        if record.key != old.key {
            if old.key != 0 {
                events.push(InputEvent::Key {
                    keysym: keysym(old.key),
                    down: false,
                });
            }
            if record.key != 0 {
                events.push(InputEvent::Key {
                    keysym: keysym(record.key),
                    down: true,
                });
            }
        }

        if (record.x, record.y, record.buttons) != (old.x, old.y, old.buttons) {
            events.push(InputEvent::Pointer {
                x: record.x,
                y: record.y,
                buttons: record.buttons.to_rfb(),
            });
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(key: u8, x: u16, y: u16) -> InputRecord {
        InputRecord::new(key, ButtonMask::empty(), x, y)
    }

    #[test]
    fn identical_records_are_silent() {
        let mut t = InputTracker::new();
        let first = t.observe(rec(b'q', 10, 10));
        assert_eq!(first.len(), 2);
        assert!(t.observe(rec(b'q', 10, 10)).is_empty());
    }

    #[test]
    fn position_change_is_one_pointer_event() {
        let mut t = InputTracker::new();
        t.observe(rec(b'q', 10, 10));
        let events = t.observe(rec(b'q', 11, 10));
        assert_eq!(
            events,
            vec![InputEvent::Pointer {
                x: 11,
                y: 10,
                buttons: 0
            }]
        );
    }

    #[test]
    fn key_press_and_release() {
        let mut t = InputTracker::new();
        assert_eq!(
            t.observe(rec(13, 0, 0)),
            vec![InputEvent::Key {
                keysym: XK_RETURN,
                down: true
            }]
        );
        assert_eq!(
            t.observe(rec(0, 0, 0)),
            vec![InputEvent::Key {
                keysym: XK_RETURN,
                down: false
            }]
        );
    }

    #[test]
    fn key_switch_releases_old_key_first() {
        let mut t = InputTracker::new();
        t.observe(rec(b'a', 0, 0));
        assert_eq!(
            t.observe(rec(b'b', 0, 0)),
            vec![
                InputEvent::Key {
                    keysym: b'a' as u32,
                    down: false
                },
                InputEvent::Key {
                    keysym: b'b' as u32,
                    down: true
                },
            ]
        );
    }

    #[test]
    fn buttons_map_to_rfb_mask() {
        let mut t = InputTracker::new();
        let events = t.observe(InputRecord::new(0, ButtonMask::LEFT | ButtonMask::RIGHT, 0, 0));
        assert_eq!(
            events,
            vec![InputEvent::Pointer {
                x: 0,
                y: 0,
                buttons: 0b101
            }]
        );
    }

    #[test]
    fn unknown_button_bit_still_moves_pointer() {
        let mut t = InputTracker::new();
        assert!(t.observe(rec(0, 0, 0)).is_empty());

        let events = t.observe(InputRecord::new(0, ButtonMask::from_bits_retain(0x08), 0, 0));
        assert_eq!(
            events,
            vec![InputEvent::Pointer {
                x: 0,
                y: 0,
                buttons: 0
            }]
        );
    }

    #[test]
    fn keysym_mapping() {
        assert_eq!(keysym(12), XK_BACKSPACE);
        assert_eq!(keysym(11), XK_UP);
        assert_eq!(keysym(b'Z'), b'Z' as u32);
    }
}
