/// Virtual-key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(pub u8);

impl Key {
    pub const A: Key = Key(0x41);
    pub const D: Key = Key(0x44);
    pub const ESCAPE: Key = Key(0x1B);
    pub const SPACE: Key = Key(0x20);
}

pub const KEY_COUNT: usize = 256;

/// Key states for this frame and the previous one, for edge detection.
#[derive(Debug, Clone)]
pub struct Keyboard {
    keys: [bool; KEY_COUNT],
    old_keys: [bool; KEY_COUNT],
}

impl Default for Keyboard {
    fn default() -> Self {
        Self {
            keys: [false; KEY_COUNT],
            old_keys: [false; KEY_COUNT],
        }
    }
}

impl Keyboard {
    /// Takes a new snapshot. Bytes follow the Win32 layout: the high bit set
    /// means the key is down.
    pub fn update(&mut self, snapshot: &[u8; KEY_COUNT]) {
        self.old_keys = self.keys;
        for (key, state) in self.keys.iter_mut().zip(snapshot) {
            *key = state & 0x80 != 0;
        }
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.keys[usize::from(key.0)]
    }

    /// Down this frame, up the previous one.
    pub fn is_triggered(&self, key: Key) -> bool {
        let i = usize::from(key.0);
        self.keys[i] && !self.old_keys[i]
    }

    /// `speed` when only `positive` is down, `-speed` when only `negative`
    /// is, zero otherwise.
    pub fn axis(&self, negative: Key, positive: Key, speed: f32) -> f32 {
        let value = i8::from(self.is_down(positive)) - i8::from(self.is_down(negative));
        f32::from(value) * speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(down: &[Key]) -> [u8; KEY_COUNT] {
        let mut keys = [0; KEY_COUNT];
        for key in down {
            keys[usize::from(key.0)] = 0x80;
        }
        keys
    }

    #[test]
    fn trigger_fires_on_the_first_frame_only() {
        let mut keyboard = Keyboard::default();

        keyboard.update(&snapshot(&[Key::SPACE]));
        assert!(keyboard.is_down(Key::SPACE));
        assert!(keyboard.is_triggered(Key::SPACE));

        keyboard.update(&snapshot(&[Key::SPACE]));
        assert!(keyboard.is_down(Key::SPACE));
        assert!(!keyboard.is_triggered(Key::SPACE));

        keyboard.update(&snapshot(&[]));
        assert!(!keyboard.is_down(Key::SPACE));
        assert!(!keyboard.is_triggered(Key::SPACE));
    }

    #[test]
    fn low_bits_do_not_count_as_pressed() {
        let mut keyboard = Keyboard::default();
        let mut keys = [0; KEY_COUNT];
        // toggle bit only
        keys[usize::from(Key::A.0)] = 0x01;
        keyboard.update(&keys);
        assert!(!keyboard.is_down(Key::A));
    }

    #[test]
    fn axis_cancels_out() {
        let mut keyboard = Keyboard::default();
        keyboard.update(&snapshot(&[Key::D]));
        assert_eq!(keyboard.axis(Key::A, Key::D, 2.0), 2.0);

        keyboard.update(&snapshot(&[Key::A]));
        assert_eq!(keyboard.axis(Key::A, Key::D, 2.0), -2.0);

        keyboard.update(&snapshot(&[Key::A, Key::D]));
        assert_eq!(keyboard.axis(Key::A, Key::D, 2.0), 0.0);
    }
}
