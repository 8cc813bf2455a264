/// Keys the tutorials react to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TutorialKey {
    Escape,
    Up,
    Down,
    Left,
    Right,
}

pub const ALL_KEYS: [TutorialKey; 5] = [
    TutorialKey::Escape,
    TutorialKey::Up,
    TutorialKey::Down,
    TutorialKey::Left,
    TutorialKey::Right,
];

#[cfg(feature = "graphical")]
pub fn key_to_glfw_key(key: TutorialKey) -> glfw::Key {
    match key {
        TutorialKey::Escape => glfw::Key::Escape,
        TutorialKey::Up => glfw::Key::Up,
        TutorialKey::Down => glfw::Key::Down,
        TutorialKey::Left => glfw::Key::Left,
        TutorialKey::Right => glfw::Key::Right,
    }
}

#[cfg(feature = "graphical")]
pub fn glfw_key_to_key(key: glfw::Key) -> Option<TutorialKey> {
    match key {
        glfw::Key::Escape => Some(TutorialKey::Escape),
        glfw::Key::Up => Some(TutorialKey::Up),
        glfw::Key::Down => Some(TutorialKey::Down),
        glfw::Key::Left => Some(TutorialKey::Left),
        glfw::Key::Right => Some(TutorialKey::Right),
        _ => None,
    }
}

const MIX_STEP: f32 = 0.1;

/// Uniform inputs of the textures tutorial.
///
/// `mix` blends the second texture over the first, `mult` scales the texture coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlendControls {
    pub mix: f32,
    pub mult: i32,
}

impl Default for BlendControls {
    fn default() -> Self {
        Self {
            mix: 1.0,
            mult: 1,
        }
    }
}

impl BlendControls {
    /// Applies one held key for one frame.
    pub fn apply(&mut self, key: TutorialKey) {
        match key {
            TutorialKey::Up => self.mix = (self.mix + MIX_STEP).min(1.0),
            TutorialKey::Down => self.mix = (self.mix - MIX_STEP).max(0.0),
            TutorialKey::Left => self.mult = self.mult.saturating_add(1),
            TutorialKey::Right => self.mult = (self.mult - 1).max(1),
            TutorialKey::Escape => {}
        }
    }

    pub fn apply_all(&mut self, keys: &[TutorialKey]) {
        for key in keys {
            self.apply(*key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_is_clamped() {
        let mut controls = BlendControls::default();
        controls.apply(TutorialKey::Up);
        assert_eq!(controls.mix, 1.0);

        for _ in 0..25 {
            controls.apply(TutorialKey::Down);
        }
        assert_eq!(controls.mix, 0.0);

        controls.apply(TutorialKey::Up);
        assert!((controls.mix - 0.1).abs() < 1e-6);
    }

    #[test]
    fn mult_never_drops_below_one() {
        let mut controls = BlendControls::default();
        controls.apply_all(&[TutorialKey::Left, TutorialKey::Left, TutorialKey::Left]);
        assert_eq!(controls.mult, 4);
        controls.apply_all(&[TutorialKey::Right; 10]);
        assert_eq!(controls.mult, 1);
    }

    #[test]
    fn escape_leaves_controls_alone() {
        let mut controls = BlendControls { mix: 0.5, mult: 3 };
        controls.apply(TutorialKey::Escape);
        assert_eq!(controls, BlendControls { mix: 0.5, mult: 3 });
    }
}
