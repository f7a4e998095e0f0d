//! The keybinding surface: actions, default keys and binding resolution.
use crate::config::WmConfig;
use std::str::FromStr;
use strum::{EnumIter, EnumString, IntoEnumIterator};
use tracing::warn;

/// Everything a key binding can do.
#[derive(EnumIter, EnumString, strum::Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[strum(serialize_all = "kebab-case")]
pub enum Action {
    /// Send the focused client to the next desktop
    ClientNextDesktop,
    /// Send the focused client to the previous desktop
    ClientPrevDesktop,
    /// Show the next desktop
    NextDesktop,
    /// Show the previous desktop
    PrevDesktop,
    /// Toggle the focused client between its desktop and the sticky plane
    ToggleStick,
    /// Minimize the focused client
    Iconify,
    /// Maximize the focused client on its screen
    Maximize,
    /// Ask the focused client to close itself
    RequestClose,
    /// Destroy the focused client's window outright
    ForceClose,
    /// Snap the focused client to the left half of its screen
    SnapLeft,
    /// Snap the focused client to the right half of its screen
    SnapRight,
    /// Snap the focused client to the top half of its screen
    SnapTop,
    /// Snap the focused client to the bottom half of its screen
    SnapBottom,
    /// Send the focused client to the monitor on the left
    ScreenLeft,
    /// Send the focused client to the monitor on the right
    ScreenRight,
    /// Send the focused client to the monitor above
    ScreenTop,
    /// Send the focused client to the monitor below
    ScreenBottom,
    /// Raise the focused client one stacking layer
    LayerAbove,
    /// Lower the focused client one stacking layer
    LayerBelow,
    /// Put the focused client on the top stacking layer
    LayerTop,
    /// Put the focused client on the bottom stacking layer
    LayerBottom,
    /// Focus the next window in the cycle
    CycleFocus,
    /// Focus the previous window in the cycle
    CycleFocusBack,
    /// Shut the window manager down cleanly
    ExitWm,
}

impl Action {
    /// The key name bound to this action when the config does not override
    /// it.
    pub fn default_key(&self) -> &'static str {
        match self {
            Action::ClientNextDesktop => "bracketright",
            Action::ClientPrevDesktop => "bracketleft",
            Action::NextDesktop => "period",
            Action::PrevDesktop => "comma",
            Action::ToggleStick => "backslash",
            Action::Iconify => "h",
            Action::Maximize => "m",
            Action::RequestClose => "c",
            Action::ForceClose => "x",
            Action::SnapLeft => "Left",
            Action::SnapRight => "Right",
            Action::SnapTop => "Up",
            Action::SnapBottom => "Down",
            Action::ScreenLeft => "Left",
            Action::ScreenRight => "Right",
            Action::ScreenTop => "Up",
            Action::ScreenBottom => "Down",
            Action::LayerAbove => "Prior",
            Action::LayerBelow => "Next",
            Action::LayerTop => "Home",
            Action::LayerBottom => "End",
            Action::CycleFocus => "Tab",
            Action::CycleFocusBack => "grave",
            Action::ExitWm => "Escape",
        }
    }

    // Screen-targeting actions share their keys with the snap actions and
    // are distinguished by the secondary modifier.
    fn uses_secondary_mod(&self) -> bool {
        matches!(
            self,
            Action::ScreenLeft | Action::ScreenRight | Action::ScreenTop | Action::ScreenBottom
        )
    }
}

/// A keysym plus the modifier mask that has to be held with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    /// The key symbol
    pub keysym: u32,
    /// The modifier mask
    pub modifiers: u16,
}

/// The fully resolved binding table built from a [WmConfig].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSet {
    pairs: Vec<(KeyBinding, Action)>,
    /// The primary modifier mask
    pub modifier: u16,
    /// The button that starts an interactive move
    pub move_button: u8,
    /// The button that starts an interactive resize
    pub resize_button: u8,
    /// The button that launches the configured shell
    pub launch_button: u8,
}

impl BindingSet {
    /// Resolve the binding table for the given config. Unknown action or
    /// key names in the config are logged and skipped.
    pub fn from_config(config: &WmConfig) -> Self {
        let primary = modifier_mask(&config.bindings.primary_mod).unwrap_or_else(|| {
            warn!(name = %config.bindings.primary_mod, "unknown primary modifier, using mod4");
            MOD4
        });
        let secondary = modifier_mask(&config.bindings.secondary_mod).unwrap_or_else(|| {
            warn!(name = %config.bindings.secondary_mod, "unknown secondary modifier, using control");
            CONTROL
        });

        for name in config.bindings.keys.keys() {
            if Action::from_str(name).is_err() {
                warn!(%name, "unknown action name in binding config");
            }
        }

        let mut pairs = Vec::new();
        for action in Action::iter() {
            let key_name = config
                .bindings
                .keys
                .get(&action.to_string())
                .map(String::as_str)
                .unwrap_or_else(|| action.default_key());

            let keysym = match keysym_from_name(key_name) {
                Some(sym) => sym,
                None => {
                    warn!(%key_name, %action, "unknown key name, keeping the default");
                    keysym_from_name(action.default_key()).expect("default keys are known")
                }
            };

            let modifiers = if action.uses_secondary_mod() {
                primary | secondary
            } else {
                primary
            };

            pairs.push((KeyBinding { keysym, modifiers }, action));
        }

        Self {
            pairs,
            modifier: primary,
            move_button: config.bindings.move_button,
            resize_button: config.bindings.resize_button,
            launch_button: config.bindings.launch_button,
        }
    }

    /// The action bound to the given key press, if any.
    pub fn action_for(&self, keysym: u32, modifiers: u16) -> Option<Action> {
        self.pairs
            .iter()
            .find(|(b, _)| b.keysym == keysym && b.modifiers == modifiers)
            .map(|&(_, a)| a)
    }

    /// Iterate over every resolved key binding.
    pub fn bindings(&self) -> impl Iterator<Item = &(KeyBinding, Action)> {
        self.pairs.iter()
    }
}

const SHIFT: u16 = 1 << 0;
const LOCK: u16 = 1 << 1;
const CONTROL: u16 = 1 << 2;
const MOD1: u16 = 1 << 3;
const MOD2: u16 = 1 << 4;
const MOD3: u16 = 1 << 5;
const MOD4: u16 = 1 << 6;
const MOD5: u16 = 1 << 7;

/// The X modifier mask for a modifier name.
pub fn modifier_mask(name: &str) -> Option<u16> {
    match name.to_ascii_lowercase().as_str() {
        "shift" => Some(SHIFT),
        "lock" => Some(LOCK),
        "control" | "ctrl" => Some(CONTROL),
        "mod1" | "alt" => Some(MOD1),
        "mod2" => Some(MOD2),
        "mod3" => Some(MOD3),
        "mod4" | "super" => Some(MOD4),
        "mod5" => Some(MOD5),
        _ => None,
    }
}

/// The keysym for a key name: any single Latin-1 character maps to its
/// codepoint, plus the small set of named keys the default bindings use.
pub fn keysym_from_name(name: &str) -> Option<u32> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if (c as u32) < 0x100 {
            return Some(c as u32);
        }
    }

    // Values from X11/keysymdef.h
    match name {
        "space" => Some(0x0020),
        "comma" => Some(0x002c),
        "period" => Some(0x002e),
        "bracketleft" => Some(0x005b),
        "backslash" => Some(0x005c),
        "bracketright" => Some(0x005d),
        "grave" => Some(0x0060),
        "Escape" => Some(0xff1b),
        "Tab" => Some(0xff09),
        "Return" => Some(0xff0d),
        "Home" => Some(0xff50),
        "Left" => Some(0xff51),
        "Up" => Some(0xff52),
        "Right" => Some(0xff53),
        "Down" => Some(0xff54),
        "Prior" | "Page_Up" => Some(0xff55),
        "Next" | "Page_Down" => Some(0xff56),
        "End" => Some(0xff57),
        _ => None,
    }
}
