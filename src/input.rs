use glam::Vec2;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{Key, NamedKey};

/// Pointer travel (pixels) between press and release beyond which a left click counts as a
/// drag instead of a confirm.
const CLICK_SLOP: f32 = 5.0;
const PIXELS_PER_WHEEL_LINE: f32 = 40.0;

pub struct Input {
    bindings: InputBindings,
    wheel: f32,
    drag_delta: Vec2,
    cursor_pos: Option<Vec2>,
    left_pressed: bool,
    press_travel: f32,
    confirms: u32,
    quit_requested: bool,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(path: impl AsRef<Path>) -> Self {
        let bindings = InputBindings::load_or_default(path);
        Self::with_bindings(bindings)
    }

    fn with_bindings(bindings: InputBindings) -> Self {
        Self {
            bindings,
            wheel: 0.0,
            drag_delta: Vec2::ZERO,
            cursor_pos: None,
            left_pressed: false,
            press_travel: 0.0,
            confirms: 0,
            quit_requested: false,
        }
    }

    pub fn push(&mut self, ev: InputEvent) {
        match &ev {
            InputEvent::Key { key, pressed, repeat } => {
                if !*repeat {
                    self.apply_key_binding(key, *pressed);
                }
            }
            InputEvent::Wheel { delta } => {
                self.wheel += *delta;
            }
            InputEvent::MouseButton { button: MouseButton::Left, pressed } => {
                if *pressed {
                    self.left_pressed = true;
                    self.press_travel = 0.0;
                } else if self.left_pressed {
                    self.left_pressed = false;
                    if self.press_travel <= CLICK_SLOP {
                        self.confirms += 1;
                    }
                }
            }
            InputEvent::MouseButton { .. } => {}
            InputEvent::CursorPos { x, y } => {
                let next = Vec2::new(*x, *y);
                if let (true, Some(prev)) = (self.left_pressed, self.cursor_pos) {
                    let delta = next - prev;
                    self.drag_delta += delta;
                    self.press_travel += delta.length();
                }
                self.cursor_pos = Some(next);
            }
            InputEvent::CursorLeft => {
                self.cursor_pos = None;
                self.left_pressed = false;
            }
            InputEvent::Other => {}
        }
    }

    pub fn clear_frame(&mut self) {
        self.drag_delta = Vec2::ZERO;
        self.wheel = 0.0;
    }

    pub fn consume_wheel_delta(&mut self) -> Option<f32> {
        if self.wheel.abs() > 0.0 {
            let d = self.wheel;
            self.wheel = 0.0;
            Some(d)
        } else {
            None
        }
    }

    pub fn take_drag_delta(&mut self) -> Option<Vec2> {
        if self.drag_delta == Vec2::ZERO {
            return None;
        }
        let d = self.drag_delta;
        self.drag_delta = Vec2::ZERO;
        Some(d)
    }

    /// Number of confirm gestures (clicks or bound keys) since the last call.
    pub fn take_confirms(&mut self) -> u32 {
        std::mem::take(&mut self.confirms)
    }

    pub fn take_quit(&mut self) -> bool {
        std::mem::take(&mut self.quit_requested)
    }

    pub fn cursor_position(&self) -> Option<Vec2> {
        self.cursor_pos
    }

    fn apply_key_binding(&mut self, key: &Key, pressed: bool) {
        if !pressed {
            return;
        }
        if let Some(binding_key) = InputKeyBinding::from_event_key(key) {
            let actions: Vec<_> = self.bindings.actions_for_key(&binding_key).collect();
            for action in actions {
                match action {
                    InputAction::Confirm => self.confirms += 1,
                    InputAction::Quit => self.quit_requested = true,
                }
            }
        }
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::with_bindings(InputBindings::default())
    }
}

#[derive(Debug, Clone)]
struct InputBindings {
    key_to_actions: HashMap<InputKeyBinding, Vec<InputAction>>,
}

impl InputBindings {
    fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<InputConfigFile>(&contents) {
                Ok(config) => Self::from_config(config, &path.display().to_string()),
                Err(err) => {
                    log::warn!("Failed to parse {}: {err}. Falling back to default bindings.", path.display());
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!("Failed to read {}: {err}. Falling back to default bindings.", path.display());
                Self::default()
            }
        }
    }

    fn from_config(config: InputConfigFile, origin: &str) -> Self {
        let overrides = config.into_overrides(origin);
        Self::with_overrides(overrides)
    }

    fn with_overrides(overrides: HashMap<InputAction, Vec<InputKeyBinding>>) -> Self {
        let mut action_map = Self::default_action_map();
        for (action, keys) in overrides {
            if keys.is_empty() {
                continue;
            }
            action_map.insert(action, keys);
        }
        Self::from_action_map(action_map)
    }

    fn default_action_map() -> HashMap<InputAction, Vec<InputKeyBinding>> {
        let mut map = HashMap::new();
        map.insert(
            InputAction::Confirm,
            vec![InputKeyBinding::named(NamedKeyCode::Space), InputKeyBinding::named(NamedKeyCode::Enter)],
        );
        map.insert(InputAction::Quit, vec![InputKeyBinding::named(NamedKeyCode::Escape)]);
        map
    }

    fn from_action_map(action_map: HashMap<InputAction, Vec<InputKeyBinding>>) -> Self {
        let mut key_to_actions: HashMap<InputKeyBinding, Vec<InputAction>> = HashMap::new();
        for (action, keys) in action_map {
            for key in keys {
                key_to_actions.entry(key).or_default().push(action);
            }
        }
        Self { key_to_actions }
    }

    fn actions_for_key(&self, key: &InputKeyBinding) -> impl Iterator<Item = InputAction> + '_ {
        self.key_to_actions.get(key).into_iter().flatten().copied()
    }
}

impl Default for InputBindings {
    fn default() -> Self {
        Self::from_action_map(Self::default_action_map())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum InputKeyBinding {
    Character(String),
    Named(NamedKeyCode),
}

impl InputKeyBinding {
    fn named(named: NamedKeyCode) -> Self {
        Self::Named(named)
    }

    fn from_event_key(key: &Key) -> Option<Self> {
        match key {
            Key::Character(ch) => {
                let s = ch.to_string();
                if s.is_empty() {
                    None
                } else {
                    Some(Self::Character(s.to_lowercase()))
                }
            }
            Key::Named(named) => NamedKeyCode::from_named_key(named).map(Self::Named),
            _ => None,
        }
    }

    fn from_config_value(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        if let Some(named) = NamedKeyCode::from_str(&normalized) {
            return Some(Self::Named(named));
        }
        if normalized.chars().count() == 1 {
            return Some(Self::Character(normalized));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NamedKeyCode {
    Space,
    Enter,
    Escape,
}

impl NamedKeyCode {
    fn from_named_key(key: &NamedKey) -> Option<Self> {
        match key {
            NamedKey::Space => Some(Self::Space),
            NamedKey::Enter => Some(Self::Enter),
            NamedKey::Escape => Some(Self::Escape),
            _ => None,
        }
    }

    fn from_str(value: &str) -> Option<Self> {
        match value {
            "space" => Some(Self::Space),
            "enter" | "return" => Some(Self::Enter),
            "escape" | "esc" => Some(Self::Escape),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum InputAction {
    Confirm,
    Quit,
}

impl InputAction {
    fn from_str(value: &str) -> Option<Self> {
        match value {
            "confirm" => Some(Self::Confirm),
            "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InputConfigFile {
    #[serde(default)]
    bindings: HashMap<String, Vec<String>>,
}

impl InputConfigFile {
    fn into_overrides(self, origin: &str) -> HashMap<InputAction, Vec<InputKeyBinding>> {
        let mut overrides = HashMap::new();
        for (action_name, keys) in self.bindings {
            let action_key = action_name.trim().to_lowercase();
            match InputAction::from_str(&action_key) {
                Some(action) => {
                    let mut parsed = Vec::new();
                    for key in keys {
                        match InputKeyBinding::from_config_value(&key) {
                            Some(binding) => parsed.push(binding),
                            None => log::warn!("{origin}: unknown key '{key}' for action '{action_name}', ignoring."),
                        }
                    }
                    if parsed.is_empty() {
                        log::warn!("{origin}: action '{action_name}' has no valid keys, keeping defaults.");
                        continue;
                    }
                    overrides.insert(action, parsed);
                }
                None => log::warn!("{origin}: unknown action '{action_name}', ignoring."),
            }
        }
        overrides
    }
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    /// `repeat` marks OS auto-repeat while the key is held; bindings ignore it.
    Key { key: Key, pressed: bool, repeat: bool },
    Wheel { delta: f32 },
    MouseButton { button: MouseButton, pressed: bool },
    CursorPos { x: f32, y: f32 },
    CursorLeft,
    Other,
}

impl InputEvent {
    pub fn from_window_event(ev: &WindowEvent) -> Self {
        match ev {
            WindowEvent::MouseWheel { delta, .. } => {
                let d = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_WHEEL_LINE,
                };
                InputEvent::Wheel { delta: d }
            }
            WindowEvent::CursorMoved { position, .. } => {
                InputEvent::CursorPos { x: position.x as f32, y: position.y as f32 }
            }
            WindowEvent::CursorLeft { .. } => InputEvent::CursorLeft,
            WindowEvent::MouseInput { state, button, .. } => {
                InputEvent::MouseButton { button: *button, pressed: *state == ElementState::Pressed }
            }
            WindowEvent::KeyboardInput { event, .. } => InputEvent::Key {
                key: event.logical_key.clone(),
                pressed: event.state == ElementState::Pressed,
                repeat: event.repeat,
            },
            _ => InputEvent::Other,
        }
    }
}
