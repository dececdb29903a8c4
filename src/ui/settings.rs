use serde::{Deserialize, Serialize};
use egui::Color32;
use std::collections::HashMap;

use crate::model::message::Role;

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct UiSettings {
    pub ui_scale: f32,

    // Role → bubble color
    pub role_colors: HashMap<String, [u8; 4]>,
}

impl Default for UiSettings {
    fn default() -> Self {
        let mut role_colors = HashMap::new();

        role_colors.insert(Role::User.label().into(), [0, 130, 201, 255]);
        role_colors.insert(Role::Assistant.label().into(), [40, 90, 60, 255]);
        role_colors.insert(Role::System.label().into(), [80, 80, 80, 255]);

        Self {
            ui_scale: 1.0,
            role_colors,
        }
    }
}

impl UiSettings {
    pub fn color(&self, role: Role) -> Color32 {
        self.role_colors
            .get(role.label())
            .map(|c| Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3]))
            .unwrap_or(Color32::DARK_GRAY)
    }

    pub fn set_color(&mut self, role: Role, color: Color32) {
        self.role_colors.insert(
            role.label().to_string(),
            [color.r(), color.g(), color.b(), color.a()],
        );
    }
}
