//! Localized UI strings
//!
//! Strings are addressed by [`StringId`]. English is compiled in; other
//! languages come from `lang_<code>.json` files in the data directory, a flat
//! JSON object mapping string ids to text. Anything a language file leaves out
//! falls back to English.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StringId {
    Ok,
    Cancel,
    MenuStart,
    MenuQuit,
    MenuBackToMenu,
    OptionsLeftPlayer,
    OptionsRightPlayer,
    OptionsRed,
    OptionsGreen,
    OptionsBlue,
    OptionsName,
    OptionsShowShadow,
    OptionsBackground,
    ChatTitle,
    ChatSend,
    GamePaused,
}

impl StringId {
    #[cfg(test)]
    pub const ALL: [StringId; 16] = [
        StringId::Ok,
        StringId::Cancel,
        StringId::MenuStart,
        StringId::MenuQuit,
        StringId::MenuBackToMenu,
        StringId::OptionsLeftPlayer,
        StringId::OptionsRightPlayer,
        StringId::OptionsRed,
        StringId::OptionsGreen,
        StringId::OptionsBlue,
        StringId::OptionsName,
        StringId::OptionsShowShadow,
        StringId::OptionsBackground,
        StringId::ChatTitle,
        StringId::ChatSend,
        StringId::GamePaused,
    ];

    fn english(self) -> &'static str {
        match self {
            StringId::Ok => "ok",
            StringId::Cancel => "cancel",
            StringId::MenuStart => "start",
            StringId::MenuQuit => "exit",
            StringId::MenuBackToMenu => "back to menu",
            StringId::OptionsLeftPlayer => "left player",
            StringId::OptionsRightPlayer => "right player",
            StringId::OptionsRed => "red",
            StringId::OptionsGreen => "green",
            StringId::OptionsBlue => "blue",
            StringId::OptionsName => "name:",
            StringId::OptionsShowShadow => "shadows",
            StringId::OptionsBackground => "background",
            StringId::ChatTitle => "chat",
            StringId::ChatSend => "send",
            StringId::GamePaused => "game paused",
        }
    }
}

pub struct TextManager {
    language: String,
    strings: HashMap<StringId, String>,
}

impl TextManager {
    /// The compiled-in English table
    pub fn english() -> Self {
        TextManager {
            language: "en".to_string(),
            strings: HashMap::new(),
        }
    }

    /// Parses a language file's contents
    pub fn from_json(language: &str, json: &str) -> Result<Self, serde_json::Error> {
        let strings: HashMap<StringId, String> = serde_json::from_str(json)?;
        Ok(TextManager {
            language: language.to_string(),
            strings,
        })
    }

    /// Loads `lang_<language>.json` from `directory`, falling back to English
    pub fn load(language: &str, directory: &Path) -> Self {
        if language == "en" {
            return TextManager::english();
        }

        let path = directory.join(format!("lang_{}.json", language));
        let loaded = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| TextManager::from_json(language, &json).map_err(|e| e.to_string()));

        match loaded {
            Ok(manager) => {
                info!("Loaded language '{}' ({} strings)", language, manager.strings.len());
                manager
            }
            Err(e) => {
                warn!("Could not load language file {}: {}, using English", path.display(), e);
                TextManager::english()
            }
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn get(&self, id: StringId) -> &str {
        self.strings
            .get(&id)
            .map(String::as_str)
            .unwrap_or_else(|| id.english())
    }
}

impl Default for TextManager {
    fn default() -> Self {
        Self::english()
    }
}
