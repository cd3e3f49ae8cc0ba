use serde::{Deserialize, Serialize};

use crate::index::Document;

/// One scene of a play, as stored in the corpus file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default)]
    pub play_id: String,
    #[serde(default)]
    pub scene_id: String,
    #[serde(default)]
    pub scene_num: u32,
    /// Absent in malformed records; indexing such a scene fails.
    #[serde(default)]
    pub text: Option<String>,
}

impl Scene {
    pub fn new(play_id: impl Into<String>, scene_id: impl Into<String>, scene_num: u32, text: impl Into<String>) -> Self {
        Self {
            play_id: play_id.into(),
            scene_id: scene_id.into(),
            scene_num,
            text: Some(text.into()),
        }
    }

    /// Length of the text in characters.
    pub fn char_len(&self) -> usize {
        self.text.as_deref().map_or(0, |t| t.chars().count())
    }
}

impl Document for Scene {
    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}
