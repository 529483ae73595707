//! Game identity and the folder naming rule.

use std::fmt;

/// Game ID and title pulled from one disc-image header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameIdentity {
    /// Six-character game code, e.g. `GZLE01`.
    pub id: String,
    /// Human-readable title.
    pub title: String,
}

impl GameIdentity {
    pub fn new(id: String, title: String) -> Self {
        Self { id, title }
    }

    /// Returns true if the ID follows the title-first naming convention.
    ///
    /// Those are the IDs starting with `G`; everything else (homebrew, other
    /// disc types) is named ID-first.
    pub fn is_title_first(&self) -> bool {
        self.id.starts_with('G')
    }

    /// Builds the folder name for this game.
    ///
    /// # Examples
    ///
    /// ```
    /// use discfold::identity::GameIdentity;
    ///
    /// let zelda = GameIdentity::new("GZLE01".into(), "Zelda".into());
    /// assert_eq!(zelda.folder_name(), "Zelda [GZLE01]");
    ///
    /// let kart = GameIdentity::new("RMCE01".into(), "MarioKart".into());
    /// assert_eq!(kart.folder_name(), "RMCE01_MarioKart");
    /// ```
    pub fn folder_name(&self) -> String {
        if self.is_title_first() {
            format!("{} [{}]", self.title, self.id)
        } else {
            format!("{}_{}", self.id, self.title)
        }
    }
}

impl fmt::Display for GameIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.folder_name())
    }
}
