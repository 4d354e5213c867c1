use crate::model::content::Content;
use crate::model::player::PlayerId;
use serde::Serialize;

/// Append-only set of every content opened on the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PublicKnowledge {
    opened: Vec<Content>,
}

impl PublicKnowledge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_contents(opened: Vec<Content>) -> Self {
        Self { opened }
    }

    pub(crate) fn reveal(&mut self, content: Content) {
        if !self.opened.contains(&content) {
            self.opened.push(content);
        }
    }

    pub fn contents(&self) -> &[Content] {
        &self.opened
    }

    pub fn contains(&self, content: Content) -> bool {
        self.opened.contains(&content)
    }
}

/// Table state every player shares during a decision.
#[derive(Debug, Clone, Copy)]
pub struct PublicView<'a> {
    pub opened: &'a [Content],
    pub turn: u32,
    pub attacker: PlayerId,
}
