pub mod card;
pub mod color;
pub mod content;
pub mod deck;
pub mod hand;
pub mod player;
pub mod rules;
