pub mod order;
pub mod score;
pub mod search;
pub mod theory;
