pub mod shapes;
pub mod vector;

pub use shapes::{Circle, GridPos, GridRect};
pub use vector::Vector;
