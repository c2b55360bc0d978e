mod blend;
mod draft;
mod pocket;

pub use blend::{Blend, BlendProfile};
pub use draft::Draft;
pub use pocket::Pocket;
