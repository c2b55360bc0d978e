mod general;

pub use general::GeneralTransform;
