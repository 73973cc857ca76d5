pub mod material;
pub mod settings;

pub use material::Material;
