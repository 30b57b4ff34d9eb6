mod gophermart_world;
mod setups;
mod steps;

pub use gophermart_world::GophermartWorld;
