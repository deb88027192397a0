pub mod mojang;
pub mod portrait;
