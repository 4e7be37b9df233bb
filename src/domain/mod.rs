pub mod ai;
pub mod combat;
pub mod controls;
pub mod entity;
pub mod physics;
pub mod rules;
pub mod tile;
pub mod tilemap;
