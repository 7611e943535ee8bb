// src/components/mod.rs
pub mod edition_viewer;
pub mod image_panel;
pub mod toc;
